pub mod fire;
pub mod esd;
pub mod bilge;

pub use bilge::{BilgeAlarmSystem, BilgeCommand, BilgeState, COMPARTMENT_COUNT};
pub use esd::{EmergencyShutdownSystem, EsdCommand, EsdState, EsdStation};
pub use fire::{FireCommand, FireDetectionSystem, FireState, DETECTOR_COUNT};

use heapless::Vec;
use serde::{Deserialize, Serialize};

pub const MAX_SUBSYSTEMS: usize = 8;
pub const MAX_FAULTS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubsystemId {
    FireDetection,
    EmergencyShutdown,
    BilgeAlarm,
}

impl SubsystemId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubsystemId::FireDetection => "fire",
            SubsystemId::EmergencyShutdown => "esd",
            SubsystemId::BilgeAlarm => "bilge",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultType {
    Degraded,
    Failed,
    Offline,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Fault {
    pub subsystem: SubsystemId,
    pub fault_type: FaultType,
    pub timestamp: u64,
}

pub type FaultList = Vec<Fault, MAX_FAULTS>;

/// Visual and audible annunciator state. Both latch once raised and stay
/// up until explicitly reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmState {
    pub visual: bool,
    pub audible: bool,
}

impl AlarmState {
    pub fn raise(&mut self) {
        self.visual = true;
        self.audible = true;
    }

    pub fn clear(&mut self) {
        self.visual = false;
        self.audible = false;
    }

    pub fn active(&self) -> bool {
        self.visual || self.audible
    }
}

/// Supply feeding a safety subsystem. Detection and alarm annunciation
/// must survive loss of the main supply, so `Emergency` is a fully
/// operational state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerSource {
    Main,
    Emergency,
    Failed,
}

pub trait Subsystem {
    type State: Clone + Serialize;
    type Command: Clone;

    fn update(&mut self, dt_ms: u16) -> Result<(), FaultType>;
    fn execute_command(&mut self, command: Self::Command) -> Result<(), &'static str>;
    fn get_state(&self) -> Self::State;
    fn inject_fault(&mut self, fault: FaultType);
    fn clear_faults(&mut self);
    fn is_healthy(&self) -> bool;
    fn alarm_active(&self) -> bool;
}
