use super::{AlarmState, FaultType, Subsystem};
use serde::{Deserialize, Serialize};

// Fuel valve travel, from fully open to fully closed.
const MAIN_VALVE_TRAVEL_MS: u32 = 2000;
const AUX_VALVE_TRAVEL_MS: u32 = 1500;

// A shutdown sequence must latch both valves closed within this window.
pub const SHUTDOWN_DEADLINE_MS: u32 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValvePosition {
    Open,
    Closing,
    Closed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ValveState {
    pub position: ValvePosition,
    pub travel_elapsed_ms: u32,
}

impl ValveState {
    fn open() -> Self {
        Self {
            position: ValvePosition::Open,
            travel_elapsed_ms: 0,
        }
    }

    fn advance(&mut self, dt_ms: u16, travel_ms: u32) {
        if self.position != ValvePosition::Closing {
            return;
        }
        self.travel_elapsed_ms = self.travel_elapsed_ms.saturating_add(dt_ms as u32);
        if self.travel_elapsed_ms >= travel_ms {
            self.position = ValvePosition::Closed;
            self.travel_elapsed_ms = travel_ms;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EsdStation {
    Bridge,
    EngineRoom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EsdState {
    pub main_valve: ValveState,
    pub aux_valve: ValveState,
    pub shutdown_active: bool,
    pub initiating_station: Option<EsdStation>,
    pub shutdown_elapsed_ms: u32,
    pub alarm_signal: AlarmState,
    pub shutdown_count: u32,
}

#[derive(Debug, Clone)]
pub enum EsdCommand {
    ActivateShutdown(EsdStation),
    ResetShutdown,
}

#[derive(Debug)]
pub struct EmergencyShutdownSystem {
    state: EsdState,
    fault_state: Option<FaultType>,
}

impl EmergencyShutdownSystem {
    pub fn new() -> Self {
        Self {
            state: EsdState {
                main_valve: ValveState::open(),
                aux_valve: ValveState::open(),
                shutdown_active: false,
                initiating_station: None,
                shutdown_elapsed_ms: 0,
                alarm_signal: AlarmState::default(),
                shutdown_count: 0,
            },
            fault_state: None,
        }
    }

    pub fn shutdown_complete(&self) -> bool {
        self.state.main_valve.position == ValvePosition::Closed
            && self.state.aux_valve.position == ValvePosition::Closed
    }
}

impl Subsystem for EmergencyShutdownSystem {
    type State = EsdState;
    type Command = EsdCommand;

    fn update(&mut self, dt_ms: u16) -> Result<(), FaultType> {
        if let Some(fault) = self.fault_state {
            match fault {
                FaultType::Failed | FaultType::Offline => return Err(fault),
                FaultType::Degraded => {}
            }
        }

        if self.state.shutdown_active && !self.shutdown_complete() {
            self.state.shutdown_elapsed_ms =
                self.state.shutdown_elapsed_ms.saturating_add(dt_ms as u32);

            // Main fuel valve drives first, the auxiliary follows once
            // the main is seated.
            self.state.main_valve.advance(dt_ms, MAIN_VALVE_TRAVEL_MS);
            if self.state.main_valve.position == ValvePosition::Closed {
                if self.state.aux_valve.position == ValvePosition::Open {
                    self.state.aux_valve.position = ValvePosition::Closing;
                }
                self.state.aux_valve.advance(dt_ms, AUX_VALVE_TRAVEL_MS);
            }

            if self.shutdown_complete() {
                self.state.alarm_signal.raise();
            }
        }

        debug_assert!(
            !self.shutdown_complete() || self.state.shutdown_elapsed_ms <= SHUTDOWN_DEADLINE_MS,
        );
        debug_assert!(
            self.state.shutdown_active || !self.shutdown_complete(),
            "Valves closed without an active shutdown"
        );

        Ok(())
    }

    fn execute_command(&mut self, command: Self::Command) -> Result<(), &'static str> {
        match command {
            EsdCommand::ActivateShutdown(station) => {
                // Re-activation while a shutdown is in progress is a no-op;
                // the sequence already underway keeps its initiating station.
                if self.state.shutdown_active {
                    return Ok(());
                }
                self.state.shutdown_active = true;
                self.state.initiating_station = Some(station);
                self.state.shutdown_elapsed_ms = 0;
                self.state.main_valve.position = ValvePosition::Closing;
                self.state.main_valve.travel_elapsed_ms = 0;
                self.state.shutdown_count = self.state.shutdown_count.wrapping_add(1);
                Ok(())
            }
            EsdCommand::ResetShutdown => {
                if self.state.shutdown_active && !self.shutdown_complete() {
                    return Err("Shutdown sequence in progress");
                }
                self.state.shutdown_active = false;
                self.state.initiating_station = None;
                self.state.shutdown_elapsed_ms = 0;
                self.state.main_valve = ValveState::open();
                self.state.aux_valve = ValveState::open();
                self.state.alarm_signal.clear();
                Ok(())
            }
        }
    }

    fn get_state(&self) -> Self::State {
        self.state.clone()
    }

    fn inject_fault(&mut self, fault: FaultType) {
        self.fault_state = Some(fault);
    }

    fn clear_faults(&mut self) {
        self.fault_state = None;
    }

    fn is_healthy(&self) -> bool {
        self.fault_state.is_none()
    }

    fn alarm_active(&self) -> bool {
        self.state.alarm_signal.active()
    }
}

impl Default for EmergencyShutdownSystem {
    fn default() -> Self {
        Self::new()
    }
}
