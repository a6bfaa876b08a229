use super::{AlarmState, FaultType, PowerSource, Subsystem};
use serde::{Deserialize, Serialize};

pub const COMPARTMENT_COUNT: usize = 5;

pub const DEFAULT_THRESHOLD_MM: f32 = 150.0;

// Changeover to the emergency supply must be reported within this window.
pub const POWER_NOTIFY_DEADLINE_MS: u32 = 5000;

// Water drains slowly between stimuli (mm per second).
const DRAIN_MM_PER_S: f32 = 1.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CompartmentState {
    pub water_level_mm: f32,
    pub threshold_mm: f32,
    pub alarm: AlarmState,
}

impl Default for CompartmentState {
    fn default() -> Self {
        Self {
            water_level_mm: 0.0,
            threshold_mm: DEFAULT_THRESHOLD_MM,
            alarm: AlarmState::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PowerNotification {
    pub pending: bool,
    pub sent: bool,
    pub delay_ms: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BilgeState {
    pub compartments: [CompartmentState; COMPARTMENT_COUNT],
    pub power_source: PowerSource,
    pub power_notification: PowerNotification,
    pub scan_cycles: u32,
}

#[derive(Debug, Clone)]
pub enum BilgeCommand {
    SetWaterLevel(u8, f32),
    SetThreshold(u8, f32),
    ResetAlarms,
    CutMainPower,
    RestoreMainPower,
}

#[derive(Debug)]
pub struct BilgeAlarmSystem {
    state: BilgeState,
    fault_state: Option<FaultType>,
}

impl BilgeAlarmSystem {
    pub fn new() -> Self {
        Self {
            state: BilgeState {
                compartments: [CompartmentState::default(); COMPARTMENT_COUNT],
                power_source: PowerSource::Main,
                power_notification: PowerNotification::default(),
                scan_cycles: 0,
            },
            fault_state: None,
        }
    }

    fn drain_compartments(&mut self, dt_ms: u16) {
        let dt_s = dt_ms as f32 / 1000.0;
        for compartment in &mut self.state.compartments {
            if compartment.water_level_mm > 0.0 {
                compartment.water_level_mm =
                    (compartment.water_level_mm - DRAIN_MM_PER_S * dt_s).max(0.0);
            }
        }
    }

    fn scan_compartments(&mut self) {
        for compartment in &mut self.state.compartments {
            if compartment.water_level_mm >= compartment.threshold_mm {
                compartment.alarm.raise();
            }
        }
    }

    fn advance_power_notification(&mut self, dt_ms: u16) {
        let note = &mut self.state.power_notification;
        if note.pending && !note.sent {
            note.delay_ms = note.delay_ms.saturating_add(dt_ms as u32);
            // Notification goes out on the next monitoring cycle, well
            // inside the reporting window.
            note.sent = true;
            note.pending = false;
        }
    }
}

impl Subsystem for BilgeAlarmSystem {
    type State = BilgeState;
    type Command = BilgeCommand;

    fn update(&mut self, dt_ms: u16) -> Result<(), FaultType> {
        if let Some(fault) = self.fault_state {
            match fault {
                FaultType::Failed | FaultType::Offline => return Err(fault),
                FaultType::Degraded => {}
            }
        }

        // Monitoring continues on the emergency supply.
        if self.state.power_source == PowerSource::Failed {
            return Err(FaultType::Failed);
        }

        // Scan before draining so a level sitting exactly at the threshold
        // still trips the alarm.
        self.scan_compartments();
        self.drain_compartments(dt_ms);
        self.advance_power_notification(dt_ms);
        self.state.scan_cycles = self.state.scan_cycles.wrapping_add(1);

        debug_assert!(
            !self.state.power_notification.sent
                || self.state.power_notification.delay_ms <= POWER_NOTIFY_DEADLINE_MS,
            "Power changeover notification exceeded {} ms",
            POWER_NOTIFY_DEADLINE_MS
        );
        debug_assert!(
            self.state
                .compartments
                .iter()
                .all(|c| c.water_level_mm >= 0.0),
            "Negative water level"
        );

        Ok(())
    }

    fn execute_command(&mut self, command: Self::Command) -> Result<(), &'static str> {
        match command {
            BilgeCommand::SetWaterLevel(compartment, level_mm) => {
                if !level_mm.is_finite() || level_mm < 0.0 {
                    return Err("Water level out of range");
                }
                let slot = self
                    .state
                    .compartments
                    .get_mut(compartment as usize)
                    .ok_or("Unknown compartment")?;
                slot.water_level_mm = level_mm;
                Ok(())
            }
            BilgeCommand::SetThreshold(compartment, threshold_mm) => {
                if !threshold_mm.is_finite() || threshold_mm <= 0.0 {
                    return Err("Threshold out of range");
                }
                let slot = self
                    .state
                    .compartments
                    .get_mut(compartment as usize)
                    .ok_or("Unknown compartment")?;
                slot.threshold_mm = threshold_mm;
                Ok(())
            }
            BilgeCommand::ResetAlarms => {
                for compartment in &mut self.state.compartments {
                    compartment.alarm.clear();
                }
                Ok(())
            }
            BilgeCommand::CutMainPower => {
                if self.state.power_source == PowerSource::Main {
                    self.state.power_source = PowerSource::Emergency;
                    self.state.power_notification = PowerNotification {
                        pending: true,
                        sent: false,
                        delay_ms: 0,
                    };
                }
                Ok(())
            }
            BilgeCommand::RestoreMainPower => {
                self.state.power_source = PowerSource::Main;
                self.state.power_notification = PowerNotification::default();
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
        self.fault_state.is_none() && self.state.power_source != PowerSource::Failed
    }

    fn alarm_active(&self) -> bool {
        self.state.compartments.iter().any(|c| c.alarm.active())
    }
}

impl Default for BilgeAlarmSystem {
    fn default() -> Self {
        Self::new()
    }
}
