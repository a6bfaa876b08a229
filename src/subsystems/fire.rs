use super::{AlarmState, FaultType, PowerSource, Subsystem};
use serde::{Deserialize, Serialize};

pub const DETECTOR_COUNT: usize = 10;

const AMBIENT_TEMP_C: f32 = 25.0;
const TEMP_ALARM_C: f32 = 50.0;
const SMOKE_ALARM_OBSCURATION: f32 = 0.3;

// Degraded detection loops need a stronger stimulus before they trip.
const DEGRADED_TEMP_ALARM_C: f32 = 65.0;
const DEGRADED_SMOKE_ALARM_OBSCURATION: f32 = 0.45;

// Readings drift back toward ambient between stimuli (per second).
const TEMP_DECAY_C_PER_S: f32 = 0.5;
const SMOKE_DECAY_PER_S: f32 = 0.02;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DetectorReading {
    pub temp_c: f32,
    pub smoke_obscuration: f32,
}

impl Default for DetectorReading {
    fn default() -> Self {
        Self {
            temp_c: AMBIENT_TEMP_C,
            smoke_obscuration: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FireState {
    pub detectors: [DetectorReading; DETECTOR_COUNT],
    pub alarms: AlarmState,
    pub power_source: PowerSource,
    pub alarmed_detector: Option<u8>,
    pub detection_cycles: u32,
}

#[derive(Debug, Clone)]
pub enum FireCommand {
    SetDetectorTemperature(u8, f32),
    SetDetectorSmoke(u8, f32),
    ResetAlarms,
    CutMainPower,
    RestoreMainPower,
}

#[derive(Debug)]
pub struct FireDetectionSystem {
    state: FireState,
    fault_state: Option<FaultType>,
    temp_threshold_c: f32,
    smoke_threshold: f32,
}

impl FireDetectionSystem {
    pub fn new() -> Self {
        Self {
            state: FireState {
                detectors: [DetectorReading::default(); DETECTOR_COUNT],
                alarms: AlarmState::default(),
                power_source: PowerSource::Main,
                alarmed_detector: None,
                detection_cycles: 0,
            },
            fault_state: None,
            temp_threshold_c: TEMP_ALARM_C,
            smoke_threshold: SMOKE_ALARM_OBSCURATION,
        }
    }

    fn decay_readings(&mut self, dt_ms: u16) {
        let dt_s = dt_ms as f32 / 1000.0;
        for detector in &mut self.state.detectors {
            if detector.temp_c > AMBIENT_TEMP_C {
                detector.temp_c =
                    (detector.temp_c - TEMP_DECAY_C_PER_S * dt_s).max(AMBIENT_TEMP_C);
            }
            if detector.smoke_obscuration > 0.0 {
                detector.smoke_obscuration =
                    (detector.smoke_obscuration - SMOKE_DECAY_PER_S * dt_s).max(0.0);
            }
        }
    }

    fn scan_detectors(&mut self) {
        for (index, detector) in self.state.detectors.iter().enumerate() {
            if detector.temp_c > self.temp_threshold_c
                || detector.smoke_obscuration > self.smoke_threshold
            {
                self.state.alarms.raise();
                self.state.alarmed_detector = Some(index as u8);
                break;
            }
        }
    }
}

impl Subsystem for FireDetectionSystem {
    type State = FireState;
    type Command = FireCommand;

    fn update(&mut self, dt_ms: u16) -> Result<(), FaultType> {
        if let Some(fault) = self.fault_state {
            match fault {
                FaultType::Failed => return Err(fault),
                FaultType::Degraded => {
                    // Reduced loop sensitivity while degraded
                    self.temp_threshold_c = DEGRADED_TEMP_ALARM_C;
                    self.smoke_threshold = DEGRADED_SMOKE_ALARM_OBSCURATION;
                }
                FaultType::Offline => return Err(fault),
            }
        }

        // Loss of the main supply is not loss of detection; the loop keeps
        // scanning on the emergency supply. A failed supply stops the scan.
        if self.state.power_source == PowerSource::Failed {
            return Err(FaultType::Failed);
        }

        self.decay_readings(dt_ms);
        self.scan_detectors();
        self.state.detection_cycles = self.state.detection_cycles.wrapping_add(1);

        debug_assert!(
            self.state
                .detectors
                .iter()
                .all(|d| (0.0..=1.0).contains(&d.smoke_obscuration)),
            "Smoke obscuration out of 0..1 range"
        );
        debug_assert!(
            self.temp_threshold_c >= TEMP_ALARM_C,
            "Temperature threshold {} below nominal {}",
            self.temp_threshold_c,
            TEMP_ALARM_C
        );

        Ok(())
    }

    fn execute_command(&mut self, command: Self::Command) -> Result<(), &'static str> {
        match command {
            FireCommand::SetDetectorTemperature(detector, temp_c) => {
                if !(-40.0..=150.0).contains(&temp_c) {
                    return Err("Temperature out of range");
                }
                let slot = self
                    .state
                    .detectors
                    .get_mut(detector as usize)
                    .ok_or("Unknown detector")?;
                slot.temp_c = temp_c;
                Ok(())
            }
            FireCommand::SetDetectorSmoke(detector, obscuration) => {
                if !(0.0..=1.0).contains(&obscuration) {
                    return Err("Obscuration out of range");
                }
                let slot = self
                    .state
                    .detectors
                    .get_mut(detector as usize)
                    .ok_or("Unknown detector")?;
                slot.smoke_obscuration = obscuration;
                Ok(())
            }
            FireCommand::ResetAlarms => {
                self.state.alarms.clear();
                self.state.alarmed_detector = None;
                Ok(())
            }
            FireCommand::CutMainPower => {
                // Automatic changeover to the emergency supply
                if self.state.power_source == PowerSource::Main {
                    self.state.power_source = PowerSource::Emergency;
                }
                Ok(())
            }
            FireCommand::RestoreMainPower => {
                self.state.power_source = PowerSource::Main;
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
        self.temp_threshold_c = TEMP_ALARM_C;
        self.smoke_threshold = SMOKE_ALARM_OBSCURATION;
    }

    fn is_healthy(&self) -> bool {
        self.fault_state.is_none() && self.state.power_source != PowerSource::Failed
    }

    fn alarm_active(&self) -> bool {
        self.state.alarms.active()
    }
}

impl Default for FireDetectionSystem {
    fn default() -> Self {
        Self::new()
    }
}
