use crate::subsystems::{
    BilgeAlarmSystem, EmergencyShutdownSystem, FireDetectionSystem, Subsystem, SubsystemId,
};
use heapless::Vec;
use serde::{Deserialize, Serialize};

const MAX_PANEL_EVENTS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlarmSeverity {
    Advisory,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PanelEvent {
    FireAlarm,
    ShutdownComplete,
    HighWaterLevel,
    EmergencyPowerActive,
    SubsystemFailure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelEventRecord {
    pub event: PanelEvent,
    pub timestamp: u64,
    pub severity: AlarmSeverity,
    pub subsystem: SubsystemId,
    pub resolved: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MaintenanceMode {
    pub fire: bool,
    pub esd: bool,
    pub bilge: bool,
    pub expires_at: Option<u64>,
}

impl MaintenanceMode {
    pub fn any_active(&self) -> bool {
        self.fire || self.esd || self.bilge
    }

    pub fn covers(&self, subsystem: SubsystemId) -> bool {
        match subsystem {
            SubsystemId::FireDetection => self.fire,
            SubsystemId::EmergencyShutdown => self.esd,
            SubsystemId::BilgeAlarm => self.bilge,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelState {
    pub general_alarm: bool,
    pub highest_severity: Option<AlarmSeverity>,
    pub active_events: u8,
    pub maintenance: MaintenanceMode,
    pub alarm_activation_count: u32,
    pub last_scan: u64,
}

/// Result of one panel scan over the connected subsystems.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelScan {
    pub general_alarm: bool,
    pub triggered: std::vec::Vec<SubsystemId>,
    pub suppressed: std::vec::Vec<SubsystemId>,
}

#[derive(Debug)]
pub struct CentralAlarmPanel {
    state: PanelState,
    event_history: Vec<PanelEventRecord, MAX_PANEL_EVENTS>,
}

impl CentralAlarmPanel {
    pub fn new() -> Self {
        Self {
            state: PanelState {
                general_alarm: false,
                highest_severity: None,
                active_events: 0,
                maintenance: MaintenanceMode::default(),
                alarm_activation_count: 0,
                last_scan: 0,
            },
            event_history: Vec::new(),
        }
    }

    /// Poll the connected subsystems and derive the general alarm state.
    ///
    /// A subsystem under maintenance still has its local alarm latched;
    /// the panel only masks its contribution to the general alarm.
    pub fn scan(
        &mut self,
        current_time: u64,
        fire: &FireDetectionSystem,
        esd: &EmergencyShutdownSystem,
        bilge: &BilgeAlarmSystem,
    ) -> PanelScan {
        self.state.last_scan = current_time;

        // Expire a timed maintenance window
        if let Some(expires_at) = self.state.maintenance.expires_at {
            if current_time > expires_at {
                self.state.maintenance = MaintenanceMode::default();
            }
        }

        self.check_fire(fire, current_time);
        self.check_esd(esd, current_time);
        self.check_bilge(bilge, current_time);

        let mut triggered = std::vec::Vec::new();
        let mut suppressed = std::vec::Vec::new();

        for (subsystem, active) in [
            (SubsystemId::FireDetection, fire.alarm_active()),
            (SubsystemId::EmergencyShutdown, esd.alarm_active()),
            (SubsystemId::BilgeAlarm, bilge.alarm_active()),
        ] {
            if !active {
                continue;
            }
            if self.state.maintenance.covers(subsystem) {
                suppressed.push(subsystem);
            } else {
                triggered.push(subsystem);
            }
        }

        let general_alarm = !triggered.is_empty();
        if general_alarm && !self.state.general_alarm {
            self.state.alarm_activation_count =
                self.state.alarm_activation_count.saturating_add(1);
        }
        self.state.general_alarm = general_alarm;
        self.update_severity();

        PanelScan {
            general_alarm,
            triggered,
            suppressed,
        }
    }

    fn check_fire(&mut self, fire: &FireDetectionSystem, current_time: u64) {
        let state = fire.get_state();

        if state.alarms.active() {
            self.record_event(
                PanelEvent::FireAlarm,
                current_time,
                AlarmSeverity::Critical,
                SubsystemId::FireDetection,
            );
        }

        if state.power_source == crate::subsystems::PowerSource::Emergency {
            self.record_event(
                PanelEvent::EmergencyPowerActive,
                current_time,
                AlarmSeverity::Warning,
                SubsystemId::FireDetection,
            );
        }

        if !fire.is_healthy() {
            self.record_event(
                PanelEvent::SubsystemFailure,
                current_time,
                AlarmSeverity::Critical,
                SubsystemId::FireDetection,
            );
        }
    }

    fn check_esd(&mut self, esd: &EmergencyShutdownSystem, current_time: u64) {
        if esd.alarm_active() {
            self.record_event(
                PanelEvent::ShutdownComplete,
                current_time,
                AlarmSeverity::Critical,
                SubsystemId::EmergencyShutdown,
            );
        }

        if !esd.is_healthy() {
            self.record_event(
                PanelEvent::SubsystemFailure,
                current_time,
                AlarmSeverity::Critical,
                SubsystemId::EmergencyShutdown,
            );
        }
    }

    fn check_bilge(&mut self, bilge: &BilgeAlarmSystem, current_time: u64) {
        let state = bilge.get_state();

        if bilge.alarm_active() {
            self.record_event(
                PanelEvent::HighWaterLevel,
                current_time,
                AlarmSeverity::Warning,
                SubsystemId::BilgeAlarm,
            );
        }

        if state.power_source == crate::subsystems::PowerSource::Emergency {
            self.record_event(
                PanelEvent::EmergencyPowerActive,
                current_time,
                AlarmSeverity::Warning,
                SubsystemId::BilgeAlarm,
            );
        }

        if !bilge.is_healthy() {
            self.record_event(
                PanelEvent::SubsystemFailure,
                current_time,
                AlarmSeverity::Critical,
                SubsystemId::BilgeAlarm,
            );
        }
    }

    fn update_severity(&mut self) {
        let active: std::vec::Vec<_> = self
            .event_history
            .iter()
            .filter(|event| !event.resolved)
            .collect();

        self.state.active_events = active.len() as u8;
        self.state.highest_severity = active.iter().map(|event| event.severity).max();
    }

    fn record_event(
        &mut self,
        event: PanelEvent,
        timestamp: u64,
        severity: AlarmSeverity,
        subsystem: SubsystemId,
    ) {
        // Refresh an already-active record instead of duplicating it
        if let Some(existing) = self
            .event_history
            .iter_mut()
            .find(|e| e.event == event && e.subsystem == subsystem && !e.resolved)
        {
            existing.timestamp = timestamp;
            existing.severity = severity;
            return;
        }

        let record = PanelEventRecord {
            event,
            timestamp,
            severity,
            subsystem,
            resolved: false,
        };

        if self.event_history.is_full() {
            self.event_history.remove(0);
        }
        let _ = self.event_history.push(record);
    }

    /// Resolve all outstanding panel events. The subsystem alarms stay
    /// latched until reset at the subsystem itself.
    pub fn acknowledge_all(&mut self) {
        for event in &mut self.event_history {
            event.resolved = true;
        }
        self.state.active_events = 0;
        self.state.highest_severity = None;
    }

    pub fn set_maintenance(
        &mut self,
        subsystem: SubsystemId,
        enabled: bool,
        expires_at: Option<u64>,
    ) {
        match subsystem {
            SubsystemId::FireDetection => self.state.maintenance.fire = enabled,
            SubsystemId::EmergencyShutdown => self.state.maintenance.esd = enabled,
            SubsystemId::BilgeAlarm => self.state.maintenance.bilge = enabled,
        }
        if enabled {
            self.state.maintenance.expires_at = expires_at;
        } else if !self.state.maintenance.any_active() {
            self.state.maintenance.expires_at = None;
        }
    }

    pub fn maintenance(&self) -> &MaintenanceMode {
        &self.state.maintenance
    }

    pub fn get_state(&self) -> &PanelState {
        &self.state
    }

    pub fn get_event_history(&self) -> &[PanelEventRecord] {
        &self.event_history
    }

    pub fn clear_resolved_events(&mut self) {
        self.event_history.retain(|event| !event.resolved);
    }
}

impl Default for CentralAlarmPanel {
    fn default() -> Self {
        Self::new()
    }
}
