use crate::alarm::{CentralAlarmPanel, PanelState};
use crate::diagnostics::{DiagnosticsReport, DiagnosticsRunner};
use crate::fault_injection::FaultInjector;
use crate::protocol::{
    Command, CommandResponse, CommandType, ProtocolError, ProtocolHandler, ResponseStatus,
};
use crate::scheduler::CommandScheduler;
use crate::subsystems::{
    BilgeAlarmSystem, BilgeCommand, EmergencyShutdownSystem, EsdCommand, FaultType, FireCommand,
    FireDetectionSystem, Subsystem, SubsystemId,
};
use crate::telemetry::StatusCollector;
use heapless::{spsc::Queue, Vec};
use serde::{Deserialize, Serialize};
use std::time::Instant;

const MAX_COMMAND_QUEUE_SIZE: usize = 32;
// Status reporting rate: 1 Hz (1000ms) main loop
const MAIN_LOOP_PERIOD_MS: u64 = 1000;

// Command rate limits for the operator link
const MAX_COMMAND_RATE_PER_SEC: u32 = 5; // Burst capacity
const AVG_COMMAND_RATE_PER_SEC: u32 = 2; // Average sustained rate
const RATE_LIMIT_WINDOW_MS: u64 = 1000;

type CommandQueue = Queue<Command, MAX_COMMAND_QUEUE_SIZE>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    pub running: bool,
    pub uptime_seconds: u64,
    pub command_count: u32,
    pub status_count: u32,
    pub last_error: Option<String>,
    pub performance_stats: PerformanceStats,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct PerformanceStats {
    pub loop_time_us: u32,
    pub command_processing_time_us: u32,
    pub status_generation_time_us: u32,
    pub panel_scan_time_us: u32,
    pub memory_usage_bytes: u32,
}

pub struct SafetyAgent {
    // Core subsystems
    fire_system: FireDetectionSystem,
    esd_system: EmergencyShutdownSystem,
    bilge_system: BilgeAlarmSystem,

    // Protocol and status reporting
    protocol_handler: ProtocolHandler,
    status_collector: StatusCollector,
    alarm_panel: CentralAlarmPanel,
    diagnostics_runner: DiagnosticsRunner,
    fault_injector: FaultInjector,
    command_scheduler: CommandScheduler,
    last_diagnostics: Option<DiagnosticsReport>,

    // Agent state
    state: AgentState,
    start_time: Instant,

    // Command processing
    command_queue: CommandQueue,

    // Rate limiting for the operator link
    command_timestamps: Vec<Instant, 16>,

    // Preallocated buffers
    response_buffer: Vec<CommandResponse, 16>,

    // Performance monitoring
    loop_start_time: Instant,
    performance_history: [PerformanceStats; 16],
    performance_index: usize,
}

impl SafetyAgent {
    pub fn new() -> Self {
        let start_time = Instant::now();

        Self {
            fire_system: FireDetectionSystem::new(),
            esd_system: EmergencyShutdownSystem::new(),
            bilge_system: BilgeAlarmSystem::new(),
            protocol_handler: ProtocolHandler::new(),
            status_collector: StatusCollector::new(),
            alarm_panel: CentralAlarmPanel::new(),
            diagnostics_runner: DiagnosticsRunner::new(),
            fault_injector: FaultInjector::new(),
            command_scheduler: CommandScheduler::new(),
            last_diagnostics: None,
            state: AgentState {
                running: false,
                uptime_seconds: 0,
                command_count: 0,
                status_count: 0,
                last_error: None,
                performance_stats: PerformanceStats::default(),
            },
            start_time,
            command_queue: Queue::new(),
            command_timestamps: Vec::new(),
            response_buffer: Vec::new(),
            loop_start_time: start_time,
            performance_history: [PerformanceStats::default(); 16],
            performance_index: 0,
        }
    }

    pub fn start(&mut self) {
        self.state.running = true;
        self.start_time = Instant::now();

        println!("🚢 Vessel Safety Systems Simulator starting...");
        println!("   Fire Detection System: ✓");
        println!("   Emergency Shutdown System: ✓");
        println!("   Bilge Alarm System: ✓");
        println!("   Central Alarm Panel: ✓");
        println!("   Status Collector: ✓");
        println!("📡 Ready for commands on TCP port 8080");
    }

    pub fn stop(&mut self) {
        self.state.running = false;
        println!("🛑 Vessel Safety Systems Simulator stopping...");
    }

    pub fn update(&mut self) -> Result<Option<String>, AgentError> {
        if !self.state.running {
            return Ok(None);
        }

        self.loop_start_time = Instant::now();
        self.state.uptime_seconds = self.start_time.elapsed().as_secs();

        let current_time = self.current_time_ms();
        self.protocol_handler.cleanup_expired_commands(current_time);

        self.process_scheduled_commands()?;
        self.process_commands()?;
        self.update_subsystems()?;

        // Fault injection runs before the panel scan so injected failures
        // show up on the same cycle
        self.process_fault_injection()?;
        self.scan_alarm_panel()?;

        let status = self.generate_status()?;
        self.update_performance_stats();

        Ok(status)
    }

    fn current_time_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// Which subsystem a command stimulates, for maintenance gating.
    fn command_target(command_type: &CommandType) -> Option<SubsystemId> {
        match command_type {
            CommandType::SetDetectorTemperature { .. } | CommandType::SetDetectorSmoke { .. } => {
                Some(SubsystemId::FireDetection)
            }
            CommandType::ActivateShutdown { .. } | CommandType::ResetShutdown => {
                Some(SubsystemId::EmergencyShutdown)
            }
            CommandType::SetWaterLevel { .. } => Some(SubsystemId::BilgeAlarm),
            CommandType::SimulateFault { target, .. } => Some(*target),
            _ => None,
        }
    }

    fn execute_command(&mut self, command: Command) -> Result<CommandResponse, AgentError> {
        let current_time = self.current_time_ms();

        // Handle scheduled commands. Tracking starts at release time, not
        // here; a deferred command must not hold its id in the tracker while
        // it waits.
        if let Some(execution_time) = command.execution_time {
            if execution_time > current_time {
                self.command_scheduler
                    .schedule_command(command.clone(), current_time)
                    .map_err(|e| AgentError::SchedulingError(e.to_string()))?;

                return Ok(self.protocol_handler.create_response(
                    command.id,
                    ResponseStatus::Scheduled,
                    Some(&format!("Command scheduled for execution at {}", execution_time)),
                ));
            }
        }

        // Start tracking command for ACK/NACK semantics (30 second timeout)
        if self
            .protocol_handler
            .track_command(command.id, current_time, 30000)
            .is_err()
        {
            return Ok(self.protocol_handler.create_nack_response(
                command.id,
                "Command already being processed or tracking failed",
            ));
        }

        if let Err(e) = self.protocol_handler.validate_command(&command) {
            let _ = self.protocol_handler.update_command_status(
                command.id,
                ResponseStatus::NegativeAck,
                current_time,
            );
            return Ok(self
                .protocol_handler
                .create_nack_response(command.id, &format!("Command validation failed: {}", e)));
        }

        let _ = self.protocol_handler.update_command_status(
            command.id,
            ResponseStatus::Acknowledged,
            current_time,
        );

        // A subsystem under maintenance does not accept stimulus commands
        if let Some(target) = Self::command_target(&command.command_type) {
            if self.alarm_panel.maintenance().covers(target) {
                let _ = self.protocol_handler.update_command_status(
                    command.id,
                    ResponseStatus::NegativeAck,
                    current_time,
                );
                return Ok(self.protocol_handler.create_nack_response(
                    command.id,
                    "Command blocked - subsystem under maintenance",
                ));
            }
        }
        // Power changeover stimulates both monitored subsystems, so it is
        // blocked while either of them is under maintenance
        if matches!(
            command.command_type,
            CommandType::CutMainPower | CommandType::RestoreMainPower
        ) && (self.alarm_panel.maintenance().covers(SubsystemId::FireDetection)
            || self.alarm_panel.maintenance().covers(SubsystemId::BilgeAlarm))
        {
            let _ = self.protocol_handler.update_command_status(
                command.id,
                ResponseStatus::NegativeAck,
                current_time,
            );
            return Ok(self.protocol_handler.create_nack_response(
                command.id,
                "Command blocked - subsystem under maintenance",
            ));
        }
        if matches!(command.command_type, CommandType::RunDiagnostics)
            && self.alarm_panel.maintenance().any_active()
        {
            let _ = self.protocol_handler.update_command_status(
                command.id,
                ResponseStatus::NegativeAck,
                current_time,
            );
            return Ok(self.protocol_handler.create_nack_response(
                command.id,
                "Diagnostics blocked - subsystem under maintenance",
            ));
        }

        let _ = self.protocol_handler.update_command_status(
            command.id,
            ResponseStatus::ExecutionStarted,
            current_time,
        );

        let response_status = match command.command_type {
            CommandType::Ping => ResponseStatus::Success,

            CommandType::SystemStatus => ResponseStatus::Success,

            CommandType::SetDetectorTemperature { detector, temp_c } => {
                match self
                    .fire_system
                    .execute_command(FireCommand::SetDetectorTemperature(detector, temp_c))
                {
                    Ok(_) => ResponseStatus::Success,
                    Err(_) => ResponseStatus::Error,
                }
            }

            CommandType::SetDetectorSmoke { detector, obscuration } => {
                match self
                    .fire_system
                    .execute_command(FireCommand::SetDetectorSmoke(detector, obscuration))
                {
                    Ok(_) => ResponseStatus::Success,
                    Err(_) => ResponseStatus::Error,
                }
            }

            CommandType::SetWaterLevel { compartment, level_mm } => {
                match self
                    .bilge_system
                    .execute_command(BilgeCommand::SetWaterLevel(compartment, level_mm))
                {
                    Ok(_) => ResponseStatus::Success,
                    Err(_) => ResponseStatus::Error,
                }
            }

            CommandType::ActivateShutdown { station } => {
                match self
                    .esd_system
                    .execute_command(EsdCommand::ActivateShutdown(station))
                {
                    Ok(_) => ResponseStatus::Success,
                    Err(_) => ResponseStatus::Error,
                }
            }

            CommandType::ResetShutdown => {
                match self.esd_system.execute_command(EsdCommand::ResetShutdown) {
                    Ok(_) => ResponseStatus::Success,
                    Err(_) => ResponseStatus::Error,
                }
            }

            CommandType::SetMaintenanceMode { target, enabled, expires_at } => {
                self.alarm_panel.set_maintenance(target, enabled, expires_at);
                ResponseStatus::Success
            }

            CommandType::AcknowledgeAlarms => {
                self.alarm_panel.acknowledge_all();
                ResponseStatus::Success
            }

            CommandType::SimulateFault { target, fault_type } => {
                match target {
                    SubsystemId::FireDetection => self.fire_system.inject_fault(fault_type),
                    SubsystemId::EmergencyShutdown => self.esd_system.inject_fault(fault_type),
                    SubsystemId::BilgeAlarm => self.bilge_system.inject_fault(fault_type),
                }
                ResponseStatus::Success
            }

            CommandType::ClearFaults { target } => {
                match target {
                    Some(SubsystemId::FireDetection) => {
                        self.fire_system.clear_faults();
                        self.fault_injector.clear_faults(Some(SubsystemId::FireDetection));
                    }
                    Some(SubsystemId::EmergencyShutdown) => {
                        self.esd_system.clear_faults();
                        self.fault_injector.clear_faults(Some(SubsystemId::EmergencyShutdown));
                    }
                    Some(SubsystemId::BilgeAlarm) => {
                        self.bilge_system.clear_faults();
                        self.fault_injector.clear_faults(Some(SubsystemId::BilgeAlarm));
                    }
                    None => {
                        self.fire_system.clear_faults();
                        self.esd_system.clear_faults();
                        self.bilge_system.clear_faults();
                        self.fault_injector.clear_faults(None);
                    }
                }
                ResponseStatus::Success
            }

            CommandType::CutMainPower => {
                // Both monitored subsystems change over to the emergency supply
                self.fire_system.execute_command(FireCommand::CutMainPower).ok();
                self.bilge_system.execute_command(BilgeCommand::CutMainPower).ok();
                ResponseStatus::Success
            }

            CommandType::RestoreMainPower => {
                self.fire_system.execute_command(FireCommand::RestoreMainPower).ok();
                self.bilge_system.execute_command(BilgeCommand::RestoreMainPower).ok();
                ResponseStatus::Success
            }

            CommandType::RunDiagnostics => {
                let report = self.diagnostics_runner.run_all(
                    &mut self.fire_system,
                    &mut self.esd_system,
                    &mut self.bilge_system,
                    current_time,
                );
                let all_passed = report.all_passed();
                self.last_diagnostics = Some(report);
                if all_passed {
                    ResponseStatus::Success
                } else {
                    ResponseStatus::Error
                }
            }

            CommandType::SetFaultInjection { enabled } => {
                self.fault_injector.set_enabled(enabled);
                ResponseStatus::Success
            }

            CommandType::GetFaultInjectionStatus => ResponseStatus::Success,
        };

        let response_message = match &command.command_type {
            CommandType::GetFaultInjectionStatus => {
                let stats = self.fault_injector.get_stats();
                let config = self.fault_injector.get_config();
                Some(format!(
                    r#"{{"config":{{"enabled":{},"fire_rate_percent":{},"esd_rate_percent":{},"bilge_rate_percent":{}}},"stats":{{"total_faults_injected":{},"current_active_faults":{}}}}}"#,
                    config.enabled,
                    config.fire_rate_percent,
                    config.esd_rate_percent,
                    config.bilge_rate_percent,
                    stats.total_faults_injected,
                    stats.current_active_faults
                ))
            }
            CommandType::RunDiagnostics => self
                .last_diagnostics
                .as_ref()
                .and_then(|report| serde_json::to_string(report).ok()),
            _ => None,
        };

        let final_status = match response_status {
            ResponseStatus::Success => ResponseStatus::Success,
            ResponseStatus::Error => ResponseStatus::ExecutionFailed,
            _ => response_status,
        };

        let _ = self
            .protocol_handler
            .update_command_status(command.id, final_status, current_time);

        Ok(self.protocol_handler.create_response(
            command.id,
            response_status,
            response_message.as_deref(),
        ))
    }

    fn process_scheduled_commands(&mut self) -> Result<(), AgentError> {
        let current_time = self.current_time_ms();

        self.command_scheduler.cleanup_expired_commands(current_time);

        let ready_commands = self.command_scheduler.get_ready_commands(current_time);

        for command in ready_commands {
            // Requeue with execution_time cleared so it runs immediately
            let mut immediate_command = command;
            immediate_command.execution_time = None;

            if let Err(e) = self.queue_command_immediate(immediate_command) {
                self.state.last_error = Some(format!("Scheduled command error: {}", e));
            }
        }

        Ok(())
    }

    fn process_fault_injection(&mut self) -> Result<(), AgentError> {
        let current_time = self.current_time_ms();
        let fault_actions = self.fault_injector.update(current_time);

        for (subsystem, fault_option) in fault_actions {
            match subsystem {
                SubsystemId::FireDetection => match fault_option {
                    Some(fault_type) => self.fire_system.inject_fault(fault_type),
                    None => self.fire_system.clear_faults(),
                },
                SubsystemId::EmergencyShutdown => match fault_option {
                    Some(fault_type) => self.esd_system.inject_fault(fault_type),
                    None => self.esd_system.clear_faults(),
                },
                SubsystemId::BilgeAlarm => match fault_option {
                    Some(fault_type) => self.bilge_system.inject_fault(fault_type),
                    None => self.bilge_system.clear_faults(),
                },
            }
        }

        Ok(())
    }

    fn update_subsystems(&mut self) -> Result<(), AgentError> {
        let dt_ms = MAIN_LOOP_PERIOD_MS as u16;

        if let Err(fault) = self.fire_system.update(dt_ms) {
            match fault {
                FaultType::Failed => {
                    self.state.last_error = Some("Fire detection system failed".to_string());
                }
                FaultType::Degraded => {}
                FaultType::Offline => {
                    return Err(AgentError::SubsystemError(
                        "Fire detection system offline".to_string(),
                    ));
                }
            }
        }

        if let Err(fault) = self.esd_system.update(dt_ms) {
            match fault {
                FaultType::Failed => {
                    self.state.last_error = Some("Emergency shutdown system failed".to_string());
                }
                FaultType::Degraded => {}
                FaultType::Offline => {
                    return Err(AgentError::SubsystemError(
                        "Emergency shutdown system offline".to_string(),
                    ));
                }
            }
        }

        if let Err(fault) = self.bilge_system.update(dt_ms) {
            match fault {
                FaultType::Failed => {
                    self.state.last_error = Some("Bilge alarm system failed".to_string());
                }
                FaultType::Degraded => {}
                FaultType::Offline => {
                    // Bilge monitoring offline does not halt the other systems
                }
            }
        }

        Ok(())
    }

    fn scan_alarm_panel(&mut self) -> Result<(), AgentError> {
        let start_time = Instant::now();
        let current_time = self.current_time_ms();

        self.alarm_panel.scan(
            current_time,
            &self.fire_system,
            &self.esd_system,
            &self.bilge_system,
        );

        self.state.performance_stats.panel_scan_time_us =
            start_time.elapsed().as_micros() as u32;

        Ok(())
    }

    fn generate_status(&mut self) -> Result<Option<String>, AgentError> {
        let start_time = Instant::now();
        let current_time = self.current_time_ms();

        let faults: std::vec::Vec<_> = self
            .fault_injector
            .get_active_faults()
            .iter()
            .map(|active| active.fault)
            .collect();

        let status = self
            .status_collector
            .collect_status(
                current_time,
                self.state.uptime_seconds,
                self.state.command_count,
                &self.fire_system,
                &self.esd_system,
                &self.bilge_system,
                &self.alarm_panel,
                &faults,
                self.last_diagnostics.as_ref(),
            )
            .map_err(|e| AgentError::StatusError(e.to_string()))?;

        if status.is_some() {
            self.state.status_count = self.state.status_count.saturating_add(1);
        }

        self.state.performance_stats.status_generation_time_us =
            start_time.elapsed().as_micros() as u32;

        Ok(status.map(|s| s.to_string()))
    }

    fn update_performance_stats(&mut self) {
        self.state.performance_stats.loop_time_us =
            self.loop_start_time.elapsed().as_micros() as u32;

        // Estimate memory usage (simplified)
        self.state.performance_stats.memory_usage_bytes = core::mem::size_of::<Self>() as u32
            + self.command_queue.len() as u32 * 64
            + self.response_buffer.len() as u32 * 128;

        self.performance_history[self.performance_index] = self.state.performance_stats;
        self.performance_index = (self.performance_index + 1) % self.performance_history.len();
    }

    fn cleanup_old_timestamps(&mut self, now: Instant) {
        let cutoff = now - std::time::Duration::from_millis(RATE_LIMIT_WINDOW_MS);
        self.command_timestamps.retain(|&ts| ts >= cutoff);
    }

    pub fn queue_command(&mut self, command: Command) -> Result<(), AgentError> {
        // Scheduled commands also go through the normal queue; execute_command
        // decides whether to defer them
        self.queue_command_immediate(command)
    }

    fn queue_command_immediate(&mut self, command: Command) -> Result<(), AgentError> {
        debug_assert!(
            self.command_queue.len() < MAX_COMMAND_QUEUE_SIZE,
            "Command queue length {} at capacity {}",
            self.command_queue.len(),
            MAX_COMMAND_QUEUE_SIZE
        );

        let now = Instant::now();
        self.cleanup_old_timestamps(now);

        // Burst rate limit
        if self.command_timestamps.len() >= MAX_COMMAND_RATE_PER_SEC as usize {
            return Err(AgentError::RateLimitExceeded);
        }

        // Sustained rate limit
        if self.command_timestamps.len() >= AVG_COMMAND_RATE_PER_SEC as usize {
            let window_start = now - std::time::Duration::from_millis(RATE_LIMIT_WINDOW_MS);
            let recent_commands = self
                .command_timestamps
                .iter()
                .filter(|&&ts| ts >= window_start)
                .count();

            if recent_commands >= AVG_COMMAND_RATE_PER_SEC as usize {
                return Err(AgentError::RateLimitExceeded);
            }
        }

        if self.command_timestamps.push(now).is_err() {
            self.command_timestamps.swap_remove(0);
            let _ = self.command_timestamps.push(now);
        }

        self.command_queue
            .enqueue(command)
            .map_err(|_| AgentError::CommandQueueFull)
    }

    pub fn process_commands(&mut self) -> Result<(), AgentError> {
        let start_time = Instant::now();

        while let Some(command) = self.command_queue.dequeue() {
            match self.execute_command(command) {
                Ok(response) => {
                    if self.response_buffer.push(response.clone()).is_err() {
                        // Response buffer full, drop the oldest
                        self.response_buffer.pop();
                        let _ = self.response_buffer.push(response);
                    }
                }
                Err(e) => {
                    self.state.last_error = Some(format!("Command error: {}", e));
                }
            }

            self.state.command_count = self.state.command_count.saturating_add(1);
        }

        self.state.performance_stats.command_processing_time_us =
            start_time.elapsed().as_micros() as u32;

        Ok(())
    }

    pub fn get_responses(&mut self) -> Vec<CommandResponse, 16> {
        core::mem::take(&mut self.response_buffer)
    }

    pub fn get_state(&self) -> &AgentState {
        &self.state
    }

    pub fn get_panel_state(&self) -> &PanelState {
        self.alarm_panel.get_state()
    }

    pub fn get_subsystem_states(
        &self,
    ) -> (
        crate::subsystems::FireState,
        crate::subsystems::EsdState,
        crate::subsystems::BilgeState,
    ) {
        (
            self.fire_system.get_state(),
            self.esd_system.get_state(),
            self.bilge_system.get_state(),
        )
    }

    pub fn get_last_diagnostics(&self) -> Option<&DiagnosticsReport> {
        self.last_diagnostics.as_ref()
    }

    pub fn get_performance_history(&self) -> &[PerformanceStats] {
        &self.performance_history
    }

    pub fn get_fault_injection_stats(&self) -> &crate::fault_injection::FaultInjectionStats {
        self.fault_injector.get_stats()
    }

    pub fn set_fault_injection_enabled(&mut self, enabled: bool) {
        self.fault_injector.set_enabled(enabled);
    }

    pub fn get_fault_injection_config(&self) -> &crate::fault_injection::FaultInjectionConfig {
        self.fault_injector.get_config()
    }

    pub fn get_scheduler_stats(&self) -> &crate::scheduler::SchedulerStats {
        self.command_scheduler.get_stats()
    }

    pub fn get_scheduled_commands(&self) -> &[crate::scheduler::ScheduledCommand] {
        self.command_scheduler.get_scheduled_commands()
    }

    pub fn clear_scheduled_commands(&mut self) {
        self.command_scheduler.clear_all_scheduled();
    }

    pub fn get_tracked_commands(&self) -> &[crate::protocol::CommandTracker] {
        self.protocol_handler.get_tracked_commands()
    }
}

impl Default for SafetyAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub enum AgentError {
    ProtocolError(ProtocolError),
    SubsystemError(String),
    StatusError(String),
    CommandQueueFull,
    RateLimitExceeded,
    SchedulingError(String),
}

impl core::fmt::Display for AgentError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AgentError::ProtocolError(e) => write!(f, "Protocol error: {}", e),
            AgentError::SubsystemError(e) => write!(f, "Subsystem error: {}", e),
            AgentError::StatusError(e) => write!(f, "Status error: {}", e),
            AgentError::CommandQueueFull => write!(f, "Command queue full"),
            AgentError::RateLimitExceeded => write!(f, "Command rate limit exceeded"),
            AgentError::SchedulingError(e) => write!(f, "Scheduling error: {}", e),
        }
    }
}

impl std::error::Error for AgentError {}
