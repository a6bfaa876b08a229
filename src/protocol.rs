use crate::alarm::PanelState;
use crate::diagnostics::DiagnosticsReport;
use crate::subsystems::{
    BilgeState, EsdState, EsdStation, Fault, FaultType, FireState, SubsystemId,
};
use crate::subsystems::{COMPARTMENT_COUNT, DETECTOR_COUNT};
use arrayvec::ArrayString;
use heapless::Vec;
use serde::{Deserialize, Serialize};

pub const MAX_COMMAND_SIZE: usize = 512;
pub const MAX_RESPONSE_SIZE: usize = 1024;
pub const MAX_STATUS_SIZE: usize = 4096;

pub type CommandBuffer = ArrayString<MAX_COMMAND_SIZE>;
pub type ResponseBuffer = ArrayString<MAX_RESPONSE_SIZE>;
pub type StatusBuffer = ArrayString<MAX_STATUS_SIZE>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    pub id: u32,
    pub timestamp: u64,
    pub command_type: CommandType,
    pub execution_time: Option<u64>, // Optional scheduled execution time (None = immediate)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CommandType {
    Ping,
    SystemStatus,
    SetDetectorTemperature { detector: u8, temp_c: f32 },
    SetDetectorSmoke { detector: u8, obscuration: f32 },
    SetWaterLevel { compartment: u8, level_mm: f32 },
    ActivateShutdown { station: EsdStation },
    ResetShutdown,
    SetMaintenanceMode { target: SubsystemId, enabled: bool, expires_at: Option<u64> },
    AcknowledgeAlarms,
    SimulateFault { target: SubsystemId, fault_type: FaultType },
    ClearFaults { target: Option<SubsystemId> },
    CutMainPower,
    RestoreMainPower,
    RunDiagnostics,
    SetFaultInjection { enabled: bool },
    GetFaultInjectionStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    pub id: u32,
    pub timestamp: u64,
    pub status: ResponseStatus,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    Success,
    Error,
    InvalidCommand,
    SystemBusy,
    Scheduled, // Command scheduled for future execution

    // ACK/NACK lifecycle
    Acknowledged,
    NegativeAck,
    ExecutionStarted,
    ExecutionFailed,
    Timeout,
    InProgress,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusPacket {
    pub timestamp: u64,
    pub sequence_number: u32,
    pub system: SystemSummary,
    pub fire: FireState,
    pub esd: EsdState,
    pub bilge: BilgeState,
    pub panel: PanelState,
    pub faults: std::vec::Vec<Fault>,
    pub last_diagnostics: Option<DiagnosticsReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSummary {
    pub general_alarm: bool,
    pub maintenance_active: bool,
    pub uptime_seconds: u64,
    pub last_command_id: u32,
    pub status_rate_hz: u8,
}

const MAX_TRACKED_COMMANDS: usize = 16;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandTracker {
    pub command_id: u32,
    pub timestamp: u64,
    pub status: ResponseStatus,
    pub execution_start_time: Option<u64>,
    pub timeout_ms: u64,
    pub last_update: u64,
}

impl CommandTracker {
    pub fn new(command_id: u32, timestamp: u64, timeout_ms: u64) -> Self {
        Self {
            command_id,
            timestamp,
            status: ResponseStatus::Acknowledged,
            execution_start_time: None,
            timeout_ms,
            last_update: timestamp,
        }
    }

    pub fn is_expired(&self, current_time: u64) -> bool {
        current_time > self.timestamp + self.timeout_ms
    }

    pub fn update_status(&mut self, status: ResponseStatus, current_time: u64) {
        self.status = status;
        self.last_update = current_time;

        if matches!(status, ResponseStatus::ExecutionStarted) {
            self.execution_start_time = Some(current_time);
        }
    }
}

#[derive(Debug)]
pub struct ProtocolHandler {
    sequence_counter: u32,
    command_counter: u32,

    // Preallocated buffers
    command_buffer: CommandBuffer,
    response_buffer: ResponseBuffer,
    status_buffer: StatusBuffer,

    tracked_commands: Vec<CommandTracker, MAX_TRACKED_COMMANDS>,
}

impl ProtocolHandler {
    pub fn new() -> Self {
        Self {
            sequence_counter: 0,
            command_counter: 0,
            command_buffer: ArrayString::new(),
            response_buffer: ArrayString::new(),
            status_buffer: ArrayString::new(),
            tracked_commands: Vec::new(),
        }
    }

    pub fn parse_command(&mut self, json_str: &str) -> Result<Command, ProtocolError> {
        self.command_buffer.clear();
        if json_str.len() > MAX_COMMAND_SIZE {
            return Err(ProtocolError::MessageTooLarge);
        }
        self.command_buffer.push_str(json_str);

        serde_json::from_str::<Command>(json_str).map_err(|_| ProtocolError::InvalidJson)
    }

    pub fn serialize_response(
        &mut self,
        response: &CommandResponse,
    ) -> Result<&str, ProtocolError> {
        self.response_buffer.clear();

        let json_str =
            serde_json::to_string(response).map_err(|_| ProtocolError::SerializationError)?;

        if json_str.len() > MAX_RESPONSE_SIZE {
            return Err(ProtocolError::MessageTooLarge);
        }
        self.response_buffer.push_str(&json_str);

        Ok(&self.response_buffer)
    }

    pub fn serialize_status(&mut self, packet: &StatusPacket) -> Result<&str, ProtocolError> {
        self.status_buffer.clear();

        let json_str =
            serde_json::to_string(packet).map_err(|_| ProtocolError::SerializationError)?;

        if json_str.len() > MAX_STATUS_SIZE {
            return Err(ProtocolError::MessageTooLarge);
        }
        self.status_buffer.push_str(&json_str);

        Ok(&self.status_buffer)
    }

    pub fn create_response(
        &mut self,
        command_id: u32,
        status: ResponseStatus,
        message: Option<&str>,
    ) -> CommandResponse {
        CommandResponse {
            id: command_id,
            timestamp: self.get_timestamp(),
            status,
            message: message.map(|msg| msg.to_string()),
        }
    }

    pub fn create_status_packet(
        &mut self,
        system: SystemSummary,
        fire: FireState,
        esd: EsdState,
        bilge: BilgeState,
        panel: PanelState,
        faults: std::vec::Vec<Fault>,
        last_diagnostics: Option<DiagnosticsReport>,
        timestamp: u64,
    ) -> StatusPacket {
        self.sequence_counter = self.sequence_counter.wrapping_add(1);

        StatusPacket {
            timestamp,
            sequence_number: self.sequence_counter,
            system,
            fire,
            esd,
            bilge,
            panel,
            faults,
            last_diagnostics,
        }
    }

    pub fn next_command_id(&mut self) -> u32 {
        self.command_counter = self.command_counter.wrapping_add(1);
        self.command_counter
    }

    fn get_timestamp(&self) -> u64 {
        self.sequence_counter as u64 * 1000
    }

    pub fn validate_command(&self, command: &Command) -> Result<(), ProtocolError> {
        if command.id == 0 {
            return Err(ProtocolError::InvalidCommand);
        }

        // Out-of-range parameters are rejected, never clamped
        match &command.command_type {
            CommandType::SetDetectorTemperature { detector, temp_c } => {
                if *detector as usize >= DETECTOR_COUNT {
                    return Err(ProtocolError::InvalidParameter);
                }
                if !temp_c.is_finite() || !(-40.0..=150.0).contains(temp_c) {
                    return Err(ProtocolError::InvalidParameter);
                }
            }
            CommandType::SetDetectorSmoke { detector, obscuration } => {
                if *detector as usize >= DETECTOR_COUNT {
                    return Err(ProtocolError::InvalidParameter);
                }
                if !obscuration.is_finite() || !(0.0..=1.0).contains(obscuration) {
                    return Err(ProtocolError::InvalidParameter);
                }
            }
            CommandType::SetWaterLevel { compartment, level_mm } => {
                if *compartment as usize >= COMPARTMENT_COUNT {
                    return Err(ProtocolError::InvalidParameter);
                }
                if !level_mm.is_finite() || *level_mm < 0.0 {
                    return Err(ProtocolError::InvalidParameter);
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Start tracking a command with initial ACK
    pub fn track_command(
        &mut self,
        command_id: u32,
        current_time: u64,
        timeout_ms: u64,
    ) -> Result<(), ProtocolError> {
        self.cleanup_expired_commands(current_time);

        if self.tracked_commands.iter().any(|t| t.command_id == command_id) {
            return Err(ProtocolError::InvalidCommand);
        }

        let tracker = CommandTracker::new(command_id, current_time, timeout_ms);
        if self.tracked_commands.push(tracker).is_err() {
            // Evict the oldest tracker when the buffer is full
            self.tracked_commands.swap_remove(0);
            let _ = self
                .tracked_commands
                .push(CommandTracker::new(command_id, current_time, timeout_ms));
        }

        Ok(())
    }

    pub fn update_command_status(
        &mut self,
        command_id: u32,
        status: ResponseStatus,
        current_time: u64,
    ) -> Result<(), ProtocolError> {
        if let Some(tracker) = self
            .tracked_commands
            .iter_mut()
            .find(|t| t.command_id == command_id)
        {
            tracker.update_status(status, current_time);
            Ok(())
        } else {
            Err(ProtocolError::InvalidCommand)
        }
    }

    pub fn get_command_status(&self, command_id: u32) -> Option<&CommandTracker> {
        self.tracked_commands.iter().find(|t| t.command_id == command_id)
    }

    pub fn cleanup_expired_commands(&mut self, current_time: u64) {
        self.tracked_commands.retain(|tracker| !tracker.is_expired(current_time));
    }

    pub fn get_tracked_commands(&self) -> &[CommandTracker] {
        &self.tracked_commands
    }

    pub fn create_ack_response(&mut self, command_id: u32, message: Option<&str>) -> CommandResponse {
        self.create_response(command_id, ResponseStatus::Acknowledged, message)
    }

    pub fn create_nack_response(&mut self, command_id: u32, reason: &str) -> CommandResponse {
        self.create_response(command_id, ResponseStatus::NegativeAck, Some(reason))
    }

    pub fn create_execution_started_response(&mut self, command_id: u32) -> CommandResponse {
        self.create_response(
            command_id,
            ResponseStatus::ExecutionStarted,
            Some("Command execution started"),
        )
    }

    pub fn create_execution_failed_response(
        &mut self,
        command_id: u32,
        reason: &str,
    ) -> CommandResponse {
        self.create_response(command_id, ResponseStatus::ExecutionFailed, Some(reason))
    }

    pub fn create_timeout_response(&mut self, command_id: u32) -> CommandResponse {
        self.create_response(
            command_id,
            ResponseStatus::Timeout,
            Some("Command execution timed out"),
        )
    }
}

impl Default for ProtocolHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    InvalidJson,
    MessageTooLarge,
    SerializationError,
    InvalidCommand,
    InvalidParameter,
    BufferOverflow,
}

impl core::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ProtocolError::InvalidJson => write!(f, "Invalid JSON format"),
            ProtocolError::MessageTooLarge => write!(f, "Message exceeds buffer size"),
            ProtocolError::SerializationError => write!(f, "Serialization failed"),
            ProtocolError::InvalidCommand => write!(f, "Invalid command"),
            ProtocolError::InvalidParameter => write!(f, "Invalid parameter"),
            ProtocolError::BufferOverflow => write!(f, "Buffer overflow"),
        }
    }
}
