use crate::alarm::CentralAlarmPanel;
use crate::diagnostics::DiagnosticsReport;
use crate::protocol::{ProtocolHandler, StatusPacket, SystemSummary};
use crate::subsystems::{
    BilgeAlarmSystem, EmergencyShutdownSystem, Fault, FireDetectionSystem, PowerSource, Subsystem,
};
use heapless::Vec;
use serde::{Deserialize, Serialize};

const STATUS_BUFFER_SIZE: usize = 128;
const DEFAULT_STATUS_RATE_HZ: u8 = 1;

/// Periodically snapshots the safety systems into status packets.
#[derive(Debug)]
pub struct StatusCollector {
    protocol_handler: ProtocolHandler,
    status_rate_hz: u8,
    last_collection_time: u64,
    packet_counter: u32,

    // Preallocated status storage
    status_buffer: Vec<StatusPacket, STATUS_BUFFER_SIZE>,
    serialized_buffer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusMetrics {
    pub packets_generated: u32,
    pub buffer_utilization_percent: u8,
}

impl StatusCollector {
    pub fn new() -> Self {
        Self {
            protocol_handler: ProtocolHandler::new(),
            status_rate_hz: DEFAULT_STATUS_RATE_HZ,
            last_collection_time: 0,
            packet_counter: 0,
            status_buffer: Vec::new(),
            serialized_buffer: String::new(),
        }
    }

    pub fn set_status_rate(&mut self, rate_hz: u8) {
        self.status_rate_hz = rate_hz.clamp(1, 10);
    }

    pub fn status_rate(&self) -> u8 {
        self.status_rate_hz
    }

    pub fn should_collect(&self, current_time: u64) -> bool {
        let interval_ms = 1000 / self.status_rate_hz as u64;
        current_time >= self.last_collection_time + interval_ms
    }

    #[allow(clippy::too_many_arguments)]
    pub fn collect_status(
        &mut self,
        current_time: u64,
        uptime_seconds: u64,
        last_command_id: u32,
        fire: &FireDetectionSystem,
        esd: &EmergencyShutdownSystem,
        bilge: &BilgeAlarmSystem,
        panel: &CentralAlarmPanel,
        faults: &[Fault],
        last_diagnostics: Option<&DiagnosticsReport>,
    ) -> Result<Option<&str>, &'static str> {
        if !self.should_collect(current_time) {
            return Ok(None);
        }

        let panel_state = panel.get_state().clone();
        let system = SystemSummary {
            general_alarm: panel_state.general_alarm,
            maintenance_active: panel_state.maintenance.any_active(),
            uptime_seconds,
            last_command_id,
            status_rate_hz: self.status_rate_hz,
        };

        let packet = self.protocol_handler.create_status_packet(
            system,
            fire.get_state(),
            esd.get_state(),
            bilge.get_state(),
            panel_state,
            faults.to_vec(),
            last_diagnostics.cloned(),
            current_time,
        );

        self.serialized_buffer = match self.protocol_handler.serialize_status(&packet) {
            Ok(s) => s.to_string(),
            Err(_) => return Err("Serialization failed"),
        };

        // Circular buffer behavior
        if self.status_buffer.is_full() {
            self.status_buffer.remove(0);
        }
        if self.status_buffer.push(packet).is_err() {
            return Err("Status buffer full");
        }

        self.last_collection_time = current_time;
        self.packet_counter = self.packet_counter.wrapping_add(1);

        Ok(Some(&self.serialized_buffer))
    }

    pub fn get_status_buffer(&self) -> &[StatusPacket] {
        &self.status_buffer
    }

    pub fn get_latest_status(&self) -> Option<&StatusPacket> {
        self.status_buffer.last()
    }

    pub fn get_metrics(&self) -> StatusMetrics {
        StatusMetrics {
            packets_generated: self.packet_counter,
            buffer_utilization_percent: ((self.status_buffer.len() * 100) / STATUS_BUFFER_SIZE)
                as u8,
        }
    }

    pub fn clear_buffer(&mut self) {
        self.status_buffer.clear();
        self.packet_counter = 0;
    }

    pub fn export_csv_headers(&self) -> &'static str {
        "timestamp,sequence,general_alarm,maintenance_active,uptime_s,\
         fire_alarm,fire_power,alarmed_detector,\
         shutdown_active,main_valve,aux_valve,shutdown_elapsed_ms,\
         bilge_alarm,bilge_power,\
         fault_count"
    }

    pub fn export_packet_csv(&self, packet: &StatusPacket) -> Result<heapless::String<512>, &'static str> {
        let mut csv_line = heapless::String::new();

        let csv_string = format!(
            "{},{},{},{},{},{},{},{},{},{:?},{:?},{},{},{},{}",
            packet.timestamp,
            packet.sequence_number,
            packet.system.general_alarm,
            packet.system.maintenance_active,
            packet.system.uptime_seconds,
            packet.fire.alarms.active(),
            power_source_label(packet.fire.power_source),
            packet
                .fire
                .alarmed_detector
                .map_or(-1, |d| d as i32),
            packet.esd.shutdown_active,
            packet.esd.main_valve.position,
            packet.esd.aux_valve.position,
            packet.esd.shutdown_elapsed_ms,
            packet.bilge.compartments.iter().any(|c| c.alarm.active()),
            power_source_label(packet.bilge.power_source),
            packet.faults.len()
        );

        csv_line.push_str(&csv_string).map_err(|_| "CSV formatting failed")?;

        Ok(csv_line)
    }
}

impl Default for StatusCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn power_source_label(source: PowerSource) -> &'static str {
    match source {
        PowerSource::Main => "main",
        PowerSource::Emergency => "emergency",
        PowerSource::Failed => "failed",
    }
}
