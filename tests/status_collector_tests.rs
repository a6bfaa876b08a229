use vesselsim::alarm::CentralAlarmPanel;
use vesselsim::subsystems::fire::FireCommand;
use vesselsim::subsystems::{
    BilgeAlarmSystem, EmergencyShutdownSystem, FireDetectionSystem, Subsystem,
};
use vesselsim::telemetry::StatusCollector;

fn collect_at(
    collector: &mut StatusCollector,
    current_time: u64,
    fire: &FireDetectionSystem,
    esd: &EmergencyShutdownSystem,
    bilge: &BilgeAlarmSystem,
    panel: &CentralAlarmPanel,
) -> Option<String> {
    collector
        .collect_status(current_time, 0, 0, fire, esd, bilge, panel, &[], None)
        .unwrap()
        .map(|s| s.to_string())
}

#[test]
fn test_status_rate_clamping() {
    let mut collector = StatusCollector::new();
    assert_eq!(collector.status_rate(), 1);

    collector.set_status_rate(0);
    assert_eq!(collector.status_rate(), 1);

    collector.set_status_rate(50);
    assert_eq!(collector.status_rate(), 10);

    collector.set_status_rate(5);
    assert_eq!(collector.status_rate(), 5);
}

#[test]
fn test_collection_respects_rate_interval() {
    let mut collector = StatusCollector::new();
    let fire = FireDetectionSystem::new();
    let esd = EmergencyShutdownSystem::new();
    let bilge = BilgeAlarmSystem::new();
    let panel = CentralAlarmPanel::new();

    // At 1 Hz, a packet goes out once the interval has elapsed
    assert!(collect_at(&mut collector, 1000, &fire, &esd, &bilge, &panel).is_some());
    assert!(collect_at(&mut collector, 1500, &fire, &esd, &bilge, &panel).is_none());
    assert!(collect_at(&mut collector, 2000, &fire, &esd, &bilge, &panel).is_some());

    let metrics = collector.get_metrics();
    assert_eq!(metrics.packets_generated, 2);
}

#[test]
fn test_status_packet_sequence_numbers_increase() {
    let mut collector = StatusCollector::new();
    let fire = FireDetectionSystem::new();
    let esd = EmergencyShutdownSystem::new();
    let bilge = BilgeAlarmSystem::new();
    let panel = CentralAlarmPanel::new();

    for t in 1..=5u64 {
        collect_at(&mut collector, t * 1000, &fire, &esd, &bilge, &panel);
    }

    let buffer = collector.get_status_buffer();
    assert_eq!(buffer.len(), 5);
    for window in buffer.windows(2) {
        assert!(window[1].sequence_number > window[0].sequence_number);
    }
}

#[test]
fn test_packet_reflects_subsystem_state() {
    let mut collector = StatusCollector::new();
    let mut fire = FireDetectionSystem::new();
    let esd = EmergencyShutdownSystem::new();
    let bilge = BilgeAlarmSystem::new();
    let mut panel = CentralAlarmPanel::new();

    fire.execute_command(FireCommand::SetDetectorTemperature(2, 90.0))
        .unwrap();
    fire.update(100).unwrap();
    panel.scan(1000, &fire, &esd, &bilge);

    let json = collect_at(&mut collector, 1000, &fire, &esd, &bilge, &panel).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed["system"]["general_alarm"], true);
    assert_eq!(parsed["fire"]["alarms"]["visual"], true);
    assert_eq!(parsed["fire"]["alarmed_detector"], 2);
    assert_eq!(parsed["esd"]["shutdown_active"], false);

    let latest = collector.get_latest_status().unwrap();
    assert!(latest.panel.general_alarm);
}

#[test]
fn test_csv_export_field_counts_match() {
    let mut collector = StatusCollector::new();
    let fire = FireDetectionSystem::new();
    let esd = EmergencyShutdownSystem::new();
    let bilge = BilgeAlarmSystem::new();
    let panel = CentralAlarmPanel::new();

    collect_at(&mut collector, 1000, &fire, &esd, &bilge, &panel);

    let headers = collector.export_csv_headers();
    let packet = collector.get_latest_status().unwrap().clone();
    let row = collector.export_packet_csv(&packet).unwrap();

    assert_eq!(
        headers.split(',').count(),
        row.split(',').count(),
        "CSV header and row field counts differ"
    );
}

#[test]
fn test_clear_buffer() {
    let mut collector = StatusCollector::new();
    let fire = FireDetectionSystem::new();
    let esd = EmergencyShutdownSystem::new();
    let bilge = BilgeAlarmSystem::new();
    let panel = CentralAlarmPanel::new();

    collect_at(&mut collector, 1000, &fire, &esd, &bilge, &panel);
    assert_eq!(collector.get_status_buffer().len(), 1);

    collector.clear_buffer();
    assert!(collector.get_status_buffer().is_empty());
    assert!(collector.get_latest_status().is_none());
}
