use vesselsim::agent::AgentError;
use vesselsim::protocol::*;
use vesselsim::subsystems::{FaultType, PowerSource, SubsystemId};
use vesselsim::SafetyAgent;

fn make_command(id: u32, command_type: CommandType) -> Command {
    Command {
        id,
        timestamp: 1000,
        command_type,
        execution_time: None,
    }
}

fn quiet_agent() -> SafetyAgent {
    let mut agent = SafetyAgent::new();
    agent.set_fault_injection_enabled(false);
    agent
}

#[test]
fn test_safety_agent_initialization() {
    let agent = SafetyAgent::new();
    let state = agent.get_state();

    assert!(!state.running);
    assert_eq!(state.uptime_seconds, 0);
    assert_eq!(state.command_count, 0);
    assert_eq!(state.status_count, 0);
    assert!(state.last_error.is_none());

    let panel_state = agent.get_panel_state();
    assert!(!panel_state.general_alarm);

    let (fire_state, esd_state, bilge_state) = agent.get_subsystem_states();
    assert!(!fire_state.alarms.active());
    assert!(!esd_state.shutdown_active);
    assert_eq!(bilge_state.power_source, PowerSource::Main);
}

#[test]
fn test_agent_start_stop_cycle() {
    let mut agent = quiet_agent();

    agent.start();
    assert!(agent.get_state().running);

    for _ in 0..5 {
        assert!(agent.update().is_ok());
    }

    agent.stop();
    assert!(!agent.get_state().running);
}

#[test]
fn test_ping_command_round_trip() {
    let mut agent = quiet_agent();
    agent.start();

    agent.queue_command(make_command(1, CommandType::Ping)).unwrap();
    agent.process_commands().unwrap();

    let responses = agent.get_responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].id, 1);
    assert_eq!(responses[0].status, ResponseStatus::Success);
    assert_eq!(agent.get_state().command_count, 1);
}

#[test]
fn test_detector_stimulus_raises_general_alarm() {
    let mut agent = quiet_agent();
    agent.start();

    agent
        .queue_command(make_command(
            1,
            CommandType::SetDetectorTemperature {
                detector: 0,
                temp_c: 90.0,
            },
        ))
        .unwrap();
    agent.process_commands().unwrap();
    agent.update().unwrap();

    let (fire_state, _, _) = agent.get_subsystem_states();
    assert!(fire_state.alarms.active());
    assert!(agent.get_panel_state().general_alarm);
}

#[test]
fn test_invalid_command_gets_nack() {
    let mut agent = quiet_agent();
    agent.start();

    agent
        .queue_command(make_command(
            1,
            CommandType::SetDetectorTemperature {
                detector: 99,
                temp_c: 30.0,
            },
        ))
        .unwrap();
    agent.process_commands().unwrap();

    let responses = agent.get_responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].status, ResponseStatus::NegativeAck);
    assert!(responses[0]
        .message
        .as_deref()
        .unwrap()
        .contains("validation failed"));
}

#[test]
fn test_shutdown_command_drives_valves() {
    let mut agent = quiet_agent();
    agent.start();

    agent
        .queue_command(make_command(
            1,
            CommandType::ActivateShutdown {
                station: vesselsim::subsystems::esd::EsdStation::Bridge,
            },
        ))
        .unwrap();
    agent.process_commands().unwrap();

    let responses = agent.get_responses();
    assert_eq!(responses[0].status, ResponseStatus::Success);

    let (_, esd_state, _) = agent.get_subsystem_states();
    assert!(esd_state.shutdown_active);
    assert_eq!(
        esd_state.initiating_station,
        Some(vesselsim::subsystems::esd::EsdStation::Bridge)
    );
}

#[test]
fn test_cut_power_switches_both_monitored_subsystems() {
    let mut agent = quiet_agent();
    agent.start();

    agent.queue_command(make_command(1, CommandType::CutMainPower)).unwrap();
    agent.process_commands().unwrap();

    let (fire_state, _, bilge_state) = agent.get_subsystem_states();
    assert_eq!(fire_state.power_source, PowerSource::Emergency);
    assert_eq!(bilge_state.power_source, PowerSource::Emergency);
    assert!(bilge_state.power_notification.pending || bilge_state.power_notification.sent);

    agent
        .queue_command(make_command(2, CommandType::RestoreMainPower))
        .unwrap();
    agent.process_commands().unwrap();

    let (fire_state, _, bilge_state) = agent.get_subsystem_states();
    assert_eq!(fire_state.power_source, PowerSource::Main);
    assert_eq!(bilge_state.power_source, PowerSource::Main);
}

#[test]
fn test_maintenance_mode_blocks_stimulus_commands() {
    let mut agent = quiet_agent();
    agent.start();

    agent
        .queue_command(make_command(
            1,
            CommandType::SetMaintenanceMode {
                target: SubsystemId::FireDetection,
                enabled: true,
                expires_at: None,
            },
        ))
        .unwrap();
    agent
        .queue_command(make_command(
            2,
            CommandType::SetDetectorTemperature {
                detector: 0,
                temp_c: 90.0,
            },
        ))
        .unwrap();
    agent.process_commands().unwrap();

    let responses = agent.get_responses();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0].status, ResponseStatus::Success);
    assert_eq!(responses[1].status, ResponseStatus::NegativeAck);
    assert!(responses[1]
        .message
        .as_deref()
        .unwrap()
        .contains("maintenance"));

    // The blocked stimulus never reached the detector
    let (fire_state, _, _) = agent.get_subsystem_states();
    assert!(!fire_state.alarms.active());
}

#[test]
fn test_diagnostics_blocked_during_maintenance() {
    let mut agent = quiet_agent();
    agent.start();

    agent
        .queue_command(make_command(
            1,
            CommandType::SetMaintenanceMode {
                target: SubsystemId::BilgeAlarm,
                enabled: true,
                expires_at: None,
            },
        ))
        .unwrap();
    agent
        .queue_command(make_command(2, CommandType::RunDiagnostics))
        .unwrap();
    agent.process_commands().unwrap();

    let responses = agent.get_responses();
    assert_eq!(responses[1].status, ResponseStatus::NegativeAck);
    assert!(responses[1]
        .message
        .as_deref()
        .unwrap()
        .contains("Diagnostics blocked"));
    assert!(agent.get_last_diagnostics().is_none());
}

#[test]
fn test_diagnostics_run_end_to_end() {
    let mut agent = quiet_agent();
    agent.start();

    agent
        .queue_command(make_command(1, CommandType::RunDiagnostics))
        .unwrap();
    agent.process_commands().unwrap();

    let responses = agent.get_responses();
    assert_eq!(responses[0].status, ResponseStatus::Success);

    let report = agent.get_last_diagnostics().unwrap();
    assert!(report.all_passed());

    // Self-test left no residual alarms behind
    let (fire_state, esd_state, bilge_state) = agent.get_subsystem_states();
    assert!(!fire_state.alarms.active());
    assert!(!esd_state.shutdown_active);
    assert!(bilge_state.compartments.iter().all(|c| !c.alarm.active()));
}

#[test]
fn test_diagnostics_report_failure_after_fault() {
    let mut agent = quiet_agent();
    agent.start();

    agent
        .queue_command(make_command(
            1,
            CommandType::SimulateFault {
                target: SubsystemId::FireDetection,
                fault_type: FaultType::Failed,
            },
        ))
        .unwrap();
    agent
        .queue_command(make_command(2, CommandType::RunDiagnostics))
        .unwrap();
    agent.process_commands().unwrap();

    let responses = agent.get_responses();
    assert_eq!(responses[1].status, ResponseStatus::Error);

    let report = agent.get_last_diagnostics().unwrap();
    assert!(!report.all_passed());
}

#[test]
fn test_command_rate_limiting() {
    let mut agent = quiet_agent();
    agent.start();

    let mut rejected = 0;
    for id in 1..=10u32 {
        if let Err(AgentError::RateLimitExceeded) =
            agent.queue_command(make_command(id, CommandType::Ping))
        {
            rejected += 1;
        }
    }

    assert!(rejected > 0, "Burst of 10 commands should hit the rate limit");
}

#[test]
fn test_acknowledge_clears_panel_events() {
    let mut agent = quiet_agent();
    agent.start();

    agent
        .queue_command(make_command(
            1,
            CommandType::SetDetectorTemperature {
                detector: 0,
                temp_c: 90.0,
            },
        ))
        .unwrap();
    agent.process_commands().unwrap();
    agent.update().unwrap();
    assert!(agent.get_panel_state().active_events > 0);

    agent
        .queue_command(make_command(2, CommandType::AcknowledgeAlarms))
        .unwrap();
    agent.process_commands().unwrap();
    assert_eq!(agent.get_panel_state().active_events, 0);
}

#[test]
fn test_fault_injection_toggle_via_command() {
    let mut agent = quiet_agent();
    agent.start();
    assert!(!agent.get_fault_injection_config().enabled);

    agent
        .queue_command(make_command(
            1,
            CommandType::SetFaultInjection { enabled: true },
        ))
        .unwrap();
    agent.process_commands().unwrap();
    assert!(agent.get_fault_injection_config().enabled);

    agent
        .queue_command(make_command(2, CommandType::GetFaultInjectionStatus))
        .unwrap();
    agent.process_commands().unwrap();

    let responses = agent.get_responses();
    let status_response = responses.iter().find(|r| r.id == 2).unwrap();
    let message = status_response.message.as_deref().unwrap();
    assert!(message.contains("fire_rate_percent"));
}

#[test]
fn test_scheduled_command_deferred_until_due() {
    let mut agent = quiet_agent();
    agent.start();

    // Schedule far enough ahead that it cannot run this cycle
    let future = 60_000;
    let command = Command {
        id: 1,
        timestamp: 1000,
        command_type: CommandType::Ping,
        execution_time: Some(future),
    };
    agent.queue_command(command).unwrap();
    agent.process_commands().unwrap();

    let responses = agent.get_responses();
    assert_eq!(responses[0].status, ResponseStatus::Scheduled);
    assert_eq!(agent.get_scheduler_stats().currently_scheduled, 1);
    assert_eq!(agent.get_scheduled_commands().len(), 1);

    agent.clear_scheduled_commands();
    assert_eq!(agent.get_scheduled_commands().len(), 0);
}

#[test]
fn test_scheduled_command_executes_at_release() {
    let mut agent = quiet_agent();
    agent.start();

    let command = Command {
        id: 77,
        timestamp: 1000,
        command_type: CommandType::Ping,
        execution_time: Some(1500),
    };
    agent.queue_command(command).unwrap();
    agent.process_commands().unwrap();

    let responses = agent.get_responses();
    assert_eq!(responses[0].status, ResponseStatus::Scheduled);

    // Let the execution time pass, then run a cycle to release it
    std::thread::sleep(std::time::Duration::from_millis(2000));
    agent.update().unwrap();

    let responses = agent.get_responses();
    let released = responses.iter().find(|r| r.id == 77).unwrap();
    assert_eq!(released.status, ResponseStatus::Success);
    assert_eq!(agent.get_scheduler_stats().total_released, 1);
    assert_eq!(agent.get_scheduled_commands().len(), 0);
}

#[test]
fn test_maintenance_mode_blocks_power_commands() {
    let mut agent = quiet_agent();
    agent.start();

    agent
        .queue_command(make_command(
            1,
            CommandType::SetMaintenanceMode {
                target: SubsystemId::FireDetection,
                enabled: true,
                expires_at: None,
            },
        ))
        .unwrap();
    agent.queue_command(make_command(2, CommandType::CutMainPower)).unwrap();
    agent.process_commands().unwrap();

    let responses = agent.get_responses();
    assert_eq!(responses[1].status, ResponseStatus::NegativeAck);
    assert!(responses[1]
        .message
        .as_deref()
        .unwrap()
        .contains("maintenance"));

    // The supply never changed over
    let (fire_state, _, bilge_state) = agent.get_subsystem_states();
    assert_eq!(fire_state.power_source, PowerSource::Main);
    assert_eq!(bilge_state.power_source, PowerSource::Main);
}

#[test]
fn test_status_packet_generation() {
    let mut agent = quiet_agent();
    agent.start();

    // The collector runs at 1 Hz, so let a full interval elapse first
    std::thread::sleep(std::time::Duration::from_millis(1100));
    let status = agent.update().unwrap();
    assert!(status.is_some());

    let packet: StatusPacket = serde_json::from_str(&status.unwrap()).unwrap();
    assert_eq!(packet.fire.detectors.len(), 10);
    assert_eq!(packet.bilge.compartments.len(), 5);
    assert!(!packet.system.general_alarm);
}
