use vesselsim::protocol::*;
use vesselsim::subsystems::esd::EsdStation;
use vesselsim::subsystems::SubsystemId;

#[test]
fn test_command_tracking_lifecycle() {
    let mut handler = ProtocolHandler::new();
    let current_time = 1000;

    let result = handler.track_command(123, current_time, 5000);
    assert!(result.is_ok());

    // Initial status is ACK
    let tracker = handler.get_command_status(123);
    assert!(tracker.is_some());
    assert!(matches!(tracker.unwrap().status, ResponseStatus::Acknowledged));

    // Execution start is recorded
    let result = handler.update_command_status(123, ResponseStatus::ExecutionStarted, current_time + 100);
    assert!(result.is_ok());

    let tracker = handler.get_command_status(123);
    assert!(tracker.is_some());
    assert!(matches!(tracker.unwrap().status, ResponseStatus::ExecutionStarted));
    assert!(tracker.unwrap().execution_start_time.is_some());

    // Completes successfully
    let result = handler.update_command_status(123, ResponseStatus::Success, current_time + 500);
    assert!(result.is_ok());

    let tracker = handler.get_command_status(123);
    assert!(tracker.is_some());
    assert!(matches!(tracker.unwrap().status, ResponseStatus::Success));
}

#[test]
fn test_command_timeout_cleanup() {
    let mut handler = ProtocolHandler::new();
    let current_time = 1000;

    let result = handler.track_command(456, current_time, 1000);
    assert!(result.is_ok());
    assert!(handler.get_command_status(456).is_some());

    // After the timeout window, cleanup removes the tracker
    handler.cleanup_expired_commands(current_time + 2000);
    assert!(handler.get_command_status(456).is_none());
}

#[test]
fn test_duplicate_command_rejection() {
    let mut handler = ProtocolHandler::new();
    let current_time = 1000;

    assert!(handler.track_command(789, current_time, 5000).is_ok());
    assert!(handler.track_command(789, current_time + 100, 5000).is_err());
}

#[test]
fn test_ack_and_nack_response_creation() {
    let mut handler = ProtocolHandler::new();

    let ack = handler.create_ack_response(42, None);
    assert_eq!(ack.id, 42);
    assert!(matches!(ack.status, ResponseStatus::Acknowledged));

    let nack = handler.create_nack_response(43, "Parameter out of range");
    assert_eq!(nack.id, 43);
    assert!(matches!(nack.status, ResponseStatus::NegativeAck));
    assert!(nack.message.as_deref().unwrap().contains("out of range"));

    let started = handler.create_execution_started_response(44);
    assert!(matches!(started.status, ResponseStatus::ExecutionStarted));

    let failed = handler.create_execution_failed_response(45, "Subsystem offline");
    assert!(matches!(failed.status, ResponseStatus::ExecutionFailed));

    let timeout = handler.create_timeout_response(46);
    assert!(matches!(timeout.status, ResponseStatus::Timeout));
}

#[test]
fn test_parse_valid_command() {
    let mut handler = ProtocolHandler::new();
    let json = r#"{"id":1,"timestamp":1000,"command_type":"Ping"}"#;

    let command = handler.parse_command(json).unwrap();
    assert_eq!(command.id, 1);
    assert!(matches!(command.command_type, CommandType::Ping));
    assert!(command.execution_time.is_none());
}

#[test]
fn test_parse_struct_variant_command() {
    let mut handler = ProtocolHandler::new();
    let json = r#"{"id":2,"timestamp":1000,"command_type":{"SetDetectorTemperature":{"detector":3,"temp_c":75.5}}}"#;

    let command = handler.parse_command(json).unwrap();
    match command.command_type {
        CommandType::SetDetectorTemperature { detector, temp_c } => {
            assert_eq!(detector, 3);
            assert!((temp_c - 75.5).abs() < f32::EPSILON);
        }
        other => panic!("Unexpected command type: {:?}", other),
    }
}

#[test]
fn test_parse_shutdown_command_with_station() {
    let mut handler = ProtocolHandler::new();
    let json = r#"{"id":3,"timestamp":1000,"command_type":{"ActivateShutdown":{"station":"EngineRoom"}}}"#;

    let command = handler.parse_command(json).unwrap();
    match command.command_type {
        CommandType::ActivateShutdown { station } => {
            assert_eq!(station, EsdStation::EngineRoom);
        }
        other => panic!("Unexpected command type: {:?}", other),
    }
}

#[test]
fn test_parse_invalid_json_rejected() {
    let mut handler = ProtocolHandler::new();

    assert!(handler.parse_command("not json").is_err());
    assert!(handler.parse_command(r#"{"id":1}"#).is_err());
}

#[test]
fn test_oversized_command_rejected() {
    let mut handler = ProtocolHandler::new();
    let oversized = format!(
        r#"{{"id":1,"timestamp":1000,"command_type":"Ping","padding":"{}"}}"#,
        "x".repeat(600)
    );

    assert!(matches!(
        handler.parse_command(&oversized),
        Err(ProtocolError::MessageTooLarge)
    ));
}

#[test]
fn test_validation_rejects_zero_command_id() {
    let handler = ProtocolHandler::new();
    let command = Command {
        id: 0,
        timestamp: 1000,
        command_type: CommandType::Ping,
        execution_time: None,
    };

    assert!(handler.validate_command(&command).is_err());
}

#[test]
fn test_validation_rejects_out_of_range_parameters() {
    let handler = ProtocolHandler::new();

    // Unknown detector index
    let command = Command {
        id: 1,
        timestamp: 1000,
        command_type: CommandType::SetDetectorTemperature {
            detector: 10,
            temp_c: 30.0,
        },
        execution_time: None,
    };
    assert!(handler.validate_command(&command).is_err());

    // Temperature outside the sensor range is rejected, not clamped
    let command = Command {
        id: 2,
        timestamp: 1000,
        command_type: CommandType::SetDetectorTemperature {
            detector: 0,
            temp_c: 500.0,
        },
        execution_time: None,
    };
    assert!(handler.validate_command(&command).is_err());

    // Obscuration above full scale
    let command = Command {
        id: 3,
        timestamp: 1000,
        command_type: CommandType::SetDetectorSmoke {
            detector: 0,
            obscuration: 1.5,
        },
        execution_time: None,
    };
    assert!(handler.validate_command(&command).is_err());

    // Negative water level
    let command = Command {
        id: 4,
        timestamp: 1000,
        command_type: CommandType::SetWaterLevel {
            compartment: 0,
            level_mm: -1.0,
        },
        execution_time: None,
    };
    assert!(handler.validate_command(&command).is_err());

    // Unknown compartment
    let command = Command {
        id: 5,
        timestamp: 1000,
        command_type: CommandType::SetWaterLevel {
            compartment: 9,
            level_mm: 100.0,
        },
        execution_time: None,
    };
    assert!(handler.validate_command(&command).is_err());
}

#[test]
fn test_validation_accepts_boundary_parameters() {
    let handler = ProtocolHandler::new();

    let command = Command {
        id: 1,
        timestamp: 1000,
        command_type: CommandType::SetDetectorTemperature {
            detector: 9,
            temp_c: 150.0,
        },
        execution_time: None,
    };
    assert!(handler.validate_command(&command).is_ok());

    let command = Command {
        id: 2,
        timestamp: 1000,
        command_type: CommandType::SetWaterLevel {
            compartment: 4,
            level_mm: 0.0,
        },
        execution_time: None,
    };
    assert!(handler.validate_command(&command).is_ok());
}

#[test]
fn test_response_serialization_round_trip() {
    let mut handler = ProtocolHandler::new();
    let response = CommandResponse {
        id: 7,
        timestamp: 1000,
        status: ResponseStatus::Success,
        message: Some("Detector stimulus applied".to_string()),
    };

    let json = handler.serialize_response(&response).unwrap().to_string();
    let parsed: CommandResponse = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.id, 7);
    assert_eq!(parsed.status, ResponseStatus::Success);
}

#[test]
fn test_maintenance_command_wire_format() {
    let mut handler = ProtocolHandler::new();
    let json = r#"{"id":8,"timestamp":1000,"command_type":{"SetMaintenanceMode":{"target":"BilgeAlarm","enabled":true,"expires_at":60000}}}"#;

    let command = handler.parse_command(json).unwrap();
    match command.command_type {
        CommandType::SetMaintenanceMode {
            target,
            enabled,
            expires_at,
        } => {
            assert_eq!(target, SubsystemId::BilgeAlarm);
            assert!(enabled);
            assert_eq!(expires_at, Some(60000));
        }
        other => panic!("Unexpected command type: {:?}", other),
    }
}

#[test]
fn test_tracked_command_eviction_when_full() {
    let mut handler = ProtocolHandler::new();
    let current_time = 1000;

    // Fill the tracker beyond capacity; the oldest entries are evicted
    for id in 1..=40u32 {
        let _ = handler.track_command(id, current_time + id as u64, 60000);
    }

    assert!(handler.get_command_status(40).is_some());
    assert!(handler.get_command_status(1).is_none());
}
