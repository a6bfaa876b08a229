use vesselsim::subsystems::{
    bilge::{BilgeAlarmSystem, BilgeCommand},
    esd::{EmergencyShutdownSystem, EsdCommand, EsdStation, ValvePosition},
    fire::{FireCommand, FireDetectionSystem},
    FaultType, PowerSource, Subsystem,
};

#[cfg(test)]
mod fire_system_tests {
    use super::*;

    #[test]
    fn test_fire_system_initialization() {
        let fire_system = FireDetectionSystem::new();
        let state = fire_system.get_state();

        assert_eq!(state.detectors.len(), 10);
        assert!((state.detectors[0].temp_c - 25.0).abs() < f32::EPSILON);
        assert!((state.detectors[0].smoke_obscuration).abs() < f32::EPSILON);
        assert!(!state.alarms.active());
        assert_eq!(state.power_source, PowerSource::Main);
        assert!(state.alarmed_detector.is_none());
        assert!(fire_system.is_healthy());
    }

    #[test]
    fn test_temperature_alarm_triggering() {
        let mut fire_system = FireDetectionSystem::new();

        // Just below the threshold - no alarm
        fire_system
            .execute_command(FireCommand::SetDetectorTemperature(3, 49.0))
            .unwrap();
        fire_system.update(100).unwrap();
        assert!(!fire_system.get_state().alarms.active());

        // Above the threshold - alarm with both signals
        fire_system
            .execute_command(FireCommand::SetDetectorTemperature(3, 90.0))
            .unwrap();
        fire_system.update(100).unwrap();

        let state = fire_system.get_state();
        assert!(state.alarms.visual);
        assert!(state.alarms.audible);
        assert_eq!(state.alarmed_detector, Some(3));
    }

    #[test]
    fn test_smoke_alarm_triggering() {
        let mut fire_system = FireDetectionSystem::new();

        fire_system
            .execute_command(FireCommand::SetDetectorSmoke(7, 0.5))
            .unwrap();
        fire_system.update(100).unwrap();

        let state = fire_system.get_state();
        assert!(state.alarms.active());
        assert_eq!(state.alarmed_detector, Some(7));
    }

    #[test]
    fn test_alarm_latches_after_stimulus_decays() {
        let mut fire_system = FireDetectionSystem::new();

        fire_system
            .execute_command(FireCommand::SetDetectorTemperature(0, 60.0))
            .unwrap();
        fire_system.update(100).unwrap();
        assert!(fire_system.get_state().alarms.active());

        // Let the reading decay back to ambient; the alarm stays latched
        for _ in 0..100 {
            fire_system.update(1000).unwrap();
        }
        let state = fire_system.get_state();
        assert!(state.detectors[0].temp_c < 50.0);
        assert!(state.alarms.active());

        // Explicit reset clears it
        fire_system.execute_command(FireCommand::ResetAlarms).unwrap();
        assert!(!fire_system.get_state().alarms.active());
    }

    #[test]
    fn test_detection_continues_on_emergency_power() {
        let mut fire_system = FireDetectionSystem::new();

        fire_system.execute_command(FireCommand::CutMainPower).unwrap();
        assert_eq!(fire_system.get_state().power_source, PowerSource::Emergency);

        // Detection loop still scans on the emergency supply
        fire_system
            .execute_command(FireCommand::SetDetectorTemperature(1, 80.0))
            .unwrap();
        fire_system.update(100).unwrap();
        assert!(fire_system.get_state().alarms.active());

        fire_system.execute_command(FireCommand::RestoreMainPower).unwrap();
        assert_eq!(fire_system.get_state().power_source, PowerSource::Main);
    }

    #[test]
    fn test_invalid_detector_parameters_rejected() {
        let mut fire_system = FireDetectionSystem::new();

        assert!(fire_system
            .execute_command(FireCommand::SetDetectorTemperature(10, 30.0))
            .is_err());
        assert!(fire_system
            .execute_command(FireCommand::SetDetectorTemperature(0, 200.0))
            .is_err());
        assert!(fire_system
            .execute_command(FireCommand::SetDetectorSmoke(0, 1.5))
            .is_err());
    }

    #[test]
    fn test_degraded_fault_raises_thresholds() {
        let mut fire_system = FireDetectionSystem::new();
        fire_system.inject_fault(FaultType::Degraded);

        // A stimulus that would normally alarm is below the degraded threshold
        fire_system
            .execute_command(FireCommand::SetDetectorTemperature(0, 55.0))
            .unwrap();
        fire_system.update(100).unwrap();
        assert!(!fire_system.get_state().alarms.active());

        // A stronger stimulus still trips
        fire_system
            .execute_command(FireCommand::SetDetectorTemperature(0, 80.0))
            .unwrap();
        fire_system.update(100).unwrap();
        assert!(fire_system.get_state().alarms.active());

        assert!(!fire_system.is_healthy());
        fire_system.clear_faults();
        assert!(fire_system.is_healthy());
    }

    #[test]
    fn test_failed_fault_stops_updates() {
        let mut fire_system = FireDetectionSystem::new();
        fire_system.inject_fault(FaultType::Failed);

        assert!(fire_system.update(100).is_err());
        assert!(!fire_system.is_healthy());
    }
}

#[cfg(test)]
mod esd_system_tests {
    use super::*;

    #[test]
    fn test_esd_system_initialization() {
        let esd_system = EmergencyShutdownSystem::new();
        let state = esd_system.get_state();

        assert_eq!(state.main_valve.position, ValvePosition::Open);
        assert_eq!(state.aux_valve.position, ValvePosition::Open);
        assert!(!state.shutdown_active);
        assert!(state.initiating_station.is_none());
        assert!(!state.alarm_signal.active());
        assert!(esd_system.is_healthy());
    }

    #[test]
    fn test_shutdown_sequence_main_valve_first() {
        let mut esd_system = EmergencyShutdownSystem::new();
        esd_system
            .execute_command(EsdCommand::ActivateShutdown(EsdStation::Bridge))
            .unwrap();

        let state = esd_system.get_state();
        assert!(state.shutdown_active);
        assert_eq!(state.initiating_station, Some(EsdStation::Bridge));

        // Main valve travels first, aux holds open
        esd_system.update(1000).unwrap();
        let state = esd_system.get_state();
        assert_eq!(state.main_valve.position, ValvePosition::Closing);
        assert_eq!(state.aux_valve.position, ValvePosition::Open);

        // Main seats at 2000 ms, aux starts moving
        esd_system.update(1000).unwrap();
        let state = esd_system.get_state();
        assert_eq!(state.main_valve.position, ValvePosition::Closed);
        assert_ne!(state.aux_valve.position, ValvePosition::Open);
    }

    #[test]
    fn test_shutdown_completes_within_deadline() {
        let mut esd_system = EmergencyShutdownSystem::new();
        esd_system
            .execute_command(EsdCommand::ActivateShutdown(EsdStation::EngineRoom))
            .unwrap();

        let mut elapsed_ms = 0u32;
        while !esd_system.shutdown_complete() {
            esd_system.update(100).unwrap();
            elapsed_ms += 100;
            assert!(elapsed_ms <= 5000, "Shutdown exceeded the 5 second deadline");
        }

        let state = esd_system.get_state();
        assert_eq!(state.main_valve.position, ValvePosition::Closed);
        assert_eq!(state.aux_valve.position, ValvePosition::Closed);
        assert!(state.alarm_signal.active());
        assert_eq!(state.shutdown_count, 1);
    }

    #[test]
    fn test_reactivation_during_sequence_is_noop() {
        let mut esd_system = EmergencyShutdownSystem::new();
        esd_system
            .execute_command(EsdCommand::ActivateShutdown(EsdStation::Bridge))
            .unwrap();
        esd_system.update(500).unwrap();

        // A second activation from the other station does not restart travel
        let elapsed = esd_system.get_state().main_valve.travel_elapsed_ms;
        esd_system
            .execute_command(EsdCommand::ActivateShutdown(EsdStation::EngineRoom))
            .unwrap();
        let state = esd_system.get_state();
        assert_eq!(state.main_valve.travel_elapsed_ms, elapsed);
        assert_eq!(state.initiating_station, Some(EsdStation::Bridge));
    }

    #[test]
    fn test_reset_rejected_mid_sequence() {
        let mut esd_system = EmergencyShutdownSystem::new();
        esd_system
            .execute_command(EsdCommand::ActivateShutdown(EsdStation::Bridge))
            .unwrap();
        esd_system.update(1000).unwrap();

        assert!(esd_system.execute_command(EsdCommand::ResetShutdown).is_err());
    }

    #[test]
    fn test_reset_reopens_valves_after_completion() {
        let mut esd_system = EmergencyShutdownSystem::new();
        esd_system
            .execute_command(EsdCommand::ActivateShutdown(EsdStation::Bridge))
            .unwrap();
        while !esd_system.shutdown_complete() {
            esd_system.update(500).unwrap();
        }

        esd_system.execute_command(EsdCommand::ResetShutdown).unwrap();
        let state = esd_system.get_state();
        assert_eq!(state.main_valve.position, ValvePosition::Open);
        assert_eq!(state.aux_valve.position, ValvePosition::Open);
        assert!(!state.shutdown_active);
        assert!(!state.alarm_signal.active());
    }

    #[test]
    fn test_esd_fault_blocks_valve_travel() {
        let mut esd_system = EmergencyShutdownSystem::new();
        esd_system
            .execute_command(EsdCommand::ActivateShutdown(EsdStation::Bridge))
            .unwrap();
        esd_system.inject_fault(FaultType::Failed);

        assert!(esd_system.update(1000).is_err());
        assert!(!esd_system.shutdown_complete());
    }
}

#[cfg(test)]
mod bilge_system_tests {
    use super::*;

    #[test]
    fn test_bilge_system_initialization() {
        let bilge_system = BilgeAlarmSystem::new();
        let state = bilge_system.get_state();

        assert_eq!(state.compartments.len(), 5);
        for compartment in &state.compartments {
            assert!((compartment.water_level_mm).abs() < f32::EPSILON);
            assert!((compartment.threshold_mm - 150.0).abs() < f32::EPSILON);
            assert!(!compartment.alarm.active());
        }
        assert_eq!(state.power_source, PowerSource::Main);
        assert!(bilge_system.is_healthy());
    }

    #[test]
    fn test_high_water_level_alarm() {
        let mut bilge_system = BilgeAlarmSystem::new();

        // Below threshold - no alarm
        bilge_system
            .execute_command(BilgeCommand::SetWaterLevel(2, 100.0))
            .unwrap();
        bilge_system.update(100).unwrap();
        assert!(!bilge_system.get_state().compartments[2].alarm.active());

        // At threshold - alarm trips
        bilge_system
            .execute_command(BilgeCommand::SetWaterLevel(2, 150.0))
            .unwrap();
        bilge_system.update(100).unwrap();
        assert!(bilge_system.get_state().compartments[2].alarm.active());
    }

    #[test]
    fn test_alarm_latches_while_water_drains() {
        let mut bilge_system = BilgeAlarmSystem::new();
        bilge_system
            .execute_command(BilgeCommand::SetWaterLevel(0, 160.0))
            .unwrap();
        bilge_system.update(100).unwrap();
        assert!(bilge_system.get_state().compartments[0].alarm.active());

        // Water drains below the threshold; the alarm stays latched
        for _ in 0..30 {
            bilge_system.update(1000).unwrap();
        }
        let state = bilge_system.get_state();
        assert!(state.compartments[0].water_level_mm < 150.0);
        assert!(state.compartments[0].alarm.active());

        bilge_system.execute_command(BilgeCommand::ResetAlarms).unwrap();
        assert!(!bilge_system.get_state().compartments[0].alarm.active());
    }

    #[test]
    fn test_adjustable_threshold() {
        let mut bilge_system = BilgeAlarmSystem::new();
        bilge_system
            .execute_command(BilgeCommand::SetThreshold(1, 50.0))
            .unwrap();
        bilge_system
            .execute_command(BilgeCommand::SetWaterLevel(1, 60.0))
            .unwrap();
        bilge_system.update(100).unwrap();
        assert!(bilge_system.get_state().compartments[1].alarm.active());
    }

    #[test]
    fn test_power_changeover_notification() {
        let mut bilge_system = BilgeAlarmSystem::new();

        bilge_system.execute_command(BilgeCommand::CutMainPower).unwrap();
        let state = bilge_system.get_state();
        assert_eq!(state.power_source, PowerSource::Emergency);
        assert!(state.power_notification.pending);
        assert!(!state.power_notification.sent);

        // Notification goes out on the next monitoring cycle, inside the window
        bilge_system.update(1000).unwrap();
        let state = bilge_system.get_state();
        assert!(state.power_notification.sent);
        assert!(state.power_notification.delay_ms <= 5000);
    }

    #[test]
    fn test_monitoring_continues_on_emergency_power() {
        let mut bilge_system = BilgeAlarmSystem::new();
        bilge_system.execute_command(BilgeCommand::CutMainPower).unwrap();

        bilge_system
            .execute_command(BilgeCommand::SetWaterLevel(4, 200.0))
            .unwrap();
        bilge_system.update(100).unwrap();
        assert!(bilge_system.get_state().compartments[4].alarm.active());
    }

    #[test]
    fn test_invalid_bilge_parameters_rejected() {
        let mut bilge_system = BilgeAlarmSystem::new();

        assert!(bilge_system
            .execute_command(BilgeCommand::SetWaterLevel(5, 100.0))
            .is_err());
        assert!(bilge_system
            .execute_command(BilgeCommand::SetWaterLevel(0, -10.0))
            .is_err());
        assert!(bilge_system
            .execute_command(BilgeCommand::SetThreshold(0, 0.0))
            .is_err());
    }

    #[test]
    fn test_offline_fault_stops_monitoring() {
        let mut bilge_system = BilgeAlarmSystem::new();
        bilge_system.inject_fault(FaultType::Offline);

        assert!(bilge_system.update(100).is_err());
        assert!(!bilge_system.is_healthy());
    }
}
