//! End-to-end tests for the Happy Hare backend
//!
//! Run with: cargo test --test happy_hare_e2e_test

use std::sync::Arc;

use ams_core::client::mock::MockMoonrakerClient;
use ams_core::{
    ActionValue, AmsAction, AmsBackend, AmsError, AmsEvent, MoonrakerClient, PathSegment,
    PathTopology, SlotInfo, SlotStatus,
};
use ams_happy_hare::{HappyHareBackend, HappyHareConfig};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::json;

fn started_backend(config: HappyHareConfig) -> (Arc<MockMoonrakerClient>, HappyHareBackend) {
    let mock = Arc::new(MockMoonrakerClient::new());
    let client: Arc<dyn MoonrakerClient> = mock.clone();
    let backend = HappyHareBackend::new(Some(client), config);
    backend.start().expect("start");
    (mock, backend)
}

fn two_unit_status() -> serde_json::Value {
    json!({
        "mmu": {
            "action": "Idle",
            "gate": -1,
            "tool": -1,
            "filament": "Unloaded",
            "filament_pos": 0,
            "num_units": 2,
            "gate_status": [1, 1, 0, 1, 2, 1, -1, 1],
            "gate_color_rgb": [0xFF0000, 0x00FF00, 0, 0x0000FF, 0xFFFFFF, 0, 0, 0],
            "gate_material": ["PLA", "PETG", "", "ABS", "PLA", "", "", ""],
            "ttg_map": [0, 1, 2, 3, 4, 5, 6, 7],
            "endless_spool_groups": [0, 1, 2, 0, 1, 2, 3, 3]
        }
    })
}

// =============================================================================
// Status parsing
// =============================================================================

#[test]
fn test_full_status_builds_units() {
    let (mock, backend) = started_backend(HappyHareConfig {
        unit_names: vec!["Left".into()],
        ..Default::default()
    });
    mock.inject_status(two_unit_status());

    let info = backend.get_system_info();
    assert_eq!(info.total_slots, 8);
    assert_eq!(info.units.len(), 2);
    assert_eq!(info.units[0].name, "Left");
    assert_eq!(info.units[1].name, "MMU Unit 2");
    assert_eq!(info.units[1].first_slot_global_index, 4);
    assert!(info.is_multi_unit());

    let slot = backend.get_slot_info(4);
    assert_eq!(slot.slot_index, 0);
    assert_eq!(slot.status, SlotStatus::FromBuffer);
    assert_eq!(slot.color_rgb, 0xFFFFFF);
    assert_eq!(slot.material, "PLA");
    assert_eq!(backend.get_slot_info(6).status, SlotStatus::Unknown);
    assert_eq!(backend.get_topology(), PathTopology::Linear);
}

#[test]
fn test_load_cycle() {
    let (mock, backend) = started_backend(HappyHareConfig::default());
    mock.inject_status(two_unit_status());

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    backend.set_event_callback(Some(Arc::new(move |e: &AmsEvent| sink.lock().push(*e))));

    backend.load_filament(5).expect("load");
    assert_eq!(mock.last_gcode().as_deref(), Some("MMU_LOAD GATE=5"));

    mock.inject_status(json!({"mmu": {"action": "Loading", "gate": 5, "filament_pos": 4}}));
    assert!(matches!(
        backend.load_filament(0),
        Err(AmsError::Busy {
            action: AmsAction::Loading
        })
    ));
    assert_eq!(backend.get_filament_segment(), PathSegment::Hub);
    let info = backend.get_system_info();
    assert!(!info.units[0].hub_sensor_triggered);
    assert!(info.units[1].hub_sensor_triggered);

    mock.inject_status(json!({
        "mmu": {"action": "Idle", "tool": 5, "filament": "Loaded", "filament_pos": 8,
                "gate_status": [1, 1, 0, 1, 2, 1, -1, 1]}
    }));
    assert!(backend.is_filament_loaded());
    assert_eq!(backend.get_slot_info(5).status, SlotStatus::Loaded);
    assert_eq!(backend.get_slot_filament_segment(5), PathSegment::Nozzle);
    assert_eq!(backend.get_system_info().active_unit_index(), Some(1));
    assert_eq!(events.lock().len(), 2);

    backend.unload_filament().expect("unload");
    assert_eq!(mock.last_gcode().as_deref(), Some("MMU_UNLOAD"));
}

#[test]
fn test_error_and_recovery() {
    let (mock, backend) = started_backend(HappyHareConfig::default());
    mock.inject_status(two_unit_status());
    mock.inject_status(json!({
        "mmu": {"gate": 2, "filament_pos": 3, "reason_for_pause": "Filament runout",
                "action": "Error"}
    }));

    assert_eq!(backend.get_current_action(), AmsAction::Error);
    assert_eq!(backend.infer_error_segment(), PathSegment::Lane);
    assert_eq!(
        backend
            .get_slot_info(2)
            .error
            .map(|e| e.message),
        Some("Filament runout".to_string())
    );
    assert!(backend.get_system_info().units[0].has_any_error());

    // Error is not busy: commands are allowed again
    backend.recover().expect("recover");
    backend.select_slot(3).expect("select");

    mock.inject_status(json!({"mmu": {"action": "Idle"}}));
    assert_eq!(backend.infer_error_segment(), PathSegment::None);
    assert!(backend.get_slot_info(2).error.is_none());
}

// =============================================================================
// Slot metadata and mapping
// =============================================================================

#[test]
fn test_slot_info_round_trip_through_firmware() {
    let (mock, backend) = started_backend(HappyHareConfig::default());
    mock.inject_status(two_unit_status());

    let update = SlotInfo {
        color_rgb: 0x112233,
        color_name: "Navy".into(),
        material: "PETG".into(),
        ..backend.get_slot_info(2)
    };
    backend.set_slot_info(2, &update).expect("set slot info");
    assert_eq!(
        mock.last_gcode().as_deref(),
        Some("MMU_GATE_MAP GATE=2 COLOR=112233 MATERIAL=PETG")
    );
    assert_eq!(backend.get_slot_info(2).color_name, "Navy");

    assert_eq!(
        backend.set_slot_info(8, &update),
        Err(AmsError::InvalidSlot { slot: 8, max: 7 })
    );
}

#[test]
fn test_tool_mapping_from_firmware() {
    let (mock, backend) = started_backend(HappyHareConfig::default());
    mock.inject_status(two_unit_status());
    mock.inject_status(json!({"mmu": {"ttg_map": [3, 1, 2, 0, 4, 5, 6, 7]}}));

    assert_eq!(backend.get_tool_mapping(), vec![3, 1, 2, 0, 4, 5, 6, 7]);
    assert_eq!(backend.get_slot_info(3).mapped_tool, 0);
    assert_eq!(backend.get_slot_info(0).mapped_tool, 3);

    backend.reset_tool_mappings().expect("reset");
    assert_eq!(mock.sent_gcodes().len(), 8);
    assert_eq!(
        mock.sent_gcodes().first().map(String::as_str),
        Some("MMU_TTG_MAP TOOL=0 GATE=0")
    );
}

#[test]
fn test_endless_spool_groups() {
    let (mock, backend) = started_backend(HappyHareConfig::default());
    mock.inject_status(two_unit_status());

    let backups: Vec<_> = backend
        .get_endless_spool_config()
        .into_iter()
        .map(|c| c.backup_slot)
        .collect();
    assert_eq!(backups, vec![3, 4, 5, 0, 1, 2, 7, 6]);
    assert!(matches!(
        backend.reset_endless_spool(),
        Err(AmsError::NotSupported(_))
    ));
}

// =============================================================================
// Bypass and device actions
// =============================================================================

#[test]
fn test_bypass_cycle() {
    let (mock, backend) = started_backend(HappyHareConfig {
        hardware_bypass_sensor: true,
        ..Default::default()
    });
    mock.inject_status(two_unit_status());
    assert!(backend.get_system_info().has_hardware_bypass_sensor);

    backend.enable_bypass().expect("enable");
    mock.inject_status(json!({"mmu": {"gate": -2}}));
    assert!(backend.is_bypass_active());
    assert!(backend.get_system_info().is_bypass_selected());

    backend.disable_bypass().expect("disable");
    mock.inject_status(json!({"mmu": {"gate": 0}}));
    assert!(!backend.is_bypass_active());
    assert!(matches!(
        backend.disable_bypass(),
        Err(AmsError::WrongState { .. })
    ));
}

#[test]
fn test_device_actions() {
    let (mock, backend) = started_backend(HappyHareConfig::default());
    let actions = backend.get_device_actions();
    assert!(actions.iter().any(|a| a.id == "calibrate_bowden"));

    backend
        .execute_device_action("motors_toggle", Some(ActionValue::Bool(true)))
        .expect("motors");
    backend
        .execute_device_action("selector_speed", Some(ActionValue::Number(180.0)))
        .expect("speed");
    assert_eq!(
        mock.sent_gcodes(),
        vec![
            "MMU_MOTORS_OFF HOLD=1".to_string(),
            "MMU_TEST_CONFIG selector_move_speed=180".to_string()
        ]
    );

    assert!(matches!(
        backend.execute_device_action("motors_toggle", Some(ActionValue::Number(1.0))),
        Err(AmsError::InvalidValue(_))
    ));
}
