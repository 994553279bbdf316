//! End-to-end tests for the tool changer backend
//!
//! Run with: cargo test --test toolchanger_e2e_test

use std::sync::{Arc, Weak};
use std::thread;

use ams_core::client::mock::MockMoonrakerClient;
use ams_core::{
    AmsAction, AmsBackend, AmsError, AmsEvent, MoonrakerClient, PathSegment, SlotInfo, SlotStatus,
};
use ams_toolchanger::ToolChangerBackend;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::json;

// =============================================================================
// Fixtures
// =============================================================================

struct Fixture {
    mock: Arc<MockMoonrakerClient>,
    backend: Arc<ToolChangerBackend>,
}

impl Fixture {
    fn new(tools: &[&str]) -> Self {
        let mock = Arc::new(MockMoonrakerClient::new());
        let client: Arc<dyn MoonrakerClient> = mock.clone();
        let backend = Arc::new(ToolChangerBackend::with_tools(
            client,
            tools.iter().map(|t| t.to_string()).collect(),
        ));
        Self { mock, backend }
    }

    fn started(tools: &[&str]) -> Self {
        let fixture = Self::new(tools);
        fixture.backend.start().expect("start");
        fixture
    }

    /// Record the action seen by every event, queried from inside the callback
    fn record_actions(&self) -> Arc<Mutex<Vec<(AmsEvent, AmsAction)>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let weak: Weak<ToolChangerBackend> = Arc::downgrade(&self.backend);
        self.backend
            .set_event_callback(Some(Arc::new(move |event: &AmsEvent| {
                if let Some(backend) = weak.upgrade() {
                    let action = backend.get_system_info().action;
                    sink.lock().push((*event, action));
                }
            })));
        seen
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_start_stop_idempotent() {
    let fixture = Fixture::started(&["T0", "T1"]);
    fixture.backend.start().expect("second start");
    assert_eq!(fixture.mock.subscriber_count(), 1);

    fixture.backend.stop();
    fixture.backend.stop();
    assert!(!fixture.backend.is_running());
    assert_eq!(fixture.mock.subscriber_count(), 0);

    fixture.backend.start().expect("restart");
    assert!(fixture.backend.is_running());
    assert_eq!(fixture.mock.subscriber_count(), 1);
}

#[test]
fn test_status_replayed_on_subscribe_is_kept() {
    let fixture = Fixture::new(&["T0", "T1"]);
    fixture.mock.set_subscribe_snapshot(Some(json!({
        "toolchanger": {"status": "ready", "tool_number": 1},
        "tool T1": {"mounted": true}
    })));
    let seen = fixture.record_actions();

    fixture.backend.start().expect("start");

    assert_eq!(fixture.backend.get_current_tool(), 1);
    assert_eq!(fixture.backend.get_slot_info(1).status, SlotStatus::Loaded);
    // One event for the start, carrying the replayed state
    assert_eq!(*seen.lock(), vec![(AmsEvent::StateChanged, AmsAction::Idle)]);
}

#[test]
fn test_commands_rejected_before_start() {
    let fixture = Fixture::new(&["T0"]);
    assert!(matches!(
        fixture.backend.change_tool(0),
        Err(AmsError::NotConnected(_))
    ));
    assert!(fixture.mock.sent_gcodes().is_empty());
}

// =============================================================================
// Tool changes
// =============================================================================

#[test]
fn test_tool_change_sequence_emits_two_events() {
    let fixture = Fixture::started(&["T0", "T1", "T2"]);
    let seen = fixture.record_actions();

    fixture.backend.change_tool(1).expect("change tool");
    assert_eq!(
        fixture.mock.sent_gcodes(),
        vec!["SELECT_TOOL TOOL=T1".to_string()]
    );

    fixture
        .mock
        .inject_status(json!({"toolchanger": {"status": "changing"}}));
    fixture.mock.inject_status(json!({
        "toolchanger": {"status": "ready", "tool_number": 1},
        "tool T1": {"mounted": true}
    }));

    assert_eq!(
        *seen.lock(),
        vec![
            (AmsEvent::StateChanged, AmsAction::Selecting),
            (AmsEvent::StateChanged, AmsAction::Idle),
        ]
    );
    assert_eq!(fixture.backend.get_current_tool(), 1);
    assert_eq!(fixture.backend.get_slot_info(1).status, SlotStatus::Loaded);
    assert_eq!(fixture.backend.get_filament_segment(), PathSegment::Nozzle);
}

#[test]
fn test_busy_reported_before_invalid_slot() {
    let fixture = Fixture::started(&["T0", "T1", "T2"]);
    fixture
        .mock
        .inject_status(json!({"toolchanger": {"status": "changing"}}));

    assert_eq!(
        fixture.backend.change_tool(7),
        Err(AmsError::Busy {
            action: AmsAction::Selecting
        })
    );

    fixture
        .mock
        .inject_status(json!({"toolchanger": {"status": "ready"}}));
    assert_eq!(
        fixture.backend.change_tool(7),
        Err(AmsError::InvalidSlot { slot: 7, max: 2 })
    );
}

#[test]
fn test_tool_mapping_unsupported_in_every_state() {
    let fixture = Fixture::new(&["T0", "T1"]);
    let unsupported = |backend: &ToolChangerBackend| {
        assert!(matches!(backend.set_tool_mapping(0, 1), Err(AmsError::NotSupported(_))));
        assert!(backend.get_tool_mapping().is_empty());
    };

    // Stopped
    unsupported(&fixture.backend);

    fixture.backend.start().expect("start");
    unsupported(&fixture.backend);

    fixture
        .mock
        .inject_status(json!({"toolchanger": {"status": "changing"}}));
    assert_eq!(fixture.backend.get_current_action(), AmsAction::Selecting);
    unsupported(&fixture.backend);
    assert!(fixture.mock.sent_gcodes().is_empty());
}

#[test]
fn test_out_of_range_slot_is_sentinel() {
    let fixture = Fixture::started(&["T0"]);
    assert_eq!(fixture.backend.get_slot_info(5).slot_index, -1);
    assert_eq!(fixture.backend.get_slot_info(-1), SlotInfo::invalid());
    assert_eq!(
        fixture.backend.get_slot_filament_segment(5),
        PathSegment::None
    );
}

#[test]
fn test_unknown_tool_notification_ignored() {
    let fixture = Fixture::started(&["T0", "T1"]);
    let seen = fixture.record_actions();
    let before = fixture.backend.get_system_info();

    fixture
        .mock
        .inject_status(json!({"tool T7": {"mounted": true}}));

    assert!(seen.lock().is_empty());
    assert_eq!(fixture.backend.get_system_info(), before);
}

// =============================================================================
// Threading
// =============================================================================

#[test]
fn test_concurrent_queries_during_notifications() {
    let fixture = Fixture::started(&["T0", "T1", "T2", "T3"]);

    thread::scope(|s| {
        let mock = &fixture.mock;
        s.spawn(move || {
            for i in 0..200 {
                let tool = i % 4;
                mock.inject_status(json!({
                    "toolchanger": {"status": "ready", "tool_number": tool}
                }));
            }
        });

        for _ in 0..4 {
            let backend = fixture.backend.clone();
            s.spawn(move || {
                for _ in 0..200 {
                    let info = backend.get_system_info();
                    assert_eq!(info.total_slots, 4);
                    // Snapshot is internally consistent
                    assert_eq!(info.current_slot, info.current_tool);
                }
            });
        }
    });
}

#[test]
fn test_drop_while_subscribed() {
    let fixture = Fixture::started(&["T0"]);
    let Fixture { mock, backend } = fixture;
    drop(backend);

    // Drop never calls into the transport; late notifications are inert
    assert_eq!(mock.unsubscribe_calls(), 0);
    mock.inject_status(json!({"toolchanger": {"status": "changing"}}));
}

#[tokio::test]
async fn test_gcode_failure_only_logged() {
    let fixture = Fixture::started(&["T0", "T1"]);
    fixture
        .mock
        .fail_gcode(Some(ams_core::ClientError::Timeout("SELECT_TOOL".into())));

    assert!(fixture.backend.change_tool(1).is_ok());
    tokio::task::yield_now().await;
    assert!(fixture.backend.is_running());
}
