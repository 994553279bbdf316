//! AmsBackend trait - the core abstraction for multi-material systems

use std::sync::Arc;

use crate::error::{AmsError, AmsResult};
use crate::models::{
    ActionValue, AmsAction, AmsSystemInfo, AmsType, DeviceAction, DeviceSection,
    EndlessSpoolCapabilities, EndlessSpoolConfig, PathSegment, PathTopology, SlotInfo,
    ToolMappingCapabilities,
};

/// Change notification emitted by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmsEvent {
    /// Anything in the system snapshot may have changed
    StateChanged,
    /// One slot's metadata changed (global index)
    SlotChanged(i32),
}

impl AmsEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AmsEvent::StateChanged => "state_changed",
            AmsEvent::SlotChanged(_) => "slot_changed",
        }
    }
}

/// Observer for backend events.
///
/// Invoked with no backend lock held, possibly on the transport's thread.
pub type EventCallback = Arc<dyn Fn(&AmsEvent) + Send + Sync>;

/// Reject a command unless the backend is running and idle.
///
/// Always evaluated before slot validation, so a busy backend reports
/// [`AmsError::Busy`] even for an out-of-range slot.
pub fn check_preconditions(running: bool, info: &AmsSystemInfo) -> AmsResult<()> {
    if !running {
        return Err(AmsError::not_connected("Backend not started"));
    }
    if info.is_busy() {
        return Err(AmsError::Busy {
            action: info.action,
        });
    }
    Ok(())
}

/// Check `slot` against `0..total_slots`
pub fn validate_slot_index(info: &AmsSystemInfo, slot: i32) -> AmsResult<usize> {
    if slot < 0 || slot >= info.total_slots {
        return Err(AmsError::InvalidSlot {
            slot,
            max: info.total_slots - 1,
        });
    }
    Ok(slot as usize)
}

/// The trait every multi-material backend implements.
///
/// All methods take `&self` and are safe to call from any thread. Commands
/// return once the request is dispatched; completion shows up later as
/// state changes reported through the event callback.
///
/// Backends leave default implementations for features they don't support.
pub trait AmsBackend: Send + Sync {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Subscribe to printer updates. Idempotent.
    fn start(&self) -> AmsResult<()>;

    /// Unsubscribe and stop processing updates. Idempotent.
    fn stop(&self);

    fn is_running(&self) -> bool;

    /// Install the single event observer, replacing any previous one
    fn set_event_callback(&self, callback: Option<EventCallback>);

    // =========================================================================
    // State queries
    // =========================================================================

    /// Consistent snapshot of the whole system
    fn get_system_info(&self) -> AmsSystemInfo;

    fn get_type(&self) -> AmsType;

    /// Slot by global index; the `-1` sentinel when out of range
    fn get_slot_info(&self, slot: i32) -> SlotInfo;

    fn get_current_action(&self) -> AmsAction;

    fn get_current_tool(&self) -> i32;

    fn get_current_slot(&self) -> i32;

    fn is_filament_loaded(&self) -> bool;

    // =========================================================================
    // Path visualisation
    // =========================================================================

    fn get_topology(&self) -> PathTopology;

    /// Furthest point the active filament has reached
    fn get_filament_segment(&self) -> PathSegment;

    /// Filament position for one slot; `None` if out of range
    fn get_slot_filament_segment(&self, slot: i32) -> PathSegment;

    /// Best guess of where an error occurred
    fn infer_error_segment(&self) -> PathSegment;

    // =========================================================================
    // Commands
    // =========================================================================

    /// Send a raw G-code script
    fn execute_gcode(&self, script: &str) -> AmsResult<()>;

    fn load_filament(&self, slot: i32) -> AmsResult<()>;

    fn unload_filament(&self) -> AmsResult<()>;

    fn select_slot(&self, slot: i32) -> AmsResult<()>;

    /// Activate a tool (for tool changers, a physical tool swap)
    fn change_tool(&self, tool: i32) -> AmsResult<()>;

    /// Attempt to recover from an error state
    fn recover(&self) -> AmsResult<()>;

    /// Home / re-initialise the system
    fn reset(&self) -> AmsResult<()>;

    /// Reset a single lane after a fault
    fn reset_lane(&self, slot: i32) -> AmsResult<()> {
        let _ = slot;
        Err(AmsError::not_supported("reset_lane"))
    }

    /// Abort the current operation
    fn cancel(&self) -> AmsResult<()>;

    /// Update slot metadata (color, material, spool)
    fn set_slot_info(&self, slot: i32, info: &SlotInfo) -> AmsResult<()>;

    // =========================================================================
    // Tool mapping
    // =========================================================================

    fn set_tool_mapping(&self, tool: i32, slot: i32) -> AmsResult<()>;

    /// `mapping[tool] = slot`
    fn get_tool_mapping(&self) -> Vec<i32> {
        Vec::new()
    }

    fn get_tool_mapping_capabilities(&self) -> ToolMappingCapabilities {
        ToolMappingCapabilities::default()
    }

    /// Restore the default tool-to-slot mapping
    fn reset_tool_mappings(&self) -> AmsResult<()> {
        Err(AmsError::not_supported("reset_tool_mappings"))
    }

    // =========================================================================
    // Bypass
    // =========================================================================

    fn enable_bypass(&self) -> AmsResult<()>;

    fn disable_bypass(&self) -> AmsResult<()>;

    fn is_bypass_active(&self) -> bool {
        false
    }

    // =========================================================================
    // Endless spool
    // =========================================================================

    fn get_endless_spool_capabilities(&self) -> EndlessSpoolCapabilities {
        EndlessSpoolCapabilities::default()
    }

    fn get_endless_spool_config(&self) -> Vec<EndlessSpoolConfig> {
        Vec::new()
    }

    fn set_endless_spool_backup(&self, slot: i32, backup_slot: i32) -> AmsResult<()> {
        let _ = (slot, backup_slot);
        Err(AmsError::not_supported("set_endless_spool_backup"))
    }

    fn reset_endless_spool(&self) -> AmsResult<()> {
        Err(AmsError::not_supported("reset_endless_spool"))
    }

    // =========================================================================
    // Device extensions
    // =========================================================================

    fn get_device_sections(&self) -> Vec<DeviceSection> {
        Vec::new()
    }

    fn get_device_actions(&self) -> Vec<DeviceAction> {
        Vec::new()
    }

    fn execute_device_action(&self, action_id: &str, value: Option<ActionValue>) -> AmsResult<()> {
        let _ = value;
        Err(AmsError::not_supported(format!("Unknown action: {}", action_id)))
    }

    /// Hand over tool names found by hardware discovery
    fn set_discovered_tools(&self, names: Vec<String>) {
        let _ = names;
    }
}
