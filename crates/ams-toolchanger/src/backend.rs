//! Tool changer backend implementation
//!
//! This module provides the ToolChangerBackend that implements AmsBackend
//! for printers running klipper-toolchanger.

use std::sync::Arc;

use ams_core::{
    AmsAction, AmsBackend, AmsError, AmsEvent, AmsResult, AmsSystemInfo, AmsType, BackendCore,
    EventCallback, MoonrakerClient, PathSegment, PathTopology, SlotInfo,
    ToolMappingCapabilities,
};
use tracing::{debug, info};

use crate::status::ToolChangerState;

const BACKEND_NAME: &str = "toolchanger";

/// Tool changer backend
///
/// Each discovered tool is one slot in a single unit. Tool swaps are issued
/// as `SELECT_TOOL` / `UNSELECT_TOOL`; progress is tracked from the
/// `toolchanger` and `tool <name>` printer objects.
pub struct ToolChangerBackend {
    core: BackendCore<ToolChangerState>,
}

impl ToolChangerBackend {
    /// Create a backend bound to `client`.
    ///
    /// Without a client the backend can be queried but `start` fails.
    pub fn new(client: Option<Arc<dyn MoonrakerClient>>) -> Self {
        Self {
            core: BackendCore::new(BACKEND_NAME, client, ToolChangerState::new()),
        }
    }

    /// Create a backend with tools already known
    pub fn with_tools(client: Arc<dyn MoonrakerClient>, tool_names: Vec<String>) -> Self {
        let backend = Self::new(Some(client));
        backend.set_discovered_tools(tool_names);
        backend
    }

    /// Tool names in slot order
    pub fn tool_names(&self) -> Vec<String> {
        self.core.lock().state.tool_names.clone()
    }
}

/// Slot range check; an empty tool list counts as not connected
fn validate_tool_slot(info: &AmsSystemInfo, slot: i32) -> AmsResult<usize> {
    if info.total_slots == 0 {
        return Err(AmsError::not_connected("No tools discovered"));
    }
    ams_core::validate_slot_index(info, slot)
}

impl AmsBackend for ToolChangerBackend {
    fn start(&self) -> AmsResult<()> {
        self.core.start(|state| {
            if state.tools_initialized() {
                Ok(())
            } else {
                Err(AmsError::not_connected("No tools discovered"))
            }
        })
    }

    fn stop(&self) {
        self.core.stop();
    }

    fn is_running(&self) -> bool {
        self.core.is_running()
    }

    fn set_event_callback(&self, callback: Option<EventCallback>) {
        self.core.set_event_callback(callback);
    }

    fn get_system_info(&self) -> AmsSystemInfo {
        self.core.lock().state.system_info.clone()
    }

    fn get_type(&self) -> AmsType {
        AmsType::ToolChanger
    }

    fn get_slot_info(&self, slot: i32) -> SlotInfo {
        self.core
            .lock()
            .state
            .system_info
            .slot_global(slot)
            .cloned()
            .unwrap_or_else(SlotInfo::invalid)
    }

    fn get_current_action(&self) -> AmsAction {
        self.core.lock().state.system_info.action
    }

    fn get_current_tool(&self) -> i32 {
        self.core.lock().state.system_info.current_tool
    }

    fn get_current_slot(&self) -> i32 {
        self.core.lock().state.system_info.current_slot
    }

    fn is_filament_loaded(&self) -> bool {
        self.core.lock().state.system_info.filament_loaded
    }

    fn get_topology(&self) -> PathTopology {
        PathTopology::Parallel
    }

    fn get_filament_segment(&self) -> PathSegment {
        let inner = self.core.lock();
        let info = &inner.state.system_info;
        if info.current_tool >= 0 && info.filament_loaded {
            PathSegment::Nozzle
        } else {
            PathSegment::Spool
        }
    }

    fn get_slot_filament_segment(&self, slot: i32) -> PathSegment {
        let inner = self.core.lock();
        let mounted = usize::try_from(slot)
            .ok()
            .and_then(|i| inner.state.tool_mounted.get(i).copied());
        match mounted {
            Some(true) => PathSegment::Nozzle,
            Some(false) => PathSegment::Spool,
            None => PathSegment::None,
        }
    }

    fn infer_error_segment(&self) -> PathSegment {
        // Dock area is drawn as the hub
        if self.core.lock().state.system_info.action == AmsAction::Error {
            PathSegment::Hub
        } else {
            PathSegment::None
        }
    }

    fn execute_gcode(&self, script: &str) -> AmsResult<()> {
        self.core.dispatch(script)
    }

    fn load_filament(&self, slot: i32) -> AmsResult<()> {
        self.change_tool(slot)
    }

    fn unload_filament(&self) -> AmsResult<()> {
        {
            let inner = self.core.lock_ready()?;
            if inner.state.system_info.current_tool < 0 {
                return Err(AmsError::NotLoaded);
            }
        }

        info!("Unmounting current tool");
        self.core.dispatch("UNSELECT_TOOL")
    }

    fn select_slot(&self, slot: i32) -> AmsResult<()> {
        self.change_tool(slot)
    }

    fn change_tool(&self, tool: i32) -> AmsResult<()> {
        let tool_name = {
            let inner = self.core.lock_ready()?;
            let index = validate_tool_slot(&inner.state.system_info, tool)?;
            inner
                .state
                .tool_names
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("T{}", tool))
        };

        info!(tool, tool_name = %tool_name, "Mounting tool");
        self.core.dispatch(&format!("SELECT_TOOL TOOL={}", tool_name))
    }

    fn recover(&self) -> AmsResult<()> {
        drop(self.core.lock_running()?);
        info!("Attempting tool changer recovery");
        self.core.dispatch("INITIALIZE_TOOLCHANGER")
    }

    fn reset(&self) -> AmsResult<()> {
        drop(self.core.lock_running()?);
        info!("Resetting tool changer");
        self.core.dispatch("INITIALIZE_TOOLCHANGER")
    }

    fn cancel(&self) -> AmsResult<()> {
        Err(AmsError::not_supported("Cancel"))
    }

    fn set_slot_info(&self, slot: i32, info: &SlotInfo) -> AmsResult<()> {
        {
            let mut inner = self.core.lock_ready()?;
            validate_tool_slot(&inner.state.system_info, slot)?;

            if let Some(target) = inner.state.system_info.slot_global_mut(slot) {
                target.color_rgb = info.color_rgb;
                target.color_name = info.color_name.clone();
                target.material = info.material.clone();
                target.brand = info.brand.clone();
                target.spoolman_id = info.spoolman_id;
                target.spool_name = info.spool_name.clone();
                target.remaining_weight_g = info.remaining_weight_g;
                target.total_weight_g = info.total_weight_g;
            }
        }

        debug!(slot, "Updated tool slot info");
        self.core.emit(AmsEvent::SlotChanged(slot));
        Ok(())
    }

    fn set_tool_mapping(&self, _tool: i32, _slot: i32) -> AmsResult<()> {
        Err(AmsError::not_supported("Tool mapping"))
    }

    fn get_tool_mapping_capabilities(&self) -> ToolMappingCapabilities {
        ToolMappingCapabilities {
            supported: false,
            editable: false,
            description: String::new(),
        }
    }

    fn enable_bypass(&self) -> AmsResult<()> {
        Err(AmsError::not_supported("Bypass mode"))
    }

    fn disable_bypass(&self) -> AmsResult<()> {
        Err(AmsError::not_supported("Bypass mode"))
    }

    fn set_discovered_tools(&self, names: Vec<String>) {
        self.core.lock().state.set_tool_names(names);
    }
}
