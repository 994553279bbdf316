//! Happy Hare backend implementation

use std::sync::Arc;

use ams_core::gcode::{hex_color, is_safe_param};
use ams_core::{
    validate_slot_index, ActionValue, AmsAction, AmsBackend, AmsError, AmsEvent, AmsResult,
    AmsSystemInfo, AmsType, BackendCore, DeviceAction, DeviceSection, EndlessSpoolCapabilities,
    EndlessSpoolConfig, EventCallback, MoonrakerClient, PathSegment, PathTopology, SlotInfo,
    SlotStatus, ToolMappingCapabilities, BYPASS_SELECTION, DEFAULT_SLOT_COLOR,
};
use tracing::{debug, info, warn};

use crate::config::HappyHareConfig;
use crate::device;
use crate::status::HappyHareState;

const BACKEND_NAME: &str = "happy_hare";

/// Happy Hare MMU backend
pub struct HappyHareBackend {
    core: BackendCore<HappyHareState>,
}

impl HappyHareBackend {
    pub fn new(client: Option<Arc<dyn MoonrakerClient>>, config: HappyHareConfig) -> Self {
        Self {
            core: BackendCore::new(BACKEND_NAME, client, HappyHareState::new(config)),
        }
    }

    fn send(&self, gcode: &str) -> AmsResult<()> {
        self.core.dispatch(gcode)
    }
}

fn validate_tool(info: &AmsSystemInfo, tool: i32) -> AmsResult<()> {
    let count = info.tool_to_slot_map.len() as i32;
    if tool < 0 || tool >= count {
        return Err(AmsError::InvalidTool {
            tool,
            max: count - 1,
        });
    }
    Ok(())
}

/// Build `MMU_GATE_MAP` for the changed fields; `None` when nothing to persist
fn gate_map_command(slot: i32, old: &SlotInfo, new: &SlotInfo) -> Option<String> {
    let mut cmd = format!("MMU_GATE_MAP GATE={}", slot);
    let mut changed = false;

    if new.color_rgb != 0 && new.color_rgb != DEFAULT_SLOT_COLOR {
        cmd.push_str(&format!(" COLOR={}", hex_color(new.color_rgb)));
        changed = true;
    }

    if !new.material.is_empty() {
        if is_safe_param(&new.material) {
            cmd.push_str(&format!(" MATERIAL={}", new.material));
            changed = true;
        } else {
            warn!(slot, material = %new.material, "Skipping unsafe material value");
        }
    }

    if new.spoolman_id > 0 {
        cmd.push_str(&format!(" SPOOLID={}", new.spoolman_id));
        changed = true;
    } else if new.spoolman_id == 0 && old.spoolman_id > 0 {
        // Unlink
        cmd.push_str(" SPOOLID=-1");
        changed = true;
    }

    changed.then_some(cmd)
}

impl AmsBackend for HappyHareBackend {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    fn start(&self) -> AmsResult<()> {
        self.core.start(|_| Ok(()))
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

    // =========================================================================
    // State queries
    // =========================================================================

    fn get_system_info(&self) -> AmsSystemInfo {
        self.core.lock().state.system_info.clone()
    }

    fn get_type(&self) -> AmsType {
        AmsType::HappyHare
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

    // =========================================================================
    // Path visualisation
    // =========================================================================

    fn get_topology(&self) -> PathTopology {
        PathTopology::Linear
    }

    fn get_filament_segment(&self) -> PathSegment {
        self.core.lock().state.filament_segment()
    }

    fn get_slot_filament_segment(&self, slot: i32) -> PathSegment {
        let inner = self.core.lock();
        let state = &inner.state;
        let info = &state.system_info;
        let Some(slot_info) = info.slot_global(slot) else {
            return PathSegment::None;
        };

        if slot == info.current_slot && info.filament_loaded {
            return state.filament_segment();
        }
        match slot_info.status {
            SlotStatus::Available | SlotStatus::FromBuffer => PathSegment::Spool,
            _ => PathSegment::None,
        }
    }

    fn infer_error_segment(&self) -> PathSegment {
        self.core.lock().state.error_segment
    }

    // =========================================================================
    // Commands
    // =========================================================================

    fn execute_gcode(&self, script: &str) -> AmsResult<()> {
        self.send(script)
    }

    fn load_filament(&self, slot: i32) -> AmsResult<()> {
        {
            let inner = self.core.lock_ready()?;
            let info = &inner.state.system_info;
            validate_slot_index(info, slot)?;
            if info.slot_global(slot).map(|s| s.status) == Some(SlotStatus::Empty) {
                return Err(AmsError::SlotNotAvailable(slot));
            }
        }

        info!(slot, "Loading from gate");
        self.send(&format!("MMU_LOAD GATE={}", slot))
    }

    fn unload_filament(&self) -> AmsResult<()> {
        {
            let inner = self.core.lock_ready()?;
            if !inner.state.system_info.filament_loaded {
                return Err(AmsError::NotLoaded);
            }
        }

        info!("Unloading filament");
        self.send("MMU_UNLOAD")
    }

    fn select_slot(&self, slot: i32) -> AmsResult<()> {
        {
            let inner = self.core.lock_ready()?;
            validate_slot_index(&inner.state.system_info, slot)?;
        }

        info!(slot, "Selecting gate");
        self.send(&format!("MMU_SELECT GATE={}", slot))
    }

    fn change_tool(&self, tool: i32) -> AmsResult<()> {
        {
            let inner = self.core.lock_ready()?;
            validate_tool(&inner.state.system_info, tool)?;
        }

        info!(tool, "Changing tool");
        self.send(&format!("T{}", tool))
    }

    fn recover(&self) -> AmsResult<()> {
        drop(self.core.lock_running()?);
        info!("Attempting MMU recovery");
        self.send("MMU_RECOVER")
    }

    fn reset(&self) -> AmsResult<()> {
        drop(self.core.lock_ready()?);
        info!("Homing MMU");
        self.send("MMU_HOME")
    }

    fn cancel(&self) -> AmsResult<()> {
        {
            let inner = self.core.lock_running()?;
            if inner.state.system_info.action == AmsAction::Idle {
                return Ok(());
            }
        }

        info!("Cancelling current MMU operation");
        self.send("MMU_PAUSE")
    }

    fn set_slot_info(&self, slot: i32, info: &SlotInfo) -> AmsResult<()> {
        let command = {
            let mut inner = self.core.lock_ready()?;
            let system = &mut inner.state.system_info;
            validate_slot_index(system, slot)?;
            let max = system.total_slots - 1;
            let target = system
                .slot_global_mut(slot)
                .ok_or(AmsError::InvalidSlot { slot, max })?;
            let previous = target.clone();

            target.color_name = info.color_name.clone();
            target.color_rgb = info.color_rgb;
            target.material = info.material.clone();
            target.brand = info.brand.clone();
            target.spoolman_id = info.spoolman_id;
            target.spool_name = info.spool_name.clone();
            target.remaining_weight_g = info.remaining_weight_g;
            target.total_weight_g = info.total_weight_g;
            target.nozzle_temp_min = info.nozzle_temp_min;
            target.nozzle_temp_max = info.nozzle_temp_max;
            target.bed_temp = info.bed_temp;

            gate_map_command(slot, &previous, info)
        };

        debug!(slot, "Updated gate info");
        if let Some(cmd) = command {
            self.send(&cmd)?;
        }
        self.core.emit(AmsEvent::SlotChanged(slot));
        Ok(())
    }

    // =========================================================================
    // Tool mapping
    // =========================================================================

    fn set_tool_mapping(&self, tool: i32, slot: i32) -> AmsResult<()> {
        {
            let inner = self.core.lock_ready()?;
            let info = &inner.state.system_info;
            validate_tool(info, tool)?;
            validate_slot_index(info, slot)?;

            let shared_with = info
                .tool_to_slot_map
                .iter()
                .enumerate()
                .find(|&(t, &s)| s == slot && t as i32 != tool)
                .map(|(t, _)| t);
            if let Some(other) = shared_with {
                warn!(tool, slot, other_tool = other, "Gate already mapped to another tool");
            }
        }

        info!(tool, slot, "Mapping tool to gate");
        self.send(&format!("MMU_TTG_MAP TOOL={} GATE={}", tool, slot))
    }

    fn get_tool_mapping(&self) -> Vec<i32> {
        self.core.lock().state.system_info.tool_to_slot_map.clone()
    }

    fn get_tool_mapping_capabilities(&self) -> ToolMappingCapabilities {
        ToolMappingCapabilities {
            supported: true,
            editable: true,
            description: "Tool-to-gate mapping via MMU_TTG_MAP".to_string(),
        }
    }

    fn reset_tool_mappings(&self) -> AmsResult<()> {
        let tools = self.core.lock().state.system_info.tool_to_slot_map.len() as i32;
        let mut first_error = None;
        for tool in 0..tools {
            if let Err(e) = self.set_tool_mapping(tool, tool) {
                warn!(tool, error = %e, "Failed to reset tool mapping");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    // =========================================================================
    // Bypass
    // =========================================================================

    fn enable_bypass(&self) -> AmsResult<()> {
        drop(self.core.lock_ready()?);
        info!("Selecting bypass");
        self.send("MMU_SELECT_BYPASS")
    }

    fn disable_bypass(&self) -> AmsResult<()> {
        {
            let inner = self.core.lock_running()?;
            if !inner.state.system_info.is_bypass_selected() {
                return Err(AmsError::wrong_state("Bypass not active", "Bypass active"));
            }
        }

        info!("Leaving bypass");
        self.send("MMU_HOME")
    }

    fn is_bypass_active(&self) -> bool {
        self.core.lock().state.system_info.current_slot == BYPASS_SELECTION
    }

    // =========================================================================
    // Endless spool
    // =========================================================================

    fn get_endless_spool_capabilities(&self) -> EndlessSpoolCapabilities {
        EndlessSpoolCapabilities {
            supported: true,
            editable: false,
            description: "Happy Hare group-based".to_string(),
        }
    }

    fn get_endless_spool_config(&self) -> Vec<EndlessSpoolConfig> {
        let inner = self.core.lock();
        let state = &inner.state;
        state
            .system_info
            .slots()
            .map(|slot| EndlessSpoolConfig {
                slot_index: slot.global_index,
                backup_slot: state.endless_spool_backup(slot),
            })
            .collect()
    }

    fn set_endless_spool_backup(&self, _slot: i32, _backup_slot: i32) -> AmsResult<()> {
        Err(AmsError::not_supported(
            "Happy Hare endless spool groups are configured in mmu_vars.cfg",
        ))
    }

    fn reset_endless_spool(&self) -> AmsResult<()> {
        Err(AmsError::not_supported(
            "Happy Hare endless spool groups are read-only",
        ))
    }

    // =========================================================================
    // Device extensions
    // =========================================================================

    fn get_device_sections(&self) -> Vec<DeviceSection> {
        device::sections()
    }

    fn get_device_actions(&self) -> Vec<DeviceAction> {
        device::actions()
    }

    fn execute_device_action(&self, action_id: &str, value: Option<ActionValue>) -> AmsResult<()> {
        if device::starts_motion(action_id) {
            drop(self.core.lock_ready()?);
        } else {
            drop(self.core.lock_running()?);
        }
        let gcode = device::action_gcode(action_id, value.as_ref())?;
        info!(action = action_id, gcode = %gcode, "Executing device action");
        self.send(&gcode)
    }
}
