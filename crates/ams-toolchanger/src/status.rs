//! Tool changer state and status parsing

use ams_core::{
    AmsAction, AmsSystemInfo, AmsType, AmsUnit, BackendState, SlotInfo, SlotStatus, NO_SELECTION,
};
use serde_json::{Map, Value};
use tracing::{info, trace, warn};

/// Prefix of per-tool printer objects (`tool T0`)
pub(crate) const TOOL_OBJECT_PREFIX: &str = "tool ";

/// Printer object of the tool changer itself
pub(crate) const TOOLCHANGER_OBJECT: &str = "toolchanger";

/// Map a `toolchanger.status` string to an action
pub(crate) fn status_to_action(status: &str) -> AmsAction {
    match status {
        "ready" => AmsAction::Idle,
        "changing" => AmsAction::Selecting,
        "error" => AmsAction::Error,
        "uninitialized" => AmsAction::Resetting,
        _ => AmsAction::Idle,
    }
}

/// Everything the backend knows about the tools
pub(crate) struct ToolChangerState {
    pub system_info: AmsSystemInfo,
    /// Tool names in slot order
    pub tool_names: Vec<String>,
    /// `tool_mounted[slot]`
    pub tool_mounted: Vec<bool>,
}

impl ToolChangerState {
    pub fn new() -> Self {
        let mut system_info = AmsSystemInfo::new(AmsType::ToolChanger);
        system_info.version = "unknown".to_string();
        system_info.supports_endless_spool = false;
        system_info.supports_spoolman = true;
        system_info.supports_tool_mapping = false;
        system_info.supports_bypass = false;
        system_info.has_hardware_bypass_sensor = false;

        Self {
            system_info,
            tool_names: Vec::new(),
            tool_mounted: Vec::new(),
        }
    }

    pub fn tools_initialized(&self) -> bool {
        !self.tool_names.is_empty()
    }

    /// Rebuild the single unit from `names`, replacing any previous layout
    pub fn set_tool_names(&mut self, names: Vec<String>) {
        self.tool_names = names;
        self.initialize_tools();
    }

    fn initialize_tools(&mut self) {
        let count = self.tool_names.len() as i32;

        let slots = self
            .tool_names
            .iter()
            .enumerate()
            .map(|(i, name)| SlotInfo {
                status: SlotStatus::Available,
                mapped_tool: i as i32,
                spool_name: name.clone(),
                ..SlotInfo::new(i as i32, 0)
            })
            .collect();

        self.system_info.units = vec![AmsUnit {
            unit_index: 0,
            name: "Tool Changer".to_string(),
            slot_count: count,
            first_slot_global_index: 0,
            slots,
            connected: true,
            ..Default::default()
        }];
        self.system_info.total_slots = count;
        self.system_info.tool_to_slot_map = (0..count).collect();
        self.tool_mounted = vec![false; self.tool_names.len()];

        info!(tool_count = count, "Initialized tool changer slots");
    }

    pub fn slot_for_tool(&self, name: &str) -> Option<usize> {
        self.tool_names.iter().position(|n| n == name)
    }

    fn apply_toolchanger(&mut self, tc: &Map<String, Value>) {
        if let Some(status) = tc.get("status").and_then(Value::as_str) {
            self.system_info.action = status_to_action(status);
            self.system_info.operation_detail = status.to_string();
            trace!(status, action = %self.system_info.action, "Tool changer status");
        }

        if let Some(number) = tc.get("tool_number").and_then(Value::as_i64) {
            let tool = match i32::try_from(number) {
                Ok(t) if t >= 0 && t < self.system_info.total_slots => t,
                Ok(t) if t < 0 => NO_SELECTION,
                _ => {
                    warn!(
                        tool_number = number,
                        total_slots = self.system_info.total_slots,
                        "Tool number out of range"
                    );
                    NO_SELECTION
                }
            };
            self.system_info.current_tool = tool;
            self.system_info.current_slot = tool;
            self.system_info.filament_loaded = tool >= 0;
            trace!(tool, "Current tool");
        }
    }

    fn apply_tool(&mut self, tool_name: &str, data: &Map<String, Value>) -> bool {
        let Some(slot) = self.slot_for_tool(tool_name) else {
            warn!(tool = tool_name, "Unknown tool in status update");
            return false;
        };

        if let Some(mounted) = data.get("mounted").and_then(Value::as_bool) {
            if let Some(flag) = self.tool_mounted.get_mut(slot) {
                *flag = mounted;
            }
            if let Some(info) = self
                .system_info
                .units
                .first_mut()
                .and_then(|u| u.slots.get_mut(slot))
            {
                info.status = if mounted {
                    SlotStatus::Loaded
                } else {
                    SlotStatus::Available
                };
            }
            trace!(tool = tool_name, mounted, "Tool mount state");
        }

        true
    }
}

impl BackendState for ToolChangerState {
    fn system_info(&self) -> &AmsSystemInfo {
        &self.system_info
    }

    fn apply_status(&mut self, objects: &Map<String, Value>) -> bool {
        let mut changed = false;

        if let Some(tc) = objects.get(TOOLCHANGER_OBJECT).and_then(Value::as_object) {
            trace!("Received toolchanger status update");
            self.apply_toolchanger(tc);
            changed = true;
        }

        for (key, data) in objects {
            let Some(tool_name) = key.strip_prefix(TOOL_OBJECT_PREFIX) else {
                continue;
            };
            if let Some(data) = data.as_object() {
                changed |= self.apply_tool(tool_name, data);
            }
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn objects(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object")
    }

    fn state_with_tools() -> ToolChangerState {
        let mut state = ToolChangerState::new();
        state.set_tool_names(vec!["T0".into(), "T1".into(), "T2".into()]);
        state
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_to_action("ready"), AmsAction::Idle);
        assert_eq!(status_to_action("changing"), AmsAction::Selecting);
        assert_eq!(status_to_action("error"), AmsAction::Error);
        assert_eq!(status_to_action("uninitialized"), AmsAction::Resetting);
        assert_eq!(status_to_action("something_new"), AmsAction::Idle);
    }

    #[test]
    fn test_initialize_tools() {
        let state = state_with_tools();
        let info = &state.system_info;
        assert_eq!(info.total_slots, 3);
        assert_eq!(info.units.len(), 1);
        assert_eq!(info.units[0].name, "Tool Changer");
        assert_eq!(info.tool_to_slot_map, vec![0, 1, 2]);
        let slot = info.slot_global(2).expect("slot 2");
        assert_eq!(slot.spool_name, "T2");
        assert_eq!(slot.mapped_tool, 2);
        assert_eq!(slot.status, SlotStatus::Available);
    }

    #[test]
    fn test_tool_number() {
        let mut state = state_with_tools();
        assert!(state.apply_status(&objects(json!({
            "toolchanger": {"status": "ready", "tool_number": 1}
        }))));
        assert_eq!(state.system_info.current_tool, 1);
        assert_eq!(state.system_info.current_slot, 1);
        assert!(state.system_info.filament_loaded);
        assert_eq!(state.system_info.operation_detail, "ready");

        state.apply_status(&objects(json!({"toolchanger": {"tool_number": -1}})));
        assert!(!state.system_info.filament_loaded);
    }

    #[test]
    fn test_tool_number_out_of_range() {
        let mut state = state_with_tools();
        state.apply_status(&objects(json!({"toolchanger": {"tool_number": 1}})));
        state.apply_status(&objects(json!({"toolchanger": {"tool_number": 3}})));
        assert_eq!(state.system_info.current_tool, NO_SELECTION);
        assert_eq!(state.system_info.current_slot, NO_SELECTION);
        assert!(!state.system_info.filament_loaded);

        state.apply_status(&objects(json!({"toolchanger": {"tool_number": 4294967297i64}})));
        assert_eq!(state.system_info.current_slot, NO_SELECTION);
    }

    #[test]
    fn test_mounted_updates_slot() {
        let mut state = state_with_tools();
        state.apply_status(&objects(json!({"tool T1": {"mounted": true}})));
        assert_eq!(
            state.system_info.slot_global(1).map(|s| s.status),
            Some(SlotStatus::Loaded)
        );
        assert_eq!(state.tool_mounted, vec![false, true, false]);

        state.apply_status(&objects(json!({"tool T1": {"mounted": false}})));
        assert_eq!(
            state.system_info.slot_global(1).map(|s| s.status),
            Some(SlotStatus::Available)
        );
    }

    #[test]
    fn test_unknown_tool_ignored() {
        let mut state = state_with_tools();
        let before = state.system_info.clone();
        assert!(!state.apply_status(&objects(json!({"tool T9": {"mounted": true}}))));
        assert_eq!(state.system_info, before);
    }

    #[test]
    fn test_tool_before_discovery() {
        let mut state = ToolChangerState::new();
        assert!(!state.apply_status(&objects(json!({"tool T0": {"mounted": true}}))));
        assert!(state.system_info.units.is_empty());
        assert!(state.tool_mounted.is_empty());
    }

    #[test]
    fn test_unrelated_objects() {
        let mut state = state_with_tools();
        assert!(!state.apply_status(&objects(json!({"extruder": {"temperature": 200.0}}))));
        assert!(!state.apply_status(&objects(json!({"toolchanger": "garbage"}))));
    }
}
