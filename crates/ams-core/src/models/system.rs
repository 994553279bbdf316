//! Unit and whole-system snapshots

use serde::{Deserialize, Serialize};

use super::{AmsAction, AmsType, SlotInfo};

/// `current_slot` / `current_tool` value when nothing is selected
pub const NO_SELECTION: i32 = -1;

/// `current_slot` / `current_tool` value while the Happy Hare bypass is selected
pub const BYPASS_SELECTION: i32 = -2;

/// Physical unit holding a contiguous run of slots
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmsUnit {
    pub unit_index: i32,
    pub name: String,
    pub slot_count: i32,
    pub first_slot_global_index: i32,
    pub slots: Vec<SlotInfo>,
    pub connected: bool,
    #[serde(default)]
    pub firmware_version: String,
    pub has_encoder: bool,
    pub has_toolhead_sensor: bool,
    pub has_slot_sensors: bool,
    pub has_hub_sensor: bool,
    pub hub_sensor_triggered: bool,
}

impl AmsUnit {
    /// Slot by index local to this unit
    pub fn slot(&self, local_index: i32) -> Option<&SlotInfo> {
        usize::try_from(local_index)
            .ok()
            .and_then(|i| self.slots.get(i))
    }

    pub fn contains_global(&self, global_index: i32) -> bool {
        global_index >= self.first_slot_global_index
            && global_index < self.first_slot_global_index + self.slot_count
    }

    pub fn has_any_error(&self) -> bool {
        self.slots.iter().any(|s| s.error.is_some())
    }
}

/// Complete state of one multi-material system
///
/// Units partition `0..total_slots` into consecutive ranges in unit order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmsSystemInfo {
    pub ams_type: AmsType,
    /// Display name ("Happy Hare", "Tool Changer")
    pub type_name: String,
    #[serde(default)]
    pub version: String,
    pub current_tool: i32,
    pub current_slot: i32,
    pub filament_loaded: bool,
    pub action: AmsAction,
    /// Raw operation text reported by firmware
    #[serde(default)]
    pub operation_detail: String,
    pub units: Vec<AmsUnit>,
    pub total_slots: i32,
    pub supports_endless_spool: bool,
    pub supports_spoolman: bool,
    pub supports_tool_mapping: bool,
    pub supports_bypass: bool,
    pub has_hardware_bypass_sensor: bool,
    #[serde(default)]
    pub supports_purge: bool,
    /// `tool_to_slot_map[tool] = slot`
    pub tool_to_slot_map: Vec<i32>,
}

impl AmsSystemInfo {
    /// Empty system of the given type with nothing selected
    pub fn new(ams_type: AmsType) -> Self {
        Self {
            ams_type,
            type_name: ams_type.to_string(),
            current_tool: NO_SELECTION,
            current_slot: NO_SELECTION,
            ..Default::default()
        }
    }

    /// Slot by global index
    pub fn slot_global(&self, global_index: i32) -> Option<&SlotInfo> {
        let unit = self.unit_for_slot(global_index)?;
        unit.slot(global_index - unit.first_slot_global_index)
    }

    pub fn slot_global_mut(&mut self, global_index: i32) -> Option<&mut SlotInfo> {
        let unit = self
            .units
            .iter_mut()
            .find(|u| u.contains_global(global_index))?;
        let local = usize::try_from(global_index - unit.first_slot_global_index).ok()?;
        unit.slots.get_mut(local)
    }

    /// Unit owning a global slot index
    pub fn unit_for_slot(&self, global_index: i32) -> Option<&AmsUnit> {
        self.units.iter().find(|u| u.contains_global(global_index))
    }

    pub fn active_unit_index(&self) -> Option<usize> {
        self.units
            .iter()
            .position(|u| u.contains_global(self.current_slot))
    }

    /// Currently selected slot, if any
    pub fn active_slot(&self) -> Option<&SlotInfo> {
        self.slot_global(self.current_slot)
    }

    pub fn is_busy(&self) -> bool {
        self.action.is_busy()
    }

    /// True once hardware has been discovered
    pub fn is_available(&self) -> bool {
        self.ams_type != AmsType::None && self.total_slots > 0
    }

    pub fn is_multi_unit(&self) -> bool {
        self.units.len() > 1
    }

    pub fn is_bypass_selected(&self) -> bool {
        self.current_slot == BYPASS_SELECTION
    }

    /// Iterate all slots in global order
    pub fn slots(&self) -> impl Iterator<Item = &SlotInfo> {
        self.units.iter().flat_map(|u| u.slots.iter())
    }
}
