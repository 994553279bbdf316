//! Happy Hare state and `mmu` object parsing

use ams_core::{
    AmsAction, AmsSystemInfo, AmsType, AmsUnit, BackendState, PathSegment, SlotError, SlotInfo,
    SlotStatus,
};
use serde_json::{Map, Value};
use tracing::{debug, info, trace};

use crate::config::HappyHareConfig;

/// Printer object published by Happy Hare
pub(crate) const MMU_OBJECT: &str = "mmu";

/// `filament_pos` at or beyond which filament has passed the selector
const PAST_HUB_POS: i64 = 3;

/// Everything the backend knows about the MMU
pub(crate) struct HappyHareState {
    pub system_info: AmsSystemInfo,
    /// Raw `filament_pos`, -1 until reported
    pub filament_pos: i64,
    /// Where the last error happened; `None` outside ERROR
    pub error_segment: PathSegment,
    pub reason_for_pause: String,
    config: HappyHareConfig,
    num_units: usize,
    /// Unit count the current layout was built with
    layout_units: usize,
    /// Slot carrying the error set on entering ERROR
    errored_slot: Option<i32>,
}

impl HappyHareState {
    pub fn new(config: HappyHareConfig) -> Self {
        let mut system_info = AmsSystemInfo::new(AmsType::HappyHare);
        system_info.version = "unknown".to_string();
        system_info.supports_endless_spool = true;
        system_info.supports_spoolman = true;
        system_info.supports_tool_mapping = true;
        system_info.supports_bypass = true;
        system_info.has_hardware_bypass_sensor = config.hardware_bypass_sensor;

        Self {
            system_info,
            filament_pos: -1,
            error_segment: PathSegment::None,
            reason_for_pause: String::new(),
            config,
            num_units: 1,
            layout_units: 0,
            errored_slot: None,
        }
    }

    pub fn gates_initialized(&self) -> bool {
        self.layout_units > 0
    }

    /// Segment of the active filament
    pub fn filament_segment(&self) -> PathSegment {
        PathSegment::from_happy_hare_pos(self.filament_pos)
    }

    /// Build units and slots for `gate_count` gates, discarding the old layout
    fn initialize_gates(&mut self, gate_count: usize) {
        let unit_count = self.num_units.clamp(1, gate_count.max(1));
        let per_unit = gate_count / unit_count;
        info!(gate_count, unit_count, "Initializing Happy Hare gates");

        let mut units = Vec::with_capacity(unit_count);
        let mut first = 0;
        for u in 0..unit_count {
            // Last unit takes the remainder
            let count = if u + 1 == unit_count {
                gate_count - first
            } else {
                per_unit
            };
            let slots = (0..count)
                .map(|i| SlotInfo {
                    mapped_tool: (first + i) as i32,
                    ..SlotInfo::new(i as i32, first as i32)
                })
                .collect();
            units.push(AmsUnit {
                unit_index: u as i32,
                name: self.config.unit_name(u, unit_count),
                slot_count: count as i32,
                first_slot_global_index: first as i32,
                slots,
                connected: true,
                has_encoder: true,
                has_toolhead_sensor: true,
                has_slot_sensors: true,
                has_hub_sensor: true,
                ..Default::default()
            });
            first += count;
        }

        self.system_info.units = units;
        self.system_info.total_slots = gate_count as i32;
        self.system_info.tool_to_slot_map = (0..gate_count as i32).collect();
        self.layout_units = self.num_units;
        self.errored_slot = None;
    }

    fn apply_action(&mut self, action_str: &str, incoming_pos: Option<i64>) {
        let previous = self.system_info.action;
        let action = AmsAction::from_happy_hare(action_str);
        self.system_info.action = action;
        self.system_info.operation_detail = action_str.to_string();
        trace!(action = action_str, parsed = %action, "MMU action");

        if previous == AmsAction::Error && action == AmsAction::Idle {
            self.error_segment = PathSegment::None;
            self.reason_for_pause.clear();
            if let Some(slot) = self.errored_slot.take() {
                if let Some(info) = self.system_info.slot_global_mut(slot) {
                    info.error = None;
                }
            }
            debug!("MMU error cleared");
        } else if action == AmsAction::Error && previous != AmsAction::Error {
            let pos = incoming_pos.unwrap_or(self.filament_pos);
            self.error_segment = PathSegment::from_happy_hare_pos(pos);

            let slot = self.system_info.current_slot;
            let message = if self.reason_for_pause.is_empty() {
                action_str.to_string()
            } else {
                self.reason_for_pause.clone()
            };
            if let Some(info) = self.system_info.slot_global_mut(slot) {
                info.error = Some(SlotError::error(message.clone()));
                self.errored_slot = Some(slot);
            }
            info!(
                slot,
                segment = %self.error_segment,
                reason = %message,
                "MMU entered error state"
            );
        }
    }

    fn apply_filament_pos(&mut self, pos: i64) {
        self.filament_pos = pos;
        trace!(pos, segment = %self.filament_segment(), "Filament position");

        let active = self.system_info.active_unit_index();
        for (i, unit) in self.system_info.units.iter_mut().enumerate() {
            unit.hub_sensor_triggered = active == Some(i) && pos >= PAST_HUB_POS;
        }
    }

    fn apply_gate_status(&mut self, gates: &[Value]) {
        if !gates.is_empty()
            && (gates.len() as i32 != self.system_info.total_slots
                || self.layout_units != self.num_units)
        {
            self.initialize_gates(gates.len());
        }

        let loaded = self.system_info.filament_loaded;
        let current = self.system_info.current_slot;
        for (i, value) in gates.iter().enumerate() {
            let Some(raw) = value.as_i64() else { continue };
            let mut status = SlotStatus::from_happy_hare(raw);
            if loaded && i as i32 == current && status == SlotStatus::Available {
                status = SlotStatus::Loaded;
            }
            if let Some(slot) = self.system_info.slot_global_mut(i as i32) {
                slot.status = status;
            }
        }
    }

    fn apply_ttg_map(&mut self, map: &[Value]) {
        self.system_info.tool_to_slot_map = map
            .iter()
            .filter_map(Value::as_i64)
            .map(|g| g as i32)
            .collect();

        for unit in &mut self.system_info.units {
            for slot in &mut unit.slots {
                slot.mapped_tool = -1;
            }
        }
        let map = self.system_info.tool_to_slot_map.clone();
        for (tool, gate) in map.into_iter().enumerate() {
            if let Some(slot) = self.system_info.slot_global_mut(gate) {
                slot.mapped_tool = tool as i32;
            }
        }
    }

    /// Apply `f` to each slot with a value in `array`
    fn for_each_gate<'a, T>(
        &mut self,
        array: &'a [Value],
        parse: impl Fn(&'a Value) -> Option<T>,
        mut f: impl FnMut(&mut SlotInfo, T),
    ) {
        for (i, value) in array.iter().enumerate() {
            let Some(v) = parse(value) else { continue };
            if let Some(slot) = self.system_info.slot_global_mut(i as i32) {
                f(slot, v);
            }
        }
    }

    fn apply_mmu(&mut self, mmu: &Map<String, Value>) {
        if let Some(gate) = mmu.get("gate").and_then(Value::as_i64) {
            self.system_info.current_slot = gate as i32;
            trace!(gate, "Current gate");
        }

        if let Some(tool) = mmu.get("tool").and_then(Value::as_i64) {
            self.system_info.current_tool = tool as i32;
            trace!(tool, "Current tool");
        }

        if let Some(filament) = mmu.get("filament").and_then(Value::as_str) {
            self.system_info.filament_loaded = filament == "Loaded";
            trace!(filament, "Filament state");
        }

        if let Some(reason) = mmu.get("reason_for_pause").and_then(Value::as_str) {
            self.reason_for_pause = reason.to_string();
        }

        let incoming_pos = mmu.get("filament_pos").and_then(Value::as_i64);

        if let Some(action) = mmu.get("action").and_then(Value::as_str) {
            self.apply_action(action, incoming_pos);
        }

        if let Some(pos) = incoming_pos {
            self.apply_filament_pos(pos);
        }

        if let Some(units) = mmu.get("num_units").and_then(Value::as_i64) {
            self.num_units = units.max(1) as usize;
            trace!(units = self.num_units, "Number of units");
            if self.gates_initialized()
                && self.layout_units != self.num_units
                && !mmu.contains_key("gate_status")
            {
                self.initialize_gates(self.system_info.total_slots as usize);
            }
        }

        if let Some(gates) = mmu.get("gate_status").and_then(Value::as_array) {
            self.apply_gate_status(gates);
        }

        if let Some(colors) = mmu.get("gate_color_rgb").and_then(Value::as_array) {
            self.for_each_gate(colors, parse_color, |slot, rgb| slot.color_rgb = rgb);
        }

        if let Some(materials) = mmu.get("gate_material").and_then(Value::as_array) {
            self.for_each_gate(materials, Value::as_str, |slot, m| {
                slot.material = m.to_string()
            });
        }

        if let Some(map) = mmu.get("ttg_map").and_then(Value::as_array) {
            self.apply_ttg_map(map);
        }

        if let Some(groups) = mmu.get("endless_spool_groups").and_then(Value::as_array) {
            self.for_each_gate(groups, Value::as_i64, |slot, g| {
                slot.endless_spool_group = g as i32
            });
        }
    }

    /// First other slot sharing `slot`'s endless spool group, -1 if none
    pub fn endless_spool_backup(&self, slot: &SlotInfo) -> i32 {
        if slot.endless_spool_group < 0 {
            return -1;
        }
        self.system_info
            .slots()
            .find(|s| {
                s.global_index != slot.global_index
                    && s.endless_spool_group == slot.endless_spool_group
            })
            .map_or(-1, |s| s.global_index)
    }
}

/// Gate colors arrive as integers; some firmware versions send hex strings
fn parse_color(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().map(|rgb| (rgb & 0x00FF_FFFF) as u32),
        Value::String(s) => ams_core::gcode::parse_hex_color(s),
        _ => None,
    }
}

impl BackendState for HappyHareState {
    fn system_info(&self) -> &AmsSystemInfo {
        &self.system_info
    }

    fn apply_status(&mut self, objects: &Map<String, Value>) -> bool {
        let Some(mmu) = objects.get(MMU_OBJECT).and_then(Value::as_object) else {
            return false;
        };
        trace!("Received mmu status update");
        self.apply_mmu(mmu);
        true
    }
}
