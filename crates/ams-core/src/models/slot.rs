//! Per-slot filament models

use serde::{Deserialize, Serialize};

/// Neutral grey used when a slot has no known color
pub const DEFAULT_SLOT_COLOR: u32 = 0x808080;

/// Filament presence in a slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    #[default]
    Unknown,
    /// No filament
    Empty,
    /// Filament present, not loaded
    Available,
    /// Loaded to the extruder (or tool mounted)
    Loaded,
    /// Available from a buffer
    FromBuffer,
    /// Blocked or jammed
    Blocked,
}

impl SlotStatus {
    /// Map a Happy Hare `gate_status` value (-1, 0, 1, 2)
    pub fn from_happy_hare(status: i64) -> Self {
        match status {
            0 => SlotStatus::Empty,
            1 => SlotStatus::Available,
            2 => SlotStatus::FromBuffer,
            _ => SlotStatus::Unknown,
        }
    }

    /// Whether filament is physically present
    pub fn has_filament(self) -> bool {
        matches!(
            self,
            SlotStatus::Available | SlotStatus::Loaded | SlotStatus::FromBuffer
        )
    }
}

impl std::fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SlotStatus::Unknown => "Unknown",
            SlotStatus::Empty => "Empty",
            SlotStatus::Available => "Available",
            SlotStatus::Loaded => "Loaded",
            SlotStatus::FromBuffer => "From Buffer",
            SlotStatus::Blocked => "Blocked",
        })
    }
}

/// Severity of a per-slot fault
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotErrorSeverity {
    Info,
    Warning,
    #[default]
    Error,
}

/// Fault attached to a single slot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotError {
    pub message: String,
    pub severity: SlotErrorSeverity,
}

impl SlotError {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: SlotErrorSeverity::Error,
        }
    }
}

/// Filament slot (gate, lane or tool)
///
/// Indices are signed; `-1` marks "none". A `SlotInfo` whose `slot_index` is
/// `-1` is the value returned for an out-of-range lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotInfo {
    /// Index within the owning unit
    pub slot_index: i32,
    /// Index across all units
    pub global_index: i32,
    pub status: SlotStatus,
    /// Named color ("Red", "Galaxy Black")
    #[serde(default)]
    pub color_name: String,
    /// 0xRRGGBB
    pub color_rgb: u32,
    /// Comma separated hex codes for multi-color filament
    #[serde(default)]
    pub multi_color_hexes: String,
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub nozzle_temp_min: i32,
    #[serde(default)]
    pub nozzle_temp_max: i32,
    #[serde(default)]
    pub bed_temp: i32,
    /// Tool this slot feeds, -1 if unmapped
    pub mapped_tool: i32,
    /// Spoolman spool id, 0 if untracked
    #[serde(default)]
    pub spoolman_id: i32,
    #[serde(default)]
    pub spool_name: String,
    /// Grams, negative if unknown
    pub remaining_weight_g: f32,
    /// Grams, negative if unknown
    pub total_weight_g: f32,
    /// Endless spool group, -1 if ungrouped
    pub endless_spool_group: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<SlotError>,
}

impl Default for SlotInfo {
    fn default() -> Self {
        Self {
            slot_index: -1,
            global_index: -1,
            status: SlotStatus::Unknown,
            color_name: String::new(),
            color_rgb: DEFAULT_SLOT_COLOR,
            multi_color_hexes: String::new(),
            material: String::new(),
            brand: String::new(),
            nozzle_temp_min: 0,
            nozzle_temp_max: 0,
            bed_temp: 0,
            mapped_tool: -1,
            spoolman_id: 0,
            spool_name: String::new(),
            remaining_weight_g: -1.0,
            total_weight_g: -1.0,
            endless_spool_group: -1,
            error: None,
        }
    }
}

impl SlotInfo {
    /// Slot at `index` within a unit whose first global index is `first_global`
    pub fn new(index: i32, first_global: i32) -> Self {
        Self {
            slot_index: index,
            global_index: first_global + index,
            ..Default::default()
        }
    }

    /// Sentinel returned for out-of-range lookups
    pub fn invalid() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.slot_index >= 0
    }

    /// Remaining filament in percent, `None` when weights are unknown
    pub fn remaining_percent(&self) -> Option<f32> {
        if self.remaining_weight_g < 0.0 || self.total_weight_g <= 0.0 {
            return None;
        }
        Some((self.remaining_weight_g / self.total_weight_g * 100.0).clamp(0.0, 100.0))
    }

    pub fn has_filament_info(&self) -> bool {
        !self.material.is_empty() || self.color_rgb != DEFAULT_SLOT_COLOR
    }
}
