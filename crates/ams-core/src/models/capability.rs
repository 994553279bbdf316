//! Optional feature capabilities

use serde::{Deserialize, Serialize};

/// Tool-to-slot mapping support
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolMappingCapabilities {
    pub supported: bool,
    /// Whether the mapping can be changed from the UI
    pub editable: bool,
    #[serde(default)]
    pub description: String,
}

/// Endless spool (automatic backup slot) support
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndlessSpoolCapabilities {
    pub supported: bool,
    pub editable: bool,
    #[serde(default)]
    pub description: String,
}

/// Backup assignment for one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndlessSpoolConfig {
    pub slot_index: i32,
    /// -1 when the slot has no backup
    pub backup_slot: i32,
}
