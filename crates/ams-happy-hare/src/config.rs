//! Happy Hare backend configuration

use serde::{Deserialize, Serialize};

/// Settings the `mmu` object doesn't report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HappyHareConfig {
    /// A physical sensor detects bypass filament
    pub hardware_bypass_sensor: bool,
    /// Display names per unit; missing entries fall back to "MMU Unit N"
    pub unit_names: Vec<String>,
}

impl HappyHareConfig {
    /// Display name of unit `index` in a system of `unit_count` units
    pub fn unit_name(&self, index: usize, unit_count: usize) -> String {
        if let Some(name) = self.unit_names.get(index).filter(|n| !n.is_empty()) {
            return name.clone();
        }
        if unit_count > 1 {
            format!("MMU Unit {}", index + 1)
        } else {
            "Happy Hare MMU".to_string()
        }
    }
}
