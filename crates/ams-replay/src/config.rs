//! Replay configuration file

use std::path::Path;

use ams_manager::AmsConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Replay configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Klipper object names, as returned by `printer.objects.list`
    pub printer_objects: Vec<String>,
    pub ams: AmsConfig,
}

impl ReplayConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}
