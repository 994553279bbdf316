//! Hardware discovery from the Klipper object list

use ams_core::AmsType;
use tracing::debug;

const TOOL_PREFIX: &str = "tool ";

/// One multi-material system found on the printer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedSystem {
    pub ams_type: AmsType,
    /// Display name
    pub name: String,
}

/// What the printer's object list says about AMS hardware
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HardwareDiscovery {
    pub has_mmu: bool,
    pub has_afc: bool,
    pub has_toolchanger: bool,
    /// Names from `tool <name>` objects, sorted
    pub tool_names: Vec<String>,
}

impl HardwareDiscovery {
    /// Scan `printer.objects.list` output
    pub fn from_objects<S: AsRef<str>>(objects: &[S]) -> Self {
        let mut discovery = Self::default();

        for object in objects {
            let name = object.as_ref();
            match name {
                "mmu" => discovery.has_mmu = true,
                "AFC" => discovery.has_afc = true,
                "toolchanger" => discovery.has_toolchanger = true,
                _ => {
                    if let Some(tool) = name.strip_prefix(TOOL_PREFIX) {
                        if !tool.is_empty() {
                            discovery.tool_names.push(tool.to_string());
                        }
                    }
                }
            }
        }

        discovery.tool_names.sort();
        discovery.tool_names.dedup();
        debug!(
            mmu = discovery.has_mmu,
            afc = discovery.has_afc,
            toolchanger = discovery.has_toolchanger,
            tools = discovery.tool_names.len(),
            "Hardware discovery complete"
        );
        discovery
    }

    /// Tool changer present with at least one tool
    pub fn has_tool_changer(&self) -> bool {
        self.has_toolchanger && !self.tool_names.is_empty()
    }

    /// Every system found, highest priority first
    pub fn detected_systems(&self) -> Vec<DetectedSystem> {
        let mut systems = Vec::new();
        if self.has_tool_changer() {
            systems.push(DetectedSystem {
                ams_type: AmsType::ToolChanger,
                name: format!("Tool Changer ({} tools)", self.tool_names.len()),
            });
        }
        if self.has_mmu {
            systems.push(DetectedSystem {
                ams_type: AmsType::HappyHare,
                name: AmsType::HappyHare.to_string(),
            });
        }
        if self.has_afc {
            systems.push(DetectedSystem {
                ams_type: AmsType::Afc,
                name: AmsType::Afc.to_string(),
            });
        }
        systems
    }

    /// The system to drive; a tool changer wins over filament systems
    pub fn primary(&self) -> AmsType {
        self.detected_systems()
            .first()
            .map_or(AmsType::None, |s| s.ams_type)
    }
}
