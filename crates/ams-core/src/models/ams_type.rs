//! Multi-material hardware families

use serde::{Deserialize, Serialize};

/// Kind of multi-material system attached to the printer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum AmsType {
    /// No multi-material hardware
    #[default]
    None,
    /// Happy Hare MMU (`mmu` printer object)
    HappyHare,
    /// AFC-Klipper add-on (`AFC` printer object)
    Afc,
    /// Anycubic ACE Pro via the ValgACE driver
    ValgAce,
    /// Physical tool changer (`toolchanger` + `tool <name>` objects)
    ToolChanger,
}

impl AmsType {
    /// Each slot is a complete toolhead
    pub fn is_tool_changer(self) -> bool {
        self == AmsType::ToolChanger
    }

    /// Several filaments are routed into one toolhead
    pub fn is_filament_system(self) -> bool {
        matches!(self, AmsType::HappyHare | AmsType::Afc | AmsType::ValgAce)
    }

    /// Lenient name lookup; unrecognised names map to `None`
    pub fn from_name(name: &str) -> Self {
        match name {
            "mmu" | "happy_hare" | "Happy Hare" => AmsType::HappyHare,
            "afc" | "AFC" => AmsType::Afc,
            "valgace" | "valg_ace" | "ValgACE" | "ace" | "ACE Pro" => AmsType::ValgAce,
            "toolchanger" | "tool_changer" | "Tool Changer" => AmsType::ToolChanger,
            _ => AmsType::None,
        }
    }
}

impl std::fmt::Display for AmsType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AmsType::None => "None",
            AmsType::HappyHare => "Happy Hare",
            AmsType::Afc => "AFC",
            AmsType::ValgAce => "ACE Pro",
            AmsType::ToolChanger => "Tool Changer",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for AmsType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match AmsType::from_name(s) {
            AmsType::None if s != "none" && s != "None" => {
                Err(format!("Unknown AMS type: '{}'", s))
            }
            t => Ok(t),
        }
    }
}

impl TryFrom<String> for AmsType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
