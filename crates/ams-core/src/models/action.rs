//! Operation state of an AMS

use serde::{Deserialize, Serialize};

/// Operation currently in progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmsAction {
    #[default]
    Idle,
    Loading,
    Unloading,
    /// Selecting a slot, or swapping tools on a tool changer
    Selecting,
    /// Homing / re-initialising
    Resetting,
    FormingTip,
    Heating,
    /// Internal sensor verification
    Checking,
    /// Waiting for user attention
    Paused,
    Error,
    Cutting,
    Purging,
}

impl AmsAction {
    /// Parse a Happy Hare `mmu.action` string.
    ///
    /// Unrecognised strings map to `Idle`.
    pub fn from_happy_hare(action: &str) -> Self {
        match action {
            "Idle" => AmsAction::Idle,
            "Loading" => AmsAction::Loading,
            "Unloading" => AmsAction::Unloading,
            "Selecting" => AmsAction::Selecting,
            "Homing" | "Resetting" => AmsAction::Resetting,
            "Cutting" => AmsAction::Cutting,
            "Forming Tip" => AmsAction::FormingTip,
            "Heating" => AmsAction::Heating,
            "Checking" => AmsAction::Checking,
            "Purging" => AmsAction::Purging,
            s if s.contains("Pause") => AmsAction::Paused,
            s if s.contains("Error") => AmsAction::Error,
            _ => AmsAction::Idle,
        }
    }

    /// True for every action that blocks new commands
    pub fn is_busy(self) -> bool {
        !matches!(self, AmsAction::Idle | AmsAction::Error)
    }
}

impl std::fmt::Display for AmsAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AmsAction::Idle => "Idle",
            AmsAction::Loading => "Loading",
            AmsAction::Unloading => "Unloading",
            AmsAction::Selecting => "Selecting",
            AmsAction::Resetting => "Resetting",
            AmsAction::FormingTip => "Forming Tip",
            AmsAction::Heating => "Heating",
            AmsAction::Checking => "Checking",
            AmsAction::Paused => "Paused",
            AmsAction::Error => "Error",
            AmsAction::Cutting => "Cutting",
            AmsAction::Purging => "Purging",
        };
        f.write_str(s)
    }
}
