//! Filament path model

use serde::{Deserialize, Serialize};

/// How slots are routed to the nozzle(s)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathTopology {
    /// Selector picks one input (serial)
    #[default]
    Linear,
    /// Merger combines inputs through a hub
    Hub,
    /// Each slot is its own toolhead
    Parallel,
}

impl std::fmt::Display for PathTopology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PathTopology::Linear => "Linear (Selector)",
            PathTopology::Hub => "Hub (Merger)",
            PathTopology::Parallel => "Parallel (Tool Changer)",
        })
    }
}

/// Logical position of filament along its path, spool to nozzle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathSegment {
    #[default]
    None,
    Spool,
    Prep,
    Lane,
    Hub,
    Output,
    Toolhead,
    Nozzle,
}

impl PathSegment {
    /// Map a Happy Hare `filament_pos` value
    pub fn from_happy_hare_pos(pos: i64) -> Self {
        match pos {
            0 => PathSegment::Spool,
            1 | 2 => PathSegment::Prep,
            3 => PathSegment::Lane,
            4 => PathSegment::Hub,
            5 => PathSegment::Output,
            6 => PathSegment::Toolhead,
            7 | 8 => PathSegment::Nozzle,
            _ => PathSegment::None,
        }
    }
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PathSegment::None => "None",
            PathSegment::Spool => "Spool",
            PathSegment::Prep => "Prep",
            PathSegment::Lane => "Lane",
            PathSegment::Hub => "Hub",
            PathSegment::Output => "Output",
            PathSegment::Toolhead => "Toolhead",
            PathSegment::Nozzle => "Nozzle",
        })
    }
}
