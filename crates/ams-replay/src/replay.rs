//! NDJSON replay of notifications and commands

use std::io::BufRead;

use ams_core::client::mock::MockMoonrakerClient;
use ams_core::client::notification::status_update;
use ams_core::{ActionValue, AmsBackend, AmsResult};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

/// A backend command recorded in a replay file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ReplayCommand {
    Load { slot: i32 },
    Unload,
    Select { slot: i32 },
    ChangeTool { tool: i32 },
    Recover,
    Reset,
    Cancel,
    MapTool { tool: i32, slot: i32 },
    BypassOn,
    BypassOff,
    Gcode { script: String },
    DeviceAction {
        id: String,
        #[serde(default)]
        value: Option<ActionValue>,
    },
}

impl ReplayCommand {
    pub fn execute(&self, backend: &dyn AmsBackend) -> AmsResult<()> {
        match self {
            ReplayCommand::Load { slot } => backend.load_filament(*slot),
            ReplayCommand::Unload => backend.unload_filament(),
            ReplayCommand::Select { slot } => backend.select_slot(*slot),
            ReplayCommand::ChangeTool { tool } => backend.change_tool(*tool),
            ReplayCommand::Recover => backend.recover(),
            ReplayCommand::Reset => backend.reset(),
            ReplayCommand::Cancel => backend.cancel(),
            ReplayCommand::MapTool { tool, slot } => backend.set_tool_mapping(*tool, *slot),
            ReplayCommand::BypassOn => backend.enable_bypass(),
            ReplayCommand::BypassOff => backend.disable_bypass(),
            ReplayCommand::Gcode { script } => backend.execute_gcode(script),
            ReplayCommand::DeviceAction { id, value } => {
                backend.execute_device_action(id, value.clone())
            }
        }
    }
}

/// One parsed line of a replay file
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayLine {
    /// Full JSON-RPC notification
    Notification(Value),
    Command(ReplayCommand),
}

impl ReplayLine {
    /// Parse a line; `None` for blank lines and `#` comments
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let value: Value = serde_json::from_str(line).context("Invalid JSON")?;
        let Some(object) = value.as_object() else {
            anyhow::bail!("Expected a JSON object");
        };

        if object.contains_key("command") {
            let command = serde_json::from_value(value).context("Invalid command")?;
            Ok(Some(ReplayLine::Command(command)))
        } else if object.contains_key("method") {
            Ok(Some(ReplayLine::Notification(value)))
        } else {
            // Bare printer objects
            Ok(Some(ReplayLine::Notification(status_update(value))))
        }
    }
}

/// Replay totals
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub notifications: usize,
    pub commands: usize,
    pub failed_commands: usize,
    pub gcodes: usize,
}

/// Feeds a replay stream to a backend through the mock client
pub struct Replayer<'a> {
    backend: &'a dyn AmsBackend,
    client: &'a MockMoonrakerClient,
    stats: ReplayStats,
}

impl<'a> Replayer<'a> {
    pub fn new(backend: &'a dyn AmsBackend, client: &'a MockMoonrakerClient) -> Self {
        Self {
            backend,
            client,
            stats: ReplayStats::default(),
        }
    }

    /// Apply one line; dispatched G-code is returned in send order
    pub fn apply(&mut self, line: &ReplayLine) -> Vec<String> {
        let before = self.client.sent_gcodes().len();

        match line {
            ReplayLine::Notification(notification) => {
                self.stats.notifications += 1;
                self.client.inject_notification(notification);
            }
            ReplayLine::Command(command) => {
                self.stats.commands += 1;
                match command.execute(self.backend) {
                    Ok(()) => info!(?command, "Command accepted"),
                    Err(e) => {
                        self.stats.failed_commands += 1;
                        warn!(?command, error = %e, "Command rejected");
                    }
                }
            }
        }

        let sent: Vec<String> = self.client.sent_gcodes().into_iter().skip(before).collect();
        self.stats.gcodes += sent.len();
        sent
    }

    /// Replay every line of `reader`, calling `on_gcode` for each dispatched script
    pub fn run(
        &mut self,
        reader: impl BufRead,
        mut on_gcode: impl FnMut(&str),
    ) -> Result<ReplayStats> {
        for (number, line) in reader.lines().enumerate() {
            let line = line.context("Failed to read replay input")?;
            let parsed = ReplayLine::parse(&line)
                .with_context(|| format!("Line {}", number + 1))?;
            if let Some(parsed) = parsed {
                for gcode in self.apply(&parsed) {
                    on_gcode(&gcode);
                }
            }
        }
        Ok(self.stats.clone())
    }
}
