//! ams-replay - drive an AMS backend from a recorded session
//!
//! Usage:
//!   ams-replay [OPTIONS] <replay.ndjson>
//!
//! Each line of the replay file is one of:
//!   - a `notify_status_update` JSON-RPC notification
//!   - a bare object of printer objects (`{"mmu": {...}}`)
//!   - a command: `{"command": "load", "slot": 1}`
//!
//! Backends talk to an in-process mock printer; dispatched G-code is printed
//! as `> SCRIPT`.

mod config;
mod replay;

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use ams_core::client::mock::MockMoonrakerClient;
use ams_core::{AmsEvent, AmsSystemInfo, MoonrakerClient};
use ams_manager::{AmsManager, HardwareDiscovery};
use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::ReplayConfig;
use crate::replay::Replayer;

const DEFAULT_LOG_FILTER: &str =
    "ams_replay=info,ams_core=info,ams_happy_hare=debug,ams_toolchanger=debug,ams_manager=info";

#[derive(Parser)]
#[command(name = "ams-replay")]
#[command(author, version, about = "Replay printer status and AMS commands through a backend")]
struct Cli {
    /// Replay file (NDJSON); `-` reads stdin
    replay: PathBuf,

    /// Configuration file path
    #[arg(short, long, env = "AMS_REPLAY_CONFIG")]
    config: Option<PathBuf>,

    /// Extra printer objects for discovery (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    objects: Vec<String>,

    /// Print the final system snapshot as JSON
    #[arg(long)]
    json: bool,
}

fn summary(info: &AmsSystemInfo) -> String {
    format!(
        "{} {}: {} slots in {} unit(s), action {}, slot {}, tool {}, filament {}",
        info.type_name,
        info.version,
        info.total_slots,
        info.units.len(),
        info.action,
        info.current_slot,
        info.current_tool,
        if info.filament_loaded { "loaded" } else { "unloaded" }
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ReplayConfig::load_from(path)?,
        None => ReplayConfig::default(),
    };
    config.printer_objects.extend(cli.objects.iter().cloned());

    let mock = Arc::new(MockMoonrakerClient::new());
    let client: Arc<dyn MoonrakerClient> = mock.clone();
    let mut manager = AmsManager::new(Some(client), config.ams.clone());
    manager.set_event_callback(Some(Arc::new(|event: &AmsEvent| {
        tracing::debug!(event = event.name(), "Backend event");
    })));

    let discovery = HardwareDiscovery::from_objects(config.printer_objects.as_slice());
    let ams_type = manager
        .init_from_hardware(&discovery)
        .context("Failed to initialise AMS backend")?;
    tracing::info!(backend = %ams_type, "Replaying against backend");

    let backend = manager
        .backend()
        .context("Backend missing after initialisation")?;

    let stats = {
        let mut replayer = Replayer::new(backend, &mock);
        let on_gcode = |gcode: &str| println!("> {}", gcode);
        if cli.replay.as_os_str() == "-" {
            replayer.run(io::stdin().lock(), on_gcode)?
        } else {
            let file = File::open(&cli.replay)
                .with_context(|| format!("Failed to open {}", cli.replay.display()))?;
            replayer.run(BufReader::new(file), on_gcode)?
        }
    };

    // Let pending G-code acknowledgements finish logging
    tokio::task::yield_now().await;

    let info = backend.get_system_info();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("{}", summary(&info));
    }
    tracing::info!(
        notifications = stats.notifications,
        commands = stats.commands,
        failed = stats.failed_commands,
        gcodes = stats.gcodes,
        "Replay complete"
    );

    manager.shutdown();
    Ok(())
}
