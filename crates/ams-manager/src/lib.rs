//! AMS manager - selects and owns the active backend
//!
//! Detects which multi-material system a printer has from its Klipper
//! object list, constructs the matching backend and manages its lifecycle.
//! Consumers only ever see `&dyn AmsBackend`.

pub mod config;
pub mod discovery;
pub mod manager;

pub use config::{AmsConfig, ConfigError};
pub use discovery::HardwareDiscovery;
pub use manager::AmsManager;
