//! Happy Hare backend for AMS
//!
//! Drives a classic selector-style MMU running Happy Hare firmware. All
//! state comes from the `mmu` printer object; commands are `MMU_*` G-code.
//!
//! ```text
//! ┌──────────────────┐  notify_status_update   ┌───────────────────┐
//! │ MoonrakerClient  │ ──────────────────────► │ HappyHareBackend  │
//! │                  │ ◄────────────────────── │  (gates → slots)  │
//! └──────────────────┘   MMU_LOAD / T{n} ...   └───────────────────┘
//! ```
//!
//! Gates are spread over one or more units; slot indices are global.

pub mod backend;
pub mod config;
mod device;
mod status;

pub use backend::HappyHareBackend;
pub use config::HappyHareConfig;

// Re-export core types for convenience
pub use ams_core::{AmsBackend, AmsError, AmsEvent, AmsResult};
