//! ams-toolchanger - Tool changer backend
//!
//! Drives printers with multiple physical toolheads via klipper-toolchanger.
//! Each tool is one slot; "loading" a slot means mounting its tool.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            ToolChangerBackend                │
//! │  Implements AmsBackend trait                 │
//! │                                              │
//! │   commands ──► GcodeDispatcher ──┐           │
//! │                                  ▼           │
//! │                          MoonrakerClient     │
//! │                                  │           │
//! │   ToolChangerState ◄── status ◄──┘           │
//! │   (toolchanger, tool <name>)                 │
//! └──────────────────────────────────────────────┘
//! ```

pub mod backend;
mod status;

pub use backend::ToolChangerBackend;

// Re-export for convenience
pub use ams_core::{AmsBackend, AmsError, AmsEvent, AmsResult};
