//! ams-core - Core traits and types for multi-material printer backends
//!
//! This crate provides the abstractions shared by every AMS backend
//! (Happy Hare, tool changer, ...): the domain model, the [`AmsBackend`]
//! trait, the error type, and the printer client interface backends use to
//! receive status and send G-code.

pub mod backend;
pub mod client;
pub mod error;
pub mod gcode;
pub mod models;
pub mod runtime;

pub use backend::{
    check_preconditions, validate_slot_index, AmsBackend, AmsEvent, EventCallback,
};
pub use client::{ClientError, GcodeDispatcher, MoonrakerClient, SubscriptionGuard};
pub use error::{AmsError, AmsErrorKind, AmsResult};
pub use models::*;
pub use runtime::{BackendCore, BackendState, CoreInner};
