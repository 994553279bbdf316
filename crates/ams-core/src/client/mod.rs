//! Printer client abstraction
//!
//! Backends talk to the printer through [`MoonrakerClient`]: they subscribe
//! to status notifications and issue G-code scripts. Command acknowledgement
//! is asynchronous; the request itself is dispatched before `execute_gcode`
//! returns.
//!
//! - [`SubscriptionGuard`] ties a notification subscription to its owner
//! - [`GcodeDispatcher`] fires commands and logs their completion
//! - [`mock::MockMoonrakerClient`] records commands for tests

mod adapter;
mod dispatch;
pub mod error;
mod guard;
pub mod mock;
pub mod notification;

pub use adapter::{GcodeFuture, MoonrakerClient, NotifyCallback, SubscriptionId};
pub use dispatch::GcodeDispatcher;
pub use error::ClientError;
pub use guard::SubscriptionGuard;
pub use notification::{status_objects, NOTIFY_STATUS_UPDATE};
