//! Client trait and callback types

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use super::ClientError;

/// Handle for a registered notification callback
pub type SubscriptionId = u64;

/// Callback invoked with each raw notification (`{"method", "params"}`)
pub type NotifyCallback = Arc<dyn Fn(&Value) + Send + Sync>;

/// Resolves once the printer acknowledges a G-code script
pub type GcodeFuture = BoxFuture<'static, Result<(), ClientError>>;

/// Connection to a Moonraker-style printer API
pub trait MoonrakerClient: Send + Sync {
    /// Register for status notifications.
    ///
    /// The callback may run on any thread and must not block.
    fn register_notify_update(&self, callback: NotifyCallback)
        -> Result<SubscriptionId, ClientError>;

    /// Remove a previously registered callback; `false` if the id was unknown
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Send a G-code script.
    ///
    /// The request is on the wire when this returns. The returned future only
    /// reports the printer's acknowledgement and may be dropped.
    fn execute_gcode(&self, script: &str) -> GcodeFuture;
}
