//! Mock printer client for testing

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use futures::future::{self, FutureExt};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use super::notification::status_update;
use super::{ClientError, GcodeFuture, MoonrakerClient, NotifyCallback, SubscriptionId};

/// In-process client that records G-code and replays notifications
pub struct MockMoonrakerClient {
    connected: AtomicBool,
    next_id: AtomicU64,
    unsubscribe_calls: AtomicUsize,
    callbacks: RwLock<Vec<(SubscriptionId, NotifyCallback)>>,
    gcodes: Mutex<Vec<String>>,
    gcode_error: Mutex<Option<ClientError>>,
    subscribe_error: Mutex<Option<ClientError>>,
    subscribe_snapshot: Mutex<Option<Value>>,
}

impl Default for MockMoonrakerClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMoonrakerClient {
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            next_id: AtomicU64::new(1),
            unsubscribe_calls: AtomicUsize::new(0),
            callbacks: RwLock::new(Vec::new()),
            gcodes: Mutex::new(Vec::new()),
            gcode_error: Mutex::new(None),
            subscribe_error: Mutex::new(None),
            subscribe_snapshot: Mutex::new(None),
        }
    }

    /// Deliver a raw notification to every subscriber.
    ///
    /// Callbacks run on the calling thread with no mock lock held.
    pub fn inject_notification(&self, notification: &Value) {
        let callbacks: Vec<NotifyCallback> = self
            .callbacks
            .read()
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();
        for cb in callbacks {
            cb(notification);
        }
    }

    /// Deliver a `notify_status_update` carrying `objects`
    pub fn inject_status(&self, objects: Value) {
        self.inject_notification(&status_update(objects));
    }

    /// Set connection state; a disconnected client rejects G-code
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Make subsequent acknowledgements fail with `error`
    pub fn fail_gcode(&self, error: Option<ClientError>) {
        *self.gcode_error.lock() = error;
    }

    /// Make subsequent subscriptions fail with `error`
    pub fn fail_subscribe(&self, error: Option<ClientError>) {
        *self.subscribe_error.lock() = error;
    }

    /// Push `objects` to each new subscriber from inside registration,
    /// the way a transport replays its cached status
    pub fn set_subscribe_snapshot(&self, objects: Option<Value>) {
        *self.subscribe_snapshot.lock() = objects.map(status_update);
    }

    pub fn sent_gcodes(&self) -> Vec<String> {
        self.gcodes.lock().clone()
    }

    pub fn last_gcode(&self) -> Option<String> {
        self.gcodes.lock().last().cloned()
    }

    pub fn clear_gcodes(&self) {
        self.gcodes.lock().clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.callbacks.read().len()
    }

    pub fn unsubscribe_calls(&self) -> usize {
        self.unsubscribe_calls.load(Ordering::SeqCst)
    }
}

impl MoonrakerClient for MockMoonrakerClient {
    fn register_notify_update(
        &self,
        callback: NotifyCallback,
    ) -> Result<SubscriptionId, ClientError> {
        if let Some(err) = self.subscribe_error.lock().clone() {
            return Err(err);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.callbacks.write().push((id, callback.clone()));
        tracing::debug!(subscription_id = id, "Mock client: registered subscriber");

        let snapshot = self.subscribe_snapshot.lock().clone();
        if let Some(notification) = snapshot {
            callback(&notification);
        }
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.unsubscribe_calls.fetch_add(1, Ordering::SeqCst);
        let mut callbacks = self.callbacks.write();
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        callbacks.len() != before
    }

    fn execute_gcode(&self, script: &str) -> GcodeFuture {
        if !self.connected.load(Ordering::SeqCst) {
            return future::ready(Err(ClientError::NotConnected)).boxed();
        }
        self.gcodes.lock().push(script.to_string());
        tracing::debug!(gcode = %script, "Mock client: sent G-code");

        let result = match self.gcode_error.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        };
        future::ready(result).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_inject_reaches_all_subscribers() {
        let mock = MockMoonrakerClient::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..2 {
            let hits = hits.clone();
            mock.register_notify_update(Arc::new(move |_: &Value| {
                hits.fetch_add(1, Ordering::SeqCst);
            }))
            .expect("subscribe");
        }
        mock.inject_status(serde_json::json!({"mmu": {}}));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_disconnected_rejects_gcode() {
        let mock = MockMoonrakerClient::new();
        mock.set_connected(false);
        let result = futures::executor::block_on(mock.execute_gcode("G28"));
        assert_eq!(result, Err(ClientError::NotConnected));
        assert!(mock.sent_gcodes().is_empty());
    }

    #[test]
    fn test_subscribe_failure() {
        let mock = MockMoonrakerClient::new();
        mock.fail_subscribe(Some(ClientError::NotConnected));
        assert!(mock.register_notify_update(Arc::new(|_: &Value| {})).is_err());
        assert_eq!(mock.subscriber_count(), 0);
    }

    #[test]
    fn test_subscribe_snapshot_delivered_during_registration() {
        let mock = MockMoonrakerClient::new();
        mock.set_subscribe_snapshot(Some(serde_json::json!({"mmu": {"gate": 1}})));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        mock.register_notify_update(Arc::new(move |n: &Value| sink.lock().push(n.clone())))
            .expect("subscribe");

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["params"][0]["mmu"]["gate"], 1);
    }
}
