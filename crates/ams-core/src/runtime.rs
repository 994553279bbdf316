//! Lifecycle plumbing shared by backends
//!
//! [`BackendCore`] owns a backend's state behind one lock together with the
//! lifecycle phase, the notification subscription and the event callback.
//! Notifications are applied under the lock; events are emitted after it is
//! released, so callbacks may query the backend freely.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, MutexGuard};
use serde_json::{Map, Value};
use tracing::{debug, error, info, trace};

use crate::backend::{check_preconditions, AmsEvent, EventCallback};
use crate::client::{
    status_objects, GcodeDispatcher, MoonrakerClient, NotifyCallback, SubscriptionGuard,
};
use crate::error::{AmsError, AmsResult};
use crate::models::AmsSystemInfo;

/// Backend-specific state driven by status notifications
pub trait BackendState: Send + 'static {
    fn system_info(&self) -> &AmsSystemInfo;

    /// Apply the changed printer objects of one notification.
    ///
    /// Returns true if anything relevant to this backend was applied.
    fn apply_status(&mut self, objects: &Map<String, Value>) -> bool;
}

/// Lifecycle of a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Stopped,
    /// Subscribing; notifications are applied but commands are rejected
    Starting,
    Running,
}

/// Everything guarded by the backend lock
pub struct CoreInner<S> {
    pub state: S,
    phase: Phase,
    subscription: Option<SubscriptionGuard>,
    event_callback: Option<EventCallback>,
}

impl<S> CoreInner<S> {
    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }
}

struct CoreShared<S> {
    inner: Mutex<CoreInner<S>>,
}

impl<S: BackendState> CoreShared<S> {
    fn emit(&self, event: AmsEvent) {
        let callback = self.inner.lock().event_callback.clone();
        if let Some(cb) = callback {
            debug!(event = event.name(), "Emitting event");
            cb(&event);
        }
    }

    fn handle_notification(&self, notification: &Value) {
        let Some(objects) = status_objects(notification) else {
            return;
        };

        let (changed, phase) = {
            let mut inner = self.inner.lock();
            let phase = inner.phase;
            match phase {
                // Late delivery after stop() is dropped
                Phase::Stopped => {
                    trace!("Dropping notification for stopped backend");
                    return;
                }
                Phase::Starting | Phase::Running => (inner.state.apply_status(objects), phase),
            }
        };

        // start() announces the initial snapshot once it completes
        if changed && phase == Phase::Running {
            self.emit(AmsEvent::StateChanged);
        }
    }
}

/// Shared core of a backend: state, lifecycle, events and G-code dispatch
pub struct BackendCore<S> {
    name: &'static str,
    dispatcher: Option<GcodeDispatcher>,
    shared: Arc<CoreShared<S>>,
}

impl<S: BackendState> BackendCore<S> {
    pub fn new(name: &'static str, client: Option<Arc<dyn MoonrakerClient>>, state: S) -> Self {
        Self {
            name,
            dispatcher: client.map(|c| GcodeDispatcher::new(c, name)),
            shared: Arc::new(CoreShared {
                inner: Mutex::new(CoreInner {
                    state,
                    phase: Phase::Stopped,
                    subscription: None,
                    event_callback: None,
                }),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Lock the backend state
    pub fn lock(&self) -> MutexGuard<'_, CoreInner<S>> {
        self.shared.inner.lock()
    }

    /// Lock the state if the backend is running and idle
    pub fn lock_ready(&self) -> AmsResult<MutexGuard<'_, CoreInner<S>>> {
        let inner = self.shared.inner.lock();
        check_preconditions(inner.is_running(), inner.state.system_info())?;
        Ok(inner)
    }

    /// Lock the state if the backend is running, busy or not
    pub fn lock_running(&self) -> AmsResult<MutexGuard<'_, CoreInner<S>>> {
        let inner = self.shared.inner.lock();
        if !inner.is_running() {
            return Err(AmsError::not_connected(format!(
                "{} backend not started",
                self.name
            )));
        }
        Ok(inner)
    }

    /// Subscribe to printer updates.
    ///
    /// `precheck` runs under the lock before subscribing and can veto the
    /// start (e.g. nothing discovered yet). Starting twice is a no-op.
    ///
    /// Status pushed while the subscription is being registered is applied,
    /// so a transport replaying its cached status on subscribe is not lost.
    pub fn start(&self, precheck: impl FnOnce(&S) -> AmsResult<()>) -> AmsResult<()> {
        let client = {
            let mut inner = self.shared.inner.lock();
            if inner.phase != Phase::Stopped {
                return Ok(());
            }
            let Some(dispatcher) = self.dispatcher.as_ref() else {
                error!(backend = self.name, "Cannot start: no printer client");
                return Err(AmsError::not_connected("Printer client not available"));
            };
            if let Err(e) = precheck(&inner.state) {
                error!(backend = self.name, error = %e, "Cannot start");
                return Err(e);
            }
            inner.phase = Phase::Starting;
            dispatcher.client().clone()
        };

        let id = match client.register_notify_update(self.notify_callback()) {
            Ok(id) => id,
            Err(e) => {
                self.shared.inner.lock().phase = Phase::Stopped;
                error!(backend = self.name, error = %e, "Failed to subscribe to printer updates");
                return Err(AmsError::not_connected(format!(
                    "Failed to subscribe to printer updates: {}",
                    e
                )));
            }
        };
        let guard = SubscriptionGuard::new(&client, id);

        {
            let mut inner = self.shared.inner.lock();
            if inner.phase != Phase::Starting {
                // stop() ran while subscribing; drop our subscription outside the lock
                drop(inner);
                drop(guard);
                info!(backend = self.name, "Backend stopped during start");
                return Ok(());
            }
            inner.subscription = Some(guard);
            inner.phase = Phase::Running;
        }

        info!(backend = self.name, subscription_id = id, "Backend started");
        self.shared.emit(AmsEvent::StateChanged);
        Ok(())
    }

    /// Unsubscribe and mark stopped. Stopping twice is a no-op.
    pub fn stop(&self) {
        let guard = {
            let mut inner = self.shared.inner.lock();
            if inner.phase == Phase::Stopped {
                return;
            }
            inner.phase = Phase::Stopped;
            inner.subscription.take()
        };
        drop(guard);
        info!(backend = self.name, "Backend stopped");
    }

    pub fn is_running(&self) -> bool {
        self.shared.inner.lock().is_running()
    }

    pub fn set_event_callback(&self, callback: Option<EventCallback>) {
        self.shared.inner.lock().event_callback = callback;
    }

    /// Emit an event; never call with the state locked
    pub fn emit(&self, event: AmsEvent) {
        self.shared.emit(event);
    }

    /// Send G-code; `NotConnected` without a client
    pub fn dispatch(&self, script: &str) -> AmsResult<()> {
        let dispatcher = self
            .dispatcher
            .as_ref()
            .ok_or_else(|| AmsError::not_connected("Printer client not available"))?;
        dispatcher.dispatch(script);
        Ok(())
    }

    fn notify_callback(&self) -> NotifyCallback {
        let weak: Weak<CoreShared<S>> = Arc::downgrade(&self.shared);
        Arc::new(move |notification: &Value| {
            if let Some(shared) = weak.upgrade() {
                shared.handle_notification(notification);
            }
        })
    }
}

impl<S> Drop for BackendCore<S> {
    fn drop(&mut self) {
        // The client may already be shutting down; don't call into it.
        if let Some(mut guard) = self.shared.inner.lock().subscription.take() {
            guard.release();
        }
    }
}
