//! Scoped notification subscriptions

use std::sync::{Arc, Weak};

use tracing::debug;

use super::{MoonrakerClient, SubscriptionId};

/// Owns one notification subscription.
///
/// Holds the client weakly so a guard never keeps a connection alive.
/// Dropping the guard unsubscribes if the client still exists; call
/// [`release`](Self::release) first to skip that (e.g. during teardown,
/// when the client may already be shutting down).
pub struct SubscriptionGuard {
    client: Weak<dyn MoonrakerClient>,
    id: Option<SubscriptionId>,
}

impl SubscriptionGuard {
    pub fn new(client: &Arc<dyn MoonrakerClient>, id: SubscriptionId) -> Self {
        Self {
            client: Arc::downgrade(client),
            id: Some(id),
        }
    }

    pub fn id(&self) -> Option<SubscriptionId> {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.id.is_some()
    }

    /// Disarm without contacting the client
    pub fn release(&mut self) -> Option<SubscriptionId> {
        self.id.take()
    }

    /// Unsubscribe now (best effort)
    pub fn reset(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        match self.client.upgrade() {
            Some(client) => {
                if !client.unsubscribe(id) {
                    debug!(subscription_id = id, "Subscription already gone");
                }
            }
            None => debug!(subscription_id = id, "Client dropped before unsubscribe"),
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.reset();
    }
}

impl std::fmt::Debug for SubscriptionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionGuard")
            .field("id", &self.id)
            .finish()
    }
}
