//! Fire-and-forget G-code dispatch

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, error, info};

use super::MoonrakerClient;

/// Sends G-code and tracks its acknowledgement in the background.
///
/// The caller only learns whether the request was dispatched. Failures
/// reported later by the printer are logged, never returned.
#[derive(Clone)]
pub struct GcodeDispatcher {
    client: Arc<dyn MoonrakerClient>,
    backend: &'static str,
}

impl GcodeDispatcher {
    pub fn new(client: Arc<dyn MoonrakerClient>, backend: &'static str) -> Self {
        Self { client, backend }
    }

    pub fn client(&self) -> &Arc<dyn MoonrakerClient> {
        &self.client
    }

    pub fn dispatch(&self, script: &str) {
        info!(backend = self.backend, gcode = %script, "Sending G-code");
        let ack = self.client.execute_gcode(script);

        let backend = self.backend;
        let script = script.to_string();
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    match ack.await {
                        Ok(()) => debug!(backend, gcode = %script, "G-code acknowledged"),
                        Err(e) => error!(backend, gcode = %script, error = %e, "G-code failed"),
                    }
                });
            }
            Err(_) => {
                debug!(backend, gcode = %script, "No runtime, acknowledgement not tracked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockMoonrakerClient;
    use crate::client::ClientError;

    #[test]
    fn test_dispatch_without_runtime() {
        let mock = Arc::new(MockMoonrakerClient::new());
        let dispatcher = GcodeDispatcher::new(mock.clone(), "test");
        dispatcher.dispatch("MMU_HOME");
        assert_eq!(mock.sent_gcodes(), vec!["MMU_HOME".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_ack_is_swallowed() {
        let mock = Arc::new(MockMoonrakerClient::new());
        mock.fail_gcode(Some(ClientError::Rpc {
            code: 400,
            message: "Unknown command".to_string(),
        }));
        let dispatcher = GcodeDispatcher::new(mock.clone(), "test");
        dispatcher.dispatch("BOGUS");
        tokio::task::yield_now().await;
        assert_eq!(mock.last_gcode().as_deref(), Some("BOGUS"));
    }
}
