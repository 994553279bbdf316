//! AmsManager - owns the active backend

use std::sync::Arc;

use ams_core::{AmsBackend, AmsError, AmsResult, AmsType, EventCallback, MoonrakerClient};
use ams_happy_hare::HappyHareBackend;
use ams_toolchanger::ToolChangerBackend;
use tracing::{error, info, warn};

use crate::config::AmsConfig;
use crate::discovery::HardwareDiscovery;

/// Selects, constructs and owns at most one backend
///
/// The backend is stopped and dropped before a replacement is created, so
/// a printer never has two backends subscribed at once.
pub struct AmsManager {
    client: Option<Arc<dyn MoonrakerClient>>,
    config: AmsConfig,
    backend: Option<Box<dyn AmsBackend>>,
    event_callback: Option<EventCallback>,
}

impl AmsManager {
    pub fn new(client: Option<Arc<dyn MoonrakerClient>>, config: AmsConfig) -> Self {
        Self {
            client,
            config,
            backend: None,
            event_callback: None,
        }
    }

    /// Backend factory
    pub fn create_backend(
        ams_type: AmsType,
        client: Option<Arc<dyn MoonrakerClient>>,
        config: &AmsConfig,
    ) -> AmsResult<Box<dyn AmsBackend>> {
        match ams_type {
            AmsType::HappyHare => Ok(Box::new(HappyHareBackend::new(
                client,
                config.happy_hare.clone(),
            ))),
            AmsType::ToolChanger => Ok(Box::new(ToolChangerBackend::new(client))),
            AmsType::Afc | AmsType::ValgAce => Err(AmsError::not_supported(format!(
                "{} backend",
                ams_type
            ))),
            AmsType::None => Err(AmsError::NoAmsDetected),
        }
    }

    pub fn config(&self) -> &AmsConfig {
        &self.config
    }

    /// Detect, construct and start the backend for `discovery`.
    ///
    /// Any existing backend is torn down first. On failure no backend is
    /// kept.
    pub fn init_from_hardware(&mut self, discovery: &HardwareDiscovery) -> AmsResult<AmsType> {
        self.teardown();

        let ams_type = self.config.backend.unwrap_or_else(|| discovery.primary());
        if ams_type == AmsType::None {
            info!("No AMS hardware detected");
            return Err(AmsError::NoAmsDetected);
        }
        if self.config.backend.is_some() {
            info!(backend = %ams_type, "Using configured backend");
        }

        let backend = Self::create_backend(ams_type, self.client.clone(), &self.config)
            .map_err(|e| {
                warn!(backend = %ams_type, error = %e, "Cannot create backend");
                e
            })?;
        backend.set_discovered_tools(discovery.tool_names.clone());
        backend.set_event_callback(self.event_callback.clone());

        if let Err(e) = backend.start() {
            error!(backend = %ams_type, error = %e, "Backend failed to start");
            return Err(e);
        }

        info!(backend = %ams_type, "AMS backend active");
        self.backend = Some(backend);
        Ok(ams_type)
    }

    /// Swap the printer connection; the current backend is torn down and
    /// detection must be run again
    pub fn set_client(&mut self, client: Option<Arc<dyn MoonrakerClient>>) {
        self.teardown();
        self.client = client;
        info!("Printer client replaced");
    }

    /// Active backend, if any
    pub fn backend(&self) -> Option<&dyn AmsBackend> {
        self.backend.as_deref()
    }

    pub fn active_type(&self) -> AmsType {
        self.backend.as_ref().map_or(AmsType::None, |b| b.get_type())
    }

    /// Observer for the current and every future backend
    pub fn set_event_callback(&mut self, callback: Option<EventCallback>) {
        if let Some(backend) = &self.backend {
            backend.set_event_callback(callback.clone());
        }
        self.event_callback = callback;
    }

    /// Stop and drop the backend
    pub fn shutdown(&mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if let Some(backend) = self.backend.take() {
            info!(backend = %backend.get_type(), "Stopping AMS backend");
            backend.stop();
        }
    }
}

impl Drop for AmsManager {
    fn drop(&mut self) {
        self.teardown();
    }
}
