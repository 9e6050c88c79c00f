//! Background worker registration

use crate::config::WorkerConfig;
use crate::host::{RegistrationHandle, WorkerPlatform};

/// Installs the background worker at the configured scope
pub struct WorkerRegistrar<'a, P> {
    platform: &'a P,
    config: &'a WorkerConfig,
}

impl<'a, P: WorkerPlatform> WorkerRegistrar<'a, P> {
    pub fn new(platform: &'a P, config: &'a WorkerConfig) -> Self {
        Self { platform, config }
    }

    /// Register the worker, reusing an existing registration for the same
    /// script and scope. `None` when unsupported or on failure.
    pub async fn register(&self) -> Option<RegistrationHandle> {
        if !self.platform.supports_service_worker() {
            tracing::warn!("service workers are not supported on this platform");
            return None;
        }

        if let Some(existing) = self.registration().await {
            if existing.script_url == self.config.script_url {
                tracing::debug!("worker already registered at {}", existing.scope);
                return Some(existing);
            }
            tracing::info!(
                "updating worker at {} from {} to {}",
                existing.scope,
                existing.script_url,
                self.config.script_url
            );
        }

        match self
            .platform
            .register_worker(&self.config.script_url, &self.config.scope)
            .await
        {
            Ok(handle) => {
                tracing::info!("worker registered with scope {}", handle.scope);
                Some(handle)
            }
            Err(err) => {
                tracing::warn!("worker registration failed: {}", err);
                None
            }
        }
    }

    /// Existing registration for the configured scope, never installs
    pub async fn registration(&self) -> Option<RegistrationHandle> {
        if !self.platform.supports_service_worker() {
            return None;
        }
        match self.platform.registration(&self.config.scope).await {
            Ok(handle) => handle,
            Err(err) => {
                tracing::warn!("registration lookup failed: {}", err);
                None
            }
        }
    }
}
