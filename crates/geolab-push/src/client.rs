//! Page-side push client
//!
//! Ties the permission gate, registrar, subscription manager and local
//! emitter together for UI code that only wants "turn notifications on".

use crate::config::WorkerConfig;
use crate::emitter::LocalNotifier;
use crate::host::{NotificationId, NotificationPlatform, PushSubscription, RegistrationHandle, WorkerPlatform};
use crate::payload::NotificationOverrides;
use crate::permission::{PermissionGate, PermissionState};
use crate::registrar::WorkerRegistrar;
use crate::subscription::SubscriptionManager;

/// Push helpers bound to one platform and configuration
#[derive(Debug)]
pub struct PushClient<P> {
    platform: P,
    config: WorkerConfig,
}

impl<P> PushClient<P>
where
    P: NotificationPlatform + WorkerPlatform,
{
    pub fn new(platform: P, config: WorkerConfig) -> Self {
        Self { platform, config }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn permission(&self) -> PermissionState {
        PermissionGate::new(&self.platform).get_permission()
    }

    pub async fn request_permission(&self) -> PermissionState {
        PermissionGate::new(&self.platform).request_permission().await
    }

    pub async fn register(&self) -> Option<RegistrationHandle> {
        WorkerRegistrar::new(&self.platform, &self.config).register().await
    }

    pub async fn subscribe(&self) -> Option<PushSubscription> {
        self.subscriptions().subscribe().await
    }

    pub async fn unsubscribe(&self) -> bool {
        self.subscriptions().unsubscribe().await
    }

    pub async fn current_subscription(&self) -> Option<PushSubscription> {
        self.subscriptions().current().await
    }

    pub async fn show_now(&self, title: &str, options: NotificationOverrides) -> Option<NotificationId> {
        LocalNotifier::new(&self.platform, &self.config.defaults)
            .show_now(title, options)
            .await
    }

    /// Permission → registration → subscription. `None` if any step declines.
    pub async fn enable(&self) -> Option<PushSubscription> {
        let permission = self.request_permission().await;
        if !permission.is_granted() {
            tracing::info!("push not enabled, permission is {}", permission);
            return None;
        }
        self.register().await?;
        self.subscribe().await
    }

    fn subscriptions(&self) -> SubscriptionManager<'_, P> {
        SubscriptionManager::new(&self.platform, &self.config)
    }
}
