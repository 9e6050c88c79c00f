//! Push subscription management
//!
//! At most one subscription exists per registration. `subscribe` is a
//! check-then-act: an existing subscription is returned unchanged, so
//! repeated calls never create a second one.

use crate::config::WorkerConfig;
use crate::error::PushError;
use crate::host::{PushSubscription, RegistrationHandle, SubscribeOptions, WorkerPlatform};
use crate::registrar::WorkerRegistrar;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Length of an uncompressed P-256 public key
const SERVER_KEY_LEN: usize = 65;

/// Decode the URL-safe base64 application server key into raw bytes.
///
/// Accepts padded or unpadded input and the standard alphabet's `+`/`/`.
pub fn decode_application_server_key(key: &str) -> Result<Vec<u8>, PushError> {
    let normalized: String = key
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();

    let bytes = URL_SAFE_NO_PAD
        .decode(normalized.as_bytes())
        .map_err(|e| PushError::InvalidServerKey(e.to_string()))?;

    if bytes.len() != SERVER_KEY_LEN || bytes[0] != 0x04 {
        return Err(PushError::InvalidServerKey(format!(
            "expected {} byte uncompressed point, got {} bytes",
            SERVER_KEY_LEN,
            bytes.len()
        )));
    }
    Ok(bytes)
}

/// Establishes and tears down the push subscription
pub struct SubscriptionManager<'a, P> {
    platform: &'a P,
    config: &'a WorkerConfig,
}

impl<'a, P: WorkerPlatform> SubscriptionManager<'a, P> {
    pub fn new(platform: &'a P, config: &'a WorkerConfig) -> Self {
        Self { platform, config }
    }

    fn supported(&self) -> bool {
        self.platform.supports_service_worker() && self.platform.supports_push()
    }

    /// Subscribe, or return the subscription that already exists
    pub async fn subscribe(&self) -> Option<PushSubscription> {
        if !self.supported() {
            tracing::warn!("push messaging is not supported on this platform");
            return None;
        }

        let registration = WorkerRegistrar::new(self.platform, self.config).register().await?;
        match self.subscribe_with(&registration).await {
            Ok(subscription) => Some(subscription),
            Err(err) => {
                tracing::warn!("push subscription failed: {}", err);
                None
            }
        }
    }

    async fn subscribe_with(&self, registration: &RegistrationHandle) -> Result<PushSubscription, PushError> {
        if let Some(existing) = self.platform.subscription(registration).await? {
            tracing::debug!("reusing push subscription {}", existing.endpoint);
            return Ok(existing);
        }

        let options = SubscribeOptions {
            user_visible_only: true,
            application_server_key: decode_application_server_key(&self.config.application_server_key)?,
        };
        let subscription = self
            .platform
            .subscribe(registration, &options)
            .await
            .map_err(|e| match e {
                PushError::Platform(msg) => PushError::SubscriptionFailure(msg),
                other => other,
            })?;

        tracing::info!("subscribed to push at {}", subscription.endpoint);
        Ok(subscription)
    }

    /// Current subscription without creating one
    pub async fn current(&self) -> Option<PushSubscription> {
        if !self.supported() {
            return None;
        }
        let registration = WorkerRegistrar::new(self.platform, self.config).registration().await?;
        match self.platform.subscription(&registration).await {
            Ok(subscription) => subscription,
            Err(err) => {
                tracing::warn!("subscription lookup failed: {}", err);
                None
            }
        }
    }

    /// Unsubscribe; `false` when there was nothing to remove or on failure
    pub async fn unsubscribe(&self) -> bool {
        let Some(subscription) = self.current().await else {
            tracing::debug!("no push subscription to remove");
            return false;
        };

        match self.platform.unsubscribe(&subscription).await {
            Ok(removed) => {
                if removed {
                    tracing::info!("unsubscribed from push at {}", subscription.endpoint);
                }
                removed
            }
            Err(err) => {
                tracing::warn!("push unsubscribe failed: {}", err);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::APPLICATION_SERVER_KEY;
    use crate::memory::{HostOperation, MemoryBrowser};
    use crate::permission::PermissionState;

    fn granted() -> MemoryBrowser {
        let browser = MemoryBrowser::new();
        browser.set_permission(PermissionState::Granted);
        browser
    }

    #[test]
    fn test_decode_server_key() {
        let key = decode_application_server_key(APPLICATION_SERVER_KEY).unwrap();
        assert_eq!(key.len(), 65);
        assert_eq!(key[0], 0x04);

        let padded = format!("{}=", APPLICATION_SERVER_KEY);
        assert_eq!(decode_application_server_key(&padded).unwrap(), key);
    }

    #[test]
    fn test_decode_server_key_rejects_garbage() {
        assert!(matches!(
            decode_application_server_key("not a key!"),
            Err(PushError::InvalidServerKey(_))
        ));
        assert!(matches!(
            decode_application_server_key("BAAA"),
            Err(PushError::InvalidServerKey(_))
        ));
    }

    #[test]
    fn test_subscribe_twice_same_endpoint() {
        let browser = granted();
        let config = WorkerConfig::new("1.0.0");
        let manager = SubscriptionManager::new(&browser, &config);

        let first = smol::block_on(manager.subscribe()).unwrap();
        let second = smol::block_on(manager.subscribe()).unwrap();

        assert_eq!(first.endpoint, second.endpoint);
        assert_eq!(browser.stats().subscribes, 1);
    }

    #[test]
    fn test_unsubscribe_without_subscription() {
        let browser = granted();
        let config = WorkerConfig::new("1.0.0");
        let manager = SubscriptionManager::new(&browser, &config);

        assert!(!smol::block_on(manager.unsubscribe()));
        assert_eq!(browser.stats().unsubscribes, 0);
        assert_eq!(browser.stats().registrations, 0);
    }

    #[test]
    fn test_unsubscribe_removes() {
        let browser = granted();
        let config = WorkerConfig::new("1.0.0");
        let manager = SubscriptionManager::new(&browser, &config);

        smol::block_on(manager.subscribe()).unwrap();
        assert!(smol::block_on(manager.unsubscribe()));
        assert!(smol::block_on(manager.current()).is_none());
        assert!(!smol::block_on(manager.unsubscribe()));
    }

    #[test]
    fn test_failures_are_soft() {
        let browser = granted();
        let config = WorkerConfig::new("1.0.0");
        let manager = SubscriptionManager::new(&browser, &config);

        browser.fail(HostOperation::Subscribe);
        assert!(smol::block_on(manager.subscribe()).is_none());

        browser.recover(HostOperation::Subscribe);
        smol::block_on(manager.subscribe()).unwrap();

        browser.fail(HostOperation::Unsubscribe);
        assert!(!smol::block_on(manager.unsubscribe()));
    }

    #[test]
    fn test_lookup_failure_skips_subscribe() {
        let browser = granted();
        let config = WorkerConfig::new("1.0.0");
        let manager = SubscriptionManager::new(&browser, &config);

        browser.fail(HostOperation::Subscription);
        assert!(smol::block_on(manager.subscribe()).is_none());
        assert!(smol::block_on(manager.current()).is_none());
        assert!(!smol::block_on(manager.unsubscribe()));

        let stats = browser.stats();
        assert_eq!(stats.subscribes, 0);
        assert_eq!(stats.unsubscribes, 0);
    }

    #[test]
    fn test_denied_permission_is_soft() {
        let browser = MemoryBrowser::new();
        browser.set_permission(PermissionState::Denied);
        let config = WorkerConfig::new("1.0.0");
        let manager = SubscriptionManager::new(&browser, &config);

        assert!(smol::block_on(manager.subscribe()).is_none());
    }

    #[test]
    fn test_invalidated_subscription_is_recreated() {
        let browser = granted();
        let config = WorkerConfig::new("1.0.0");
        let manager = SubscriptionManager::new(&browser, &config);

        let first = smol::block_on(manager.subscribe()).unwrap();
        browser.invalidate_subscriptions();
        let second = smol::block_on(manager.subscribe()).unwrap();

        assert_ne!(first.endpoint, second.endpoint);
    }

    #[test]
    fn test_no_push_support() {
        let browser = granted();
        browser.set_push_supported(false);
        let config = WorkerConfig::new("1.0.0");
        let manager = SubscriptionManager::new(&browser, &config);

        assert!(smol::block_on(manager.subscribe()).is_none());
        assert!(!smol::block_on(manager.unsubscribe()));
        assert_eq!(browser.stats().registrations, 0);
    }

    #[test]
    fn test_subscription_json_shape() {
        let browser = granted();
        let config = WorkerConfig::new("1.0.0");
        let manager = SubscriptionManager::new(&browser, &config);

        let subscription = smol::block_on(manager.subscribe()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&subscription.to_json()).unwrap();

        assert_eq!(json["endpoint"], subscription.endpoint.as_str());
        assert!(json["expirationTime"].is_null());
        assert!(json["keys"]["p256dh"].is_string());
        assert!(json["keys"]["auth"].is_string());
        assert!(json.get("scope").is_none());
    }
}
