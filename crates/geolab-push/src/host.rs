//! Host platform seams
//!
//! The browser (or whatever runs the site) is reached only through these
//! traits. Page-side helpers use [`NotificationPlatform`] and
//! [`WorkerPlatform`]; the background worker runtime uses [`WorkerScope`].
//!
//! All hosts are single-threaded: futures returned here are not `Send`.

#![allow(async_fn_in_trait)]

use crate::error::PushError;
use crate::payload::NotificationPayload;
use crate::permission::PermissionState;
use serde::{Deserialize, Serialize};
use url::Url;

/// Handle to an installed background worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationHandle {
    pub scope: String,
    pub script_url: String,
}

/// Encryption material issued by the push service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// An active push subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    pub endpoint: String,
    pub expiration_time: Option<u64>,
    pub keys: SubscriptionKeys,
    /// Scope of the owning registration, not part of the wire shape
    #[serde(skip)]
    pub scope: String,
}

impl PushSubscription {
    /// JSON shape sent to the push backend
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Options passed to the push service when subscribing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Every push must surface a visible notification
    pub user_visible_only: bool,
    /// Raw uncompressed P-256 public key of the application server
    pub application_server_key: Vec<u8>,
}

/// Identifier of a displayed notification
pub type NotificationId = u64;

/// A notification as displayed by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayedNotification {
    pub id: NotificationId,
    pub payload: NotificationPayload,
}

/// Identifier of a page context controlled by the worker
pub type ClientId = String;

/// An open window client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowClient {
    pub id: ClientId,
    pub url: Url,
    pub focused: bool,
}

/// Notification API as seen from a page
pub trait NotificationPlatform {
    fn supports_notifications(&self) -> bool;

    fn notification_permission(&self) -> PermissionState;

    /// Show the consent prompt and return the user's choice
    async fn prompt_notification_permission(&self) -> Result<PermissionState, PushError>;

    /// Display a notification immediately
    async fn show_local_notification(&self, payload: &NotificationPayload) -> Result<NotificationId, PushError>;
}

/// Worker container and push manager as seen from a page
pub trait WorkerPlatform {
    fn supports_service_worker(&self) -> bool;

    fn supports_push(&self) -> bool;

    /// Install (or update) the worker script at `scope`
    async fn register_worker(&self, script_url: &str, scope: &str) -> Result<RegistrationHandle, PushError>;

    /// Existing registration for `scope`, if any
    async fn registration(&self, scope: &str) -> Result<Option<RegistrationHandle>, PushError>;

    async fn subscription(&self, registration: &RegistrationHandle) -> Result<Option<PushSubscription>, PushError>;

    async fn subscribe(
        &self,
        registration: &RegistrationHandle,
        options: &SubscribeOptions,
    ) -> Result<PushSubscription, PushError>;

    /// Invalidate with the push service; `false` if it was already gone
    async fn unsubscribe(&self, subscription: &PushSubscription) -> Result<bool, PushError>;
}

/// Global scope of the running background worker
pub trait WorkerScope {
    /// Activate without waiting for older workers' clients to close
    async fn skip_waiting(&self) -> Result<(), PushError>;

    async fn cache_names(&self) -> Result<Vec<String>, PushError>;

    async fn delete_cache(&self, name: &str) -> Result<bool, PushError>;

    /// Take control of every open page context without a reload
    async fn claim_clients(&self) -> Result<(), PushError>;

    async fn show_notification(&self, payload: &NotificationPayload) -> Result<NotificationId, PushError>;

    fn close_notification(&self, id: NotificationId);

    /// Displayed notifications carrying `tag`
    async fn notifications_with_tag(&self, tag: &str) -> Result<Vec<NotificationId>, PushError>;

    /// Whether showing a notification replaces one with the same tag
    fn supports_tag_replacement(&self) -> bool {
        true
    }

    async fn window_clients(&self) -> Result<Vec<WindowClient>, PushError>;

    async fn focus_client(&self, id: &ClientId) -> Result<(), PushError>;

    async fn open_window(&self, url: &Url) -> Result<ClientId, PushError>;
}

// Borrowed hosts, so one browser can back both a page client and a worker runtime

impl<T: NotificationPlatform + ?Sized> NotificationPlatform for &T {
    fn supports_notifications(&self) -> bool {
        (**self).supports_notifications()
    }

    fn notification_permission(&self) -> PermissionState {
        (**self).notification_permission()
    }

    async fn prompt_notification_permission(&self) -> Result<PermissionState, PushError> {
        (**self).prompt_notification_permission().await
    }

    async fn show_local_notification(&self, payload: &NotificationPayload) -> Result<NotificationId, PushError> {
        (**self).show_local_notification(payload).await
    }
}

impl<T: WorkerPlatform + ?Sized> WorkerPlatform for &T {
    fn supports_service_worker(&self) -> bool {
        (**self).supports_service_worker()
    }

    fn supports_push(&self) -> bool {
        (**self).supports_push()
    }

    async fn register_worker(&self, script_url: &str, scope: &str) -> Result<RegistrationHandle, PushError> {
        (**self).register_worker(script_url, scope).await
    }

    async fn registration(&self, scope: &str) -> Result<Option<RegistrationHandle>, PushError> {
        (**self).registration(scope).await
    }

    async fn subscription(&self, registration: &RegistrationHandle) -> Result<Option<PushSubscription>, PushError> {
        (**self).subscription(registration).await
    }

    async fn subscribe(
        &self,
        registration: &RegistrationHandle,
        options: &SubscribeOptions,
    ) -> Result<PushSubscription, PushError> {
        (**self).subscribe(registration, options).await
    }

    async fn unsubscribe(&self, subscription: &PushSubscription) -> Result<bool, PushError> {
        (**self).unsubscribe(subscription).await
    }
}

impl<T: WorkerScope + ?Sized> WorkerScope for &T {
    async fn skip_waiting(&self) -> Result<(), PushError> {
        (**self).skip_waiting().await
    }

    async fn cache_names(&self) -> Result<Vec<String>, PushError> {
        (**self).cache_names().await
    }

    async fn delete_cache(&self, name: &str) -> Result<bool, PushError> {
        (**self).delete_cache(name).await
    }

    async fn claim_clients(&self) -> Result<(), PushError> {
        (**self).claim_clients().await
    }

    async fn show_notification(&self, payload: &NotificationPayload) -> Result<NotificationId, PushError> {
        (**self).show_notification(payload).await
    }

    fn close_notification(&self, id: NotificationId) {
        (**self).close_notification(id)
    }

    async fn notifications_with_tag(&self, tag: &str) -> Result<Vec<NotificationId>, PushError> {
        (**self).notifications_with_tag(tag).await
    }

    fn supports_tag_replacement(&self) -> bool {
        (**self).supports_tag_replacement()
    }

    async fn window_clients(&self) -> Result<Vec<WindowClient>, PushError> {
        (**self).window_clients().await
    }

    async fn focus_client(&self, id: &ClientId) -> Result<(), PushError> {
        (**self).focus_client(id).await
    }

    async fn open_window(&self, url: &Url) -> Result<ClientId, PushError> {
        (**self).open_window(url).await
    }
}
