//! Local (non-push) notifications

use crate::host::{NotificationId, NotificationPlatform};
use crate::payload::{NotificationData, NotificationOverrides, NotificationPayload};

/// Shows notifications directly from a page
pub struct LocalNotifier<'a, P> {
    platform: &'a P,
    defaults: &'a NotificationPayload,
}

impl<'a, P: NotificationPlatform> LocalNotifier<'a, P> {
    /// `defaults` supplies the icon and badge
    pub fn new(platform: &'a P, defaults: &'a NotificationPayload) -> Self {
        Self { platform, defaults }
    }

    /// Display now. No-op with a warning when unsupported or not granted.
    pub async fn show_now(&self, title: &str, options: NotificationOverrides) -> Option<NotificationId> {
        if !self.platform.supports_notifications() {
            tracing::warn!("notifications are not supported on this platform");
            return None;
        }
        let permission = self.platform.notification_permission();
        if !permission.is_granted() {
            tracing::warn!("cannot show notification, permission is {}", permission);
            return None;
        }

        let base = NotificationPayload {
            title: title.to_string(),
            body: String::new(),
            icon: self.defaults.icon.clone(),
            badge: self.defaults.badge.clone(),
            tag: String::new(),
            data: NotificationData::default(),
            actions: Vec::new(),
        };
        let payload = NotificationOverrides {
            title: None,
            ..options
        }
        .apply_to(&base);

        match self.platform.show_local_notification(&payload).await {
            Ok(id) => Some(id),
            Err(err) => {
                tracing::warn!("showing notification failed: {}", err);
                None
            }
        }
    }
}
