//! Notification payloads
//!
//! A push message carries an optional JSON object whose recognised keys
//! (`title`, `body`, `icon`, `badge`, `tag`, `data.url`) override the
//! configured defaults one level deep. Recognised keys holding something
//! other than a string are ignored. Anything that is not a JSON object is
//! shown as plain text in the body.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Action id for the "open" button (same behaviour as clicking the body)
pub const ACTION_OPEN: &str = "open";
/// Action id for the "close" button (dismiss only)
pub const ACTION_CLOSE: &str = "close";

/// Data attached to a notification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    /// Deep link opened or focused on click
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl NotificationData {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self { url: Some(url.into()) }
    }
}

/// Notification action button
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationButton {
    pub action: String,
    pub title: String,
}

impl NotificationButton {
    pub fn new(action: &str, title: &str) -> Self {
        Self {
            action: action.to_string(),
            title: title.to_string(),
        }
    }
}

/// A fully resolved notification, ready to hand to the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    #[serde(default)]
    pub data: NotificationData,
    #[serde(default)]
    pub actions: Vec<NotificationButton>,
}

impl Default for NotificationPayload {
    fn default() -> Self {
        Self {
            title: "مختبر الابتكار الجغرافي".to_string(),
            body: "لديك إشعار جديد".to_string(),
            icon: "/icons/icon-192x192.png".to_string(),
            badge: "/icons/badge-72x72.png".to_string(),
            tag: "geolab-notification".to_string(),
            data: NotificationData::with_url("/"),
            actions: vec![
                NotificationButton::new(ACTION_OPEN, "فتح"),
                NotificationButton::new(ACTION_CLOSE, "إغلاق"),
            ],
        }
    }
}

impl NotificationPayload {
    /// Resolve the payload of a push event against `defaults`.
    ///
    /// * no data (or an empty body) yields the defaults unchanged
    /// * a JSON object is shallow-merged over the defaults
    /// * anything else becomes the body, every other field defaulted
    pub fn from_push_data(data: Option<&[u8]>, defaults: &NotificationPayload) -> Self {
        let raw = match data {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => return defaults.clone(),
        };

        match serde_json::from_slice::<Value>(raw) {
            Ok(Value::Object(fields)) => NotificationOverrides::from_fields(&fields).apply_to(defaults),
            Ok(_) => {
                tracing::debug!("push payload is JSON but not an object, using text body");
                Self::text(raw, defaults)
            }
            Err(err) => {
                tracing::debug!("push payload is not JSON ({}), using text body", err);
                Self::text(raw, defaults)
            }
        }
    }

    fn text(raw: &[u8], defaults: &NotificationPayload) -> Self {
        NotificationOverrides {
            body: Some(String::from_utf8_lossy(raw).into_owned()),
            ..Default::default()
        }
        .apply_to(defaults)
    }

    /// Deep link for clicks, `/` when none was provided
    pub fn target_url(&self) -> &str {
        self.data.url.as_deref().unwrap_or("/")
    }
}

/// Caller- or sender-provided fields. `None` keeps the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationOverrides {
    pub title: Option<String>,
    pub body: Option<String>,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub tag: Option<String>,
    /// Replaces the default data as a whole (shallow merge)
    pub data: Option<NotificationData>,
}

impl NotificationOverrides {
    /// Pick the recognised keys out of a decoded push object
    fn from_fields(fields: &Map<String, Value>) -> Self {
        let text = |key: &str| match fields.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                tracing::debug!("ignoring push field '{}': expected a string, got {}", key, other);
                None
            }
        };

        let data = match fields.get("data") {
            None | Some(Value::Null) => None,
            Some(Value::Object(data)) => Some(NotificationData {
                url: data.get("url").and_then(Value::as_str).map(String::from),
            }),
            Some(other) => {
                tracing::debug!("ignoring push field 'data': expected an object, got {}", other);
                None
            }
        };

        Self {
            title: text("title"),
            body: text("body"),
            icon: text("icon"),
            badge: text("badge"),
            tag: text("tag"),
            data,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn badge(mut self, badge: impl Into<String>) -> Self {
        self.badge = Some(badge.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.data = Some(NotificationData::with_url(url));
        self
    }

    /// Merge over `defaults`, provided fields winning
    pub fn apply_to(self, defaults: &NotificationPayload) -> NotificationPayload {
        NotificationPayload {
            title: self.title.unwrap_or_else(|| defaults.title.clone()),
            body: self.body.unwrap_or_else(|| defaults.body.clone()),
            icon: self.icon.unwrap_or_else(|| defaults.icon.clone()),
            badge: self.badge.unwrap_or_else(|| defaults.badge.clone()),
            tag: self.tag.unwrap_or_else(|| defaults.tag.clone()),
            data: self.data.unwrap_or_else(|| defaults.data.clone()),
            actions: defaults.actions.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_and_body_override() {
        let defaults = NotificationPayload::default();
        let n = NotificationPayload::from_push_data(Some(br#"{"title":"T","body":"B"}"#), &defaults);

        assert_eq!(n.title, "T");
        assert_eq!(n.body, "B");
        assert_eq!(n.icon, defaults.icon);
        assert_eq!(n.badge, defaults.badge);
        assert_eq!(n.tag, defaults.tag);
        assert_eq!(n.data, defaults.data);
        assert_eq!(n.actions, defaults.actions);
    }

    #[test]
    fn test_text_fallback() {
        let defaults = NotificationPayload::default();
        let n = NotificationPayload::from_push_data(Some(b"hello"), &defaults);

        assert_eq!(n.body, "hello");
        assert_eq!(n.title, defaults.title);
        assert_eq!(n.tag, defaults.tag);
    }

    #[test]
    fn test_non_object_json_is_text() {
        let defaults = NotificationPayload::default();
        let n = NotificationPayload::from_push_data(Some(b"42"), &defaults);
        assert_eq!(n.body, "42");
        assert_eq!(n.title, defaults.title);
    }

    #[test]
    fn test_mistyped_field_keeps_the_rest() {
        let defaults = NotificationPayload::default();
        let n = NotificationPayload::from_push_data(
            Some(br#"{"title":"Meeting","body":"Room 4","icon":5,"data":"x"}"#),
            &defaults,
        );

        assert_eq!(n.title, "Meeting");
        assert_eq!(n.body, "Room 4");
        assert_eq!(n.icon, defaults.icon);
        assert_eq!(n.data, defaults.data);
    }

    #[test]
    fn test_missing_or_empty_data() {
        let defaults = NotificationPayload::default();
        assert_eq!(NotificationPayload::from_push_data(None, &defaults), defaults);
        assert_eq!(NotificationPayload::from_push_data(Some(b""), &defaults), defaults);
    }

    #[test]
    fn test_data_is_replaced_whole() {
        let defaults = NotificationPayload::default();
        let n = NotificationPayload::from_push_data(Some(br#"{"data":{}}"#), &defaults);
        assert_eq!(n.data.url, None);
        assert_eq!(n.target_url(), "/");

        let n = NotificationPayload::from_push_data(
            Some(br#"{"data":{"url":"/projects/42"},"extra":true}"#),
            &defaults,
        );
        assert_eq!(n.target_url(), "/projects/42");
    }

    #[test]
    fn test_null_fields_keep_defaults() {
        let defaults = NotificationPayload::default();
        let n = NotificationPayload::from_push_data(Some(br#"{"title":null,"tag":"news"}"#), &defaults);
        assert_eq!(n.title, defaults.title);
        assert_eq!(n.tag, "news");
    }

    #[test]
    fn test_builder_overrides() {
        let defaults = NotificationPayload::default();
        let n = NotificationOverrides::default()
            .title("Workshop")
            .icon("/icons/event.png")
            .url("/events")
            .apply_to(&defaults);

        assert_eq!(n.title, "Workshop");
        assert_eq!(n.icon, "/icons/event.png");
        assert_eq!(n.badge, defaults.badge);
        assert_eq!(n.target_url(), "/events");
    }
}
