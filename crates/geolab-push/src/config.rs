//! Worker configuration
//!
//! Everything the worker and the page-side helpers need to agree on is
//! fixed at build/deploy time and carried in one immutable [`WorkerConfig`].

use crate::error::ConfigError;
use crate::payload::NotificationPayload;
use serde::Deserialize;
use url::Url;

/// Worker version embedded at build time
pub const SW_VERSION: &str = match option_env!("GEOLAB_SW_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

/// VAPID public key of the push backend (uncompressed P-256, URL-safe base64)
pub const APPLICATION_SERVER_KEY: &str =
    "BBz2GSqmwkMD-PKbsLQ2w8qOsluF6PkWEPhZBaDwWwQruA2HwNH79Z9IYc5KwF6boIxBkXE3wWIkT1ctctcm8kQ";

pub const DEFAULT_SCRIPT_URL: &str = "/sw.js";
pub const DEFAULT_SCOPE: &str = "/";
pub const DEFAULT_SYNC_TAG: &str = "sync-notifications";
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";

/// Cache generation name for a worker version
pub fn cache_name_for(version: &str) -> String {
    format!("geolab-{}", version)
}

/// Immutable worker configuration
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    pub version: String,
    pub cache_name: String,
    pub script_url: String,
    pub scope: String,
    pub origin: Url,
    pub application_server_key: String,
    pub sync_tag: String,
    pub defaults: NotificationPayload,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::new(SW_VERSION)
    }
}

impl WorkerConfig {
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            cache_name: cache_name_for(version),
            script_url: DEFAULT_SCRIPT_URL.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            origin: Url::parse(DEFAULT_ORIGIN).expect("default origin is a valid URL"),
            application_server_key: APPLICATION_SERVER_KEY.to_string(),
            sync_tag: DEFAULT_SYNC_TAG.to_string(),
            defaults: NotificationPayload::default(),
        }
    }

    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = scope.to_string();
        self
    }

    pub fn with_defaults(mut self, defaults: NotificationPayload) -> Self {
        self.defaults = defaults;
        self
    }

    /// Load from JSON. Missing fields take their defaults; a missing
    /// `cache_name` is derived from the (possibly overridden) version.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_str(json)?;
        let base = Self::new(file.version.as_deref().unwrap_or(SW_VERSION));

        let origin = match file.origin {
            Some(origin) => {
                if origin.cannot_be_a_base() {
                    return Err(ConfigError::Invalid(format!("origin {} cannot be a base URL", origin)));
                }
                origin
            }
            None => base.origin.clone(),
        };

        let scope = file.scope.unwrap_or(base.scope);
        if !scope.starts_with('/') {
            return Err(ConfigError::Invalid(format!("scope must be an absolute path, got {:?}", scope)));
        }

        Ok(Self {
            cache_name: file.cache_name.unwrap_or(base.cache_name),
            script_url: file.script_url.unwrap_or(base.script_url),
            scope,
            origin,
            application_server_key: file.application_server_key.unwrap_or(base.application_server_key),
            sync_tag: file.sync_tag.unwrap_or(base.sync_tag),
            defaults: file.defaults.unwrap_or(base.defaults),
            version: base.version,
        })
    }

    /// Resolve a deep link against the site origin
    pub fn resolve_url(&self, link: &str) -> Option<Url> {
        self.origin.join(link).ok()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    version: Option<String>,
    cache_name: Option<String>,
    script_url: Option<String>,
    scope: Option<String>,
    origin: Option<Url>,
    application_server_key: Option<String>,
    sync_tag: Option<String>,
    defaults: Option<NotificationPayload>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_name_follows_version() {
        let config = WorkerConfig::new("2.1.0");
        assert_eq!(config.cache_name, "geolab-2.1.0");
        assert_eq!(config.script_url, "/sw.js");
        assert_eq!(config.scope, "/");
    }

    #[test]
    fn test_from_json_partial() {
        let config = WorkerConfig::from_json(
            r#"{"version": "3", "origin": "https://geolab.example", "sync_tag": "retry"}"#,
        )
        .unwrap();

        assert_eq!(config.version, "3");
        assert_eq!(config.cache_name, "geolab-3");
        assert_eq!(config.origin.as_str(), "https://geolab.example/");
        assert_eq!(config.sync_tag, "retry");
        assert_eq!(config.defaults, NotificationPayload::default());
    }

    #[test]
    fn test_from_json_rejects_bad_input() {
        assert!(WorkerConfig::from_json("{").is_err());
        assert!(WorkerConfig::from_json(r#"{"scope": "app/"}"#).is_err());
        assert!(WorkerConfig::from_json(r#"{"unknown": 1}"#).is_err());
        assert!(WorkerConfig::from_json(r#"{"origin": "mailto:lab@example.com"}"#).is_err());
    }

    #[test]
    fn test_resolve_url() {
        let config = WorkerConfig::new("1").with_origin(Url::parse("https://geolab.example").unwrap());
        assert_eq!(
            config.resolve_url("/projects?id=4").unwrap().as_str(),
            "https://geolab.example/projects?id=4"
        );
        assert_eq!(
            config.resolve_url("https://maps.example/x").unwrap().as_str(),
            "https://maps.example/x"
        );
    }
}
