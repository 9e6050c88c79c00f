//! Push lifecycle errors

/// Failures reported by the host platform or by the lifecycle helpers.
///
/// None of these escape the page-side helpers or the worker handlers; they
/// are logged and downgraded to `None`/`false` results at those seams.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PushError {
    #[error("platform does not support {0}")]
    UnsupportedPlatform(&'static str),

    #[error("notification permission denied")]
    PermissionDenied,

    #[error("subscription failure: {0}")]
    SubscriptionFailure(String),

    #[error("invalid application server key: {0}")]
    InvalidServerKey(String),

    #[error("platform error: {0}")]
    Platform(String),
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
