//! GeoLab Push
//!
//! Browser push notification lifecycle for the GeoLab site.
//!
//! ## Components
//! - [`PermissionGate`]: read/request notification permission
//! - [`WorkerRegistrar`]: install the background worker
//! - [`SubscriptionManager`]: one push subscription per registration
//! - [`WorkerRuntime`]: the worker's install/activate/push/click/sync/message handlers
//! - [`LocalNotifier`]: immediate, permission-gated notifications
//!
//! The browser is reached through the traits in [`host`]; [`memory`]
//! provides an in-memory implementation.

pub mod client;
pub mod config;
pub mod emitter;
pub mod error;
pub mod host;
pub mod lifetime;
pub mod memory;
pub mod payload;
pub mod permission;
pub mod registrar;
pub mod runtime;
pub mod subscription;

pub use client::PushClient;
pub use config::{SW_VERSION, WorkerConfig};
pub use emitter::LocalNotifier;
pub use error::{ConfigError, PushError};
pub use host::{
    DisplayedNotification, NotificationPlatform, PushSubscription, RegistrationHandle, WindowClient,
    WorkerPlatform, WorkerScope,
};
pub use lifetime::ExtendLifetime;
pub use memory::MemoryBrowser;
pub use payload::{NotificationData, NotificationOverrides, NotificationPayload};
pub use permission::{PermissionGate, PermissionState};
pub use registrar::WorkerRegistrar;
pub use runtime::{
    ClickAction, NoopRetry, ReplyPort, SyncRetry, VersionReply, WorkerEvent, WorkerMessage, WorkerRuntime,
    WorkerState,
};
pub use subscription::{SubscriptionManager, decode_application_server_key};
