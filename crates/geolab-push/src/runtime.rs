//! Background worker runtime
//!
//! Event-driven state machine run inside the installed worker. The host
//! delivers one [`WorkerEvent`] at a time; each event maps to exactly one
//! handler, and every handler registers its asynchronous work on the
//! [`ExtendLifetime`] token it is given so the host does not reclaim the
//! worker mid-flight.
//!
//! ## Lifecycle
//! 1. **install**: skip the waiting phase unconditionally
//! 2. **activate**: purge stale cache generations, claim open pages
//!
//! ## Events
//! - `push`: render a notification from the payload
//! - `notificationclick`: close, then focus or open the deep link
//! - `sync`: tag-dispatched retry hook
//! - `message`: `SKIP_WAITING` / `GET_VERSION`
//!
//! Failures inside handlers are logged and swallowed; nothing propagates
//! back into the host's event loop.

#![allow(async_fn_in_trait)]

use crate::config::WorkerConfig;
use crate::error::PushError;
use crate::host::{DisplayedNotification, WorkerScope};
use crate::lifetime::ExtendLifetime;
use crate::payload::{ACTION_CLOSE, ACTION_OPEN, NotificationPayload};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use url::Url;

/// Worker lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Installing,
    /// Installed; activation follows immediately because waiting is skipped
    Waiting,
    Active,
}

/// Action chosen on a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    /// Body click or the `open` button
    Open,
    /// Dismiss only
    Close,
    /// Unknown button, handled like `Open`
    Other(String),
}

impl ClickAction {
    pub fn parse(action: &str) -> Self {
        match action {
            "" | ACTION_OPEN => Self::Open,
            ACTION_CLOSE => Self::Close,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Message posted from a page to the worker
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerMessage {
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,
    #[serde(rename = "GET_VERSION")]
    GetVersion,
    #[serde(other)]
    Unknown,
}

impl WorkerMessage {
    /// Decode a raw message; anything unrecognised is `Unknown`
    pub fn from_json(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or(Self::Unknown)
    }
}

/// Reply to `GET_VERSION`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionReply {
    pub version: String,
}

/// Reply channel handed over with a message
#[derive(Debug, Clone)]
pub struct ReplyPort {
    sender: smol::channel::Sender<VersionReply>,
}

impl ReplyPort {
    /// A port and the receiving end the page listens on
    pub fn channel() -> (Self, smol::channel::Receiver<VersionReply>) {
        let (sender, receiver) = smol::channel::bounded(1);
        (Self { sender }, receiver)
    }

    /// Post the reply without waiting
    pub fn post(&self, reply: VersionReply) -> Result<(), PushError> {
        self.sender
            .try_send(reply)
            .map_err(|e| PushError::Platform(format!("reply port: {}", e)))
    }
}

/// Events delivered by the host
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Push { data: Option<Vec<u8>> },
    NotificationClick { notification: DisplayedNotification, action: String },
    Sync { tag: String },
    Message { message: WorkerMessage, reply: Option<ReplyPort> },
}

/// Work performed when the configured sync tag fires.
///
/// This is an extension point; the shipped [`NoopRetry`] does nothing.
pub trait SyncRetry {
    async fn retry(&self, tag: &str) -> Result<(), PushError>;
}

/// Default sync hook: logs and succeeds
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRetry;

impl SyncRetry for NoopRetry {
    async fn retry(&self, tag: &str) -> Result<(), PushError> {
        tracing::debug!("background sync '{}' has no retry work", tag);
        Ok(())
    }
}

/// The installed worker
#[derive(Debug)]
pub struct WorkerRuntime<S, R = NoopRetry> {
    config: WorkerConfig,
    scope: S,
    retry: R,
    state: Cell<WorkerState>,
}

impl<S: WorkerScope> WorkerRuntime<S> {
    pub fn new(config: WorkerConfig, scope: S) -> Self {
        Self::with_retry(config, scope, NoopRetry)
    }
}

impl<S: WorkerScope, R: SyncRetry> WorkerRuntime<S, R> {
    pub fn with_retry(config: WorkerConfig, scope: S, retry: R) -> Self {
        Self {
            config,
            scope,
            retry,
            state: Cell::new(WorkerState::Installing),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn scope(&self) -> &S {
        &self.scope
    }

    pub fn state(&self) -> WorkerState {
        self.state.get()
    }

    /// Run one event to completion, including all lifetime-extended work
    pub async fn dispatch(&self, event: WorkerEvent) {
        let mut lifetime = ExtendLifetime::new();
        self.handle(event, &mut lifetime);
        lifetime.settle().await;
    }

    /// Route an event to its handler
    pub fn handle<'a>(&'a self, event: WorkerEvent, lifetime: &mut ExtendLifetime<'a>) {
        match event {
            WorkerEvent::Install => self.on_install(lifetime),
            WorkerEvent::Activate => self.on_activate(lifetime),
            WorkerEvent::Push { data } => self.on_push(data, lifetime),
            WorkerEvent::NotificationClick { notification, action } => {
                self.on_notification_click(notification, &action, lifetime)
            }
            WorkerEvent::Sync { tag } => self.on_sync(&tag, lifetime),
            WorkerEvent::Message { message, reply } => self.on_message(message, reply, lifetime),
        }
    }

    pub fn on_install<'a>(&'a self, lifetime: &mut ExtendLifetime<'a>) {
        tracing::info!("installing worker {}", self.config.version);
        lifetime.wait_until(async move {
            if let Err(err) = self.scope.skip_waiting().await {
                tracing::warn!("skip waiting failed: {}", err);
            }
            self.state.set(WorkerState::Waiting);
        });
    }

    pub fn on_activate<'a>(&'a self, lifetime: &mut ExtendLifetime<'a>) {
        tracing::info!("activating worker {}", self.config.version);
        lifetime.wait_until(async move {
            self.purge_stale_caches().await;
            if let Err(err) = self.scope.claim_clients().await {
                tracing::warn!("claiming clients failed: {}", err);
            }
            self.state.set(WorkerState::Active);
        });
    }

    async fn purge_stale_caches(&self) {
        let names = match self.scope.cache_names().await {
            Ok(names) => names,
            Err(err) => {
                tracing::warn!("listing caches failed: {}", err);
                return;
            }
        };

        for name in names.iter().filter(|n| **n != self.config.cache_name) {
            match self.scope.delete_cache(name).await {
                Ok(true) => tracing::info!("deleted stale cache {}", name),
                Ok(false) => {}
                Err(err) => tracing::warn!("deleting cache {} failed: {}", name, err),
            }
        }
    }

    pub fn on_push<'a>(&'a self, data: Option<Vec<u8>>, lifetime: &mut ExtendLifetime<'a>) {
        let payload = NotificationPayload::from_push_data(data.as_deref(), &self.config.defaults);
        tracing::debug!("push received: {}", payload.title);
        lifetime.wait_until(async move {
            if let Err(err) = self.display(&payload).await {
                tracing::warn!("showing push notification failed: {}", err);
            }
        });
    }

    async fn display(&self, payload: &NotificationPayload) -> Result<(), PushError> {
        if !payload.tag.is_empty() && !self.scope.supports_tag_replacement() {
            match self.scope.notifications_with_tag(&payload.tag).await {
                Ok(ids) => ids.into_iter().for_each(|id| self.scope.close_notification(id)),
                Err(err) => tracing::warn!("looking up notifications tagged {} failed: {}", payload.tag, err),
            }
        }
        self.scope.show_notification(payload).await?;
        Ok(())
    }

    pub fn on_notification_click<'a>(
        &'a self,
        notification: DisplayedNotification,
        action: &str,
        lifetime: &mut ExtendLifetime<'a>,
    ) {
        self.scope.close_notification(notification.id);

        let action = ClickAction::parse(action);
        if action == ClickAction::Close {
            tracing::debug!("notification {} dismissed", notification.id);
            return;
        }

        let link = notification.payload.target_url().to_string();
        lifetime.wait_until(async move {
            if let Err(err) = self.focus_or_open(&link).await {
                tracing::warn!("routing notification click to {} failed: {}", link, err);
            }
        });
    }

    async fn focus_or_open(&self, link: &str) -> Result<(), PushError> {
        let target: Url = self.config.resolve_url(link).unwrap_or_else(|| {
            tracing::warn!("invalid notification link {:?}, using site root", link);
            self.config.origin.clone()
        });

        let clients = match self.scope.window_clients().await {
            Ok(clients) => clients,
            Err(err) => {
                tracing::warn!("listing window clients failed: {}", err);
                Vec::new()
            }
        };

        if let Some(client) = clients.iter().find(|c| c.url == target) {
            tracing::debug!("focusing {} at {}", client.id, target);
            return self.scope.focus_client(&client.id).await;
        }

        tracing::debug!("opening window at {}", target);
        self.scope.open_window(&target).await.map(|_| ())
    }

    pub fn on_sync<'a>(&'a self, tag: &str, lifetime: &mut ExtendLifetime<'a>) {
        if tag != self.config.sync_tag {
            tracing::debug!("ignoring sync tag '{}'", tag);
            return;
        }

        let tag = tag.to_string();
        lifetime.wait_until(async move {
            if let Err(err) = self.retry.retry(&tag).await {
                tracing::warn!("sync retry '{}' failed: {}", tag, err);
            }
        });
    }

    pub fn on_message<'a>(
        &'a self,
        message: WorkerMessage,
        reply: Option<ReplyPort>,
        lifetime: &mut ExtendLifetime<'a>,
    ) {
        match message {
            WorkerMessage::SkipWaiting => lifetime.wait_until(async move {
                if let Err(err) = self.scope.skip_waiting().await {
                    tracing::warn!("skip waiting failed: {}", err);
                }
            }),
            WorkerMessage::GetVersion => {
                let Some(port) = reply else {
                    tracing::warn!("GET_VERSION without a reply port");
                    return;
                };
                let reply = VersionReply {
                    version: self.config.version.clone(),
                };
                if let Err(err) = port.post(reply) {
                    tracing::warn!("version reply failed: {}", err);
                }
            }
            WorkerMessage::Unknown => tracing::debug!("ignoring unknown worker message"),
        }
    }
}
