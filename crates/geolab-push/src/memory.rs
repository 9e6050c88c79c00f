//! In-memory host platform
//!
//! A single-threaded stand-in for the browser: permission prompt, worker
//! container, push manager, cache storage, notification tray and window
//! clients. Every call is counted in [`HostStats`] so callers can assert on
//! what reached the platform.

use crate::error::PushError;
use crate::host::{
    ClientId, DisplayedNotification, NotificationId, NotificationPlatform, PushSubscription,
    RegistrationHandle, SubscribeOptions, SubscriptionKeys, WindowClient, WorkerPlatform, WorkerScope,
};
use crate::payload::NotificationPayload;
use crate::permission::PermissionState;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};
use url::Url;

/// Platform operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostOperation {
    Prompt,
    Register,
    Registration,
    Subscription,
    Subscribe,
    Unsubscribe,
    SkipWaiting,
    ShowNotification,
    NotificationsWithTag,
    CacheNames,
    DeleteCache,
    ClaimClients,
    WindowClients,
    OpenWindow,
}

/// Calls that reached the platform
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostStats {
    pub prompts: usize,
    pub registrations: usize,
    pub subscribes: usize,
    pub unsubscribes: usize,
    pub skip_waiting: usize,
    pub claims: usize,
    pub notifications_shown: usize,
    pub notifications_closed: usize,
    pub focused: Vec<ClientId>,
    pub opened: Vec<Url>,
}

#[derive(Debug)]
struct BrowserState {
    notifications_supported: bool,
    worker_supported: bool,
    push_supported: bool,
    tag_replacement: bool,
    permission: PermissionState,
    prompt_answer: PermissionState,
    registrations: HashMap<String, RegistrationHandle>,
    subscriptions: HashMap<String, PushSubscription>,
    caches: BTreeSet<String>,
    tray: Vec<DisplayedNotification>,
    clients: Vec<WindowClient>,
    failing: HashSet<HostOperation>,
    next_notification: NotificationId,
    next_client: u64,
    next_endpoint: u64,
    stats: HostStats,
}

impl BrowserState {
    fn check(&self, op: HostOperation) -> Result<(), PushError> {
        if self.failing.contains(&op) {
            return Err(PushError::Platform(format!("{:?} failed", op)));
        }
        Ok(())
    }

    fn show(&mut self, payload: &NotificationPayload) -> NotificationId {
        if self.tag_replacement && !payload.tag.is_empty() {
            self.tray.retain(|n| n.payload.tag != payload.tag);
        }

        let id = self.next_notification;
        self.next_notification += 1;
        self.tray.push(DisplayedNotification {
            id,
            payload: payload.clone(),
        });
        self.stats.notifications_shown += 1;
        id
    }
}

/// In-memory browser implementing every host trait
#[derive(Debug)]
pub struct MemoryBrowser {
    state: RefCell<BrowserState>,
}

impl Default for MemoryBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBrowser {
    /// A browser with every API available and permission still `Default`
    pub fn new() -> Self {
        Self {
            state: RefCell::new(BrowserState {
                notifications_supported: true,
                worker_supported: true,
                push_supported: true,
                tag_replacement: true,
                permission: PermissionState::Default,
                prompt_answer: PermissionState::Granted,
                registrations: HashMap::new(),
                subscriptions: HashMap::new(),
                caches: BTreeSet::new(),
                tray: Vec::new(),
                clients: Vec::new(),
                failing: HashSet::new(),
                next_notification: 1,
                next_client: 1,
                next_endpoint: 1,
                stats: HostStats::default(),
            }),
        }
    }

    /// A browser without notifications, workers or push
    pub fn unsupported() -> Self {
        let browser = Self::new();
        {
            let mut state = browser.state.borrow_mut();
            state.notifications_supported = false;
            state.worker_supported = false;
            state.push_supported = false;
        }
        browser
    }

    pub fn set_permission(&self, permission: PermissionState) {
        self.state.borrow_mut().permission = permission;
    }

    /// What the user picks when prompted
    pub fn set_prompt_answer(&self, answer: PermissionState) {
        self.state.borrow_mut().prompt_answer = answer;
    }

    pub fn set_push_supported(&self, supported: bool) {
        self.state.borrow_mut().push_supported = supported;
    }

    /// Simulate a platform whose tray stacks notifications with equal tags
    pub fn set_tag_replacement(&self, enabled: bool) {
        self.state.borrow_mut().tag_replacement = enabled;
    }

    pub fn fail(&self, op: HostOperation) {
        self.state.borrow_mut().failing.insert(op);
    }

    pub fn recover(&self, op: HostOperation) {
        self.state.borrow_mut().failing.remove(&op);
    }

    /// Push service drops every subscription (expiry, revocation)
    pub fn invalidate_subscriptions(&self) {
        self.state.borrow_mut().subscriptions.clear();
    }

    pub fn add_cache(&self, name: &str) {
        self.state.borrow_mut().caches.insert(name.to_string());
    }

    pub fn caches(&self) -> Vec<String> {
        self.state.borrow().caches.iter().cloned().collect()
    }

    /// Open a page context at `url`
    pub fn add_client(&self, url: Url) -> ClientId {
        let mut state = self.state.borrow_mut();
        let id = format!("client-{}", state.next_client);
        state.next_client += 1;
        state.clients.push(WindowClient {
            id: id.clone(),
            url,
            focused: false,
        });
        id
    }

    pub fn clients(&self) -> Vec<WindowClient> {
        self.state.borrow().clients.clone()
    }

    pub fn notifications(&self) -> Vec<DisplayedNotification> {
        self.state.borrow().tray.clone()
    }

    pub fn stats(&self) -> HostStats {
        self.state.borrow().stats.clone()
    }
}

impl NotificationPlatform for MemoryBrowser {
    fn supports_notifications(&self) -> bool {
        self.state.borrow().notifications_supported
    }

    fn notification_permission(&self) -> PermissionState {
        self.state.borrow().permission
    }

    async fn prompt_notification_permission(&self) -> Result<PermissionState, PushError> {
        let mut state = self.state.borrow_mut();
        state.stats.prompts += 1;
        state.check(HostOperation::Prompt)?;
        state.permission = state.prompt_answer;
        Ok(state.permission)
    }

    async fn show_local_notification(&self, payload: &NotificationPayload) -> Result<NotificationId, PushError> {
        let mut state = self.state.borrow_mut();
        state.check(HostOperation::ShowNotification)?;
        if !state.permission.is_granted() {
            return Err(PushError::PermissionDenied);
        }
        Ok(state.show(payload))
    }
}

impl WorkerPlatform for MemoryBrowser {
    fn supports_service_worker(&self) -> bool {
        self.state.borrow().worker_supported
    }

    fn supports_push(&self) -> bool {
        self.state.borrow().push_supported
    }

    async fn register_worker(&self, script_url: &str, scope: &str) -> Result<RegistrationHandle, PushError> {
        let mut state = self.state.borrow_mut();
        state.check(HostOperation::Register)?;
        if !state.worker_supported {
            return Err(PushError::UnsupportedPlatform("service workers"));
        }
        state.stats.registrations += 1;

        let handle = RegistrationHandle {
            scope: scope.to_string(),
            script_url: script_url.to_string(),
        };
        state.registrations.insert(scope.to_string(), handle.clone());
        Ok(handle)
    }

    async fn registration(&self, scope: &str) -> Result<Option<RegistrationHandle>, PushError> {
        let state = self.state.borrow();
        state.check(HostOperation::Registration)?;
        Ok(state.registrations.get(scope).cloned())
    }

    async fn subscription(&self, registration: &RegistrationHandle) -> Result<Option<PushSubscription>, PushError> {
        let state = self.state.borrow();
        state.check(HostOperation::Subscription)?;
        Ok(state.subscriptions.get(&registration.scope).cloned())
    }

    async fn subscribe(
        &self,
        registration: &RegistrationHandle,
        options: &SubscribeOptions,
    ) -> Result<PushSubscription, PushError> {
        let mut state = self.state.borrow_mut();
        state.stats.subscribes += 1;
        state.check(HostOperation::Subscribe)?;

        if !options.user_visible_only {
            return Err(PushError::SubscriptionFailure(
                "push service requires userVisibleOnly".to_string(),
            ));
        }
        if !state.permission.is_granted() {
            return Err(PushError::PermissionDenied);
        }
        if let Some(existing) = state.subscriptions.get(&registration.scope) {
            return Ok(existing.clone());
        }

        let n = state.next_endpoint;
        state.next_endpoint += 1;
        let subscription = PushSubscription {
            endpoint: format!("https://push.example.net/send/{}", n),
            expiration_time: None,
            keys: SubscriptionKeys {
                p256dh: URL_SAFE_NO_PAD.encode(&options.application_server_key),
                auth: URL_SAFE_NO_PAD.encode(n.to_be_bytes()),
            },
            scope: registration.scope.clone(),
        };
        state
            .subscriptions
            .insert(registration.scope.clone(), subscription.clone());
        Ok(subscription)
    }

    async fn unsubscribe(&self, subscription: &PushSubscription) -> Result<bool, PushError> {
        let mut state = self.state.borrow_mut();
        state.stats.unsubscribes += 1;
        state.check(HostOperation::Unsubscribe)?;

        let matches = state
            .subscriptions
            .get(&subscription.scope)
            .is_some_and(|s| s.endpoint == subscription.endpoint);
        if matches {
            state.subscriptions.remove(&subscription.scope);
        }
        Ok(matches)
    }
}

impl WorkerScope for MemoryBrowser {
    async fn skip_waiting(&self) -> Result<(), PushError> {
        let mut state = self.state.borrow_mut();
        state.stats.skip_waiting += 1;
        state.check(HostOperation::SkipWaiting)
    }

    async fn cache_names(&self) -> Result<Vec<String>, PushError> {
        let state = self.state.borrow();
        state.check(HostOperation::CacheNames)?;
        Ok(state.caches.iter().cloned().collect())
    }

    async fn delete_cache(&self, name: &str) -> Result<bool, PushError> {
        let mut state = self.state.borrow_mut();
        state.check(HostOperation::DeleteCache)?;
        Ok(state.caches.remove(name))
    }

    async fn claim_clients(&self) -> Result<(), PushError> {
        let mut state = self.state.borrow_mut();
        state.check(HostOperation::ClaimClients)?;
        state.stats.claims += 1;
        Ok(())
    }

    async fn show_notification(&self, payload: &NotificationPayload) -> Result<NotificationId, PushError> {
        let mut state = self.state.borrow_mut();
        state.check(HostOperation::ShowNotification)?;
        Ok(state.show(payload))
    }

    fn close_notification(&self, id: NotificationId) {
        let mut state = self.state.borrow_mut();
        let before = state.tray.len();
        state.tray.retain(|n| n.id != id);
        if state.tray.len() != before {
            state.stats.notifications_closed += 1;
        }
    }

    async fn notifications_with_tag(&self, tag: &str) -> Result<Vec<NotificationId>, PushError> {
        let state = self.state.borrow();
        state.check(HostOperation::NotificationsWithTag)?;
        Ok(state
            .tray
            .iter()
            .filter(|n| n.payload.tag == tag)
            .map(|n| n.id)
            .collect())
    }

    fn supports_tag_replacement(&self) -> bool {
        self.state.borrow().tag_replacement
    }

    async fn window_clients(&self) -> Result<Vec<WindowClient>, PushError> {
        let state = self.state.borrow();
        state.check(HostOperation::WindowClients)?;
        Ok(state.clients.clone())
    }

    async fn focus_client(&self, id: &ClientId) -> Result<(), PushError> {
        let mut state = self.state.borrow_mut();
        if !state.clients.iter().any(|c| &c.id == id) {
            return Err(PushError::Platform(format!("no client {}", id)));
        }
        for client in state.clients.iter_mut() {
            client.focused = &client.id == id;
        }
        state.stats.focused.push(id.clone());
        Ok(())
    }

    async fn open_window(&self, url: &Url) -> Result<ClientId, PushError> {
        let mut state = self.state.borrow_mut();
        state.check(HostOperation::OpenWindow)?;

        let id = format!("client-{}", state.next_client);
        state.next_client += 1;
        for client in state.clients.iter_mut() {
            client.focused = false;
        }
        state.clients.push(WindowClient {
            id: id.clone(),
            url: url.clone(),
            focused: true,
        });
        state.stats.opened.push(url.clone());
        Ok(id)
    }
}
