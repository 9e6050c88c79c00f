//! Notification permission gate

use crate::host::NotificationPlatform;
use serde::{Deserialize, Serialize};

/// Notification permission state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    #[default]
    Default,
    Granted,
    Denied,
}

impl PermissionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Granted => "granted",
            Self::Denied => "denied",
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

impl std::fmt::Display for PermissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads and requests notification permission
pub struct PermissionGate<'a, P> {
    platform: &'a P,
}

impl<'a, P: NotificationPlatform> PermissionGate<'a, P> {
    pub fn new(platform: &'a P) -> Self {
        Self { platform }
    }

    /// Current state, no side effects. Unsupported platforms read as denied.
    pub fn get_permission(&self) -> PermissionState {
        if !self.platform.supports_notifications() {
            return PermissionState::Denied;
        }
        self.platform.notification_permission()
    }

    /// Prompt only when the state is still `Default`; at most one prompt per call.
    pub async fn request_permission(&self) -> PermissionState {
        if !self.platform.supports_notifications() {
            tracing::warn!("notifications are not supported on this platform");
            return PermissionState::Denied;
        }

        let current = self.platform.notification_permission();
        match current {
            PermissionState::Granted | PermissionState::Denied => {
                tracing::debug!("notification permission already {}", current);
                current
            }
            PermissionState::Default => match self.platform.prompt_notification_permission().await {
                Ok(choice) => {
                    tracing::info!("notification permission: {}", choice);
                    choice
                }
                Err(err) => {
                    tracing::warn!("permission prompt failed: {}", err);
                    current
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{HostOperation, MemoryBrowser};

    #[test]
    fn test_no_prompt_when_settled() {
        for state in [PermissionState::Granted, PermissionState::Denied] {
            let browser = MemoryBrowser::new();
            browser.set_permission(state);
            browser.set_prompt_answer(PermissionState::Granted);

            let gate = PermissionGate::new(&browser);
            assert_eq!(smol::block_on(gate.request_permission()), state);
            assert_eq!(browser.stats().prompts, 0);
        }
    }

    #[test]
    fn test_single_prompt_from_default() {
        let browser = MemoryBrowser::new();
        browser.set_prompt_answer(PermissionState::Granted);

        let gate = PermissionGate::new(&browser);
        assert_eq!(gate.get_permission(), PermissionState::Default);
        assert_eq!(smol::block_on(gate.request_permission()), PermissionState::Granted);
        assert_eq!(browser.stats().prompts, 1);

        // Second request is settled, no new prompt
        assert_eq!(smol::block_on(gate.request_permission()), PermissionState::Granted);
        assert_eq!(browser.stats().prompts, 1);
    }

    #[test]
    fn test_dismissed_prompt_stays_default() {
        let browser = MemoryBrowser::new();
        browser.set_prompt_answer(PermissionState::Default);

        let gate = PermissionGate::new(&browser);
        assert_eq!(smol::block_on(gate.request_permission()), PermissionState::Default);
        assert_eq!(browser.stats().prompts, 1);
    }

    #[test]
    fn test_failed_prompt_keeps_current_state() {
        let browser = MemoryBrowser::new();
        browser.fail(HostOperation::Prompt);

        let gate = PermissionGate::new(&browser);
        assert_eq!(smol::block_on(gate.request_permission()), PermissionState::Default);
        assert_eq!(browser.stats().prompts, 1);
        assert_eq!(gate.get_permission(), PermissionState::Default);
    }

    #[test]
    fn test_unsupported_reads_denied() {
        let browser = MemoryBrowser::unsupported();
        let gate = PermissionGate::new(&browser);

        assert_eq!(gate.get_permission(), PermissionState::Denied);
        assert_eq!(smol::block_on(gate.request_permission()), PermissionState::Denied);
        assert_eq!(browser.stats().prompts, 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(PermissionState::Granted.to_string(), "granted");
        assert_eq!(PermissionState::default(), PermissionState::Default);
    }
}
