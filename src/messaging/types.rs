use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::messaging::constants::{
    SETTINGS_PROMPT_MESSAGE, SETTINGS_PROMPT_TITLE, TOKEN_PLACEHOLDER,
};
use crate::messaging::error::{invalid_argument, ReadinessResult};

/// Effective notification permission as tracked by the readiness core.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PermissionState {
    /// No decision is known, or the platform could not be queried.
    #[default]
    Undetermined,
    /// The user granted notification permissions.
    Granted,
    /// Not granted, but the OS prompt can still be shown.
    Denied,
    /// Not granted and the OS will not prompt again; only settings can fix it.
    Blocked,
}

impl PermissionState {
    /// Whether the user should be offered the "enable notifications" action.
    pub fn needs_repair(self) -> bool {
        matches!(self, PermissionState::Denied | PermissionState::Blocked)
    }
}

/// Raw status reported by the platform permission service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PermissionStatus {
    Granted,
    Denied,
    Blocked,
    Undetermined,
    /// The device or OS version has no notification permission concept.
    Unavailable,
}

impl From<PermissionStatus> for PermissionState {
    fn from(status: PermissionStatus) -> Self {
        match status {
            PermissionStatus::Granted => PermissionState::Granted,
            PermissionStatus::Denied => PermissionState::Denied,
            PermissionStatus::Blocked => PermissionState::Blocked,
            PermissionStatus::Undetermined | PermissionStatus::Unavailable => {
                PermissionState::Undetermined
            }
        }
    }
}

/// Notification capabilities requested from the OS.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PermissionKind {
    Alert,
    Badge,
    Sound,
    CriticalAlert,
    CarPlay,
    Provisional,
}

impl PermissionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionKind::Alert => "alert",
            PermissionKind::Badge => "badge",
            PermissionKind::Sound => "sound",
            PermissionKind::CriticalAlert => "criticalAlert",
            PermissionKind::CarPlay => "carPlay",
            PermissionKind::Provisional => "provisional",
        }
    }
}

/// Opaque push delivery token. Never blank.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DeliveryToken(String);

impl DeliveryToken {
    /// Wraps `value`, returning `None` when it is empty or whitespace.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DeliveryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for DeliveryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(8).collect();
        write!(f, "DeliveryToken({prefix}...)")
    }
}

/// Payload displayed to the user when a notification is shown.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub image: Option<String>,
}

/// Message delivered by the push channel.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub notification: Option<NotificationPayload>,
    pub data: Option<HashMap<String, String>>,
    pub from: Option<String>,
    pub collapse_key: Option<String>,
    pub message_id: Option<String>,
}

impl MessagePayload {
    /// Decodes the JSON form of a remote message as handed over by the push channel.
    pub fn from_json(raw: &str) -> ReadinessResult<Self> {
        serde_json::from_str(raw)
            .map_err(|err| invalid_argument(format!("malformed remote message: {err}")))
    }

    pub fn title(&self) -> Option<&str> {
        self.notification.as_ref()?.title.as_deref()
    }

    pub fn body(&self) -> Option<&str> {
        self.notification.as_ref()?.body.as_deref()
    }
}

/// Importance level of a notification channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Importance {
    Min,
    Low,
    #[default]
    Default,
    High,
}

/// OS grouping that controls how local notifications are surfaced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub importance: Importance,
}

/// A local notification ready to hand to the presenter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub channel_id: String,
}

/// Process lifecycle signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AppState {
    Active,
    Background,
    Inactive,
}

/// What the screen renders: a pure projection of permission and token.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UiState {
    pub token: Option<DeliveryToken>,
    pub show_permission_repair: bool,
}

impl UiState {
    /// The token text, or a placeholder while none is available.
    pub fn token_label(&self) -> &str {
        self.token
            .as_ref()
            .map(DeliveryToken::as_str)
            .unwrap_or(TOKEN_PLACEHOLDER)
    }
}

/// Alert content for sending the user to the OS settings screen.
///
/// Raised once at startup when notifications are blocked. The host shows it with
/// "Cancel" and "Open Settings" actions, the latter calling
/// `LifecycleCoordinator::repair_permission`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettingsPrompt {
    pub title: String,
    pub message: String,
}

impl Default for SettingsPrompt {
    fn default() -> Self {
        Self {
            title: SETTINGS_PROMPT_TITLE.to_string(),
            message: SETTINGS_PROMPT_MESSAGE.to_string(),
        }
    }
}

/// Handler for inbound messages; the returned future completes once presentation is done.
pub type MessageHandler = Arc<dyn Fn(MessagePayload) -> BoxFuture<'static, ()> + Send + Sync>;

/// Receives raw rotated tokens from the push channel.
pub type TokenListener = Arc<dyn Fn(String) + Send + Sync + 'static>;

pub type AppStateListener = Arc<dyn Fn(AppState) + Send + Sync + 'static>;

pub type UiStateListener = Arc<dyn Fn(&UiState) + Send + Sync + 'static>;

pub type SettingsPromptListener = Arc<dyn Fn(&SettingsPrompt) + Send + Sync + 'static>;

/// Cleanup returned by platform registrations.
pub type Unsubscribe = Box<dyn FnOnce() -> ReadinessResult<()> + Send + 'static>;
