//! Readiness settings surface.
//!
//! Values are validated on the way in so the coordinator can rely on them.

use std::time::Duration;

use crate::messaging::constants::{
    DEFAULT_CHANNEL_ID, DEFAULT_CHANNEL_NAME, DEFAULT_MAX_ATTEMPTS, DEFAULT_NOTIFICATION_TITLE,
    DEFAULT_RETRY_BACKOFF_MS, IOS_APP_SETTINGS_URL,
};
use crate::messaging::error::{invalid_argument, ReadinessResult};
use crate::messaging::platform::SettingsLink;
use crate::messaging::token::RetryPolicy;
use crate::messaging::types::{Importance, NotificationChannel, PermissionKind};

/// Host OS family, which decides channel setup and the settings deep link.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TargetPlatform {
    #[default]
    Android,
    Ios,
}

impl TargetPlatform {
    /// Android requires a channel before notifications can use lock-screen importance.
    pub fn requires_channel(self) -> bool {
        matches!(self, TargetPlatform::Android)
    }

    pub fn settings_link(self) -> SettingsLink {
        match self {
            TargetPlatform::Ios => SettingsLink::Url(IOS_APP_SETTINGS_URL.to_string()),
            TargetPlatform::Android => SettingsLink::AppDetails,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadinessSettings {
    max_attempts: u32,
    retry_backoff_millis: u64,
    channel: NotificationChannel,
    permission_kinds: Vec<PermissionKind>,
    target: TargetPlatform,
    fallback_title: String,
}

impl ReadinessSettings {
    /// Default settings for the given platform.
    pub fn new(target: TargetPlatform) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn retry_backoff_millis(&self) -> u64 {
        self.retry_backoff_millis
    }

    pub fn channel(&self) -> &NotificationChannel {
        &self.channel
    }

    pub fn permission_kinds(&self) -> &[PermissionKind] {
        &self.permission_kinds
    }

    pub fn target(&self) -> TargetPlatform {
        self.target
    }

    pub fn fallback_title(&self) -> &str {
        &self.fallback_title
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: Duration::from_millis(self.retry_backoff_millis),
        }
    }

    pub fn with_max_attempts(mut self, value: u32) -> ReadinessResult<Self> {
        if value == 0 {
            return Err(invalid_argument("max_attempts must be greater than zero"));
        }
        self.max_attempts = value;
        Ok(self)
    }

    pub fn with_retry_backoff_millis(mut self, value: u64) -> Self {
        self.retry_backoff_millis = value;
        self
    }

    pub fn with_channel(mut self, channel: NotificationChannel) -> ReadinessResult<Self> {
        if channel.id.trim().is_empty() {
            return Err(invalid_argument("channel id must not be empty"));
        }
        if channel.name.trim().is_empty() {
            return Err(invalid_argument("channel name must not be empty"));
        }
        self.channel = channel;
        Ok(self)
    }

    pub fn with_permission_kinds(mut self, kinds: Vec<PermissionKind>) -> ReadinessResult<Self> {
        if kinds.is_empty() {
            return Err(invalid_argument(
                "at least one notification permission kind is required",
            ));
        }
        self.permission_kinds = kinds;
        Ok(self)
    }

    pub fn with_fallback_title(mut self, title: impl Into<String>) -> Self {
        self.fallback_title = title.into();
        self
    }
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff_millis: DEFAULT_RETRY_BACKOFF_MS,
            channel: NotificationChannel {
                id: DEFAULT_CHANNEL_ID.to_string(),
                name: DEFAULT_CHANNEL_NAME.to_string(),
                importance: Importance::High,
            },
            permission_kinds: vec![PermissionKind::Alert, PermissionKind::Sound],
            target: TargetPlatform::default(),
            fallback_title: DEFAULT_NOTIFICATION_TITLE.to_string(),
        }
    }
}
