//! Platform services consumed by the readiness core.
//!
//! Host bindings (a React Native bridge, a JNI layer, a Swift shim) implement these
//! traits over the native permission, push, notification, clipboard and lifecycle
//! APIs. The core never reaches for process-wide handles; everything arrives through
//! [`PlatformServices`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::messaging::error::ReadinessResult;
use crate::messaging::types::{
    AppStateListener, MessageHandler, NotificationChannel, NotificationRequest, PermissionKind,
    PermissionStatus, TokenListener, Unsubscribe,
};

/// Where the OS settings screen should be opened from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettingsLink {
    /// Open a URL through the platform linking API (iOS `app-settings:`).
    Url(String),
    /// Use the permission service's own "open app settings" entry point.
    AppDetails,
}

#[async_trait]
pub trait PermissionService: Send + Sync {
    async fn check_notifications(&self) -> ReadinessResult<PermissionStatus>;

    async fn request_notifications(
        &self,
        kinds: &[PermissionKind],
    ) -> ReadinessResult<PermissionStatus>;

    /// Opens the OS settings screen. May suspend the app without a callback on return.
    async fn open_settings(&self, link: &SettingsLink) -> ReadinessResult<()>;
}

#[async_trait]
pub trait PushChannel: Send + Sync {
    /// Fetches the current delivery token. An empty string means "not yet available".
    async fn get_token(&self) -> ReadinessResult<String>;

    fn on_token_rotate(&self, listener: TokenListener) -> ReadinessResult<Unsubscribe>;

    fn set_foreground_handler(&self, handler: MessageHandler) -> ReadinessResult<Unsubscribe>;

    /// The platform must await the handler's future before letting the process suspend.
    fn set_background_handler(&self, handler: MessageHandler) -> ReadinessResult<Unsubscribe>;
}

#[async_trait]
pub trait NotificationPresenter: Send + Sync {
    async fn create_channel(&self, channel: &NotificationChannel) -> ReadinessResult<()>;

    async fn show(&self, request: NotificationRequest) -> ReadinessResult<()>;
}

pub trait ClipboardSink: Send + Sync {
    fn set_text(&self, text: &str) -> ReadinessResult<()>;
}

pub trait AppLifecycle: Send + Sync {
    fn subscribe(&self, listener: AppStateListener) -> ReadinessResult<Unsubscribe>;
}

/// Bundle of platform services injected into the coordinator.
#[derive(Clone)]
pub struct PlatformServices {
    pub permissions: Arc<dyn PermissionService>,
    pub push: Arc<dyn PushChannel>,
    pub presenter: Arc<dyn NotificationPresenter>,
    pub clipboard: Arc<dyn ClipboardSink>,
    pub lifecycle: Arc<dyn AppLifecycle>,
}
