//! Notification readiness: permission repair, delivery token acquisition and refresh,
//! and routing of push messages to local notifications.
//!
//! Platform APIs are consumed through the traits in [`platform`]; the
//! [`LifecycleCoordinator`] ties everything to the app lifecycle and exposes the
//! screen's [`UiState`].

pub mod constants;
mod coordinator;
pub mod error;
mod logger;
mod permission;
pub mod platform;
mod refresh;
mod router;
mod settings;
mod subscription;
mod token;
mod types;

pub use coordinator::{project, LifecycleCoordinator, ReadinessPhase};
pub use permission::{PermissionGateway, RepairOutcome};
pub use platform::{
    AppLifecycle, ClipboardSink, NotificationPresenter, PermissionService, PlatformServices,
    PushChannel, SettingsLink,
};
pub use refresh::RefreshSubscriber;
pub use router::{DeliveryPath, MessageRouter, RouterRegistration};
pub use settings::{ReadinessSettings, TargetPlatform};
pub use subscription::Subscription;
pub use token::{RetryPolicy, TokenAcquirer, TokenCell};
pub use types::{
    AppState, AppStateListener, DeliveryToken, Importance, MessageHandler, MessagePayload,
    NotificationChannel, NotificationPayload, NotificationRequest, PermissionKind,
    PermissionState, PermissionStatus, SettingsPrompt, SettingsPromptListener, TokenListener,
    UiState, UiStateListener, Unsubscribe,
};
