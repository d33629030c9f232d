//! Notification readiness state machine.
//!
//! The coordinator wires the permission gateway, token acquirer, refresh subscriber
//! and message router to the app lifecycle, and owns the only mutable copy of the
//! screen state. Collaborators return values or invoke callbacks; they never touch
//! [`UiState`] directly.
//!
//! ```text
//! Init -> PermissionCheck -> TokenAcquiring -> Ready
//!                                (message routing active from Init onward)
//! any  -> TornDown            (teardown)
//! ```

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::messaging::logger::LOGGER;
use crate::messaging::permission::{PermissionGateway, RepairOutcome};
use crate::messaging::platform::PlatformServices;
use crate::messaging::refresh::RefreshSubscriber;
use crate::messaging::router::MessageRouter;
use crate::messaging::settings::ReadinessSettings;
use crate::messaging::subscription::Subscription;
use crate::messaging::token::{TokenAcquirer, TokenCell};
use crate::messaging::types::{
    AppState, AppStateListener, DeliveryToken, PermissionState, SettingsPrompt,
    SettingsPromptListener, UiState, UiStateListener,
};
use crate::platform::runtime::{spawn_detached, Cancellation};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadinessPhase {
    Init,
    PermissionCheck,
    TokenAcquiring,
    Ready,
    TornDown,
}

/// Projects permission and token into what the screen shows.
pub fn project(permission: PermissionState, token: Option<&DeliveryToken>) -> UiState {
    UiState {
        token: token.cloned(),
        show_permission_repair: permission.needs_repair(),
    }
}

/// Drives notification readiness for one screen instance.
#[derive(Clone)]
pub struct LifecycleCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    services: PlatformServices,
    settings: ReadinessSettings,
    gateway: PermissionGateway,
    acquirer: TokenAcquirer,
    refresh: RefreshSubscriber,
    router: Arc<MessageRouter>,
    tokens: TokenCell,
    cancellation: Cancellation,
    state: Mutex<CoordinatorState>,
    listeners: Mutex<Vec<(usize, UiStateListener)>>,
    prompt_listeners: Mutex<Vec<(usize, SettingsPromptListener)>>,
    next_listener_id: AtomicUsize,
    /// Bumped by every foreground reconciliation and permission repair; a status check
    /// only applies while its generation is the newest.
    permission_generation: AtomicU64,
    subscriptions: Mutex<Vec<Subscription>>,
}

struct CoordinatorState {
    phase: ReadinessPhase,
    started: bool,
    permission: PermissionState,
    ui: UiState,
}

impl LifecycleCoordinator {
    pub fn new(services: PlatformServices, settings: ReadinessSettings) -> Self {
        let tokens = TokenCell::default();
        let cancellation = Cancellation::new();
        let gateway = PermissionGateway::new(
            services.permissions.clone(),
            settings.target().settings_link(),
            settings.permission_kinds().to_vec(),
        );
        let acquirer = TokenAcquirer::new(
            services.push.clone(),
            settings.retry_policy(),
            tokens.clone(),
            cancellation.clone(),
        );
        let refresh = RefreshSubscriber::new(services.push.clone());
        let router = Arc::new(MessageRouter::new(services.presenter.clone(), &settings));

        let inner = CoordinatorInner {
            services,
            settings,
            gateway,
            acquirer,
            refresh,
            router,
            tokens,
            cancellation,
            state: Mutex::new(CoordinatorState {
                phase: ReadinessPhase::Init,
                started: false,
                permission: PermissionState::Undetermined,
                ui: UiState::default(),
            }),
            listeners: Mutex::new(Vec::new()),
            prompt_listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicUsize::new(1),
            permission_generation: AtomicU64::new(0),
            subscriptions: Mutex::new(Vec::new()),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn settings(&self) -> &ReadinessSettings {
        &self.inner.settings
    }

    pub fn ui_state(&self) -> UiState {
        self.inner.state.lock().unwrap().ui.clone()
    }

    pub fn phase(&self) -> ReadinessPhase {
        self.inner.state.lock().unwrap().phase
    }

    /// Last known effective permission.
    pub fn permission(&self) -> PermissionState {
        self.inner.state.lock().unwrap().permission
    }

    pub fn router(&self) -> &Arc<MessageRouter> {
        &self.inner.router
    }

    /// Runs the startup sequence once; later calls return the current state.
    ///
    /// Creates the channel, registers message handlers and the refresh and app-state
    /// listeners, checks (and if needed requests) permission, then acquires a token.
    /// Missing permission does not stop token acquisition. Nothing here fails: every
    /// problem ends up in the returned [`UiState`].
    pub async fn start(&self) -> UiState {
        let inner = &self.inner;
        {
            let mut state = inner.state.lock().unwrap();
            if state.started || state.phase == ReadinessPhase::TornDown {
                return state.ui.clone();
            }
            state.started = true;
        }

        inner.router.create_channel().await;
        if inner.is_torn_down() {
            return self.ui_state();
        }
        self.register_listeners();

        inner.update(|state| state.phase = ReadinessPhase::PermissionCheck);
        let permission = inner.startup_permission().await;
        if inner.is_torn_down() {
            return self.ui_state();
        }
        inner.update(|state| state.permission = permission);
        if permission == PermissionState::Blocked {
            inner.raise_settings_prompt();
        }

        inner.update(|state| state.phase = ReadinessPhase::TokenAcquiring);
        if inner.acquirer.acquire().await.is_none() {
            LOGGER.warn("Delivery token unavailable; waiting for a refresh event.");
        }
        inner.update(|state| state.phase = ReadinessPhase::Ready);
        self.ui_state()
    }

    /// Re-runs token acquisition, joining a sequence already in flight.
    pub async fn retry_token(&self) -> Option<DeliveryToken> {
        if self.inner.is_torn_down() {
            return None;
        }
        let token = self.inner.acquirer.acquire().await;
        self.inner.update(|_| {});
        token
    }

    /// Reconciles the repair affordance with the OS after a lifecycle change.
    ///
    /// Only `Active` triggers work, and only a read-only status check: this never
    /// prompts the user. A check overtaken by a newer one is discarded.
    pub async fn handle_app_state(&self, app_state: AppState) {
        if let Some(generation) = self.inner.begin_reconcile(app_state) {
            self.inner.reconcile(generation).await;
        }
    }

    /// User-initiated "enable notifications" action.
    pub async fn repair_permission(&self) -> RepairOutcome {
        if self.inner.is_torn_down() {
            return RepairOutcome::Unresolved;
        }
        let outcome = self.inner.gateway.repair().await;
        if matches!(outcome, RepairOutcome::Granted | RepairOutcome::AlreadyGranted) {
            self.inner.permission_generation.fetch_add(1, Ordering::SeqCst);
            self.inner.update(|state| state.permission = PermissionState::Granted);
        }
        outcome
    }

    /// Copies the current token to the clipboard. Returns `false` when there is no
    /// token yet or the clipboard rejected it.
    pub fn copy_token(&self) -> bool {
        let Some(token) = self.ui_state().token else {
            return false;
        };
        match self.inner.services.clipboard.set_text(token.as_str()) {
            Ok(()) => true,
            Err(err) => {
                LOGGER.error(format!("Error copying to clipboard: {err}"));
                false
            }
        }
    }

    /// Calls `listener` with the new state every time the projection changes.
    pub fn on_ui_state_changed<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&UiState) + Send + Sync + 'static,
    {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::SeqCst);
        self.inner
            .listeners
            .lock()
            .unwrap()
            .push((id, Arc::new(listener)));

        let weak = Arc::downgrade(&self.inner);
        Subscription::new(
            "ui state",
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.listeners.lock().unwrap().retain(|(entry, _)| *entry != id);
                }
                Ok(())
            }),
        )
    }

    /// Calls `listener` when startup finds notifications blocked, so the host can offer
    /// a way to the settings screen. Raised at most once per coordinator.
    pub fn on_settings_prompt<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SettingsPrompt) + Send + Sync + 'static,
    {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::SeqCst);
        self.inner
            .prompt_listeners
            .lock()
            .unwrap()
            .push((id, Arc::new(listener)));

        let weak = Arc::downgrade(&self.inner);
        Subscription::new(
            "settings prompt",
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner
                        .prompt_listeners
                        .lock()
                        .unwrap()
                        .retain(|(entry, _)| *entry != id);
                }
                Ok(())
            }),
        )
    }

    /// Releases every listener and cancels pending retries. Safe to call at any time,
    /// any number of times; late callbacks become no-ops.
    pub fn teardown(&self) {
        let released = {
            let mut state = self.inner.state.lock().unwrap();
            if state.phase == ReadinessPhase::TornDown {
                return;
            }
            state.phase = ReadinessPhase::TornDown;
            std::mem::take(&mut *self.inner.subscriptions.lock().unwrap())
        };
        self.inner.cancellation.cancel();
        for mut subscription in released {
            subscription.unsubscribe();
        }
        self.inner.listeners.lock().unwrap().clear();
        self.inner.prompt_listeners.lock().unwrap().clear();
        LOGGER.debug("Notification readiness torn down.");
    }

    fn register_listeners(&self) {
        let inner = &self.inner;
        let registration = inner.router.register(inner.services.push.as_ref());
        inner.retain(registration.foreground);
        // The OS may invoke the background handler after this screen is gone.
        registration.background.detach();

        let weak = Arc::downgrade(inner);
        let refresh = inner.refresh.subscribe(move |token| {
            if let Some(inner) = weak.upgrade() {
                inner.apply_rotation(token);
            }
        });
        inner.retain(refresh);

        let weak = Arc::downgrade(inner);
        let listener: AppStateListener = Arc::new(move |app_state| {
            let Some(generation) = weak
                .upgrade()
                .and_then(|inner| inner.begin_reconcile(app_state))
            else {
                return;
            };
            let weak: Weak<CoordinatorInner> = weak.clone();
            spawn_detached(async move {
                if let Some(inner) = weak.upgrade() {
                    inner.reconcile(generation).await;
                }
            });
        });
        let app_state = match inner.services.lifecycle.subscribe(listener) {
            Ok(unsubscribe) => Subscription::new("app state", unsubscribe),
            Err(err) => {
                LOGGER.error(format!("Failed to subscribe to app state changes: {err}"));
                Subscription::noop("app state")
            }
        };
        inner.retain(app_state);
    }
}

impl CoordinatorInner {
    fn is_torn_down(&self) -> bool {
        self.state.lock().unwrap().phase == ReadinessPhase::TornDown
    }

    /// Keeps `subscription` until teardown, or releases it at once if teardown
    /// already happened.
    fn retain(&self, mut subscription: Subscription) {
        let state = self.state.lock().unwrap();
        if state.phase == ReadinessPhase::TornDown {
            drop(state);
            subscription.unsubscribe();
            return;
        }
        self.subscriptions.lock().unwrap().push(subscription);
    }

    /// Applies `mutate`, re-projects the UI and notifies listeners on change.
    /// Does nothing after teardown.
    fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&mut CoordinatorState),
    {
        let changed = {
            let mut state = self.state.lock().unwrap();
            if state.phase == ReadinessPhase::TornDown {
                return;
            }
            mutate(&mut state);
            let projected = project(state.permission, self.tokens.get().as_ref());
            if projected == state.ui {
                None
            } else {
                state.ui = projected.clone();
                Some(projected)
            }
        };

        if let Some(ui) = changed {
            let listeners: Vec<_> = self
                .listeners
                .lock()
                .unwrap()
                .iter()
                .map(|(_, listener)| listener.clone())
                .collect();
            for listener in listeners {
                listener(&ui);
            }
        }
    }

    /// Startup policy: prompt once when undetermined or denied, never when blocked.
    async fn startup_permission(&self) -> PermissionState {
        let status = self.gateway.check_status().await;
        if self.is_torn_down() {
            return status;
        }
        match status {
            PermissionState::Granted => {
                LOGGER.info("Notifications are enabled.");
                PermissionState::Granted
            }
            PermissionState::Blocked => {
                LOGGER.info("Notifications are blocked. Ask user to enable manually.");
                PermissionState::Blocked
            }
            PermissionState::Denied | PermissionState::Undetermined => {
                match self.gateway.request_from(status, self.gateway.kinds()).await {
                    PermissionState::Granted => PermissionState::Granted,
                    PermissionState::Blocked => PermissionState::Blocked,
                    // Asked and still not granted.
                    PermissionState::Denied | PermissionState::Undetermined => {
                        PermissionState::Denied
                    }
                }
            }
        }
    }

    /// Claims a generation for a read-only status check. Only `Active` triggers one.
    fn begin_reconcile(&self, app_state: AppState) -> Option<u64> {
        if app_state != AppState::Active || self.is_torn_down() {
            return None;
        }
        Some(self.permission_generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn reconcile(&self, generation: u64) {
        let status = self.gateway.check_status().await;
        if self.permission_generation.load(Ordering::SeqCst) != generation {
            LOGGER.debug("Discarding permission check superseded by a newer one.");
            return;
        }
        if status == PermissionState::Undetermined {
            LOGGER.debug("Permission status unknown after foreground; keeping last state.");
            return;
        }
        self.update(|state| state.permission = status);
    }

    fn raise_settings_prompt(&self) {
        let listeners: Vec<_> = self
            .prompt_listeners
            .lock()
            .unwrap()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        let prompt = SettingsPrompt::default();
        for listener in listeners {
            listener(&prompt);
        }
    }

    fn apply_rotation(&self, token: DeliveryToken) {
        if self.is_torn_down() {
            return;
        }
        self.tokens.store(token);
        self.update(|_| {});
    }
}
