//! Scripted fakes of the platform services, shared by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::messaging::error::{
    channel_setup_failed, clipboard_failed, permission_query_failed, presentation_failed,
    settings_unavailable, subscribe_failed, ReadinessResult,
};
use crate::messaging::platform::{
    AppLifecycle, ClipboardSink, NotificationPresenter, PermissionService, PlatformServices,
    PushChannel, SettingsLink,
};
use crate::messaging::{
    AppState, AppStateListener, MessageHandler, MessagePayload, NotificationChannel,
    NotificationPayload, NotificationRequest, PermissionKind, PermissionStatus, TokenListener,
    Unsubscribe,
};

/// Lets spawned tasks on the current-thread runtime run to completion.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

pub fn message(title: Option<&str>, body: Option<&str>) -> MessagePayload {
    MessagePayload {
        notification: Some(NotificationPayload {
            title: title.map(str::to_string),
            body: body.map(str::to_string),
            image: None,
        }),
        ..Default::default()
    }
}

pub struct FakePermissionService {
    status: Mutex<ReadinessResult<PermissionStatus>>,
    request_result: Mutex<ReadinessResult<PermissionStatus>>,
    slow_checks: Mutex<VecDeque<(Duration, PermissionStatus)>>,
    pub fail_settings: AtomicBool,
    pub check_calls: AtomicUsize,
    pub request_calls: AtomicUsize,
    pub requested_kinds: Mutex<Vec<Vec<PermissionKind>>>,
    pub opened_settings: Mutex<Vec<SettingsLink>>,
}

impl FakePermissionService {
    pub fn new(status: PermissionStatus) -> Self {
        Self {
            status: Mutex::new(Ok(status)),
            request_result: Mutex::new(Ok(status)),
            slow_checks: Mutex::new(VecDeque::new()),
            fail_settings: AtomicBool::new(false),
            check_calls: AtomicUsize::new(0),
            request_calls: AtomicUsize::new(0),
            requested_kinds: Mutex::new(Vec::new()),
            opened_settings: Mutex::new(Vec::new()),
        }
    }

    pub fn set_status(&self, status: PermissionStatus) {
        *self.status.lock().unwrap() = Ok(status);
    }

    pub fn fail_checks(&self) {
        *self.status.lock().unwrap() = Err(permission_query_failed("permission module missing"));
    }

    /// Makes the next check wait `delay` and then report `status`, regardless of the
    /// current status. Queued checks are consumed in call order.
    pub fn slow_check(&self, delay: Duration, status: PermissionStatus) {
        self.slow_checks.lock().unwrap().push_back((delay, status));
    }

    /// What the OS prompt resolves to on the next request.
    pub fn respond_with(&self, result: ReadinessResult<PermissionStatus>) {
        *self.request_result.lock().unwrap() = result;
    }

    pub fn checks(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> usize {
        self.request_calls.load(Ordering::SeqCst)
    }

    pub fn settings_opened(&self) -> usize {
        self.opened_settings.lock().unwrap().len()
    }
}

#[async_trait]
impl PermissionService for FakePermissionService {
    async fn check_notifications(&self) -> ReadinessResult<PermissionStatus> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.slow_checks.lock().unwrap().pop_front();
        if let Some((delay, status)) = scripted {
            tokio::time::sleep(delay).await;
            return Ok(status);
        }
        self.status.lock().unwrap().clone()
    }

    async fn request_notifications(
        &self,
        kinds: &[PermissionKind],
    ) -> ReadinessResult<PermissionStatus> {
        self.request_calls.fetch_add(1, Ordering::SeqCst);
        self.requested_kinds.lock().unwrap().push(kinds.to_vec());
        let result = self.request_result.lock().unwrap().clone();
        if let Ok(status) = result {
            *self.status.lock().unwrap() = Ok(status);
        }
        result
    }

    async fn open_settings(&self, link: &SettingsLink) -> ReadinessResult<()> {
        if self.fail_settings.load(Ordering::SeqCst) {
            return Err(settings_unavailable("no activity to open settings"));
        }
        self.opened_settings.lock().unwrap().push(link.clone());
        Ok(())
    }
}

type Registry<T> = Arc<Mutex<Vec<(usize, T)>>>;

fn remove_on_unsubscribe<T: Send + 'static>(registry: &Registry<T>, id: usize) -> Unsubscribe {
    let registry = Arc::clone(registry);
    Box::new(move || {
        registry.lock().unwrap().retain(|(entry, _)| *entry != id);
        Ok(())
    })
}

#[derive(Default)]
pub struct FakePushChannel {
    token_results: Mutex<VecDeque<ReadinessResult<String>>>,
    fetch_delay: Mutex<Duration>,
    pub get_token_calls: AtomicUsize,
    next_id: AtomicUsize,
    rotate_listeners: Registry<TokenListener>,
    foreground: Registry<MessageHandler>,
    background: Registry<MessageHandler>,
    pub fail_registrations: AtomicBool,
}

impl FakePushChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues results for successive `get_token` calls; an empty queue yields "".
    pub fn script_tokens<I>(&self, results: I)
    where
        I: IntoIterator<Item = ReadinessResult<String>>,
    {
        self.token_results.lock().unwrap().extend(results);
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap() = delay;
    }

    pub fn fetches(&self) -> usize {
        self.get_token_calls.load(Ordering::SeqCst)
    }

    pub fn rotate(&self, token: &str) {
        let listeners: Vec<_> = self
            .rotate_listeners
            .lock()
            .unwrap()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(token.to_string());
        }
    }

    pub fn rotate_listener_count(&self) -> usize {
        self.rotate_listeners.lock().unwrap().len()
    }

    pub fn has_foreground_handler(&self) -> bool {
        !self.foreground.lock().unwrap().is_empty()
    }

    pub fn has_background_handler(&self) -> bool {
        !self.background.lock().unwrap().is_empty()
    }

    pub async fn deliver_foreground(&self, payload: MessagePayload) {
        let handler = latest(&self.foreground);
        if let Some(handler) = handler {
            handler(payload).await;
        }
    }

    pub async fn deliver_background(&self, payload: MessagePayload) {
        let handler = latest(&self.background);
        if let Some(handler) = handler {
            handler(payload).await;
        }
    }

    fn register<T: Send + 'static>(
        &self,
        registry: &Registry<T>,
        what: &str,
        entry: T,
        replace: bool,
    ) -> ReadinessResult<Unsubscribe> {
        if self.fail_registrations.load(Ordering::SeqCst) {
            return Err(subscribe_failed(format!("{what} registration rejected")));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        {
            let mut guard = registry.lock().unwrap();
            if replace {
                guard.clear();
            }
            guard.push((id, entry));
        }
        Ok(remove_on_unsubscribe(registry, id))
    }
}

fn latest(registry: &Registry<MessageHandler>) -> Option<MessageHandler> {
    registry
        .lock()
        .unwrap()
        .last()
        .map(|(_, handler)| handler.clone())
}

#[async_trait]
impl PushChannel for FakePushChannel {
    async fn get_token(&self) -> ReadinessResult<String> {
        self.get_token_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.fetch_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let next = self.token_results.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(String::new()))
    }

    fn on_token_rotate(&self, listener: TokenListener) -> ReadinessResult<Unsubscribe> {
        self.register(&self.rotate_listeners, "token refresh", listener, false)
    }

    fn set_foreground_handler(&self, handler: MessageHandler) -> ReadinessResult<Unsubscribe> {
        self.register(&self.foreground, "foreground handler", handler, true)
    }

    fn set_background_handler(&self, handler: MessageHandler) -> ReadinessResult<Unsubscribe> {
        self.register(&self.background, "background handler", handler, true)
    }
}

#[derive(Default)]
pub struct FakePresenter {
    pub channels: Mutex<Vec<NotificationChannel>>,
    pub shown: Mutex<Vec<NotificationRequest>>,
    pub fail_show: AtomicBool,
    pub fail_channel: AtomicBool,
}

impl FakePresenter {
    pub fn shown(&self) -> Vec<NotificationRequest> {
        self.shown.lock().unwrap().clone()
    }

    pub fn channels(&self) -> Vec<NotificationChannel> {
        self.channels.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationPresenter for FakePresenter {
    async fn create_channel(&self, channel: &NotificationChannel) -> ReadinessResult<()> {
        if self.fail_channel.load(Ordering::SeqCst) {
            return Err(channel_setup_failed("notification manager unavailable"));
        }
        let mut channels = self.channels.lock().unwrap();
        if !channels.iter().any(|existing| existing.id == channel.id) {
            channels.push(channel.clone());
        }
        Ok(())
    }

    async fn show(&self, request: NotificationRequest) -> ReadinessResult<()> {
        if self.fail_show.load(Ordering::SeqCst) {
            return Err(presentation_failed("posting notification failed"));
        }
        self.shown.lock().unwrap().push(request);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeClipboard {
    pub texts: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

impl ClipboardSink for FakeClipboard {
    fn set_text(&self, text: &str) -> ReadinessResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(clipboard_failed("clipboard service unavailable"));
        }
        self.texts.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeLifecycle {
    next_id: AtomicUsize,
    listeners: Registry<AppStateListener>,
}

impl FakeLifecycle {
    pub fn emit(&self, state: AppState) {
        let listeners: Vec<_> = self
            .listeners
            .lock()
            .unwrap()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(state);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }
}

impl AppLifecycle for FakeLifecycle {
    fn subscribe(&self, listener: AppStateListener) -> ReadinessResult<Unsubscribe> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.listeners.lock().unwrap().push((id, listener));
        Ok(remove_on_unsubscribe(&self.listeners, id))
    }
}

/// One fake of every platform service, with typed handles for assertions.
pub struct FakePlatform {
    pub permissions: Arc<FakePermissionService>,
    pub push: Arc<FakePushChannel>,
    pub presenter: Arc<FakePresenter>,
    pub clipboard: Arc<FakeClipboard>,
    pub lifecycle: Arc<FakeLifecycle>,
}

impl FakePlatform {
    pub fn new(status: PermissionStatus) -> Self {
        Self {
            permissions: Arc::new(FakePermissionService::new(status)),
            push: Arc::new(FakePushChannel::new()),
            presenter: Arc::new(FakePresenter::default()),
            clipboard: Arc::new(FakeClipboard::default()),
            lifecycle: Arc::new(FakeLifecycle::default()),
        }
    }

    pub fn services(&self) -> PlatformServices {
        PlatformServices {
            permissions: self.permissions.clone(),
            push: self.push.clone(),
            presenter: self.presenter.clone(),
            clipboard: self.clipboard.clone(),
            lifecycle: self.lifecycle.clone(),
        }
    }
}
