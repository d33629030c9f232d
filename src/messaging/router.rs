use std::sync::Arc;

use futures::future::BoxFuture;

use crate::messaging::logger::LOGGER;
use crate::messaging::platform::{NotificationPresenter, PushChannel};
use crate::messaging::settings::ReadinessSettings;
use crate::messaging::subscription::Subscription;
use crate::messaging::types::{
    MessageHandler, MessagePayload, NotificationChannel, NotificationRequest,
};

/// Which handler received a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryPath {
    Foreground,
    Background,
}

impl DeliveryPath {
    fn label(self) -> &'static str {
        match self {
            DeliveryPath::Foreground => "foreground",
            DeliveryPath::Background => "background",
        }
    }
}

/// Handler registrations made by [`MessageRouter::register`].
#[derive(Debug)]
pub struct RouterRegistration {
    pub foreground: Subscription,
    pub background: Subscription,
}

/// Turns inbound push messages into local notifications on a pre-created channel.
pub struct MessageRouter {
    presenter: Arc<dyn NotificationPresenter>,
    channel: NotificationChannel,
    requires_channel: bool,
    fallback_title: String,
}

impl MessageRouter {
    pub fn new(presenter: Arc<dyn NotificationPresenter>, settings: &ReadinessSettings) -> Self {
        Self {
            presenter,
            channel: settings.channel().clone(),
            requires_channel: settings.target().requires_channel(),
            fallback_title: settings.fallback_title().to_string(),
        }
    }

    pub fn channel(&self) -> &NotificationChannel {
        &self.channel
    }

    /// Creates the notification channel where the OS requires one.
    ///
    /// Repeating the call is harmless. Returns `false` when creation failed.
    pub async fn create_channel(&self) -> bool {
        if !self.requires_channel {
            return true;
        }
        match self.presenter.create_channel(&self.channel).await {
            Ok(()) => true,
            Err(err) => {
                LOGGER.error(format!(
                    "Failed to create notification channel '{}': {err}",
                    self.channel.id
                ));
                false
            }
        }
    }

    pub fn request_for(&self, message: &MessagePayload) -> NotificationRequest {
        NotificationRequest {
            title: message
                .title()
                .filter(|title| !title.is_empty())
                .unwrap_or(self.fallback_title.as_str())
                .to_string(),
            body: message.body().unwrap_or_default().to_string(),
            channel_id: self.channel.id.clone(),
        }
    }

    /// Presents `message` and waits until the presenter is done. Never fails.
    pub async fn present(&self, message: MessagePayload, path: DeliveryPath) {
        LOGGER.info(format!(
            "Push message received in the {} ({})",
            path.label(),
            message.message_id.as_deref().unwrap_or("no id")
        ));
        let request = self.request_for(&message);
        if let Err(err) = self.presenter.show(request).await {
            LOGGER.error(format!("Error handling {} message: {err}", path.label()));
        }
    }

    /// Installs the foreground and background handlers on `push`.
    ///
    /// A failed registration is logged and leaves an inactive subscription in its slot.
    pub fn register(self: &Arc<Self>, push: &dyn PushChannel) -> RouterRegistration {
        let foreground = push
            .set_foreground_handler(self.handler(DeliveryPath::Foreground))
            .map(|unsubscribe| Subscription::new("foreground messages", unsubscribe))
            .unwrap_or_else(|err| {
                LOGGER.error(format!("Error setting up foreground message handler: {err}"));
                Subscription::noop("foreground messages")
            });
        let background = push
            .set_background_handler(self.handler(DeliveryPath::Background))
            .map(|unsubscribe| Subscription::new("background messages", unsubscribe))
            .unwrap_or_else(|err| {
                LOGGER.error(format!("Error setting up background message handler: {err}"));
                Subscription::noop("background messages")
            });
        RouterRegistration {
            foreground,
            background,
        }
    }

    fn handler(self: &Arc<Self>, path: DeliveryPath) -> MessageHandler {
        let router = Arc::clone(self);
        Arc::new(move |payload: MessagePayload| -> BoxFuture<'static, ()> {
            let router = Arc::clone(&router);
            Box::pin(async move { router.present(payload, path).await })
        })
    }
}
