use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::messaging::logger::LOGGER;
use crate::messaging::platform::PushChannel;
use crate::messaging::subscription::Subscription;
use crate::messaging::types::{DeliveryToken, TokenListener};

const LABEL: &str = "token refresh";

/// Listens for out-of-band token rotation on the push channel.
pub struct RefreshSubscriber {
    channel: Arc<dyn PushChannel>,
}

impl RefreshSubscriber {
    pub fn new(channel: Arc<dyn PushChannel>) -> Self {
        Self { channel }
    }

    /// Calls `on_rotate` with every new non-blank token.
    ///
    /// Registration failures are logged and yield an inactive subscription. Once the
    /// returned subscription is released, late rotation events are dropped even if
    /// the platform still delivers them.
    pub fn subscribe<F>(&self, on_rotate: F) -> Subscription
    where
        F: Fn(DeliveryToken) + Send + Sync + 'static,
    {
        let active = Arc::new(AtomicBool::new(true));
        let gate = Arc::clone(&active);
        let listener: TokenListener = Arc::new(move |raw: String| {
            if !gate.load(Ordering::SeqCst) {
                return;
            }
            match DeliveryToken::new(raw) {
                Some(token) => {
                    LOGGER.info("Delivery token refreshed.");
                    on_rotate(token);
                }
                None => LOGGER.warn("Ignoring blank token from rotation event."),
            }
        });

        match self.channel.on_token_rotate(listener) {
            Ok(unsubscribe) => Subscription::new(
                LABEL,
                Box::new(move || {
                    active.store(false, Ordering::SeqCst);
                    unsubscribe()
                }),
            ),
            Err(err) => {
                LOGGER.error(format!("Failed to subscribe to token refresh: {err}"));
                Subscription::noop(LABEL)
            }
        }
    }
}
