use std::fmt;

use crate::messaging::logger::LOGGER;
use crate::messaging::types::Unsubscribe;

/// Disposer for a platform registration.
///
/// Releasing is idempotent and also happens on drop. Cleanup failures are logged,
/// never returned, so teardown paths cannot fail.
pub struct Subscription {
    label: &'static str,
    cleanup: Option<Unsubscribe>,
}

impl Subscription {
    pub fn new(label: &'static str, cleanup: Unsubscribe) -> Self {
        Self {
            label,
            cleanup: Some(cleanup),
        }
    }

    /// A subscription with nothing to release, used when registration failed.
    pub fn noop(label: &'static str) -> Self {
        Self {
            label,
            cleanup: None,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn is_active(&self) -> bool {
        self.cleanup.is_some()
    }

    /// Gives up the handle without releasing the registration.
    pub fn detach(mut self) {
        self.cleanup.take();
    }

    pub fn unsubscribe(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            if let Err(err) = cleanup() {
                LOGGER.error(format!("Error unsubscribing from {}: {err}", self.label));
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("label", &self.label)
            .field("active", &self.is_active())
            .finish()
    }
}
