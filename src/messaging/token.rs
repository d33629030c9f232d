use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_lock::Mutex as AsyncMutex;

use crate::messaging::constants::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_BACKOFF_MS};
use crate::messaging::logger::LOGGER;
use crate::messaging::platform::PushChannel;
use crate::messaging::types::DeliveryToken;
use crate::platform::runtime::{sleep_unless_cancelled, Cancellation};

/// Bounded retry with a fixed delay between attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
        }
    }
}

/// The current delivery token, shared by acquisition and rotation.
///
/// Only ever holds a non-blank token, so a failed fetch cannot clear it.
#[derive(Clone, Debug, Default)]
pub struct TokenCell {
    inner: Arc<Mutex<Option<DeliveryToken>>>,
}

impl TokenCell {
    pub fn get(&self) -> Option<DeliveryToken> {
        self.inner.lock().unwrap().clone()
    }

    /// Replaces the current token. Last write wins.
    pub fn store(&self, token: DeliveryToken) {
        *self.inner.lock().unwrap() = Some(token);
    }
}

#[derive(Default)]
struct RunRecord {
    completed: u64,
    outcome: Option<DeliveryToken>,
}

/// Fetches a delivery token from the push channel with bounded, fixed-delay retry.
///
/// At most one attempt sequence runs at a time. A call made while a sequence is in
/// flight waits for it and returns its outcome instead of starting another one.
pub struct TokenAcquirer {
    channel: Arc<dyn PushChannel>,
    policy: RetryPolicy,
    cell: TokenCell,
    cancellation: Cancellation,
    gate: AsyncMutex<()>,
    runs: Mutex<RunRecord>,
}

impl TokenAcquirer {
    pub fn new(
        channel: Arc<dyn PushChannel>,
        policy: RetryPolicy,
        cell: TokenCell,
        cancellation: Cancellation,
    ) -> Self {
        Self {
            channel,
            policy,
            cell,
            cancellation,
            gate: AsyncMutex::new(()),
            runs: Mutex::new(RunRecord::default()),
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn current(&self) -> Option<DeliveryToken> {
        self.cell.get()
    }

    /// Returns the acquired token, or `None` once every attempt failed or the
    /// acquirer was cancelled. Never fails.
    pub async fn acquire(&self) -> Option<DeliveryToken> {
        let observed = self.runs.lock().unwrap().completed;
        let _guard = self.gate.lock().await;
        {
            let runs = self.runs.lock().unwrap();
            if runs.completed != observed {
                LOGGER.debug("Token acquisition already completed while waiting; reusing result.");
                return runs.outcome.clone();
            }
        }

        let outcome = self.run_attempts().await;
        let mut runs = self.runs.lock().unwrap();
        runs.completed += 1;
        runs.outcome = outcome.clone();
        outcome
    }

    async fn run_attempts(&self) -> Option<DeliveryToken> {
        let max_attempts = self.policy.max_attempts;
        for attempt in 1..=max_attempts {
            if self.cancellation.is_cancelled() {
                LOGGER.debug("Token acquisition cancelled.");
                return None;
            }

            match self.channel.get_token().await {
                Ok(raw) => match DeliveryToken::new(raw) {
                    Some(token) => {
                        if self.cancellation.is_cancelled() {
                            return None;
                        }
                        self.cell.store(token.clone());
                        return Some(token);
                    }
                    None => LOGGER.log(format!(
                        "Push channel returned no token ({attempt}/{max_attempts})"
                    )),
                },
                Err(err) => LOGGER.error(format!("Error getting token: {err}")),
            }

            if attempt < max_attempts {
                LOGGER.info(format!("Retrying... ({attempt}/{max_attempts})"));
                if !sleep_unless_cancelled(self.policy.backoff, &self.cancellation).await {
                    LOGGER.debug("Token retry backoff cancelled.");
                    return None;
                }
            }
        }

        LOGGER.warn(format!(
            "Failed to get delivery token after {max_attempts} attempts."
        ));
        None
    }
}
