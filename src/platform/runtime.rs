use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use futures::future::{select, Either};

use crate::logger::Logger;

static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new("push-readiness/runtime"));

/// Spawns an async task that runs in the background.
///
/// Uses the ambient Tokio runtime when one is entered. Otherwise the task gets its own
/// thread driving a single-threaded runtime until the task completes.
pub fn spawn_detached<F>(future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    use tokio::runtime::{Builder, Handle};

    if let Ok(handle) = Handle::try_current() {
        handle.spawn(future);
        return;
    }
    std::thread::spawn(move || match Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime.block_on(future),
        Err(err) => LOGGER.error(format!("Failed to build background runtime: {err}")),
    });
}

/// Asynchronously waits for the provided duration.
pub async fn sleep(duration: Duration) {
    if duration.is_zero() {
        return;
    }
    tokio::time::sleep(duration).await;
}

/// One-shot cancellation signal shared between an owner and its pending work.
///
/// Cancelling wakes every task parked in [`Cancellation::cancelled`] right away,
/// so timers guarded by [`sleep_unless_cancelled`] do not outlive their owner.
#[derive(Clone, Debug)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
    sender: async_channel::Sender<()>,
    receiver: async_channel::Receiver<()>,
}

impl Cancellation {
    pub fn new() -> Self {
        let (sender, receiver) = async_channel::bounded(1);
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            sender,
            receiver,
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.sender.close();
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Resolves once [`Cancellation::cancel`] has been called.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        // Nothing is ever sent; `recv` only returns once the channel is closed.
        let _ = self.receiver.recv().await;
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

/// Sleeps for `duration` unless `cancellation` fires first.
///
/// Returns `true` when the full duration elapsed and the signal is still clear.
pub async fn sleep_unless_cancelled(duration: Duration, cancellation: &Cancellation) -> bool {
    if cancellation.is_cancelled() {
        return false;
    }
    let timer = Box::pin(sleep(duration));
    let cancelled = Box::pin(cancellation.cancelled());
    match select(timer, cancelled).await {
        Either::Left(_) => !cancellation.is_cancelled(),
        Either::Right(_) => false,
    }
}
