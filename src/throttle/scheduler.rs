//! Schedulers that run deferred throttle executions.

use std::time::Duration;

use tokio::runtime::Handle;

use crate::error::{HelperError, Result};

/// Deadline used when `now + delay` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// A deferred unit of work handed to a [`Scheduler`].
pub type DeferredTask = Box<dyn FnOnce() + Send + 'static>;

/// Runs a task once after a delay, without blocking the caller.
///
/// A panic raised by the task must not reach the code that scheduled it.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: DeferredTask);
}

/// Scheduler backed by a Tokio runtime: each task is a spawned timer.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Bind to the runtime the caller is running on.
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| HelperError::NoRuntime)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: DeferredTask) {
        // Deadline is fixed now, not when the spawned task is first polled.
        let now = tokio::time::Instant::now();
        let deadline = now
            .checked_add(delay)
            .unwrap_or_else(|| now + FAR_FUTURE);
        let job = self.handle.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            task();
        });

        self.handle.spawn(async move {
            if let Err(e) = job.await {
                if e.is_panic() {
                    tracing::warn!(
                        delay_ms = delay.as_millis() as u64,
                        "Deferred execution panicked; result discarded"
                    );
                }
            }
        });
    }
}
