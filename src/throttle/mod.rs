//! Throttle: run a function at most once per time window.
//!
//! Calls that arrive inside the window are deferred, not discarded: the
//! first of them is scheduled to run when the window closes, and any further
//! calls before it fires are dropped. Callers that did not execute get the
//! most recent stored result.
//!
//! ```
//! use std::time::Duration;
//! use function_helpers::throttle::throttle;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> function_helpers::error::Result<()> {
//! let save = throttle(|n: u32| n * 10, Duration::from_millis(200))?;
//!
//! assert_eq!(save.call(1), Some(10)); // runs now
//! assert_eq!(save.call(2), Some(10)); // deferred, stale result
//! # Ok(())
//! # }
//! ```

pub mod scheduler;

pub use scheduler::{DeferredTask, Scheduler, TokioScheduler};

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::error::Result;

/// What a single throttled call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation<R> {
    /// The function ran synchronously and produced this result.
    Executed(R),
    /// A deferred execution was scheduled; carries the stale result.
    Deferred(Option<R>),
    /// A deferred execution was already pending; the arguments were dropped.
    Dropped(Option<R>),
}

impl<R> Invocation<R> {
    /// The value handed back to the caller.
    pub fn into_result(self) -> Option<R> {
        match self {
            Self::Executed(result) => Some(result),
            Self::Deferred(stale) | Self::Dropped(stale) => stale,
        }
    }

    pub fn is_executed(&self) -> bool {
        matches!(self, Self::Executed(_))
    }
}

/// A throttled function handle.
///
/// Clones share the same window, pending slot and stored result.
pub struct Throttle<A, R> {
    inner: Arc<ThrottleInner<A, R>>,
}

struct ThrottleInner<A, R> {
    func: Box<dyn Fn(A) -> R + Send + Sync>,
    wait: Duration,
    scheduler: Arc<dyn Scheduler>,
    state: Mutex<ThrottleState<R>>,
}

struct ThrottleState<R> {
    last_invocation: Option<Instant>,
    pending: bool,
    last_result: Option<R>,
}

/// Wrap `func` so it runs at most once per `wait`, deferring early calls on
/// the current Tokio runtime.
pub fn throttle<A, R, F>(func: F, wait: Duration) -> Result<Throttle<A, R>>
where
    A: Send + 'static,
    R: Clone + Send + 'static,
    F: Fn(A) -> R + Send + Sync + 'static,
{
    Ok(Throttle::with_scheduler(
        func,
        wait,
        TokioScheduler::current()?,
    ))
}

/// [`throttle`] with the window given in milliseconds.
pub fn throttle_millis<A, R, F>(func: F, wait_ms: u64) -> Result<Throttle<A, R>>
where
    A: Send + 'static,
    R: Clone + Send + 'static,
    F: Fn(A) -> R + Send + Sync + 'static,
{
    throttle(func, Duration::from_millis(wait_ms))
}

impl<A, R> Throttle<A, R>
where
    A: Send + 'static,
    R: Clone + Send + 'static,
{
    /// Create a throttle that hands deferred executions to `scheduler`.
    pub fn with_scheduler<F, S>(func: F, wait: Duration, scheduler: S) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
        S: Scheduler + 'static,
    {
        Self {
            inner: Arc::new(ThrottleInner {
                func: Box::new(func),
                wait,
                scheduler: Arc::new(scheduler),
                state: Mutex::new(ThrottleState {
                    last_invocation: None,
                    pending: false,
                    last_result: None,
                }),
            }),
        }
    }

    /// Call the throttled function.
    ///
    /// Returns the fresh result when the function ran now, otherwise the
    /// most recent stored result (`None` if nothing has completed yet).
    pub fn call(&self, args: A) -> Option<R> {
        self.invoke(args).into_result()
    }

    /// Call the throttled function and report which path was taken.
    pub fn invoke(&self, args: A) -> Invocation<R> {
        let now = Instant::now();
        let mut state = self.inner.lock_state();
        let remaining = self.inner.remaining(state.last_invocation, now);

        if remaining.is_zero() {
            drop(state);
            let result = (self.inner.func)(args);
            let mut state = self.inner.lock_state();
            state.last_invocation = Some(now);
            state.last_result = Some(result.clone());
            return Invocation::Executed(result);
        }

        let stale = state.last_result.clone();
        if state.pending {
            tracing::debug!(
                remaining_ms = remaining.as_millis() as u64,
                "Throttled call dropped; execution already pending"
            );
            return Invocation::Dropped(stale);
        }

        state.pending = true;
        drop(state);

        tracing::debug!(
            remaining_ms = remaining.as_millis() as u64,
            "Deferring throttled call"
        );
        let inner = Arc::clone(&self.inner);
        self.inner
            .scheduler
            .schedule(remaining, Box::new(move || inner.run_deferred(args)));

        Invocation::Deferred(stale)
    }

    /// The throttle window.
    pub fn wait(&self) -> Duration {
        self.inner.wait
    }

    /// Whether a deferred execution is scheduled and has not started yet.
    pub fn is_pending(&self) -> bool {
        self.inner.lock_state().pending
    }

    /// The most recent result, from an immediate or a deferred execution.
    pub fn last_result(&self) -> Option<R> {
        self.inner.lock_state().last_result.clone()
    }
}

impl<A, R> ThrottleInner<A, R> {
    fn lock_state(&self) -> MutexGuard<'_, ThrottleState<R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remaining(&self, last_invocation: Option<Instant>, now: Instant) -> Duration {
        match last_invocation {
            Some(last) => self
                .wait
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    fn run_deferred(&self, args: A) {
        // Cleared first so a panicking body cannot wedge the pending slot.
        self.lock_state().pending = false;
        tracing::debug!(wait_ms = self.wait.as_millis() as u64, "Running deferred call");

        let result = (self.func)(args);

        let mut state = self.lock_state();
        state.last_invocation = Some(Instant::now());
        state.last_result = Some(result);
    }
}

impl<A, R> Clone for Throttle<A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, R> fmt::Debug for Throttle<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock_state();
        f.debug_struct("Throttle")
            .field("wait", &self.inner.wait)
            .field("last_invocation", &state.last_invocation)
            .field("pending", &state.pending)
            .field("has_result", &state.last_result.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NeverScheduler;

    impl Scheduler for NeverScheduler {
        fn schedule(&self, _delay: Duration, _task: DeferredTask) {}
    }

    fn inner(wait: Duration) -> ThrottleInner<(), ()> {
        ThrottleInner {
            func: Box::new(|()| ()),
            wait,
            scheduler: Arc::new(NeverScheduler),
            state: Mutex::new(ThrottleState {
                last_invocation: None,
                pending: false,
                last_result: None,
            }),
        }
    }

    #[test]
    fn remaining_is_zero_without_a_prior_execution() {
        let inner = inner(Duration::from_millis(100));
        assert_eq!(inner.remaining(None, Instant::now()), Duration::ZERO);
    }

    #[test]
    fn remaining_counts_down_from_the_last_execution() {
        let inner = inner(Duration::from_millis(100));
        let last = Instant::now();
        let now = last + Duration::from_millis(30);

        assert_eq!(inner.remaining(Some(last), now), Duration::from_millis(70));
        assert_eq!(
            inner.remaining(Some(last), last + Duration::from_millis(250)),
            Duration::ZERO
        );
    }

    #[test]
    fn remaining_is_zero_for_a_zero_window() {
        let inner = inner(Duration::ZERO);
        let now = Instant::now();
        assert_eq!(inner.remaining(Some(now), now), Duration::ZERO);
    }

    #[test]
    fn invocation_into_result_returns_fresh_or_stale_value() {
        assert_eq!(Invocation::Executed(3).into_result(), Some(3));
        assert_eq!(Invocation::Deferred(Some(2)).into_result(), Some(2));
        assert_eq!(Invocation::<u8>::Dropped(None).into_result(), None);
        assert!(Invocation::Executed(()).is_executed());
        assert!(!Invocation::Deferred(Some(())).is_executed());
    }
}
