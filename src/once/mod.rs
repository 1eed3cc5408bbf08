//! Once: run a function on the first call only and cache its result.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{HelperError, Result};

type OnceFn<A, R> = Box<dyn FnOnce(A) -> R + Send>;

/// A function that executes at most once.
///
/// The first [`call`](Once::call) runs the body; every later call returns a
/// clone of the first result and ignores its arguments. Clones share state.
///
/// If the body panics, the wrapper is still marked as run and every later
/// call returns [`HelperError::OncePoisoned`]. The body is never retried.
pub struct Once<A, R> {
    state: Arc<Mutex<OnceState<A, R>>>,
}

enum OnceState<A, R> {
    Ready(OnceFn<A, R>),
    Running,
    Complete(R),
    Poisoned,
}

impl<A, R: Clone> OnceState<A, R> {
    fn take_ready(&mut self) -> Option<OnceFn<A, R>> {
        if !matches!(self, Self::Ready(_)) {
            return None;
        }
        match std::mem::replace(self, Self::Running) {
            Self::Ready(func) => Some(func),
            _ => None,
        }
    }

    fn cached(&self) -> Result<R> {
        match self {
            Self::Complete(result) => Ok(result.clone()),
            Self::Poisoned => Err(HelperError::OncePoisoned),
            Self::Ready(_) | Self::Running => Err(HelperError::OnceInProgress),
        }
    }
}

/// Wrap `func` so its body runs only on the first call.
///
/// ```
/// use function_helpers::once::once;
///
/// let init = once(|seed: u64| seed * 2);
/// assert_eq!(init.call(21).unwrap(), 42);
/// assert_eq!(init.call(7).unwrap(), 42);
/// ```
pub fn once<A, R, F>(func: F) -> Once<A, R>
where
    F: FnOnce(A) -> R + Send + 'static,
{
    Once {
        state: Arc::new(Mutex::new(OnceState::Ready(Box::new(func)))),
    }
}

impl<A, R: Clone> Once<A, R> {
    /// Run the body on the first call, otherwise return the cached result.
    ///
    /// Returns [`HelperError::OnceInProgress`] when called while the first
    /// execution is still running, e.g. re-entrantly from inside the body.
    pub fn call(&self, args: A) -> Result<R> {
        let func = {
            let mut state = self.lock_state();
            match state.take_ready() {
                Some(func) => func,
                None => return state.cached(),
            }
        };

        let guard = PoisonOnUnwind { state: &self.state };
        let result = func(args);
        *self.lock_state() = OnceState::Complete(result.clone());
        drop(guard);

        Ok(result)
    }

    /// The cached result, if the first execution completed.
    pub fn get(&self) -> Option<R> {
        self.lock_state().cached().ok()
    }
}

impl<A, R> Once<A, R> {
    /// Whether the first call has happened, whatever its outcome.
    pub fn has_run(&self) -> bool {
        !matches!(*self.lock_state(), OnceState::Ready(_))
    }

    pub fn is_poisoned(&self) -> bool {
        matches!(*self.lock_state(), OnceState::Poisoned)
    }

    fn lock_state(&self) -> MutexGuard<'_, OnceState<A, R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Marks the wrapper poisoned if the body unwinds before completing.
struct PoisonOnUnwind<'a, A, R> {
    state: &'a Mutex<OnceState<A, R>>,
}

impl<A, R> Drop for PoisonOnUnwind<'_, A, R> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*state, OnceState::Running) {
            *state = OnceState::Poisoned;
            tracing::warn!("Once body panicked; wrapper poisoned");
        }
    }
}

impl<A, R> Clone for Once<A, R> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<A, R> fmt::Debug for Once<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match *self.lock_state() {
            OnceState::Ready(_) => "ready",
            OnceState::Running => "running",
            OnceState::Complete(_) => "complete",
            OnceState::Poisoned => "poisoned",
        };
        f.debug_struct("Once").field("status", &status).finish()
    }
}
