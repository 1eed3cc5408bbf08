//! Convenience re-exports for common use.

pub use crate::config::HelpersConfig;
pub use crate::error::{HelperError, Result};
pub use crate::memoize::{memoize, memoize_with, Memoize};
pub use crate::namespace::{install, Helpers, InstallMode, Installation, Registry};
pub use crate::once::{once, Once};
pub use crate::throttle::{throttle, throttle_millis, Invocation, Scheduler, Throttle, TokioScheduler};
