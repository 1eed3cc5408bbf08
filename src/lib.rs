//! function-helpers: generic function wrappers
//!
//! Three independent wrappers, each owning its private state:
//!
//! - [`throttle`](throttle::throttle): run at most once per time window,
//!   deferring early calls instead of dropping them.
//! - [`once`](once::once): run the body on the first call only.
//! - [`memoize`](memoize::memoize): cache results per derived key.
//!
//! The [`namespace`] module groups them into a [`Helpers`](namespace::Helpers)
//! object that can be installed into a named [`Registry`](namespace::Registry).
//!
//! # Quick Start
//!
//! ```
//! use function_helpers::prelude::*;
//!
//! let double = memoize(|x: i64| x * 2);
//! assert_eq!(double.call(3), 6);
//!
//! let init = once(|()| "ready");
//! assert_eq!(init.call(()).unwrap(), "ready");
//! ```

pub mod config;
pub mod error;
pub mod memoize;
pub mod namespace;
pub mod once;
pub mod prelude;
pub mod throttle;
