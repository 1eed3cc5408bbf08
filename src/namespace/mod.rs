//! The `Helpers` namespace object and how it is installed into a registry.
//!
//! Installation is an explicit call, never a load-time side effect:
//!
//! ```
//! use function_helpers::config::HelpersConfig;
//! use function_helpers::namespace::{install, Helpers, InstallMode, Registry};
//!
//! # fn main() -> function_helpers::error::Result<()> {
//! let registry = Registry::new();
//! registry.set("h", "someone else's value");
//!
//! let config = HelpersConfig::builder().install_mode(InstallMode::Global).build();
//! let installation = install(&registry, &config)?;
//! assert!(registry.get::<Helpers>("h").is_ok());
//!
//! let helpers = installation.no_conflict();
//! assert_eq!(*registry.get::<&str>("h")?, "someone else's value");
//! # let _ = helpers;
//! # Ok(())
//! # }
//! ```

pub mod registry;

pub use registry::{Entry, Registry};

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::config::HelpersConfig;
use crate::error::Result;
use crate::memoize::{self, Memoize};
use crate::once::{self, Once};
use crate::throttle::{self, Throttle};

/// How the namespace is published.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InstallMode {
    /// Published as the registry's module exports.
    Module,
    /// Registered as a factory resolved on first `require`.
    Define,
    /// Stored under a global name, keeping the previous value for restoration.
    Global,
}

impl InstallMode {
    /// Pick a mode from the registry's capabilities: module exports first,
    /// then definitions, then a plain global.
    pub fn detect(registry: &Registry) -> Self {
        if registry.has_module_exports() {
            Self::Module
        } else if registry.accepts_definitions() {
            Self::Define
        } else {
            Self::Global
        }
    }
}

/// Namespace object grouping the wrapping constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Helpers {
    default_wait: Duration,
}

impl Default for Helpers {
    fn default() -> Self {
        Self::new(&HelpersConfig::default())
    }
}

impl Helpers {
    pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    pub fn new(config: &HelpersConfig) -> Self {
        Self {
            default_wait: config.default_wait(),
        }
    }

    /// Window used by [`throttle_default`](Self::throttle_default).
    pub fn default_wait(&self) -> Duration {
        self.default_wait
    }

    pub fn throttle<A, R, F>(&self, func: F, wait: Duration) -> Result<Throttle<A, R>>
    where
        A: Send + 'static,
        R: Clone + Send + 'static,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        throttle::throttle(func, wait)
    }

    /// Throttle with the configured default window.
    pub fn throttle_default<A, R, F>(&self, func: F) -> Result<Throttle<A, R>>
    where
        A: Send + 'static,
        R: Clone + Send + 'static,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        throttle::throttle(func, self.default_wait)
    }

    pub fn once<A, R, F>(&self, func: F) -> Once<A, R>
    where
        F: FnOnce(A) -> R + Send + 'static,
    {
        once::once(func)
    }

    pub fn memoize<A, R, F>(&self, func: F) -> Memoize<A, A, R>
    where
        A: Clone + Eq + Hash + 'static,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        memoize::memoize(func)
    }

    pub fn memoize_with<A, K, R, F, KF>(&self, func: F, key_fn: KF) -> Memoize<A, K, R>
    where
        K: Eq + Hash,
        F: Fn(A) -> R + Send + Sync + 'static,
        KF: Fn(&A) -> K + Send + Sync + 'static,
    {
        memoize::memoize_with(func, key_fn)
    }
}

/// Handle returned by [`install`].
#[derive(Debug)]
pub struct Installation<'r> {
    registry: &'r Registry,
    mode: InstallMode,
    name: String,
    helpers: Arc<Helpers>,
    previous: Option<Entry>,
}

impl Installation<'_> {
    pub fn mode(&self) -> InstallMode {
        self.mode
    }

    /// Global name or definition name the namespace was installed under.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn helpers(&self) -> Arc<Helpers> {
        Arc::clone(&self.helpers)
    }

    /// Value that occupied the slot before this installation, if any.
    pub fn previous(&self) -> Option<&Entry> {
        self.previous.as_ref()
    }

    /// Give the slot back to its previous occupant and return the namespace.
    ///
    /// For a global install the previous value is restored, or the name is
    /// cleared when there was none. Module exports are restored the same
    /// way. A definition has nothing to restore and is left in place.
    pub fn no_conflict(self) -> Arc<Helpers> {
        match self.mode {
            InstallMode::Global => {
                self.registry.replace(&self.name, self.previous);
                tracing::debug!(name = %self.name, "Restored previous global");
            }
            InstallMode::Module => {
                if let Err(e) = self.registry.replace_exports(self.previous) {
                    tracing::warn!(error = %e, "Could not restore module exports");
                }
            }
            InstallMode::Define => {}
        }
        self.helpers
    }
}

/// Install the namespace into `registry` according to `config`.
///
/// The mode comes from `config.install_mode`, or is detected from the
/// registry when unset. A forced mode the registry cannot host is a
/// configuration error.
pub fn install<'r>(registry: &'r Registry, config: &HelpersConfig) -> Result<Installation<'r>> {
    config.validate()?;

    let mode = config
        .install_mode
        .unwrap_or_else(|| InstallMode::detect(registry));
    let name = config.global_name.trim().to_string();
    let helpers = Arc::new(Helpers::new(config));

    let previous = match mode {
        InstallMode::Module => registry.replace_exports(Some(helpers.clone() as Entry))?,
        InstallMode::Define => {
            let shared = Arc::clone(&helpers);
            registry.define(&name, move || Helpers::clone(&shared))?;
            None
        }
        InstallMode::Global => registry.replace(&name, Some(helpers.clone() as Entry)),
    };

    tracing::debug!(
        mode = %mode,
        name = %name,
        replaced = previous.is_some(),
        "Installed helpers namespace"
    );

    Ok(Installation {
        registry,
        mode,
        name,
        helpers,
        previous,
    })
}

/// Install into [`Registry::global`] using [`HelpersConfig::global`].
pub fn install_global() -> Result<Installation<'static>> {
    install(Registry::global(), HelpersConfig::global())
}

impl From<InstallMode> for HelpersConfig {
    fn from(mode: InstallMode) -> Self {
        HelpersConfig {
            install_mode: Some(mode),
            ..HelpersConfig::default()
        }
    }
}

