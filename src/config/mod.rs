//! Configuration system (layered: defaults < config file < env).

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::{HelperError, Result};
use crate::namespace::InstallMode;

/// Global default config (lazy-initialized from file and env).
static DEFAULT_CONFIG: OnceLock<HelpersConfig> = OnceLock::new();

pub const DEFAULT_WAIT_MS: u64 = 100;
pub const DEFAULT_GLOBAL_NAME: &str = "h";

pub const ENV_WAIT_MS: &str = "FUNCTION_HELPERS_WAIT_MS";
pub const ENV_GLOBAL_NAME: &str = "FUNCTION_HELPERS_GLOBAL_NAME";
pub const ENV_INSTALL_MODE: &str = "FUNCTION_HELPERS_INSTALL_MODE";

/// Settings for the namespace and its default throttle window.
///
/// Every field may be omitted from a config file:
///
/// ```toml
/// default_wait_ms = 250
/// global_name = "helpers"
/// install_mode = "global"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct HelpersConfig {
    /// Window for `Helpers::throttle_default`, in milliseconds.
    #[builder(default = DEFAULT_WAIT_MS)]
    pub default_wait_ms: u64,
    /// Name used by global installs.
    #[builder(default = DEFAULT_GLOBAL_NAME.to_string(), into)]
    pub global_name: String,
    /// Forced install mode; detected from the registry when unset.
    pub install_mode: Option<InstallMode>,
}

impl Default for HelpersConfig {
    fn default() -> Self {
        Self {
            default_wait_ms: DEFAULT_WAIT_MS,
            global_name: DEFAULT_GLOBAL_NAME.to_string(),
            install_mode: None,
        }
    }
}

impl HelpersConfig {
    /// Parse a TOML config file. Missing fields keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by environment variables (after loading `.env`).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::default().with_env_overrides()
    }

    /// Full resolution: defaults, then the default config file if it
    /// exists, then environment variables.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let path = Self::default_path();
        let base = if path.is_file() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        base.with_env_overrides()
    }

    /// Get (or create) the global default config.
    ///
    /// A config that fails to load is logged and replaced by the defaults.
    pub fn global() -> &'static HelpersConfig {
        DEFAULT_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default helpers config");
                Self::default()
            })
        })
    }

    /// `~/.function-helpers/config.toml`.
    pub fn default_path() -> PathBuf {
        default_config_dir().join("config.toml")
    }

    /// Apply `FUNCTION_HELPERS_*` variables on top of this config.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(raw) = std::env::var(ENV_WAIT_MS) {
            self.default_wait_ms = raw.trim().parse().map_err(|_| {
                HelperError::Configuration(format!("{ENV_WAIT_MS} is not a millisecond count: {raw}"))
            })?;
        }
        if let Ok(name) = std::env::var(ENV_GLOBAL_NAME) {
            self.global_name = name;
        }
        if let Ok(raw) = std::env::var(ENV_INSTALL_MODE) {
            let mode = InstallMode::from_str(raw.trim()).map_err(|_| {
                HelperError::Configuration(format!("{ENV_INSTALL_MODE} has unknown mode: {raw}"))
            })?;
            self.install_mode = Some(mode);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.global_name.trim().is_empty() {
            return Err(HelperError::Configuration(
                "global_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn default_wait(&self) -> Duration {
        Duration::from_millis(self.default_wait_ms)
    }
}

fn default_config_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".function-helpers"))
        .unwrap_or_else(|| PathBuf::from(".function-helpers"))
}
