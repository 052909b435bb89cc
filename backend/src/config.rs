//! Run configuration.
//!
//! Values come from built-in defaults, then the environment (a `.env` file
//! is loaded first if present), then command-line flags.

use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::transform::offer::DEFAULT_KEY;

/// Input workbook used when none is given.
pub const DEFAULT_INPUT: &str = "5.xlsx";

/// Directory holding run directories and the run logs.
pub const DEFAULT_BASE_DIR: &str = "daily";

/// Port for `promoload serve`.
pub const DEFAULT_PORT: u16 = 3000;

/// Largest accepted upload (50 MiB).
pub const MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

pub const ENV_INPUT: &str = "PROMOLOAD_INPUT";
pub const ENV_BASE_DIR: &str = "PROMOLOAD_BASE_DIR";
pub const ENV_KEY: &str = "PROMOLOAD_KEY";

/// Settings for one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub input: PathBuf,
    pub base_dir: PathBuf,
    pub key: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            base_dir: PathBuf::from(DEFAULT_BASE_DIR),
            key: DEFAULT_KEY,
        }
    }
}

impl RunConfig {
    /// Defaults overlaid with `PROMOLOAD_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try loading .env file
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(input) = lookup(ENV_INPUT).filter(|v| !v.trim().is_empty()) {
            config.input = PathBuf::from(input);
        }
        if let Some(base_dir) = lookup(ENV_BASE_DIR).filter(|v| !v.trim().is_empty()) {
            config.base_dir = PathBuf::from(base_dir);
        }
        if let Some(key) = lookup(ENV_KEY) {
            config.key = parse_key(ENV_KEY, &key)?;
        }

        Ok(config)
    }

    /// Apply command-line flags; `None` keeps the current value.
    pub fn with_overrides(
        mut self,
        input: Option<PathBuf>,
        base_dir: Option<PathBuf>,
        key: Option<u32>,
    ) -> Self {
        if let Some(input) = input {
            self.input = input;
        }
        if let Some(base_dir) = base_dir {
            self.base_dir = base_dir;
        }
        if let Some(key) = key {
            self.key = key;
        }
        self
    }
}

/// Key from the environment, falling back to the default.
pub fn key_from_env() -> Result<u32, ConfigError> {
    let _ = dotenvy::dotenv();
    match env::var(ENV_KEY) {
        Ok(value) => parse_key(ENV_KEY, &value),
        Err(_) => Ok(DEFAULT_KEY),
    }
}

fn parse_key(name: &'static str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
    })
}
