//! Configuration
//!
//! Settings come from environment variables, optionally seeded from a
//! `.env` file (see [`crate::load_env`]).
//!
//! | Variable                  | Default           |
//! |---------------------------|-------------------|
//! | `CODEGEN_APPLY_BASE_DIR`  | current directory |
//! | `CODEGEN_APPLY_BACKUPS`   | `true`            |
//! | `CODEGEN_APPLY_DRY_RUN`   | `false`           |

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const BASE_DIR_VAR: &str = "CODEGEN_APPLY_BASE_DIR";
pub const BACKUPS_VAR: &str = "CODEGEN_APPLY_BACKUPS";
pub const DRY_RUN_VAR: &str = "CODEGEN_APPLY_DRY_RUN";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid boolean for {key}: {value}")]
    InvalidBool { key: String, value: String },

    #[error("cannot determine current directory: {0}")]
    CurrentDir(String),
}

/// Executor settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyConfig {
    pub base_dir: PathBuf,
    pub backups: bool,
    pub dry_run: bool,
}

impl ApplyConfig {
    /// Defaults rooted at `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            backups: true,
            dry_run: false,
        }
    }

    /// Read settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let base_dir = match get(BASE_DIR_VAR) {
            Some(dir) => PathBuf::from(dir.trim()),
            None => std::env::current_dir().map_err(|e| ConfigError::CurrentDir(e.to_string()))?,
        };

        let backups = match get(BACKUPS_VAR) {
            Some(value) => parse_bool(BACKUPS_VAR, &value)?,
            None => true,
        };

        let dry_run = match get(DRY_RUN_VAR) {
            Some(value) => parse_bool(DRY_RUN_VAR, &value)?,
            None => false,
        };

        tracing::debug!(
            base_dir = %base_dir.display(),
            backups,
            dry_run,
            "Loaded apply configuration"
        );

        Ok(Self {
            base_dir,
            backups,
            dry_run,
        })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
