//! Turn generated text into file changes on disk.
//!
//! Two input paths share one executor:
//! - [`extract::parse`] recovers files from loosely formatted text (fenced
//!   blocks, tagged blocks, comment or header markers) and never fails
//! - [`protocol::parse_strict`] reads the tagged response protocol and
//!   rejects the whole response on any broken rule
//!
//! [`execution::FileExecutor`] then applies the resulting actions inside a
//! base directory, one at a time, with backups and a dry-run mode.

pub mod config;
pub mod execution;
pub mod extract;
pub mod models;
pub mod protocol;
pub mod security;

pub use config::{ApplyConfig, ConfigError};
pub use execution::{ExecutionError, FileExecutor};
pub use extract::parse;
pub use models::*;
pub use protocol::{parse_strict, validate_response, ProtocolError};
pub use security::{PathValidator, PathViolation};

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "warn,codegen_apply=info";

/// Load a `.env` file from the current directory, falling back to the parent
/// directory. Missing files are not an error.
pub fn load_env() {
    if dotenvy::dotenv().is_err() {
        let _ = dotenvy::from_path("../.env");
    }
}

/// Install a fmt subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .try_init();
}
