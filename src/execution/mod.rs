//! File Operation Executor Module
//!
//! Applies validated file actions to a directory tree with containment
//! checks, best-effort backups and a side-effect-free dry run.

pub mod backup;
pub mod executor;

pub use backup::{backup_path_for, create_backup};
pub use executor::{ExecutionError, FileExecutor};
