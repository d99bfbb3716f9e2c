//! File Operation Executor
//!
//! Applies [`FileAction`]s below a fixed base directory. Actions run one at a
//! time in input order and fail independently: a rejected action is recorded
//! in [`ExecutionResult::errors`] and the batch moves on. Earlier successful
//! actions are never rolled back.
//!
//! [`FileExecutor::dry_run`] shares the per-action checks with
//! [`FileExecutor::execute_all`], so a preview classifies every action the
//! way a real run would against the same filesystem state. Nothing guards the
//! gap between the two calls.

use super::backup::create_backup;
use crate::config::ApplyConfig;
use crate::models::{ExecutionResult, FileAction, FileOperation, ParsedFile, ParsedResponse};
use crate::security::{PathValidator, PathViolation};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Why a single action was refused or failed
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// Absolute path or `..` segment
    #[error("Security error: {0}")]
    UnsafePath(PathViolation),

    /// Resolves outside the base directory
    #[error("Security error: {0}")]
    OutsideBaseDir(PathViolation),

    #[error("File already exists: {0}")]
    AlreadyExists(String),

    #[error("File does not exist: {0}")]
    NotFound(String),

    #[error("Not a regular file: {0}")]
    NotAFile(String),

    #[error("{field} is required for {operation} operation")]
    MissingField {
        field: &'static str,
        operation: FileOperation,
    },

    #[error("Invalid base directory {path}: {reason}")]
    InvalidBaseDir { path: PathBuf, reason: String },

    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ExecutionError {
    pub fn io_error(action: &'static str, path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// Path-safety violations, as opposed to state or I/O failures
    pub fn is_security(&self) -> bool {
        matches!(
            self,
            ExecutionError::UnsafePath(_) | ExecutionError::OutsideBaseDir(_)
        )
    }
}

impl From<PathViolation> for ExecutionError {
    fn from(violation: PathViolation) -> Self {
        match violation {
            PathViolation::OutsideBase(_) => ExecutionError::OutsideBaseDir(violation),
            _ => ExecutionError::UnsafePath(violation),
        }
    }
}

/// How an accepted action shows up in the result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Created,
    Updated,
    Deleted,
}

/// A checked action, ready to apply
#[derive(Debug)]
enum Plan<'a> {
    Write {
        target: PathBuf,
        content: &'a str,
        outcome: Outcome,
    },
    Delete {
        target: PathBuf,
        backup: bool,
    },
    Rename {
        source: PathBuf,
        target: PathBuf,
    },
}

impl Plan<'_> {
    fn outcome(&self) -> Outcome {
        match self {
            Plan::Write { outcome, .. } => *outcome,
            Plan::Delete { .. } => Outcome::Deleted,
            // A rename changes an existing file; it is reported as an update
            Plan::Rename { .. } => Outcome::Updated,
        }
    }
}

/// What is currently at a resolved path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Existing {
    Missing,
    File,
    Symlink,
    Other,
}

/// Inspect `path` itself; a symlink (dangling or not) is reported as such
async fn probe(path: &Path) -> Existing {
    match tokio::fs::symlink_metadata(path).await {
        Ok(meta) if meta.file_type().is_symlink() => Existing::Symlink,
        Ok(meta) if meta.is_file() => Existing::File,
        Ok(_) => Existing::Other,
        Err(_) => Existing::Missing,
    }
}

fn record(result: &mut ExecutionResult, action: &FileAction, outcome: Outcome) {
    let path = action.path.clone();
    match outcome {
        Outcome::Created => result.files_created.push(path),
        Outcome::Updated => result.files_updated.push(path),
        Outcome::Deleted => result.files_deleted.push(path),
    }
}

/// Applies file actions inside one base directory
#[derive(Debug, Clone)]
pub struct FileExecutor {
    base_dir: PathBuf,
    backups: bool,
    dry_run: bool,
    clock: fn() -> DateTime<Utc>,
}

impl FileExecutor {
    /// Create an executor rooted at `base_dir`.
    ///
    /// The directory may not exist yet; it is resolved (symlinks included)
    /// once here and every action is contained in the resolved form.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self, ExecutionError> {
        let requested = base_dir.as_ref();
        let invalid = |reason: String| ExecutionError::InvalidBaseDir {
            path: requested.to_path_buf(),
            reason,
        };

        let resolved = PathValidator::resolve_base(requested).map_err(invalid)?;
        if resolved.exists() && !resolved.is_dir() {
            return Err(invalid("not a directory".to_string()));
        }

        Ok(Self {
            base_dir: resolved,
            backups: true,
            dry_run: false,
            clock: Utc::now,
        })
    }

    pub fn from_config(config: &ApplyConfig) -> Result<Self, ExecutionError> {
        Ok(Self::new(&config.base_dir)?
            .with_backups(config.backups)
            .with_dry_run(config.dry_run))
    }

    /// Toggle backups before UPDATE and DELETE (on by default)
    pub fn with_backups(mut self, enabled: bool) -> Self {
        self.backups = enabled;
        self
    }

    /// Make [`FileExecutor::run`] simulate instead of apply
    pub fn with_dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Fixed timestamps for backup names
    #[cfg(test)]
    fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn backups_enabled(&self) -> bool {
        self.backups
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf, ExecutionError> {
        Ok(PathValidator::resolve_within(&self.base_dir, relative)?)
    }

    /// Containment and pre-condition checks for one action
    async fn plan<'a>(&self, action: &'a FileAction) -> Result<Plan<'a>, ExecutionError> {
        let target = self.resolve(&action.path)?;
        let missing_field = |field| ExecutionError::MissingField {
            field,
            operation: action.operation,
        };

        match action.operation {
            FileOperation::Create => {
                let content = action.content.as_deref().ok_or_else(|| missing_field("content"))?;
                if probe(&target).await != Existing::Missing {
                    return Err(ExecutionError::AlreadyExists(action.path.clone()));
                }
                Ok(Plan::Write {
                    target,
                    content,
                    outcome: Outcome::Created,
                })
            }
            FileOperation::Update => {
                let content = action.content.as_deref().ok_or_else(|| missing_field("content"))?;
                let target = self.update_target(target, &action.path).await?;
                Ok(Plan::Write {
                    target,
                    content,
                    outcome: Outcome::Updated,
                })
            }
            FileOperation::Delete => match probe(&target).await {
                Existing::File => Ok(Plan::Delete {
                    target,
                    backup: true,
                }),
                // The link itself goes; its target is left alone
                Existing::Symlink => Ok(Plan::Delete {
                    target,
                    backup: false,
                }),
                Existing::Missing => Err(ExecutionError::NotFound(action.path.clone())),
                Existing::Other => Err(ExecutionError::NotAFile(action.path.clone())),
            },
            FileOperation::Rename => {
                let old_path = action
                    .old_path
                    .as_deref()
                    .filter(|old| !old.trim().is_empty())
                    .ok_or_else(|| missing_field("oldPath"))?;
                let source = self.resolve(old_path)?;

                if probe(&source).await == Existing::Missing {
                    return Err(ExecutionError::NotFound(old_path.to_string()));
                }
                if probe(&target).await != Existing::Missing {
                    return Err(ExecutionError::AlreadyExists(action.path.clone()));
                }
                Ok(Plan::Rename { source, target })
            }
        }
    }

    /// Path an UPDATE writes to. A symlink is written through only when it
    /// resolves to a regular file inside the base directory.
    async fn update_target(&self, target: PathBuf, relative: &str) -> Result<PathBuf, ExecutionError> {
        match probe(&target).await {
            Existing::File => Ok(target),
            Existing::Missing => Err(ExecutionError::NotFound(relative.to_string())),
            Existing::Other => Err(ExecutionError::NotAFile(relative.to_string())),
            Existing::Symlink => {
                let real = tokio::fs::canonicalize(&target)
                    .await
                    .map_err(|_| ExecutionError::NotFound(relative.to_string()))?;
                PathValidator::ensure_within(&self.base_dir, &real).map_err(|_| {
                    ExecutionError::OutsideBaseDir(PathViolation::OutsideBase(relative.to_string()))
                })?;
                match probe(&real).await {
                    Existing::File => Ok(real),
                    _ => Err(ExecutionError::NotAFile(relative.to_string())),
                }
            }
        }
    }

    async fn ensure_parent(&self, target: &Path, relative: &str) -> Result<(), ExecutionError> {
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ExecutionError::io_error("create parent directories for", relative, e))?;
        }
        Ok(())
    }

    async fn backup(&self, target: &Path, warnings: &mut Vec<String>) {
        if !self.backups {
            return;
        }
        if let Err(warning) = create_backup(target, (self.clock)()).await {
            warnings.push(warning);
        }
    }

    /// Check and apply one action
    async fn apply(
        &self,
        action: &FileAction,
        warnings: &mut Vec<String>,
    ) -> Result<Outcome, ExecutionError> {
        let plan = self.plan(action).await?;
        let outcome = plan.outcome();

        match plan {
            Plan::Write {
                target,
                content,
                outcome,
            } => {
                self.ensure_parent(&target, &action.path).await?;
                if outcome == Outcome::Updated {
                    self.backup(&target, warnings).await;
                }
                tokio::fs::write(&target, content)
                    .await
                    .map_err(|e| ExecutionError::io_error("write", action.path.as_str(), e))?;
            }
            Plan::Delete { target, backup } => {
                self.ensure_parent(&target, &action.path).await?;
                if backup {
                    self.backup(&target, warnings).await;
                }
                tokio::fs::remove_file(&target)
                    .await
                    .map_err(|e| ExecutionError::io_error("delete", action.path.as_str(), e))?;
            }
            Plan::Rename { source, target } => {
                self.ensure_parent(&target, &action.path).await?;
                tokio::fs::rename(&source, &target)
                    .await
                    .map_err(|e| ExecutionError::io_error("rename", action.path.as_str(), e))?;
            }
        }

        tracing::debug!(
            operation = %action.operation,
            path = %action.path,
            "Applied file action"
        );
        Ok(outcome)
    }

    /// Apply every action in order.
    ///
    /// A failing action is recorded and skipped; the rest still run.
    /// `success` is false if any action failed. Backup problems only add
    /// warnings.
    pub async fn execute_all(&self, actions: &[FileAction]) -> ExecutionResult {
        let mut result = ExecutionResult::new();

        for action in actions {
            match self.apply(action, &mut result.warnings).await {
                Ok(outcome) => record(&mut result, action, outcome),
                Err(e) => {
                    tracing::warn!(
                        operation = %action.operation,
                        path = %action.path,
                        security = e.is_security(),
                        error = %e,
                        "File action rejected"
                    );
                    result.record_error(action, e.to_string());
                }
            }
        }

        tracing::info!(
            created = result.files_created.len(),
            updated = result.files_updated.len(),
            deleted = result.files_deleted.len(),
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "Executed file actions"
        );

        result
    }

    /// Classify every action as [`FileExecutor::execute_all`] would, without
    /// touching the filesystem.
    pub async fn dry_run(&self, actions: &[FileAction]) -> ExecutionResult {
        let mut result = ExecutionResult::new();

        for action in actions {
            match self.plan(action).await {
                Ok(plan) => record(&mut result, action, plan.outcome()),
                Err(e) => result.record_error(action, e.to_string()),
            }
        }

        tracing::info!(
            would_create = result.files_created.len(),
            would_update = result.files_updated.len(),
            would_delete = result.files_deleted.len(),
            errors = result.errors.len(),
            "Dry run complete"
        );

        result
    }

    /// Apply or simulate depending on the dry-run setting
    pub async fn run(&self, actions: &[FileAction]) -> ExecutionResult {
        if self.dry_run {
            self.dry_run(actions).await
        } else {
            self.execute_all(actions).await
        }
    }

    /// Turn loose parser output into full-content writes: CREATE for files
    /// that do not exist yet, UPDATE (with backup) for those that do.
    async fn actions_for(&self, files: &[ParsedFile]) -> Vec<FileAction> {
        let mut actions = Vec::with_capacity(files.len());
        for file in files {
            let exists = match self.resolve(&file.path) {
                Ok(target) => probe(&target).await != Existing::Missing,
                Err(_) => false,
            };
            actions.push(if exists {
                FileAction::update(file.path.clone(), file.content.clone())
            } else {
                file.to_create_action()
            });
        }
        actions
    }

    /// Write files recovered by [`crate::extract::parse`]
    pub async fn write_files(&self, files: &[ParsedFile]) -> ExecutionResult {
        let actions = self.actions_for(files).await;
        self.execute_all(&actions).await
    }

    /// Apply a validated structured response. Its commands are recorded for
    /// the caller, never run.
    pub async fn apply_response(&self, response: &ParsedResponse) -> ExecutionResult {
        let mut result = self.execute_all(&response.files).await;
        result.commands_executed = response.commands.clone().unwrap_or_default();
        result
    }

    /// Dry-run twin of [`FileExecutor::apply_response`]
    pub async fn preview_response(&self, response: &ParsedResponse) -> ExecutionResult {
        let mut result = self.dry_run(&response.files).await;
        result.commands_executed = response.commands.clone().unwrap_or_default();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::backup::backup_path_for;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn setup() -> (TempDir, FileExecutor) {
        let dir = tempdir().unwrap();
        let executor = FileExecutor::new(dir.path()).unwrap();
        (dir, executor)
    }

    fn backups_in(dir: &Path, name: &str) -> Vec<PathBuf> {
        let prefix = format!("{}.backup-", name);
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.file_name().unwrap().to_string_lossy().starts_with(&prefix))
            .collect()
    }

    #[tokio::test]
    async fn test_create_writes_file_and_parents() {
        let (dir, executor) = setup();
        let result = executor
            .execute_all(&[FileAction::create("src/deep/new.ts", "export {}")])
            .await;

        assert!(result.success);
        assert_eq!(result.files_created, vec!["src/deep/new.ts".to_string()]);
        assert_eq!(
            fs::read_to_string(dir.path().join("src/deep/new.ts")).unwrap(),
            "export {}"
        );
    }

    #[tokio::test]
    async fn test_create_existing_fails_without_stopping_batch() {
        let (dir, executor) = setup();
        fs::write(dir.path().join("taken.txt"), "old").unwrap();

        let result = executor
            .execute_all(&[
                FileAction::create("taken.txt", "new"),
                FileAction::create("fresh.txt", "hello"),
            ])
            .await;

        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].file, "taken.txt");
        assert_eq!(result.errors[0].operation, FileOperation::Create);
        assert!(result.errors[0].error.contains("already exists"));
        assert_eq!(result.files_created, vec!["fresh.txt".to_string()]);
        assert_eq!(fs::read_to_string(dir.path().join("taken.txt")).unwrap(), "old");
    }

    #[tokio::test]
    async fn test_update_takes_backup() {
        let (dir, executor) = setup();
        fs::write(dir.path().join("app.ts"), "v1").unwrap();

        let result = executor.execute_all(&[FileAction::update("app.ts", "v2")]).await;

        assert!(result.success);
        assert_eq!(result.files_updated, vec!["app.ts".to_string()]);
        assert_eq!(fs::read_to_string(dir.path().join("app.ts")).unwrap(), "v2");

        let backups = backups_in(dir.path(), "app.ts");
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read_to_string(&backups[0]).unwrap(), "v1");
    }

    fn fixed_clock() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[tokio::test]
    async fn test_failed_backup_is_only_a_warning() {
        let (dir, executor) = setup();
        let executor = executor.with_clock(fixed_clock);
        fs::write(dir.path().join("app.ts"), "v1").unwrap();
        fs::write(dir.path().join("old.ts"), "bye").unwrap();

        // A directory squatting on the backup names makes the copies fail
        for name in ["app.ts", "old.ts"] {
            let taken = backup_path_for(&executor.base_dir().join(name), fixed_clock());
            fs::create_dir_all(taken.join("occupied")).unwrap();
        }

        let result = executor
            .execute_all(&[FileAction::update("app.ts", "v2"), FileAction::delete("old.ts")])
            .await;

        assert!(result.success);
        assert!(result.errors.is_empty());
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[0].starts_with("Failed to create backup of"));
        assert_eq!(result.files_updated, vec!["app.ts".to_string()]);
        assert_eq!(result.files_deleted, vec!["old.ts".to_string()]);
        assert_eq!(fs::read_to_string(dir.path().join("app.ts")).unwrap(), "v2");
        assert!(!dir.path().join("old.ts").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_create_through_dangling_symlink_refused() {
        let (dir, executor) = setup();
        let outside = tempdir().unwrap();
        let escape = outside.path().join("pwned.txt");
        std::os::unix::fs::symlink(&escape, dir.path().join("evil.txt")).unwrap();

        let preview = executor.dry_run(&[FileAction::create("evil.txt", "escaped")]).await;
        let result = executor
            .execute_all(&[FileAction::create("evil.txt", "escaped")])
            .await;

        assert_eq!(preview.errors, result.errors);
        assert!(!result.success);
        assert!(result.errors[0].error.contains("already exists"));
        assert!(!escape.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_update_through_symlink_must_stay_inside() {
        let (dir, executor) = setup();
        let outside = tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), "secret").unwrap();
        std::os::unix::fs::symlink(outside.path().join("secret.txt"), dir.path().join("leak.txt"))
            .unwrap();
        std::os::unix::fs::symlink(outside.path().join("nothing.txt"), dir.path().join("dangling.txt"))
            .unwrap();
        fs::write(dir.path().join("real.ts"), "v1").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.ts"), dir.path().join("alias.ts")).unwrap();

        let result = executor
            .execute_all(&[
                FileAction::update("leak.txt", "overwritten"),
                FileAction::update("dangling.txt", "x"),
                FileAction::update("alias.ts", "v2"),
            ])
            .await;

        assert_eq!(result.errors.len(), 2);
        assert!(result.errors[0].error.starts_with("Security error"));
        assert!(result.errors[1].error.contains("does not exist"));
        assert!(!outside.path().join("nothing.txt").exists());
        assert_eq!(
            fs::read_to_string(outside.path().join("secret.txt")).unwrap(),
            "secret"
        );
        assert_eq!(result.files_updated, vec!["alias.ts".to_string()]);
        assert_eq!(fs::read_to_string(dir.path().join("real.ts")).unwrap(), "v2");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_delete_and_rename_act_on_the_link() {
        let (dir, executor) = setup();
        fs::write(dir.path().join("real.ts"), "body").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.ts"), dir.path().join("link.ts")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.ts"), dir.path().join("other.ts")).unwrap();

        let result = executor
            .execute_all(&[
                FileAction::delete("link.ts"),
                FileAction::rename("other.ts", "moved.ts"),
            ])
            .await;

        assert!(result.success, "{:?}", result.errors);
        assert_eq!(result.files_deleted, vec!["link.ts".to_string()]);
        assert!(fs::symlink_metadata(dir.path().join("link.ts")).is_err());
        assert!(fs::symlink_metadata(dir.path().join("other.ts")).is_err());
        assert!(fs::symlink_metadata(dir.path().join("moved.ts"))
            .unwrap()
            .file_type()
            .is_symlink());
        assert_eq!(fs::read_to_string(dir.path().join("real.ts")).unwrap(), "body");
        assert!(backups_in(dir.path(), "link.ts").is_empty());
    }

    #[tokio::test]
    async fn test_backups_can_be_disabled() {
        let (dir, executor) = setup();
        let executor = executor.with_backups(false);
        fs::write(dir.path().join("gone.txt"), "bye").unwrap();

        let result = executor.execute_all(&[FileAction::delete("gone.txt")]).await;

        assert!(result.success);
        assert_eq!(result.files_deleted, vec!["gone.txt".to_string()]);
        assert!(!dir.path().join("gone.txt").exists());
        assert!(backups_in(dir.path(), "gone.txt").is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_require_existing_file() {
        let (_dir, executor) = setup();
        let result = executor
            .execute_all(&[FileAction::update("nope.ts", "x"), FileAction::delete("nope.ts")])
            .await;

        assert_eq!(result.errors.len(), 2);
        assert!(result.errors.iter().all(|e| e.error.contains("does not exist")));
    }

    #[tokio::test]
    async fn test_rename_counts_as_update() {
        let (dir, executor) = setup();
        fs::write(dir.path().join("old.ts"), "body").unwrap();

        let result = executor
            .execute_all(&[FileAction::rename("old.ts", "lib/new.ts")])
            .await;

        assert!(result.success);
        assert_eq!(result.files_updated, vec!["lib/new.ts".to_string()]);
        assert!(!dir.path().join("old.ts").exists());
        assert_eq!(fs::read_to_string(dir.path().join("lib/new.ts")).unwrap(), "body");
    }

    #[tokio::test]
    async fn test_rename_preconditions() {
        let (dir, executor) = setup();
        fs::write(dir.path().join("a.ts"), "a").unwrap();
        fs::write(dir.path().join("b.ts"), "b").unwrap();

        let mut no_old_path = FileAction::rename("", "c.ts");
        no_old_path.old_path = None;

        let result = executor
            .execute_all(&[
                FileAction::rename("missing.ts", "c.ts"),
                FileAction::rename("a.ts", "b.ts"),
                no_old_path,
            ])
            .await;

        assert_eq!(result.errors.len(), 3);
        assert!(result.errors[0].error.contains("does not exist: missing.ts"));
        assert!(result.errors[1].error.contains("already exists: b.ts"));
        assert_eq!(result.errors[2].error, "oldPath is required for RENAME operation");
    }

    #[tokio::test]
    async fn test_security_errors_are_per_action() {
        let (dir, executor) = setup();
        let result = executor
            .execute_all(&[
                FileAction::create("../escape.txt", "x"),
                FileAction::create("/etc/evil.txt", "x"),
                FileAction::rename("../outside.txt", "inside.txt"),
                FileAction::create("ok.txt", "fine"),
            ])
            .await;

        assert_eq!(result.errors.len(), 3);
        assert!(result.errors.iter().all(|e| e.error.starts_with("Security error")));
        assert_eq!(result.files_created, vec!["ok.txt".to_string()]);
        assert!(!dir.path().parent().unwrap().join("escape.txt").exists());
    }

    #[tokio::test]
    async fn test_missing_content_is_an_error() {
        let (_dir, executor) = setup();
        let mut action = FileAction::create("a.txt", "");
        action.content = None;

        let result = executor.execute_all(&[action]).await;
        assert_eq!(result.errors[0].error, "content is required for CREATE operation");
    }

    #[tokio::test]
    async fn test_dry_run_classifies_without_writing() {
        let (dir, executor) = setup();
        fs::write(dir.path().join("existing.ts"), "v1").unwrap();

        let actions = [
            FileAction::create("new.ts", "x"),
            FileAction::update("existing.ts", "v2"),
            FileAction::delete("missing.ts"),
        ];
        let result = executor.dry_run(&actions).await;

        assert_eq!(result.files_created, vec!["new.ts".to_string()]);
        assert_eq!(result.files_updated, vec!["existing.ts".to_string()]);
        assert!(result.files_deleted.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert!(!result.success);

        assert!(!dir.path().join("new.ts").exists());
        assert_eq!(fs::read_to_string(dir.path().join("existing.ts")).unwrap(), "v1");
        assert!(backups_in(dir.path(), "existing.ts").is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_matches_real_run() {
        let (dir, executor) = setup();
        fs::write(dir.path().join("a.ts"), "a").unwrap();

        let actions = [
            FileAction::update("a.ts", "a2"),
            FileAction::create("a.ts", "dup"),
            FileAction::create("b.ts", "b"),
            FileAction::delete("../x"),
        ];
        let preview = executor.dry_run(&actions).await;
        let real = executor.execute_all(&actions).await;

        assert_eq!(preview.files_created, real.files_created);
        assert_eq!(preview.files_updated, real.files_updated);
        assert_eq!(preview.files_deleted, real.files_deleted);
        assert_eq!(preview.errors, real.errors);
    }

    #[tokio::test]
    async fn test_run_honors_dry_run_flag() {
        let (dir, executor) = setup();
        let executor = executor.with_dry_run(true);

        let result = executor.run(&[FileAction::create("a.txt", "x")]).await;
        assert_eq!(result.files_created, vec!["a.txt".to_string()]);
        assert!(!dir.path().join("a.txt").exists());
    }

    #[tokio::test]
    async fn test_write_files_creates_or_updates() {
        let (dir, executor) = setup();
        fs::write(dir.path().join("keep.py"), "old = 1").unwrap();

        let files = vec![
            ParsedFile::new("keep.py", "new = 2", Some("python".to_string())),
            ParsedFile::new("pkg/mod.py", "x = 3", Some("python".to_string())),
        ];
        let result = executor.write_files(&files).await;

        assert!(result.success);
        assert_eq!(result.files_updated, vec!["keep.py".to_string()]);
        assert_eq!(result.files_created, vec!["pkg/mod.py".to_string()]);
        assert_eq!(backups_in(dir.path(), "keep.py").len(), 1);
    }

    #[tokio::test]
    async fn test_apply_response_records_commands() {
        let (dir, executor) = setup();
        let response = ParsedResponse {
            summary: "Add file".to_string(),
            files: vec![FileAction::create("a.txt", "x")],
            commands: Some(vec!["npm install".to_string()]),
            warnings: None,
            metadata: None,
        };

        let preview = executor.preview_response(&response).await;
        assert_eq!(preview.commands_executed, vec!["npm install".to_string()]);
        assert!(!dir.path().join("a.txt").exists());

        let result = executor.apply_response(&response).await;
        assert!(result.success);
        assert_eq!(result.commands_executed, vec!["npm install".to_string()]);
        assert!(dir.path().join("a.txt").exists());
    }

    #[test]
    fn test_base_dir_must_be_a_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        assert!(matches!(
            FileExecutor::new(&file),
            Err(ExecutionError::InvalidBaseDir { .. })
        ));
    }

    #[test]
    fn test_security_classification() {
        let err: ExecutionError = PathViolation::ParentSegment("../a".to_string()).into();
        assert!(err.is_security());
        assert!(!ExecutionError::NotFound("a".to_string()).is_security());
    }
}
