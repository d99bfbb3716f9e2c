//! Timestamped backups taken before UPDATE and DELETE
//!
//! A backup is a plain copy next to the original:
//! `<path>.backup-<timestamp>`. Failing to take one never blocks the
//! mutation; it only produces a warning.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Timestamp layout used in backup names. Colons and dots are avoided so the
/// name is valid on every common filesystem.
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S-%3fZ";

/// Backup location for `path` taken at `now`
pub fn backup_path_for(path: &Path, now: DateTime<Utc>) -> PathBuf {
    let timestamp = now.format(BACKUP_TIMESTAMP_FORMAT);
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".backup-{}", timestamp));
    PathBuf::from(name)
}

/// Copy `path` to its backup location for time `now`.
///
/// # Returns
/// * `Ok(PathBuf)` - Where the copy was written
/// * `Err(String)` - Warning text describing why no backup exists
pub async fn create_backup(path: &Path, now: DateTime<Utc>) -> Result<PathBuf, String> {
    let backup = backup_path_for(path, now);

    match tokio::fs::copy(path, &backup).await {
        Ok(bytes) => {
            tracing::debug!(
                original = %path.display(),
                backup = %backup.display(),
                bytes,
                "Created backup"
            );
            Ok(backup)
        }
        Err(e) => {
            let warning = format!("Failed to create backup of {}: {}", path.display(), e);
            tracing::warn!(path = %path.display(), error = %e, "Backup failed, continuing");
            Err(warning)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn test_backup_path_format() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
            + chrono::Duration::milliseconds(42);
        let backup = backup_path_for(Path::new("/work/src/app.ts"), now);
        assert_eq!(
            backup,
            PathBuf::from("/work/src/app.ts.backup-2024-03-09T14-05-07-042Z")
        );
    }

    #[tokio::test]
    async fn test_create_backup_copies_content() {
        let dir = tempdir().unwrap();
        let original = dir.path().join("notes.txt");
        tokio::fs::write(&original, "before").await.unwrap();

        let backup = create_backup(&original, Utc::now()).await.unwrap();
        assert_eq!(tokio::fs::read_to_string(&backup).await.unwrap(), "before");
        assert!(backup
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("notes.txt.backup-"));
    }

    #[tokio::test]
    async fn test_missing_file_yields_warning() {
        let dir = tempdir().unwrap();
        let warning = create_backup(&dir.path().join("absent.txt"), Utc::now())
            .await
            .unwrap_err();
        assert!(warning.starts_with("Failed to create backup of"));
    }
}
