//! Path safety
//!
//! Two layers guard every path that reaches the filesystem:
//! - a lexical rule on the path text: relative, no `..` segment
//! - containment: once resolved against the base directory (following any
//!   symlinks among the parent directories that already exist), the path must
//!   sit strictly below the resolved base directory. The final component is
//!   never followed.
//!
//! The structured protocol validator applies the lexical rule; the executor
//! applies both.

use std::path::{Component, Path, PathBuf};

/// Why a path was refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathViolation {
    #[error("path is empty")]
    Empty,

    #[error("path {0} must be relative")]
    Absolute(String),

    #[error("path {0} contains a parent-directory segment")]
    ParentSegment(String),

    #[error("path {0} is outside base directory")]
    OutsideBase(String),
}

/// Security validator for paths coming from generated text
pub struct PathValidator;

impl PathValidator {
    /// Check the lexical rule: non-empty, relative, no `..` segment.
    ///
    /// Both `/` and `\` count as separators so Windows-style input is held to
    /// the same rule.
    pub fn check_relative(path: &str) -> Result<(), PathViolation> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(PathViolation::Empty);
        }

        let has_drive = trimmed.len() >= 2
            && trimmed.as_bytes()[1] == b':'
            && trimmed.as_bytes()[0].is_ascii_alphabetic();
        if trimmed.starts_with('/')
            || trimmed.starts_with('\\')
            || has_drive
            || Path::new(trimmed).is_absolute()
        {
            return Err(PathViolation::Absolute(path.to_string()));
        }

        if trimmed.split(['/', '\\']).any(|segment| segment == "..") {
            return Err(PathViolation::ParentSegment(path.to_string()));
        }

        Ok(())
    }

    pub fn is_safe_relative(path: &str) -> bool {
        Self::check_relative(path).is_ok()
    }

    /// Resolve a base directory to the absolute form used for containment.
    ///
    /// The directory does not have to exist yet; the existing part of it is
    /// canonicalized and the rest appended.
    pub fn resolve_base(base: &Path) -> Result<PathBuf, String> {
        let absolute = if base.is_absolute() {
            base.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| format!("Cannot determine current directory: {}", e))?
                .join(base)
        };

        let normalized = Self::normalize_path(&absolute)?;
        Self::resolve_existing_prefix(&normalized)
            .ok_or_else(|| format!("Dangling symlink in {}", normalized.display()))
    }

    /// Resolve `relative` against an already resolved base directory and
    /// enforce containment. Runs the lexical rule first.
    ///
    /// Only the parent directories are resolved. The final component stays
    /// as named, so a symlink there is the link itself, not its target.
    pub fn resolve_within(base: &Path, relative: &str) -> Result<PathBuf, PathViolation> {
        Self::check_relative(relative)?;

        let outside = || PathViolation::OutsideBase(relative.to_string());
        let normalized = Self::normalize_path(&base.join(relative.trim())).map_err(|_| outside())?;
        let (parent, name) = match (normalized.parent(), normalized.file_name()) {
            (Some(parent), Some(name)) => (parent, name),
            _ => return Err(outside()),
        };

        let resolved = Self::resolve_existing_prefix(parent)
            .ok_or_else(outside)?
            .join(name);
        Self::ensure_within(base, &resolved).map_err(|_| outside())?;

        Ok(resolved)
    }

    /// Check that an absolute, resolved path sits strictly below `base`
    pub fn ensure_within(base: &Path, resolved: &Path) -> Result<(), PathViolation> {
        if resolved == base || !resolved.starts_with(base) {
            return Err(PathViolation::OutsideBase(resolved.display().to_string()));
        }
        Ok(())
    }

    /// Canonicalize the deepest existing ancestor of `path` and re-attach the
    /// components below it, so symlinked parents are seen for what they are.
    ///
    /// `None` when a component exists as a symlink that cannot be resolved:
    /// creating anything below it would follow the link to an unchecked place.
    fn resolve_existing_prefix(path: &Path) -> Option<PathBuf> {
        let mut existing = path.to_path_buf();
        let mut rest: Vec<std::ffi::OsString> = Vec::new();

        loop {
            if let Ok(canonical) = existing.canonicalize() {
                let mut resolved = canonical;
                for name in rest.iter().rev() {
                    resolved.push(name);
                }
                return Some(resolved);
            }

            if existing.symlink_metadata().is_ok() {
                return None;
            }

            match (existing.file_name().map(|n| n.to_os_string()), existing.parent()) {
                (Some(name), Some(parent)) => {
                    rest.push(name);
                    existing = parent.to_path_buf();
                }
                _ => return Some(path.to_path_buf()),
            }
        }
    }

    /// Normalize a path by resolving . and .. components without requiring
    /// the path to exist.
    fn normalize_path(path: &Path) -> Result<PathBuf, String> {
        let mut normalized = PathBuf::new();

        for component in path.components() {
            match component {
                Component::ParentDir => {
                    // Pop the last component, but not past root
                    if !normalized.pop() {
                        return Err(format!(
                            "Path traversal: too many parent references in {}",
                            path.display()
                        ));
                    }
                }
                Component::CurDir => {}
                Component::Normal(name) => {
                    normalized.push(name);
                }
                Component::RootDir => {
                    normalized.push(Component::RootDir);
                }
                Component::Prefix(prefix) => {
                    normalized.push(prefix.as_os_str());
                }
            }
        }

        Ok(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn base() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let base = PathValidator::resolve_base(temp_dir.path()).unwrap();
        (temp_dir, base)
    }

    #[test]
    fn test_relative_paths_accepted() {
        assert!(PathValidator::is_safe_relative("src/main.rs"));
        assert!(PathValidator::is_safe_relative("./README.md"));
        assert!(PathValidator::is_safe_relative("a..b/c.txt"));
    }

    #[test]
    fn test_absolute_paths_rejected() {
        assert!(matches!(
            PathValidator::check_relative("/etc/passwd"),
            Err(PathViolation::Absolute(_))
        ));
        assert!(matches!(
            PathValidator::check_relative("C:\\Windows\\system.ini"),
            Err(PathViolation::Absolute(_))
        ));
    }

    #[test]
    fn test_parent_segments_rejected() {
        assert!(matches!(
            PathValidator::check_relative("../secrets"),
            Err(PathViolation::ParentSegment(_))
        ));
        assert!(matches!(
            PathValidator::check_relative("src/../../x"),
            Err(PathViolation::ParentSegment(_))
        ));
        assert!(matches!(
            PathValidator::check_relative("src\\..\\x"),
            Err(PathViolation::ParentSegment(_))
        ));
    }

    #[test]
    fn test_empty_path_rejected() {
        assert_eq!(PathValidator::check_relative("  "), Err(PathViolation::Empty));
    }

    #[test]
    fn test_resolve_within_base() {
        let (_dir, base) = base();
        let resolved = PathValidator::resolve_within(&base, "src/new/file.rs").unwrap();
        assert_eq!(resolved, base.join("src/new/file.rs"));
    }

    #[test]
    fn test_base_itself_is_not_a_target() {
        let (_dir, base) = base();
        assert!(matches!(
            PathValidator::resolve_within(&base, "."),
            Err(PathViolation::OutsideBase(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_parent_escaping_base_rejected() {
        let (_dir, base) = base();
        let outside = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), base.join("escape")).unwrap();

        assert!(matches!(
            PathValidator::resolve_within(&base, "escape/file.txt"),
            Err(PathViolation::OutsideBase(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_final_symlink_is_not_followed() {
        let (_dir, base) = base();
        let outside = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path().join("pwned.txt"), base.join("evil.txt")).unwrap();
        fs::write(base.join("real.ts"), "x").unwrap();
        std::os::unix::fs::symlink(base.join("real.ts"), base.join("link.ts")).unwrap();

        assert_eq!(
            PathValidator::resolve_within(&base, "evil.txt").unwrap(),
            base.join("evil.txt")
        );
        assert_eq!(
            PathValidator::resolve_within(&base, "link.ts").unwrap(),
            base.join("link.ts")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlinked_parent_rejected() {
        let (_dir, base) = base();
        let outside = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path().join("missing"), base.join("gone")).unwrap();

        assert!(matches!(
            PathValidator::resolve_within(&base, "gone/file.txt"),
            Err(PathViolation::OutsideBase(_))
        ));
    }

    #[test]
    fn test_resolve_base_for_missing_directory() {
        let (dir, base) = base();
        let missing = dir.path().join("not/yet");
        let resolved = PathValidator::resolve_base(&missing).unwrap();
        assert_eq!(resolved, base.join("not/yet"));
        fs::create_dir_all(&missing).unwrap();
        assert_eq!(PathValidator::resolve_base(&missing).unwrap(), resolved);
    }
}
