//! Shared data model
//!
//! Entities passed between the extractors, the structured protocol parser
//! and the file executor. Everything here is transient: built per call and
//! handed back to the caller.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of change a [`FileAction`] applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileOperation {
    Create,
    Update,
    Delete,
    Rename,
}

impl FileOperation {
    pub const ALL: [FileOperation; 4] = [
        FileOperation::Create,
        FileOperation::Update,
        FileOperation::Delete,
        FileOperation::Rename,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileOperation::Create => "CREATE",
            FileOperation::Update => "UPDATE",
            FileOperation::Delete => "DELETE",
            FileOperation::Rename => "RENAME",
        }
    }

    /// Whether the operation carries the full new file content
    pub fn requires_content(&self) -> bool {
        matches!(self, FileOperation::Create | FileOperation::Update)
    }
}

impl fmt::Display for FileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileOperation {
    type Err = String;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        FileOperation::ALL
            .into_iter()
            .find(|op| op.as_str() == normalized)
            .ok_or_else(|| format!("invalid operation: {}", s.trim()))
    }
}

/// One intended filesystem change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAction {
    pub operation: FileOperation,
    /// Target path, relative to the executor's base directory
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Source path, only meaningful for RENAME
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FileAction {
    pub fn create(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            operation: FileOperation::Create,
            path: path.into(),
            content: Some(content.into()),
            old_path: None,
            description: None,
        }
    }

    pub fn update(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            operation: FileOperation::Update,
            path: path.into(),
            content: Some(content.into()),
            old_path: None,
            description: None,
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            operation: FileOperation::Delete,
            path: path.into(),
            content: None,
            old_path: None,
            description: None,
        }
    }

    pub fn rename(old_path: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            operation: FileOperation::Rename,
            path: path.into(),
            content: None,
            old_path: Some(old_path.into()),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A file recovered by the multi-format parser.
///
/// Carries no operation semantics; it is always a full-content write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedFile {
    pub path: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl ParsedFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>, language: Option<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            language,
        }
    }

    pub fn to_create_action(&self) -> FileAction {
        FileAction::create(self.path.clone(), self.content.clone())
    }
}

/// Which convention produced a [`ParseResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    FencedPath,
    TaggedFile,
    CommentPath,
    HeaderPath,
    SingleBlock,
    Raw,
}

/// Output of the multi-format parser; `files` is never empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub files: Vec<ParsedFile>,
    pub raw_content: String,
    pub format: SourceFormat,
}

impl ParseResult {
    /// Human-readable listing of the recovered files
    pub fn summary(&self) -> String {
        if self.files.is_empty() {
            return "No files found in generated code.".to_string();
        }

        let mut summary = format!("Found {} file(s):\n\n", self.files.len());
        for file in &self.files {
            summary.push_str(&format!(
                "- {} ({}, {} lines, {} bytes)\n",
                file.path,
                file.language.as_deref().unwrap_or("unknown"),
                file.content.split('\n').count(),
                file.content.len()
            ));
        }
        summary
    }
}

/// Declared effort of a structured response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Medium,
    Complex,
}

impl FromStr for Complexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "simple" => Ok(Complexity::Simple),
            "medium" => Ok(Complexity::Medium),
            "complex" => Ok(Complexity::Complex),
            other => Err(format!("invalid complexity: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Complexity>,
    /// `name@version` strings
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl ResponseMetadata {
    /// Split dependencies into `(name, version)` on the last `@`.
    ///
    /// A leading `@` belongs to a scoped package name, not to the version.
    pub fn dependency_pairs(&self) -> Vec<(String, Option<String>)> {
        self.dependencies
            .iter()
            .map(|dep| match dep.rfind('@') {
                Some(idx) if idx > 0 => (dep[..idx].to_string(), Some(dep[idx + 1..].to_string())),
                _ => (dep.clone(), None),
            })
            .collect()
    }
}

/// A validated structured response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedResponse {
    pub summary: String,
    pub files: Vec<FileAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
}

/// A failed action inside an [`ExecutionResult`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionError {
    pub file: String,
    pub operation: FileOperation,
    pub error: String,
}

/// Report of a real or simulated batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// False as soon as any action failed
    pub success: bool,
    pub files_created: Vec<String>,
    pub files_updated: Vec<String>,
    pub files_deleted: Vec<String>,
    /// Recorded for the caller; never run here
    pub commands_executed: Vec<String>,
    pub errors: Vec<ActionError>,
    /// Non-fatal problems such as failed backups
    pub warnings: Vec<String>,
}

impl ExecutionResult {
    pub fn new() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn record_error(&mut self, action: &FileAction, error: impl Into<String>) {
        self.success = false;
        self.errors.push(ActionError {
            file: action.path.clone(),
            operation: action.operation,
            error: error.into(),
        });
    }

    /// Total number of actions that were (or would be) applied
    pub fn applied_count(&self) -> usize {
        self.files_created.len() + self.files_updated.len() + self.files_deleted.len()
    }
}
