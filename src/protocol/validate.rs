//! Field rules for structured responses

use super::error::ProtocolError;
use crate::models::{FileOperation, ParsedResponse};
use crate::security::PathValidator;

/// Check a response against the protocol's field rules.
///
/// Rejects the whole response on the first broken rule:
/// - the summary must be non-blank
/// - there must be at least one file action
/// - every path (and RENAME's `oldPath`) must be relative with no `..` segment
/// - CREATE and UPDATE need non-blank content
pub fn validate_response(response: &ParsedResponse) -> Result<(), ProtocolError> {
    if response.summary.trim().is_empty() {
        return Err(ProtocolError::validation("summary cannot be empty"));
    }

    if response.files.is_empty() {
        return Err(ProtocolError::validation(
            "at least one file operation is required",
        ));
    }

    for file in &response.files {
        if file.path.trim().is_empty() {
            return Err(ProtocolError::validation(format!(
                "invalid path: file path is required for {} operation",
                file.operation
            )));
        }

        PathValidator::check_relative(&file.path)
            .map_err(|violation| ProtocolError::validation(format!("invalid path: {}", violation)))?;

        let has_content = file
            .content
            .as_deref()
            .is_some_and(|content| !content.trim().is_empty());
        if file.operation.requires_content() && !has_content {
            return Err(ProtocolError::validation(format!(
                "content is required for {} operation on {}",
                file.operation, file.path
            )));
        }

        if file.operation == FileOperation::Rename {
            let old_path = file
                .old_path
                .as_deref()
                .filter(|old| !old.trim().is_empty())
                .ok_or_else(|| {
                    ProtocolError::validation(format!(
                        "oldPath is required for RENAME operation on {}",
                        file.path
                    ))
                })?;

            PathValidator::check_relative(old_path).map_err(|violation| {
                ProtocolError::validation(format!("invalid oldPath: {}", violation))
            })?;
        }
    }

    Ok(())
}
