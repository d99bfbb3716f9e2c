//! Structured response parsing
//!
//! Generated text is expected to carry one `<response>` container. Prose
//! around it is tolerated: the span from the first opening tag to the last
//! closing tag is read, everything else ignored.

use super::error::ProtocolError;
use super::markup::{self, Element};
use super::validate::validate_response;
use crate::models::{Complexity, FileAction, FileOperation, ParsedResponse, ResponseMetadata};
use once_cell::sync::Lazy;
use regex::Regex;

static RESPONSE_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<response(?:\s[^>]*)?>").expect("Invalid regex"));

static RESPONSE_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</response\s*>").expect("Invalid regex"));

/// Slice of `text` from the first `<response>` through the last `</response>`
fn locate_container(text: &str) -> Option<&str> {
    let start = RESPONSE_OPEN.find(text)?.start();
    let end = RESPONSE_CLOSE
        .find_iter(text)
        .filter(|m| m.start() > start)
        .last()?
        .end();
    Some(&text[start..end])
}

/// Parse and validate a structured response.
///
/// # Errors
/// - [`ProtocolError::Format`] when no container is present or the markup is
///   malformed
/// - [`ProtocolError::Validation`] when a field rule is broken
pub fn parse_strict(text: &str) -> Result<ParsedResponse, ProtocolError> {
    let container =
        locate_container(text).ok_or_else(|| ProtocolError::format("no structured response found"))?;

    let root = markup::read_document(container).map_err(|e| ProtocolError::format(e.to_string()))?;
    let response = response_from_element(&root)?;
    validate_response(&response)?;

    tracing::debug!(
        files = response.files.len(),
        commands = response.commands.as_ref().map_or(0, Vec::len),
        "Parsed structured response"
    );

    Ok(response)
}

fn response_from_element(root: &Element) -> Result<ParsedResponse, ProtocolError> {
    let files = match root.child("files") {
        Some(files) => files
            .children_named("file")
            .map(action_from_element)
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    let metadata = root.child("metadata").map(metadata_from_element).transpose()?;

    Ok(ParsedResponse {
        summary: root.child_text("summary").unwrap_or_default(),
        files,
        commands: root.list("commands", "command"),
        warnings: root.list("warnings", "warning"),
        metadata,
    })
}

fn action_from_element(file: &Element) -> Result<FileAction, ProtocolError> {
    let operation = file
        .child_text("operation")
        .ok_or_else(|| ProtocolError::validation("invalid operation: missing"))?
        .parse::<FileOperation>()
        .map_err(ProtocolError::validation)?;

    let content = file
        .child("content")
        .map(|node| node.text.clone())
        .filter(|content| !content.trim().is_empty());

    Ok(FileAction {
        operation,
        path: file.child_text("path").unwrap_or_default(),
        content,
        old_path: file.child_text("oldpath"),
        description: file.child_text("description"),
    })
}

fn metadata_from_element(metadata: &Element) -> Result<ResponseMetadata, ProtocolError> {
    let complexity = metadata
        .child_text("complexity")
        .map(|value| value.to_lowercase().parse::<Complexity>())
        .transpose()
        .map_err(ProtocolError::validation)?;

    Ok(ResponseMetadata {
        estimated_time: metadata.child_text("estimatedtime"),
        complexity,
        dependencies: metadata.list("dependencies", "dependency").unwrap_or_default(),
    })
}
