//! Multi-format extraction
//!
//! Generation backends do not agree on how to mark which code belongs to
//! which file. Each supported convention is an [`Extractor`]; [`parse`] tries
//! them in a fixed order and the first one that recovers at least one file
//! decides the whole result. Lower-priority matches are never merged in.
//!
//! When nothing matches, the raw text becomes a single synthetic file, so
//! parsing never fails.

pub mod fenced;
pub mod language;
pub mod sections;
pub mod tagged;

pub use fenced::{extract_fenced_with_path, extract_single_block};
pub use language::{detect_language, extension_for_language, language_for_extension};
pub use sections::{extract_comment_sections, extract_header_sections};
pub use tagged::extract_tagged_files;

use crate::models::{ParseResult, ParsedFile, SourceFormat};
use language::GENERIC_EXTENSION;

/// One textual convention for naming files inside generated text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    FencedPath,
    TaggedFile,
    CommentPath,
    HeaderPath,
    SingleBlock,
}

impl Extractor {
    /// Evaluation order of [`parse`]
    pub const PRIORITY: [Extractor; 5] = [
        Extractor::FencedPath,
        Extractor::TaggedFile,
        Extractor::CommentPath,
        Extractor::HeaderPath,
        Extractor::SingleBlock,
    ];

    pub fn extract(&self, text: &str) -> Vec<ParsedFile> {
        match self {
            Extractor::FencedPath => extract_fenced_with_path(text),
            Extractor::TaggedFile => extract_tagged_files(text),
            Extractor::CommentPath => extract_comment_sections(text),
            Extractor::HeaderPath => extract_header_sections(text),
            Extractor::SingleBlock => extract_single_block(text),
        }
    }

    pub fn format(&self) -> SourceFormat {
        match self {
            Extractor::FencedPath => SourceFormat::FencedPath,
            Extractor::TaggedFile => SourceFormat::TaggedFile,
            Extractor::CommentPath => SourceFormat::CommentPath,
            Extractor::HeaderPath => SourceFormat::HeaderPath,
            Extractor::SingleBlock => SourceFormat::SingleBlock,
        }
    }
}

/// Path of the file wrapping unrecognized text
pub fn raw_fallback_path() -> String {
    format!("{}{}", fenced::SYNTHETIC_STEM, GENERIC_EXTENSION)
}

/// Recover the intended files from generated text. Total and deterministic.
pub fn parse(text: &str) -> ParseResult {
    for extractor in Extractor::PRIORITY {
        let files = extractor.extract(text);
        if !files.is_empty() {
            tracing::debug!(
                format = ?extractor,
                files = files.len(),
                "Extracted files from generated text"
            );
            return ParseResult {
                files,
                raw_content: text.to_string(),
                format: extractor.format(),
            };
        }
    }

    tracing::debug!(bytes = text.len(), "No file convention recognized, using raw text");
    ParseResult {
        files: vec![ParsedFile::new(raw_fallback_path(), text, None)],
        raw_content: text.to_string(),
        format: SourceFormat::Raw,
    }
}

/// Drop leading blank lines and trailing whitespace.
///
/// Indentation of the first non-blank line is part of the content and stays.
pub(crate) fn trim_block(text: &str) -> String {
    let trimmed_end = text.trim_end();
    let first_content = trimmed_end
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(idx, _)| idx)
        .unwrap_or(trimmed_end.len());
    let line_start = trimmed_end[..first_content]
        .rfind('\n')
        .map(|nl| nl + 1)
        .unwrap_or(0);
    trimmed_end[line_start..].to_string()
}
