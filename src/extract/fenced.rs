//! Fenced code block formats
//!
//! - ```` ```typescript:src/file.ts ```` blocks that name their own path
//! - a lone fenced block with no path, used as a last structured resort

use super::language::extension_for_language;
use super::trim_block;
use crate::models::ParsedFile;
use once_cell::sync::Lazy;
use regex::Regex;

/// ```` ```lang:path\n body ``` ````
static FENCED_WITH_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```([\w+#-]+):([^\n]+)\n(.*?)```").expect("Invalid regex"));

/// Any fenced block; group 1 is the (possibly empty) language tag
static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```([\w+#.-]*)[^\n]*\n(.*?)```").expect("Invalid regex"));

/// Name used for files synthesized from an unnamed block
pub const SYNTHETIC_STEM: &str = "generated-code";

/// Format 1: every block whose opening fence carries `language:path`
pub fn extract_fenced_with_path(text: &str) -> Vec<ParsedFile> {
    FENCED_WITH_PATH
        .captures_iter(text)
        .filter_map(|caps| {
            let language = caps.get(1)?.as_str();
            let path = caps.get(2)?.as_str().trim();
            if path.is_empty() {
                return None;
            }
            let content = trim_block(caps.get(3)?.as_str());
            Some(ParsedFile::new(path, content, Some(language.to_string())))
        })
        .collect()
}

/// Format 5: exactly one fenced block in the whole text.
///
/// With zero or several unnamed blocks there is no way to tell which one is
/// the file, so nothing is returned.
pub fn extract_single_block(text: &str) -> Vec<ParsedFile> {
    let mut blocks = FENCED_BLOCK.captures_iter(text);
    let (Some(caps), None) = (blocks.next(), blocks.next()) else {
        return Vec::new();
    };

    let content = trim_block(caps.get(2).map_or("", |m| m.as_str()));
    if content.is_empty() {
        return Vec::new();
    }

    let language = caps
        .get(1)
        .map(|m| m.as_str())
        .filter(|tag| !tag.is_empty())
        .map(str::to_string);
    let path = format!(
        "{}{}",
        SYNTHETIC_STEM,
        extension_for_language(language.as_deref())
    );

    vec![ParsedFile::new(path, content, language)]
}

/// Body of the first fenced block in `text`, if any
pub(crate) fn first_fenced_body(text: &str) -> Option<String> {
    FENCED_BLOCK
        .captures(text)
        .and_then(|caps| caps.get(2))
        .map(|m| trim_block(m.as_str()))
}
