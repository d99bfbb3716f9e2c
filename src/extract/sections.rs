//! Marker-delimited sections
//!
//! Text is cut into sections at marker lines; the section body becomes the
//! file content. Two markers are understood:
//! - comment markers: `// File: src/a.ts` or `# File: src/a.ts`
//! - markdown headers of depth 2-3 naming a path: `### src/a.ts`
//!
//! Marker lines inside fenced blocks are code, not markers, with one
//! exception: a comment marker on the first line of a fence names that
//! fence's file.

use super::fenced::first_fenced_body;
use super::language::detect_language;
use super::trim_block;
use crate::models::ParsedFile;
use once_cell::sync::Lazy;
use regex::Regex;

static COMMENT_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?://+|#+)\s*File:\s*(.+?)\s*$").expect("Invalid regex")
});

static HEADER_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#{2,3}[ \t]*(?:File:[ \t]*)?([^#\s].*?)\s*$").expect("Invalid regex")
});

/// Characters wrapped around paths in prose (`**src/a.ts**`, `` `a.ts` ``)
const PATH_DECORATION: &[char] = &['`', '*', '"', '\'', ':'];

#[derive(Debug)]
struct Section {
    path: String,
    body: String,
    /// Marker was the first line of a fence; body is the fence body
    fenced: bool,
}

impl Section {
    fn new(path: String, fenced: bool) -> Self {
        Self {
            path,
            body: String::new(),
            fenced,
        }
    }

    /// Content per section kind: an embedded fenced block wins over the
    /// raw span up to the next marker.
    fn content(&self) -> String {
        if self.fenced {
            return trim_block(&self.body);
        }
        first_fenced_body(&self.body).unwrap_or_else(|| trim_block(&self.body))
    }
}

fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

fn clean_path(raw: &str) -> String {
    raw.trim().trim_matches(PATH_DECORATION).trim().to_string()
}

/// Cut `text` into sections. `marker` returns the raw path for a marker
/// line; `allow_in_fence` enables the first-line-of-fence form.
fn split_sections<F>(text: &str, marker: F, allow_in_fence: bool) -> Vec<(String, String)>
where
    F: Fn(&str) -> Option<String>,
{
    let lines: Vec<&str> = text.lines().collect();
    let mut sections: Vec<Section> = Vec::new();
    let mut current: Option<Section> = None;
    let mut in_fence = false;
    let mut idx = 0;

    while idx < lines.len() {
        let line = lines[idx];
        idx += 1;

        if !in_fence {
            if let Some(path) = marker(line) {
                sections.extend(current.take());
                current = Some(Section::new(path, false));
                continue;
            }
            if is_fence(line) {
                in_fence = true;
                if allow_in_fence {
                    if let Some(path) = lines.get(idx).and_then(|next| marker(next)) {
                        sections.extend(current.take());
                        current = Some(Section::new(path, true));
                        idx += 1;
                        continue;
                    }
                }
            }
        } else if is_fence(line) {
            in_fence = false;
            if current.as_ref().is_some_and(|s| s.fenced) {
                sections.extend(current.take());
                continue;
            }
        }

        if let Some(section) = current.as_mut() {
            section.body.push_str(line);
            section.body.push('\n');
        }
    }
    sections.extend(current);

    sections
        .into_iter()
        .map(|section| {
            let content = section.content();
            (section.path, content)
        })
        .collect()
}

/// A header names a file only if its text holds a path-like token
fn path_like_token(header: &str) -> Option<String> {
    header
        .split_whitespace()
        .map(clean_path)
        .find(|token| {
            let has_separator = token.contains('/');
            let has_extension = token
                .rfind('.')
                .is_some_and(|dot| dot + 1 < token.len());
            has_separator || has_extension
        })
}

/// Format 3: `// File: <path>` / `# File: <path>` sections
pub fn extract_comment_sections(text: &str) -> Vec<ParsedFile> {
    let marker = |line: &str| {
        COMMENT_MARKER
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| clean_path(m.as_str()))
            .filter(|path| !path.is_empty())
    };

    split_sections(text, marker, true)
        .into_iter()
        .filter(|(_, content)| !content.is_empty())
        .map(|(path, content)| {
            let language = detect_language(&path);
            ParsedFile::new(path, content, language)
        })
        .collect()
}

/// Format 4: `## path` / `### File: path` sections.
///
/// Headers without a path-like token are titles; they still end the previous
/// section but produce no file.
pub fn extract_header_sections(text: &str) -> Vec<ParsedFile> {
    let marker = |line: &str| {
        HEADER_MARKER
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    };

    split_sections(text, marker, false)
        .into_iter()
        .filter_map(|(header, content)| {
            let path = path_like_token(&header)?;
            if content.is_empty() {
                return None;
            }
            let language = detect_language(&path);
            Some(ParsedFile::new(path, content, language))
        })
        .collect()
}
