//! Tagged file blocks: `<file path="src/a.ts" language="typescript">...</file>`

use super::trim_block;
use crate::models::ParsedFile;
use once_cell::sync::Lazy;
use regex::Regex;

static FILE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<file\b([^>]*)>(.*?)</file\s*>").expect("Invalid regex"));

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_][\w-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("Invalid regex")
});

/// A fence wrapping the whole body; group 1 is the language tag
static WRAPPING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```([\w+#.-]*)[^\n]*\n(.*?)\n?```$").expect("Invalid regex"));

fn attribute<'a>(attributes: &'a str, name: &str) -> Option<&'a str> {
    ATTRIBUTE.captures_iter(attributes).find_map(|caps| {
        let key = caps.get(1)?.as_str();
        if !key.eq_ignore_ascii_case(name) {
            return None;
        }
        caps.get(2).or_else(|| caps.get(3)).map(|m| m.as_str())
    })
}

/// Format 2: every `<file>` tag that carries a `path` attribute
pub fn extract_tagged_files(text: &str) -> Vec<ParsedFile> {
    FILE_TAG
        .captures_iter(text)
        .filter_map(|caps| {
            let attributes = caps.get(1)?.as_str();
            let path = attribute(attributes, "path")?.trim();
            if path.is_empty() {
                return None;
            }

            let body = caps.get(2)?.as_str();
            let mut language = attribute(attributes, "language")
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string);

            let content = match WRAPPING_FENCE.captures(body.trim()) {
                Some(fence) => {
                    if language.is_none() {
                        language = fence
                            .get(1)
                            .map(|m| m.as_str())
                            .filter(|tag| !tag.is_empty())
                            .map(str::to_string);
                    }
                    trim_block(fence.get(2).map_or("", |m| m.as_str()))
                }
                None => trim_block(body),
            };

            Some(ParsedFile::new(path, content, language))
        })
        .collect()
}
