//! Tolerant reader for the tagged response grammar.
//!
//! Understands the subset generators actually emit: nested elements,
//! attributes (skipped), comments, processing instructions, CDATA and the
//! predefined/numeric entities. Tag names are case-insensitive.
//!
//! `<content>` is special: its body is taken raw up to the matching close
//! tag, so code that was not wrapped in CDATA (and therefore contains bare
//! `<` or `&`) still reads correctly.

use crate::extract::trim_block;

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// Name of the element whose body is read raw
const RAW_ELEMENT: &str = "content";

/// Deepest element nesting accepted; the response grammar needs five levels
pub const MAX_DEPTH: usize = 64;

/// A parsed element; `name` is lowercase, `text` is the decoded direct text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text, `None` when blank
    pub fn text_value(&self) -> Option<String> {
        let trimmed = self.text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    /// Text of a named child, `None` when the child is missing or blank
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).and_then(Element::text_value)
    }

    /// Non-blank texts of all `item` children of the `list` child
    pub fn list(&self, list: &str, item: &str) -> Option<Vec<String>> {
        self.child(list)
            .map(|node| node.children_named(item).filter_map(Element::text_value).collect())
    }
}

/// Error type for markup reading failures
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupError {
    pub message: String,
    pub position: usize,
}

impl MarkupError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl std::fmt::Display for MarkupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at byte {}", self.message, self.position)
    }
}

impl std::error::Error for MarkupError {}

/// Read exactly one root element; only whitespace, comments and processing
/// instructions may surround it.
pub fn read_document(input: &str) -> Result<Element, MarkupError> {
    let mut reader = Reader::new(input);
    reader.skip_misc()?;
    if reader.at_end() {
        return Err(MarkupError::new("no root element", reader.pos));
    }
    let root = reader.read_element(1)?;
    reader.skip_misc()?;
    if !reader.at_end() {
        return Err(MarkupError::new("unexpected content after root element", reader.pos));
    }
    Ok(root)
}

struct Reader<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Advance past the next `terminator`, failing with `what` if it is missing
    fn skip_past(&mut self, terminator: &str, what: &str) -> Result<&'a str, MarkupError> {
        let rest = self.rest();
        match rest.find(terminator) {
            Some(idx) => {
                self.pos += idx + terminator.len();
                Ok(&rest[..idx])
            }
            None => Err(MarkupError::new(format!("unterminated {}", what), self.pos)),
        }
    }

    fn skip_misc(&mut self) -> Result<(), MarkupError> {
        loop {
            self.skip_whitespace();
            if self.starts_with("<!--") {
                self.skip_past("-->", "comment")?;
            } else if self.starts_with("<?") {
                self.skip_past("?>", "processing instruction")?;
            } else {
                return Ok(());
            }
        }
    }

    fn read_name(&mut self) -> Result<String, MarkupError> {
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|(_, c)| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')))
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(MarkupError::new("expected tag name", self.pos));
        }
        self.pos += len;
        Ok(rest[..len].to_lowercase())
    }

    /// Skip attributes up to the end of the start tag. Returns true for
    /// self-closing tags.
    fn skip_attributes(&mut self) -> Result<bool, MarkupError> {
        let start = self.pos;
        let mut quote: Option<char> = None;
        for (idx, c) in self.rest().char_indices() {
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"') | (None, '\'') => quote = Some(c),
                (None, '>') => {
                    let self_closing = self.rest()[..idx].trim_end().ends_with('/');
                    self.pos += idx + 1;
                    return Ok(self_closing);
                }
                (None, '<') => break,
                _ => {}
            }
        }
        Err(MarkupError::new("unterminated start tag", start))
    }

    fn read_element(&mut self, depth: usize) -> Result<Element, MarkupError> {
        let start = self.pos;
        if depth > MAX_DEPTH {
            return Err(MarkupError::new("nesting too deep", start));
        }
        if !self.starts_with("<") {
            return Err(MarkupError::new("expected '<'", start));
        }
        self.pos += 1;

        let mut element = Element {
            name: self.read_name()?,
            ..Default::default()
        };
        if self.skip_attributes()? {
            return Ok(element);
        }

        if element.name == RAW_ELEMENT {
            element.text = self.read_raw_body(&element.name, start)?;
            return Ok(element);
        }

        loop {
            if self.at_end() {
                return Err(MarkupError::new(format!("unclosed <{}>", element.name), start));
            }

            if self.starts_with("</") {
                self.read_close_tag(&element.name)?;
                return Ok(element);
            } else if self.starts_with("<!--") {
                self.skip_past("-->", "comment")?;
            } else if self.starts_with(CDATA_OPEN) {
                self.pos += CDATA_OPEN.len();
                let data = self.skip_past(CDATA_CLOSE, "CDATA section")?;
                element.text.push_str(data);
            } else if self.starts_with("<?") {
                self.skip_past("?>", "processing instruction")?;
            } else if self.starts_with("<") {
                let child = self.read_element(depth + 1)?;
                element.children.push(child);
            } else {
                let rest = self.rest();
                let len = rest.find('<').unwrap_or(rest.len());
                element.text.push_str(&decode_entities(&rest[..len]));
                self.pos += len;
            }
        }
    }

    fn read_close_tag(&mut self, expected: &str) -> Result<(), MarkupError> {
        let start = self.pos;
        self.pos += 2;
        let name = self.read_name()?;
        self.skip_whitespace();
        if !self.starts_with(">") {
            return Err(MarkupError::new("malformed close tag", start));
        }
        self.pos += 1;
        if name != expected {
            return Err(MarkupError::new(
                format!("mismatched close tag: expected </{}>, found </{}>", expected, name),
                start,
            ));
        }
        Ok(())
    }

    /// Body of a raw element up to its close tag. CDATA sections are
    /// unwrapped (and may contain the close tag); other text is verbatim.
    fn read_raw_body(&mut self, name: &str, start: usize) -> Result<String, MarkupError> {
        let close = format!("</{}", name);
        let mut body = String::new();

        loop {
            let rest = self.rest();
            let lower = rest.to_ascii_lowercase();
            let next_cdata = rest.find(CDATA_OPEN);
            let next_close = lower.find(&close);

            match (next_cdata, next_close) {
                (Some(cdata), close_idx) if close_idx.map_or(true, |c| cdata < c) => {
                    body.push_str(&rest[..cdata]);
                    self.pos += cdata + CDATA_OPEN.len();
                    let data = self.skip_past(CDATA_CLOSE, "CDATA section")?;
                    body.push_str(data);
                }
                (_, Some(close_idx)) => {
                    body.push_str(&rest[..close_idx]);
                    self.pos += close_idx;
                    self.read_close_tag(name)?;
                    return Ok(trim_block(&body));
                }
                _ => {
                    return Err(MarkupError::new(format!("unclosed <{}>", name), start));
                }
            }
        }
    }
}

/// Decode the predefined entities and numeric character references.
/// Unknown entities are kept as written.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp..];
        let decoded = after.find(';').and_then(|semi| {
            let entity = &after[1..semi];
            let ch = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => {
                    let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                        u32::from_str_radix(hex, 16).ok()
                    } else if let Some(dec) = entity.strip_prefix('#') {
                        dec.parse::<u32>().ok()
                    } else {
                        None
                    };
                    code.and_then(char::from_u32)
                }
            };
            ch.map(|c| (c, semi + 1))
        });

        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &after[consumed..];
            }
            None => {
                out.push('&');
                rest = &after[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
