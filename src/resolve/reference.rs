//! `!include` references and anchor extraction
//!
//! A reference has the form `<path>[ *<anchor>]`. When an anchor is given,
//! the target file must define `&<anchor>` somewhere in its text. The anchor
//! is then pulled out by appending a reserved top-level key aliasing it, so
//! the YAML parser's own alias handling does the extraction:
//!
//! ```text
//! node1: &node1
//!   a: 1
//! __yamlc_anchor__: *node1
//! ```
//!
//! The caller reads [`SENTINEL_KEY`] from the parsed mapping and discards the
//! rest of the document.

use regex::Regex;

/// Reserved top-level key used to carry an anchored value out of a document
pub const SENTINEL_KEY: &str = "__yamlc_anchor__";

/// A parsed `!include` reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// File path, relative to the including file unless rooted
    pub path: String,

    /// Anchor to extract instead of the whole document
    pub anchor: Option<String>,
}

impl Reference {
    /// Splits a raw reference at the first ` *`
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.split_once(" *") {
            Some((path, anchor)) => {
                let anchor = anchor.trim();
                Self {
                    path: path.trim_end().to_string(),
                    anchor: (!anchor.is_empty()).then(|| anchor.to_string()),
                }
            }
            None => Self {
                path: raw.to_string(),
                anchor: None,
            },
        }
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.anchor {
            Some(anchor) => write!(f, "{} *{}", self.path, anchor),
            None => write!(f, "{}", self.path),
        }
    }
}

/// Returns true if `text` defines `&<anchor>` followed by whitespace or end of line
pub fn anchor_is_defined(text: &str, anchor: &str) -> bool {
    let pattern = format!(r"(?m)&{}(?:\s|$)", regex::escape(anchor));
    match Regex::new(&pattern) {
        Ok(re) => re.is_match(text),
        Err(_) => false,
    }
}

/// Appends the sentinel entry aliasing `anchor` to the document text
///
/// Trailing `---` / `...` markers are dropped first so the entry stays in the
/// document that defines the anchor.
pub fn splice_sentinel(text: &str, anchor: &str) -> String {
    let text = strip_trailing_markers(text);
    let mut spliced = String::with_capacity(text.len() + SENTINEL_KEY.len() + anchor.len() + 8);
    spliced.push_str(text);
    if !text.is_empty() && !text.ends_with('\n') {
        spliced.push('\n');
    }
    spliced.push_str(SENTINEL_KEY);
    spliced.push_str(": *");
    spliced.push_str(anchor);
    spliced.push('\n');
    spliced
}

/// Removes trailing document start/end marker lines
fn strip_trailing_markers(text: &str) -> &str {
    let mut body = text;
    let mut stripped = false;

    loop {
        let trimmed = body.trim_end();
        let (rest, last) = trimmed.rsplit_once('\n').unwrap_or(("", trimmed));
        if matches!(last.trim_end(), "---" | "...") {
            body = rest;
            stripped = true;
        } else if stripped {
            return trimmed;
        } else {
            return text;
        }
    }
}
