//! Text sanitization for capabilities that ask for cleaned input.
//!
//! Separate from validation: validation decides accept/reject, sanitization
//! rewrites accepted text.

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// How a parameter should be cleaned before reaching the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SanitizeMode {
    /// Strip control characters and NFC-normalize.
    Text,
    /// `Text`, then escape the five HTML-reserved characters.
    Html,
}

impl SanitizeMode {
    pub fn apply(&self, input: &str) -> String {
        match self {
            SanitizeMode::Text => sanitize_text(input),
            SanitizeMode::Html => sanitize_html(input),
        }
    }
}

/// C0 controls except tab, LF and CR, plus DEL.
fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}' | '\u{7F}')
}

pub fn strip_control_chars(input: &str) -> String {
    input.chars().filter(|c| !is_stripped_control(*c)).collect()
}

/// Strip control characters, then apply canonical composition (NFC).
pub fn sanitize_text(input: &str) -> String {
    strip_control_chars(input).nfc().collect()
}

pub fn sanitize_html(input: &str) -> String {
    escape_html(&sanitize_text(input))
}

/// Escape exactly `&`, `<`, `>`, `"` and `'`.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

const ENTITIES: [(&str, char); 6] = [
    ("&amp;", '&'),
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&quot;", '"'),
    ("&#39;", '\''),
    ("&#x27;", '\''),
];

/// Inverse of [`escape_html`]. Unknown entities pass through untouched.
pub fn unescape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match ENTITIES.iter().find(|(entity, _)| rest.starts_with(entity)) {
            Some((entity, c)) => {
                out.push(*c);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
