//! Input validation catalog.
//!
//! Every tool parameter that carries text can be bound to a [`ValidationKind`].
//! Validation fails closed: input is either accepted unchanged or rejected
//! with an error naming the rule it broke. Nothing is truncated or coerced.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::regex_guard::{self, GuardViolation};

/// Named semantic kind of a text input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationKind {
    Text,
    Json,
    Html,
    Xml,
    Yaml,
    Csv,
    Password,
    RegexPattern,
    Url,
    Email,
    Base64,
    HexColor,
    Filename,
}

impl ValidationKind {
    pub const ALL: [ValidationKind; 13] = [
        ValidationKind::Text,
        ValidationKind::Json,
        ValidationKind::Html,
        ValidationKind::Xml,
        ValidationKind::Yaml,
        ValidationKind::Csv,
        ValidationKind::Password,
        ValidationKind::RegexPattern,
        ValidationKind::Url,
        ValidationKind::Email,
        ValidationKind::Base64,
        ValidationKind::HexColor,
        ValidationKind::Filename,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ValidationKind::Text => "text",
            ValidationKind::Json => "json",
            ValidationKind::Html => "html",
            ValidationKind::Xml => "xml",
            ValidationKind::Yaml => "yaml",
            ValidationKind::Csv => "csv",
            ValidationKind::Password => "password",
            ValidationKind::RegexPattern => "regex_pattern",
            ValidationKind::Url => "url",
            ValidationKind::Email => "email",
            ValidationKind::Base64 => "base64",
            ValidationKind::HexColor => "hex_color",
            ValidationKind::Filename => "filename",
        }
    }

    /// The rule bound to this kind.
    pub fn rule(&self) -> &'static ValidationRule {
        &RULES[*self as usize]
    }
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Size and shape constraint of one kind.
#[derive(Debug)]
pub struct ValidationRule {
    pub kind: ValidationKind,
    /// Maximum length in Unicode scalar values.
    pub max_len: usize,
    pattern: Option<&'static Lazy<Regex>>,
}

impl ValidationRule {
    pub fn pattern(&self) -> Option<&'static Regex> {
        self.pattern.map(|lazy| &**lazy)
    }
}

// Literal patterns; compilation cannot fail.
#[allow(clippy::expect_used)]
static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("url pattern"));
#[allow(clippy::expect_used)]
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));
#[allow(clippy::expect_used)]
static BASE64_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9+/]*={0,2}$").expect("base64 pattern"));
#[allow(clippy::expect_used)]
static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#?([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("hex color pattern"));
#[allow(clippy::expect_used)]
static FILENAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[^<>:"/\\|?*\x00-\x1F]+$"#).expect("filename pattern"));

const fn rule(
    kind: ValidationKind,
    max_len: usize,
    pattern: Option<&'static Lazy<Regex>>,
) -> ValidationRule {
    ValidationRule {
        kind,
        max_len,
        pattern,
    }
}

/// Indexed by `ValidationKind as usize`.
static RULES: [ValidationRule; 13] = [
    rule(ValidationKind::Text, 1_000_000, None),
    rule(ValidationKind::Json, 500_000, None),
    rule(ValidationKind::Html, 500_000, None),
    rule(ValidationKind::Xml, 500_000, None),
    rule(ValidationKind::Yaml, 100_000, None),
    rule(ValidationKind::Csv, 1_000_000, None),
    rule(ValidationKind::Password, 128, None),
    rule(ValidationKind::RegexPattern, 1_000, None),
    rule(ValidationKind::Url, 2_048, Some(&URL_RE)),
    rule(ValidationKind::Email, 254, Some(&EMAIL_RE)),
    rule(ValidationKind::Base64, 1_000_000, Some(&BASE64_RE)),
    rule(ValidationKind::HexColor, 7, Some(&HEX_COLOR_RE)),
    rule(ValidationKind::Filename, 255, Some(&FILENAME_RE)),
];

/// What exactly was wrong with the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    ForbiddenByte { byte: u8, position: usize },
    TooLong { len: usize, max: usize },
    PatternMismatch,
    UnsafePattern(GuardViolation),
    InvalidPattern(String),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::ForbiddenByte { byte, position } => {
                write!(f, "forbidden byte 0x{:02X} at position {}", byte, position)
            }
            Violation::TooLong { len, max } => {
                write!(f, "exceeded max length: {} > {} characters", len, max)
            }
            Violation::PatternMismatch => f.write_str("does not match the required format"),
            Violation::UnsafePattern(reason) => write!(f, "unsafe pattern: {}", reason),
            Violation::InvalidPattern(msg) => write!(f, "invalid pattern: {}", msg),
        }
    }
}

/// Validation failure naming the violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{rule} validation failed: {violation}")]
pub struct ValidationError {
    pub rule: ValidationKind,
    pub violation: Violation,
}

impl ValidationError {
    fn new(rule: ValidationKind, violation: Violation) -> Self {
        Self { rule, violation }
    }
}

/// Stateless validator over the static rule catalog.
#[derive(Debug, Default, Clone, Copy)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    /// Validate `input` against the rule bound to `kind`.
    ///
    /// Checks run cheapest first: NUL byte, length, then shape.
    pub fn validate(&self, kind: ValidationKind, input: &str) -> Result<(), ValidationError> {
        if let Some(position) = input.bytes().position(|b| b == 0) {
            return Err(ValidationError::new(
                kind,
                Violation::ForbiddenByte { byte: 0, position },
            ));
        }

        let rule = kind.rule();
        // Byte length bounds char count from above; skip the count for short input.
        if input.len() > rule.max_len {
            let len = input.chars().count();
            if len > rule.max_len {
                return Err(ValidationError::new(
                    kind,
                    Violation::TooLong {
                        len,
                        max: rule.max_len,
                    },
                ));
            }
        }

        match kind {
            ValidationKind::RegexPattern => {
                regex_guard::check_pattern(input).map_err(|v| ValidationError::new(kind, v))
            }
            ValidationKind::Filename if input == "." || input == ".." => {
                Err(ValidationError::new(kind, Violation::PatternMismatch))
            }
            _ => match rule.pattern() {
                Some(re) if !re.is_match(input) => {
                    Err(ValidationError::new(kind, Violation::PatternMismatch))
                }
                _ => Ok(()),
            },
        }
    }
}
