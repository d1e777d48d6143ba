//! Catastrophic-backtracking deny-list for user supplied regex patterns.
//!
//! The `regex` crate itself runs in linear time, but patterns are also echoed
//! to callers and may be handed to other engines, so known-bad shapes are
//! refused up front. This is a heuristic, not a proof.

use regex::{Regex, RegexBuilder};
use std::fmt;

use super::validation::Violation;

/// Capturing group count at which a pattern is refused.
pub const MAX_CAPTURE_GROUPS: usize = 10;

/// Alternation branch count at which a pattern is refused.
pub const MAX_ALTERNATIONS: usize = 20;

/// Pattern length limit, in characters.
pub const MAX_PATTERN_LEN: usize = 1_000;

/// Compiled program size limit.
const COMPILED_SIZE_LIMIT: usize = 1 << 20;

/// Why a pattern was refused by the shape heuristics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardViolation {
    NestedQuantifier,
    TooManyGroups { count: usize },
    TooManyAlternations { count: usize },
}

impl fmt::Display for GuardViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardViolation::NestedQuantifier => f.write_str("nested quantifiers"),
            GuardViolation::TooManyGroups { count } => write!(
                f,
                "{} capturing groups (limit is {})",
                count,
                MAX_CAPTURE_GROUPS - 1
            ),
            GuardViolation::TooManyAlternations { count } => write!(
                f,
                "{} alternation branches (limit is {})",
                count,
                MAX_ALTERNATIONS - 1
            ),
        }
    }
}

/// Structural facts gathered in one pass over the pattern.
#[derive(Debug, Default, PartialEq, Eq)]
struct PatternShape {
    capture_groups: usize,
    branches: usize,
    nested_quantifier: bool,
}

fn is_quantifier_start(c: Option<char>) -> bool {
    matches!(c, Some('*') | Some('+') | Some('{'))
}

/// Walk the pattern once, skipping escapes and character classes.
fn analyze(pattern: &str) -> PatternShape {
    let chars: Vec<char> = pattern.chars().collect();
    let mut shape = PatternShape {
        branches: 1,
        ..PatternShape::default()
    };
    // One flag per open group: does its body contain a quantifier?
    let mut groups: Vec<bool> = Vec::new();
    let mut in_class = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' => {
                i += 2;
                continue;
            }
            ']' if in_class => in_class = false,
            _ if in_class => {}
            '[' => {
                in_class = true;
                // A leading `]` (or `^]`) is a literal inside the class.
                if chars.get(i + 1) == Some(&'^') {
                    i += 1;
                }
                if chars.get(i + 1) == Some(&']') {
                    i += 1;
                }
            }
            '(' => {
                let next = chars.get(i + 1).copied();
                let named = next == Some('?')
                    && matches!(chars.get(i + 2), Some('P') | Some('<'))
                    && !matches!(chars.get(i + 3), Some('=') | Some('!'));
                if next != Some('?') || named {
                    shape.capture_groups += 1;
                }
                groups.push(false);
            }
            ')' => {
                let inner_quantified = groups.pop().unwrap_or(false);
                if inner_quantified && is_quantifier_start(chars.get(i + 1).copied()) {
                    shape.nested_quantifier = true;
                }
                if inner_quantified {
                    if let Some(parent) = groups.last_mut() {
                        *parent = true;
                    }
                }
            }
            '*' | '+' | '{' => {
                if let Some(top) = groups.last_mut() {
                    *top = true;
                }
            }
            '|' => shape.branches += 1,
            _ => {}
        }
        i += 1;
    }

    shape
}

/// Apply the deny-list and make sure the pattern compiles.
pub fn check_pattern(pattern: &str) -> Result<(), Violation> {
    compile_guarded(pattern).map(|_| ())
}

/// Guarded compilation entry point for regex-powered capabilities.
pub fn compile_guarded(pattern: &str) -> Result<Regex, Violation> {
    let len = pattern.chars().count();
    if len > MAX_PATTERN_LEN {
        return Err(Violation::TooLong {
            len,
            max: MAX_PATTERN_LEN,
        });
    }

    let shape = analyze(pattern);
    if shape.nested_quantifier {
        return Err(Violation::UnsafePattern(GuardViolation::NestedQuantifier));
    }
    if shape.capture_groups >= MAX_CAPTURE_GROUPS {
        return Err(Violation::UnsafePattern(GuardViolation::TooManyGroups {
            count: shape.capture_groups,
        }));
    }
    if shape.branches >= MAX_ALTERNATIONS {
        return Err(Violation::UnsafePattern(
            GuardViolation::TooManyAlternations {
                count: shape.branches,
            },
        ));
    }

    RegexBuilder::new(pattern)
        .size_limit(COMPILED_SIZE_LIMIT)
        .build()
        .map_err(|e| Violation::InvalidPattern(e.to_string()))
}
