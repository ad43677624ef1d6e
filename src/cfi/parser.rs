//! CFI Parser
//!
//! Turns a CFI string into its ordered parts.
//!
//! Grammar:
//! ```text
//! cfi       = "epubcfi(" body ")"
//! body      = part ("!" part)* ["," steps ["," ...]]
//! part      = step+
//! step      = "/" digits ["[" id "]"] [":" digits ["[" assertion "]"]]
//!             ["~" float] ["@" number ":" number]
//! assertion = text ["," text] [";s=" ("a" | "b")]
//! ```
//!
//! Simple ranges are collapsed to their start: the steps after the first
//! `,` extend the current part, and a second `,` ends parsing.

use std::sync::LazyLock;

use regex::Regex;

use super::scanner::{self, RANGE_SEPARATOR};
use super::types::Part;
use crate::error::{CfiError, Result};

static WRAPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^epubcfi\((.*)\)$").expect("CFI wrapper pattern"));

/// Strip the `epubcfi(...)` wrapper, returning the body
pub(crate) fn unwrap_body(input: &str) -> Result<&str> {
    WRAPPER
        .captures(input.trim())
        .and_then(|caps| caps.get(1))
        .map(|body| body.as_str())
        .ok_or_else(|| CfiError::Grammar(format!("Not a valid CFI: '{}'", input)))
}

/// Parse a CFI string into its parts
pub fn parse_parts(input: &str) -> Result<Vec<Part>> {
    let mut rest = unwrap_body(input)?;
    let mut parts = Vec::new();
    let mut current = Vec::new();
    let mut saw_separator = false;

    while !rest.is_empty() {
        let scanned = scanner::scan(rest)?;
        current.push(scanned.step);

        if scanned.crossed_boundary || scanned.consumed >= rest.len() {
            parts.push(Part::new(std::mem::take(&mut current)));
        }
        rest = &rest[scanned.consumed.min(rest.len())..];

        if let Some(after) = rest.strip_prefix(RANGE_SEPARATOR) {
            if saw_separator {
                // Range end: keep what we have of the start and drop the rest
                if !current.is_empty() {
                    parts.push(Part::new(std::mem::take(&mut current)));
                }
                break;
            }
            rest = after;
            saw_separator = true;
        }
    }

    tracing::debug!(cfi = input, parts = parts.len(), "Parsed CFI");
    Ok(parts)
}
