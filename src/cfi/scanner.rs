//! Step scanner
//!
//! Consumes a single `/index[id]:offset[assertion]~temporal@x:y` segment
//! from the front of a CFI body. The grammar mixes escaping with several
//! terminators, so this is a character-level state machine rather than a
//! regex: each state has its own transition function and all scan state is
//! local to one [`scan`] call.

use std::sync::LazyLock;

use regex::Regex;

use super::types::{SideBias, SpatialRange, Step, TextLocationAssertion};
use crate::error::{CfiError, Result};

/// Makes the next character literal
pub(crate) const ESCAPE: char = '^';
/// Marks the start of the next document's part
pub(crate) const BOUNDARY: char = '!';
/// Separates the start and end of a simple range
pub(crate) const RANGE_SEPARATOR: char = ',';

static SIDE_BIAS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*);s=([ba])$").expect("side bias pattern"));

static SPATIAL_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\d.]+):([\d.]+)$").expect("spatial range pattern"));

/// Result of scanning one step
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Scanned {
    pub step: Step,
    /// Bytes consumed from the front of the input
    pub consumed: usize,
    /// The step ended on a `!`, so the next step belongs to a new part
    pub crossed_boundary: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    /// `/` digits
    Index,
    /// `:` digits
    Offset,
    /// `@` x `:` y
    Spatial,
    /// `~` float
    Temporal,
    /// `[id]` after an index
    NodeId,
    /// `[text]` after an offset
    Assertion,
}

/// What the driver loop does after a character was fed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    /// Stop before the current character
    End,
    /// Stop after the current character, which was a `!`
    Boundary,
}

struct StepScanner {
    state: State,
    /// Last state that was closed; decides what a `[` opens
    last_closed: State,
    buf: String,
    seen_slash: bool,
    spatial_colon: bool,
    node_index: Option<usize>,
    step: Step,
}

/// Scan one step from the front of `input`
pub(crate) fn scan(input: &str) -> Result<Scanned> {
    let mut scanner = StepScanner::new();
    let mut escaped = false;
    let mut consumed = input.len();
    let mut crossed_boundary = false;

    let cursor = input
        .char_indices()
        .map(|(pos, ch)| (pos, Some(ch)))
        .chain(std::iter::once((input.len(), None)));

    for (pos, ch) in cursor {
        if ch == Some(ESCAPE) && !escaped {
            escaped = true;
            continue;
        }

        match scanner.feed(ch, escaped)? {
            Flow::Continue => escaped = false,
            Flow::End => {
                consumed = pos;
                break;
            }
            Flow::Boundary => {
                consumed = pos + BOUNDARY.len_utf8();
                crossed_boundary = true;
                break;
            }
        }
    }

    if consumed == 0 {
        return Err(CfiError::Parse(format!(
            "Parsing failed: no progress at '{}'",
            input
        )));
    }

    let step = scanner.finish()?;
    tracing::trace!(?step, consumed, crossed_boundary, "Scanned CFI step");

    Ok(Scanned {
        step,
        consumed,
        crossed_boundary,
    })
}

impl StepScanner {
    fn new() -> Self {
        Self {
            state: State::Idle,
            last_closed: State::Idle,
            buf: String::new(),
            seen_slash: false,
            spatial_colon: false,
            node_index: None,
            step: Step::new(0),
        }
    }

    fn finish(self) -> Result<Step> {
        let node_index = self
            .node_index
            .ok_or_else(|| CfiError::Parse("Missing child node index in CFI".to_string()))?;

        Ok(Step {
            node_index,
            ..self.step
        })
    }

    /// Feed one character, `None` marking the end of input
    fn feed(&mut self, ch: Option<char>, escaped: bool) -> Result<Flow> {
        // Value states hand a non-matching character on to the idle state
        let absorbed = match self.state {
            State::Idle => false,
            State::Index => self.feed_index(ch)?,
            State::Offset => self.feed_offset(ch)?,
            State::Spatial => self.feed_spatial(ch),
            State::Temporal => self.feed_temporal(ch),
            State::NodeId => {
                self.feed_node_id(ch, escaped);
                true
            }
            State::Assertion => {
                self.feed_assertion(ch, escaped);
                true
            }
        };

        if absorbed {
            return Ok(Flow::Continue);
        }
        Ok(self.feed_idle(ch, escaped))
    }

    fn enter(&mut self, state: State) {
        self.last_closed = State::Idle;
        self.state = state;
    }

    fn close(&mut self) {
        self.last_closed = self.state;
        self.state = State::Idle;
    }

    fn feed_idle(&mut self, ch: Option<char>, escaped: bool) -> Flow {
        let Some(c) = ch else {
            return Flow::Continue;
        };
        // Escaped characters are literals and never delimit anything
        if escaped {
            return Flow::Continue;
        }

        match c {
            BOUNDARY => Flow::Boundary,
            RANGE_SEPARATOR => Flow::End,
            '/' if self.seen_slash => Flow::End,
            '/' => {
                self.seen_slash = true;
                self.enter(State::Index);
                Flow::Continue
            }
            ':' => {
                self.enter(State::Offset);
                Flow::Continue
            }
            '~' => {
                self.enter(State::Temporal);
                Flow::Continue
            }
            '@' => {
                self.spatial_colon = false;
                self.enter(State::Spatial);
                Flow::Continue
            }
            '[' => {
                match self.last_closed {
                    State::Offset => self.enter(State::Assertion),
                    State::Index => self.enter(State::NodeId),
                    _ => {}
                }
                Flow::Continue
            }
            _ => Flow::Continue,
        }
    }

    fn feed_index(&mut self, ch: Option<char>) -> Result<bool> {
        if let Some(c) = ch.filter(char::is_ascii_digit) {
            self.buf.push(c);
            return Ok(true);
        }
        if let Some(index) = self.take_number("node index")? {
            self.node_index = Some(index);
        }
        self.close();
        Ok(false)
    }

    fn feed_offset(&mut self, ch: Option<char>) -> Result<bool> {
        if let Some(c) = ch.filter(char::is_ascii_digit) {
            self.buf.push(c);
            return Ok(true);
        }
        if let Some(offset) = self.take_number("character offset")? {
            self.step.offset = Some(offset);
        }
        self.close();
        Ok(false)
    }

    fn feed_spatial(&mut self, ch: Option<char>) -> bool {
        match ch {
            Some(c) if c.is_ascii_digit() || c == '.' || (c == ':' && !self.spatial_colon) => {
                if c == ':' {
                    self.spatial_colon = true;
                }
                self.buf.push(c);
                true
            }
            _ => {
                let raw = std::mem::take(&mut self.buf);
                if !raw.is_empty() && self.spatial_colon {
                    self.step.spatial = parse_spatial_range(&raw);
                }
                self.close();
                false
            }
        }
    }

    fn feed_temporal(&mut self, ch: Option<char>) -> bool {
        match ch {
            Some(c) if c.is_ascii_digit() || c == '.' => {
                self.buf.push(c);
                true
            }
            _ => {
                let raw = std::mem::take(&mut self.buf);
                if !raw.is_empty() {
                    self.step.temporal = parse_leading_float(&raw);
                }
                self.close();
                false
            }
        }
    }

    fn feed_node_id(&mut self, ch: Option<char>, escaped: bool) {
        match ch {
            Some(']') if !escaped => {
                let id = std::mem::take(&mut self.buf);
                self.step.node_id = (!id.is_empty()).then_some(id);
                self.close();
            }
            Some(c) => self.buf.push(c),
            None => {}
        }
    }

    fn feed_assertion(&mut self, ch: Option<char>, escaped: bool) {
        match ch {
            Some(']') if !escaped => {
                let loc = std::mem::take(&mut self.buf);
                self.close();
                self.apply_location(&loc);
            }
            Some(RANGE_SEPARATOR) if !escaped => {
                let pre = std::mem::take(&mut self.buf);
                self.step.text_location_assertion =
                    Some(TextLocationAssertion::split((!pre.is_empty()).then_some(pre)));
            }
            Some(c) => self.buf.push(c),
            None => {}
        }
    }

    /// Split a closed `[...]` body into its text and `;s=a|b` side bias
    fn apply_location(&mut self, loc: &str) {
        if loc.is_empty() {
            return;
        }

        let Some(caps) = SIDE_BIAS.captures(loc.trim()) else {
            self.set_assertion_text(loc.to_string());
            return;
        };

        let text = &caps[1];
        if !text.is_empty() {
            self.set_assertion_text(text.to_string());
        }
        self.step.side_bias = Some(if &caps[2] == "a" {
            SideBias::After
        } else {
            SideBias::Before
        });
    }

    fn set_assertion_text(&mut self, text: String) {
        match &mut self.step.text_location_assertion {
            Some(TextLocationAssertion::Split { post, .. }) => *post = Some(text),
            slot => *slot = Some(TextLocationAssertion::Text(text)),
        }
    }

    fn take_number(&mut self, what: &str) -> Result<Option<usize>> {
        if self.buf.is_empty() {
            return Ok(None);
        }
        let digits = std::mem::take(&mut self.buf);
        digits
            .parse()
            .map(Some)
            .map_err(|_| CfiError::Parse(format!("{} out of range: {}", what, digits)))
    }
}

/// Parse an `x:y` spatial range. Malformed input yields `None`.
///
/// Both bounds keep their fractional part, so `1.5:2.25` is `{1.5, 2.25}`
/// rather than being truncated to integers.
pub fn parse_spatial_range(range: &str) -> Option<SpatialRange> {
    let caps = SPATIAL_RANGE.captures(range.trim())?;
    let from = caps[1].parse().ok()?;
    let to = caps[2].parse().ok()?;
    Some(SpatialRange { from, to })
}

/// Parse the longest leading float of a digits-and-dots run (`1.2.3` is 1.2)
fn parse_leading_float(raw: &str) -> Option<f64> {
    let end = raw
        .match_indices('.')
        .nth(1)
        .map(|(pos, _)| pos)
        .unwrap_or(raw.len());
    raw[..end].parse().ok()
}
