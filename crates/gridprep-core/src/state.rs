//! Shared rewrite state - line counter, parameter stacks, termination flag
//!
//! All of it is owned by the rewrite driver and lent to the matcher and the
//! action table for one pass at a time. Nothing here is global.

use std::collections::BTreeMap;

use crate::{Error, Result};

/// Opening bracket of a positional marker
pub const MARKER_OPEN: char = '⎩';
/// Closing bracket of a positional marker
pub const MARKER_CLOSE: char = '⎭';

/// Format the positional marker for line `n`
pub fn marker(n: u64) -> String {
    format!("{}{}{}", MARKER_OPEN, n, MARKER_CLOSE)
}

/// Remove every positional marker from `text`, along with the blanks
/// placed directly in front of it.
///
/// A `⎩` that is not followed by digits and `⎭` is left alone.
pub fn strip_markers(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(MARKER_OPEN) {
        let after_open = &rest[start + MARKER_OPEN.len_utf8()..];
        let digits = after_open
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(after_open.len());
        let closed = digits > 0 && after_open[digits..].starts_with(MARKER_CLOSE);

        if closed {
            out.push_str(rest[..start].trim_end_matches(' '));
            rest = &after_open[digits + MARKER_CLOSE.len_utf8()..];
        } else {
            out.push_str(&rest[..start + MARKER_OPEN.len_utf8()]);
            rest = after_open;
        }
    }
    out.push_str(rest);
    out
}

// ── Line counter ──────────────────────────────────────────

/// Monotonic counter stamped into the output once per line terminator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineCounter {
    line: u64,
}

impl LineCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the counter and return the marker for the new line
    pub fn next_marker(&mut self) -> String {
        self.line += 1;
        marker(self.line)
    }

    /// The last line number handed out (0 before the first)
    pub fn current(&self) -> u64 {
        self.line
    }

    pub fn reset(&mut self) {
        self.line = 0;
    }
}

// ── Named parameter stacks ────────────────────────────────

/// Named stacks used by actions to thread context through nested rules.
///
/// Stacks are never cleared between passes; actions must keep pushes and
/// pops balanced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterStacks {
    stacks: BTreeMap<String, Vec<String>>,
}

impl ParameterStacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &str, value: impl Into<String>) {
        self.stacks
            .entry(name.to_string())
            .or_default()
            .push(value.into());
    }

    /// Remove and return the top of stack `name`
    ///
    /// # Errors
    /// `Usage` if the stack is absent or empty.
    pub fn pop(&mut self, name: &str) -> Result<String> {
        self.stacks
            .get_mut(name)
            .and_then(Vec::pop)
            .ok_or_else(|| empty_stack(name))
    }

    /// Return the top of stack `name` without removing it
    ///
    /// # Errors
    /// `Usage` if the stack is absent or empty.
    pub fn peek(&self, name: &str) -> Result<&str> {
        self.stacks
            .get(name)
            .and_then(|stack| stack.last())
            .map(String::as_str)
            .ok_or_else(|| empty_stack(name))
    }

    pub fn depth(&self, name: &str) -> usize {
        self.stacks.get(name).map_or(0, Vec::len)
    }
}

fn empty_stack(name: &str) -> Error {
    Error::Usage(format!("parameter stack '{}' is empty", name))
}

// ── Termination flag ──────────────────────────────────────

/// Whether the rewrite driver should stop after the current pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TerminationFlag {
    stopped: bool,
}

impl TerminationFlag {
    /// Mark the current pass as the last one
    pub fn request_stop(&mut self) {
        self.stopped = true;
    }

    /// Ask the driver for another pass over the rendered text
    pub fn request_continue(&mut self) {
        self.stopped = false;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

// ── Aggregate ─────────────────────────────────────────────

/// Everything an action may read or mutate during a pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteState {
    pub lines: LineCounter,
    pub parameters: ParameterStacks,
    pub termination: TerminationFlag,
}

impl RewriteState {
    pub fn new() -> Self {
        Self::default()
    }
}
