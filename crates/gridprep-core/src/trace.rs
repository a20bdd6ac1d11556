//! Rule trace - append-only record of action invocations
//!
//! When tracing is enabled the renderer appends one `Enter` entry before a
//! production's children are rendered and one `Exit` entry after its
//! action returns, so the log nests exactly like the parse tree.

use serde::{Deserialize, Serialize};

/// Which side of an action invocation an entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceEvent {
    Enter,
    Exit,
}

/// A single entry in the rule trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Fixed-point pass the entry belongs to (1-based)
    pub pass: usize,
    /// Nesting depth of the production (0 for the document)
    pub depth: usize,
    pub event: TraceEvent,
    /// Production name, e.g. `Keyword(Then)`
    pub production: String,
}

impl std::fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verb = match self.event {
            TraceEvent::Enter => "enter",
            TraceEvent::Exit => "exit",
        };
        write!(
            f,
            "{:indent$}[{}] {} {}",
            "",
            self.pass,
            verb,
            self.production,
            indent = self.depth
        )
    }
}

/// Append-only trace log, disabled unless asked for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTrace {
    enabled: bool,
    pass: usize,
    depth: usize,
    pub entries: Vec<TraceEntry>,
}

impl RuleTrace {
    pub fn new(enabled: bool) -> Self {
        RuleTrace {
            enabled,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Start numbering entries for the next pass
    pub fn begin_pass(&mut self) {
        self.pass += 1;
        self.depth = 0;
    }

    pub fn enter(&mut self, production: impl FnOnce() -> String) {
        if self.enabled {
            self.push(TraceEvent::Enter, production());
            self.depth += 1;
        }
    }

    pub fn exit(&mut self, production: impl FnOnce() -> String) {
        if self.enabled {
            self.depth = self.depth.saturating_sub(1);
            self.push(TraceEvent::Exit, production());
        }
    }

    fn push(&mut self, event: TraceEvent, production: String) {
        self.entries.push(TraceEntry {
            pass: self.pass,
            depth: self.depth,
            event,
            production,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<TraceEntry> {
        self.entries
    }
}
