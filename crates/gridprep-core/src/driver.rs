//! Rewrite driver - runs parse-and-render passes until a fixed point
//!
//! The driver owns the shared state for a run. Each pass sets the
//! termination flag to "stop" before matching, so a single pass is the
//! default; an action that wants the output fed back in clears the flag.
//! A failure in any pass aborts the run and no text is returned.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::actions::{self, Actions, ModeActions};
use crate::config::{CanonConfig, LineNumbering, DEFAULT_MAX_PASSES};
use crate::grammar::{self, Alt, Rule};
use crate::matcher::{Grammar, Matcher};
use crate::state::RewriteState;
use crate::trace::{RuleTrace, TraceEntry};
use crate::{Error, Result};

// ── Public API ─────────────────────────────────────────────

/// Knobs the fixed-point loop honours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverOptions {
    pub max_passes: usize,
    pub line_numbering: LineNumbering,
    pub trace: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        DriverOptions {
            max_passes: DEFAULT_MAX_PASSES,
            line_numbering: LineNumbering::default(),
            trace: false,
        }
    }
}

impl From<&CanonConfig> for DriverOptions {
    fn from(config: &CanonConfig) -> Self {
        DriverOptions {
            max_passes: config.max_passes,
            line_numbering: config.line_numbering,
            trace: config.trace,
        }
    }
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Canonicalized {
    /// Text produced by the last pass
    pub text: String,
    /// Number of passes run
    pub passes: usize,
    /// Last line number stamped
    pub lines: u64,
    /// Rule trace, empty unless tracing was enabled
    pub trace: Vec<TraceEntry>,
}

/// Run passes of `grammar` + `actions` over `source` until no action asks
/// for another one.
///
/// # Errors
/// The first error raised by any pass, or `PassLimit` when the run is
/// still asking for passes after `options.max_passes`.
pub fn rewrite<A: Actions>(
    grammar: &Grammar<Rule, Alt>,
    source: &str,
    actions: &mut A,
    state: &mut RewriteState,
    options: &DriverOptions,
) -> Result<Canonicalized> {
    let mut trace = RuleTrace::new(options.trace);
    let mut text = source.to_string();
    let mut passes = 0;

    state.termination.request_continue();
    while !state.termination.is_stopped() {
        if passes >= options.max_passes {
            return Err(Error::PassLimit {
                limit: options.max_passes,
            });
        }
        state.termination.request_stop();
        if options.line_numbering == LineNumbering::ResetEachPass {
            state.lines.reset();
        }
        trace.begin_pass();

        let tree = Matcher::new(grammar, &text).parse()?;
        text = actions::render(&tree, &text, actions, state, &mut trace)?;
        passes += 1;
    }

    Ok(Canonicalized {
        text,
        passes,
        lines: state.lines.current(),
        trace: trace.into_entries(),
    })
}

/// SHA-256 of canonical text, lowercase hex
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let result = hasher.finalize();
    format!("{:x}", result)
}

// ── Canonicalizer ──────────────────────────────────────────

/// A configured canonicalizer; the grammar is built once and reused
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    config: CanonConfig,
    grammar: Grammar<Rule, Alt>,
}

impl Canonicalizer {
    /// # Errors
    /// `Config` for an invalid configuration, `Grammar` if the grammar
    /// fails to build.
    pub fn new(config: CanonConfig) -> Result<Self> {
        config.validate()?;
        let grammar = grammar::gridprepass()?;
        Ok(Canonicalizer { config, grammar })
    }

    pub fn config(&self) -> &CanonConfig {
        &self.config
    }

    /// Canonicalize `source` with fresh state
    pub fn run(&self, source: &str) -> Result<Canonicalized> {
        let mut state = RewriteState::new();
        let mut actions = ModeActions::from_config(&self.config);
        rewrite(
            &self.grammar,
            source,
            &mut actions,
            &mut state,
            &DriverOptions::from(&self.config),
        )
    }
}
