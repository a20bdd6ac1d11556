//! GridLang prepass - grammar-driven source canonicalizer
//!
//! Rewrites GridLang source into one fixed textual form before the
//! case-sensitive main parser sees it: keywords and identifiers get a
//! single spelling, comments are dropped, string escapes are collapsed, and
//! every line terminator is stamped with a positional marker so later
//! stages can recover source line numbers.
//!
//! # Architecture
//!
//! ```text
//! Source → Matcher (gridprepass grammar) → Parse Tree
//!                                              ↓
//!                                  Action Table (render bottom-up)
//!                                              ↓
//!          Driver ← termination flag ← Rendered Text → Canonical Text
//!            ↓
//!          next pass (only when an action asks for it)
//! ```
//!
//! # Guarantees
//!
//! - **Deterministic**: Same input always produces identical output
//! - **All or nothing**: A failing pass returns an error and no text
//! - **One marker per line**: Markers ascend once per line terminator
//! - **Exhaustive actions**: Every production has an action in every table

pub mod actions;
pub mod config;
pub mod driver;
pub mod error;
pub mod grammar;
pub mod matcher;
pub mod state;
pub mod trace;

pub use actions::{Actions, CanonicalSpellingActions, LowercaseActions};
pub use config::{CanonConfig, LineNumbering, Mode};
pub use driver::{fingerprint, rewrite, Canonicalized, Canonicalizer, DriverOptions};
pub use error::{Error, ParseError, Result, Span};
pub use grammar::{gridprepass, Keyword, Production, GRAMMAR_NAME};
pub use state::{strip_markers, RewriteState};

/// Canonicalize `source` with the default configuration for `mode`
///
/// # Errors
/// `Syntax` when the source does not match the grammar; any error an
/// action raises.
pub fn canonicalize(source: &str, mode: Mode) -> Result<String> {
    let canonicalizer = Canonicalizer::new(CanonConfig::with_mode(mode))?;
    Ok(canonicalizer.run(source)?.text)
}
