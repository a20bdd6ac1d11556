//! Canonicalizer configuration
//!
//! Configuration is plain data: it can be built in code, or read from a
//! JSON document where every field is optional.
//!
//! ```json
//! { "mode": "canonical-spelling", "line_numbering": "reset-each-pass" }
//! ```

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default bound on fixed-point passes
pub const DEFAULT_MAX_PASSES: usize = 64;

/// Which action table renders the parse
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Keywords and identifiers lowercased
    #[default]
    Lowercase,
    /// Keywords spelled from a fixed table, identifiers delimited
    CanonicalSpelling,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Lowercase => write!(f, "lowercase"),
            Mode::CanonicalSpelling => write!(f, "canonical-spelling"),
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lowercase" => Ok(Mode::Lowercase),
            "canonical-spelling" => Ok(Mode::CanonicalSpelling),
            other => Err(Error::Config(format!(
                "unknown mode '{}' (expected 'lowercase' or 'canonical-spelling')",
                other
            ))),
        }
    }
}

/// Lifetime of the line counter across fixed-point passes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineNumbering {
    /// One counter for the whole run
    #[default]
    Persist,
    /// Counter restarts at zero before every pass
    ResetEachPass,
}

/// Options for one canonicalizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanonConfig {
    pub mode: Mode,
    pub line_numbering: LineNumbering,
    /// Keep comment text inside `⎝…⎠` ahead of its marker
    pub keep_comments: bool,
    /// Record rule enter/exit events while rendering
    pub trace: bool,
    pub max_passes: usize,
}

impl Default for CanonConfig {
    fn default() -> Self {
        CanonConfig {
            mode: Mode::default(),
            line_numbering: LineNumbering::default(),
            keep_comments: false,
            trace: false,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

impl CanonConfig {
    /// Defaults with the given mode
    pub fn with_mode(mode: Mode) -> Self {
        CanonConfig {
            mode,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON configuration document
    ///
    /// # Errors
    /// `Config` for malformed JSON, unknown fields, or invalid values.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: CanonConfig =
            serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_passes == 0 {
            return Err(Error::Config("max_passes must be at least 1".to_string()));
        }
        Ok(())
    }
}
