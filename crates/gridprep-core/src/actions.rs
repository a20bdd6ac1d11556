//! Semantic action table - renders a parse tree into canonical text
//!
//! Rendering is a bottom-up fold: every child of a node is rendered into an
//! owned `Value` first, then the node's action combines those values. An
//! action is selected by `Production`, i.e. by rule and winning
//! alternative together, and every action table matches on it
//! exhaustively.
//!
//! Two tables share the grammar:
//!
//! | Production | `LowercaseActions` | `CanonicalSpellingActions` |
//! |------------|--------------------|----------------------------|
//! | keyword    | lowercased source  | fixed spelling per keyword |
//! | identifier | lowercased         | lowercased inside `❲…❳`    |
//! | newline    | `⎩N⎭\n`            | `  ⎩N⎭\n`                  |
//! | comment    | its newline's rendering, optionally after `⎝text⎠` | same |
//! | string     | `""` collapsed to `"` | same |

use std::ops::Range;

use crate::config::{CanonConfig, Mode};
use crate::grammar::{Alt, Production, Rule, StrCharAlt};
use crate::matcher::{Cst, ParseNode};
use crate::state::RewriteState;
use crate::trace::RuleTrace;
use crate::{Error, Result};

pub const IDENT_OPEN: char = '❲';
pub const IDENT_CLOSE: char = '❳';
pub const COMMENT_OPEN: char = '⎝';
pub const COMMENT_CLOSE: char = '⎠';

/// A rendered child: text for nodes and terminals, a list for repetitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    List(Vec<Value>),
}

impl Value {
    /// The text of a single value
    ///
    /// # Errors
    /// `Usage` if the value is a list.
    pub fn text(&self) -> Result<&str> {
        match self {
            Value::Text(s) => Ok(s),
            Value::List(items) => Err(Error::Usage(format!(
                "expected a single value, found a list of {}",
                items.len()
            ))),
        }
    }

    /// All text in the value, in order
    pub fn concat(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::List(items) => items.iter().map(Value::concat).collect(),
        }
    }
}

/// What an action can see and touch besides its children
pub struct ActionContext<'a> {
    pub state: &'a mut RewriteState,
    pub source: &'a str,
    /// Source range matched by the node being rendered
    pub span: Range<usize>,
}

impl ActionContext<'_> {
    /// Source text matched by the node being rendered
    pub fn text(&self) -> &str {
        &self.source[self.span.clone()]
    }

    /// Check that the name closing a construct repeats the name opening it
    ///
    /// # Errors
    /// `SemanticMismatch` at the node's offset when the names differ.
    pub fn ensure_names_match(&self, opening: &str, closing: &str) -> Result<()> {
        if opening == closing {
            return Ok(());
        }
        Err(Error::SemanticMismatch {
            expected: opening.to_string(),
            found: closing.to_string(),
            offset: self.span.start,
        })
    }
}

/// One action table
pub trait Actions {
    fn apply(
        &mut self,
        production: Production,
        children: &[Value],
        cx: &mut ActionContext<'_>,
    ) -> Result<String>;
}

fn arg(children: &[Value], i: usize) -> Result<&Value> {
    children.get(i).ok_or_else(|| {
        Error::Usage(format!(
            "action expected at least {} values, got {}",
            i + 1,
            children.len()
        ))
    })
}

fn first_text(children: &[Value]) -> Result<String> {
    Ok(arg(children, 0)?.text()?.to_string())
}

fn string_literal(children: &[Value]) -> Result<String> {
    Ok(format!("\"{}\"", arg(children, 1)?.concat()))
}

fn lowercase_identifier(children: &[Value]) -> Result<String> {
    let head = arg(children, 0)?.text()?;
    let tail = arg(children, 1)?.concat();
    Ok(format!("{}{}", head, tail).to_lowercase())
}

/// A comment renders as its own terminating newline
fn comment(children: &[Value], keep_text: bool) -> Result<String> {
    let newline = arg(children, 2)?.text()?;
    if keep_text {
        let body = arg(children, 1)?.concat();
        Ok(format!("{}{}{}{}", COMMENT_OPEN, body, COMMENT_CLOSE, newline))
    } else {
        Ok(newline.to_string())
    }
}

// ── Lowercase table ───────────────────────────────────────

/// Lowercases keywords and identifiers
#[derive(Debug, Clone, Copy, Default)]
pub struct LowercaseActions {
    pub keep_comments: bool,
}

impl Actions for LowercaseActions {
    fn apply(
        &mut self,
        production: Production,
        children: &[Value],
        cx: &mut ActionContext<'_>,
    ) -> Result<String> {
        match production {
            Production::Document => Ok(arg(children, 0)?.concat()),
            Production::Unit(_) => first_text(children),
            Production::Keyword(_) => Ok(arg(children, 0)?.text()?.to_lowercase()),
            Production::StringLiteral => string_literal(children),
            Production::StrChar(StrCharAlt::EscapedQuote) => Ok("\"".to_string()),
            Production::StrChar(StrCharAlt::Other) => first_text(children),
            Production::Ident => lowercase_identifier(children),
            Production::IdTail => first_text(children),
            Production::Comment => comment(children, self.keep_comments),
            Production::Newline => Ok(format!("{}\n", cx.state.lines.next_marker())),
        }
    }
}

// ── Canonical-spelling table ──────────────────────────────

/// Spells keywords from the fixed table and delimits identifiers
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalSpellingActions {
    pub keep_comments: bool,
}

impl Actions for CanonicalSpellingActions {
    fn apply(
        &mut self,
        production: Production,
        children: &[Value],
        cx: &mut ActionContext<'_>,
    ) -> Result<String> {
        match production {
            Production::Document => Ok(arg(children, 0)?.concat()),
            Production::Unit(_) => first_text(children),
            Production::Keyword(kw) => Ok(kw.canonical_spelling().to_string()),
            Production::StringLiteral => string_literal(children),
            Production::StrChar(StrCharAlt::EscapedQuote) => Ok("\"".to_string()),
            Production::StrChar(StrCharAlt::Other) => first_text(children),
            Production::Ident => Ok(format!(
                "{}{}{}",
                IDENT_OPEN,
                lowercase_identifier(children)?,
                IDENT_CLOSE
            )),
            Production::IdTail => first_text(children),
            Production::Comment => comment(children, self.keep_comments),
            Production::Newline => Ok(format!("  {}\n", cx.state.lines.next_marker())),
        }
    }
}

/// The table selected by a configuration
#[derive(Debug, Clone, Copy)]
pub enum ModeActions {
    Lowercase(LowercaseActions),
    CanonicalSpelling(CanonicalSpellingActions),
}

impl ModeActions {
    pub fn from_config(config: &CanonConfig) -> Self {
        let keep_comments = config.keep_comments;
        match config.mode {
            Mode::Lowercase => ModeActions::Lowercase(LowercaseActions { keep_comments }),
            Mode::CanonicalSpelling => {
                ModeActions::CanonicalSpelling(CanonicalSpellingActions { keep_comments })
            }
        }
    }
}

impl Actions for ModeActions {
    fn apply(
        &mut self,
        production: Production,
        children: &[Value],
        cx: &mut ActionContext<'_>,
    ) -> Result<String> {
        match self {
            ModeActions::Lowercase(a) => a.apply(production, children, cx),
            ModeActions::CanonicalSpelling(a) => a.apply(production, children, cx),
        }
    }
}

// ── Rendering ─────────────────────────────────────────────

/// Render a parse tree of `source` with `actions`
///
/// # Errors
/// Whatever an action returns; `Usage` if a node carries a label that does
/// not belong to its rule.
pub fn render<A: Actions>(
    tree: &ParseNode<Rule, Alt>,
    source: &str,
    actions: &mut A,
    state: &mut RewriteState,
    trace: &mut RuleTrace,
) -> Result<String> {
    let mut renderer = Renderer {
        source,
        actions,
        state,
        trace,
    };
    renderer.node(tree)
}

struct Renderer<'r, A> {
    source: &'r str,
    actions: &'r mut A,
    state: &'r mut RewriteState,
    trace: &'r mut RuleTrace,
}

impl<A: Actions> Renderer<'_, A> {
    fn node(&mut self, node: &ParseNode<Rule, Alt>) -> Result<String> {
        let production = Production::of(node.rule, node.alt)?;
        self.trace.enter(|| format!("{:?}", production));

        let children = node
            .children
            .iter()
            .map(|child| self.value(child))
            .collect::<Result<Vec<_>>>()?;

        let mut cx = ActionContext {
            state: &mut *self.state,
            source: self.source,
            span: node.span.clone(),
        };
        let text = self.actions.apply(production, &children, &mut cx)?;

        self.trace.exit(|| format!("{:?}", production));
        Ok(text)
    }

    fn value(&mut self, cst: &Cst<Rule, Alt>) -> Result<Value> {
        match cst {
            Cst::Terminal(span) => Ok(Value::Text(self.source[span.clone()].to_string())),
            Cst::Node(node) => Ok(Value::Text(self.node(node)?)),
            Cst::Iter(items) | Cst::Group(items) => Ok(Value::List(
                items
                    .iter()
                    .map(|item| self.value(item))
                    .collect::<Result<Vec<_>>>()?,
            )),
        }
    }
}
