//! Grammar matcher - ordered-choice recursive descent over a `Grammar`
//!
//! The matcher is grammar-agnostic: rule names and alternative labels are
//! type parameters, supplied by whichever grammar is being run.
//!
//! # Semantics
//!
//! - Choice alternatives are tried in declaration order; the first one that
//!   matches commits and later alternatives are never consulted.
//! - Sequences rewind to their start position when any item fails.
//! - Repetitions are greedy. An iteration that consumes nothing is a usage
//!   error (grammar construction already rejects nullable bodies).
//! - Lookaheads never consume input, and failures inside them are not
//!   reported as expectations.
//!
//! On failure the error names the furthest offset any alternative reached
//! and everything that would have been accepted there.

pub mod expr;
pub mod tree;

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::hash::Hash;

pub use expr::{
    and, any, choice, class, ilit, labeled, lit, not, opt, plus, rule, seq, star, Alternative,
    CharClass, Expr, Grammar, GrammarBuilder,
};
pub use tree::{Cst, ParseNode};

use crate::error::{ParseError, Span};
use crate::{Error, Result};

/// Longest source fragment quoted in a syntax error
const FRAGMENT_CHARS: usize = 24;

/// Position reached plus the values contributed, or `None` on a mismatch
type Step<R, L> = Option<(usize, Vec<Cst<R, L>>)>;

/// Matches one input text against one grammar
pub struct Matcher<'g, 'i, R, L> {
    grammar: &'g Grammar<R, L>,
    input: &'i str,
    furthest: usize,
    expected: BTreeSet<String>,
    quiet: usize,
}

impl<'g, 'i, R, L> Matcher<'g, 'i, R, L>
where
    R: Copy + Eq + Hash + Debug,
    L: Copy + Debug,
{
    pub fn new(grammar: &'g Grammar<R, L>, input: &'i str) -> Self {
        Matcher {
            grammar,
            input,
            furthest: 0,
            expected: BTreeSet::new(),
            quiet: 0,
        }
    }

    /// Match the entire input against the grammar's first rule
    pub fn parse(&mut self) -> Result<ParseNode<R, L>> {
        let start = self
            .grammar
            .start()
            .ok_or_else(|| Error::Usage(format!("grammar '{}' has no start rule", self.grammar.name())))?;
        self.parse_rule(start)
    }

    /// Match the entire input against `start`
    ///
    /// # Errors
    /// `Syntax` if the rule fails or leaves input unconsumed; `Usage` if a
    /// repetition stalls.
    pub fn parse_rule(&mut self, start: R) -> Result<ParseNode<R, L>> {
        match self.match_rule(start, 0)? {
            Some((end, node)) if end == self.input.len() => Ok(node),
            Some((end, _)) => {
                self.expect(end, || "end of input".to_string());
                Err(self.failure())
            }
            None => Err(self.failure()),
        }
    }

    fn failure(&self) -> Error {
        let offset = self.furthest;
        Error::Syntax(ParseError {
            grammar: self.grammar.name().to_string(),
            offset,
            span: Span::locate(self.input, offset),
            expected: self.expected.iter().cloned().collect(),
            fragment: self.input[offset..].chars().take(FRAGMENT_CHARS).collect(),
        })
    }

    /// Record what would have matched at `pos`, keeping only the furthest
    fn expect(&mut self, pos: usize, what: impl FnOnce() -> String) {
        if self.quiet > 0 || pos < self.furthest {
            return;
        }
        if pos > self.furthest {
            self.furthest = pos;
            self.expected.clear();
        }
        self.expected.insert(what());
    }

    // ── Rules & choices ────────────────────────────────

    fn match_rule(&mut self, name: R, pos: usize) -> Result<Option<(usize, ParseNode<R, L>)>> {
        let grammar = self.grammar;
        let body = grammar
            .body(name)
            .ok_or_else(|| Error::Usage(format!("no rule named {:?}", name)))?;

        let (end, alt, children) = match body {
            Expr::Choice(alts) => match self.match_choice(alts, pos)? {
                Some(found) => found,
                None => return Ok(None),
            },
            other => match self.match_expr(other, pos)? {
                Some((end, children)) => (end, None, children),
                None => return Ok(None),
            },
        };

        Ok(Some((
            end,
            ParseNode {
                rule: name,
                alt,
                span: pos..end,
                children,
            },
        )))
    }

    #[allow(clippy::type_complexity)]
    fn match_choice(
        &mut self,
        alts: &'g [Alternative<R, L>],
        pos: usize,
    ) -> Result<Option<(usize, Option<L>, Vec<Cst<R, L>>)>> {
        for alt in alts {
            if let Some((end, children)) = self.match_expr(&alt.expr, pos)? {
                return Ok(Some((end, alt.label, children)));
            }
        }
        Ok(None)
    }

    // ── Expressions ────────────────────────────────────

    fn match_expr(&mut self, expr: &'g Expr<R, L>, pos: usize) -> Result<Step<R, L>> {
        match expr {
            Expr::Literal { text, fold_case } => {
                let end = if *fold_case {
                    self.match_folded(text, pos)
                } else if self.input[pos..].starts_with(text.as_str()) {
                    Some(pos + text.len())
                } else {
                    None
                };
                Ok(match end {
                    Some(end) => Some((end, vec![Cst::Terminal(pos..end)])),
                    None => {
                        self.expect(pos, || format!("{:?}", text));
                        None
                    }
                })
            }
            Expr::Class(class) => {
                let found = self.input[pos..].chars().next().filter(|&c| class.accepts(c));
                Ok(self.single(pos, found, || class.describe().to_string()))
            }
            Expr::Any => {
                let found = self.input[pos..].chars().next();
                Ok(self.single(pos, found, || "any character".to_string()))
            }
            Expr::Rule(name) => Ok(self
                .match_rule(*name, pos)?
                .map(|(end, node)| (end, vec![Cst::Node(node)]))),
            Expr::Seq(items) => {
                let mut cur = pos;
                let mut values = Vec::new();
                for item in items {
                    match self.match_expr(item, cur)? {
                        Some((end, mut contributed)) => {
                            cur = end;
                            values.append(&mut contributed);
                        }
                        None => return Ok(None),
                    }
                }
                Ok(Some((cur, values)))
            }
            Expr::Choice(alts) => Ok(self
                .match_choice(alts, pos)?
                .map(|(end, _, children)| (end, children))),
            Expr::ZeroOrMore(inner) => self.repeat(inner, pos, 0),
            Expr::OneOrMore(inner) => self.repeat(inner, pos, 1),
            Expr::Optional(inner) => Ok(Some(match self.match_expr(inner, pos)? {
                Some((end, values)) => (end, vec![Cst::Iter(vec![bundle(values)])]),
                None => (pos, vec![Cst::Iter(Vec::new())]),
            })),
            Expr::Not(inner) => {
                let found = self.lookahead(inner, pos)?;
                Ok(if found { None } else { Some((pos, Vec::new())) })
            }
            Expr::And(inner) => {
                let found = self.lookahead(inner, pos)?;
                Ok(if found { Some((pos, Vec::new())) } else { None })
            }
        }
    }

    fn single(
        &mut self,
        pos: usize,
        found: Option<char>,
        what: impl FnOnce() -> String,
    ) -> Step<R, L> {
        match found {
            Some(ch) => {
                let end = pos + ch.len_utf8();
                Some((end, vec![Cst::Terminal(pos..end)]))
            }
            None => {
                self.expect(pos, what);
                None
            }
        }
    }

    fn match_folded(&self, text: &str, pos: usize) -> Option<usize> {
        let mut actual = self.input[pos..].char_indices();
        let mut end = pos;
        for wanted in text.chars() {
            let (i, ch) = actual.next()?;
            if !ch.to_lowercase().eq(wanted.to_lowercase()) {
                return None;
            }
            end = pos + i + ch.len_utf8();
        }
        Some(end)
    }

    fn lookahead(&mut self, inner: &'g Expr<R, L>, pos: usize) -> Result<bool> {
        self.quiet += 1;
        let outcome = self.match_expr(inner, pos);
        self.quiet -= 1;
        Ok(outcome?.is_some())
    }

    fn repeat(&mut self, inner: &'g Expr<R, L>, pos: usize, min: usize) -> Result<Step<R, L>> {
        let mut cur = pos;
        let mut items = Vec::new();
        while let Some((end, values)) = self.match_expr(inner, cur)? {
            if end == cur {
                return Err(Error::Usage(format!(
                    "repetition matched the empty string at offset {}",
                    cur
                )));
            }
            items.push(bundle(values));
            cur = end;
        }
        if items.len() < min {
            return Ok(None);
        }
        Ok(Some((cur, vec![Cst::Iter(items)])))
    }
}

/// One iteration's values as a single entry
fn bundle<R, L>(mut values: Vec<Cst<R, L>>) -> Cst<R, L> {
    if values.len() == 1 {
        values.remove(0)
    } else {
        Cst::Group(values)
    }
}
