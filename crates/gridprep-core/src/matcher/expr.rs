//! Grammar expressions and grammar construction
//!
//! A grammar is an ordered table of rules. Rule bodies are `Expr` trees
//! built with the helper constructors below, then checked once by
//! `GrammarBuilder::build` so the matcher never has to guard against
//! unresolved references or repetitions that could loop forever.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::{Error, Result};

/// Character class tested against a single input character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// Any alphabetic character
    Letter,
    /// Any decimal digit
    Digit,
    /// Letter or digit
    Alnum,
}

impl CharClass {
    pub fn accepts(self, ch: char) -> bool {
        match self {
            CharClass::Letter => ch.is_alphabetic(),
            CharClass::Digit => ch.is_ascii_digit(),
            CharClass::Alnum => ch.is_alphanumeric(),
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            CharClass::Letter => "a letter",
            CharClass::Digit => "a digit",
            CharClass::Alnum => "an alphanumeric character",
        }
    }
}

/// One labeled branch of an ordered choice
#[derive(Debug, Clone, PartialEq)]
pub struct Alternative<R, L> {
    pub label: Option<L>,
    pub expr: Expr<R, L>,
}

/// A parsing expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr<R, L> {
    /// Exact text, optionally compared without regard to case
    Literal { text: String, fold_case: bool },
    /// One character from a class
    Class(CharClass),
    /// Any one character
    Any,
    /// Reference to another rule
    Rule(R),
    Seq(Vec<Expr<R, L>>),
    /// Ordered choice; the first matching alternative commits
    Choice(Vec<Alternative<R, L>>),
    ZeroOrMore(Box<Expr<R, L>>),
    OneOrMore(Box<Expr<R, L>>),
    Optional(Box<Expr<R, L>>),
    /// Negative lookahead
    Not(Box<Expr<R, L>>),
    /// Positive lookahead
    And(Box<Expr<R, L>>),
}

// ── Constructors ──────────────────────────────────────────

pub fn lit<R, L>(text: &str) -> Expr<R, L> {
    Expr::Literal { text: text.to_string(), fold_case: false }
}

/// Case-insensitive literal
pub fn ilit<R, L>(text: &str) -> Expr<R, L> {
    Expr::Literal { text: text.to_string(), fold_case: true }
}

pub fn class<R, L>(class: CharClass) -> Expr<R, L> {
    Expr::Class(class)
}

pub fn any<R, L>() -> Expr<R, L> {
    Expr::Any
}

pub fn rule<R, L>(name: R) -> Expr<R, L> {
    Expr::Rule(name)
}

pub fn seq<R, L>(items: impl IntoIterator<Item = Expr<R, L>>) -> Expr<R, L> {
    Expr::Seq(items.into_iter().collect())
}

/// Unlabeled ordered choice
pub fn choice<R, L>(items: impl IntoIterator<Item = Expr<R, L>>) -> Expr<R, L> {
    Expr::Choice(
        items
            .into_iter()
            .map(|expr| Alternative { label: None, expr })
            .collect(),
    )
}

/// Ordered choice whose winning branch is reported on the parse node
pub fn labeled<R, L>(items: impl IntoIterator<Item = (L, Expr<R, L>)>) -> Expr<R, L> {
    Expr::Choice(
        items
            .into_iter()
            .map(|(label, expr)| Alternative { label: Some(label), expr })
            .collect(),
    )
}

pub fn star<R, L>(expr: Expr<R, L>) -> Expr<R, L> {
    Expr::ZeroOrMore(Box::new(expr))
}

pub fn plus<R, L>(expr: Expr<R, L>) -> Expr<R, L> {
    Expr::OneOrMore(Box::new(expr))
}

pub fn opt<R, L>(expr: Expr<R, L>) -> Expr<R, L> {
    Expr::Optional(Box::new(expr))
}

pub fn not<R, L>(expr: Expr<R, L>) -> Expr<R, L> {
    Expr::Not(Box::new(expr))
}

pub fn and<R, L>(expr: Expr<R, L>) -> Expr<R, L> {
    Expr::And(Box::new(expr))
}

// ── Grammar ───────────────────────────────────────────────

/// An immutable, validated grammar
#[derive(Debug, Clone)]
pub struct Grammar<R, L> {
    name: String,
    rules: Vec<(R, Expr<R, L>)>,
    index: HashMap<R, usize>,
}

impl<R, L> Grammar<R, L>
where
    R: Copy + Eq + Hash + Debug,
    L: Copy + Debug,
{
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The first declared rule
    pub fn start(&self) -> Option<R> {
        self.rules.first().map(|(name, _)| *name)
    }

    pub fn body(&self, name: R) -> Option<&Expr<R, L>> {
        self.index.get(&name).map(|&i| &self.rules[i].1)
    }

    /// Rule names in declaration order
    pub fn rule_names(&self) -> impl Iterator<Item = R> + '_ {
        self.rules.iter().map(|(name, _)| *name)
    }
}

/// Collects rules in declaration order, then validates them
#[derive(Debug, Clone)]
pub struct GrammarBuilder<R, L> {
    name: String,
    rules: Vec<(R, Expr<R, L>)>,
}

impl<R, L> GrammarBuilder<R, L>
where
    R: Copy + Eq + Hash + Debug,
    L: Copy + Debug,
{
    pub fn new(name: &str) -> Self {
        GrammarBuilder { name: name.to_string(), rules: Vec::new() }
    }

    pub fn rule(mut self, name: R, body: Expr<R, L>) -> Self {
        self.rules.push((name, body));
        self
    }

    /// Validate and freeze the grammar
    ///
    /// # Errors
    /// `Grammar` if the grammar is empty, a rule is declared twice, a rule
    /// reference does not resolve, or a repetition body can match the
    /// empty string.
    pub fn build(self) -> Result<Grammar<R, L>> {
        if self.rules.is_empty() {
            return Err(Error::Grammar(format!("grammar '{}' has no rules", self.name)));
        }

        let mut index = HashMap::new();
        for (i, (name, _)) in self.rules.iter().enumerate() {
            if index.insert(*name, i).is_some() {
                return Err(Error::Grammar(format!(
                    "rule {:?} is declared more than once in grammar '{}'",
                    name, self.name
                )));
            }
        }

        for (name, body) in &self.rules {
            check_references(body, &index, *name)?;
        }

        let nullable = nullable_rules(&self.rules, &index);
        for (name, body) in &self.rules {
            check_repetitions(body, &index, &nullable, *name)?;
        }

        Ok(Grammar { name: self.name, rules: self.rules, index })
    }
}

fn check_references<R, L>(expr: &Expr<R, L>, index: &HashMap<R, usize>, owner: R) -> Result<()>
where
    R: Copy + Eq + Hash + Debug,
{
    match expr {
        Expr::Rule(name) if !index.contains_key(name) => Err(Error::Grammar(format!(
            "rule {:?} refers to undefined rule {:?}",
            owner, name
        ))),
        Expr::Literal { .. } | Expr::Class(_) | Expr::Any | Expr::Rule(_) => Ok(()),
        Expr::Seq(items) => items.iter().try_for_each(|e| check_references(e, index, owner)),
        Expr::Choice(alts) => alts
            .iter()
            .try_for_each(|alt| check_references(&alt.expr, index, owner)),
        Expr::ZeroOrMore(inner)
        | Expr::OneOrMore(inner)
        | Expr::Optional(inner)
        | Expr::Not(inner)
        | Expr::And(inner) => check_references(inner, index, owner),
    }
}

/// Least fixed point of "rule can succeed without consuming input"
fn nullable_rules<R, L>(rules: &[(R, Expr<R, L>)], index: &HashMap<R, usize>) -> Vec<bool>
where
    R: Copy + Eq + Hash,
{
    let mut nullable = vec![false; rules.len()];
    loop {
        let mut changed = false;
        for (i, (_, body)) in rules.iter().enumerate() {
            if !nullable[i] && is_nullable(body, index, &nullable) {
                nullable[i] = true;
                changed = true;
            }
        }
        if !changed {
            return nullable;
        }
    }
}

fn is_nullable<R, L>(expr: &Expr<R, L>, index: &HashMap<R, usize>, nullable: &[bool]) -> bool
where
    R: Copy + Eq + Hash,
{
    match expr {
        Expr::Literal { text, .. } => text.is_empty(),
        Expr::Class(_) | Expr::Any => false,
        Expr::Rule(name) => index.get(name).is_some_and(|&i| nullable[i]),
        Expr::Seq(items) => items.iter().all(|e| is_nullable(e, index, nullable)),
        Expr::Choice(alts) => alts.iter().any(|alt| is_nullable(&alt.expr, index, nullable)),
        Expr::OneOrMore(inner) => is_nullable(inner, index, nullable),
        Expr::ZeroOrMore(_) | Expr::Optional(_) | Expr::Not(_) | Expr::And(_) => true,
    }
}

fn check_repetitions<R, L>(
    expr: &Expr<R, L>,
    index: &HashMap<R, usize>,
    nullable: &[bool],
    owner: R,
) -> Result<()>
where
    R: Copy + Eq + Hash + Debug,
{
    match expr {
        Expr::ZeroOrMore(inner) | Expr::OneOrMore(inner) => {
            if is_nullable(inner, index, nullable) {
                return Err(Error::Grammar(format!(
                    "repetition in rule {:?} can match the empty string",
                    owner
                )));
            }
            check_repetitions(inner, index, nullable, owner)
        }
        Expr::Literal { .. } | Expr::Class(_) | Expr::Any | Expr::Rule(_) => Ok(()),
        Expr::Seq(items) => items
            .iter()
            .try_for_each(|e| check_repetitions(e, index, nullable, owner)),
        Expr::Choice(alts) => alts
            .iter()
            .try_for_each(|alt| check_repetitions(&alt.expr, index, nullable, owner)),
        Expr::Optional(inner) | Expr::Not(inner) | Expr::And(inner) => {
            check_repetitions(inner, index, nullable, owner)
        }
    }
}
