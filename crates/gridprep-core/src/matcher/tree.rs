//! Concrete parse tree produced by the matcher

use std::ops::Range;

/// A value contributed by one sub-expression of a rule body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cst<R, L> {
    /// Text consumed by a literal, character class, or `any`
    Terminal(Range<usize>),
    /// A successfully matched rule
    Node(ParseNode<R, L>),
    /// One entry per iteration of a repetition, or zero/one for an optional
    Iter(Vec<Cst<R, L>>),
    /// Several values produced by one iteration of a repeated sequence
    Group(Vec<Cst<R, L>>),
}

/// The result of matching a rule at a position.
///
/// `alt` is set when the rule body is a labeled choice and names the
/// alternative that won. `children` holds one entry per sub-expression
/// that contributes a value; lookaheads contribute nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNode<R, L> {
    pub rule: R,
    pub alt: Option<L>,
    pub span: Range<usize>,
    pub children: Vec<Cst<R, L>>,
}

impl<R, L> ParseNode<R, L> {
    /// The source text this node matched
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.span.clone()]
    }
}
