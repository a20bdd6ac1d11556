//! The `gridprepass` grammar
//!
//! A flat, line-preserving view of GridLang source: every character of the
//! input belongs to exactly one unit (newline, string, keyword, comment,
//! identifier, or anything else). Keywords are matched case-insensitively
//! and only when they are not the prefix of a longer identifier.

use crate::matcher::{
    any, choice, class, ilit, labeled, lit, not, plus, rule, seq, star, CharClass, Expr, Grammar,
    GrammarBuilder,
};
use crate::{Error, Result};

/// Diagnostic name of the grammar
pub const GRAMMAR_NAME: &str = "gridprepass";

/// Rules of the grammar, in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    Document,
    Unit,
    Keyword,
    StringLiteral,
    StrChar,
    Ident,
    IdTail,
    Comment,
    Newline,
}

/// Alternatives of `unit`, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitAlt {
    Newline,
    String,
    Keyword,
    Comment,
    Ident,
    Other,
}

/// Alternatives of a string character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrCharAlt {
    /// `""` inside a string
    EscapedQuote,
    Other,
}

/// Reserved words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    With,
    Type,
    To,
    Then,
    Text,
    Super,
    Subprocess,
    Step,
    Return,
    Push,
    PrivateHelper,
    Output,
    OrEq,
    Or,
    Of,
    Number,
    Not,
    New,
    Mod,
    Let,
    Label,
    Input,
    Init,
    Index,
    In,
    If,
    Function,
    For,
    End,
    ElseIf,
    Else,
    Do,
    Dim,
    Define,
    As,
    And,
}

/// (keyword, source spelling, canonical spelling), in matching order
static KEYWORDS: [(Keyword, &str, &str); 36] = [
    (Keyword::With, "with", "with"),
    (Keyword::Type, "type", "Type"),
    (Keyword::To, "to", "to"),
    (Keyword::Then, "then", "Then"),
    (Keyword::Text, "text", "text"),
    (Keyword::Super, "super", "Super"),
    (Keyword::Subprocess, "subprocess", "Subprocess"),
    (Keyword::Step, "step", "step"),
    (Keyword::Return, "return", "Return"),
    (Keyword::Push, "push", "Push"),
    (Keyword::PrivateHelper, "privatehelper", "PrivateHelper"),
    (Keyword::Output, "output", "Output"),
    (Keyword::OrEq, "or=", "or="),
    (Keyword::Or, "or", "OR"),
    (Keyword::Of, "of", "of"),
    (Keyword::Number, "number", "number"),
    (Keyword::Not, "not", "not"),
    (Keyword::New, "new", "new"),
    (Keyword::Mod, "mod", "mod"),
    (Keyword::Let, "let", "Let"),
    (Keyword::Label, "label", "Label"),
    (Keyword::Input, "input", "Input"),
    (Keyword::Init, "init", "init"),
    (Keyword::Index, "index", "index"),
    (Keyword::In, "in", "in"),
    (Keyword::If, "if", "If"),
    (Keyword::Function, "function", "Function"),
    (Keyword::For, "for", "For"),
    (Keyword::End, "end", "End"),
    (Keyword::ElseIf, "elseif", "ElseIf"),
    (Keyword::Else, "else", "Else"),
    (Keyword::Do, "do", "do"),
    (Keyword::Dim, "dim", "dim"),
    (Keyword::Define, "define", "Define"),
    (Keyword::As, "as", "as"),
    (Keyword::And, "and", "AND"),
];

impl Keyword {
    /// Every keyword, in the order the grammar tries them
    pub fn all() -> impl Iterator<Item = Keyword> {
        KEYWORDS.iter().map(|(kw, _, _)| *kw)
    }

    fn entry(self) -> &'static (Keyword, &'static str, &'static str) {
        // KEYWORDS is declared in variant order
        &KEYWORDS[self as usize]
    }

    /// Lowercase spelling matched in source
    pub fn spelling(self) -> &'static str {
        self.entry().1
    }

    /// Fixed spelling expected by the case-sensitive stage
    pub fn canonical_spelling(self) -> &'static str {
        self.entry().2
    }

    /// Whether the keyword must not be followed by an identifier character
    fn needs_boundary(self) -> bool {
        self.spelling()
            .chars()
            .last()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
    }
}

/// Label attached to the winning branch of a labeled choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alt {
    Unit(UnitAlt),
    Keyword(Keyword),
    StrChar(StrCharAlt),
}

/// A rule paired with the alternative it matched; the key actions
/// dispatch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Production {
    Document,
    Unit(UnitAlt),
    Keyword(Keyword),
    StringLiteral,
    StrChar(StrCharAlt),
    Ident,
    IdTail,
    Comment,
    Newline,
}

impl Production {
    /// Classify a parse node.
    ///
    /// # Errors
    /// `Usage` if the alternative label does not belong to the rule.
    pub fn of(rule: Rule, alt: Option<Alt>) -> Result<Production> {
        let mismatch = || {
            Error::Usage(format!(
                "rule {:?} cannot carry alternative {:?}",
                rule, alt
            ))
        };
        let plain = |production: Production| match alt {
            None => Ok(production),
            Some(_) => Err(mismatch()),
        };

        match rule {
            Rule::Document => plain(Production::Document),
            Rule::Unit => match alt {
                Some(Alt::Unit(a)) => Ok(Production::Unit(a)),
                _ => Err(mismatch()),
            },
            Rule::Keyword => match alt {
                Some(Alt::Keyword(k)) => Ok(Production::Keyword(k)),
                _ => Err(mismatch()),
            },
            Rule::StringLiteral => plain(Production::StringLiteral),
            Rule::StrChar => match alt {
                Some(Alt::StrChar(a)) => Ok(Production::StrChar(a)),
                _ => Err(mismatch()),
            },
            Rule::Ident => plain(Production::Ident),
            Rule::IdTail => plain(Production::IdTail),
            Rule::Comment => plain(Production::Comment),
            Rule::Newline => plain(Production::Newline),
        }
    }
}

type GExpr = Expr<Rule, Alt>;

fn keyword_body() -> GExpr {
    labeled(Keyword::all().map(|kw| {
        let word = ilit(kw.spelling());
        let expr = if kw.needs_boundary() {
            seq([word, not(rule(Rule::IdTail))])
        } else {
            word
        };
        (Alt::Keyword(kw), expr)
    }))
}

/// Build the `gridprepass` grammar
pub fn gridprepass() -> Result<Grammar<Rule, Alt>> {
    let quote = || lit("\"");

    GrammarBuilder::new(GRAMMAR_NAME)
        .rule(Rule::Document, plus(rule(Rule::Unit)))
        .rule(
            Rule::Unit,
            labeled([
                (Alt::Unit(UnitAlt::Newline), rule(Rule::Newline)),
                (Alt::Unit(UnitAlt::String), rule(Rule::StringLiteral)),
                (Alt::Unit(UnitAlt::Keyword), rule(Rule::Keyword)),
                (Alt::Unit(UnitAlt::Comment), rule(Rule::Comment)),
                (Alt::Unit(UnitAlt::Ident), rule(Rule::Ident)),
                (Alt::Unit(UnitAlt::Other), seq([not(quote()), any()])),
            ]),
        )
        .rule(Rule::Keyword, keyword_body())
        .rule(
            Rule::StringLiteral,
            seq([quote(), star(rule(Rule::StrChar)), quote()]),
        )
        .rule(
            Rule::StrChar,
            labeled([
                (Alt::StrChar(StrCharAlt::EscapedQuote), seq([quote(), quote()])),
                (Alt::StrChar(StrCharAlt::Other), seq([not(quote()), any()])),
            ]),
        )
        .rule(
            Rule::Ident,
            seq([
                choice([class(CharClass::Letter), lit("_")]),
                star(rule(Rule::IdTail)),
            ]),
        )
        .rule(
            Rule::IdTail,
            choice([class(CharClass::Alnum), lit("_")]),
        )
        .rule(
            Rule::Comment,
            seq([
                lit("'"),
                star(seq([not(rule(Rule::Newline)), any()])),
                rule(Rule::Newline),
            ]),
        )
        .rule(
            Rule::Newline,
            choice([lit("\r\n"), lit("\n")]),
        )
        .build()
}
