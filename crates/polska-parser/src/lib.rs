//! Polska Parser
//!
//! Backtracking recursive-descent parser for `begin ... end` assignment
//! programs, producing a parse tree and a reverse-Polish form of every
//! expression.

pub mod ast;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod source;

pub use ast::ParseNode;
pub use grammar::{Grammar, Rule};
pub use lexer::{Token, TokenClass, Tokenizer};
pub use parser::{Parser, ParserConfig};
pub use source::Source;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The single failure kind of the grammar engine.
///
/// `found` is already rendered for display: the token text in backticks, or
/// `<end>` when the input ran out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum ParseError {
    #[error("{rule}: expected {expected}, found {found}")]
    SyntaxError {
        rule: String,
        expected: String,
        found: String,
    },
}

impl ParseError {
    pub fn syntax(rule: Rule, expected: impl Into<String>, found: &Token) -> Self {
        ParseError::SyntaxError {
            rule: rule.name().to_string(),
            expected: expected.into(),
            found: found.describe(),
        }
    }

    /// Name of the rule that gave up.
    pub fn rule(&self) -> &str {
        match self {
            ParseError::SyntaxError { rule, .. } => rule,
        }
    }

    pub fn expected(&self) -> &str {
        match self {
            ParseError::SyntaxError { expected, .. } => expected,
        }
    }

    pub fn found(&self) -> &str {
        match self {
            ParseError::SyntaxError { found, .. } => found,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
