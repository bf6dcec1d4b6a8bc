//! Tokenizer grouping characters into same-class runs

use crate::source::Source;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenClass {
    /// Uppercase letters.
    Identifier,
    /// Digits and lowercase letters, which also covers keywords.
    Constant,
    /// `(` and `)`, always one character per token.
    Grouping,
    Operator,
    Delimiter,
    Whitespace,
    /// End of input, or a run of characters no other class accepts.
    End,
}

impl TokenClass {
    pub fn of(ch: char) -> TokenClass {
        match ch {
            'A'..='Z' => TokenClass::Identifier,
            '0'..='9' | 'a'..='z' => TokenClass::Constant,
            '(' | ')' => TokenClass::Grouping,
            '=' | '!' | '<' | '>' | '+' | '-' | '*' | '/' => TokenClass::Operator,
            ';' => TokenClass::Delimiter,
            ' ' | '\t' | '\n' | '\r' | '\x0B' | '\x0C' => TokenClass::Whitespace,
            _ => TokenClass::End,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TokenClass::Identifier => "identifier",
            TokenClass::Constant => "constant",
            TokenClass::Grouping => "grouping",
            TokenClass::Operator => "operator",
            TokenClass::Delimiter => "delimiter",
            TokenClass::Whitespace => "whitespace",
            TokenClass::End => "end",
        }
    }
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub class: TokenClass,
    pub text: String,
}

impl Token {
    pub fn new(class: TokenClass, text: impl Into<String>) -> Self {
        Self {
            class,
            text: text.into(),
        }
    }

    pub fn end() -> Self {
        Self::new(TokenClass::End, "")
    }

    /// True only for the real end-of-input sentinel, not for stray text.
    pub fn is_end(&self) -> bool {
        self.class == TokenClass::End && self.text.is_empty()
    }

    pub fn is(&self, text: &str) -> bool {
        !self.is_end() && self.text == text
    }

    /// How the token reads in an error message.
    pub fn describe(&self) -> String {
        if self.is_end() {
            "<end>".to_string()
        } else {
            format!("`{}`", self.text)
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.class, self.describe())
    }
}

/// Pulls tokens off a [`Source`].
///
/// Holds at most one character of lookahead: the character that ended the
/// previous token. A clone carries that character along with the source
/// cursor, so a speculative clone replays exactly what the original would.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    source: Source,
    lookahead: Option<char>,
}

impl Tokenizer {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            lookahead: None,
        }
    }

    pub fn next_token(&mut self) -> Token {
        loop {
            let first = match self.lookahead.take().or_else(|| self.source.next_char()) {
                Some(ch) => ch,
                None => return Token::end(),
            };

            let class = TokenClass::of(first);
            let mut text = String::from(first);

            loop {
                match self.source.next_char() {
                    Some(ch) if class != TokenClass::Grouping && TokenClass::of(ch) == class => {
                        text.push(ch);
                    }
                    next => {
                        self.lookahead = next;
                        break;
                    }
                }
            }

            if class == TokenClass::Whitespace {
                continue;
            }

            let token = Token { class, text };
            trace!("Token {}", token);
            return token;
        }
    }

    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    pub fn restore(&mut self, snapshot: Tokenizer) {
        self.source.restore(&snapshot.source);
        self.lookahead = snapshot.lookahead;
    }
}

impl From<&str> for Tokenizer {
    fn from(text: &str) -> Self {
        Tokenizer::new(Source::new(text))
    }
}

/// Yields tokens up to, but not including, the end-of-input sentinel.
impl Iterator for Tokenizer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let token = self.next_token();
        if token.is_end() {
            None
        } else {
            Some(token)
        }
    }
}
