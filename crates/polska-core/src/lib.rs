//! Polska Core Engine
//!
//! Loads sources, runs the parser in the requested mode and renders what it
//! produced.

pub mod render;

pub use render::{postfix_listing, render, to_dot, Report};

use polska_parser::{ParseError, ParseNode, ParseResult, Parser, ParserConfig, Rule, Source, Token, Tokenizer};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

/// What the input is expected to be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// A whole `begin ... end` program.
    #[default]
    Program,
    /// A bare expression.
    Expr,
}

impl Mode {
    pub fn start_rule(&self) -> Rule {
        match self {
            Mode::Program => Rule::Program,
            Mode::Expr => Rule::Expr,
        }
    }

    pub fn default_output(&self) -> Output {
        match self {
            Mode::Program => Output::Tree,
            Mode::Expr => Output::Postfix,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.start_rule().name())
    }
}

impl FromStr for Mode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "program" => Ok(Mode::Program),
            "expr" => Ok(Mode::Expr),
            other => Err(EngineError::UnknownMode(other.to_string())),
        }
    }
}

/// How a successful parse is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Output {
    /// `{"ok": ..}` JSON.
    Report,
    /// Graphviz digraph of the parse tree.
    Tree,
    Postfix,
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Report => f.write_str("report"),
            Output::Tree => f.write_str("tree"),
            Output::Postfix => f.write_str("postfix"),
        }
    }
}

impl FromStr for Output {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "report" => Ok(Output::Report),
            "tree" => Ok(Output::Tree),
            "postfix" => Ok(Output::Postfix),
            other => Err(EngineError::UnknownOutput(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Syntax(#[from] ParseError),
    #[error("unknown mode `{0}`, expected `program` or `expr`")]
    UnknownMode(String),
    #[error("unknown output `{0}`, expected `report`, `tree` or `postfix`")]
    UnknownOutput(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Trace every grammar rule on entry and exit.
    pub trace_rules: bool,
}

pub struct PolskaEngine {
    parser: Parser,
}

impl PolskaEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        info!("Initializing Polska Engine");
        let parser = Parser::with_config(ParserConfig {
            trace_rules: config.trace_rules,
        });
        Self { parser }
    }

    pub async fn load(&self, path: &Path) -> EngineResult<Source> {
        info!("Loading source: {}", path.display());
        Source::open(path).await.map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse_source(&self, source: Source, mode: Mode) -> ParseResult<ParseNode> {
        let result = self.parser.parse(source, mode.start_rule());
        match &result {
            Ok(node) => debug!("{} parsed into {} nodes", mode, node.node_count()),
            Err(err) => debug!("{} rejected: {}", mode, err),
        }
        result
    }

    pub fn parse_str(&self, text: &str, mode: Mode) -> ParseResult<ParseNode> {
        self.parse_source(Source::new(text), mode)
    }

    pub async fn parse_file(&self, path: &Path, mode: Mode) -> EngineResult<ParseNode> {
        let source = self.load(path).await?;
        Ok(self.parse_source(source, mode)?)
    }

    pub async fn tokenize_file(&self, path: &Path) -> EngineResult<Vec<Token>> {
        let source = self.load(path).await?;
        Ok(Tokenizer::new(source).collect())
    }
}

impl Default for PolskaEngine {
    fn default() -> Self {
        Self::new()
    }
}
