//! Polska CLI interface

pub mod repl;
pub mod runner;

use clap::{Parser, Subcommand};
use polska_core::{EngineConfig, Mode, Output, PolskaEngine};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "polska")]
#[command(about = "Parse begin/end programs and translate expressions to reverse Polish notation")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Source file to parse
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// What the file holds: `program` or `expr`
    #[arg(value_name = "MODE")]
    pub mode: Option<Mode>,

    /// Output instead of the mode's default: `report`, `tree` or `postfix`
    #[arg(short, long)]
    pub output: Option<Output>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Trace every grammar rule as it is applied
    #[arg(short, long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a source file
    Parse {
        /// Source file to parse
        file: PathBuf,

        /// What the file holds: `program` or `expr`
        mode: Option<Mode>,

        /// Output instead of the mode's default: `report`, `tree` or `postfix`
        #[arg(short, long)]
        output: Option<Output>,
    },

    /// Print the token stream of a file
    Tokens {
        /// Source file to tokenize
        file: PathBuf,
    },

    /// Start an interactive session
    Repl {
        /// What each entry holds: `program` or `expr`
        #[arg(short, long, default_value = "expr")]
        mode: Mode,
    },

    /// Show version information
    Version,
}

impl Cli {
    pub fn new() -> Self {
        Self::parse()
    }

    /// Most verbose level the subscriber should let through.
    pub fn log_level(&self) -> Level {
        if self.debug {
            Level::TRACE
        } else if self.verbose {
            Level::INFO
        } else {
            Level::WARN
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            trace_rules: self.debug,
        }
    }

    pub async fn run(&self, engine: &PolskaEngine) -> anyhow::Result<ExitCode> {
        let ok = match &self.command {
            Some(Commands::Parse { file, mode, output }) => {
                runner::parse_file(engine, file, mode.unwrap_or_default(), *output).await?
            }

            Some(Commands::Tokens { file }) => {
                info!("Tokenizing file: {:?}", file);
                runner::dump_tokens(engine, file).await?
            }

            Some(Commands::Repl { mode }) => {
                info!("Starting REPL");
                repl::start_repl(engine, *mode)?;
                true
            }

            Some(Commands::Version) => {
                self.show_version();
                true
            }

            None => match &self.file {
                Some(file) => {
                    runner::parse_file(engine, file, self.mode.unwrap_or_default(), self.output).await?
                }
                None => {
                    info!("No file given, starting REPL");
                    repl::start_repl(engine, Mode::Expr)?;
                    true
                }
            },
        };

        Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
    }

    fn show_version(&self) {
        println!("Polska v{}", env!("CARGO_PKG_VERSION"));
        println!("Grammar: begin/end assignments, relational and boolean operators");
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_file_and_mode() {
        let cli = Cli::try_parse_from(["polska", "input.pas", "expr", "-o", "report"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.file, Some(PathBuf::from("input.pas")));
        assert_eq!(cli.mode, Some(Mode::Expr));
        assert_eq!(cli.output, Some(Output::Report));
        assert_eq!(cli.log_level(), Level::WARN);
    }

    #[test]
    fn subcommand_with_global_flags() {
        let cli = Cli::try_parse_from(["polska", "parse", "input.pas", "--debug"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Parse { mode: None, output: None, .. })
        ));
        assert_eq!(cli.log_level(), Level::TRACE);
        assert!(cli.engine_config().trace_rules);
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["polska", "input.pas", "statement"]).is_err());
    }

    #[test]
    fn repl_defaults_to_expressions() {
        let cli = Cli::try_parse_from(["polska", "repl"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Repl { mode: Mode::Expr })));
    }
}
