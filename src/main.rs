//! Polska
//!
//! Parses `begin ... end` assignment programs and bare expressions, and
//! translates expressions to reverse Polish notation.

use polska_cli::Cli;
use polska_core::PolskaEngine;
use std::process::ExitCode;
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::new();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .init();

    info!("Starting Polska v{}", env!("CARGO_PKG_VERSION"));

    let engine = PolskaEngine::with_config(cli.engine_config());

    match cli.run(&engine).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
