//! File parsing and token dumps

use colored::*;
use polska_core::{render, Mode, Output, PolskaEngine, Report};
use polska_parser::ParseError;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Parses `file_path` and prints the requested rendering. Returns whether
/// the parse succeeded; I/O failures are errors.
pub async fn parse_file(
    engine: &PolskaEngine,
    file_path: &Path,
    mode: Mode,
    output: Option<Output>,
) -> anyhow::Result<bool> {
    let output = output.unwrap_or_else(|| mode.default_output());
    info!("Parsing {} as {} ({} output)", file_path.display(), mode, output);

    let source = engine.load(file_path).await?;

    let start_time = Instant::now();
    let result = engine.parse_source(source, mode);
    debug!("Parse finished in {:?}", start_time.elapsed());

    match (&result, output) {
        (_, Output::Report) => {
            println!("{}", Report::from_result(&result));
        }
        (Ok(node), output) => {
            println!("{}", render(node, output));
        }
        (Err(err), _) => {
            print_syntax_error(err, file_path);
        }
    }

    Ok(result.is_ok())
}

pub async fn dump_tokens(engine: &PolskaEngine, file_path: &Path) -> anyhow::Result<bool> {
    let tokens = engine.tokenize_file(file_path).await?;
    debug!("Read {} tokens from {}", tokens.len(), file_path.display());

    for token in &tokens {
        println!("{:<10} {}", token.class, token.text);
    }

    Ok(true)
}

fn print_syntax_error(error: &ParseError, file_path: &Path) {
    let file_name = file_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");

    eprintln!("{}: {} in {}", "SyntaxError".red().bold(), error, file_name.yellow());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn source_file(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", text).unwrap();
        file
    }

    #[tokio::test]
    async fn parse_file_reports_success_and_failure() {
        let engine = PolskaEngine::new();

        let good = source_file("begin X=1 end");
        assert!(parse_file(&engine, good.path(), Mode::Program, None).await.unwrap());

        let bad = source_file("begin X=1 ");
        assert!(!parse_file(&engine, bad.path(), Mode::Program, Some(Output::Report))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.pas");
        assert!(parse_file(&PolskaEngine::new(), &missing, Mode::Expr, None).await.is_err());
        assert!(dump_tokens(&PolskaEngine::new(), &missing).await.is_err());
    }
}
