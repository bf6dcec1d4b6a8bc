//! Interactive REPL (Read-Parse-Print Loop)

use colored::*;
use polska_core::{render, Mode, Output, PolskaEngine};
use polska_parser::{ParseError, Tokenizer};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::{self, Write};
use tracing::{debug, error};

struct Session {
    mode: Mode,
    output: Output,
    line_number: usize,
}

pub fn start_repl(engine: &PolskaEngine, mode: Mode) -> anyhow::Result<()> {
    println!("{}", "Polska".bright_blue().bold());
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!("Type {} for help, {} to exit", ".help".yellow(), ".exit".yellow());
    println!();

    let mut rl = DefaultEditor::new()?;
    let mut session = Session {
        mode,
        output: mode.default_output(),
        line_number: 1,
    };
    let mut multiline_buffer = String::new();

    loop {
        let prompt = if multiline_buffer.is_empty() {
            format!("{}> ", format!("{}:{}", session.mode, session.line_number).bright_green())
        } else {
            format!("{}> ", "...".bright_black())
        };

        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();

                if multiline_buffer.is_empty() && trimmed.starts_with('.') {
                    match handle_repl_command(trimmed, engine, &mut session) {
                        ReplCommand::Exit => break,
                        ReplCommand::Continue => continue,
                        ReplCommand::Error(msg) => {
                            println!("{}: {}", "Error".red().bold(), msg);
                            continue;
                        }
                    }
                }

                rl.add_history_entry(&line)?;
                multiline_buffer.push_str(&line);
                multiline_buffer.push('\n');

                if needs_continuation(&multiline_buffer, session.mode) {
                    continue;
                }

                execute_code(engine, &multiline_buffer, &session);
                multiline_buffer.clear();
                session.line_number += 1;
            }

            Err(ReadlineError::Interrupted) => {
                println!("^C");
                multiline_buffer.clear();
            }

            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }

            Err(err) => {
                error!("REPL error: {}", err);
                break;
            }
        }
    }

    Ok(())
}

fn execute_code(engine: &PolskaEngine, code: &str, session: &Session) {
    if code.trim().is_empty() {
        return;
    }

    debug!("Parsing entry {} as {}: {}", session.line_number, session.mode, code.trim());

    match engine.parse_str(code, session.mode) {
        Ok(node) => {
            println!("{}", format!("=> {}", render(&node, session.output)).bright_cyan());
        }
        Err(err) => {
            print_error(&err, session.line_number);
        }
    }
}

fn print_error(error: &ParseError, line_number: usize) {
    println!("{}: {} (entry {})", "SyntaxError".red().bold(), error, line_number);
}

enum ReplCommand {
    Exit,
    Continue,
    Error(String),
}

fn handle_repl_command(command: &str, engine: &PolskaEngine, session: &mut Session) -> ReplCommand {
    match command {
        ".exit" | ".quit" => ReplCommand::Exit,

        ".help" => {
            show_help();
            ReplCommand::Continue
        }

        ".clear" => {
            print!("\x1B[2J\x1B[1;1H");
            io::stdout().flush().unwrap_or(());
            ReplCommand::Continue
        }

        ".version" => {
            println!("Polska v{}", env!("CARGO_PKG_VERSION"));
            ReplCommand::Continue
        }

        cmd if cmd.starts_with(".mode ") => match cmd[6..].trim().parse::<Mode>() {
            Ok(mode) => {
                session.mode = mode;
                session.output = mode.default_output();
                println!("Mode: {} ({} output)", mode, session.output);
                ReplCommand::Continue
            }
            Err(err) => ReplCommand::Error(err.to_string()),
        },

        cmd if cmd.starts_with(".output ") => match cmd[8..].trim().parse::<Output>() {
            Ok(output) => {
                session.output = output;
                println!("Output: {}", output);
                ReplCommand::Continue
            }
            Err(err) => ReplCommand::Error(err.to_string()),
        },

        cmd if cmd.starts_with(".tokens ") => {
            for token in Tokenizer::from(&cmd[8..]) {
                println!("  {:<10} {}", token.class, token.text);
            }
            ReplCommand::Continue
        }

        cmd if cmd.starts_with(".load ") => {
            let filename = cmd[6..].trim();
            match std::fs::read_to_string(filename) {
                Ok(content) => {
                    execute_code(engine, &content, session);
                    ReplCommand::Continue
                }
                Err(err) => ReplCommand::Error(format!("Failed to load {}: {}", filename, err)),
            }
        }

        _ => ReplCommand::Error(format!("Unknown command: {}", command)),
    }
}

fn show_help() {
    println!("{}", "REPL Commands:".bright_blue().bold());
    println!("  {}            - Show this help", ".help".yellow());
    println!("  {}            - Exit the REPL", ".exit".yellow());
    println!("  {}           - Clear the screen", ".clear".yellow());
    println!("  {}         - Show version information", ".version".yellow());
    println!("  {}     - Parse entries as `program` or `expr`", ".mode <mode>".yellow());
    println!("  {}   - Print `report`, `tree` or `postfix`", ".output <kind>".yellow());
    println!("  {}   - Show how a line tokenizes", ".tokens <text>".yellow());
    println!("  {}     - Parse a file in the current mode", ".load <file>".yellow());
    println!();
    println!("{}", "Grammar:".bright_blue().bold());
    println!("  • program: begin X = expr; Y = expr end");
    println!("  • relations: == != < > >= <=");
    println!("  • operators: + - or, * / div mod and, unary - + not");
    println!("  • operands: uppercase identifiers, integers, true, false, ( expr )");
    println!();
}

/// A program entry keeps reading lines until its `end` shows up.
fn needs_continuation(buffer: &str, mode: Mode) -> bool {
    if mode != Mode::Program {
        return false;
    }

    let mut opened = false;
    for token in Tokenizer::from(buffer) {
        if token.is("begin") {
            opened = true;
        } else if token.is("end") {
            return false;
        }
    }
    opened
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_entries_continue_until_end() {
        assert!(needs_continuation("begin\n", Mode::Program));
        assert!(needs_continuation("begin X=1;\n", Mode::Program));
        assert!(!needs_continuation("begin X=1\nend\n", Mode::Program));
        assert!(!needs_continuation("X=1\n", Mode::Program));
        assert!(!needs_continuation("begin\n", Mode::Expr));
    }

    #[test]
    fn mode_command_switches_output() {
        let engine = PolskaEngine::new();
        let mut session = Session {
            mode: Mode::Expr,
            output: Output::Postfix,
            line_number: 1,
        };

        assert!(matches!(
            handle_repl_command(".mode program", &engine, &mut session),
            ReplCommand::Continue
        ));
        assert_eq!(session.mode, Mode::Program);
        assert_eq!(session.output, Output::Tree);

        assert!(matches!(
            handle_repl_command(".output report", &engine, &mut session),
            ReplCommand::Continue
        ));
        assert_eq!(session.output, Output::Report);

        assert!(matches!(
            handle_repl_command(".mode statement", &engine, &mut session),
            ReplCommand::Error(_)
        ));
        assert!(matches!(handle_repl_command(".exit", &engine, &mut session), ReplCommand::Exit));
    }
}
