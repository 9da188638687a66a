use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use rustyline::{error::ReadlineError, DefaultEditor};
use tlox::{
    ast_printer::stmt_to_string,
    config::{Config, DEFAULT_MAX_CALL_DEPTH},
    lox::Lox,
};

const EX_USAGE: u8 = 64;
const EX_DATAERR: u8 = 65;
const EX_IOERR: u8 = 74;

#[derive(ClapParser)]
#[command(name = "tlox")]
#[command(about = "A tree-walking interpreter for Lox")]
struct Cli {
    /// Script file to run (omit for REPL)
    script: Option<PathBuf>,

    /// Calls nested deeper than this fail with a runtime error
    #[arg(long, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,

    /// Print the scanned tokens instead of running
    #[arg(long, conflicts_with = "ast")]
    tokens: bool,

    /// Print the parsed statements instead of running
    #[arg(long)]
    ast: bool,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy)]
enum Mode {
    Run,
    Tokens,
    Ast,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(EX_USAGE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_logger(cli.verbose);

    let mode = if cli.tokens {
        Mode::Tokens
    } else if cli.ast {
        Mode::Ast
    } else {
        Mode::Run
    };
    let mut lox = Lox::new(Config {
        max_call_depth: cli.max_call_depth,
    });

    let result = match cli.script {
        Some(path) => run_file(&mut lox, &path, mode),
        None => run_prompt(&mut lox, mode),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(EX_IOERR)
        }
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run_file(lox: &mut Lox, path: &Path, mode: Mode) -> Result<u8> {
    log::info!("running {}", path.display());
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(run(lox, &source, mode))
}

fn run_prompt(lox: &mut Lox, mode: Mode) -> Result<u8> {
    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());
                // a bad line must not end the session
                let code = run(lox, &line, mode);
                log::debug!("line finished with status {code}");
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err).context("failed to read line"),
        }
    }

    Ok(0)
}

fn run(lox: &mut Lox, source: &str, mode: Mode) -> u8 {
    match mode {
        Mode::Run => lox.run(source).exit_code(),
        Mode::Tokens => match lox.scan(source) {
            Some(tokens) => {
                for token in tokens {
                    println!("{token}");
                }
                0
            }
            None => EX_DATAERR,
        },
        Mode::Ast => match lox.parse(source) {
            Some(statements) => {
                for stmt in &statements {
                    println!("{}", stmt_to_string(stmt));
                }
                0
            }
            None => EX_DATAERR,
        },
    }
}
