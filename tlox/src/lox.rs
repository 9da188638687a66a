//! The scan → parse → interpret pipeline and its error reporting.

use crate::{
    ast_printer::stmt_to_string,
    config::Config,
    interpreter::Interpreter,
    object::Object,
    parser::Parser,
    scanner::Scanner,
    stmt::Stmt,
    token::Token,
};

/// Receives every scan, parse and runtime error. `location` is either empty,
/// `" at end"` or `" at '<lexeme>'"`.
pub trait Reporter {
    fn report(&mut self, line: usize, location: &str, message: &str);
}

/// Prints `[line N] Error<location>: <message>` to standard error.
#[derive(Debug, Default)]
pub struct StderrReporter;

impl Reporter for StderrReporter {
    fn report(&mut self, line: usize, location: &str, message: &str) {
        eprintln!("[line {}] Error{}: {}", line, location, message);
    }
}

/// Keeps reported errors, formatted the same way `StderrReporter` prints them.
#[derive(Debug, Default)]
pub struct BufferedReporter {
    pub messages: Vec<String>,
}

impl Reporter for BufferedReporter {
    fn report(&mut self, line: usize, location: &str, message: &str) {
        self.messages
            .push(format!("[line {}] Error{}: {}", line, location, message));
    }
}

#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// The program ran; holds the value of its last statement.
    Value(Object),
    /// Scanning or parsing failed and nothing was executed.
    StaticError,
    RuntimeError,
}

impl Outcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::Value(_) => 0,
            Outcome::StaticError => 65,
            Outcome::RuntimeError => 70,
        }
    }
}

/// One interpreter session. Globals survive from one `run` to the next.
pub struct Lox<R: Reporter = StderrReporter> {
    interpreter: Interpreter,
    reporter: R,
}

impl Lox<StderrReporter> {
    pub fn new(config: Config) -> Self {
        Self::with_parts(Interpreter::new(config), StderrReporter)
    }
}

impl<R: Reporter> Lox<R> {
    pub fn with_parts(interpreter: Interpreter, reporter: R) -> Self {
        Self {
            interpreter,
            reporter,
        }
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Scans `source`, reporting every scan error. `None` if there were any.
    pub fn scan(&mut self, source: &str) -> Option<Vec<Token>> {
        let (tokens, had_error) = self.scan_reporting(source);
        (!had_error).then_some(tokens)
    }

    /// Scans and parses `source`. Parsing goes ahead after scan errors so
    /// that every diagnostic is reported in one pass.
    pub fn parse(&mut self, source: &str) -> Option<Vec<Stmt>> {
        let (tokens, had_scan_error) = self.scan_reporting(source);
        let (statements, errors) = Parser::new(tokens).parse();
        for err in &errors {
            self.reporter
                .report(err.token.line, &err.location(), &err.message);
        }
        (!had_scan_error && errors.is_empty()).then_some(statements)
    }

    /// Runs `source` as a complete program. A program with static errors is
    /// never executed, not even in part.
    pub fn run(&mut self, source: &str) -> Outcome {
        let Some(statements) = self.parse(source) else {
            return Outcome::StaticError;
        };

        if log::log_enabled!(log::Level::Trace) {
            for stmt in &statements {
                log::trace!("{}", stmt_to_string(stmt));
            }
        }

        match self.interpreter.interpret(&statements) {
            Ok(value) => Outcome::Value(value),
            Err(err) => {
                self.reporter.report(
                    err.token.line,
                    &format!(" at '{}'", err.token.lexeme),
                    &err.message,
                );
                Outcome::RuntimeError
            }
        }
    }

    fn scan_reporting(&mut self, source: &str) -> (Vec<Token>, bool) {
        let (tokens, errors) = Scanner::new(source).scan_tokens();
        for err in &errors {
            self.reporter.report(err.line(), "", &err.to_string());
        }
        (tokens, !errors.is_empty())
    }
}
