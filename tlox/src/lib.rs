pub mod ast_printer;
pub mod config;
pub mod environment;
pub mod expr;
pub mod interpreter;
pub mod literal;
pub mod lox;
pub mod lox_callable;
pub mod lox_function;
pub mod native_functions;
pub mod object;
pub mod parser;
pub mod scanner;
mod stack;
pub mod stmt;
pub mod token;
pub mod token_type;
