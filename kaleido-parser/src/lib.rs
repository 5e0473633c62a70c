//! Lexer and parser for the compiler front end.

pub mod ast;
pub mod cursor;
pub mod lexer;
pub mod parser;
pub mod visitor;
