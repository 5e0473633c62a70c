//! Compiler driver: source text in, assembly text out.

use kaleido_asm::codegen::{Codegen, CodegenError};
use kaleido_parser::lexer::LexError;
use kaleido_parser::parser::Parser;
use kaleido_source::{Diagnostic, Source};
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    Lex(LexError),
    Parse(Vec<Diagnostic>),
    Codegen(CodegenError),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Lex(err) => write!(f, "{}", err),
            CompileError::Parse(diagnostics) => {
                for (index, diagnostic) in diagnostics.iter().enumerate() {
                    if index > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", diagnostic)?;
                }
                Ok(())
            }
            CompileError::Codegen(err) => write!(f, "{}", err),
        }
    }
}

impl Error for CompileError {}

/// Runs the whole pipeline on `code` and returns the assembly text.
///
/// The stages fail in order: a lex error preempts parsing, any parse
/// diagnostic preempts code generation. No assembly is produced for a
/// program that did not fully check out.
pub fn compile(code: &str) -> Result<String, CompileError> {
    let source: Source = code.into();
    let mut parser = Parser::new(&source).map_err(CompileError::Lex)?;
    let program = parser.parse_program();
    if !source.has_no_errors() {
        return Err(CompileError::Parse(source.errors.take()));
    }
    Codegen::new()
        .generate(&program)
        .map_err(CompileError::Codegen)
}
