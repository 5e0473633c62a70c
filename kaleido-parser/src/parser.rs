//! Recursive descent parser with binding-power based expression parsing.

mod decl;
mod expr;
mod stmt;

use crate::ast::{DataType, Expr, Function, Program, Prototype, Stmt};
use crate::cursor::TokenCursor;
use crate::lexer::{lex_spanned, LexError, Token};
use kaleido_source::{Diagnostic, Source};
use std::mem;

pub struct Parser<'a> {
    cursor: TokenCursor,
    /// Source code, also the diagnostic sink.
    source: &'a Source<'a>,
}

impl<'a> Parser<'a> {
    /// Lexes `source` and readies a parser over the token sequence.
    pub fn new(source: &'a Source<'a>) -> Result<Self, LexError> {
        let (tokens, spans) = lex_spanned(source.content)?;
        Ok(Self {
            cursor: TokenCursor::new(tokens, spans),
            source,
        })
    }

    /// Parses the whole translation unit.
    ///
    /// Grammar errors are accumulated in the source's reporter; failed
    /// constructs yield error nodes or are skipped, so the caller decides the
    /// recovery policy by inspecting the reporter.
    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::new();

        while *self.current() != Token::Eof {
            match self.current().clone() {
                Token::Def => {
                    if let Some(func) = self.parse_definition() {
                        program.functions.push(func);
                    }
                }
                Token::Extern => {
                    if let Some(proto) = self.parse_extern() {
                        program.externs.push(proto);
                    }
                }
                Token::Type(_) => {
                    if self.looks_like_function() {
                        if let Some(func) = self.parse_function() {
                            program.functions.push(func);
                        }
                    } else {
                        program.statements.push(self.parse_var_declaration());
                    }
                }
                // stray separators between top-level constructs
                Token::Semi => {
                    self.next();
                }
                _ => {
                    let before = self.cursor.position();
                    let stmt = self.parse_stmt();
                    let is_error = matches!(stmt, Stmt::Error | Stmt::ExprStmt(Expr::Error));
                    if !is_error {
                        program.statements.push(stmt);
                    } else if self.cursor.position() == before {
                        // ensure forward progress past an unparseable token
                        self.next();
                    }
                }
            }
        }

        program
    }
}

/// Parse utilities
impl<'a> Parser<'a> {
    fn current(&self) -> &Token {
        self.cursor.current()
    }

    fn next(&mut self) -> Token {
        self.cursor.advance()
    }

    /// Predicate that tests whether the current token has the same
    /// discriminant and eats it if yes as a side effect.
    fn eat(&mut self, tok: Token) -> bool {
        if mem::discriminant(self.current()) == mem::discriminant(&tok) {
            self.next(); // eat token
            true
        } else {
            false
        }
    }

    /// Like [`Parser::eat`] but reports an expected-vs-found diagnostic on a
    /// mismatch. Returns whether the token was eaten.
    fn expect(&mut self, tok: Token) -> bool {
        if self.eat(tok.clone()) {
            true
        } else {
            self.expected(&tok);
            false
        }
    }

    /// Eats and returns an identifier's text, reporting otherwise.
    fn eat_ident(&mut self) -> Option<String> {
        match self.current().clone() {
            Token::Ident(ident) => {
                self.next();
                Some(ident.text)
            }
            other => {
                self.error(format!("expected identifier, found `{}`", other));
                None
            }
        }
    }

    fn expected(&mut self, tok: &Token) {
        let message = format!("expected `{}`, found `{}`", tok, self.current());
        self.error(message);
    }

    /// Raises an unexpected token error without consuming the token.
    fn unexpected(&mut self) {
        let message = format!("unexpected token `{}`", self.current());
        self.error(message);
    }

    fn error(&mut self, message: String) {
        self.source
            .errors
            .add_error(Diagnostic::new(message, self.cursor.span()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> (Program, usize) {
        let source: Source = source.into();
        let program = Parser::new(&source).unwrap().parse_program();
        (program, source.errors.len())
    }

    #[test]
    fn empty_program() {
        let (program, errors) = parse("");
        assert_eq!(program, Program::new());
        assert_eq!(errors, 0);
    }

    #[test]
    fn top_level_shapes() {
        let (program, errors) = parse(
            r#"
            extern sin(x);
            def average(a, b) (a + b) / 2;
            int main() { return 0; }
            int counter = 0;
            counter = counter + 1;
            "#,
        );
        assert_eq!(errors, 0);
        assert_eq!(program.externs.len(), 1);
        assert_eq!(program.functions.len(), 2);
        assert_eq!(program.statements.len(), 2);
        assert_eq!(program.externs[0].name, "sin");
        assert_eq!(program.functions[0].proto.name, "average");
        assert_eq!(program.functions[1].proto.name, "main");
    }

    #[test]
    fn function_vs_declaration_disambiguation() {
        let (program, errors) = parse("int square(int n) { return n * n; } int x = 1;");
        assert_eq!(errors, 0);
        assert_eq!(program.functions.len(), 1);
        assert_eq!(program.statements.len(), 1);
        assert_eq!(
            program.functions[0].proto.params,
            vec![(DataType::Int, "n".to_string())]
        );
    }

    #[test]
    fn error_recovery_keeps_parsing() {
        // the stray `]` is reported but does not halt the program parse
        let (program, errors) = parse("] int x = 1;");
        assert!(errors > 0);
        assert_eq!(program.statements.len(), 1);
    }
}
