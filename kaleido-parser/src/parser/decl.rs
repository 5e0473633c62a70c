//! Function definitions and extern prototypes.
//!
//! Two function dialects coexist: C-style typed definitions
//! (`int square(int n) { ... }`) and the legacy `def`/`extern` dialect with
//! untyped parameters and a single-expression body.

use super::*;

impl<'a> Parser<'a> {
    /// Bounded lookahead for the top-level ambiguity: a type keyword starts a
    /// function definition only when followed by an identifier and `(`;
    /// otherwise it starts a variable declaration. The cursor is restored
    /// either way.
    pub fn looks_like_function(&mut self) -> bool {
        let checkpoint = self.cursor.checkpoint();
        self.next(); // eat type keyword
        let is_function = match self.current().clone() {
            Token::Ident(_) => {
                self.next(); // eat name
                *self.current() == Token::OpenParen
            }
            _ => false,
        };
        self.cursor.restore(checkpoint);
        is_function
    }

    /// Parses `type name(type param, ...) { ... }`.
    pub fn parse_function(&mut self) -> Option<Function> {
        let return_type = match self.current().clone() {
            Token::Type(ty) => {
                self.next(); // eat return type
                ty
            }
            _ => {
                self.unexpected();
                return None;
            }
        };
        let name = self.eat_ident()?;

        self.expect(Token::OpenParen);
        let mut params = Vec::new();
        if !self.eat(Token::CloseParen) {
            loop {
                let ty = match self.current().clone() {
                    Token::Type(ty) => {
                        self.next(); // eat parameter type
                        ty
                    }
                    _ => {
                        self.error("expected parameter type".to_string());
                        return None;
                    }
                };
                let param = self.eat_ident()?;
                params.push((ty, param));
                if self.eat(Token::CloseParen) {
                    break;
                }
                if !self.eat(Token::Comma) {
                    self.expected(&Token::CloseParen);
                    return None;
                }
            }
        }

        let body = self.parse_block_stmt();
        Some(Function {
            proto: Prototype::new(return_type, name, params),
            body,
        })
    }

    /// Parses `def name(params) expr ;` where the expression is the returned
    /// body.
    pub fn parse_definition(&mut self) -> Option<Function> {
        self.expect(Token::Def);
        let proto = self.parse_untyped_prototype()?;
        let body = Stmt::Return(Some(self.parse_expr()));
        self.eat(Token::Semi);
        Some(Function { proto, body })
    }

    /// Parses `extern name(params) ;`.
    pub fn parse_extern(&mut self) -> Option<Prototype> {
        self.expect(Token::Extern);
        let proto = self.parse_untyped_prototype()?;
        self.eat(Token::Semi);
        Some(proto)
    }

    /// Name plus `(a, b)` or the legacy space-separated `(a b)`; parameters
    /// are untyped and recorded as [`DataType::Auto`].
    fn parse_untyped_prototype(&mut self) -> Option<Prototype> {
        let name = self.eat_ident()?;
        if !self.expect(Token::OpenParen) {
            return None;
        }
        let mut params = Vec::new();
        while let Token::Ident(ident) = self.current().clone() {
            self.next(); // eat parameter
            params.push((DataType::Auto, ident.text));
            self.eat(Token::Comma); // separators are optional in this dialect
        }
        if !self.expect(Token::CloseParen) {
            return None;
        }
        Some(Prototype::new(DataType::Auto, name, params))
    }
}
