//! Statement parsing.

use super::*;

impl<'a> Parser<'a> {
    pub fn parse_stmt(&mut self) -> Stmt {
        match self.current().clone() {
            Token::OpenBrace => self.parse_block_stmt(),
            Token::If => self.parse_if_stmt(),
            Token::While => self.parse_while_stmt(),
            Token::For => self.parse_for_stmt(),
            Token::Return => self.parse_return_stmt(),
            Token::Break => {
                self.next(); // eat break
                self.eat(Token::Semi);
                Stmt::Break
            }
            Token::Continue => {
                self.next(); // eat continue
                self.eat(Token::Semi);
                Stmt::Continue
            }
            Token::Type(_) => self.parse_var_declaration(),
            _ => self.parse_expr_stmt(),
        }
    }

    /// Parses `{ stmt* }` with single-token skip recovery: a statement that
    /// fails to parse without consuming anything is stepped over so the rest
    /// of the block still parses.
    pub fn parse_block_stmt(&mut self) -> Stmt {
        self.expect(Token::OpenBrace);
        let mut body = Vec::new();
        if !self.eat(Token::CloseBrace) {
            loop {
                if *self.current() == Token::Eof {
                    self.error("unterminated block".to_string());
                    break;
                }
                let before = self.cursor.position();
                let stmt = self.parse_stmt();
                let is_error = matches!(stmt, Stmt::Error | Stmt::ExprStmt(Expr::Error));
                if !is_error {
                    body.push(stmt);
                } else if self.cursor.position() == before {
                    self.next(); // skip the offending token
                }
                if self.eat(Token::CloseBrace) {
                    break;
                }
            }
        }
        Stmt::Block(body)
    }

    /// Parses `type name [= init] (, name [= init])* ;`.
    pub fn parse_var_declaration(&mut self) -> Stmt {
        let ty = match self.current().clone() {
            Token::Type(ty) => {
                self.next(); // eat type
                ty
            }
            _ => {
                self.unexpected();
                return Stmt::Error;
            }
        };

        let mut vars = Vec::new();
        loop {
            let name = match self.eat_ident() {
                Some(name) => name,
                None => return Stmt::Error,
            };
            let init = if self.eat(Token::Equals) {
                Some(self.parse_expr())
            } else {
                None
            };
            vars.push((name, init));
            if !self.eat(Token::Comma) {
                break;
            }
        }
        self.expect(Token::Semi);
        Stmt::VarDecl { ty, vars }
    }

    fn parse_expr_stmt(&mut self) -> Stmt {
        let expr = self.parse_expr();
        self.eat(Token::Semi); // the terminator is optional
        Stmt::ExprStmt(expr)
    }

    fn parse_if_stmt(&mut self) -> Stmt {
        self.expect(Token::If);
        self.expect(Token::OpenParen);
        let cond = self.parse_expr();
        self.expect(Token::CloseParen);
        let then_branch = Box::new(self.parse_stmt());
        let else_branch = if self.eat(Token::Else) {
            Some(Box::new(self.parse_stmt()))
        } else {
            None
        };
        Stmt::If {
            cond,
            then_branch,
            else_branch,
        }
    }

    fn parse_while_stmt(&mut self) -> Stmt {
        self.expect(Token::While);
        self.expect(Token::OpenParen);
        let cond = self.parse_expr();
        self.expect(Token::CloseParen);
        let body = Box::new(self.parse_stmt());
        Stmt::While { cond, body }
    }

    /// Parses `for (init; cond; update) body`; all three header slots may be
    /// empty.
    fn parse_for_stmt(&mut self) -> Stmt {
        self.expect(Token::For);
        self.expect(Token::OpenParen);

        let init = match self.current().clone() {
            Token::Semi => {
                self.next(); // eat separator
                None
            }
            // the declaration eats its own `;`
            Token::Type(_) => Some(Box::new(self.parse_var_declaration())),
            _ => {
                let expr = self.parse_expr();
                self.expect(Token::Semi);
                Some(Box::new(Stmt::ExprStmt(expr)))
            }
        };

        let cond = if *self.current() == Token::Semi {
            None
        } else {
            Some(self.parse_expr())
        };
        self.expect(Token::Semi);

        let update = if *self.current() == Token::CloseParen {
            None
        } else {
            Some(self.parse_expr())
        };
        self.expect(Token::CloseParen);

        let body = Box::new(self.parse_stmt());
        Stmt::For {
            init,
            cond,
            update,
            body,
        }
    }

    fn parse_return_stmt(&mut self) -> Stmt {
        self.expect(Token::Return);
        if self.eat(Token::Semi) {
            return Stmt::Return(None);
        }
        if *self.current() == Token::CloseBrace {
            return Stmt::Return(None);
        }
        let value = self.parse_expr();
        self.eat(Token::Semi);
        Stmt::Return(Some(value))
    }
}
