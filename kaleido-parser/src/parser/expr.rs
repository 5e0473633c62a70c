//! Expression parsing.

use super::*;

impl<'a> Parser<'a> {
    pub fn parse_expr(&mut self) -> Expr {
        self.parse_expr_bp(0)
    }

    /// Precedence climbing over the binding powers declared by
    /// [`Token::binop_bp`]. `=` is right associative and lowers to
    /// [`Expr::Assign`]; every other operator lowers to [`Expr::Binary`].
    fn parse_expr_bp(&mut self, min_bp: u8) -> Expr {
        let mut lhs = self.parse_primary_expr();

        loop {
            let (l_bp, r_bp) = match self.current().binop_bp() {
                Some(bp) => bp,
                None => break,
            };
            if l_bp < min_bp {
                break;
            }

            let binop = self.current().clone();
            self.next(); // eat binop
            let rhs = self.parse_expr_bp(r_bp);

            lhs = if binop == Token::Equals {
                Expr::Assign {
                    target: Box::new(lhs),
                    value: Box::new(rhs),
                }
            } else {
                Expr::Binary {
                    lhs: Box::new(lhs),
                    op: binop,
                    rhs: Box::new(rhs),
                }
            };
        }

        lhs
    }

    /// A primary expression: prefix operators, then an atom, then the postfix
    /// chain (`++`, `--`, indexing, member and scope access, calls).
    ///
    /// Prefix operators apply to the following primary, not to a whole binary
    /// expression: `-a + b` parses as `(-a) + b`.
    fn parse_primary_expr(&mut self) -> Expr {
        if self.current().is_prefix_op() {
            let op = self.current().clone();
            self.next(); // eat prefix op
            let arg = self.parse_primary_expr();
            return Expr::Unary {
                op,
                arg: Box::new(arg),
            };
        }

        let atom = self.parse_atom();
        self.parse_postfix_chain(atom)
    }

    fn parse_atom(&mut self) -> Expr {
        match self.current().clone() {
            Token::Number(_) | Token::Str(_) | Token::Char(_) | Token::Bool(_) => {
                self.parse_literal_expr()
            }
            Token::Ident(ident) => {
                self.next(); // eat identifier
                Expr::Identifier(ident.text)
            }
            Token::OpenParen => {
                self.next(); // eat open parenthesis
                let expr = self.parse_expr();
                self.expect(Token::CloseParen);
                expr
            }
            _ => {
                self.unexpected();
                Expr::Error
            }
        }
    }

    fn parse_literal_expr(&mut self) -> Expr {
        match self.current().clone() {
            Token::Number(text) => {
                self.next(); // eat number
                Expr::NumberLit {
                    value: text.parse().unwrap_or(0.0),
                    is_float: text.contains('.') || text.contains(&['e', 'E'][..]),
                }
            }
            Token::Str(text) => {
                self.next(); // eat string
                Expr::StringLit(text)
            }
            Token::Char(text) => {
                self.next(); // eat char
                Expr::CharLit(decode_char(&text))
            }
            Token::Bool(value) => {
                self.next(); // eat bool
                Expr::BoolLit(value)
            }
            _ => unreachable!("parse_literal_expr called on a non-literal token"),
        }
    }

    fn parse_postfix_chain(&mut self, mut expr: Expr) -> Expr {
        loop {
            match self.current().clone() {
                Token::PlusPlus | Token::MinusMinus => {
                    let op = self.next_op();
                    expr = Expr::Postfix {
                        op,
                        arg: Box::new(expr),
                    };
                }
                Token::OpenBracket => {
                    self.next(); // eat open bracket
                    let index = self.parse_expr();
                    self.expect(Token::CloseBracket);
                    expr = Expr::Index {
                        base: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                Token::Dot => {
                    self.next(); // eat dot
                    let member = match self.eat_ident() {
                        Some(member) => member,
                        None => return Expr::Error,
                    };
                    expr = Expr::Member {
                        base: Box::new(expr),
                        member,
                    };
                }
                Token::ColonColon => {
                    self.next(); // eat scope operator
                    let member = match self.eat_ident() {
                        Some(member) => member,
                        None => return Expr::Error,
                    };
                    expr = Expr::Scope {
                        base: Box::new(expr),
                        member,
                    };
                }
                Token::OpenParen => {
                    let args = self.parse_call_args();
                    expr = match callee_name(&expr) {
                        Some(callee) => Expr::Call { callee, args },
                        None => {
                            self.error("expression is not callable".to_string());
                            Expr::Error
                        }
                    };
                }
                _ => break,
            }
        }
        expr
    }

    fn next_op(&mut self) -> Token {
        let op = self.current().clone();
        self.next();
        op
    }

    /// Parses `(arg, arg, ...)` with the open parenthesis still current.
    fn parse_call_args(&mut self) -> Vec<Expr> {
        self.expect(Token::OpenParen);
        let mut args = Vec::new();
        if self.eat(Token::CloseParen) {
            return args;
        }
        loop {
            args.push(self.parse_expr());
            if self.eat(Token::CloseParen) {
                break;
            }
            if !self.eat(Token::Comma) {
                self.expected(&Token::CloseParen);
                break;
            }
        }
        args
    }
}

/// Flattens a callee expression into the name the code generator resolves:
/// `sort`, `std::sort`, `xs.push_back`. Anything else is not callable.
fn callee_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(name) => Some(name.clone()),
        Expr::Scope { base, member } => Some(format!("{}::{}", callee_name(base)?, member)),
        Expr::Member { base, member } => Some(format!("{}.{}", callee_name(base)?, member)),
        _ => None,
    }
}

/// Decodes the inside of a char literal; the surrounding quotes are already
/// stripped by the lexer.
fn decode_char(text: &str) -> char {
    let mut chars = text.chars();
    match chars.next() {
        Some('\\') => match chars.next() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('0') => '\0',
            Some(other) => other,
            None => '\\',
        },
        Some(ch) => ch,
        None => '\0',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(source: &str) -> Expr {
        let source: Source = source.into();
        let expr = Parser::new(&source).unwrap().parse_expr();
        assert!(
            source.has_no_errors(),
            "unexpected parse errors: {}",
            source.errors
        );
        expr
    }

    fn expr_str(source: &str) -> String {
        expr(source).to_string()
    }

    fn num(value: f64) -> Expr {
        Expr::NumberLit {
            value,
            is_float: value.fract() != 0.0,
        }
    }

    #[test]
    fn precedence() {
        assert_eq!(expr_str("1 + 2 * 3"), "(1 + (2 * 3))");
        assert_eq!(expr_str("1 * 2 + 3"), "((1 * 2) + 3)");
        assert_eq!(expr_str("(1 + 2) * 3"), "((1 + 2) * 3)");
        assert_eq!(expr_str("1 + 2 - 3"), "((1 + 2) - 3)");
        assert_eq!(expr_str("a < b == c"), "((a < b) == c)");
        assert_eq!(expr_str("a && b || c"), "((a && b) || c)");
        assert_eq!(expr_str("x == y && y < z"), "((x == y) && (y < z))");
        assert_eq!(expr_str("10 % 4 + 1"), "((10 % 4) + 1)");
        assert_eq!(expr_str("10 - 6 / 2"), "(10 - (6 / 2))");
    }

    #[test]
    fn unclosed_paren_is_a_diagnostic() {
        let source: Source = "(1 + 2".into();
        let expr = Parser::new(&source).unwrap().parse_expr();
        // the inner expression survives, the missing `)` is reported
        assert_eq!(expr.to_string(), "(1 + 2)");
        assert_eq!(source.errors.len(), 1);
        assert!(source.errors.take()[0].message().contains("expected `)`"));
    }

    #[test]
    fn deeply_nested_expression() {
        insta::assert_display_snapshot!(
            expr("1 + 2 * (3 - 4) / 5 == 6 && !done"),
            @"(((1 + ((2 * (3 - 4)) / 5)) == 6) && !done)"
        );
        insta::assert_display_snapshot!(
            expr("f(a, b + 1)[i].size"),
            @"f(a, (b + 1))[i].size"
        );
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_eq!(expr("a = b = 1"), {
            Expr::Assign {
                target: Box::new(Expr::Identifier("a".to_string())),
                value: Box::new(Expr::Assign {
                    target: Box::new(Expr::Identifier("b".to_string())),
                    value: Box::new(num(1.0)),
                }),
            }
        });
        assert_eq!(expr_str("x = y + 1"), "x = (y + 1)");
    }

    #[test]
    fn prefix_binds_tighter_than_binary() {
        assert_eq!(expr_str("-a + b"), "(-a + b)");
        assert_eq!(
            expr("-a + b"),
            Expr::Binary {
                lhs: Box::new(Expr::Unary {
                    op: Token::Minus,
                    arg: Box::new(Expr::Identifier("a".to_string())),
                }),
                op: Token::Plus,
                rhs: Box::new(Expr::Identifier("b".to_string())),
            }
        );
        assert_eq!(expr_str("!done && going"), "(!done && going)");
    }

    #[test]
    fn postfix_operators() {
        assert_eq!(
            expr("i++"),
            Expr::Postfix {
                op: Token::PlusPlus,
                arg: Box::new(Expr::Identifier("i".to_string())),
            }
        );
        assert_eq!(expr_str("xs[i + 1]"), "xs[(i + 1)]");
        assert_eq!(expr_str("point.x"), "point.x");
    }

    #[test]
    fn calls() {
        assert_eq!(
            expr("print(x, 2)"),
            Expr::Call {
                callee: "print".to_string(),
                args: vec![
                    Expr::Identifier("x".to_string()),
                    num(2.0),
                ],
            }
        );
        assert_eq!(expr_str("f()"), "f()");
        // member and scope chains flatten into the callee name
        assert_eq!(expr_str("std::sort(xs)"), "std::sort(xs)");
        assert_eq!(expr_str("xs.push_back(5)"), "xs.push_back(5)");
    }

    #[test]
    fn literals() {
        assert_eq!(expr("42"), num(42.0));
        assert_eq!(expr("3.25"), num(3.25));
        assert_eq!(expr("true"), Expr::BoolLit(true));
        assert_eq!(expr("\"hi\""), Expr::StringLit("hi".to_string()));
        assert_eq!(expr("'a'"), Expr::CharLit('a'));
        assert_eq!(expr("'\\n'"), Expr::CharLit('\n'));
    }

    #[test]
    fn atom_error_is_reported() {
        let source: Source = "1 + ,".into();
        let expr = Parser::new(&source).unwrap().parse_expr();
        assert_eq!(
            expr,
            Expr::Binary {
                lhs: Box::new(num(1.0)),
                op: Token::Plus,
                rhs: Box::new(Expr::Error),
            }
        );
        assert!(!source.has_no_errors());
    }
}
