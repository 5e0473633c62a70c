//! Abstract syntax tree.
//!
//! A pure data structure: nodes own their children exclusively and perform no
//! computation. All computation lives in the passes and the code generator.

use crate::lexer::Token;
use std::fmt;

/// Type tag attached to declarations and symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Void,
    Int,
    Float,
    Double,
    Char,
    Bool,
    Str,
    Auto,
    Unknown,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DataType::Void => "void",
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::Char => "char",
            DataType::Bool => "bool",
            DataType::Str => "string",
            DataType::Auto => "auto",
            DataType::Unknown => "unknown",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A numeric literal. `is_float` records whether the source spelling had
    /// a decimal point or exponent: `5` and `5.0` are the same value but
    /// infer different types.
    NumberLit {
        value: f64,
        is_float: bool,
    },
    StringLit(String),
    CharLit(char),
    BoolLit(bool),
    /// A variable reference (e.g. `foo`).
    Identifier(String),
    /// A binary expression (e.g. `1 + 1`).
    Binary {
        lhs: Box<Expr>,
        op: Token,
        rhs: Box<Expr>,
    },
    /// A unary prefix expression (e.g. `-x`, `!done`, `++i`).
    Unary {
        op: Token,
        arg: Box<Expr>,
    },
    /// A unary postfix expression (`i++`, `i--`).
    Postfix {
        op: Token,
        arg: Box<Expr>,
    },
    /// A function call (e.g. `foo(1, bar)`).
    Call {
        callee: String,
        args: Vec<Expr>,
    },
    /// An array indexing expression (e.g. `xs[i]`).
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    /// A member access (e.g. `xs.size`).
    Member {
        base: Box<Expr>,
        member: String,
    },
    /// A scope resolution (e.g. `std::sort`).
    Scope {
        base: Box<Expr>,
        member: String,
    },
    /// An assignment; the target must be an lvalue, which the code generator
    /// checks exhaustively by variant.
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// One type tag, one or more declared names with optional initializers.
    VarDecl {
        ty: DataType,
        vars: Vec<(String, Option<Expr>)>,
    },
    ExprStmt(Expr),
    /// Statements in declaration order, which is also execution order.
    Block(Vec<Stmt>),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    Error,
}

/// A function's signature: name, return type and ordered typed parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Prototype {
    pub return_type: DataType,
    pub name: String,
    pub params: Vec<(DataType, String)>,
    /// Set for user-defined operator prototypes in the legacy dialect.
    pub is_operator: bool,
    pub precedence: u32,
}

impl Prototype {
    pub fn new(return_type: DataType, name: String, params: Vec<(DataType, String)>) -> Self {
        Self {
            return_type,
            name,
            params,
            is_operator: false,
            precedence: 0,
        }
    }
}

/// A function definition: prototype plus body.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub proto: Prototype,
    pub body: Stmt,
}

/// Top-level container: ordered statements, function definitions and extern
/// prototypes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
    pub functions: Vec<Function>,
    pub externs: Vec<Prototype>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::NumberLit { value, .. } => write!(f, "{}", value),
            Expr::StringLit(val) => write!(f, "\"{}\"", val),
            Expr::CharLit(val) => write!(f, "'{}'", val),
            Expr::BoolLit(val) => write!(f, "{}", val),
            Expr::Identifier(name) => f.write_str(name),
            Expr::Binary { lhs, op, rhs } => write!(f, "({} {} {})", lhs, op, rhs),
            Expr::Unary { op, arg } => write!(f, "{}{}", op, arg),
            Expr::Postfix { op, arg } => write!(f, "{}{}", arg, op),
            Expr::Call { callee, args } => {
                write!(f, "{}(", callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            Expr::Index { base, index } => write!(f, "{}[{}]", base, index),
            Expr::Member { base, member } => write!(f, "{}.{}", base, member),
            Expr::Scope { base, member } => write!(f, "{}::{}", base, member),
            Expr::Assign { target, value } => write!(f, "{} = {}", target, value),
            Expr::Error => f.write_str("<error>"),
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::VarDecl { ty, vars } => {
                write!(f, "{} ", ty)?;
                for (i, (name, init)) in vars.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(name)?;
                    if let Some(init) = init {
                        write!(f, " = {}", init)?;
                    }
                }
                f.write_str(";")
            }
            Stmt::ExprStmt(expr) => write!(f, "{};", expr),
            Stmt::Block(body) => {
                f.write_str("{ ")?;
                for stmt in body {
                    write!(f, "{} ", stmt)?;
                }
                f.write_str("}")
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                write!(f, "if ({}) {}", cond, then_branch)?;
                if let Some(else_branch) = else_branch {
                    write!(f, " else {}", else_branch)?;
                }
                Ok(())
            }
            Stmt::While { cond, body } => write!(f, "while ({}) {}", cond, body),
            Stmt::For {
                init,
                cond,
                update,
                body,
            } => {
                f.write_str("for (")?;
                match init {
                    Some(init) => write!(f, "{}", init)?,
                    None => f.write_str(";")?,
                }
                match cond {
                    Some(cond) => write!(f, " {};", cond)?,
                    None => f.write_str(" ;")?,
                }
                if let Some(update) = update {
                    write!(f, " {}", update)?;
                }
                write!(f, ") {}", body)
            }
            Stmt::Return(value) => match value {
                Some(value) => write!(f, "return {};", value),
                None => f.write_str("return;"),
            },
            Stmt::Break => f.write_str("break;"),
            Stmt::Continue => f.write_str("continue;"),
            Stmt::Error => f.write_str("<error>"),
        }
    }
}

impl fmt::Display for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(", self.return_type, self.name)?;
        for (i, (ty, name)) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if *ty == DataType::Auto {
                f.write_str(name)?;
            } else {
                write!(f, "{} {}", ty, name)?;
            }
        }
        f.write_str(")")
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.proto, self.body)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ext in &self.externs {
            writeln!(f, "extern {};", ext)?;
        }
        for func in &self.functions {
            writeln!(f, "{}", func)?;
        }
        for stmt in &self.statements {
            writeln!(f, "{}", stmt)?;
        }
        Ok(())
    }
}
