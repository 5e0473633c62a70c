//! Visitor pattern for AST nodes.

use crate::ast::{Expr, Function, Program, Stmt};

pub trait Visitor<'ast>: Sized {
    fn visit_expr(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }
    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        walk_stmt(self, stmt);
    }
    fn visit_function(&mut self, func: &'ast Function) {
        walk_function(self, func);
    }
    fn visit_program(&mut self, program: &'ast Program) {
        walk_program(self, program);
    }
}

pub fn walk_expr<'ast>(visitor: &mut impl Visitor<'ast>, expr: &'ast Expr) {
    match expr {
        Expr::NumberLit { .. } => {}
        Expr::StringLit(_) => {}
        Expr::CharLit(_) => {}
        Expr::BoolLit(_) => {}
        Expr::Identifier(_) => {}
        Expr::Binary { lhs, op: _, rhs } => {
            visitor.visit_expr(lhs);
            visitor.visit_expr(rhs);
        }
        Expr::Unary { op: _, arg } => visitor.visit_expr(arg),
        Expr::Postfix { op: _, arg } => visitor.visit_expr(arg),
        Expr::Call { callee: _, args } => {
            for arg in args {
                visitor.visit_expr(arg);
            }
        }
        Expr::Index { base, index } => {
            visitor.visit_expr(base);
            visitor.visit_expr(index);
        }
        Expr::Member { base, member: _ } => visitor.visit_expr(base),
        Expr::Scope { base, member: _ } => visitor.visit_expr(base),
        Expr::Assign { target, value } => {
            visitor.visit_expr(target);
            visitor.visit_expr(value);
        }
        Expr::Error => {}
    }
}

pub fn walk_stmt<'ast>(visitor: &mut impl Visitor<'ast>, stmt: &'ast Stmt) {
    match stmt {
        Stmt::VarDecl { ty: _, vars } => {
            for (_name, init) in vars {
                if let Some(init) = init {
                    visitor.visit_expr(init);
                }
            }
        }
        Stmt::ExprStmt(expr) => visitor.visit_expr(expr),
        Stmt::Block(body) => {
            for stmt in body {
                visitor.visit_stmt(stmt);
            }
        }
        Stmt::If {
            cond,
            then_branch,
            else_branch,
        } => {
            visitor.visit_expr(cond);
            visitor.visit_stmt(then_branch);
            if let Some(else_branch) = else_branch {
                visitor.visit_stmt(else_branch);
            }
        }
        Stmt::While { cond, body } => {
            visitor.visit_expr(cond);
            visitor.visit_stmt(body);
        }
        Stmt::For {
            init,
            cond,
            update,
            body,
        } => {
            if let Some(init) = init {
                visitor.visit_stmt(init);
            }
            if let Some(cond) = cond {
                visitor.visit_expr(cond);
            }
            if let Some(update) = update {
                visitor.visit_expr(update);
            }
            visitor.visit_stmt(body);
        }
        Stmt::Return(value) => {
            if let Some(value) = value {
                visitor.visit_expr(value);
            }
        }
        Stmt::Break => {}
        Stmt::Continue => {}
        Stmt::Error => {}
    }
}

pub fn walk_function<'ast>(visitor: &mut impl Visitor<'ast>, func: &'ast Function) {
    visitor.visit_stmt(&func.body);
}

pub fn walk_program<'ast>(visitor: &mut impl Visitor<'ast>, program: &'ast Program) {
    for func in &program.functions {
        visitor.visit_function(func);
    }
    for stmt in &program.statements {
        visitor.visit_stmt(stmt);
    }
}
