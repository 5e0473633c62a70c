//! Stack frame layout.
//!
//! A single pass over a function body (or the top-level statement stream)
//! that assigns every local variable a slot below `rbp`. The code generator
//! reserves the whole frame up front with one `sub rsp`, so the layout must
//! be known before any instruction is emitted.
//!
//! Variables introduced implicitly by assignment (`x = 5;` with no preceding
//! declaration) get a slot too, with a type inferred from the assigned value.

use kaleido_parser::ast::{DataType, Expr, Function, Program, Stmt};
use kaleido_parser::visitor::{walk_expr, walk_stmt, Visitor};
use std::collections::HashMap;

/// Size in bytes a value of the given type occupies in the frame.
pub fn type_size(ty: DataType) -> i64 {
    match ty {
        DataType::Void => 0,
        DataType::Int => 8,
        DataType::Double => 8,
        DataType::Float => 4,
        DataType::Char => 1,
        DataType::Bool => 1,
        DataType::Str => 8,
        DataType::Auto => 8,
        DataType::Unknown => 8,
    }
}

/// A variable's home in the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSlot {
    /// Distance below `rbp`; the variable lives at `[rbp - offset]`.
    pub offset: i64,
    pub ty: DataType,
    pub size: i64,
}

/// Computed layout of one stack frame.
#[derive(Debug, Default)]
pub struct FrameLayout {
    slots: HashMap<String, FrameSlot>,
    raw_size: i64,
}

impl FrameLayout {
    /// Lays out the locals of the top-level statement stream.
    pub fn layout_program(program: &Program) -> Self {
        let mut layout = Self::default();
        for stmt in &program.statements {
            layout.visit_stmt(stmt);
        }
        layout
    }

    /// Lays out a function frame: parameters first, in declaration order,
    /// then the body's locals.
    pub fn layout_function(func: &Function) -> Self {
        let mut layout = Self::default();
        for (ty, name) in &func.proto.params {
            layout.declare(name, *ty);
        }
        layout.visit_stmt(&func.body);
        layout
    }

    pub fn slot(&self, name: &str) -> Option<&FrameSlot> {
        self.slots.get(name)
    }

    /// Sum of all slot sizes, before alignment.
    pub fn raw_size(&self) -> i64 {
        self.raw_size
    }

    /// Bytes to reserve with `sub rsp`: the raw size rounded up to the next
    /// multiple of 16, keeping the stack pointer aligned across calls.
    pub fn frame_size(&self) -> i64 {
        (self.raw_size + 15) & !15
    }

    fn declare(&mut self, name: &str, ty: DataType) {
        // a redeclaration reuses the first slot
        if self.slots.contains_key(name) {
            return;
        }
        let size = type_size(ty);
        self.raw_size += size;
        self.slots.insert(
            name.to_string(),
            FrameSlot {
                offset: self.raw_size,
                ty,
                size,
            },
        );
    }

    /// Type of an initializer or assigned value, for slots declared without
    /// an explicit type. The literal's spelling decides: `5` is an int,
    /// `5.0` a double; anything non-literal defaults to int.
    fn infer_type(&self, value: &Expr) -> DataType {
        match value {
            Expr::NumberLit { is_float, .. } => {
                if *is_float {
                    DataType::Double
                } else {
                    DataType::Int
                }
            }
            Expr::StringLit(_) => DataType::Str,
            Expr::CharLit(_) => DataType::Char,
            Expr::BoolLit(_) => DataType::Bool,
            Expr::Identifier(name) => self
                .slot(name)
                .map(|slot| slot.ty)
                .unwrap_or(DataType::Int),
            _ => DataType::Int,
        }
    }
}

impl<'ast> Visitor<'ast> for FrameLayout {
    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        if let Stmt::VarDecl { ty, vars } = stmt {
            for (name, init) in vars {
                let ty = match (ty, init) {
                    (DataType::Auto, Some(init)) => self.infer_type(init),
                    _ => *ty,
                };
                self.declare(name, ty);
            }
        }
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &'ast Expr) {
        if let Expr::Assign { target, value } = expr {
            if let Expr::Identifier(name) = &**target {
                if self.slot(name).is_none() {
                    let ty = self.infer_type(value);
                    self.declare(name, ty);
                }
            }
        }
        walk_expr(self, expr);
    }
}
