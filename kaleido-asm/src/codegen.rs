//! Tree-walking code generator emitting NASM-flavored x86-64 assembly.
//!
//! The value discipline is an accumulator machine: every expression leaves
//! its result in `rax`. Binary expressions evaluate the left operand, push
//! it, evaluate the right operand into `rcx` via `rax`, pop the left back
//! and combine. Locals live below `rbp` at the offsets computed by the frame
//! layout pass, and the whole frame is reserved with a single `sub rsp`.
//!
//! Anything the generator cannot lower is a hard [`CodegenError`]; no
//! placeholder output is ever emitted.

use kaleido_parser::ast::{Expr, Function, Program, Stmt};
use kaleido_parser::lexer::Token;
use kaleido_passes::frame::{FrameLayout, FrameSlot};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt;

/// System V argument registers, in order.
const ARG_REGISTERS: [&str; 6] = ["rdi", "rsi", "rdx", "rcx", "r8", "r9"];

#[derive(Debug, Clone, PartialEq)]
pub enum CodegenError {
    UndeclaredVariable(String),
    UnknownFunction(String),
    ArityMismatch {
        callee: String,
        expected: usize,
        found: usize,
    },
    UnsupportedOperator(String),
    Unsupported(&'static str),
    InvalidAssignTarget,
    BreakOutsideLoop,
    ContinueOutsideLoop,
    TooManyArguments { callee: String, count: usize },
    MalformedAst,
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodegenError::UndeclaredVariable(name) => {
                write!(f, "use of undeclared variable `{}`", name)
            }
            CodegenError::UnknownFunction(name) => {
                write!(f, "call to unknown function `{}`", name)
            }
            CodegenError::ArityMismatch {
                callee,
                expected,
                found,
            } => write!(
                f,
                "`{}` expects {} arguments, found {}",
                callee, expected, found
            ),
            CodegenError::UnsupportedOperator(op) => {
                write!(f, "operator `{}` is not supported", op)
            }
            CodegenError::Unsupported(what) => write!(f, "{} is not supported", what),
            CodegenError::InvalidAssignTarget => {
                f.write_str("left side of assignment is not assignable")
            }
            CodegenError::BreakOutsideLoop => f.write_str("`break` outside of a loop"),
            CodegenError::ContinueOutsideLoop => f.write_str("`continue` outside of a loop"),
            CodegenError::TooManyArguments { callee, count } => write!(
                f,
                "`{}` takes {} arguments; at most {} are supported",
                callee,
                count,
                ARG_REGISTERS.len()
            ),
            CodegenError::MalformedAst => {
                f.write_str("malformed syntax tree reached the code generator")
            }
        }
    }
}

impl Error for CodegenError {}

/// Jump targets of the innermost enclosing loop.
struct LoopLabels {
    continue_label: String,
    break_label: String,
}

/// Code generator state for one [`Codegen::generate`] run.
///
/// All state is instance scoped; a fresh run starts from a clean slate, so
/// one `Codegen` can compile independent programs back to back.
#[derive(Default)]
pub struct Codegen {
    text: Vec<String>,
    /// Frame of the function currently being generated; doubles as the
    /// symbol table.
    frame: FrameLayout,
    loop_labels: Vec<LoopLabels>,
    label_id: usize,
    /// Pooled string literals, emitted into `.data` as `str_<index>`.
    strings: Vec<String>,
    uses_print_int: bool,
    in_function: bool,
    /// Callable names (defined functions and externs) mapped to their
    /// parameter counts, so every call site is arity checked.
    functions: HashMap<String, usize>,
}

impl Codegen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowers a whole program to assembly text.
    pub fn generate(&mut self, program: &Program) -> Result<String, CodegenError> {
        *self = Self::new();

        for func in &program.functions {
            self.functions
                .insert(func.proto.name.clone(), func.proto.params.len());
        }
        for ext in &program.externs {
            self.functions.insert(ext.name.clone(), ext.params.len());
        }

        for func in &program.functions {
            self.gen_function(func)?;
        }
        self.gen_entry(program)?;
        if self.uses_print_int {
            self.gen_print_routine();
        }

        Ok(self.assemble(program))
    }

    /// Stitches the final output: data section, then text.
    fn assemble(&self, program: &Program) -> String {
        let mut out = String::new();

        if self.uses_print_int || !self.strings.is_empty() {
            out.push_str("section .data\n");
            if self.uses_print_int {
                out.push_str("print_buffer: times 20 db 0\n");
            }
            for (index, text) in self.strings.iter().enumerate() {
                out.push_str(&format!(
                    "str_{}: {}\n",
                    index,
                    db_directive(&decode_escapes(text))
                ));
            }
            out.push('\n');
        }

        out.push_str("section .text\n");
        let defined: HashSet<&str> = program
            .functions
            .iter()
            .map(|func| func.proto.name.as_str())
            .collect();
        for ext in &program.externs {
            if !defined.contains(ext.name.as_str()) {
                out.push_str(&format!("extern {}\n", ext.name));
            }
        }
        out.push_str("global _start\n");
        for line in &self.text {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    fn gen_function(&mut self, func: &Function) -> Result<(), CodegenError> {
        if func.proto.params.len() > ARG_REGISTERS.len() {
            return Err(CodegenError::TooManyArguments {
                callee: func.proto.name.clone(),
                count: func.proto.params.len(),
            });
        }

        self.frame = FrameLayout::layout_function(func);
        self.in_function = true;

        self.label(&func.proto.name);
        self.emit("push rbp");
        self.emit("mov rbp, rsp");
        let size = self.frame.frame_size();
        if size > 0 {
            self.emit(&format!("sub rsp, {}", size));
        }
        // spill the incoming arguments into their slots
        for (index, (_ty, name)) in func.proto.params.iter().enumerate() {
            let slot = self.slot(name)?;
            self.store_slot(&slot, ARG_REGISTERS[index]);
        }

        self.gen_stmt(&func.body)?;

        // fallthrough return for bodies without a trailing `return`
        self.emit("xor rax, rax");
        self.emit("leave");
        self.emit("ret");

        self.in_function = false;
        Ok(())
    }

    /// The `_start` block runs the top-level statements and exits via the
    /// `exit` syscall. A top-level `return` becomes the process exit code.
    fn gen_entry(&mut self, program: &Program) -> Result<(), CodegenError> {
        self.frame = FrameLayout::layout_program(program);

        self.label("_start");
        self.emit("push rbp");
        self.emit("mov rbp, rsp");
        let size = self.frame.frame_size();
        if size > 0 {
            self.emit(&format!("sub rsp, {}", size));
        }

        for stmt in &program.statements {
            self.gen_stmt(stmt)?;
        }

        self.emit("mov rax, 60");
        self.emit("xor rdi, rdi");
        self.emit("syscall");
        Ok(())
    }

    fn gen_stmt(&mut self, stmt: &Stmt) -> Result<(), CodegenError> {
        match stmt {
            Stmt::VarDecl { ty: _, vars } => {
                for (name, init) in vars {
                    if let Some(init) = init {
                        self.gen_expr(init)?;
                        let slot = self.slot(name)?;
                        self.store_slot(&slot, "rax");
                    }
                }
            }
            Stmt::ExprStmt(expr) => self.gen_expr(expr)?,
            Stmt::Block(body) => {
                for stmt in body {
                    self.gen_stmt(stmt)?;
                }
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let id = self.next_label();
                self.gen_expr(cond)?;
                self.emit("cmp rax, 0");
                match else_branch {
                    Some(else_branch) => {
                        self.emit(&format!("je if_else_{}", id));
                        self.gen_stmt(then_branch)?;
                        self.emit(&format!("jmp if_end_{}", id));
                        self.label(&format!("if_else_{}", id));
                        self.gen_stmt(else_branch)?;
                    }
                    None => {
                        self.emit(&format!("je if_end_{}", id));
                        self.gen_stmt(then_branch)?;
                    }
                }
                self.label(&format!("if_end_{}", id));
            }
            Stmt::While { cond, body } => {
                let id = self.next_label();
                let start = format!("while_start_{}", id);
                let end = format!("while_end_{}", id);

                self.label(&start);
                self.gen_expr(cond)?;
                self.emit("cmp rax, 0");
                self.emit(&format!("je {}", end));

                self.loop_labels.push(LoopLabels {
                    continue_label: start.clone(),
                    break_label: end.clone(),
                });
                self.gen_stmt(body)?;
                self.loop_labels.pop();

                self.emit(&format!("jmp {}", start));
                self.label(&end);
            }
            Stmt::For {
                init,
                cond,
                update,
                body,
            } => {
                let id = self.next_label();
                let start = format!("for_start_{}", id);
                let update_label = format!("for_update_{}", id);
                let end = format!("for_end_{}", id);

                if let Some(init) = init {
                    self.gen_stmt(init)?;
                }
                self.label(&start);
                if let Some(cond) = cond {
                    self.gen_expr(cond)?;
                    self.emit("cmp rax, 0");
                    self.emit(&format!("je {}", end));
                }

                // `continue` must run the update expression, so it jumps to
                // the update label, never back to the condition directly
                self.loop_labels.push(LoopLabels {
                    continue_label: update_label.clone(),
                    break_label: end.clone(),
                });
                self.gen_stmt(body)?;
                self.loop_labels.pop();

                self.label(&update_label);
                if let Some(update) = update {
                    self.gen_expr(update)?;
                }
                self.emit(&format!("jmp {}", start));
                self.label(&end);
            }
            Stmt::Return(value) => {
                match value {
                    Some(value) => self.gen_expr(value)?,
                    None => self.emit("xor rax, rax"),
                }
                if self.in_function {
                    self.emit("leave");
                    self.emit("ret");
                } else {
                    self.emit("mov rdi, rax");
                    self.emit("mov rax, 60");
                    self.emit("syscall");
                }
            }
            Stmt::Break => {
                let target = self
                    .loop_labels
                    .last()
                    .map(|labels| labels.break_label.clone())
                    .ok_or(CodegenError::BreakOutsideLoop)?;
                self.emit(&format!("jmp {}", target));
            }
            Stmt::Continue => {
                let target = self
                    .loop_labels
                    .last()
                    .map(|labels| labels.continue_label.clone())
                    .ok_or(CodegenError::ContinueOutsideLoop)?;
                self.emit(&format!("jmp {}", target));
            }
            Stmt::Error => return Err(CodegenError::MalformedAst),
        }
        Ok(())
    }

    fn gen_expr(&mut self, expr: &Expr) -> Result<(), CodegenError> {
        match expr {
            Expr::NumberLit { value, .. } => {
                // fractional literals are truncated; there is no FP lowering
                self.emit(&format!("mov rax, {}", *value as i64));
            }
            Expr::CharLit(value) => self.emit(&format!("mov rax, {}", *value as u32)),
            Expr::BoolLit(value) => self.emit(&format!("mov rax, {}", *value as u8)),
            Expr::StringLit(text) => {
                let index = self.intern_string(text);
                self.emit(&format!("mov rax, str_{}", index));
            }
            Expr::Identifier(name) => {
                let slot = self.slot(name)?;
                self.load_slot(&slot);
            }
            Expr::Binary { lhs, op, rhs } => {
                self.gen_expr(lhs)?;
                self.emit("push rax");
                self.gen_expr(rhs)?;
                self.emit("mov rcx, rax");
                self.emit("pop rax");
                self.gen_binop(op)?;
            }
            Expr::Unary { op, arg } => match op {
                Token::Plus => self.gen_expr(arg)?,
                Token::Minus => {
                    self.gen_expr(arg)?;
                    self.emit("neg rax");
                }
                Token::LogicalNot => {
                    self.gen_expr(arg)?;
                    self.emit("cmp rax, 0");
                    self.emit("sete al");
                    self.emit("movzx rax, al");
                }
                Token::Tilde => {
                    self.gen_expr(arg)?;
                    self.emit("not rax");
                }
                Token::PlusPlus | Token::MinusMinus => {
                    self.gen_incdec(op, arg, true)?;
                }
                other => return Err(CodegenError::UnsupportedOperator(other.to_string())),
            },
            Expr::Postfix { op, arg } => match op {
                Token::PlusPlus | Token::MinusMinus => {
                    self.gen_incdec(op, arg, false)?;
                }
                other => return Err(CodegenError::UnsupportedOperator(other.to_string())),
            },
            Expr::Call { callee, args } => self.gen_call(callee, args)?,
            Expr::Index { .. } => return Err(CodegenError::Unsupported("array indexing")),
            Expr::Member { .. } => return Err(CodegenError::Unsupported("member access")),
            Expr::Scope { .. } => return Err(CodegenError::Unsupported("scope resolution")),
            Expr::Assign { target, value } => {
                let name = match &**target {
                    Expr::Identifier(name) => name.clone(),
                    _ => return Err(CodegenError::InvalidAssignTarget),
                };
                self.gen_expr(value)?;
                let slot = self.slot(&name)?;
                self.store_slot(&slot, "rax");
            }
            Expr::Error => return Err(CodegenError::MalformedAst),
        }
        Ok(())
    }

    fn gen_binop(&mut self, op: &Token) -> Result<(), CodegenError> {
        match op {
            Token::Plus => self.emit("add rax, rcx"),
            Token::Minus => self.emit("sub rax, rcx"),
            Token::Asterisk => self.emit("imul rax, rcx"),
            Token::Slash => {
                self.emit("cqo");
                self.emit("idiv rcx");
            }
            Token::Percent => {
                self.emit("cqo");
                self.emit("idiv rcx");
                self.emit("mov rax, rdx");
            }
            Token::EqualsEquals => self.gen_compare("sete"),
            Token::NotEquals => self.gen_compare("setne"),
            Token::LessThan => self.gen_compare("setl"),
            Token::LessThanEquals => self.gen_compare("setle"),
            Token::GreaterThan => self.gen_compare("setg"),
            Token::GreaterThanEquals => self.gen_compare("setge"),
            Token::AndAnd => {
                self.emit("cmp rax, 0");
                self.emit("setne al");
                self.emit("cmp rcx, 0");
                self.emit("setne cl");
                self.emit("and al, cl");
                self.emit("movzx rax, al");
            }
            Token::OrOr => {
                self.emit("or rax, rcx");
                self.emit("cmp rax, 0");
                self.emit("setne al");
                self.emit("movzx rax, al");
            }
            other => return Err(CodegenError::UnsupportedOperator(other.to_string())),
        }
        Ok(())
    }

    fn gen_compare(&mut self, set: &str) {
        self.emit("cmp rax, rcx");
        self.emit(&format!("{} al", set));
        self.emit("movzx rax, al");
    }

    /// `++x`/`--x` and `x++`/`x--`. The prefix forms leave the new value in
    /// `rax`, the postfix forms the old one.
    fn gen_incdec(&mut self, op: &Token, arg: &Expr, prefix: bool) -> Result<(), CodegenError> {
        let name = match arg {
            Expr::Identifier(name) => name.clone(),
            _ => return Err(CodegenError::InvalidAssignTarget),
        };
        let slot = self.slot(&name)?;
        let instr = if *op == Token::PlusPlus { "add" } else { "sub" };

        self.load_slot(&slot);
        if prefix {
            self.emit(&format!("{} rax, 1", instr));
            self.store_slot(&slot, "rax");
        } else {
            self.emit("mov rcx, rax");
            self.emit(&format!("{} rcx, 1", instr));
            self.store_slot(&slot, "rcx");
        }
        Ok(())
    }

    fn gen_call(&mut self, callee: &str, args: &[Expr]) -> Result<(), CodegenError> {
        if callee == "print" {
            return self.gen_print(args);
        }
        let expected = match self.functions.get(callee) {
            Some(expected) => *expected,
            None => return Err(CodegenError::UnknownFunction(callee.to_string())),
        };
        if args.len() != expected {
            return Err(CodegenError::ArityMismatch {
                callee: callee.to_string(),
                expected,
                found: args.len(),
            });
        }
        if args.len() > ARG_REGISTERS.len() {
            return Err(CodegenError::TooManyArguments {
                callee: callee.to_string(),
                count: args.len(),
            });
        }

        for arg in args {
            self.gen_expr(arg)?;
            self.emit("push rax");
        }
        for index in (0..args.len()).rev() {
            self.emit(&format!("pop {}", ARG_REGISTERS[index]));
        }
        self.emit(&format!("call {}", callee));
        Ok(())
    }

    /// `print` built-in: string literals go straight to a `write` syscall,
    /// everything else is evaluated and handed to the `print_int` routine.
    fn gen_print(&mut self, args: &[Expr]) -> Result<(), CodegenError> {
        for arg in args {
            if let Expr::StringLit(text) = arg {
                let length = decode_escapes(text).len();
                let index = self.intern_string(text);
                self.emit("mov rax, 1");
                self.emit("mov rdi, 1");
                self.emit(&format!("mov rsi, str_{}", index));
                self.emit(&format!("mov rdx, {}", length));
                self.emit("syscall");
            } else {
                self.gen_expr(arg)?;
                self.emit("call print_int");
                self.uses_print_int = true;
            }
        }
        self.emit("xor rax, rax");
        Ok(())
    }

    /// Decimal integer printer: converts `rax` into `print_buffer` by
    /// repeated division and writes digits plus a newline to stdout.
    fn gen_print_routine(&mut self) {
        self.label("print_int");
        self.emit("mov r8, 0");
        self.emit("test rax, rax");
        self.emit("jns .convert");
        self.emit("neg rax");
        self.emit("mov r8, 1");
        self.label(".convert");
        self.emit("lea rsi, [print_buffer+19]");
        self.emit("mov byte [rsi], 10");
        self.emit("mov rbx, 10");
        self.label(".next_digit");
        self.emit("dec rsi");
        self.emit("xor rdx, rdx");
        self.emit("div rbx");
        self.emit("add dl, '0'");
        self.emit("mov [rsi], dl");
        self.emit("test rax, rax");
        self.emit("jnz .next_digit");
        self.emit("test r8, r8");
        self.emit("jz .write");
        self.emit("dec rsi");
        self.emit("mov byte [rsi], '-'");
        self.label(".write");
        self.emit("lea rdx, [print_buffer+20]");
        self.emit("sub rdx, rsi");
        self.emit("mov rax, 1");
        self.emit("mov rdi, 1");
        self.emit("syscall");
        self.emit("ret");
    }

    /// Emission helpers
    fn emit(&mut self, line: &str) {
        self.text.push(format!("    {}", line));
    }

    fn label(&mut self, name: &str) {
        self.text.push(format!("{}:", name));
    }

    /// One fresh id per construct; all of a construct's labels share it.
    fn next_label(&mut self) -> usize {
        let id = self.label_id;
        self.label_id += 1;
        id
    }

    fn slot(&self, name: &str) -> Result<FrameSlot, CodegenError> {
        self.frame
            .slot(name)
            .copied()
            .ok_or_else(|| CodegenError::UndeclaredVariable(name.to_string()))
    }

    fn load_slot(&mut self, slot: &FrameSlot) {
        match slot.size {
            1 => self.emit(&format!("movzx rax, byte [rbp-{}]", slot.offset)),
            4 => self.emit(&format!("mov eax, dword [rbp-{}]", slot.offset)),
            _ => self.emit(&format!("mov rax, [rbp-{}]", slot.offset)),
        }
    }

    fn store_slot(&mut self, slot: &FrameSlot, reg: &'static str) {
        let sub = subregister(reg, slot.size);
        self.emit(&format!("mov [rbp-{}], {}", slot.offset, sub));
    }

    fn intern_string(&mut self, text: &str) -> usize {
        if let Some(index) = self.strings.iter().position(|existing| existing == text) {
            return index;
        }
        self.strings.push(text.to_string());
        self.strings.len() - 1
    }
}

/// Sub-register of `reg` matching a slot size.
fn subregister(reg: &'static str, size: i64) -> &'static str {
    match size {
        1 => match reg {
            "rax" => "al",
            "rcx" => "cl",
            "rdx" => "dl",
            "rdi" => "dil",
            "rsi" => "sil",
            "r8" => "r8b",
            "r9" => "r9b",
            _ => reg,
        },
        4 => match reg {
            "rax" => "eax",
            "rcx" => "ecx",
            "rdx" => "edx",
            "rdi" => "edi",
            "rsi" => "esi",
            "r8" => "r8d",
            "r9" => "r9d",
            _ => reg,
        },
        _ => reg,
    }
}

/// Resolves the backslash escapes a string literal carries verbatim from the
/// lexer into raw bytes.
fn decode_escapes(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => bytes.push(b'\n'),
                Some('t') => bytes.push(b'\t'),
                Some('r') => bytes.push(b'\r'),
                Some('0') => bytes.push(0),
                Some(other) => bytes.extend_from_slice(other.encode_utf8(&mut buf).as_bytes()),
                None => bytes.push(b'\\'),
            }
        } else {
            bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
        }
    }
    bytes
}

/// Renders bytes as a NASM `db` directive with a terminating zero, keeping
/// printable runs quoted.
fn db_directive(bytes: &[u8]) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut run = String::new();
    for &byte in bytes {
        if (0x20..0x7f).contains(&byte) && byte != b'"' {
            run.push(byte as char);
        } else {
            if !run.is_empty() {
                parts.push(format!("\"{}\"", run));
                run.clear();
            }
            parts.push(byte.to_string());
        }
    }
    if !run.is_empty() {
        parts.push(format!("\"{}\"", run));
    }
    parts.push("0".to_string());
    format!("db {}", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaleido_parser::parser::Parser;
    use kaleido_source::Source;

    fn asm(code: &str) -> String {
        try_asm(code).expect("codegen failed")
    }

    fn try_asm(code: &str) -> Result<String, CodegenError> {
        let source: Source = code.into();
        let program = Parser::new(&source).unwrap().parse_program();
        assert!(source.has_no_errors(), "parse errors: {}", source.errors);
        Codegen::new().generate(&program)
    }

    #[test]
    fn empty_program_shape() {
        insta::assert_snapshot!(asm(""), @r###"
        section .text
        global _start
        _start:
            push rbp
            mov rbp, rsp
            mov rax, 60
            xor rdi, rdi
            syscall
        "###);
    }

    #[test]
    fn frame_is_reserved_up_front() {
        let asm = asm("int x = 5; int y = 7;");
        assert!(asm.contains("sub rsp, 16"));
        assert!(asm.contains("mov [rbp-8], rax"));
        assert!(asm.contains("mov [rbp-16], rax"));
    }

    #[test]
    fn implicit_declaration_gets_a_slot() {
        let asm = asm("x = 5;");
        assert!(asm.contains("sub rsp, 16"));
        assert!(asm.contains("mov [rbp-8], rax"));
    }

    #[test]
    fn byte_sized_locals_use_subregisters() {
        let asm = asm("char c = 'a'; bool flag = c == 'a';");
        assert!(asm.contains("mov [rbp-1], al"));
        assert!(asm.contains("movzx rax, byte [rbp-1]"));
    }

    #[test]
    fn binary_expression_uses_the_stack() {
        let asm = asm("int x = 1 + 2 * 3;");
        assert!(asm.contains("push rax"));
        assert!(asm.contains("pop rax"));
        assert!(asm.contains("imul rax, rcx"));
        assert!(asm.contains("add rax, rcx"));
    }

    #[test]
    fn division_sign_extends() {
        let asm = asm("int q = 7 / 2; int r = 7 % 2;");
        assert!(asm.contains("cqo"));
        assert!(asm.contains("idiv rcx"));
        assert!(asm.contains("mov rax, rdx"));
    }

    #[test]
    fn comparison_materializes_a_flag() {
        let asm = asm("int x = 1 < 2;");
        assert!(asm.contains("cmp rax, rcx"));
        assert!(asm.contains("setl al"));
        assert!(asm.contains("movzx rax, al"));
    }

    #[test]
    fn sibling_ifs_get_distinct_labels() {
        let asm = asm("int x = 1; if (x) { x = 2; } if (x) { x = 3; }");
        assert!(asm.contains("if_end_0:"));
        assert!(asm.contains("if_end_1:"));
    }

    #[test]
    fn if_else_branches() {
        let asm = asm("int x = 1; if (x) { x = 2; } else { x = 3; }");
        assert!(asm.contains("je if_else_0"));
        assert!(asm.contains("jmp if_end_0"));
        assert!(asm.contains("if_else_0:"));
        assert!(asm.contains("if_end_0:"));
    }

    #[test]
    fn break_targets_the_innermost_loop() {
        let asm = asm("while (1) { while (1) { break; } }");
        // outer loop takes id 0, inner takes id 1
        assert!(asm.contains("jmp while_end_1"));
        assert!(asm.contains("while_end_0:"));
    }

    #[test]
    fn continue_in_for_runs_the_update() {
        let asm = asm("for (int i = 0; i < 3; i = i + 1) { continue; }");
        assert!(asm.contains("jmp for_update_0"));
        assert!(asm.contains("for_update_0:"));
        assert!(asm.contains("jmp for_start_0"));
    }

    #[test]
    fn function_spills_arguments() {
        let asm = asm("int add(int a, int b) { return a + b; }");
        assert!(asm.contains("add:"));
        assert!(asm.contains("mov [rbp-8], rdi"));
        assert!(asm.contains("mov [rbp-16], rsi"));
        assert!(asm.contains("leave"));
        assert!(asm.contains("ret"));
    }

    #[test]
    fn call_passes_arguments_in_registers() {
        let asm = asm("int add(int a, int b) { return a + b; } int s = add(1, 2);");
        assert!(asm.contains("pop rsi"));
        assert!(asm.contains("pop rdi"));
        assert!(asm.contains("call add"));
    }

    #[test]
    fn top_level_return_is_the_exit_code() {
        let asm = asm("return 3;");
        assert!(asm.contains("mov rdi, rax"));
        assert!(asm.contains("mov rax, 60"));
    }

    #[test]
    fn print_int_routine_is_emitted_on_demand() {
        let asm = asm("print(42);");
        assert!(asm.contains("call print_int"));
        assert!(asm.contains("print_int:"));
        assert!(asm.contains("print_buffer: times 20 db 0"));

        let silent = try_asm("int x = 1;").unwrap();
        assert!(!silent.contains("print_int"));
        assert!(!silent.contains("section .data"));
    }

    #[test]
    fn string_literals_go_into_data() {
        let asm = asm("print(\"hi\");");
        assert!(asm.contains("section .data"));
        assert!(asm.contains("str_0: db \"hi\", 0"));
        assert!(asm.contains("mov rsi, str_0"));
        assert!(asm.contains("mov rdx, 2"));
    }

    #[test]
    fn identical_strings_are_pooled() {
        let asm = asm("print(\"hi\"); print(\"hi\");");
        assert!(!asm.contains("str_1"));
    }

    #[test]
    fn extern_emits_a_directive() {
        let asm = asm("extern getchar();");
        assert!(asm.contains("extern getchar"));
    }

    #[test]
    fn undeclared_read_fails() {
        assert_eq!(
            try_asm("y = x + 1;"),
            Err(CodegenError::UndeclaredVariable("x".to_string()))
        );
    }

    #[test]
    fn unknown_callee_fails() {
        assert_eq!(
            try_asm("foo(1);"),
            Err(CodegenError::UnknownFunction("foo".to_string()))
        );
    }

    #[test]
    fn call_arity_is_checked() {
        assert_eq!(
            try_asm("int square(int n) { return n * n; } square(1, 2);"),
            Err(CodegenError::ArityMismatch {
                callee: "square".to_string(),
                expected: 1,
                found: 2,
            })
        );
        assert_eq!(
            try_asm("extern putchar(c); putchar();"),
            Err(CodegenError::ArityMismatch {
                callee: "putchar".to_string(),
                expected: 1,
                found: 0,
            })
        );
        // the matching call still compiles
        assert!(try_asm("int square(int n) { return n * n; } square(3);").is_ok());
    }

    #[test]
    fn break_outside_loop_fails() {
        assert_eq!(try_asm("break;"), Err(CodegenError::BreakOutsideLoop));
        assert_eq!(try_asm("continue;"), Err(CodegenError::ContinueOutsideLoop));
    }

    #[test]
    fn unsupported_constructs_fail_closed() {
        assert_eq!(
            try_asm("int xs = 1; xs[0];"),
            Err(CodegenError::Unsupported("array indexing"))
        );
        assert_eq!(
            try_asm("int p = 1; int q = *p;"),
            Err(CodegenError::UnsupportedOperator("*".to_string()))
        );
    }

    #[test]
    fn too_many_arguments_fail() {
        let result = try_asm("def f(a b c d e f g) 1; f(1, 2, 3, 4, 5, 6, 7);");
        assert!(matches!(
            result,
            Err(CodegenError::TooManyArguments { count: 7, .. })
        ));
    }
}
