//! x86-64 assembly generation.

pub mod codegen;
