//! Analysis passes over the AST.

pub mod frame;
