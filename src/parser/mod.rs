//! VeLa Parser Module
//!
//! Parses the token stream into an Abstract Syntax Tree (AST).

mod ast;
#[allow(clippy::module_inception)]
mod parser;

pub use ast::{
    BinaryOp, Expression, FunctionDef, GuardedExpression, Literal, Parameter, Program, Type,
    UnaryOp,
};
pub use parser::{Parser, MAX_NESTING_DEPTH};
