//! Runtime execution for VeLa programs

mod collector;
mod config;
mod environment;
mod evaluator;
mod operators;
mod value;

pub use config::InterpreterConfig;
pub use environment::{Binding, Environment, WeakEnvironment};
pub use evaluator::{canonical_name, Interpreter, OutputSink};
pub use value::{format_real, Closure, Function, Operand};
