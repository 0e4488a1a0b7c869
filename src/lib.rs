//! # VeLa - Validation and Extension Language
//!
//! An embeddable expression and scripting language: infix arithmetic, typed
//! first-class functions with closures, lists, pattern-matching selection and a
//! small standard library. Hosts inject values into the interpreter, evaluate
//! programs and read the results back as [`Operand`]s.
//!
//! ## Quick Start
//!
//! ```rust
//! use vela::{Interpreter, Operand, Parser, Scanner};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let code = r#"
//!     fact(n:integer):integer {
//!         when
//!             n <= 0 -> 1
//!             true -> n * fact(n-1)
//!     }
//!     fact(6)
//! "#;
//!
//! // Tokenize (scan)
//! let tokens = Scanner::new(code).scan_tokens()?;
//!
//! // Parse into AST
//! let program = Parser::new(tokens).parse()?;
//!
//! // Execute
//! let mut interpreter = Interpreter::new();
//! let result = interpreter.execute(&program)?;
//!
//! assert_eq!(result, Some(Operand::Integer(720)));
//! # Ok(())
//! # }
//! ```
//!
//! [`Interpreter::program`] does all three steps and caches the parsed program:
//!
//! ```rust
//! use vela::{Interpreter, Operand};
//!
//! # fn main() -> vela::Result<()> {
//! let mut interpreter = Interpreter::new();
//! interpreter.program("square is function(x:real):real { x*x }")?;
//! assert_eq!(interpreter.program("square(12)")?, Some(Operand::Real(144.0)));
//! # Ok(())
//! # }
//! ```
//!
//! ## Language Overview
//!
//! ### Data Types
//!
//! - **Scalars**: `integer`, `real`, `string`, `boolean`
//! - **Lists**: `[1 "two" 3.0]`, heterogeneous and immutable
//! - **Functions**: named `f(x:integer):integer { ... }` or anonymous `λ(x:real) { ... }`
//!
//! ### Bindings
//!
//! - `x <- 42` - Mutable binding; rebinding keeps the bound type
//! - `limit is 10` - Constant binding
//!
//! ### Control Flow
//!
//! - `when guard -> expr guard -> expr ...` - First true guard wins
//! - `if cond then expr else expr`
//! - `while cond { ... }`
//!
//! ## Architecture
//!
//! ```text
//! Source Code → Scanner → Tokens → Parser → AST → Interpreter → Operand
//! ```
//!
//! ### Main Components
//!
//! - [`Scanner`] - Tokenizes source code into tokens
//! - [`Parser`] - Parses tokens into an abstract syntax tree
//! - [`Interpreter`] - Evaluates the AST and owns the frame stack
//! - [`Operand`] - Runtime value representation
//! - [`Environment`] - Lexical frames with constant and mutable bindings
//! - [`ToolRegistry`] - Built-in functions
//!
//! ## Host Integration
//!
//! ```rust
//! use vela::{Interpreter, Operand};
//!
//! # fn main() -> vela::Result<()> {
//! let mut interpreter = Interpreter::new();
//! interpreter.push_environment(
//!     [("magnitude", Operand::Real(11.5)), ("band", Operand::string("V"))],
//!     &["band"],
//! );
//! assert!(interpreter.boolean_expression("magnitude < 12 and band = \"V\"")?);
//! assert_eq!(interpreter.real_expression("magnitude * 2")?, 23.0);
//! interpreter.pop_environment();
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Errors fall into two families: parse errors, which carry a source position,
//! and evaluation errors.
//!
//! ```rust
//! use vela::{ErrorFamily, Interpreter};
//!
//! let mut interpreter = Interpreter::new();
//!
//! let err = interpreter.program("42/0").unwrap_err();
//! assert_eq!(err.to_string(), "42/0: division by zero error");
//! assert_eq!(err.family(), ErrorFamily::Evaluation);
//!
//! let err = interpreter.program("2457580.25&1004").unwrap_err();
//! assert_eq!(err.position(), Some((1, 10)));
//! ```

/// Version of the VeLa interpreter
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod tools;

// Re-export main types
pub use error::{Error, ErrorFamily, Result};
pub use lexer::{Scanner, Token, TokenKind};
pub use parser::{
    BinaryOp, Expression, FunctionDef, Parser, Program, Type, UnaryOp, MAX_NESTING_DEPTH,
};
pub use runtime::{Environment, Function, Interpreter, InterpreterConfig, Operand};
pub use tools::{CallContext, Tool, ToolRegistry};
