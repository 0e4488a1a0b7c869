//! Lexical analysis for VeLa
//!
//! Converts source text into a stream of tokens. Identifiers are folded to
//! ASCII upper case so that `x` and `X` name the same binding.

mod scanner;
mod token;

pub use scanner::Scanner;
pub use token::{Token, TokenKind};
