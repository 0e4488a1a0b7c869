//! Error types for the VeLa interpreter

use thiserror::Error;

/// VeLa interpreter errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Parse errors
    /// Character not recognised by the scanner
    ///
    /// **Triggered by:** A character no token rule accepts
    /// **Example:** `2457580.25&1004` (the `&`)
    #[error("Lexical error at line {line}, column {col}: {message}")]
    LexicalError {
        /// Line number where error occurred
        line: usize,
        /// Column number where error occurred
        col: usize,
        /// Error description
        message: String,
    },

    /// Syntax error encountered during parsing
    ///
    /// **Triggered by:** Token sequences the grammar does not accept
    /// **Example:** `2 => 3`, `f(1 2` (missing closing parenthesis)
    #[error("Syntax error at line {line}, column {col}: {message}")]
    SyntaxError {
        /// Line number where error occurred
        line: usize,
        /// Column number where error occurred
        col: usize,
        /// Error description
        message: String,
    },

    // Runtime errors
    /// Illegal binding or rebinding of a name
    ///
    /// **Triggered by:** `is` on a bound name, `<-` on a constant, or a type-changing `<-`
    /// **Example:** `x is 12  x <- x + 1`
    #[error("{message}")]
    BindingError {
        /// Name being bound
        name: String,
        /// Error description
        message: String,
    },

    /// Operand or argument of the wrong type
    ///
    /// **Example:** `1 + "a"`, `sqrt("x")`
    #[error("{message}")]
    TypeMismatch {
        /// Error description
        message: String,
    },

    /// Wrong number of arguments in a call
    #[error("{function} expects {expected} argument(s) but {got} were supplied")]
    ArityMismatch {
        /// Function name
        function: String,
        /// Expected argument count (or description)
        expected: String,
        /// Supplied argument count
        got: usize,
    },

    /// Division by zero error
    ///
    /// **Triggered by:** Integer or real division by zero
    /// **Example:** `42/0`, `42.42/0.0`
    #[error("{expression}: division by zero error")]
    DivisionByZero {
        /// The failing sub-expression, rendered from its operands
        expression: String,
    },

    /// Reference to undefined variable
    #[error("Undefined variable: {name}")]
    UndefinedVariable {
        /// Variable name
        name: String,
    },

    /// Attempt to call a non-callable value
    #[error("Value is not callable: {type_name}")]
    NotCallable {
        /// Type of non-callable value
        type_name: String,
    },

    /// An expression that produces nothing was used where a value is required
    #[error("No value was produced by {context}")]
    NoValue {
        /// What needed the value
        context: String,
    },

    /// Call depth limit exceeded
    ///
    /// **Triggered by:** Unbounded (or very deep) recursion; there is no tail-call elimination
    /// **Example:** `f() { f() } f()`
    #[error("Stack overflow: call depth exceeded {depth}")]
    StackOverflow {
        /// The configured depth limit
        depth: usize,
    },

    /// Regular expression failed to compile
    #[error("Invalid regular expression '{pattern}': {message}")]
    RegexError {
        /// Pattern text
        pattern: String,
        /// Compiler message
        message: String,
    },

    /// Program file could not be found or read
    #[error("Cannot read '{path}': {message}")]
    Io {
        /// Path as given or resolved
        path: String,
        /// Underlying failure
        message: String,
    },

    /// General runtime error
    #[error("{0}")]
    RuntimeError(String),
}

/// The two disjoint error families reported to a host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorFamily {
    /// Raised while tokenizing or parsing
    Parse,
    /// Raised while evaluating
    Evaluation,
}

impl Error {
    /// Create a runtime error with a message
    pub fn runtime(msg: impl Into<String>) -> Self {
        Error::RuntimeError(msg.into())
    }

    /// Create a type mismatch error with a message
    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        Error::TypeMismatch {
            message: msg.into(),
        }
    }

    /// Create a binding error for `name`
    pub fn binding(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Error::BindingError {
            name: name.into(),
            message: msg.into(),
        }
    }

    /// Create an arity error
    pub fn arity(function: impl Into<String>, expected: impl ToString, got: usize) -> Self {
        Error::ArityMismatch {
            function: function.into(),
            expected: expected.to_string(),
            got,
        }
    }

    /// Classify the error into its family
    pub fn family(&self) -> ErrorFamily {
        match self {
            Error::LexicalError { .. } | Error::SyntaxError { .. } => ErrorFamily::Parse,
            _ => ErrorFamily::Evaluation,
        }
    }

    /// True for lexical and syntax errors
    pub fn is_parse_error(&self) -> bool {
        self.family() == ErrorFamily::Parse
    }

    /// Source position (line, column) of parse errors
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            Error::LexicalError { line, col, .. } | Error::SyntaxError { line, col, .. } => {
                Some((*line, *col))
            }
            _ => None,
        }
    }
}

/// Result type for VeLa operations
pub type Result<T> = std::result::Result<T, Error>;
