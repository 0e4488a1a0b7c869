use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// A parsed VeLa program: a whitespace-separated sequence of top-level expressions
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    /// Top-level expressions in source order
    pub expressions: Vec<Expression>,
}

/// Literal values that appear directly in source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// Integer literal
    Integer(i64),
    /// Real literal
    Real(f64),
    /// String literal
    String(String),
    /// Boolean literal
    Boolean(bool),
}

/// Expression node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Literal value
    Literal(Literal),

    /// Variable reference (canonical upper-case name)
    Variable(String),

    /// Unary operation (-x, not x)
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand expression
        operand: Box<Expression>,
    },

    /// Binary operation (x + y, a in b)
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expression>,
        /// Right operand
        right: Box<Expression>,
    },

    /// Binding: `name <- value` (mutable) or `name is value` (constant)
    Binding {
        /// Bound name
        name: String,
        /// Value expression
        value: Box<Expression>,
        /// True for `is`
        constant: bool,
    },

    /// Braced sequence; its value is that of the last expression
    Block(Vec<Expression>),

    /// `when` selection: the first true guard wins
    Selection(Vec<GuardedExpression>),

    /// `while cond { body }`
    While {
        /// Loop condition
        condition: Box<Expression>,
        /// Loop body
        body: Box<Expression>,
    },

    /// `if cond then e [else e]`
    If {
        /// Condition
        condition: Box<Expression>,
        /// Taken when the condition is true
        consequent: Box<Expression>,
        /// Taken when the condition is false
        alternative: Option<Box<Expression>>,
    },

    /// List literal `[a b c]`
    List(Vec<Expression>),

    /// Named or anonymous function definition
    FunctionDef(Rc<FunctionDef>),

    /// Function application
    Call {
        /// Expression producing the function
        callee: Box<Expression>,
        /// Argument expressions
        args: Vec<Expression>,
    },
}

/// One `guard -> consequent` arm of a selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardedExpression {
    /// Boolean guard
    pub guard: Expression,
    /// Evaluated when the guard holds
    pub consequent: Expression,
}

/// Function definition shared by every closure created from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    /// Name for named definitions, `None` for `function(...)`/`λ(...)`
    pub name: Option<String>,
    /// Typed parameters
    pub params: Vec<Parameter>,
    /// Declared return type
    pub return_type: Option<Type>,
    /// Function body
    pub body: Rc<Expression>,
}

/// A typed function parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Declared type
    pub type_name: Type,
}

/// VeLa value types, as written in annotations and reported by `typeof`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// `integer`
    Integer,
    /// `real`
    Real,
    /// `string`
    String,
    /// `boolean`
    Boolean,
    /// `list`
    List,
    /// `function` / `λ`
    Function,
}

impl Type {
    /// Resolves an annotation name, ignoring case
    pub fn from_name(name: &str) -> Option<Type> {
        match name.to_ascii_lowercase().as_str() {
            "integer" | "int" => Some(Type::Integer),
            "real" => Some(Type::Real),
            "string" => Some(Type::String),
            "boolean" => Some(Type::Boolean),
            "list" => Some(Type::List),
            "function" | "λ" | "Λ" => Some(Type::Function),
            _ => None,
        }
    }

    /// True for integer and real
    pub fn is_numeric(self) -> bool {
        matches!(self, Type::Integer | Type::Real)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Type::Integer => "integer",
            Type::Real => "real",
            Type::String => "string",
            Type::Boolean => "boolean",
            Type::List => "list",
            Type::Function => "function",
        };
        write!(f, "{}", name)
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    /// Addition operator (+)
    Add,
    /// Subtraction operator (-)
    Sub,
    /// Multiplication operator (*)
    Mul,
    /// Division operator (/)
    Div,
    /// Power operator (^)
    Pow,
    /// Arithmetic shift left (<<)
    ShiftLeft,
    /// Arithmetic shift right (>>)
    ShiftRight,

    // Comparison
    /// Equality operator (=)
    Eq,
    /// Inequality operator (<>)
    NotEq,
    /// Less than operator (<)
    Lt,
    /// Greater than operator (>)
    Gt,
    /// Less than or equal operator (<=)
    LtEq,
    /// Greater than or equal operator (>=)
    GtEq,
    /// Regex match operator (=~)
    Match,
    /// Membership test operator (in)
    In,

    // Logical / bitwise
    /// `and`
    And,
    /// `or`
    Or,
    /// `xor`
    Xor,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Negation operator (-x)
    Neg,
    /// Logical or bitwise NOT (not x)
    Not,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
            BinaryOp::Pow => write!(f, "^"),
            BinaryOp::ShiftLeft => write!(f, "<<"),
            BinaryOp::ShiftRight => write!(f, ">>"),
            BinaryOp::Eq => write!(f, "="),
            BinaryOp::NotEq => write!(f, "<>"),
            BinaryOp::Lt => write!(f, "<"),
            BinaryOp::Gt => write!(f, ">"),
            BinaryOp::LtEq => write!(f, "<="),
            BinaryOp::GtEq => write!(f, ">="),
            BinaryOp::Match => write!(f, "=~"),
            BinaryOp::In => write!(f, "in"),
            BinaryOp::And => write!(f, "and"),
            BinaryOp::Or => write!(f, "or"),
            BinaryOp::Xor => write!(f, "xor"),
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Not => write!(f, "not"),
        }
    }
}
