use crate::error::{Error, Result};
use crate::parser::{Expression, FunctionDef, Parameter, Type};
use crate::runtime::evaluator::{STACK_GROW_SIZE, STACK_RED_ZONE};
use crate::runtime::Environment;
use crate::tools::Tool;
use std::fmt;
use std::rc::Rc;

/// Runtime value in VeLa
///
/// Operands are immutable; lists and functions are shared by reference.
#[derive(Clone)]
pub enum Operand {
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point
    Real(f64),
    /// String
    String(String),
    /// Boolean
    Boolean(bool),
    /// Heterogeneous list
    List(Rc<Vec<Operand>>),
    /// User closure or built-in
    Function(Function),
}

/// A callable value
#[derive(Clone)]
pub enum Function {
    /// User-defined function with its captured frame
    Closure(Rc<Closure>),
    /// Built-in tool
    Builtin(Rc<dyn Tool>),
}

/// A function definition paired with the frame it was defined in
pub struct Closure {
    /// Shared definition (parameters, return type, body)
    pub def: Rc<FunctionDef>,
    /// Frame active at the definition site
    pub env: Environment,
}

impl Closure {
    /// Creates a closure over `env`
    pub fn new(def: Rc<FunctionDef>, env: Environment) -> Self {
        Closure { def, env }
    }

    /// Display name (`λ` for anonymous functions)
    pub fn name(&self) -> &str {
        self.def.name.as_deref().unwrap_or("λ")
    }

    /// Declared parameters
    pub fn params(&self) -> &[Parameter] {
        &self.def.params
    }

    /// Declared return type
    pub fn return_type(&self) -> Option<Type> {
        self.def.return_type
    }

    /// Function body
    pub fn body(&self) -> &Expression {
        &self.def.body
    }

    /// Human-readable signature, e.g. `FACT(N:integer) : integer`
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .params()
            .iter()
            .map(|p| format!("{}:{}", p.name, p.type_name))
            .collect();
        match self.return_type() {
            Some(t) => format!("{}({}) : {}", self.name(), params.join(" "), t),
            None => format!("{}({})", self.name(), params.join(" ")),
        }
    }
}

impl Function {
    /// Function name
    pub fn name(&self) -> String {
        match self {
            Function::Closure(c) => c.name().to_string(),
            Function::Builtin(tool) => tool.name().to_string(),
        }
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Function) -> bool {
        match (self, other) {
            (Function::Closure(a), Function::Closure(b)) => Rc::ptr_eq(a, b),
            (Function::Builtin(a), Function::Builtin(b)) => {
                std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl Operand {
    /// The empty list sentinel returned by `head`, `tail` and `nth` on exhaustion
    pub fn empty_list() -> Self {
        Operand::List(Rc::new(Vec::new()))
    }

    /// Creates a list operand
    pub fn list(items: Vec<Operand>) -> Self {
        Operand::List(Rc::new(items))
    }

    /// Creates a string operand
    pub fn string(s: impl Into<String>) -> Self {
        Operand::String(s.into())
    }

    /// Wraps a user closure
    pub fn closure(closure: Closure) -> Self {
        Operand::Function(Function::Closure(Rc::new(closure)))
    }

    /// Wraps a built-in tool
    pub fn builtin(tool: Rc<dyn Tool>) -> Self {
        Operand::Function(Function::Builtin(tool))
    }

    /// Returns the type tag of this operand
    pub fn type_of(&self) -> Type {
        match self {
            Operand::Integer(_) => Type::Integer,
            Operand::Real(_) => Type::Real,
            Operand::String(_) => Type::String,
            Operand::Boolean(_) => Type::Boolean,
            Operand::List(_) => Type::List,
            Operand::Function(_) => Type::Function,
        }
    }

    /// Returns the type name as a string
    pub fn type_name(&self) -> String {
        self.type_of().to_string()
    }

    /// True for the empty list
    pub fn is_empty_list(&self) -> bool {
        matches!(self, Operand::List(items) if items.is_empty())
    }

    /// Extracts an integer
    pub fn as_integer(&self) -> Result<i64> {
        match self {
            Operand::Integer(n) => Ok(*n),
            _ => Err(self.wrong_type(Type::Integer)),
        }
    }

    /// Extracts a real, widening integers
    pub fn as_real(&self) -> Result<f64> {
        match self {
            Operand::Real(x) => Ok(*x),
            Operand::Integer(n) => Ok(*n as f64),
            _ => Err(self.wrong_type(Type::Real)),
        }
    }

    /// Extracts a string slice
    pub fn as_string(&self) -> Result<&str> {
        match self {
            Operand::String(s) => Ok(s),
            _ => Err(self.wrong_type(Type::String)),
        }
    }

    /// Extracts a boolean
    pub fn as_boolean(&self) -> Result<bool> {
        match self {
            Operand::Boolean(b) => Ok(*b),
            _ => Err(self.wrong_type(Type::Boolean)),
        }
    }

    /// Extracts list elements
    pub fn as_list(&self) -> Result<&[Operand]> {
        match self {
            Operand::List(items) => Ok(items),
            _ => Err(self.wrong_type(Type::List)),
        }
    }

    /// Extracts a function
    pub fn as_function(&self) -> Result<&Function> {
        match self {
            Operand::Function(f) => Ok(f),
            _ => Err(self.wrong_type(Type::Function)),
        }
    }

    /// Converts for parameter passing and return values: identity or Integer→Real
    pub fn convert_to(&self, target: Type) -> Option<Operand> {
        match (self, target) {
            (Operand::Integer(n), Type::Real) => Some(Operand::Real(*n as f64)),
            (value, target) if value.type_of() == target => Some(value.clone()),
            _ => None,
        }
    }

    /// Converts for `<-` rebinding, which additionally lets a scalar become a string
    pub fn convert_for_binding(&self, target: Type) -> Option<Operand> {
        match (self, target) {
            (Operand::List(_) | Operand::Function(_), Type::String) => None,
            (value, Type::String) => Some(Operand::String(value.to_string())),
            (value, target) => value.convert_to(target),
        }
    }

    fn wrong_type(&self, expected: Type) -> Error {
        Error::type_mismatch(format!(
            "expected a value of type {} but found {}",
            expected,
            self.type_name()
        ))
    }
}

/// Renders a real so that it always shows a fractional part (`144.0`,
/// `1.0e20`); the text reads back as the same value
pub fn format_real(x: f64) -> String {
    let text = format!("{:?}", x);
    match text.split_once('e') {
        Some((mantissa, exponent)) if !mantissa.contains('.') => {
            format!("{}.0e{}", mantissa, exponent)
        }
        _ => text,
    }
}

impl PartialEq for Operand {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Operand::Integer(a), Operand::Integer(b)) => a == b,
            (Operand::Real(a), Operand::Real(b)) => a == b,
            (Operand::String(a), Operand::String(b)) => a == b,
            (Operand::Boolean(a), Operand::Boolean(b)) => a == b,
            (Operand::List(a), Operand::List(b)) => Rc::ptr_eq(a, b) || a == b,
            // Functions compare by identity
            (Operand::Function(a), Operand::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::Integer(n) => write!(f, "{}", n),
            Operand::Real(x) => write!(f, "{}", format_real(*x)),
            Operand::String(s) => write!(f, "{}", s),
            Operand::Boolean(true) => write!(f, "True"),
            Operand::Boolean(false) => write!(f, "False"),
            Operand::List(items) => stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    match item {
                        Operand::String(s) => write!(f, "\"{}\"", s)?,
                        other => write!(f, "{}", other)?,
                    }
                }
                write!(f, "]")
            }),
            Operand::Function(func) => write!(f, "{}", func),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Function::Closure(c) => write!(f, "<function {}>", c.signature()),
            Function::Builtin(tool) => write!(f, "<builtin {}>", tool.name()),
        }
    }
}

impl fmt::Debug for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::Integer(n) => write!(f, "Integer({})", n),
            Operand::Real(x) => write!(f, "Real({:?})", x),
            Operand::String(s) => write!(f, "String({:?})", s),
            Operand::Boolean(b) => write!(f, "Boolean({})", b),
            Operand::List(items) => f.debug_tuple("List").field(&**items).finish(),
            Operand::Function(func) => write!(f, "Function({})", func),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl From<i64> for Operand {
    fn from(n: i64) -> Self {
        Operand::Integer(n)
    }
}

impl From<f64> for Operand {
    fn from(x: f64) -> Self {
        Operand::Real(x)
    }
}

impl From<bool> for Operand {
    fn from(b: bool) -> Self {
        Operand::Boolean(b)
    }
}

impl From<&str> for Operand {
    fn from(s: &str) -> Self {
        Operand::String(s.to_string())
    }
}

impl From<String> for Operand {
    fn from(s: String) -> Self {
        Operand::String(s)
    }
}

impl From<Vec<Operand>> for Operand {
    fn from(items: Vec<Operand>) -> Self {
        Operand::list(items)
    }
}
