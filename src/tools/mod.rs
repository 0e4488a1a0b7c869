//! Built-in function system for VeLa
//!
//! Built-ins are [`Tool`] objects. The interpreter binds every registered tool
//! into its intrinsics frame, so they are resolved, shadowed and passed around
//! exactly like user functions.

pub mod stdlib;

use crate::error::{Error, Result};
use crate::runtime::{Environment, Function, Interpreter, Operand};
use std::collections::HashMap;
use std::rc::Rc;

/// Tool trait - all VeLa built-ins implement this
pub trait Tool {
    /// Tool name as shown to users (lookup ignores case)
    fn name(&self) -> &str;

    /// Tool description
    fn description(&self) -> &str;

    /// Execute the tool; `None` means the call produced no value
    fn execute(&self, ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>>;

    /// Required number of arguments, checked before `execute`
    fn arity(&self) -> Option<usize> {
        None // None means the tool checks its own arguments
    }
}

/// What a tool can reach while it runs: the interpreter and the caller's frame
pub struct CallContext<'a> {
    /// Running interpreter
    pub interpreter: &'a mut Interpreter,
    /// Frame the call was made from
    pub env: &'a Environment,
}

impl<'a> CallContext<'a> {
    /// Creates a context for a call made from `env`
    pub fn new(interpreter: &'a mut Interpreter, env: &'a Environment) -> Self {
        CallContext { interpreter, env }
    }

    /// Calls a function value with already-evaluated arguments
    pub fn call(&mut self, function: &Function, args: Vec<Operand>) -> Result<Option<Operand>> {
        self.interpreter.call_function(function, args, self.env)
    }

    /// Calls a function value that must produce a value
    pub fn call_value(&mut self, function: &Function, args: Vec<Operand>) -> Result<Operand> {
        let name = function.name();
        self.call(function, args)?.ok_or(Error::NoValue {
            context: format!("call to {}", name),
        })
    }

    /// Parses and evaluates source text in the caller's frame
    pub fn eval_source(&mut self, source: &str) -> Result<Option<Operand>> {
        let program = self.interpreter.parse(source)?;
        self.interpreter.execute_in(&program, self.env)
    }

    /// Writes text to the interpreter's output sink
    pub fn write(&mut self, text: &str) -> Result<()> {
        self.interpreter.write_output(text)
    }

    /// Whole-string regular expression match using the interpreter's cache
    pub fn full_match(&mut self, text: &str, pattern: &str) -> Result<bool> {
        self.interpreter.full_match(text, pattern)
    }

    /// Compiled regular expression from the interpreter's cache
    pub fn regex(&mut self, pattern: &str) -> Result<regex::Regex> {
        self.interpreter.regex(pattern)
    }
}

/// Checks an exact argument count
pub fn expect_arity(tool: &str, args: &[Operand], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(Error::arity(tool, expected, args.len()));
    }
    Ok(())
}

/// Type error in the `'name' expects values of type ...` form
pub fn expects(tool: &str, types: &str) -> Error {
    Error::type_mismatch(format!("'{}' expects values of type {}", tool, types))
}

/// Tool registry
pub struct ToolRegistry {
    tools: HashMap<String, Rc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create new registry with standard library
    pub fn new() -> Self {
        let mut registry = ToolRegistry {
            tools: HashMap::new(),
        };

        // Register all standard library tools
        stdlib::register_all(&mut registry);

        registry
    }

    /// Create empty registry (for testing)
    pub fn empty() -> Self {
        ToolRegistry {
            tools: HashMap::new(),
        }
    }

    /// Register a tool, replacing any tool with the same (case-insensitive) name
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.name().to_ascii_uppercase();
        self.tools.insert(name, Rc::new(tool));
    }

    /// Get tool by name, ignoring ASCII case
    pub fn get(&self, name: &str) -> Result<Rc<dyn Tool>> {
        self.tools
            .get(&name.to_ascii_uppercase())
            .cloned()
            .ok_or_else(|| Error::UndefinedVariable {
                name: name.to_string(),
            })
    }

    /// Check if tool exists
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(&name.to_ascii_uppercase())
    }

    /// List all tool names (canonical form), sorted
    pub fn list_tools(&self) -> Vec<String> {
        let mut names: Vec<_> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Iterate over (canonical name, tool) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Rc<dyn Tool>)> {
        self.tools.iter()
    }

    /// Get tool count
    pub fn count(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
