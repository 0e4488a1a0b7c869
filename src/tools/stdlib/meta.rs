//! Reflective tools: evaluation, documentation and type inspection

use chrono::Utc;

use crate::error::{Error, Result};
use crate::runtime::{canonical_name, Function, Operand};
use crate::tools::{expects, CallContext, Tool, ToolRegistry};

/// Julian Date of the Unix epoch
const UNIX_EPOCH_JD: f64 = 2_440_587.5;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Register meta tools
pub fn register(registry: &mut ToolRegistry) {
    registry.register(EvalTool);
    registry.register(HelpTool);
    registry.register(IntrinsicsTool);
    registry.register(TodayTool);
    registry.register(TypeOfTool);
}

/// EVAL - Evaluate source text in the caller's frame
///
/// Usage: `eval(string) -> list`
/// Example: `eval("1 2")` returns `[2]`; `eval("x <- 1")` returns `[]`
pub struct EvalTool;

impl Tool for EvalTool {
    fn name(&self) -> &str {
        "eval"
    }

    fn description(&self) -> &str {
        "Evaluate VeLa source; returns [result] or [] if no value was produced"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let source = match &args[0] {
            Operand::String(s) => s,
            _ => return Err(expects(self.name(), "string")),
        };
        let result = match ctx.eval_source(source)? {
            Some(value) => Operand::list(vec![value]),
            None => Operand::empty_list(),
        };
        Ok(Some(result))
    }
}

/// HELP - Describe a function by name or value
///
/// Usage: `help("sqrt")`, `help(fact)`
pub struct HelpTool;

impl Tool for HelpTool {
    fn name(&self) -> &str {
        "help"
    }

    fn description(&self) -> &str {
        "Describe a built-in or the signature of a user function"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let function = match &args[0] {
            Operand::Function(f) => f.clone(),
            Operand::String(name) => match ctx.env.get(&canonical_name(name))? {
                Operand::Function(f) => f,
                other => {
                    return Ok(Some(Operand::String(format!(
                        "{} is a {} value",
                        canonical_name(name),
                        other.type_name()
                    ))))
                }
            },
            _ => return Err(expects(self.name(), "string or function")),
        };

        let text = match &function {
            Function::Builtin(tool) => format!("{}: {}", tool.name(), tool.description()),
            Function::Closure(closure) => closure.signature(),
        };
        Ok(Some(Operand::String(text)))
    }
}

/// INTRINSICS - Sorted names of every built-in
pub struct IntrinsicsTool;

impl Tool for IntrinsicsTool {
    fn name(&self) -> &str {
        "intrinsics"
    }

    fn description(&self) -> &str {
        "Sorted list of built-in function names"
    }

    fn arity(&self) -> Option<usize> {
        Some(0)
    }

    fn execute(&self, ctx: &mut CallContext<'_>, _args: &[Operand]) -> Result<Option<Operand>> {
        let names = ctx
            .interpreter
            .registry()
            .list_tools()
            .into_iter()
            .map(Operand::String)
            .collect();
        Ok(Some(Operand::list(names)))
    }
}

/// TODAY - Julian Date of the current instant
pub struct TodayTool;

impl Tool for TodayTool {
    fn name(&self) -> &str {
        "today"
    }

    fn description(&self) -> &str {
        "Julian Date of the current instant (UTC)"
    }

    fn arity(&self) -> Option<usize> {
        Some(0)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, _args: &[Operand]) -> Result<Option<Operand>> {
        let millis = Utc::now().timestamp_millis() as f64;
        Ok(Some(Operand::Real(UNIX_EPOCH_JD + millis / MILLIS_PER_DAY)))
    }
}

/// TYPEOF - Type name of a value
pub struct TypeOfTool;

impl Tool for TypeOfTool {
    fn name(&self) -> &str {
        "typeof"
    }

    fn description(&self) -> &str {
        "Type name of a value"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        Ok(Some(Operand::String(args[0].type_name())))
    }
}
