//! Output tools
//!
//! Both write to the interpreter's output sink and produce no value.

use crate::error::Result;
use crate::runtime::Operand;
use crate::tools::{CallContext, Tool, ToolRegistry};

/// Register output tools
pub fn register(registry: &mut ToolRegistry) {
    registry.register(PrintTool);
    registry.register(PrintlnTool);
}

fn joined(args: &[Operand]) -> String {
    args.iter()
        .map(|arg| arg.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// PRINT - Write arguments separated by spaces
pub struct PrintTool;

impl Tool for PrintTool {
    fn name(&self) -> &str {
        "print"
    }

    fn description(&self) -> &str {
        "Print values separated by spaces"
    }

    fn execute(&self, ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        ctx.write(&joined(args))?;
        Ok(None)
    }
}

/// PRINTLN - Write arguments separated by spaces, then a newline
pub struct PrintlnTool;

impl Tool for PrintlnTool {
    fn name(&self) -> &str {
        "println"
    }

    fn description(&self) -> &str {
        "Print values separated by spaces, followed by a newline"
    }

    fn execute(&self, ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let mut line = joined(args);
        line.push('\n');
        ctx.write(&line)?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::Interpreter;

    #[test]
    fn test_print_buffers_output() {
        let mut interp = Interpreter::new();
        let result = interp.program("print(1 \"a\" 2.5) println([1 2] true)").unwrap();
        assert_eq!(result, None);
        assert_eq!(interp.take_output(), "1 a 2.5[1 2] True\n");
        assert_eq!(interp.take_output(), "");
    }
}
