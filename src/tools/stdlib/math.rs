//! Math tools

use crate::error::{Error, Result};
use crate::runtime::Operand;
use crate::tools::{expects, CallContext, Tool, ToolRegistry};

/// Register math tools
pub fn register(registry: &mut ToolRegistry) {
    registry.register(SinTool);
    registry.register(CosTool);
    registry.register(TanTool);
    registry.register(AsinTool);
    registry.register(AcosTool);
    registry.register(AtanTool);
    registry.register(SinhTool);
    registry.register(CoshTool);
    registry.register(TanhTool);
    registry.register(ExpTool);
    registry.register(LogTool);
    registry.register(Log10Tool);
    registry.register(SqrtTool);
    registry.register(CbrtTool);
    registry.register(CeilTool);
    registry.register(FloorTool);
    registry.register(RoundTool);
    registry.register(AbsTool);
    registry.register(PowTool);
    registry.register(Atan2Tool);
    registry.register(MinTool);
    registry.register(MaxTool);
    registry.register(IntTool);
    registry.register(RealTool);
}

fn number(tool: &str, value: &Operand) -> Result<f64> {
    match value {
        Operand::Integer(_) | Operand::Real(_) => value.as_real(),
        _ => Err(expects(tool, "integer or real")),
    }
}

/// NaN results are domain errors rather than values
fn checked(tool: &str, args: &[Operand], result: f64) -> Result<Option<Operand>> {
    if result.is_nan() {
        let shown: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        return Err(Error::runtime(format!(
            "{}({}): argument outside the function's domain",
            tool,
            shown.join(" ")
        )));
    }
    Ok(Some(Operand::Real(result)))
}

macro_rules! real_function_tool {
    ($name:ident, $str:expr, $desc:expr, $f:expr) => {
        #[doc = $desc]
        pub struct $name;
        impl Tool for $name {
            fn name(&self) -> &str {
                $str
            }
            fn description(&self) -> &str {
                $desc
            }
            fn arity(&self) -> Option<usize> {
                Some(1)
            }
            fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
                let x = number($str, &args[0])?;
                let f: fn(f64) -> f64 = $f;
                checked($str, args, f(x))
            }
        }
    };
}

// Trigonometric
real_function_tool!(SinTool, "sin", "Sine of an angle in radians", f64::sin);
real_function_tool!(CosTool, "cos", "Cosine of an angle in radians", f64::cos);
real_function_tool!(TanTool, "tan", "Tangent of an angle in radians", f64::tan);
real_function_tool!(AsinTool, "asin", "Arc sine, in radians", f64::asin);
real_function_tool!(AcosTool, "acos", "Arc cosine, in radians", f64::acos);
real_function_tool!(AtanTool, "atan", "Arc tangent, in radians", f64::atan);

// Hyperbolic
real_function_tool!(SinhTool, "sinh", "Hyperbolic sine", f64::sinh);
real_function_tool!(CoshTool, "cosh", "Hyperbolic cosine", f64::cosh);
real_function_tool!(TanhTool, "tanh", "Hyperbolic tangent", f64::tanh);

// Exponential and roots
real_function_tool!(ExpTool, "exp", "e raised to the argument", f64::exp);
real_function_tool!(LogTool, "log", "Natural logarithm", f64::ln);
real_function_tool!(Log10Tool, "log10", "Base 10 logarithm", f64::log10);
real_function_tool!(SqrtTool, "sqrt", "Square root", f64::sqrt);
real_function_tool!(CbrtTool, "cbrt", "Cube root", f64::cbrt);

// Rounding
real_function_tool!(CeilTool, "ceil", "Smallest integral real not less than the argument", f64::ceil);
real_function_tool!(FloorTool, "floor", "Largest integral real not greater than the argument", f64::floor);

/// Tool for rounding a number to the nearest integer
///
/// Usage: `round(number) -> integer`
/// Example: `round(2.5)` returns `3`
pub struct RoundTool;

impl Tool for RoundTool {
    fn name(&self) -> &str {
        "round"
    }

    fn description(&self) -> &str {
        "Round to nearest integer"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        match &args[0] {
            Operand::Integer(n) => Ok(Some(Operand::Integer(*n))),
            other => {
                let x = number("round", other)?;
                if !x.is_finite() {
                    return Err(Error::runtime(format!("round({}): not a finite number", other)));
                }
                Ok(Some(Operand::Integer(x.round() as i64)))
            }
        }
    }
}

/// Tool for calculating absolute value of a number
///
/// Usage: `abs(number) -> number`
/// Example: `abs(-5)` returns `5`
pub struct AbsTool;

impl Tool for AbsTool {
    fn name(&self) -> &str {
        "abs"
    }

    fn description(&self) -> &str {
        "Absolute value"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        match &args[0] {
            Operand::Integer(n) => Ok(Some(Operand::Integer(n.wrapping_abs()))),
            Operand::Real(x) => Ok(Some(Operand::Real(x.abs()))),
            _ => Err(expects("abs", "integer or real")),
        }
    }
}

/// Tool for raising a base to an exponent (base^exponent)
///
/// Usage: `pow(base exponent) -> real`
/// Example: `pow(2 8)` returns `256.0`
pub struct PowTool;

impl Tool for PowTool {
    fn name(&self) -> &str {
        "pow"
    }

    fn description(&self) -> &str {
        "Power (base^exponent)"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let base = number("pow", &args[0])?;
        let exp = number("pow", &args[1])?;
        checked("pow", args, base.powf(exp))
    }
}

/// Tool for the two-argument arc tangent
///
/// Usage: `atan2(y x) -> real`
pub struct Atan2Tool;

impl Tool for Atan2Tool {
    fn name(&self) -> &str {
        "atan2"
    }

    fn description(&self) -> &str {
        "Angle of the point (x, y) in radians"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let y = number("atan2", &args[0])?;
        let x = number("atan2", &args[1])?;
        checked("atan2", args, y.atan2(x))
    }
}

/// Smaller of two numbers; Integer if both are
pub struct MinTool;

impl Tool for MinTool {
    fn name(&self) -> &str {
        "min"
    }

    fn description(&self) -> &str {
        "Minimum of two numbers"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        extremum("min", &args[0], &args[1], |a, b| a <= b)
    }
}

/// Larger of two numbers; Integer if both are
pub struct MaxTool;

impl Tool for MaxTool {
    fn name(&self) -> &str {
        "max"
    }

    fn description(&self) -> &str {
        "Maximum of two numbers"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        extremum("max", &args[0], &args[1], |a, b| a >= b)
    }
}

fn extremum(
    tool: &str,
    a: &Operand,
    b: &Operand,
    keep_first: impl Fn(f64, f64) -> bool,
) -> Result<Option<Operand>> {
    if let (Operand::Integer(x), Operand::Integer(y)) = (a, b) {
        let first = keep_first(*x as f64, *y as f64);
        return Ok(Some(Operand::Integer(if first { *x } else { *y })));
    }
    let x = number(tool, a)?;
    let y = number(tool, b)?;
    Ok(Some(Operand::Real(if keep_first(x, y) { x } else { y })))
}

/// Tool for truncating a number to an integer
///
/// Usage: `int(number) -> integer`
/// Example: `int(-2.7)` returns `-2`
pub struct IntTool;

impl Tool for IntTool {
    fn name(&self) -> &str {
        "int"
    }

    fn description(&self) -> &str {
        "Truncate a number toward zero"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        match &args[0] {
            Operand::Integer(n) => Ok(Some(Operand::Integer(*n))),
            Operand::Real(x) if x.is_finite() => Ok(Some(Operand::Integer(x.trunc() as i64))),
            Operand::Real(x) => Err(Error::runtime(format!("int({:?}): not a finite number", x))),
            _ => Err(expects("int", "integer or real")),
        }
    }
}

/// Tool for widening a number to a real
pub struct RealTool;

impl Tool for RealTool {
    fn name(&self) -> &str {
        "real"
    }

    fn description(&self) -> &str {
        "Convert a number to real"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        Ok(Some(Operand::Real(number("real", &args[0])?)))
    }
}
