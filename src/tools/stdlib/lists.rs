//! List tools, including the higher-order `map`, `filter`, `reduce` and `for`
//!
//! `length` and `concat` also accept strings.

use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::runtime::{Function, Operand};
use crate::tools::{expects, CallContext, Tool, ToolRegistry};

/// Register list tools
pub fn register(registry: &mut ToolRegistry) {
    registry.register(HeadTool);
    registry.register(TailTool);
    registry.register(NthTool);
    registry.register(LengthTool);
    registry.register(ConcatTool);
    registry.register(AppendTool);
    registry.register(SeqTool);
    registry.register(MapTool);
    registry.register(FilterTool);
    registry.register(ReduceTool);
    registry.register(ForTool);
    registry.register(ReverseTool);
    registry.register(SortTool);
}

fn list_arg<'a>(tool: &str, value: &'a Operand) -> Result<&'a [Operand]> {
    match value {
        Operand::List(items) => Ok(items),
        _ => Err(expects(tool, "list")),
    }
}

/// Function and list arguments of the higher-order tools
fn function_and_list<'a>(tool: &str, args: &'a [Operand]) -> Result<(&'a Function, &'a [Operand])> {
    match (&args[0], &args[1]) {
        (Operand::Function(f), Operand::List(items)) => Ok((f, items)),
        _ => Err(expects(tool, "function, list")),
    }
}

// ============================================================================
// Access
// ============================================================================

/// Tool for getting first element of a list
///
/// Usage: `head(list) -> value` (the empty list when `list` is empty)
pub struct HeadTool;

impl Tool for HeadTool {
    fn name(&self) -> &str {
        "head"
    }

    fn description(&self) -> &str {
        "First element of a list"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let items = list_arg(self.name(), &args[0])?;
        Ok(Some(items.first().cloned().unwrap_or_else(Operand::empty_list)))
    }
}

/// Tool for all but the first element of a list
pub struct TailTool;

impl Tool for TailTool {
    fn name(&self) -> &str {
        "tail"
    }

    fn description(&self) -> &str {
        "All but the first element of a list"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let items = list_arg(self.name(), &args[0])?;
        match items.split_first() {
            Some((_, rest)) => Ok(Some(Operand::list(rest.to_vec()))),
            None => Ok(Some(Operand::empty_list())),
        }
    }
}

/// Tool for the element at a zero-based index
///
/// Usage: `nth(list index) -> value` (the empty list when out of range)
pub struct NthTool;

impl Tool for NthTool {
    fn name(&self) -> &str {
        "nth"
    }

    fn description(&self) -> &str {
        "Element at a zero-based index"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let (items, index) = match (&args[0], &args[1]) {
            (Operand::List(items), Operand::Integer(index)) => (items, *index),
            _ => return Err(expects(self.name(), "list, integer")),
        };
        let element = usize::try_from(index)
            .ok()
            .and_then(|i| items.get(i))
            .cloned()
            .unwrap_or_else(Operand::empty_list);
        Ok(Some(element))
    }
}

/// Tool for the length of a list or string
pub struct LengthTool;

impl Tool for LengthTool {
    fn name(&self) -> &str {
        "length"
    }

    fn description(&self) -> &str {
        "Number of elements in a list or characters in a string"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let len = match &args[0] {
            Operand::List(items) => items.len(),
            Operand::String(s) => s.chars().count(),
            _ => return Err(expects(self.name(), "list or string")),
        };
        Ok(Some(Operand::Integer(len as i64)))
    }
}

// ============================================================================
// Construction
// ============================================================================

/// Tool for joining two lists or two strings
///
/// Usage: `concat([1 2] [3]) -> [1 2 3]`, `concat("ab" "c") -> "abc"`
pub struct ConcatTool;

impl Tool for ConcatTool {
    fn name(&self) -> &str {
        "concat"
    }

    fn description(&self) -> &str {
        "Join two lists or two strings"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        match (&args[0], &args[1]) {
            (Operand::List(a), Operand::List(b)) => {
                let mut joined = Vec::with_capacity(a.len() + b.len());
                joined.extend(a.iter().cloned());
                joined.extend(b.iter().cloned());
                Ok(Some(Operand::list(joined)))
            }
            (Operand::String(a), Operand::String(b)) => Ok(Some(Operand::String(format!("{}{}", a, b)))),
            _ => Err(expects(self.name(), "list, list or string, string")),
        }
    }
}

/// Tool for adding one trailing element; a list argument is not flattened
pub struct AppendTool;

impl Tool for AppendTool {
    fn name(&self) -> &str {
        "append"
    }

    fn description(&self) -> &str {
        "New list with one element added at the end"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let items = list_arg(self.name(), &args[0])?;
        let mut appended = items.to_vec();
        appended.push(args[1].clone());
        Ok(Some(Operand::list(appended)))
    }
}

/// Tool for an inclusive arithmetic sequence
///
/// Usage: `seq(start end step) -> list`
/// Example: `seq(1 10 3)` returns `[1 4 7 10]`, `seq(1.0 0.0 -0.5)` returns `[1.0 0.5 0.0]`
pub struct SeqTool;

impl Tool for SeqTool {
    fn name(&self) -> &str {
        "seq"
    }

    fn description(&self) -> &str {
        "Inclusive sequence from start to end by step"
    }

    fn arity(&self) -> Option<usize> {
        Some(3)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        match (&args[0], &args[1], &args[2]) {
            (Operand::Integer(start), Operand::Integer(end), Operand::Integer(step)) => {
                check_step(*start as f64, *end as f64, *step as f64)?;
                let mut items = Vec::new();
                let mut i = *start;
                while (*step > 0 && i <= *end) || (*step < 0 && i >= *end) {
                    items.push(Operand::Integer(i));
                    i = match i.checked_add(*step) {
                        Some(next) => next,
                        None => break,
                    };
                }
                Ok(Some(Operand::list(items)))
            }
            (start, end, step) => {
                let numeric = |v: &Operand| match v {
                    Operand::Integer(_) | Operand::Real(_) => v.as_real(),
                    _ => Err(expects(self.name(), "integer or real")),
                };
                let (start, end, step) = (numeric(start)?, numeric(end)?, numeric(step)?);
                check_step(start, end, step)?;
                // Index-based to avoid accumulating rounding error
                let mut items = Vec::new();
                let mut n = 0u64;
                loop {
                    let x = start + n as f64 * step;
                    if (step > 0.0 && x > end) || (step < 0.0 && x < end) {
                        break;
                    }
                    items.push(Operand::Real(x));
                    n += 1;
                }
                Ok(Some(Operand::list(items)))
            }
        }
    }
}

fn check_step(start: f64, end: f64, step: f64) -> Result<()> {
    if step == 0.0 || !step.is_finite() || !start.is_finite() || !end.is_finite() {
        return Err(Error::runtime(format!(
            "seq: step {} would never reach {}",
            step, end
        )));
    }
    Ok(())
}

// ============================================================================
// Higher-order
// ============================================================================

/// Tool for applying a function to every element
///
/// Usage: `map(function list) -> list`
/// Example: `map(function(n:integer):integer {n*n} [1 2 3])` returns `[1 4 9]`
pub struct MapTool;

impl Tool for MapTool {
    fn name(&self) -> &str {
        "map"
    }

    fn description(&self) -> &str {
        "Apply a function to each element"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let (function, items) = function_and_list(self.name(), args)?;
        let mapped = items
            .iter()
            .map(|item| ctx.call_value(function, vec![item.clone()]))
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(Operand::list(mapped)))
    }
}

/// Tool for keeping the elements a predicate accepts
pub struct FilterTool;

impl Tool for FilterTool {
    fn name(&self) -> &str {
        "filter"
    }

    fn description(&self) -> &str {
        "Elements for which the predicate returns true"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let (function, items) = function_and_list(self.name(), args)?;
        let mut kept = Vec::new();
        for item in items {
            match ctx.call_value(function, vec![item.clone()])? {
                Operand::Boolean(true) => kept.push(item.clone()),
                Operand::Boolean(false) => {}
                other => {
                    return Err(Error::type_mismatch(format!(
                        "filter: predicate must return boolean but returned {}",
                        other.type_name()
                    )))
                }
            }
        }
        Ok(Some(Operand::list(kept)))
    }
}

/// Tool for a left fold
///
/// Usage: `reduce(function list seed) -> value`
/// Example: `reduce(function(a:integer b:integer):integer {a+b} [1 2 3] 0)` returns `6`
pub struct ReduceTool;

impl Tool for ReduceTool {
    fn name(&self) -> &str {
        "reduce"
    }

    fn description(&self) -> &str {
        "Fold a list from the left, starting from a seed"
    }

    fn arity(&self) -> Option<usize> {
        Some(3)
    }

    fn execute(&self, ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let (function, items) = function_and_list(self.name(), args)?;
        let mut acc = args[2].clone();
        for item in items {
            // A step that produces nothing keeps the accumulator
            if let Some(next) = ctx.call(function, vec![acc.clone(), item.clone()])? {
                acc = next;
            }
        }
        Ok(Some(acc))
    }
}

/// Tool for applying a function to each element for its effects
pub struct ForTool;

impl Tool for ForTool {
    fn name(&self) -> &str {
        "for"
    }

    fn description(&self) -> &str {
        "Apply a function to each element, discarding results"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let (function, items) = function_and_list(self.name(), args)?;
        for item in items {
            ctx.call(function, vec![item.clone()])?;
        }
        Ok(None)
    }
}

// ============================================================================
// Ordering
// ============================================================================

/// Tool for reversing a list
pub struct ReverseTool;

impl Tool for ReverseTool {
    fn name(&self) -> &str {
        "reverse"
    }

    fn description(&self) -> &str {
        "Elements in reverse order"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let items = list_arg(self.name(), &args[0])?;
        Ok(Some(Operand::list(items.iter().rev().cloned().collect())))
    }
}

/// Tool for sorting a list of numbers or a list of strings (ascending)
pub struct SortTool;

impl Tool for SortTool {
    fn name(&self) -> &str {
        "sort"
    }

    fn description(&self) -> &str {
        "Sort numbers or strings in ascending order"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let items = list_arg(self.name(), &args[0])?;

        let all_numbers = items
            .iter()
            .all(|i| matches!(i, Operand::Integer(_) | Operand::Real(_)));
        let all_strings = items.iter().all(|i| matches!(i, Operand::String(_)));
        if !all_numbers && !all_strings {
            return Err(Error::type_mismatch(
                "sort: list must hold only numbers or only strings",
            ));
        }

        let mut sorted = items.to_vec();
        sorted.sort_by(|a, b| match (a, b) {
            (Operand::String(x), Operand::String(y)) => x.cmp(y),
            _ => match (a.as_real(), b.as_real()) {
                (Ok(x), Ok(y)) => x.total_cmp(&y),
                _ => Ordering::Equal,
            },
        });
        Ok(Some(Operand::list(sorted)))
    }
}
