//! String manipulation tools

use crate::error::{Error, Result};
use crate::runtime::Operand;
use crate::tools::{expects, CallContext, Tool, ToolRegistry};

/// Register string tools
pub fn register(registry: &mut ToolRegistry) {
    registry.register(ContainsTool);
    registry.register(StartsWithTool);
    registry.register(EndsWithTool);
    registry.register(MatchesTool);
    registry.register(ReplaceTool);
    registry.register(ReplaceAllTool);
    registry.register(IndexOfTool);
    registry.register(LastIndexOfTool);
    registry.register(SubstringTool);
    registry.register(ToUpperCaseTool);
    registry.register(ToLowerCaseTool);
    registry.register(TrimTool);
    registry.register(SplitTool);
    registry.register(OrdTool);
    registry.register(ChrTool);
    registry.register(StrTool);
}

fn string_arg<'a>(tool: &str, value: &'a Operand) -> Result<&'a str> {
    match value {
        Operand::String(s) => Ok(s),
        _ => Err(expects(tool, "string")),
    }
}

fn integer_arg(tool: &str, value: &Operand) -> Result<i64> {
    match value {
        Operand::Integer(n) => Ok(*n),
        _ => Err(expects(tool, "integer")),
    }
}

/// Character index of a byte offset in `s`
fn char_index(s: &str, byte_offset: usize) -> i64 {
    s[..byte_offset].chars().count() as i64
}

// ============================================================================
// Predicates
// ============================================================================

/// Tool for testing whether a string contains another
///
/// Usage: `contains(string substring) -> boolean`
pub struct ContainsTool;

impl Tool for ContainsTool {
    fn name(&self) -> &str {
        "contains"
    }

    fn description(&self) -> &str {
        "Does the string contain the substring?"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let s = string_arg(self.name(), &args[0])?;
        let sub = string_arg(self.name(), &args[1])?;
        Ok(Some(Operand::Boolean(s.contains(sub))))
    }
}

/// Tool for testing a string prefix
pub struct StartsWithTool;

impl Tool for StartsWithTool {
    fn name(&self) -> &str {
        "startsWith"
    }

    fn description(&self) -> &str {
        "Does the string start with the prefix?"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let s = string_arg(self.name(), &args[0])?;
        let prefix = string_arg(self.name(), &args[1])?;
        Ok(Some(Operand::Boolean(s.starts_with(prefix))))
    }
}

/// Tool for testing a string suffix
pub struct EndsWithTool;

impl Tool for EndsWithTool {
    fn name(&self) -> &str {
        "endsWith"
    }

    fn description(&self) -> &str {
        "Does the string end with the suffix?"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let s = string_arg(self.name(), &args[0])?;
        let suffix = string_arg(self.name(), &args[1])?;
        Ok(Some(Operand::Boolean(s.ends_with(suffix))))
    }
}

/// Tool for whole-string regular expression matching
///
/// Usage: `matches(string regex) -> boolean`
/// Example: `matches("abc" "a.c")` returns `true`, `matches("abcd" "a.c")` returns `false`
pub struct MatchesTool;

impl Tool for MatchesTool {
    fn name(&self) -> &str {
        "matches"
    }

    fn description(&self) -> &str {
        "Does the whole string match the regular expression?"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let s = string_arg(self.name(), &args[0])?;
        let pattern = string_arg(self.name(), &args[1])?;
        Ok(Some(Operand::Boolean(ctx.full_match(s, pattern)?)))
    }
}

// ============================================================================
// Transformations
// ============================================================================

/// Tool for replacing every occurrence of a literal substring
///
/// Usage: `replace(string target replacement) -> string`
/// Example: `replace("1.5" "." ",")` returns `"1,5"`
pub struct ReplaceTool;

impl Tool for ReplaceTool {
    fn name(&self) -> &str {
        "replace"
    }

    fn description(&self) -> &str {
        "Replace every occurrence of a literal substring"
    }

    fn arity(&self) -> Option<usize> {
        Some(3)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let s = string_arg(self.name(), &args[0])?;
        let target = string_arg(self.name(), &args[1])?;
        let replacement = string_arg(self.name(), &args[2])?;
        Ok(Some(Operand::string(s.replace(target, replacement))))
    }
}

/// Tool for replacing every regex match
///
/// Usage: `replaceAll(string regex replacement) -> string`; `$1` or `${name}`
/// in the replacement refers to a capture group
/// Example: `replaceAll("a1b22" "[0-9]+" "#")` returns `"a#b#"`
pub struct ReplaceAllTool;

impl Tool for ReplaceAllTool {
    fn name(&self) -> &str {
        "replaceAll"
    }

    fn description(&self) -> &str {
        "Replace every match of a regular expression"
    }

    fn arity(&self) -> Option<usize> {
        Some(3)
    }

    fn execute(&self, ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let s = string_arg(self.name(), &args[0])?;
        let pattern = string_arg(self.name(), &args[1])?;
        let replacement = string_arg(self.name(), &args[2])?;
        let regex = ctx.regex(pattern)?;
        Ok(Some(Operand::string(regex.replace_all(s, replacement))))
    }
}

/// Tool for finding the first occurrence of a substring
///
/// Usage: `indexOf(string substring) -> integer` (-1 when absent)
pub struct IndexOfTool;

impl Tool for IndexOfTool {
    fn name(&self) -> &str {
        "indexOf"
    }

    fn description(&self) -> &str {
        "Character index of the first occurrence, or -1"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let s = string_arg(self.name(), &args[0])?;
        let sub = string_arg(self.name(), &args[1])?;
        let index = s.find(sub).map_or(-1, |offset| char_index(s, offset));
        Ok(Some(Operand::Integer(index)))
    }
}

/// Tool for finding the last occurrence of a substring
pub struct LastIndexOfTool;

impl Tool for LastIndexOfTool {
    fn name(&self) -> &str {
        "lastIndexOf"
    }

    fn description(&self) -> &str {
        "Character index of the last occurrence, or -1"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let s = string_arg(self.name(), &args[0])?;
        let sub = string_arg(self.name(), &args[1])?;
        let index = s.rfind(sub).map_or(-1, |offset| char_index(s, offset));
        Ok(Some(Operand::Integer(index)))
    }
}

/// Tool for extracting part of a string by character index
///
/// Usage: `substring(string start [end]) -> string`
/// Example: `substring("hello" 1 3)` returns `"el"`
pub struct SubstringTool;

impl Tool for SubstringTool {
    fn name(&self) -> &str {
        "substring"
    }

    fn description(&self) -> &str {
        "Characters from start (inclusive) to end (exclusive)"
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        if args.len() != 2 && args.len() != 3 {
            return Err(Error::arity(self.name(), "2 or 3", args.len()));
        }

        let s = string_arg(self.name(), &args[0])?;
        let len = s.chars().count() as i64;
        let start = integer_arg(self.name(), &args[1])?;
        let end = match args.get(2) {
            Some(end) => integer_arg(self.name(), end)?,
            None => len,
        };

        if start < 0 || end > len || start > end {
            return Err(Error::runtime(format!(
                "substring: range {}..{} is out of bounds for a string of length {}",
                start, end, len
            )));
        }

        let result: String = s
            .chars()
            .skip(start as usize)
            .take((end - start) as usize)
            .collect();
        Ok(Some(Operand::String(result)))
    }
}

/// Tool for converting string to uppercase
pub struct ToUpperCaseTool;

impl Tool for ToUpperCaseTool {
    fn name(&self) -> &str {
        "toUpperCase"
    }

    fn description(&self) -> &str {
        "Convert string to uppercase"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let s = string_arg(self.name(), &args[0])?;
        Ok(Some(Operand::String(s.to_uppercase())))
    }
}

/// Tool for converting string to lowercase
pub struct ToLowerCaseTool;

impl Tool for ToLowerCaseTool {
    fn name(&self) -> &str {
        "toLowerCase"
    }

    fn description(&self) -> &str {
        "Convert string to lowercase"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let s = string_arg(self.name(), &args[0])?;
        Ok(Some(Operand::String(s.to_lowercase())))
    }
}

/// Tool for trimming whitespace
pub struct TrimTool;

impl Tool for TrimTool {
    fn name(&self) -> &str {
        "trim"
    }

    fn description(&self) -> &str {
        "Remove leading and trailing whitespace"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let s = string_arg(self.name(), &args[0])?;
        Ok(Some(Operand::string(s.trim())))
    }
}

/// Tool for splitting a string on a regular expression
///
/// Usage: `split(string regex) -> list`
/// Example: `split("a, b,c" ",\s*")` returns `["a" "b" "c"]`
pub struct SplitTool;

impl Tool for SplitTool {
    fn name(&self) -> &str {
        "split"
    }

    fn description(&self) -> &str {
        "Split a string around matches of a regular expression"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let s = string_arg(self.name(), &args[0])?;
        let pattern = string_arg(self.name(), &args[1])?;
        let regex = ctx.regex(pattern)?;
        let parts = regex.split(s).map(Operand::string).collect();
        Ok(Some(Operand::list(parts)))
    }
}

// ============================================================================
// Characters and conversion
// ============================================================================

/// Tool for the codepoint of the first character
///
/// Usage: `ord(string) -> integer`
/// Example: `ord("A")` returns `65`
pub struct OrdTool;

impl Tool for OrdTool {
    fn name(&self) -> &str {
        "ord"
    }

    fn description(&self) -> &str {
        "Codepoint of the first character"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let s = string_arg(self.name(), &args[0])?;
        match s.chars().next() {
            Some(c) => Ok(Some(Operand::Integer(c as i64))),
            None => Err(Error::runtime("ord: empty string has no first character")),
        }
    }
}

/// Tool for the character with a given codepoint
///
/// Usage: `chr(integer) -> string`
/// Example: `chr(65)` returns `"A"`; `chr(-1)` returns `""`
pub struct ChrTool;

impl Tool for ChrTool {
    fn name(&self) -> &str {
        "chr"
    }

    fn description(&self) -> &str {
        "Character with the given codepoint, or the empty string"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let code = integer_arg(self.name(), &args[0])?;
        let s = u32::try_from(code)
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default();
        Ok(Some(Operand::String(s)))
    }
}

/// Tool for the human-readable form of any value
///
/// Usage: `str(value) -> string`
/// Example: `str(12.0)` returns `"12.0"`
pub struct StrTool;

impl Tool for StrTool {
    fn name(&self) -> &str {
        "str"
    }

    fn description(&self) -> &str {
        "Human-readable form of a value"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        Ok(Some(Operand::String(args[0].to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Interpreter;

    fn call(tool: &dyn Tool, args: &[Operand]) -> Result<Option<Operand>> {
        let mut interp = Interpreter::new();
        let env = interp.current_env();
        let mut ctx = CallContext::new(&mut interp, &env);
        tool.execute(&mut ctx, args)
    }

    fn s(text: &str) -> Operand {
        Operand::string(text)
    }

    #[test]
    fn test_index_of_counts_characters() {
        assert_eq!(
            call(&IndexOfTool, &[s("héllo"), s("l")]).unwrap(),
            Some(Operand::Integer(2))
        );
        assert_eq!(
            call(&LastIndexOfTool, &[s("héllo"), s("l")]).unwrap(),
            Some(Operand::Integer(3))
        );
        assert_eq!(
            call(&IndexOfTool, &[s("abc"), s("z")]).unwrap(),
            Some(Operand::Integer(-1))
        );
    }

    #[test]
    fn test_substring() {
        assert_eq!(
            call(&SubstringTool, &[s("hello"), Operand::Integer(1), Operand::Integer(3)]).unwrap(),
            Some(s("el"))
        );
        assert_eq!(
            call(&SubstringTool, &[s("hello"), Operand::Integer(3)]).unwrap(),
            Some(s("lo"))
        );
        assert!(call(&SubstringTool, &[s("hello"), Operand::Integer(4), Operand::Integer(9)]).is_err());
    }

    #[test]
    fn test_replace_and_split() {
        assert_eq!(
            call(&ReplaceTool, &[s("1.5"), s("."), s(",")]).unwrap(),
            Some(s("1,5"))
        );
        assert_eq!(
            call(&ReplaceTool, &[s("price"), s("price"), s("$1")]).unwrap(),
            Some(s("$1"))
        );
        assert_eq!(
            call(&ReplaceAllTool, &[s("a1b22"), s("[0-9]+"), s("#")]).unwrap(),
            Some(s("a#b#"))
        );
        assert_eq!(
            call(&ReplaceAllTool, &[s("2023-01-05"), s(r"(\d+)-(\d+)-(\d+)"), s("$3/$2/$1")])
                .unwrap(),
            Some(s("05/01/2023"))
        );
        assert_eq!(
            call(&SplitTool, &[s("a, b,c"), s(",\\s*")]).unwrap(),
            Some(Operand::list(vec![s("a"), s("b"), s("c")]))
        );
    }

    #[test]
    fn test_ord_chr() {
        assert_eq!(call(&OrdTool, &[s("A")]).unwrap(), Some(Operand::Integer(65)));
        assert_eq!(call(&ChrTool, &[Operand::Integer(65)]).unwrap(), Some(s("A")));
        assert_eq!(call(&ChrTool, &[Operand::Integer(-1)]).unwrap(), Some(s("")));
        assert_eq!(
            call(&ChrTool, &[Operand::Integer(0x110000)]).unwrap(),
            Some(s(""))
        );
    }

    #[test]
    fn test_type_errors() {
        let err = call(&TrimTool, &[Operand::Integer(1)]).unwrap_err();
        assert_eq!(err.to_string(), "'trim' expects values of type string");
    }
}
