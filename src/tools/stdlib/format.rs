//! printf-style formatting for VeLa
//!
//! `format(template list)` supports the conversions:
//! - %d, %i - Decimal integer
//! - %s - Human-readable form of any value
//! - %f - Fixed-point real (default precision 6)
//! - %e - Scientific real (`1.500000e+01`)
//! - %g - Fixed or scientific, whichever suits the magnitude
//! - %x, %o - Hexadecimal and octal integer
//! - %b - Binary integer, or `true`/`false` for a boolean
//! - %c - Character from a codepoint or one-character string
//! - %% - Percent literal
//! - %n - Newline
//!
//! Each conversion may carry flags (`-` left-justify, `0` zero-pad, `+` always
//! show a sign, ` ` space for positive numbers), a minimum width and a `.precision`.

use crate::error::{Error, Result};
use crate::runtime::Operand;
use crate::tools::{expects, CallContext, Tool};

/// FORMAT - printf-style template expansion
pub struct FormatTool;

impl Tool for FormatTool {
    fn name(&self) -> &str {
        "format"
    }

    fn description(&self) -> &str {
        "Format a list of values with a printf-style template"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, _ctx: &mut CallContext<'_>, args: &[Operand]) -> Result<Option<Operand>> {
        let template = match &args[0] {
            Operand::String(s) => s,
            _ => return Err(expects(self.name(), "string, list")),
        };
        let values = match &args[1] {
            Operand::List(items) => items,
            _ => return Err(expects(self.name(), "string, list")),
        };

        Ok(Some(Operand::String(format_template(template, values)?)))
    }
}

/// Flags, width and precision of one conversion
#[derive(Debug, Default)]
struct Conversion {
    left: bool,
    zero: bool,
    plus: bool,
    space: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

/// Expand a printf-style template
pub fn format_template(template: &str, args: &[Operand]) -> Result<String> {
    let mut result = String::new();
    let mut chars = template.chars().peekable();
    let mut arg_index = 0;

    while let Some(ch) = chars.next() {
        if ch != '%' {
            result.push(ch);
            continue;
        }

        let mut conv = Conversion::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => conv.left = true,
                '0' => conv.zero = true,
                '+' => conv.plus = true,
                ' ' => conv.space = true,
                _ => break,
            }
            chars.next();
        }

        let mut width = String::new();
        while let Some(&d) = chars.peek().filter(|c| c.is_ascii_digit()) {
            width.push(d);
            chars.next();
        }
        if !width.is_empty() {
            conv.width = width.parse().ok();
        }

        if chars.peek() == Some(&'.') {
            chars.next();
            let mut precision = String::new();
            while let Some(&d) = chars.peek().filter(|c| c.is_ascii_digit()) {
                precision.push(d);
                chars.next();
            }
            conv.precision = Some(precision.parse().unwrap_or(0));
        }

        let directive = chars
            .next()
            .ok_or_else(|| Error::runtime("format: template ends inside a conversion"))?;

        match directive {
            '%' => result.push('%'),
            'n' => result.push('\n'),
            'd' | 'i' | 's' | 'f' | 'e' | 'g' | 'x' | 'X' | 'o' | 'b' | 'c' => {
                let arg = args.get(arg_index).ok_or_else(|| {
                    Error::runtime(format!("format: missing argument for '%{}'", directive))
                })?;
                arg_index += 1;
                result.push_str(&convert(directive, &conv, arg)?);
            }
            other => {
                return Err(Error::runtime(format!(
                    "format: unknown conversion '%{}'",
                    other
                )))
            }
        }
    }

    Ok(result)
}

fn convert(directive: char, conv: &Conversion, arg: &Operand) -> Result<String> {
    match (directive, arg) {
        ('d' | 'i', Operand::Integer(n)) => {
            Ok(pad_number(conv, *n < 0, n.unsigned_abs().to_string()))
        }
        ('s', value) => {
            let text = value.to_string();
            let text = match conv.precision {
                Some(p) => text.chars().take(p).collect(),
                None => text,
            };
            Ok(pad(conv, text))
        }
        ('f' | 'e' | 'g', Operand::Integer(_) | Operand::Real(_)) => {
            let x = arg.as_real()?;
            if !x.is_finite() {
                return Ok(pad(conv, non_finite(conv, x)));
            }
            let precision = conv.precision.unwrap_or(6);
            let digits = match directive {
                'f' => format!("{:.*}", precision, x.abs()),
                'e' => scientific(x.abs(), precision),
                _ => general(x.abs(), precision),
            };
            Ok(pad_number(conv, x.is_sign_negative() && x != 0.0, digits))
        }
        ('x', Operand::Integer(n)) => Ok(pad_number(conv, false, format!("{:x}", n))),
        ('X', Operand::Integer(n)) => Ok(pad_number(conv, false, format!("{:X}", n))),
        ('o', Operand::Integer(n)) => Ok(pad_number(conv, false, format!("{:o}", n))),
        ('b', Operand::Integer(n)) => Ok(pad_number(conv, false, format!("{:b}", n))),
        ('b', Operand::Boolean(b)) => Ok(pad(conv, b.to_string())),
        ('c', Operand::Integer(n)) => {
            let c = u32::try_from(*n)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| Error::runtime(format!("format: {} is not a valid codepoint", n)))?;
            Ok(pad(conv, c.to_string()))
        }
        ('c', Operand::String(s)) if s.chars().count() == 1 => Ok(pad(conv, s.clone())),
        (directive, value) => Err(Error::type_mismatch(format!(
            "format: '%{}' cannot format a value of type {}",
            directive,
            value.type_name()
        ))),
    }
}

/// `d.ddddde±XX` with at least two exponent digits
fn scientific(x: f64, precision: usize) -> String {
    let formatted = format!("{:.*e}", precision, x);
    match formatted.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => formatted,
    }
}

/// Fixed notation for moderate magnitudes, scientific otherwise
fn general(x: f64, precision: usize) -> String {
    let precision = precision.max(1);
    if x == 0.0 {
        return format!("{:.*}", precision - 1, x);
    }
    // Exponent after rounding to the requested significant digits
    let rounded = format!("{:.*e}", precision - 1, x);
    let exponent: i32 = rounded
        .split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);

    if exponent >= -4 && exponent < precision as i32 {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        format!("{:.*}", decimals, x)
    } else {
        scientific(x, precision - 1)
    }
}

fn non_finite(conv: &Conversion, x: f64) -> String {
    if x.is_nan() {
        "NaN".to_string()
    } else if x < 0.0 {
        "-Infinity".to_string()
    } else if conv.plus {
        "+Infinity".to_string()
    } else {
        "Infinity".to_string()
    }
}

fn pad(conv: &Conversion, body: String) -> String {
    let len = body.chars().count();
    match conv.width {
        Some(width) if width > len => {
            let fill = " ".repeat(width - len);
            if conv.left {
                body + &fill
            } else {
                fill + &body
            }
        }
        _ => body,
    }
}

/// Applies sign flags, then zero or space padding
fn pad_number(conv: &Conversion, negative: bool, digits: String) -> String {
    let sign = if negative {
        "-"
    } else if conv.plus {
        "+"
    } else if conv.space {
        " "
    } else {
        ""
    };

    match conv.width {
        Some(width) if conv.zero && !conv.left && width > sign.len() + digits.len() => {
            let zeros = "0".repeat(width - sign.len() - digits.len());
            format!("{}{}{}", sign, zeros, digits)
        }
        _ => pad(conv, format!("{}{}", sign, digits)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(template: &str, args: Vec<Operand>) -> String {
        format_template(template, &args).unwrap()
    }

    #[test]
    fn test_integers() {
        assert_eq!(fmt("%d", vec![42i64.into()]), "42");
        assert_eq!(fmt("%5d|", vec![42i64.into()]), "   42|");
        assert_eq!(fmt("%-5d|", vec![42i64.into()]), "42   |");
        assert_eq!(fmt("%05d", vec![(-42i64).into()]), "-0042");
        assert_eq!(fmt("%+d", vec![7i64.into()]), "+7");
        assert_eq!(fmt("%x %o %b", vec![255i64.into(), 8i64.into(), 5i64.into()]), "ff 10 101");
    }

    #[test]
    fn test_reals() {
        assert_eq!(fmt("%.2f", vec![3.14159.into()]), "3.14");
        assert_eq!(fmt("%f", vec![1i64.into()]), "1.000000");
        assert_eq!(fmt("%e", vec![15.0.into()]), "1.500000e+01");
        assert_eq!(fmt("%.3e", vec![0.00012.into()]), "1.200e-04");
        assert_eq!(fmt("%g", vec![0.5.into()]), "0.500000");
        assert_eq!(fmt("%g", vec![1.0e10.into()]), "1.00000e+10");
    }

    #[test]
    fn test_strings_and_misc() {
        assert_eq!(
            fmt("%s is %s%n", vec!["x".into(), true.into()]),
            "x is True\n"
        );
        assert_eq!(fmt("%.2s", vec!["abc".into()]), "ab");
        assert_eq!(fmt("%c%c", vec![65i64.into(), "b".into()]), "Ab");
        assert_eq!(fmt("100%%", vec![]), "100%");
    }

    #[test]
    fn test_errors() {
        assert!(format_template("%d", &[]).is_err());
        assert!(format_template("%d", &["x".into()]).is_err());
        assert!(format_template("%q", &[1i64.into()]).is_err());
        assert!(format_template("%", &[]).is_err());
    }
}
