//! Unary and binary operator semantics

use crate::error::{Error, Result};
use crate::parser::{BinaryOp, UnaryOp};
use crate::runtime::evaluator::{STACK_GROW_SIZE, STACK_RED_ZONE};
use crate::runtime::{Interpreter, Operand};

impl Interpreter {
    /// Applies a binary operator to two evaluated operands
    pub fn apply_binary(&mut self, op: BinaryOp, left: &Operand, right: &Operand) -> Result<Operand> {
        // Nested lists recurse once per level
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.apply_binary_inner(op, left, right)
        })
    }

    fn apply_binary_inner(&mut self, op: BinaryOp, left: &Operand, right: &Operand) -> Result<Operand> {
        if op == BinaryOp::In {
            return membership(left, right);
        }

        // Lists broadcast element-wise
        match (left, right) {
            (Operand::List(l), Operand::List(r)) => {
                if l.len() != r.len() {
                    return Err(Error::runtime(format!(
                        "Lists must be of equal length for '{}' operation",
                        op
                    )));
                }
                let items = l
                    .iter()
                    .zip(r.iter())
                    .map(|(a, b)| self.apply_binary(op, a, b))
                    .collect::<Result<Vec<_>>>()?;
                return Ok(Operand::list(items));
            }
            (Operand::List(l), scalar) => {
                let items = l
                    .iter()
                    .map(|a| self.apply_binary(op, a, scalar))
                    .collect::<Result<Vec<_>>>()?;
                return Ok(Operand::list(items));
            }
            (scalar, Operand::List(r)) => {
                let items = r
                    .iter()
                    .map(|b| self.apply_binary(op, scalar, b))
                    .collect::<Result<Vec<_>>>()?;
                return Ok(Operand::list(items));
            }
            _ => {}
        }

        match op {
            BinaryOp::Add => match (left, right) {
                (Operand::Integer(l), Operand::Integer(r)) => Ok(Operand::Integer(l.wrapping_add(*r))),
                (Operand::String(l), Operand::String(r)) => Ok(Operand::String(format!("{}{}", l, r))),
                _ => real_op(op, left, right, |l, r| l + r),
            },

            BinaryOp::Sub => match (left, right) {
                (Operand::Integer(l), Operand::Integer(r)) => Ok(Operand::Integer(l.wrapping_sub(*r))),
                _ => real_op(op, left, right, |l, r| l - r),
            },

            BinaryOp::Mul => match (left, right) {
                (Operand::Integer(l), Operand::Integer(r)) => Ok(Operand::Integer(l.wrapping_mul(*r))),
                _ => real_op(op, left, right, |l, r| l * r),
            },

            BinaryOp::Div => match (left, right) {
                (Operand::Integer(l), Operand::Integer(r)) => {
                    if *r == 0 {
                        Err(division_by_zero(left, right))
                    } else {
                        Ok(Operand::Integer(l.wrapping_div(*r)))
                    }
                }
                _ => {
                    let (l, r) = numeric_pair(op, left, right)?;
                    if r == 0.0 {
                        Err(division_by_zero(left, right))
                    } else {
                        Ok(Operand::Real(l / r))
                    }
                }
            },

            BinaryOp::Pow => match (left, right) {
                (Operand::Integer(base), Operand::Integer(exp)) if *exp >= 0 => {
                    Ok(Operand::Integer(integer_pow(*base, *exp)))
                }
                _ => real_op(op, left, right, f64::powf),
            },

            BinaryOp::ShiftLeft | BinaryOp::ShiftRight => match (left, right) {
                (Operand::Integer(value), Operand::Integer(count)) => {
                    // The count wraps modulo 64; `>>` keeps the sign bit
                    let count = *count as u32;
                    Ok(Operand::Integer(if op == BinaryOp::ShiftLeft {
                        value.wrapping_shl(count)
                    } else {
                        value.wrapping_shr(count)
                    }))
                }
                _ => Err(expects(op, "integer")),
            },

            BinaryOp::Eq | BinaryOp::NotEq => {
                let equal = match (left, right) {
                    (Operand::String(l), Operand::String(r)) => l == r,
                    (Operand::Boolean(l), Operand::Boolean(r)) => l == r,
                    (Operand::Function(l), Operand::Function(r)) => l.ptr_eq(r),
                    (Operand::Integer(l), Operand::Integer(r)) => l == r,
                    _ => {
                        let (l, r) = numeric_pair(op, left, right)?;
                        if op == BinaryOp::Eq {
                            return Ok(Operand::Boolean(l == r));
                        }
                        return Ok(Operand::Boolean(l != r));
                    }
                };
                Ok(Operand::Boolean(if op == BinaryOp::Eq { equal } else { !equal }))
            }

            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq | BinaryOp::GtEq => {
                let ordered = match (left, right) {
                    (Operand::Integer(l), Operand::Integer(r)) => compare(op, l, r),
                    (Operand::String(l), Operand::String(r)) => compare(op, l, r),
                    (Operand::Boolean(_), Operand::Boolean(_)) => {
                        return Err(expects(op, "integer, real or string"))
                    }
                    _ => {
                        let (l, r) = numeric_pair(op, left, right)?;
                        compare(op, &l, &r)
                    }
                };
                Ok(Operand::Boolean(ordered))
            }

            BinaryOp::Match => match (left, right) {
                (Operand::String(text), Operand::String(pattern)) => {
                    Ok(Operand::Boolean(self.full_match(text, pattern)?))
                }
                _ => Err(expects(op, "string")),
            },

            BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => match (left, right) {
                (Operand::Boolean(l), Operand::Boolean(r)) => Ok(Operand::Boolean(match op {
                    BinaryOp::And => *l && *r,
                    BinaryOp::Or => *l || *r,
                    _ => l ^ r,
                })),
                (Operand::Integer(l), Operand::Integer(r)) => Ok(Operand::Integer(match op {
                    BinaryOp::And => l & r,
                    BinaryOp::Or => l | r,
                    _ => l ^ r,
                })),
                _ => Err(expects(op, "boolean or integer")),
            },

            BinaryOp::In => membership(left, right),
        }
    }

    /// Applies a unary operator; lists are mapped element-wise
    pub fn apply_unary(&mut self, op: UnaryOp, operand: &Operand) -> Result<Operand> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.apply_unary_inner(op, operand)
        })
    }

    fn apply_unary_inner(&mut self, op: UnaryOp, operand: &Operand) -> Result<Operand> {
        match (op, operand) {
            (_, Operand::List(items)) => {
                let mapped = items
                    .iter()
                    .map(|item| self.apply_unary(op, item))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Operand::list(mapped))
            }
            (UnaryOp::Neg, Operand::Integer(n)) => Ok(Operand::Integer(n.wrapping_neg())),
            (UnaryOp::Neg, Operand::Real(x)) => Ok(Operand::Real(-x)),
            (UnaryOp::Neg, _) => Err(Error::type_mismatch(
                "'-' expects values of type integer or real",
            )),
            (UnaryOp::Not, Operand::Boolean(b)) => Ok(Operand::Boolean(!b)),
            (UnaryOp::Not, Operand::Integer(n)) => Ok(Operand::Integer(!n)),
            (UnaryOp::Not, _) => Err(Error::type_mismatch(
                "'not' expects values of type boolean or integer",
            )),
        }
    }
}

fn membership(needle: &Operand, haystack: &Operand) -> Result<Operand> {
    match (needle, haystack) {
        (item, Operand::List(items)) => Ok(Operand::Boolean(items.contains(item))),
        (Operand::String(sub), Operand::String(s)) => Ok(Operand::Boolean(s.contains(sub.as_str()))),
        _ => Err(expects(BinaryOp::In, "list or string")),
    }
}

fn numeric_pair(op: BinaryOp, left: &Operand, right: &Operand) -> Result<(f64, f64)> {
    match (left, right) {
        (Operand::Integer(_) | Operand::Real(_), Operand::Integer(_) | Operand::Real(_)) => {
            Ok((left.as_real()?, right.as_real()?))
        }
        _ => Err(expects(op, "integer or real")),
    }
}

fn real_op(op: BinaryOp, left: &Operand, right: &Operand, f: impl Fn(f64, f64) -> f64) -> Result<Operand> {
    let (l, r) = numeric_pair(op, left, right)?;
    Ok(Operand::Real(f(l, r)))
}

fn compare<T: PartialOrd + ?Sized>(op: BinaryOp, l: &T, r: &T) -> bool {
    match op {
        BinaryOp::Lt => l < r,
        BinaryOp::Gt => l > r,
        BinaryOp::LtEq => l <= r,
        _ => l >= r,
    }
}

/// Exponentiation by squaring with wrapping overflow
fn integer_pow(mut base: i64, mut exp: i64) -> i64 {
    let mut result: i64 = 1;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result.wrapping_mul(base);
        }
        base = base.wrapping_mul(base);
        exp >>= 1;
    }
    result
}

fn division_by_zero(left: &Operand, right: &Operand) -> Error {
    Error::DivisionByZero {
        expression: format!("{}/{}", left, right),
    }
}

fn expects(op: BinaryOp, types: &str) -> Error {
    Error::type_mismatch(format!("'{}' expects values of type {}", op, types))
}
