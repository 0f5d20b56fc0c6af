use super::{op, set, unexpected};
use crate::core::Value;
use crate::error::Error;
use crate::microstate::Microstate;
use crate::schema::{Kind, Primitive, TypeDecl};
use crate::transition::{Arg, Outcome};

pub(super) fn decl() -> TypeDecl {
    TypeDecl::builtin("Number", Kind::Primitive(Primitive::Number))
        .with_operation("set", op(set))
        .with_operation("increment", op(|ms, args| step("increment", ms, args, 1.0)))
        .with_operation("decrement", op(|ms, args| step("decrement", ms, args, -1.0)))
        .with_operation("sum", op(|ms, args| fold("sum", ms, args, |a, b| a + b)))
        .with_operation("subtract", op(|ms, args| fold("subtract", ms, args, |a, b| a - b)))
        .with_operation("multiply", op(|ms, args| fold("multiply", ms, args, |a, b| a * b)))
}

/// Absent reads as zero.
fn current(transition: &str, ms: &Microstate) -> Result<f64, Error> {
    match ms.value_of() {
        Value::Null => Ok(0.0),
        Value::Number(n) => Ok(n),
        other => Err(unexpected(transition, "a number", &other)),
    }
}

fn operand(transition: &str, arg: &Arg) -> Result<f64, Error> {
    let value = arg.value();
    value
        .as_f64()
        .ok_or_else(|| unexpected(transition, "a number argument", &value))
}

/// Add `sign` times the optional amount (default 1).
fn step(transition: &str, ms: &Microstate, args: &[Arg], sign: f64) -> Result<Outcome, Error> {
    let by = match args.first() {
        Some(arg) => operand(transition, arg)?,
        None => 1.0,
    };
    Ok(Outcome::Value(Value::Number(current(transition, ms)? + sign * by)))
}

fn fold(
    transition: &str,
    ms: &Microstate,
    args: &[Arg],
    f: impl Fn(f64, f64) -> f64,
) -> Result<Outcome, Error> {
    let mut acc = current(transition, ms)?;
    for arg in args {
        acc = f(acc, operand(transition, arg)?);
    }
    Ok(Outcome::Value(Value::Number(acc)))
}
