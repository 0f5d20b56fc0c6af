use super::{op, set, unexpected};
use crate::core::Value;
use crate::error::Error;
use crate::microstate::Microstate;
use crate::schema::{Kind, Primitive, TypeDecl};
use crate::transition::{Arg, Outcome};

pub(super) fn decl() -> TypeDecl {
    TypeDecl::builtin("String", Kind::Primitive(Primitive::String))
        .with_operation("set", op(set))
        .with_operation("concat", op(concat))
}

fn concat(ms: &Microstate, args: &[Arg]) -> Result<Outcome, Error> {
    let mut out = match ms.value_of() {
        Value::Null => String::new(),
        Value::String(s) => s.to_string(),
        other => return Err(unexpected("concat", "a string", &other)),
    };
    for arg in args {
        match arg.value() {
            Value::String(s) => out.push_str(&s),
            Value::Number(n) => out.push_str(&Value::Number(n).to_string()),
            other => return Err(unexpected("concat", "a string argument", &other)),
        }
    }
    Ok(Outcome::Value(Value::from(out)))
}
