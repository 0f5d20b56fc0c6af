use super::{op, set, unexpected};
use crate::core::Value;
use crate::error::Error;
use crate::microstate::Microstate;
use crate::schema::{Kind, Primitive, TypeDecl};
use crate::transition::{Arg, Outcome};

pub(super) fn decl() -> TypeDecl {
    TypeDecl::builtin("Boolean", Kind::Primitive(Primitive::Boolean))
        .with_operation("set", op(set))
        .with_operation("toggle", op(toggle))
}

fn toggle(ms: &Microstate, _args: &[Arg]) -> Result<Outcome, Error> {
    match ms.value_of() {
        Value::Null => Ok(Outcome::Value(Value::Bool(true))),
        Value::Bool(b) => Ok(Outcome::Value(Value::Bool(!b))),
        other => Err(unexpected("toggle", "a boolean", &other)),
    }
}
