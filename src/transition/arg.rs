//! Transition arguments.

use crate::core::Value;
use crate::error::Error;
use crate::microstate::Microstate;
use std::fmt;
use std::sync::Arc;

/// Callback over an element microstate, used by container `map`/`filter`.
pub type CallbackFn = Arc<dyn Fn(&Microstate) -> Result<Arg, Error> + Send + Sync>;

/// One argument passed to a transition.
#[derive(Clone)]
pub enum Arg {
    Value(Value),
    /// A microstate. `set` grafts it in place, taking on its type.
    Microstate(Microstate),
    Callback(CallbackFn),
}

impl Arg {
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&Microstate) -> Result<Arg, Error> + Send + Sync + 'static,
    {
        Arg::Callback(Arc::new(f))
    }

    /// The plain value carried by this argument. Microstates contribute their
    /// raw value; callbacks have none.
    pub fn value(&self) -> Value {
        match self {
            Arg::Value(value) => value.clone(),
            Arg::Microstate(ms) => ms.value_of(),
            Arg::Callback(_) => Value::Null,
        }
    }

    pub fn as_microstate(&self) -> Option<&Microstate> {
        match self {
            Arg::Microstate(ms) => Some(ms),
            _ => None,
        }
    }

    pub fn as_callback(&self) -> Option<&CallbackFn> {
        match self {
            Arg::Callback(f) => Some(f),
            _ => None,
        }
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Value(value) => write!(f, "{value:?}"),
            Arg::Microstate(ms) => write!(f, "{ms:?}"),
            Arg::Callback(_) => f.write_str("<callback>"),
        }
    }
}

impl From<Microstate> for Arg {
    fn from(ms: Microstate) -> Self {
        Arg::Microstate(ms)
    }
}

impl From<&Microstate> for Arg {
    fn from(ms: &Microstate) -> Self {
        Arg::Microstate(ms.clone())
    }
}

macro_rules! arg_from_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Arg {
                fn from(value: $t) -> Self {
                    Arg::Value(Value::from(value))
                }
            }
        )*
    };
}

arg_from_value!(Value, serde_json::Value, bool, f64, i32, i64, u32, usize, &str, String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_conversions_wrap_values() {
        assert_eq!(Arg::from(3).value(), Value::Number(3.0));
        assert_eq!(Arg::from("x").value(), Value::from("x"));
        assert_eq!(Arg::from(true).value(), Value::Bool(true));
    }

    #[test]
    fn callbacks_have_no_value() {
        let arg = Arg::callback(|_| Ok(Arg::from(true)));
        assert!(arg.as_callback().is_some());
        assert_eq!(arg.value(), Value::Null);
    }
}
