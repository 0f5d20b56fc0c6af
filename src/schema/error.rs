//! Schema errors.

use thiserror::Error;

/// Problems with a type declaration or a lookup against the schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error(
        "You can not use 'state' as transition name because it'll conflict with state property on the microstate."
    )]
    ReservedTransitionName { type_name: String },

    #[error("unknown type '{name}'")]
    UnknownType { name: String },

    #[error("type {type_name} has no transition named '{transition}'")]
    UnknownTransition {
        type_name: String,
        transition: String,
    },

    #[error("field '{field}' is declared more than once on type {type_name}")]
    DuplicateField { type_name: String, field: String },

    #[error("transition '{transition}' is declared more than once on type {type_name}")]
    DuplicateTransition {
        type_name: String,
        transition: String,
    },

    #[error("type '{name}' is registered more than once")]
    DuplicateType { name: String },

    #[error("type {type_name} inherits from itself ({chain})")]
    CyclicInheritance { type_name: String, chain: String },

    /// More than one problem with the same declaration.
    #[error(
        "type {type_name} has {} schema violations: {}",
        .violations.len(),
        render(.violations)
    )]
    Violations {
        type_name: String,
        violations: Vec<SchemaError>,
    },
}

fn render(violations: &[SchemaError]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violations_render_every_entry() {
        let err = SchemaError::Violations {
            type_name: "Todo".into(),
            violations: vec![
                SchemaError::UnknownType { name: "Tag".into() },
                SchemaError::DuplicateField {
                    type_name: "Todo".into(),
                    field: "text".into(),
                },
            ],
        };

        assert_eq!(
            err.to_string(),
            "type Todo has 2 schema violations: unknown type 'Tag'; field 'text' is declared more than once on type Todo"
        );
    }
}
