//! Declaration checks, accumulated with `Validation` so that every problem
//! with a declaration is reported at once.

use crate::schema::{FieldDecl, Registry, SchemaError, TypeDecl};
use std::collections::HashSet;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Result type of a single check.
pub type Check = Validation<(), NonEmptyVec<SchemaError>>;

/// Transition name that would shadow a microstate's `state`.
pub const RESERVED_TRANSITION: &str = "state";

/// Check every declaration of an inheritance chain.
pub fn validate_chain(chain: &[&TypeDecl], registry: &Registry) -> Check {
    let checks: Vec<Check> = chain
        .iter()
        .map(|decl| validate_decl(decl, registry))
        .collect();
    Validation::all_vec(checks).map(|_| ())
}

/// Check one declaration.
pub fn validate_decl(decl: &TypeDecl, registry: &Registry) -> Check {
    let mut checks: Vec<Check> = Vec::new();

    for (name, _) in &decl.operations {
        checks.push(if name == RESERVED_TRANSITION {
            Validation::fail(SchemaError::ReservedTransitionName {
                type_name: decl.name.to_string(),
            })
        } else {
            Validation::success(())
        });
    }

    let mut seen = HashSet::new();
    for (name, _) in &decl.operations {
        if !seen.insert(name.as_str()) {
            checks.push(Validation::fail(SchemaError::DuplicateTransition {
                type_name: decl.name.to_string(),
                transition: name.clone(),
            }));
        }
    }

    let mut seen = HashSet::new();
    for (name, field) in &decl.fields {
        if !seen.insert(name.as_str()) {
            checks.push(Validation::fail(SchemaError::DuplicateField {
                type_name: decl.name.to_string(),
                field: name.clone(),
            }));
        }
        if let FieldDecl::Typed(ty) = field {
            for missing in ty.names().into_iter().filter(|n| !registry.contains(n)) {
                checks.push(Validation::fail(SchemaError::UnknownType {
                    name: missing.to_string(),
                }));
            }
        }
    }

    Validation::all_vec(checks).map(|_| ())
}

/// Collapse a failed check into one error: a lone violation is reported as
/// itself, several as [`SchemaError::Violations`].
pub fn into_result(type_name: &str, check: Check) -> Result<(), SchemaError> {
    match check {
        Validation::Success(_) => Ok(()),
        Validation::Failure(errors) => {
            let mut violations: Vec<SchemaError> = errors.iter().cloned().collect();
            tracing::debug!(
                type_name,
                violations = violations.len(),
                "type declaration rejected"
            );
            if violations.len() == 1 {
                Err(violations.remove(0))
            } else {
                Err(SchemaError::Violations {
                    type_name: type_name.to_string(),
                    violations,
                })
            }
        }
    }
}
