//! Polymorphic range resolution
//!
//! A class-ranged slot accepts the range class or any of its descendants.
//! The concrete class of a nested object is named by the type designator key;
//! without one the declared range class is used. The set of admissible
//! classes is closed at load, so resolution is a lookup in the range's
//! descendant set and never a search.

use serde_json::Value;

use super::instance::Instance;
use super::model::SchemaModel;
use super::types::ClassId;
use super::validator::{display_path, json_type_name, make_path, Validator, Violation};

/// Decides which concrete class a nested object is validated as.
///
/// Adds a violation and returns `None` if the designator is malformed,
/// names an unknown class, or names a class outside the range's hierarchy.
/// Returns `None` without a violation if `range` was not issued by `model`.
pub fn resolve_concrete_class(
    model: &SchemaModel,
    designator: &str,
    data: &Value,
    range: ClassId,
    path: &str,
    violations: &mut Vec<Violation>,
) -> Option<ClassId> {
    let range_name = &model.class_by_id(range)?.name;

    let Some(object) = data.as_object() else {
        violations.push(Violation::TypeMismatch {
            path: display_path(path),
            expected: range_name.clone(),
            actual: json_type_name(data).to_string(),
        });
        return None;
    };

    match object.get(designator) {
        None | Some(Value::Null) => Some(range),
        Some(Value::String(name)) => match model.class_id(name) {
            Some(id) if model.descendants(range).contains(&id) => Some(id),
            _ => {
                violations.push(Violation::TypeMismatch {
                    path: display_path(path),
                    expected: range_name.clone(),
                    actual: name.clone(),
                });
                None
            }
        },
        Some(other) => {
            violations.push(Violation::TypeMismatch {
                path: make_path(path, designator),
                expected: "a class name".to_string(),
                actual: json_type_name(other).to_string(),
            });
            None
        }
    }
}

/// Resolves the concrete class of a nested value and validates it recursively.
pub(crate) fn resolve_class_value(
    validator: &Validator<'_>,
    data: &Value,
    range: ClassId,
    path: &str,
    violations: &mut Vec<Violation>,
) -> Option<Instance> {
    let model = validator.model();
    let designator = validator.config().type_designator.as_str();
    let concrete = resolve_concrete_class(model, designator, data, range, path, violations)?;
    validator.check_object(data, concrete, path, violations)
}

/// Names of the concrete classes a value ranged on `range` may take
pub fn admissible_classes(model: &SchemaModel, range: ClassId) -> Vec<&str> {
    model
        .concrete_descendants(range)
        .map(|class| class.name.as_str())
        .collect()
}
