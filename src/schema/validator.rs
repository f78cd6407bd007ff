//! Instance validation and construction
//!
//! Validation semantics:
//! - defaults are injected before any check
//! - every required slot is present
//! - multivalued slots hold sequences, single-valued slots at most one value
//! - primitive values match their range exactly (integers widen to float)
//! - numeric values lie within inclusive bounds
//! - nested class-ranged values are validated recursively (see `polymorphic`)
//! - undeclared slots are rejected in strict mode, dropped in lenient mode
//!
//! Validation never stops at the first problem. Every violation in the
//! document is collected, and an `Instance` is only built when none was found.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::defaults::apply_defaults;
use super::errors::{SchemaError, SchemaResult};
use super::instance::{Instance, SlotValue};
use super::model::SchemaModel;
use super::polymorphic;
use super::types::{ClassId, Literal, PrimitiveKind, Range, SlotSpec};

/// Path reported for problems with the document itself
pub const ROOT_PATH: &str = "$root";

/// Options recognized by the validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Reject undeclared input slots instead of dropping them
    pub strict_unknown_slots: bool,
    /// Key naming the concrete class of a nested object
    pub type_designator: String,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            strict_unknown_slots: true,
            type_designator: "@type".to_string(),
        }
    }
}

impl ValidatorConfig {
    /// Config that silently drops undeclared slots
    pub fn lenient() -> Self {
        Self {
            strict_unknown_slots: false,
            ..Self::default()
        }
    }
}

/// A single constraint an input document failed
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    #[error("slot '{path}' is required")]
    MissingRequiredSlot { path: String },

    #[error("slot '{path}': expected {expected}, got {actual}")]
    CardinalityViolation {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("slot '{path}': {value} is outside [{lo}, {hi}]", lo = bound(.min), hi = bound(.max))]
    RangeViolation {
        path: String,
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
    },

    #[error("slot '{path}': expected {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("slot '{path}' is not declared")]
    UnknownSlot { path: String },

    #[error("slot '{path}': '{value}' does not match '{pattern}'")]
    PatternMismatch {
        path: String,
        pattern: String,
        value: String,
    },

    #[error("slot '{path}': '{value}' is not a value of enum '{enum_name}'")]
    EnumViolation {
        path: String,
        enum_name: String,
        value: String,
    },

    #[error("slot '{path}': class '{class_name}' is abstract")]
    AbstractClass { path: String, class_name: String },
}

fn bound(limit: &Option<f64>) -> String {
    limit.map_or_else(|| "unbounded".to_string(), |v| v.to_string())
}

impl Violation {
    /// Stable code of the violation kind
    pub fn code(&self) -> &'static str {
        match self {
            Violation::MissingRequiredSlot { .. } => "MM_MISSING_REQUIRED_SLOT",
            Violation::CardinalityViolation { .. } => "MM_CARDINALITY_VIOLATION",
            Violation::RangeViolation { .. } => "MM_RANGE_VIOLATION",
            Violation::TypeMismatch { .. } => "MM_TYPE_MISMATCH",
            Violation::UnknownSlot { .. } => "MM_UNKNOWN_SLOT",
            Violation::PatternMismatch { .. } => "MM_PATTERN_MISMATCH",
            Violation::EnumViolation { .. } => "MM_ENUM_VIOLATION",
            Violation::AbstractClass { .. } => "MM_ABSTRACT_CLASS",
        }
    }

    /// Path of the offending slot, e.g. `shapes[1].y2`
    pub fn path(&self) -> &str {
        match self {
            Violation::MissingRequiredSlot { path }
            | Violation::CardinalityViolation { path, .. }
            | Violation::RangeViolation { path, .. }
            | Violation::TypeMismatch { path, .. }
            | Violation::UnknownSlot { path }
            | Violation::PatternMismatch { path, .. }
            | Violation::EnumViolation { path, .. }
            | Violation::AbstractClass { path, .. } => path,
        }
    }
}

/// Every violation found in one document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ViolationList(Vec<Violation>);

impl ViolationList {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Violation] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Violation> {
        self.0
    }
}

impl From<Vec<Violation>> for ViolationList {
    fn from(violations: Vec<Violation>) -> Self {
        Self(violations)
    }
}

impl IntoIterator for ViolationList {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ViolationList {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ViolationList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", violation)?;
        }
        Ok(())
    }
}

/// Outcome of validating one document
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    class_name: String,
    violations: ViolationList,
    instance: Option<Instance>,
}

impl ValidationResult {
    /// Class the document was validated against
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        self.violations.as_slice()
    }

    /// The constructed instance, present only when the document is valid
    pub fn instance(&self) -> Option<&Instance> {
        self.instance.as_ref()
    }

    /// Converts into the constructed instance or the violations
    pub fn into_instance(self) -> Result<Instance, ViolationList> {
        match self.instance {
            Some(instance) if self.violations.is_empty() => Ok(instance),
            _ => Err(self.violations),
        }
    }
}

/// Failure of `construct`
#[derive(Debug, Error)]
pub enum ConstructError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("invalid instance: {0}")]
    Invalid(ViolationList),
}

/// Validates documents against one loaded schema.
///
/// Stateless apart from its borrowed inputs; one validator may serve any
/// number of threads.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    model: &'a SchemaModel,
    config: &'a ValidatorConfig,
}

impl<'a> Validator<'a> {
    pub fn new(model: &'a SchemaModel, config: &'a ValidatorConfig) -> Self {
        Self { model, config }
    }

    pub(crate) fn model(&self) -> &'a SchemaModel {
        self.model
    }

    pub(crate) fn config(&self) -> &'a ValidatorConfig {
        self.config
    }

    /// Validates a document against a class.
    ///
    /// # Errors
    ///
    /// Returns `UnknownClass` if the schema has no such class. Problems with the
    /// document itself are reported in the result, never as an error.
    pub fn validate(&self, data: &Value, class_name: &str) -> SchemaResult<ValidationResult> {
        let class_id = self
            .model
            .class_id(class_name)
            .ok_or_else(|| SchemaError::unknown_class(class_name))?;

        let mut violations = Vec::new();
        let instance = polymorphic::resolve_class_value(self, data, class_id, "", &mut violations);

        Ok(ValidationResult {
            class_name: class_name.to_string(),
            instance: if violations.is_empty() { instance } else { None },
            violations: violations.into(),
        })
    }

    /// Validates a document and returns the constructed instance.
    pub fn construct(&self, data: &Value, class_name: &str) -> Result<Instance, ConstructError> {
        self.validate(data, class_name)?
            .into_instance()
            .map_err(ConstructError::Invalid)
    }

    /// Checks an object against the induced view of a concrete class.
    ///
    /// Returns the instance only if no violation was added.
    pub(crate) fn check_object(
        &self,
        data: &Value,
        class_id: ClassId,
        path: &str,
        violations: &mut Vec<Violation>,
    ) -> Option<Instance> {
        let class = self.model.class_at(class_id);
        let Some(object) = data.as_object() else {
            violations.push(Violation::TypeMismatch {
                path: display_path(path),
                expected: class.name.clone(),
                actual: json_type_name(data).to_string(),
            });
            return None;
        };

        if class.is_abstract {
            violations.push(Violation::AbstractClass {
                path: display_path(path),
                class_name: class.name.clone(),
            });
            return None;
        }

        let start = violations.len();
        let view = self.model.induced_view_by_id(class_id);
        let filled = apply_defaults(object, &view);

        if self.config.strict_unknown_slots {
            for key in filled.keys() {
                if key != &self.config.type_designator && !view.contains(key) {
                    violations.push(Violation::UnknownSlot {
                        path: make_path(path, key),
                    });
                }
            }
        }

        let mut instance = Instance::new(class.name.clone());
        for (name, slot) in view.iter() {
            let slot_path = make_path(path, name);
            match filled.get(name).filter(|value| !value.is_null()) {
                Some(value) => {
                    if let Some(checked) = self.check_slot(value, &slot.spec, &slot_path, violations) {
                        instance.insert(name, checked);
                    }
                }
                None if slot.spec.required => {
                    violations.push(Violation::MissingRequiredSlot { path: slot_path });
                }
                None => {}
            }
        }

        (violations.len() == start).then_some(instance)
    }

    fn check_slot(
        &self,
        value: &Value,
        spec: &SlotSpec,
        path: &str,
        violations: &mut Vec<Violation>,
    ) -> Option<SlotValue> {
        if spec.multivalued {
            return self.check_sequence(value, spec, path, violations);
        }

        match value.as_array().map(Vec::as_slice) {
            Some([]) => {
                if spec.required {
                    violations.push(Violation::MissingRequiredSlot {
                        path: path.to_string(),
                    });
                }
                None
            }
            Some([single]) => self.check_single(single, spec, path, violations),
            Some(items) => {
                violations.push(Violation::CardinalityViolation {
                    path: path.to_string(),
                    expected: "at most one value".to_string(),
                    actual: format!("{} values", items.len()),
                });
                None
            }
            None => self.check_single(value, spec, path, violations),
        }
    }

    fn check_sequence(
        &self,
        value: &Value,
        spec: &SlotSpec,
        path: &str,
        violations: &mut Vec<Violation>,
    ) -> Option<SlotValue> {
        let Some(items) = value.as_array() else {
            violations.push(Violation::CardinalityViolation {
                path: path.to_string(),
                expected: "a sequence of values".to_string(),
                actual: format!("a single {}", json_type_name(value)),
            });
            return None;
        };

        let start = violations.len();
        if let Some(min) = spec.minimum_cardinality.filter(|min| items.len() < *min) {
            violations.push(Violation::CardinalityViolation {
                path: path.to_string(),
                expected: format!("at least {} values", min),
                actual: format!("{} values", items.len()),
            });
        }
        if let Some(max) = spec.maximum_cardinality.filter(|max| items.len() > *max) {
            violations.push(Violation::CardinalityViolation {
                path: path.to_string(),
                expected: format!("at most {} values", max),
                actual: format!("{} values", items.len()),
            });
        }

        let mut checked = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let item_path = format!("{}[{}]", path, index);
            if item.is_null() {
                violations.push(Violation::TypeMismatch {
                    path: item_path,
                    expected: spec.range.name().to_string(),
                    actual: "null".to_string(),
                });
                continue;
            }
            if let Some(value) = self.check_single(item, spec, &item_path, violations) {
                checked.push(value);
            }
        }

        (violations.len() == start).then_some(SlotValue::List(checked))
    }

    fn check_single(
        &self,
        value: &Value,
        spec: &SlotSpec,
        path: &str,
        violations: &mut Vec<Violation>,
    ) -> Option<SlotValue> {
        match &spec.range {
            Range::Class { id, .. } => {
                polymorphic::resolve_class_value(self, value, *id, path, violations)
                    .map(|instance| SlotValue::Instance(Box::new(instance)))
            }
            Range::Enum { name } => {
                let Some(text) = value.as_str() else {
                    violations.push(type_mismatch(path, name, value));
                    return None;
                };
                let permitted = self.model.enum_def(name).map_or(false, |def| def.permits(text));
                if !permitted {
                    violations.push(Violation::EnumViolation {
                        path: path.to_string(),
                        enum_name: name.clone(),
                        value: text.to_string(),
                    });
                    return None;
                }
                Some(SlotValue::Literal(Literal::String(text.to_string())))
            }
            Range::Type { name, kind } => {
                let Some(literal) = primitive_literal(value, *kind) else {
                    violations.push(type_mismatch(path, name, value));
                    return None;
                };
                if let Some(number) = literal.as_f64() {
                    if !spec.within_bounds(number) {
                        violations.push(Violation::RangeViolation {
                            path: path.to_string(),
                            value: number,
                            min: spec.minimum_value,
                            max: spec.maximum_value,
                        });
                        return None;
                    }
                }
                if let (Some(pattern), Literal::String(text)) = (&spec.pattern, &literal) {
                    if !pattern.is_match(text) {
                        violations.push(Violation::PatternMismatch {
                            path: path.to_string(),
                            pattern: pattern.as_str().to_string(),
                            value: text.clone(),
                        });
                        return None;
                    }
                }
                Some(SlotValue::Literal(literal))
            }
        }
    }
}

/// Reads a JSON value as a literal of the given kind, without coercion
/// beyond integer-to-float widening.
fn primitive_literal(value: &Value, kind: PrimitiveKind) -> Option<Literal> {
    match kind {
        PrimitiveKind::Integer => value.as_i64().map(Literal::Integer),
        PrimitiveKind::Float => value.as_f64().map(Literal::Float),
        PrimitiveKind::String => value.as_str().map(|s| Literal::String(s.to_string())),
        PrimitiveKind::Boolean => value.as_bool().map(Literal::Boolean),
    }
}

fn type_mismatch(path: &str, expected: &str, actual: &Value) -> Violation {
    Violation::TypeMismatch {
        path: path.to_string(),
        expected: expected.to_string(),
        actual: json_type_name(actual).to_string(),
    }
}

/// Returns the JSON type name for violation messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "integer"
            } else {
                "float"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Creates a slot path from prefix and slot name.
pub(crate) fn make_path(prefix: &str, slot: &str) -> String {
    if prefix.is_empty() {
        slot.to_string()
    } else {
        format!("{}.{}", prefix, slot)
    }
}

/// Path used when the object itself is at fault.
pub(crate) fn display_path(path: &str) -> String {
    if path.is_empty() {
        ROOT_PATH.to_string()
    } else {
        path.to_string()
    }
}
