//! Raw schema definitions as produced by an external reader
//!
//! This is the intermediate structure the loader accepts. It mirrors the
//! declarative source one-to-one and carries no resolved references: ranges,
//! parents and shared-slot references are plain names until `loader` resolves
//! them.

use serde::{Deserialize, Serialize};

/// A complete raw schema document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSchema {
    /// Schema URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Schema name
    pub name: String,
    /// Schema version string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Named types in addition to the builtin primitives
    #[serde(default)]
    pub types: Vec<RawType>,
    #[serde(default)]
    pub enums: Vec<RawEnum>,
    /// Shared slots that classes reference by name
    #[serde(default)]
    pub slots: Vec<RawSlot>,
    #[serde(default)]
    pub classes: Vec<RawClass>,
}

/// A named type derived from a primitive (`typeof`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawType {
    pub name: String,
    /// Base type name; a builtin primitive or a previously declared type
    #[serde(rename = "typeof")]
    pub type_of: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// An enumeration of permissible string values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEnum {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub permissible_values: Vec<String>,
}

/// A slot declaration, either shared or inline in a class
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSlot {
    pub name: String,
    /// Range name; defaults to `string` when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub multivalued: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_value: Option<f64>,
    /// Default expression applied when the slot is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ifabsent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_cardinality: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_cardinality: Option<usize>,
    /// Marks this declaration as replacing an ancestor's slot of the same name
    #[serde(default, rename = "override")]
    pub overrides: bool,
}

/// A class declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawClass {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Single parent class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_a: Option<String>,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    /// References to shared slots
    #[serde(default)]
    pub slots: Vec<String>,
    /// Inline slot declarations
    #[serde(default)]
    pub attributes: Vec<RawSlot>,
}

impl RawSchema {
    /// Parse a raw schema from its JSON form
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }
}

impl RawSlot {
    /// Create a slot with the given name and range and no constraints
    pub fn new(name: impl Into<String>, range: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            range: Some(range.into()),
            ..Default::default()
        }
    }

    /// Mark the slot required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark the slot multivalued
    pub fn multivalued(mut self) -> Self {
        self.multivalued = true;
        self
    }

    /// Set inclusive numeric bounds
    pub fn bounded(mut self, min: f64, max: f64) -> Self {
        self.minimum_value = Some(min);
        self.maximum_value = Some(max);
        self
    }

    /// Set the default expression
    pub fn ifabsent(mut self, expr: impl Into<String>) -> Self {
        self.ifabsent = Some(expr.into());
        self
    }

    /// Mark the slot as an override of an inherited slot
    pub fn overriding(mut self) -> Self {
        self.overrides = true;
        self
    }
}

impl RawClass {
    /// Create an empty root class
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the parent class
    pub fn is_a(mut self, parent: impl Into<String>) -> Self {
        self.is_a = Some(parent.into());
        self
    }

    /// Mark the class abstract
    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Add an inline slot declaration
    pub fn attribute(mut self, slot: RawSlot) -> Self {
        self.attributes.push(slot);
        self
    }

    /// Add a shared slot reference
    pub fn uses_slot(mut self, name: impl Into<String>) -> Self {
        self.slots.push(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_schema() {
        let raw = RawSchema::from_json(r#"{"name": "empty"}"#).unwrap();
        assert_eq!(raw.name, "empty");
        assert!(raw.classes.is_empty());
        assert!(raw.types.is_empty());
    }

    #[test]
    fn test_parse_keyword_fields() {
        let raw = RawSchema::from_json(
            r#"{
                "name": "s",
                "types": [{"name": "Count", "typeof": "integer"}],
                "classes": [{
                    "name": "Child",
                    "is_a": "Parent",
                    "abstract": true,
                    "attributes": [{"name": "a", "range": "Count", "override": true}]
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(raw.types[0].type_of, "integer");
        let class = &raw.classes[0];
        assert_eq!(class.is_a.as_deref(), Some("Parent"));
        assert!(class.is_abstract);
        assert!(class.attributes[0].overrides);
        assert!(!class.attributes[0].required);
    }

    #[test]
    fn test_builders_match_parsed_form() {
        let built = RawClass::new("Color")
            .attribute(RawSlot::new("r", "integer").required().bounded(0.0, 255.0).ifabsent("int(128)"));

        let parsed: RawClass = serde_json::from_str(
            r#"{"name": "Color", "attributes": [{
                "name": "r", "range": "integer", "required": true,
                "minimum_value": 0, "maximum_value": 255, "ifabsent": "int(128)"
            }]}"#,
        )
        .unwrap();

        assert_eq!(built, parsed);
    }
}
