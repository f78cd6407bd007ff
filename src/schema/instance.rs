//! Constructed instances
//!
//! An `Instance` only exists once every constraint of its class held, so code
//! holding one can read its slots without re-checking them.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::types::Literal;

/// The value held by one slot of an instance
#[derive(Debug, Clone, PartialEq)]
pub enum SlotValue {
    /// A primitive or enum value
    Literal(Literal),
    /// A nested instance of the range class or a descendant
    Instance(Box<Instance>),
    /// Values of a multivalued slot, in input order
    List(Vec<SlotValue>),
}

impl SlotValue {
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            SlotValue::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.as_literal()? {
            Literal::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value; integers widen to float
    pub fn as_f64(&self) -> Option<f64> {
        self.as_literal()?.as_f64()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.as_literal()? {
            Literal::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.as_literal()? {
            Literal::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            SlotValue::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SlotValue]> {
        match self {
            SlotValue::List(values) => Some(values),
            _ => None,
        }
    }

    /// Converts the value to JSON, tagging nested instances with `designator`
    pub fn to_json(&self, designator: &str) -> Value {
        match self {
            SlotValue::Literal(literal) => literal.to_json(),
            SlotValue::Instance(instance) => instance.to_json(designator),
            SlotValue::List(values) => {
                Value::Array(values.iter().map(|v| v.to_json(designator)).collect())
            }
        }
    }
}

/// A validated instance of a class
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    class_name: String,
    slots: BTreeMap<String, SlotValue>,
}

impl Instance {
    pub(crate) fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            slots: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, slot_name: impl Into<String>, value: SlotValue) {
        self.slots.insert(slot_name.into(), value);
    }

    /// The concrete class of the instance
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Value of a slot, if present
    pub fn get(&self, slot_name: &str) -> Option<&SlotValue> {
        self.slots.get(slot_name)
    }

    /// Whether the slot holds a value
    pub fn has(&self, slot_name: &str) -> bool {
        self.slots.contains_key(slot_name)
    }

    /// Present slots in name order
    pub fn slots(&self) -> impl Iterator<Item = (&str, &SlotValue)> {
        self.slots.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of present slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Converts the instance to a JSON object carrying its class under `designator`
    pub fn to_json(&self, designator: &str) -> Value {
        let mut object = Map::new();
        object.insert(designator.to_string(), Value::from(self.class_name.as_str()));
        for (name, value) in &self.slots {
            object.insert(name.clone(), value.to_json(designator));
        }
        Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn point(x: f64, y: f64) -> Instance {
        let mut instance = Instance::new("Point");
        instance.insert("x", SlotValue::Literal(Literal::Float(x)));
        instance.insert("y", SlotValue::Literal(Literal::Float(y)));
        instance
    }

    #[test]
    fn test_accessors() {
        let value = SlotValue::Literal(Literal::Integer(128));
        assert_eq!(value.as_i64(), Some(128));
        assert_eq!(value.as_f64(), Some(128.0));
        assert_eq!(value.as_str(), None);
        assert!(value.as_instance().is_none());
    }

    #[test]
    fn test_nested_json_is_tagged() {
        let mut roi = Instance::new("ROI");
        roi.insert(
            "shapes",
            SlotValue::List(vec![SlotValue::Instance(Box::new(point(1.0, 2.0)))]),
        );

        let value = roi.to_json("@type");
        assert_eq!(
            value,
            json!({
                "@type": "ROI",
                "shapes": [{"@type": "Point", "x": 1.0, "y": 2.0}]
            })
        );
    }

    #[test]
    fn test_slot_iteration_is_ordered() {
        let instance = point(0.0, 0.0);
        let names: Vec<&str> = instance.slots().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["x", "y"]);
        assert_eq!(instance.len(), 2);
        assert!(instance.has("x"));
        assert!(!instance.has("z"));
    }
}
