//! Resolved schema definitions
//!
//! Builtin primitives:
//! - string: UTF-8 string
//! - integer: 64-bit signed integer
//! - float: 64-bit floating point
//! - boolean: Boolean
//!
//! Everything here is produced by the loader and immutable afterwards.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use serde_json::Value;

/// The primitive kinds every type reduces to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    /// UTF-8 string
    String,
    /// 64-bit signed integer
    Integer,
    /// 64-bit floating point
    Float,
    /// Boolean
    Boolean,
}

impl PrimitiveKind {
    /// All builtin primitives, in registration order
    pub const ALL: [PrimitiveKind; 4] = [
        PrimitiveKind::String,
        PrimitiveKind::Integer,
        PrimitiveKind::Float,
        PrimitiveKind::Boolean,
    ];

    /// Returns the builtin type name
    pub fn type_name(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Integer => "integer",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Boolean => "boolean",
        }
    }

    /// Looks up a builtin by name
    pub fn from_builtin(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.type_name() == name)
    }

    /// Whether numeric bounds apply to values of this kind
    pub fn is_numeric(&self) -> bool {
        matches!(self, PrimitiveKind::Integer | PrimitiveKind::Float)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// A compiled regular expression that compares by its source text
#[derive(Debug, Clone)]
pub struct SlotPattern {
    source: String,
    regex: Regex,
}

impl SlotPattern {
    /// Compile a pattern
    pub fn compile(source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            source: source.to_string(),
            regex: Regex::new(source)?,
        })
    }

    /// Returns the pattern source
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the value matches
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl PartialEq for SlotPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// A named type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    pub name: String,
    /// Primitive the type reduces to
    pub base: PrimitiveKind,
    pub description: Option<String>,
    pub minimum_value: Option<f64>,
    pub maximum_value: Option<f64>,
    pub pattern: Option<SlotPattern>,
}

impl TypeDefinition {
    /// A builtin primitive type
    pub fn builtin(kind: PrimitiveKind) -> Self {
        Self {
            name: kind.type_name().to_string(),
            base: kind,
            description: None,
            minimum_value: None,
            maximum_value: None,
            pattern: None,
        }
    }
}

/// An enumeration of permissible values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDefinition {
    pub name: String,
    pub description: Option<String>,
    pub permissible_values: Vec<String>,
}

impl EnumDefinition {
    /// Whether the value is permitted
    pub fn permits(&self, value: &str) -> bool {
        self.permissible_values.iter().any(|v| v == value)
    }
}

/// Index of a class in the schema arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub(crate) usize);

impl ClassId {
    /// Returns the arena index
    pub fn index(&self) -> usize {
        self.0
    }
}

/// The declared range of a slot, resolved against the schema namespaces
#[derive(Debug, Clone, PartialEq)]
pub enum Range {
    /// A builtin or named type
    Type {
        name: String,
        kind: PrimitiveKind,
    },
    /// An enumeration
    Enum { name: String },
    /// A class; values are nested instances of it or of a descendant
    Class { name: String, id: ClassId },
}

impl Range {
    /// Returns the declared range name
    pub fn name(&self) -> &str {
        match self {
            Range::Type { name, .. } | Range::Enum { name } | Range::Class { name, .. } => name,
        }
    }

    /// Returns the primitive kind of type and enum ranges
    pub fn primitive(&self) -> Option<PrimitiveKind> {
        match self {
            Range::Type { kind, .. } => Some(*kind),
            Range::Enum { .. } => Some(PrimitiveKind::String),
            Range::Class { .. } => None,
        }
    }

    /// Returns the class id for class ranges
    pub fn class_id(&self) -> Option<ClassId> {
        match self {
            Range::Class { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Returns the range category for canonical output
    pub fn category(&self) -> &'static str {
        match self {
            Range::Type { .. } => "type",
            Range::Enum { .. } => "enum",
            Range::Class { .. } => "class",
        }
    }
}

/// A primitive literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
}

impl Literal {
    /// Converts the literal to JSON
    pub fn to_json(&self) -> Value {
        match self {
            Literal::Integer(v) => Value::from(*v),
            Literal::Float(v) => Value::from(*v),
            Literal::String(v) => Value::from(v.as_str()),
            Literal::Boolean(v) => Value::from(*v),
        }
    }

    /// Returns the numeric value, if any
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Integer(v) => Some(*v as f64),
            Literal::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(v) => write!(f, "{}", v),
            Literal::Float(v) => write!(f, "{}", v),
            Literal::String(v) => write!(f, "{}", v),
            Literal::Boolean(v) => write!(f, "{}", v),
        }
    }
}

/// A slot as declared by one class
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSpec {
    pub name: String,
    /// Class that declares this spec
    pub owner: String,
    pub range: Range,
    pub description: Option<String>,
    pub required: bool,
    pub multivalued: bool,
    /// Inclusive lower bound
    pub minimum_value: Option<f64>,
    /// Inclusive upper bound
    pub maximum_value: Option<f64>,
    /// Default expression as written
    pub ifabsent: Option<String>,
    /// Default expression parsed against the range
    pub default: Option<Literal>,
    pub pattern: Option<SlotPattern>,
    pub minimum_cardinality: Option<usize>,
    pub maximum_cardinality: Option<usize>,
    /// Declared as replacing an ancestor's slot
    pub overrides: bool,
}

impl SlotSpec {
    /// Whether numeric bounds are declared
    pub fn is_bounded(&self) -> bool {
        self.minimum_value.is_some() || self.maximum_value.is_some()
    }

    /// Whether the value lies within the inclusive bounds
    pub fn within_bounds(&self, value: f64) -> bool {
        self.minimum_value.map_or(true, |min| value >= min)
            && self.maximum_value.map_or(true, |max| value <= max)
    }
}

/// A class and its locally declared slots
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDefinition {
    pub id: ClassId,
    pub name: String,
    pub description: Option<String>,
    /// Parent name as declared
    pub is_a: Option<String>,
    /// Parent resolved into the arena
    pub parent: Option<ClassId>,
    pub is_abstract: bool,
    /// Locally declared slots by name
    pub slots: BTreeMap<String, SlotSpec>,
}

impl ClassDefinition {
    /// Whether the class has no parent
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        assert_eq!(PrimitiveKind::from_builtin("integer"), Some(PrimitiveKind::Integer));
        assert_eq!(PrimitiveKind::from_builtin("boolean"), Some(PrimitiveKind::Boolean));
        assert_eq!(PrimitiveKind::from_builtin("int"), None);
    }

    #[test]
    fn test_numeric_kinds() {
        assert!(PrimitiveKind::Integer.is_numeric());
        assert!(PrimitiveKind::Float.is_numeric());
        assert!(!PrimitiveKind::String.is_numeric());
        assert!(!PrimitiveKind::Boolean.is_numeric());
    }

    #[test]
    fn test_pattern_equality_uses_source() {
        let a = SlotPattern::compile("^[a-z]+$").unwrap();
        let b = SlotPattern::compile("^[a-z]+$").unwrap();
        assert_eq!(a, b);
        assert!(a.is_match("abc"));
        assert!(!a.is_match("ABC"));
    }

    #[test]
    fn test_literal_json() {
        assert_eq!(Literal::Integer(128).to_json(), serde_json::json!(128));
        assert_eq!(Literal::Boolean(false).to_json(), serde_json::json!(false));
        assert_eq!(Literal::Integer(3).as_f64(), Some(3.0));
        assert_eq!(Literal::String("x".into()).as_f64(), None);
    }

    #[test]
    fn test_range_primitive() {
        let enum_range = Range::Enum { name: "MicroscopeType".into() };
        assert_eq!(enum_range.primitive(), Some(PrimitiveKind::String));

        let class_range = Range::Class { name: "Shape".into(), id: ClassId(0) };
        assert_eq!(class_range.primitive(), None);
        assert_eq!(class_range.class_id(), Some(ClassId(0)));
    }
}
