//! Schema error types
//!
//! Error codes:
//! - MM_SCHEMA_PARSE_ERROR (FATAL)
//! - MM_DUPLICATE_DEFINITION (FATAL)
//! - MM_UNRESOLVED_RANGE (FATAL)
//! - MM_UNRESOLVED_PARENT (FATAL)
//! - MM_CYCLIC_INHERITANCE (FATAL)
//! - MM_UNKNOWN_CLASS (REJECT)
//! - MM_UNKNOWN_SLOT (REJECT)
//!
//! FATAL errors abort a whole schema load; the previously active schema stays
//! in effect. REJECT errors refuse a single query against a loaded schema.
//! Instance-level problems are not errors at all, see `validator::Violation`.

use std::fmt;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Query rejected, schema unaffected
    Reject,
    /// Schema load aborted
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Raw schema is structurally invalid
    SchemaParse,
    /// A name is declared twice within one owner
    DuplicateDefinition,
    /// A slot range names no known type, enum or class
    UnresolvedRange,
    /// An `is_a` parent names no known class
    UnresolvedParent,
    /// The ancestor chain of a class loops back on itself
    CyclicInheritance,
    /// Query for a class the schema does not define
    UnknownClass,
    /// Query for a slot the class does not carry
    UnknownSlot,
}

impl SchemaErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::SchemaParse => "MM_SCHEMA_PARSE_ERROR",
            SchemaErrorCode::DuplicateDefinition => "MM_DUPLICATE_DEFINITION",
            SchemaErrorCode::UnresolvedRange => "MM_UNRESOLVED_RANGE",
            SchemaErrorCode::UnresolvedParent => "MM_UNRESOLVED_PARENT",
            SchemaErrorCode::CyclicInheritance => "MM_CYCLIC_INHERITANCE",
            SchemaErrorCode::UnknownClass => "MM_UNKNOWN_CLASS",
            SchemaErrorCode::UnknownSlot => "MM_UNKNOWN_SLOT",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            SchemaErrorCode::UnknownClass | SchemaErrorCode::UnknownSlot => Severity::Reject,
            _ => Severity::Fatal,
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error type with full context
#[derive(Debug, Clone)]
pub struct SchemaError {
    /// Error code
    code: SchemaErrorCode,
    /// Human-readable message
    message: String,
    /// Class involved, if any
    class_name: Option<String>,
    /// Slot involved, if any
    slot_name: Option<String>,
}

impl SchemaError {
    fn new(code: SchemaErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            class_name: None,
            slot_name: None,
        }
    }

    fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    fn with_slot(mut self, slot_name: impl Into<String>) -> Self {
        self.slot_name = Some(slot_name.into());
        self
    }

    /// Create an error for structurally invalid schema input
    pub fn parse_error(reason: impl Into<String>) -> Self {
        Self::new(SchemaErrorCode::SchemaParse, reason.into())
    }

    /// Create an error for invalid input tied to one slot of one class
    pub fn invalid_slot(
        class_name: impl Into<String>,
        slot_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let class_name = class_name.into();
        let slot_name = slot_name.into();
        Self::new(
            SchemaErrorCode::SchemaParse,
            format!("Slot '{}.{}': {}", class_name, slot_name, reason.into()),
        )
        .with_class(class_name)
        .with_slot(slot_name)
    }

    /// Create a duplicate definition error
    ///
    /// `owner` is the schema itself for top-level names, or the class for slots.
    pub fn duplicate_definition(
        kind: &str,
        owner: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let owner = owner.into();
        let name = name.into();
        Self::new(
            SchemaErrorCode::DuplicateDefinition,
            format!("{} '{}' is declared more than once in '{}'", kind, name, owner),
        )
        .with_class(owner)
        .with_slot(name)
    }

    /// Create an unresolved range error
    pub fn unresolved_range(
        class_name: impl Into<String>,
        slot_name: impl Into<String>,
        range: &str,
    ) -> Self {
        let class_name = class_name.into();
        let slot_name = slot_name.into();
        Self::new(
            SchemaErrorCode::UnresolvedRange,
            format!(
                "Slot '{}.{}' has range '{}' which is neither a type, an enum nor a class",
                class_name, slot_name, range
            ),
        )
        .with_class(class_name)
        .with_slot(slot_name)
    }

    /// Create an unresolved parent error
    pub fn unresolved_parent(class_name: impl Into<String>, parent: &str) -> Self {
        let class_name = class_name.into();
        Self::new(
            SchemaErrorCode::UnresolvedParent,
            format!("Class '{}' is_a unknown class '{}'", class_name, parent),
        )
        .with_class(class_name)
    }

    /// Create a cyclic inheritance error from the walked chain
    pub fn cyclic_inheritance(class_name: impl Into<String>, chain: &[String]) -> Self {
        let class_name = class_name.into();
        Self::new(
            SchemaErrorCode::CyclicInheritance,
            format!(
                "Class '{}' inherits from itself: {}",
                class_name,
                chain.join(" -> ")
            ),
        )
        .with_class(class_name)
    }

    /// Create an unknown class error
    pub fn unknown_class(class_name: impl Into<String>) -> Self {
        let class_name = class_name.into();
        Self::new(
            SchemaErrorCode::UnknownClass,
            format!("Class '{}' not found", class_name),
        )
        .with_class(class_name)
    }

    /// Create an unknown slot error
    pub fn unknown_slot(class_name: impl Into<String>, slot_name: impl Into<String>) -> Self {
        let class_name = class_name.into();
        let slot_name = slot_name.into();
        Self::new(
            SchemaErrorCode::UnknownSlot,
            format!("Class '{}' has no slot '{}'", class_name, slot_name),
        )
        .with_class(class_name)
        .with_slot(slot_name)
    }

    /// Create an error for an unreadable or malformed schema source
    pub fn malformed_source(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            SchemaErrorCode::SchemaParse,
            format!("Malformed schema source '{}': {}", source.into(), reason.into()),
        )
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the class name if applicable
    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    /// Returns the slot name if applicable
    pub fn slot_name(&self) -> Option<&str> {
        self.slot_name.as_deref()
    }

    /// Returns whether this error aborted a schema load
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SchemaErrorCode::SchemaParse.code(), "MM_SCHEMA_PARSE_ERROR");
        assert_eq!(SchemaErrorCode::DuplicateDefinition.code(), "MM_DUPLICATE_DEFINITION");
        assert_eq!(SchemaErrorCode::UnresolvedRange.code(), "MM_UNRESOLVED_RANGE");
        assert_eq!(SchemaErrorCode::CyclicInheritance.code(), "MM_CYCLIC_INHERITANCE");
        assert_eq!(SchemaErrorCode::UnknownClass.code(), "MM_UNKNOWN_CLASS");
    }

    #[test]
    fn test_severity_levels() {
        assert_eq!(SchemaErrorCode::SchemaParse.severity(), Severity::Fatal);
        assert_eq!(SchemaErrorCode::CyclicInheritance.severity(), Severity::Fatal);
        assert_eq!(SchemaErrorCode::UnknownClass.severity(), Severity::Reject);
        assert_eq!(SchemaErrorCode::UnknownSlot.severity(), Severity::Reject);
    }

    #[test]
    fn test_context_is_kept() {
        let err = SchemaError::unresolved_range("Line", "x1", "Coordinate");
        assert_eq!(err.class_name(), Some("Line"));
        assert_eq!(err.slot_name(), Some("x1"));
        assert!(err.message().contains("Coordinate"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_cycle_message_lists_chain() {
        let chain = vec!["A".to_string(), "B".to_string(), "A".to_string()];
        let err = SchemaError::cyclic_inheritance("A", &chain);
        assert!(err.message().contains("A -> B -> A"));
    }

    #[test]
    fn test_display_includes_severity_and_code() {
        let err = SchemaError::unknown_class("Hexagon");
        let display = format!("{}", err);
        assert!(display.starts_with("[REJECT] MM_UNKNOWN_CLASS"));
        assert!(display.contains("Hexagon"));
    }
}
