//! Schema subsystem
//!
//! Loads LinkML-style class hierarchies, resolves inheritance into induced
//! views, and validates JSON documents against them.
//!
//! # Layers
//!
//! - `raw`: the serde form of a schema file
//! - `loader`: raw schema to immutable `SchemaModel`, all-or-nothing
//! - `resolver`: ancestor chains and induced views
//! - `defaults`: `ifabsent` parsing and injection
//! - `validator`: constraint checks and construction of `Instance`s
//! - `polymorphic`: type-designator resolution for class-ranged slots
//! - `export`: canonical JSON of induced views

mod defaults;
mod errors;
mod export;
mod instance;
mod loader;
mod model;
mod polymorphic;
mod raw;
mod resolver;
mod types;
mod validator;

pub use defaults::{apply_defaults, parse_default};
pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, Severity};
pub use export::{export_view, fingerprint, schema_fingerprint, to_canonical_json, ClassExport, SlotExport};
pub use instance::{Instance, SlotValue};
pub use loader::{load_schema, load_schema_file, load_schema_str};
pub use model::{SchemaInfo, SchemaModel};
pub use polymorphic::{admissible_classes, resolve_concrete_class};
pub use raw::{RawClass, RawEnum, RawSchema, RawSlot, RawType};
pub use resolver::{ancestor_chain, InducedClassView, InducedSlot};
pub use types::{
    ClassDefinition, ClassId, EnumDefinition, Literal, PrimitiveKind, Range, SlotPattern,
    SlotSpec, TypeDefinition,
};
pub use validator::{
    ConstructError, ValidationResult, Validator, ValidatorConfig, Violation, ViolationList,
    ROOT_PATH,
};

/// The bundled microscopy core schema
pub const MICROSCOPY_CORE_SCHEMA: &str = include_str!("../../schemas/microscopy_core.json");
