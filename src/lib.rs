//! mmschema - schema resolution and validation for microscopy QC records
//!
//! Loads LinkML-style schemas, resolves class inheritance into induced views,
//! injects declared defaults, and validates JSON documents into typed
//! instances, with polymorphic class-ranged slots.
//!
//! ```ignore
//! use mmschema::engine::SchemaEngine;
//! use mmschema::schema::{RawSchema, ValidatorConfig, MICROSCOPY_CORE_SCHEMA};
//!
//! let raw = RawSchema::from_json(MICROSCOPY_CORE_SCHEMA)?;
//! let engine = SchemaEngine::load(raw, ValidatorConfig::default())?;
//! let roi = engine.construct(&serde_json::json!({"shapes": []}), "ROI")?;
//! ```

pub mod cli;
pub mod engine;
pub mod observability;
pub mod schema;
