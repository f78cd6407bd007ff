//! Schema engine
//!
//! Owns the active schema and serves queries and validations against it.
//!
//! The active model sits behind `RwLock<Arc<SchemaModel>>`. Every operation
//! clones the `Arc` once and works on that snapshot, so a concurrent reload
//! never changes the schema under a running validation. A reload builds the
//! new model completely before the swap; on failure the old model stays.

use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;

use serde_json::Value;

use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::schema::{
    export_view, load_schema, load_schema_file, schema_fingerprint, to_canonical_json,
    ClassDefinition, ConstructError, InducedClassView, InducedSlot, Instance, RawSchema,
    SchemaError, SchemaModel, SchemaResult, ValidationResult, Validator, ValidatorConfig,
};

/// Thread-safe front end to one active schema
#[derive(Debug)]
pub struct SchemaEngine {
    active: RwLock<Arc<SchemaModel>>,
    config: ValidatorConfig,
    metrics: Arc<MetricsRegistry>,
}

impl SchemaEngine {
    /// Creates an engine around an already loaded model
    pub fn new(model: SchemaModel, config: ValidatorConfig) -> Self {
        let metrics = Arc::new(MetricsRegistry::new());
        metrics.increment_schemas_loaded();
        Self {
            active: RwLock::new(Arc::new(model)),
            config,
            metrics,
        }
    }

    /// Loads a schema and creates an engine for it
    pub fn load(raw: RawSchema, config: ValidatorConfig) -> SchemaResult<Self> {
        Ok(Self::new(load_schema(raw)?, config))
    }

    /// Loads a schema file and creates an engine for it
    pub fn load_file(path: &Path, config: ValidatorConfig) -> SchemaResult<Self> {
        Ok(Self::new(load_schema_file(path)?, config))
    }

    /// Replaces the active schema.
    ///
    /// The new schema is fully loaded first. On any load error the active
    /// schema is left untouched and the error is returned.
    pub fn reload(&self, raw: RawSchema) -> SchemaResult<()> {
        let name = raw.name.clone();
        let loaded = load_schema(raw);
        self.install(&name, loaded)
    }

    /// Replaces the active schema from a file
    pub fn reload_file(&self, path: &Path) -> SchemaResult<()> {
        let name = path.display().to_string();
        let loaded = load_schema_file(path);
        self.install(&name, loaded)
    }

    fn install(&self, name: &str, loaded: SchemaResult<SchemaModel>) -> SchemaResult<()> {
        match loaded {
            Ok(model) => {
                let classes = model.class_count().to_string();
                // the guarded value is only ever replaced whole, so a poisoned
                // lock still holds a consistent Arc
                *self.active.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(model);
                self.metrics.increment_schemas_loaded();
                self.metrics.increment_schema_reloads();
                log_event_with_fields(
                    Event::SchemaReloaded,
                    &[("schema", name), ("classes", &classes)],
                );
                Ok(())
            }
            Err(err) => {
                self.metrics.increment_schema_load_failures();
                log_event_with_fields(
                    Event::SchemaReloadRejected,
                    &[("schema", name), ("code", err.code().code()), ("reason", err.message())],
                );
                Err(err)
            }
        }
    }

    /// The active schema
    pub fn snapshot(&self) -> Arc<SchemaModel> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<MetricsRegistry> {
        Arc::clone(&self.metrics)
    }

    /// Class names in name order
    pub fn list_classes(&self) -> Vec<String> {
        self.snapshot()
            .class_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// The class as declared, without inherited slots
    pub fn class_definition(&self, class_name: &str) -> SchemaResult<ClassDefinition> {
        self.snapshot()
            .class(class_name)
            .cloned()
            .ok_or_else(|| SchemaError::unknown_class(class_name))
    }

    /// The memoized induced view of a class
    pub fn induced_view(&self, class_name: &str) -> SchemaResult<Arc<InducedClassView>> {
        self.snapshot().induced_view(class_name)
    }

    /// Effective spec of one slot of a class
    pub fn slot_spec(&self, class_name: &str, slot_name: &str) -> SchemaResult<InducedSlot> {
        self.snapshot().slot_spec(class_name, slot_name)
    }

    /// Validates one document against a class
    pub fn validate(&self, data: &Value, class_name: &str) -> SchemaResult<ValidationResult> {
        let model = self.snapshot();
        let result = Validator::new(&model, &self.config).validate(data, class_name)?;
        self.record(&result);
        Ok(result)
    }

    /// Validates one document and returns the constructed instance
    pub fn construct(&self, data: &Value, class_name: &str) -> Result<Instance, ConstructError> {
        self.validate(data, class_name)?
            .into_instance()
            .map_err(ConstructError::Invalid)
    }

    /// Validates many documents against one class, in parallel.
    ///
    /// Results are returned in input order. All documents are checked
    /// against the same schema snapshot.
    pub fn validate_batch(
        &self,
        documents: &[Value],
        class_name: &str,
    ) -> SchemaResult<Vec<ValidationResult>> {
        let model = self.snapshot();
        if model.class_id(class_name).is_none() {
            return Err(SchemaError::unknown_class(class_name));
        }
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let workers = thread::available_parallelism()
            .map_or(1, NonZeroUsize::get)
            .min(documents.len());
        let chunk_size = documents.len().div_ceil(workers);
        let validator = Validator::new(&model, &self.config);

        let chunks: Vec<SchemaResult<Vec<ValidationResult>>> = thread::scope(|scope| {
            let handles: Vec<_> = documents
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|document| -> SchemaResult<ValidationResult> {
                                let result = validator.validate(document, class_name)?;
                                self.record(&result);
                                Ok(result)
                            })
                            .collect::<SchemaResult<Vec<_>>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        });

        let mut results = Vec::with_capacity(documents.len());
        for chunk in chunks {
            results.extend(chunk?);
        }
        Ok(results)
    }

    /// Canonical JSON of a class's induced view
    pub fn export_induced_schema(&self, class_name: &str) -> SchemaResult<String> {
        let model = self.snapshot();
        let view = model.induced_view(class_name)?;
        Ok(to_canonical_json(&export_view(&model, &view)))
    }

    /// Fingerprint of the active schema
    pub fn fingerprint(&self) -> u32 {
        schema_fingerprint(&self.snapshot())
    }

    fn record(&self, result: &ValidationResult) {
        if result.is_valid() {
            self.metrics.increment_validations_passed();
            log_event_with_fields(Event::ValidationComplete, &[("class", result.class_name())]);
        } else {
            let count = result.violations().len();
            self.metrics.record_validation_failure(count as u64);
            log_event_with_fields(
                Event::ValidationRejected,
                &[("class", result.class_name()), ("violations", &count.to_string())],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RawClass, RawSlot, SchemaErrorCode, Violation, MICROSCOPY_CORE_SCHEMA};
    use serde_json::json;

    fn engine() -> SchemaEngine {
        let raw = RawSchema::from_json(MICROSCOPY_CORE_SCHEMA).unwrap();
        SchemaEngine::load(raw, ValidatorConfig::default()).unwrap()
    }

    #[test]
    fn test_list_classes() {
        let engine = engine();
        let classes = engine.list_classes();
        assert!(classes.contains(&"ROI".to_string()));
        assert!(classes.contains(&"Shape".to_string()));
    }

    #[test]
    fn test_class_definition_is_declared_form() {
        let engine = engine();
        let line = engine.class_definition("Line").unwrap();
        assert_eq!(line.slots.len(), 4);
        assert_eq!(line.is_a.as_deref(), Some("Shape"));

        let err = engine.class_definition("Hexagon").unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::UnknownClass);
    }

    #[test]
    fn test_validate_updates_metrics() {
        let engine = engine();
        engine.validate(&json!({"r": 1, "g": 2, "b": 3}), "Color").unwrap();
        engine.validate(&json!({"r": -1, "g": 300}), "Color").unwrap();

        let snapshot = engine.metrics().snapshot();
        assert_eq!(snapshot.validations_passed, 1);
        assert_eq!(snapshot.validations_failed, 1);
        assert_eq!(snapshot.violations_reported, 2);
    }

    #[test]
    fn test_construct_reports_violations() {
        let engine = engine();
        let err = engine
            .construct(&json!({"x1": 0, "y1": 0, "x2": 5}), "Line")
            .unwrap_err();
        match err {
            ConstructError::Invalid(violations) => assert_eq!(
                violations.into_vec(),
                vec![Violation::MissingRequiredSlot { path: "y2".into() }]
            ),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_construct_unknown_class() {
        let engine = engine();
        let err = engine.construct(&json!({}), "Hexagon").unwrap_err();
        assert!(matches!(err, ConstructError::Schema(_)));
    }

    #[test]
    fn test_batch_preserves_order() {
        let engine = engine();
        let documents: Vec<Value> = (0..50)
            .map(|i| {
                if i % 7 == 0 {
                    json!({"r": 999})
                } else {
                    json!({"r": i})
                }
            })
            .collect();

        let results = engine.validate_batch(&documents, "Color").unwrap();
        assert_eq!(results.len(), 50);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.is_valid(), i % 7 != 0, "document {}", i);
        }
    }

    #[test]
    fn test_batch_rejects_unknown_class() {
        let engine = engine();
        assert!(engine.validate_batch(&[json!({})], "Hexagon").is_err());
        assert!(engine.validate_batch(&[], "Color").unwrap().is_empty());
    }

    #[test]
    fn test_reload_failure_keeps_schema() {
        let engine = engine();
        let before = engine.snapshot();

        let broken = RawSchema {
            name: "broken".into(),
            classes: vec![RawClass::new("A").attribute(RawSlot::new("b", "Nowhere"))],
            ..Default::default()
        };
        let err = engine.reload(broken).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::UnresolvedRange);

        assert!(Arc::ptr_eq(&before, &engine.snapshot()));
        assert_eq!(engine.metrics().snapshot().schema_load_failures, 1);
    }

    #[test]
    fn test_reload_swaps_schema() {
        let engine = engine();
        let replacement = RawSchema {
            name: "tiny".into(),
            classes: vec![RawClass::new("Only").attribute(RawSlot::new("v", "integer"))],
            ..Default::default()
        };
        engine.reload(replacement).unwrap();

        assert_eq!(engine.list_classes(), vec!["Only".to_string()]);
        assert_eq!(engine.metrics().snapshot().schema_reloads, 1);
    }

    #[test]
    fn test_export_twice_identical() {
        let engine = engine();
        let first = engine.export_induced_schema("Line").unwrap();
        let second = engine.export_induced_schema("Line").unwrap();
        assert_eq!(first, second);
        assert_eq!(engine.fingerprint(), engine.fingerprint());
    }
}
