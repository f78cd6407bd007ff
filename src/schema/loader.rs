//! Schema loader
//!
//! Turns a `RawSchema` into an immutable `SchemaModel`:
//! - builtin primitives are always registered
//! - every name is checked for duplicates within its owner
//! - ranges, parents and shared-slot references are resolved
//! - every ancestor chain is walked once so a cyclic schema never loads
//!
//! Loading is atomic. Any error aborts the whole load and no model is built.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::observability::{log_event_with_fields, Event, ObservationScope};

use super::defaults::parse_default;
use super::errors::{SchemaError, SchemaResult};
use super::model::{SchemaInfo, SchemaModel};
use super::raw::{RawClass, RawSchema, RawSlot};
use super::resolver::ancestor_chain;
use super::types::{
    ClassDefinition, ClassId, EnumDefinition, Literal, PrimitiveKind, Range, SlotPattern,
    SlotSpec, TypeDefinition,
};

/// Range assumed for slots that declare none
const DEFAULT_RANGE: &str = "string";

/// Loads a schema from its raw definitions.
pub fn load_schema(raw: RawSchema) -> SchemaResult<SchemaModel> {
    let scope = ObservationScope::with_fields("SCHEMA_LOAD", &[("schema", raw.name.as_str())]);

    match build_model(raw) {
        Ok(model) => {
            scope.complete_with_fields(&[
                ("classes", &model.class_count().to_string()),
                ("types", &model.types().count().to_string()),
            ]);
            Ok(model)
        }
        Err(err) => {
            scope.fail(&err.to_string());
            Err(err)
        }
    }
}

/// Loads a schema from its JSON form.
pub fn load_schema_str(source: &str) -> SchemaResult<SchemaModel> {
    let raw = RawSchema::from_json(source)
        .map_err(|e| SchemaError::malformed_source("<in-memory>", format!("Invalid JSON: {}", e)))?;
    load_schema(raw)
}

/// Loads a schema from a JSON file.
pub fn load_schema_file(path: &Path) -> SchemaResult<SchemaModel> {
    let content = fs::read_to_string(path).map_err(|e| {
        SchemaError::malformed_source(path.display().to_string(), format!("Failed to read file: {}", e))
    })?;

    let raw = RawSchema::from_json(&content).map_err(|e| {
        SchemaError::malformed_source(path.display().to_string(), format!("Invalid JSON: {}", e))
    })?;

    load_schema(raw)
}

fn build_model(raw: RawSchema) -> SchemaResult<SchemaModel> {
    if raw.name.trim().is_empty() {
        return Err(SchemaError::parse_error("Schema name must not be empty"));
    }

    let types = build_types(&raw)?;
    let enums = build_enums(&raw, &types)?;
    let class_ids = index_classes(&raw, &types, &enums)?;
    let shared = index_shared_slots(&raw)?;

    let namespaces = Namespaces {
        types: &types,
        enums: &enums,
        classes: &class_ids,
    };

    let mut classes = Vec::with_capacity(raw.classes.len());
    for (index, raw_class) in raw.classes.iter().enumerate() {
        classes.push(build_class(ClassId(index), raw_class, &shared, &namespaces)?);
    }

    let mut ancestors = Vec::with_capacity(classes.len());
    for class in &classes {
        ancestors.push(ancestor_chain(&classes, class.id)?);
    }

    warn_unmatched_overrides(&classes, &ancestors);

    let info = SchemaInfo {
        name: raw.name,
        id: raw.id,
        version: raw.version,
        description: raw.description,
    };

    Ok(SchemaModel::new(info, types, enums, classes, ancestors))
}

fn build_types(raw: &RawSchema) -> SchemaResult<BTreeMap<String, TypeDefinition>> {
    let mut types: BTreeMap<String, TypeDefinition> = PrimitiveKind::ALL
        .into_iter()
        .map(|kind| (kind.type_name().to_string(), TypeDefinition::builtin(kind)))
        .collect();

    for raw_type in &raw.types {
        require_name("Type", &raw_type.name)?;
        if types.contains_key(&raw_type.name) {
            return Err(SchemaError::duplicate_definition("Type", &raw.name, &raw_type.name));
        }

        // declaration order matters: a type may only derive from one seen before it
        let base = types.get(&raw_type.type_of).ok_or_else(|| {
            SchemaError::parse_error(format!(
                "Type '{}' derives from unknown type '{}'",
                raw_type.name, raw_type.type_of
            ))
        })?;

        let minimum_value = raw_type.minimum_value.or(base.minimum_value);
        let maximum_value = raw_type.maximum_value.or(base.maximum_value);
        check_bounds(base.base, minimum_value, maximum_value)
            .map_err(|reason| SchemaError::parse_error(format!("Type '{}': {}", raw_type.name, reason)))?;

        let pattern = match &raw_type.pattern {
            Some(source) => Some(compile_pattern(base.base, source).map_err(|reason| {
                SchemaError::parse_error(format!("Type '{}': {}", raw_type.name, reason))
            })?),
            None => base.pattern.clone(),
        };

        let definition = TypeDefinition {
            name: raw_type.name.clone(),
            base: base.base,
            description: raw_type.description.clone(),
            minimum_value,
            maximum_value,
            pattern,
        };
        types.insert(raw_type.name.clone(), definition);
    }

    Ok(types)
}

fn build_enums(
    raw: &RawSchema,
    types: &BTreeMap<String, TypeDefinition>,
) -> SchemaResult<BTreeMap<String, EnumDefinition>> {
    let mut enums = BTreeMap::new();

    for raw_enum in &raw.enums {
        require_name("Enum", &raw_enum.name)?;
        if enums.contains_key(&raw_enum.name) || types.contains_key(&raw_enum.name) {
            return Err(SchemaError::duplicate_definition("Enum", &raw.name, &raw_enum.name));
        }
        if raw_enum.permissible_values.is_empty() {
            return Err(SchemaError::parse_error(format!(
                "Enum '{}' has no permissible values",
                raw_enum.name
            )));
        }

        let mut seen = HashSet::new();
        for value in &raw_enum.permissible_values {
            if !seen.insert(value.as_str()) {
                return Err(SchemaError::duplicate_definition(
                    "Permissible value",
                    &raw_enum.name,
                    value,
                ));
            }
        }

        enums.insert(
            raw_enum.name.clone(),
            EnumDefinition {
                name: raw_enum.name.clone(),
                description: raw_enum.description.clone(),
                permissible_values: raw_enum.permissible_values.clone(),
            },
        );
    }

    Ok(enums)
}

fn index_classes(
    raw: &RawSchema,
    types: &BTreeMap<String, TypeDefinition>,
    enums: &BTreeMap<String, EnumDefinition>,
) -> SchemaResult<HashMap<String, ClassId>> {
    let mut ids = HashMap::with_capacity(raw.classes.len());

    for (index, class) in raw.classes.iter().enumerate() {
        require_name("Class", &class.name)?;
        let clashes = types.contains_key(&class.name) || enums.contains_key(&class.name);
        if clashes || ids.insert(class.name.clone(), ClassId(index)).is_some() {
            return Err(SchemaError::duplicate_definition("Class", &raw.name, &class.name));
        }
    }

    Ok(ids)
}

fn index_shared_slots(raw: &RawSchema) -> SchemaResult<HashMap<&str, &RawSlot>> {
    let mut shared = HashMap::with_capacity(raw.slots.len());

    for slot in &raw.slots {
        require_name("Slot", &slot.name)?;
        if shared.insert(slot.name.as_str(), slot).is_some() {
            return Err(SchemaError::duplicate_definition("Slot", &raw.name, &slot.name));
        }
    }

    Ok(shared)
}

/// Name lookups available while building class slots
struct Namespaces<'a> {
    types: &'a BTreeMap<String, TypeDefinition>,
    enums: &'a BTreeMap<String, EnumDefinition>,
    classes: &'a HashMap<String, ClassId>,
}

fn build_class(
    id: ClassId,
    raw: &RawClass,
    shared: &HashMap<&str, &RawSlot>,
    namespaces: &Namespaces<'_>,
) -> SchemaResult<ClassDefinition> {
    let parent = match &raw.is_a {
        Some(parent_name) => Some(
            namespaces
                .classes
                .get(parent_name)
                .copied()
                .ok_or_else(|| SchemaError::unresolved_parent(&raw.name, parent_name))?,
        ),
        None => None,
    };

    let mut declared: Vec<&RawSlot> = Vec::with_capacity(raw.slots.len() + raw.attributes.len());
    for reference in &raw.slots {
        let slot = shared.get(reference.as_str()).copied().ok_or_else(|| {
            SchemaError::invalid_slot(&raw.name, reference, "references an undeclared shared slot")
        })?;
        declared.push(slot);
    }
    declared.extend(raw.attributes.iter());

    let mut slots = BTreeMap::new();
    for raw_slot in declared {
        require_name("Slot", &raw_slot.name)?;
        if slots.contains_key(&raw_slot.name) {
            return Err(SchemaError::duplicate_definition("Slot", &raw.name, &raw_slot.name));
        }
        let spec = build_slot(&raw.name, raw_slot, namespaces)?;
        slots.insert(raw_slot.name.clone(), spec);
    }

    Ok(ClassDefinition {
        id,
        name: raw.name.clone(),
        description: raw.description.clone(),
        is_a: raw.is_a.clone(),
        parent,
        is_abstract: raw.is_abstract,
        slots,
    })
}

fn build_slot(owner: &str, raw: &RawSlot, namespaces: &Namespaces<'_>) -> SchemaResult<SlotSpec> {
    let range_name = raw.range.as_deref().unwrap_or(DEFAULT_RANGE);
    let invalid = |reason: String| SchemaError::invalid_slot(owner, &raw.name, reason);

    // slot-level constraints win over those inherited from a named type
    let (range, type_min, type_max, type_pattern) = if let Some(def) = namespaces.types.get(range_name) {
        (
            Range::Type {
                name: def.name.clone(),
                kind: def.base,
            },
            def.minimum_value,
            def.maximum_value,
            def.pattern.clone(),
        )
    } else if namespaces.enums.contains_key(range_name) {
        (Range::Enum { name: range_name.to_string() }, None, None, None)
    } else if let Some(id) = namespaces.classes.get(range_name) {
        (
            Range::Class {
                name: range_name.to_string(),
                id: *id,
            },
            None,
            None,
            None,
        )
    } else {
        return Err(SchemaError::unresolved_range(owner, &raw.name, range_name));
    };

    let minimum_value = raw.minimum_value.or(type_min);
    let maximum_value = raw.maximum_value.or(type_max);
    if raw.minimum_value.is_some() || raw.maximum_value.is_some() {
        match range.primitive() {
            Some(kind) => check_bounds(kind, minimum_value, maximum_value).map_err(invalid)?,
            None => return Err(invalid("numeric bounds on a class range".to_string())),
        }
    } else if let (Some(min), Some(max)) = (minimum_value, maximum_value) {
        if min > max {
            return Err(invalid(format!("minimum {} exceeds maximum {}", min, max)));
        }
    }

    let pattern = match &raw.pattern {
        Some(source) => match &range {
            Range::Type { kind, .. } => Some(compile_pattern(*kind, source).map_err(invalid)?),
            _ => return Err(invalid("pattern on a non-string range".to_string())),
        },
        None => type_pattern,
    };

    if raw.minimum_cardinality.is_some() || raw.maximum_cardinality.is_some() {
        if !raw.multivalued {
            return Err(invalid("cardinality bounds on a single-valued slot".to_string()));
        }
        if let (Some(min), Some(max)) = (raw.minimum_cardinality, raw.maximum_cardinality) {
            if min > max {
                return Err(invalid(format!(
                    "minimum cardinality {} exceeds maximum cardinality {}",
                    min, max
                )));
            }
        }
    }

    let mut spec = SlotSpec {
        name: raw.name.clone(),
        owner: owner.to_string(),
        range,
        description: raw.description.clone(),
        required: raw.required,
        multivalued: raw.multivalued,
        minimum_value,
        maximum_value,
        ifabsent: raw.ifabsent.clone(),
        default: None,
        pattern,
        minimum_cardinality: raw.minimum_cardinality,
        maximum_cardinality: raw.maximum_cardinality,
        overrides: raw.overrides,
    };

    if let Some(expr) = &raw.ifabsent {
        let kind = spec
            .range
            .primitive()
            .ok_or_else(|| invalid("default value on a class range".to_string()))?;
        let literal = parse_default(expr, kind).map_err(invalid)?;

        if let Range::Enum { name } = &spec.range {
            let permitted = namespaces
                .enums
                .get(name)
                .map_or(false, |def| def.permits(&literal.to_string()));
            if !permitted {
                return Err(invalid(format!("default '{}' is not a value of enum '{}'", literal, name)));
            }
        }
        if let Some(value) = literal.as_f64() {
            if !spec.within_bounds(value) {
                return Err(invalid(format!("default {} lies outside the declared bounds", value)));
            }
        }
        if let (Some(pattern), Literal::String(text)) = (&spec.pattern, &literal) {
            if !pattern.is_match(text) {
                return Err(invalid(format!("default '{}' does not match '{}'", text, pattern.as_str())));
            }
        }

        spec.default = Some(literal);
    }

    Ok(spec)
}

fn check_bounds(kind: PrimitiveKind, min: Option<f64>, max: Option<f64>) -> Result<(), String> {
    if (min.is_some() || max.is_some()) && !kind.is_numeric() {
        return Err(format!("numeric bounds on a {} range", kind));
    }
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(format!("minimum {} exceeds maximum {}", min, max));
        }
    }
    Ok(())
}

fn compile_pattern(kind: PrimitiveKind, source: &str) -> Result<SlotPattern, String> {
    if kind != PrimitiveKind::String {
        return Err(format!("pattern on a {} range", kind));
    }
    SlotPattern::compile(source).map_err(|e| format!("invalid pattern '{}': {}", source, e))
}

fn require_name(kind: &str, name: &str) -> SchemaResult<()> {
    if name.trim().is_empty() {
        return Err(SchemaError::parse_error(format!("{} name must not be empty", kind)));
    }
    Ok(())
}

fn warn_unmatched_overrides(classes: &[ClassDefinition], ancestors: &[Vec<ClassId>]) {
    for class in classes {
        for slot in class.slots.values().filter(|slot| slot.overrides) {
            let inherited = ancestors[class.id.index()]
                .iter()
                .skip(1)
                .any(|ancestor| classes[ancestor.index()].slots.contains_key(&slot.name));
            if !inherited {
                log_event_with_fields(
                    Event::SlotOverrideUnmatched,
                    &[("class", class.name.as_str()), ("slot", slot.name.as_str())],
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::errors::SchemaErrorCode;
    use crate::schema::raw::{RawEnum, RawType};
    use crate::schema::MICROSCOPY_CORE_SCHEMA;
    use std::io::Write;
    use tempfile::TempDir;

    fn schema_with(classes: Vec<RawClass>) -> RawSchema {
        RawSchema {
            name: "test".into(),
            classes,
            ..Default::default()
        }
    }

    fn load_err(raw: RawSchema) -> SchemaError {
        load_schema(raw).unwrap_err()
    }

    #[test]
    fn test_core_schema_loads() {
        let model = load_schema_str(MICROSCOPY_CORE_SCHEMA).unwrap();
        assert_eq!(model.info().name, "microscopemetrics_core");
        assert!(model.class("ROI").is_some());
        assert!(model.type_def("PositiveFloat").is_some());
        assert!(model.type_def("integer").is_some());
        assert!(model.enum_def("MicroscopeType").is_some());
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = load_schema_str("{not json").unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::SchemaParse);
    }

    #[test]
    fn test_empty_schema_name_rejected() {
        let err = load_err(RawSchema::default());
        assert_eq!(err.code(), SchemaErrorCode::SchemaParse);
    }

    #[test]
    fn test_duplicate_class_rejected() {
        let err = load_err(schema_with(vec![RawClass::new("A"), RawClass::new("A")]));
        assert_eq!(err.code(), SchemaErrorCode::DuplicateDefinition);
    }

    #[test]
    fn test_duplicate_slot_within_class_rejected() {
        let class = RawClass::new("A")
            .attribute(RawSlot::new("x", "float"))
            .attribute(RawSlot::new("x", "integer"));
        let err = load_err(schema_with(vec![class]));
        assert_eq!(err.code(), SchemaErrorCode::DuplicateDefinition);
        assert_eq!(err.class_name(), Some("A"));
        assert_eq!(err.slot_name(), Some("x"));
    }

    #[test]
    fn test_same_slot_in_different_classes_allowed() {
        let a = RawClass::new("A").attribute(RawSlot::new("x", "float"));
        let b = RawClass::new("B").attribute(RawSlot::new("x", "integer"));
        assert!(load_schema(schema_with(vec![a, b])).is_ok());
    }

    #[test]
    fn test_shared_and_inline_slot_clash_rejected() {
        let mut raw = schema_with(vec![RawClass::new("A")
            .uses_slot("label")
            .attribute(RawSlot::new("label", "string"))]);
        raw.slots.push(RawSlot::new("label", "string"));
        let err = load_err(raw);
        assert_eq!(err.code(), SchemaErrorCode::DuplicateDefinition);
    }

    #[test]
    fn test_undeclared_shared_slot_rejected() {
        let err = load_err(schema_with(vec![RawClass::new("A").uses_slot("missing")]));
        assert_eq!(err.code(), SchemaErrorCode::SchemaParse);
    }

    #[test]
    fn test_unresolved_range_rejected() {
        let class = RawClass::new("A").attribute(RawSlot::new("x", "Coordinate"));
        let err = load_err(schema_with(vec![class]));
        assert_eq!(err.code(), SchemaErrorCode::UnresolvedRange);
    }

    #[test]
    fn test_unresolved_parent_rejected() {
        let err = load_err(schema_with(vec![RawClass::new("A").is_a("Ghost")]));
        assert_eq!(err.code(), SchemaErrorCode::UnresolvedParent);
    }

    #[test]
    fn test_cycle_rejected_at_load() {
        let err = load_err(schema_with(vec![
            RawClass::new("A").is_a("C"),
            RawClass::new("B").is_a("A"),
            RawClass::new("C").is_a("B"),
        ]));
        assert_eq!(err.code(), SchemaErrorCode::CyclicInheritance);
    }

    #[test]
    fn test_missing_range_defaults_to_string() {
        let mut slot = RawSlot::new("note", "string");
        slot.range = None;
        let model = load_schema(schema_with(vec![RawClass::new("A").attribute(slot)])).unwrap();
        let spec = model.slot_spec("A", "note").unwrap().spec;
        assert_eq!(spec.range.primitive(), Some(PrimitiveKind::String));
    }

    #[test]
    fn test_bounds_on_string_rejected() {
        let class = RawClass::new("A").attribute(RawSlot::new("s", "string").bounded(0.0, 1.0));
        let err = load_err(schema_with(vec![class]));
        assert_eq!(err.code(), SchemaErrorCode::SchemaParse);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let class = RawClass::new("A").attribute(RawSlot::new("v", "integer").bounded(10.0, 1.0));
        assert!(load_schema(schema_with(vec![class])).is_err());
    }

    #[test]
    fn test_bad_default_rejected() {
        let class = RawClass::new("A").attribute(RawSlot::new("v", "integer").ifabsent("int(x)"));
        let err = load_err(schema_with(vec![class]));
        assert_eq!(err.code(), SchemaErrorCode::SchemaParse);
    }

    #[test]
    fn test_default_outside_bounds_rejected() {
        let class = RawClass::new("A")
            .attribute(RawSlot::new("v", "integer").bounded(0.0, 255.0).ifabsent("int(300)"));
        assert!(load_schema(schema_with(vec![class])).is_err());
    }

    #[test]
    fn test_default_on_class_range_rejected() {
        let classes = vec![
            RawClass::new("Inner"),
            RawClass::new("Outer").attribute(RawSlot::new("inner", "Inner").ifabsent("string(x)")),
        ];
        assert!(load_schema(schema_with(classes)).is_err());
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let mut slot = RawSlot::new("s", "string");
        slot.pattern = Some("([a-z".into());
        let err = load_err(schema_with(vec![RawClass::new("A").attribute(slot)]));
        assert_eq!(err.code(), SchemaErrorCode::SchemaParse);
    }

    #[test]
    fn test_type_inherits_bounds_from_base_type() {
        let mut raw = schema_with(vec![RawClass::new("A").attribute(RawSlot::new("v", "Level"))]);
        raw.types.push(RawType {
            name: "Byte".into(),
            type_of: "integer".into(),
            description: None,
            minimum_value: Some(0.0),
            maximum_value: Some(255.0),
            pattern: None,
        });
        raw.types.push(RawType {
            name: "Level".into(),
            type_of: "Byte".into(),
            description: None,
            minimum_value: Some(1.0),
            maximum_value: None,
            pattern: None,
        });

        let model = load_schema(raw).unwrap();
        let spec = model.slot_spec("A", "v").unwrap().spec;
        assert_eq!(spec.minimum_value, Some(1.0));
        assert_eq!(spec.maximum_value, Some(255.0));
        assert_eq!(spec.range.primitive(), Some(PrimitiveKind::Integer));
    }

    #[test]
    fn test_type_shadowing_builtin_rejected() {
        let mut raw = schema_with(vec![]);
        raw.types.push(RawType {
            name: "float".into(),
            type_of: "integer".into(),
            description: None,
            minimum_value: None,
            maximum_value: None,
            pattern: None,
        });
        assert_eq!(load_err(raw).code(), SchemaErrorCode::DuplicateDefinition);
    }

    #[test]
    fn test_enum_default_must_be_permitted() {
        let mut raw = schema_with(vec![RawClass::new("Microscope")
            .attribute(RawSlot::new("type", "MicroscopeType").ifabsent("electron"))]);
        raw.enums.push(RawEnum {
            name: "MicroscopeType".into(),
            description: None,
            permissible_values: vec!["widefield".into(), "confocal".into()],
        });
        assert!(load_schema(raw).is_err());
    }

    #[test]
    fn test_cardinality_on_single_valued_rejected() {
        let mut slot = RawSlot::new("v", "integer");
        slot.minimum_cardinality = Some(1);
        assert!(load_schema(schema_with(vec![RawClass::new("A").attribute(slot)])).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("core.json");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(MICROSCOPY_CORE_SCHEMA.as_bytes()).unwrap();

        let model = load_schema_file(&path).unwrap();
        assert!(model.class("Line").is_some());
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_schema_file(&temp_dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::SchemaParse);
        assert!(err.message().contains("Failed to read file"));
    }
}
