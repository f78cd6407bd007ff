//! Canonical export of induced views
//!
//! The export is plain JSON with every map keyed in sorted order, so the
//! same schema always renders to the same bytes. The CRC32 of those bytes
//! serves as a fingerprint for comparing schemas across reloads.

use std::collections::BTreeMap;

use serde::Serialize;

use super::model::SchemaModel;
use super::polymorphic::admissible_classes;
use super::resolver::{InducedClassView, InducedSlot};

/// Exported form of one induced view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassExport {
    pub class: String,
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    pub ancestors: Vec<String>,
    pub slots: BTreeMap<String, SlotExport>,
}

/// Exported form of one effective slot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotExport {
    pub range: String,
    pub range_kind: &'static str,
    pub owner: String,
    pub required: bool,
    pub multivalued: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_cardinality: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_cardinality: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ifabsent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifies: Option<String>,
    /// Concrete classes accepted by a class-ranged slot
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub accepts: Vec<String>,
}

/// Builds the export of an induced view.
pub fn export_view(model: &SchemaModel, view: &InducedClassView) -> ClassExport {
    ClassExport {
        class: view.class_name.clone(),
        is_abstract: view.is_abstract,
        ancestors: view.ancestors.clone(),
        slots: view
            .iter()
            .map(|(name, slot)| (name.to_string(), export_slot(model, slot)))
            .collect(),
    }
}

fn export_slot(model: &SchemaModel, slot: &InducedSlot) -> SlotExport {
    let spec = &slot.spec;
    let accepts = spec
        .range
        .class_id()
        .map(|id| {
            admissible_classes(model, id)
                .into_iter()
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    SlotExport {
        range: spec.range.name().to_string(),
        range_kind: spec.range.category(),
        owner: spec.owner.clone(),
        required: spec.required,
        multivalued: spec.multivalued,
        minimum_value: spec.minimum_value,
        maximum_value: spec.maximum_value,
        minimum_cardinality: spec.minimum_cardinality,
        maximum_cardinality: spec.maximum_cardinality,
        pattern: spec.pattern.as_ref().map(|p| p.as_str().to_string()),
        ifabsent: spec.ifabsent.clone(),
        modifies: slot.modifies.clone(),
        accepts,
    }
}

/// Renders an export as canonical pretty-printed JSON.
pub fn to_canonical_json(export: &ClassExport) -> String {
    // maps are BTreeMaps and every value is a plain scalar, so this cannot fail
    serde_json::to_string_pretty(export).unwrap_or_default()
}

/// CRC32 of a canonical rendering
pub fn fingerprint(canonical: &str) -> u32 {
    crc32fast::hash(canonical.as_bytes())
}

/// Fingerprint of every class of a model, combined in class-name order
pub fn schema_fingerprint(model: &SchemaModel) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    for name in model.class_names() {
        if let Ok(view) = model.induced_view(name) {
            hasher.update(to_canonical_json(&export_view(model, &view)).as_bytes());
        }
    }
    hasher.finalize()
}
