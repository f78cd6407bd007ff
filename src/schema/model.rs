//! The loaded, immutable schema graph
//!
//! Classes live in an arena indexed by `ClassId`. Ancestor chains and
//! descendant sets are computed once at load; induced views are computed on
//! first request and memoized in a per-class `OnceLock`, so concurrent readers
//! never need a lock and every reader sees the same view.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, OnceLock};

use crate::observability::{log_event_with_fields, Event};

use super::errors::{SchemaError, SchemaResult};
use super::resolver::{self, InducedClassView, InducedSlot};
use super::types::{ClassDefinition, ClassId, EnumDefinition, TypeDefinition};

/// Schema-level metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaInfo {
    pub name: String,
    pub id: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
}

/// A fully loaded schema
#[derive(Debug)]
pub struct SchemaModel {
    info: SchemaInfo,
    types: BTreeMap<String, TypeDefinition>,
    enums: BTreeMap<String, EnumDefinition>,
    classes: Vec<ClassDefinition>,
    class_index: BTreeMap<String, ClassId>,
    /// Per class: chain from the class to its root
    ancestors: Vec<Vec<ClassId>>,
    /// Per class: the class and every descendant
    descendants: Vec<BTreeSet<ClassId>>,
    induced: Vec<OnceLock<Arc<InducedClassView>>>,
}

impl SchemaModel {
    pub(crate) fn new(
        info: SchemaInfo,
        types: BTreeMap<String, TypeDefinition>,
        enums: BTreeMap<String, EnumDefinition>,
        classes: Vec<ClassDefinition>,
        ancestors: Vec<Vec<ClassId>>,
    ) -> Self {
        let class_index = classes
            .iter()
            .map(|class| (class.name.clone(), class.id))
            .collect();

        let mut descendants = vec![BTreeSet::new(); classes.len()];
        for (index, chain) in ancestors.iter().enumerate() {
            for ancestor in chain {
                descendants[ancestor.index()].insert(ClassId(index));
            }
        }

        let induced = (0..classes.len()).map(|_| OnceLock::new()).collect();

        Self {
            info,
            types,
            enums,
            classes,
            class_index,
            ancestors,
            descendants,
            induced,
        }
    }

    /// Returns schema metadata
    pub fn info(&self) -> &SchemaInfo {
        &self.info
    }

    /// Class names in name order
    pub fn class_names(&self) -> Vec<&str> {
        self.class_index.keys().map(String::as_str).collect()
    }

    /// Number of classes
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Looks up a class id by name
    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.class_index.get(name).copied()
    }

    /// Looks up a class definition by name
    pub fn class(&self, name: &str) -> Option<&ClassDefinition> {
        self.class_id(name).map(|id| self.class_at(id))
    }

    /// Looks up a class definition by id.
    ///
    /// Ids are only meaningful for the model that issued them. An id kept
    /// across a reload may be out of range here, which yields `None`, or may
    /// name a different class.
    pub fn class_by_id(&self, id: ClassId) -> Option<&ClassDefinition> {
        self.classes.get(id.index())
    }

    /// Returns the class at an arena index issued by this model
    pub(crate) fn class_at(&self, id: ClassId) -> &ClassDefinition {
        &self.classes[id.index()]
    }

    /// All classes in arena order
    pub fn classes(&self) -> &[ClassDefinition] {
        &self.classes
    }

    /// Looks up a named type, builtins included
    pub fn type_def(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    /// All types in name order
    pub fn types(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.types.values()
    }

    /// Looks up an enum
    pub fn enum_def(&self, name: &str) -> Option<&EnumDefinition> {
        self.enums.get(name)
    }

    /// All enums in name order
    pub fn enums(&self) -> impl Iterator<Item = &EnumDefinition> {
        self.enums.values()
    }

    /// Chain from the class to its root, class first
    pub(crate) fn ancestors(&self, id: ClassId) -> &[ClassId] {
        &self.ancestors[id.index()]
    }

    /// The class and all of its descendants
    pub(crate) fn descendants(&self, id: ClassId) -> &BTreeSet<ClassId> {
        &self.descendants[id.index()]
    }

    /// Concrete classes a value ranged on `id` may take.
    ///
    /// Empty for an id this model did not issue.
    pub fn concrete_descendants(&self, id: ClassId) -> impl Iterator<Item = &ClassDefinition> {
        self.descendants
            .get(id.index())
            .into_iter()
            .flatten()
            .map(|d| self.class_at(*d))
            .filter(|class| !class.is_abstract)
    }

    /// Whether `child` is `ancestor` or one of its descendants.
    ///
    /// False for an id this model did not issue.
    pub fn is_subclass_of(&self, child: ClassId, ancestor: ClassId) -> bool {
        resolver::is_subclass_of(self, child, ancestor)
    }

    /// Returns the memoized induced view of a class
    pub fn induced_view(&self, class_name: &str) -> SchemaResult<Arc<InducedClassView>> {
        let id = self
            .class_id(class_name)
            .ok_or_else(|| SchemaError::unknown_class(class_name))?;
        Ok(self.induced_view_by_id(id))
    }

    /// Returns the memoized induced view of a class by id
    pub(crate) fn induced_view_by_id(&self, id: ClassId) -> Arc<InducedClassView> {
        self.induced[id.index()]
            .get_or_init(|| {
                let view = resolver::induce(self, id);
                log_event_with_fields(
                    Event::InducedViewComputed,
                    &[
                        ("class", view.class_name.as_str()),
                        ("slots", &view.len().to_string()),
                    ],
                );
                Arc::new(view)
            })
            .clone()
    }

    /// Returns the effective spec of one slot of a class
    pub fn slot_spec(&self, class_name: &str, slot_name: &str) -> SchemaResult<InducedSlot> {
        let view = self.induced_view(class_name)?;
        view.get(slot_name)
            .cloned()
            .ok_or_else(|| SchemaError::unknown_slot(class_name, slot_name))
    }

    /// Number of induced views computed so far
    pub fn computed_view_count(&self) -> usize {
        self.induced.iter().filter(|cell| cell.get().is_some()).count()
    }
}
