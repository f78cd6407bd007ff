//! Inheritance resolution
//!
//! A class's induced view is built by walking its ancestor chain to the root
//! and overlaying each level's declared slots root-first, the class itself
//! last. A redeclared slot replaces the inherited spec as a whole; nothing of
//! the ancestor's spec survives except the marker naming it.

use std::collections::{BTreeMap, HashSet};

use super::errors::{SchemaError, SchemaResult};
use super::model::SchemaModel;
use super::types::{ClassDefinition, ClassId, SlotSpec};

/// One effective slot of an induced view
#[derive(Debug, Clone, PartialEq)]
pub struct InducedSlot {
    /// Effective spec; `spec.owner` is the declaring class
    pub spec: SlotSpec,
    /// Class whose spec of the same name this one replaced
    pub modifies: Option<String>,
}

impl InducedSlot {
    /// Whether this spec replaced an ancestor's
    pub fn modifies_slot(&self) -> bool {
        self.modifies.is_some()
    }
}

/// The merged slot set effective for a class
#[derive(Debug, Clone, PartialEq)]
pub struct InducedClassView {
    pub class_id: ClassId,
    pub class_name: String,
    pub is_abstract: bool,
    /// Ancestor names, class first, root last
    pub ancestors: Vec<String>,
    slots: BTreeMap<String, InducedSlot>,
}

impl InducedClassView {
    /// Returns the effective slot of the given name
    pub fn get(&self, slot_name: &str) -> Option<&InducedSlot> {
        self.slots.get(slot_name)
    }

    /// Whether the view carries a slot of the given name
    pub fn contains(&self, slot_name: &str) -> bool {
        self.slots.contains_key(slot_name)
    }

    /// Number of effective slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot names in order
    pub fn slot_names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Effective slots in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &InducedSlot)> {
        self.slots.iter().map(|(name, slot)| (name.as_str(), slot))
    }

    /// Slots declared by the class itself
    pub fn own_slots(&self) -> impl Iterator<Item = &InducedSlot> {
        self.slots
            .values()
            .filter(move |slot| slot.spec.owner == self.class_name)
    }

    /// Slots taken unchanged from ancestors
    pub fn inherited_slots(&self) -> impl Iterator<Item = &InducedSlot> {
        self.slots
            .values()
            .filter(move |slot| slot.spec.owner != self.class_name)
    }
}

/// Walks from a class to its root and returns the chain, class first.
///
/// Fails with `CyclicInheritance` if a class reappears during the walk.
pub fn ancestor_chain(classes: &[ClassDefinition], start: ClassId) -> SchemaResult<Vec<ClassId>> {
    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    let mut current = Some(start);

    while let Some(id) = current {
        if !visited.insert(id) {
            let mut names: Vec<String> = chain
                .iter()
                .map(|c: &ClassId| classes[c.index()].name.clone())
                .collect();
            names.push(classes[id.index()].name.clone());
            return Err(SchemaError::cyclic_inheritance(
                classes[start.index()].name.clone(),
                &names,
            ));
        }
        chain.push(id);
        current = classes[id.index()].parent;
    }

    Ok(chain)
}

/// Computes the induced view of a class from the model's ancestor table.
pub fn induce(model: &SchemaModel, class_id: ClassId) -> InducedClassView {
    let class = model.class_at(class_id);
    let chain = model.ancestors(class_id);

    let mut slots: BTreeMap<String, InducedSlot> = BTreeMap::new();
    for ancestor_id in chain.iter().rev() {
        let ancestor = model.class_at(*ancestor_id);
        for (name, spec) in &ancestor.slots {
            let modifies = slots.get(name).map(|prev| prev.spec.owner.clone());
            slots.insert(
                name.clone(),
                InducedSlot {
                    spec: spec.clone(),
                    modifies,
                },
            );
        }
    }

    InducedClassView {
        class_id,
        class_name: class.name.clone(),
        is_abstract: class.is_abstract,
        ancestors: chain
            .iter()
            .map(|id| model.class_at(*id).name.clone())
            .collect(),
        slots,
    }
}

/// Whether `child` is `ancestor` or one of its descendants.
pub fn is_subclass_of(model: &SchemaModel, child: ClassId, ancestor: ClassId) -> bool {
    model.class_by_id(child).is_some() && model.ancestors(child).contains(&ancestor)
}
