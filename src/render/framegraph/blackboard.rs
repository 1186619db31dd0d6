use std::{
    any::{TypeId, type_name},
    collections::HashMap,
};

use crate::render::framegraph::{
    error::GraphError,
    resource::{Resource, ResourceDescription, ResourceId},
};

struct Entry {
    id: ResourceId,
    type_id: TypeId,
}

/// Name-indexed side table for well-known resources of the current frame.
///
/// Passes registered far apart (the lighting pass and a UI overlay, say) can
/// agree on "the scene color target" by name instead of threading handles
/// through every call site. Entries are typed: looking one up with the wrong
/// description type is an error, not a reinterpretation.
#[derive(Default)]
pub struct Blackboard {
    entries: HashMap<String, Entry>,
}

impl Blackboard {
    /// Publishes `resource` under `name`, returning the entry it replaced.
    pub fn insert<D: ResourceDescription>(
        &mut self,
        name: impl Into<String>,
        resource: Resource<D>,
    ) -> Option<ResourceId> {
        self.entries
            .insert(
                name.into(),
                Entry {
                    id: resource.id(),
                    type_id: TypeId::of::<D>(),
                },
            )
            .map(|entry| entry.id)
    }

    pub fn get<D: ResourceDescription>(&self, name: &str) -> Result<Resource<D>, GraphError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| GraphError::MissingBlackboardEntry(name.to_owned()))?;
        if entry.type_id != TypeId::of::<D>() {
            return Err(GraphError::TypeMismatch {
                resource: name.to_owned(),
                expected: type_name::<D>(),
            });
        }
        Ok(Resource::new(entry.id))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn retain_ids(&mut self, mut keep: impl FnMut(ResourceId) -> bool) {
        self.entries.retain(|_, entry| keep(entry.id));
    }
}
