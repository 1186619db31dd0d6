use std::{
    any::{Any, TypeId, type_name},
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
    sync::atomic::{AtomicU64, Ordering},
};

use smallvec::SmallVec;

use crate::render::framegraph::{error::GraphError, pass::PassId};

static NEXT_RESOURCE_UID: AtomicU64 = AtomicU64::new(1);

/// Describes how to materialize a concrete object and how to release it.
///
/// The frame graph never looks inside a description. It calls `realize`
/// right before the first pass that needs the object and `derealize` right
/// after the last one.
pub trait ResourceDescription: 'static {
    type Actual: 'static;

    fn realize(&self) -> anyhow::Result<Self::Actual>;

    fn derealize(&self, actual: Self::Actual) {
        drop(actual);
    }

    /// Estimated footprint in bytes, used for timeline statistics.
    fn size(&self) -> u64 {
        0
    }
}

/// Arena index of a resource, tagged with the frame epoch it belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct ResourceId {
    index: u32,
    epoch: u32,
}

impl ResourceId {
    pub(crate) fn new(index: usize, epoch: u32) -> Self {
        Self {
            index: index as u32,
            epoch,
        }
    }

    pub fn index(self) -> usize {
        self.index as usize
    }

    pub fn epoch(self) -> u32 {
        self.epoch
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resource #{} (epoch {})", self.index, self.epoch)
    }
}

/// Typed handle to a resource registered in a [`FrameGraph`].
///
/// [`FrameGraph`]: crate::render::framegraph::FrameGraph
pub struct Resource<D> {
    id: ResourceId,
    _marker: PhantomData<fn() -> D>,
}

impl<D> Resource<D> {
    pub(crate) fn new(id: ResourceId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }
}

impl<D> Clone for Resource<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for Resource<D> {}

impl<D> PartialEq for Resource<D> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<D> Eq for Resource<D> {}

impl<D> Hash for Resource<D> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<D> fmt::Debug for Resource<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("id", &self.id)
            .field("description", &type_name::<D>())
            .finish()
    }
}

pub(crate) trait ErasedSlot {
    fn realize(&mut self) -> anyhow::Result<()>;
    fn derealize(&mut self);
    fn is_realized(&self) -> bool;
    fn size(&self) -> u64;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct Slot<D: ResourceDescription> {
    description: D,
    actual: Option<D::Actual>,
}

impl<D: ResourceDescription> ErasedSlot for Slot<D> {
    fn realize(&mut self) -> anyhow::Result<()> {
        debug_assert!(self.actual.is_none(), "realizing a live resource");
        self.actual = Some(self.description.realize()?);
        Ok(())
    }

    fn derealize(&mut self) {
        if let Some(actual) = self.actual.take() {
            self.description.derealize(actual);
        }
    }

    fn is_realized(&self) -> bool {
        self.actual.is_some()
    }

    fn size(&self) -> u64 {
        self.description.size()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub(crate) type PassList = SmallVec<[PassId; 4]>;

pub(crate) struct ResourceNode {
    pub(crate) uid: u64,
    pub(crate) name: String,
    /// `None` for retained resources.
    pub(crate) creator: Option<PassId>,
    pub(crate) readers: PassList,
    pub(crate) writers: PassList,
    pub(crate) ref_count: usize,
    type_id: TypeId,
    type_name: &'static str,
    slot: Box<dyn ErasedSlot>,
}

impl ResourceNode {
    pub(crate) fn transient<D: ResourceDescription>(
        name: String,
        creator: PassId,
        description: D,
    ) -> Self {
        Self::with_slot(
            name,
            Some(creator),
            Slot {
                description,
                actual: None,
            },
        )
    }

    pub(crate) fn retained<D: ResourceDescription>(
        name: String,
        description: D,
        actual: D::Actual,
    ) -> Self {
        Self::with_slot(
            name,
            None,
            Slot {
                description,
                actual: Some(actual),
            },
        )
    }

    fn with_slot<D: ResourceDescription>(
        name: String,
        creator: Option<PassId>,
        slot: Slot<D>,
    ) -> Self {
        Self {
            uid: NEXT_RESOURCE_UID.fetch_add(1, Ordering::Relaxed),
            name,
            creator,
            readers: PassList::new(),
            writers: PassList::new(),
            ref_count: 0,
            type_id: TypeId::of::<D>(),
            type_name: type_name::<D>(),
            slot: Box::new(slot),
        }
    }

    pub(crate) fn is_transient(&self) -> bool {
        self.creator.is_some()
    }

    pub(crate) fn is_realized(&self) -> bool {
        self.slot.is_realized()
    }

    pub(crate) fn size(&self) -> u64 {
        self.slot.size()
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn check_type<D: ResourceDescription>(&self) -> Result<(), GraphError> {
        if self.type_id == TypeId::of::<D>() {
            Ok(())
        } else {
            Err(GraphError::TypeMismatch {
                resource: self.name.clone(),
                expected: type_name::<D>(),
            })
        }
    }

    pub(crate) fn description<D: ResourceDescription>(&self) -> Option<&D> {
        self.slot
            .as_any()
            .downcast_ref::<Slot<D>>()
            .map(|slot| &slot.description)
    }

    pub(crate) fn actual<D: ResourceDescription>(&self) -> Option<&D::Actual> {
        self.slot
            .as_any()
            .downcast_ref::<Slot<D>>()
            .and_then(|slot| slot.actual.as_ref())
    }

    pub(crate) fn actual_mut<D: ResourceDescription>(&mut self) -> Option<&mut D::Actual> {
        self.slot
            .as_any_mut()
            .downcast_mut::<Slot<D>>()
            .and_then(|slot| slot.actual.as_mut())
    }

    pub(crate) fn realize(&mut self) -> Result<(), GraphError> {
        log::trace!("realize '{}' ({})", self.name, self.uid);
        self.slot.realize().map_err(|source| GraphError::Realize {
            resource: self.name.clone(),
            source,
        })
    }

    /// Retained resources are owned by the caller's lifetime, not the timeline.
    pub(crate) fn derealize(&mut self) {
        if self.is_transient() {
            log::trace!("derealize '{}' ({})", self.name, self.uid);
            self.slot.derealize();
        }
    }

    /// Creator, readers and writers, in that order.
    pub(crate) fn users(&self) -> impl Iterator<Item = PassId> + '_ {
        self.creator
            .iter()
            .copied()
            .chain(self.readers.iter().copied())
            .chain(self.writers.iter().copied())
    }
}
