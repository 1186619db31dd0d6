use std::{
    any::{Any, type_name},
    fmt,
    marker::PhantomData,
};

use smallvec::SmallVec;

use crate::render::framegraph::{
    builder::TaskBuilder,
    error::GraphError,
    resource::{Resource, ResourceDescription, ResourceId, ResourceNode},
};

/// Arena index of a pass, tagged with the frame epoch it belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct PassId {
    index: u32,
    epoch: u32,
}

impl PassId {
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

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pass #{} (epoch {})", self.index, self.epoch)
    }
}

/// A unit of GPU work with declared inputs and outputs.
///
/// `setup` runs once, synchronously, when the task is added to the graph and
/// declares every resource the task touches. `execute` runs at most once per
/// frame, and only if the task survives culling. Anything `execute` needs
/// from `setup` (resource handles, parameters) lives in fields of the
/// implementing type.
///
/// A surviving task still loses the outputs nobody reads: unless the task is
/// cull-immune those are never realized, and [`ExecuteContext::get`] on one
/// fails with [`GraphError::NotRealized`]. Tasks with optional outputs use
/// [`ExecuteContext::try_get`] and skip the work for a `None`.
pub trait RenderTask: 'static {
    fn setup(&mut self, builder: &mut TaskBuilder<'_>) -> Result<(), GraphError>;

    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> anyhow::Result<()>;
}

pub(crate) trait ErasedTask {
    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> anyhow::Result<()>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: RenderTask> ErasedTask for T {
    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> anyhow::Result<()> {
        RenderTask::execute(self, ctx)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Adapter for tasks written as a pair of closures over an explicit data struct.
pub struct FnTask<T, S, E> {
    data: T,
    setup: Option<S>,
    execute: E,
}

impl<T, S, E> FnTask<T, S, E> {
    pub fn new(data: T, setup: S, execute: E) -> Self {
        Self {
            data,
            setup: Some(setup),
            execute,
        }
    }

    pub fn data(&self) -> &T {
        &self.data
    }
}

impl<T, S, E> RenderTask for FnTask<T, S, E>
where
    T: 'static,
    S: FnOnce(&mut T, &mut TaskBuilder<'_>) -> Result<(), GraphError> + 'static,
    E: FnMut(&T, &mut ExecuteContext<'_>) -> anyhow::Result<()> + 'static,
{
    fn setup(&mut self, builder: &mut TaskBuilder<'_>) -> Result<(), GraphError> {
        match self.setup.take() {
            Some(setup) => setup(&mut self.data, builder),
            None => Ok(()),
        }
    }

    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> anyhow::Result<()> {
        (self.execute)(&self.data, ctx)
    }
}

/// Typed handle to a task registered in a [`FrameGraph`].
///
/// [`FrameGraph`]: crate::render::framegraph::FrameGraph
pub struct TaskHandle<T> {
    id: PassId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TaskHandle<T> {
    pub(crate) fn new(id: PassId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> PassId {
        self.id
    }
}

impl<T> Clone for TaskHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TaskHandle<T> {}

impl<T> fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("task", &type_name::<T>())
            .finish()
    }
}

pub(crate) type ResourceList = SmallVec<[ResourceId; 4]>;

pub(crate) struct PassNode {
    pub(crate) name: String,
    pub(crate) cull_immune: bool,
    pub(crate) creates: ResourceList,
    pub(crate) reads: ResourceList,
    pub(crate) writes: ResourceList,
    pub(crate) ref_count: usize,
}

impl PassNode {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            cull_immune: false,
            creates: ResourceList::new(),
            reads: ResourceList::new(),
            writes: ResourceList::new(),
            ref_count: 0,
        }
    }

    pub(crate) fn declares(&self, resource: ResourceId) -> bool {
        self.creates.contains(&resource)
            || self.reads.contains(&resource)
            || self.writes.contains(&resource)
    }

    pub(crate) fn is_culled(&self) -> bool {
        self.ref_count == 0 && !self.cull_immune
    }
}

pub(crate) struct PassSlot {
    pub(crate) node: PassNode,
    pub(crate) task: Box<dyn ErasedTask>,
}

/// Everything a task may touch while it executes.
pub struct ExecuteContext<'a> {
    pub(crate) node: &'a PassNode,
    pub(crate) resources: &'a mut [ResourceNode],
    pub(crate) waits: &'a [PassId],
    pub(crate) epoch: u32,
    pub(crate) user: &'a mut dyn Any,
}

impl ExecuteContext<'_> {
    pub fn pass_name(&self) -> &str {
        &self.node.name
    }

    /// Passes earlier in the timeline whose output this pass consumes.
    pub fn waits(&self) -> &[PassId] {
        self.waits
    }

    /// The frame context handed to [`FrameGraph::execute_with`].
    ///
    /// [`FrameGraph::execute_with`]: crate::render::framegraph::FrameGraph::execute_with
    pub fn user<U: Any>(&mut self) -> Option<&mut U> {
        self.user.downcast_mut::<U>()
    }

    pub fn get<D: ResourceDescription>(&self, resource: Resource<D>) -> Result<&D::Actual, GraphError> {
        let index = self.check_access::<D>(resource.id())?;
        let node = &self.resources[index];
        node.actual::<D>()
            .ok_or_else(|| GraphError::NotRealized(node.name.clone()))
    }

    pub fn get_mut<D: ResourceDescription>(
        &mut self,
        resource: Resource<D>,
    ) -> Result<&mut D::Actual, GraphError> {
        let index = self.check_access::<D>(resource.id())?;
        let node = &mut self.resources[index];
        let name = node.name.clone();
        node.actual_mut::<D>().ok_or(GraphError::NotRealized(name))
    }

    /// Like [`get`](Self::get), but an output that was culled this frame
    /// yields `Ok(None)` instead of [`GraphError::NotRealized`].
    pub fn try_get<D: ResourceDescription>(
        &self,
        resource: Resource<D>,
    ) -> Result<Option<&D::Actual>, GraphError> {
        let index = self.check_access::<D>(resource.id())?;
        Ok(self.resources[index].actual::<D>())
    }

    pub fn is_realized<D: ResourceDescription>(&self, resource: Resource<D>) -> Result<bool, GraphError> {
        let index = self.check_access::<D>(resource.id())?;
        Ok(self.resources[index].is_realized())
    }

    fn check_access<D: ResourceDescription>(&self, id: ResourceId) -> Result<usize, GraphError> {
        if id.epoch() != self.epoch {
            return Err(GraphError::StaleHandle {
                handle_epoch: id.epoch(),
                graph_epoch: self.epoch,
            });
        }
        let node = self
            .resources
            .get(id.index())
            .ok_or(GraphError::UnknownResource(id))?;
        if !self.node.declares(id) {
            return Err(GraphError::UndeclaredAccess {
                pass: self.node.name.clone(),
                resource: node.name.clone(),
            });
        }
        node.check_type::<D>()?;
        Ok(id.index())
    }
}
