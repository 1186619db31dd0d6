use crate::render::framegraph::{
    blackboard::Blackboard,
    error::GraphError,
    pass::{PassId, PassNode},
    resource::{Resource, ResourceDescription, ResourceId, ResourceNode},
};

/// Records one task's resource declarations into the graph.
///
/// A builder only exists for the duration of a [`RenderTask::setup`] call.
///
/// [`RenderTask::setup`]: crate::render::framegraph::RenderTask::setup
pub struct TaskBuilder<'a> {
    pass: PassId,
    node: &'a mut PassNode,
    resources: &'a mut Vec<ResourceNode>,
    blackboard: &'a mut Blackboard,
    epoch: u32,
}

impl<'a> TaskBuilder<'a> {
    pub(crate) fn new(
        pass: PassId,
        node: &'a mut PassNode,
        resources: &'a mut Vec<ResourceNode>,
        blackboard: &'a mut Blackboard,
    ) -> Self {
        Self {
            pass,
            node,
            resources,
            blackboard,
            epoch: pass.epoch(),
        }
    }

    pub fn pass(&self) -> PassId {
        self.pass
    }

    pub fn pass_name(&self) -> &str {
        &self.node.name
    }

    /// Registers a transient resource owned by this task.
    pub fn create<D: ResourceDescription>(
        &mut self,
        name: impl Into<String>,
        description: D,
    ) -> Resource<D> {
        let id = ResourceId::new(self.resources.len(), self.epoch);
        self.resources
            .push(ResourceNode::transient(name.into(), self.pass, description));
        self.node.creates.push(id);
        Resource::new(id)
    }

    pub fn read<D: ResourceDescription>(
        &mut self,
        resource: Resource<D>,
    ) -> Result<Resource<D>, GraphError> {
        let pass = self.pass;
        self.resolve::<D>(resource.id())?.readers.push(pass);
        self.node.reads.push(resource.id());
        Ok(resource)
    }

    pub fn write<D: ResourceDescription>(
        &mut self,
        resource: Resource<D>,
    ) -> Result<Resource<D>, GraphError> {
        let pass = self.pass;
        self.resolve::<D>(resource.id())?.writers.push(pass);
        self.node.writes.push(resource.id());
        Ok(resource)
    }

    /// A cull-immune task runs even when nothing consumes its outputs.
    pub fn set_cull_immune(&mut self, cull_immune: bool) {
        self.node.cull_immune = cull_immune;
    }

    pub fn lookup<D: ResourceDescription>(&self, name: &str) -> Result<Resource<D>, GraphError> {
        self.blackboard.get(name)
    }

    pub fn blackboard(&self) -> &Blackboard {
        self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        self.blackboard
    }

    fn resolve<D: ResourceDescription>(
        &mut self,
        id: ResourceId,
    ) -> Result<&mut ResourceNode, GraphError> {
        if id.epoch() != self.epoch {
            return Err(GraphError::StaleHandle {
                handle_epoch: id.epoch(),
                graph_epoch: self.epoch,
            });
        }
        let node = self
            .resources
            .get_mut(id.index())
            .ok_or(GraphError::UnknownResource(id))?;
        node.check_type::<D>()?;
        Ok(node)
    }
}
