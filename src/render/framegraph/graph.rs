use std::any::{Any, type_name};

use smallvec::SmallVec;

use crate::render::framegraph::{
    blackboard::Blackboard,
    builder::TaskBuilder,
    config::{CullingPolicy, FrameGraphConfig},
    error::GraphError,
    pass::{ExecuteContext, FnTask, PassId, PassNode, PassSlot, RenderTask, TaskHandle},
    resource::{Resource, ResourceDescription, ResourceId, ResourceNode},
    stats::TimelineStats,
    sync::{WaitList, wait_list},
};

pub type StepResources = SmallVec<[ResourceId; 4]>;

/// One entry of the compiled timeline.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Step {
    pub pass: PassId,
    /// Transient resources realized right before the pass executes.
    pub realize: StepResources,
    /// Transient resources derealized right after the pass executes.
    pub derealize: StepResources,
    pub waits: WaitList,
}

/// Declarative per-frame scheduler for render tasks.
///
/// A frame goes through four phases:
///
/// 1. tasks and retained resources are registered, each task declaring in
///    `setup` what it creates, reads and writes;
/// 2. [`compile`](Self::compile) culls tasks whose outputs nobody consumes
///    and lays out a timeline that realizes each transient resource right
///    before its first use and derealizes it right after its last;
/// 3. [`execute`](Self::execute) walks that timeline;
/// 4. [`clear`](Self::clear) discards everything for the next frame.
///
/// Tasks run in registration order. The graph never sorts them, so callers
/// must register producers before their consumers.
pub struct FrameGraph {
    pub(crate) config: FrameGraphConfig,
    pub(crate) passes: Vec<PassSlot>,
    pub(crate) resources: Vec<ResourceNode>,
    pub(crate) timeline: Vec<Step>,
    pub(crate) live: Vec<bool>,
    blackboard: Blackboard,
    stats: TimelineStats,
    epoch: u32,
    dirty: bool,
}

impl Default for FrameGraph {
    fn default() -> Self {
        Self::with_config(FrameGraphConfig::default())
    }
}

impl FrameGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FrameGraphConfig) -> Self {
        Self {
            config,
            passes: Vec::new(),
            resources: Vec::new(),
            timeline: Vec::new(),
            live: Vec::new(),
            blackboard: Blackboard::default(),
            stats: TimelineStats::default(),
            epoch: 0,
            dirty: false,
        }
    }

    pub fn config(&self) -> FrameGraphConfig {
        self.config
    }

    pub fn set_config(&mut self, config: FrameGraphConfig) {
        self.config = config;
        self.dirty = true;
    }

    /// Registers `task` and runs its `setup` immediately.
    ///
    /// If `setup` fails, every declaration it made is undone and the task is
    /// not registered.
    pub fn add_render_task<T: RenderTask>(
        &mut self,
        name: impl Into<String>,
        mut task: T,
    ) -> Result<TaskHandle<T>, GraphError> {
        let id = PassId::new(self.passes.len(), self.epoch);
        let mut node = PassNode::new(name.into());
        let resource_mark = self.resources.len();

        let setup = {
            let mut builder =
                TaskBuilder::new(id, &mut node, &mut self.resources, &mut self.blackboard);
            task.setup(&mut builder)
        };

        if let Err(e) = setup {
            log::warn!("setup of '{}' failed, rolling back: {}", node.name, e);
            self.roll_back(id, resource_mark);
            return Err(e);
        }

        log::trace!(
            "registered task '{}' (creates={}, reads={}, writes={}, cullImmune={})",
            node.name,
            node.creates.len(),
            node.reads.len(),
            node.writes.len(),
            node.cull_immune,
        );

        self.passes.push(PassSlot {
            node,
            task: Box::new(task),
        });
        self.dirty = true;
        Ok(TaskHandle::new(id))
    }

    /// Registers a task written as two closures over `data`.
    pub fn add_fn_task<T, S, E>(
        &mut self,
        name: impl Into<String>,
        data: T,
        setup: S,
        execute: E,
    ) -> Result<TaskHandle<FnTask<T, S, E>>, GraphError>
    where
        T: 'static,
        S: FnOnce(&mut T, &mut TaskBuilder<'_>) -> Result<(), GraphError> + 'static,
        E: FnMut(&T, &mut ExecuteContext<'_>) -> anyhow::Result<()> + 'static,
    {
        self.add_render_task(name, FnTask::new(data, setup, execute))
    }

    /// Registers an externally owned resource.
    ///
    /// When `actual` is `None` the description is realized immediately.
    /// Retained resources are never derealized by the graph.
    pub fn add_retained_resource<D: ResourceDescription>(
        &mut self,
        name: impl Into<String>,
        description: D,
        actual: Option<D::Actual>,
    ) -> Result<Resource<D>, GraphError> {
        let name = name.into();
        let actual = match actual {
            Some(actual) => actual,
            None => description
                .realize()
                .map_err(|source| GraphError::Realize {
                    resource: name.clone(),
                    source,
                })?,
        };

        let id = ResourceId::new(self.resources.len(), self.epoch);
        log::trace!("registered retained resource '{}'", name);
        self.resources
            .push(ResourceNode::retained(name, description, actual));
        self.dirty = true;
        Ok(Resource::new(id))
    }

    pub fn compile(&mut self) {
        let _span = tracing::debug_span!("framegraph_compile", passes = self.passes.len()).entered();

        self.count_references();
        self.cull();
        self.mark_live_resources();
        self.build_timeline();

        self.stats = TimelineStats::measure(self);
        self.dirty = false;
        log::debug!("compiled frame graph: {}", self.stats);
    }

    pub fn execute(&mut self) -> Result<(), GraphError> {
        self.execute_with(&mut ())
    }

    /// Runs the compiled timeline, handing `user` to every task.
    ///
    /// A realize failure or task error abandons the rest of the frame. Any
    /// transient resource still realized at that point is derealized before
    /// the error is returned.
    pub fn execute_with(&mut self, user: &mut dyn Any) -> Result<(), GraphError> {
        if self.dirty {
            return Err(GraphError::NotCompiled);
        }

        let _span =
            tracing::debug_span!("framegraph_execute", steps = self.timeline.len()).entered();

        for index in 0..self.timeline.len() {
            if let Err(e) = self.run_step(index, user) {
                log::error!("frame aborted at step {}: {}", index, e);
                self.release_transients();
                return Err(e);
            }
        }
        Ok(())
    }

    /// Drops every task, resource and timeline step of the current frame.
    ///
    /// Handles from the cleared frame become stale.
    pub fn clear(&mut self) {
        self.release_transients();
        self.passes.clear();
        self.resources.clear();
        self.timeline.clear();
        self.live.clear();
        self.blackboard.clear();
        self.stats = TimelineStats::default();
        self.epoch = self.epoch.wrapping_add(1);
        self.dirty = false;
    }

    pub fn timeline(&self) -> &[Step] {
        &self.timeline
    }

    pub fn stats(&self) -> TimelineStats {
        self.stats
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn is_compiled(&self) -> bool {
        !self.dirty
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn pass_ids(&self) -> impl Iterator<Item = PassId> + '_ {
        (0..self.passes.len()).map(|index| PassId::new(index, self.epoch))
    }

    pub fn resource_ids(&self) -> impl Iterator<Item = ResourceId> + '_ {
        (0..self.resources.len()).map(|index| ResourceId::new(index, self.epoch))
    }

    pub fn pass_name(&self, id: PassId) -> Result<&str, GraphError> {
        Ok(&self.pass_node(id)?.name)
    }

    pub fn pass_ref_count(&self, id: PassId) -> Result<usize, GraphError> {
        Ok(self.pass_node(id)?.ref_count)
    }

    pub fn is_cull_immune(&self, id: PassId) -> Result<bool, GraphError> {
        Ok(self.pass_node(id)?.cull_immune)
    }

    /// Meaningful after [`compile`](Self::compile).
    pub fn is_culled(&self, id: PassId) -> Result<bool, GraphError> {
        Ok(self.pass_node(id)?.is_culled())
    }

    pub fn resource_name(&self, id: ResourceId) -> Result<&str, GraphError> {
        Ok(&self.resource_node(id)?.name)
    }

    pub fn resource_uid(&self, id: ResourceId) -> Result<u64, GraphError> {
        Ok(self.resource_node(id)?.uid)
    }

    pub fn resource_ref_count(&self, id: ResourceId) -> Result<usize, GraphError> {
        Ok(self.resource_node(id)?.ref_count)
    }

    pub fn creator(&self, id: ResourceId) -> Result<Option<PassId>, GraphError> {
        Ok(self.resource_node(id)?.creator)
    }

    pub fn readers(&self, id: ResourceId) -> Result<&[PassId], GraphError> {
        Ok(&self.resource_node(id)?.readers)
    }

    pub fn writers(&self, id: ResourceId) -> Result<&[PassId], GraphError> {
        Ok(&self.resource_node(id)?.writers)
    }

    pub fn is_transient(&self, id: ResourceId) -> Result<bool, GraphError> {
        Ok(self.resource_node(id)?.is_transient())
    }

    pub fn is_realized(&self, id: ResourceId) -> Result<bool, GraphError> {
        Ok(self.resource_node(id)?.is_realized())
    }

    pub fn get<D: ResourceDescription>(&self, resource: Resource<D>) -> Result<&D::Actual, GraphError> {
        let node = self.resource_node(resource.id())?;
        node.check_type::<D>()?;
        node.actual::<D>()
            .ok_or_else(|| GraphError::NotRealized(node.name.clone()))
    }

    pub fn description<D: ResourceDescription>(
        &self,
        resource: Resource<D>,
    ) -> Result<&D, GraphError> {
        let node = self.resource_node(resource.id())?;
        node.check_type::<D>()?;
        node.description::<D>().ok_or_else(|| GraphError::TypeMismatch {
            resource: node.name.clone(),
            expected: type_name::<D>(),
        })
    }

    pub fn task<T: RenderTask>(&self, handle: TaskHandle<T>) -> Result<&T, GraphError> {
        self.pass_slot(handle.id())?
            .task
            .as_any()
            .downcast_ref::<T>()
            .ok_or(GraphError::UnknownPass(handle.id()))
    }

    pub fn task_mut<T: RenderTask>(&mut self, handle: TaskHandle<T>) -> Result<&mut T, GraphError> {
        let index = self.check_pass(handle.id())?;
        self.passes[index]
            .task
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or(GraphError::UnknownPass(handle.id()))
    }

    fn check_pass(&self, id: PassId) -> Result<usize, GraphError> {
        if id.epoch() != self.epoch {
            return Err(GraphError::StaleHandle {
                handle_epoch: id.epoch(),
                graph_epoch: self.epoch,
            });
        }
        if id.index() >= self.passes.len() {
            return Err(GraphError::UnknownPass(id));
        }
        Ok(id.index())
    }

    fn pass_slot(&self, id: PassId) -> Result<&PassSlot, GraphError> {
        let index = self.check_pass(id)?;
        Ok(&self.passes[index])
    }

    fn pass_node(&self, id: PassId) -> Result<&PassNode, GraphError> {
        Ok(&self.pass_slot(id)?.node)
    }

    fn resource_node(&self, id: ResourceId) -> Result<&ResourceNode, GraphError> {
        if id.epoch() != self.epoch {
            return Err(GraphError::StaleHandle {
                handle_epoch: id.epoch(),
                graph_epoch: self.epoch,
            });
        }
        self.resources
            .get(id.index())
            .ok_or(GraphError::UnknownResource(id))
    }

    fn roll_back(&mut self, pass: PassId, resource_mark: usize) {
        self.resources.truncate(resource_mark);
        for resource in &mut self.resources {
            resource.readers.retain(|reader| *reader != pass);
            resource.writers.retain(|writer| *writer != pass);
        }
        self.blackboard
            .retain_ids(|id| id.index() < resource_mark);
    }

    fn count_references(&mut self) {
        for slot in &mut self.passes {
            slot.node.ref_count = slot.node.creates.len() + slot.node.writes.len();
        }
        for resource in &mut self.resources {
            resource.ref_count = resource.readers.len();
        }
    }

    fn is_cull_root(&self, resource: &ResourceNode) -> bool {
        resource.is_transient() || self.config.culling == CullingPolicy::UnreadRetainedRoots
    }

    /// Reverse flood fill from unreferenced resources.
    fn cull(&mut self) {
        let mut unreferenced: Vec<usize> = self
            .resources
            .iter()
            .enumerate()
            .filter(|(_, resource)| resource.ref_count == 0 && self.is_cull_root(resource))
            .map(|(index, _)| index)
            .collect();

        while let Some(index) = unreferenced.pop() {
            let resource = &self.resources[index];
            let producers: SmallVec<[PassId; 4]> = resource
                .creator
                .iter()
                .chain(resource.writers.iter())
                .copied()
                .collect();

            for producer in producers {
                self.release_producer(producer.index(), &mut unreferenced);
            }
        }
    }

    /// Drops one reference from a producing pass. When the last one goes and
    /// the pass is not cull-immune, the pass stops referencing its inputs.
    fn release_producer(&mut self, index: usize, unreferenced: &mut Vec<usize>) {
        let seed_retained = self.config.culling == CullingPolicy::UnreadRetainedRoots;
        let node = &mut self.passes[index].node;
        if node.ref_count == 0 {
            return;
        }
        node.ref_count -= 1;
        if node.ref_count > 0 || node.cull_immune {
            return;
        }

        log::trace!("culled task '{}'", node.name);
        for read in &node.reads {
            let resource = &mut self.resources[read.index()];
            if resource.ref_count == 0 {
                continue;
            }
            resource.ref_count -= 1;
            if resource.ref_count == 0 && (resource.is_transient() || seed_retained) {
                unreferenced.push(read.index());
            }
        }
    }

    /// A transient resource is materialized when a surviving pass reads it,
    /// or when its creator is cull-immune.
    fn mark_live_resources(&mut self) {
        let passes = &self.passes;
        self.live = self
            .resources
            .iter()
            .map(|resource| match resource.creator {
                Some(creator) => {
                    let creator = &passes[creator.index()].node;
                    !creator.is_culled() && (resource.ref_count > 0 || creator.cull_immune)
                }
                None => false,
            })
            .collect();
    }

    /// Index of the last surviving pass that touches each live resource.
    fn last_uses(&self) -> Vec<Option<usize>> {
        self.resources
            .iter()
            .zip(&self.live)
            .map(|(resource, &live)| {
                if !live {
                    return None;
                }
                resource
                    .users()
                    .filter(|user| !self.passes[user.index()].node.is_culled())
                    .map(PassId::index)
                    .max()
            })
            .collect()
    }

    fn build_timeline(&mut self) {
        let last_uses = self.last_uses();
        self.timeline.clear();

        for (index, slot) in self.passes.iter().enumerate() {
            let node = &slot.node;
            if node.is_culled() {
                continue;
            }

            let realize: StepResources = node
                .creates
                .iter()
                .copied()
                .filter(|id| self.live[id.index()])
                .collect();

            let mut derealize = StepResources::new();
            let touched = node.creates.iter().chain(&node.reads).chain(&node.writes);
            for &id in touched {
                if last_uses[id.index()] == Some(index) && !derealize.contains(&id) {
                    derealize.push(id);
                }
            }

            let (waits, late) = wait_list(index, node, &self.passes, &self.resources);
            if self.config.warn_on_out_of_order && !late.is_empty() {
                log::warn!(
                    "task '{}' reads output of {} task(s) registered after it; tasks run in registration order",
                    node.name,
                    late.len()
                );
            }

            self.timeline.push(Step {
                pass: PassId::new(index, self.epoch),
                realize,
                derealize,
                waits,
            });
        }
    }

    fn run_step(&mut self, index: usize, user: &mut dyn Any) -> Result<(), GraphError> {
        let step = &self.timeline[index];

        for id in &step.realize {
            self.resources[id.index()].realize()?;
        }

        let slot = &mut self.passes[step.pass.index()];
        let _span = tracing::trace_span!("framegraph_task", task = %slot.node.name).entered();
        log::trace!("execute '{}'", slot.node.name);

        let mut ctx = ExecuteContext {
            node: &slot.node,
            resources: &mut self.resources,
            waits: &step.waits,
            epoch: self.epoch,
            user,
        };
        slot.task
            .execute(&mut ctx)
            .map_err(|source| GraphError::TaskFailed {
                pass: slot.node.name.clone(),
                source,
            })?;

        for id in &step.derealize {
            self.resources[id.index()].derealize();
        }
        Ok(())
    }

    fn release_transients(&mut self) {
        for resource in &mut self.resources {
            if resource.is_transient() && resource.is_realized() {
                resource.derealize();
            }
        }
    }
}
