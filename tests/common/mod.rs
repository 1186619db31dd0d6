#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc};

use arbor::render::framegraph::{
    ExecuteContext, FrameGraph, FrameGraphConfig, GraphError, PassId, RenderTask, Resource,
    ResourceDescription, ResourceId, TaskBuilder,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Realize(String),
    Derealize(String),
    Execute(String),
}

pub type Events = Rc<RefCell<Vec<Event>>>;

/// Records every realize and derealize into a shared event log.
pub struct Tracked {
    name: String,
    events: Events,
    size: u64,
    fail: bool,
}

impl ResourceDescription for Tracked {
    type Actual = String;

    fn realize(&self) -> anyhow::Result<String> {
        if self.fail {
            anyhow::bail!("{} refused to realize", self.name);
        }
        self.events
            .borrow_mut()
            .push(Event::Realize(self.name.clone()));
        Ok(self.name.clone())
    }

    fn derealize(&self, actual: String) {
        self.events.borrow_mut().push(Event::Derealize(actual));
    }

    fn size(&self) -> u64 {
        self.size
    }
}

/// A task whose declarations are plain data.
pub struct TestPass {
    events: Events,
    creates: Vec<(String, u64, bool)>,
    reads: Vec<Resource<Tracked>>,
    writes: Vec<Resource<Tracked>>,
    cull_immune: bool,
    fail_execute: bool,
    pub created: Vec<Resource<Tracked>>,
}

impl TestPass {
    pub fn create(mut self, name: &str) -> Self {
        self.creates.push((name.to_owned(), 0, false));
        self
    }

    pub fn create_sized(mut self, name: &str, size: u64) -> Self {
        self.creates.push((name.to_owned(), size, false));
        self
    }

    pub fn create_failing(mut self, name: &str) -> Self {
        self.creates.push((name.to_owned(), 0, true));
        self
    }

    pub fn read(mut self, resource: Resource<Tracked>) -> Self {
        self.reads.push(resource);
        self
    }

    pub fn write(mut self, resource: Resource<Tracked>) -> Self {
        self.writes.push(resource);
        self
    }

    pub fn cull_immune(mut self) -> Self {
        self.cull_immune = true;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_execute = true;
        self
    }
}

impl RenderTask for TestPass {
    fn setup(&mut self, builder: &mut TaskBuilder<'_>) -> Result<(), GraphError> {
        for (name, size, fail) in &self.creates {
            let description = Tracked {
                name: name.clone(),
                events: self.events.clone(),
                size: *size,
                fail: *fail,
            };
            self.created.push(builder.create(name.clone(), description));
        }
        for &resource in &self.reads {
            builder.read(resource)?;
        }
        for &resource in &self.writes {
            builder.write(resource)?;
        }
        builder.set_cull_immune(self.cull_immune);
        Ok(())
    }

    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> anyhow::Result<()> {
        self.events
            .borrow_mut()
            .push(Event::Execute(ctx.pass_name().to_owned()));
        if self.fail_execute {
            anyhow::bail!("{} failed on purpose", ctx.pass_name());
        }
        for &resource in &self.reads {
            ctx.get(resource)?;
        }
        Ok(())
    }
}

pub struct Harness {
    pub graph: FrameGraph,
    pub events: Events,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(FrameGraphConfig::default())
    }

    pub fn with_config(config: FrameGraphConfig) -> Self {
        init_logging();
        Self {
            graph: FrameGraph::with_config(config),
            events: Events::default(),
        }
    }

    pub fn pass(&self) -> TestPass {
        TestPass {
            events: self.events.clone(),
            creates: Vec::new(),
            reads: Vec::new(),
            writes: Vec::new(),
            cull_immune: false,
            fail_execute: false,
            created: Vec::new(),
        }
    }

    pub fn tracked(&self, name: &str) -> Tracked {
        Tracked {
            name: name.to_owned(),
            events: self.events.clone(),
            size: 0,
            fail: false,
        }
    }

    pub fn retained(&mut self, name: &str) -> Resource<Tracked> {
        let description = self.tracked(name);
        self.graph
            .add_retained_resource(name, description, Some(name.to_owned()))
            .unwrap()
    }

    /// Registers `pass` and returns its id and the resources it created.
    pub fn add(&mut self, name: &str, pass: TestPass) -> (PassId, Vec<Resource<Tracked>>) {
        let handle = self.graph.add_render_task(name, pass).unwrap();
        let created = self.graph.task(handle).unwrap().created.clone();
        (handle.id(), created)
    }

    pub fn step_names(&self) -> Vec<String> {
        self.graph
            .timeline()
            .iter()
            .map(|step| self.graph.pass_name(step.pass).unwrap().to_owned())
            .collect()
    }

    pub fn names(&self, ids: &[ResourceId]) -> Vec<String> {
        ids.iter()
            .map(|&id| self.graph.resource_name(id).unwrap().to_owned())
            .collect()
    }

    pub fn take_events(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

pub fn realize(name: &str) -> Event {
    Event::Realize(name.to_owned())
}

pub fn derealize(name: &str) -> Event {
    Event::Derealize(name.to_owned())
}

pub fn execute(name: &str) -> Event {
    Event::Execute(name.to_owned())
}
