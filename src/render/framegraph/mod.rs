mod blackboard;
mod builder;
mod config;
mod error;
mod graph;
mod graphviz;
mod pass;
mod resource;
mod stats;
mod sync;

pub use blackboard::Blackboard;
pub use builder::TaskBuilder;
pub use config::{CullingPolicy, FrameGraphConfig};
pub use error::GraphError;
pub use graph::{FrameGraph, Step, StepResources};
pub use pass::{ExecuteContext, FnTask, PassId, RenderTask, TaskHandle};
pub use resource::{Resource, ResourceDescription, ResourceId};
pub use stats::TimelineStats;
pub use sync::WaitList;
