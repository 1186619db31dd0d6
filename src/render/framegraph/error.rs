use std::path::PathBuf;

use thiserror::Error;

use crate::render::framegraph::{pass::PassId, resource::ResourceId};

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("{0} is not registered in this frame graph")]
    UnknownResource(ResourceId),

    #[error("{0} is not registered in this frame graph")]
    UnknownPass(PassId),

    #[error("handle from frame epoch {handle_epoch} used in epoch {graph_epoch}")]
    StaleHandle { handle_epoch: u32, graph_epoch: u32 },

    #[error("resource '{resource}' is not described by a {expected}")]
    TypeMismatch {
        resource: String,
        expected: &'static str,
    },

    #[error("pass '{pass}' accessed resource '{resource}' without declaring it during setup")]
    UndeclaredAccess { pass: String, resource: String },

    #[error("resource '{0}' has no realized object")]
    NotRealized(String),

    #[error("frame graph has registrations that were not compiled")]
    NotCompiled,

    #[error("blackboard has no entry named '{0}'")]
    MissingBlackboardEntry(String),

    #[error("failed to realize resource '{resource}'")]
    Realize {
        resource: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("pass '{pass}' failed to execute")]
    TaskFailed {
        pass: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to export graphviz to {}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
