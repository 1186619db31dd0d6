use crate::{
    buffer::SharedBufferManager,
    image::{Extent2D, SharedImageManager},
    render::command::CommandList,
};

/// Per-frame state handed to every task through
/// [`ExecuteContext::user`](crate::render::framegraph::ExecuteContext::user).
pub struct FrameContext {
    pub index: u64,
    pub extent: Extent2D,
    pub commands: CommandList,
    pub images: SharedImageManager,
    pub buffers: SharedBufferManager,
}

impl FrameContext {
    pub fn new(
        index: u64,
        extent: Extent2D,
        images: &SharedImageManager,
        buffers: &SharedBufferManager,
    ) -> Self {
        Self {
            index,
            extent,
            commands: CommandList::default(),
            images: images.clone(),
            buffers: buffers.clone(),
        }
    }
}
