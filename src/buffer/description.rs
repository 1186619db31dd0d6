use std::{cell::RefCell, rc::Rc};

use crate::{
    buffer::{BufferKey, BufferManager, BufferSpec},
    render::framegraph::ResourceDescription,
};

pub type SharedBufferManager = Rc<RefCell<BufferManager>>;

pub struct BufferDescription {
    pub spec: BufferSpec,
    buffers: SharedBufferManager,
}

impl BufferDescription {
    pub fn new(buffers: &SharedBufferManager, spec: BufferSpec) -> Self {
        Self {
            spec,
            buffers: buffers.clone(),
        }
    }
}

impl ResourceDescription for BufferDescription {
    type Actual = BufferKey;

    fn realize(&self) -> anyhow::Result<BufferKey> {
        self.buffers.borrow_mut().create_buffer(self.spec.clone())
    }

    fn derealize(&self, actual: BufferKey) {
        if let Err(e) = self.buffers.borrow_mut().destroy_buffer(actual) {
            log::error!("{:?}", e);
        }
    }

    fn size(&self) -> u64 {
        self.spec.byte_size()
    }
}
