use anyhow::Context;
use slotmap::SlotMap;

use crate::buffer::{keys::BufferKey, spec::BufferSpec};

/// A host-side stand-in for a device buffer allocation.
pub struct Buffer {
    pub spec: BufferSpec,
    pub data: Vec<u8>,
}

#[derive(Default)]
pub struct BufferManager {
    buffers: SlotMap<BufferKey, Buffer>,
    live_bytes: u64,
}

impl BufferManager {
    #[inline]
    pub fn buffer(&self, key: BufferKey) -> Option<&Buffer> {
        self.buffers.get(key)
    }

    #[inline]
    pub fn buffer_mut(&mut self, key: BufferKey) -> Option<&mut Buffer> {
        self.buffers.get_mut(key)
    }

    pub fn create_buffer(&mut self, spec: BufferSpec) -> anyhow::Result<BufferKey> {
        let size = spec.byte_size();
        if size == 0 {
            anyhow::bail!("cannot create zero-sized {}", spec);
        }
        let len = usize::try_from(size).context("buffer size exceeds address space")?;

        log::trace!("create buffer {}", spec);
        self.live_bytes += size;
        Ok(self.buffers.insert(Buffer {
            spec,
            data: vec![0; len],
        }))
    }

    pub fn destroy_buffer(&mut self, key: BufferKey) -> anyhow::Result<()> {
        let buffer = self
            .buffers
            .remove(key)
            .context("destroy_buffer: invalid BufferKey")?;
        log::trace!("destroy buffer {}", buffer.spec);
        self.live_bytes -= buffer.spec.byte_size();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn live_bytes(&self) -> u64 {
        self.live_bytes
    }
}
