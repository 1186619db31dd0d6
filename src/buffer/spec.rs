use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferUsage {
    #[default]
    Storage,
    Uniform,
    Indirect,
    Transfer,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BufferSpec {
    pub usage: BufferUsage,
    pub item_count: u64,
    pub item_stride: u64,
    pub debug_name: Option<String>,
}

impl BufferSpec {
    pub fn new(usage: BufferUsage, item_count: u64, item_stride: u64) -> Self {
        Self {
            usage,
            item_count,
            item_stride,
            debug_name: None,
        }
    }

    pub fn debug_name(mut self, debug_name: impl AsRef<str>) -> Self {
        self.debug_name = Some(debug_name.as_ref().to_owned());
        self
    }

    pub fn byte_size(&self) -> u64 {
        self.item_count * self.item_stride
    }
}

impl fmt::Display for BufferSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BufferSpec(usage={:?}, items={}, stride={}, debugName={})",
            self.usage,
            self.item_count,
            self.item_stride,
            self.debug_name.as_deref().unwrap_or("<none>")
        )
    }
}
