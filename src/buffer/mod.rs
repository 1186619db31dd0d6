mod description;
mod keys;
mod manager;
mod spec;

pub use description::{BufferDescription, SharedBufferManager};
pub use keys::*;
pub use manager::{Buffer, BufferManager};
pub use spec::{BufferSpec, BufferUsage};
