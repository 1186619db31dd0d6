mod command;
mod frame;
pub mod framegraph;
pub mod passes;
mod renderer;
mod submit;
mod thread;

pub use command::{Command, CommandList};
pub use frame::FrameContext;
pub use renderer::{FrameRenderer, FrameReport};
pub use submit::submit_frame;
pub use thread::render_thread;
