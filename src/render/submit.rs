use crate::render::{command::Command, frame::FrameContext};

/// Hands the recorded commands of `frame` to the (mock) queue.
pub fn submit_frame(frame: &mut FrameContext) -> anyhow::Result<Vec<Command>> {
    let _span = tracing::debug_span!("submit_frame", frame = frame.index).entered();

    if frame.commands.is_recording() {
        anyhow::bail!("frame {} submitted with a pass still recording", frame.index);
    }

    let commands = frame.commands.take();
    log::trace!("submitted frame {} ({} commands)", frame.index, commands.len());
    Ok(commands)
}
