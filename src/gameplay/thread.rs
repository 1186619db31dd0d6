use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

use crate::{
    messages::{EngineControl, FrameComplete, FrameRequest, ShutdownPhase},
    render::passes::FrameSettings,
};

/// Drives the frame loop: one request out, one completion back.
pub fn gameplay_thread(
    frames: u64,
    settings: FrameSettings,
    request_tx: Sender<FrameRequest>,
    complete_rx: Receiver<FrameComplete>,
    control: Arc<EngineControl>,
) -> anyhow::Result<()> {
    for index in 0..frames {
        if control.phase() != ShutdownPhase::Running {
            break;
        }

        if request_tx.send(FrameRequest { index, settings }).is_err() {
            break;
        }

        match complete_rx.recv() {
            Ok(msg) => {
                log::debug!(
                    "Gameplay: frame {} complete ({} passes, {} commands) {}",
                    msg.index,
                    msg.passes.len(),
                    msg.commands,
                    msg.stats
                );
            }
            Err(_) => break,
        }
    }

    log::debug!("Gameplay Thread shutting down");

    Ok(())
}
