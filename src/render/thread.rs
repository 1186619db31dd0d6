use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
#[cfg(feature = "tracing")]
use tracy_client::frame_mark;
use tracy_client::{Client, plot_name};

use crate::{
    messages::{EngineControl, FrameComplete, FrameRequest, ShutdownPhase},
    render::{FrameRenderer, framegraph::FrameGraphConfig},
};

const REQUEST_POLL: Duration = Duration::from_millis(50);

pub fn render_thread(
    config: FrameGraphConfig,
    graphviz_path: Option<PathBuf>,
    request_rx: Receiver<FrameRequest>,
    complete_tx: Sender<FrameComplete>,
    control: Arc<EngineControl>,
) -> anyhow::Result<()> {
    let mut renderer = FrameRenderer::new(config);
    log::debug!("Render thread started with {}", config);

    while control.phase() != ShutdownPhase::StopRender {
        let request = match request_rx.recv_timeout(REQUEST_POLL) {
            Ok(request) => request,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let report = renderer
            .render(request.index, &request.settings)
            .with_context(|| format!("render thread failed on frame {}", request.index))?;

        if let Some(client) = Client::running() {
            client.plot(
                plot_name!("surviving passes"),
                report.stats.surviving_passes as f64,
            );
            client.plot(
                plot_name!("peak transient bytes"),
                report.stats.peak_transient_bytes as f64,
            );
        }

        let complete = FrameComplete {
            index: report.index,
            stats: report.stats,
            passes: report.pass_names(),
            commands: report.commands.len(),
        };
        if complete_tx.send(complete).is_err() {
            break;
        }

        #[cfg(feature = "tracing")]
        frame_mark();
    }

    if let Some(path) = graphviz_path {
        renderer.export_graphviz(&path)?;
        log::info!("wrote last frame graph to {}", path.display());
    }

    renderer
        .destroy()
        .context("failed to destroy renderer")?;

    log::debug!("Render thread shutting down");
    Ok(())
}
