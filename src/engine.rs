use std::sync::{Arc, mpsc};
use std::thread;

use crossbeam_channel::bounded;

use crate::config::AppConfig;
use crate::gameplay::gameplay_thread;
use crate::messages::{EngineControl, ShutdownPhase};
use crate::render::render_thread;

/// Frames the gameplay thread may run ahead of the render thread.
const FRAMES_IN_FLIGHT: usize = 2;

pub struct Engine {
    control: Arc<EngineControl>,
    render: Option<thread::JoinHandle<()>>,
    gameplay: Option<thread::JoinHandle<()>>,
    watchdog: Option<thread::JoinHandle<usize>>,
}

impl Engine {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let (request_tx, request_rx) = bounded(FRAMES_IN_FLIGHT);
        let (complete_tx, complete_rx) = bounded(FRAMES_IN_FLIGHT);

        let control = Arc::new(EngineControl::new());

        let (error_tx, error_rx) = mpsc::channel::<(String, anyhow::Error)>();

        let render_handle = {
            let control = control.clone();
            let error_tx = error_tx.clone();
            let framegraph_config = config.framegraph_config();
            let graphviz_path = config.graphviz.clone();
            thread::Builder::new()
                .name("render".to_string())
                .spawn(move || {
                    if let Err(e) = render_thread(
                        framegraph_config,
                        graphviz_path,
                        request_rx,
                        complete_tx,
                        control,
                    ) {
                        let _ = error_tx.send(("render".to_string(), e));
                    }
                })?
        };

        let gameplay_handle = {
            let control = control.clone();
            let error_tx = error_tx.clone();
            let frames = config.frames;
            let settings = config.frame_settings();
            thread::Builder::new()
                .name("gameplay".to_string())
                .spawn(move || {
                    if let Err(e) =
                        gameplay_thread(frames, settings, request_tx, complete_rx, control)
                    {
                        let _ = error_tx.send(("gameplay".to_string(), e));
                    }
                })?
        };

        // The watchdog exits once every thread has dropped its sender.
        drop(error_tx);

        let watchdog = thread::Builder::new()
            .name("thread_watchdog".to_string())
            .spawn(move || {
                let mut failures = 0;
                for (name, e) in error_rx {
                    log::error!("Thread {} failed: {:?}", name, e);
                    failures += 1;
                }
                failures
            })?;

        Ok(Self {
            control,
            render: Some(render_handle),
            gameplay: Some(gameplay_handle),
            watchdog: Some(watchdog),
        })
    }

    /// Blocks until the gameplay thread has issued all of its frames.
    pub fn wait(&mut self) {
        if let Some(handle) = self.gameplay.take() {
            handle.join().ok();
        }
    }

    pub fn shutdown(&mut self) -> anyhow::Result<()> {
        self.control.set_phase(ShutdownPhase::StopGameplay);
        if let Some(handle) = self.gameplay.take() {
            handle.join().ok();
        }

        self.control.set_phase(ShutdownPhase::StopRender);
        if let Some(handle) = self.render.take() {
            handle.join().ok();
        }

        let failures = match self.watchdog.take() {
            Some(handle) => handle.join().unwrap_or(1),
            None => 0,
        };
        if failures > 0 {
            anyhow::bail!("{} engine thread(s) failed", failures);
        }
        Ok(())
    }
}
