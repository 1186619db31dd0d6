use std::{cell::RefCell, path::Path, rc::Rc};

use anyhow::Context;

use crate::{
    buffer::{BufferManager, SharedBufferManager},
    image::{Extent2D, Format, ImageKey, ImageManager, ImageSpec, SharedImageManager, TextureDescription},
    render::{
        FrameContext,
        command::Command,
        framegraph::{FrameGraph, FrameGraphConfig, TimelineStats},
        passes::{FrameSettings, build_frame},
        submit::submit_frame,
    },
};

#[derive(Debug)]
pub struct FrameReport {
    pub index: u64,
    pub stats: TimelineStats,
    pub commands: Vec<Command>,
}

impl FrameReport {
    pub fn pass_names(&self) -> Vec<String> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                Command::BeginPass { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Rebuilds, compiles and executes the frame graph once per frame.
///
/// Owns the backbuffer, which enters each frame's graph as a retained
/// resource.
pub struct FrameRenderer {
    graph: FrameGraph,
    images: SharedImageManager,
    buffers: SharedBufferManager,
    backbuffer: Option<ImageKey>,
    extent: Extent2D,
}

impl FrameRenderer {
    pub fn new(config: FrameGraphConfig) -> Self {
        Self::with_managers(config, ImageManager::default(), BufferManager::default())
    }

    pub fn with_managers(
        config: FrameGraphConfig,
        images: ImageManager,
        buffers: BufferManager,
    ) -> Self {
        Self {
            graph: FrameGraph::with_config(config),
            images: Rc::new(RefCell::new(images)),
            buffers: Rc::new(RefCell::new(buffers)),
            backbuffer: None,
            extent: Extent2D::default(),
        }
    }

    pub fn graph(&self) -> &FrameGraph {
        &self.graph
    }

    pub fn images(&self) -> &SharedImageManager {
        &self.images
    }

    pub fn buffers(&self) -> &SharedBufferManager {
        &self.buffers
    }

    pub fn render(&mut self, index: u64, settings: &FrameSettings) -> anyhow::Result<FrameReport> {
        let _span = tracing::debug_span!("render_frame", frame = index).entered();

        let backbuffer_key = self.acquire_backbuffer(settings.extent)?;

        self.graph.clear();
        let backbuffer = self
            .graph
            .add_retained_resource(
                "backbuffer",
                TextureDescription::new(&self.images, backbuffer_spec(settings.extent)),
                Some(backbuffer_key),
            )
            .context("failed to register backbuffer")?;

        build_frame(&mut self.graph, settings, &self.images, &self.buffers, backbuffer)
            .context("failed to build frame graph")?;
        self.graph.compile();

        let mut frame = FrameContext::new(index, settings.extent, &self.images, &self.buffers);
        self.graph
            .execute_with(&mut frame)
            .with_context(|| format!("failed to execute frame {}", index))?;
        let commands = submit_frame(&mut frame).context("failed to submit frame")?;

        Ok(FrameReport {
            index,
            stats: self.graph.stats(),
            commands,
        })
    }

    pub fn export_graphviz(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        self.graph
            .export_graphviz(path)
            .context("failed to export frame graph")
    }

    /// Recreates the backbuffer when the requested extent changes, the way a
    /// swapchain is recreated on resize.
    fn acquire_backbuffer(&mut self, extent: Extent2D) -> anyhow::Result<ImageKey> {
        if let Some(key) = self.backbuffer
            && self.extent == extent
        {
            return Ok(key);
        }

        self.release_backbuffer()?;
        let key = self
            .images
            .borrow_mut()
            .create_image(backbuffer_spec(extent))
            .context("failed to create backbuffer")?;
        log::debug!("created backbuffer {}", extent);
        self.backbuffer = Some(key);
        self.extent = extent;
        Ok(key)
    }

    fn release_backbuffer(&mut self) -> anyhow::Result<()> {
        if let Some(key) = self.backbuffer.take() {
            self.images.borrow_mut().destroy_image(key)?;
        }
        Ok(())
    }

    pub fn destroy(&mut self) -> anyhow::Result<()> {
        self.graph.clear();
        self.release_backbuffer()?;

        let images = self.images.borrow();
        let buffers = self.buffers.borrow();
        if !images.is_empty() || !buffers.is_empty() {
            log::warn!(
                "renderer destroyed with {} images and {} buffers still alive",
                images.len(),
                buffers.len()
            );
        }
        Ok(())
    }
}

fn backbuffer_spec(extent: Extent2D) -> ImageSpec {
    ImageSpec::default()
        .format(Format::Bgra8Srgb)
        .extent(extent)
        .debug_name("backbuffer")
}
