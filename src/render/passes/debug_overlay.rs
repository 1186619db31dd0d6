use anyhow::Context;

use crate::{
    image::{Extent2D, Format, ImageSpec, SharedImageManager, TextureDescription},
    render::{
        command::Command,
        framegraph::{ExecuteContext, GraphError, RenderTask, Resource, TaskBuilder},
        passes::{FULLSCREEN_TRIANGLE, names, record},
    },
};

/// Visualizes gbuffer normals. Only runs when composition consumes it.
pub struct DebugOverlayPass {
    images: SharedImageManager,
    extent: Extent2D,
    normal: Option<Resource<TextureDescription>>,
    overlay: Option<Resource<TextureDescription>>,
}

impl DebugOverlayPass {
    pub fn new(images: &SharedImageManager, extent: Extent2D) -> Self {
        Self {
            images: images.clone(),
            extent,
            normal: None,
            overlay: None,
        }
    }
}

impl RenderTask for DebugOverlayPass {
    fn setup(&mut self, builder: &mut TaskBuilder<'_>) -> Result<(), GraphError> {
        let normal = builder.lookup::<TextureDescription>(names::NORMAL)?;
        self.normal = Some(builder.read(normal)?);

        let spec = ImageSpec::default()
            .format(Format::Rgba8Unorm)
            .extent(self.extent)
            .debug_name(names::OVERLAY);
        let overlay = builder.create(names::OVERLAY, TextureDescription::new(&self.images, spec));
        builder.blackboard_mut().insert(names::OVERLAY, overlay);
        self.overlay = Some(overlay);
        Ok(())
    }

    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> anyhow::Result<()> {
        let normal = *ctx.get(self.normal.context("debug_overlay setup did not run")?)?;
        let overlay = *ctx.get(self.overlay.context("debug_overlay setup did not run")?)?;

        record(ctx, |frame| {
            frame.commands.record(Command::Sample(normal))?;
            frame.commands.record(Command::Draw {
                target: overlay,
                vertices: FULLSCREEN_TRIANGLE,
                instances: 1,
            })
        })
    }
}
