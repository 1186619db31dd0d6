use anyhow::Context;

use crate::{
    image::TextureDescription,
    render::{
        command::Command,
        framegraph::{ExecuteContext, GraphError, RenderTask, Resource, TaskBuilder},
        passes::{FULLSCREEN_TRIANGLE, names, record},
    },
};

/// Tonemaps the lit scene into the backbuffer, blending in the debug
/// overlay when enabled.
pub struct CompositionPass {
    debug_overlay: bool,
    hdr: Option<Resource<TextureDescription>>,
    overlay: Option<Resource<TextureDescription>>,
    backbuffer: Option<Resource<TextureDescription>>,
}

impl CompositionPass {
    pub fn new(debug_overlay: bool) -> Self {
        Self {
            debug_overlay,
            hdr: None,
            overlay: None,
            backbuffer: None,
        }
    }
}

impl RenderTask for CompositionPass {
    fn setup(&mut self, builder: &mut TaskBuilder<'_>) -> Result<(), GraphError> {
        let hdr = builder.lookup::<TextureDescription>(names::HDR)?;
        self.hdr = Some(builder.read(hdr)?);

        if self.debug_overlay {
            let overlay = builder.lookup::<TextureDescription>(names::OVERLAY)?;
            self.overlay = Some(builder.read(overlay)?);
        }

        let backbuffer = builder.lookup::<TextureDescription>(names::BACKBUFFER)?;
        self.backbuffer = Some(builder.write(backbuffer)?);

        // presentation must happen even if nothing reads the backbuffer
        builder.set_cull_immune(true);
        Ok(())
    }

    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> anyhow::Result<()> {
        let hdr = *ctx.get(self.hdr.context("composition setup did not run")?)?;
        let overlay = match self.overlay {
            Some(overlay) => Some(*ctx.get(overlay)?),
            None => None,
        };
        let backbuffer = *ctx.get(self.backbuffer.context("composition setup did not run")?)?;

        record(ctx, |frame| {
            frame.commands.record(Command::Sample(hdr))?;
            if let Some(overlay) = overlay {
                frame.commands.record(Command::Sample(overlay))?;
            }
            frame.commands.record(Command::Draw {
                target: backbuffer,
                vertices: FULLSCREEN_TRIANGLE,
                instances: 1,
            })
        })
    }
}
