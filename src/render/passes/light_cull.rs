use anyhow::Context;

use crate::{
    buffer::{BufferDescription, BufferSpec, BufferUsage, SharedBufferManager},
    image::{Extent2D, TextureDescription},
    render::{
        command::Command,
        framegraph::{ExecuteContext, GraphError, RenderTask, Resource, TaskBuilder},
        passes::{names, record},
    },
};

const TILE_SIZE: u32 = 16;
const LIGHT_STRIDE: u64 = 32;

/// Bins lights into screen tiles using the gbuffer depth.
pub struct LightCullPass {
    buffers: SharedBufferManager,
    extent: Extent2D,
    max_lights: u32,
    depth: Option<Resource<TextureDescription>>,
    lights: Option<Resource<BufferDescription>>,
}

impl LightCullPass {
    pub fn new(buffers: &SharedBufferManager, extent: Extent2D, max_lights: u32) -> Self {
        Self {
            buffers: buffers.clone(),
            extent,
            max_lights,
            depth: None,
            lights: None,
        }
    }
}

impl RenderTask for LightCullPass {
    fn setup(&mut self, builder: &mut TaskBuilder<'_>) -> Result<(), GraphError> {
        let depth = builder.lookup::<TextureDescription>(names::DEPTH)?;
        self.depth = Some(builder.read(depth)?);

        let spec = BufferSpec::new(BufferUsage::Storage, self.max_lights as u64, LIGHT_STRIDE)
            .debug_name(names::LIGHT_LIST);
        let lights = builder.create(names::LIGHT_LIST, BufferDescription::new(&self.buffers, spec));
        builder.blackboard_mut().insert(names::LIGHT_LIST, lights);
        self.lights = Some(lights);
        Ok(())
    }

    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> anyhow::Result<()> {
        let depth = *ctx.get(self.depth.context("light_cull setup did not run")?)?;
        let lights = *ctx.get(self.lights.context("light_cull setup did not run")?)?;
        let groups = [
            self.extent.width.div_ceil(TILE_SIZE),
            self.extent.height.div_ceil(TILE_SIZE),
            1,
        ];
        let max_lights = self.max_lights;

        record(ctx, |frame| {
            frame.commands.record(Command::Sample(depth))?;
            frame.commands.record(Command::Dispatch { groups })?;

            let mut buffers = frame.buffers.borrow_mut();
            let buffer = buffers
                .buffer_mut(lights)
                .context("light list is not allocated")?;
            buffer.data[..4].copy_from_slice(&max_lights.to_le_bytes());
            frame.commands.record(Command::WriteBuffer(lights))
        })
    }
}
