use anyhow::Context;

use crate::{
    image::{Extent2D, Format, ImageSpec, SharedImageManager, TextureDescription},
    render::{
        command::Command,
        framegraph::{ExecuteContext, GraphError, RenderTask, Resource, TaskBuilder},
        passes::{names, record},
    },
};

pub struct ShadowPass {
    images: SharedImageManager,
    resolution: u32,
    shadow_map: Option<Resource<TextureDescription>>,
}

impl ShadowPass {
    pub fn new(images: &SharedImageManager, resolution: u32) -> Self {
        Self {
            images: images.clone(),
            resolution,
            shadow_map: None,
        }
    }
}

impl RenderTask for ShadowPass {
    fn setup(&mut self, builder: &mut TaskBuilder<'_>) -> Result<(), GraphError> {
        let spec = ImageSpec::default()
            .format(Format::D32Float)
            .extent(Extent2D::new(self.resolution, self.resolution))
            .debug_name("shadow map");
        let shadow_map =
            builder.create(names::SHADOW_MAP, TextureDescription::new(&self.images, spec));
        builder.blackboard_mut().insert(names::SHADOW_MAP, shadow_map);
        self.shadow_map = Some(shadow_map);
        Ok(())
    }

    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> anyhow::Result<()> {
        let shadow_map = *ctx.get(self.shadow_map.context("shadow setup did not run")?)?;

        record(ctx, |frame| {
            frame.commands.record(Command::Clear(shadow_map))?;
            frame.commands.record(Command::Draw {
                target: shadow_map,
                vertices: 36,
                instances: 64,
            })
        })
    }
}
