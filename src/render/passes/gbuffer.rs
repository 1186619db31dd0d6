use anyhow::Context;

use crate::{
    image::{Extent2D, Format, ImageSpec, SharedImageManager, TextureDescription},
    render::{
        command::Command,
        framegraph::{ExecuteContext, GraphError, RenderTask, Resource, TaskBuilder},
        passes::{names, record},
    },
};

struct Targets {
    albedo: Resource<TextureDescription>,
    normal: Resource<TextureDescription>,
    depth: Resource<TextureDescription>,
}

/// Rasterizes scene geometry into albedo, normal and depth targets.
pub struct GBufferPass {
    images: SharedImageManager,
    extent: Extent2D,
    targets: Option<Targets>,
}

impl GBufferPass {
    pub fn new(images: &SharedImageManager, extent: Extent2D) -> Self {
        Self {
            images: images.clone(),
            extent,
            targets: None,
        }
    }

    fn target(&self, name: &str, format: Format) -> TextureDescription {
        let spec = ImageSpec::default()
            .format(format)
            .extent(self.extent)
            .debug_name(name);
        TextureDescription::new(&self.images, spec)
    }
}

impl RenderTask for GBufferPass {
    fn setup(&mut self, builder: &mut TaskBuilder<'_>) -> Result<(), GraphError> {
        let albedo = builder.create(names::ALBEDO, self.target(names::ALBEDO, Format::Rgba8Unorm));
        let normal = builder.create(names::NORMAL, self.target(names::NORMAL, Format::Rgba16Float));
        let depth = builder.create(names::DEPTH, self.target(names::DEPTH, Format::D32Float));

        let blackboard = builder.blackboard_mut();
        blackboard.insert(names::ALBEDO, albedo);
        blackboard.insert(names::NORMAL, normal);
        blackboard.insert(names::DEPTH, depth);

        self.targets = Some(Targets {
            albedo,
            normal,
            depth,
        });
        Ok(())
    }

    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> anyhow::Result<()> {
        let targets = self.targets.as_ref().context("gbuffer setup did not run")?;
        let albedo = *ctx.get(targets.albedo)?;
        let normal = *ctx.get(targets.normal)?;
        let depth = *ctx.get(targets.depth)?;

        record(ctx, |frame| {
            for target in [albedo, normal, depth] {
                frame.commands.record(Command::Clear(target))?;
            }
            frame.commands.record(Command::Draw {
                target: albedo,
                vertices: 3 * 4096,
                instances: 1,
            })
        })
    }
}
