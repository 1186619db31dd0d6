use anyhow::Context;
use smallvec::SmallVec;

use crate::{
    buffer::BufferDescription,
    image::{Extent2D, Format, ImageSpec, SharedImageManager, TextureDescription},
    render::{
        command::Command,
        framegraph::{ExecuteContext, GraphError, RenderTask, Resource, TaskBuilder},
        passes::{FULLSCREEN_TRIANGLE, names, record},
    },
};

pub struct LightingPass {
    images: SharedImageManager,
    extent: Extent2D,
    shadows: bool,
    inputs: SmallVec<[Resource<TextureDescription>; 4]>,
    lights: Option<Resource<BufferDescription>>,
    hdr: Option<Resource<TextureDescription>>,
}

impl LightingPass {
    pub fn new(images: &SharedImageManager, extent: Extent2D, shadows: bool) -> Self {
        Self {
            images: images.clone(),
            extent,
            shadows,
            inputs: SmallVec::new(),
            lights: None,
            hdr: None,
        }
    }
}

impl RenderTask for LightingPass {
    fn setup(&mut self, builder: &mut TaskBuilder<'_>) -> Result<(), GraphError> {
        let mut inputs = vec![names::ALBEDO, names::NORMAL, names::DEPTH];
        if self.shadows {
            inputs.push(names::SHADOW_MAP);
        }
        for name in inputs {
            let input = builder.lookup::<TextureDescription>(name)?;
            self.inputs.push(builder.read(input)?);
        }

        let lights = builder.lookup::<BufferDescription>(names::LIGHT_LIST)?;
        self.lights = Some(builder.read(lights)?);

        let spec = ImageSpec::default()
            .format(Format::Rgba16Float)
            .extent(self.extent)
            .debug_name(names::HDR);
        let hdr = builder.create(names::HDR, TextureDescription::new(&self.images, spec));
        builder.blackboard_mut().insert(names::HDR, hdr);
        self.hdr = Some(hdr);
        Ok(())
    }

    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> anyhow::Result<()> {
        let inputs = self
            .inputs
            .iter()
            .map(|&input| ctx.get(input).copied())
            .collect::<Result<SmallVec<[_; 4]>, _>>()?;
        let lights = *ctx.get(self.lights.context("lighting setup did not run")?)?;
        let hdr = *ctx.get(self.hdr.context("lighting setup did not run")?)?;

        record(ctx, |frame| {
            for input in inputs {
                frame.commands.record(Command::Sample(input))?;
            }
            frame.commands.record(Command::ReadBuffer(lights))?;
            frame.commands.record(Command::Draw {
                target: hdr,
                vertices: FULLSCREEN_TRIANGLE,
                instances: 1,
            })
        })
    }
}
