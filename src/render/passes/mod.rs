//! The demo deferred renderer, expressed as frame graph tasks.
//!
//! Tasks find each other's outputs through the blackboard, so the order of
//! [`build_frame`] is the only place that knows the whole pipeline.

mod composition;
mod debug_overlay;
mod gbuffer;
mod light_cull;
mod lighting;
mod shadow;

use anyhow::Context;

pub use composition::CompositionPass;
pub use debug_overlay::DebugOverlayPass;
pub use gbuffer::GBufferPass;
pub use light_cull::LightCullPass;
pub use lighting::LightingPass;
pub use shadow::ShadowPass;

use crate::{
    buffer::SharedBufferManager,
    image::{Extent2D, SharedImageManager, TextureDescription},
    render::{
        FrameContext,
        framegraph::{ExecuteContext, FrameGraph, GraphError, Resource},
    },
};

/// Blackboard entries published by the demo passes.
pub mod names {
    pub const BACKBUFFER: &str = "backbuffer";
    pub const SHADOW_MAP: &str = "shadow.map";
    pub const ALBEDO: &str = "gbuffer.albedo";
    pub const NORMAL: &str = "gbuffer.normal";
    pub const DEPTH: &str = "gbuffer.depth";
    pub const LIGHT_LIST: &str = "lights.list";
    pub const HDR: &str = "lighting.hdr";
    pub const OVERLAY: &str = "debug.overlay";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSettings {
    pub extent: Extent2D,
    pub shadows: bool,
    pub shadow_resolution: u32,
    pub debug_overlay: bool,
    pub max_lights: u32,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            extent: Extent2D::new(1280, 720),
            shadows: true,
            shadow_resolution: 2048,
            debug_overlay: false,
            max_lights: 256,
        }
    }
}

/// Registers the whole demo pipeline, ending in a write to `backbuffer`.
///
/// Every pass is always registered. Disabled features are dropped by
/// culling because nothing downstream reads their outputs.
pub fn build_frame(
    graph: &mut FrameGraph,
    settings: &FrameSettings,
    images: &SharedImageManager,
    buffers: &SharedBufferManager,
    backbuffer: Resource<TextureDescription>,
) -> Result<(), GraphError> {
    graph.blackboard_mut().insert(names::BACKBUFFER, backbuffer);

    graph.add_render_task("shadow", ShadowPass::new(images, settings.shadow_resolution))?;
    graph.add_render_task("gbuffer", GBufferPass::new(images, settings.extent))?;
    graph.add_render_task(
        "light_cull",
        LightCullPass::new(buffers, settings.extent, settings.max_lights),
    )?;
    graph.add_render_task(
        "lighting",
        LightingPass::new(images, settings.extent, settings.shadows),
    )?;
    graph.add_render_task("debug_overlay", DebugOverlayPass::new(images, settings.extent))?;
    graph.add_render_task("composition", CompositionPass::new(settings.debug_overlay))?;
    Ok(())
}

/// Wraps `f` in a begin/end pass pair on the frame's command list.
fn record(
    ctx: &mut ExecuteContext<'_>,
    f: impl FnOnce(&mut FrameContext) -> anyhow::Result<()>,
) -> anyhow::Result<()> {
    let name = ctx.pass_name().to_owned();
    let waits = ctx.waits().len();
    let frame = ctx
        .user::<FrameContext>()
        .context("pass executed without a FrameContext")?;

    frame.commands.begin_pass(name, waits)?;
    f(frame)?;
    frame.commands.end_pass()
}

const FULLSCREEN_TRIANGLE: u32 = 3;
