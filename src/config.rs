//! Command line and environment configuration for the `arbor` binary.

use std::{fmt, path::PathBuf};

use clap::{Parser, ValueEnum};

use crate::{
    image::Extent2D,
    render::{
        framegraph::{CullingPolicy, FrameGraphConfig},
        passes::FrameSettings,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CliCulling {
    /// Only unread transient resources seed culling.
    #[default]
    Transient,
    /// Unread retained resources seed culling as well.
    Retained,
}

impl From<CliCulling> for CullingPolicy {
    fn from(value: CliCulling) -> Self {
        match value {
            CliCulling::Transient => CullingPolicy::TransientRoots,
            CliCulling::Retained => CullingPolicy::UnreadRetainedRoots,
        }
    }
}

/// Every option can also be set through the `ARBOR_*` environment variable
/// shown in `--help`.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "arbor",
    about = "Headless frame graph renderer",
    long_about = "Builds, compiles and executes a deferred-rendering frame graph every frame \
        against a host-side mock GPU.\n\n\
        EXAMPLES:\n\
          # Render 10 frames and dump the last frame graph\n\
          arbor --frames 10 --graphviz frame.dot\n\
        \n\
          # Show the debug overlay without shadows\n\
          arbor --no-shadows --debug-overlay",
    version
)]
pub struct AppConfig {
    /// Number of frames to render before exiting.
    #[arg(long, env = "ARBOR_FRAMES", default_value_t = 120)]
    pub frames: u64,

    /// Backbuffer width in pixels.
    #[arg(long, env = "ARBOR_WIDTH", default_value_t = 1280)]
    pub width: u32,

    /// Backbuffer height in pixels.
    #[arg(long, env = "ARBOR_HEIGHT", default_value_t = 720)]
    pub height: u32,

    /// Skip shadow mapping. The shadow pass is still registered and culled.
    #[arg(long, env = "ARBOR_NO_SHADOWS")]
    pub no_shadows: bool,

    /// Blend the gbuffer normal visualization into the final image.
    #[arg(long, env = "ARBOR_DEBUG_OVERLAY")]
    pub debug_overlay: bool,

    /// Which unreferenced resources seed culling.
    #[arg(long, env = "ARBOR_CULLING", default_value = "transient", value_enum)]
    pub culling: CliCulling,

    /// Write the last frame's graph to this path in graphviz format.
    #[arg(long, env = "ARBOR_GRAPHVIZ")]
    pub graphviz: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            frames: 120,
            width: 1280,
            height: 720,
            no_shadows: false,
            debug_overlay: false,
            culling: CliCulling::Transient,
            graphviz: None,
        }
    }
}

impl AppConfig {
    pub fn extent(&self) -> Extent2D {
        Extent2D::new(self.width, self.height)
    }

    pub fn frame_settings(&self) -> FrameSettings {
        FrameSettings {
            extent: self.extent(),
            shadows: !self.no_shadows,
            debug_overlay: self.debug_overlay,
            ..Default::default()
        }
    }

    pub fn framegraph_config(&self) -> FrameGraphConfig {
        FrameGraphConfig::default().culling(self.culling.into())
    }
}

impl fmt::Display for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AppConfig(frames={}, extent={}, shadows={}, debugOverlay={}, culling={}, graphviz={})",
            self.frames,
            self.extent(),
            !self.no_shadows,
            self.debug_overlay,
            CullingPolicy::from(self.culling),
            match &self.graphviz {
                Some(path) => path.display().to_string(),
                None => "<none>".to_string(),
            }
        )
    }
}
