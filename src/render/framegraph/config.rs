use std::fmt;

/// Which unreferenced resources start the culling flood fill.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum CullingPolicy {
    /// Only transient resources nobody reads. Writing a retained resource
    /// (a swapchain image, a persistent history buffer) keeps the writer alive.
    #[default]
    TransientRoots,
    /// Retained resources nobody reads are seeded as well, so their writers
    /// are culled unless they are cull-immune.
    UnreadRetainedRoots,
}

impl fmt::Display for CullingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CullingPolicy::TransientRoots => "TransientRoots",
            CullingPolicy::UnreadRetainedRoots => "UnreadRetainedRoots",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FrameGraphConfig {
    pub culling: CullingPolicy,
    pub warn_on_out_of_order: bool,
}

impl Default for FrameGraphConfig {
    fn default() -> Self {
        Self {
            culling: CullingPolicy::TransientRoots,
            warn_on_out_of_order: true,
        }
    }
}

impl FrameGraphConfig {
    pub fn culling(mut self, culling: CullingPolicy) -> Self {
        self.culling = culling;
        self
    }

    pub fn warn_on_out_of_order(mut self, warn: bool) -> Self {
        self.warn_on_out_of_order = warn;
        self
    }
}

impl fmt::Display for FrameGraphConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FrameGraphConfig(culling={}, warnOnOutOfOrder={})",
            self.culling, self.warn_on_out_of_order
        )
    }
}
