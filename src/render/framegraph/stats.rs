use std::fmt;

use crate::render::framegraph::FrameGraph;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct TimelineStats {
    pub registered_passes: usize,
    pub surviving_passes: usize,
    pub culled_passes: usize,
    pub transient_resources: usize,
    pub culled_resources: usize,
    /// Largest summed `size()` of transient resources alive at any one step.
    pub peak_transient_bytes: u64,
}

impl fmt::Display for TimelineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TimelineStats(passes={}/{}, culledPasses={}, transients={}, culledResources={}, peakTransientBytes={})",
            self.surviving_passes,
            self.registered_passes,
            self.culled_passes,
            self.transient_resources,
            self.culled_resources,
            self.peak_transient_bytes,
        )
    }
}

impl TimelineStats {
    /// Walks a freshly built timeline.
    pub(crate) fn measure(graph: &FrameGraph) -> Self {
        let registered_passes = graph.passes.len();
        let surviving_passes = graph.timeline.len();
        let transient_resources = graph
            .resources
            .iter()
            .filter(|resource| resource.is_transient())
            .count();
        let materialized = graph.live.iter().filter(|&&live| live).count();

        let mut alive = 0u64;
        let mut peak_transient_bytes = 0u64;
        for step in &graph.timeline {
            for id in &step.realize {
                alive += graph.resources[id.index()].size();
            }
            peak_transient_bytes = peak_transient_bytes.max(alive);
            for id in &step.derealize {
                alive = alive.saturating_sub(graph.resources[id.index()].size());
            }
        }

        Self {
            registered_passes,
            surviving_passes,
            culled_passes: registered_passes - surviving_passes,
            transient_resources,
            culled_resources: transient_resources - materialized,
            peak_transient_bytes,
        }
    }
}
