use smallvec::SmallVec;

use crate::render::framegraph::{
    pass::{PassId, PassNode, PassSlot},
    resource::ResourceNode,
};

pub type WaitList = SmallVec<[PassId; 4]>;

/// Surviving passes registered before `index` that produced something the
/// pass at `index` reads, in timeline order.
///
/// A backend turns each entry into a semaphore or event wait. Producers
/// registered *after* the consumer are returned separately; the graph does
/// not reorder, so those are declaration-order violations.
pub(crate) fn wait_list(
    index: usize,
    node: &PassNode,
    passes: &[PassSlot],
    resources: &[ResourceNode],
) -> (WaitList, WaitList) {
    let mut waits = WaitList::new();
    let mut late = WaitList::new();

    for read in &node.reads {
        let resource = &resources[read.index()];
        let producers = resource.creator.iter().chain(resource.writers.iter());
        for &producer in producers {
            if producer.index() == index || passes[producer.index()].node.is_culled() {
                continue;
            }
            let list = if producer.index() < index {
                &mut waits
            } else {
                &mut late
            };
            if !list.contains(&producer) {
                list.push(producer);
            }
        }
    }

    waits.sort_unstable();
    late.sort_unstable();
    (waits, late)
}
