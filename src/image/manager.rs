use anyhow::Context;
use slotmap::SlotMap;

use super::{ImageKey, spec::ImageSpec};

/// A host-side stand-in for a device image allocation.
pub struct Image {
    pub spec: ImageSpec,
    pub byte_size: u64,
}

#[derive(Default)]
pub struct ImageManager {
    images: SlotMap<ImageKey, Image>,
    budget: Option<u64>,
    live_bytes: u64,
    peak_bytes: u64,
    total_created: u64,
}

impl ImageManager {
    /// Refuses allocations that would push live memory above `budget` bytes.
    pub fn with_budget(budget: u64) -> Self {
        Self {
            budget: Some(budget),
            ..Default::default()
        }
    }

    #[inline]
    pub fn image(&self, key: ImageKey) -> Option<&Image> {
        self.images.get(key)
    }

    pub fn contains(&self, key: ImageKey) -> bool {
        self.images.contains_key(key)
    }

    pub fn create_image(&mut self, spec: ImageSpec) -> anyhow::Result<ImageKey> {
        if spec.extent.is_empty() {
            anyhow::bail!("cannot create {} with an empty extent", spec);
        }

        let byte_size = spec.byte_size();
        if let Some(budget) = self.budget
            && self.live_bytes + byte_size > budget
        {
            anyhow::bail!(
                "out of image memory creating {} ({} live + {} requested > {} budget)",
                spec,
                self.live_bytes,
                byte_size,
                budget
            );
        }

        log::trace!("create image {}", spec);
        self.live_bytes += byte_size;
        self.peak_bytes = self.peak_bytes.max(self.live_bytes);
        self.total_created += 1;
        Ok(self.images.insert(Image { spec, byte_size }))
    }

    pub fn destroy_image(&mut self, key: ImageKey) -> anyhow::Result<()> {
        let image = self
            .images
            .remove(key)
            .context("destroy_image: invalid ImageKey")?;
        log::trace!("destroy image {}", image.spec);
        self.live_bytes -= image.byte_size;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn live_bytes(&self) -> u64 {
        self.live_bytes
    }

    pub fn peak_bytes(&self) -> u64 {
        self.peak_bytes
    }

    pub fn total_created(&self) -> u64 {
        self.total_created
    }
}
