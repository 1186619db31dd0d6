mod description;
mod keys;
mod manager;
mod spec;

pub use description::{SharedImageManager, TextureDescription};
pub use keys::*;
pub use manager::{Image, ImageManager};
pub use spec::{Extent2D, Format, ImageSpec};
