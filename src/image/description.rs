use std::{cell::RefCell, rc::Rc};

use crate::{
    image::{ImageKey, ImageManager, ImageSpec},
    render::framegraph::ResourceDescription,
};

pub type SharedImageManager = Rc<RefCell<ImageManager>>;

/// Frame graph description of a texture backed by an [`ImageManager`].
pub struct TextureDescription {
    pub spec: ImageSpec,
    images: SharedImageManager,
}

impl TextureDescription {
    pub fn new(images: &SharedImageManager, spec: ImageSpec) -> Self {
        Self {
            spec,
            images: images.clone(),
        }
    }
}

impl ResourceDescription for TextureDescription {
    type Actual = ImageKey;

    fn realize(&self) -> anyhow::Result<ImageKey> {
        self.images.borrow_mut().create_image(self.spec.clone())
    }

    fn derealize(&self, actual: ImageKey) {
        if let Err(e) = self.images.borrow_mut().destroy_image(actual) {
            log::error!("{:?}", e);
        }
    }

    fn size(&self) -> u64 {
        self.spec.byte_size()
    }
}
