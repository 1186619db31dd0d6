use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Format {
    #[default]
    Rgba8Unorm,
    Bgra8Srgb,
    Rgba16Float,
    R32Float,
    D32Float,
}

impl Format {
    pub fn bytes_per_pixel(self) -> u64 {
        match self {
            Format::Rgba8Unorm | Format::Bgra8Srgb | Format::R32Float | Format::D32Float => 4,
            Format::Rgba16Float => 8,
        }
    }

    pub fn is_depth(self) -> bool {
        self == Format::D32Float
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Extent2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct ImageSpec {
    pub format: Format,
    pub extent: Extent2D,
    pub mips: u32,
    pub layers: u32,
    pub samples: u32,
    pub debug_name: Option<String>,
}

impl Default for ImageSpec {
    fn default() -> Self {
        Self {
            format: Default::default(),
            extent: Default::default(),
            mips: 1,
            layers: 1,
            samples: 1,
            debug_name: Default::default(),
        }
    }
}

impl ImageSpec {
    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn extent(mut self, extent: Extent2D) -> Self {
        self.extent = extent;
        self
    }

    pub fn mips(mut self, mips: u32) -> Self {
        self.mips = mips;
        self
    }

    pub fn layers(mut self, layers: u32) -> Self {
        self.layers = layers;
        self
    }

    pub fn samples(mut self, samples: u32) -> Self {
        self.samples = samples;
        self
    }

    pub fn debug_name(mut self, debug_name: impl AsRef<str>) -> Self {
        self.debug_name = Some(debug_name.as_ref().to_owned());
        self
    }

    /// Footprint of the whole mip chain across all layers and samples.
    pub fn byte_size(&self) -> u64 {
        let mut texels = 0u64;
        for level in 0..self.mips.max(1) {
            let width = (self.extent.width >> level).max(1) as u64;
            let height = (self.extent.height >> level).max(1) as u64;
            texels += width * height;
        }
        texels * self.format.bytes_per_pixel() * self.layers as u64 * self.samples.max(1) as u64
    }
}

impl fmt::Display for ImageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ImageSpec(format={:?}, extent={}, mips={}, layers={}, samples={}, debugName={})",
            self.format,
            self.extent,
            self.mips,
            self.layers,
            self.samples,
            match &self.debug_name {
                Some(name) => name,
                None => "<none>",
            }
        )
    }
}
