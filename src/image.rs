//! The owned image buffer data model shared by the codec adapters and the
//! bisection drivers.

/// Number of interleaved channels a buffer carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Gray,
    Rgb,
}

impl PixelFormat {
    pub fn components(self) -> usize {
        match self {
            PixelFormat::Gray => 1,
            PixelFormat::Rgb => 3,
        }
    }
}

/// The colourspace a codec declares or is asked to target. Distinct from
/// `PixelFormat` because a `YCbCr`-declared JPEG still yields an RGB pixel
/// buffer once decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colorspace {
    Rgb,
    YCbCr,
    Grayscale,
}

/// An owned, contiguous, row-major, top-down pixel buffer. Invariant:
/// `data.len() == width * height * pixel_format.components()`.
#[derive(Debug, Clone)]
pub struct ImageBuffer {
    pub width: usize,
    pub height: usize,
    pub pixel_format: PixelFormat,
    pub data: Vec<u8>,
}

impl ImageBuffer {
    pub fn new(width: usize, height: usize, pixel_format: PixelFormat, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width * height * pixel_format.components());
        Self {
            width,
            height,
            pixel_format,
            data,
        }
    }

    pub fn components(&self) -> usize {
        self.pixel_format.components()
    }

    pub fn to_luma(&self) -> Vec<u8> {
        match self.pixel_format {
            PixelFormat::Gray => self.data.clone(),
            PixelFormat::Rgb => crate::pixel::rgb_to_y(&self.data, self.width, self.height),
        }
    }
}

/// Chroma sampling mode requested of the JPEG encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsampling {
    /// 4:2:0, the default; chroma box-filtered 2x2 before encode.
    Default,
    /// 4:4:4, all components at 1x1, no chroma filtering.
    Disabled,
}

/// Encode-time parameters shared by every `Codec` implementation. Fields
/// not honoured by a given codec (e.g. `progressive` for WebP) are
/// accepted and ignored rather than rejected.
#[derive(Debug, Clone, Copy)]
pub struct CodecParams {
    pub quality: u8,
    pub colorspace: Colorspace,
    pub progressive: bool,
    pub optimize_coding: bool,
    pub subsampling: Subsampling,
}

impl Default for CodecParams {
    fn default() -> Self {
        Self {
            quality: 85,
            colorspace: Colorspace::YCbCr,
            progressive: false,
            optimize_coding: false,
            subsampling: Subsampling::Default,
        }
    }
}
