/*!
# jpeg-recompress-rs

A perceptual JPEG/WebP recompression toolkit: given a reference image and a
lossy codec, search the codec's quality axis for the lowest setting whose
reconstruction is still perceptually indistinguishable from the reference
under a chosen image-quality metric (or fused ensemble of metrics).

Two drivers are provided over a shared metric library, codec adapters, and
metadata transplanter:

- [`driver::target_quality`] bisects quality against an explicit metric
  target.
- [`driver::zf_point`] locates the "zero-flex" quality knee where raising
  quality further stops buying proportional fidelity.
*/

pub mod constants;
pub mod error;
pub mod jpeg_marker_code;
pub mod jpeg_stream_reader;
pub mod jpeg_stream_writer;

pub mod codec;
pub mod driver;
pub mod image;
pub mod jpeg1;
pub mod metadata;
pub mod metrics;
pub mod pixel;
pub mod ppm;
pub mod rescale;
pub mod run;

pub use error::Error;

/// Basic information about a JPEG image frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameInfo {
    /// Width of the frame in pixels.
    pub width: u32,
    /// Height of the frame in pixels.
    pub height: u32,
    /// Bits per sample (2-16).
    pub bits_per_sample: i32,
    /// Number of components (e.g., 1 for grayscale, 3 for RGB).
    pub component_count: i32,
}
