//! The `Codec` abstraction the drivers encode/decode through, plus format
//! sniffing (input auto-detection by magic bytes).

pub mod jpeg;
pub mod webp;

use crate::error::Result;
use crate::image::{CodecParams, Colorspace, ImageBuffer};

/// An encoded image a `Codec::decode` call produced, plus enough context
/// for the driver to re-derive a luma plane or re-encode without guessing.
pub struct DecodedImage {
    pub image: ImageBuffer,
    pub source_colorspace: Colorspace,
}

/// A lossy still-image codec the recompression drivers can target.
pub trait Codec {
    fn encode(&self, source: &ImageBuffer, params: &CodecParams) -> Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage>;
}

/// The sniffed format of an input byte stream, auto-detected by magic
/// bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SniffedFormat {
    Jpeg,
    Ppm,
    WebP,
    Unknown,
}

/// Identifies an input's format by its leading magic bytes.
pub fn sniff(bytes: &[u8]) -> SniffedFormat {
    if bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] == 0xD8 {
        return SniffedFormat::Jpeg;
    }
    if bytes.len() >= 2 && &bytes[0..2] == b"P6" {
        return SniffedFormat::Ppm;
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return SniffedFormat::WebP;
    }
    SniffedFormat::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_jpeg_magic() {
        assert_eq!(sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), SniffedFormat::Jpeg);
    }

    #[test]
    fn sniffs_ppm_magic() {
        assert_eq!(sniff(b"P6\n1 1\n255\n"), SniffedFormat::Ppm);
    }

    #[test]
    fn sniffs_webp_magic() {
        let mut bytes = b"RIFF".to_vec();
        bytes.extend_from_slice(&[0u8; 4]);
        bytes.extend_from_slice(b"WEBP");
        assert_eq!(sniff(&bytes), SniffedFormat::WebP);
    }

    #[test]
    fn unknown_magic_falls_through() {
        assert_eq!(sniff(&[0x00, 0x01, 0x02]), SniffedFormat::Unknown);
    }
}
