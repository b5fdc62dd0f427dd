//! WebP `Codec` adapter: wraps the `webp` crate's libwebp bindings.
//! Selected when `Run::output_format == OutputFormat::WebP`; it carries no
//! metadata transplant (single stream, no markers to preserve).

use crate::codec::{Codec, DecodedImage};
use crate::error::{Error, Result};
use crate::image::{CodecParams, Colorspace, ImageBuffer, PixelFormat};

pub struct WebPCodec;

impl Codec for WebPCodec {
    fn encode(&self, source: &ImageBuffer, params: &CodecParams) -> Result<Vec<u8>> {
        let rgb: Vec<u8> = match source.pixel_format {
            PixelFormat::Rgb => source.data.clone(),
            PixelFormat::Gray => source
                .data
                .iter()
                .flat_map(|&v| [v, v, v])
                .collect(),
        };

        let encoder = ::webp::Encoder::from_rgb(&rgb, source.width as u32, source.height as u32);
        let quality = params.quality.clamp(1, 100) as f32;
        let memory = encoder.encode(quality);
        Ok(memory.to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage> {
        let decoder = ::webp::Decoder::new(bytes);
        let image = decoder
            .decode()
            .ok_or_else(|| Error::decode("libwebp failed to decode WebP stream"))?;

        let width = image.width() as usize;
        let height = image.height() as usize;
        let bytes: &[u8] = &image;

        let rgb = if image.is_alpha() {
            let mut out = vec![0u8; width * height * 3];
            for i in 0..(width * height) {
                out[i * 3] = bytes[i * 4];
                out[i * 3 + 1] = bytes[i * 4 + 1];
                out[i * 3 + 2] = bytes[i * 4 + 2];
            }
            out
        } else {
            bytes.to_vec()
        };

        Ok(DecodedImage {
            image: ImageBuffer::new(width, height, PixelFormat::Rgb, rgb),
            source_colorspace: Colorspace::Rgb,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(width: usize, height: usize) -> ImageBuffer {
        let mut data = vec![0u8; width * height * 3];
        for y in 0..height {
            for x in 0..width {
                let idx = (y * width + x) * 3;
                let v = if (x + y) % 2 == 0 { 40 } else { 210 };
                data[idx] = v;
                data[idx + 1] = v;
                data[idx + 2] = v;
            }
        }
        ImageBuffer::new(width, height, PixelFormat::Rgb, data)
    }

    #[test]
    fn encode_then_decode_round_trips_dimensions() {
        let source = checkerboard(16, 16);
        let params = CodecParams::default();
        let codec = WebPCodec;
        let bytes = codec.encode(&source, &params).expect("encode failed");
        let decoded = codec.decode(&bytes).expect("decode failed");
        assert_eq!(decoded.image.width, 16);
        assert_eq!(decoded.image.height, 16);
        assert_eq!(decoded.image.pixel_format, PixelFormat::Rgb);
    }

    #[test]
    fn grayscale_source_is_expanded_to_rgb_before_encode() {
        let data = vec![128u8; 16 * 16];
        let source = ImageBuffer::new(16, 16, PixelFormat::Gray, data);
        let params = CodecParams::default();
        let codec = WebPCodec;
        let bytes = codec.encode(&source, &params).expect("encode failed");
        assert!(!bytes.is_empty());
    }
}
