//! Baseline-JPEG `Codec` adapter: wires `jpeg1::encoder`/`decoder` to the
//! `CodecParams` contract, including the 4:2:0 box-filter simplification
//! and the `optimize_coding` two-pass Huffman flow.

use crate::FrameInfo;
use crate::codec::{Codec, DecodedImage};
use crate::error::{Error, Result};
use crate::image::{CodecParams, Colorspace, ImageBuffer, PixelFormat, Subsampling};
use crate::jpeg1::decoder::Jpeg1Decoder;
use crate::jpeg1::encoder::Jpeg1Encoder;

/// The `Codec` this crate selects when `Run::output_format == OutputFormat::Jpeg`.
pub struct JpegCodec;

fn rgb_to_ycbcr(rgb: &[u8]) -> (f32, f32, f32) {
    let r = rgb[0] as f32;
    let g = rgb[1] as f32;
    let b = rgb[2] as f32;
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let cb = -0.1687 * r - 0.3313 * g + 0.5 * b + 128.0;
    let cr = 0.5 * r - 0.4187 * g - 0.0813 * b + 128.0;
    (y, cb, cr)
}

fn ycbcr_to_rgb(y: f32, cb: f32, cr: f32) -> [u8; 3] {
    let r = y + 1.402 * (cr - 128.0);
    let g = y - 0.344136 * (cb - 128.0) - 0.714136 * (cr - 128.0);
    let b = y + 1.772 * (cb - 128.0);
    [
        r.round().clamp(0.0, 255.0) as u8,
        g.round().clamp(0.0, 255.0) as u8,
        b.round().clamp(0.0, 255.0) as u8,
    ]
}

/// Box-filters the chroma planes of an interleaved RGB buffer in
/// non-overlapping 2x2 blocks and writes the averaged chroma back to every
/// pixel in the block, leaving luma untouched. This approximates 4:2:0
/// subsampling without restructuring the encoder's always-4:4:4 MCU
/// layout: the bitstream still declares 1x1 sampling
/// factors, but adjacent chroma samples within each block are identical,
/// which is what a true 4:2:0 stream would reconstruct to under
/// nearest/duplicate-sample upsampling.
fn apply_420_box_filter(rgb: &mut [u8], width: usize, height: usize) {
    let mut y = 0usize;
    while y < height {
        let bh = (y + 2).min(height) - y;
        let mut x = 0usize;
        while x < width {
            let bw = (x + 2).min(width) - x;

            let mut sum_cb = 0.0f32;
            let mut sum_cr = 0.0f32;
            let mut luma = [[0.0f32; 2]; 2];
            for dy in 0..bh {
                for dx in 0..bw {
                    let idx = ((y + dy) * width + (x + dx)) * 3;
                    let (yy, cb, cr) = rgb_to_ycbcr(&rgb[idx..idx + 3]);
                    luma[dy][dx] = yy;
                    sum_cb += cb;
                    sum_cr += cr;
                }
            }
            let count = (bw * bh) as f32;
            let avg_cb = sum_cb / count;
            let avg_cr = sum_cr / count;

            for dy in 0..bh {
                for dx in 0..bw {
                    let idx = ((y + dy) * width + (x + dx)) * 3;
                    let pixel = ycbcr_to_rgb(luma[dy][dx], avg_cb, avg_cr);
                    rgb[idx] = pixel[0];
                    rgb[idx + 1] = pixel[1];
                    rgb[idx + 2] = pixel[2];
                }
            }

            x += 2;
        }
        y += 2;
    }
}

impl Codec for JpegCodec {
    fn encode(&self, source: &ImageBuffer, params: &CodecParams) -> Result<Vec<u8>> {
        let width = source.width;
        let height = source.height;
        let grayscale = params.colorspace == Colorspace::Grayscale;

        let mut encoder = Jpeg1Encoder::with_quality(params.quality);

        let component_count = if grayscale { 1 } else { 3 };
        let frame_info = FrameInfo {
            width: width as u32,
            height: height as u32,
            bits_per_sample: 8,
            component_count,
        };

        let source_bytes: Vec<u8> = if grayscale {
            source.to_luma()
        } else {
            let mut rgb = match source.pixel_format {
                PixelFormat::Rgb => source.data.clone(),
                PixelFormat::Gray => {
                    let mut out = vec![0u8; width * height * 3];
                    for (i, &v) in source.data.iter().enumerate() {
                        out[i * 3] = v;
                        out[i * 3 + 1] = v;
                        out[i * 3 + 2] = v;
                    }
                    out
                }
            };
            if params.subsampling == Subsampling::Default {
                apply_420_box_filter(&mut rgb, width, height);
            }
            rgb
        };

        if params.optimize_coding {
            let freqs = encoder.gather_symbol_frequencies(&source_bytes, &frame_info);
            encoder.apply_optimized_tables(&freqs);
        }

        let mut destination = vec![0u8; width * height * component_count as usize * 2 + 4096];
        // `progressive=false ∧ optimize_coding=true` must emit a single-scan
        // interchange stream: `encode` always writes one interleaved SOS
        // regardless of `optimize_coding`, so only `progressive` selects the
        // non-interleaved multi-scan path.
        let len = if params.progressive {
            encoder.encode_planar(&source_bytes, &frame_info, &mut destination, true)?
        } else {
            encoder.encode(&source_bytes, &frame_info, &mut destination)?
        };
        destination.truncate(len);
        Ok(destination)
    }

    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage> {
        let mut decoder = Jpeg1Decoder::new(bytes);
        decoder.read_header()?;
        let frame_info = decoder.frame_info();
        let width = frame_info.width as usize;
        let height = frame_info.height as usize;
        let component_count = decoder.source_component_count();

        if component_count != 1 && component_count != 3 {
            return Err(Error::decode("unsupported component count"));
        }

        let pixel_format = if component_count == 1 { PixelFormat::Gray } else { PixelFormat::Rgb };
        let mut data = vec![0u8; width * height * pixel_format.components()];
        decoder.decode(&mut data)?;

        let source_colorspace = if component_count == 1 { Colorspace::Grayscale } else { Colorspace::YCbCr };
        Ok(DecodedImage {
            image: ImageBuffer::new(width, height, pixel_format, data),
            source_colorspace,
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
        let codec = JpegCodec;
        let bytes = codec.encode(&source, &params).expect("encode failed");
        let decoded = codec.decode(&bytes).expect("decode failed");
        assert_eq!(decoded.image.width, 16);
        assert_eq!(decoded.image.height, 16);
        assert_eq!(decoded.source_colorspace, Colorspace::YCbCr);
    }

    #[test]
    fn grayscale_colorspace_produces_single_component_stream() {
        let source = checkerboard(16, 16);
        let mut params = CodecParams::default();
        params.colorspace = Colorspace::Grayscale;
        let codec = JpegCodec;
        let bytes = codec.encode(&source, &params).expect("encode failed");
        let decoded = codec.decode(&bytes).expect("decode failed");
        assert_eq!(decoded.source_colorspace, Colorspace::Grayscale);
        assert_eq!(decoded.image.pixel_format, PixelFormat::Gray);
    }

    #[test]
    fn optimize_coding_still_decodes() {
        let source = checkerboard(16, 16);
        let mut params = CodecParams::default();
        params.optimize_coding = true;
        let codec = JpegCodec;
        let bytes = codec.encode(&source, &params).expect("encode failed");
        codec.decode(&bytes).expect("decode failed");
    }

    #[test]
    fn box_filter_preserves_dimensions() {
        let mut rgb = vec![10u8; 4 * 4 * 3];
        apply_420_box_filter(&mut rgb, 4, 4);
        assert_eq!(rgb.len(), 4 * 4 * 3);
    }
}
