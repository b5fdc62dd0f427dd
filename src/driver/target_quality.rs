//! Target-quality recompressor: bisects the codec's integer quality
//! parameter to find the smallest quality whose reconstruction meets a
//! UM-scale target, then forces a terminal encode at the highest-fidelity
//! path available before emitting the result.

use super::{encode_and_reconstruct, finalize, pre_check, Candidate, PreCheck};
use crate::codec::{Codec, SniffedFormat};
use crate::error::{Error, Result};
use crate::image::ImageBuffer;
use crate::metrics::evaluate_um;
use crate::run::{Method, Run};

/// Runs the bisection loop and returns the final output bytes, ready to be
/// written to the sink.
///
/// `reference` and `reference_y` are the decoded input; `input_bytes` is
/// the original encoded source, used for the no-gain size comparison and,
/// for an already-processed JPEG, as the soft-success copy.
pub fn recompress(
    codec: &dyn Codec,
    sniffed: SniffedFormat,
    reference: &ImageBuffer,
    reference_y: &[u8],
    input_bytes: &[u8],
    run: &Run,
) -> Result<Vec<u8>> {
    if run.jpeg_min > run.jpeg_max {
        return Err(Error::config("jpegMin must be <= jpegMax"));
    }
    if run.method == Method::Fast {
        return Err(Error::config("fast is a direct hash comparison, not a bisection target"));
    }

    let metadata = match pre_check(sniffed, input_bytes, run)? {
        PreCheck::AlreadyProcessedCopy(bytes) => return Ok(bytes),
        PreCheck::Proceed { metadata } => metadata,
    };

    let target = run.target_threshold();
    let mut lo = run.jpeg_min;
    let mut hi = run.jpeg_max;
    let mut last_good: Option<Candidate> = None;
    let attempts = crate::constants::DEFAULT_ATTEMPTS;

    for i in (0..attempts).rev() {
        let terminal = i == 0 || lo == hi;
        let q = if lo == hi { lo } else { lo + (hi - lo + 1) / 2 };
        // The terminal iteration forces the highest-fidelity encode path
        // available, and its output is what is actually written below,
        // never an earlier, smaller-quality accepted candidate.
        let progressive = terminal;
        let optimize = run.accurate || terminal;

        let (bytes, candidate_y) = encode_and_reconstruct(codec, reference, run, q, progressive, optimize)?;
        if candidate_y.len() != reference_y.len() {
            return Err(Error::internal("reconstructed candidate dimensions do not match the reference"));
        }

        let um = evaluate_um(run.method, reference_y, &candidate_y, reference.width, reference.height)?;
        log::debug!("i={i} q={q} um={um:.4} target={target:.4} bytes={}", bytes.len());

        let meets_target = um >= target;
        let no_gain = bytes.len() >= input_bytes.len();

        if !run.quiet {
            if meets_target {
                eprintln!("quality {q}: {um:.4} meets target {target:.4} ({} bytes)", bytes.len());
            } else {
                eprintln!("quality {q}: {um:.4} below target {target:.4} ({} bytes)", bytes.len());
            }
        }

        if terminal {
            // Unconditional: the terminal candidate is always the one
            // handed to `finalize`, whether or not it met the target.
            last_good = Some(Candidate { bytes, quality: q, objective: um });
            break;
        }

        if meets_target {
            hi = q.saturating_sub(1).max(lo);
            last_good = Some(Candidate { bytes, quality: q, objective: um });
        } else if no_gain {
            // Raising quality further can only grow the candidate, and it
            // already isn't smaller than the input: no later iteration can
            // produce a gain, so stop the search now instead of bisecting
            // the rest of the way up.
            log::debug!("q={q} already no-gain ({} >= {} bytes), stopping early", bytes.len(), input_bytes.len());
            break;
        } else {
            lo = (q + 1).min(hi);
        }
    }

    finalize(last_good, &metadata, input_bytes, run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::jpeg::JpegCodec;
    use crate::image::PixelFormat;
    use crate::run::{PresetTable, Target};

    fn checkerboard(width: usize, height: usize) -> ImageBuffer {
        let mut data = vec![0u8; width * height * 3];
        for y in 0..height {
            for x in 0..width {
                let idx = (y * width + x) * 3;
                let v = if (x + y) % 4 == 0 { 20 } else { 220 };
                data[idx] = v;
                data[idx + 1] = v;
                data[idx + 2] = v;
            }
        }
        ImageBuffer::new(width, height, PixelFormat::Rgb, data)
    }

    fn base_run() -> Run {
        Run {
            method: Method::Mse,
            target: Target::Value(-10.0),
            preset_table: PresetTable::Current,
            jpeg_min: 10,
            jpeg_max: 95,
            subsampling: crate::image::Subsampling::Disabled,
            output_format: crate::run::OutputFormat::Jpeg,
            strip_metadata: false,
            force: true,
            copy_on_no_gain: true,
            accurate: false,
            quiet: true,
            sentinel: crate::constants::SENTINEL_COMMENT.to_string(),
        }
    }

    #[test]
    fn rejects_inverted_quality_bounds() {
        let reference = checkerboard(16, 16);
        let reference_y = reference.to_luma();
        let codec = JpegCodec;
        let mut run = base_run();
        run.jpeg_min = 90;
        run.jpeg_max = 10;
        let err = recompress(&codec, SniffedFormat::Ppm, &reference, &reference_y, &[0u8; 4], &run).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn rejects_fast_method() {
        let reference = checkerboard(16, 16);
        let reference_y = reference.to_luma();
        let codec = JpegCodec;
        let mut run = base_run();
        run.method = Method::Fast;
        let err = recompress(&codec, SniffedFormat::Ppm, &reference, &reference_y, &[0u8; 4], &run).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn easy_target_produces_smaller_or_equal_output() {
        let reference = checkerboard(32, 32);
        let reference_y = reference.to_luma();
        let codec = JpegCodec;
        let run = base_run();

        // An uncompressed stand-in "input": larger than any JPEG encode of
        // this image at any quality, so the no-gain check never trips.
        let input_bytes = vec![0u8; 32 * 32 * 3 + 1000];

        let output =
            recompress(&codec, SniffedFormat::Ppm, &reference, &reference_y, &input_bytes, &run).expect("recompress failed");
        assert!(!output.is_empty());
        assert!(output.len() < input_bytes.len());
    }

    #[test]
    fn already_processed_source_copies_when_copy_on_no_gain() {
        let reference = checkerboard(16, 16);
        let reference_y = reference.to_luma();
        let codec = JpegCodec;
        let run = base_run();

        let mut source = vec![0xFFu8, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        source.extend_from_slice(b"JFIF\0\x01\x01\x00\x00\x01\x00\x01\x00\x00");
        let sentinel = run.sentinel.as_bytes();
        source.push(0xFF);
        source.push(0xFE);
        source.extend_from_slice(&((sentinel.len() + 2) as u16).to_be_bytes());
        source.extend_from_slice(sentinel);
        source.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x08, 0x01, 0x00, 0x00, 0x3F, 0x00]);
        source.extend_from_slice(&[0xFF, 0xD9]);

        let output = recompress(&codec, SniffedFormat::Jpeg, &reference, &reference_y, &source, &run).expect("recompress failed");
        assert_eq!(output, source);
    }

    #[test]
    fn already_processed_source_fails_without_copy_on_no_gain() {
        let reference = checkerboard(16, 16);
        let reference_y = reference.to_luma();
        let codec = JpegCodec;
        let mut run = base_run();
        run.copy_on_no_gain = false;

        let mut source = vec![0xFFu8, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        source.extend_from_slice(b"JFIF\0\x01\x01\x00\x00\x01\x00\x01\x00\x00");
        let sentinel = run.sentinel.as_bytes();
        source.push(0xFF);
        source.push(0xFE);
        source.extend_from_slice(&((sentinel.len() + 2) as u16).to_be_bytes());
        source.extend_from_slice(sentinel);
        source.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x08, 0x01, 0x00, 0x00, 0x3F, 0x00]);
        source.extend_from_slice(&[0xFF, 0xD9]);

        let err = recompress(&codec, SniffedFormat::Jpeg, &reference, &reference_y, &source, &run).unwrap_err();
        assert!(matches!(err, Error::AlreadyProcessed));
    }
}
