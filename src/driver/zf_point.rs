//! ZF-point locator: locates the quality at which the metric-vs-quality
//! curve stops tracking quality linearly, reusing the target-quality
//! driver's encode/decode/finalize machinery with a deviation-slope
//! objective instead of a UM-vs-target comparison.

use super::{encode_and_reconstruct, finalize, pre_check, Candidate, PreCheck};
use crate::codec::{Codec, SniffedFormat};
use crate::error::{Error, Result};
use crate::image::ImageBuffer;
use crate::metrics::cor;
use crate::rescale::sigma;
use crate::run::Run;

/// The correlation-based objective this driver bisects against. The source
/// tool's "corsharp" metric has no separate reference implementation in
/// this crate's metric library; this crate treats it as the raw
/// correlation metric (`cor`), which has the same monotonic direction
/// (higher means more similar) the deviation-slope search expects. See
/// DESIGN.md for this resolution.
fn metric_corsharp(reference_y: &[u8], candidate_y: &[u8]) -> f32 {
    cor(reference_y, candidate_y)
}

/// Runs the ZF-point search and returns the final output bytes, ready to
/// be written to the sink.
pub fn locate(
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

    let metadata = match pre_check(sniffed, input_bytes, run)? {
        PreCheck::AlreadyProcessedCopy(bytes) => return Ok(bytes),
        PreCheck::Proceed { metadata } => metadata,
    };

    let q_min = run.jpeg_min;
    let q_max = run.jpeg_max;

    let (max_bytes, max_y) = encode_and_reconstruct(codec, reference, run, q_max, false, run.accurate)?;
    let m_max = sigma(metric_corsharp(reference_y, &max_y));
    let qm = m_max / q_max as f32;
    let mut d_max = qm * q_max as f32 - m_max;

    let (_min_bytes, min_y) = encode_and_reconstruct(codec, reference, run, q_min, false, run.accurate)?;
    let m_min = sigma(metric_corsharp(reference_y, &min_y));
    let mut d_min = qm * q_min as f32 - m_min;

    let mut lo = q_min;
    let mut hi = q_max;
    let mut last_good = Some(Candidate { bytes: max_bytes, quality: q_max, objective: d_max });
    let attempts = crate::constants::DEFAULT_ATTEMPTS;

    for i in (0..attempts).rev() {
        let terminal = i == 0 || lo == hi;
        let q = if lo == hi { lo } else { lo + (hi - lo + 1) / 2 };
        let progressive = terminal;
        let optimize = run.accurate || terminal;

        let (bytes, candidate_y) = encode_and_reconstruct(codec, reference, run, q, progressive, optimize)?;
        if candidate_y.len() != reference_y.len() {
            return Err(Error::internal("reconstructed candidate dimensions do not match the reference"));
        }
        let d_q = qm * q as f32 - sigma(metric_corsharp(reference_y, &candidate_y));

        if !run.quiet {
            eprintln!("quality {q}: deviation {d_q:.4} (d_min {d_min:.4}, d_max {d_max:.4}) ({} bytes)", bytes.len());
        }

        if d_min < d_max {
            lo = (q + 1).min(hi);
            d_min = d_q;
        } else {
            hi = q.saturating_sub(1).max(lo);
            d_max = d_q;
        }
        last_good = Some(Candidate { bytes, quality: q, objective: d_q });

        if terminal {
            break;
        }
    }

    finalize(last_good, &metadata, input_bytes, run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::jpeg::JpegCodec;
    use crate::image::PixelFormat;
    use crate::run::{Method, OutputFormat, PresetTable, Target};

    fn gradient(width: usize, height: usize) -> ImageBuffer {
        let mut data = vec![0u8; width * height * 3];
        for y in 0..height {
            for x in 0..width {
                let idx = (y * width + x) * 3;
                let v = ((x * 7 + y * 11) % 256) as u8;
                data[idx] = v;
                data[idx + 1] = v;
                data[idx + 2] = v;
            }
        }
        ImageBuffer::new(width, height, PixelFormat::Rgb, data)
    }

    fn base_run() -> Run {
        Run {
            method: Method::Cor,
            target: Target::Value(0.75),
            preset_table: PresetTable::Current,
            jpeg_min: 10,
            jpeg_max: 95,
            subsampling: crate::image::Subsampling::Disabled,
            output_format: OutputFormat::Jpeg,
            strip_metadata: false,
            force: true,
            copy_on_no_gain: true,
            accurate: false,
            quiet: true,
            sentinel: crate::constants::SENTINEL_COMMENT.to_string(),
        }
    }

    #[test]
    fn locates_a_quality_within_bounds() {
        let reference = gradient(32, 32);
        let reference_y = reference.to_luma();
        let codec = JpegCodec;
        let run = base_run();
        let input_bytes = vec![0u8; 32 * 32 * 3 + 1000];

        let output =
            locate(&codec, SniffedFormat::Ppm, &reference, &reference_y, &input_bytes, &run).expect("locate failed");
        assert!(!output.is_empty());
    }

    #[test]
    fn rejects_inverted_quality_bounds() {
        let reference = gradient(16, 16);
        let reference_y = reference.to_luma();
        let codec = JpegCodec;
        let mut run = base_run();
        run.jpeg_min = 90;
        run.jpeg_max = 10;
        let err = locate(&codec, SniffedFormat::Ppm, &reference, &reference_y, &[0u8; 4], &run).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
