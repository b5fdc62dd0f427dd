//! Bisection drivers: couple a `Codec`, the metric library, and the
//! metadata transplanter into the two search strategies this crate exposes
//! over the codec's integer quality axis, target-quality recompression and
//! ZF-point location. Both share the encode/decode inner loop and the
//! no-gain/already-processed resolution below; only the objective function
//! differs.

pub mod target_quality;
pub mod zf_point;

use crate::codec::{Codec, SniffedFormat};
use crate::error::{Error, Result};
use crate::image::{CodecParams, Colorspace, ImageBuffer};
use crate::run::{OutputFormat, Run};

/// One candidate encode produced during a search: its bytes, the quality
/// that produced them, and the objective value that made it the current
/// best (UM value for the target-quality driver, deviation for ZF-point).
#[derive(Debug, Clone)]
pub struct Candidate {
    pub bytes: Vec<u8>,
    pub quality: u8,
    pub objective: f32,
}

/// The outcome of checking a source for the sentinel COM before a search
/// begins.
pub(crate) enum PreCheck {
    /// Not already processed (or not a JPEG, which can't carry the
    /// sentinel); carries the metadata blob to splice into the eventual
    /// output.
    Proceed { metadata: Vec<u8> },
    /// Already processed and `copy_on_no_gain` is set: the soft-success
    /// path, a byte-identical copy of the input.
    AlreadyProcessedCopy(Vec<u8>),
}

/// Scans a JPEG source for the sentinel COM up front, before either driver's
/// search loop runs. Non-JPEG sources never carry the sentinel and proceed
/// with an empty metadata blob.
pub(crate) fn pre_check(sniffed: SniffedFormat, input_bytes: &[u8], run: &Run) -> Result<PreCheck> {
    if sniffed != SniffedFormat::Jpeg {
        return Ok(PreCheck::Proceed { metadata: Vec::new() });
    }
    match crate::metadata::extract_metadata(input_bytes, &run.sentinel) {
        Ok(metadata) => Ok(PreCheck::Proceed { metadata }),
        Err(Error::AlreadyProcessed) => {
            if run.copy_on_no_gain {
                Ok(PreCheck::AlreadyProcessedCopy(input_bytes.to_vec()))
            } else {
                Err(Error::AlreadyProcessed)
            }
        }
        Err(other) => Err(other),
    }
}

/// Encodes `reference` at `quality` with the given progressive/optimize
/// combination, then re-decodes it to a luma plane so the caller can score
/// it against the reference. Re-decode failure is always `Error::internal`:
/// the bytes came from this crate's own encoder one statement earlier, so a
/// decode failure here means the adapter produced something its own decoder
/// can't read, not a caller-supplied-data problem.
pub(crate) fn encode_and_reconstruct(
    codec: &dyn Codec,
    reference: &ImageBuffer,
    run: &Run,
    quality: u8,
    progressive: bool,
    optimize: bool,
) -> Result<(Vec<u8>, Vec<u8>)> {
    let colorspace = if run.output_format == OutputFormat::WebP {
        Colorspace::Rgb
    } else {
        Colorspace::YCbCr
    };
    let params = CodecParams {
        quality,
        colorspace,
        progressive,
        optimize_coding: optimize,
        subsampling: run.subsampling,
    };

    log::trace!("encoding candidate at quality={quality} progressive={progressive} optimize={optimize}");
    let bytes = codec.encode(reference, &params)?;
    let decoded = codec
        .decode(&bytes)
        .map_err(|_| Error::internal("re-decode of freshly encoded candidate failed"))?;
    let candidate_y = decoded.image.to_luma();
    Ok((bytes, candidate_y))
}

/// Resolves the accepted candidate (if any) against the no-gain policy
/// and, for JPEG output, splices the preserved metadata and sentinel
/// comment into it. WebP output is never metadata-transplanted.
pub(crate) fn finalize(
    candidate: Option<Candidate>,
    metadata: &[u8],
    input_bytes: &[u8],
    run: &Run,
) -> Result<Vec<u8>> {
    let use_candidate = candidate
        .as_ref()
        .is_some_and(|c| c.bytes.len() < input_bytes.len() || run.force);

    if use_candidate {
        let candidate = candidate.expect("use_candidate implies Some");
        if run.output_format == OutputFormat::Jpeg {
            crate::metadata::splice(&candidate.bytes, metadata, &run.sentinel, run.strip_metadata)
        } else {
            Ok(candidate.bytes)
        }
    } else if run.copy_on_no_gain {
        Ok(input_bytes.to_vec())
    } else {
        Err(Error::NoGain)
    }
}
