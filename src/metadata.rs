//! JPEG metadata transplanter: lifts the APPn/COM markers out of a source
//! JPEG and splices them back into a freshly produced one, alongside a
//! sentinel COM segment that marks the output as already processed.

use crate::error::{Error, Result};

/// Maximum number of APPn/COM markers retained from the source.
pub use crate::constants::MAX_METADATA_MARKERS;

/// One marker segment found while scanning a JPEG header: its offset into
/// the source buffer and its total length in bytes (marker + length field +
/// payload, or the fixed 2 bytes for SOI/RSTn/EOI).
struct Segment {
    offset: usize,
    length: usize,
}

/// Walks marker segments from offset 0 until SOS (`FF DA`), classifying each
/// by `is_retained_app`. Returns every segment found, in source order, plus
/// the offset SOS starts at (callers stop there; scan/entropy data is never
/// inspected).
fn scan_segments(source: &[u8]) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut pos = 0usize;

    while pos + 1 < source.len() {
        if source[pos] != 0xFF {
            return Err(Error::decode("expected JPEG marker start byte"));
        }
        let marker = source[pos + 1];

        if marker == 0xDA {
            break;
        }

        let length = match marker {
            0xD8 => 2,                          // SOI
            0xD0..=0xD9 => 2,                   // RSTn / EOI tail
            _ => {
                if pos + 3 >= source.len() {
                    return Err(Error::decode("truncated marker segment"));
                }
                let size = u16::from_be_bytes([source[pos + 2], source[pos + 3]]) as usize;
                if size < 2 {
                    return Err(Error::decode("invalid marker segment size"));
                }
                2 + size
            }
        };

        if pos + length > source.len() {
            return Err(Error::decode("marker segment runs past end of buffer"));
        }

        segments.push(Segment { offset: pos, length });
        pos += length;
    }

    Ok(segments)
}

/// True for APPn markers the transplanter retains (APP1-APP15; APP0 is the
/// codec's own JFIF header and is never carried across).
fn is_retained_app(marker: u8) -> bool {
    (0xE1..=0xEF).contains(&marker)
}

/// Extracts the concatenated bytes of every retained APPn/COM marker from a
/// source JPEG, in source order, capped at [`MAX_METADATA_MARKERS`].
///
/// Returns [`Error::AlreadyProcessed`] if any COM segment's payload begins
/// with `sentinel`: the source has already been run through this tool and
/// re-processing it would duplicate the metadata blob.
pub fn extract_metadata(source: &[u8], sentinel: &str) -> Result<Vec<u8>> {
    let segments = scan_segments(source)?;
    let sentinel_bytes = sentinel.as_bytes();

    let mut blob = Vec::new();
    let mut retained = 0usize;

    for segment in &segments {
        let marker = source[segment.offset + 1];
        let is_com = marker == 0xFE;
        if !is_com && !is_retained_app(marker) {
            continue;
        }

        let payload_start = segment.offset + 4; // marker(2) + length(2)
        if is_com && source.len() >= payload_start + sentinel_bytes.len() {
            let payload = &source[payload_start..payload_start + sentinel_bytes.len()];
            if payload == sentinel_bytes {
                return Err(Error::AlreadyProcessed);
            }
        }

        if retained >= MAX_METADATA_MARKERS {
            continue;
        }
        blob.extend_from_slice(&source[segment.offset..segment.offset + segment.length]);
        retained += 1;
    }

    Ok(blob)
}

/// Builds a COM segment carrying `sentinel` as its payload:
/// `FF FE 00 LL <sentinel bytes>`, `LL = len(sentinel) + 2`.
fn build_sentinel_segment(sentinel: &str) -> Vec<u8> {
    let sentinel_bytes = sentinel.as_bytes();
    let length = sentinel_bytes.len() + 2;
    let mut segment = Vec::with_capacity(2 + length);
    segment.push(0xFF);
    segment.push(0xFE);
    segment.extend_from_slice(&(length as u16).to_be_bytes());
    segment.extend_from_slice(sentinel_bytes);
    segment
}

/// Locates the segment immediately following SOI in a freshly encoded JPEG
/// stream: either `FF E0` (JFIF APP0) or `FF EE` (Adobe APP14).
/// Returns the byte range of that segment (including its own marker and
/// length field) so the caller can both preserve and skip past it.
fn locate_output_app0(new_stream: &[u8]) -> Result<std::ops::Range<usize>> {
    if new_stream.len() < 4 || new_stream[0] != 0xFF || new_stream[1] != 0xD8 {
        return Err(Error::internal("freshly encoded stream missing SOI"));
    }
    if new_stream[2] != 0xFF || (new_stream[3] != 0xE0 && new_stream[3] != 0xEE) {
        return Err(Error::internal("freshly encoded stream missing APP0/APP14 after SOI"));
    }
    let size = u16::from_be_bytes([new_stream[4], new_stream[5]]) as usize;
    let end = 2 + 2 + size;
    if end > new_stream.len() {
        return Err(Error::internal("APP0 segment runs past end of encoded stream"));
    }
    Ok(2..end)
}

/// Splices a freshly encoded JPEG stream with metadata preserved from the
/// original input, following the bit-exact output layout:
///
/// `SOI, new-stream's APP0/APP14, COM(sentinel), [retained metadata unless
/// strip], remainder of new stream past its own APP0/APP14`.
pub fn splice(new_stream: &[u8], metadata_blob: &[u8], sentinel: &str, strip: bool) -> Result<Vec<u8>> {
    let app0_range = locate_output_app0(new_stream)?;

    let mut output = Vec::with_capacity(new_stream.len() + metadata_blob.len() + sentinel.len() + 32);
    output.extend_from_slice(&new_stream[0..2]); // SOI
    output.extend_from_slice(&new_stream[app0_range.clone()]);
    output.extend_from_slice(&build_sentinel_segment(sentinel));
    if !strip {
        output.extend_from_slice(metadata_blob);
    }
    output.extend_from_slice(&new_stream[app0_range.end..]);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jfif_stream(extra_segments: &[&[u8]], sentinel_com: Option<&str>) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8]; // SOI
        bytes.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]); // APP0, length 16
        bytes.extend_from_slice(b"JFIF\0\x01\x01\x00\x00\x01\x00\x01\x00\x00");
        for segment in extra_segments {
            bytes.extend_from_slice(segment);
        }
        if let Some(sentinel) = sentinel_com {
            bytes.extend_from_slice(&build_sentinel_segment(sentinel));
        }
        bytes.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x08, 0x01, 0x00, 0x00, 0x3F, 0x00]); // SOS stub
        bytes.extend_from_slice(&[0x00, 0x00]); // entropy-coded data stub
        bytes.extend_from_slice(&[0xFF, 0xD9]); // EOI
        bytes
    }

    fn exif_app1(payload: &[u8]) -> Vec<u8> {
        let mut seg = vec![0xFF, 0xE1];
        seg.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
        seg.extend_from_slice(payload);
        seg
    }

    #[test]
    fn extracts_app1_and_com_in_order() {
        let exif = exif_app1(b"exif-data");
        let com = {
            let mut c = vec![0xFF, 0xFE];
            c.extend_from_slice(&8u16.to_be_bytes());
            c.extend_from_slice(b"hi!");
            c
        };
        let source = jfif_stream(&[&exif, &com], None);
        let blob = extract_metadata(&source, "Compressed by jpeg-recompress-rs").expect("extract failed");
        assert_eq!(blob, [exif, com].concat());
    }

    #[test]
    fn app0_itself_is_not_retained() {
        let source = jfif_stream(&[], None);
        let blob = extract_metadata(&source, "Compressed by jpeg-recompress-rs").expect("extract failed");
        assert!(blob.is_empty());
    }

    #[test]
    fn sentinel_com_triggers_already_processed() {
        let source = jfif_stream(&[], Some("Compressed by jpeg-recompress-rs"));
        let err = extract_metadata(&source, "Compressed by jpeg-recompress-rs").unwrap_err();
        assert!(matches!(err, Error::AlreadyProcessed));
    }

    #[test]
    fn caps_retained_markers_at_twenty() {
        let segments: Vec<Vec<u8>> = (0..25).map(|i| exif_app1(format!("seg{i}").as_bytes())).collect();
        let refs: Vec<&[u8]> = segments.iter().map(|s| s.as_slice()).collect();
        let source = jfif_stream(&refs, None);
        let blob = extract_metadata(&source, "Compressed by jpeg-recompress-rs").expect("extract failed");
        let retained_count = segments.iter().take(MAX_METADATA_MARKERS).map(|s| s.len()).sum::<usize>();
        assert_eq!(blob.len(), retained_count);
    }

    #[test]
    fn splice_preserves_metadata_and_adds_sentinel() {
        let new_stream = jfif_stream(&[], None);
        let metadata = exif_app1(b"carried-over");
        let spliced = splice(&new_stream, &metadata, "Compressed by jpeg-recompress-rs", false).expect("splice failed");

        assert_eq!(&spliced[0..2], &[0xFF, 0xD8]);
        assert_eq!(&spliced[2..4], &[0xFF, 0xE0]);
        let app0_len = u16::from_be_bytes([spliced[4], spliced[5]]) as usize;
        let com_start = 2 + 2 + app0_len;
        assert_eq!(&spliced[com_start..com_start + 2], &[0xFF, 0xFE]);

        let com_len = u16::from_be_bytes([spliced[com_start + 2], spliced[com_start + 3]]) as usize;
        let sentinel_payload = &spliced[com_start + 4..com_start + 2 + com_len];
        assert_eq!(sentinel_payload, b"Compressed by jpeg-recompress-rs");

        let metadata_start = com_start + 2 + com_len;
        assert_eq!(&spliced[metadata_start..metadata_start + metadata.len()], metadata.as_slice());
    }

    #[test]
    fn splice_honours_strip() {
        let new_stream = jfif_stream(&[], None);
        let metadata = exif_app1(b"dropped");
        let spliced = splice(&new_stream, &metadata, "Compressed by jpeg-recompress-rs", true).expect("splice failed");
        assert!(!spliced.windows(metadata.len()).any(|w| w == metadata.as_slice()));
    }

    #[test]
    fn round_trip_reextraction_finds_sentinel() {
        let new_stream = jfif_stream(&[], None);
        let spliced = splice(&new_stream, &[], "Compressed by jpeg-recompress-rs", false).expect("splice failed");
        let err = extract_metadata(&spliced, "Compressed by jpeg-recompress-rs").unwrap_err();
        assert!(matches!(err, Error::AlreadyProcessed));
    }
}
