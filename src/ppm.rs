//! PPM (Portable Pixmap, P6) decoder. Only the 8-bit-depth (`maxval == 255`)
//! variant is accepted; the host crate has no existing image-file reader to
//! build on, so this is implemented directly against the raw byte stream.

use crate::error::{CodecError, Error, Result};
use crate::image::{ImageBuffer, PixelFormat};

/// Parses a P6 PPM image. Tolerates a single `#`-prefixed comment line
/// anywhere among the three whitespace-separated header tokens.
pub fn decode(bytes: &[u8]) -> Result<ImageBuffer> {
    if bytes.len() < 2 || &bytes[0..2] != b"P6" {
        return Err(Error::decode("not a P6 PPM (bad magic)"));
    }

    let mut pos = 2;
    let mut tokens: Vec<u32> = Vec::with_capacity(3);

    while tokens.len() < 3 {
        // Skip whitespace.
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= bytes.len() {
            return Err(Error::decode("truncated PPM header"));
        }
        if bytes[pos] == b'#' {
            while pos < bytes.len() && bytes[pos] != b'\n' {
                pos += 1;
            }
            continue;
        }
        let start = pos;
        while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let token = std::str::from_utf8(&bytes[start..pos])
            .map_err(|_| Error::decode("non-ASCII PPM header token"))?;
        let value: u32 = token
            .parse()
            .map_err(|_| Error::decode("malformed PPM header token"))?;
        tokens.push(value);
    }

    let width = tokens[0] as usize;
    let height = tokens[1] as usize;
    let maxval = tokens[2];
    if maxval != 255 {
        return Err(CodecError::ParameterValueNotSupported.into());
    }

    // A single whitespace byte separates the header from the pixel data.
    if pos >= bytes.len() || !bytes[pos].is_ascii_whitespace() {
        return Err(Error::decode("missing PPM header terminator"));
    }
    pos += 1;

    let pixel_len = width * height * 3;
    if bytes.len() - pos < pixel_len {
        return Err(Error::decode("truncated PPM pixel data"));
    }

    let data = bytes[pos..pos + pixel_len].to_vec();
    Ok(ImageBuffer::new(width, height, PixelFormat::Rgb, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_four_by_two_sample() {
        let mut bytes = b"P6\n4 2\n255\n".to_vec();
        for i in 0..8u8 {
            let v = if i % 2 == 0 { 0x00 } else { 0xFF };
            bytes.extend_from_slice(&[v, v, v]);
        }
        let image = decode(&bytes).expect("decode failed");
        assert_eq!(image.width, 4);
        assert_eq!(image.height, 2);
        assert_eq!(image.data.len(), 4 * 2 * 3);
        assert_eq!(image.data[0..3], [0, 0, 0]);
        assert_eq!(image.data[3..6], [0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn rejects_non_255_maxval() {
        let bytes = b"P6\n1 1\n15\n\x00\x00\x00".to_vec();
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn tolerates_comment_line_in_header() {
        let mut bytes = b"P6\n# a comment\n4 2\n255\n".to_vec();
        bytes.extend_from_slice(&[0u8; 24]);
        let image = decode(&bytes).expect("decode failed");
        assert_eq!((image.width, image.height), (4, 2));
    }
}
