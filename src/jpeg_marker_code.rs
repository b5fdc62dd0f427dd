use crate::error::CodecError;

/// Baseline JPEG marker codes (ISO/IEC 10918-1) relevant to the encoder,
/// decoder, and metadata transplanter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum JpegMarkerCode {
    /// SOF0: Start of frame, baseline DCT.
    StartOfFrameBaseline = 0xC0,
    /// SOF2: Start of frame, progressive DCT. Written by the encoder's
    /// non-interleaved multi-scan path when `CodecParams::progressive` is
    /// set (see `Jpeg1Encoder::encode_planar`); not true spectral-selection
    /// progressive DCT, see DESIGN.md.
    StartOfFrameProgressive = 0xC2,
    /// DHT: Defines one or more Huffman tables.
    DefineHuffmanTable = 0xC4,

    /// RST0-RST7: Restart markers, used to resynchronize the bitstream.
    Restart0 = 0xD0,
    Restart1 = 0xD1,
    Restart2 = 0xD2,
    Restart3 = 0xD3,
    Restart4 = 0xD4,
    Restart5 = 0xD5,
    Restart6 = 0xD6,
    Restart7 = 0xD7,

    /// SOI: Marks the start of an image.
    StartOfImage = 0xD8,

    /// EOI: Marks the end of an image.
    EndOfImage = 0xD9,

    /// SOS: Marks the start of scan.
    StartOfScan = 0xDA,

    /// DQT: Defines one or more quantization tables.
    DefineQuantizationTable = 0xDB,

    /// DRI: Defines the restart interval used in succeeding scans.
    DefineRestartInterval = 0xDD,

    /// APP0: Application data 0: used for the JFIF header.
    ApplicationData0 = 0xE0,
    /// APP1-APP15: used for EXIF/XMP/ICC/etc, retained verbatim by the
    /// metadata transplanter.
    ApplicationData1 = 0xE1,
    ApplicationData2 = 0xE2,
    ApplicationData3 = 0xE3,
    ApplicationData4 = 0xE4,
    ApplicationData5 = 0xE5,
    ApplicationData6 = 0xE6,
    ApplicationData7 = 0xE7,
    ApplicationData8 = 0xE8,
    ApplicationData9 = 0xE9,
    ApplicationData10 = 0xEA,
    ApplicationData11 = 0xEB,
    ApplicationData12 = 0xEC,
    ApplicationData13 = 0xED,
    ApplicationData14 = 0xEE,
    ApplicationData15 = 0xEF,

    /// COM: Comment block; carries the sentinel on output.
    Comment = 0xFE,
}

impl std::convert::TryFrom<u8> for JpegMarkerCode {
    type Error = CodecError;
    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0xC0 => Ok(Self::StartOfFrameBaseline),
            0xC2 => Ok(Self::StartOfFrameProgressive),
            0xC4 => Ok(Self::DefineHuffmanTable),
            0xD0 => Ok(Self::Restart0),
            0xD1 => Ok(Self::Restart1),
            0xD2 => Ok(Self::Restart2),
            0xD3 => Ok(Self::Restart3),
            0xD4 => Ok(Self::Restart4),
            0xD5 => Ok(Self::Restart5),
            0xD6 => Ok(Self::Restart6),
            0xD7 => Ok(Self::Restart7),
            0xD8 => Ok(Self::StartOfImage),
            0xD9 => Ok(Self::EndOfImage),
            0xDA => Ok(Self::StartOfScan),
            0xDB => Ok(Self::DefineQuantizationTable),
            0xDD => Ok(Self::DefineRestartInterval),
            0xE0 => Ok(Self::ApplicationData0),
            0xE1 => Ok(Self::ApplicationData1),
            0xE2 => Ok(Self::ApplicationData2),
            0xE3 => Ok(Self::ApplicationData3),
            0xE4 => Ok(Self::ApplicationData4),
            0xE5 => Ok(Self::ApplicationData5),
            0xE6 => Ok(Self::ApplicationData6),
            0xE7 => Ok(Self::ApplicationData7),
            0xE8 => Ok(Self::ApplicationData8),
            0xE9 => Ok(Self::ApplicationData9),
            0xEA => Ok(Self::ApplicationData10),
            0xEB => Ok(Self::ApplicationData11),
            0xEC => Ok(Self::ApplicationData12),
            0xED => Ok(Self::ApplicationData13),
            0xEE => Ok(Self::ApplicationData14),
            0xEF => Ok(Self::ApplicationData15),
            0xFE => Ok(Self::Comment),
            _ => Err(CodecError::UnknownJpegMarkerFound),
        }
    }
}

pub const JPEG_MARKER_START_BYTE: u8 = 0xFF;
pub const JPEG_RESTART_MARKER_BASE: u8 = 0xD0;
pub const JPEG_RESTART_MARKER_RANGE: u8 = 8;
