//! Crate-wide constants shared by the metadata transplanter, the bisection
//! drivers, and the CLI defaults.

/// COM payload written into every output JPEG; its presence on an input file
/// triggers the already-processed path.
pub const SENTINEL_COMMENT: &str = "Compressed by jpeg-recompress-rs";

/// Maximum number of APPn/COM markers the metadata transplanter will retain.
pub const MAX_METADATA_MARKERS: usize = 20;

/// Default number of bisection iterations ("attempts" in the original tool).
pub const DEFAULT_ATTEMPTS: u32 = 6;

/// Default JPEG quality bounds for the bisection search.
pub const DEFAULT_JPEG_MIN: u8 = 40;
pub const DEFAULT_JPEG_MAX: u8 = 95;

/// The size in bytes of the segment length field in a JPEG marker segment.
pub const SEGMENT_LENGTH_SIZE: usize = 2;

/// The maximum size of the data bytes that fit in a marker segment.
pub const SEGMENT_MAX_DATA_SIZE: usize = u16::MAX as usize - SEGMENT_LENGTH_SIZE;
