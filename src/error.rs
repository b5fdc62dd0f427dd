use thiserror::Error;

/// Low-level wire/bitstream errors raised by the JPEG marker reader/writer and
/// the baseline entropy coder. Callers one level up fold these into the
/// context-appropriate variant of [`Error`] (a decode failure during the
/// initial read is a different user-facing situation than one during the
/// driver's internal re-decode of its own output).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    #[error("destination buffer too small")]
    DestinationTooSmall = 1,
    #[error("invalid or corrupt JPEG data")]
    InvalidData = 2,
    #[error("parameter value not supported")]
    ParameterValueNotSupported = 3,
    #[error("JPEG marker start byte not found")]
    JpegMarkerStartByteNotFound = 4,
    #[error("start of image marker not found")]
    StartOfImageMarkerNotFound = 5,
    #[error("unknown JPEG marker found")]
    UnknownJpegMarkerFound = 6,
    #[error("invalid marker segment size")]
    InvalidMarkerSegmentSize = 7,
    #[error("end of image marker not found")]
    EndOfImageMarkerNotFound = 8,
}

/// Top-level error type for the recompression core. One variant per
/// taxonomy entry; exit-code mapping lives alongside the CLI (`exit_code_for`
/// in `src/bin/jpeg-recompress.rs`).
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("encode failed: {0}")]
    Encode(String),

    #[error("internal error: {0}")]
    Internal(String),

    /// Source already carries the sentinel COM; soft success (copy) or hard
    /// error depending on `copy_on_no_gain`.
    #[error("file already processed")]
    AlreadyProcessed,

    /// Every candidate was at least as large as the input; soft/hard per
    /// `copy_on_no_gain` (the no-gain policy).
    #[error("no size gain achievable within quality bounds")]
    NoGain,
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Error::Decode(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Error::Encode(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }
}

impl From<CodecError> for Error {
    /// Wire-level failures encountered while reading caller-supplied bytes
    /// are reported as decode errors; re-decoding the driver's own freshly
    /// encoded bytes is reported via `Error::internal` instead.
    fn from(e: CodecError) -> Self {
        Error::Decode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
