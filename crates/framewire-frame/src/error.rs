/// Errors that can occur during frame construction, encoding and decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The type tag is not one of the known body serialization formats.
    #[error("invalid frame type: {actual}, supported types: {supported:?}")]
    InvalidFrameType {
        actual: u8,
        supported: &'static [u8],
    },

    /// The protocol version is not in the supported set.
    #[error("unsupported protocol version: {actual}, supported versions: {supported:?}")]
    UnsupportedVersion {
        actual: u8,
        supported: &'static [u8],
    },

    /// A body or a stream buffer exceeds its configured maximum.
    #[error("message too long: {size} bytes, maximum allowed is {max} bytes")]
    MessageTooLong { size: usize, max: usize },

    /// The input is too short or otherwise malformed.
    #[error("invalid frame format: {detail}")]
    InvalidFrame { detail: String },

    /// A caller-supplied destination buffer cannot hold the encoded frame.
    #[error("buffer too small: need {needed} bytes, got {available} bytes")]
    BufferTooSmall { needed: usize, available: usize },

    /// An I/O error occurred on the byte source or sink.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source reached end of input with no buffered data.
    #[error("end of stream")]
    EndOfStream,

    /// The connection was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

/// Stable numeric classification of [`FrameError`] kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCode {
    Unknown = 0,
    MessageTooLong = 1,
    InvalidFrame = 2,
    UnsupportedVersion = 3,
    InvalidFrameType = 4,
    BufferTooSmall = 5,
}

impl FrameError {
    /// Numeric code for this error, suitable for wire-level error reporting.
    pub fn code(&self) -> ErrorCode {
        match self {
            FrameError::InvalidFrameType { .. } => ErrorCode::InvalidFrameType,
            FrameError::UnsupportedVersion { .. } => ErrorCode::UnsupportedVersion,
            FrameError::MessageTooLong { .. } => ErrorCode::MessageTooLong,
            FrameError::InvalidFrame { .. } => ErrorCode::InvalidFrame,
            FrameError::BufferTooSmall { .. } => ErrorCode::BufferTooSmall,
            FrameError::Io(_) | FrameError::EndOfStream | FrameError::ConnectionClosed => {
                ErrorCode::Unknown
            }
        }
    }

    pub(crate) fn invalid_frame(detail: impl Into<String>) -> Self {
        FrameError::InvalidFrame {
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
