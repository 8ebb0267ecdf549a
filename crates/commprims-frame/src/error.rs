/// Errors that can occur while building or decoding frames.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FrameError {
    /// The resynchronizer buffer cannot hold two non-empty windows.
    #[error("resync buffer too small ({len} bytes, need at least 2)")]
    WindowTooSmall { len: usize },

    /// The resynchronizer buffer cannot be split into two equal windows.
    #[error("resync buffer length must be even (got {len} bytes)")]
    OddBuffer { len: usize },

    /// A byte sequence does not have the exact length of a frame.
    #[error("frame length mismatch (expected {expected} bytes, got {actual})")]
    LengthMismatch { expected: usize, actual: usize },

    /// A typed payload view was requested with the wrong size.
    #[error("payload size mismatch (frame carries {expected} bytes, type needs {actual})")]
    PayloadSizeMismatch { expected: usize, actual: usize },

    /// An output buffer is shorter than one frame.
    #[error("destination too small ({actual} bytes, need {needed})")]
    DestinationTooSmall { needed: usize, actual: usize },

    /// A frame layout description is unusable.
    #[error("invalid frame layout: {0}")]
    InvalidLayout(String),
}

pub type Result<T> = std::result::Result<T, FrameError>;
