use commprims_frame::FrameError;

/// Why one pipeline iteration did not deliver an item.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// The byte source failed.
    #[error("read failed: {0}")]
    Read(#[source] std::io::Error),

    /// The byte source reached end of stream before filling the window.
    #[error("source closed (incomplete window)")]
    SourceClosed,

    /// The packer found no item in the bytes read so far.
    #[error("no frame in window")]
    NoFrame,

    /// The item source had nothing new to send.
    #[error("item source empty")]
    SourceEmpty,

    /// The unpacker could not encode the item.
    #[error("unpack failed: {0}")]
    Unpack(#[from] FrameError),

    /// The byte sink failed.
    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),
}

impl TaskError {
    /// Routine misses that a streaming loop should ride through.
    pub fn is_routine(&self) -> bool {
        matches!(self, Self::NoFrame | Self::SourceEmpty)
    }

    /// Failures of the underlying byte stream.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Read(_) | Self::Write(_) | Self::SourceClosed)
    }
}

pub type Result<T> = std::result::Result<T, TaskError>;
