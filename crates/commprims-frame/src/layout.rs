use std::ops::Range;

use crate::error::{FrameError, Result};

/// Default start-of-frame sentinel: `'!'`.
pub const DEFAULT_HEADER: u8 = b'!';

/// Default end-of-frame sentinel: `'\n'`.
pub const DEFAULT_TRAILER: u8 = b'\n';

/// Default payload size in bytes.
pub const DEFAULT_PAYLOAD_LEN: usize = 5;

/// Bytes a frame carries besides its payload: header + kind + trailer.
pub const FRAME_OVERHEAD: usize = 3;

/// Offset of the header byte.
pub const HEADER_OFFSET: usize = 0;

/// Offset of the kind byte.
pub const KIND_OFFSET: usize = 1;

/// Offset of the first payload byte.
pub const PAYLOAD_OFFSET: usize = 2;

/// Runtime description of a frame's byte layout.
///
/// Wire format (no padding, host byte order inside the payload):
/// ```text
/// ┌──────────┬──────────┬──────────────────────┬───────────┐
/// │ Header   │ Kind     │ Payload              │ Trailer   │
/// │ (1B)     │ (1B)     │ (payload_len bytes)  │ (1B)      │
/// └──────────┴──────────┴──────────────────────┴───────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    /// Number of opaque payload bytes.
    pub payload_len: usize,
    /// Start-of-frame sentinel.
    pub header: u8,
    /// End-of-frame sentinel.
    pub trailer: u8,
}

impl Default for FrameLayout {
    fn default() -> Self {
        Self {
            payload_len: DEFAULT_PAYLOAD_LEN,
            header: DEFAULT_HEADER,
            trailer: DEFAULT_TRAILER,
        }
    }
}

impl FrameLayout {
    /// Create a layout with the default sentinels.
    pub fn new(payload_len: usize) -> Self {
        Self {
            payload_len,
            ..Self::default()
        }
    }

    /// Replace the sentinel bytes.
    pub fn with_sentinels(mut self, header: u8, trailer: u8) -> Self {
        self.header = header;
        self.trailer = trailer;
        self
    }

    /// Total frame size: `payload_len + 3`.
    pub fn frame_len(&self) -> usize {
        self.payload_len + FRAME_OVERHEAD
    }

    /// Byte range of the payload inside a frame.
    pub fn payload_range(&self) -> Range<usize> {
        PAYLOAD_OFFSET..PAYLOAD_OFFSET + self.payload_len
    }

    /// Offset of the trailer byte.
    pub fn trailer_offset(&self) -> usize {
        PAYLOAD_OFFSET + self.payload_len
    }

    /// Size of the backing buffer a resynchronizer needs for this layout.
    pub fn resync_buffer_len(&self) -> usize {
        2 * self.frame_len()
    }

    /// Reject layouts that cannot be told apart from an empty stream.
    pub fn validate(&self) -> Result<()> {
        if self.header == self.trailer {
            return Err(FrameError::InvalidLayout(format!(
                "header and trailer must differ (both 0x{:02X})",
                self.header
            )));
        }
        Ok(())
    }

    /// Check that `window` has exactly the size of one frame.
    pub fn check_len(&self, window: &[u8]) -> Result<()> {
        if window.len() != self.frame_len() {
            return Err(FrameError::LengthMismatch {
                expected: self.frame_len(),
                actual: window.len(),
            });
        }
        Ok(())
    }
}
