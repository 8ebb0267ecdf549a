use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::layout::{
    FrameLayout, DEFAULT_HEADER, DEFAULT_TRAILER, FRAME_OVERHEAD, HEADER_OFFSET, KIND_OFFSET,
    PAYLOAD_OFFSET,
};
use crate::payload::{self, FixedLayout};

/// Wrapping byte sum used by checksummed frames.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// A fixed-size message frame with an `N`-byte payload.
///
/// The frame is a plain value: it is built by the producer, copied through
/// exchanges and resynchronizers, and never shared mutably.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageFrame<const N: usize> {
    /// Start-of-frame sentinel.
    pub header: u8,
    /// Application-defined discriminator.
    pub kind: u8,
    /// Opaque payload.
    pub payload: [u8; N],
    /// End-of-frame sentinel.
    pub trailer: u8,
}

impl<const N: usize> Default for MessageFrame<N> {
    fn default() -> Self {
        Self::new(0, [0; N])
    }
}

impl<const N: usize> MessageFrame<N> {
    /// Payload size in bytes.
    pub const PAYLOAD_LEN: usize = N;

    /// Total wire size: payload + header + kind + trailer.
    pub const FULL_LEN: usize = N + FRAME_OVERHEAD;

    /// Create a frame with the default sentinels.
    pub fn new(kind: u8, payload: [u8; N]) -> Self {
        Self {
            header: DEFAULT_HEADER,
            kind,
            payload,
            trailer: DEFAULT_TRAILER,
        }
    }

    /// Create a frame with the sentinels of `layout`.
    ///
    /// Fails when `layout` describes a different payload size.
    pub fn with_layout(layout: &FrameLayout, kind: u8, payload: [u8; N]) -> Result<Self> {
        if layout.payload_len != N {
            return Err(FrameError::PayloadSizeMismatch {
                expected: N,
                actual: layout.payload_len,
            });
        }
        Ok(Self {
            header: layout.header,
            kind,
            payload,
            trailer: layout.trailer,
        })
    }

    /// Create a frame whose payload is the encoding of `value`.
    pub fn from_value<T: FixedLayout>(kind: u8, value: &T) -> Result<Self> {
        let mut frame = Self::new(kind, [0; N]);
        frame.set_payload(value)?;
        Ok(frame)
    }

    /// The layout this frame follows.
    pub fn layout(&self) -> FrameLayout {
        FrameLayout {
            payload_len: N,
            header: self.header,
            trailer: self.trailer,
        }
    }

    /// Decode the payload as `T`.
    ///
    /// Fails immediately when `T::SIZE` differs from `N`.
    pub fn payload_as<T: FixedLayout>(&self) -> Result<T> {
        payload::decode_from(&self.payload)
    }

    /// Replace the payload with the encoding of `value`.
    ///
    /// Fails immediately when `T::SIZE` differs from `N`; the payload is left
    /// untouched in that case.
    pub fn set_payload<T: FixedLayout>(&mut self, value: &T) -> Result<()> {
        payload::encode_into(value, &mut self.payload)
    }

    /// Store the checksum of kind + payload[..N-1] in the last payload byte.
    ///
    /// Frames with an empty payload have nowhere to store it and are left as is.
    pub fn seal_checksum(&mut self) {
        if let Some((last, body)) = self.payload.split_last_mut() {
            *last = self.kind.wrapping_add(checksum(body));
        }
    }

    /// Append the wire bytes of this frame to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(Self::FULL_LEN);
        dst.put_u8(self.header);
        dst.put_u8(self.kind);
        dst.put_slice(&self.payload);
        dst.put_u8(self.trailer);
    }

    /// Write the wire bytes of this frame into the start of `dst`.
    pub fn write_to(&self, dst: &mut [u8]) -> Result<()> {
        if dst.len() < Self::FULL_LEN {
            return Err(FrameError::DestinationTooSmall {
                needed: Self::FULL_LEN,
                actual: dst.len(),
            });
        }
        dst[HEADER_OFFSET] = self.header;
        dst[KIND_OFFSET] = self.kind;
        dst[PAYLOAD_OFFSET..PAYLOAD_OFFSET + N].copy_from_slice(&self.payload);
        dst[PAYLOAD_OFFSET + N] = self.trailer;
        Ok(())
    }

    /// The wire bytes of this frame.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = vec![0u8; Self::FULL_LEN];
        out[HEADER_OFFSET] = self.header;
        out[KIND_OFFSET] = self.kind;
        out[PAYLOAD_OFFSET..PAYLOAD_OFFSET + N].copy_from_slice(&self.payload);
        out[PAYLOAD_OFFSET + N] = self.trailer;
        out
    }

    /// Decode a frame from exactly `N + 3` bytes.
    ///
    /// Only the length is checked. Whether the bytes form an acceptable frame
    /// is up to a [`FrameValidator`](crate::validator::FrameValidator).
    pub fn decode(src: &[u8]) -> Result<Self> {
        if src.len() != Self::FULL_LEN {
            return Err(FrameError::LengthMismatch {
                expected: Self::FULL_LEN,
                actual: src.len(),
            });
        }
        let mut payload = [0u8; N];
        payload.copy_from_slice(&src[PAYLOAD_OFFSET..PAYLOAD_OFFSET + N]);
        Ok(Self {
            header: src[HEADER_OFFSET],
            kind: src[KIND_OFFSET],
            payload,
            trailer: src[PAYLOAD_OFFSET + N],
        })
    }
}

/// An owned frame whose payload size is only known at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    bytes: Bytes,
}

impl RawFrame {
    /// Wrap frame bytes. The layout's size must match; content is not checked.
    pub fn new(layout: &FrameLayout, bytes: impl Into<Bytes>) -> Result<Self> {
        let bytes = bytes.into();
        layout.check_len(&bytes)?;
        Ok(Self { bytes })
    }

    pub fn header(&self) -> u8 {
        self.bytes[HEADER_OFFSET]
    }

    pub fn kind(&self) -> u8 {
        self.bytes[KIND_OFFSET]
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes[PAYLOAD_OFFSET..self.bytes.len() - 1]
    }

    pub fn trailer(&self) -> u8 {
        self.bytes[self.bytes.len() - 1]
    }

    /// The full wire bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Total wire size.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false: a frame carries at least its three framing bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Convert into a statically sized frame.
    pub fn to_message<const N: usize>(&self) -> Result<MessageFrame<N>> {
        MessageFrame::decode(&self.bytes)
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

impl<const N: usize> From<MessageFrame<N>> for RawFrame {
    fn from(frame: MessageFrame<N>) -> Self {
        Self {
            bytes: Bytes::from(frame.to_vec()),
        }
    }
}
