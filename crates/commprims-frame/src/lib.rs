//! Fixed-layout message frames and ping-pong stream resynchronization.
//!
//! Every frame has the same shape:
//! - a 1-byte header sentinel marking the start of a frame
//! - a 1-byte kind discriminator
//! - an opaque payload of a statically agreed size
//! - a 1-byte trailer sentinel
//!
//! Frames are recovered from raw byte streams that may start mid-frame or
//! carry garbage, one window-sized fill at a time.

pub mod error;
pub mod hex;
pub mod layout;
pub mod message;
pub mod payload;
pub mod resync;
pub mod validator;

pub use error::{FrameError, Result};
pub use hex::{parse_hex, HexBytes};
pub use layout::{
    FrameLayout, DEFAULT_HEADER, DEFAULT_PAYLOAD_LEN, DEFAULT_TRAILER, FRAME_OVERHEAD,
};
pub use message::{checksum, MessageFrame, RawFrame};
pub use payload::{decode_from, encode_into, FixedLayout};
pub use resync::{FrameResynchronizer, ResyncStats};
pub use validator::{ChecksumValidator, FrameValidator, SentinelValidator};
