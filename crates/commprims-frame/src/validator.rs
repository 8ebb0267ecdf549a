use crate::layout::{FrameLayout, HEADER_OFFSET, KIND_OFFSET};
use crate::message::checksum;

/// Decides whether a candidate window is an acceptable frame.
///
/// Implementations must be pure and must reject windows whose length differs
/// from the frame size they were built for.
pub trait FrameValidator {
    fn validate(&self, window: &[u8]) -> bool;
}

impl<F> FrameValidator for F
where
    F: Fn(&[u8]) -> bool,
{
    fn validate(&self, window: &[u8]) -> bool {
        self(window)
    }
}

/// Accepts windows of the right length with matching header and trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentinelValidator {
    layout: FrameLayout,
}

impl SentinelValidator {
    pub fn new(layout: FrameLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }
}

impl FrameValidator for SentinelValidator {
    fn validate(&self, window: &[u8]) -> bool {
        window.len() == self.layout.frame_len()
            && window[HEADER_OFFSET] == self.layout.header
            && window[self.layout.trailer_offset()] == self.layout.trailer
    }
}

/// Sentinel check plus a wrapping byte-sum checksum.
///
/// The last payload byte must equal the sum of the kind byte and the
/// remaining payload bytes, as written by
/// [`MessageFrame::seal_checksum`](crate::message::MessageFrame::seal_checksum).
/// Layouts with an empty payload carry no checksum and fall back to the
/// sentinel check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecksumValidator {
    sentinels: SentinelValidator,
}

impl ChecksumValidator {
    pub fn new(layout: FrameLayout) -> Self {
        Self {
            sentinels: SentinelValidator::new(layout),
        }
    }

    pub fn layout(&self) -> &FrameLayout {
        self.sentinels.layout()
    }
}

impl FrameValidator for ChecksumValidator {
    fn validate(&self, window: &[u8]) -> bool {
        if !self.sentinels.validate(window) {
            return false;
        }
        match window[self.layout().payload_range()].split_last() {
            Some((sum, body)) => window[KIND_OFFSET].wrapping_add(checksum(body)) == *sum,
            None => true,
        }
    }
}
