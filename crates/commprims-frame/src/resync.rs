//! Ping-pong stream resynchronization.
//!
//! Bytes arrive in fixed windows of one frame size. The caller fills the
//! *fresh* window and calls [`FrameResynchronizer::extract`]. When the frame
//! boundaries line up with the windows, the fresh window is the frame. When
//! they do not, a frame straddles two consecutive fills, so the previous fill
//! is kept as the *stale* window and the concatenation `stale ‖ fresh` is
//! searched for a header byte whose window-sized slice passes the validator.
//!
//! ```text
//!           stale (previous fill)        fresh (current fill)
//!         ┌──────────────────────────┬──────────────────────────┐
//! buffer: │ .. .. 21 k  p  p  p  p   │ p  0A .. .. .. .. .. ..  │
//!         └──────────────────────────┴──────────────────────────┘
//!                  └──────── frame ──────┘
//! ```

use bytes::Bytes;
use tracing::{debug, trace};

use crate::error::{FrameError, Result};
use crate::layout::{FrameLayout, FRAME_OVERHEAD};
use crate::message::{MessageFrame, RawFrame};
use crate::validator::FrameValidator;

/// Counters describing how frames were recovered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResyncStats {
    /// Frames found aligned with the fresh window.
    pub aligned: u64,
    /// Frames recovered from the stale + fresh concatenation.
    pub recovered: u64,
    /// Calls that produced no frame.
    pub misses: u64,
}

impl ResyncStats {
    /// Total frames produced.
    pub fn frames(&self) -> u64 {
        self.aligned + self.recovered
    }
}

/// Recovers fixed-size frames from a byte stream delivered in window-sized fills.
///
/// The backing buffer is exactly two windows long and owned by the caller
/// (any `AsRef<[u8]> + AsMut<[u8]>` storage). Not thread-safe by design: one
/// logical owner drives the stream.
pub struct FrameResynchronizer<B, V> {
    buffer: B,
    window: usize,
    header: u8,
    validator: V,
    found_in_fresh: bool,
    stats: ResyncStats,
}

impl<B, V> FrameResynchronizer<B, V>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
    V: FrameValidator,
{
    /// Build a resynchronizer over `buffer`, whose length is twice the frame size.
    ///
    /// Fails when the buffer is shorter than 2 bytes or has an odd length.
    pub fn new(mut buffer: B, header: u8, validator: V) -> Result<Self> {
        let len = buffer.as_ref().len();
        if len < 2 {
            return Err(FrameError::WindowTooSmall { len });
        }
        if len % 2 != 0 {
            return Err(FrameError::OddBuffer { len });
        }
        let window = len / 2;
        buffer.as_mut()[..window].fill(0);
        Ok(Self {
            buffer,
            window,
            header,
            validator,
            found_in_fresh: false,
            stats: ResyncStats::default(),
        })
    }

    /// Size of one window (one frame) in bytes.
    pub fn window_len(&self) -> usize {
        self.window
    }

    pub fn header(&self) -> u8 {
        self.header
    }

    pub fn validator(&self) -> &V {
        &self.validator
    }

    pub fn stats(&self) -> ResyncStats {
        self.stats
    }

    /// The window the caller must fill completely before each [`extract`](Self::extract).
    pub fn fresh_mut(&mut self) -> &mut [u8] {
        let window = self.window;
        &mut self.buffer.as_mut()[window..]
    }

    pub fn fresh(&self) -> &[u8] {
        &self.buffer.as_ref()[self.window..]
    }

    /// The previous fill retained for straddling frames.
    pub fn stale(&self) -> &[u8] {
        &self.buffer.as_ref()[..self.window]
    }

    /// Zero both windows and forget alignment. Counters are kept.
    pub fn reset(&mut self) {
        self.buffer.as_mut().fill(0);
        self.found_in_fresh = false;
    }

    /// Look for a frame after the fresh window has been filled.
    ///
    /// On success the frame occupies `destination[..window_len()]`. Returns
    /// `false` without touching any state when `destination` is shorter than
    /// one window.
    pub fn extract(&mut self, destination: &mut [u8]) -> bool {
        let window = self.window;
        if destination.len() < window {
            return false;
        }

        let Self {
            buffer,
            header,
            validator,
            found_in_fresh,
            stats,
            ..
        } = self;
        let buffer = buffer.as_mut();

        let (stale, fresh) = buffer.split_at_mut(window);
        if fresh[0] == *header && validator.validate(fresh) {
            destination[..window].copy_from_slice(fresh);
            if !*found_in_fresh {
                *found_in_fresh = true;
                stale.fill(0);
                debug!(window, "stream aligned, stale window cleared");
            }
            stats.aligned += 1;
            return true;
        }

        *found_in_fresh = false;
        let start = find_frame(buffer, window, *header, validator);
        if let Some(start) = start {
            destination[..window].copy_from_slice(&buffer[start..start + window]);
            stats.recovered += 1;
            trace!(offset = start, "frame recovered across window boundary");
        } else {
            stats.misses += 1;
            trace!("no frame in stale + fresh windows");
        }
        buffer.copy_within(window.., 0);
        start.is_some()
    }

    /// [`extract`](Self::extract) into a statically sized frame.
    ///
    /// Fails when `N + 3` differs from the window size; state is untouched then.
    pub fn extract_frame<const N: usize>(&mut self) -> Result<Option<MessageFrame<N>>> {
        if MessageFrame::<N>::FULL_LEN != self.window {
            return Err(FrameError::LengthMismatch {
                expected: self.window,
                actual: MessageFrame::<N>::FULL_LEN,
            });
        }
        let mut out = vec![0u8; self.window];
        if !self.extract(&mut out) {
            return Ok(None);
        }
        MessageFrame::decode(&out).map(Some)
    }

    /// [`extract`](Self::extract) into an owned runtime-sized frame.
    ///
    /// Windows shorter than three bytes cannot hold a frame and always yield
    /// `None` without touching state.
    pub fn extract_raw(&mut self) -> Option<RawFrame> {
        if self.window < FRAME_OVERHEAD {
            return None;
        }
        let mut out = vec![0u8; self.window];
        if !self.extract(&mut out) {
            return None;
        }
        let layout = FrameLayout::new(self.window - FRAME_OVERHEAD);
        RawFrame::new(&layout, Bytes::from(out)).ok()
    }

    /// Consume the resynchronizer and return its buffer.
    pub fn into_inner(self) -> B {
        self.buffer
    }
}

impl<V: FrameValidator> FrameResynchronizer<Vec<u8>, V> {
    /// Build a resynchronizer that owns a freshly allocated buffer.
    pub fn with_window(window: usize, header: u8, validator: V) -> Result<Self> {
        Self::new(vec![0u8; window * 2], header, validator)
    }

    /// Build a resynchronizer sized and keyed for `layout`.
    pub fn for_layout(layout: &FrameLayout, validator: V) -> Result<Self> {
        layout.validate()?;
        Self::with_window(layout.frame_len(), layout.header, validator)
    }
}

impl<B, V> std::fmt::Debug for FrameResynchronizer<B, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameResynchronizer")
            .field("window", &self.window)
            .field("header", &self.header)
            .field("found_in_fresh", &self.found_in_fresh)
            .field("stats", &self.stats)
            .finish()
    }
}

/// First start offset in `buffer` whose window passes `validator`.
///
/// Every header byte is tried, not only the first one: an incidental header
/// byte in the stale tail must not hide a real frame behind it. Offset
/// `window` is the fresh window itself, already rejected by the caller.
fn find_frame<V: FrameValidator>(
    buffer: &[u8],
    window: usize,
    header: u8,
    validator: &V,
) -> Option<usize> {
    (0..window)
        .filter(|&start| buffer[start] == header)
        .find(|&start| validator.validate(&buffer[start..start + window]))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::layout::DEFAULT_HEADER;
    use crate::validator::{ChecksumValidator, SentinelValidator};

    const WINDOW: usize = 8;

    fn resync() -> FrameResynchronizer<Vec<u8>, SentinelValidator> {
        FrameResynchronizer::for_layout(
            &FrameLayout::default(),
            SentinelValidator::new(FrameLayout::default()),
        )
        .unwrap()
    }

    fn feed<B, V>(resync: &mut FrameResynchronizer<B, V>, fill: &[u8]) -> Option<Vec<u8>>
    where
        B: AsRef<[u8]> + AsMut<[u8]>,
        V: FrameValidator,
    {
        resync.fresh_mut().copy_from_slice(fill);
        let mut out = vec![0u8; resync.window_len()];
        resync.extract(&mut out).then_some(out)
    }

    fn frame(kind: u8, payload: [u8; 5]) -> Vec<u8> {
        MessageFrame::new(kind, payload).to_vec()
    }

    #[test]
    fn rejects_unusable_buffers() {
        let validator = SentinelValidator::new(FrameLayout::default());
        assert_eq!(
            FrameResynchronizer::new(vec![0u8; 1], DEFAULT_HEADER, validator).unwrap_err(),
            FrameError::WindowTooSmall { len: 1 }
        );
        assert_eq!(
            FrameResynchronizer::new(Vec::<u8>::new(), DEFAULT_HEADER, validator).unwrap_err(),
            FrameError::WindowTooSmall { len: 0 }
        );
        assert_eq!(
            FrameResynchronizer::new(vec![0u8; 15], DEFAULT_HEADER, validator).unwrap_err(),
            FrameError::OddBuffer { len: 15 }
        );
        assert!(FrameResynchronizer::new(vec![0u8; 2], DEFAULT_HEADER, validator).is_ok());
    }

    #[test]
    fn borrowed_buffer_is_zeroed_stale_on_construction() {
        let mut storage = [0xEEu8; 16];
        let validator = SentinelValidator::new(FrameLayout::default());
        let resync = FrameResynchronizer::new(&mut storage[..], DEFAULT_HEADER, validator).unwrap();
        assert_eq!(resync.stale(), &[0u8; 8]);
        assert_eq!(resync.fresh(), &[0xEEu8; 8]);
        assert_eq!(resync.window_len(), WINDOW);
    }

    #[test]
    fn short_destination_fails_without_touching_state() {
        let mut resync = resync();
        let fill = [0x00, 0x21, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
        resync.fresh_mut().copy_from_slice(&fill);

        let mut short = [0u8; 7];
        assert!(!resync.extract(&mut short));
        assert!(!resync.extract(&mut []));

        assert_eq!(resync.stale(), &[0u8; 8]);
        assert_eq!(resync.fresh(), &fill);
        assert_eq!(resync.stats(), ResyncStats::default());
    }

    #[test]
    fn aligned_frames_take_the_fast_path() {
        let mut resync = resync();
        for kind in 0..20u8 {
            let expected = frame(kind, [kind, 1, 2, 3, 4]);
            assert_eq!(feed(&mut resync, &expected), Some(expected));
        }
        assert_eq!(
            resync.stats(),
            ResyncStats {
                aligned: 20,
                recovered: 0,
                misses: 0
            }
        );
    }

    #[test]
    fn frame_straddling_two_fills_is_recovered() {
        let mut resync = resync();
        let first = [0x00, 0x21, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
        let second = [0x0A, 0x21, 0x07, 0x00, 0x00, 0x00, 0x00, 0x00];

        assert_eq!(feed(&mut resync, &first), None);
        assert_eq!(
            feed(&mut resync, &second),
            Some(vec![0x21, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x0A])
        );
        assert_eq!(resync.stale(), &second);
        assert_eq!(resync.stats().recovered, 1);
        assert_eq!(resync.stats().misses, 1);
    }

    #[test]
    fn destination_longer_than_window_keeps_its_tail() {
        let mut resync = resync();
        let expected = frame(1, [1, 2, 3, 4, 5]);
        resync.fresh_mut().copy_from_slice(&expected);

        let mut out = [0xCCu8; 12];
        assert!(resync.extract(&mut out));
        assert_eq!(&out[..8], expected.as_slice());
        assert_eq!(&out[8..], &[0xCC; 4]);
    }

    #[test]
    fn aligned_hit_clears_stale_once() {
        let mut resync = resync();
        let garbage = [0x21, 0x00, 0x00, 0x21, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(feed(&mut resync, &garbage), None);
        assert_eq!(resync.stale(), &garbage);

        let aligned = frame(3, [9, 9, 9, 9, 9]);
        assert!(feed(&mut resync, &aligned).is_some());
        assert_eq!(resync.stale(), &[0u8; 8]);

        assert!(feed(&mut resync, &aligned).is_some());
        assert_eq!(resync.stale(), &[0u8; 8]);
        assert_eq!(resync.stats().aligned, 2);
    }

    #[test]
    fn stale_window_does_not_leak_into_later_frames() {
        let mut resync = resync();
        // Ends with a header byte that could pair with a later fill.
        let noisy = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x21];
        assert_eq!(feed(&mut resync, &noisy), None);

        let aligned = frame(1, [1, 1, 1, 1, 1]);
        assert_eq!(feed(&mut resync, &aligned), Some(aligned));

        // Would complete the old header byte if stale still held `noisy`.
        let tail = [0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x0A, 0x00];
        assert_eq!(feed(&mut resync, &tail), None);
    }

    #[test]
    fn incidental_header_byte_with_bad_frame_is_rejected() {
        let mut resync = resync();
        let corrupt = [0x21, 0x01, 0x02, 0x21, 0x03, 0x04, 0x05, 0x06];
        assert_eq!(feed(&mut resync, &corrupt), None);
        let corrupt_again = [0x07, 0x08, 0x09, 0x21, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(feed(&mut resync, &corrupt_again), None);
        assert_eq!(resync.stats().misses, 2);
    }

    #[test]
    fn later_header_is_tried_when_first_candidate_fails() {
        let mut resync = resync();
        // Stray header byte at offset 1; the real frame starts at offset 4.
        let first = [0x00, 0x21, 0x00, 0x00, 0x21, 0x05, 0x06, 0x07];
        let second = [0x08, 0x09, 0x0B, 0x0A, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(feed(&mut resync, &first), None);
        assert_eq!(
            feed(&mut resync, &second),
            Some(vec![0x21, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0B, 0x0A])
        );
    }

    #[test]
    fn checksum_rejects_sentinel_lookalike() {
        let layout = FrameLayout::default();
        let mut resync =
            FrameResynchronizer::for_layout(&layout, ChecksumValidator::new(layout)).unwrap();
        // Sentinels in place, checksum wrong.
        let lookalike = [0x21, 0x01, 0x02, 0x03, 0x04, 0x05, 0x00, 0x0A];
        assert_eq!(feed(&mut resync, &lookalike), None);

        let mut good = MessageFrame::new(0x01, [0x02, 0x03, 0x04, 0x05, 0x00]);
        good.seal_checksum();
        assert_eq!(feed(&mut resync, &good.to_vec()), Some(good.to_vec()));
    }

    #[test]
    fn extract_frame_decodes_into_message() {
        let mut resync = resync();
        let expected = MessageFrame::new(7, [1, 2, 3, 4, 5]);
        resync.fresh_mut().copy_from_slice(&expected.to_vec());
        assert_eq!(resync.extract_frame::<5>().unwrap(), Some(expected));

        resync.fresh_mut().fill(0);
        assert_eq!(resync.extract_frame::<5>().unwrap(), None);
    }

    #[test]
    fn extract_frame_with_wrong_size_is_an_error() {
        let mut resync = resync();
        assert_eq!(
            resync.extract_frame::<4>(),
            Err(FrameError::LengthMismatch {
                expected: 8,
                actual: 7
            })
        );
    }

    #[test]
    fn extract_raw_returns_owned_frame() {
        let mut resync = resync();
        let expected = frame(2, [5, 4, 3, 2, 1]);
        resync.fresh_mut().copy_from_slice(&expected);
        let raw = resync.extract_raw().unwrap();
        assert_eq!(raw.as_bytes(), expected.as_slice());
        assert_eq!(raw.kind(), 2);
        assert_eq!(raw.payload(), &[5, 4, 3, 2, 1]);
    }

    #[test]
    fn reset_forgets_history() {
        let mut resync = resync();
        let first = [0x00, 0x21, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
        assert_eq!(feed(&mut resync, &first), None);
        resync.reset();
        assert_eq!(resync.stale(), &[0u8; 8]);
        assert_eq!(resync.fresh(), &[0u8; 8]);

        let second = [0x0A, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(feed(&mut resync, &second), None);
    }

    /// Bytes that never collide with the default header byte.
    fn body_byte() -> impl Strategy<Value = u8> {
        any::<u8>().prop_map(|b| if b == DEFAULT_HEADER { b.wrapping_add(1) } else { b })
    }

    fn frames_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
        prop::collection::vec(
            (body_byte(), prop::array::uniform5(body_byte()))
                .prop_map(|(kind, payload)| MessageFrame::new(kind, payload).to_vec()),
            1..24,
        )
    }

    fn run_stream(stream: &[u8]) -> Vec<Option<Vec<u8>>> {
        let mut resync = resync();
        stream
            .chunks_exact(WINDOW)
            .map(|fill| feed(&mut resync, fill))
            .collect()
    }

    proptest! {
        #[test]
        fn prop_aligned_stream_yields_every_frame(frames in frames_strategy()) {
            let stream = frames.concat();
            let results = run_stream(&stream);
            prop_assert_eq!(results.len(), frames.len());
            for (got, expected) in results.iter().zip(&frames) {
                prop_assert_eq!(got.as_ref(), Some(expected));
            }
        }

        #[test]
        fn prop_misaligned_stream_misses_at_most_once(
            frames in frames_strategy(),
            offset in 1..WINDOW,
            prefix in prop::collection::vec(body_byte(), WINDOW),
        ) {
            let mut stream = prefix[..offset].to_vec();
            for frame in &frames {
                stream.extend_from_slice(frame);
            }
            stream.resize(stream.len().div_ceil(WINDOW) * WINDOW, 0);

            let results = run_stream(&stream);
            let found: Vec<&Vec<u8>> = results.iter().flatten().collect();
            let misses = results.iter().filter(|r| r.is_none()).count();

            prop_assert_eq!(misses, 1);
            prop_assert!(results[0].is_none());
            prop_assert_eq!(found.len(), frames.len());
            for (got, expected) in found.into_iter().zip(&frames) {
                prop_assert_eq!(got, expected);
            }
        }
    }
}
