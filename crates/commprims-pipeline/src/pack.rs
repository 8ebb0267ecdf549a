//! Conversions between byte windows and items.
//!
//! A [`Packer`] owns the window its byte source writes into, so bytes go
//! straight from the stream into the resynchronizer without an extra copy.

use std::marker::PhantomData;

use commprims_frame::{
    decode_from, encode_into, FixedLayout, FrameError, FrameResynchronizer, FrameValidator,
    MessageFrame, RawFrame,
};

use crate::error::Result;

/// Turns filled byte windows into items.
pub trait Packer {
    type Item;

    /// The window the byte source must fill completely before [`pack`](Self::pack).
    fn buffer(&mut self) -> &mut [u8];

    /// Produce an item from the bytes seen so far, if there is one.
    fn pack(&mut self) -> Option<Self::Item>;
}

/// Turns items into byte windows.
pub trait Unpacker {
    type Item;

    /// Encode `item` and return the bytes to write.
    fn unpack(&mut self, item: &Self::Item) -> Result<&[u8]>;
}

/// Packs `MessageFrame<N>` values out of a resynchronized stream.
#[derive(Debug)]
pub struct FramePacker<B, V, const N: usize> {
    resync: FrameResynchronizer<B, V>,
    scratch: Vec<u8>,
}

impl<B, V, const N: usize> FramePacker<B, V, N>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
    V: FrameValidator,
{
    /// Fails when the resynchronizer window is not `N + 3` bytes.
    pub fn new(resync: FrameResynchronizer<B, V>) -> std::result::Result<Self, FrameError> {
        if resync.window_len() != MessageFrame::<N>::FULL_LEN {
            return Err(FrameError::LengthMismatch {
                expected: MessageFrame::<N>::FULL_LEN,
                actual: resync.window_len(),
            });
        }
        let scratch = vec![0u8; resync.window_len()];
        Ok(Self { resync, scratch })
    }

    pub fn resync(&self) -> &FrameResynchronizer<B, V> {
        &self.resync
    }

    pub fn into_inner(self) -> FrameResynchronizer<B, V> {
        self.resync
    }
}

impl<B, V, const N: usize> Packer for FramePacker<B, V, N>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
    V: FrameValidator,
{
    type Item = MessageFrame<N>;

    fn buffer(&mut self) -> &mut [u8] {
        self.resync.fresh_mut()
    }

    fn pack(&mut self) -> Option<Self::Item> {
        if !self.resync.extract(&mut self.scratch) {
            return None;
        }
        MessageFrame::decode(&self.scratch).ok()
    }
}

/// Packs runtime-sized [`RawFrame`]s out of a resynchronized stream.
#[derive(Debug)]
pub struct RawFramePacker<B, V> {
    resync: FrameResynchronizer<B, V>,
}

impl<B, V> RawFramePacker<B, V>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
    V: FrameValidator,
{
    pub fn new(resync: FrameResynchronizer<B, V>) -> Self {
        Self { resync }
    }

    pub fn resync(&self) -> &FrameResynchronizer<B, V> {
        &self.resync
    }
}

impl<B, V> Packer for RawFramePacker<B, V>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
    V: FrameValidator,
{
    type Item = RawFrame;

    fn buffer(&mut self) -> &mut [u8] {
        self.resync.fresh_mut()
    }

    fn pack(&mut self) -> Option<Self::Item> {
        self.resync.extract_raw()
    }
}

/// Decodes exactly one `T` from every window, with no framing.
#[derive(Debug)]
pub struct LayoutPacker<T> {
    buffer: Vec<u8>,
    _item: PhantomData<fn() -> T>,
}

impl<T: FixedLayout> Default for LayoutPacker<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: FixedLayout> LayoutPacker<T> {
    pub fn new() -> Self {
        Self {
            buffer: vec![0u8; T::SIZE],
            _item: PhantomData,
        }
    }
}

impl<T: FixedLayout> Packer for LayoutPacker<T> {
    type Item = T;

    fn buffer(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    fn pack(&mut self) -> Option<T> {
        decode_from(&self.buffer).ok()
    }
}

/// Encodes `MessageFrame<N>` values into wire bytes.
#[derive(Debug)]
pub struct FrameUnpacker<const N: usize> {
    buffer: Vec<u8>,
}

impl<const N: usize> Default for FrameUnpacker<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> FrameUnpacker<N> {
    pub fn new() -> Self {
        Self {
            buffer: vec![0u8; MessageFrame::<N>::FULL_LEN],
        }
    }
}

impl<const N: usize> Unpacker for FrameUnpacker<N> {
    type Item = MessageFrame<N>;

    fn unpack(&mut self, item: &Self::Item) -> Result<&[u8]> {
        item.write_to(&mut self.buffer)?;
        Ok(&self.buffer)
    }
}

/// Encodes `T` values into their fixed layout, with no framing.
#[derive(Debug)]
pub struct LayoutUnpacker<T> {
    buffer: Vec<u8>,
    _item: PhantomData<fn(T)>,
}

impl<T: FixedLayout> Default for LayoutUnpacker<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: FixedLayout> LayoutUnpacker<T> {
    pub fn new() -> Self {
        Self {
            buffer: vec![0u8; T::SIZE],
            _item: PhantomData,
        }
    }
}

impl<T: FixedLayout> Unpacker for LayoutUnpacker<T> {
    type Item = T;

    fn unpack(&mut self, item: &T) -> Result<&[u8]> {
        encode_into(item, &mut self.buffer)?;
        Ok(&self.buffer)
    }
}
