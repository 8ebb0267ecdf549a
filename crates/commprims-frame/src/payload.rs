//! Checked, copy-based payload encoding.
//!
//! Payload bytes are never reinterpreted in place. A type that travels inside
//! a frame describes its own layout through [`FixedLayout`] and is copied in
//! and out field by field in host byte order.

use bytes::{Buf, BufMut};

use crate::error::{FrameError, Result};

/// A value with a fixed, padding-free byte layout.
///
/// `encode` must write exactly `SIZE` bytes and `decode` must consume exactly
/// `SIZE` bytes. Both may panic when the buffer is shorter than `SIZE`; use
/// [`encode_into`] / [`decode_from`] for length-checked access.
pub trait FixedLayout: Sized {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Write `self` into `dst`.
    fn encode<B: BufMut>(&self, dst: &mut B);

    /// Read a value from `src`.
    fn decode<B: Buf>(src: &mut B) -> Self;
}

/// Encode `value` into `dst`, which must be exactly `T::SIZE` bytes long.
pub fn encode_into<T: FixedLayout>(value: &T, dst: &mut [u8]) -> Result<()> {
    if dst.len() != T::SIZE {
        return Err(FrameError::PayloadSizeMismatch {
            expected: dst.len(),
            actual: T::SIZE,
        });
    }
    let mut cursor = dst;
    value.encode(&mut cursor);
    Ok(())
}

/// Decode a value from `src`, which must be exactly `T::SIZE` bytes long.
pub fn decode_from<T: FixedLayout>(src: &[u8]) -> Result<T> {
    if src.len() != T::SIZE {
        return Err(FrameError::PayloadSizeMismatch {
            expected: src.len(),
            actual: T::SIZE,
        });
    }
    let mut cursor = src;
    Ok(T::decode(&mut cursor))
}

macro_rules! fixed_layout_primitive {
    ($($ty:ty => $put:ident, $get:ident;)*) => {
        $(
            impl FixedLayout for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn encode<B: BufMut>(&self, dst: &mut B) {
                    dst.$put(*self);
                }

                fn decode<B: Buf>(src: &mut B) -> Self {
                    src.$get()
                }
            }
        )*
    };
}

fixed_layout_primitive! {
    u8 => put_u8, get_u8;
    i8 => put_i8, get_i8;
    u16 => put_u16_ne, get_u16_ne;
    i16 => put_i16_ne, get_i16_ne;
    u32 => put_u32_ne, get_u32_ne;
    i32 => put_i32_ne, get_i32_ne;
    u64 => put_u64_ne, get_u64_ne;
    i64 => put_i64_ne, get_i64_ne;
    u128 => put_u128_ne, get_u128_ne;
    i128 => put_i128_ne, get_i128_ne;
    f32 => put_f32_ne, get_f32_ne;
    f64 => put_f64_ne, get_f64_ne;
}

impl FixedLayout for bool {
    const SIZE: usize = 1;

    fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_u8(u8::from(*self));
    }

    fn decode<B: Buf>(src: &mut B) -> Self {
        src.get_u8() != 0
    }
}

impl<const M: usize> FixedLayout for [u8; M] {
    const SIZE: usize = M;

    fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_slice(self);
    }

    fn decode<B: Buf>(src: &mut B) -> Self {
        let mut out = [0u8; M];
        src.copy_to_slice(&mut out);
        out
    }
}

macro_rules! fixed_layout_tuple {
    ($($name:ident),+) => {
        impl<$($name: FixedLayout),+> FixedLayout for ($($name,)+) {
            const SIZE: usize = 0 $(+ $name::SIZE)+;

            #[allow(non_snake_case)]
            fn encode<Dst: BufMut>(&self, dst: &mut Dst) {
                let ($($name,)+) = self;
                $($name.encode(dst);)+
            }

            fn decode<Src: Buf>(src: &mut Src) -> Self {
                ($($name::decode(src),)+)
            }
        }
    };
}

fixed_layout_tuple!(A, B);
fixed_layout_tuple!(A, B, C);
fixed_layout_tuple!(A, B, C, D);
