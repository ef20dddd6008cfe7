//! Fixed-width scalar codecs and the length-prefixed text codec.
//!
//! Integers are two's-complement, floats are IEEE-754 binary32/binary64, all
//! little-endian.  Widths: 1 byte (`i8`/`u8`), 2 bytes (`i16`/`u16`),
//! 4 bytes (`i32`/`u32`/`f32`), 8 bytes (`f64`).

use crate::protocol::cursor::{ReadCursor, WriteCursor};
use crate::protocol::error::{CodecError, Result};

/// A Rust primitive with a fixed-width wire representation.
pub trait Scalar: Sized + Copy {
    /// Encoded width in bytes.
    const WIDTH: usize;

    fn encode(self, out: &mut WriteCursor);

    fn decode(cursor: &mut ReadCursor<'_>) -> Result<Self>;
}

macro_rules! impl_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn encode(self, out: &mut WriteCursor) {
                    out.write_fixed(&self.to_le_bytes());
                }

                #[inline]
                fn decode(cursor: &mut ReadCursor<'_>) -> Result<Self> {
                    Ok(<$ty>::from_le_bytes(cursor.read_array()?))
                }
            }
        )*
    };
}

impl_scalar!(i8, i16, i32, u8, u16, u32, f32, f64);

/// Narrows an integer to the width of `T`.
///
/// # Errors
///
/// Returns [`CodecError::ValueOutOfRange`] instead of truncating.
pub fn narrow_int<T: TryFrom<i64>>(value: i64, target: &'static str) -> Result<T> {
    T::try_from(value).map_err(|_| CodecError::ValueOutOfRange {
        target,
        value: value.to_string(),
    })
}

/// Narrows a double to binary32.
///
/// Finite values beyond `f32::MAX` in magnitude are rejected; NaN and the
/// infinities pass through.  Values inside the range round to the nearest
/// binary32.
pub fn narrow_f32(value: f64) -> Result<f32> {
    if value.is_finite() && value.abs() > f32::MAX as f64 {
        return Err(CodecError::ValueOutOfRange {
            target: "Float32",
            value: value.to_string(),
        });
    }
    Ok(value as f32)
}

/// Converts an integer supplied for a float field.
///
/// # Errors
///
/// Returns [`CodecError::ValueOutOfRange`] if the integer has no exact
/// binary64 representation (magnitude above 2^53 with low bits set).
pub fn int_to_f64(value: i64, target: &'static str) -> Result<f64> {
    let widened = value as f64;
    if widened as i128 != i128::from(value) {
        return Err(CodecError::ValueOutOfRange {
            target,
            value: value.to_string(),
        });
    }
    Ok(widened)
}

/// Writes `text` as a byte-length prefix followed by its UTF-8 bytes.
pub fn encode_text(text: &str, out: &mut WriteCursor) -> Result<()> {
    out.write_length_prefixed(text.as_bytes())
}

/// Reads a length-prefixed UTF-8 string.
///
/// # Errors
///
/// Returns [`CodecError::InvalidEncoding`] if the bytes are not valid UTF-8,
/// in addition to the cursor's truncation errors.
pub fn decode_text(cursor: &mut ReadCursor<'_>) -> Result<String> {
    let bytes = cursor.read_length_prefixed()?;
    Ok(std::str::from_utf8(bytes)?.to_owned())
}
