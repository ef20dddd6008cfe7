//! Write and read cursors over a contiguous byte buffer.
//!
//! Every codec in the crate appends to a [`WriteCursor`] and consumes from a
//! [`ReadCursor`].  The byte order is little-endian for the whole protocol and
//! all length and count prefixes are a 2-byte unsigned integer.

use crate::protocol::error::{CodecError, Result};

/// Size in bytes of every text length prefix and collection count prefix.
pub const LENGTH_PREFIX_SIZE: usize = 2;

/// Largest length or count a prefix can express.
pub const MAX_PREFIXED_LEN: usize = u16::MAX as usize;

// ── Write cursor ──────────────────────────────────────────────────────────────

/// Growable cursor that owns the output buffer while a message is encoded.
#[derive(Debug, Default)]
pub struct WriteCursor {
    buf: Vec<u8>,
}

impl WriteCursor {
    /// Creates an empty cursor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty cursor with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Appends `bytes` verbatim.
    pub fn write_fixed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a length or count prefix.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::ValueOutOfRange`] if `len` does not fit the prefix.
    pub fn write_len(&mut self, len: usize) -> Result<()> {
        let prefix = u16::try_from(len).map_err(|_| CodecError::ValueOutOfRange {
            target: "u16 length prefix",
            value: len.to_string(),
        })?;
        self.write_fixed(&prefix.to_le_bytes());
        Ok(())
    }

    /// Writes a length prefix followed by `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::ValueOutOfRange`] if `bytes` is longer than
    /// [`MAX_PREFIXED_LEN`]; nothing is written in that case.
    pub fn write_length_prefixed(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_len(bytes.len())?;
        self.write_fixed(bytes);
        Ok(())
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the cursor and hands back the encoded bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

// ── Read cursor ───────────────────────────────────────────────────────────────

/// Bounds-checked cursor that borrows a buffer while a message is decoded.
///
/// The buffer is never modified; only the position advances.
#[derive(Debug, Clone)]
pub struct ReadCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ReadCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Returns the next `n` bytes and advances past them.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TruncatedInput`] if fewer than `n` bytes remain;
    /// the position is left unchanged.
    pub fn read_fixed(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(CodecError::TruncatedInput {
                needed: n,
                available: self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Reads exactly `N` bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_fixed(N)?);
        Ok(out)
    }

    /// Reads a length or count prefix.
    pub fn read_len(&mut self) -> Result<usize> {
        Ok(u16::from_le_bytes(self.read_array()?) as usize)
    }

    /// Reads a length prefix and then that many bytes.
    ///
    /// # Errors
    ///
    /// - [`CodecError::TruncatedInput`] if the prefix itself is cut short.
    /// - [`CodecError::LengthOverflow`] if the declared length exceeds the
    ///   bytes left after the prefix.
    pub fn read_length_prefixed(&mut self) -> Result<&'a [u8]> {
        let declared = self.read_len()?;
        if declared > self.remaining() {
            return Err(CodecError::LengthOverflow {
                declared,
                remaining: self.remaining(),
            });
        }
        self.read_fixed(declared)
    }
}
