//! Cursor-based little-endian byte buffer
//!
//! [`ByteBuffer`] is the serialization primitive shared by every protocol layer:
//! APDUs, controller packets and DESFire cryptograms are all built and parsed
//! through it. Integers are written and read little-endian at their natural
//! width.
//!
//! Reads never go past the end of the buffer. A read that cannot be satisfied
//! returns [`Error::InsufficientData`] and leaves the cursor where it was, so a
//! caller can always tell a short packet apart from a packet full of zeroes.

use bytes::{BufMut, Bytes, BytesMut};

use crate::{Error, Result};

/// Fixed-width integers that can be stored little-endian in a [`ByteBuffer`]
pub trait LeInt: Copy {
    /// Width of the integer in bytes
    const SIZE: usize;

    /// Append the little-endian representation to `buf`
    fn put_le(self, buf: &mut BytesMut);

    /// Decode from exactly [`Self::SIZE`] little-endian bytes
    fn from_le_slice(bytes: &[u8]) -> Self;
}

macro_rules! impl_le_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl LeInt for $ty {
                const SIZE: usize = core::mem::size_of::<$ty>();

                fn put_le(self, buf: &mut BytesMut) {
                    buf.put_slice(&self.to_le_bytes());
                }

                fn from_le_slice(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; core::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_le_int!(u8, u16, u32, u64, i8, i16, i32, i64);

/// Owned byte sequence with a read cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteBuffer {
    data: BytesMut,
    position: usize,
}

impl ByteBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with room for `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
            position: 0,
        }
    }

    /// Append a fixed-width integer, little-endian
    pub fn put_int<T: LeInt>(&mut self, value: T) -> &mut Self {
        value.put_le(&mut self.data);
        self
    }

    /// Append a single byte
    pub fn put_u8(&mut self, value: u8) -> &mut Self {
        self.put_int(value)
    }

    /// Append raw bytes
    pub fn put_slice(&mut self, data: &[u8]) -> &mut Self {
        self.data.put_slice(data);
        self
    }

    /// Append the full contents of another buffer, ignoring its cursor
    pub fn put_buffer(&mut self, other: &Self) -> &mut Self {
        self.put_slice(other.as_slice())
    }

    /// Read a fixed-width little-endian integer
    pub fn read_int<T: LeInt>(&mut self) -> Result<T> {
        let bytes = self.take(T::SIZE)?;
        Ok(T::from_le_slice(bytes))
    }

    /// Read a single byte
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_int()
    }

    /// Read exactly `len` bytes
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        self.take(len).map(Bytes::copy_from_slice)
    }

    /// Read every byte after the cursor
    pub fn read_remaining(&mut self) -> Bytes {
        let rest = Bytes::copy_from_slice(&self.data[self.position..]);
        self.position = self.data.len();
        rest
    }

    /// Current cursor position
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Number of unread bytes after the cursor
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Total number of bytes held
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no bytes at all
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// All bytes held, regardless of the cursor
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Drop the contents and rewind the cursor
    pub fn clear(&mut self) {
        self.data.clear();
        self.position = 0;
    }

    /// Freeze the contents into immutable [`Bytes`]
    pub fn into_bytes(self) -> Bytes {
        self.data.freeze()
    }

    fn take(&mut self, len: usize) -> Result<&[u8]> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(Error::insufficient(len, remaining));
        }

        let start = self.position;
        self.position += len;
        Ok(&self.data[start..self.position])
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(data: &[u8]) -> Self {
        Self {
            data: BytesMut::from(data),
            position: 0,
        }
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self::from(data.as_slice())
    }
}

impl From<Bytes> for ByteBuffer {
    fn from(data: Bytes) -> Self {
        Self::from(data.as_ref())
    }
}

impl AsRef<[u8]> for ByteBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}
