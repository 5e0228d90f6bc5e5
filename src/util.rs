//! Small byte-stream reading helpers shared by the PE and metadata readers.
//!
//! Grounded on the teacher library's own `utilities.rs`: a `FromByteStream`
//! trait plus a macro that implements it for `#[repr(C)]` POD structs via an
//! exact-size `read_exact` into a zeroed value. The unsafe transmute-based
//! `read_pod_from_stream` the teacher used is replaced with explicit
//! little-endian field reads — this compiler's structs are few enough that
//! hand-written `read` impls cost nothing and avoid relying on `#[repr(C)]`
//! layout matching the wire format bit-for-bit on every target.

use std::io::{Cursor, Read, Result};

pub trait FromByteStream: Sized {
    fn read(stream: &mut Cursor<&[u8]>) -> Result<Self>;
}

impl FromByteStream for u8 {
    fn read(stream: &mut Cursor<&[u8]>) -> Result<Self> {
        let mut byte = 0u8;
        stream.read_exact(std::slice::from_mut(&mut byte))?;
        Ok(byte)
    }
}

macro_rules! impl_from_le_byte_stream {
    ($($ty:ty),*) => {$(
        impl FromByteStream for $ty {
            fn read(stream: &mut Cursor<&[u8]>) -> Result<Self> {
                let mut bytes = [0u8; std::mem::size_of::<Self>()];
                stream.read_exact(&mut bytes)?;
                Ok(Self::from_le_bytes(bytes))
            }
        }
    )*};
}

impl_from_le_byte_stream!(u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl<const N: usize> FromByteStream for [u8; N] {
    fn read(stream: &mut Cursor<&[u8]>) -> Result<Self> {
        let mut bytes = [0u8; N];
        stream.read_exact(&mut bytes)?;
        Ok(bytes)
    }
}

/// Reads `count` bytes and returns them as an owned `Vec`, advancing the
/// cursor. Used everywhere a method body / section / heap slice is sliced
/// out of the input buffer.
pub(crate) fn read_vec(stream: &mut Cursor<&[u8]>, count: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; count];
    stream.read_exact(&mut buf)?;
    Ok(buf)
}

/// Reads a NUL-terminated, then zero-padded-to-`round`-byte-multiple string,
/// as used by the metadata stream-header directory.
pub(crate) fn read_padded_cstr(stream: &mut Cursor<&[u8]>, round: usize) -> Result<String> {
    let start = stream.position();
    let mut bytes = Vec::new();
    loop {
        let b = u8::read(stream)?;
        if b == 0 {
            break;
        }
        bytes.push(b);
    }
    let consumed = stream.position() - start + 1;
    let padded = round_to_multiple_of(consumed as usize, round);
    stream.set_position(start + padded as u64);
    String::from_utf8(bytes).map_err(|_| std::io::ErrorKind::InvalidData.into())
}

pub(crate) const fn round_to_multiple_of(value: usize, multiple: usize) -> usize {
    ((value + (multiple - 1)) / multiple) * multiple
}

/// ECMA-335 II.23.2 compressed unsigned integer (used by field/local
/// signature blobs).
pub(crate) fn read_compressed_u32(stream: &mut Cursor<&[u8]>) -> Result<u32> {
    let first = u8::read(stream)?;
    if first & 0x80 == 0 {
        return Ok(first as u32);
    }
    if first & 0xC0 == 0x80 {
        let second = u8::read(stream)?;
        return Ok((((first & 0x3F) as u32) << 8) | second as u32);
    }
    let rest = <[u8; 3]>::read(stream)?;
    let value = ((first & 0x1F) as u32) << 24
        | (rest[0] as u32) << 16
        | (rest[1] as u32) << 8
        | rest[2] as u32;
    Ok(value)
}
