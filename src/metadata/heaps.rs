//! The `#Strings` and `#Blob` heaps, plus a minimal field-signature reader.
//!
//! Grounded on the teacher library's `raw/heaps/{string,blob}.rs` (both are
//! thin byte-offset-indexed views over the underlying metadata-root slice)
//! and `raw/il.rs`'s `TypeSignatureTag`, trimmed to the handful of element
//! types the type resolver (§4.3) actually needs to tell apart: the fixed
//! primitive table, `SZARRAY`, and a catch-all "class/valuetype" bucket.

use crate::error::ContainerError;
use crate::util::{read_compressed_u32, FromByteStream};
use std::io::Cursor;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct StringIndex(pub u32);

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct BlobIndex(pub u32);

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct GuidIndex(pub u32);

impl FromByteStream for StringIndex {
    fn read(stream: &mut Cursor<&[u8]>) -> std::io::Result<Self> {
        Ok(Self(u32::read(stream)?))
    }
}
impl FromByteStream for BlobIndex {
    fn read(stream: &mut Cursor<&[u8]>) -> std::io::Result<Self> {
        Ok(Self(u32::read(stream)?))
    }
}
impl FromByteStream for GuidIndex {
    fn read(stream: &mut Cursor<&[u8]>) -> std::io::Result<Self> {
        Ok(Self(u32::read(stream)?))
    }
}

/// Owns a copy of the heap's bytes. Cilium borrows straight from an
/// `Arc<[u8]>`-sliced input to avoid the copy; this compiler reads one
/// assembly and discards it, so an owned `Vec` sidesteps the
/// self-referential-struct problem of borrowing from the same `Container`
/// that also owns the section data the heap lives inside of.
#[derive(Debug, Clone)]
pub struct StringHeap {
    data: Vec<u8>,
}

impl StringHeap {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// `index == 0` denotes the empty string, per ECMA-335 II.24.2.3.
    pub fn get(&self, index: StringIndex) -> Result<&str, ContainerError> {
        let start = index.0 as usize;
        if start == 0 {
            return Ok("");
        }
        let bytes = self
            .data
            .get(start..)
            .ok_or(ContainerError::InvalidStringIndex(start))?;
        let end = bytes
            .iter()
            .position(|&b| b == 0)
            .ok_or(ContainerError::InvalidStringIndex(start))?;
        std::str::from_utf8(&bytes[..end]).map_err(|_| ContainerError::InvalidStringIndex(start))
    }
}

#[derive(Debug, Clone)]
pub struct BlobHeap {
    data: Vec<u8>,
}

impl BlobHeap {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn get(&self, index: BlobIndex) -> Result<&[u8], ContainerError> {
        let start = index.0 as usize;
        let bytes = self
            .data
            .get(start..)
            .ok_or(ContainerError::InvalidBlobIndex(start))?;
        let mut stream = Cursor::new(bytes);
        let len = read_compressed_u32(&mut stream)
            .map_err(|_| ContainerError::InvalidBlobIndex(start))? as usize;
        let body_start = stream.position() as usize;
        bytes
            .get(body_start..body_start + len)
            .ok_or(ContainerError::InvalidBlobIndex(start))
    }
}

const FIELD_SIG_PREFIX: u8 = 0x06;
const CMOD_REQD: u8 = 0x1F;
const CMOD_OPT: u8 = 0x20;

/// The handful of `FieldSig` element-type tags (ECMA-335 II.23.2.4,
/// II.23.1.16) the resolver tells apart. Everything under `VALUETYPE`/
/// `CLASS` collapses to [`FieldElementType::Class`] — this compiler only
/// needs to know "is it a primitive, a composite, or an array", not resolve
/// the referenced type eagerly.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FieldElementType {
    Boolean,
    Char,
    I1,
    U1,
    I2,
    U2,
    I4,
    U4,
    I8,
    U8,
    R4,
    R8,
    IntPtr,
    UIntPtr,
    String,
    SzArray(Box<FieldElementType>),
    Class,
}

/// Decodes a `FieldSig` blob far enough to classify its element type.
/// Skips the `FIELD` prefix byte and any leading custom modifiers.
pub fn read_field_signature_type(blob: &[u8]) -> Result<FieldElementType, ContainerError> {
    let mut stream = Cursor::new(blob);
    let prefix = u8::read(&mut stream).map_err(|_| ContainerError::InvalidBlobIndex(0))?;
    if prefix != FIELD_SIG_PREFIX {
        return Err(ContainerError::InvalidBlobIndex(0));
    }
    read_element_type(&mut stream)
}

fn read_element_type(stream: &mut Cursor<&[u8]>) -> Result<FieldElementType, ContainerError> {
    loop {
        let tag = u8::read(stream).map_err(|_| ContainerError::InvalidBlobIndex(0))?;
        return Ok(match tag {
            CMOD_REQD | CMOD_OPT => {
                read_compressed_u32(stream).map_err(|_| ContainerError::InvalidBlobIndex(0))?;
                continue;
            }
            0x02 => FieldElementType::Boolean,
            0x03 => FieldElementType::Char,
            0x04 => FieldElementType::I1,
            0x05 => FieldElementType::U1,
            0x06 => FieldElementType::I2,
            0x07 => FieldElementType::U2,
            0x08 => FieldElementType::I4,
            0x09 => FieldElementType::U4,
            0x0A => FieldElementType::I8,
            0x0B => FieldElementType::U8,
            0x0C => FieldElementType::R4,
            0x0D => FieldElementType::R8,
            0x0E => FieldElementType::String,
            0x18 => FieldElementType::IntPtr,
            0x19 => FieldElementType::UIntPtr,
            0x1D => {
                let element = read_element_type(stream)?;
                FieldElementType::SzArray(Box::new(element))
            }
            0x11 | 0x12 => {
                read_compressed_u32(stream).map_err(|_| ContainerError::InvalidBlobIndex(0))?;
                FieldElementType::Class
            }
            _ => FieldElementType::Class,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_a_primitive_field_signature() {
        let blob = [FIELD_SIG_PREFIX, 0x08]; // FIELD I4
        assert_eq!(
            read_field_signature_type(&blob).unwrap(),
            FieldElementType::I4
        );
    }

    #[test]
    fn reads_an_array_field_signature() {
        let blob = [FIELD_SIG_PREFIX, 0x1D, 0x08]; // FIELD SZARRAY I4
        assert_eq!(
            read_field_signature_type(&blob).unwrap(),
            FieldElementType::SzArray(Box::new(FieldElementType::I4))
        );
    }
}
