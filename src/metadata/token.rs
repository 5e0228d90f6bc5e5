//! Metadata tokens: a table-kind byte packed with a one-based row index into
//! a single `u32`, as laid out by ECMA-335 II.22.2.
//!
//! Grounded on the teacher library's `metadata_token.rs`, trimmed from a
//! macro-generated closed enum of per-kind newtypes down to a single opaque
//! struct — nothing downstream needs to pattern-match on a token's kind
//! beyond printing it for diagnostics.

use crate::util::FromByteStream;
use std::io::Cursor;

#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct MetadataToken(u32);

impl MetadataToken {
    /// Wraps an already-encoded token, e.g. an IL instruction's raw
    /// `Operand::Token` value.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn table_kind_byte(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// One-based row index within the table named by `table_kind_byte`.
    pub fn row_index(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Debug for MetadataToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MetadataToken({:#010x})", self.0)
    }
}

impl FromByteStream for MetadataToken {
    fn read(stream: &mut Cursor<&[u8]>) -> std::io::Result<Self> {
        Ok(Self(u32::read(stream)?))
    }
}
