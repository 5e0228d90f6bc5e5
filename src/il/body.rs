//! Method-body header decoding (tiny vs. fat), per ECMA-335 II.25.4.
//!
//! Grounded on the teacher library's `raw/il.rs` `MethodBody::read`, which
//! reads the same two header shapes; this copy keeps only the `flags`/
//! `max_stack` fields for forward compatibility (see the open-question
//! decision in DESIGN.md) and returns the raw code slice rather than a
//! lazily-decoded wrapper, since the IR builder decodes every body eagerly.

use crate::error::MethodBodyError;
use crate::util::FromByteStream;
use std::io::Cursor;

const TINY_FORMAT_TAG: u8 = 0x02;
const FAT_FORMAT_TAG: u8 = 0x03;
const FAT_HEADER_LEN: usize = 12;

#[derive(Debug, Clone, Copy)]
pub struct MethodBodyHeader {
    pub is_fat: bool,
    /// Fat-header-only fields, read but not interpreted (no exception
    /// handling pass exists yet — see DESIGN.md's open-question decision).
    pub flags: u16,
    pub max_stack: u16,
    pub code_size: u32,
    pub header_len: usize,
}

pub fn read_header(body_bytes: &[u8]) -> Result<MethodBodyHeader, MethodBodyError> {
    let first = *body_bytes.first().ok_or(MethodBodyError::MalformedHeader(0))?;
    match first & 0x03 {
        TINY_FORMAT_TAG => Ok(MethodBodyHeader {
            is_fat: false,
            flags: 0,
            max_stack: 8,
            code_size: (first >> 2) as u32,
            header_len: 1,
        }),
        FAT_FORMAT_TAG => {
            if body_bytes.len() < FAT_HEADER_LEN {
                return Err(MethodBodyError::MalformedHeader(first));
            }
            let mut stream = Cursor::new(body_bytes);
            let flags = u16::read(&mut stream)?;
            let max_stack = u16::read(&mut stream)?;
            let code_size = u32::read(&mut stream)?;
            let _local_var_sig_tok = u32::read(&mut stream)?;
            Ok(MethodBodyHeader {
                is_fat: true,
                flags,
                max_stack,
                code_size,
                header_len: FAT_HEADER_LEN,
            })
        }
        _ => Err(MethodBodyError::MalformedHeader(first)),
    }
}

/// Reads the method-body header and returns exactly `code_size` bytes of
/// raw IL starting right after it.
pub fn read_code(body_bytes: &[u8]) -> Result<Vec<u8>, MethodBodyError> {
    let header = read_header(body_bytes)?;
    let start = header.header_len;
    let end = start + header.code_size as usize;
    body_bytes
        .get(start..end)
        .map(<[u8]>::to_vec)
        .ok_or(MethodBodyError::CodeSizeOutOfRange {
            declared: header.code_size,
            available: body_bytes.len().saturating_sub(start),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_tiny_header() {
        let body = [0b0000_1010u8, 0x01, 0x02, 0x03]; // tiny, code_size = 2
        let header = read_header(&body).unwrap();
        assert!(!header.is_fat);
        assert_eq!(header.code_size, 2);
        assert_eq!(header.header_len, 1);
    }

    #[test]
    fn decodes_a_fat_header() {
        let mut body = vec![0x03, 0x30, 0x08, 0x00];
        body.extend_from_slice(&3u32.to_le_bytes());
        body.extend_from_slice(&0u32.to_le_bytes());
        body.extend_from_slice(&[0xAA, 0xBB, 0xCC]);
        let header = read_header(&body).unwrap();
        assert!(header.is_fat);
        assert_eq!(header.code_size, 3);
        let code = read_code(&body).unwrap();
        assert_eq!(code, vec![0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn rejects_unknown_format_tag() {
        let body = [0b0000_0001u8];
        assert!(matches!(
            read_header(&body),
            Err(MethodBodyError::MalformedHeader(_))
        ));
    }

    #[test]
    fn rejects_truncated_code() {
        let body = [0b0000_1010u8]; // tiny, code_size = 2 but no bytes follow
        assert!(matches!(
            read_code(&body),
            Err(MethodBodyError::CodeSizeOutOfRange { .. })
        ));
    }
}
