//! The CLI header, metadata-root stream directory, and the public
//! [`Container`] API (component A) that the rest of the pipeline reads from.
//!
//! Grounded on the teacher library's `raw/assembly.rs` (`CLIHeader`,
//! `MetadataRoot::read`, the stream-header walk, `GetHeap`). The zero-copy
//! `Arc<[u8]>` slicing is replaced with owned `Vec<u8>` heap copies (see
//! [`crate::metadata::heaps`]) since this compiler has no need to keep the
//! whole input file mapped for the lifetime of the IR.

use crate::error::{ContainerError, MethodBodyError};
use crate::metadata::heaps::{BlobHeap, StringHeap};
use crate::metadata::tables::{FieldRow, MethodDefRow, TableHeap, TypeDefRow};
use crate::pe::PeFile;
use crate::util::{read_padded_cstr, FromByteStream};
use std::io::Cursor;

const METADATA_SIGNATURE: u32 = 0x424A_5342; // "BSJB"
const CLI_HEADER_SIZE_FIELDS_BEFORE_METADATA_DIR: u64 = 8; // Cb + runtime version

struct StreamHeader {
    offset: u32,
    size: u32,
    name: String,
}

/// A fully opened managed-bytecode container: its metadata tables and
/// heaps, ready for the IR builder to walk.
pub struct Container {
    pe: PeFile,
    pub tables: TableHeap,
    pub strings: StringHeap,
    pub blobs: BlobHeap,
}

impl Container {
    pub fn open(bytes: &[u8]) -> Result<Self, ContainerError> {
        let pe = PeFile::parse(bytes)?;
        let cli_header_bytes = pe.resolve_rva(pe.cli_header_rva)?;
        let mut stream = Cursor::new(cli_header_bytes);
        stream.set_position(CLI_HEADER_SIZE_FIELDS_BEFORE_METADATA_DIR);
        let metadata_rva = u32::read(&mut stream)?;
        let _metadata_size = u32::read(&mut stream)?;

        let metadata_root = pe.resolve_rva(metadata_rva)?;
        let (streams, root_bytes) = read_metadata_root(metadata_root)?;

        let table_stream = find_stream(&streams, root_bytes, "#~")
            .ok_or(ContainerError::MissingMetadataHeap("#~"))?;
        let string_stream = find_stream(&streams, root_bytes, "#Strings").unwrap_or(&[]);
        let blob_stream = find_stream(&streams, root_bytes, "#Blob").unwrap_or(&[]);

        let tables = TableHeap::read(table_stream)?;
        let strings = StringHeap::new(string_stream.to_vec());
        let blobs = BlobHeap::new(blob_stream.to_vec());

        Ok(Self {
            pe,
            tables,
            strings,
            blobs,
        })
    }

    /// TypeDef rows whose name does not begin with `<` — downstream
    /// filtering per SPEC_FULL.md §4.1, left to the caller rather than the
    /// reader.
    pub fn type_defs(&self) -> &[TypeDefRow] {
        &self.tables.type_def
    }

    pub fn fields(&self) -> &[FieldRow] {
        &self.tables.field
    }

    pub fn method_defs(&self) -> &[MethodDefRow] {
        &self.tables.method_def
    }

    /// Resolves a `MethodDef` row's RVA to its raw IL byte slice, or `None`
    /// for abstract/interface methods (RVA `0`). Decoding the method-body
    /// header (tiny vs. fat) happens in [`crate::il::body`].
    pub fn method_body(&self, method: &MethodDefRow) -> Result<Option<Vec<u8>>, MethodBodyError> {
        if method.rva == 0 {
            return Ok(None);
        }
        let body_bytes = self
            .pe
            .resolve_rva(method.rva)
            .map_err(|_| MethodBodyError::MalformedHeader(0))?;
        Ok(Some(crate::il::body::read_code(body_bytes)?))
    }
}

fn read_metadata_root(data: &[u8]) -> Result<(Vec<StreamHeader>, &[u8]), ContainerError> {
    let mut stream = Cursor::new(data);
    let signature = u32::read(&mut stream)?;
    if signature != METADATA_SIGNATURE {
        return Err(ContainerError::BadMetadataSignature);
    }
    let _major_version = u16::read(&mut stream)?;
    let _minor_version = u16::read(&mut stream)?;
    let _reserved = u32::read(&mut stream)?;

    let declared_len = u32::read(&mut stream)? as usize;
    let padded_len = crate::util::round_to_multiple_of(declared_len, 4);
    stream.set_position(stream.position() + padded_len as u64);

    let _flags = u16::read(&mut stream)?;
    let stream_count = u16::read(&mut stream)?;

    let mut streams = Vec::with_capacity(stream_count as usize);
    for _ in 0..stream_count {
        let offset = u32::read(&mut stream)?;
        let size = u32::read(&mut stream)?;
        let name = read_padded_cstr(&mut stream, 4)?;
        streams.push(StreamHeader { offset, size, name });
    }

    Ok((streams, data))
}

fn find_stream<'a>(streams: &[StreamHeader], root: &'a [u8], name: &str) -> Option<&'a [u8]> {
    let header = streams.iter().find(|h| h.name == name)?;
    let start = header.offset as usize;
    let end = start + header.size as usize;
    root.get(start..end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_bsjb_signature() {
        let data = [0u8; 32];
        let err = read_metadata_root(&data).unwrap_err();
        assert!(matches!(err, ContainerError::BadMetadataSignature));
    }
}
