//! Minimal PE (portable executable) reader: just enough of the DOS/NT header
//! chain and section table to resolve an RVA to a byte slice.
//!
//! Grounded on the teacher library's `pe.rs` (`PEFile`, `DOSHeader`,
//! `ImageFileHeader`, `SectionHeader`, `resolve_rva`). Trimmed: no 32/64-bit
//! optional-header distinction is needed downstream (we only ever read the
//! CLI header's data directory, which lives at a fixed index in both), so
//! both optional header shapes are parsed just far enough to reach that
//! directory and are not otherwise exposed.

use crate::error::ContainerError;
use crate::util::FromByteStream;
use std::io::Cursor;

const DOS_MAGIC: u16 = 0x5A4D; // "MZ"
const PE_MAGIC: u32 = 0x0000_4550; // "PE\0\0"
const OPT_HDR32_MAGIC: u16 = 0x010B;
const OPT_HDR64_MAGIC: u16 = 0x020B;

/// Index of the CLI header entry within `IMAGE_OPTIONAL_HEADER::DataDirectory`.
const CLI_HEADER_DIRECTORY: usize = 14;

#[derive(Debug, Clone, Copy)]
pub struct DataDirectory {
    pub virtual_address: u32,
    pub size: u32,
}

impl FromByteStream for DataDirectory {
    fn read(stream: &mut Cursor<&[u8]>) -> std::io::Result<Self> {
        Ok(Self {
            virtual_address: u32::read(stream)?,
            size: u32::read(stream)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Section {
    pub virtual_address: u32,
    pub size_of_raw_data: u32,
    pub data: Vec<u8>,
}

impl Section {
    fn contains_rva(&self, rva: u32) -> bool {
        (self.virtual_address..self.virtual_address + self.size_of_raw_data).contains(&rva)
    }
}

/// A parsed PE file: just its sections and the resolved CLI-header RVA.
#[derive(Debug)]
pub struct PeFile {
    pub cli_header_rva: u32,
    sections: Vec<Section>,
}

impl PeFile {
    pub fn resolve_rva(&self, rva: u32) -> Result<&[u8], ContainerError> {
        let section = self
            .sections
            .iter()
            .find(|s| s.contains_rva(rva))
            .ok_or(ContainerError::InvalidRva(rva))?;
        let offset = (rva - section.virtual_address) as usize;
        Ok(&section.data[offset..])
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, ContainerError> {
        let mut stream = Cursor::new(bytes);

        if bytes.len() < 0x40 {
            return Err(ContainerError::Truncated("DOS header"));
        }
        let magic = u16::read(&mut stream).map_err(|_| ContainerError::Truncated("DOS header"))?;
        if magic != DOS_MAGIC {
            return Err(ContainerError::BadDosSignature);
        }
        stream.set_position(0x3C);
        let pe_header_start = u32::read(&mut stream)? as usize;

        stream.set_position(pe_header_start as u64);
        let pe_magic = u32::read(&mut stream)?;
        if pe_magic != PE_MAGIC {
            return Err(ContainerError::BadPeSignature);
        }

        // IMAGE_FILE_HEADER
        let _machine = u16::read(&mut stream)?;
        let number_of_sections = u16::read(&mut stream)? as usize;
        let _time_date_stamp = u32::read(&mut stream)?;
        let _pointer_to_symbol_table = u32::read(&mut stream)?;
        let _number_of_symbols = u32::read(&mut stream)?;
        let size_of_optional_header = u16::read(&mut stream)? as usize;
        let _characteristics = u16::read(&mut stream)?;

        let optional_header_start = stream.position();
        let data_directories = read_optional_header_directories(&mut stream)?;
        let cli_header_rva = data_directories
            .get(CLI_HEADER_DIRECTORY)
            .ok_or(ContainerError::MissingCliHeader)?
            .virtual_address;
        if cli_header_rva == 0 {
            return Err(ContainerError::MissingCliHeader);
        }

        let sections_start = optional_header_start + size_of_optional_header as u64;
        stream.set_position(sections_start);

        let mut sections = Vec::with_capacity(number_of_sections);
        for _ in 0..number_of_sections {
            let _name = <[u8; 8]>::read(&mut stream)?;
            let _physical_address_or_virtual_size = u32::read(&mut stream)?;
            let virtual_address = u32::read(&mut stream)?;
            let size_of_raw_data = u32::read(&mut stream)?;
            let pointer_to_raw_data = u32::read(&mut stream)? as usize;
            let _pointer_to_relocations = u32::read(&mut stream)?;
            let _pointer_to_line_numbers = u32::read(&mut stream)?;
            let _number_of_relocations = u16::read(&mut stream)?;
            let _number_of_line_numbers = u16::read(&mut stream)?;
            let _characteristics = u32::read(&mut stream)?;

            let start = pointer_to_raw_data;
            let end = start + size_of_raw_data as usize;
            let data = bytes
                .get(start..end)
                .ok_or(ContainerError::Truncated("section data"))?
                .to_vec();

            sections.push(Section {
                virtual_address,
                size_of_raw_data,
                data,
            });
        }

        Ok(Self {
            cli_header_rva,
            sections,
        })
    }
}

/// Reads just the magic + the fixed-position fields preceding
/// `DataDirectory[]`, for whichever of PE32/PE32+ is present, and returns the
/// directory array. The two layouts differ only in a handful of fields
/// between `BaseOfData`/`ImageBase` and `SizeOfStackReserve`; we skip over
/// those by absolute byte count rather than modeling every field.
fn read_optional_header_directories(
    stream: &mut Cursor<&[u8]>,
) -> Result<Vec<DataDirectory>, ContainerError> {
    let magic = u16::read(stream)?;
    match magic {
        // Bytes remaining between the magic field and `DataDirectory[0]`:
        // standard fields + NT-specific fields, per the PE32/PE32+ layouts.
        OPT_HDR32_MAGIC => stream.set_position(stream.position() + 94),
        OPT_HDR64_MAGIC => stream.set_position(stream.position() + 110),
        _ => return Err(ContainerError::BadOptionalHeaderSignature),
    }

    let mut directories = Vec::with_capacity(16);
    for _ in 0..16 {
        directories.push(DataDirectory::read(stream)?);
    }
    Ok(directories)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_buffers() {
        let err = PeFile::parse(&[0u8; 4]).unwrap_err();
        assert!(matches!(err, ContainerError::Truncated(_)));
    }

    #[test]
    fn rejects_bad_dos_signature() {
        let mut bytes = vec![0u8; 0x40];
        bytes[0] = b'X';
        bytes[1] = b'X';
        let err = PeFile::parse(&bytes).unwrap_err();
        assert!(matches!(err, ContainerError::BadDosSignature));
    }
}
