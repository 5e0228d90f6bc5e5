//! Component F: an append-only byte buffer with label-based relocations —
//! the systems-Rust idiom for a one-pass assembler (the wider corpus's
//! nearest analogue is cranelift's `MachBuffer` fixup list; this one is
//! scaled down to the two relocation kinds this target needs).

use crate::error::EmitError;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RelocationKind {
    /// Signed 8-bit displacement from the byte after the patch position
    /// (SM83 `JR`/`JR cc` operand).
    Rel8,
    /// Little-endian absolute 16-bit address (`JP`/`CALL` operand).
    Abs16,
}

struct Relocation {
    label: String,
    position: usize,
    kind: RelocationKind,
}

#[derive(Default)]
pub struct Emitter {
    buffer: Vec<u8>,
    labels: HashMap<String, usize>,
    relocations: Vec<Relocation>,
    base: u16,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// An emitter whose `Abs16` relocations resolve to `base + label_offset`
    /// rather than a bare buffer offset — used once the code's eventual load
    /// address (§4.5.1's `CODE_START`) is known, so `JP`/`CALL` targets are
    /// real addresses rather than offsets into the still-headerless buffer.
    pub fn with_base(base: u16) -> Self {
        Self { base, ..Self::default() }
    }

    pub fn position(&self) -> usize {
        self.buffer.len()
    }

    /// Appends a single byte, returning the offset it was written at.
    pub fn emit_byte(&mut self, byte: u8) -> usize {
        let offset = self.position();
        self.buffer.push(byte);
        offset
    }

    /// Appends raw bytes, returning the offset the first byte was written at.
    pub fn emit_bytes(&mut self, bytes: &[u8]) -> usize {
        let offset = self.position();
        self.buffer.extend_from_slice(bytes);
        offset
    }

    pub fn define_label(&mut self, name: impl Into<String>) -> Result<(), EmitError> {
        let name = name.into();
        if self.labels.contains_key(&name) {
            return Err(EmitError::DuplicateLabel(name));
        }
        self.labels.insert(name, self.position());
        Ok(())
    }

    /// Queues a relocation against `label`, to be patched into the bytes at
    /// `patch_position` once every label is known.
    pub fn reference_label(
        &mut self,
        label: impl Into<String>,
        patch_position: usize,
        kind: RelocationKind,
    ) {
        self.relocations.push(Relocation {
            label: label.into(),
            position: patch_position,
            kind,
        });
    }

    /// Flattens the buffer and applies every pending relocation.
    pub fn finalize(mut self) -> Result<Vec<u8>, EmitError> {
        for reloc in &self.relocations {
            let target = *self
                .labels
                .get(&reloc.label)
                .ok_or_else(|| EmitError::UnresolvedLabel(reloc.label.clone()))?;
            match reloc.kind {
                RelocationKind::Rel8 => {
                    let displacement = target as i64 - (reloc.position as i64 + 1);
                    if !(-128..=127).contains(&displacement) {
                        return Err(EmitError::RelocationOutOfRange {
                            label: reloc.label.clone(),
                            displacement,
                        });
                    }
                    self.buffer[reloc.position] = displacement as i8 as u8;
                }
                RelocationKind::Abs16 => {
                    let bytes = self.base.wrapping_add(target as u16).to_le_bytes();
                    self.buffer[reloc.position] = bytes[0];
                    self.buffer[reloc.position + 1] = bytes[1];
                }
            }
        }
        Ok(self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rel8_relocation_patches_forward_displacement() {
        let mut emitter = Emitter::new();
        emitter.emit_byte(0x18);
        let patch = emitter.emit_byte(0x00);
        emitter.reference_label("target", patch, RelocationKind::Rel8);
        emitter.emit_bytes(&[0xAA, 0xBB, 0xCC]);
        emitter.define_label("target").unwrap();
        let bytes = emitter.finalize().unwrap();
        assert_eq!(bytes[1], 3);
    }

    #[test]
    fn abs16_relocation_writes_little_endian_address() {
        let mut emitter = Emitter::new();
        emitter.emit_byte(0xC3);
        let patch = emitter.emit_bytes(&[0, 0]);
        emitter.reference_label("entry", patch, RelocationKind::Abs16);
        emitter.define_label("entry").unwrap();
        let bytes = emitter.finalize().unwrap();
        assert_eq!(&bytes[1..3], &[0x04, 0x00]);
    }

    #[test]
    fn abs16_relocation_is_offset_by_the_emitter_base() {
        let mut emitter = Emitter::with_base(0x0150);
        emitter.emit_byte(0xC3);
        let patch = emitter.emit_bytes(&[0, 0]);
        emitter.reference_label("entry", patch, RelocationKind::Abs16);
        emitter.define_label("entry").unwrap();
        let bytes = emitter.finalize().unwrap();
        assert_eq!(&bytes[1..3], &[0x53, 0x01]); // 0x0150 + 3
    }

    #[test]
    fn unresolved_label_is_an_error() {
        let mut emitter = Emitter::new();
        let patch = emitter.emit_bytes(&[0, 0]);
        emitter.reference_label("missing", patch, RelocationKind::Abs16);
        assert!(matches!(
            emitter.finalize(),
            Err(EmitError::UnresolvedLabel(_))
        ));
    }

    #[test]
    fn duplicate_label_is_an_error() {
        let mut emitter = Emitter::new();
        emitter.define_label("x").unwrap();
        assert!(matches!(
            emitter.define_label("x"),
            Err(EmitError::DuplicateLabel(_))
        ));
    }

    #[test]
    fn out_of_range_rel8_is_rejected() {
        let mut emitter = Emitter::new();
        let patch = emitter.emit_byte(0x00);
        emitter.reference_label("far", patch, RelocationKind::Rel8);
        emitter.emit_bytes(&vec![0u8; 200]);
        emitter.define_label("far").unwrap();
        assert!(matches!(
            emitter.finalize(),
            Err(EmitError::RelocationOutOfRange { .. })
        ));
    }
}
