//! The IL decoder (component C): turns a raw method-body byte slice into a
//! linear, panic-free sequence of `(opcode name, operand)` records.
//!
//! Grounded on the teacher library's `raw/il.rs` `define_opcodes!` macro,
//! which builds a typed enum + reader from a literal opcode/discriminant
//! list. This rewrite keeps the "declarative table, not a hand-written
//! 200-arm match" idiom but drops the per-opcode enum variant: nothing
//! downstream pattern-matches on opcode identity by type, only by the
//! canonical name string, so a flat `(name, operand-shape)` table plus a
//! single decode loop is enough.

use std::io::Cursor;

use crate::util::FromByteStream;

const TWO_BYTE_PREFIX: u8 = 0xFE;

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    None,
    I8(i8),
    U8(u8),
    I32(i32),
    U16(u16),
    U32(u32),
    I64(i64),
    F32(f32),
    F64(f64),
    /// A metadata token, method signature, or other 32-bit reference the IL
    /// decoder does not resolve — that's the IR builder's job.
    Token(u32),
    Switch(Vec<i32>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Lowercase canonical opcode name (`ldc.i4.s`, `add`, `ret`, ...), or
    /// `unknown_<hex>` for anything outside the decoded table.
    pub name: String,
    pub operand: Operand,
    /// Offset of this instruction's first byte within the method body, used
    /// by the code generator to resolve branch targets (§4.5.5).
    pub il_offset: u64,
    /// Offset of the first byte after this instruction — branch operands
    /// are relative to here, not to `il_offset`.
    pub next_il_offset: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperandShape {
    None,
    I8,
    U8,
    I32,
    U16,
    U32,
    I64,
    F32,
    F64,
    Token,
    Switch,
}

struct OpcodeInfo {
    name: &'static str,
    shape: OperandShape,
}

macro_rules! opcode_table {
    ($($byte:literal => $name:literal, $shape:ident);* $(;)?) => {
        fn lookup(byte: u8) -> Option<OpcodeInfo> {
            match byte {
                $($byte => Some(OpcodeInfo { name: $name, shape: OperandShape::$shape }),)*
                _ => None,
            }
        }
    };
}

mod single_byte {
    use super::{OpcodeInfo, OperandShape};

    opcode_table! {
        0x00 => "nop", None;
        0x01 => "break", None;
        0x02 => "ldarg.0", None;
        0x03 => "ldarg.1", None;
        0x04 => "ldarg.2", None;
        0x05 => "ldarg.3", None;
        0x06 => "ldloc.0", None;
        0x07 => "ldloc.1", None;
        0x08 => "ldloc.2", None;
        0x09 => "ldloc.3", None;
        0x0A => "stloc.0", None;
        0x0B => "stloc.1", None;
        0x0C => "stloc.2", None;
        0x0D => "stloc.3", None;
        0x0E => "ldarg.s", U8;
        0x0F => "ldarga.s", U8;
        0x10 => "starg.s", U8;
        0x11 => "ldloc.s", U8;
        0x12 => "ldloca.s", U8;
        0x13 => "stloc.s", U8;
        0x14 => "ldnull", None;
        0x15 => "ldc.i4.m1", None;
        0x16 => "ldc.i4.0", None;
        0x17 => "ldc.i4.1", None;
        0x18 => "ldc.i4.2", None;
        0x19 => "ldc.i4.3", None;
        0x1A => "ldc.i4.4", None;
        0x1B => "ldc.i4.5", None;
        0x1C => "ldc.i4.6", None;
        0x1D => "ldc.i4.7", None;
        0x1E => "ldc.i4.8", None;
        0x1F => "ldc.i4.s", I8;
        0x20 => "ldc.i4", I32;
        0x21 => "ldc.i8", I64;
        0x22 => "ldc.r4", F32;
        0x23 => "ldc.r8", F64;
        0x25 => "dup", None;
        0x26 => "pop", None;
        0x27 => "jmp", Token;
        0x28 => "call", Token;
        0x29 => "calli", Token;
        0x2A => "ret", None;
        0x2B => "br.s", I8;
        0x2C => "brfalse.s", I8;
        0x2D => "brtrue.s", I8;
        0x2E => "beq.s", I8;
        0x2F => "bge.s", I8;
        0x30 => "bgt.s", I8;
        0x31 => "ble.s", I8;
        0x32 => "blt.s", I8;
        0x33 => "bne.un.s", I8;
        0x34 => "bge.un.s", I8;
        0x35 => "bgt.un.s", I8;
        0x36 => "ble.un.s", I8;
        0x37 => "blt.un.s", I8;
        0x38 => "br", I32;
        0x39 => "brfalse", I32;
        0x3A => "brtrue", I32;
        0x3B => "beq", I32;
        0x3C => "bge", I32;
        0x3D => "bgt", I32;
        0x3E => "ble", I32;
        0x3F => "blt", I32;
        0x40 => "bne.un", I32;
        0x41 => "bge.un", I32;
        0x42 => "bgt.un", I32;
        0x43 => "ble.un", I32;
        0x44 => "blt.un", I32;
        0x45 => "switch", Switch;
        0x46 => "ldind.i1", None;
        0x47 => "ldind.u1", None;
        0x48 => "ldind.i2", None;
        0x49 => "ldind.u2", None;
        0x4A => "ldind.i4", None;
        0x4B => "ldind.u4", None;
        0x4C => "ldind.i8", None;
        0x4D => "ldind.i", None;
        0x4E => "ldind.r4", None;
        0x4F => "ldind.r8", None;
        0x50 => "ldind.ref", None;
        0x51 => "stind.ref", None;
        0x52 => "stind.i1", None;
        0x53 => "stind.i2", None;
        0x54 => "stind.i4", None;
        0x55 => "stind.i8", None;
        0x56 => "stind.r4", None;
        0x57 => "stind.r8", None;
        0x58 => "add", None;
        0x59 => "sub", None;
        0x5A => "mul", None;
        0x5B => "div", None;
        0x5C => "div.un", None;
        0x5D => "rem", None;
        0x5E => "rem.un", None;
        0x5F => "and", None;
        0x60 => "or", None;
        0x61 => "xor", None;
        0x62 => "shl", None;
        0x63 => "shr", None;
        0x64 => "shr.un", None;
        0x65 => "neg", None;
        0x66 => "not", None;
        0x67 => "conv.i1", None;
        0x68 => "conv.i2", None;
        0x69 => "conv.i4", None;
        0x6A => "conv.i8", None;
        0x6B => "conv.r4", None;
        0x6C => "conv.r8", None;
        0x6D => "conv.u4", None;
        0x6E => "conv.u8", None;
        0x6F => "callvirt", Token;
        0x70 => "cpobj", Token;
        0x71 => "ldobj", Token;
        0x72 => "ldstr", Token;
        0x73 => "newobj", Token;
        0x74 => "castclass", Token;
        0x75 => "isinst", Token;
        0x76 => "conv.r.un", None;
        0x79 => "unbox", Token;
        0x7A => "throw", None;
        0x7B => "ldfld", Token;
        0x7C => "ldflda", Token;
        0x7D => "stfld", Token;
        0x7E => "ldsfld", Token;
        0x7F => "ldsflda", Token;
        0x80 => "stsfld", Token;
        0x81 => "stobj", Token;
        0x82 => "conv.ovf.i1.un", None;
        0x83 => "conv.ovf.i2.un", None;
        0x84 => "conv.ovf.i4.un", None;
        0x85 => "conv.ovf.i8.un", None;
        0x86 => "conv.ovf.u1.un", None;
        0x87 => "conv.ovf.u2.un", None;
        0x88 => "conv.ovf.u4.un", None;
        0x89 => "conv.ovf.u8.un", None;
        0x8A => "conv.ovf.i.un", None;
        0x8B => "conv.ovf.u.un", None;
        0x8C => "box", Token;
        0x8D => "newarr", Token;
        0x8E => "ldlen", None;
        0x8F => "ldelema", Token;
        0x90 => "ldelem.i1", None;
        0x91 => "ldelem.u1", None;
        0x92 => "ldelem.i2", None;
        0x93 => "ldelem.u2", None;
        0x94 => "ldelem.i4", None;
        0x95 => "ldelem.u4", None;
        0x96 => "ldelem.i8", None;
        0x97 => "ldelem.i", None;
        0x98 => "ldelem.r4", None;
        0x99 => "ldelem.r8", None;
        0x9A => "ldelem.ref", None;
        0x9B => "stelem.i", None;
        0x9C => "stelem.i1", None;
        0x9D => "stelem.i2", None;
        0x9E => "stelem.i4", None;
        0x9F => "stelem.i8", None;
        0xA0 => "stelem.r4", None;
        0xA1 => "stelem.r8", None;
        0xA2 => "stelem.ref", None;
        0xA3 => "ldelem", Token;
        0xA4 => "stelem", Token;
        0xA5 => "unbox.any", Token;
        0xB3 => "conv.ovf.i1", None;
        0xB4 => "conv.ovf.u1", None;
        0xB5 => "conv.ovf.i2", None;
        0xB6 => "conv.ovf.u2", None;
        0xB7 => "conv.ovf.i4", None;
        0xB8 => "conv.ovf.u4", None;
        0xB9 => "conv.ovf.i8", None;
        0xBA => "conv.ovf.u8", None;
        0xC2 => "refanyval", Token;
        0xC3 => "ckfinite", None;
        0xC6 => "mkrefany", Token;
        0xD0 => "ldtoken", Token;
        0xD1 => "conv.u2", None;
        0xD2 => "conv.u1", None;
        0xD3 => "conv.i", None;
        0xD4 => "conv.ovf.i", None;
        0xD5 => "conv.ovf.u", None;
        0xD6 => "add.ovf", None;
        0xD7 => "add.ovf.un", None;
        0xD8 => "mul.ovf", None;
        0xD9 => "mul.ovf.un", None;
        0xDA => "sub.ovf", None;
        0xDB => "sub.ovf.un", None;
        0xDC => "endfinally", None;
        0xDD => "leave", I32;
        0xDE => "leave.s", I8;
        0xDF => "stind.i", None;
        0xE0 => "conv.u", None;
    }

    pub(super) use lookup;
}

mod two_byte {
    use super::{OpcodeInfo, OperandShape};

    opcode_table! {
        0x00 => "arglist", None;
        0x01 => "ceq", None;
        0x02 => "cgt", None;
        0x03 => "cgt.un", None;
        0x04 => "clt", None;
        0x05 => "clt.un", None;
        0x06 => "ldftn", Token;
        0x07 => "ldvirtftn", Token;
        0x09 => "ldarg", U16;
        0x0A => "ldarga", U16;
        0x0B => "starg", U16;
        0x0C => "ldloc", U16;
        0x0D => "ldloca", U16;
        0x0E => "stloc", U16;
        0x0F => "localloc", None;
        0x11 => "endfilter", None;
        0x12 => "unaligned.", U8;
        0x13 => "volatile.", None;
        0x14 => "tail.", None;
        0x15 => "initobj", Token;
        0x16 => "constrained.", Token;
        0x17 => "cpblk", None;
        0x18 => "initblk", None;
        0x19 => "rethrow", None;
        0x1C => "sizeof", Token;
        0x1D => "refanytype", None;
        0x1E => "readonly.", None;
    }

    pub(super) use lookup;
}

fn read_operand(stream: &mut Cursor<&[u8]>, shape: OperandShape) -> std::io::Result<Operand> {
    Ok(match shape {
        OperandShape::None => Operand::None,
        OperandShape::I8 => Operand::I8(i8::read(stream)?),
        OperandShape::U8 => Operand::U8(u8::read(stream)?),
        OperandShape::I32 => Operand::I32(i32::read(stream)?),
        OperandShape::U16 => Operand::U16(u16::read(stream)?),
        OperandShape::U32 => Operand::U32(u32::read(stream)?),
        OperandShape::I64 => Operand::I64(i64::read(stream)?),
        OperandShape::F32 => Operand::F32(f32::read(stream)?),
        OperandShape::F64 => Operand::F64(f64::read(stream)?),
        OperandShape::Token => Operand::Token(u32::read(stream)?),
        OperandShape::Switch => {
            let count = u32::read(stream)?;
            let mut targets = Vec::with_capacity(count as usize);
            for _ in 0..count {
                targets.push(i32::read(stream)?);
            }
            Operand::Switch(targets)
        }
    })
}

/// Decodes an entire IL byte slice in one pass. Never errors: an
/// unrecognized byte sequence (including a truncated operand at the tail of
/// the slice) yields a trailing `unknown_<hex>` instruction with no operand
/// rather than aborting the decode, per §4.2's unknown-opcode policy — decode
/// failures are a code-generation concern, not a decoder one.
pub fn decode(bytes: &[u8]) -> Vec<Instruction> {
    let mut stream = Cursor::new(bytes);
    let mut instructions = Vec::new();

    while (stream.position() as usize) < bytes.len() {
        let il_offset = stream.position();
        let Ok(first) = u8::read(&mut stream) else {
            break;
        };

        let (raw, info) = if first == TWO_BYTE_PREFIX {
            match u8::read(&mut stream) {
                Ok(second) => (0xFE00u16 | second as u16, two_byte::lookup(second)),
                Err(_) => (0xFE00u16, None),
            }
        } else {
            (first as u16, single_byte::lookup(first))
        };

        let instruction = match info {
            Some(info) => match read_operand(&mut stream, info.shape) {
                Ok(operand) => Instruction {
                    name: info.name.to_string(),
                    operand,
                    il_offset,
                    next_il_offset: stream.position(),
                },
                Err(_) => Instruction {
                    name: format!("unknown_{raw:x}"),
                    operand: Operand::None,
                    il_offset,
                    next_il_offset: bytes.len() as u64,
                },
            },
            None => Instruction {
                name: format!("unknown_{raw:x}"),
                operand: Operand::None,
                il_offset,
                next_il_offset: stream.position(),
            },
        };

        let reached_end = instruction.next_il_offset as usize >= bytes.len();
        instructions.push(instruction);
        if reached_end {
            break;
        }
        stream.set_position(instructions.last().unwrap().next_il_offset);
    }

    instructions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_ldc_and_ret() {
        let bytes = [0x1F, 0x03, 0x2A]; // ldc.i4.s 3; ret
        let instructions = decode(&bytes);
        assert_eq!(instructions.len(), 2);
        assert_eq!(instructions[0].name, "ldc.i4.s");
        assert_eq!(instructions[0].operand, Operand::I8(3));
        assert_eq!(instructions[1].name, "ret");
    }

    #[test]
    fn decodes_two_byte_prefixed_opcodes() {
        let bytes = [TWO_BYTE_PREFIX, 0x01]; // ceq
        let instructions = decode(&bytes);
        assert_eq!(instructions.len(), 1);
        assert_eq!(instructions[0].name, "ceq");
    }

    #[test]
    fn unknown_opcode_consumes_no_operand() {
        let bytes = [0x78, 0x58]; // 0x78 is unassigned, then `add`
        let instructions = decode(&bytes);
        assert_eq!(instructions.len(), 2);
        assert_eq!(instructions[0].name, "unknown_78");
        assert_eq!(instructions[1].name, "add");
    }

    #[test]
    fn total_bytes_consumed_matches_body_length() {
        let bytes = [0x20, 0x01, 0x00, 0x00, 0x00, 0x2A]; // ldc.i4 1; ret
        let instructions = decode(&bytes);
        assert_eq!(instructions.last().unwrap().next_il_offset, bytes.len() as u64);
    }
}
