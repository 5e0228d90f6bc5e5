//! Component B: the target instruction set — an SM83-style 8-bit CPU with a
//! 16-bit address bus, four register pairs (`AF`, `BC`, `DE`, `HL`), and a
//! hardware call/return stack.
//!
//! The opcode byte values below are the real SM83 encodings; `info` exposes
//! mnemonic/size/cycle metadata for the subset the code generator and
//! runtime helpers emit, following the same declarative-table shape as
//! [`crate::il::opcode`]'s `opcode_table!`.

/// Raw opcode byte constants used by [`crate::codegen::generator`].
#[allow(dead_code)]
pub mod opcodes {
    pub const NOP: u8 = 0x00;
    pub const LD_BC_D16: u8 = 0x01;
    pub const INC_DE: u8 = 0x13;
    pub const LD_DE_D16: u8 = 0x11;
    pub const LD_DE_A: u8 = 0x12;
    pub const DEC_BC: u8 = 0x0B;
    pub const ADD_HL_BC: u8 = 0x09;
    pub const ADD_HL_DE: u8 = 0x19;
    pub const LD_HL_D16: u8 = 0x21;
    pub const INC_HL: u8 = 0x23;
    pub const LD_SP_D16: u8 = 0x31;
    pub const LD_HL_B: u8 = 0x70;
    pub const LD_HL_C: u8 = 0x71;
    pub const LD_HL_A: u8 = 0x77;
    pub const LD_A_HL: u8 = 0x7E;
    pub const LD_B_HL: u8 = 0x46;
    pub const LD_C_HL: u8 = 0x4E;
    pub const LD_A_B: u8 = 0x78;
    pub const LD_A_C: u8 = 0x79;
    pub const LD_A_D: u8 = 0x7A;
    pub const LD_A_E: u8 = 0x7B;
    pub const LD_A_H: u8 = 0x7C;
    pub const LD_A_L: u8 = 0x7D;
    pub const LD_B_A: u8 = 0x47;
    pub const LD_C_A: u8 = 0x4F;
    pub const LD_L_A: u8 = 0x6F;
    pub const LD_H_A: u8 = 0x67;
    pub const SUB_A_E: u8 = 0x93;
    pub const SBC_A_D: u8 = 0x9A;
    pub const OR_A_C: u8 = 0xB1;
    pub const OR_A_E: u8 = 0xB3;
    pub const OR_D8: u8 = 0xF6;
    pub const POP_BC: u8 = 0xC1;
    pub const POP_DE: u8 = 0xD1;
    pub const POP_HL: u8 = 0xE1;
    pub const JP_NZ: u8 = 0xC2;
    pub const JP_NN: u8 = 0xC3;
    pub const PUSH_BC: u8 = 0xC5;
    pub const RET: u8 = 0xC9;
    pub const PREFIX_CB: u8 = 0xCB;
    pub const JP_Z: u8 = 0xCA;
    pub const CALL_NN: u8 = 0xCD;
    pub const PUSH_DE: u8 = 0xD5;
    pub const PUSH_HL: u8 = 0xE5;
    pub const DI: u8 = 0xF3;
    pub const JR_E: u8 = 0x18;
    pub const JR_NZ: u8 = 0x20;
    pub const JR_Z: u8 = 0x28;
    pub const JR_C: u8 = 0x38;

    // CB-prefixed rotate/shift/bit ops, used only inside the runtime helpers;
    // always emitted as the pair `[PREFIX_CB, <this>]`.
    pub const BIT_0_E: u8 = 0x43;
    pub const SLA_C: u8 = 0x21;
    pub const RL_B: u8 = 0x10;
    pub const RL_L: u8 = 0x15;
    pub const RL_H: u8 = 0x14;
}

#[derive(Debug, Clone, Copy)]
pub struct OpcodeInfo {
    pub mnemonic: &'static str,
    pub size: u8,
    pub cycles: u8,
}

macro_rules! opcode_table {
    ($($byte:expr => $mnemonic:expr, $size:expr, $cycles:expr);* $(;)?) => {
        /// Looks up mnemonic/size/cycle metadata for a primary-page opcode
        /// byte. Returns `None` for bytes this compiler never emits.
        pub fn info(byte: u8) -> Option<OpcodeInfo> {
            match byte {
                $($byte => Some(OpcodeInfo { mnemonic: $mnemonic, size: $size, cycles: $cycles }),)*
                _ => None,
            }
        }
    };
}

opcode_table! {
    0x00 => "nop", 1, 4;
    0x01 => "ld bc,d16", 3, 12;
    0x09 => "add hl,bc", 1, 8;
    0x0B => "dec bc", 1, 8;
    0x11 => "ld de,d16", 3, 12;
    0x12 => "ld (de),a", 1, 8;
    0x13 => "inc de", 1, 8;
    0x19 => "add hl,de", 1, 8;
    0x21 => "ld hl,d16", 3, 12;
    0x23 => "inc hl", 1, 8;
    0x31 => "ld sp,d16", 3, 12;
    0x46 => "ld b,(hl)", 1, 8;
    0x47 => "ld b,a", 1, 4;
    0x4E => "ld c,(hl)", 1, 8;
    0x4F => "ld c,a", 1, 4;
    0x67 => "ld h,a", 1, 4;
    0x6F => "ld l,a", 1, 4;
    0x70 => "ld (hl),b", 1, 8;
    0x71 => "ld (hl),c", 1, 8;
    0x77 => "ld (hl),a", 1, 8;
    0x78 => "ld a,b", 1, 4;
    0x79 => "ld a,c", 1, 4;
    0x7A => "ld a,d", 1, 4;
    0x7B => "ld a,e", 1, 4;
    0x7C => "ld a,h", 1, 4;
    0x7D => "ld a,l", 1, 4;
    0x7E => "ld a,(hl)", 1, 8;
    0x93 => "sub e", 1, 4;
    0x9A => "sbc a,d", 1, 4;
    0xB1 => "or c", 1, 4;
    0xB3 => "or e", 1, 4;
    0xC1 => "pop bc", 1, 12;
    0xC2 => "jp nz,a16", 3, 12;
    0xC3 => "jp a16", 3, 16;
    0xC5 => "push bc", 1, 16;
    0xC9 => "ret", 1, 16;
    0xCA => "jp z,a16", 3, 12;
    0xCD => "call a16", 3, 24;
    0xD1 => "pop de", 1, 12;
    0xD5 => "push de", 1, 16;
    0xE1 => "pop hl", 1, 12;
    0xE5 => "push hl", 1, 16;
    0xF3 => "di", 1, 4;
    0xF6 => "or d8", 2, 8;
    0x18 => "jr r8", 2, 12;
    0x20 => "jr nz,r8", 2, 8;
    0x28 => "jr z,r8", 2, 8;
    0x38 => "jr c,r8", 2, 8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_opcode_reports_its_size() {
        assert_eq!(info(opcodes::LD_SP_D16).unwrap().size, 3);
    }

    #[test]
    fn unassigned_byte_reports_none() {
        assert!(info(0xD3).is_none());
    }
}
