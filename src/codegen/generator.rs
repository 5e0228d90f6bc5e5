//! Component G: lowers an IR [`Module`] to target machine code.
//!
//! The IR is a stack machine; the target has only its hardware call/return
//! stack as an operand stack. Per §4.5.4 the lowering convention is "push
//! intermediates on the hardware stack": every value an IR instruction
//! produces is loaded into a register pair and pushed; every consumer pops
//! its operands before acting. `BC` stands in for the generic "accumulator
//! pair" the design notes describe.

use crate::codegen::emitter::{Emitter, RelocationKind};
use crate::codegen::target::opcodes as op;
use crate::config::CompileConfig;
use crate::error::{CodegenError, EmitError};
use crate::il::{Instruction, Operand};
use crate::ir::{Method, Module};
use crate::metadata::tables::TableKind;
use crate::metadata::token::MetadataToken;
use crate::types::TypeResolver;
use std::collections::HashMap;
use tracing::warn;

/// First byte after the cartridge header (§4.5.1).
pub const CODE_START: u16 = 0x0150;
/// Initial stack pointer; the stack grows downward from the top of HRAM.
pub const STACK_START: u16 = 0xFFFE;
/// Base address for local-variable storage.
pub const WRAM_START: u16 = 0xC000;

const MUL16: &str = "runtime::mul16";
const MUL16_DONE: &str = "runtime::mul16_done";
const DIV16: &str = "runtime::div16";
const DIV16_NONZERO: &str = "runtime::div16_nonzero";
const DIV16_DONE: &str = "runtime::div16_done";
const MEMCPY: &str = "runtime::memcpy";
const MEMSET: &str = "runtime::memset";

const MUL_SCRATCH: u16 = 0xFF80;
const DIV_SCRATCH: u16 = 0xFF82;
const MEMCPY_SCRATCH: u16 = 0xFF84;
const MEMSET_SCRATCH: u16 = 0xFF86;

pub fn generate(
    module: &Module,
    _resolver: &TypeResolver,
    config: &CompileConfig,
) -> Result<Vec<u8>, CodegenError> {
    let mut emitter = Emitter::with_base(CODE_START);

    // Startup stub (§4.5.2).
    emitter.emit_byte(op::LD_SP_D16);
    emitter.emit_bytes(&STACK_START.to_le_bytes());
    emitter.emit_byte(op::DI);

    // Methods are emitted in the module's declaration order (§4.5.3), which
    // `Module.methods` preserves straight from the `MethodDef` table.
    let method_tokens: HashMap<u32, String> = module
        .methods
        .iter()
        .map(|m| (m.token, m.full_name.clone()))
        .collect();

    for method in &module.methods {
        emitter.define_label(method.full_name.clone())?;
        lower_method(&mut emitter, method, &method_tokens, config)?;
    }

    // Entry-point jump (§4.5.7).
    if let Some(entry) = &module.entry_point {
        emitter.emit_byte(op::JP_NN);
        let patch = emitter.emit_bytes(&[0, 0]);
        emitter.reference_label(entry.clone(), patch, RelocationKind::Abs16);
    }

    emit_mul16(&mut emitter)?;
    emit_div16(&mut emitter)?;
    emit_memcpy(&mut emitter)?;
    emit_memset(&mut emitter)?;

    Ok(emitter.finalize()?)
}

fn offset_label(method: &str, il_offset: u64) -> String {
    format!("{method}@{il_offset:#x}")
}

fn lower_method(
    emitter: &mut Emitter,
    method: &Method,
    method_tokens: &HashMap<u32, String>,
    config: &CompileConfig,
) -> Result<(), CodegenError> {
    let block = &method.blocks[0];
    for instr in &block.instructions {
        emitter.define_label(offset_label(&method.full_name, instr.il_offset))?;
        lower_instruction(emitter, method, instr, method_tokens, config)?;
    }
    if !block.is_terminated() {
        emitter.emit_byte(op::RET);
    }
    Ok(())
}

fn branch_target(instr: &Instruction) -> Result<u64, CodegenError> {
    let displacement = match &instr.operand {
        Operand::I8(value) => *value as i64,
        Operand::I32(value) => *value as i64,
        _ => return Err(CodegenError::InvalidBranchTarget(instr.il_offset)),
    };
    let target = instr.next_il_offset as i64 + displacement;
    u64::try_from(target).map_err(|_| CodegenError::InvalidBranchTarget(instr.il_offset))
}

fn ldc_i4_value(instr: &Instruction) -> Result<i32, CodegenError> {
    match instr.name.as_str() {
        "ldc.i4.m1" => Ok(-1),
        "ldc.i4.0" => Ok(0),
        "ldc.i4.1" => Ok(1),
        "ldc.i4.2" => Ok(2),
        "ldc.i4.3" => Ok(3),
        "ldc.i4.4" => Ok(4),
        "ldc.i4.5" => Ok(5),
        "ldc.i4.6" => Ok(6),
        "ldc.i4.7" => Ok(7),
        "ldc.i4.8" => Ok(8),
        "ldc.i4.s" => match instr.operand {
            Operand::I8(v) => Ok(v as i32),
            _ => Err(CodegenError::InvalidBranchTarget(instr.il_offset)),
        },
        "ldc.i4" => match instr.operand {
            Operand::I32(v) => Ok(v),
            _ => Err(CodegenError::InvalidBranchTarget(instr.il_offset)),
        },
        other => Err(CodegenError::UnsupportedOpcode(other.to_string())),
    }
}

fn local_index(instr: &Instruction) -> u16 {
    match instr.name.as_str() {
        "ldarg.0" | "ldloc.0" | "stloc.0" => 0,
        "ldarg.1" | "ldloc.1" | "stloc.1" => 1,
        "ldarg.2" | "ldloc.2" | "stloc.2" => 2,
        "ldarg.3" | "ldloc.3" | "stloc.3" => 3,
        _ => match instr.operand {
            Operand::U16(v) => v,
            Operand::U8(v) => v as u16,
            _ => 0,
        },
    }
}

fn push_immediate(emitter: &mut Emitter, value: i32) {
    if value < i16::MIN as i32 || value > i16::MAX as i32 {
        warn!(value, "32-bit constant narrowed to 16 bits");
    }
    let bits = (value as i16) as u16;
    emitter.emit_byte(op::LD_BC_D16);
    emitter.emit_bytes(&bits.to_le_bytes());
    emitter.emit_byte(op::PUSH_BC);
}

fn local_address(index: u16) -> u16 {
    WRAM_START.wrapping_add(index.wrapping_mul(2))
}

fn emit_local_load(emitter: &mut Emitter, index: u16) {
    emitter.emit_byte(op::LD_HL_D16);
    emitter.emit_bytes(&local_address(index).to_le_bytes());
    emitter.emit_byte(op::LD_C_HL);
    emitter.emit_byte(op::INC_HL);
    emitter.emit_byte(op::LD_B_HL);
    emitter.emit_byte(op::PUSH_BC);
}

fn emit_local_store(emitter: &mut Emitter, index: u16) {
    emitter.emit_byte(op::POP_BC);
    emitter.emit_byte(op::LD_HL_D16);
    emitter.emit_bytes(&local_address(index).to_le_bytes());
    emitter.emit_byte(op::LD_HL_C);
    emitter.emit_byte(op::INC_HL);
    emitter.emit_byte(op::LD_HL_B);
}

fn emit_add(emitter: &mut Emitter) {
    emitter.emit_byte(op::POP_DE);
    emitter.emit_byte(op::POP_HL);
    emitter.emit_byte(op::ADD_HL_DE);
    emitter.emit_byte(op::PUSH_HL);
}

/// 16-bit subtract via an 8-bit `SUB`/`SBC` pair — this target has no
/// 16-bit subtract-with-borrow against a register pair.
fn emit_sub(emitter: &mut Emitter) {
    emitter.emit_byte(op::POP_DE); // subtrahend
    emitter.emit_byte(op::POP_HL); // minuend
    emitter.emit_byte(op::LD_A_L);
    emitter.emit_byte(op::SUB_A_E);
    emitter.emit_byte(op::LD_L_A);
    emitter.emit_byte(op::LD_A_H);
    emitter.emit_byte(op::SBC_A_D);
    emitter.emit_byte(op::LD_H_A);
    emitter.emit_byte(op::PUSH_HL);
}

fn emit_call_helper(emitter: &mut Emitter, label: &str) {
    emitter.emit_byte(op::CALL_NN);
    let patch = emitter.emit_bytes(&[0, 0]);
    emitter.reference_label(label.to_string(), patch, RelocationKind::Abs16);
}

fn emit_jump(emitter: &mut Emitter, label: &str, short: bool) {
    if short {
        emitter.emit_byte(op::JR_E);
        let patch = emitter.emit_byte(0);
        emitter.reference_label(label.to_string(), patch, RelocationKind::Rel8);
    } else {
        emitter.emit_byte(op::JP_NN);
        let patch = emitter.emit_bytes(&[0, 0]);
        emitter.reference_label(label.to_string(), patch, RelocationKind::Abs16);
    }
}

/// Pops a 16-bit condition value and branches if it is zero (`brfalse`) or
/// non-zero (`brtrue`).
fn emit_condition_branch(emitter: &mut Emitter, branch_if_false: bool, short: bool, label: &str) {
    emitter.emit_byte(op::POP_BC);
    emitter.emit_byte(op::LD_A_B);
    emitter.emit_byte(op::OR_A_C);
    let (jr_op, jp_op) = if branch_if_false {
        (op::JR_Z, op::JP_Z)
    } else {
        (op::JR_NZ, op::JP_NZ)
    };
    if short {
        emitter.emit_byte(jr_op);
        let patch = emitter.emit_byte(0);
        emitter.reference_label(label.to_string(), patch, RelocationKind::Rel8);
    } else {
        emitter.emit_byte(jp_op);
        let patch = emitter.emit_bytes(&[0, 0]);
        emitter.reference_label(label.to_string(), patch, RelocationKind::Abs16);
    }
}

/// Pops `rhs` then `lhs`, computes `lhs - rhs` into `HL` via the same 8-bit
/// borrow chain as [`emit_sub`], leaving `Z` set iff the operands were equal
/// and bit 7 of `H` set iff the (non-overflowing, signed) difference is
/// negative.
fn emit_signed_difference(emitter: &mut Emitter) {
    emitter.emit_byte(op::POP_DE); // rhs
    emitter.emit_byte(op::POP_HL); // lhs
    emitter.emit_byte(op::LD_A_L);
    emitter.emit_byte(op::SUB_A_E);
    emitter.emit_byte(op::LD_L_A);
    emitter.emit_byte(op::LD_A_H);
    emitter.emit_byte(op::SBC_A_D);
    emitter.emit_byte(op::LD_H_A);
}

fn emit_branch_if_zero(emitter: &mut Emitter, short: bool, label: &str) {
    emitter.emit_byte(op::LD_A_H);
    emitter.emit_byte(0xB5); // OR L
    if short {
        emitter.emit_byte(op::JR_Z);
        let patch = emitter.emit_byte(0);
        emitter.reference_label(label.to_string(), patch, RelocationKind::Rel8);
    } else {
        emitter.emit_byte(op::JP_Z);
        let patch = emitter.emit_bytes(&[0, 0]);
        emitter.reference_label(label.to_string(), patch, RelocationKind::Abs16);
    }
}

fn emit_branch_on_sign(emitter: &mut Emitter, branch_if_negative: bool, short: bool, label: &str) {
    emitter.emit_bytes(&[op::PREFIX_CB, 0x7C]); // BIT 7,H
    let (jr_op, jp_op) = if branch_if_negative {
        (op::JR_NZ, op::JP_NZ)
    } else {
        (op::JR_Z, op::JP_Z)
    };
    if short {
        emitter.emit_byte(jr_op);
        let patch = emitter.emit_byte(0);
        emitter.reference_label(label.to_string(), patch, RelocationKind::Rel8);
    } else {
        emitter.emit_byte(jp_op);
        let patch = emitter.emit_bytes(&[0, 0]);
        emitter.reference_label(label.to_string(), patch, RelocationKind::Abs16);
    }
}

/// Comparisons lower to a 16-bit signed difference plus a zero/sign test.
/// `bgt`/`ble` need both tests, so they emit a local skip label unique to
/// this instruction's IL offset.
fn emit_comparison_branch(
    emitter: &mut Emitter,
    method: &str,
    instr: &Instruction,
    target_label: &str,
) -> Result<(), EmitError> {
    let short = instr.name.ends_with(".s");
    let mnemonic = instr.name.trim_end_matches(".s");
    emit_signed_difference(emitter);
    match mnemonic {
        "beq" => emit_branch_if_zero(emitter, short, target_label),
        "blt" => emit_branch_on_sign(emitter, true, short, target_label),
        "bge" => emit_branch_on_sign(emitter, false, short, target_label),
        "ble" => {
            emit_branch_if_zero(emitter, short, target_label);
            emit_branch_on_sign(emitter, true, short, target_label);
        }
        "bgt" => {
            let skip = offset_label(method, instr.il_offset) + "#skip";
            emit_branch_if_zero(emitter, short, &skip);
            emit_branch_on_sign(emitter, false, short, target_label);
            emitter.define_label(skip)?;
        }
        _ => unreachable!("only the beq/bge/bgt/ble/blt family reaches this function"),
    }
    Ok(())
}

/// Resolves a `call`/`callvirt` operand token to the full name of a method
/// defined in this module, or `None` for anything else (a cross-assembly
/// `MemberRef`, `calli`'s indirect target, ...) — §4.5.4's "unknown target"
/// case, which v1 has no dynamic dispatch or cross-assembly linking for.
fn resolve_call_target<'a>(raw_token: u32, method_tokens: &'a HashMap<u32, String>) -> Option<&'a str> {
    let token = MetadataToken::from_raw(raw_token);
    if token.table_kind_byte() != TableKind::MethodDef as u8 {
        return None;
    }
    method_tokens.get(&raw_token).map(String::as_str)
}

fn lower_instruction(
    emitter: &mut Emitter,
    method: &Method,
    instr: &Instruction,
    method_tokens: &HashMap<u32, String>,
    config: &CompileConfig,
) -> Result<(), CodegenError> {
    match instr.name.as_str() {
        "nop" => {
            emitter.emit_byte(op::NOP);
        }
        "ret" | "return" => {
            emitter.emit_byte(op::RET);
        }
        name if name.starts_with("ldc.i4") => {
            let value = ldc_i4_value(instr)?;
            push_immediate(emitter, value);
        }
        "ldarg.0" | "ldarg.1" | "ldarg.2" | "ldarg.3" | "ldarg.s" | "ldarg" | "ldloc.0"
        | "ldloc.1" | "ldloc.2" | "ldloc.3" | "ldloc.s" | "ldloc" => {
            emit_local_load(emitter, local_index(instr));
        }
        "stloc.0" | "stloc.1" | "stloc.2" | "stloc.3" | "stloc.s" | "stloc" | "starg"
        | "starg.s" => {
            emit_local_store(emitter, local_index(instr));
        }
        "add" => emit_add(emitter),
        "sub" => emit_sub(emitter),
        "mul" => emit_call_helper(emitter, MUL16),
        "div" => emit_call_helper(emitter, DIV16),
        "call" | "callvirt" => match instr.operand {
            Operand::Token(raw) => match resolve_call_target(raw, method_tokens) {
                Some(target) => emit_call_helper(emitter, target),
                None => {
                    warn!(
                        method = %method.full_name,
                        opcode = %instr.name,
                        token = format!("{raw:#010x}"),
                        "call target not resolved; lowered as no-op"
                    );
                    emitter.emit_byte(op::NOP);
                }
            },
            _ => {
                warn!(method = %method.full_name, opcode = %instr.name, "call target not resolved; lowered as no-op");
                emitter.emit_byte(op::NOP);
            }
        },
        "br" | "br.s" => {
            let target = branch_target(instr)?;
            emit_jump(
                emitter,
                &offset_label(&method.full_name, target),
                instr.name == "br.s",
            );
        }
        "brfalse" | "brfalse.s" | "brtrue" | "brtrue.s" => {
            let target = branch_target(instr)?;
            emit_condition_branch(
                emitter,
                instr.name.starts_with("brfalse"),
                instr.name.ends_with(".s"),
                &offset_label(&method.full_name, target),
            );
        }
        "beq.s" | "beq" | "bge.s" | "bge" | "bgt.s" | "bgt" | "ble.s" | "ble" | "blt.s"
        | "blt" => {
            let target = branch_target(instr)?;
            emit_comparison_branch(
                emitter,
                &method.full_name,
                instr,
                &offset_label(&method.full_name, target),
            )?;
        }
        other => {
            if config.strict_opcodes {
                return Err(CodegenError::UnsupportedOpcode(other.to_string()));
            }
            warn!(opcode = other, "no target lowering; emitted as no-op");
            emitter.emit_byte(op::NOP);
        }
    }
    Ok(())
}

fn emit_save_bc(emitter: &mut Emitter, scratch: u16) {
    emitter.emit_byte(op::LD_HL_D16);
    emitter.emit_bytes(&scratch.to_le_bytes());
    emitter.emit_byte(op::LD_HL_C);
    emitter.emit_byte(op::INC_HL);
    emitter.emit_byte(op::LD_HL_B);
}

fn emit_restore_bc(emitter: &mut Emitter, scratch: u16) {
    emitter.emit_byte(op::LD_HL_D16);
    emitter.emit_bytes(&scratch.to_le_bytes());
    emitter.emit_byte(op::LD_C_HL);
    emitter.emit_byte(op::INC_HL);
    emitter.emit_byte(op::LD_B_HL);
}

/// Shift-and-add 16x16→16 multiply, unrolled over the 16 bits of the
/// multiplier so no loop counter register is needed. `BC` (the
/// callee-saved index pair, per §4.5.6) is used as scratch and restored
/// from `MUL_SCRATCH` before return.
fn emit_mul16(emitter: &mut Emitter) -> Result<(), EmitError> {
    emitter.define_label(MUL16)?;
    emit_save_bc(emitter, MUL_SCRATCH);
    emitter.emit_byte(op::POP_DE); // multiplier
    emitter.emit_byte(op::POP_BC); // multiplicand
    emitter.emit_byte(op::LD_HL_D16);
    emitter.emit_bytes(&0u16.to_le_bytes()); // product accumulator

    emitter.emit_byte(op::LD_A_D);
    emitter.emit_byte(op::OR_A_E);
    emitter.emit_byte(op::JP_Z);
    let fast_path = emitter.emit_bytes(&[0, 0]);
    emitter.reference_label(MUL16_DONE, fast_path, RelocationKind::Abs16);

    for _ in 0..16 {
        emitter.emit_bytes(&[op::PREFIX_CB, op::BIT_0_E]); // BIT 0,E
        emitter.emit_byte(op::JR_Z);
        emitter.emit_byte(1); // skip the 1-byte ADD HL,BC below
        emitter.emit_byte(op::ADD_HL_BC);
        emitter.emit_bytes(&[op::PREFIX_CB, op::SLA_C]); // SLA C
        emitter.emit_bytes(&[op::PREFIX_CB, op::RL_B]); // RL B
    }

    emitter.define_label(MUL16_DONE)?;
    emitter.emit_byte(op::PUSH_HL);
    emit_restore_bc(emitter, MUL_SCRATCH);
    emitter.emit_byte(op::RET);
    Ok(())
}

/// Restoring 16/16 division, unrolled over 16 bits. `BC` carries the
/// dividend and becomes the quotient; `HL` accumulates the remainder.
/// Division by zero yields `0, 0` without trapping, per §4.5.6.
fn emit_div16(emitter: &mut Emitter) -> Result<(), EmitError> {
    emitter.define_label(DIV16)?;
    emit_save_bc(emitter, DIV_SCRATCH);
    emitter.emit_byte(op::POP_DE); // divisor
    emitter.emit_byte(op::POP_BC); // dividend

    emitter.emit_byte(op::LD_A_D);
    emitter.emit_byte(op::OR_A_E);
    emitter.emit_byte(op::JP_NZ);
    let nonzero = emitter.emit_bytes(&[0, 0]);
    emitter.reference_label(DIV16_NONZERO, nonzero, RelocationKind::Abs16);

    emitter.emit_byte(op::LD_BC_D16);
    emitter.emit_bytes(&0u16.to_le_bytes());
    emitter.emit_byte(op::LD_HL_D16);
    emitter.emit_bytes(&0u16.to_le_bytes());
    emitter.emit_byte(op::JP_NN);
    let to_done = emitter.emit_bytes(&[0, 0]);
    emitter.reference_label(DIV16_DONE, to_done, RelocationKind::Abs16);

    emitter.define_label(DIV16_NONZERO)?;
    emitter.emit_byte(op::LD_HL_D16);
    emitter.emit_bytes(&0u16.to_le_bytes()); // remainder

    for _ in 0..16 {
        emitter.emit_bytes(&[op::PREFIX_CB, op::SLA_C]); // SLA C
        emitter.emit_bytes(&[op::PREFIX_CB, op::RL_B]); // RL B
        emitter.emit_bytes(&[op::PREFIX_CB, op::RL_L]); // RL L
        emitter.emit_bytes(&[op::PREFIX_CB, op::RL_H]); // RL H
        emitter.emit_byte(op::LD_A_L);
        emitter.emit_byte(op::SUB_A_E);
        emitter.emit_byte(op::LD_L_A);
        emitter.emit_byte(op::LD_A_H);
        emitter.emit_byte(op::SBC_A_D);
        emitter.emit_byte(op::LD_H_A);
        emitter.emit_byte(op::JR_C);
        emitter.emit_byte(6); // borrow: skip the quotient-bit-set path
        emitter.emit_byte(op::LD_A_C);
        emitter.emit_byte(op::OR_D8);
        emitter.emit_byte(0x01);
        emitter.emit_byte(op::LD_C_A);
        emitter.emit_byte(op::JR_E);
        emitter.emit_byte(1); // skip the restore-add below
        emitter.emit_byte(op::ADD_HL_DE); // borrow path: undo the subtract
    }

    emitter.emit_byte(op::PUSH_BC); // quotient
    emitter.emit_byte(op::PUSH_HL); // remainder, pushed last
    emitter.define_label(DIV16_DONE)?;
    emit_restore_bc(emitter, DIV_SCRATCH);
    emitter.emit_byte(op::RET);
    Ok(())
}

fn emit_memcpy(emitter: &mut Emitter) -> Result<(), EmitError> {
    emitter.define_label(MEMCPY)?;
    emit_save_bc(emitter, MEMCPY_SCRATCH);
    emitter.emit_byte(op::POP_BC); // count
    emitter.emit_byte(op::POP_HL); // source
    emitter.emit_byte(op::POP_DE); // destination

    emitter.emit_byte(op::LD_A_B);
    emitter.emit_byte(op::OR_A_C);
    emitter.emit_byte(op::JR_Z);
    emitter.emit_byte(9); // count == 0: skip the 9-byte loop body

    emitter.emit_byte(op::LD_A_HL);
    emitter.emit_byte(op::LD_DE_A);
    emitter.emit_byte(op::INC_HL);
    emitter.emit_byte(op::INC_DE);
    emitter.emit_byte(op::DEC_BC);
    emitter.emit_byte(op::LD_A_B);
    emitter.emit_byte(op::OR_A_C);
    emitter.emit_byte(op::JR_NZ);
    emitter.emit_byte((-9i8) as u8);

    emit_restore_bc(emitter, MEMCPY_SCRATCH);
    emitter.emit_byte(op::RET);
    Ok(())
}

fn emit_memset(emitter: &mut Emitter) -> Result<(), EmitError> {
    emitter.define_label(MEMSET)?;
    emit_save_bc(emitter, MEMSET_SCRATCH);
    emitter.emit_byte(op::POP_BC); // count
    emitter.emit_byte(op::POP_DE); // value (low byte, E)
    emitter.emit_byte(op::POP_HL); // destination

    emitter.emit_byte(op::LD_A_B);
    emitter.emit_byte(op::OR_A_C);
    emitter.emit_byte(op::JR_Z);
    emitter.emit_byte(8); // count == 0: skip the 8-byte loop body

    emitter.emit_byte(op::LD_A_E);
    emitter.emit_byte(op::LD_HL_A);
    emitter.emit_byte(op::INC_HL);
    emitter.emit_byte(op::DEC_BC);
    emitter.emit_byte(op::LD_A_B);
    emitter.emit_byte(op::OR_A_C);
    emitter.emit_byte(op::JR_NZ);
    emitter.emit_byte((-8i8) as u8);

    emit_restore_bc(emitter, MEMSET_SCRATCH);
    emitter.emit_byte(op::RET);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BasicBlock, ENTRY_BLOCK_LABEL};

    fn instr(name: &str, operand: Operand, il_offset: u64, next_il_offset: u64) -> Instruction {
        Instruction {
            name: name.to_string(),
            operand,
            il_offset,
            next_il_offset,
        }
    }

    #[test]
    fn empty_module_emits_only_the_startup_stub() {
        let module = Module::new();
        let resolver = TypeResolver::new();
        let config = CompileConfig::default();
        let code = generate(&module, &resolver, &config).unwrap();
        // The runtime helpers (mul16/div16/memcpy/memset) are always
        // appended after the stub, so only the stub's prefix is pinned here.
        assert_eq!(&code[..4], &[0x31, 0xFE, 0xFF, 0xF3]);
    }

    #[test]
    fn ldc_and_ret_lowers_to_push_then_return() {
        let mut module = Module::new();
        module.methods.push(Method {
            name: "Main".to_string(),
            full_name: "Program::Main".to_string(),
            is_static: true,
            is_entry_point: true,
            blocks: vec![BasicBlock {
                label: ENTRY_BLOCK_LABEL.to_string(),
                instructions: vec![
                    instr("ldc.i4.3", Operand::None, 0, 1),
                    instr("ret", Operand::None, 1, 2),
                ],
                successors: vec![],
                predecessors: vec![],
            }],
            token: 0x0600_0001,
        });
        module.entry_point = Some("Program::Main".to_string());
        let resolver = TypeResolver::new();
        let config = CompileConfig::default();
        let code = generate(&module, &resolver, &config).unwrap();
        // startup stub (4) + ld bc,3 (3) + push bc (1) + ret (1) = 9, then the entry jump (3)
        assert_eq!(&code[4..9], &[0x01, 0x03, 0x00, 0xC5, 0xC9]);
        // entry jump targets CODE_START + 4, the method's load address
        assert_eq!(&code[9..12], &[0xC3, 0x54, 0x01]);
    }

    #[test]
    fn out_of_range_short_branch_reports_relocation_error() {
        let mut module = Module::new();
        // `ldc.i4.3` (1 IL byte) lowers to 4 machine bytes, so a forward
        // branch whose IL displacement fits in `i8` can still put the
        // machine-code target well outside `JR`'s +-127 reach.
        let mut instructions = vec![instr("brtrue.s", Operand::I8(100), 0, 2)];
        for i in 0..120u64 {
            instructions.push(instr("ldc.i4.3", Operand::None, 2 + i, 3 + i));
        }
        module.methods.push(Method {
            name: "Main".to_string(),
            full_name: "Program::Main".to_string(),
            is_static: true,
            is_entry_point: false,
            blocks: vec![BasicBlock {
                label: ENTRY_BLOCK_LABEL.to_string(),
                instructions,
                successors: vec![],
                predecessors: vec![],
            }],
            token: 0x0600_0001,
        });
        let resolver = TypeResolver::new();
        let config = CompileConfig::default();
        assert!(matches!(
            generate(&module, &resolver, &config),
            Err(CodegenError::Emit(EmitError::RelocationOutOfRange { .. }))
        ));
    }

    #[test]
    fn call_to_a_method_in_this_module_resolves_to_its_address() {
        let mut module = Module::new();
        module.methods.push(Method {
            name: "Main".to_string(),
            full_name: "Program::Main".to_string(),
            is_static: true,
            is_entry_point: true,
            blocks: vec![BasicBlock {
                label: ENTRY_BLOCK_LABEL.to_string(),
                instructions: vec![
                    instr("call", Operand::Token(0x0600_0002), 0, 5),
                    instr("ret", Operand::None, 5, 6),
                ],
                successors: vec![],
                predecessors: vec![],
            }],
            token: 0x0600_0001,
        });
        module.methods.push(Method {
            name: "Helper".to_string(),
            full_name: "Program::Helper".to_string(),
            is_static: true,
            is_entry_point: false,
            blocks: vec![BasicBlock {
                label: ENTRY_BLOCK_LABEL.to_string(),
                instructions: vec![instr("ret", Operand::None, 0, 1)],
                successors: vec![],
                predecessors: vec![],
            }],
            token: 0x0600_0002,
        });
        module.entry_point = Some("Program::Main".to_string());
        let resolver = TypeResolver::new();
        let config = CompileConfig::default();
        let code = generate(&module, &resolver, &config).unwrap();

        // startup stub (4) + call nn (3) + ret (1) = 8, so `Main` spans
        // code[4..12]; `Helper` immediately follows at code[12].
        assert_eq!(code[4], op::CALL_NN);
        let helper_address = u16::from_le_bytes([code[5], code[6]]);
        assert_eq!(helper_address, CODE_START + 8);
        assert_eq!(code[7], op::RET);
        assert_eq!(code[8], op::RET);
    }

    #[test]
    fn call_to_an_unresolved_token_lowers_as_a_no_op() {
        let mut module = Module::new();
        module.methods.push(Method {
            name: "Main".to_string(),
            full_name: "Program::Main".to_string(),
            is_static: true,
            is_entry_point: true,
            blocks: vec![BasicBlock {
                label: ENTRY_BLOCK_LABEL.to_string(),
                // 0x0A000001: a MemberRef token (table kind 0x0A), never a
                // method defined in this module.
                instructions: vec![
                    instr("call", Operand::Token(0x0A00_0001), 0, 5),
                    instr("ret", Operand::None, 5, 6),
                ],
                successors: vec![],
                predecessors: vec![],
            }],
            token: 0x0600_0001,
        });
        module.entry_point = Some("Program::Main".to_string());
        let resolver = TypeResolver::new();
        let config = CompileConfig::default();
        let code = generate(&module, &resolver, &config).unwrap();

        assert_eq!(code[4], op::NOP);
        assert_eq!(code[5], op::RET);
    }
}
