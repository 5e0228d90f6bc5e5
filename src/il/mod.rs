//! IL method-body header decoding and opcode-stream decoding (components A's
//! continuation and C).

pub mod body;
pub mod opcode;

pub use opcode::{decode, Instruction, Operand};
