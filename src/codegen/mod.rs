//! Target instruction set (B), relocatable emitter (F), and code generator
//! (G): the three components that turn an IR [`crate::ir::Module`] into
//! target machine code.

pub mod emitter;
pub mod generator;
pub mod target;

pub use generator::{generate, CODE_START, STACK_START, WRAM_START};
