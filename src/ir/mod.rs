//! The IR module (§3): the typed, single-block program model the code
//! generator consumes. `builder` assembles it from a [`crate::metadata::Container`];
//! `module` defines the data it's made of.

pub mod builder;
pub mod module;

pub use builder::build_module;
pub use module::{BasicBlock, Field, Method, Module, Type, TypeClass, ENTRY_BLOCK_LABEL};
