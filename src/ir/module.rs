//! The IR data model (§3): a stack-machine module built once per
//! compilation and consumed read-only by the code generator.
//!
//! Shaped directly from the design document rather than any one teacher
//! file — the nearest structural analogue in the pack is the owned-value
//! style of `cilium/src/schema/assembly.rs` (`Assembly` owning `Vec<Type>`/
//! `Vec<Method>` rather than cilium's own arena-indexed cross-references),
//! since this IR has no need to resolve references back into a shared
//! object graph.

use crate::il::Instruction;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TypeClass {
    Primitive,
    ValueType,
    ReferenceType,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    /// Name of the field's own type, or a primitive name — not resolved to
    /// a `Type` reference, since layout is computed once at build time and
    /// never needs to walk back to the declaring type.
    pub type_name: String,
    pub offset: u16,
}

#[derive(Debug, Clone)]
pub struct Type {
    pub name: String,
    pub full_name: String,
    pub size: u16,
    pub fields: Vec<Field>,
    pub class: TypeClass,
}

#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub label: String,
    pub instructions: Vec<Instruction>,
    pub successors: Vec<String>,
    pub predecessors: Vec<String>,
}

impl BasicBlock {
    /// True only for instructions that unconditionally leave the block.
    /// Conditional branches (`brtrue`, `beq`, ...) fall through when the test
    /// fails, so they don't count — the caller still needs a trailing `ret`
    /// for that fallthrough path.
    pub fn is_terminated(&self) -> bool {
        matches!(
            self.instructions.last().map(|i| i.name.as_str()),
            Some("ret") | Some("br") | Some("br.s")
        )
    }
}

pub const ENTRY_BLOCK_LABEL: &str = "entry";

#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub full_name: String,
    pub is_static: bool,
    pub is_entry_point: bool,
    pub blocks: Vec<BasicBlock>,
    /// This method's `MethodDef` metadata token, as it appears in another
    /// method's `call`/`callvirt` operand when calling it.
    pub token: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Module {
    pub types: BTreeMap<String, Type>,
    /// In metadata-table declaration order, not sorted by name — `call`
    /// targets and the emitted binary's layout both need this order
    /// preserved (§4.5.3).
    pub methods: Vec<Method>,
    pub entry_point: Option<String>,
    pub constants: BTreeMap<u32, Vec<u8>>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }
}
