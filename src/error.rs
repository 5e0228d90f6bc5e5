//! Per-component error enums plus a top-level [`CompileError`] that composes
//! them with `#[from]`.
//!
//! The teacher library's own `schema::errors::ReadError` is a hand-rolled
//! enum with only a `Debug` impl — fine for a library with no CLI to report
//! through. This repository's whole purpose is a CLI (§10.1/10.2 of
//! SPEC_FULL.md), which has to print a human-readable message on failure, so
//! the ambient error layer instead follows the `thiserror` convention used
//! elsewhere in the corpus (`wasmtime`'s `host` crate, `fuel-vm`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("input is too short to contain a {0}")]
    Truncated(&'static str),
    #[error("missing MZ signature")]
    BadDosSignature,
    #[error("missing PE\\0\\0 signature")]
    BadPeSignature,
    #[error("unrecognized PE optional header magic")]
    BadOptionalHeaderSignature,
    #[error("RVA {0:#x} does not fall within any section")]
    InvalidRva(u32),
    #[error("missing or empty CLI header data directory")]
    MissingCliHeader,
    #[error("missing BSJB metadata root signature")]
    BadMetadataSignature,
    #[error("metadata stream directory names an unsupported heap kind {0:?}")]
    UnsupportedHeap(String),
    #[error("missing required metadata heap {0}")]
    MissingMetadataHeap(&'static str),
    #[error("metadata table stream names unsupported table kind {0:#x}")]
    UnsupportedTable(usize),
    #[error("string heap index {0} is out of range")]
    InvalidStringIndex(usize),
    #[error("blob heap index {0} is out of range")]
    InvalidBlobIndex(usize),
    #[error("I/O error reading container: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum MethodBodyError {
    #[error("method header byte {0:#04x} is neither a tiny nor a fat header")]
    MalformedHeader(u8),
    #[error("declared code size {declared} exceeds the {available} bytes available")]
    CodeSizeOutOfRange { declared: u32, available: usize },
    #[error("I/O error reading method body: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum TypeError {
    #[error("type {0} has no lowering on this target (floating-point / unsupported width)")]
    Unsupported(String),
    #[error("field offsets of type {0} are not strictly increasing")]
    BadLayout(String),
}

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("label {0:?} defined more than once")]
    DuplicateLabel(String),
    #[error("label {0:?} referenced but never defined")]
    UnresolvedLabel(String),
    #[error("relocation to {label:?} has displacement {displacement}, outside [-128, 127]")]
    RelocationOutOfRange { label: String, displacement: i64 },
}

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error(transparent)]
    Emit(#[from] EmitError),
    #[error("IL opcode {0} has no lowering and strict-opcode mode is enabled")]
    UnsupportedOpcode(String),
    #[error("branch targets IL offset {0:#x}, which is not the start of any decoded instruction")]
    InvalidBranchTarget(u64),
}

#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("emitted code ({code_len} bytes) plus header ({header_len} bytes) exceeds the largest addressable single-bank cartridge (0x8000 bytes)")]
    RomTooLarge { code_len: usize, header_len: usize },
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error(transparent)]
    MethodBody(#[from] MethodBodyError),
    #[error(transparent)]
    Codegen(#[from] CodegenError),
    #[error(transparent)]
    Cartridge(#[from] CartridgeError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
