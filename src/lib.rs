//! Ahead-of-time compiler from CLI (ECMA-335) assemblies to bootable 8-bit
//! cartridge images.
//!
//! The pipeline mirrors the component layout of the design document:
//! [`pe`] + [`metadata`] open the container and expose its tables, [`il`]
//! decodes method bodies into typed opcodes, [`ir`] assembles those into a
//! module, [`types`] resolves managed types to target-memory layouts,
//! [`codegen`] lowers the IR to target-CPU machine code, and [`cartridge`]
//! assembles the final image.

pub mod cartridge;
pub mod codegen;
pub mod config;
pub mod error;
pub mod il;
pub mod ir;
pub mod metadata;
pub mod pe;
pub mod types;

mod util;

pub use config::CompileConfig;
pub use error::CompileError;

use tracing::instrument;

/// Runs the full pipeline for one input file and returns the assembled
/// cartridge image bytes. Does not touch the filesystem beyond what the
/// caller already did to produce `bytes`.
#[instrument(skip_all, fields(len = bytes.len()))]
pub fn compile(bytes: &[u8], config: &CompileConfig) -> Result<Vec<u8>, CompileError> {
    let container = metadata::Container::open(bytes)?;
    let module = ir::build_module(&container)?;
    let resolver = types::TypeResolver::new();
    let code = codegen::generate(&module, &resolver, config)?;
    let image = cartridge::assemble(&code, config)?;
    Ok(image)
}
