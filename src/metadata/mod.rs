//! ECMA-335 metadata: tokens, the `#~` table stream, the `#Strings`/`#Blob`
//! heaps, and the [`Container`] that ties them to a parsed PE file.

pub mod assembly;
pub mod heaps;
pub mod tables;
pub mod token;

pub use assembly::Container;
