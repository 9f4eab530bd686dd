pub mod read;
pub mod source;

#[cfg(test)]
pub(crate) mod memory;

pub use read::{name_bytes, FileType};
pub use source::{LocalFs, Source, SourceEntry};
