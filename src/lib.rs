//! dirhash - deterministic directory digests
//!
//! computes a SHA-256 digest of a directory tree such that identical names,
//! contents and hierarchy always give the same digest, and any difference in
//! file content, filename or structure changes it. file metadata
//! (permissions, timestamps, ownership) is not hashed.
//!
//! # Algorithm
//!
//! - a **file** digest is SHA-256 of its raw bytes (same as `sha256sum`)
//! - a **directory** digest is SHA-256 of its canonical listing, a
//!   "pseudo-file" with one line per child:
//!
//! ```text
//! 8C1E0D4467DC345BCBE4122CB5F3A872A596FF7B5BB360B1A545FEF5991296AC "bar"
//! 0CE63AFC1E92EE82744300A778E523B9F42A53FE99201BD39FB8E2DE82965297 "empty"
//! =
//! F5F12CF4210548CB4794FA08DD099186F5C4B3424BDC6535F1E63C2EBCD882BE "asd.txt"
//! ```
//!
//! directories come first, then a line holding only `=`, then files. each
//! line is the uppercase hex digest, a space and the escaped name in double
//! quotes, terminated by a single `\n`. names are escaped by replacing `\`
//! with `\\` and `"` with `\"`; lines in each section are sorted by the bytes
//! of the escaped name.
//!
//! # Example usage
//!
//! ```no_run
//! use dirhash::{hash_directory, DirHasher, SymlinkPolicy};
//! use std::path::Path;
//!
//! let digest = hash_directory(Path::new("/some/tree")).unwrap();
//! println!("{}", digest);
//!
//! // follow symlinks and dump every directory's listing
//! let hasher = DirHasher::new()
//!     .symlinks(SymlinkPolicy::Follow)
//!     .on_listing(|dir, listing| eprintln!("{}:\n{}", dir.display(), listing));
//! let digest = hasher.hash_directory(Path::new("/some/tree")).unwrap();
//! ```

mod config;
mod error;
mod hash;
mod listing;
mod tree;

pub mod fs;

pub use config::{Config, SymlinkPolicy};
pub use error::{Error, IoResultExt, Result};
pub use hash::{hash_bytes, FileHasher, Hash};
pub use listing::{escape, unescape, CanonicalListing, DirEntry, EntryKind};
pub use tree::{hash_directory, hash_file, DirHasher, ListingHook};
