use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, IoResultExt, Result};
use crate::fs::FileType;

/// an immediate child as reported by a [`Source`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub name: OsString,
    /// type of the entry itself, symlinks are not resolved
    pub file_type: FileType,
}

impl SourceEntry {
    pub fn new(name: impl Into<OsString>, file_type: FileType) -> Self {
        Self {
            name: name.into(),
            file_type,
        }
    }
}

/// read-only view of a filesystem tree
///
/// the hasher only talks to the filesystem through this trait, so the
/// enumeration order a backend reports has no bearing on the result.
pub trait Source: Sync {
    type Reader: Read;

    /// type of whatever `path` resolves to
    fn target_type(&self, path: &Path) -> Result<FileType>;

    /// fully resolved path, used to detect symlink cycles
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;

    /// immediate children of `dir` in backend order
    fn read_dir(&self, dir: &Path) -> Result<Vec<SourceEntry>>;

    /// open a regular file for reading
    fn open(&self, path: &Path) -> Result<Self::Reader>;
}

/// the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl Source for LocalFs {
    type Reader = File;

    fn target_type(&self, path: &Path) -> Result<FileType> {
        FileType::of_target(path)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).with_path(path)
    }

    fn read_dir(&self, dir: &Path) -> Result<Vec<SourceEntry>> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(false) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(dir).to_path_buf();
                Error::Io {
                    path,
                    source: e.into(),
                }
            })?;
            entries.push(SourceEntry::new(
                entry.file_name(),
                FileType::from_std(entry.file_type()),
            ));
        }
        Ok(entries)
    }

    fn open(&self, path: &Path) -> Result<File> {
        File::open(path).with_path(path)
    }
}
