use std::path::PathBuf;

use crate::fs::FileType;

/// error type for dirhash operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("not a regular file: {0}")]
    NotAFile(PathBuf),

    #[error("refusing to hash symbolic link: {0}")]
    Symlink(PathBuf),

    #[error("symbolic link cycle at {0}")]
    SymlinkCycle(PathBuf),

    #[error("unsupported file type {file_type:?} at {path}")]
    UnsupportedFileType { path: PathBuf, file_type: FileType },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid hash hex: {0}")]
    InvalidHashHex(String),

    #[error("malformed canonical listing: {0}")]
    MalformedListing(String),

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("invalid symlink policy: {0} (expected refuse, file or follow)")]
    InvalidSymlinkPolicy(String),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("config serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// helper to wrap io errors with path context
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}
