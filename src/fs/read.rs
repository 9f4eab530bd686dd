use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use crate::error::{IoResultExt, Result};

/// file type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Regular,
    Directory,
    Symlink,
    BlockDevice,
    CharDevice,
    Fifo,
    Socket,
    Unknown,
}

impl FileType {
    /// classify a std file type
    pub fn from_std(ft: fs::FileType) -> Self {
        if ft.is_file() {
            return FileType::Regular;
        } else if ft.is_dir() {
            return FileType::Directory;
        } else if ft.is_symlink() {
            return FileType::Symlink;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;
            if ft.is_block_device() {
                return FileType::BlockDevice;
            } else if ft.is_char_device() {
                return FileType::CharDevice;
            } else if ft.is_fifo() {
                return FileType::Fifo;
            } else if ft.is_socket() {
                return FileType::Socket;
            }
        }

        FileType::Unknown
    }

    /// read the type of whatever the path resolves to (follows symlinks)
    pub fn of_target(path: &Path) -> Result<Self> {
        let meta = fs::metadata(path).with_path(path)?;
        Ok(Self::from_std(meta.file_type()))
    }
}

/// raw bytes of a filename as stored by the filesystem
#[cfg(unix)]
pub fn name_bytes(name: &OsStr) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    name.as_bytes().to_vec()
}

/// raw bytes of a filename as stored by the filesystem
///
/// non-unix names are UTF-16 underneath, so they go through UTF-8.
#[cfg(not(unix))]
pub fn name_bytes(name: &OsStr) -> Vec<u8> {
    name.to_string_lossy().into_owned().into_bytes()
}
