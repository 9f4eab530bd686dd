//! in-memory [`Source`] for tests, with a controllable enumeration order

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::fs::{FileType, Source, SourceEntry};

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Dir,
}

/// order in which `read_dir` reports children
#[derive(Debug, Clone, Copy)]
pub enum Order {
    Sorted,
    Reversed,
    /// sorted, then rotated left by n
    Rotated(usize),
}

#[derive(Debug, Clone)]
pub struct MemoryFs {
    nodes: BTreeMap<PathBuf, Node>,
    order: Order,
    unreadable: Vec<PathBuf>,
}

impl MemoryFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(root.into(), Node::Dir);
        Self {
            nodes,
            order: Order::Sorted,
            unreadable: vec![],
        }
    }

    pub fn dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.nodes.insert(path.into(), Node::Dir);
        self
    }

    pub fn file(mut self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        self.nodes.insert(path.into(), Node::File(content.into()));
        self
    }

    /// make reads of `path` fail with permission denied
    pub fn unreadable(mut self, path: impl Into<PathBuf>) -> Self {
        self.unreadable.push(path.into());
        self
    }

    pub fn with_order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    fn node(&self, path: &Path) -> Result<&Node> {
        self.nodes.get(path).ok_or_else(|| Error::Io {
            path: path.to_path_buf(),
            source: io::Error::from(io::ErrorKind::NotFound),
        })
    }

    fn check_readable(&self, path: &Path) -> Result<()> {
        if self.unreadable.iter().any(|p| p == path) {
            return Err(Error::Io {
                path: path.to_path_buf(),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            });
        }
        Ok(())
    }
}

fn file_type(node: &Node) -> FileType {
    match node {
        Node::File(_) => FileType::Regular,
        Node::Dir => FileType::Directory,
    }
}

impl Source for MemoryFs {
    type Reader = Cursor<Vec<u8>>;

    fn target_type(&self, path: &Path) -> Result<FileType> {
        self.node(path).map(file_type)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        self.node(path)?;
        Ok(path.to_path_buf())
    }

    fn read_dir(&self, dir: &Path) -> Result<Vec<SourceEntry>> {
        self.check_readable(dir)?;
        let mut entries: Vec<SourceEntry> = self
            .nodes
            .iter()
            .filter(|(path, _)| path.parent() == Some(dir))
            .filter_map(|(path, node)| {
                let name: OsString = path.file_name()?.to_os_string();
                Some(SourceEntry::new(name, file_type(node)))
            })
            .collect();

        match self.order {
            Order::Sorted => {}
            Order::Reversed => entries.reverse(),
            Order::Rotated(n) if !entries.is_empty() => {
                let n = n % entries.len();
                entries.rotate_left(n);
            }
            Order::Rotated(_) => {}
        }
        Ok(entries)
    }

    fn open(&self, path: &Path) -> Result<Self::Reader> {
        self.check_readable(path)?;
        match self.node(path)? {
            Node::File(content) => Ok(Cursor::new(content.clone())),
            Node::Dir => Err(Error::Io {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::Other, "is a directory"),
            }),
        }
    }
}
