//! recursive directory hashing
//!
//! a directory's digest is the SHA-256 of its [`CanonicalListing`], which in
//! turn embeds the digests of its children. children are always fully hashed
//! before their parent's listing is built, so the traversal is post-order.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{Config, SymlinkPolicy};
use crate::error::{Error, IoResultExt, Result};
use crate::fs::{name_bytes, FileType, LocalFs, Source, SourceEntry};
use crate::hash::{FileHasher, Hash};
use crate::listing::{escape, CanonicalListing, DirEntry};

/// callback receiving every directory's canonical listing once it is built
pub type ListingHook = Box<dyn Fn(&Path, &CanonicalListing) + Send + Sync>;

/// hash the content of a single regular file
pub fn hash_file(path: &Path) -> Result<Hash> {
    DirHasher::new().hash_file(path)
}

/// hash a directory tree with the default configuration
pub fn hash_directory(path: &Path) -> Result<Hash> {
    DirHasher::new().hash_directory(path)
}

/// hashes files and directory trees read through a [`Source`]
pub struct DirHasher<S: Source = LocalFs> {
    source: S,
    config: Config,
    on_listing: Option<ListingHook>,
}

impl DirHasher<LocalFs> {
    /// hasher over the local filesystem
    pub fn new() -> Self {
        Self::with_source(LocalFs)
    }
}

impl Default for DirHasher<LocalFs> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Source> fmt::Debug for DirHasher<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirHasher")
            .field("config", &self.config)
            .field("on_listing", &self.on_listing.is_some())
            .finish()
    }
}

impl<S: Source> DirHasher<S> {
    pub fn with_source(source: S) -> Self {
        Self {
            source,
            config: Config::default(),
            on_listing: None,
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn symlinks(mut self, policy: SymlinkPolicy) -> Self {
        self.config.symlinks = policy;
        self
    }

    /// hash siblings concurrently; ignored without the `parallel` feature
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// install a hook that sees each directory's listing (for tracing)
    pub fn on_listing<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Path, &CanonicalListing) + Send + Sync + 'static,
    {
        self.on_listing = Some(Box::new(hook));
        self
    }

    /// digest of a regular file's bytes (symlinks to files are followed)
    pub fn hash_file(&self, path: &Path) -> Result<Hash> {
        match self.source.target_type(path)? {
            FileType::Regular => self.read_file(path),
            _ => Err(Error::NotAFile(path.to_path_buf())),
        }
    }

    /// digest of a directory's full recursive content
    pub fn hash_directory(&self, path: &Path) -> Result<Hash> {
        Ok(self.listing(path)?.digest())
    }

    /// canonical listing of `path` itself, with all children hashed
    pub fn listing(&self, path: &Path) -> Result<CanonicalListing> {
        let ancestors = match self.config.symlinks {
            SymlinkPolicy::Follow => vec![self.source.canonicalize(path)?],
            _ => vec![],
        };
        self.build_listing(path, ancestors, 0)
    }

    fn ensure_directory(&self, path: &Path) -> Result<()> {
        match self.source.target_type(path)? {
            FileType::Directory => Ok(()),
            _ => Err(Error::NotADirectory(path.to_path_buf())),
        }
    }

    fn read_file(&self, path: &Path) -> Result<Hash> {
        let mut reader = self.source.open(path)?;
        let mut hasher = FileHasher::new();
        hasher.update_reader(&mut reader).with_path(path)?;
        Ok(hasher.finalize())
    }

    /// children of `dir` in canonical order, so sequential runs fail on the
    /// same entry every time
    fn read_children(&self, dir: &Path) -> Result<Vec<SourceEntry>> {
        let mut children = self.source.read_dir(dir)?;
        children.sort_by_cached_key(|child| escape(&name_bytes(&child.name)));
        Ok(children)
    }

    fn finish(&self, dir: &Path, entries: Vec<DirEntry>) -> CanonicalListing {
        let listing = CanonicalListing::from_entries(entries);
        if let Some(hook) = &self.on_listing {
            hook(dir, &listing);
        }
        listing
    }

    /// `ancestors` holds canonical paths from the root down to `dir` and is
    /// only populated when following symlinks
    #[cfg_attr(not(feature = "parallel"), allow(unused_variables))]
    fn build_listing(
        &self,
        dir: &Path,
        ancestors: Vec<PathBuf>,
        depth: usize,
    ) -> Result<CanonicalListing> {
        #[cfg(feature = "parallel")]
        if self.config.parallel && depth < PARALLEL_DEPTH {
            return self.build_listing_parallel(dir, &ancestors, depth);
        }

        self.walk(dir.to_path_buf(), ancestors)
    }

    #[cfg(feature = "parallel")]
    fn build_listing_parallel(
        &self,
        dir: &Path,
        ancestors: &[PathBuf],
        depth: usize,
    ) -> Result<CanonicalListing> {
        use rayon::prelude::*;

        self.ensure_directory(dir)?;
        let children = self.read_children(dir)?;

        let entries = children
            .par_iter()
            .map(|child| match self.step(dir, child, ancestors)? {
                Step::Entry(entry) => Ok(entry),
                Step::Descend {
                    name,
                    path,
                    ancestors,
                } => {
                    let listing = self.build_listing(&path, ancestors, depth + 1)?;
                    Ok(DirEntry::directory(name, listing.digest()))
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(self.finish(dir, entries))
    }

    /// post-order traversal with an explicit stack, so nesting depth is
    /// bounded by the heap rather than the thread's stack
    fn walk(&self, root: PathBuf, ancestors: Vec<PathBuf>) -> Result<CanonicalListing> {
        let mut stack = vec![self.open_frame(Vec::new(), root, ancestors)?];

        while let Some(mut frame) = stack.pop() {
            if let Some(child) = frame.children.next() {
                match self.step(&frame.dir, &child, &frame.ancestors)? {
                    Step::Entry(entry) => {
                        frame.entries.push(entry);
                        stack.push(frame);
                    }
                    Step::Descend {
                        name,
                        path,
                        ancestors,
                    } => {
                        let next = self.open_frame(name, path, ancestors)?;
                        stack.push(frame);
                        stack.push(next);
                    }
                }
                continue;
            }

            let listing = self.finish(&frame.dir, frame.entries);
            match stack.last_mut() {
                Some(parent) => parent
                    .entries
                    .push(DirEntry::directory(frame.name, listing.digest())),
                None => return Ok(listing),
            }
        }

        unreachable!("the root frame always returns its listing")
    }

    fn open_frame(&self, name: Vec<u8>, dir: PathBuf, ancestors: Vec<PathBuf>) -> Result<Frame> {
        self.ensure_directory(&dir)?;
        let children = self.read_children(&dir)?;
        Ok(Frame {
            name,
            entries: Vec::with_capacity(children.len()),
            children: children.into_iter(),
            dir,
            ancestors,
        })
    }

    /// hash a child that is a file, or say which directory to descend into
    fn step(&self, dir: &Path, child: &SourceEntry, ancestors: &[PathBuf]) -> Result<Step> {
        let path = dir.join(&child.name);
        let name = name_bytes(&child.name);

        match child.file_type {
            FileType::Regular => Ok(Step::Entry(DirEntry::file(name, self.read_file(&path)?))),

            FileType::Directory => {
                let ancestors = match ancestors.last() {
                    Some(parent) => extend(ancestors, parent.join(&child.name)),
                    None => vec![],
                };
                Ok(Step::Descend {
                    name,
                    path,
                    ancestors,
                })
            }

            FileType::Symlink => self.step_symlink(path, name, ancestors),

            file_type => Err(Error::UnsupportedFileType { path, file_type }),
        }
    }

    fn step_symlink(&self, path: PathBuf, name: Vec<u8>, ancestors: &[PathBuf]) -> Result<Step> {
        match self.config.symlinks {
            SymlinkPolicy::Refuse => Err(Error::Symlink(path)),

            SymlinkPolicy::File => match self.source.target_type(&path)? {
                FileType::Regular => Ok(Step::Entry(DirEntry::file(name, self.read_file(&path)?))),
                _ => Err(Error::NotAFile(path)),
            },

            SymlinkPolicy::Follow => match self.source.target_type(&path)? {
                FileType::Regular => Ok(Step::Entry(DirEntry::file(name, self.read_file(&path)?))),
                FileType::Directory => {
                    let target = self.source.canonicalize(&path)?;
                    if ancestors.contains(&target) {
                        return Err(Error::SymlinkCycle(path));
                    }
                    Ok(Step::Descend {
                        name,
                        path,
                        ancestors: extend(ancestors, target),
                    })
                }
                file_type => Err(Error::UnsupportedFileType { path, file_type }),
            },
        }
    }
}

/// levels below the root that fan out over the thread pool; deeper
/// subtrees are walked iteratively by whichever worker picked them up
#[cfg(feature = "parallel")]
const PARALLEL_DEPTH: usize = 4;

enum Step {
    Entry(DirEntry),
    Descend {
        name: Vec<u8>,
        path: PathBuf,
        ancestors: Vec<PathBuf>,
    },
}

/// a directory in the middle of being hashed
struct Frame {
    name: Vec<u8>,
    dir: PathBuf,
    ancestors: Vec<PathBuf>,
    children: std::vec::IntoIter<SourceEntry>,
    entries: Vec<DirEntry>,
}

fn extend(ancestors: &[PathBuf], next: PathBuf) -> Vec<PathBuf> {
    let mut chain = Vec::with_capacity(ancestors.len() + 1);
    chain.extend_from_slice(ancestors);
    chain.push(next);
    chain
}
