//! canonical listing ("pseudo-file") of a directory's children
//!
//! ```text
//! <HEX> "<escaped-dir-name>"\n     zero or more, sorted
//! =\n
//! <HEX> "<escaped-file-name>"\n    zero or more, sorted
//! ```
//!
//! lines within a section are ordered by the raw bytes of the *escaped* name.
//! the digest of a directory is the SHA-256 of this byte sequence.

use std::fmt;

use crate::error::{Error, Result};
use crate::hash::{hash_bytes, Hash};

const SEPARATOR: &[u8] = b"=\n";
const HEX_LEN: usize = 64;

/// which section of the listing an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryKind {
    Directory,
    File,
}

/// one immediate child of a hashed directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// raw filename bytes, unescaped
    pub name: Vec<u8>,
    pub kind: EntryKind,
    pub hash: Hash,
}

impl DirEntry {
    pub fn new(name: impl Into<Vec<u8>>, kind: EntryKind, hash: Hash) -> Self {
        Self {
            name: name.into(),
            kind,
            hash,
        }
    }

    pub fn file(name: impl Into<Vec<u8>>, hash: Hash) -> Self {
        Self::new(name, EntryKind::File, hash)
    }

    pub fn directory(name: impl Into<Vec<u8>>, hash: Hash) -> Self {
        Self::new(name, EntryKind::Directory, hash)
    }

    /// the escaped name, which is both the sort key and what gets emitted
    pub fn escaped_name(&self) -> Vec<u8> {
        escape(&self.name)
    }
}

/// escape a filename: `\` becomes `\\`, then `"` becomes `\"`
///
/// every other byte passes through untouched, including newlines and
/// non-UTF-8 sequences.
pub fn escape(name: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(name.len());
    for &b in name {
        match b {
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'"' => out.extend_from_slice(b"\\\""),
            _ => out.push(b),
        }
    }
    out
}

/// inverse of [`escape`]
///
/// rejects a bare `"`, a trailing `\`, or a `\` followed by anything other
/// than `\` or `"`.
pub fn unescape(escaped: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(escaped.len());
    let mut iter = escaped.iter();
    while let Some(&b) = iter.next() {
        match b {
            b'\\' => match iter.next() {
                Some(&c) if c == b'\\' || c == b'"' => out.push(c),
                Some(&c) => {
                    return Err(Error::MalformedListing(format!(
                        "invalid escape sequence \\{}",
                        c.escape_ascii()
                    )))
                }
                None => return Err(Error::MalformedListing("dangling backslash".into())),
            },
            b'"' => return Err(Error::MalformedListing("unescaped quote in name".into())),
            _ => out.push(b),
        }
    }
    Ok(out)
}

/// the serialized form of a directory's children, ready to be hashed
#[derive(Clone, PartialEq, Eq)]
pub struct CanonicalListing {
    bytes: Vec<u8>,
    directories: usize,
    files: usize,
}

impl CanonicalListing {
    /// build the listing from entries in any order
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = DirEntry>,
    {
        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for entry in entries {
            let keyed = (entry.escaped_name(), entry.hash);
            match entry.kind {
                EntryKind::Directory => dirs.push(keyed),
                EntryKind::File => files.push(keyed),
            }
        }
        dirs.sort_by(|a, b| a.0.cmp(&b.0));
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let line_len = |(name, _): &(Vec<u8>, Hash)| HEX_LEN + name.len() + 4;
        let capacity = dirs.iter().map(line_len).sum::<usize>()
            + SEPARATOR.len()
            + files.iter().map(line_len).sum::<usize>();
        let mut bytes = Vec::with_capacity(capacity);

        for (name, hash) in &dirs {
            push_line(&mut bytes, hash, name);
        }
        bytes.extend_from_slice(SEPARATOR);
        for (name, hash) in &files {
            push_line(&mut bytes, hash, name);
        }

        Self {
            bytes,
            directories: dirs.len(),
            files: files.len(),
        }
    }

    /// parse a canonical listing back into its entries
    ///
    /// only byte-exact canonical listings are accepted: uppercase hex,
    /// exactly one separator, sections in sorted order, nothing trailing.
    pub fn parse(bytes: &[u8]) -> Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        let mut kind = EntryKind::Directory;
        let mut last_key: Option<Vec<u8>> = None;
        let mut pos = 0;

        while pos < bytes.len() {
            if kind == EntryKind::Directory && bytes[pos..].starts_with(SEPARATOR) {
                kind = EntryKind::File;
                last_key = None;
                pos += SEPARATOR.len();
                continue;
            }

            let (hash, escaped, next) = parse_line(bytes, pos)?;
            if let Some(prev) = &last_key {
                if prev.as_slice() >= escaped {
                    return Err(Error::MalformedListing(format!(
                        "entries out of order at byte {}",
                        pos
                    )));
                }
            }
            entries.push(DirEntry::new(unescape(escaped)?, kind, hash));
            last_key = Some(escaped.to_vec());
            pos = next;
        }

        if kind == EntryKind::Directory {
            return Err(Error::MalformedListing("missing '=' separator".into()));
        }
        Ok(entries)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn directory_count(&self) -> usize {
        self.directories
    }

    pub fn file_count(&self) -> usize {
        self.files
    }

    /// SHA-256 of the listing bytes, i.e. the directory's digest
    pub fn digest(&self) -> Hash {
        hash_bytes(&self.bytes)
    }
}

impl fmt::Display for CanonicalListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.bytes))
    }
}

impl fmt::Debug for CanonicalListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanonicalListing")
            .field("directories", &self.directories)
            .field("files", &self.files)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

fn push_line(out: &mut Vec<u8>, hash: &Hash, escaped: &[u8]) {
    out.extend_from_slice(hash.to_hex().as_bytes());
    out.extend_from_slice(b" \"");
    out.extend_from_slice(escaped);
    out.extend_from_slice(b"\"\n");
}

/// parse one `<HEX> "<escaped>"\n` line starting at `pos`
///
/// returns the hash, the escaped name and the offset just past the newline.
/// names may contain raw newlines, so the closing quote is found by scanning
/// escapes rather than splitting on '\n'.
fn parse_line(bytes: &[u8], pos: usize) -> Result<(Hash, &[u8], usize)> {
    let malformed = |what: &str| Error::MalformedListing(format!("{} at byte {}", what, pos));

    let hex = bytes.get(pos..pos + HEX_LEN).ok_or_else(|| malformed("truncated line"))?;
    if !hex.iter().all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(b)) {
        return Err(malformed("digest is not uppercase hex"));
    }
    let hex = std::str::from_utf8(hex).map_err(|_| malformed("digest is not uppercase hex"))?;
    let hash = Hash::from_hex(hex)?;

    let mut cur = pos + HEX_LEN;
    if bytes.get(cur..cur + 2) != Some(b" \"".as_slice()) {
        return Err(malformed("expected ' \"' after digest"));
    }
    cur += 2;

    let start = cur;
    loop {
        match bytes.get(cur) {
            Some(b'\\') => cur += 2,
            Some(b'"') => break,
            Some(_) => cur += 1,
            None => return Err(malformed("unterminated name")),
        }
    }
    let escaped = bytes.get(start..cur).ok_or_else(|| malformed("unterminated name"))?;

    if bytes.get(cur + 1) != Some(&b'\n') {
        return Err(malformed("expected newline after name"));
    }
    Ok((hash, escaped, cur + 2))
}
