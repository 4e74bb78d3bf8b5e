//! In-memory [`FsBackend`] for exercising walks without touching the disk.
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use crate::FileKind;
use crate::FileStat;
use crate::backend::FsBackend;
use crate::backend::RawDirEntry;

/// A scripted directory tree.
///
/// Directories list their entries in insertion order. Entries registered
/// with a known kind are also stat-able; [`FileKind::Unknown`] entries need
/// [`MemoryFs::stat_as`] to resolve.
#[derive(Debug, Default)]
pub struct MemoryFs {
    dirs: HashMap<String, Vec<RawDirEntry>>,
    kinds: HashMap<String, FileKind>,
    unreadable: HashMap<String, io::ErrorKind>,
    fail_after: HashMap<String, usize>,
    stat_calls: AtomicUsize,
    open_scans: Arc<AtomicUsize>,
}

impl MemoryFs {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds directory `path` holding `entries`.
    pub fn dir(mut self, path: &str, entries: &[(&str, FileKind)]) -> Self {
        self.kinds.insert(path.to_owned(), FileKind::Dir);
        let mut listing = Vec::with_capacity(entries.len());
        for (name, kind) in entries {
            if *kind != FileKind::Unknown {
                self.kinds.insert(format!("{path}/{name}"), *kind);
            }
            listing.push(RawDirEntry::new(*name, *kind));
        }
        self.dirs.insert(path.to_owned(), listing);
        self
    }

    /// Makes a link-stat of `path` report `kind`.
    pub fn stat_as(mut self, path: &str, kind: FileKind) -> Self {
        self.kinds.insert(path.to_owned(), kind);
        self
    }

    /// Makes scanning `path` fail with `kind`.
    pub fn unreadable(mut self, path: &str, kind: io::ErrorKind) -> Self {
        self.unreadable.insert(path.to_owned(), kind);
        self
    }

    /// Makes the scan of `path` fail after yielding `n` entries.
    pub fn fail_after(mut self, path: &str, n: usize) -> Self {
        self.fail_after.insert(path.to_owned(), n);
        self
    }

    /// Number of link-stats issued so far.
    pub fn stat_calls(&self) -> usize {
        self.stat_calls.load(Ordering::Relaxed)
    }

    /// Number of scans currently open.
    pub fn open_scans(&self) -> usize {
        self.open_scans.load(Ordering::Relaxed)
    }
}

/// Scan over a [`MemoryFs`] directory.
#[derive(Debug)]
pub struct MemoryReadDir {
    items: std::vec::IntoIter<io::Result<RawDirEntry>>,
    open_scans: Arc<AtomicUsize>,
}

impl Iterator for MemoryReadDir {
    type Item = io::Result<RawDirEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.items.next()
    }
}

impl Drop for MemoryReadDir {
    fn drop(&mut self) {
        self.open_scans.fetch_sub(1, Ordering::Relaxed);
    }
}

impl FsBackend for MemoryFs {
    type ReadDir = MemoryReadDir;

    fn scan_dir(&self, path: &str) -> io::Result<MemoryReadDir> {
        if let Some(kind) = self.unreadable.get(path) {
            return Err(io::Error::new(*kind, format!("cannot open {path}")));
        }
        let listing = self
            .dirs
            .get(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no directory {path}")))?;
        let mut items: Vec<io::Result<RawDirEntry>> = listing.iter().cloned().map(Ok).collect();
        if let Some(n) = self.fail_after.get(path) {
            items.truncate(*n);
            items.push(Err(io::Error::other(format!("read error in {path}"))));
        }
        self.open_scans.fetch_add(1, Ordering::Relaxed);
        Ok(MemoryReadDir {
            items: items.into_iter(),
            open_scans: self.open_scans.clone(),
        })
    }

    fn link_stat(&self, path: &str) -> io::Result<FileStat> {
        self.stat_calls.fetch_add(1, Ordering::Relaxed);
        let kind = self
            .kinds
            .get(path)
            .copied()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no entry {path}")))?;
        let mode = kind.mode_bits() | 0o644;
        Ok(FileStat {
            path: path.to_owned(),
            kind,
            mode,
            permissions: mode & 0o7777,
            ..Default::default()
        })
    }
}
