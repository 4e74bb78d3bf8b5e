use std::io;

use crate::FileKind;
use crate::FileStat;

/// A single directory entry as produced by a scan, before its kind has been
/// resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDirEntry {
    /// File name within the scanned directory.
    pub name: String,
    /// Kind reported by the scan, possibly [`FileKind::Unknown`].
    pub kind: FileKind,
}

impl RawDirEntry {
    /// Creates an entry named `name` of kind `kind`.
    pub fn new(name: impl Into<String>, kind: FileKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// The I/O capabilities a walk needs. Every walk is handed one explicitly,
/// so tests and hosts can substitute their own.
pub trait FsBackend: Send + Sync {
    /// Open scan over one directory. Dropping it releases the handle.
    type ReadDir: Iterator<Item = io::Result<RawDirEntry>>;

    /// Start listing the entries of the directory at `path`.
    fn scan_dir(&self, path: &str) -> io::Result<Self::ReadDir>;

    /// Stat `path` without following a trailing symlink.
    fn link_stat(&self, path: &str) -> io::Result<FileStat>;
}

/// [`FsBackend`] over the host filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeFs;

/// Entries of a host directory.
#[derive(Debug)]
pub struct NativeReadDir {
    inner: std::fs::ReadDir,
}

impl Iterator for NativeReadDir {
    type Item = io::Result<RawDirEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = match self.inner.next()? {
            Ok(entry) => entry,
            Err(e) => return Some(Err(e)),
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        // A failing file_type() leaves resolution to a later link-stat.
        let kind = entry
            .file_type()
            .map(FileKind::from_file_type)
            .unwrap_or(FileKind::Unknown);
        Some(Ok(RawDirEntry { name, kind }))
    }
}

impl FsBackend for NativeFs {
    type ReadDir = NativeReadDir;

    fn scan_dir(&self, path: &str) -> io::Result<NativeReadDir> {
        Ok(NativeReadDir {
            inner: std::fs::read_dir(path)?,
        })
    }

    fn link_stat(&self, path: &str) -> io::Result<FileStat> {
        let metadata = std::fs::symlink_metadata(path)?;
        Ok(FileStat::from_metadata(std::path::Path::new(path), &metadata))
    }
}
