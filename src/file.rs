use std::fs::FileType;
use std::fs::Metadata;
use std::path::Path as StdPath;
use std::time::SystemTime;

#[cfg(feature = "json_schema")]
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

use crate::errors::Error;
use crate::mode::S_IFBLK;
use crate::mode::S_IFCHR;
use crate::mode::S_IFDIR;
use crate::mode::S_IFIFO;
use crate::mode::S_IFLNK;
use crate::mode::S_IFMT;
use crate::mode::S_IFREG;
use crate::mode::S_IFSOCK;
use crate::utils::format_system_time;

/// The kind of a filesystem entry.
#[cfg_attr(feature = "json_schema", derive(JsonSchema))]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Hash, Eq)]
pub enum FileKind {
    /// Block device.
    Block,
    /// Character device.
    Char,
    /// Directory.
    Dir,
    /// Named pipe.
    Fifo,
    /// Symbolic link.
    Link,
    /// Regular file.
    File,
    /// Unix domain socket.
    Socket,
    /// The kind could not be determined.
    #[default]
    Unknown,
}

impl FileKind {
    /// Maps the `S_IFMT` bits of `mode`.
    pub fn from_mode(mode: u32) -> Self {
        match mode & S_IFMT {
            S_IFBLK => FileKind::Block,
            S_IFCHR => FileKind::Char,
            S_IFDIR => FileKind::Dir,
            S_IFIFO => FileKind::Fifo,
            S_IFLNK => FileKind::Link,
            S_IFREG => FileKind::File,
            S_IFSOCK => FileKind::Socket,
            _ => FileKind::Unknown,
        }
    }

    /// The `S_IFMT` bits for this kind, zero for [`FileKind::Unknown`].
    pub fn mode_bits(&self) -> u32 {
        match self {
            FileKind::Block => S_IFBLK,
            FileKind::Char => S_IFCHR,
            FileKind::Dir => S_IFDIR,
            FileKind::Fifo => S_IFIFO,
            FileKind::Link => S_IFLNK,
            FileKind::File => S_IFREG,
            FileKind::Socket => S_IFSOCK,
            FileKind::Unknown => 0,
        }
    }

    /// Maps a `std` file type, including the unix-only special kinds.
    pub fn from_file_type(ft: FileType) -> Self {
        if ft.is_symlink() {
            return FileKind::Link;
        }
        if ft.is_dir() {
            return FileKind::Dir;
        }
        if ft.is_file() {
            return FileKind::File;
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;
            if ft.is_block_device() {
                return FileKind::Block;
            }
            if ft.is_char_device() {
                return FileKind::Char;
            }
            if ft.is_fifo() {
                return FileKind::Fifo;
            }
            if ft.is_socket() {
                return FileKind::Socket;
            }
        }
        FileKind::Unknown
    }
}

/// Metadata of a single path, as returned by a link-stat (symlinks are not
/// followed).
#[cfg_attr(feature = "json_schema", derive(JsonSchema))]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Hash, Eq)]
pub struct FileStat {
    /// The path that was stat'ed.
    pub path: String,
    /// Device containing the entry.
    pub device_id: u64,
    /// Entry kind derived from the mode bits.
    pub kind: FileKind,
    /// Full `st_mode`, type bits included.
    pub mode: u32,
    /// Permission bits only, `mode & 0o7777`.
    pub permissions: u32,
    /// Number of hard links.
    pub hard_links: u64,
    /// Owner user id.
    pub uid: u32,
    /// Owner group id.
    pub gid: u32,
    /// Owner user name, or the uid in decimal when it has no account entry.
    /// Empty where ownership is not recorded.
    pub user: String,
    /// Owner group name, or the gid in decimal when it has no account entry.
    pub group: String,
    /// Device id for special files.
    pub special_device_id: u64,
    /// Inode number.
    pub inode: u64,
    /// The size of the file in bytes.
    pub size: u64,
    /// Preferred I/O block size.
    pub block_size: u64,
    /// Number of 512-byte blocks allocated.
    pub blocks: u64,
    /// Last access time in RFC 3339 - Z format.
    pub access_time: Option<String>,
    /// Last modification time in RFC 3339 - Z format. For example
    /// "2018-01-26T18:30:09.453Z"
    pub modification_time: Option<String>,
    /// Last status change time in RFC 3339 - Z format.
    pub change_time: Option<String>,
    /// Creation time in RFC 3339 - Z format, where the platform records it.
    pub birth_time: Option<String>,
}

impl FileStat {
    /// Link-stat `path`.
    pub fn from_path<P: AsRef<StdPath>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let metadata = std::fs::symlink_metadata(path)
            .map_err(|e| Error::from_io(format!("stat '{}'", path.display()), e))?;
        Ok(Self::from_metadata(path, &metadata))
    }

    /// Build a `FileStat` from already fetched `metadata`.
    pub fn from_metadata(path: &StdPath, metadata: &Metadata) -> Self {
        let time = |t: std::io::Result<SystemTime>| t.ok().map(format_system_time);
        let mut stat = FileStat {
            path: path.to_string_lossy().into_owned(),
            size: metadata.len(),
            access_time: time(metadata.accessed()),
            modification_time: time(metadata.modified()),
            birth_time: time(metadata.created()),
            ..Default::default()
        };

        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            stat.device_id = metadata.dev();
            stat.mode = metadata.mode();
            stat.hard_links = metadata.nlink();
            stat.uid = metadata.uid();
            stat.gid = metadata.gid();
            stat.user = crate::ops::user_name(stat.uid);
            stat.group = crate::ops::group_name(stat.gid);
            stat.special_device_id = metadata.rdev();
            stat.inode = metadata.ino();
            stat.block_size = metadata.blksize();
            stat.blocks = metadata.blocks();
            let ctime_nsec = u32::try_from(metadata.ctime_nsec()).unwrap_or(0);
            stat.change_time = chrono::DateTime::from_timestamp(metadata.ctime(), ctime_nsec)
                .map(|dt| format_system_time(dt.into()));
        }
        #[cfg(not(unix))]
        {
            stat.mode = synthesized_mode(metadata);
            stat.hard_links = 1;
        }

        stat.kind = FileKind::from_mode(stat.mode);
        stat.permissions = stat.mode & 0o7777;
        stat
    }
}

/// Windows has no mode bits; derive them from the file type and the
/// read-only attribute.
#[cfg(not(unix))]
fn synthesized_mode(metadata: &Metadata) -> u32 {
    let kind = FileKind::from_file_type(metadata.file_type());
    let mut perms = 0o444;
    if !metadata.permissions().readonly() {
        perms |= 0o222;
    }
    if kind == FileKind::Dir {
        perms |= 0o111;
    }
    kind.mode_bits() | perms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_round_trip_through_mode_bits() {
        for kind in [
            FileKind::Block,
            FileKind::Char,
            FileKind::Dir,
            FileKind::Fifo,
            FileKind::Link,
            FileKind::File,
            FileKind::Socket,
        ] {
            assert_eq!(FileKind::from_mode(kind.mode_bits() | 0o644), kind);
        }
        assert_eq!(FileKind::from_mode(0o644), FileKind::Unknown);
    }

    #[test]
    fn stat_of_crate_manifest() {
        let stat = FileStat::from_path("Cargo.toml").unwrap();
        assert_eq!(stat.kind, FileKind::File);
        assert_eq!(stat.path, "Cargo.toml");
        assert!(stat.size > 0);
        assert_eq!(stat.permissions, stat.mode & 0o7777);
        assert!(stat.modification_time.unwrap().ends_with('Z'));
    }

    #[test]
    fn stat_of_directory() {
        let stat = FileStat::from_path("src").unwrap();
        assert_eq!(stat.kind, FileKind::Dir);
    }

    #[test]
    fn stat_of_missing_path() {
        let err = FileStat::from_path("no/such/file").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::NotFound);
    }
}
