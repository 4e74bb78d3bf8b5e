//! Thin wrappers over single filesystem syscalls.
//!
//! Batch functions take a slice of paths and stop at the first failure,
//! except [`make_dirs`] which ignores directories that already exist.
use std::fs;
use std::io;
use std::path::Path as StdPath;
use std::time::SystemTime;

use filetime::FileTime;
#[cfg(feature = "json_schema")]
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::ErrorKind;
use crate::FileStat;
use crate::WalkRequest;
use crate::backend::NativeFs;
use crate::path::tidy;
use crate::walker::child_path;
use crate::walker::walk;

fn failed(what: String) -> impl FnOnce(io::Error) -> Error {
    move |e| Error::from_io(what, e)
}

/// Create every directory in `paths` with permission bits `mode`.
///
/// Directories that already exist are left alone.
pub fn make_dirs<S: AsRef<str>>(paths: &[S], mode: u32) -> Result<(), Error> {
    for path in paths.iter().map(AsRef::as_ref) {
        let mut builder = fs::DirBuilder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;
        match builder.create(path) {
            Ok(()) => log::debug!("created directory {path}"),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(Error::from_io(format!("make directory '{path}'"), e)),
        }
    }
    Ok(())
}

/// Remove each (empty) directory in `paths`.
pub fn remove_dirs<S: AsRef<str>>(paths: &[S]) -> Result<(), Error> {
    for path in paths.iter().map(AsRef::as_ref) {
        fs::remove_dir(path).map_err(failed(format!("remove '{path}'")))?;
    }
    Ok(())
}

/// Remove each file or symlink in `paths`.
pub fn unlink<S: AsRef<str>>(paths: &[S]) -> Result<(), Error> {
    for path in paths.iter().map(AsRef::as_ref) {
        fs::remove_file(path).map_err(failed(format!("remove '{path}'")))?;
    }
    Ok(())
}

/// Create each file in `paths` if missing, without truncating existing ones.
pub fn create_files<S: AsRef<str>>(paths: &[S], mode: u32) -> Result<(), Error> {
    for path in paths.iter().map(AsRef::as_ref) {
        let mut options = fs::OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;
        options
            .open(path)
            .map_err(failed(format!("open '{path}'")))?;
    }
    Ok(())
}

/// Rename `from` to `to`, copying then deleting when they sit on different
/// devices.
pub fn move_path(from: &str, to: &str) -> Result<(), Error> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            log::debug!("{from} and {to} are on different devices, copying");
            copy_across(from, to)
        }
        Err(e) => Err(Error::from_io(format!("move '{from}' to '{to}'"), e)),
    }
}

fn copy_across(from: &str, to: &str) -> Result<(), Error> {
    let what = || format!("move '{from}' to '{to}'");
    let metadata = fs::symlink_metadata(from).map_err(failed(what()))?;
    if !metadata.is_dir() {
        copy_entry(from, to, &metadata)?;
        return fs::remove_file(from).map_err(failed(what()));
    }

    fs::create_dir(to).map_err(failed(what()))?;
    let root = tidy(from);
    let request = WalkRequest::new(&[root.as_str()]).include_hidden(true);
    let entries = walk(&NativeFs, &request, |p: &str| p.to_owned())?.items;
    let to = tidy(to);
    for entry in entries {
        let relative = if root == "." {
            entry.as_str()
        } else {
            entry[root.len()..].trim_start_matches('/')
        };
        let target = child_path(&to, relative);
        let metadata = fs::symlink_metadata(&entry).map_err(failed(what()))?;
        if metadata.is_dir() {
            fs::create_dir(&target).map_err(failed(what()))?;
        } else {
            copy_entry(&entry, &target, &metadata)?;
        }
    }
    fs::remove_dir_all(from).map_err(failed(what()))
}

fn copy_entry(from: &str, to: &str, metadata: &fs::Metadata) -> Result<(), Error> {
    if metadata.file_type().is_symlink() {
        let target = read_link(from)?;
        link_symbolic(&target, to)
    } else {
        fs::copy(from, to)
            .map(|_| ())
            .map_err(failed(format!("copy '{from}' to '{to}'")))
    }
}

/// Copy the file `from` to `to`, permission bits included. Fails with
/// [`Error::AlreadyExists`] when `to` exists and `overwrite` is false.
pub fn copy_file(from: &str, to: &str, overwrite: bool) -> Result<(), Error> {
    let what = || format!("copy '{from}' to '{to}'");
    if overwrite {
        return fs::copy(from, to).map(|_| ()).map_err(failed(what()));
    }
    let mut source = fs::File::open(from).map_err(failed(what()))?;
    let permissions = source.metadata().map_err(failed(what()))?.permissions();
    // create_new is O_EXCL: an existing target, even a dangling link, fails.
    let mut target = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(to)
        .map_err(failed(what()))?;
    io::copy(&mut source, &mut target).map_err(failed(what()))?;
    target.set_permissions(permissions).map_err(failed(what()))
}

/// Create a hard link `to` pointing at `from`.
pub fn link_hard(from: &str, to: &str) -> Result<(), Error> {
    fs::hard_link(from, to).map_err(failed(format!("link '{from}' to '{to}'")))
}

/// Create a symbolic link `link` pointing at `target`.
pub fn link_symbolic(target: &str, link: &str) -> Result<(), Error> {
    let what = format!("link '{target}' to '{link}'");
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link).map_err(failed(what))
    }
    #[cfg(windows)]
    {
        let target_is_dir = StdPath::new(link)
            .parent()
            .map(|dir| dir.join(target))
            .map(|p| p.is_dir())
            .unwrap_or(false);
        if target_is_dir {
            std::os::windows::fs::symlink_dir(target, link).map_err(failed(what))
        } else {
            std::os::windows::fs::symlink_file(target, link).map_err(failed(what))
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        Err(Error::InvalidArgument(format!(
            "symbolic links are not supported: {what}"
        )))
    }
}

/// The target a symlink points at, as stored in the link.
pub fn read_link(path: &str) -> Result<String, Error> {
    let target = fs::read_link(path).map_err(failed(format!("read link '{path}'")))?;
    Ok(target.to_string_lossy().into_owned())
}

/// Set the permission bits of `path` to `mode`.
///
/// Outside unix only the owner write bit is honoured, as the read-only
/// attribute.
pub fn chmod(path: &str, mode: u32) -> Result<(), Error> {
    let what = || format!("chmod '{path}'");
    #[cfg(unix)]
    let permissions = {
        use std::os::unix::fs::PermissionsExt;
        fs::Permissions::from_mode(mode & 0o7777)
    };
    #[cfg(not(unix))]
    let permissions = {
        let mut permissions = fs::metadata(path).map_err(failed(what()))?.permissions();
        permissions.set_readonly(mode & 0o200 == 0);
        permissions
    };
    fs::set_permissions(path, permissions).map_err(failed(what()))
}

/// Change the owner of `path`.
pub fn chown(path: &str, uid: u32, gid: u32) -> Result<(), Error> {
    #[cfg(unix)]
    {
        std::os::unix::fs::chown(path, Some(uid), Some(gid))
            .map_err(failed(format!("chown '{path}'")))
    }
    #[cfg(not(unix))]
    {
        let _ = (uid, gid);
        Err(Error::InvalidArgument(format!(
            "chown '{path}': file ownership is not supported on this platform"
        )))
    }
}

/// Set the access and modification times of `path`, creating it as an
/// empty file first if it does not exist.
pub fn touch(path: &str, atime: SystemTime, mtime: SystemTime) -> Result<(), Error> {
    if fs::symlink_metadata(path).is_err() {
        create_files(&[path], 0o666)?;
    }
    filetime::set_file_times(
        path,
        FileTime::from_system_time(atime),
        FileTime::from_system_time(mtime),
    )
    .map_err(failed(format!("touch '{path}'")))
}

/// Checks for [`access`], combined with `|`.
#[cfg_attr(feature = "json_schema", derive(JsonSchema))]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct AccessMode(u8);

impl AccessMode {
    /// The path exists.
    pub const EXISTS: AccessMode = AccessMode(0);
    /// The path can be executed or, for directories, searched.
    pub const EXECUTE: AccessMode = AccessMode(1);
    /// The path can be written.
    pub const WRITE: AccessMode = AccessMode(2);
    /// The path can be read.
    pub const READ: AccessMode = AccessMode(4);

    fn has(&self, other: AccessMode) -> bool {
        self.0 & other.0 != 0
    }
}

impl std::ops::BitOr for AccessMode {
    type Output = AccessMode;

    fn bitor(self, rhs: AccessMode) -> AccessMode {
        AccessMode(self.0 | rhs.0)
    }
}

/// Whether the current process may access `path` as `mode` asks, as
/// answered by `access(2)` for the real user and group ids.
#[cfg(unix)]
pub fn access(path: &str, mode: AccessMode) -> bool {
    use nix::unistd::AccessFlags;

    let mut flags = AccessFlags::F_OK;
    if mode.has(AccessMode::READ) {
        flags |= AccessFlags::R_OK;
    }
    if mode.has(AccessMode::WRITE) {
        flags |= AccessFlags::W_OK;
    }
    if mode.has(AccessMode::EXECUTE) {
        flags |= AccessFlags::X_OK;
    }
    nix::unistd::access(path, flags).is_ok()
}

/// Whether the current process may access `path` as `mode` asks.
///
/// Without `access(2)` this looks at the metadata only: anything existing is
/// readable, the read-only attribute denies writes, and directories and
/// common executable extensions count as executable.
#[cfg(not(unix))]
pub fn access(path: &str, mode: AccessMode) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    if mode.has(AccessMode::WRITE) && metadata.permissions().readonly() {
        return false;
    }
    if mode.has(AccessMode::EXECUTE) && !is_executable(StdPath::new(path), &metadata) {
        return false;
    }
    true
}

#[cfg(not(unix))]
fn is_executable(path: &StdPath, metadata: &fs::Metadata) -> bool {
    metadata.is_dir()
        || path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| ["exe", "bat", "cmd", "com"].contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
}

/// A user or group from the system account database.
#[cfg_attr(feature = "json_schema", derive(JsonSchema))]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Account {
    /// Numeric user or group id.
    pub id: u32,
    /// Account name.
    pub name: String,
}

// getpwent/getgrent walk process-global cursors.
#[cfg(unix)]
static ACCOUNT_DB: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// The uid of user `name`, if there is one.
pub fn user_id(name: &str) -> Option<u32> {
    #[cfg(unix)]
    {
        uzers::get_user_by_name(name).map(|u| u.uid())
    }
    #[cfg(not(unix))]
    {
        let _ = name;
        None
    }
}

/// The gid of group `name`, if there is one.
pub fn group_id(name: &str) -> Option<u32> {
    #[cfg(unix)]
    {
        uzers::get_group_by_name(name).map(|g| g.gid())
    }
    #[cfg(not(unix))]
    {
        let _ = name;
        None
    }
}

/// Name of user `uid`, or the number itself when it has no entry.
pub fn user_name(uid: u32) -> String {
    #[cfg(unix)]
    if let Some(user) = uzers::get_user_by_uid(uid) {
        return user.name().to_string_lossy().into_owned();
    }
    uid.to_string()
}

/// Name of group `gid`, or the number itself when it has no entry.
pub fn group_name(gid: u32) -> String {
    #[cfg(unix)]
    if let Some(group) = uzers::get_group_by_gid(gid) {
        return group.name().to_string_lossy().into_owned();
    }
    gid.to_string()
}

/// Every user in the account database, in database order. Empty outside
/// unix.
#[allow(unsafe_code)]
pub fn users() -> Vec<Account> {
    #[cfg(unix)]
    {
        let _guard = ACCOUNT_DB
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        // SAFETY: the getpwent cursor is only touched while ACCOUNT_DB is held.
        unsafe { uzers::all_users() }
            .map(|u| Account {
                id: u.uid(),
                name: u.name().to_string_lossy().into_owned(),
            })
            .collect()
    }
    #[cfg(not(unix))]
    {
        Vec::new()
    }
}

/// Every group in the account database, in database order. Empty outside
/// unix.
#[allow(unsafe_code)]
pub fn groups() -> Vec<Account> {
    #[cfg(unix)]
    {
        let _guard = ACCOUNT_DB
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        // SAFETY: the getgrent cursor is only touched while ACCOUNT_DB is held.
        unsafe { uzers::all_groups() }
            .map(|g| Account {
                id: g.gid(),
                name: g.name().to_string_lossy().into_owned(),
            })
            .collect()
    }
    #[cfg(not(unix))]
    {
        Vec::new()
    }
}

/// Link-stat every path in `paths`.
///
/// Missing paths yield `None`. Any other failure is returned when `fail` is
/// set, otherwise it is logged and the path yields `None`.
pub fn stat<S: AsRef<str>>(paths: &[S], fail: bool) -> Result<Vec<Option<FileStat>>, Error> {
    let mut out = Vec::with_capacity(paths.len());
    for path in paths.iter().map(AsRef::as_ref) {
        match FileStat::from_path(path) {
            Ok(stat) => out.push(Some(stat)),
            Err(e) if e.kind() == ErrorKind::NotFound || is_not_a_directory(path) => {
                out.push(None)
            }
            Err(e) if fail => return Err(e),
            Err(e) => {
                log::warn!("{e}");
                out.push(None);
            }
        }
    }
    Ok(out)
}

/// `a/file/b` fails with ENOTDIR, which counts as missing.
fn is_not_a_directory(path: &str) -> bool {
    StdPath::new(path)
        .ancestors()
        .skip(1)
        .filter(|p| !p.as_os_str().is_empty())
        .any(|p| p.is_file())
}
