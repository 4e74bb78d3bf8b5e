//! Path string utilities that do not touch the filesystem, except
//! [`realize`].
use std::path::Path as StdPath;

use crate::errors::Error;

/// Upper bound on the length of a joined path.
pub const PATH_MAX: usize = 4096;

/// Canonicalize the spelling of `path` without touching the filesystem.
///
/// Backslashes become forward slashes and repeated slashes collapse, except
/// for a leading `//` which marks a UNC root. Drive letters are upper-cased,
/// a bare drive gains its root slash and a single trailing slash is dropped
/// from everything but a root.
///
/// ```rust
/// # use fsops::tidy;
/// assert_eq!(tidy("a//b\\c/"), "a/b/c");
/// assert_eq!(tidy("c:"), "C:/");
/// assert_eq!(tidy("//unc/share/"), "//unc/share");
/// ```
pub fn tidy(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for (i, c) in path.chars().enumerate() {
        let c = if c == '\\' { '/' } else { c };
        if c == '/' && out.ends_with('/') && i != 1 {
            continue;
        }
        out.push(c);
    }

    if has_drive_prefix(&out) {
        // Only ASCII letters pass the prefix check, so slicing at 1 is safe.
        out[..1].make_ascii_uppercase();
        if out.len() == 2 {
            out.push('/');
        } else if out.len() > 3 && out.ends_with('/') {
            out.pop();
        }
    } else if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

/// [`tidy`] applied to every element, preserving order.
pub fn tidy_paths<S: AsRef<str>>(paths: &[S]) -> Vec<String> {
    paths.iter().map(|p| tidy(p.as_ref())).collect()
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Join `parts` with `/` and append `.ext` when `ext` is non-empty.
///
/// Empty parts are skipped. Fails with [`Error::InvalidArgument`] if the
/// joined path would not fit in [`PATH_MAX`] bytes.
pub fn path_join<S: AsRef<str>>(parts: &[S], ext: &str) -> Result<String, Error> {
    let mut joined = String::new();
    for part in parts.iter().map(AsRef::as_ref).filter(|p| !p.is_empty()) {
        if !joined.is_empty() && !joined.ends_with('/') {
            joined.push('/');
        }
        joined.push_str(part);
    }
    if !ext.is_empty() {
        joined.push('.');
        joined.push_str(ext);
    }
    if joined.len() >= PATH_MAX {
        return Err(Error::InvalidArgument(format!(
            "Total path length must be less than PATH_MAX: {PATH_MAX}"
        )));
    }
    Ok(tidy(&joined))
}

/// Replace a leading `~` with the current user's home directory.
///
/// Only `~` on its own or followed by a separator is expanded; `~user` forms
/// and paths without a tilde are returned tidied but otherwise unchanged.
/// The home directory comes from `HOME`, falling back to `USERPROFILE`.
pub fn expand(path: &str) -> String {
    let Some(rest) = path.strip_prefix('~') else {
        return tidy(path);
    };
    if !(rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\')) {
        return tidy(path);
    }
    match home_dir() {
        Some(home) => tidy(&format!("{home}{rest}")),
        None => tidy(path),
    }
}

fn home_dir() -> Option<String> {
    ["HOME", "USERPROFILE"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.is_empty())
}

/// Resolve `path` to an absolute path with all symlinks resolved.
pub fn realize<P: AsRef<StdPath>>(path: P) -> Result<String, Error> {
    let path = path.as_ref();
    let real = std::fs::canonicalize(path)
        .map_err(|e| Error::from_io(format!("realize '{}'", path.display()), e))?;
    let real = real.to_string_lossy();
    // Windows hands back verbatim paths; strip the marker before tidying.
    let real = real.strip_prefix(r"\\?\").unwrap_or(&real);
    Ok(tidy(real))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tidy_collapses_and_flips_slashes() {
        assert_eq!(tidy("a//b\\c/"), "a/b/c");
        assert_eq!(tidy("a\\\\b"), "a/b");
        assert_eq!(tidy("foo///bar////"), "foo/bar");
    }

    #[test]
    fn tidy_keeps_roots() {
        assert_eq!(tidy(""), "");
        assert_eq!(tidy("/"), "/");
        assert_eq!(tidy("//"), "/");
        assert_eq!(tidy("///a"), "//a");
        assert_eq!(tidy("//unc/share/"), "//unc/share");
        assert_eq!(tidy("\\\\server\\share\\dir\\"), "//server/share/dir");
    }

    #[test]
    fn tidy_drive_letters() {
        assert_eq!(tidy("c:"), "C:/");
        assert_eq!(tidy("c:/"), "C:/");
        assert_eq!(tidy("c:\\"), "C:/");
        assert_eq!(tidy("d:\\foo\\bar\\"), "D:/foo/bar");
        assert_eq!(tidy("e://x//"), "E:/x");
        assert_eq!(tidy("C:relative/"), "C:relative");
    }

    #[test]
    fn tidy_is_idempotent() {
        let samples = [
            "",
            "/",
            "//",
            "///",
            ".",
            "./a/",
            "a//b\\c/",
            "c:",
            "c:/",
            "C:\\\\x\\",
            "//unc/share/",
            "\\\\",
            "~/x/",
            "ab:cd//",
        ];
        for p in samples {
            let once = tidy(p);
            assert_eq!(tidy(&once), once, "tidy not idempotent for {p:?}");
        }
    }

    #[test]
    fn tidy_paths_preserves_order() {
        assert_eq!(tidy_paths(&["b/", "a\\c"]), vec!["b", "a/c"]);
    }

    #[test]
    fn join_parts_and_extension() {
        assert_eq!(path_join(&["a", "b", "c"], "").unwrap(), "a/b/c");
        assert_eq!(path_join(&["a/", "", "b"], "txt").unwrap(), "a/b.txt");
        assert_eq!(path_join(&["/", "usr"], "").unwrap(), "/usr");
    }

    #[test]
    fn join_rejects_overlong_paths() {
        let long = "x".repeat(PATH_MAX);
        let err = path_join(&[long.as_str()], "").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn expand_leaves_non_tilde_paths() {
        assert_eq!(expand("a/b/"), "a/b");
        assert_eq!(expand("~user/x"), "~user/x");
    }

    #[test]
    fn expand_replaces_home() {
        if let Some(home) = home_dir() {
            assert_eq!(expand("~/docs"), tidy(&format!("{home}/docs")));
            assert_eq!(expand("~"), tidy(&home));
        }
    }

    #[test]
    fn realize_resolves_existing_dir() {
        let real = realize(".").unwrap();
        assert!(!real.is_empty());
        assert!(!real.contains('\\'));
        assert!(realize("definitely/not/here").is_err());
    }
}
