use std::fs;
use std::path::Path as StdPath;

use tempdir::TempDir;

use crate::Error;
use crate::path::tidy;

// Relative paths to create in the temporary test root and whether each one
// is a directory.
pub(crate) static TEMP_FILES: &[(&str, bool)] = &[
    ("a.txt", false),
    (".hidden", false),
    ("sub", true),
    ("sub/child.txt", false),
    ("sub/.secret", true),
    ("sub/.secret/inner.txt", false),
    ("sub/deep", true),
    ("sub/deep/leaf.txt", false),
    ("empty", true),
];

/// A temporary directory populated with a small fixed tree.
///
/// The tree is removed when the `TestRoot` is dropped.
#[derive(Debug)]
pub struct TestRoot {
    /// Root of the temporary test directory.
    pub root: TempDir,
}

impl TestRoot {
    /// Creates the temporary directory and the files in it.
    pub fn new() -> Result<Self, Error> {
        let root = TempDir::new("fsops").map_err(|e| Error::from_io("create test root", e))?;
        let ret = Self { root };
        for (relative_path, is_dir) in TEMP_FILES {
            if *is_dir {
                ret.create_dir(relative_path)?;
            } else {
                ret.create_file(relative_path, "")?;
            }
        }
        Ok(ret)
    }

    /// The root as a tidy path string.
    pub fn path(&self) -> String {
        tidy(&self.root.path().to_string_lossy())
    }

    /// `relative_path` under the root as a tidy path string.
    pub fn join(&self, relative_path: &str) -> String {
        tidy(&format!("{}/{relative_path}", self.path()))
    }

    /// Writes `content` to `relative_path`, creating missing parents.
    pub fn create_file(&self, relative_path: &str, content: &str) -> Result<(), Error> {
        let full_path = self.root.path().join(relative_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::from_io(format!("make directory '{}'", parent.display()), e))?;
        }
        fs::write(&full_path, content)
            .map_err(|e| Error::from_io(format!("write '{}'", full_path.display()), e))
    }

    /// Creates directory `relative_path` and its missing parents.
    pub fn create_dir(&self, relative_path: &str) -> Result<(), Error> {
        let full_path = self.root.path().join(relative_path);
        fs::create_dir_all(&full_path)
            .map_err(|e| Error::from_io(format!("make directory '{}'", full_path.display()), e))
    }

    /// Every fixture path (relative) whose components are all visible.
    pub fn visible(&self) -> Vec<&'static str> {
        TEMP_FILES
            .iter()
            .map(|(p, _)| *p)
            .filter(|p| !p.split('/').any(crate::is_hidden))
            .collect()
    }

    /// Whether `relative_path` exists under the root, without following
    /// symlinks.
    pub fn exists(&self, relative_path: &str) -> bool {
        fs::symlink_metadata(StdPath::new(&self.join(relative_path))).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypeFilter;
    use crate::scan;

    #[test]
    fn fixture_tree_is_created() {
        let root = TestRoot::new().unwrap();
        for (p, _) in TEMP_FILES {
            assert!(root.exists(p), "{p}");
        }
        assert!(!root.exists("nope"));
        assert!(root.visible().contains(&"sub/deep/leaf.txt"));
        assert!(!root.visible().contains(&"sub/.secret/inner.txt"));
    }

    #[test]
    fn native_scan_matches_fixture() {
        let root = TestRoot::new().unwrap();
        let mut found = scan(&[root.path()], false, TypeFilter::ALL, true).unwrap();
        found.sort();
        let mut expected: Vec<String> = root.visible().iter().map(|p| root.join(p)).collect();
        expected.sort();
        assert_eq!(found, expected);
    }

    #[test]
    fn native_files_only_and_depth() {
        let root = TestRoot::new().unwrap();
        let files = scan(&[root.path()], true, TypeFilter::FILE, false).unwrap();
        let mut files: Vec<_> = files.iter().map(String::as_str).collect();
        files.sort();
        let (a, hidden) = (root.join("a.txt"), root.join(".hidden"));
        assert_eq!(files, vec![hidden.as_str(), a.as_str()]);

        let request = crate::WalkRequest::new(&[root.path()]).max_depth(1);
        let out = crate::walk_map(&request, |p: &str| p.to_owned()).unwrap();
        assert!(out.items.contains(&root.join("sub/deep")));
        assert!(!out.items.contains(&root.join("sub/deep/leaf.txt")));
    }

    #[test]
    fn native_missing_root_policies() {
        let root = TestRoot::new().unwrap();
        let missing = root.join("missing");
        let err = scan(&[missing.as_str()], false, TypeFilter::ALL, true).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::NotFound);

        let request = crate::WalkRequest::new(&[missing.clone(), root.join("empty")])
            .on_error(crate::ErrorPolicy::WarnAndSkip);
        let out = crate::walk_map(&request, |p: &str| p.to_owned()).unwrap();
        assert!(out.items.is_empty());
        assert_eq!(out.warnings.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn native_symlinks_are_not_followed() {
        let root = TestRoot::new().unwrap();
        std::os::unix::fs::symlink(root.path(), root.join("sub/loop")).unwrap();
        let links = scan(&[root.path()], false, TypeFilter::LINK, true).unwrap();
        assert_eq!(links, vec![root.join("sub/loop")]);
        let all = scan(&[root.path()], false, TypeFilter::ALL, true).unwrap();
        assert!(!all.iter().any(|p| p.contains("loop/")));
    }
}
