use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::ErrorPolicy;
use crate::FileKind;
use crate::TypeFilter;
use crate::WalkOptions;
use crate::WalkOutput;
use crate::backend::FsBackend;
use crate::dirent::resolve;
use crate::filter::is_hidden;
use crate::path::tidy;

/// Per-entry callback of a walk, applied to the path of every entry that
/// passes the filters.
///
/// Any `FnMut(&str) -> T` closure is a `Transform`.
pub trait Transform {
    /// Value collected for each entry.
    type Output;

    /// Map the path of one entry.
    fn apply(&mut self, path: &str) -> Self::Output;
}

impl<F, T> Transform for F
where
    F: FnMut(&str) -> T,
{
    type Output = T;

    fn apply(&mut self, path: &str) -> T {
        self(path)
    }
}

/// Roots to walk plus the [`WalkOptions`] that apply to all of them.
///
/// ```rust
/// # use fsops::{ErrorPolicy, TypeFilter, WalkRequest};
/// let request = WalkRequest::new(&["src"])
///     .type_filter(TypeFilter::FILE)
///     .max_depth(0)
///     .on_error(ErrorPolicy::WarnAndSkip);
/// assert_eq!(request.options.max_depth, Some(0));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalkRequest {
    /// Directories to list, walked in order.
    pub roots: Vec<String>,
    /// Options shared by every root.
    #[serde(default)]
    pub options: WalkOptions,
}

impl WalkRequest {
    /// A request over `roots` with default options.
    pub fn new<S: AsRef<str>>(roots: &[S]) -> Self {
        Self {
            roots: roots.iter().map(|r| r.as_ref().to_owned()).collect(),
            options: WalkOptions::default(),
        }
    }

    /// Include dot-files and descend into dot-directories.
    pub fn include_hidden(mut self, yes: bool) -> Self {
        self.options.include_hidden = yes;
        self
    }

    /// Only return entries of these kinds.
    pub fn type_filter(mut self, filter: TypeFilter) -> Self {
        self.options.type_filter = filter;
        self
    }

    /// Bound recursion. `0` lists immediate children only, `None` is
    /// unbounded.
    pub fn max_depth(mut self, depth: impl Into<Option<usize>>) -> Self {
        self.options.max_depth = depth.into();
        self
    }

    /// Failure handling for scans and stats.
    pub fn on_error(mut self, policy: ErrorPolicy) -> Self {
        self.options.on_error = policy;
        self
    }
}

/// Walk every root of `request` through `backend`, collecting
/// `transform(path)` for each entry that passes the filters.
///
/// Roots are tidied before use and never reported themselves. Symlinks are
/// reported as [`FileKind::Link`] and never followed.
pub fn walk<B, F>(
    backend: &B,
    request: &WalkRequest,
    transform: F,
) -> Result<WalkOutput<F::Output>, Error>
where
    B: FsBackend + ?Sized,
    F: Transform,
{
    let mut walker = DirWalker {
        backend,
        options: &request.options,
        transform,
        out: WalkOutput::default(),
    };
    for root in &request.roots {
        walker.walk_root(&tidy(root))?;
    }
    Ok(walker.out)
}

/// Path of entry `name` inside `parent`.
pub(crate) fn child_path(parent: &str, name: &str) -> String {
    if parent == "." {
        name.to_owned()
    } else if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// One directory being listed. Dropping the frame closes its scan.
struct Frame<D> {
    path: String,
    entries: D,
    depth_left: Option<usize>,
}

struct DirWalker<'a, B: FsBackend + ?Sized, F: Transform> {
    backend: &'a B,
    options: &'a WalkOptions,
    transform: F,
    out: WalkOutput<F::Output>,
}

impl<B: FsBackend + ?Sized, F: Transform> DirWalker<'_, B, F> {
    fn walk_root(&mut self, root: &str) -> Result<(), Error> {
        let mut stack = Vec::new();
        if let Some(frame) = self.open(root, self.options.max_depth)? {
            stack.push(frame);
        }

        while let Some(frame) = stack.last_mut() {
            let entry = match frame.entries.next() {
                None => {
                    stack.pop();
                    continue;
                }
                Some(Ok(entry)) => entry,
                Some(Err(e)) => {
                    let err = Error::from_io(format!("scan directory '{}'", frame.path), e);
                    stack.pop();
                    self.fail_or_warn(err)?;
                    continue;
                }
            };

            if !self.options.include_hidden && is_hidden(&entry.name) {
                continue;
            }

            let child = child_path(&frame.path, &entry.name);
            let depth_left = frame.depth_left;
            let kind = resolve(
                self.backend,
                &child,
                entry.kind,
                self.options.on_error,
                &mut self.out.warnings,
            )?;
            log::trace!("{child}: {kind:?}");

            if self.options.type_filter.contains(kind) {
                self.out.items.push(self.transform.apply(&child));
            }

            if kind == FileKind::Dir && depth_left != Some(0) {
                if let Some(frame) = self.open(&child, depth_left.map(|d| d - 1))? {
                    stack.push(frame);
                }
            }
        }
        Ok(())
    }

    fn open(
        &mut self,
        path: &str,
        depth_left: Option<usize>,
    ) -> Result<Option<Frame<B::ReadDir>>, Error> {
        log::debug!("scanning {path}");
        match self.backend.scan_dir(path) {
            Ok(entries) => Ok(Some(Frame {
                path: path.to_owned(),
                entries,
                depth_left,
            })),
            Err(e) => {
                self.fail_or_warn(Error::from_io(format!("scan directory '{path}'"), e))?;
                Ok(None)
            }
        }
    }

    fn fail_or_warn(&mut self, err: Error) -> Result<(), Error> {
        match self.options.on_error {
            ErrorPolicy::Fail => Err(err),
            ErrorPolicy::WarnAndSkip => {
                log::warn!("skipping subtree: {err}");
                self.out.warnings.push(err);
                Ok(())
            }
        }
    }
}
