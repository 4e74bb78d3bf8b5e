use std::ops::BitOr;
use std::ops::BitOrAssign;

use derivative::Derivative;
#[cfg(feature = "json_schema")]
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

use crate::FileKind;

/// A set of [`FileKind`]s an entry must belong to in order to be returned.
///
/// Filters combine with `|`:
///
/// ```rust
/// # use fsops::{FileKind, TypeFilter};
/// let filter = TypeFilter::FILE | TypeFilter::LINK;
/// assert!(filter.contains(FileKind::Link));
/// assert!(!filter.contains(FileKind::Dir));
/// ```
#[cfg_attr(feature = "json_schema", derive(JsonSchema))]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TypeFilter(u8);

impl TypeFilter {
    /// Matches nothing.
    pub const NONE: TypeFilter = TypeFilter(0);
    /// Block devices.
    pub const BLOCK: TypeFilter = TypeFilter::of(FileKind::Block);
    /// Character devices.
    pub const CHAR: TypeFilter = TypeFilter::of(FileKind::Char);
    /// Directories.
    pub const DIR: TypeFilter = TypeFilter::of(FileKind::Dir);
    /// Named pipes.
    pub const FIFO: TypeFilter = TypeFilter::of(FileKind::Fifo);
    /// Symbolic links.
    pub const LINK: TypeFilter = TypeFilter::of(FileKind::Link);
    /// Regular files.
    pub const FILE: TypeFilter = TypeFilter::of(FileKind::File);
    /// Sockets.
    pub const SOCKET: TypeFilter = TypeFilter::of(FileKind::Socket);
    /// Entries whose kind could not be resolved.
    pub const UNKNOWN: TypeFilter = TypeFilter::of(FileKind::Unknown);
    /// Every kind, [`FileKind::Unknown`] included.
    pub const ALL: TypeFilter = TypeFilter(u8::MAX);

    const fn of(kind: FileKind) -> TypeFilter {
        let bit = match kind {
            FileKind::Block => 0,
            FileKind::Char => 1,
            FileKind::Dir => 2,
            FileKind::Fifo => 3,
            FileKind::Link => 4,
            FileKind::File => 5,
            FileKind::Socket => 6,
            FileKind::Unknown => 7,
        };
        TypeFilter(1 << bit)
    }

    /// Whether entries of `kind` pass this filter.
    pub fn contains(&self, kind: FileKind) -> bool {
        self.0 & TypeFilter::of(kind).0 != 0
    }
}

impl Default for TypeFilter {
    fn default() -> Self {
        TypeFilter::ALL
    }
}

impl From<FileKind> for TypeFilter {
    fn from(kind: FileKind) -> Self {
        TypeFilter::of(kind)
    }
}

impl BitOr for TypeFilter {
    type Output = TypeFilter;

    fn bitor(self, rhs: TypeFilter) -> TypeFilter {
        TypeFilter(self.0 | rhs.0)
    }
}

impl BitOrAssign for TypeFilter {
    fn bitor_assign(&mut self, rhs: TypeFilter) {
        self.0 |= rhs.0;
    }
}

/// What a walk does when a directory cannot be scanned or an entry cannot be
/// stat'ed.
#[cfg_attr(feature = "json_schema", derive(JsonSchema))]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ErrorPolicy {
    /// Abort the whole walk with the error.
    #[default]
    Fail,

    /// Record a warning, prune the affected subtree and carry on.
    WarnAndSkip,
}

/// Per-walk knobs. Serializable so hosts can pass them around as
/// configuration.
#[cfg_attr(feature = "json_schema", derive(JsonSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, Derivative, PartialEq, Eq)]
#[derivative(Default)]
#[serde(default)]
pub struct WalkOptions {
    /// Return and descend into entries whose name starts with `.`.
    pub include_hidden: bool,

    /// Kinds that are returned. Directories are traversed whether or not
    /// they pass.
    #[derivative(Default(value = "TypeFilter::ALL"))]
    pub type_filter: TypeFilter,

    /// `None` walks the whole tree, `Some(0)` lists only the immediate
    /// children of each root.
    pub max_depth: Option<usize>,

    /// Failure handling for scans and stats.
    pub on_error: ErrorPolicy,
}

/// Dot-files are hidden.
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_bits_are_distinct() {
        let all = [
            TypeFilter::BLOCK,
            TypeFilter::CHAR,
            TypeFilter::DIR,
            TypeFilter::FIFO,
            TypeFilter::LINK,
            TypeFilter::FILE,
            TypeFilter::SOCKET,
            TypeFilter::UNKNOWN,
        ];
        let mut union = TypeFilter::NONE;
        for f in all {
            assert_ne!(union | f, union);
            union |= f;
        }
        assert_eq!(union, TypeFilter::ALL);
    }

    #[test]
    fn filter_contains() {
        let f = TypeFilter::FILE | TypeFilter::DIR;
        assert!(f.contains(FileKind::File));
        assert!(f.contains(FileKind::Dir));
        assert!(!f.contains(FileKind::Link));
        assert!(!TypeFilter::NONE.contains(FileKind::File));
        assert!(TypeFilter::ALL.contains(FileKind::Unknown));
        assert_eq!(TypeFilter::from(FileKind::Fifo), TypeFilter::FIFO);
    }

    #[test]
    fn default_options() {
        let opts = WalkOptions::default();
        assert!(!opts.include_hidden);
        assert_eq!(opts.type_filter, TypeFilter::ALL);
        assert_eq!(opts.max_depth, None);
        assert_eq!(opts.on_error, ErrorPolicy::Fail);
    }

    #[test]
    fn hidden_names() {
        assert!(is_hidden(".git"));
        assert!(is_hidden("."));
        assert!(!is_hidden("a.txt"));
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: WalkOptions =
            serde_json::from_str(r#"{"type_filter": 32, "on_error": "WarnAndSkip"}"#).unwrap();
        assert_eq!(opts.type_filter, TypeFilter::FILE);
        assert_eq!(opts.on_error, ErrorPolicy::WarnAndSkip);
        assert_eq!(opts.max_depth, None);
        assert!(!opts.include_hidden);

        let json = serde_json::to_string(&opts).unwrap();
        assert_eq!(serde_json::from_str::<WalkOptions>(&json).unwrap(), opts);
    }
}
