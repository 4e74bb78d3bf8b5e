//! Cross-platform filesystem plumbing: path tidying, permission modes,
//! directory-entry types and a pre-order directory walker.
//!
//! Every path that crosses the API is a `/`-separated string in tidy form,
//! and every failure is an [`Error`] whose message starts with an errno
//! style tag such as `[ENOENT]`.
//!
//! ```rust
//! use fsops::{TypeFilter, WalkRequest};
//!
//! let files = fsops::scan(&["src"], false, TypeFilter::FILE, true).unwrap();
//! assert!(files.contains(&"src/lib.rs".to_string()));
//!
//! let request = WalkRequest::new(&["src"]).max_depth(0);
//! let names = fsops::walk_map(&request, |p: &str| p.len()).unwrap();
//! assert!(names.is_clean());
//!
//! assert_eq!(fsops::tidy("C:\\Users\\me\\"), "C:/Users/me");
//! assert_eq!(fsops::parse_mode("u+x", 0o644).unwrap(), 0o744);
//! assert_eq!(fsops::render_mode(0o4755), "rwsr-xr-x");
//! ```
//!
//! A serialized [`WalkOutput`] of names looks like
//! ```json
//! {
//!   "items": ["src/backend.rs", "src/context.rs"],
//!   "warnings": []
//! }
//! ```

mod backend;
mod context;
mod dir_list;
mod dirent;
mod errors;
mod file;
mod filter;
mod mode;
pub mod ops;
mod path;
pub mod utils;
mod walker;

pub use backend::FsBackend;
pub use backend::NativeFs;
pub use backend::NativeReadDir;
pub use backend::RawDirEntry;
pub use context::FsContext;
pub use context::scan;
pub use context::walk_map;
pub use dir_list::WalkOutput;
pub use dirent::resolve;
pub use errors::Error;
pub use errors::ErrorKind;
pub use file::FileKind;
pub use file::FileStat;
pub use filter::ErrorPolicy;
pub use filter::TypeFilter;
pub use filter::WalkOptions;
pub use filter::is_hidden;
pub use mode::ModeDialect;
pub use mode::file_code;
pub use mode::parse_mode;
pub use mode::render_mode;
pub use path::PATH_MAX;
pub use path::expand;
pub use path::path_join;
pub use path::realize;
pub use path::tidy;
pub use path::tidy_paths;
pub use walker::Transform;
pub use walker::WalkRequest;
pub use walker::walk;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_support;

#[cfg(feature = "test_utils")]
pub(crate) mod test_utils;
#[cfg(feature = "test_utils")]
pub use test_utils::TestRoot;
