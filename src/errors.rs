use std::io;

#[cfg(feature = "json_schema")]
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Represents all possible errors in the fsops crate.
///
/// Syscall failures carry `what` (the operation and the offending path, e.g.
/// `scan directory 'src'`) and `how` (the underlying error text).
#[cfg_attr(feature = "json_schema", derive(JsonSchema))]
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Hash, Eq)]
pub enum Error {
    /// The path, or one of its parents, does not exist.
    #[error("[ENOENT] Failed to {what}: {how}")]
    NotFound {
        /// The operation and path that failed.
        what: String,
        /// The reason for the failure.
        how: String,
    },

    /// The target path already exists.
    #[error("[EEXIST] Failed to {what}: {how}")]
    AlreadyExists {
        /// The operation and path that failed.
        what: String,
        /// The reason for the failure.
        how: String,
    },

    /// The caller lacks permission for the operation.
    #[error("[EACCES] Failed to {what}: {how}")]
    PermissionDenied {
        /// The operation and path that failed.
        what: String,
        /// The reason for the failure.
        how: String,
    },

    /// Source and target live on different devices.
    #[error("[EXDEV] Failed to {what}: {how}")]
    CrossDevice {
        /// The operation and path that failed.
        what: String,
        /// The reason for the failure.
        how: String,
    },

    /// Any other syscall failure.
    #[error("[EIO] Failed to {what}: {how}")]
    Io {
        /// The operation and path that failed.
        what: String,
        /// The reason for the failure.
        how: String,
    },

    /// A permission string could not be parsed.
    #[error("Invalid mode '{0}'")]
    InvalidMode(String),

    /// Error indicating an invalid argument was provided.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Closed set of error categories, independent of the message payload.
#[cfg_attr(feature = "json_schema", derive(JsonSchema))]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Hash, Eq)]
pub enum ErrorKind {
    /// See [`Error::NotFound`].
    NotFound,
    /// See [`Error::AlreadyExists`].
    AlreadyExists,
    /// See [`Error::PermissionDenied`].
    PermissionDenied,
    /// See [`Error::CrossDevice`].
    CrossDevice,
    /// See [`Error::InvalidMode`].
    InvalidMode,
    /// See [`Error::InvalidArgument`].
    InvalidArgument,
    /// See [`Error::Io`].
    Io,
}

impl ErrorKind {
    /// errno-style name used as the message prefix.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "ENOENT",
            ErrorKind::AlreadyExists => "EEXIST",
            ErrorKind::PermissionDenied => "EACCES",
            ErrorKind::CrossDevice => "EXDEV",
            ErrorKind::InvalidMode | ErrorKind::InvalidArgument => "EINVAL",
            ErrorKind::Io => "EIO",
        }
    }
}

impl Error {
    /// Maps a `std::io::Error` raised while performing `what`.
    pub fn from_io(what: impl Into<String>, err: io::Error) -> Self {
        let what = what.into();
        let how = err.to_string();
        match err.kind() {
            io::ErrorKind::NotFound => Error::NotFound { what, how },
            io::ErrorKind::AlreadyExists => Error::AlreadyExists { what, how },
            io::ErrorKind::PermissionDenied => Error::PermissionDenied { what, how },
            io::ErrorKind::CrossesDevices => Error::CrossDevice { what, how },
            _ => Error::Io { what, how },
        }
    }

    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Error::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Error::CrossDevice { .. } => ErrorKind::CrossDevice,
            Error::Io { .. } => ErrorKind::Io,
            Error::InvalidMode(_) => ErrorKind::InvalidMode,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }
}
