//! Error types for the core layer.
//!
//! Semantic errors (malformed patterns, relative paths where bucket/key
//! context is required, unsupported operations) live here; transport
//! errors arrive wrapped from the client layer.

use blobpath_client::ClientError;

use crate::path::PathError;

/// Errors raised by the core layer.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Path construction or decomposition failed.
    #[error(transparent)]
    Path(#[from] PathError),

    /// A glob pattern was malformed (empty, or `**` combined with other
    /// characters inside one component).
    #[error("invalid pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    /// A glob pattern shape that is deliberately never supported
    /// (absolute or otherwise non-relative patterns).
    #[error("non-relative patterns are unsupported: {pattern:?}")]
    UnsupportedPattern { pattern: String },

    /// The operation has no meaning on an object-storage backend.
    #[error("{op} is unsupported on object storage")]
    Unsupported { op: &'static str },

    /// Configuration registration carried neither a client nor arguments.
    #[error("configuration registration requires a client or arguments")]
    MissingConfiguration,

    /// The addressed bucket, key or key prefix does not exist.
    #[error("no such bucket or key: {path}")]
    NotFound { path: String },

    /// Creation target already exists.
    #[error("already exists: {path}")]
    AlreadyExists { path: String },

    /// A file operation was applied to a bucket or key prefix.
    #[error("is a directory: {path}")]
    IsADirectory { path: String },

    /// A directory operation was applied to a plain key.
    #[error("not a directory: {path}")]
    NotADirectory { path: String },

    /// A text read found a body that is not valid UTF-8.
    #[error("object at {path} is not valid utf-8")]
    NonUtf8 { path: String },

    /// Remote call failure, propagated unchanged.
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl Error {
    pub(crate) fn not_found(path: impl ToString) -> Self {
        Error::NotFound {
            path: path.to_string(),
        }
    }

    pub(crate) fn already_exists(path: impl ToString) -> Self {
        Error::AlreadyExists {
            path: path.to_string(),
        }
    }

    /// True if this error reports a missing bucket, key or prefix.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::NotFound { .. } | Error::Client(ClientError::NotFound { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let e = Error::InvalidPattern {
            pattern: "a**b".to_string(),
            message: "'**' can only be an entire path component".to_string(),
        };
        assert!(format!("{}", e).contains("a**b"));

        let e = Error::Unsupported { op: "chmod" };
        assert_eq!(format!("{}", e), "chmod is unsupported on object storage");
    }

    #[test]
    fn path_error_wraps_transparently() {
        let e: Error = PathError::NotAbsolute.into();
        assert!(format!("{}", e).contains("relative path"));
    }

    #[test]
    fn not_found_covers_both_layers() {
        assert!(Error::not_found("/docs/x").is_not_found());
        assert!(Error::Client(ClientError::not_found("bucket 'x'")).is_not_found());
        assert!(!Error::MissingConfiguration.is_not_found());
    }
}
