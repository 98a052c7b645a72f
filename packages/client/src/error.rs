//! Error types for the client layer.
//!
//! Errors at this level are remote-service focused. Semantic errors like
//! "relative path has no bucket" or "malformed glob pattern" belong to the
//! core layer.

/// Errors returned by an [`ObjectClient`](crate::ObjectClient).
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// The addressed bucket, key or version does not exist.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// The bucket being created already exists.
    #[error("already exists: {what}")]
    AlreadyExists { what: String },

    /// The remote service rejected the call.
    #[error("service error {code}: {message}")]
    Api { code: String, message: String },

    /// Transport failure (network, I/O) below the service protocol.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ClientError {
    /// Shorthand for a [`ClientError::NotFound`].
    pub fn not_found(what: impl Into<String>) -> Self {
        ClientError::NotFound { what: what.into() }
    }

    /// Shorthand for a [`ClientError::AlreadyExists`].
    pub fn already_exists(what: impl Into<String>) -> Self {
        ClientError::AlreadyExists { what: what.into() }
    }

    /// True if this error reports a missing bucket/key/version.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }
}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::Transport(Box::new(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_subject() {
        let e = ClientError::not_found("bucket 'docs'");
        assert!(format!("{}", e).contains("docs"));

        let e = ClientError::Api {
            code: "403".to_string(),
            message: "forbidden".to_string(),
        };
        assert!(format!("{}", e).contains("403"));
        assert!(format!("{}", e).contains("forbidden"));
    }

    #[test]
    fn io_error_converts_to_transport() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let e: ClientError = io_err.into();
        assert!(matches!(e, ClientError::Transport(_)));
    }

    #[test]
    fn not_found_predicate() {
        assert!(ClientError::not_found("x").is_not_found());
        assert!(!ClientError::already_exists("x").is_not_found());
    }
}
