//! Paths pinned to an object version.

use std::fmt;
use std::ops::Deref;

use crate::path::{BlobPath, PathError};

/// A [`BlobPath`] carrying an opaque version identifier.
///
/// The version belongs to one exact object, so path arithmetic does not
/// carry it along: `join`, `parent` and friends (available through
/// `Deref`) return plain [`BlobPath`] values, and the version is
/// re-attached explicitly with [`BlobPath::with_version`] when the derived
/// path should be pinned again.
///
/// ```rust
/// use blobpath_core::BlobPath;
///
/// let pinned = BlobPath::parse("/docs/report.csv").with_version("abc123");
/// assert_eq!(pinned.version_id(), "abc123");
///
/// // Arithmetic drops the pin; re-attach it deliberately.
/// let sibling = pinned.parent().join("other.csv");
/// let pinned_sibling = sibling.with_version("def456");
/// assert_eq!(pinned_sibling.version_id(), "def456");
/// ```
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct VersionedBlobPath {
    path: BlobPath,
    version_id: String,
}

impl VersionedBlobPath {
    /// Pin `path` to `version_id`.
    pub fn new(path: BlobPath, version_id: impl Into<String>) -> Self {
        Self {
            path,
            version_id: version_id.into(),
        }
    }

    /// Build from an `s3://bucket/key` URI plus a version identifier.
    pub fn from_uri(uri: &str, version_id: impl Into<String>) -> Result<Self, PathError> {
        Ok(Self::new(BlobPath::from_uri(uri)?, version_id))
    }

    /// Build from an explicit (bucket, key) pair plus a version identifier.
    pub fn from_bucket_key(
        bucket: &str,
        key: &str,
        version_id: impl Into<String>,
    ) -> Result<Self, PathError> {
        Ok(Self::new(BlobPath::from_bucket_key(bucket, key)?, version_id))
    }

    /// The pinned version.
    pub fn version_id(&self) -> &str {
        &self.version_id
    }

    /// The underlying path value.
    pub fn path(&self) -> &BlobPath {
        &self.path
    }

    /// Unpin, returning the plain path.
    pub fn into_path(self) -> BlobPath {
        self.path
    }
}

impl BlobPath {
    /// Pin this path to an object version.
    pub fn with_version(&self, version_id: impl Into<String>) -> VersionedBlobPath {
        VersionedBlobPath::new(self.clone(), version_id)
    }
}

impl Deref for VersionedBlobPath {
    type Target = BlobPath;

    fn deref(&self) -> &BlobPath {
        &self.path
    }
}

impl fmt::Display for VersionedBlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.path, self.version_id)
    }
}
