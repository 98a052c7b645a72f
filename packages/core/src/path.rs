//! Pure path values over a bucket/key namespace.
//!
//! `BlobPath` treats object storage like a POSIX tree: `/` is the root,
//! the first segment of an absolute path is the bucket, everything after
//! it is the key. The type is a pure value - it parses, joins and splits,
//! but never talks to the network. I/O lives in
//! [`BlobStore`](crate::BlobStore).

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The path separator and URI scheme used throughout.
pub const SEP: char = '/';
const URI_SCHEME: &str = "s3://";

/// Errors related to path construction and decomposition.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// An operation needed bucket/key context on a relative path.
    #[error("relative path has no bucket or key specification")]
    NotAbsolute,

    /// A URI did not carry the expected scheme.
    #[error("not an s3 uri: {uri}")]
    InvalidUri { uri: String },

    /// A bucket argument decomposed into more than one path element.
    #[error("bucket argument contains more than one path element: {bucket}")]
    InvalidBucket { bucket: String },

    /// A name or suffix replacement argument was malformed.
    #[error("invalid name {name:?}")]
    InvalidName { name: String },

    /// `relative_to` was called with a base that is not an ancestor.
    #[error("{path:?} does not start with {base:?}")]
    NotRelativeTo { path: String, base: String },
}

/// A normalized path over buckets and keys.
///
/// Invariants: no empty or `.` segments; each `..` has consumed the
/// segment before it at construction time (a leading `..` survives only on
/// relative paths). Values are immutable - every operation returns a new
/// path.
///
/// # Examples
///
/// ```rust
/// use blobpath_core::BlobPath;
///
/// let path = BlobPath::parse("/docs/reports/2024/q1.csv");
/// assert_eq!(path.bucket().unwrap(), "docs");
/// assert_eq!(path.key().unwrap(), "reports/2024/q1.csv");
/// assert_eq!(path.parent().to_string(), "/docs/reports/2024");
/// ```
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct BlobPath {
    absolute: bool,
    segments: Vec<String>,
}

/// Fold one raw segment into a normalized segment list.
///
/// `..` swallows the segment before it; with nothing left to swallow it is
/// dropped at the root and kept as a leading segment on relative paths.
fn push_segment(segments: &mut Vec<String>, part: &str, absolute: bool) {
    match part {
        "" | "." => {}
        ".." => {
            let blocked = segments.is_empty()
                || segments.last().map(String::as_str) == Some("..");
            if !blocked {
                segments.pop();
            } else if !absolute {
                segments.push("..".to_string());
            }
        }
        other => segments.push(other.to_string()),
    }
}

fn reduce<'a>(absolute: bool, raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut segments: Vec<String> = Vec::new();
    for part in raw {
        push_segment(&mut segments, part, absolute);
    }
    segments
}

impl BlobPath {
    /// Parse a path string.
    ///
    /// A leading `/` makes the path absolute. Empty and `.` segments are
    /// dropped, `..` segments are resolved against the segment before
    /// them. Parsing never fails; the empty string is the empty relative
    /// path (`.`).
    pub fn parse(s: &str) -> Self {
        let absolute = s.starts_with(SEP);
        BlobPath {
            absolute,
            segments: reduce(absolute, s.split(SEP)),
        }
    }

    /// The root path `/`.
    pub fn root() -> Self {
        BlobPath {
            absolute: true,
            segments: Vec::new(),
        }
    }

    /// Build from an `s3://bucket/key` URI.
    ///
    /// Percent-escapes are decoded; a URI without the `s3://` scheme fails.
    pub fn from_uri(uri: &str) -> Result<Self, PathError> {
        let rest = uri
            .strip_prefix(URI_SCHEME)
            .ok_or_else(|| PathError::InvalidUri {
                uri: uri.to_string(),
            })?;
        let decoded = urlencoding::decode(rest).map_err(|_| PathError::InvalidUri {
            uri: uri.to_string(),
        })?;
        Ok(BlobPath {
            absolute: true,
            segments: reduce(true, decoded.split(SEP)),
        })
    }

    /// Build from an explicit (bucket, key) pair.
    ///
    /// Fails when the bucket argument itself decomposes into more than one
    /// path element. An absolute key is re-rooted below the bucket.
    pub fn from_bucket_key(bucket: &str, key: &str) -> Result<Self, PathError> {
        let bucket_segments = reduce(true, bucket.split(SEP));
        if bucket_segments.len() != 1 {
            return Err(PathError::InvalidBucket {
                bucket: bucket.to_string(),
            });
        }
        let mut segments = bucket_segments;
        segments.extend(reduce(true, key.split(SEP)));
        Ok(BlobPath {
            absolute: true,
            segments,
        })
    }

    /// Render as an `s3://` URI with percent-escaped segments.
    ///
    /// Fails on relative paths, which have no bucket to address.
    pub fn to_uri(&self) -> Result<String, PathError> {
        if !self.absolute {
            return Err(PathError::NotAbsolute);
        }
        let encoded: Vec<String> = self
            .segments
            .iter()
            .map(|s| urlencoding::encode(s).into_owned())
            .collect();
        Ok(format!("{}{}", URI_SCHEME, encoded.join("/")))
    }

    /// Whether this path starts at the root.
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// The normalized segments, bucket first for absolute paths.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The bucket name, or `""` for the bare root.
    ///
    /// Fails on relative paths: they carry no bucket/key context.
    pub fn bucket(&self) -> Result<&str, PathError> {
        if !self.absolute {
            return Err(PathError::NotAbsolute);
        }
        Ok(self.segments.first().map(String::as_str).unwrap_or(""))
    }

    /// The key below the bucket, or `""` when there is none.
    ///
    /// Fails on relative paths: they carry no bucket/key context.
    pub fn key(&self) -> Result<String, PathError> {
        if !self.absolute {
            return Err(PathError::NotAbsolute);
        }
        Ok(self
            .segments
            .get(1..)
            .map(|rest| rest.join("/"))
            .unwrap_or_default())
    }

    /// True when the path addresses a bucket itself (one segment, absolute).
    pub fn is_bucket(&self) -> bool {
        self.absolute && self.segments.len() == 1
    }

    /// Join with another path. An absolute right-hand side replaces the
    /// left entirely; `..` segments in the right-hand side reduce against
    /// the combined result.
    #[must_use]
    pub fn join<P: Into<BlobPath>>(&self, other: P) -> BlobPath {
        let other = other.into();
        if other.absolute {
            return other;
        }
        let mut segments = self.segments.clone();
        for part in &other.segments {
            push_segment(&mut segments, part, self.absolute);
        }
        BlobPath {
            absolute: self.absolute,
            segments,
        }
    }

    /// The path without its final segment.
    ///
    /// The parent of the root is the root; the parent of the empty
    /// relative path is itself.
    #[must_use]
    pub fn parent(&self) -> BlobPath {
        if self.segments.is_empty() {
            return self.clone();
        }
        BlobPath {
            absolute: self.absolute,
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        }
    }

    /// Iterator over the ancestors, nearest first, ending at the root (or
    /// the empty relative path), excluding the path itself.
    pub fn parents(&self) -> Parents {
        Parents {
            current: self.clone(),
        }
    }

    /// The final segment, or `""` when there is none.
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    /// The final segment without its extension.
    pub fn stem(&self) -> &str {
        let name = self.name();
        match suffix_split(name) {
            Some(at) => &name[..at],
            None => name,
        }
    }

    /// The extension of the final segment, including the dot, or `""`.
    pub fn suffix(&self) -> &str {
        let name = self.name();
        match suffix_split(name) {
            Some(at) => &name[at..],
            None => "",
        }
    }

    /// Every extension of the final segment, e.g. `[".tar", ".gz"]`.
    pub fn suffixes(&self) -> Vec<String> {
        let name = self.name().trim_end_matches('.');
        let mut out: Vec<String> = name
            .split('.')
            .skip(1)
            .map(|part| format!(".{}", part))
            .collect();
        if name.starts_with('.') && !out.is_empty() {
            // A leading dot is part of the name, not a suffix boundary.
            out.remove(0);
        }
        out
    }

    /// Replace the final segment.
    pub fn with_name(&self, name: &str) -> Result<BlobPath, PathError> {
        if self.segments.is_empty() {
            return Err(PathError::InvalidName {
                name: name.to_string(),
            });
        }
        if name.is_empty() || name == "." || name == ".." || name.contains(SEP) {
            return Err(PathError::InvalidName {
                name: name.to_string(),
            });
        }
        let mut segments = self.segments.clone();
        *segments.last_mut().expect("checked non-empty") = name.to_string();
        Ok(BlobPath {
            absolute: self.absolute,
            segments,
        })
    }

    /// Replace the extension of the final segment. An empty suffix strips
    /// the current one.
    pub fn with_suffix(&self, suffix: &str) -> Result<BlobPath, PathError> {
        if !suffix.is_empty() && (!suffix.starts_with('.') || suffix == "." || suffix.contains(SEP))
        {
            return Err(PathError::InvalidName {
                name: suffix.to_string(),
            });
        }
        let stem = self.stem().to_string();
        if stem.is_empty() {
            return Err(PathError::InvalidName {
                name: suffix.to_string(),
            });
        }
        self.with_name(&format!("{}{}", stem, suffix))
    }

    /// The remainder of this path below `base`.
    pub fn relative_to(&self, base: &BlobPath) -> Result<BlobPath, PathError> {
        if !self.is_relative_to(base) {
            return Err(PathError::NotRelativeTo {
                path: self.to_string(),
                base: base.to_string(),
            });
        }
        Ok(BlobPath {
            absolute: false,
            segments: self.segments[base.segments.len()..].to_vec(),
        })
    }

    /// Whether `base` is this path or one of its ancestors.
    pub fn is_relative_to(&self, base: &BlobPath) -> bool {
        self.absolute == base.absolute
            && base.segments.len() <= self.segments.len()
            && base.segments == self.segments[..base.segments.len()]
    }

    // Object storage has no file modes, links or special files. The
    // erroring operations live on `BlobStore`; these probes answer a
    // constant `false` because callers commonly test them unconditionally.

    /// Always `false`: no symlinks in object storage.
    pub fn is_symlink(&self) -> bool {
        false
    }

    /// Always `false`: no sockets in object storage.
    pub fn is_socket(&self) -> bool {
        false
    }

    /// Always `false`: no fifos in object storage.
    pub fn is_fifo(&self) -> bool {
        false
    }

    /// Always `false`: no block devices in object storage.
    pub fn is_block_device(&self) -> bool {
        false
    }

    /// Always `false`: no character devices in object storage.
    pub fn is_char_device(&self) -> bool {
        false
    }

    /// Always `false`: no mount points in object storage.
    pub fn is_mount(&self) -> bool {
        false
    }
}

fn suffix_split(name: &str) -> Option<usize> {
    match name.rfind('.') {
        Some(at) if at > 0 && at < name.len() - 1 => Some(at),
        _ => None,
    }
}

/// Iterator over a path's ancestors, nearest first. See
/// [`BlobPath::parents`].
pub struct Parents {
    current: BlobPath,
}

impl Iterator for Parents {
    type Item = BlobPath;

    fn next(&mut self) -> Option<BlobPath> {
        let parent = self.current.parent();
        if parent == self.current {
            return None;
        }
        self.current = parent.clone();
        Some(parent)
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            write!(f, "/{}", self.segments.join("/"))
        } else if self.segments.is_empty() {
            write!(f, ".")
        } else {
            write!(f, "{}", self.segments.join("/"))
        }
    }
}

impl From<&str> for BlobPath {
    fn from(s: &str) -> Self {
        BlobPath::parse(s)
    }
}

impl From<String> for BlobPath {
    fn from(s: String) -> Self {
        BlobPath::parse(&s)
    }
}

impl From<&BlobPath> for BlobPath {
    fn from(p: &BlobPath) -> Self {
        p.clone()
    }
}

impl Serialize for BlobPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for BlobPath {
    fn deserialize<D>(deserializer: D) -> Result<BlobPath, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        if s.is_empty() {
            return Err(D::Error::custom("empty path string"));
        }
        Ok(BlobPath::parse(&s))
    }
}

/// Macro for building paths from literals.
///
/// # Example
///
/// ```rust
/// use blobpath_core::blob_path;
///
/// let p = blob_path!("/docs/reports");
/// assert_eq!(p.bucket().unwrap(), "docs");
/// ```
#[macro_export]
macro_rules! blob_path {
    ($s:expr) => {
        $crate::BlobPath::parse($s)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_paths() {
        assert_eq!(BlobPath::parse("/").segments().len(), 0);
        assert_eq!(BlobPath::parse("/docs").segments().len(), 1);
        assert_eq!(BlobPath::parse("/docs/a/b").segments().len(), 3);
        assert_eq!(BlobPath::parse("a/b").segments().len(), 2);
        assert!(!BlobPath::parse("a/b").is_absolute());
        assert!(BlobPath::parse("/a/b").is_absolute());
    }

    #[test]
    fn normalization_drops_empty_and_dot() {
        assert_eq!(BlobPath::parse("/a//b/"), BlobPath::parse("/a/b"));
        assert_eq!(BlobPath::parse("/a/./b"), BlobPath::parse("/a/b"));
        assert_eq!(BlobPath::parse(""), BlobPath::parse("."));
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["/a/b/../c", "a//./b/", "/..", "../x", "/docs/a/../../b"] {
            let parsed = BlobPath::parse(raw);
            assert_eq!(BlobPath::parse(&parsed.to_string()), parsed, "{}", raw);
        }
    }

    #[test]
    fn dotdot_consumes_preceding_segment() {
        assert_eq!(BlobPath::parse("a/b/../c"), BlobPath::parse("a/c"));
        assert_eq!(BlobPath::parse("/a/b/../c/../d"), BlobPath::parse("/a/d"));
        assert_eq!(BlobPath::parse("/docs/a/../../b"), BlobPath::parse("/b"));
    }

    #[test]
    fn dotdot_never_crosses_root() {
        assert_eq!(BlobPath::parse("/.."), BlobPath::root());
        assert_eq!(BlobPath::parse("/../a"), BlobPath::parse("/a"));
    }

    #[test]
    fn leading_dotdot_survives_on_relative_paths() {
        let p = BlobPath::parse("../a");
        assert_eq!(p.segments(), &["..".to_string(), "a".to_string()]);
        assert_eq!(BlobPath::parse("../../a").segments().len(), 3);
    }

    #[test]
    fn bucket_and_key_views() {
        let p = BlobPath::parse("/docs/reports/q1.csv");
        assert_eq!(p.bucket().unwrap(), "docs");
        assert_eq!(p.key().unwrap(), "reports/q1.csv");

        let bucket_only = BlobPath::parse("/docs");
        assert_eq!(bucket_only.bucket().unwrap(), "docs");
        assert_eq!(bucket_only.key().unwrap(), "");

        assert_eq!(BlobPath::root().bucket().unwrap(), "");
        assert_eq!(BlobPath::root().key().unwrap(), "");
    }

    #[test]
    fn bucket_and_key_require_absolute() {
        let p = BlobPath::parse("reports/q1.csv");
        assert_eq!(p.bucket(), Err(PathError::NotAbsolute));
        assert_eq!(p.key(), Err(PathError::NotAbsolute));
    }

    #[test]
    fn is_bucket_probe() {
        assert!(BlobPath::parse("/docs").is_bucket());
        assert!(!BlobPath::parse("/docs/key").is_bucket());
        assert!(!BlobPath::root().is_bucket());
        assert!(!BlobPath::parse("docs").is_bucket());
    }

    #[test]
    fn join_appends_and_reduces() {
        let base = BlobPath::parse("/docs/a");
        assert_eq!(base.join("b/c"), BlobPath::parse("/docs/a/b/c"));
        assert_eq!(base.join(".."), BlobPath::parse("/docs"));
        assert_eq!(base.join("../x"), BlobPath::parse("/docs/x"));
    }

    #[test]
    fn join_with_absolute_replaces() {
        let base = BlobPath::parse("/docs/a");
        assert_eq!(base.join("/other/b"), BlobPath::parse("/other/b"));
    }

    #[test]
    fn join_accepts_paths_and_strings() {
        let base = BlobPath::parse("/docs");
        let other = BlobPath::parse("a/b");
        assert_eq!(base.join(&other), BlobPath::parse("/docs/a/b"));
        assert_eq!(base.join("a/b"), BlobPath::parse("/docs/a/b"));
    }

    #[test]
    fn parent_traversal() {
        let p = BlobPath::parse("/docs/a/b");
        assert_eq!(p.parent(), BlobPath::parse("/docs/a"));
        assert_eq!(BlobPath::root().parent(), BlobPath::root());
        assert_eq!(BlobPath::parse(".").parent(), BlobPath::parse("."));
    }

    #[test]
    fn parents_iterator_ends_at_root() {
        let p = BlobPath::parse("/docs/a/b");
        let parents: Vec<String> = p.parents().map(|p| p.to_string()).collect();
        assert_eq!(parents, vec!["/docs/a", "/docs", "/"]);
    }

    #[test]
    fn parents_iterator_relative() {
        let p = BlobPath::parse("a/b");
        let parents: Vec<String> = p.parents().map(|p| p.to_string()).collect();
        assert_eq!(parents, vec!["a", "."]);
    }

    #[test]
    fn name_stem_suffix() {
        let p = BlobPath::parse("/docs/archive.tar.gz");
        assert_eq!(p.name(), "archive.tar.gz");
        assert_eq!(p.stem(), "archive.tar");
        assert_eq!(p.suffix(), ".gz");
        assert_eq!(p.suffixes(), vec![".tar".to_string(), ".gz".to_string()]);

        assert_eq!(BlobPath::parse("/docs/.hidden").suffix(), "");
        assert_eq!(BlobPath::parse("/docs/plain").suffix(), "");
        assert_eq!(BlobPath::root().name(), "");
    }

    #[test]
    fn with_name_and_suffix() {
        let p = BlobPath::parse("/docs/a/q1.csv");
        assert_eq!(
            p.with_name("q2.csv").unwrap(),
            BlobPath::parse("/docs/a/q2.csv")
        );
        assert_eq!(
            p.with_suffix(".json").unwrap(),
            BlobPath::parse("/docs/a/q1.json")
        );
        assert_eq!(p.with_suffix("").unwrap(), BlobPath::parse("/docs/a/q1"));

        assert!(p.with_name("a/b").is_err());
        assert!(p.with_name("").is_err());
        assert!(p.with_suffix("json").is_err());
        assert!(BlobPath::root().with_name("x").is_err());
    }

    #[test]
    fn relative_to_strips_prefix() {
        let p = BlobPath::parse("/docs/a/b");
        assert_eq!(
            p.relative_to(&BlobPath::parse("/docs")).unwrap(),
            BlobPath::parse("a/b")
        );
        assert!(p.relative_to(&BlobPath::parse("/other")).is_err());
        assert!(p.is_relative_to(&BlobPath::parse("/docs/a")));
        assert!(!p.is_relative_to(&BlobPath::parse("docs")));
    }

    #[test]
    fn uri_round_trip() {
        let p = BlobPath::from_uri("s3://docs/reports/q1.csv").unwrap();
        assert_eq!(p, BlobPath::parse("/docs/reports/q1.csv"));
        assert_eq!(p.to_uri().unwrap(), "s3://docs/reports/q1.csv");
    }

    #[test]
    fn uri_round_trip_with_escapes() {
        let p = BlobPath::from_uri("s3://docs/with%20space/a%2Bb.txt").unwrap();
        assert_eq!(p, BlobPath::parse("/docs/with space/a+b.txt"));
        let uri = p.to_uri().unwrap();
        assert_eq!(BlobPath::from_uri(&uri).unwrap(), p);
    }

    #[test]
    fn uri_scheme_mismatch_fails() {
        assert!(matches!(
            BlobPath::from_uri("gs://docs/key"),
            Err(PathError::InvalidUri { .. })
        ));
        assert!(matches!(
            BlobPath::from_uri("/docs/key"),
            Err(PathError::InvalidUri { .. })
        ));
    }

    #[test]
    fn uri_from_relative_fails() {
        assert_eq!(
            BlobPath::parse("a/b").to_uri(),
            Err(PathError::NotAbsolute)
        );
    }

    #[test]
    fn from_bucket_key_pairs() {
        let p = BlobPath::from_bucket_key("docs", "a/b.txt").unwrap();
        assert_eq!(p, BlobPath::parse("/docs/a/b.txt"));

        // An absolute key is re-rooted below the bucket.
        let p = BlobPath::from_bucket_key("docs", "/a/b.txt").unwrap();
        assert_eq!(p, BlobPath::parse("/docs/a/b.txt"));

        assert!(matches!(
            BlobPath::from_bucket_key("docs/nested", "k"),
            Err(PathError::InvalidBucket { .. })
        ));
        assert!(matches!(
            BlobPath::from_bucket_key("", "k"),
            Err(PathError::InvalidBucket { .. })
        ));
    }

    #[test]
    fn display_forms() {
        assert_eq!(BlobPath::root().to_string(), "/");
        assert_eq!(BlobPath::parse("/docs/a").to_string(), "/docs/a");
        assert_eq!(BlobPath::parse("a/b").to_string(), "a/b");
        assert_eq!(BlobPath::parse(".").to_string(), ".");
    }

    #[test]
    fn ordering_and_hashing_over_segments() {
        use std::collections::HashSet;

        assert!(BlobPath::parse("/a/b") < BlobPath::parse("/a/c"));
        let mut set = HashSet::new();
        set.insert(BlobPath::parse("/a//b"));
        set.insert(BlobPath::parse("/a/b"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn serde_as_string() {
        let p = BlobPath::parse("/docs/a");
        let text = serde_json::to_string(&p).unwrap();
        assert_eq!(text, "\"/docs/a\"");
        let back: BlobPath = serde_json::from_str(&text).unwrap();
        assert_eq!(back, p);
        assert!(serde_json::from_str::<BlobPath>("\"\"").is_err());
    }

    #[test]
    fn capability_probes_are_false() {
        let p = BlobPath::parse("/docs/a");
        assert!(!p.is_symlink());
        assert!(!p.is_socket());
        assert!(!p.is_fifo());
        assert!(!p.is_block_device());
        assert!(!p.is_char_device());
        assert!(!p.is_mount());
    }

    #[test]
    fn macro_builds_paths() {
        let p = blob_path!("/docs/a");
        assert_eq!(p, BlobPath::parse("/docs/a"));
    }
}
