//! Data types exchanged with an [`ObjectClient`](crate::ObjectClient).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CallArgs;

/// One bucket, as reported by a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSummary {
    pub name: String,
    pub creation_date: Option<DateTime<Utc>>,
}

/// One object, as reported by an object listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    /// Owner display name; only present when the listing was asked to
    /// fetch it (`FetchOwner`).
    pub owner: Option<String>,
}

/// Metadata for a single object, as reported by a head call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectStat {
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub version_id: Option<String>,
}

/// One page worth of object listing.
///
/// `contents` are the direct objects; `common_prefixes` are the one-level
/// groupings produced when a delimiter was set (each ends with the
/// delimiter). `next_continuation_token` is only meaningful while
/// `is_truncated` is true.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListObjectsPage {
    pub contents: Vec<ObjectSummary>,
    pub common_prefixes: Vec<String>,
    pub is_truncated: bool,
    pub next_continuation_token: Option<String>,
}

/// Parameters for one paginated object-listing call.
#[derive(Debug, Clone, Default)]
pub struct ListObjectsRequest {
    pub bucket: String,
    pub prefix: Option<String>,
    pub delimiter: Option<String>,
    pub continuation_token: Option<String>,
    pub args: CallArgs,
}

impl ListObjectsRequest {
    /// A request scoped to `bucket`, listing from the start.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        if !prefix.is_empty() {
            self.prefix = Some(prefix);
        }
        self
    }

    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    pub fn continuation_token(mut self, token: Option<String>) -> Self {
        self.continuation_token = token;
        self
    }

    pub fn args(mut self, args: CallArgs) -> Self {
        self.args = args;
        self
    }
}
