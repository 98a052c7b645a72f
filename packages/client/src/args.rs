//! Per-call extra arguments and the accepted-parameter tables.
//!
//! Configuration registered against a path prefix is a bag of named values
//! (`ContentType`, `ACL`, ...). Not every remote operation accepts every
//! name, so before a call the bag is filtered down to the names the target
//! operation declares. Unrecognized names are dropped silently, per call.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The remote operations a client exposes, used to select the
/// accepted-parameter set when filtering [`CallArgs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Api {
    ListBuckets,
    CreateBucket,
    DeleteBucket,
    HeadBucket,
    ListObjects,
    HeadObject,
    GetObject,
    PutObject,
    DeleteObject,
    CopyObject,
}

impl Api {
    /// The extra parameter names this operation accepts.
    ///
    /// Identification parameters (`Bucket`, `Key`, the copy source) are
    /// supplied by the calling code, not through the argument bag, so they
    /// are not listed here.
    pub fn accepted_params(&self) -> &'static [&'static str] {
        match self {
            Api::ListBuckets => &[],
            Api::CreateBucket => &["ACL", "CreateBucketConfiguration", "ObjectLockEnabledForBucket", "ObjectOwnership"],
            Api::DeleteBucket => &["ExpectedBucketOwner"],
            Api::HeadBucket => &["ExpectedBucketOwner"],
            Api::ListObjects => &[
                "Delimiter",
                "EncodingType",
                "MaxKeys",
                "Prefix",
                "ContinuationToken",
                "FetchOwner",
                "StartAfter",
                "RequestPayer",
                "ExpectedBucketOwner",
            ],
            Api::HeadObject => &[
                "IfMatch",
                "IfModifiedSince",
                "IfNoneMatch",
                "IfUnmodifiedSince",
                "Range",
                "VersionId",
                "SSECustomerAlgorithm",
                "SSECustomerKey",
                "RequestPayer",
                "ExpectedBucketOwner",
            ],
            Api::GetObject => &[
                "IfMatch",
                "IfModifiedSince",
                "IfNoneMatch",
                "IfUnmodifiedSince",
                "Range",
                "ResponseCacheControl",
                "ResponseContentDisposition",
                "ResponseContentEncoding",
                "ResponseContentLanguage",
                "ResponseContentType",
                "ResponseExpires",
                "VersionId",
                "SSECustomerAlgorithm",
                "SSECustomerKey",
                "RequestPayer",
                "ExpectedBucketOwner",
            ],
            Api::PutObject => &[
                "ACL",
                "CacheControl",
                "ContentDisposition",
                "ContentEncoding",
                "ContentLanguage",
                "ContentMD5",
                "ContentType",
                "Expires",
                "GrantFullControl",
                "GrantRead",
                "GrantReadACP",
                "GrantWriteACP",
                "Metadata",
                "ServerSideEncryption",
                "StorageClass",
                "WebsiteRedirectLocation",
                "SSECustomerAlgorithm",
                "SSECustomerKey",
                "SSEKMSKeyId",
                "Tagging",
                "ObjectLockMode",
                "ObjectLockRetainUntilDate",
                "ObjectLockLegalHoldStatus",
                "RequestPayer",
                "ExpectedBucketOwner",
            ],
            Api::DeleteObject => &[
                "MFA",
                "VersionId",
                "RequestPayer",
                "BypassGovernanceRetention",
                "ExpectedBucketOwner",
            ],
            Api::CopyObject => &[
                "ACL",
                "CacheControl",
                "ContentDisposition",
                "ContentEncoding",
                "ContentLanguage",
                "ContentType",
                "CopySourceIfMatch",
                "CopySourceIfModifiedSince",
                "CopySourceIfNoneMatch",
                "CopySourceIfUnmodifiedSince",
                "Expires",
                "GrantFullControl",
                "GrantRead",
                "GrantReadACP",
                "GrantWriteACP",
                "Metadata",
                "MetadataDirective",
                "TaggingDirective",
                "ServerSideEncryption",
                "StorageClass",
                "WebsiteRedirectLocation",
                "SSECustomerAlgorithm",
                "SSECustomerKey",
                "SSEKMSKeyId",
                "Tagging",
                "RequestPayer",
                "ExpectedBucketOwner",
            ],
        }
    }
}

/// A bag of named per-call arguments.
///
/// Values are JSON so overrides can carry strings, numbers, booleans or
/// maps. Ordering is stable (BTreeMap) so the bag compares and debugs
/// deterministically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallArgs(pub BTreeMap<String, Value>);

impl CallArgs {
    /// An empty argument bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a named value, replacing any previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    /// Look up a named value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Convenience accessor for string-valued arguments.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Convenience accessor for boolean-valued arguments.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.0.get(name).and_then(Value::as_bool)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Keep only the names `api` accepts, dropping the rest.
    #[must_use]
    pub fn filtered_for(&self, api: Api) -> CallArgs {
        let accepted = api.accepted_params();
        CallArgs(
            self.0
                .iter()
                .filter(|(name, _)| accepted.contains(&name.as_str()))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        )
    }

    /// Iterate over (name, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl FromIterator<(String, Value)> for CallArgs {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        CallArgs(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> CallArgs {
        let mut args = CallArgs::new();
        args.insert("ContentType", "text/html");
        args.insert("Delimiter", "/");
        args.insert("TotallyMadeUp", json!({"a": 1}));
        args
    }

    #[test]
    fn filter_keeps_accepted_names() {
        let filtered = sample().filtered_for(Api::PutObject);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.get_str("ContentType"), Some("text/html"));
    }

    #[test]
    fn filter_drops_unrecognized_names_silently() {
        let filtered = sample().filtered_for(Api::ListObjects);
        assert_eq!(filtered.get("TotallyMadeUp"), None);
        assert_eq!(filtered.get("ContentType"), None);
        assert_eq!(filtered.get_str("Delimiter"), Some("/"));
    }

    #[test]
    fn filter_for_parameterless_call_is_empty() {
        assert!(sample().filtered_for(Api::ListBuckets).is_empty());
    }

    #[test]
    fn copy_accepts_metadata_directive() {
        let mut args = CallArgs::new();
        args.insert("MetadataDirective", "REPLACE");
        let filtered = args.filtered_for(Api::CopyObject);
        assert_eq!(filtered.get_str("MetadataDirective"), Some("REPLACE"));
    }

    #[test]
    fn serde_round_trip() {
        let args = sample();
        let text = serde_json::to_string(&args).unwrap();
        let back: CallArgs = serde_json::from_str(&text).unwrap();
        assert_eq!(args, back);
    }

    #[test]
    fn typed_accessors() {
        let mut args = CallArgs::new();
        args.insert("FetchOwner", true);
        assert_eq!(args.get_bool("FetchOwner"), Some(true));
        assert_eq!(args.get_str("FetchOwner"), None);
    }
}
