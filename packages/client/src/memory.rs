//! In-memory [`ObjectClient`] used by the test suites.
//!
//! `MemoryClient` reproduces the listing contract of the real service:
//! lexicographic key order, delimiter grouping into common prefixes,
//! truncated pages with continuation tokens. It also records the argument
//! bag it receives per operation so tests can assert what survived
//! filtering.

use std::collections::BTreeMap;
use std::sync::Mutex;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::{
    Api, BucketSummary, CallArgs, ClientError, ListObjectsPage, ListObjectsRequest, ObjectClient,
    ObjectStat, ObjectSummary,
};

#[derive(Debug, Clone)]
struct ObjectRecord {
    body: Bytes,
    last_modified: DateTime<Utc>,
    owner: Option<String>,
    version_id: Option<String>,
}

impl ObjectRecord {
    fn new(body: Bytes) -> Self {
        Self {
            body,
            last_modified: Utc::now(),
            owner: None,
            version_id: None,
        }
    }

    fn stat(&self) -> ObjectStat {
        ObjectStat {
            size: self.body.len() as u64,
            last_modified: self.last_modified,
            version_id: self.version_id.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct Bucket {
    creation_date: Option<DateTime<Utc>>,
    objects: BTreeMap<String, ObjectRecord>,
    // (key, version id) -> record, for version-pinned head/get
    versions: BTreeMap<(String, String), ObjectRecord>,
}

#[derive(Debug, Default)]
struct State {
    buckets: BTreeMap<String, Bucket>,
}

#[derive(Debug, Default)]
struct CallLog {
    last_args: BTreeMap<Api, CallArgs>,
    counts: BTreeMap<Api, usize>,
}

/// In-memory object store with real listing semantics.
pub struct MemoryClient {
    state: Mutex<State>,
    calls: Mutex<CallLog>,
    page_size: usize,
}

impl Default for MemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryClient {
    /// An empty store with the service's default page size.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            calls: Mutex::new(CallLog::default()),
            page_size: 1000,
        }
    }

    /// Shrink the listing page size so tests can exercise pagination.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Test setup: store an object, creating its bucket if needed.
    pub fn insert_object(&self, bucket: &str, key: &str, body: impl Into<Bytes>) {
        let mut state = self.state.lock().expect("memory client state poisoned");
        let bucket = state.buckets.entry(bucket.to_string()).or_insert_with(|| Bucket {
            creation_date: Some(Utc::now()),
            ..Bucket::default()
        });
        bucket
            .objects
            .insert(key.to_string(), ObjectRecord::new(body.into()));
    }

    /// Test setup: store a version-pinned copy of an object.
    pub fn insert_object_version(
        &self,
        bucket: &str,
        key: &str,
        version_id: &str,
        body: impl Into<Bytes>,
    ) {
        let mut state = self.state.lock().expect("memory client state poisoned");
        let bucket = state.buckets.entry(bucket.to_string()).or_default();
        let mut record = ObjectRecord::new(body.into());
        record.version_id = Some(version_id.to_string());
        bucket
            .versions
            .insert((key.to_string(), version_id.to_string()), record);
    }

    /// Test setup: attach an owner display name to a stored object.
    pub fn set_owner(&self, bucket: &str, key: &str, owner: &str) {
        let mut state = self.state.lock().expect("memory client state poisoned");
        if let Some(record) = state
            .buckets
            .get_mut(bucket)
            .and_then(|b| b.objects.get_mut(key))
        {
            record.owner = Some(owner.to_string());
        }
    }

    /// Every key currently stored in `bucket`, sorted.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let state = self.state.lock().expect("memory client state poisoned");
        state
            .buckets
            .get(bucket)
            .map(|b| b.objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// The argument bag received by the most recent call of `api`.
    pub fn last_args(&self, api: Api) -> Option<CallArgs> {
        let calls = self.calls.lock().expect("memory client call log poisoned");
        calls.last_args.get(&api).cloned()
    }

    /// How many times `api` has been invoked.
    pub fn call_count(&self, api: Api) -> usize {
        let calls = self.calls.lock().expect("memory client call log poisoned");
        calls.counts.get(&api).copied().unwrap_or(0)
    }

    fn record(&self, api: Api, args: &CallArgs) {
        let mut calls = self.calls.lock().expect("memory client call log poisoned");
        calls.last_args.insert(api, args.clone());
        *calls.counts.entry(api).or_insert(0) += 1;
    }
}

impl ObjectClient for MemoryClient {
    fn list_buckets(&self, args: &CallArgs) -> Result<Vec<BucketSummary>, ClientError> {
        self.record(Api::ListBuckets, args);
        let state = self.state.lock().expect("memory client state poisoned");
        Ok(state
            .buckets
            .iter()
            .map(|(name, bucket)| BucketSummary {
                name: name.clone(),
                creation_date: bucket.creation_date,
            })
            .collect())
    }

    fn create_bucket(&self, bucket: &str, args: &CallArgs) -> Result<(), ClientError> {
        self.record(Api::CreateBucket, args);
        let mut state = self.state.lock().expect("memory client state poisoned");
        if state.buckets.contains_key(bucket) {
            return Err(ClientError::already_exists(format!("bucket '{}'", bucket)));
        }
        state.buckets.insert(
            bucket.to_string(),
            Bucket {
                creation_date: Some(Utc::now()),
                ..Bucket::default()
            },
        );
        Ok(())
    }

    fn delete_bucket(&self, bucket: &str, args: &CallArgs) -> Result<(), ClientError> {
        self.record(Api::DeleteBucket, args);
        let mut state = self.state.lock().expect("memory client state poisoned");
        match state.buckets.get(bucket) {
            None => Err(ClientError::not_found(format!("bucket '{}'", bucket))),
            Some(b) if !b.objects.is_empty() => Err(ClientError::Api {
                code: "BucketNotEmpty".to_string(),
                message: format!("bucket '{}' is not empty", bucket),
            }),
            Some(_) => {
                state.buckets.remove(bucket);
                Ok(())
            }
        }
    }

    fn head_bucket(&self, bucket: &str, args: &CallArgs) -> Result<(), ClientError> {
        self.record(Api::HeadBucket, args);
        let state = self.state.lock().expect("memory client state poisoned");
        if state.buckets.contains_key(bucket) {
            Ok(())
        } else {
            Err(ClientError::not_found(format!("bucket '{}'", bucket)))
        }
    }

    fn list_objects(&self, request: &ListObjectsRequest) -> Result<ListObjectsPage, ClientError> {
        self.record(Api::ListObjects, &request.args);
        let state = self.state.lock().expect("memory client state poisoned");
        let bucket = state
            .buckets
            .get(&request.bucket)
            .ok_or_else(|| ClientError::not_found(format!("bucket '{}'", request.bucket)))?;

        let prefix = request.prefix.as_deref().unwrap_or("");
        let fetch_owner = request.args.get_bool("FetchOwner").unwrap_or(false);

        // Keys in lexicographic order, scoped to the prefix, strictly after
        // the continuation token.
        let keys: Vec<&String> = bucket
            .objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .filter(|key| match &request.continuation_token {
                Some(token) => key.as_str() > token.as_str(),
                None => true,
            })
            .collect();

        let mut page = ListObjectsPage::default();
        let mut entries = 0usize;
        let mut index = 0usize;
        while index < keys.len() {
            if entries == self.page_size {
                page.is_truncated = true;
                page.next_continuation_token = Some(keys[index - 1].clone());
                break;
            }
            let key = keys[index];
            let rest = &key[prefix.len()..];
            let group = request
                .delimiter
                .as_deref()
                .and_then(|d| rest.find(d).map(|at| (d, at)));
            match group {
                Some((delimiter, at)) => {
                    // One common prefix per group; a group is never split
                    // across pages, so consume every key under it now.
                    let common = format!("{}{}{}", prefix, &rest[..at], delimiter);
                    page.common_prefixes.push(common.clone());
                    while index < keys.len() && keys[index].starts_with(&common) {
                        index += 1;
                    }
                }
                None => {
                    let record = &bucket.objects[key.as_str()];
                    page.contents.push(ObjectSummary {
                        key: key.clone(),
                        size: record.body.len() as u64,
                        last_modified: record.last_modified,
                        owner: if fetch_owner { record.owner.clone() } else { None },
                    });
                    index += 1;
                }
            }
            entries += 1;
        }
        Ok(page)
    }

    fn head_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
        args: &CallArgs,
    ) -> Result<ObjectStat, ClientError> {
        self.record(Api::HeadObject, args);
        let state = self.state.lock().expect("memory client state poisoned");
        let b = state
            .buckets
            .get(bucket)
            .ok_or_else(|| ClientError::not_found(format!("bucket '{}'", bucket)))?;
        let record = match version_id {
            Some(version) => b.versions.get(&(key.to_string(), version.to_string())),
            None => b.objects.get(key),
        };
        record.map(ObjectRecord::stat).ok_or_else(|| {
            ClientError::not_found(format!("key '{}/{}'", bucket, key))
        })
    }

    fn get_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
        args: &CallArgs,
    ) -> Result<Bytes, ClientError> {
        self.record(Api::GetObject, args);
        let state = self.state.lock().expect("memory client state poisoned");
        let b = state
            .buckets
            .get(bucket)
            .ok_or_else(|| ClientError::not_found(format!("bucket '{}'", bucket)))?;
        let record = match version_id {
            Some(version) => b.versions.get(&(key.to_string(), version.to_string())),
            None => b.objects.get(key),
        };
        record
            .map(|r| r.body.clone())
            .ok_or_else(|| ClientError::not_found(format!("key '{}/{}'", bucket, key)))
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        args: &CallArgs,
    ) -> Result<(), ClientError> {
        self.record(Api::PutObject, args);
        let mut state = self.state.lock().expect("memory client state poisoned");
        let b = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| ClientError::not_found(format!("bucket '{}'", bucket)))?;
        b.objects.insert(key.to_string(), ObjectRecord::new(body));
        Ok(())
    }

    fn delete_object(&self, bucket: &str, key: &str, args: &CallArgs) -> Result<(), ClientError> {
        self.record(Api::DeleteObject, args);
        let mut state = self.state.lock().expect("memory client state poisoned");
        let b = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| ClientError::not_found(format!("bucket '{}'", bucket)))?;
        // The service reports success for absent keys as well.
        b.objects.remove(key);
        Ok(())
    }

    fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        target_bucket: &str,
        target_key: &str,
        args: &CallArgs,
    ) -> Result<(), ClientError> {
        self.record(Api::CopyObject, args);
        let mut state = self.state.lock().expect("memory client state poisoned");
        let record = state
            .buckets
            .get(source_bucket)
            .and_then(|b| b.objects.get(source_key))
            .cloned()
            .ok_or_else(|| {
                ClientError::not_found(format!("key '{}/{}'", source_bucket, source_key))
            })?;
        let target = state
            .buckets
            .get_mut(target_bucket)
            .ok_or_else(|| ClientError::not_found(format!("bucket '{}'", target_bucket)))?;
        let mut copied = record;
        copied.last_modified = Utc::now();
        target.objects.insert(target_key.to_string(), copied);
        Ok(())
    }
}
