//! The listing primitive: lazy, paginated enumeration of buckets and keys.
//!
//! [`ReadDir`] yields one [`DirEntry`] per child of a path (one logical
//! level, delimiter-grouped). [`KeyIter`] is the raw key stream underneath
//! the glob engine: prefix-scoped, optionally delimiter-grouped, spanning
//! every bucket when the path has none. Both fetch pages on demand, so
//! early entries are available before later pages exist.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

use blobpath_client::{Api, CallArgs, ClientHandle, ListObjectsRequest, ObjectClient};

use crate::error::Error;
use crate::path::{BlobPath, SEP};

/// One child of a listed path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl DirEntry {
    fn dir(name: impl Into<String>) -> Self {
        DirEntry {
            name: name.into(),
            is_dir: true,
            size: None,
            last_modified: None,
        }
    }

    fn file(name: impl Into<String>, size: u64, last_modified: DateTime<Utc>) -> Self {
        DirEntry {
            name: name.into(),
            is_dir: false,
            size: Some(size),
            last_modified: Some(last_modified),
        }
    }

    pub fn is_file(&self) -> bool {
        !self.is_dir
    }
}

/// The listing prefix for a path: empty without a key, otherwise the key
/// terminated with the separator.
pub(crate) fn generate_prefix(path: &BlobPath) -> Result<String, Error> {
    let key = path.key()?;
    if key.is_empty() {
        return Ok(String::new());
    }
    if key.ends_with(SEP) {
        Ok(key)
    } else {
        Ok(format!("{}{}", key, SEP))
    }
}

fn last_segment(key: &str) -> &str {
    key.trim_end_matches(SEP).rsplit(SEP).next().unwrap_or(key)
}

/// Lazy directory-entry stream for one path. See
/// [`BlobStore::read_dir`](crate::BlobStore::read_dir).
pub struct ReadDir {
    client: ClientHandle,
    args: CallArgs,
    /// Empty when the path is the root: list buckets instead of keys.
    bucket: String,
    prefix: String,
    buffer: VecDeque<DirEntry>,
    token: Option<String>,
    started: bool,
    done: bool,
}

impl ReadDir {
    pub(crate) fn new(client: ClientHandle, args: CallArgs, bucket: String, prefix: String) -> Self {
        ReadDir {
            client,
            args,
            bucket,
            prefix,
            buffer: VecDeque::new(),
            token: None,
            started: false,
            done: false,
        }
    }

    fn fetch_buckets(&mut self) -> Result<(), Error> {
        let args = self.args.filtered_for(Api::ListBuckets);
        for bucket in self.client.list_buckets(&args)? {
            self.buffer.push_back(DirEntry::dir(bucket.name));
        }
        self.done = true;
        Ok(())
    }

    fn fetch_page(&mut self) -> Result<(), Error> {
        let request = ListObjectsRequest::new(&self.bucket)
            .prefix(self.prefix.clone())
            .delimiter(SEP.to_string())
            .continuation_token(self.token.take())
            .args(self.args.filtered_for(Api::ListObjects));
        log::debug!("listing {}/{} (one level)", self.bucket, self.prefix);
        let page = self.client.list_objects(&request)?;

        for common in &page.common_prefixes {
            self.buffer.push_back(DirEntry::dir(last_segment(common)));
        }
        for object in &page.contents {
            // The key equal to the scan prefix is the folder-marker
            // pseudo-entry, not a child.
            if object.key == self.prefix {
                continue;
            }
            self.buffer.push_back(DirEntry::file(
                last_segment(&object.key),
                object.size,
                object.last_modified,
            ));
        }

        if page.is_truncated {
            self.token = page.next_continuation_token;
        } else {
            self.done = true;
        }
        Ok(())
    }
}

impl Iterator for ReadDir {
    type Item = Result<DirEntry, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.buffer.pop_front() {
                return Some(Ok(entry));
            }
            if self.done {
                return None;
            }
            let result = if self.bucket.is_empty() && !self.started {
                self.started = true;
                self.fetch_buckets()
            } else {
                self.started = true;
                self.fetch_page()
            };
            if let Err(e) = result {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}

/// Raw key stream for the glob engine.
///
/// With `full_keys` the scan is unbounded-depth (no delimiter); without it
/// the listing is grouped into one level and common-prefix strings (ending
/// with the separator) are yielded alongside plain keys. A path without a
/// bucket yields bucket names (single-level) or every key of every bucket
/// (full scan).
pub struct KeyIter {
    client: ClientHandle,
    args: CallArgs,
    bucket: Option<String>,
    prefix: Option<String>,
    full_keys: bool,
    buffer: VecDeque<String>,
    /// Remaining buckets for the bucketless full scan.
    pending_buckets: Option<VecDeque<String>>,
    current_bucket: Option<String>,
    token: Option<String>,
    started: bool,
    done: bool,
}

impl KeyIter {
    pub(crate) fn new(
        client: ClientHandle,
        args: CallArgs,
        bucket: Option<String>,
        prefix: Option<String>,
        full_keys: bool,
    ) -> Self {
        KeyIter {
            client,
            args,
            bucket,
            prefix,
            full_keys,
            buffer: VecDeque::new(),
            pending_buckets: None,
            current_bucket: None,
            token: None,
            started: false,
            done: false,
        }
    }

    fn start(&mut self) -> Result<(), Error> {
        self.started = true;
        match &self.bucket {
            Some(bucket) => {
                self.current_bucket = Some(bucket.clone());
            }
            None => {
                let args = self.args.filtered_for(Api::ListBuckets);
                let buckets = self.client.list_buckets(&args)?;
                if !self.full_keys {
                    for bucket in buckets {
                        self.buffer.push_back(bucket.name);
                    }
                    self.done = true;
                    return Ok(());
                }
                let mut queue: VecDeque<String> =
                    buckets.into_iter().map(|b| b.name).collect();
                self.current_bucket = queue.pop_front();
                if self.current_bucket.is_none() {
                    self.done = true;
                }
                self.pending_buckets = Some(queue);
            }
        }
        Ok(())
    }

    fn fetch_page(&mut self) -> Result<(), Error> {
        let bucket = match &self.current_bucket {
            Some(bucket) => bucket.clone(),
            None => {
                self.done = true;
                return Ok(());
            }
        };
        let mut request = ListObjectsRequest::new(bucket)
            .continuation_token(self.token.take())
            .args(self.args.filtered_for(Api::ListObjects));
        // The bucketless full scan walks whole buckets, no prefix scoping.
        if self.bucket.is_some() {
            if let Some(prefix) = &self.prefix {
                request = request.prefix(prefix.clone());
            }
            if !self.full_keys {
                request = request.delimiter(SEP.to_string());
            }
        }
        let page = self.client.list_objects(&request)?;

        for object in page.contents {
            self.buffer.push_back(object.key);
        }
        for common in page.common_prefixes {
            self.buffer.push_back(common);
        }

        if page.is_truncated {
            self.token = page.next_continuation_token;
        } else if let Some(queue) = &mut self.pending_buckets {
            self.current_bucket = queue.pop_front();
            if self.current_bucket.is_none() {
                self.done = true;
            }
        } else {
            self.done = true;
        }
        Ok(())
    }
}

impl Iterator for KeyIter {
    type Item = Result<String, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(key) = self.buffer.pop_front() {
                return Some(Ok(key));
            }
            if self.done {
                return None;
            }
            let result = if self.started {
                self.fetch_page()
            } else {
                self.start()
            };
            if let Err(e) = result {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use blobpath_client::MemoryClient;

    use super::*;
    use crate::blob_path;

    fn seeded() -> Arc<MemoryClient> {
        let client = MemoryClient::new();
        client.insert_object("docs", "a.txt", "one");
        client.insert_object("docs", "sub/b.txt", "two");
        client.insert_object("docs", "sub/deep/c.txt", "three");
        Arc::new(client)
    }

    fn read_dir(client: Arc<MemoryClient>, path: &str) -> Vec<DirEntry> {
        let path = blob_path!(path);
        let prefix = generate_prefix(&path).unwrap();
        let bucket = path.bucket().unwrap().to_string();
        ReadDir::new(client, CallArgs::new(), bucket, prefix)
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn generate_prefix_forms() {
        assert_eq!(generate_prefix(&blob_path!("/docs")).unwrap(), "");
        assert_eq!(generate_prefix(&blob_path!("/docs/a")).unwrap(), "a/");
        assert_eq!(generate_prefix(&blob_path!("/docs/a/b")).unwrap(), "a/b/");
    }

    #[test]
    fn lists_one_level() {
        let entries = read_dir(seeded(), "/docs");
        let names: Vec<(&str, bool)> = entries
            .iter()
            .map(|e| (e.name.as_str(), e.is_dir))
            .collect();
        assert_eq!(names, vec![("sub", true), ("a.txt", false)]);
    }

    #[test]
    fn file_entries_carry_metadata() {
        let entries = read_dir(seeded(), "/docs");
        let file = entries.iter().find(|e| e.is_file()).unwrap();
        assert_eq!(file.size, Some(3));
        assert!(file.last_modified.is_some());
    }

    #[test]
    fn nested_level_names_are_last_segments() {
        let entries = read_dir(seeded(), "/docs/sub");
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["deep", "b.txt"]);
    }

    #[test]
    fn folder_marker_object_is_skipped() {
        let client = seeded();
        client.insert_object("docs", "sub/", "");
        let entries = read_dir(client, "/docs/sub");
        assert!(entries.iter().all(|e| e.name != "sub" && !e.name.is_empty()));
    }

    #[test]
    fn root_lists_buckets() {
        let client = seeded();
        client.insert_object("media", "x.bin", "1234");
        let entries = read_dir(client, "/");
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["docs", "media"]);
        assert!(entries.iter().all(|e| e.is_dir));
    }

    #[test]
    fn read_dir_streams_across_pages() {
        let client = MemoryClient::new().with_page_size(2);
        for key in ["a", "b", "c", "d", "e"] {
            client.insert_object("docs", key, "x");
        }
        let client = Arc::new(client);
        let mut iter = ReadDir::new(
            client.clone(),
            CallArgs::new(),
            "docs".to_string(),
            String::new(),
        );

        // First page is fetched on demand; two entries arrive before the
        // second page is requested.
        assert_eq!(iter.next().unwrap().unwrap().name, "a");
        assert_eq!(iter.next().unwrap().unwrap().name, "b");
        assert_eq!(client.call_count(Api::ListObjects), 1);
        assert_eq!(iter.next().unwrap().unwrap().name, "c");
        assert_eq!(client.call_count(Api::ListObjects), 2);
        assert_eq!(iter.count(), 2);
    }

    #[test]
    fn key_iter_full_scan_yields_raw_keys() {
        let keys: Vec<String> = KeyIter::new(
            seeded(),
            CallArgs::new(),
            Some("docs".to_string()),
            Some("sub/".to_string()),
            true,
        )
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
        assert_eq!(keys, vec!["sub/b.txt", "sub/deep/c.txt"]);
    }

    #[test]
    fn key_iter_single_level_yields_common_prefixes() {
        let keys: Vec<String> = KeyIter::new(
            seeded(),
            CallArgs::new(),
            Some("docs".to_string()),
            None,
            false,
        )
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
        assert_eq!(keys, vec!["a.txt", "sub/"]);
    }

    #[test]
    fn key_iter_without_bucket_lists_bucket_names() {
        let client = seeded();
        client.insert_object("media", "x.bin", "1");
        let keys: Vec<String> = KeyIter::new(client, CallArgs::new(), None, None, false)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(keys, vec!["docs", "media"]);
    }

    #[test]
    fn key_iter_without_bucket_full_scan_walks_all_buckets() {
        let client = seeded();
        client.insert_object("media", "x.bin", "1");
        let keys: Vec<String> = KeyIter::new(client, CallArgs::new(), None, None, true)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(
            keys,
            vec!["a.txt", "sub/b.txt", "sub/deep/c.txt", "x.bin"]
        );
    }

    #[test]
    fn missing_bucket_error_propagates() {
        let client = Arc::new(MemoryClient::new());
        let mut iter = ReadDir::new(client, CallArgs::new(), "ghost".to_string(), String::new());
        assert!(iter.next().unwrap().is_err());
        assert!(iter.next().is_none());
    }
}
