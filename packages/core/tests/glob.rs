//! Glob engine behavior against the in-memory backend.

use std::sync::Arc;

use blobpath_client::{Api, MemoryClient};
use blobpath_core::{blob_path, BlobPath, BlobStore, Error};

fn store_with(client: Arc<MemoryClient>) -> BlobStore {
    BlobStore::new(client)
}

fn collect_sorted(
    store: &BlobStore,
    base: &BlobPath,
    pattern: &str,
) -> Vec<String> {
    let mut matches: Vec<String> = store
        .glob(base, pattern)
        .unwrap()
        .map(|p| p.unwrap().to_string())
        .collect();
    matches.sort();
    matches
}

#[test]
fn single_level_and_recursive_globs() {
    let client = Arc::new(MemoryClient::new());
    client.insert_object("docs", "a.ext", "1");
    client.insert_object("docs", "b.ext", "2");
    client.insert_object("docs", "sub/c.ext", "3");
    let store = store_with(client);

    assert_eq!(
        collect_sorted(&store, &blob_path!("/docs"), "*.ext"),
        vec!["/docs/a.ext", "/docs/b.ext"]
    );
    assert_eq!(
        collect_sorted(&store, &blob_path!("/docs"), "**/*.ext"),
        vec!["/docs/a.ext", "/docs/b.ext", "/docs/sub/c.ext"]
    );
}

#[test]
fn results_are_sets_not_sequences() {
    // Ordering follows the backend listing; callers compare sets. With a
    // stable in-memory backend two runs agree.
    let client = Arc::new(MemoryClient::new());
    for key in ["x/1.log", "x/2.log", "y/3.log"] {
        client.insert_object("docs", key, "line");
    }
    let store = store_with(client);

    let first = collect_sorted(&store, &blob_path!("/docs"), "**/*.log");
    let second = collect_sorted(&store, &blob_path!("/docs"), "**/*.log");
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}

#[test]
fn intermediate_level_appears_once() {
    let client = Arc::new(MemoryClient::new());
    client.insert_object("docs", "x/y/z/file1.txt", "1");
    client.insert_object("docs", "x/y/z/file2.txt", "2");
    let store = store_with(client);

    assert_eq!(
        collect_sorted(&store, &blob_path!("/docs"), "*/*"),
        vec!["/docs/x/y"]
    );
}

#[test]
fn rglob_matches_prefixed_glob() {
    let client = Arc::new(MemoryClient::new());
    client.insert_object("docs", "f.txt", "0");
    client.insert_object("docs", "d1/f.txt", "1");
    client.insert_object("docs", "d1/d2/f.txt", "2");
    let store = store_with(client);

    let via_rglob: Vec<String> = {
        let mut v: Vec<String> = store
            .rglob(&blob_path!("/docs"), "f.txt")
            .unwrap()
            .map(|p| p.unwrap().to_string())
            .collect();
        v.sort();
        v
    };
    let via_glob = collect_sorted(&store, &blob_path!("/docs"), "**/f.txt");
    assert_eq!(via_rglob, via_glob);
}

#[test]
fn rglob_count_tracks_depth() {
    // One matching file at every nesting level: the match count equals
    // the number of levels and drops by one per descent.
    let client = Arc::new(MemoryClient::new());
    client.insert_object("docs", "f.txt", "0");
    client.insert_object("docs", "d1/f.txt", "1");
    client.insert_object("docs", "d1/d2/f.txt", "2");
    let store = store_with(client);

    for (base, expected) in [
        ("/docs", 3),
        ("/docs/d1", 2),
        ("/docs/d1/d2", 1),
    ] {
        let count = store
            .rglob(&blob_path!(base), "f.txt")
            .unwrap()
            .count();
        assert_eq!(count, expected, "base {}", base);
    }
}

#[test]
fn pattern_shape_errors() {
    let client = Arc::new(MemoryClient::new());
    client.insert_object("docs", "a.txt", "1");
    let store = store_with(client);
    let base = blob_path!("/docs");

    assert!(matches!(
        store.glob(&base, "").unwrap_err(),
        Error::InvalidPattern { .. }
    ));
    assert!(matches!(
        store.glob(&base, "a**/b").unwrap_err(),
        Error::InvalidPattern { .. }
    ));
    // Absolute-shaped patterns are a deliberate non-feature, reported
    // distinctly from malformed input.
    assert!(matches!(
        store.glob(&base, "/abs/*.txt").unwrap_err(),
        Error::UnsupportedPattern { .. }
    ));
    assert!(matches!(
        store.rglob(&base, "").unwrap_err(),
        Error::InvalidPattern { .. }
    ));
    assert!(matches!(
        store.rglob(&base, "/abs").unwrap_err(),
        Error::UnsupportedPattern { .. }
    ));
}

#[test]
fn glob_on_relative_base_fails() {
    let store = store_with(Arc::new(MemoryClient::new()));
    assert!(store.glob(&blob_path!("docs"), "*").is_err());
}

#[test]
fn glob_streams_page_by_page() {
    let client = MemoryClient::new().with_page_size(1);
    client.insert_object("docs", "a.ext", "1");
    client.insert_object("docs", "b.ext", "2");
    client.insert_object("docs", "c.ext", "3");
    let client = Arc::new(client);
    let store = store_with(client.clone());

    let mut glob = store.glob(&blob_path!("/docs"), "*.ext").unwrap();
    glob.next().unwrap().unwrap();
    let pages_after_first = client.call_count(Api::ListObjects);
    glob.by_ref().for_each(drop);
    let pages_after_all = client.call_count(Api::ListObjects);
    assert!(pages_after_first < pages_after_all);
}

#[test]
fn glob_across_buckets_from_root() {
    let client = Arc::new(MemoryClient::new());
    client.insert_object("alpha", "x", "1");
    client.insert_object("beta", "y", "2");
    let store = store_with(client);

    assert_eq!(
        collect_sorted(&store, &BlobPath::root(), "*"),
        vec!["/alpha", "/beta"]
    );
}

#[test]
fn deep_literal_then_wildcard() {
    let client = Arc::new(MemoryClient::new());
    client.insert_object("docs", "reports/2024/q1.csv", "1");
    client.insert_object("docs", "reports/2024/q2.csv", "2");
    client.insert_object("docs", "reports/2023/q4.csv", "3");
    client.insert_object("docs", "notes/2024/q1.csv", "4");
    let store = store_with(client);

    assert_eq!(
        collect_sorted(&store, &blob_path!("/docs"), "reports/2024/*.csv"),
        vec!["/docs/reports/2024/q1.csv", "/docs/reports/2024/q2.csv"]
    );
    assert_eq!(
        collect_sorted(&store, &blob_path!("/docs/reports"), "*/q1.csv"),
        vec!["/docs/reports/2024/q1.csv"]
    );
}
