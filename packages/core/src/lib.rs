//! blobpath core: path semantics over object storage.
//!
//! This layer gives bucket/key namespaces a filesystem-shaped surface:
//! - [`BlobPath`]: pure, normalized path values with bucket/key views and
//!   `s3://` URI conversion
//! - [`VersionedBlobPath`]: a path pinned to one object version
//! - [`ConfigMap`]: longest-prefix resolution of (client, arguments) per
//!   path, with memoized lookups
//! - [`ReadDir`] / [`KeyIter`]: lazy paginated listing
//! - [`Glob`]: glob and recursive glob over the flat key namespace
//! - [`BlobStore`]: the blocking I/O service tying the above to an
//!   [`ObjectClient`](blobpath_client::ObjectClient)
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use blobpath_client::MemoryClient;
//! use blobpath_core::{blob_path, BlobStore};
//!
//! let client = Arc::new(MemoryClient::new());
//! client.insert_object("docs", "reports/q1.csv", "a,b\n1,2\n");
//!
//! let store = BlobStore::new(client);
//! let path = blob_path!("/docs/reports/q1.csv");
//! assert!(store.is_file(&path).unwrap());
//!
//! let matches: Vec<_> = store
//!     .glob(&blob_path!("/docs"), "**/*.csv")
//!     .unwrap()
//!     .collect::<Result<Vec<_>, _>>()
//!     .unwrap();
//! assert_eq!(matches, vec![path]);
//! ```

mod config;
mod error;
mod glob;
mod list;
mod path;
mod store;
mod version;

pub use config::ConfigMap;
pub use error::Error;
pub use glob::Glob;
pub use list::{DirEntry, KeyIter, ReadDir};
pub use path::{BlobPath, Parents, PathError, SEP};
pub use store::{BlobStore, IterDir, Walk};
pub use version::VersionedBlobPath;

// Re-export client types used throughout the public surface.
pub use blobpath_client::{
    Api, CallArgs, ClientError, ClientHandle, ObjectClient, ObjectStat,
};
