//! blobpath client layer: the object-storage contract.
//!
//! This crate defines what a storage backend must provide for the path
//! layer to work on top of it:
//! - [`ObjectClient`]: blocking list/head/get/put/delete/copy primitives
//! - [`CallArgs`] / [`Api`]: per-call named arguments, filtered against the
//!   target operation's accepted-parameter set
//! - [`ClientError`]: the transport-level error taxonomy
//! - [`MemoryClient`]: an in-memory implementation with faithful paginated
//!   listing semantics, used throughout the test suites
//!
//! Semantic concerns (path parsing, glob matching, configuration
//! resolution) live in `blobpath-core`.

pub use bytes::Bytes;

mod args;
mod error;
mod memory;
mod traits;
mod types;

pub use args::{Api, CallArgs};
pub use error::ClientError;
pub use memory::MemoryClient;
pub use traits::ObjectClient;
pub use types::{
    BucketSummary, ListObjectsPage, ListObjectsRequest, ObjectStat, ObjectSummary,
};

/// Shared handle to a client implementation.
pub type ClientHandle = std::sync::Arc<dyn ObjectClient>;
