//! blobpath: filesystem-path shaped access to S3-compatible object storage.
//!
//! blobpath looks at a flat bucket/key namespace like a POSIX tree: paths
//! parse, join and split as values ([`BlobPath`]), per-prefix configuration
//! resolves hierarchically ([`ConfigMap`]), and a blocking service
//! ([`BlobStore`]) maps stat/list/glob/read/write/rename onto the
//! primitives of an object-storage client ([`ObjectClient`]).
//!
//! This crate is the facade over the two layers:
//! - `blobpath-core`: path identity, configuration resolution, listing and
//!   the glob engine
//! - `blobpath-client`: the client contract, per-call argument filtering
//!   and the in-memory reference backend

pub use blobpath_core::{
    blob_path, Api, BlobPath, BlobStore, CallArgs, ClientError, ClientHandle, ConfigMap,
    DirEntry, Error, Glob, IterDir, KeyIter, ObjectClient, ObjectStat, Parents, PathError,
    ReadDir, VersionedBlobPath, Walk, SEP,
};

pub use blobpath_client::{
    BucketSummary, ListObjectsPage, ListObjectsRequest, MemoryClient, ObjectSummary,
};
