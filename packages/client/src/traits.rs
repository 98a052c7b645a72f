//! The object-storage client contract.

use std::sync::Arc;

use bytes::Bytes;

use crate::{
    BucketSummary, CallArgs, ClientError, ListObjectsPage, ListObjectsRequest, ObjectStat,
};

/// Blocking primitives against an S3-compatible object store.
///
/// Implementations wrap an actual service (or an in-memory fake, see
/// [`MemoryClient`](crate::MemoryClient)). Every call blocks for the full
/// round trip and accepts a pre-filtered bag of extra named parameters;
/// callers are responsible for filtering the bag against
/// [`Api::accepted_params`](crate::Api::accepted_params) first.
///
/// # Object Safety
///
/// This trait is object-safe: the higher layers hold `Arc<dyn ObjectClient>`.
pub trait ObjectClient: Send + Sync {
    /// List every bucket visible to this client.
    fn list_buckets(&self, args: &CallArgs) -> Result<Vec<BucketSummary>, ClientError>;

    /// Create a bucket.
    ///
    /// Fails with [`ClientError::AlreadyExists`] when the bucket exists.
    fn create_bucket(&self, bucket: &str, args: &CallArgs) -> Result<(), ClientError>;

    /// Delete a bucket. The bucket must be empty.
    fn delete_bucket(&self, bucket: &str, args: &CallArgs) -> Result<(), ClientError>;

    /// Existence probe for a bucket.
    ///
    /// Returns `Ok(())` when the bucket exists, [`ClientError::NotFound`]
    /// when it does not.
    fn head_bucket(&self, bucket: &str, args: &CallArgs) -> Result<(), ClientError>;

    /// One page of a (possibly delimiter-grouped) object listing.
    fn list_objects(&self, request: &ListObjectsRequest) -> Result<ListObjectsPage, ClientError>;

    /// Metadata for one object, optionally pinned to a version.
    fn head_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
        args: &CallArgs,
    ) -> Result<ObjectStat, ClientError>;

    /// Fetch a whole object body.
    fn get_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
        args: &CallArgs,
    ) -> Result<Bytes, ClientError>;

    /// Store a whole object body, replacing any previous one.
    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        args: &CallArgs,
    ) -> Result<(), ClientError>;

    /// Delete one object.
    ///
    /// Mirrors the service contract: deleting an absent key succeeds.
    fn delete_object(&self, bucket: &str, key: &str, args: &CallArgs) -> Result<(), ClientError>;

    /// Server-side copy of one object.
    fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        target_bucket: &str,
        target_key: &str,
        args: &CallArgs,
    ) -> Result<(), ClientError>;
}

// Blanket implementations so handles and references are clients too.

impl<T: ObjectClient + ?Sized> ObjectClient for &T {
    fn list_buckets(&self, args: &CallArgs) -> Result<Vec<BucketSummary>, ClientError> {
        (**self).list_buckets(args)
    }

    fn create_bucket(&self, bucket: &str, args: &CallArgs) -> Result<(), ClientError> {
        (**self).create_bucket(bucket, args)
    }

    fn delete_bucket(&self, bucket: &str, args: &CallArgs) -> Result<(), ClientError> {
        (**self).delete_bucket(bucket, args)
    }

    fn head_bucket(&self, bucket: &str, args: &CallArgs) -> Result<(), ClientError> {
        (**self).head_bucket(bucket, args)
    }

    fn list_objects(&self, request: &ListObjectsRequest) -> Result<ListObjectsPage, ClientError> {
        (**self).list_objects(request)
    }

    fn head_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
        args: &CallArgs,
    ) -> Result<ObjectStat, ClientError> {
        (**self).head_object(bucket, key, version_id, args)
    }

    fn get_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
        args: &CallArgs,
    ) -> Result<Bytes, ClientError> {
        (**self).get_object(bucket, key, version_id, args)
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        args: &CallArgs,
    ) -> Result<(), ClientError> {
        (**self).put_object(bucket, key, body, args)
    }

    fn delete_object(&self, bucket: &str, key: &str, args: &CallArgs) -> Result<(), ClientError> {
        (**self).delete_object(bucket, key, args)
    }

    fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        target_bucket: &str,
        target_key: &str,
        args: &CallArgs,
    ) -> Result<(), ClientError> {
        (**self).copy_object(source_bucket, source_key, target_bucket, target_key, args)
    }
}

impl<T: ObjectClient + ?Sized> ObjectClient for Arc<T> {
    fn list_buckets(&self, args: &CallArgs) -> Result<Vec<BucketSummary>, ClientError> {
        self.as_ref().list_buckets(args)
    }

    fn create_bucket(&self, bucket: &str, args: &CallArgs) -> Result<(), ClientError> {
        self.as_ref().create_bucket(bucket, args)
    }

    fn delete_bucket(&self, bucket: &str, args: &CallArgs) -> Result<(), ClientError> {
        self.as_ref().delete_bucket(bucket, args)
    }

    fn head_bucket(&self, bucket: &str, args: &CallArgs) -> Result<(), ClientError> {
        self.as_ref().head_bucket(bucket, args)
    }

    fn list_objects(&self, request: &ListObjectsRequest) -> Result<ListObjectsPage, ClientError> {
        self.as_ref().list_objects(request)
    }

    fn head_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
        args: &CallArgs,
    ) -> Result<ObjectStat, ClientError> {
        self.as_ref().head_object(bucket, key, version_id, args)
    }

    fn get_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
        args: &CallArgs,
    ) -> Result<Bytes, ClientError> {
        self.as_ref().get_object(bucket, key, version_id, args)
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        args: &CallArgs,
    ) -> Result<(), ClientError> {
        self.as_ref().put_object(bucket, key, body, args)
    }

    fn delete_object(&self, bucket: &str, key: &str, args: &CallArgs) -> Result<(), ClientError> {
        self.as_ref().delete_object(bucket, key, args)
    }

    fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        target_bucket: &str,
        target_key: &str,
        args: &CallArgs,
    ) -> Result<(), ClientError> {
        self.as_ref()
            .copy_object(source_bucket, source_key, target_bucket, target_key, args)
    }
}
