//! The I/O service over path values.
//!
//! `BlobStore` owns a [`ConfigMap`] and executes filesystem-shaped
//! operations by resolving (client, arguments) for the operand path and
//! issuing the corresponding client calls. Path values stay pure; all
//! network effects happen here.

use bytes::Bytes;

use blobpath_client::{Api, CallArgs, ClientError, ClientHandle, ListObjectsRequest, ObjectClient, ObjectStat};

use crate::config::ConfigMap;
use crate::error::Error;
use crate::glob::{Glob, Selector};
use crate::list::{generate_prefix, DirEntry, KeyIter, ReadDir};
use crate::path::{BlobPath, SEP};
use crate::version::VersionedBlobPath;

/// Blocking object-storage operations addressed by [`BlobPath`] values.
pub struct BlobStore {
    config: ConfigMap,
}

impl BlobStore {
    /// A store whose unconfigured paths use `client`.
    pub fn new(client: ClientHandle) -> Self {
        Self {
            config: ConfigMap::new(client),
        }
    }

    /// A store with a lazily constructed default client.
    pub fn with_factory(factory: impl Fn() -> ClientHandle + Send + Sync + 'static) -> Self {
        Self {
            config: ConfigMap::with_factory(factory),
        }
    }

    /// The configuration map governing this store.
    pub fn config(&self) -> &ConfigMap {
        &self.config
    }

    /// Register a client and/or argument overrides for a path prefix.
    /// See [`ConfigMap::register`].
    pub fn register(
        &self,
        path: &BlobPath,
        client: Option<ClientHandle>,
        arguments: Option<CallArgs>,
    ) -> Result<(), Error> {
        self.config.register(path, client, arguments)
    }

    fn parts(path: &BlobPath) -> Result<(String, String), Error> {
        Ok((path.bucket()?.to_string(), path.key()?))
    }

    /// Metadata for the object at `path`, or `None` for bucket-only paths.
    ///
    /// A missing key surfaces as a not-found error; use
    /// [`is_file`](Self::is_file) for a boolean probe.
    pub fn stat(&self, path: &BlobPath) -> Result<Option<ObjectStat>, Error> {
        let (bucket, key) = Self::parts(path)?;
        if key.is_empty() {
            return Ok(None);
        }
        let (client, args) = self.config.resolve(path)?;
        let stat = client.head_object(&bucket, &key, None, &args.filtered_for(Api::HeadObject))?;
        Ok(Some(stat))
    }

    /// Metadata for one exact object version.
    pub fn stat_versioned(&self, path: &VersionedBlobPath) -> Result<ObjectStat, Error> {
        let (bucket, key) = Self::parts(path)?;
        let (client, args) = self.config.resolve(path)?;
        let stat = client.head_object(
            &bucket,
            &key,
            Some(path.version_id()),
            &args.filtered_for(Api::HeadObject),
        )?;
        Ok(stat)
    }

    /// Whether `path` points at an existing bucket, key or key prefix.
    pub fn exists(&self, path: &BlobPath) -> Result<bool, Error> {
        let (bucket, key) = Self::parts(path)?;
        if bucket.is_empty() {
            return Ok(true);
        }
        let (client, args) = self.config.resolve(path)?;
        if key.is_empty() {
            return match client.head_bucket(&bucket, &args.filtered_for(Api::HeadBucket)) {
                Ok(()) => Ok(true),
                Err(e) if e.is_not_found() => Ok(false),
                Err(e) => Err(e.into()),
            };
        }

        // A key exists when an object equals it or extends it through the
        // separator.
        let folder = format!("{}{}", key, SEP);
        let mut token = None;
        loop {
            let request = ListObjectsRequest::new(&bucket)
                .prefix(key.clone())
                .continuation_token(token)
                .args(args.filtered_for(Api::ListObjects));
            let page = client.list_objects(&request)?;
            for object in &page.contents {
                if object.key == key || object.key.starts_with(&folder) {
                    return Ok(true);
                }
            }
            if !page.is_truncated {
                return Ok(false);
            }
            token = page.next_continuation_token;
        }
    }

    /// True for the root, buckets, and key prefixes with content below
    /// them; false for plain keys and absent paths.
    pub fn is_dir(&self, path: &BlobPath) -> Result<bool, Error> {
        let (bucket, key) = Self::parts(path)?;
        if bucket.is_empty() || key.is_empty() {
            return Ok(true);
        }
        let (client, args) = self.config.resolve(path)?;
        let request = ListObjectsRequest::new(&bucket)
            .prefix(generate_prefix(path)?)
            .args(args.filtered_for(Api::ListObjects));
        let page = client.list_objects(&request)?;
        Ok(!page.contents.is_empty() || !page.common_prefixes.is_empty())
    }

    /// True when `path` addresses a stored object.
    pub fn is_file(&self, path: &BlobPath) -> Result<bool, Error> {
        let (bucket, key) = Self::parts(path)?;
        if bucket.is_empty() || key.is_empty() {
            return Ok(false);
        }
        match self.stat(path) {
            Ok(stat) => Ok(stat.is_some()),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Whether two paths address the same stored object.
    pub fn samefile(&self, path: &BlobPath, other: &BlobPath) -> Result<bool, Error> {
        let (bucket, key) = Self::parts(path)?;
        let (other_bucket, other_key) = Self::parts(other)?;
        Ok(bucket == other_bucket && key == other_key && self.is_file(path)?)
    }

    /// Lazy directory entries for one level under `path`.
    pub fn read_dir(&self, path: &BlobPath) -> Result<ReadDir, Error> {
        let (bucket, _) = Self::parts(path)?;
        let (client, args) = self.config.resolve(path)?;
        Ok(ReadDir::new(client, args, bucket, generate_prefix(path)?))
    }

    /// Child paths of `path`, one per directory entry.
    pub fn iterdir(&self, path: &BlobPath) -> Result<IterDir, Error> {
        Ok(IterDir {
            inner: self.read_dir(path)?,
            base: path.clone(),
        })
    }

    /// Paths under `path` matching a relative glob pattern.
    ///
    /// Lazy and single-pass; ordering follows the backend listing order.
    pub fn glob(&self, path: &BlobPath, pattern: &str) -> Result<Glob, Error> {
        let selector = Selector::new(path, pattern)?;
        let (client, args) = self.config.resolve(path)?;
        Ok(selector.scan(client, args))
    }

    /// `glob` with `**/` prepended: every match at any depth.
    pub fn rglob(&self, path: &BlobPath, pattern: &str) -> Result<Glob, Error> {
        // Validate the caller's pattern before prepending, so shape errors
        // name the original input.
        crate::glob::validate_pattern(pattern)?;
        self.glob(path, &format!("**{}{}", SEP, pattern))
    }

    /// The raw keys under `path`'s key, as the backend reports them.
    ///
    /// With `full_keys` every key at any depth is yielded; without it the
    /// listing is one delimiter-grouped level and common-prefix strings
    /// (separator-terminated) appear alongside plain keys.
    pub fn iter_keys(&self, path: &BlobPath, full_keys: bool) -> Result<KeyIter, Error> {
        let (bucket, key) = Self::parts(path)?;
        let (client, args) = self.config.resolve(path)?;
        let bucket = Some(bucket).filter(|b| !b.is_empty());
        let prefix = Some(key).filter(|k| !k.is_empty());
        Ok(KeyIter::new(client, args, bucket, prefix, full_keys))
    }

    /// Top-down directory walk, yielding (directory, child dirs, child
    /// files) triples.
    pub fn walk(&self, path: &BlobPath) -> Result<Walk<'_>, Error> {
        Self::parts(path)?;
        Ok(Walk {
            store: self,
            pending: vec![path.clone()],
        })
    }

    /// Fetch a whole object body.
    pub fn read_bytes(&self, path: &BlobPath) -> Result<Bytes, Error> {
        let (bucket, key) = Self::parts(path)?;
        let (client, args) = self.config.resolve(path)?;
        Ok(client.get_object(&bucket, &key, None, &args.filtered_for(Api::GetObject))?)
    }

    /// Fetch one exact object version.
    pub fn read_bytes_versioned(&self, path: &VersionedBlobPath) -> Result<Bytes, Error> {
        let (bucket, key) = Self::parts(path)?;
        let (client, args) = self.config.resolve(path)?;
        Ok(client.get_object(
            &bucket,
            &key,
            Some(path.version_id()),
            &args.filtered_for(Api::GetObject),
        )?)
    }

    /// Fetch an object body as UTF-8 text.
    pub fn read_text(&self, path: &BlobPath) -> Result<String, Error> {
        let bytes = self.read_bytes(path)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| Error::NonUtf8 {
            path: path.to_string(),
        })
    }

    /// Store a whole object body, replacing any previous one.
    pub fn write_bytes(&self, path: &BlobPath, data: impl Into<Bytes>) -> Result<(), Error> {
        let (bucket, key) = Self::parts(path)?;
        let (client, args) = self.config.resolve(path)?;
        client.put_object(&bucket, &key, data.into(), &args.filtered_for(Api::PutObject))?;
        Ok(())
    }

    /// Store a UTF-8 text body.
    pub fn write_text(&self, path: &BlobPath, text: &str) -> Result<(), Error> {
        self.write_bytes(path, text.as_bytes().to_vec())
    }

    /// Create an empty object at `path`.
    ///
    /// With `exist_ok` false an existing bucket/key/prefix at `path` is an
    /// already-exists error; otherwise the object is rewritten empty.
    pub fn touch(&self, path: &BlobPath, exist_ok: bool) -> Result<(), Error> {
        if !exist_ok && self.exists(path)? {
            return Err(Error::already_exists(path));
        }
        self.write_text(path, "")
    }

    /// Create the bucket addressed by `path`.
    ///
    /// Folders do not exist in object storage, so only the bucket is
    /// created: a path carrying a key is rejected unless `parents` is set.
    /// An existing bucket is an already-exists error unless `exist_ok`.
    pub fn mkdir(&self, path: &BlobPath, parents: bool, exist_ok: bool) -> Result<(), Error> {
        match self.mkdir_inner(path, parents) {
            Err(Error::AlreadyExists { .. } | Error::NotFound { .. }) if exist_ok => Ok(()),
            other => other,
        }
    }

    fn mkdir_inner(&self, path: &BlobPath, parents: bool) -> Result<(), Error> {
        let (bucket, key) = Self::parts(path)?;
        if bucket.is_empty() {
            return Err(Error::not_found(path));
        }
        if !key.is_empty() && !parents {
            return Err(Error::not_found(path));
        }
        let bucket_path = BlobPath::parse(&format!("/{}", bucket));
        if self.exists(&bucket_path)? {
            return Err(Error::already_exists(&bucket_path));
        }
        let (client, args) = self.config.resolve(path)?;
        match client.create_bucket(&bucket, &args.filtered_for(Api::CreateBucket)) {
            Ok(()) => Ok(()),
            Err(ClientError::AlreadyExists { .. }) => Err(Error::already_exists(&bucket_path)),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the bucket or key prefix at `path`, and everything under it.
    pub fn rmdir(&self, path: &BlobPath) -> Result<(), Error> {
        let (bucket, _) = Self::parts(path)?;
        if self.is_file(path)? {
            return Err(Error::NotADirectory {
                path: path.to_string(),
            });
        }
        if !self.is_dir(path)? {
            return Err(Error::not_found(path));
        }
        let (client, args) = self.config.resolve(path)?;
        let keys: Vec<String> = KeyIter::new(
            client.clone(),
            args.clone(),
            Some(bucket.clone()),
            Some(generate_prefix(path)?).filter(|p| !p.is_empty()),
            true,
        )
        .collect::<Result<_, _>>()?;
        let delete_args = args.filtered_for(Api::DeleteObject);
        for key in keys {
            client.delete_object(&bucket, &key, &delete_args)?;
        }
        if path.is_bucket() {
            client.delete_bucket(&bucket, &args.filtered_for(Api::DeleteBucket))?;
        }
        Ok(())
    }

    /// Remove the object at `path`.
    ///
    /// Prefixes and buckets are refused (is-a-directory); a missing key is
    /// a not-found error unless `missing_ok`.
    pub fn unlink(&self, path: &BlobPath, missing_ok: bool) -> Result<(), Error> {
        let (bucket, key) = Self::parts(path)?;
        // The delete call itself succeeds for prefixes and absent keys, so
        // guard explicitly to avoid silent data-shape surprises.
        if self.is_dir(path)? {
            if missing_ok {
                return Ok(());
            }
            return Err(Error::IsADirectory {
                path: path.to_string(),
            });
        }
        if !self.is_file(path)? {
            if missing_ok {
                return Ok(());
            }
            return Err(Error::not_found(path));
        }
        let (client, args) = self.config.resolve(path)?;
        client.delete_object(&bucket, &key, &args.filtered_for(Api::DeleteObject))?;
        Ok(())
    }

    /// Move a key, or every key under a prefix, to `target`.
    ///
    /// Existing objects at the target are replaced. Configuration is
    /// re-resolved for each copied target key, so cross-prefix moves pick
    /// up the target's client and arguments.
    pub fn rename(&self, path: &BlobPath, target: &BlobPath) -> Result<BlobPath, Error> {
        let (bucket, key) = Self::parts(path)?;
        let (target_bucket, target_key) = Self::parts(target)?;
        let (client, args) = self.config.resolve(path)?;

        if !self.is_dir(path)? {
            let (target_client, target_args) = self.config.resolve(target)?;
            target_client.copy_object(
                &bucket,
                &key,
                &target_bucket,
                &target_key,
                &target_args.filtered_for(Api::CopyObject),
            )?;
            client.delete_object(&bucket, &key, &args.filtered_for(Api::DeleteObject))?;
            return Ok(target.clone());
        }

        let keys: Vec<String> = KeyIter::new(
            client.clone(),
            args.clone(),
            Some(bucket.clone()),
            Some(key.clone()).filter(|k| !k.is_empty()),
            true,
        )
        .collect::<Result<_, _>>()?;
        let delete_args = args.filtered_for(Api::DeleteObject);
        for source_key in keys {
            let new_key = source_key.replacen(&key, &target_key, 1);
            let new_path = BlobPath::from_bucket_key(&target_bucket, &new_key)?;
            let (target_client, target_args) = self.config.resolve(&new_path)?;
            target_client.copy_object(
                &bucket,
                &source_key,
                &target_bucket,
                &new_key,
                &target_args.filtered_for(Api::CopyObject),
            )?;
            client.delete_object(&bucket, &source_key, &delete_args)?;
        }
        Ok(target.clone())
    }

    /// [`rename`](Self::rename) under its unconditional-replacement name.
    pub fn replace(&self, path: &BlobPath, target: &BlobPath) -> Result<BlobPath, Error> {
        self.rename(path, target)
    }

    /// The owner display name of the object at `path`.
    pub fn owner(&self, path: &BlobPath) -> Result<String, Error> {
        let (bucket, key) = Self::parts(path)?;
        if !self.is_file(path)? {
            return Err(Error::not_found(path));
        }
        let (client, args) = self.config.resolve(path)?;
        let mut list_args = args.filtered_for(Api::ListObjects);
        list_args.insert("FetchOwner", true);
        let request = ListObjectsRequest::new(&bucket)
            .prefix(key)
            .args(list_args);
        let page = client.list_objects(&request)?;
        page.contents
            .first()
            .and_then(|object| object.owner.clone())
            .ok_or_else(|| Error::not_found(path))
    }

    // Operations kept for interface conformance that object storage
    // cannot express. Each fails with the shared unsupported error; the
    // boolean probes (`is_symlink` and friends) live on `BlobPath` and
    // return `false` instead.

    /// Unsupported: object storage has no working directory.
    pub fn cwd(&self) -> Result<BlobPath, Error> {
        Err(Error::Unsupported { op: "cwd" })
    }

    /// Unsupported: object storage has no home directory.
    pub fn home(&self) -> Result<BlobPath, Error> {
        Err(Error::Unsupported { op: "home" })
    }

    /// Unsupported: object storage has no permission bits.
    pub fn chmod(&self, _path: &BlobPath, _mode: u32) -> Result<(), Error> {
        Err(Error::Unsupported { op: "chmod" })
    }

    /// Unsupported: object storage has no permission bits.
    pub fn lchmod(&self, _path: &BlobPath, _mode: u32) -> Result<(), Error> {
        Err(Error::Unsupported { op: "lchmod" })
    }

    /// Unsupported: object storage has no symlinks.
    pub fn symlink_to(&self, _path: &BlobPath, _target: &BlobPath) -> Result<(), Error> {
        Err(Error::Unsupported { op: "symlink_to" })
    }

    /// Unsupported: object storage has no hard links.
    pub fn hardlink_to(&self, _path: &BlobPath, _target: &BlobPath) -> Result<(), Error> {
        Err(Error::Unsupported { op: "hardlink_to" })
    }

    /// Unsupported: object storage has no links to read.
    pub fn readlink(&self, _path: &BlobPath) -> Result<BlobPath, Error> {
        Err(Error::Unsupported { op: "readlink" })
    }

    /// Unsupported: there is no link-free stat distinct from `stat`.
    pub fn lstat(&self, _path: &BlobPath) -> Result<ObjectStat, Error> {
        Err(Error::Unsupported { op: "lstat" })
    }

    /// Unsupported: paths have no links or mounts to resolve.
    pub fn canonicalize(&self, _path: &BlobPath) -> Result<BlobPath, Error> {
        Err(Error::Unsupported { op: "canonicalize" })
    }

    /// Unsupported: object storage has no user directories.
    pub fn expanduser(&self, _path: &BlobPath) -> Result<BlobPath, Error> {
        Err(Error::Unsupported { op: "expanduser" })
    }

    /// Unsupported: object storage has no group ownership.
    pub fn group(&self, _path: &BlobPath) -> Result<String, Error> {
        Err(Error::Unsupported { op: "group" })
    }
}

/// Iterator of child paths. See [`BlobStore::iterdir`].
pub struct IterDir {
    inner: ReadDir,
    base: BlobPath,
}

impl Iterator for IterDir {
    type Item = Result<BlobPath, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.next()? {
            Ok(entry) => Some(Ok(self.base.join(entry.name.as_str()))),
            Err(e) => Some(Err(e)),
        }
    }
}

/// Top-down walk over inferred directories. See [`BlobStore::walk`].
pub struct Walk<'a> {
    store: &'a BlobStore,
    pending: Vec<BlobPath>,
}

impl Iterator for Walk<'_> {
    type Item = Result<(BlobPath, Vec<String>, Vec<String>), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let dir = self.pending.pop()?;
        let entries: Result<Vec<DirEntry>, Error> = match self.store.read_dir(&dir) {
            Ok(iter) => iter.collect(),
            Err(e) => Err(e),
        };
        match entries {
            Ok(entries) => {
                let mut dirs = Vec::new();
                let mut files = Vec::new();
                for entry in entries {
                    if entry.is_dir {
                        dirs.push(entry.name);
                    } else {
                        files.push(entry.name);
                    }
                }
                // Depth-first: children are visited before siblings.
                for name in dirs.iter().rev() {
                    self.pending.push(dir.join(name.as_str()));
                }
                Some(Ok((dir, dirs, files)))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
