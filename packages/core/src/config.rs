//! Hierarchical configuration resolution.
//!
//! A [`ConfigMap`] associates path prefixes with a client handle and/or a
//! bag of argument overrides. Resolution walks from the root towards the
//! queried path and keeps the deepest explicit value for each of the two
//! fields independently, so a handle registered at `/bucket` composes with
//! arguments registered at `/`.
//!
//! The map is an explicitly constructed context object owned by its
//! [`BlobStore`](crate::BlobStore) (or by the caller directly); there is no
//! process-wide registry.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use blobpath_client::{CallArgs, ClientHandle};

use crate::error::Error;
use crate::path::{BlobPath, PathError};

type Factory = Box<dyn Fn() -> ClientHandle + Send + Sync>;

/// One trie node: optional explicit values plus children per segment.
#[derive(Default)]
struct Node {
    client: Option<ClientHandle>,
    arguments: Option<CallArgs>,
    children: BTreeMap<String, Node>,
}

struct MapState {
    is_setup: bool,
    root: Node,
    // Memoized resolutions keyed by exact path string; cleared on every
    // registration.
    cache: HashMap<String, (ClientHandle, CallArgs)>,
}

/// Longest-prefix-wins lookup from path prefixes to (client, arguments).
///
/// The root entry is installed lazily on first use: the default client
/// comes from the factory given at construction, paired with empty
/// arguments. Setup happens exactly once, under the same lock that guards
/// registration, so concurrent first access is safe.
pub struct ConfigMap {
    factory: Factory,
    state: Mutex<MapState>,
}

impl ConfigMap {
    /// A map whose root defaults to `default`.
    pub fn new(default: ClientHandle) -> Self {
        Self::with_factory(move || default.clone())
    }

    /// A map whose root default is produced on first use.
    pub fn with_factory(factory: impl Fn() -> ClientHandle + Send + Sync + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            state: Mutex::new(MapState {
                is_setup: false,
                root: Node::default(),
                cache: HashMap::new(),
            }),
        }
    }

    fn delayed_setup(state: &mut MapState, factory: &Factory) {
        if !state.is_setup {
            state.root.client = Some(factory());
            state.root.arguments = Some(CallArgs::new());
            state.is_setup = true;
        }
    }

    /// Store `client` and/or `arguments` at the exact prefix `path`.
    ///
    /// At least one of the two must be given, and the path must be
    /// absolute. Registration atomically invalidates every memoized
    /// resolution.
    pub fn register(
        &self,
        path: &BlobPath,
        client: Option<ClientHandle>,
        arguments: Option<CallArgs>,
    ) -> Result<(), Error> {
        if client.is_none() && arguments.is_none() {
            return Err(Error::MissingConfiguration);
        }
        if !path.is_absolute() {
            return Err(PathError::NotAbsolute.into());
        }

        let mut state = self.state.lock().expect("configuration map lock poisoned");
        Self::delayed_setup(&mut state, &self.factory);

        let mut node = &mut state.root;
        for segment in path.segments() {
            node = node.children.entry(segment.clone()).or_default();
        }
        if client.is_some() {
            node.client = client;
        }
        if arguments.is_some() {
            node.arguments = arguments;
        }
        state.cache.clear();
        log::debug!("registered configuration at {}", path);
        Ok(())
    }

    /// The (client, arguments) pair governing `path`.
    ///
    /// Each field comes from the nearest ancestor (the path itself
    /// included) holding an explicit value; the two may come from
    /// different levels. Results are memoized per exact path until the
    /// next registration.
    pub fn resolve(&self, path: &BlobPath) -> Result<(ClientHandle, CallArgs), Error> {
        if !path.is_absolute() {
            return Err(PathError::NotAbsolute.into());
        }

        let mut state = self.state.lock().expect("configuration map lock poisoned");
        Self::delayed_setup(&mut state, &self.factory);

        let cache_key = path.to_string();
        if let Some(resolved) = state.cache.get(&cache_key) {
            return Ok(resolved.clone());
        }

        let mut client = state.root.client.clone();
        let mut arguments = state.root.arguments.clone();
        let mut node = &state.root;
        for segment in path.segments() {
            match node.children.get(segment) {
                Some(child) => {
                    node = child;
                    if child.client.is_some() {
                        client = child.client.clone();
                    }
                    if child.arguments.is_some() {
                        arguments = child.arguments.clone();
                    }
                }
                None => break,
            }
        }

        let resolved = (
            client.expect("root client installed by setup"),
            arguments.expect("root arguments installed by setup"),
        );
        state.cache.insert(cache_key, resolved.clone());
        Ok(resolved)
    }
}
