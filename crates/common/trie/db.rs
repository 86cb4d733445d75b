use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use ethereum_types::H256;

use crate::{error::TrieError, keccak};

/// Read access to a flat hash -> node-bytes map.
pub trait NodeSource {
    fn get_node(&self, hash: H256) -> Result<Option<Vec<u8>>, TrieError>;
}

/// A node source that can also be written to.
pub trait NodeStore: NodeSource {
    fn put_node(&self, hash: H256, node: Vec<u8>) -> Result<(), TrieError>;
}

/// In-memory implementation of [`NodeStore`], backed by a shared map.
#[derive(Default, Clone)]
pub struct InMemoryNodeStore {
    inner: Arc<Mutex<HashMap<H256, Vec<u8>>>>,
}

impl InMemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NodeSource for InMemoryNodeStore {
    fn get_node(&self, hash: H256) -> Result<Option<Vec<u8>>, TrieError> {
        Ok(self
            .inner
            .lock()
            .map_err(|_| TrieError::LockError)?
            .get(&hash)
            .cloned())
    }
}

impl NodeStore for InMemoryNodeStore {
    fn put_node(&self, hash: H256, node: Vec<u8>) -> Result<(), TrieError> {
        self.inner
            .lock()
            .map_err(|_| TrieError::LockError)?
            .insert(hash, node);
        Ok(())
    }
}

/// A read-through copier: every node fetched from `source` is mirrored into
/// `destination` before being returned, so repeated walks converge the
/// destination towards holding every node visited.
///
/// A miss in the source is fatal ([`TrieError::MissingNode`]); crash safety
/// is the destination's problem, as re-running a walk is idempotent.
pub struct CopyOnReadDb<'a> {
    source: &'a dyn NodeSource,
    destination: &'a dyn NodeStore,
}

impl<'a> CopyOnReadDb<'a> {
    pub fn new(source: &'a dyn NodeSource, destination: &'a dyn NodeStore) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Fetches a node, failing if it exists in neither store.
    /// Fetching is enough to copy it across.
    pub fn require(&self, hash: H256) -> Result<Vec<u8>, TrieError> {
        self.get_node(hash)?.ok_or(TrieError::MissingNode(hash))
    }
}

impl NodeSource for CopyOnReadDb<'_> {
    fn get_node(&self, hash: H256) -> Result<Option<Vec<u8>>, TrieError> {
        if let Some(value) = self.destination.get_node(hash)? {
            return Ok(Some(verified(hash, value)?));
        }
        let value = self
            .source
            .get_node(hash)?
            .ok_or(TrieError::MissingNode(hash))?;
        let value = verified(hash, value)?;
        self.destination.put_node(hash, value.clone())?;
        Ok(Some(value))
    }
}

/// Everything in the copied key space is content-addressed, contract code
/// included, so a value that does not hash to its key is corruption.
fn verified(expected: H256, value: Vec<u8>) -> Result<Vec<u8>, TrieError> {
    let actual = keccak(&value);
    if actual != expected {
        return Err(TrieError::IntegrityError { expected, actual });
    }
    Ok(value)
}
