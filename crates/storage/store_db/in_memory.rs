use std::{
    collections::BTreeMap,
    ops::Bound,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{api::StoreEngine, error::StoreError};

/// In-memory implementation of [`StoreEngine`], backed by a shared ordered map.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    inner: Arc<Mutex<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> Result<MutexGuard<'_, BTreeMap<Vec<u8>, Vec<u8>>>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::LockError)
    }
}

impl StoreEngine for InMemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.inner()?.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.inner()?.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn scan_range(
        &self,
        start: &[u8],
        stop: &[u8],
        visit: &mut dyn FnMut(&[u8], &[u8]) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let map = self.inner()?;
        for (key, value) in map.range::<[u8], _>((Bound::Included(start), Bound::Included(stop))) {
            visit(key, value)?;
        }
        Ok(())
    }
}
