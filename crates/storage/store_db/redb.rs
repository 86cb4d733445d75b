use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};

use crate::{api::StoreEngine, error::StoreError};

const CHAIN_DATA_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("ChainData");

/// On-disk implementation of [`StoreEngine`] over a single redb table.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Opens the database at `path`, creating it (and the table) if absent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::create(path).map_err(|e| StoreError::RedbError(e.into()))?;
        // make sure the table exists so later read transactions can open it
        let txn = db.begin_write().map_err(|e| StoreError::RedbError(e.into()))?;
        txn.open_table(CHAIN_DATA_TABLE)
            .map_err(|e| StoreError::RedbError(e.into()))?;
        txn.commit().map_err(|e| StoreError::RedbError(e.into()))?;
        Ok(Self { db })
    }

    /// Runs the engine's offline compaction. Do this after a bulk import, or
    /// the database will pick its own moment.
    pub fn compact(&mut self) -> Result<(), StoreError> {
        self.db
            .compact()
            .map_err(|e| StoreError::Custom(format!("compaction failed: {e}")))?;
        Ok(())
    }
}

impl StoreEngine for RedbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| StoreError::RedbError(e.into()))?;
        let table = txn
            .open_table(CHAIN_DATA_TABLE)
            .map_err(|e| StoreError::RedbError(e.into()))?;
        let value = table
            .get(key)
            .map_err(|e| StoreError::RedbError(e.into()))?;
        Ok(value.map(|guard| guard.value().to_vec()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let txn = self
            .db
            .begin_write()
            .map_err(|e| StoreError::RedbError(e.into()))?;
        {
            let mut table = txn
                .open_table(CHAIN_DATA_TABLE)
                .map_err(|e| StoreError::RedbError(e.into()))?;
            table
                .insert(key, value)
                .map_err(|e| StoreError::RedbError(e.into()))?;
        }
        txn.commit().map_err(|e| StoreError::RedbError(e.into()))?;
        Ok(())
    }

    fn scan_range(
        &self,
        start: &[u8],
        stop: &[u8],
        visit: &mut dyn FnMut(&[u8], &[u8]) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| StoreError::RedbError(e.into()))?;
        let table = txn
            .open_table(CHAIN_DATA_TABLE)
            .map_err(|e| StoreError::RedbError(e.into()))?;
        let range = table
            .range(start..=stop)
            .map_err(|e| StoreError::RedbError(e.into()))?;
        for entry in range {
            let (key, value) = entry.map_err(|e| StoreError::RedbError(e.into()))?;
            visit(key.value(), value.value())?;
        }
        Ok(())
    }
}
