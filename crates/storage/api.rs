use crate::error::StoreError;

/// Thin adapter over a sorted key/value engine.
///
/// Engines allow concurrent readers; writers are serialized by the caller.
/// The only atomicity requirement is that a single `put` is atomic.
pub trait StoreEngine: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// Visits every entry with `start <= key <= stop` in key order.
    fn scan_range(
        &self,
        start: &[u8],
        stop: &[u8],
        visit: &mut dyn FnMut(&[u8], &[u8]) -> Result<(), StoreError>,
    ) -> Result<(), StoreError>;
}
