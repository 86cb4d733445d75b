use std::path::PathBuf;

use gethport_rlp::error::RLPDecodeError;
use gethport_storage::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GethDbError {
    #[error("Unsupported geth database version {0}")]
    UnsupportedVersion(u64),
    #[error("Missing freezer shard: {0}")]
    MissingShard(PathBuf),
    #[error("Corrupt freezer table: {0}")]
    Corrupt(String),
    #[error("Freezer item {index} out of range, table holds {entries} entries")]
    OutOfRange { index: u64, entries: u64 },
    #[error("Missing chain data: {0}")]
    MissingData(String),
    #[error("Malformed chain data: {0}")]
    Malformed(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("RLP decode error: {0}")]
    RLPDecode(#[from] RLPDecodeError),
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),
}
