use ethereum_types::H256;
use gethport_rlp::error::RLPDecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrieError {
    #[error(transparent)]
    RLPDecode(#[from] RLPDecodeError),
    #[error("Node with hash {0:#x} not found")]
    MissingNode(H256),
    #[error("Node fetched for hash {expected:#x} hashes to {actual:#x}")]
    IntegrityError { expected: H256, actual: H256 },
    #[error("Lock Error: Panicked when trying to acquire a lock")]
    LockError,
    #[error("Database error: {0}")]
    DbError(anyhow::Error),
}
