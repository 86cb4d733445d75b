use gethport_rlp::error::RLPDecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Lock Error: Panicked when trying to acquire a lock")]
    LockError,
    #[error("Redb error: {0}")]
    RedbError(#[from] redb::Error),
    #[error("RLP decode error: {0}")]
    RLPDecode(#[from] RLPDecodeError),
    #[error("Missing store data: {0}")]
    MissingData(&'static str),
    #[error("{0}")]
    Custom(String),
}
