use ethereum_types::H256;
use gethport_common::types::{BlockHash, BlockNumber};
use gethport_gethdb::GethDbError;
use gethport_rlp::error::RLPDecodeError;
use gethport_storage::StoreError;
use gethport_trie::TrieError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error(
        "Source and destination disagree at block {number}: source has {source_hash:#x}, destination has {destination:#x}"
    )]
    ChainDivergence {
        number: BlockNumber,
        source_hash: BlockHash,
        destination: BlockHash,
    },
    #[error(
        "Transactions root {computed:#x} recomputed for block {number} does not match header root {expected:#x}"
    )]
    BodyRootMismatch {
        number: BlockNumber,
        computed: H256,
        expected: H256,
    },
    #[error("Block {0} failed validation: {1}")]
    InvalidBlock(BlockNumber, String),
    #[error("Geth database error: {0}")]
    GethDb(#[from] GethDbError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Trie error: {0}")]
    Trie(#[from] TrieError),
    #[error("RLP decode error: {0}")]
    RLPDecode(#[from] RLPDecodeError),
}
