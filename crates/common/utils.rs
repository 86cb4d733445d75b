use ethereum_types::H256;
use sha3::{Digest, Keccak256};

/// Keccak-256 digest of `data` as an `H256`.
pub fn keccak(data: impl AsRef<[u8]>) -> H256 {
    H256::from_slice(Keccak256::new().chain_update(data).finalize().as_slice())
}
