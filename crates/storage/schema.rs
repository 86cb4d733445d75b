//! Byte-key layout of a geth chain database, from go-ethereum's
//! `core/rawdb/schema.go`. Pure builders; nothing here touches a store.

use gethport_common::types::{BlockHash, BlockNumber};

/// Key of the RLP-encoded database version integer.
pub const DATABASE_VERSION_KEY: &[u8] = b"DatabaseVersion";

/// Key of the 32-byte hash of the canonical head block.
pub const HEAD_BLOCK_KEY: &[u8] = b"LastBlock";

/// The single database version this schema describes. Anything else is a
/// layout we have never seen and must not guess at.
pub const SUPPORTED_DATABASE_VERSION: u64 = 7;

const HEADER_PREFIX: u8 = b'h';
const HEADER_NUMBER_PREFIX: u8 = b'H';
const HEADER_HASH_SUFFIX: u8 = b'n';
const BLOCK_BODY_PREFIX: u8 = b'b';
const BLOCK_RECEIPTS_PREFIX: u8 = b'r';

/// `'h' || number || 'n'`: the canonical hash at a given height.
pub fn canonical_hash_key(number: BlockNumber) -> Vec<u8> {
    let mut key = Vec::with_capacity(10);
    key.push(HEADER_PREFIX);
    key.extend_from_slice(&number.to_be_bytes());
    key.push(HEADER_HASH_SUFFIX);
    key
}

/// `'H' || hash`: the 8-byte big-endian number of the header with this hash.
pub fn header_number_key(hash: &BlockHash) -> Vec<u8> {
    let mut key = Vec::with_capacity(33);
    key.push(HEADER_NUMBER_PREFIX);
    key.extend_from_slice(hash.as_bytes());
    key
}

/// `'h' || number || hash`: the RLP-encoded header.
pub fn header_key(number: BlockNumber, hash: &BlockHash) -> Vec<u8> {
    prefixed_number_hash_key(HEADER_PREFIX, number, hash)
}

/// `'b' || number || hash`: the RLP-encoded block body.
pub fn block_body_key(number: BlockNumber, hash: &BlockHash) -> Vec<u8> {
    prefixed_number_hash_key(BLOCK_BODY_PREFIX, number, hash)
}

/// `'r' || number || hash`: the RLP-encoded receipt list.
pub fn block_receipts_key(number: BlockNumber, hash: &BlockHash) -> Vec<u8> {
    prefixed_number_hash_key(BLOCK_RECEIPTS_PREFIX, number, hash)
}

fn prefixed_number_hash_key(prefix: u8, number: BlockNumber, hash: &BlockHash) -> Vec<u8> {
    let mut key = Vec::with_capacity(41);
    key.push(prefix);
    key.extend_from_slice(&number.to_be_bytes());
    key.extend_from_slice(hash.as_bytes());
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::H256;

    #[test]
    fn key_shapes() {
        let hash = H256::repeat_byte(0xab);
        assert_eq!(
            canonical_hash_key(0x0102),
            [b"h".as_ref(), &[0, 0, 0, 0, 0, 0, 1, 2], b"n"].concat()
        );
        assert_eq!(
            header_number_key(&hash),
            [b"H".as_ref(), hash.as_bytes()].concat()
        );
        let header = header_key(5, &hash);
        assert_eq!(header.len(), 41);
        assert_eq!(header[0], b'h');
        assert_eq!(&header[1..9], &5u64.to_be_bytes());
        assert_eq!(&header[9..], hash.as_bytes());
        assert_eq!(block_body_key(5, &hash)[0], b'b');
        assert_eq!(block_receipts_key(5, &hash)[0], b'r');
    }
}
