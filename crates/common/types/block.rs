use bytes::Bytes;
use ethereum_types::{Address, Bloom, H64, H256, U256};
use gethport_rlp::{
    decode::RLPDecode,
    encode::RLPEncode,
    error::RLPDecodeError,
    structs::{Decoder, Encoder},
};
use serde::{Deserialize, Serialize};

use crate::keccak;
use crate::types::{BlockHash, BlockNumber, Transaction};

/// A block header in the canonical pre-merge layout: fifteen fields,
/// hashed as the keccak-256 of its RLP encoding.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub parent_hash: H256,
    pub ommers_hash: H256,
    pub coinbase: Address,
    pub state_root: H256,
    pub transactions_root: H256,
    pub receipts_root: H256,
    pub logs_bloom: Bloom,
    pub difficulty: U256,
    pub number: BlockNumber,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub timestamp: u64,
    pub extra_data: Bytes,
    pub mix_hash: H256,
    pub nonce: H64,
}

impl BlockHeader {
    pub fn hash(&self) -> BlockHash {
        keccak(self.encode_to_vec())
    }
}

impl RLPEncode for BlockHeader {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        Encoder::new(buf)
            .encode_field(&self.parent_hash)
            .encode_field(&self.ommers_hash)
            .encode_field(&self.coinbase)
            .encode_field(&self.state_root)
            .encode_field(&self.transactions_root)
            .encode_field(&self.receipts_root)
            .encode_field(&self.logs_bloom)
            .encode_field(&self.difficulty)
            .encode_field(&self.number)
            .encode_field(&self.gas_limit)
            .encode_field(&self.gas_used)
            .encode_field(&self.timestamp)
            .encode_field(&self.extra_data)
            .encode_field(&self.mix_hash)
            .encode_field(&self.nonce)
            .finish();
    }
}

impl RLPDecode for BlockHeader {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let mut decoder = Decoder::new(rlp)?;
        let header = BlockHeader {
            parent_hash: decoder.decode_field("parent_hash")?,
            ommers_hash: decoder.decode_field("ommers_hash")?,
            coinbase: decoder.decode_field("coinbase")?,
            state_root: decoder.decode_field("state_root")?,
            transactions_root: decoder.decode_field("transactions_root")?,
            receipts_root: decoder.decode_field("receipts_root")?,
            logs_bloom: decoder.decode_field("logs_bloom")?,
            difficulty: decoder.decode_field("difficulty")?,
            number: decoder.decode_field("number")?,
            gas_limit: decoder.decode_field("gas_limit")?,
            gas_used: decoder.decode_field("gas_used")?,
            timestamp: decoder.decode_field("timestamp")?,
            extra_data: decoder.decode_field("extra_data")?,
            mix_hash: decoder.decode_field("mix_hash")?,
            nonce: decoder.decode_field("nonce")?,
        };
        Ok((header, decoder.finish()?))
    }
}

/// The transactions and ommers of a block, as geth stores them:
/// a two-element list of homogeneous lists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockBody {
    pub transactions: Vec<Transaction>,
    pub ommers: Vec<BlockHeader>,
}

impl RLPEncode for BlockBody {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        Encoder::new(buf)
            .encode_field(&self.transactions)
            .encode_field(&self.ommers)
            .finish();
    }
}

impl RLPDecode for BlockBody {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let mut decoder = Decoder::new(rlp)?;
        let body = BlockBody {
            transactions: decoder.decode_field("transactions")?,
            ommers: decoder.decode_field("ommers")?,
        };
        Ok((body, decoder.finish()?))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub body: BlockBody,
}

impl Block {
    pub fn new(header: BlockHeader, body: BlockBody) -> Self {
        Self { header, body }
    }

    pub fn hash(&self) -> BlockHash {
        self.header.hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    /// The mainnet genesis header, field by field. Its hash is the best
    /// known-answer test for header encoding.
    fn mainnet_genesis_header() -> BlockHeader {
        BlockHeader {
            parent_hash: H256::zero(),
            ommers_hash: H256(hex!(
                "1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347"
            )),
            coinbase: Address::zero(),
            state_root: H256(hex!(
                "d7f8974fb5ac78d9ac099b9ad5018bedc2ce0a72dad1827a1709da30580f0544"
            )),
            transactions_root: H256(hex!(
                "56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421"
            )),
            receipts_root: H256(hex!(
                "56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421"
            )),
            logs_bloom: Bloom::zero(),
            difficulty: U256::from(0x400000000u64),
            number: 0,
            gas_limit: 5000,
            gas_used: 0,
            timestamp: 0,
            extra_data: Bytes::copy_from_slice(&hex!(
                "11bbe8db4e347b4e8c937c1c8370e4b5ed33adb3db69cbdb7a38e1e50b1b82fa"
            )),
            mix_hash: H256::zero(),
            nonce: H64(hex!("0000000000000042")),
        }
    }

    #[test]
    fn mainnet_genesis_hash() {
        assert_eq!(
            mainnet_genesis_header().hash(),
            H256(hex!(
                "d4e56740f876aef8c010b86a40d5f56745a118d0906a34e69aec8c0db1cb8fa3"
            ))
        );
    }

    #[test]
    fn header_roundtrip() {
        let header = mainnet_genesis_header();
        let encoded = header.encode_to_vec();
        assert_eq!(BlockHeader::decode(&encoded).unwrap(), header);
    }

    #[test]
    fn body_roundtrip() {
        let body = BlockBody {
            transactions: vec![Transaction {
                nonce: 3,
                gas_price: U256::from(20_000_000_000u64),
                gas: 21_000,
                to: Some(Address::from_low_u64_be(0xcafe)),
                value: U256::from(10).pow(U256::from(18)),
                data: Bytes::new(),
                v: U256::from(27),
                r: U256::from(1) << 250,
                s: U256::from(2) << 250,
            }],
            ommers: vec![mainnet_genesis_header()],
        };
        let encoded = body.encode_to_vec();
        assert_eq!(BlockBody::decode(&encoded).unwrap(), body);
    }

    #[test]
    fn empty_body_is_two_empty_lists() {
        assert_eq!(BlockBody::default().encode_to_vec(), vec![0xc2, 0xc0, 0xc0]);
    }
}
