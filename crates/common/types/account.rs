use ethereum_types::{H256, U256};
use gethport_rlp::{
    decode::RLPDecode,
    encode::RLPEncode,
    error::RLPDecodeError,
    structs::{Decoder, Encoder},
};
use serde::{Deserialize, Serialize};

/// The state-trie leaf payload for an account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub nonce: u64,
    pub balance: U256,
    pub storage_root: H256,
    pub code_hash: H256,
}

impl RLPEncode for AccountState {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        Encoder::new(buf)
            .encode_field(&self.nonce)
            .encode_field(&self.balance)
            .encode_field(&self.storage_root)
            .encode_field(&self.code_hash)
            .finish();
    }
}

impl RLPDecode for AccountState {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let mut decoder = Decoder::new(rlp)?;
        let account = AccountState {
            nonce: decoder.decode_field("nonce")?,
            balance: decoder.decode_field("balance")?,
            storage_root: decoder.decode_field("storage_root")?,
            code_hash: decoder.decode_field("code_hash")?,
        };
        Ok((account, decoder.finish()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::EMPTY_KECCACK_HASH;
    use hex_literal::hex;

    #[test]
    fn roundtrip() {
        let account = AccountState {
            nonce: 12,
            balance: U256::from(10).pow(U256::from(20)),
            storage_root: H256(hex!(
                "56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421"
            )),
            code_hash: *EMPTY_KECCACK_HASH,
        };
        assert_eq!(
            AccountState::decode(&account.encode_to_vec()).unwrap(),
            account
        );
    }
}
