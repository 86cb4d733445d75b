use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use gethport_rlp::{
    decode::RLPDecode,
    encode::RLPEncode,
    error::RLPDecodeError,
    structs::{Decoder, Encoder},
};
use serde::{Deserialize, Serialize};

use crate::keccak;

/// A legacy transaction: the nine-field form stored in block bodies.
/// `to` is `None` for contract creations, encoded as the empty string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
    pub v: U256,
    pub r: U256,
    pub s: U256,
}

impl Transaction {
    pub fn hash(&self) -> H256 {
        keccak(self.encode_to_vec())
    }
}

impl RLPEncode for Transaction {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        let encoder = Encoder::new(buf)
            .encode_field(&self.nonce)
            .encode_field(&self.gas_price)
            .encode_field(&self.gas);
        let encoder = match &self.to {
            Some(address) => encoder.encode_field(address),
            None => encoder.encode_bytes(&[]),
        };
        encoder
            .encode_field(&self.value)
            .encode_field(&self.data)
            .encode_field(&self.v)
            .encode_field(&self.r)
            .encode_field(&self.s)
            .finish();
    }
}

impl RLPDecode for Transaction {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let mut decoder = Decoder::new(rlp)?;
        let nonce = decoder.decode_field("nonce")?;
        let gas_price = decoder.decode_field("gas_price")?;
        let gas = decoder.decode_field("gas")?;
        let to_bytes: Bytes = decoder.decode_field("to")?;
        let to = match to_bytes.len() {
            0 => None,
            20 => Some(Address::from_slice(&to_bytes)),
            _ => {
                return Err(RLPDecodeError::Custom(
                    "transaction 'to' must be empty or 20 bytes".to_string(),
                ));
            }
        };
        let tx = Transaction {
            nonce,
            gas_price,
            gas,
            to,
            value: decoder.decode_field("value")?,
            data: decoder.decode_field("data")?,
            v: decoder.decode_field("v")?,
            r: decoder.decode_field("r")?,
            s: decoder.decode_field("s")?,
        };
        Ok((tx, decoder.finish()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(to: Option<Address>) -> Transaction {
        Transaction {
            nonce: 9,
            gas_price: U256::from(20_000_000_000u64),
            gas: 21_000,
            to,
            value: U256::from(1_000_000_000u64),
            data: Bytes::copy_from_slice(b"\x60\x01"),
            v: U256::from(28),
            r: U256::from(11),
            s: U256::from(22),
        }
    }

    #[test]
    fn roundtrip_with_recipient() {
        let tx = sample(Some(Address::from_low_u64_be(7)));
        assert_eq!(Transaction::decode(&tx.encode_to_vec()).unwrap(), tx);
    }

    #[test]
    fn roundtrip_contract_creation() {
        let tx = sample(None);
        assert_eq!(Transaction::decode(&tx.encode_to_vec()).unwrap(), tx);
    }
}
