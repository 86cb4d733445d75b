use bytes::{BufMut, Bytes};
use ethereum_types::{Address, Bloom, H64, H256, U256};

use super::constants::{RLP_EMPTY_LIST, RLP_NULL};

/// Trait for types that can be RLP-encoded.
pub trait RLPEncode {
    fn encode(&self, buf: &mut dyn BufMut);

    fn encode_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode(&mut buf);
        buf
    }
}

/// Writes the length prefix for a string or list payload.
/// `short_base` is 0x80 for strings and 0xc0 for lists.
fn put_length(buf: &mut dyn BufMut, short_base: u8, len: usize) {
    if len < 56 {
        buf.put_u8(short_base + len as u8);
    } else {
        let be = len.to_be_bytes();
        let start = be.iter().position(|&b| b != 0).unwrap_or(be.len() - 1);
        // 0xb7 / 0xf7 are the long-form bases, 55 above the short ones
        buf.put_u8(short_base + 55 + (be.len() - start) as u8);
        buf.put_slice(&be[start..]);
    }
}

/// Writes a list header for a payload of `payload_len` bytes.
pub fn encode_length(payload_len: usize, buf: &mut dyn BufMut) {
    put_length(buf, RLP_EMPTY_LIST, payload_len);
}

fn encode_integer_be<const N: usize>(value_be: [u8; N], buf: &mut dyn BufMut) {
    let Some(first) = value_be.iter().position(|&b| b != 0) else {
        // zero is the empty string
        buf.put_u8(RLP_NULL);
        return;
    };
    if first == N - 1 && value_be[first] <= 0x7f {
        // a single byte in [0x00, 0x7f] is its own encoding
        buf.put_u8(value_be[first]);
    } else {
        buf.put_u8(RLP_NULL + (N - first) as u8);
        buf.put_slice(&value_be[first..]);
    }
}

impl RLPEncode for bool {
    fn encode(&self, buf: &mut dyn BufMut) {
        if *self {
            buf.put_u8(0x01);
        } else {
            buf.put_u8(RLP_NULL);
        }
    }
}

impl RLPEncode for u8 {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_integer_be(self.to_be_bytes(), buf);
    }
}

impl RLPEncode for u16 {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_integer_be(self.to_be_bytes(), buf);
    }
}

impl RLPEncode for u32 {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_integer_be(self.to_be_bytes(), buf);
    }
}

impl RLPEncode for u64 {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_integer_be(self.to_be_bytes(), buf);
    }
}

impl RLPEncode for usize {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_integer_be(self.to_be_bytes(), buf);
    }
}

impl RLPEncode for [u8] {
    fn encode(&self, buf: &mut dyn BufMut) {
        if self.len() == 1 && self[0] < RLP_NULL {
            buf.put_u8(self[0]);
        } else {
            put_length(buf, RLP_NULL, self.len());
            buf.put_slice(self);
        }
    }
}

impl<const N: usize> RLPEncode for [u8; N] {
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_ref().encode(buf)
    }
}

impl RLPEncode for str {
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_bytes().encode(buf)
    }
}

impl RLPEncode for String {
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_bytes().encode(buf)
    }
}

impl RLPEncode for Bytes {
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_ref().encode(buf)
    }
}

impl RLPEncode for H64 {
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_bytes().encode(buf)
    }
}

impl RLPEncode for H256 {
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_bytes().encode(buf)
    }
}

impl RLPEncode for Address {
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_bytes().encode(buf)
    }
}

impl RLPEncode for Bloom {
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_bytes().encode(buf)
    }
}

impl RLPEncode for U256 {
    fn encode(&self, buf: &mut dyn BufMut) {
        let leading_zeros_in_bytes = (self.leading_zeros() / 8) as usize;
        let bytes = self.to_big_endian();
        bytes[leading_zeros_in_bytes..].encode(buf)
    }
}

impl<T: RLPEncode> RLPEncode for Vec<T> {
    fn encode(&self, buf: &mut dyn BufMut) {
        if self.is_empty() {
            buf.put_u8(RLP_EMPTY_LIST);
            return;
        }
        let mut payload = Vec::new();
        for item in self {
            item.encode(&mut payload);
        }
        encode_length(payload.len(), buf);
        buf.put_slice(&payload);
    }
}

impl<T: RLPEncode + ?Sized> RLPEncode for &T {
    fn encode(&self, buf: &mut dyn BufMut) {
        (*self).encode(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn encode_integers() {
        assert_eq!(0u64.encode_to_vec(), vec![0x80]);
        assert_eq!(1u64.encode_to_vec(), vec![0x01]);
        assert_eq!(0x7fu64.encode_to_vec(), vec![0x7f]);
        assert_eq!(0x80u64.encode_to_vec(), vec![0x81, 0x80]);
        assert_eq!(1024u64.encode_to_vec(), vec![0x82, 0x04, 0x00]);
    }

    #[test]
    fn encode_strings() {
        assert_eq!("dog".encode_to_vec(), vec![0x83, b'd', b'o', b'g']);
        assert_eq!("".encode_to_vec(), vec![0x80]);
        let long = "Lorem ipsum dolor sit amet, consectetur adipisicing elit";
        let mut expected = vec![0xb8, 0x38];
        expected.extend_from_slice(long.as_bytes());
        assert_eq!(long.encode_to_vec(), expected);
    }

    #[test]
    fn encode_hashes() {
        let hash = H256(hex!(
            "d4e56740f876aef8c010b86a40d5f56745a118d0906a34e69aec8c0db1cb8fa3"
        ));
        let mut expected = vec![0xa0];
        expected.extend_from_slice(hash.as_bytes());
        assert_eq!(hash.encode_to_vec(), expected);
    }

    #[test]
    fn encode_u256() {
        assert_eq!(U256::zero().encode_to_vec(), vec![0x80]);
        assert_eq!(U256::from(127).encode_to_vec(), vec![0x7f]);
        assert_eq!(U256::from(0x0400).encode_to_vec(), vec![0x82, 0x04, 0x00]);
    }

    #[test]
    fn encode_list() {
        let list: Vec<u64> = vec![1, 2, 3];
        assert_eq!(list.encode_to_vec(), vec![0xc3, 0x01, 0x02, 0x03]);
        let empty: Vec<u64> = vec![];
        assert_eq!(empty.encode_to_vec(), vec![0xc0]);
    }
}
