use bytes::Bytes;
use ethereum_types::{Address, Bloom, H64, H256, U256};

use super::{
    constants::{RLP_EMPTY_LIST, RLP_NULL},
    error::RLPDecodeError,
};

/// Max payload size accepted when decoding. There are no well-formed items in
/// a chain database anywhere near this size, so larger claims are corruption.
const MAX_RLP_BYTES: usize = 1024 * 1024 * 1024;

/// Trait for decoding RLP encoded slices of data.
///
/// Implementors provide [`decode_unfinished`](RLPDecode::decode_unfinished),
/// which returns the decoded value along with the bytes remaining after it.
/// Consumers normally call [`decode`](RLPDecode::decode), which additionally
/// requires the input to be fully consumed.
pub trait RLPDecode: Sized {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError>;

    fn decode(rlp: &[u8]) -> Result<Self, RLPDecodeError> {
        let (decoded, remaining) = Self::decode_unfinished(rlp)?;
        if !remaining.is_empty() {
            return Err(RLPDecodeError::InvalidLength);
        }
        Ok(decoded)
    }
}

/// Splits the first RLP item off `data`.
///
/// Returns `(is_list, payload, remaining)` where `payload` excludes the
/// prefix and `remaining` is everything after the item.
pub fn decode_rlp_item(data: &[u8]) -> Result<(bool, &[u8], &[u8]), RLPDecodeError> {
    let first_byte = *data.first().ok_or(RLPDecodeError::InvalidLength)?;

    match first_byte {
        0..=0x7f => Ok((false, &data[..1], &data[1..])),
        0x80..=0xb7 => {
            let length = (first_byte - RLP_NULL) as usize;
            if data.len() < length + 1 {
                return Err(RLPDecodeError::InvalidLength);
            }
            Ok((false, &data[1..length + 1], &data[length + 1..]))
        }
        0xb8..=0xbf => {
            let (length, header_len) = decode_long_length(first_byte - 0xb7, data)?;
            Ok((
                false,
                &data[header_len..header_len + length],
                &data[header_len + length..],
            ))
        }
        RLP_EMPTY_LIST..=0xf7 => {
            let length = (first_byte - RLP_EMPTY_LIST) as usize;
            if data.len() < length + 1 {
                return Err(RLPDecodeError::InvalidLength);
            }
            Ok((true, &data[1..length + 1], &data[length + 1..]))
        }
        0xf8..=0xff => {
            let (length, header_len) = decode_long_length(first_byte - 0xf7, data)?;
            Ok((
                true,
                &data[header_len..header_len + length],
                &data[header_len + length..],
            ))
        }
    }
}

/// Decodes the payload length of a long-form item whose prefix claims
/// `length_of_length` length bytes. Returns `(payload_length, header_length)`.
fn decode_long_length(length_of_length: u8, data: &[u8]) -> Result<(usize, usize), RLPDecodeError> {
    let length_of_length = length_of_length as usize;
    if data.len() < length_of_length + 1 {
        return Err(RLPDecodeError::InvalidLength);
    }
    let length = usize::from_be_bytes(static_left_pad(&data[1..length_of_length + 1])?);
    if length > MAX_RLP_BYTES || data.len() < length_of_length + length + 1 {
        return Err(RLPDecodeError::InvalidLength);
    }
    Ok((length, length_of_length + 1))
}

/// Splits the first RLP item off `data`, keeping its prefix.
///
/// Returns `(item_with_prefix, remaining)`.
pub fn get_item_with_prefix(data: &[u8]) -> Result<(&[u8], &[u8]), RLPDecodeError> {
    let (_, _, remaining) = decode_rlp_item(data)?;
    let item_len = data.len() - remaining.len();
    Ok((&data[..item_len], remaining))
}

/// Decodes the payload of an RLP string item.
/// Fails with `UnexpectedList` if the item is a list.
pub fn decode_bytes(data: &[u8]) -> Result<(&[u8], &[u8]), RLPDecodeError> {
    let (is_list, payload, rest) = decode_rlp_item(data)?;
    if is_list {
        return Err(RLPDecodeError::UnexpectedList);
    }
    Ok((payload, rest))
}

/// Pads a slice with zeros on the left up to a fixed size.
/// Rejects inputs that are too long or carry leading zeros.
pub fn static_left_pad<const N: usize>(data: &[u8]) -> Result<[u8; N], RLPDecodeError> {
    let mut padded = [0; N];
    if data.is_empty() {
        return Ok(padded);
    }
    if data[0] == 0 {
        return Err(RLPDecodeError::MalformedData);
    }
    if data.len() > N {
        return Err(RLPDecodeError::InvalidLength);
    }
    padded[N - data.len()..].copy_from_slice(data);
    Ok(padded)
}

impl RLPDecode for bool {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let first = *rlp.first().ok_or(RLPDecodeError::InvalidLength)?;
        let value = match first {
            RLP_NULL => false,
            0x01 => true,
            b => return Err(RLPDecodeError::MalformedBoolean(b)),
        };
        Ok((value, &rlp[1..]))
    }
}

macro_rules! impl_rlp_decode_integer {
    ($($t:ty),*) => {
        $(impl RLPDecode for $t {
            fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
                let (bytes, rest) = decode_bytes(rlp)?;
                Ok((<$t>::from_be_bytes(static_left_pad(bytes)?), rest))
            }
        })*
    };
}

impl_rlp_decode_integer!(u8, u16, u32, u64, usize);

impl<const N: usize> RLPDecode for [u8; N] {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        let value = bytes
            .try_into()
            .map_err(|_| RLPDecodeError::InvalidLength)?;
        Ok((value, rest))
    }
}

impl RLPDecode for Bytes {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        Ok((Bytes::copy_from_slice(bytes), rest))
    }
}

impl RLPDecode for H64 {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (value, rest) = <[u8; 8]>::decode_unfinished(rlp)?;
        Ok((H64(value), rest))
    }
}

impl RLPDecode for H256 {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (value, rest) = <[u8; 32]>::decode_unfinished(rlp)?;
        Ok((H256(value), rest))
    }
}

impl RLPDecode for Address {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (value, rest) = <[u8; 20]>::decode_unfinished(rlp)?;
        Ok((Address::from(value), rest))
    }
}

impl RLPDecode for Bloom {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (value, rest) = <[u8; 256]>::decode_unfinished(rlp)?;
        Ok((Bloom(value), rest))
    }
}

impl RLPDecode for U256 {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        if bytes.len() > 32 {
            return Err(RLPDecodeError::InvalidLength);
        }
        if bytes.first() == Some(&0) {
            return Err(RLPDecodeError::MalformedData);
        }
        Ok((U256::from_big_endian(bytes), rest))
    }
}

impl<T: RLPDecode> RLPDecode for Vec<T> {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (is_list, payload, rest) = decode_rlp_item(rlp)?;
        if !is_list {
            return Err(RLPDecodeError::UnexpectedString);
        }
        let mut items = Vec::new();
        let mut remaining = payload;
        while !remaining.is_empty() {
            let (item, rem) = T::decode_unfinished(remaining)?;
            items.push(item);
            remaining = rem;
        }
        Ok((items, rest))
    }
}
