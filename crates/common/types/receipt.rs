use bytes::Bytes;
use gethport_rlp::{
    decode::{RLPDecode, decode_rlp_item, get_item_with_prefix},
    error::RLPDecodeError,
    structs::Decoder,
};

/// A receipt as geth lays it out on disk: a three-element list of
/// post-state-or-status, gas used, and logs.
///
/// The gas field is stored big-endian with leading zeros stripped, so it can
/// be narrower than 8 bytes and must be left-padded before interpreting it
/// as a 64-bit integer. Logs are kept as raw encoded items; this type only
/// exists for diagnostics, which never need their contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredReceipt {
    pub post_state_or_status: Bytes,
    pub gas_used: u64,
    pub logs: Vec<Bytes>,
}

impl RLPDecode for StoredReceipt {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let mut decoder = Decoder::new(rlp)?;
        let post_state_or_status = decoder.decode_field("post_state_or_status")?;
        let gas_bytes: Bytes = decoder.decode_field("gas_used")?;
        if gas_bytes.len() > 8 {
            return Err(RLPDecodeError::Custom(
                "receipt gas_used wider than 8 bytes".to_string(),
            ));
        }
        let mut padded = [0u8; 8];
        padded[8 - gas_bytes.len()..].copy_from_slice(&gas_bytes);
        let gas_used = u64::from_be_bytes(padded);

        let logs_item = decoder.next_encoded_field()?;
        let (is_list, mut payload, _) = decode_rlp_item(logs_item)?;
        if !is_list {
            return Err(RLPDecodeError::UnexpectedString);
        }
        let mut logs = Vec::new();
        while !payload.is_empty() {
            let (item, rest) = get_item_with_prefix(payload)?;
            logs.push(Bytes::copy_from_slice(item));
            payload = rest;
        }

        Ok((
            StoredReceipt {
                post_state_or_status,
                gas_used,
                logs,
            },
            decoder.finish()?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gethport_rlp::{encode::RLPEncode, structs::Encoder};

    fn encode_receipt(status: &[u8], gas_be: &[u8], log_count: usize) -> Vec<u8> {
        let mut logs = Vec::new();
        for i in 0..log_count {
            // a log doesn't have to be well-formed for these tests, any list will do
            vec![i as u64].encode(&mut logs);
        }
        let mut buf = Vec::new();
        let mut logs_list = Vec::new();
        gethport_rlp::encode::encode_length(logs.len(), &mut logs_list);
        logs_list.extend_from_slice(&logs);
        Encoder::new(&mut buf)
            .encode_bytes(status)
            .encode_bytes(gas_be)
            .encode_raw(&logs_list)
            .finish();
        buf
    }

    #[test]
    fn decodes_narrow_gas_field() {
        let encoded = encode_receipt(&[0x01], &[0x52, 0x08], 2);
        let receipt = StoredReceipt::decode(&encoded).unwrap();
        assert_eq!(receipt.gas_used, 21_000);
        assert_eq!(receipt.post_state_or_status, Bytes::from_static(&[0x01]));
        assert_eq!(receipt.logs.len(), 2);
    }

    #[test]
    fn decodes_receipt_list() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&encode_receipt(&[0x01], &[0x10], 0));
        payload.extend_from_slice(&encode_receipt(&[0x00], &[0x01, 0x00, 0x00], 1));
        let mut encoded = Vec::new();
        gethport_rlp::encode::encode_length(payload.len(), &mut encoded);
        encoded.extend_from_slice(&payload);

        let receipts = Vec::<StoredReceipt>::decode(&encoded).unwrap();
        assert_eq!(receipts.len(), 2);
        assert_eq!(receipts[1].gas_used, 0x010000);
        assert_eq!(receipts[1].logs.len(), 1);
    }

    #[test]
    fn rejects_wide_gas_field() {
        let encoded = encode_receipt(&[0x01], &[1, 2, 3, 4, 5, 6, 7, 8, 9], 0);
        assert!(StoredReceipt::decode(&encoded).is_err());
    }
}
