use ethereum_types::H256;
use lazy_static::lazy_static;

use crate::keccak;

lazy_static! {
    /// Keccak-256 of the empty byte string: the code hash of accounts
    /// without contract code.
    pub static ref EMPTY_KECCACK_HASH: H256 = keccak([]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn empty_code_hash_value() {
        assert_eq!(
            *EMPTY_KECCACK_HASH,
            H256(hex!(
                "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
            ))
        );
    }
}
