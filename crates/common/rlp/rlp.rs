//! Recursive Length Prefix (RLP) encoding and decoding.
//!
//! RLP is the canonical serialization format for Ethereum structures:
//! headers, transactions, account state and trie nodes all travel as RLP.
//!
//! - [`encode::RLPEncode`] / [`decode::RLPDecode`] are the core traits.
//! - [`structs::Encoder`] builds a struct's field-list encoding;
//!   [`structs::Decoder`] is a cursor over an encoded field list.

pub mod constants;
pub mod decode;
pub mod encode;
pub mod error;
pub mod structs;
