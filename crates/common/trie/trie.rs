//! Read-side Merkle Patricia Trie plumbing: a lazy leaf walker over a
//! hash-addressed node store, a copy-on-read wrapper for migrating nodes
//! between stores, and a one-shot builder that materializes the trie of an
//! ordered key/value set.

pub mod builder;
pub mod db;
pub mod error;
mod nibbles;
mod node;
mod walker;

use ethereum_types::H256;
use gethport_rlp::constants::RLP_NULL;
use lazy_static::lazy_static;
use sha3::{Digest, Keccak256};

pub use self::builder::trie_root_and_nodes;
pub use self::db::{CopyOnReadDb, InMemoryNodeStore, NodeSource, NodeStore};
pub use self::error::TrieError;
pub use self::nibbles::Nibbles;
pub use self::node::{BranchNode, ExtensionNode, LeafNode, Node, NodeRef};
pub use self::walker::TrieWalker;

lazy_static! {
    /// Hash value for an empty trie, equal to keccak(RLP_NULL)
    pub static ref EMPTY_TRIE_HASH: H256 = keccak(&[RLP_NULL]);
}

pub(crate) fn keccak(data: &[u8]) -> H256 {
    H256::from_slice(
        Keccak256::new()
            .chain_update(data)
            .finalize()
            .as_slice(),
    )
}
