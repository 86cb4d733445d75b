use ethereum_types::H256;
use gethport_rlp::{
    decode::decode_bytes,
    error::RLPDecodeError,
    structs::{Decoder, Encoder},
};

use crate::nibbles::Nibbles;

/// A reference to a child node as it appears inside an encoded parent:
/// either the keccak hash of the child's encoding, or the encoding itself
/// when it is shorter than 32 bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum NodeRef {
    #[default]
    Empty,
    Hash(H256),
    Inline(Vec<u8>),
}

impl NodeRef {
    pub fn is_empty(&self) -> bool {
        matches!(self, NodeRef::Empty)
    }

    /// Reads a child reference out of its slot in a parent's encoding.
    /// Embedded nodes are lists, so a decodable string can only be the
    /// child's hash or no child at all.
    fn from_encoded_slot(slot: &[u8]) -> NodeRef {
        let Ok((payload, _)) = decode_bytes(slot) else {
            return NodeRef::Inline(slot.to_vec());
        };
        match payload.len() {
            0 => NodeRef::Empty,
            32 => NodeRef::Hash(H256::from_slice(payload)),
            _ => NodeRef::Inline(slot.to_vec()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeafNode {
    pub partial: Nibbles,
    pub value: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionNode {
    pub prefix: Nibbles,
    pub child: NodeRef,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BranchNode {
    pub choices: [NodeRef; 16],
    pub value: Vec<u8>,
}

/// A node in an Ethereum-compatible Merkle Patricia Trie.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Branch(Box<BranchNode>),
    Extension(ExtensionNode),
    Leaf(LeafNode),
}

impl Node {
    /// Decodes a node from its RLP encoding. Leaves and extensions are
    /// two-element lists told apart by the hex-prefix flag; branches are
    /// seventeen-element lists.
    pub fn decode_raw(rlp: &[u8]) -> Result<Self, RLPDecodeError> {
        let mut decoder = Decoder::new(rlp)?;
        let first = decoder.next_encoded_field()?;
        let second = decoder.next_encoded_field()?;

        if !decoder.has_more_fields() {
            let (path, _) = decode_bytes(first)?;
            let partial = Nibbles::decode_compact(path);
            if partial.is_leaf() {
                let (value, _) = decode_bytes(second)?;
                return Ok(Node::Leaf(LeafNode {
                    partial,
                    value: value.to_vec(),
                }));
            }
            return Ok(Node::Extension(ExtensionNode {
                prefix: partial,
                child: NodeRef::from_encoded_slot(second),
            }));
        }

        // anything beyond two fields has to be a branch: the two slots
        // already in hand, fourteen more, then the branch value
        let mut choices: [NodeRef; 16] = Default::default();
        choices[0] = NodeRef::from_encoded_slot(first);
        choices[1] = NodeRef::from_encoded_slot(second);
        for choice in choices.iter_mut().skip(2) {
            *choice = NodeRef::from_encoded_slot(decoder.next_encoded_field()?);
        }
        let (value, _) = decode_bytes(decoder.next_encoded_field()?)?;
        decoder.finish()?;
        Ok(Node::Branch(Box::new(BranchNode {
            choices,
            value: value.to_vec(),
        })))
    }

    pub fn encode_raw(&self) -> Vec<u8> {
        match self {
            Node::Branch(n) => n.encode_raw(),
            Node::Extension(n) => n.encode_raw(),
            Node::Leaf(n) => n.encode_raw(),
        }
    }
}

fn encode_child<'a>(encoder: Encoder<'a>, child: &NodeRef) -> Encoder<'a> {
    match child {
        NodeRef::Empty => encoder.encode_bytes(&[]),
        NodeRef::Hash(hash) => encoder.encode_field(hash),
        NodeRef::Inline(raw) => encoder.encode_raw(raw),
    }
}

impl LeafNode {
    pub fn encode_raw(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        Encoder::new(&mut buf)
            .encode_bytes(&self.partial.encode_compact())
            .encode_bytes(&self.value)
            .finish();
        buf
    }
}

impl ExtensionNode {
    pub fn encode_raw(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = Encoder::new(&mut buf).encode_bytes(&self.prefix.encode_compact());
        encode_child(encoder, &self.child).finish();
        buf
    }
}

impl BranchNode {
    pub fn encode_raw(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut encoder = Encoder::new(&mut buf);
        for choice in &self.choices {
            encoder = encode_child(encoder, choice);
        }
        encoder.encode_bytes(&self.value).finish();
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_roundtrip() {
        let leaf = LeafNode {
            partial: Nibbles::from_bytes(&[0xab, 0xcd]),
            value: b"value".to_vec(),
        };
        let encoded = leaf.encode_raw();
        assert_eq!(Node::decode_raw(&encoded).unwrap(), Node::Leaf(leaf));
    }

    #[test]
    fn extension_roundtrip() {
        let extension = ExtensionNode {
            prefix: Nibbles::from_hex(vec![0x1, 0x2, 0x3]),
            child: NodeRef::Hash(H256::repeat_byte(0x77)),
        };
        let encoded = extension.encode_raw();
        assert_eq!(
            Node::decode_raw(&encoded).unwrap(),
            Node::Extension(extension)
        );
    }

    #[test]
    fn branch_with_inline_child_roundtrip() {
        let inline_leaf = LeafNode {
            partial: Nibbles::from_hex(vec![0x5, 16]),
            value: vec![0x2a],
        };
        let mut choices: [NodeRef; 16] = Default::default();
        choices[3] = NodeRef::Inline(inline_leaf.encode_raw());
        choices[9] = NodeRef::Hash(H256::repeat_byte(0x11));
        let branch = BranchNode {
            choices,
            value: Vec::new(),
        };
        let encoded = branch.encode_raw();
        assert_eq!(
            Node::decode_raw(&encoded).unwrap(),
            Node::Branch(Box::new(branch))
        );
    }

    #[test]
    fn wrong_arity_is_rejected() {
        // a three-element list is neither a pair node nor a branch
        let mut buf = Vec::new();
        Encoder::new(&mut buf)
            .encode_bytes(&[0x20])
            .encode_bytes(b"v")
            .encode_bytes(b"extra")
            .finish();
        assert!(Node::decode_raw(&buf).is_err());
    }
}
