use ethereum_types::H256;

use crate::{
    EMPTY_TRIE_HASH, keccak,
    db::NodeSource,
    error::TrieError,
    nibbles::Nibbles,
    node::{BranchNode, Node, NodeRef},
};

/// Lazy depth-first leaf iterator over a Merkle Patricia Trie.
///
/// Yields `(path_nibbles, value)` pairs in lexicographic nibble order. Every
/// node resolved through the source is verified against the hash that named
/// it. Not restartable mid-walk; start a fresh walker from the root instead.
pub struct TrieWalker<'a> {
    db: &'a dyn NodeSource,
    // The stack contains the traversed path and the next node to be visited.
    // Children of a branch are pushed in reverse order so pops come out in
    // lexicographic order.
    stack: Vec<(Nibbles, NodeRef)>,
}

impl<'a> TrieWalker<'a> {
    pub fn new(db: &'a dyn NodeSource, root: H256) -> Self {
        let mut stack = Vec::new();
        if root != *EMPTY_TRIE_HASH {
            stack.push((Nibbles::default(), NodeRef::Hash(root)));
        }
        Self { db, stack }
    }

    fn resolve(&self, node_ref: &NodeRef) -> Result<Node, TrieError> {
        match node_ref {
            // inline nodes are embedded in their parent, never fetched
            NodeRef::Inline(raw) => Ok(Node::decode_raw(raw)?),
            NodeRef::Hash(hash) => {
                let bytes = self
                    .db
                    .get_node(*hash)?
                    .ok_or(TrieError::MissingNode(*hash))?;
                let actual = keccak(&bytes);
                if actual != *hash {
                    return Err(TrieError::IntegrityError {
                        expected: *hash,
                        actual,
                    });
                }
                Ok(Node::decode_raw(&bytes)?)
            }
            NodeRef::Empty => Err(TrieError::MissingNode(H256::zero())),
        }
    }
}

impl Iterator for TrieWalker<'_> {
    type Item = Result<(Nibbles, Vec<u8>), TrieError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (path, node_ref) = self.stack.pop()?;
            let node = match self.resolve(&node_ref) {
                Ok(node) => node,
                Err(err) => {
                    // the walk cannot continue past an unresolvable node
                    self.stack.clear();
                    return Some(Err(err));
                }
            };
            match node {
                Node::Branch(branch) => {
                    let BranchNode { choices, value } = *branch;
                    for (choice, child) in choices.into_iter().enumerate().rev() {
                        if !child.is_empty() {
                            self.stack.push((path.append_new(choice as u8), child));
                        }
                    }
                    if !value.is_empty() {
                        return Some(Ok((path, value)));
                    }
                }
                Node::Extension(extension) => {
                    let mut child_path = path;
                    child_path.extend(&extension.prefix);
                    self.stack.push((child_path, extension.child));
                }
                Node::Leaf(leaf) => {
                    let mut leaf_path = path;
                    leaf_path.extend(&leaf.partial);
                    return Some(Ok((leaf_path, leaf.value)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        builder::trie_root_and_nodes,
        db::{CopyOnReadDb, InMemoryNodeStore, NodeStore},
    };

    fn sample_items() -> Vec<(Vec<u8>, Vec<u8>)> {
        vec![
            (b"doe".to_vec(), b"reindeer".to_vec()),
            (b"dog".to_vec(), b"puppy".to_vec()),
            (b"dogglesworth".to_vec(), b"cat".to_vec()),
            (vec![0x00, 0x12], vec![0x34; 40]),
            (vec![0xff; 32], vec![0x01]),
        ]
    }

    fn populate(store: &InMemoryNodeStore, items: Vec<(Vec<u8>, Vec<u8>)>) -> H256 {
        let (root, nodes) = trie_root_and_nodes(items);
        for (hash, encoded) in nodes {
            store.put_node(hash, encoded).unwrap();
        }
        root
    }

    fn collect_leaves(db: &dyn NodeSource, root: H256) -> Vec<(Vec<u8>, Vec<u8>)> {
        TrieWalker::new(db, root)
            .map(|entry| entry.map(|(path, value)| (path.to_bytes(), value)))
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn empty_root_yields_nothing() {
        let store = InMemoryNodeStore::new();
        assert_eq!(TrieWalker::new(&store, *EMPTY_TRIE_HASH).count(), 0);
    }

    #[test]
    fn walks_leaves_in_key_order() {
        let store = InMemoryNodeStore::new();
        let root = populate(&store, sample_items());

        let mut expected = sample_items();
        expected.sort();
        assert_eq!(collect_leaves(&store, root), expected);
    }

    #[test]
    fn detects_tampered_nodes() {
        let store = InMemoryNodeStore::new();
        // a value above 32 bytes forces at least one hashed node
        let root = populate(&store, vec![(b"key".to_vec(), vec![0xab; 64])]);
        store.put_node(root, vec![0xde, 0xad]).unwrap();

        let result: Result<Vec<_>, _> = TrieWalker::new(&store, root).collect();
        assert!(matches!(result, Err(TrieError::IntegrityError { .. })));
    }

    #[test]
    fn missing_node_is_fatal() {
        let store = InMemoryNodeStore::new();
        let root = H256::repeat_byte(0x42);
        let result: Result<Vec<_>, _> = TrieWalker::new(&store, root).collect();
        assert!(matches!(result, Err(TrieError::MissingNode(_))));
    }

    #[test]
    fn copy_on_read_walk_fills_destination() {
        let source = InMemoryNodeStore::new();
        let destination = InMemoryNodeStore::new();
        let root = populate(&source, sample_items());

        let db = CopyOnReadDb::new(&source, &destination);
        let through_copy = collect_leaves(&db, root);

        // after the walk the destination alone serves the whole trie
        assert_eq!(collect_leaves(&destination, root), through_copy);
    }
}
