use ethereum_types::H256;

use crate::{
    EMPTY_TRIE_HASH, keccak,
    nibbles::Nibbles,
    node::{BranchNode, ExtensionNode, LeafNode, NodeRef},
};

/// Builds the Merkle Patricia Trie over `items` in one pass and returns its
/// root hash together with every node large enough to live in a database.
///
/// Keys must be unique. Nodes whose encoding is shorter than 32 bytes are
/// embedded in their parent and never emitted; the root is always emitted,
/// whatever its size, since it is addressed by hash.
pub fn trie_root_and_nodes(items: Vec<(Vec<u8>, Vec<u8>)>) -> (H256, Vec<(H256, Vec<u8>)>) {
    if items.is_empty() {
        return (*EMPTY_TRIE_HASH, Vec::new());
    }
    let mut entries: Vec<(Vec<u8>, Vec<u8>)> = items
        .into_iter()
        .map(|(key, value)| (Nibbles::from_raw(&key, false).into_vec(), value))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut nodes = Vec::new();
    let root = match build_node(&entries, 0, &mut nodes) {
        NodeRef::Hash(hash) => hash,
        NodeRef::Inline(raw) => {
            let hash = keccak(&raw);
            nodes.push((hash, raw));
            hash
        }
        NodeRef::Empty => *EMPTY_TRIE_HASH,
    };
    (root, nodes)
}

/// Builds the subtrie for a sorted, non-empty run of entries whose keys agree
/// on the first `depth` nibbles.
fn build_node(
    entries: &[(Vec<u8>, Vec<u8>)],
    depth: usize,
    nodes: &mut Vec<(H256, Vec<u8>)>,
) -> NodeRef {
    if entries.len() == 1 {
        let (key, value) = &entries[0];
        let mut partial = Nibbles::from_hex(key[depth..].to_vec());
        partial.append(16);
        let leaf = LeafNode {
            partial,
            value: value.clone(),
        };
        return commit(leaf.encode_raw(), nodes);
    }

    // entries are sorted, so the run's common prefix is that of its extremes
    let first = &entries[0].0;
    let last = &entries[entries.len() - 1].0;
    let mut prefix_len = 0;
    while depth + prefix_len < first.len()
        && depth + prefix_len < last.len()
        && first[depth + prefix_len] == last[depth + prefix_len]
    {
        prefix_len += 1;
    }

    if prefix_len > 0 {
        let child = build_branch(entries, depth + prefix_len, nodes);
        let extension = ExtensionNode {
            prefix: Nibbles::from_hex(first[depth..depth + prefix_len].to_vec()),
            child,
        };
        return commit(extension.encode_raw(), nodes);
    }

    build_branch(entries, depth, nodes)
}

/// Builds the branch node where the keys of a run diverge.
fn build_branch(
    entries: &[(Vec<u8>, Vec<u8>)],
    depth: usize,
    nodes: &mut Vec<(H256, Vec<u8>)>,
) -> NodeRef {
    let mut choices: [NodeRef; 16] = Default::default();
    let mut value = Vec::new();

    // an exhausted key sorts first and becomes the branch's own value
    let mut start = 0;
    if entries[0].0.len() == depth {
        value = entries[0].1.clone();
        start = 1;
    }

    let mut i = start;
    while i < entries.len() {
        let nibble = entries[i].0[depth];
        let mut j = i;
        while j < entries.len() && entries[j].0[depth] == nibble {
            j += 1;
        }
        choices[nibble as usize] = build_node(&entries[i..j], depth + 1, nodes);
        i = j;
    }

    commit(BranchNode { choices, value }.encode_raw(), nodes)
}

fn commit(encoded: Vec<u8>, nodes: &mut Vec<(H256, Vec<u8>)>) -> NodeRef {
    if encoded.len() < 32 {
        NodeRef::Inline(encoded)
    } else {
        let hash = keccak(&encoded);
        nodes.push((hash, encoded));
        NodeRef::Hash(hash)
    }
}
