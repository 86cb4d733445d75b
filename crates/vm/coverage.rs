use std::collections::{HashMap, HashSet, hash_map::Entry};

use ethereum_types::Address;

/// Which byte offsets of one contract's code have been read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeReads {
    pub address: Address,
    pub reads: HashSet<usize>,
    pub code_size: usize,
}

impl CodeReads {
    pub fn new(address: Address, reads: HashSet<usize>, code_size: usize) -> Self {
        Self {
            address,
            reads,
            code_size,
        }
    }

    /// Folds another observation of the same contract into this one: the
    /// read sets union, the code size stays.
    pub fn merge(&mut self, other: &CodeReads) {
        debug_assert_eq!(
            self.address, other.address,
            "merging reads of different contracts"
        );
        self.reads.extend(other.reads.iter().copied());
    }
}

/// Per-contract read statistics, mergeable across runs. Merging is
/// associative and commutative, so shards of a run can be combined in any
/// order.
#[derive(Clone, Debug, Default)]
pub struct CodeReadsMap {
    entries: HashMap<Address, CodeReads>,
}

impl CodeReadsMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_reads(&mut self, reads: CodeReads) {
        match self.entries.entry(reads.address) {
            Entry::Occupied(mut entry) => entry.get_mut().merge(&reads),
            Entry::Vacant(entry) => {
                entry.insert(reads);
            }
        }
    }

    pub fn merge(&mut self, other: CodeReadsMap) {
        for (_, reads) in other.entries {
            self.insert_reads(reads);
        }
    }

    pub fn get(&self, address: &Address) -> Option<&CodeReads> {
        self.entries.get(address)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total bytes of code across all observed contracts.
    pub fn total_code_bytes(&self) -> usize {
        self.entries.values().map(|reads| reads.code_size).sum()
    }

    /// Total distinct bytes read across all observed contracts.
    pub fn total_read_bytes(&self) -> usize {
        self.entries.values().map(|reads| reads.reads.len()).sum()
    }
}
