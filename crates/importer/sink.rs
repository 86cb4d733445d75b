use ethereum_types::H256;
use gethport_common::types::{Block, BlockHeader};
use gethport_storage::Store;
use gethport_trie::NodeStore;

use crate::{error::ImportError, transactions_trie};

/// The destination-chain surface the importer drives. Header and block
/// persistence, trie-node persistence and the head query are the whole
/// contract; everything else about the destination stays behind it.
pub trait ChainSink {
    fn canonical_head(&self) -> Result<BlockHeader, ImportError>;

    fn persist_header(&self, header: &BlockHeader) -> Result<(), ImportError>;

    fn persist_block(&self, block: &Block) -> Result<(), ImportError>;

    fn persist_trie_nodes(&self, nodes: Vec<(H256, Vec<u8>)>) -> Result<(), ImportError>;

    /// Validating import: the sink checks the block against its chain rules
    /// before persisting it and advancing the head.
    fn import_block(&self, block: Block, validate: bool) -> Result<(), ImportError>;

    /// Where state nodes and contract code land.
    fn node_store(&self) -> &dyn NodeStore;
}

/// [`ChainSink`] over a local [`Store`].
///
/// `import_block` validates structure only: parent linkage and the
/// transactions root. Replaying transactions through a VM belongs to the
/// destination chain and stays behind the trait.
pub struct StoreSink {
    store: Store,
}

impl StoreSink {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}

impl ChainSink for StoreSink {
    fn canonical_head(&self) -> Result<BlockHeader, ImportError> {
        Ok(self.store.canonical_head()?)
    }

    fn persist_header(&self, header: &BlockHeader) -> Result<(), ImportError> {
        Ok(self.store.persist_header(header)?)
    }

    fn persist_block(&self, block: &Block) -> Result<(), ImportError> {
        let hash = block.hash();
        self.store.persist_header(&block.header)?;
        self.store
            .persist_body(block.header.number, &hash, &block.body)?;
        Ok(())
    }

    fn persist_trie_nodes(&self, nodes: Vec<(H256, Vec<u8>)>) -> Result<(), ImportError> {
        for (hash, node) in nodes {
            self.store.put_node(hash, node)?;
        }
        Ok(())
    }

    fn import_block(&self, block: Block, validate: bool) -> Result<(), ImportError> {
        let number = block.header.number;
        let (computed, nodes) = transactions_trie(&block.body.transactions);
        if validate {
            let head = self.store.canonical_head()?;
            if block.header.parent_hash != head.hash() || number != head.number + 1 {
                return Err(ImportError::InvalidBlock(
                    number,
                    format!(
                        "does not extend the canonical head {} ({:#x})",
                        head.number,
                        head.hash()
                    ),
                ));
            }
            if computed != block.header.transactions_root {
                return Err(ImportError::BodyRootMismatch {
                    number,
                    computed,
                    expected: block.header.transactions_root,
                });
            }
        }
        self.persist_block(&block)?;
        self.persist_trie_nodes(nodes)?;
        Ok(())
    }

    fn node_store(&self) -> &dyn NodeStore {
        &self.store
    }
}
