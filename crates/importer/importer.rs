//! Orchestrates chain-data migration out of a geth database: header copy,
//! bulk and precise state import, body persistence, and full block replay
//! through a [`ChainSink`].

pub mod error;
pub mod sink;

use std::time::{Duration, Instant};

use ethereum_types::H256;
use gethport_common::constants::EMPTY_KECCACK_HASH;
use gethport_common::types::{AccountState, Block, BlockNumber, Transaction};
use gethport_gethdb::GethReader;
use gethport_rlp::{decode::RLPDecode, encode::RLPEncode};
use gethport_storage::{EngineNodeSource, StoreError};
use gethport_trie::{CopyOnReadDb, EMPTY_TRIE_HASH, NodeStore, TrieWalker, trie_root_and_nodes};
use tracing::{debug, info};

pub use error::ImportError;
pub use sink::{ChainSink, StoreSink};

const HEADER_PROGRESS_INTERVAL: u64 = 1000;
const LEAF_PROGRESS_INTERVAL: u64 = 1000;
const SWEEP_PROGRESS_INTERVAL: u64 = 100_000;
const BODY_PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

/// The transactions trie of a block: keys are the RLP of each index, values
/// the RLP of each transaction. Returns the root and the nodes backing it.
pub fn transactions_trie(transactions: &[Transaction]) -> (H256, Vec<(H256, Vec<u8>)>) {
    let items = transactions
        .iter()
        .enumerate()
        .map(|(index, tx)| (index.encode_to_vec(), tx.encode_to_vec()))
        .collect();
    trie_root_and_nodes(items)
}

/// Drives one migration from a source [`GethReader`] into a [`ChainSink`].
///
/// Every mode is best-effort forward: the first fatal error aborts with the
/// destination left partial. Re-running the copying modes is idempotent; the
/// replay mode depends on the sink's own semantics.
pub struct Importer<S: ChainSink> {
    reader: GethReader,
    sink: S,
}

impl<S: ChainSink> Importer<S> {
    pub fn new(reader: GethReader, sink: S) -> Self {
        Self { reader, sink }
    }

    /// Copies headers from the destination's canonical head up to the
    /// source's head, or `until` if that comes first. Fails fast when the
    /// two chains disagree about the block the destination already has.
    pub fn import_headers(&mut self, until: Option<BlockNumber>) -> Result<(), ImportError> {
        let head = self.sink.canonical_head()?;
        let head_hash = head.hash();

        let source_header = self.reader.header(head.number, Some(head_hash))?;
        if source_header.hash() != head_hash {
            return Err(ImportError::ChainDivergence {
                number: head.number,
                source_hash: source_header.hash(),
                destination: head_hash,
            });
        }

        let source_head = self.reader.head_number()?;
        let target = match until {
            Some(until) => until.min(source_head),
            None => source_head,
        };
        info!(from = head.number, to = target, "importing headers");

        for number in head.number..=target {
            let header = self.reader.header(number, None)?;
            self.sink.persist_header(&header)?;
            if number % HEADER_PROGRESS_INTERVAL == 0 {
                debug!(number, "imported header");
            }
        }

        if until.is_none() {
            // these should never fire; a mismatch here means the source
            // moved or the sink dropped writes
            let destination_head = self.sink.canonical_head()?;
            let source_hash = self.reader.head_hash()?;
            if destination_head.hash() != source_hash {
                return Err(ImportError::ChainDivergence {
                    number: destination_head.number,
                    source_hash,
                    destination: destination_head.hash(),
                });
            }
        }
        info!("finished importing headers");
        Ok(())
    }

    /// Bulk state copy: every 32-byte key in the source's live store is
    /// assumed to be a state node and copied verbatim. Over-approximates,
    /// but unused nodes in the destination are harmless and this is far
    /// cheaper than walking the trie.
    pub fn sweep_state(&self) -> Result<(), ImportError> {
        debug!("sweep_state: bulk-importing state entries");
        let node_store = self.sink.node_store();
        let mut imported = 0u64;
        let mut skipped = 0u64;
        self.reader
            .live_store()
            .scan_range(&[0x00; 32], &[0xff; 32], &mut |key, value| {
                if key.len() != 32 {
                    skipped += 1;
                    return Ok(());
                }
                node_store
                    .put_node(H256::from_slice(key), value.to_vec())
                    .map_err(|err| StoreError::Custom(err.to_string()))?;
                imported += 1;
                if imported % SWEEP_PROGRESS_INTERVAL == 0 {
                    debug!(imported, skipped, bucket = %hex::encode(&key[..2]), "sweeping state");
                }
                Ok(())
            })?;
        info!(imported, skipped, "sweep_state: imported state entries");
        Ok(())
    }

    /// Precise state copy: walks the state trie under the destination
    /// head's root through a copy-on-read wrapper, pulling contract code
    /// and storage tries along with each account.
    pub fn import_state(&self) -> Result<(), ImportError> {
        let head = self.sink.canonical_head()?;
        let state_root = head.state_root;
        info!(block = head.number, root = %format!("{state_root:#x}"), "importing state trie");

        let source = EngineNodeSource(self.reader.live_store());
        let copydb = CopyOnReadDb::new(&source, self.sink.node_store());

        let mut leaves = 0u64;
        for entry in TrieWalker::new(&copydb, state_root) {
            let (path, value) = entry?;
            let account = AccountState::decode(&value)?;

            if account.code_hash != *EMPTY_KECCACK_HASH {
                // fetching through the copier is what copies the code across
                copydb.require(account.code_hash)?;
            }

            leaves += 1;
            if leaves % LEAF_PROGRESS_INTERVAL == 0 {
                debug!(leaves, address_hash = %hex::encode(path.to_bytes()), "importing state");
            }

            if account.storage_root != *EMPTY_TRIE_HASH {
                for storage_entry in TrieWalker::new(&copydb, account.storage_root) {
                    storage_entry?;
                    leaves += 1;
                    if leaves % LEAF_PROGRESS_INTERVAL == 0 {
                        debug!(
                            leaves,
                            address_hash = %hex::encode(path.to_bytes()),
                            "importing storage"
                        );
                    }
                }
            }
        }
        info!(leaves, "imported state trie and all storage tries");
        Ok(())
    }

    /// Copies block bodies for `start..=end` (inclusive), materializing each
    /// block's transactions trie and checking it against the header.
    pub fn import_body_range(
        &mut self,
        start: BlockNumber,
        end: BlockNumber,
    ) -> Result<(), ImportError> {
        info!(start, end, "importing block bodies");
        let mut last_log = Instant::now();
        for number in start..=end {
            self.import_block_body(number)?;
            if last_log.elapsed() >= BODY_PROGRESS_INTERVAL {
                debug!(number, "importing bodies");
                last_log = Instant::now();
            }
        }
        Ok(())
    }

    fn import_block_body(&mut self, number: BlockNumber) -> Result<(), ImportError> {
        let header = self.reader.header(number, None)?;
        let header_hash = header.hash();
        let body = self.reader.body(number, Some(header_hash))?;

        let (root, nodes) = transactions_trie(&body.transactions);
        if root != header.transactions_root {
            return Err(ImportError::BodyRootMismatch {
                number,
                computed: root,
                expected: header.transactions_root,
            });
        }

        self.sink.persist_block(&Block::new(header, body))?;
        // persisting the block indexes its transactions but does not store
        // the trie they hash into; reads of the block need these nodes
        self.sink.persist_trie_nodes(nodes)?;
        Ok(())
    }

    /// Replay: feeds each block after the destination head, up to `end`,
    /// through the sink's validating import.
    pub fn process_blocks(&mut self, end: BlockNumber) -> Result<(), ImportError> {
        let head = self.sink.canonical_head()?;
        info!(from = head.number, to = end, "processing blocks from chain tip");

        let start = head.number + 1;
        for number in start..=end {
            let header = self.reader.header(number, None)?;
            let hash = header.hash();
            let body = self.reader.body(number, Some(hash))?;
            self.sink.import_block(Block::new(header, body), true)?;
            debug!(number, "imported block");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::U256;
    use gethport_common::keccak;
    use gethport_common::types::{BlockBody, BlockHeader};
    use gethport_storage::{InMemoryStore, Store, StoreEngine, schema};
    use gethport_trie::NodeSource;
    use std::path::Path;
    use tempdir::TempDir;

    fn genesis() -> BlockHeader {
        BlockHeader {
            number: 0,
            gas_limit: 5000,
            difficulty: U256::from(0x20000),
            transactions_root: *EMPTY_TRIE_HASH,
            receipts_root: *EMPTY_TRIE_HASH,
            state_root: *EMPTY_TRIE_HASH,
            ..Default::default()
        }
    }

    fn child(parent: &BlockHeader, body: &BlockBody) -> BlockHeader {
        BlockHeader {
            number: parent.number + 1,
            parent_hash: parent.hash(),
            timestamp: parent.timestamp + 13,
            gas_limit: parent.gas_limit,
            difficulty: parent.difficulty,
            transactions_root: transactions_trie(&body.transactions).0,
            receipts_root: *EMPTY_TRIE_HASH,
            state_root: *EMPTY_TRIE_HASH,
            ..Default::default()
        }
    }

    fn transfer(nonce: u64) -> Transaction {
        Transaction {
            nonce,
            gas_price: U256::from(1_000_000_000u64),
            gas: 21_000,
            to: Some(ethereum_types::Address::from_low_u64_be(nonce + 1)),
            value: U256::from(nonce) * 1000,
            v: U256::from(27),
            r: U256::from(nonce + 7),
            s: U256::from(nonce + 9),
            ..Default::default()
        }
    }

    /// A source chain of four blocks: 0 and 1 frozen, 2 and 3 live.
    fn source_chain() -> Vec<Block> {
        let bodies = [
            BlockBody::default(),
            BlockBody {
                transactions: vec![transfer(0), transfer(1)],
                ommers: Vec::new(),
            },
            BlockBody::default(),
            BlockBody {
                transactions: vec![transfer(2)],
                ommers: Vec::new(),
            },
        ];
        let mut blocks = vec![Block::new(genesis(), bodies[0].clone())];
        for body in &bodies[1..] {
            let header = child(&blocks.last().unwrap().header, body);
            blocks.push(Block::new(header, body.clone()));
        }
        blocks
    }

    fn write_index_and_shard(dir: &Path, name: &str, compressed: bool, items: &[Vec<u8>]) {
        let (index_ext, data_ext) = if compressed {
            ("cidx", "cdat")
        } else {
            ("ridx", "rdat")
        };
        let mut shard = Vec::new();
        let mut index = vec![0u8; 6];
        for item in items {
            let raw = if compressed {
                snap::raw::Encoder::new().compress_vec(item).unwrap()
            } else {
                item.clone()
            };
            shard.extend_from_slice(&raw);
            index.extend_from_slice(&0u16.to_be_bytes());
            index.extend_from_slice(&(shard.len() as u32).to_be_bytes());
        }
        std::fs::write(dir.join(format!("{name}.{index_ext}")), index).unwrap();
        if !items.is_empty() {
            std::fs::write(dir.join(format!("{name}.0000.{data_ext}")), shard).unwrap();
        }
    }

    /// Lays `blocks` out as a geth database: the first `frozen` blocks in
    /// the freezer, the rest in the live store, head pointers on top.
    fn source_reader(dir: &Path, blocks: &[Block], frozen: usize) -> GethReader {
        let live = InMemoryStore::new();
        live.put(
            schema::DATABASE_VERSION_KEY,
            &schema::SUPPORTED_DATABASE_VERSION.encode_to_vec(),
        )
        .unwrap();

        let ancient = &blocks[..frozen];
        write_index_and_shard(
            dir,
            "hashes",
            false,
            &ancient.iter().map(|b| b.hash().as_bytes().to_vec()).collect::<Vec<_>>(),
        );
        write_index_and_shard(
            dir,
            "headers",
            true,
            &ancient.iter().map(|b| b.header.encode_to_vec()).collect::<Vec<_>>(),
        );
        write_index_and_shard(
            dir,
            "bodies",
            true,
            &ancient.iter().map(|b| b.body.encode_to_vec()).collect::<Vec<_>>(),
        );
        write_index_and_shard(
            dir,
            "receipts",
            true,
            &ancient.iter().map(|_| vec![0xc0]).collect::<Vec<_>>(),
        );

        for block in &blocks[frozen..] {
            let hash = block.hash();
            let number = block.header.number;
            live.put(&schema::header_key(number, &hash), &block.header.encode_to_vec())
                .unwrap();
            live.put(&schema::block_body_key(number, &hash), &block.body.encode_to_vec())
                .unwrap();
            live.put(&schema::canonical_hash_key(number), hash.as_bytes())
                .unwrap();
        }
        for block in blocks {
            live.put(
                &schema::header_number_key(&block.hash()),
                &block.header.number.to_be_bytes(),
            )
            .unwrap();
        }
        let head = blocks.last().unwrap().hash();
        live.put(schema::HEAD_BLOCK_KEY, head.as_bytes()).unwrap();

        GethReader::open(Box::new(live), dir).unwrap()
    }

    fn fresh_sink(genesis: &BlockHeader) -> StoreSink {
        let store = Store::new(InMemoryStore::new());
        store.init_genesis(genesis).unwrap();
        StoreSink::new(store)
    }

    #[test]
    fn import_headers_reaches_the_source_head() {
        let dir = TempDir::new("importer").unwrap();
        let blocks = source_chain();
        let reader = source_reader(dir.path(), &blocks, 2);
        let sink = fresh_sink(&blocks[0].header);
        let mut importer = Importer::new(reader, sink);

        importer.import_headers(None).unwrap();

        let head = importer.sink.canonical_head().unwrap();
        assert_eq!(head, blocks[3].header);
        for block in &blocks {
            let stored = importer
                .sink
                .store()
                .header(block.header.number, &block.hash())
                .unwrap();
            assert_eq!(stored.as_ref(), Some(&block.header));
        }

        // importing again from the new head changes nothing
        importer.import_headers(None).unwrap();
        assert_eq!(importer.sink.canonical_head().unwrap(), blocks[3].header);
    }

    #[test]
    fn import_headers_honors_until() {
        let dir = TempDir::new("importer").unwrap();
        let blocks = source_chain();
        let reader = source_reader(dir.path(), &blocks, 2);
        let mut importer = Importer::new(reader, fresh_sink(&blocks[0].header));

        importer.import_headers(Some(2)).unwrap();
        assert_eq!(importer.sink.canonical_head().unwrap(), blocks[2].header);
    }

    #[test]
    fn import_headers_rejects_a_diverged_destination() {
        let dir = TempDir::new("importer").unwrap();
        let blocks = source_chain();
        let reader = source_reader(dir.path(), &blocks, 2);

        let mut other_genesis = genesis();
        other_genesis.extra_data = bytes::Bytes::from_static(b"other chain");
        let mut importer = Importer::new(reader, fresh_sink(&other_genesis));

        assert!(matches!(
            importer.import_headers(None),
            Err(ImportError::ChainDivergence { number: 0, .. })
        ));
    }

    #[test]
    fn sweep_state_copies_exactly_the_32_byte_keys() {
        let dir = TempDir::new("importer").unwrap();
        let blocks = source_chain();
        let reader = source_reader(dir.path(), &blocks, 2);

        let node = b"some trie node".to_vec();
        let node_hash = keccak(&node);
        reader.live_store().put(node_hash.as_bytes(), &node).unwrap();
        let mut long_key = node_hash.as_bytes().to_vec();
        long_key.push(0x00);
        reader.live_store().put(&long_key, b"not a node").unwrap();

        let importer = Importer::new(reader, fresh_sink(&blocks[0].header));
        importer.sweep_state().unwrap();

        let destination = importer.sink.store();
        assert_eq!(destination.get_node(node_hash).unwrap(), Some(node));
        assert_eq!(destination.engine().get(&long_key).unwrap(), None);
    }

    /// Builds a contract account with storage plus an externally owned
    /// account, stores every node (and the contract code) in `live`, and
    /// returns the state root.
    fn populate_state(live: &dyn StoreEngine) -> H256 {
        let code = vec![0x60, 0x01, 0x60, 0x02, 0x5b];
        let code_hash = keccak(&code);
        live.put(code_hash.as_bytes(), &code).unwrap();

        let storage_items: Vec<(Vec<u8>, Vec<u8>)> = (0u8..20)
            .map(|slot| {
                (
                    keccak(&[slot]).as_bytes().to_vec(),
                    vec![slot; 33],
                )
            })
            .collect();
        let (storage_root, storage_nodes) = trie_root_and_nodes(storage_items);
        for (hash, node) in storage_nodes {
            live.put(hash.as_bytes(), &node).unwrap();
        }

        let contract = AccountState {
            nonce: 1,
            balance: U256::zero(),
            storage_root,
            code_hash,
        };
        let external = AccountState {
            nonce: 7,
            balance: U256::from(10).pow(U256::from(18)),
            storage_root: *EMPTY_TRIE_HASH,
            code_hash: *EMPTY_KECCACK_HASH,
        };
        let accounts = vec![
            (
                keccak(b"contract").as_bytes().to_vec(),
                contract.encode_to_vec(),
            ),
            (
                keccak(b"external").as_bytes().to_vec(),
                external.encode_to_vec(),
            ),
        ];
        let (state_root, state_nodes) = trie_root_and_nodes(accounts);
        for (hash, node) in state_nodes {
            live.put(hash.as_bytes(), &node).unwrap();
        }
        state_root
    }

    #[test]
    fn import_state_copies_accounts_storage_and_code() {
        let dir = TempDir::new("importer").unwrap();

        let mut genesis = genesis();
        let blocks = {
            let live_probe = InMemoryStore::new();
            genesis.state_root = populate_state(&live_probe);
            // rebuild the chain on top of the genesis that carries state
            let mut blocks = vec![Block::new(genesis.clone(), BlockBody::default())];
            let header = child(&genesis, &BlockBody::default());
            blocks.push(Block::new(header, BlockBody::default()));
            blocks
        };
        let reader = source_reader(dir.path(), &blocks, 1);
        let state_root = populate_state(reader.live_store());

        let importer = Importer::new(reader, fresh_sink(&genesis));
        importer.import_state().unwrap();

        let destination = importer.sink.store();
        let source = EngineNodeSource(importer.reader.live_store());
        let from_source: Vec<_> = TrieWalker::new(&source, state_root)
            .collect::<Result<_, _>>()
            .unwrap();
        let from_destination: Vec<_> = TrieWalker::new(destination, state_root)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(from_source, from_destination);
        assert!(!from_destination.is_empty());

        // contract code came along for the ride
        let code_hash = keccak(&[0x60, 0x01, 0x60, 0x02, 0x5b]);
        assert!(destination.get_node(code_hash).unwrap().is_some());

        // and the storage trie walks out of the destination alone
        let contract_leaf = &from_destination
            .iter()
            .find(|(path, _)| path.to_bytes() == keccak(b"contract").as_bytes())
            .unwrap()
            .1;
        let account = AccountState::decode(contract_leaf).unwrap();
        let storage: Vec<_> = TrieWalker::new(destination, account.storage_root)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(storage.len(), 20);
    }

    #[test]
    fn import_body_range_persists_bodies_and_transaction_tries() {
        let dir = TempDir::new("importer").unwrap();
        let blocks = source_chain();
        let reader = source_reader(dir.path(), &blocks, 2);
        let mut importer = Importer::new(reader, fresh_sink(&blocks[0].header));

        importer.import_body_range(1, 3).unwrap();

        let destination = importer.sink.store();
        for block in &blocks[1..] {
            assert_eq!(
                destination
                    .body(block.header.number, &block.hash())
                    .unwrap()
                    .as_ref(),
                Some(&block.body)
            );
        }
        // the transactions trie of block 1 is readable from the destination
        let (root, nodes) = transactions_trie(&blocks[1].body.transactions);
        assert_eq!(root, blocks[1].header.transactions_root);
        for (hash, _) in nodes {
            assert!(destination.get_node(hash).unwrap().is_some());
        }

        // running the same range again converges to the same state
        importer.import_body_range(1, 3).unwrap();
        assert_eq!(
            importer.sink.canonical_head().unwrap(),
            blocks[3].header
        );
    }

    #[test]
    fn import_body_range_rejects_a_mismatched_root() {
        let dir = TempDir::new("importer").unwrap();
        let mut blocks = source_chain();
        // claim a different transactions root than the body hashes to
        blocks[1].header.transactions_root = H256::repeat_byte(0x13);
        let reader = source_reader(dir.path(), &blocks, 0);
        let mut importer = Importer::new(reader, fresh_sink(&blocks[0].header));

        assert!(matches!(
            importer.import_body_range(1, 1),
            Err(ImportError::BodyRootMismatch { number: 1, .. })
        ));
    }

    #[test]
    fn process_blocks_replays_up_to_the_target() {
        let dir = TempDir::new("importer").unwrap();
        let blocks = source_chain();
        let reader = source_reader(dir.path(), &blocks, 2);
        let mut importer = Importer::new(reader, fresh_sink(&blocks[0].header));

        importer.process_blocks(3).unwrap();
        assert_eq!(importer.sink.canonical_head().unwrap(), blocks[3].header);
    }
}
