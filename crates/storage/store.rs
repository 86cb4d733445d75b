use std::sync::Arc;

use ethereum_types::H256;
use gethport_common::types::{BlockBody, BlockHash, BlockHeader, BlockNumber};
use gethport_rlp::{decode::RLPDecode, encode::RLPEncode};
use gethport_trie::{NodeSource, NodeStore, TrieError};

use crate::{api::StoreEngine, error::StoreError, schema};

/// Chain-level operations over a [`StoreEngine`], using the geth byte-key
/// layout on both ends of a migration: a populated destination reads back
/// with the same schema as its source.
#[derive(Clone)]
pub struct Store {
    engine: Arc<dyn StoreEngine>,
}

impl Store {
    pub fn new(engine: impl StoreEngine + 'static) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    pub fn engine(&self) -> &dyn StoreEngine {
        self.engine.as_ref()
    }

    /// True once a canonical head has been persisted.
    pub fn is_initialized(&self) -> Result<bool, StoreError> {
        Ok(self.engine.get(schema::HEAD_BLOCK_KEY)?.is_some())
    }

    /// Stamps the database version and persists `genesis` as the canonical head.
    pub fn init_genesis(&self, genesis: &BlockHeader) -> Result<(), StoreError> {
        self.engine.put(
            schema::DATABASE_VERSION_KEY,
            &schema::SUPPORTED_DATABASE_VERSION.encode_to_vec(),
        )?;
        self.persist_header(genesis)
    }

    /// Persists a header and makes it the canonical head. Headers arrive in
    /// chain order, so the last one persisted is always the tip.
    pub fn persist_header(&self, header: &BlockHeader) -> Result<(), StoreError> {
        let hash = header.hash();
        self.engine.put(
            &schema::header_key(header.number, &hash),
            &header.encode_to_vec(),
        )?;
        self.engine
            .put(&schema::canonical_hash_key(header.number), hash.as_bytes())?;
        self.engine
            .put(&schema::header_number_key(&hash), &header.number.to_be_bytes())?;
        self.engine.put(schema::HEAD_BLOCK_KEY, hash.as_bytes())?;
        Ok(())
    }

    pub fn canonical_head(&self) -> Result<BlockHeader, StoreError> {
        let hash_bytes = self
            .engine
            .get(schema::HEAD_BLOCK_KEY)?
            .ok_or(StoreError::MissingData("canonical head hash"))?;
        let hash = decode_hash(&hash_bytes)?;
        let number = self
            .header_number(&hash)?
            .ok_or(StoreError::MissingData("canonical head number"))?;
        self.header(number, &hash)?
            .ok_or(StoreError::MissingData("canonical head header"))
    }

    pub fn header_number(&self, hash: &BlockHash) -> Result<Option<BlockNumber>, StoreError> {
        self.engine
            .get(&schema::header_number_key(hash))?
            .map(|bytes| {
                let bytes: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| StoreError::Custom("stored block number is not 8 bytes".into()))?;
                Ok(BlockNumber::from_be_bytes(bytes))
            })
            .transpose()
    }

    pub fn canonical_hash(&self, number: BlockNumber) -> Result<Option<BlockHash>, StoreError> {
        self.engine
            .get(&schema::canonical_hash_key(number))?
            .map(|bytes| decode_hash(&bytes))
            .transpose()
    }

    pub fn header(
        &self,
        number: BlockNumber,
        hash: &BlockHash,
    ) -> Result<Option<BlockHeader>, StoreError> {
        self.engine
            .get(&schema::header_key(number, hash))?
            .map(|bytes| Ok(BlockHeader::decode(&bytes)?))
            .transpose()
    }

    pub fn persist_body(
        &self,
        number: BlockNumber,
        hash: &BlockHash,
        body: &BlockBody,
    ) -> Result<(), StoreError> {
        self.engine
            .put(&schema::block_body_key(number, hash), &body.encode_to_vec())
    }

    pub fn body(
        &self,
        number: BlockNumber,
        hash: &BlockHash,
    ) -> Result<Option<BlockBody>, StoreError> {
        self.engine
            .get(&schema::block_body_key(number, hash))?
            .map(|bytes| Ok(BlockBody::decode(&bytes)?))
            .transpose()
    }
}

fn decode_hash(bytes: &[u8]) -> Result<BlockHash, StoreError> {
    if bytes.len() != 32 {
        return Err(StoreError::Custom("stored hash is not 32 bytes".into()));
    }
    Ok(BlockHash::from_slice(bytes))
}

fn node_err(err: StoreError) -> TrieError {
    TrieError::DbError(anyhow::Error::new(err))
}

/// State nodes live in the same flat key space, addressed by their hash.
impl NodeSource for Store {
    fn get_node(&self, hash: H256) -> Result<Option<Vec<u8>>, TrieError> {
        self.engine.get(hash.as_bytes()).map_err(node_err)
    }
}

impl NodeStore for Store {
    fn put_node(&self, hash: H256, node: Vec<u8>) -> Result<(), TrieError> {
        self.engine.put(hash.as_bytes(), &node).map_err(node_err)
    }
}

/// [`NodeSource`] view of a bare engine, for reading state nodes out of a
/// source database that is only available as a [`StoreEngine`].
pub struct EngineNodeSource<'a>(pub &'a dyn StoreEngine);

impl NodeSource for EngineNodeSource<'_> {
    fn get_node(&self, hash: H256) -> Result<Option<Vec<u8>>, TrieError> {
        self.0.get(hash.as_bytes()).map_err(node_err)
    }
}
