use std::path::Path;

use gethport_common::types::{BlockBody, BlockHash, BlockHeader, BlockNumber};
use gethport_rlp::decode::RLPDecode;
use gethport_storage::{StoreEngine, schema};
use tracing::debug;

use crate::{error::GethDbError, freezer::FreezerTable};

/// Typed accessor over a geth chain database: the live key/value store
/// backed by four freezer tables for data geth has already sealed.
///
/// The live store wins on every lookup; the freezer is the fallback. That
/// mirrors the source system's tiering: recent blocks are mutable, old
/// blocks are frozen.
pub struct GethReader {
    db: Box<dyn StoreEngine>,
    hashes: FreezerTable,
    headers: FreezerTable,
    bodies: FreezerTable,
    receipts: FreezerTable,
}

impl GethReader {
    /// Opens a reader over `db` with the freezer at `ancient_dir`.
    /// Refuses any database version other than the one this schema targets.
    pub fn open(
        db: Box<dyn StoreEngine>,
        ancient_dir: impl AsRef<Path>,
    ) -> Result<Self, GethDbError> {
        let raw_version = db
            .get(schema::DATABASE_VERSION_KEY)?
            .ok_or_else(|| GethDbError::MissingData("DatabaseVersion".to_string()))?;
        let version = u64::decode(&raw_version)?;
        if version != schema::SUPPORTED_DATABASE_VERSION {
            return Err(GethDbError::UnsupportedVersion(version));
        }

        let ancient_dir = ancient_dir.as_ref();
        let reader = Self {
            hashes: FreezerTable::open(ancient_dir, "hashes", false)?,
            headers: FreezerTable::open(ancient_dir, "headers", true)?,
            bodies: FreezerTable::open(ancient_dir, "bodies", true)?,
            receipts: FreezerTable::open(ancient_dir, "receipts", true)?,
            db,
        };
        debug!(
            ancient_entries = reader.hashes.len(),
            "opened geth database"
        );
        Ok(reader)
    }

    /// The live store, for lookups outside the block schema (state nodes,
    /// contract code).
    pub fn live_store(&self) -> &dyn StoreEngine {
        self.db.as_ref()
    }

    /// Number of items sealed into the freezer.
    pub fn ancient_len(&self) -> u64 {
        self.hashes.len()
    }

    /// Hash of the canonical head block.
    pub fn head_hash(&self) -> Result<BlockHash, GethDbError> {
        let bytes = self
            .db
            .get(schema::HEAD_BLOCK_KEY)?
            .ok_or_else(|| GethDbError::MissingData("LastBlock".to_string()))?;
        decode_hash(&bytes, "LastBlock")
    }

    /// Height of the canonical head block.
    pub fn head_number(&self) -> Result<BlockNumber, GethDbError> {
        let hash = self.head_hash()?;
        self.number_for_hash(&hash)
    }

    /// Block number of the header with the given hash.
    pub fn number_for_hash(&self, hash: &BlockHash) -> Result<BlockNumber, GethDbError> {
        let bytes = self
            .db
            .get(&schema::header_number_key(hash))?
            .ok_or_else(|| GethDbError::MissingData(format!("number for hash {hash:#x}")))?;
        let bytes: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
            GethDbError::Malformed(format!("block number for {hash:#x} is not 8 bytes"))
        })?;
        Ok(BlockNumber::from_be_bytes(bytes))
    }

    /// Canonical hash at the given height, falling back to the freezer.
    pub fn canonical_hash(&mut self, number: BlockNumber) -> Result<BlockHash, GethDbError> {
        if let Some(bytes) = self.db.get(&schema::canonical_hash_key(number))? {
            return decode_hash(&bytes, "canonical hash");
        }
        let bytes = self.hashes.get(number)?;
        decode_hash(&bytes, "ancient canonical hash")
    }

    /// Header at `number`, resolved through the canonical index when no hash
    /// is given.
    pub fn header(
        &mut self,
        number: BlockNumber,
        hash: Option<BlockHash>,
    ) -> Result<BlockHeader, GethDbError> {
        let hash = match hash {
            Some(hash) => hash,
            None => self.canonical_hash(number)?,
        };
        if let Some(bytes) = self.db.get(&schema::header_key(number, &hash))? {
            return Ok(BlockHeader::decode(&bytes)?);
        }
        let bytes = self.headers.get(number)?;
        Ok(BlockHeader::decode(&bytes)?)
    }

    /// Body at `number`, resolved like [`GethReader::header`].
    pub fn body(
        &mut self,
        number: BlockNumber,
        hash: Option<BlockHash>,
    ) -> Result<BlockBody, GethDbError> {
        let hash = match hash {
            Some(hash) => hash,
            None => self.canonical_hash(number)?,
        };
        if let Some(bytes) = self.db.get(&schema::block_body_key(number, &hash))? {
            return Ok(BlockBody::decode(&bytes)?);
        }
        let bytes = self.bodies.get(number)?;
        Ok(BlockBody::decode(&bytes)?)
    }

    /// Raw RLP of the receipt list at `number`. Decoding is the caller's
    /// business: the stored shape needs special handling for its gas field.
    pub fn receipts(
        &mut self,
        number: BlockNumber,
        hash: Option<BlockHash>,
    ) -> Result<Vec<u8>, GethDbError> {
        let hash = match hash {
            Some(hash) => hash,
            None => self.canonical_hash(number)?,
        };
        if let Some(bytes) = self.db.get(&schema::block_receipts_key(number, &hash))? {
            return Ok(bytes);
        }
        Ok(self.receipts.get(number)?)
    }
}

fn decode_hash(bytes: &[u8], what: &str) -> Result<BlockHash, GethDbError> {
    if bytes.len() != 32 {
        return Err(GethDbError::Malformed(format!(
            "{what} is {} bytes, expected 32",
            bytes.len()
        )));
    }
    Ok(BlockHash::from_slice(bytes))
}
