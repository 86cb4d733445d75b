use ethereum_types::H256;
use gethport_common::types::StoredReceipt;
use gethport_importer::Importer;
use gethport_rlp::{decode::RLPDecode, structs::Encoder};
use gethport_storage::RedbStore;
use gethport_storage::schema::SUPPORTED_DATABASE_VERSION;
use tracing::{error, info};

use crate::cli::Subcommand;
use crate::initializers::{
    CHAINDATA_FILE, open_destination, open_destination_readonly, open_gethdb,
};

pub fn run(command: Subcommand) -> eyre::Result<()> {
    match command {
        Subcommand::ImportHeaders {
            gethdb,
            destdb,
            until,
        } => {
            let mut reader = open_gethdb(&gethdb)?;
            let sink = open_destination(&destdb, &mut reader)?;
            Importer::new(reader, sink).import_headers(until)?;
        }
        Subcommand::SweepState { gethdb, destdb } => {
            let mut reader = open_gethdb(&gethdb)?;
            let sink = open_destination(&destdb, &mut reader)?;
            Importer::new(reader, sink).sweep_state()?;
        }
        Subcommand::ImportState { gethdb, destdb } => {
            let mut reader = open_gethdb(&gethdb)?;
            let sink = open_destination(&destdb, &mut reader)?;
            Importer::new(reader, sink).import_state()?;
        }
        Subcommand::ImportBodyRange {
            gethdb,
            destdb,
            start_block,
            end_block,
        } => {
            let mut reader = open_gethdb(&gethdb)?;
            let sink = open_destination(&destdb, &mut reader)?;
            Importer::new(reader, sink).import_body_range(start_block, end_block)?;
        }
        Subcommand::ProcessBlocks {
            gethdb,
            destdb,
            end_block,
        } => {
            let mut reader = open_gethdb(&gethdb)?;
            let sink = open_destination(&destdb, &mut reader)?;
            Importer::new(reader, sink).process_blocks(end_block)?;
        }
        Subcommand::ReadReceipts { gethdb, block } => {
            let mut reader = open_gethdb(&gethdb)?;
            let raw = reader.receipts(block, None)?;
            match Vec::<StoredReceipt>::decode(&raw) {
                Ok(receipts) => {
                    info!(block, receipt_count = receipts.len(), "read receipts");
                    for receipt in &receipts {
                        info!(
                            post_state_or_status = %hex::encode(&receipt.post_state_or_status),
                            gas_used = receipt.gas_used,
                            log_count = receipt.logs.len(),
                            "receipt"
                        );
                    }
                }
                Err(err) => error!(block, %err, "could not decode stored receipts"),
            }
        }
        Subcommand::ReadGeth { gethdb } => {
            let reader = open_gethdb(&gethdb)?;
            info!(
                database_version = SUPPORTED_DATABASE_VERSION,
                entries_in_ancient_db = reader.ancient_len(),
                "source database"
            );
        }
        Subcommand::ReadDest { destdb } => {
            if !destdb.join(CHAINDATA_FILE).exists() {
                error!("there is no database at {}", destdb.display());
                return Ok(());
            }
            let store = open_destination_readonly(&destdb)?;
            let head = store.canonical_head()?;
            info!(
                number = head.number,
                hash = %format!("{:#x}", head.hash()),
                "destination canonical head"
            );
        }
        Subcommand::Compact { destdb } => {
            info!("this might take a while");
            let mut store = RedbStore::open(destdb.join(CHAINDATA_FILE))?;
            store.compact()?;
            info!("compaction finished");
        }
        Subcommand::ScanBodies {
            gethdb,
            start_block,
            end_block,
        } => {
            let mut reader = open_gethdb(&gethdb)?;
            for number in start_block..=end_block {
                if let Err(err) = scan_body(&mut reader, number) {
                    // diagnostic mode: report and keep scanning
                    error!(number, %err, "skipping block");
                }
            }
        }
    }
    Ok(())
}

/// Re-encodes one block three ways and logs how each layout compresses:
/// the full body, transactions replaced by their hashes, and the body
/// replaced by 32 bytes of filler.
fn scan_body(reader: &mut gethport_gethdb::GethReader, number: u64) -> eyre::Result<()> {
    let header = reader.header(number, None)?;
    let body = reader.body(number, Some(header.hash()))?;

    let mut full = Vec::new();
    Encoder::new(&mut full)
        .encode_field(&header)
        .encode_field(&body.transactions)
        .encode_field(&body.ommers)
        .finish();

    let tx_hashes: Vec<H256> = body.transactions.iter().map(|tx| tx.hash()).collect();
    let mut hashes_only = Vec::new();
    Encoder::new(&mut hashes_only)
        .encode_field(&header)
        .encode_field(&tx_hashes)
        .encode_field(&body.ommers)
        .finish();

    // the header hash stands in for incompressible filler
    let mut header_only = Vec::new();
    Encoder::new(&mut header_only)
        .encode_field(&header)
        .encode_bytes(header.hash().as_bytes())
        .encode_field(&body.ommers)
        .finish();

    let mut encoder = snap::raw::Encoder::new();
    info!(
        number,
        full = full.len(),
        full_snappy = encoder.compress_vec(&full)?.len(),
        hashes_only = hashes_only.len(),
        hashes_only_snappy = encoder.compress_vec(&hashes_only)?.len(),
        header_only = header_only.len(),
        header_only_snappy = encoder.compress_vec(&header_only)?.len(),
        "scanned body"
    );
    Ok(())
}
