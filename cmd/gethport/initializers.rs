use std::path::Path;

use eyre::WrapErr;
use gethport_gethdb::GethReader;
use gethport_importer::StoreSink;
use gethport_storage::{RedbStore, Store};
use tracing::{info, warn};
use tracing_subscriber::{
    Registry, filter::Directive, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use crate::cli::Options;

/// File holding the live key/value store inside a database directory.
pub const CHAINDATA_FILE: &str = "chaindata.redb";
/// Directory holding the freezer tables inside a source database directory.
pub const ANCIENT_DIR: &str = "ancient";

pub fn init_tracing(opts: &Options) {
    let log_filter = EnvFilter::builder()
        .with_default_directive(Directive::from(opts.log_level))
        .from_env_lossy();
    Registry::default()
        .with(log_filter)
        .with(fmt::layer())
        .init();
}

/// Opens the source database: the live store plus the freezer next to it.
pub fn open_gethdb(path: &Path) -> eyre::Result<GethReader> {
    let store = RedbStore::open(path.join(CHAINDATA_FILE))
        .wrap_err_with(|| format!("could not open source database at {}", path.display()))?;
    let reader = GethReader::open(Box::new(store), path.join(ANCIENT_DIR))?;

    let head_hash = reader.head_hash()?;
    let head_number = reader.number_for_hash(&head_hash)?;
    info!(head_number, head_hash = %format!("{head_hash:#x}"), "found source chain tip");
    Ok(reader)
}

/// Opens the destination database, bootstrapping a fresh one from the
/// source's genesis header.
pub fn open_destination(path: &Path, reader: &mut GethReader) -> eyre::Result<StoreSink> {
    let engine = RedbStore::open(path.join(CHAINDATA_FILE))
        .wrap_err_with(|| format!("could not open destination database at {}", path.display()))?;
    let store = Store::new(engine);

    if !store.is_initialized()? {
        info!("destination database did not exist yet, initializing it now");
        let genesis = reader.header(0, None)?;
        store.init_genesis(&genesis)?;
        warn!("the new database contains the genesis header but not the genesis state");
        warn!("blocks cannot be replayed until state is imported");
    }

    Ok(StoreSink::new(store))
}

/// Opens an existing destination database without touching it.
pub fn open_destination_readonly(path: &Path) -> eyre::Result<Store> {
    let engine = RedbStore::open(path.join(CHAINDATA_FILE))
        .wrap_err_with(|| format!("could not open destination database at {}", path.display()))?;
    Ok(Store::new(engine))
}
