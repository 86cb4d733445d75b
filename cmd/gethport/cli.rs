use std::path::PathBuf;

use clap::{Parser as ClapParser, Subcommand as ClapSubcommand};
use tracing::Level;

pub const VERSION_STRING: &str = env!("CARGO_PKG_VERSION");

#[allow(clippy::upper_case_acronyms)]
#[derive(ClapParser)]
#[command(
    name = "gethport",
    version = VERSION_STRING,
    about = "Builds a chain database by importing the current state of a geth database"
)]
pub struct CLI {
    #[command(flatten)]
    pub opts: Options,
    #[command(subcommand)]
    pub command: Subcommand,
}

#[derive(ClapParser)]
pub struct Options {
    #[arg(
        long = "log.level",
        default_value_t = Level::INFO,
        value_name = "LOG_LEVEL",
        help = "The verbosity level used for logs.",
        long_help = "Possible values: info, debug, trace, warn, error"
    )]
    pub log_level: Level,
}

#[derive(ClapSubcommand)]
pub enum Subcommand {
    #[command(
        about = "Copies headers from the source into the destination",
        long_about = "Copies every header, starting from the destination's canonical chain tip, \
                      continuing up to the source's canonical chain tip."
    )]
    ImportHeaders {
        #[arg(long = "gethdb", value_name = "SOURCE_DB_PATH", required = true)]
        gethdb: PathBuf,
        #[arg(long = "destdb", value_name = "DEST_DB_PATH", required = true)]
        destdb: PathBuf,
        #[arg(
            long = "until",
            value_name = "BLOCK_NUMBER",
            help = "Only import headers up to this block number"
        )]
        until: Option<u64>,
    },
    #[command(
        about = "Does a (very fast) bulk copy of state entries from the source",
        long_about = "Scans over every key:value pair in the source database and copies over \
                      everything which looks like a state node (has a 32-byte key). This is much \
                      faster than iterating over the state trie (as import-state does) but \
                      imports too much."
    )]
    SweepState {
        #[arg(long = "gethdb", value_name = "SOURCE_DB_PATH", required = true)]
        gethdb: PathBuf,
        #[arg(long = "destdb", value_name = "DEST_DB_PATH", required = true)]
        destdb: PathBuf,
    },
    #[command(
        about = "Walks the state trie at the destination head, copying every node",
        long_about = "Iterates the state trie under the destination head's state root, copying \
                      every trie node, every contract's code and every storage trie into the \
                      destination."
    )]
    ImportState {
        #[arg(long = "gethdb", value_name = "SOURCE_DB_PATH", required = true)]
        gethdb: PathBuf,
        #[arg(long = "destdb", value_name = "DEST_DB_PATH", required = true)]
        destdb: PathBuf,
    },
    #[command(
        about = "Imports block bodies (transactions and ommers, but not receipts)",
        long_about = "Block bodies take a while to import, so this command lets you import just \
                      the segment you need. --startblock and --endblock are inclusive."
    )]
    ImportBodyRange {
        #[arg(long = "gethdb", value_name = "SOURCE_DB_PATH", required = true)]
        gethdb: PathBuf,
        #[arg(long = "destdb", value_name = "DEST_DB_PATH", required = true)]
        destdb: PathBuf,
        #[arg(long = "startblock", value_name = "BLOCK_NUMBER", required = true)]
        start_block: u64,
        #[arg(long = "endblock", value_name = "BLOCK_NUMBER", required = true)]
        end_block: u64,
    },
    #[command(
        about = "Simulates a full sync, running each block",
        long_about = "Starting from the destination's canonical chain tip, fetches block bodies \
                      from the source and runs each of them through the validating import."
    )]
    ProcessBlocks {
        #[arg(long = "gethdb", value_name = "SOURCE_DB_PATH", required = true)]
        gethdb: PathBuf,
        #[arg(long = "destdb", value_name = "DEST_DB_PATH", required = true)]
        destdb: PathBuf,
        #[arg(long = "endblock", value_name = "BLOCK_NUMBER", required = true)]
        end_block: u64,
    },
    #[command(about = "Helper to inspect all the receipts for a given block")]
    ReadReceipts {
        #[arg(long = "gethdb", value_name = "SOURCE_DB_PATH", required = true)]
        gethdb: PathBuf,
        #[arg(long = "block", value_name = "BLOCK_NUMBER", required = true)]
        block: u64,
    },
    #[command(about = "Helper to print summary statistics for a source database")]
    ReadGeth {
        #[arg(long = "gethdb", value_name = "SOURCE_DB_PATH", required = true)]
        gethdb: PathBuf,
    },
    #[command(about = "Helper to print summary statistics for a destination database")]
    ReadDest {
        #[arg(long = "destdb", value_name = "DEST_DB_PATH", required = true)]
        destdb: PathBuf,
    },
    #[command(
        about = "Runs a compaction over the destination, do this after importing state!",
        long_about = "If the database is not compacted it will compact itself at an inconvenient \
                      time, freezing your process for uncomfortably long."
    )]
    Compact {
        #[arg(long = "destdb", value_name = "DEST_DB_PATH", required = true)]
        destdb: PathBuf,
    },
    #[command(
        about = "Re-encodes a range of bodies and logs how the candidate layouts compress"
    )]
    ScanBodies {
        #[arg(long = "gethdb", value_name = "SOURCE_DB_PATH", required = true)]
        gethdb: PathBuf,
        #[arg(long = "startblock", value_name = "BLOCK_NUMBER", required = true)]
        start_block: u64,
        #[arg(long = "endblock", value_name = "BLOCK_NUMBER", required = true)]
        end_block: u64,
    },
}
