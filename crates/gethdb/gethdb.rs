//! Read access to a geth chain database: the live key/value store plus the
//! append-only "ancient" freezer that holds sealed block data.

pub mod error;
pub mod freezer;
pub mod reader;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::GethDbError;
pub use freezer::{FreezerTable, IndexEntry};
pub use reader::GethReader;
