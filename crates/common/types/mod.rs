mod account;
mod block;
mod receipt;
mod transaction;

pub use account::AccountState;
pub use block::{Block, BlockBody, BlockHeader};
pub use receipt::StoredReceipt;
pub use transaction::Transaction;

use ethereum_types::H256;

pub type BlockNumber = u64;
pub type BlockHash = H256;
