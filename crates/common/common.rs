pub mod constants;
pub mod types;
mod utils;

pub use ethereum_types::{Address, Bloom, H64, H256, U256};
pub use utils::keccak;
