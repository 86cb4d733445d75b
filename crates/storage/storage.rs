//! Ordered byte-key/byte-value storage for chain data.
//!
//! [`StoreEngine`] is the thin adapter every backend implements; [`Store`]
//! layers chain semantics (headers, bodies, canonical index, state nodes)
//! on top of one, using the same byte-key layout geth uses so that a
//! populated destination reads back with the same schema as the source.

pub mod api;
pub mod error;
pub mod schema;
mod store;
pub mod store_db;

pub use api::StoreEngine;
pub use error::StoreError;
pub use store::{EngineNodeSource, Store};
pub use store_db::in_memory::InMemoryStore;
pub use store_db::redb::RedbStore;
