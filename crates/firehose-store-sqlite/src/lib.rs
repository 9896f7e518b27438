//! SQLite backend for Firehose collections.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Each logical collection is one table
//! holding the document key and its JSON body.

mod collections;
mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use collections::{
  SqliteCollections, StoreConfig, open_collections, open_collections_in_memory,
};
pub use store::SqliteCollection;
