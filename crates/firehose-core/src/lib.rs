//! Core types and trait definitions for the Firehose activity collector.
//!
//! Free of HTTP and database dependencies. The store backend, the collector
//! pipeline and the query API all build on these types.

pub mod actor;
pub mod collection;
pub mod error;
pub mod event;
pub mod store;
pub mod subject;
pub mod timestamp;

pub use error::{Error, Result};
