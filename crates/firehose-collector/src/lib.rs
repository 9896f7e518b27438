//! Ingestion pipeline for Firehose.
//!
//! A poller reads the public event feed into a channel; the
//! [`BatchAccumulator`](accumulator::BatchAccumulator) drains the channel into
//! batches and flushes each batch through the [`Pipeline`](pipeline::Pipeline),
//! which enriches the batch's subjects in one request and writes records,
//! subjects and actors to their collections concurrently.

pub mod accumulator;
pub mod config;
pub mod enrich;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod transport;

pub use accumulator::{AccumulatorConfig, Batch, BatchAccumulator, BatchHandler};
pub use self::config::CollectorConfig;
pub use enrich::EnrichmentClient;
pub use pipeline::Pipeline;
pub use sink::{FlushReport, MultiSink};
pub use source::{EventSource, GithubEventSource, run_poller};
pub use transport::{EnrichmentTransport, HttpTransport};
