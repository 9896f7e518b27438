//! The flush controller.
//!
//! [`BatchAccumulator`] buffers incoming records and hands the buffer to a
//! [`BatchHandler`] when either the buffer reaches `max_items` or `max_idle`
//! has passed since the last flush with records still waiting. Record arrival
//! and the idle timer are multiplexed in one `select!` loop, so a size flush
//! and an idle flush can never run against the same buffer.

use std::{future::Future, mem, time::Duration};

use firehose_core::event::ActivityRecord;
use tokio::{
  sync::mpsc,
  time::{self, Instant, MissedTickBehavior},
};

/// Flush thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccumulatorConfig {
  /// Flush as soon as this many records are buffered. Must be at least 1.
  pub max_items: usize,
  /// Flush a non-empty buffer after this long without a flush.
  pub max_idle:  Duration,
}

impl Default for AccumulatorConfig {
  fn default() -> Self {
    Self { max_items: 3, max_idle: Duration::from_secs(10) }
  }
}

// ─── Batch ───────────────────────────────────────────────────────────────────

/// The records accumulated between two flushes, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
  records: Vec<ActivityRecord>,
}

impl Batch {
  pub fn with_capacity(capacity: usize) -> Self {
    Self { records: Vec::with_capacity(capacity) }
  }

  pub fn push(&mut self, record: ActivityRecord) { self.records.push(record); }

  pub fn len(&self) -> usize { self.records.len() }

  pub fn is_empty(&self) -> bool { self.records.is_empty() }

  pub fn records(&self) -> &[ActivityRecord] { &self.records }
}

impl From<Vec<ActivityRecord>> for Batch {
  fn from(records: Vec<ActivityRecord>) -> Self { Self { records } }
}

/// What caused a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
  Size,
  Idle,
  /// The input channel closed with records still buffered.
  Closed,
}

// ─── Handler ─────────────────────────────────────────────────────────────────

/// Consumes flushed batches.
///
/// The accumulator awaits each flush before accepting the next record.
pub trait BatchHandler: Send + Sync {
  fn flush(&self, batch: Batch) -> impl Future<Output = ()> + Send + '_;
}

// ─── Accumulator ─────────────────────────────────────────────────────────────

pub struct BatchAccumulator<H> {
  handler: H,
  config:  AccumulatorConfig,
  buffer:  Batch,
}

impl<H: BatchHandler> BatchAccumulator<H> {
  pub fn new(handler: H, config: AccumulatorConfig) -> Self {
    let buffer = Batch::with_capacity(config.max_items);
    Self { handler, config, buffer }
  }

  /// Drive the control loop until `records` closes, then flush whatever is
  /// still buffered and return.
  pub async fn run(mut self, mut records: mpsc::Receiver<ActivityRecord>) {
    let max_idle = self.config.max_idle;
    let mut idle = time::interval_at(Instant::now() + max_idle, max_idle);
    idle.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
      max_items = self.config.max_items,
      max_idle_secs = max_idle.as_secs(),
      "accumulator started"
    );

    loop {
      tokio::select! {
        received = records.recv() => match received {
          Some(record) => {
            self.buffer.push(record);
            if self.buffer.len() >= self.config.max_items {
              self.flush(FlushTrigger::Size).await;
              idle.reset();
            }
          }
          None => {
            self.flush(FlushTrigger::Closed).await;
            break;
          }
        },
        _ = idle.tick() => self.flush(FlushTrigger::Idle).await,
      }
    }

    tracing::info!("accumulator stopped");
  }

  async fn flush(&mut self, trigger: FlushTrigger) {
    if self.buffer.is_empty() {
      return;
    }
    let batch = mem::replace(
      &mut self.buffer,
      Batch::with_capacity(self.config.max_items),
    );
    tracing::info!(?trigger, records = batch.len(), "flushing batch");
    self.handler.flush(batch).await;
  }
}
