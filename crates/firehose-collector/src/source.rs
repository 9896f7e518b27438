//! The public event feed and the poller feeding the accumulator.

use std::{future::Future, time::Duration};

use chrono::{DateTime, Utc};
use firehose_core::event::{ActivityRecord, ActorRef, SubjectRef};
use reqwest::Client;
use serde::Deserialize;
use tokio::{
  sync::mpsc,
  time::{self, MissedTickBehavior},
};

use crate::{error::SourceError, transport::USER_AGENT};

/// One page of the most recent public activity.
pub trait EventSource: Send + Sync {
  fn poll_once(
    &self,
  ) -> impl Future<Output = Result<Vec<ActivityRecord>, SourceError>> + Send + '_;
}

// ─── HTTP source ─────────────────────────────────────────────────────────────

/// [`EventSource`] reading the GitHub public events endpoint.
#[derive(Clone)]
pub struct GithubEventSource {
  client: Client,
  url:    String,
  token:  String,
}

impl GithubEventSource {
  pub fn new(url: impl Into<String>, token: impl Into<String>) -> reqwest::Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .user_agent(USER_AGENT)
      .build()?;
    Ok(Self { client, url: url.into(), token: token.into() })
  }
}

impl EventSource for GithubEventSource {
  async fn poll_once(&self) -> Result<Vec<ActivityRecord>, SourceError> {
    let resp = self
      .client
      .get(&self.url)
      .bearer_auth(&self.token)
      .header(reqwest::header::ACCEPT, "application/vnd.github+json")
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(SourceError::Status { status: status.as_u16(), body });
    }

    decode_events(&resp.bytes().await?)
  }
}

// ─── Wire format ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct FeedEvent {
  id:         String,
  #[serde(rename = "type")]
  kind:       String,
  created_at: DateTime<Utc>,
  #[serde(default)]
  public:     bool,
  repo:       FeedRepo,
  actor:      FeedActor,
}

#[derive(Debug, Deserialize)]
struct FeedRepo {
  name: String,
  url:  String,
}

#[derive(Debug, Deserialize)]
struct FeedActor {
  id:         i64,
  login:      String,
  url:        String,
  avatar_url: String,
}

impl From<FeedEvent> for ActivityRecord {
  fn from(e: FeedEvent) -> Self {
    Self {
      id:         e.id,
      kind:       e.kind,
      created_at: e.created_at,
      public:     e.public,
      subject:    SubjectRef { full_name: e.repo.name, url: e.repo.url },
      actor:      ActorRef {
        id:         e.actor.id,
        login:      e.actor.login,
        url:        e.actor.url,
        avatar_url: e.actor.avatar_url,
      },
    }
  }
}

/// Decode one page of the public events feed.
pub fn decode_events(body: &[u8]) -> Result<Vec<ActivityRecord>, SourceError> {
  let events: Vec<FeedEvent> = serde_json::from_slice(body)?;
  Ok(events.into_iter().map(ActivityRecord::from).collect())
}

// ─── Poller ──────────────────────────────────────────────────────────────────

/// Poll `source` every `every` and forward each record to `records`.
///
/// A failed poll is logged and retried on the next tick. Returns once the
/// receiving side has gone away.
pub async fn run_poller<S: EventSource>(
  source: S,
  records: mpsc::Sender<ActivityRecord>,
  every: Duration,
) {
  let mut ticker = time::interval(every);
  ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

  loop {
    tokio::select! {
      _ = ticker.tick() => {}
      _ = records.closed() => break,
    }
    tracing::info!("fetching events");

    let page = match source.poll_once().await {
      Ok(page) => page,
      Err(e) => {
        tracing::error!(error = %e, "failed to fetch events");
        continue;
      }
    };
    tracing::debug!(count = page.len(), "fetched events");

    for record in page {
      if records.send(record).await.is_err() {
        break;
      }
    }
  }
  tracing::info!("accumulator closed, stopping poller");
}
