//! Read-only JSON query API over the Firehose collections.
//!
//! Exposes an axum [`Router`] backed by any set of [`CollectionStore`]s.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/list`  | see [`list`] for parameters |
//! | `GET`  | `/count` | `?dataType=<collection>` |

pub mod count;
pub mod error;
pub mod list;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use firehose_core::{
  actor::ActorSummary,
  collection::{CollectionKind, Collections},
  event::ActivityRecord,
  store::CollectionStore,
  subject::EnrichedSubject,
};
use firehose_store_sqlite::StoreConfig;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `api.toml` and
/// `FIREHOSE_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  pub host:              String,
  pub port:              u16,
  pub events_db:         PathBuf,
  pub events_collection: String,
  pub repos_db:          PathBuf,
  pub repos_collection:  String,
  pub users_db:          PathBuf,
  pub users_collection:  String,
}

impl Default for ApiConfig {
  fn default() -> Self {
    let store = StoreConfig::default();
    Self {
      host:              "0.0.0.0".to_owned(),
      port:              8080,
      events_db:         store.events_db,
      events_collection: store.events_collection,
      repos_db:          store.repos_db,
      repos_collection:  store.repos_collection,
      users_db:          store.users_db,
      users_collection:  store.users_collection,
    }
  }
}

impl ApiConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn store(&self) -> StoreConfig {
    StoreConfig {
      events_db:         self.events_db.clone(),
      events_collection: self.events_collection.clone(),
      repos_db:          self.repos_db.clone(),
      repos_collection:  self.repos_collection.clone(),
      users_db:          self.users_db.clone(),
      users_collection:  self.users_collection.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the query API router over `collections`.
pub fn api_router<E, R, U>(collections: Arc<Collections<E, R, U>>) -> Router<()>
where
  E: CollectionStore<Document = ActivityRecord> + 'static,
  R: CollectionStore<Document = EnrichedSubject> + 'static,
  U: CollectionStore<Document = ActorSummary> + 'static,
{
  Router::new()
    .route("/list", get(list::handler::<E, R, U>))
    .route("/count", get(count::handler::<E, R, U>))
    .layer(TraceLayer::new_for_http())
    .with_state(collections)
}

/// The collection named by `dataType`, defaulting to the events collection.
pub(crate) fn resolve_data_type<E, R, U>(
  collections: &Collections<E, R, U>,
  data_type: Option<&str>,
) -> Result<CollectionKind, ApiError>
where
  E: CollectionStore<Document = ActivityRecord>,
  R: CollectionStore<Document = EnrichedSubject>,
  U: CollectionStore<Document = ActorSummary>,
{
  let name = data_type.unwrap_or(&collections.events.name);
  Ok(collections.resolve(name)?)
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use chrono::{TimeZone, Utc};
  use firehose_core::{
    event::{ActorRef, SubjectRef},
    store::Document,
  };
  use firehose_store_sqlite::{SqliteCollections, open_collections_in_memory};
  use serde_json::Value;
  use tower::ServiceExt as _;

  use super::*;

  fn event(id: &str, actor: i64, secs: i64) -> ActivityRecord {
    ActivityRecord {
      id:         id.into(),
      kind:       "PushEvent".into(),
      created_at: Utc.timestamp_opt(secs, 0).unwrap(),
      public:     true,
      subject:    SubjectRef {
        full_name: "octo/widgets".into(),
        url:       "https://api.github.com/repos/octo/widgets".into(),
      },
      actor:      ActorRef {
        id:         actor,
        login:      format!("user{actor}"),
        url:        format!("https://api.github.com/users/user{actor}"),
        avatar_url: format!("https://avatars.example/{actor}"),
      },
    }
  }

  async fn seeded() -> Arc<SqliteCollections> {
    let c = open_collections_in_memory().await.unwrap();
    let events = vec![event("e2", 1, 30), event("e1", 2, 10), event("e3", 3, 20)];
    let actors: HashMap<_, _> = events
      .iter()
      .map(|e| {
        let a = ActorSummary::from(e);
        (a.key(), a)
      })
      .collect();
    c.events.store.insert_many(events).await.unwrap();
    c.users.store.upsert_by_id(actors).await.unwrap();
    Arc::new(c)
  }

  async fn get_json(collections: Arc<SqliteCollections>, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = api_router(collections).oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
  }

  fn ids(body: &Value) -> Vec<Value> {
    body.as_array().unwrap().iter().map(|d| d["id"].clone()).collect()
  }

  // ── /list ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn list_defaults_to_events_by_ascending_id() {
    let (status, body) = get_json(seeded().await, "/list").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec!["e1", "e2", "e3"]);
    assert_eq!(body[0]["type"], "PushEvent");
    assert_eq!(body[0]["actor"]["login"], "user2");
  }

  #[tokio::test]
  async fn list_honours_type_order_and_limit() {
    let (status, body) = get_json(
      seeded().await,
      "/list?dataType=users&orderBy=login&orderType=descending&limit=2",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![3, 2]);
  }

  #[tokio::test]
  async fn list_sorts_on_timestamps() {
    let (_, body) =
      get_json(seeded().await, "/list?orderBy=created_at&orderType=descending").await;
    assert_eq!(ids(&body), vec!["e2", "e3", "e1"]);
  }

  #[tokio::test]
  async fn list_rejects_bad_parameters() {
    let c = seeded().await;
    for uri in [
      "/list?limit=-1",
      "/list?limit=lots",
      "/list?orderType=sideways",
      "/list?orderBy=body",
    ] {
      let (status, body) = get_json(c.clone(), uri).await;
      assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
      assert!(body["error"].is_string(), "{uri}");
    }
  }

  #[tokio::test]
  async fn unknown_data_type_lists_supported_types() {
    let (status, body) = get_json(seeded().await, "/list?dataType=orgs").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
      body["error"],
      "unknown data type: 'orgs'. Supported data types are: events, repos, users."
    );
  }

  // ── /count ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn count_reports_collection_sizes() {
    let c = seeded().await;
    assert_eq!(get_json(c.clone(), "/count").await.1, serde_json::json!({ "count": 3 }));
    assert_eq!(get_json(c.clone(), "/count?dataType=repos").await.1["count"], 0);
    assert_eq!(get_json(c, "/count?dataType=users").await.1["count"], 3);
  }

  #[tokio::test]
  async fn count_rejects_unknown_data_type() {
    let (status, body) = get_json(seeded().await, "/count?dataType=orgs").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("unknown data type"));
  }

  // ── Configuration ─────────────────────────────────────────────────────────

  #[test]
  fn default_config_listens_on_8080() {
    let cfg = ApiConfig::default();
    assert_eq!(cfg.address(), "0.0.0.0:8080");
    assert_eq!(cfg.store().users_collection, "users");
  }
}
