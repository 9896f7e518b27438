//! `GET /count[?dataType=]` — `{"count": n}` for one collection.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use firehose_core::{
  actor::ActorSummary,
  collection::{CollectionKind, Collections},
  event::ActivityRecord,
  store::CollectionStore,
  subject::EnrichedSubject,
};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, list::non_empty, resolve_data_type};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountParams {
  pub data_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DataCount {
  pub count: i64,
}

pub async fn handler<E, R, U>(
  State(collections): State<Arc<Collections<E, R, U>>>,
  Query(params): Query<CountParams>,
) -> Result<Json<DataCount>, ApiError>
where
  E: CollectionStore<Document = ActivityRecord>,
  R: CollectionStore<Document = EnrichedSubject>,
  U: CollectionStore<Document = ActorSummary>,
{
  let kind = resolve_data_type(&collections, non_empty(&params.data_type))?;
  let count = match kind {
    CollectionKind::Events => count_of(&collections.events.store).await,
    CollectionKind::Repos => count_of(&collections.repos.store).await,
    CollectionKind::Users => count_of(&collections.users.store).await,
  };

  let count = count.map_err(|e| {
    let name = collections.name_of(kind);
    tracing::error!(collection = name, error = %e, "failed to count");
    ApiError::Store(format!("failed to count '{name}'"))
  })?;
  Ok(Json(DataCount { count }))
}

async fn count_of<S: CollectionStore>(
  store: &S,
) -> Result<i64, Box<dyn std::error::Error + Send + Sync>> {
  Ok(store.count().await?)
}
