//! `GET /list` — documents of one collection, sorted and limited.
//!
//! | Parameter | Default | Notes |
//! |-----------|---------|-------|
//! | `dataType` | events collection | one of the configured collection names |
//! | `limit` | `20` | non-negative integer, `0` for no limit |
//! | `orderBy` | `id` | `id` or any persisted field of the document |
//! | `orderType` | `ascending` | `ascending` or `descending` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  response::{IntoResponse, Response},
};
use firehose_core::{
  actor::ActorSummary,
  collection::{CollectionKind, Collections},
  event::ActivityRecord,
  store::{CollectionStore, KEY_COLUMN, OrderBy, SortOrder},
  subject::EnrichedSubject,
};
use serde::Deserialize;

use crate::{error::ApiError, resolve_data_type};

pub const DEFAULT_LIMIT: u64 = 20;

/// Raw query parameters; an empty value counts as absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  pub data_type:  Option<String>,
  pub limit:      Option<String>,
  pub order_by:   Option<String>,
  pub order_type: Option<String>,
}

impl ListParams {
  pub fn limit(&self) -> Result<u64, ApiError> {
    let Some(raw) = non_empty(&self.limit) else {
      return Ok(DEFAULT_LIMIT);
    };
    let limit: i64 = raw
      .parse()
      .map_err(|_| ApiError::BadRequest(format!("invalid 'limit': {raw}")))?;
    u64::try_from(limit).map_err(|_| {
      ApiError::BadRequest(
        "invalid limit. Limit must be a non-negative integer".to_owned(),
      )
    })
  }

  pub fn order_by(&self) -> Result<OrderBy, ApiError> {
    let column = non_empty(&self.order_by).unwrap_or(KEY_COLUMN).to_owned();
    let direction = match non_empty(&self.order_type) {
      None => SortOrder::default(),
      Some(raw) => raw.parse().map_err(|_| {
        ApiError::BadRequest(format!(
          "invalid order type: '{raw}'. Please specify one of the following \
           order types: '{}', '{}'",
          SortOrder::Ascending,
          SortOrder::Descending,
        ))
      })?,
    };
    Ok(OrderBy { column, direction })
  }
}

pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
  value.as_deref().filter(|v| !v.is_empty())
}

/// `GET /list[?dataType=&limit=&orderBy=&orderType=]`
pub async fn handler<E, R, U>(
  State(collections): State<Arc<Collections<E, R, U>>>,
  Query(params): Query<ListParams>,
) -> Result<Response, ApiError>
where
  E: CollectionStore<Document = ActivityRecord>,
  R: CollectionStore<Document = EnrichedSubject>,
  U: CollectionStore<Document = ActorSummary>,
{
  let limit = params.limit()?;
  let order_by = params.order_by()?;
  let kind = resolve_data_type(&collections, non_empty(&params.data_type))?;

  let response = match kind {
    CollectionKind::Events => {
      find(&collections.events.store, limit, &order_by).await?.into_response()
    }
    CollectionKind::Repos => {
      find(&collections.repos.store, limit, &order_by).await?.into_response()
    }
    CollectionKind::Users => {
      find(&collections.users.store, limit, &order_by).await?.into_response()
    }
  };
  Ok(response)
}

async fn find<S: CollectionStore>(
  store: &S,
  limit: u64,
  order_by: &OrderBy,
) -> Result<Json<Vec<S::Document>>, ApiError> {
  match store.find(limit, order_by).await {
    Ok(docs) => Ok(Json(docs)),
    Err(e) => {
      tracing::error!(error = %e, "failed to list items");
      Err(ApiError::BadRequest(format!("failed to list items: {e}")))
    }
  }
}
