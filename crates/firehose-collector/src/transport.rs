//! Transport for the enrichment query.

use std::{future::Future, time::Duration};

use reqwest::Client;
use serde::Serialize;

use crate::error::EnrichError;

pub(crate) const USER_AGENT: &str =
  concat!("firehose-collector/", env!("CARGO_PKG_VERSION"));

/// A single textual query, sent as `{"query": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphQlRequest {
  pub query: String,
}

/// Sends one enrichment request and returns the raw response body.
pub trait EnrichmentTransport: Send + Sync {
  fn send<'a>(
    &'a self,
    request: &'a GraphQlRequest,
  ) -> impl Future<Output = Result<Vec<u8>, EnrichError>> + Send + 'a;
}

/// [`EnrichmentTransport`] over HTTPS with a bearer token.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpTransport {
  client: Client,
  url:    String,
  token:  String,
}

impl HttpTransport {
  /// Every request is bounded by `timeout`; expiry surfaces as
  /// [`EnrichError::Timeout`].
  pub fn new(
    url: impl Into<String>,
    token: impl Into<String>,
    timeout: Duration,
  ) -> reqwest::Result<Self> {
    let client = Client::builder()
      .timeout(timeout)
      .user_agent(USER_AGENT)
      .build()?;
    Ok(Self { client, url: url.into(), token: token.into() })
  }
}

impl EnrichmentTransport for HttpTransport {
  async fn send(&self, request: &GraphQlRequest) -> Result<Vec<u8>, EnrichError> {
    let resp = self
      .client
      .post(&self.url)
      .bearer_auth(&self.token)
      .json(request)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(EnrichError::Status { status: status.as_u16(), body });
    }

    let body = resp.bytes().await?;
    tracing::trace!(len = body.len(), "enrichment response received");
    Ok(body.to_vec())
  }
}
