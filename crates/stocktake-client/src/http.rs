//! # HTTP Backend
//!
//! `reqwest` implementation of [`StockTakeBackend`] and [`ProductLookup`].
//!
//! ## Request Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  build URL ──► Authorization: Bearer ──► send ──► status check          │
//! │  (segment-                (+ X-Request-Id on       │                    │
//! │   encoded)                 mutating calls)         │                    │
//! │                                                    ▼                    │
//! │                         2xx: body → serde_json → wire::parse_*          │
//! │                         other: body → most specific message             │
//! │                                → ClientError::Status { status, msg }    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No retries: a failed request is reported once and the caller reloads.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use stocktake_core::wire;
use stocktake_core::{LookupResult, StockTakeItem, StockTakeSession};

use crate::backend::{ProductLookup, StockTakeBackend};
use crate::config::BackendSettings;
use crate::error::{ClientError, ClientResult};

const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// REST client for the inventory backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpBackend {
    /// Builds a client from the `[backend]` settings.
    pub fn new(settings: &BackendSettings) -> ClientResult<Self> {
        let base_url = Url::parse(&settings.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(settings.base_url.clone()));
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(HttpBackend {
            client,
            base_url,
            token: settings.api_token.clone(),
        })
    }

    /// `{base}/seg/seg/...` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mutating = method != Method::GET;
        let mut request = self.client.request(method, url);

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if mutating {
            request = request.header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());
        }
        request
    }

    async fn get_json(&self, url: Url) -> ClientResult<Value> {
        debug!(%url, "GET");
        let response = self.request(Method::GET, url).send().await?;
        let body = Self::checked_body(response).await?;

        if body.trim().is_empty() {
            return Err(ClientError::InvalidResponse("empty response body".into()));
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Sends a mutating request. Empty and 204 bodies are fine.
    async fn send_mutation(&self, request: RequestBuilder) -> ClientResult<()> {
        let response = request.send().await?;
        Self::checked_body(response).await?;
        Ok(())
    }

    /// Returns the body of a 2xx response, or the error it describes.
    async fn checked_body(response: Response) -> ClientResult<String> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let message = error_message(status, &body);
        warn!(status = status.as_u16(), %message, "Backend rejected request");
        Err(ClientError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl StockTakeBackend for HttpBackend {
    async fn fetch_session(&self, session_id: &str) -> ClientResult<StockTakeSession> {
        let url = self.endpoint(&["stock-takes", session_id])?;
        let value = self.get_json(url).await?;
        Ok(wire::parse_session(&value)?)
    }

    async fn fetch_items(&self, session_id: &str) -> ClientResult<Vec<StockTakeItem>> {
        let url = self.endpoint(&["stock-takes", session_id, "items"])?;
        let value = self.get_json(url).await?;
        Ok(wire::parse_items(&value)?)
    }

    async fn update_item_count(
        &self,
        session_id: &str,
        item_id: &str,
        counted_qty: i64,
    ) -> ClientResult<()> {
        let url = self.endpoint(&["stock-takes", session_id, "items", item_id])?;
        debug!(%url, counted = counted_qty, "PATCH count");
        let request = self
            .request(Method::PATCH, url)
            .json(&json!({ "counted_quantity": counted_qty }));
        self.send_mutation(request).await
    }

    async fn complete_session(&self, session_id: &str) -> ClientResult<()> {
        let url = self.endpoint(&["stock-takes", session_id, "complete"])?;
        debug!(%url, "POST complete");
        self.send_mutation(self.request(Method::POST, url)).await
    }

    async fn delete_session(&self, session_id: &str) -> ClientResult<()> {
        let url = self.endpoint(&["stock-takes", session_id])?;
        debug!(%url, "DELETE session");
        self.send_mutation(self.request(Method::DELETE, url)).await
    }
}

#[async_trait]
impl ProductLookup for HttpBackend {
    async fn lookup(&self, barcode: &str) -> ClientResult<LookupResult> {
        let mut url = self.endpoint(&["products", "lookup"])?;
        url.query_pairs_mut().append_pair("barcode", barcode);
        let value = self.get_json(url).await?;
        Ok(wire::parse_lookup(&value)?)
    }
}

// =============================================================================
// Error Body Extraction
// =============================================================================

/// Picks the most specific human-readable text out of an error body.
///
/// Order: `detail`, `message`, `error`, then `data.detail` / `data.message`,
/// then the raw body, then a status-derived fallback.
pub fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        let top = ["detail", "message", "error"]
            .iter()
            .find_map(|key| text_at(&value, key));
        let nested = || {
            value
                .get("data")
                .and_then(|data| ["detail", "message"].iter().find_map(|key| text_at(data, key)))
        };
        if let Some(text) = top.or_else(nested) {
            return text;
        }
    }

    let raw = body.trim();
    if !raw.is_empty() {
        return raw.to_string();
    }

    match status.canonical_reason() {
        Some(reason) => format!("Request failed ({} {})", status.as_u16(), reason),
        None => format!("Request failed ({})", status.as_u16()),
    }
}

/// Non-empty string at `key`. A validation list (`[{"msg": ..}]`) yields its first `msg`.
fn text_at(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Array(list) => list
            .first()
            .and_then(|first| first.get("msg"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}
