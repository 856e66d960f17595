//! Shared HTTP client for the QR tag platform REST API.
//!
//! Every resource client goes through [`ApiClient`], which owns base-URL
//! handling, bearer auth, trace propagation, status mapping and metrics.
//! Responses are returned as untyped JSON; the resource clients normalize
//! them into local records.

use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use service_core::observability::TracedClientExt;
use std::time::Instant;

use super::error::ApiError;
use super::metrics::record_backend_call;
use crate::config::BackendSettings;

/// Per-call context: the operator's bearer token and the inbound request id.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallContext<'a> {
    pub token: Option<&'a str>,
    pub request_id: Option<&'a str>,
}

impl<'a> CallContext<'a> {
    pub fn new(token: Option<&'a str>, request_id: Option<&'a str>) -> Self {
        Self { token, request_id }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

pub struct ApiClient {
    client: Client,
    settings: BackendSettings,
}

impl ApiClient {
    pub fn new(settings: BackendSettings) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, settings })
    }

    pub fn base_url(&self) -> &str {
        self.settings.url.trim_end_matches('/')
    }

    pub fn page_size(&self) -> u32 {
        self.settings.page_size
    }

    pub async fn get(
        &self,
        ctx: CallContext<'_>,
        endpoint: &str,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Value, ApiError> {
        self.send(ctx, Method::GET, endpoint, path, query, None::<&()>)
            .await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        ctx: CallContext<'_>,
        endpoint: &str,
        path: &str,
        body: &B,
    ) -> Result<Value, ApiError> {
        self.send(ctx, Method::POST, endpoint, path, &[], Some(body))
            .await
    }

    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        ctx: CallContext<'_>,
        endpoint: &str,
        path: &str,
        body: &B,
    ) -> Result<Value, ApiError> {
        self.send(ctx, Method::PATCH, endpoint, path, &[], Some(body))
            .await
    }

    pub async fn delete(
        &self,
        ctx: CallContext<'_>,
        endpoint: &str,
        path: &str,
    ) -> Result<Value, ApiError> {
        self.send(ctx, Method::DELETE, endpoint, path, &[], None::<&()>)
            .await
    }

    /// Sends one request. `endpoint` is the route template used as a metrics
    /// label; `path` is the concrete path.
    async fn send<B: Serialize + ?Sized>(
        &self,
        ctx: CallContext<'_>,
        method: Method,
        endpoint: &str,
        path: &str,
        query: &[(String, String)],
        body: Option<&B>,
    ) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url(), path);
        let started = Instant::now();

        let mut request = self
            .client
            .traced(method.clone(), &url)
            .bearer_auth_opt(ctx.token)
            .request_id(ctx.request_id);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let result = match request.send().await {
            Ok(response) => Self::read_response(response).await,
            Err(e) => {
                tracing::error!(method = %method, url = %url, error = %e, "Backend request failed");
                Err(ApiError::from(e))
            }
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(ApiError::Transport(_)) => "transport_error",
            Err(_) => "error",
        };
        record_backend_call(
            method.as_str(),
            endpoint,
            outcome,
            started.elapsed().as_secs_f64(),
        );

        result
    }

    async fn read_response(response: reqwest::Response) -> Result<Value, ApiError> {
        let status = response.status();
        let text = response.text().await?;

        let body: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(_) if status.is_success() => {
                    tracing::warn!(status = %status, "Backend returned a non-JSON body");
                    Value::Null
                }
                Err(_) => Value::String(text),
            }
        };

        if status.is_success() {
            return Ok(body);
        }

        let message = error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

        tracing::warn!(status = %status, message = %message, "Backend rejected request");

        Err(match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            _ => ApiError::Upstream { status, message },
        })
    }
}

/// Pulls a human-readable message out of an error body.
fn error_message(body: &Value) -> Option<String> {
    match body {
        Value::String(s) if !s.trim().is_empty() && s.len() < 300 => Some(s.trim().to_string()),
        Value::Object(obj) => ["message", "error", "msg"]
            .iter()
            .filter_map(|key| obj.get(*key))
            .find_map(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Object(inner) => inner
                    .get("message")
                    .and_then(Value::as_str)
                    .map(|s| s.to_string()),
                _ => None,
            }),
        _ => None,
    }
}
