//! HTTP client for the upstream bounty API.
//!
//! Both endpoints are parsed defensively: the bounty list may be a bare
//! array or an object wrapping one, and the stats object may carry any
//! subset of the snapshot fields.

use super::{BountySource, UpstreamError, BOUNTIES_PATH, STATS_PATH};
use crate::models::{Bounty, StatsOverrides};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Keys that may wrap the bounty array in an object payload, in lookup order.
const LIST_KEYS: [&str; 3] = ["bounties", "data", "items"];

/// [`BountySource`] backed by the upstream REST API.
#[derive(Debug, Clone)]
pub struct HttpBountySource {
    base_url: String,
    timeout: Duration,
    http_client: reqwest::Client,
}

impl HttpBountySource {
    /// Create a client for `base_url` with a per-request `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bountystats/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            http_client,
        })
    }

    /// The API base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` and return the body of a successful response.
    async fn get_body(&self, path: &str) -> Result<String, UpstreamError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Fetching {}", url);

        let response = self
            .http_client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.request_error(path, e))?;

        if !response.status().is_success() {
            return Err(UpstreamError::Status {
                endpoint: path.to_string(),
                status: response.status(),
            });
        }

        response.text().await.map_err(|e| self.request_error(path, e))
    }

    fn request_error(&self, path: &str, e: reqwest::Error) -> UpstreamError {
        if e.is_timeout() {
            UpstreamError::Timeout {
                endpoint: path.to_string(),
                after: self.timeout,
            }
        } else if e.is_connect() {
            UpstreamError::Connect {
                endpoint: format!("{}{}", self.base_url, path),
            }
        } else {
            UpstreamError::Request {
                endpoint: path.to_string(),
                source: e,
            }
        }
    }
}

#[async_trait]
impl BountySource for HttpBountySource {
    async fn fetch_bounties(&self) -> Result<Vec<Bounty>, UpstreamError> {
        let body = self.get_body(BOUNTIES_PATH).await?;
        parse_bounty_list(&body)
    }

    async fn fetch_overrides(&self) -> Result<StatsOverrides, UpstreamError> {
        let body = self.get_body(STATS_PATH).await?;
        parse_stats_overrides(&body)
    }
}

/// Parse a `/bounties` payload.
///
/// Accepts a bare array or an object wrapping the array under one of
/// `bounties`, `data` or `items`. Array elements that are not objects are
/// dropped.
pub fn parse_bounty_list(body: &str) -> Result<Vec<Bounty>, UpstreamError> {
    let json: Value = serde_json::from_str(body).map_err(|source| UpstreamError::Decode {
        endpoint: BOUNTIES_PATH.to_string(),
        source,
    })?;

    let items = match &json {
        Value::Array(items) => items,
        Value::Object(map) => LIST_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .ok_or_else(|| UpstreamError::Shape {
                endpoint: BOUNTIES_PATH.to_string(),
                reason: "object has no bounty array".to_string(),
            })?,
        other => {
            return Err(UpstreamError::Shape {
                endpoint: BOUNTIES_PATH.to_string(),
                reason: format!("expected array or object, got {}", json_kind(other)),
            })
        }
    };

    let bounties: Vec<Bounty> = items.iter().filter_map(Bounty::from_value).collect();
    if bounties.len() < items.len() {
        debug!(
            "Skipped {} malformed bounty records",
            items.len() - bounties.len()
        );
    }

    Ok(bounties)
}

/// Parse a `/stats` payload into per-field overrides.
pub fn parse_stats_overrides(body: &str) -> Result<StatsOverrides, UpstreamError> {
    let json: Value = serde_json::from_str(body).map_err(|source| UpstreamError::Decode {
        endpoint: STATS_PATH.to_string(),
        source,
    })?;

    if !json.is_object() {
        return Err(UpstreamError::Shape {
            endpoint: STATS_PATH.to_string(),
            reason: format!("expected object, got {}", json_kind(&json)),
        });
    }

    Ok(StatsOverrides::from_value(&json))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
