//! Upstream bounty API access.
//!
//! This module defines the [`BountySource`] seam the stats aggregator pulls
//! from, the errors a fetch can produce, and the reqwest-backed client.

pub mod client;

pub use client::HttpBountySource;

use crate::models::{Bounty, StatsOverrides};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Path of the bounty list endpoint, relative to the API base URL.
pub const BOUNTIES_PATH: &str = "/bounties";

/// Path of the pre-aggregated stats endpoint, relative to the API base URL.
pub const STATS_PATH: &str = "/stats";

/// A failed upstream fetch.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Request to {endpoint} timed out after {after:?}")]
    Timeout { endpoint: String, after: Duration },

    #[error("Cannot connect to bounty API at {endpoint}")]
    Connect { endpoint: String },

    #[error("Request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Bounty API {endpoint} returned {status}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
    },

    #[error("Malformed JSON from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unexpected payload from {endpoint}: {reason}")]
    Shape { endpoint: String, reason: String },
}

/// Where the aggregator gets its raw data.
#[async_trait]
pub trait BountySource: Send + Sync {
    /// Fetch the full bounty list.
    async fn fetch_bounties(&self) -> Result<Vec<Bounty>, UpstreamError>;

    /// Fetch the pre-aggregated stats overrides.
    async fn fetch_overrides(&self) -> Result<StatsOverrides, UpstreamError>;
}
