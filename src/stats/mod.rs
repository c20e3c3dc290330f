//! Cached stats aggregation.
//!
//! This module owns the snapshot cache and the refresh logic that keeps it
//! populated from the upstream bounty API.

pub mod cache;
pub mod clock;
pub mod service;

#[cfg(test)]
pub mod testing;

pub use service::{StatsAggregator, DEFAULT_TTL};
