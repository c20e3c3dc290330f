//! Test doubles for the aggregator's clock and upstream.

use super::clock::Clock;
use crate::models::{Bounty, BountyStatus, StatsOverrides};
use crate::upstream::{BountySource, UpstreamError, BOUNTIES_PATH, STATS_PATH};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn bounty(status: &str, reward: f64) -> Bounty {
    Bounty {
        id: String::new(),
        title: String::new(),
        reward,
        status: BountyStatus::from(status),
        created_at: None,
        claimed_at: None,
        completed_at: None,
    }
}

/// A clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// In-memory upstream. `None` makes the corresponding endpoint fail.
pub struct FakeSource {
    bounties: Mutex<Option<Vec<Bounty>>>,
    overrides: Mutex<Option<StatsOverrides>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(bounties: Vec<Bounty>) -> Self {
        Self {
            bounties: Mutex::new(Some(bounties)),
            overrides: Mutex::new(Some(StatsOverrides::default())),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Both endpoints fail.
    pub fn failing() -> Self {
        let source = Self::new(Vec::new());
        source.set_bounties(None);
        source.set_overrides(None);
        source
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_bounties(&self, bounties: Option<Vec<Bounty>>) {
        *self.bounties.lock().unwrap() = bounties;
    }

    pub fn set_overrides(&self, overrides: Option<StatsOverrides>) {
        *self.overrides.lock().unwrap() = overrides;
    }

    /// Number of refreshes that reached the upstream.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn unavailable(endpoint: &str) -> UpstreamError {
        UpstreamError::Status {
            endpoint: endpoint.to_string(),
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[async_trait]
impl BountySource for FakeSource {
    async fn fetch_bounties(&self) -> Result<Vec<Bounty>, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let bounties = self.bounties.lock().unwrap().clone();
        bounties.ok_or_else(|| Self::unavailable(BOUNTIES_PATH))
    }

    async fn fetch_overrides(&self) -> Result<StatsOverrides, UpstreamError> {
        let overrides = self.overrides.lock().unwrap().clone();
        overrides.ok_or_else(|| Self::unavailable(STATS_PATH))
    }
}
