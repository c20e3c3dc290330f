//! The stats aggregator.
//!
//! Serves a cached [`StatsSnapshot`] while it is younger than the TTL and
//! otherwise refreshes it from the upstream API. A refresh never fails:
//! when the upstream is unavailable the last good snapshot is served, or a
//! zeroed placeholder if there has never been one.

use super::cache::StatsCache;
use super::clock::{Clock, SystemClock};
use crate::analysis::{apply_overrides, compute_snapshot};
use crate::models::{StatsOverrides, StatsSnapshot};
use crate::upstream::BountySource;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Default snapshot lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Where a returned snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsSource {
    /// Served from a cache entry younger than the TTL
    Cached,
    /// Computed by this call from upstream data
    Fresh,
    /// Upstream failed; previous snapshot served past its TTL
    Stale,
    /// Upstream failed and nothing was cached; zeroed placeholder
    Empty,
}

impl StatsSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatsSource::Cached => "cached",
            StatsSource::Fresh => "fresh",
            StatsSource::Stale => "stale",
            StatsSource::Empty => "empty",
        }
    }
}

impl fmt::Display for StatsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A snapshot tagged with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsResult {
    pub snapshot: StatsSnapshot,
    pub source: StatsSource,
}

/// Fetches, derives and caches bounty board statistics.
pub struct StatsAggregator {
    source: Arc<dyn BountySource>,
    clock: Arc<dyn Clock>,
    cache: StatsCache,
    refresh_lock: Mutex<()>,
    /// Bumped after every refresh, successful or not.
    refreshes: AtomicU64,
}

impl StatsAggregator {
    /// Create an aggregator reading wall-clock time.
    pub fn new(source: Arc<dyn BountySource>, ttl: Duration) -> Self {
        Self::with_clock(source, Arc::new(SystemClock), ttl)
    }

    pub fn with_clock(source: Arc<dyn BountySource>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            source,
            clock,
            cache: StatsCache::new(ttl),
            refresh_lock: Mutex::new(()),
            refreshes: AtomicU64::new(0),
        }
    }

    /// Current stats. Never fails.
    pub async fn get_stats(&self) -> StatsSnapshot {
        self.fetch_stats().await.snapshot
    }

    /// Current stats with their provenance. Never fails.
    pub async fn fetch_stats(&self) -> StatsResult {
        if let Some(snapshot) = self.cache.get_fresh(self.clock.now()).await {
            return StatsResult {
                snapshot,
                source: StatsSource::Cached,
            };
        }

        let seen = self.refreshes.load(Ordering::Acquire);
        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited for the lock.
        if let Some(snapshot) = self.cache.get_fresh(self.clock.now()).await {
            debug!("Stats refreshed by a concurrent caller");
            return StatsResult {
                snapshot,
                source: StatsSource::Cached,
            };
        }

        // That refresh failed; share its outcome instead of retrying upstream.
        if self.refreshes.load(Ordering::Acquire) != seen {
            debug!("Concurrent refresh failed, serving fallback");
            return self.fallback(self.clock.now()).await;
        }

        let result = self.refresh().await;
        self.refreshes.fetch_add(1, Ordering::Release);
        result
    }

    async fn refresh(&self) -> StatsResult {
        let start = Instant::now();
        debug!(
            "Stats cache expired (ttl {}s), refreshing from upstream",
            self.cache.ttl().as_secs()
        );

        let (bounties, overrides) = futures::future::join(
            self.source.fetch_bounties(),
            self.source.fetch_overrides(),
        )
        .await;

        let now = self.clock.now();

        if let (Err(bounties_err), Err(stats_err)) = (&bounties, &overrides) {
            warn!("Upstream unavailable: {}; {}", bounties_err, stats_err);
            return self.fallback(now).await;
        }

        let bounties = bounties.unwrap_or_else(|e| {
            warn!("Bounty list unavailable, treating as empty: {}", e);
            Vec::new()
        });
        let overrides = overrides.unwrap_or_else(|e| {
            warn!("Upstream stats unavailable, using local metrics only: {}", e);
            StatsOverrides::default()
        });
        if overrides.is_empty() {
            debug!("Upstream stats supplied no overrides");
        }

        let local = compute_snapshot(&bounties, &now.with_timezone(&Local));
        let snapshot = apply_overrides(local, &overrides);

        self.cache.store(snapshot.clone(), now).await;

        info!(
            "Refreshed stats: {} bounties, {} override fields ({:.2}ms)",
            bounties.len(),
            overrides.present_fields(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        StatsResult {
            snapshot,
            source: StatsSource::Fresh,
        }
    }

    async fn fallback(&self, now: DateTime<Utc>) -> StatsResult {
        match self.cache.latest().await {
            Some(snapshot) => {
                warn!("Serving stale stats from {}", snapshot.last_updated.to_rfc3339());
                StatsResult {
                    snapshot,
                    source: StatsSource::Stale,
                }
            }
            None => {
                warn!("No cached stats, serving zeroed placeholder");
                StatsResult {
                    snapshot: StatsSnapshot::zeroed(now),
                    source: StatsSource::Empty,
                }
            }
        }
    }
}
