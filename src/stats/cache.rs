//! Single-entry snapshot cache.

use crate::models::StatsSnapshot;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::RwLock;

/// A snapshot and the instant it was produced.
#[derive(Debug, Clone)]
pub struct CachedStats {
    pub snapshot: StatsSnapshot,
    pub cached_at: DateTime<Utc>,
}

/// Holds at most one snapshot. Entries are only ever replaced whole.
#[derive(Debug)]
pub struct StatsCache {
    ttl: Duration,
    entry: RwLock<Option<CachedStats>>,
}

impl StatsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: RwLock::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached snapshot, if it is younger than the TTL at `now`.
    pub async fn get_fresh(&self, now: DateTime<Utc>) -> Option<StatsSnapshot> {
        let entry = self.entry.read().await;
        let cached = entry.as_ref()?;

        // A clock that moved backwards counts as age zero.
        let age = (now - cached.cached_at).to_std().unwrap_or_default();
        (age < self.ttl).then(|| cached.snapshot.clone())
    }

    /// The cached snapshot regardless of age.
    pub async fn latest(&self) -> Option<StatsSnapshot> {
        self.entry.read().await.as_ref().map(|c| c.snapshot.clone())
    }

    /// Replace the cached entry.
    pub async fn store(&self, snapshot: StatsSnapshot, cached_at: DateTime<Utc>) {
        *self.entry.write().await = Some(CachedStats {
            snapshot,
            cached_at,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_empty_cache() {
        let cache = StatsCache::new(Duration::from_secs(300));
        assert!(cache.get_fresh(t0()).await.is_none());
        assert!(cache.latest().await.is_none());
    }

    #[tokio::test]
    async fn test_fresh_until_ttl() {
        let cache = StatsCache::new(Duration::from_secs(300));
        cache.store(StatsSnapshot::zeroed(t0()), t0()).await;

        let just_before = t0() + chrono::Duration::seconds(299);
        let at_ttl = t0() + chrono::Duration::seconds(300);

        assert!(cache.get_fresh(just_before).await.is_some());
        assert!(cache.get_fresh(at_ttl).await.is_none());
        assert!(cache.latest().await.is_some());
    }

    #[tokio::test]
    async fn test_clock_skew_counts_as_fresh() {
        let cache = StatsCache::new(Duration::from_secs(300));
        cache.store(StatsSnapshot::zeroed(t0()), t0()).await;

        let earlier = t0() - chrono::Duration::seconds(30);
        assert!(cache.get_fresh(earlier).await.is_some());
    }

    #[tokio::test]
    async fn test_store_replaces_entry() {
        let cache = StatsCache::new(Duration::from_secs(300));
        cache.store(StatsSnapshot::zeroed(t0()), t0()).await;

        let later = t0() + chrono::Duration::minutes(10);
        let mut snapshot = StatsSnapshot::zeroed(later);
        snapshot.total_bounties = 7;
        cache.store(snapshot.clone(), later).await;

        assert_eq!(cache.latest().await, Some(snapshot));
    }
}
