//! Data models for the stats widget.
//!
//! This module contains the bounty records received from the upstream
//! API, the stats snapshot served to widget consumers, and the optional
//! pre-aggregated overrides the upstream may supply.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// Lifecycle status of a bounty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum BountyStatus {
    /// Open and waiting for a claimant
    #[default]
    Open,
    /// Claimed and being worked on
    Claimed,
    /// Finished
    Completed,
    /// Finished (alternate upstream spelling)
    Done,
    /// Anything the aggregator does not categorize
    Other(String),
}

impl fmt::Display for BountyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BountyStatus::Open => write!(f, "open"),
            BountyStatus::Claimed => write!(f, "claimed"),
            BountyStatus::Completed => write!(f, "completed"),
            BountyStatus::Done => write!(f, "done"),
            BountyStatus::Other(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for BountyStatus {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "open" => BountyStatus::Open,
            "claimed" => BountyStatus::Claimed,
            "completed" => BountyStatus::Completed,
            "done" => BountyStatus::Done,
            other => BountyStatus::Other(other.to_string()),
        }
    }
}

impl BountyStatus {
    /// Whether the bounty has been paid out.
    pub fn is_completed(&self) -> bool {
        matches!(self, BountyStatus::Completed | BountyStatus::Done)
    }

    /// Whether the bounty was ever claimed (completed bounties were claimed first).
    pub fn is_claimed(&self) -> bool {
        matches!(self, BountyStatus::Claimed) || self.is_completed()
    }
}

/// A single bounty as reported by the upstream API.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounty {
    #[allow(dead_code)]
    pub id: String,
    #[allow(dead_code)]
    pub title: String,
    /// Reward in USDC.
    pub reward: f64,
    pub status: BountyStatus,
    #[allow(dead_code)] // Upstream field, kept for completeness
    pub created_at: Option<DateTime<Utc>>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Bounty {
    /// Build a bounty from one upstream JSON record.
    ///
    /// Returns `None` when the record is not a JSON object. Missing or
    /// mistyped fields fall back to empty values rather than rejecting the
    /// whole record.
    pub fn from_value(json: &Value) -> Option<Self> {
        if !json.is_object() {
            return None;
        }

        let id = match &json["id"] {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        };

        let reward = match &json["reward"] {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            _ => 0.0,
        };

        Some(Self {
            id,
            title: json["title"].as_str().unwrap_or("").to_string(),
            reward: if reward.is_finite() { reward } else { 0.0 },
            status: json["status"].as_str().map(BountyStatus::from).unwrap_or_default(),
            created_at: json["created_at"].as_str().and_then(parse_timestamp),
            claimed_at: json["claimed_at"].as_str().and_then(parse_timestamp),
            completed_at: json["completed_at"].as_str().and_then(parse_timestamp),
        })
    }

    /// Hours between claim and completion, if both are known.
    pub fn completion_hours(&self) -> Option<f64> {
        let claimed = self.claimed_at?;
        let completed = self.completed_at?;
        Some((completed - claimed).num_milliseconds() as f64 / 3_600_000.0)
    }
}

/// Parse an ISO 8601 timestamp.
///
/// Offset-less date-times are read as local time and bare dates as UTC
/// midnight, which is how browsers interpret the same strings.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc));
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Aggregate statistics served to widget consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    /// Completed bounties since local midnight.
    pub completed_today: u64,
    /// Completed bounties in the 7 days before local midnight, plus today.
    pub completed_week: u64,
    /// Completed bounties since one calendar month before local midnight.
    pub completed_month: u64,
    /// Total reward paid out over completed bounties.
    #[serde(rename = "totalUSDCPaid")]
    pub total_usdc_paid: f64,
    /// Mean claim-to-completion time, one decimal.
    pub avg_completion_hours: f64,
    /// Completed as a percentage of claimed.
    pub success_rate: u64,
    pub total_bounties: u64,
    pub active_bounties: u64,
    pub last_updated: DateTime<Utc>,
}

impl StatsSnapshot {
    /// A snapshot with every metric zeroed.
    pub fn zeroed(last_updated: DateTime<Utc>) -> Self {
        Self {
            completed_today: 0,
            completed_week: 0,
            completed_month: 0,
            total_usdc_paid: 0.0,
            avg_completion_hours: 0.0,
            success_rate: 0,
            total_bounties: 0,
            active_bounties: 0,
            last_updated,
        }
    }
}

/// Pre-aggregated values supplied by the upstream `/stats` endpoint.
///
/// Each present field replaces the locally computed one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsOverrides {
    pub completed_today: Option<u64>,
    pub completed_week: Option<u64>,
    pub completed_month: Option<u64>,
    pub total_usdc_paid: Option<f64>,
    pub avg_completion_hours: Option<f64>,
    pub success_rate: Option<u64>,
    pub total_bounties: Option<u64>,
    pub active_bounties: Option<u64>,
}

impl StatsOverrides {
    /// Read overrides from the upstream stats object.
    ///
    /// Non-objects yield no overrides; a `null` or mistyped field is
    /// skipped without affecting its neighbours. Count fields must be
    /// non-negative: fractional counts are rounded to the nearest integer
    /// and negative ones are skipped. Amount fields are taken as-is.
    pub fn from_value(json: &Value) -> Self {
        if !json.is_object() {
            return Self::default();
        }

        Self {
            completed_today: as_count("completedToday", &json["completedToday"]),
            completed_week: as_count("completedWeek", &json["completedWeek"]),
            completed_month: as_count("completedMonth", &json["completedMonth"]),
            total_usdc_paid: as_amount(&json["totalUSDCPaid"]),
            avg_completion_hours: as_amount(&json["avgCompletionHours"]),
            success_rate: as_count("successRate", &json["successRate"]),
            total_bounties: as_count("totalBounties", &json["totalBounties"]),
            active_bounties: as_count("activeBounties", &json["activeBounties"]),
        }
    }

    /// Number of overridden fields.
    pub fn present_fields(&self) -> usize {
        [
            self.completed_today.is_some(),
            self.completed_week.is_some(),
            self.completed_month.is_some(),
            self.total_usdc_paid.is_some(),
            self.avg_completion_hours.is_some(),
            self.success_rate.is_some(),
            self.total_bounties.is_some(),
            self.active_bounties.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }

    /// Returns true when no field is overridden.
    pub fn is_empty(&self) -> bool {
        self.present_fields() == 0
    }
}

fn as_count(field: &str, value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    if !f.is_finite() || f < 0.0 {
        debug!("Ignoring {} override {}: not a non-negative count", field, f);
        return None;
    }
    let rounded = f.round() as u64;
    debug!("Rounding {} override {} to {}", field, f, rounded);
    Some(rounded)
}

fn as_amount(value: &Value) -> Option<f64> {
    value.as_f64().filter(|f| f.is_finite())
}
