//! Bounty metric computation.
//!
//! Pure functions deriving a [`StatsSnapshot`] from a bounty list at a
//! given instant, and merging upstream overrides over the result.

use crate::models::{Bounty, BountyStatus, StatsOverrides, StatsSnapshot};
use chrono::{DateTime, Days, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};

/// Inclusive lower bounds of the completion windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCutoffs {
    /// Local midnight of the current day.
    pub today: DateTime<Utc>,
    /// Local midnight seven calendar days before `today`.
    pub week: DateTime<Utc>,
    /// One calendar month before `today` (rolling, not month-to-date).
    pub month: DateTime<Utc>,
}

/// Compute the window cutoffs for `now` in its own timezone.
pub fn window_cutoffs<Tz: TimeZone>(now: &DateTime<Tz>) -> WindowCutoffs {
    let tz = now.timezone();
    let date = now.date_naive();

    let week_date = date.checked_sub_days(Days::new(7)).unwrap_or(date);
    // Month subtraction clamps to the last day (Mar 31 -> Feb 29).
    let month_date = date.checked_sub_months(Months::new(1)).unwrap_or(date);

    WindowCutoffs {
        today: start_of_day(&tz, date),
        week: start_of_day(&tz, week_date),
        month: start_of_day(&tz, month_date),
    }
}

/// First instant of `date` in `tz`, in UTC.
fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);

    // Zones that skip midnight on DST change start the day an hour later.
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

/// Derive all metrics locally from `bounties`, stamped with `now`.
pub fn compute_snapshot<Tz: TimeZone>(bounties: &[Bounty], now: &DateTime<Tz>) -> StatsSnapshot {
    let cutoffs = window_cutoffs(now);

    let completed: Vec<&Bounty> = bounties.iter().filter(|b| b.status.is_completed()).collect();
    let claimed = bounties.iter().filter(|b| b.status.is_claimed()).count();

    let completed_since = |cutoff: DateTime<Utc>| {
        completed
            .iter()
            .filter(|b| b.completed_at.is_some_and(|at| at >= cutoff))
            .count() as u64
    };

    let total_usdc_paid: f64 = completed.iter().map(|b| b.reward).sum();

    let durations: Vec<f64> = completed.iter().filter_map(|b| b.completion_hours()).collect();
    let avg_completion_hours = if durations.is_empty() {
        0.0
    } else {
        round_one_decimal(durations.iter().sum::<f64>() / durations.len() as f64)
    };

    let success_rate = if claimed > 0 {
        (completed.len() as f64 * 100.0 / claimed as f64).round() as u64
    } else {
        0
    };

    StatsSnapshot {
        completed_today: completed_since(cutoffs.today),
        completed_week: completed_since(cutoffs.week),
        completed_month: completed_since(cutoffs.month),
        total_usdc_paid,
        avg_completion_hours,
        success_rate,
        total_bounties: bounties.len() as u64,
        active_bounties: bounties
            .iter()
            .filter(|b| b.status == BountyStatus::Open)
            .count() as u64,
        last_updated: now.with_timezone(&Utc),
    }
}

/// Replace each locally computed metric with its upstream override, if any.
pub fn apply_overrides(local: StatsSnapshot, overrides: &StatsOverrides) -> StatsSnapshot {
    StatsSnapshot {
        completed_today: overrides.completed_today.unwrap_or(local.completed_today),
        completed_week: overrides.completed_week.unwrap_or(local.completed_week),
        completed_month: overrides.completed_month.unwrap_or(local.completed_month),
        total_usdc_paid: overrides.total_usdc_paid.unwrap_or(local.total_usdc_paid),
        avg_completion_hours: overrides
            .avg_completion_hours
            .unwrap_or(local.avg_completion_hours),
        success_rate: overrides.success_rate.unwrap_or(local.success_rate),
        total_bounties: overrides.total_bounties.unwrap_or(local.total_bounties),
        active_bounties: overrides.active_bounties.unwrap_or(local.active_bounties),
        last_updated: local.last_updated,
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
