//! Analytics Aggregation Engine.
//!
//! Three read-only metrics, each computed in its own pass over the store with no shared
//! intermediate state:
//! - time-to-triage: arrival to first vitals record, in whole minutes (floored),
//! - EWS distribution: highest-precedence level per visit over a trailing window,
//! - active census: non-terminal visits broken down by status and by arrival path.
//!
//! Reads take no locks beyond what the store needs for a consistent row read, so results
//! may be slightly stale relative to concurrent writes.

use super::assessments::most_relevant;
use super::bounded;
use crate::config::CoreConfig;
use crate::store::VisitStore;
use crate::TriageResult;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use triage_types::{ArrivalPath, EwsLevel, VisitStatus};

/// Summary statistics for time-to-triage, in minutes.
///
/// With no qualifying visits every statistic is `None` and `count` is 0.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeToTriageStats {
    pub count: usize,
    pub mean_minutes: Option<f64>,
    pub median_minutes: Option<f64>,
    pub min_minutes: Option<i64>,
    pub max_minutes: Option<i64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LevelShare {
    pub level: EwsLevel,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EwsDistribution {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    /// Visits in the window that have at least one assessment.
    pub total: usize,
    /// One entry per level, least severe first.
    pub levels: Vec<LevelShare>,
}

impl EwsDistribution {
    pub fn share(&self, level: EwsLevel) -> Option<&LevelShare> {
        self.levels.iter().find(|s| s.level == level)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusBreakdown {
    pub waiting: usize,
    pub in_triage: usize,
    pub roomed: usize,
}

impl StatusBreakdown {
    pub fn total(&self) -> usize {
        self.waiting + self.in_triage + self.roomed
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArrivalPathBreakdown {
    pub walk_in: usize,
    pub ems: usize,
    pub trauma_direct: usize,
    pub other: usize,
}

impl ArrivalPathBreakdown {
    pub fn total(&self) -> usize {
        self.walk_in + self.ems + self.trauma_direct + self.other
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActiveCensus {
    pub total: usize,
    pub by_status: StatusBreakdown,
    pub by_arrival_path: ArrivalPathBreakdown,
}

/// Results of computing every metric concurrently. One failing metric does not hide the others.
#[derive(Debug)]
pub struct AnalyticsSnapshot {
    pub time_to_triage: TriageResult<TimeToTriageStats>,
    pub ews_distribution: TriageResult<EwsDistribution>,
    pub active_census: TriageResult<ActiveCensus>,
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Whole minutes between two instants, rounded towards negative infinity.
pub fn floor_minutes(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_seconds().div_euclid(60)
}

/// Aggregate durations (minutes) into summary statistics.
pub fn summarise_durations(mut minutes: Vec<i64>) -> TimeToTriageStats {
    if minutes.is_empty() {
        return TimeToTriageStats::default();
    }
    minutes.sort_unstable();

    let count = minutes.len();
    let sum: i64 = minutes.iter().sum();
    let mid = count / 2;
    let median = if count % 2 == 0 {
        (minutes[mid - 1] + minutes[mid]) as f64 / 2.0
    } else {
        minutes[mid] as f64
    };

    TimeToTriageStats {
        count,
        mean_minutes: Some(round_one_decimal(sum as f64 / count as f64)),
        median_minutes: Some(median),
        min_minutes: minutes.first().copied(),
        max_minutes: minutes.last().copied(),
    }
}

/// Tally levels into a distribution; percentages are of `levels.len()`.
pub fn tally_levels(
    levels: &[EwsLevel],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> EwsDistribution {
    let total = levels.len();
    let shares = EwsLevel::ALL
        .iter()
        .map(|&level| {
            let count = levels.iter().filter(|&&l| l == level).count();
            let percentage = if total == 0 {
                0.0
            } else {
                round_one_decimal(count as f64 * 100.0 / total as f64)
            };
            LevelShare {
                level,
                count,
                percentage,
            }
        })
        .collect();

    EwsDistribution {
        window_start,
        window_end,
        total,
        levels: shares,
    }
}

#[derive(Clone)]
pub struct AnalyticsEngine {
    cfg: Arc<CoreConfig>,
    store: Arc<dyn VisitStore>,
}

impl AnalyticsEngine {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<dyn VisitStore>) -> Self {
        Self { cfg, store }
    }

    /// Time-to-triage over every visit on record.
    pub async fn time_to_triage(&self) -> TriageResult<TimeToTriageStats> {
        self.time_to_triage_since(DateTime::<Utc>::MIN_UTC).await
    }

    /// Time-to-triage over visits that arrived at or after `since`.
    ///
    /// Only visits with at least one vitals record contribute. A first vitals record that
    /// predates arrival is treated as bad data and skipped.
    pub async fn time_to_triage_since(
        &self,
        since: DateTime<Utc>,
    ) -> TriageResult<TimeToTriageStats> {
        let timeout = self.cfg.store_timeout();
        let visits = bounded(
            timeout,
            "list_visits_since",
            self.store.list_visits_since(since),
        )
        .await?;

        let mut minutes = Vec::new();
        for visit in &visits {
            let earliest = bounded(
                timeout,
                "earliest_vitals_for_visit",
                self.store.earliest_vitals_for_visit(visit.id),
            )
            .await?;
            let Some(first) = earliest else { continue };

            let duration = floor_minutes(visit.arrived_at, first.recorded_at);
            if duration < 0 {
                tracing::warn!(visit_id = %visit.id, "vitals recorded before arrival; skipped");
                continue;
            }
            minutes.push(duration);
        }

        Ok(summarise_durations(minutes))
    }

    /// EWS distribution over the configured trailing window ending now.
    pub async fn ews_distribution(&self) -> TriageResult<EwsDistribution> {
        self.ews_distribution_at(Utc::now()).await
    }

    /// EWS distribution over the window ending at `now`.
    pub async fn ews_distribution_at(&self, now: DateTime<Utc>) -> TriageResult<EwsDistribution> {
        let timeout = self.cfg.store_timeout();
        let window_start = now - self.cfg.ews_window();
        let visits = bounded(
            timeout,
            "list_visits_since",
            self.store.list_visits_since(window_start),
        )
        .await?;

        let mut levels = Vec::new();
        for visit in visits.iter().filter(|v| v.arrived_at <= now) {
            let assessments = bounded(
                timeout,
                "list_assessments_for_visit",
                self.store.list_assessments_for_visit(visit.id),
            )
            .await?;
            if let Some(top) = most_relevant(&assessments) {
                levels.push(top.level);
            }
        }

        Ok(tally_levels(&levels, window_start, now))
    }

    /// Live snapshot of every visit in a non-terminal status.
    pub async fn active_census(&self) -> TriageResult<ActiveCensus> {
        let visits = bounded(
            self.cfg.store_timeout(),
            "list_visits_by_status",
            self.store.list_visits_by_status(&VisitStatus::ACTIVE),
        )
        .await?;

        let mut census = ActiveCensus::default();
        for visit in &visits {
            match visit.status {
                VisitStatus::Waiting => census.by_status.waiting += 1,
                VisitStatus::InTriage => census.by_status.in_triage += 1,
                VisitStatus::Roomed => census.by_status.roomed += 1,
                // The store filter should make this unreachable; never count it.
                VisitStatus::Discharged | VisitStatus::LeftWithoutBeingSeen => continue,
            }
            match visit.arrival_path {
                ArrivalPath::WalkIn => census.by_arrival_path.walk_in += 1,
                ArrivalPath::Ems => census.by_arrival_path.ems += 1,
                ArrivalPath::TraumaDirect => census.by_arrival_path.trauma_direct += 1,
                ArrivalPath::Other => census.by_arrival_path.other += 1,
            }
            census.total += 1;
        }

        Ok(census)
    }

    /// Compute all three metrics concurrently.
    pub async fn snapshot(&self) -> AnalyticsSnapshot {
        let (time_to_triage, ews_distribution, active_census) = tokio::join!(
            self.time_to_triage(),
            self.ews_distribution(),
            self.active_census()
        );

        for (metric, failed) in [
            ("time_to_triage", time_to_triage.is_err()),
            ("ews_distribution", ews_distribution.is_err()),
            ("active_census", active_census.is_err()),
        ] {
            if failed {
                tracing::warn!(metric, "analytics metric unavailable");
            }
        }

        AnalyticsSnapshot {
            time_to_triage,
            ews_distribution,
            active_census,
        }
    }
}
