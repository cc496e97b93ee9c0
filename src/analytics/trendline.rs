//! Hourly trendline reconstruction from sparse snapshots
//!
//! Builds one shared hourly axis spanning the earliest launch up to now and
//! fills every entity's value at every point, so a chart can draw all lines
//! against the same x-axis without gaps.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::interpolation::{EntityTimeline, GapFillStrategy, MetricPair, StepHoldInterpolation};
use super::{AnalyticsError, AnalyticsResult};
use crate::models::{Entity, Snapshot};

const SECONDS_PER_HOUR: i64 = 3600;
const COMMENTS_SUFFIX: &str = "_comments";

/// Field names a series key may not shadow
pub const RESERVED_KEYS: [&str; 2] = ["time_label", "numeric_hour"];

/// Key holding the secondary metric for `key`
#[must_use]
pub fn comments_key(key: &str) -> String {
    format!("{key}{COMMENTS_SUFFIX}")
}

/// Check that a set of series keys flattens into one unambiguous object
///
/// A key may not be an axis field, and may not equal another key's
/// comments companion.
///
/// # Errors
///
/// Returns [`AnalyticsError::KeyCollision`] naming the first offending key.
pub fn check_series_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> AnalyticsResult<()> {
    let keys: BTreeSet<&str> = keys.into_iter().collect();

    for key in &keys {
        if RESERVED_KEYS.contains(key) {
            return Err(AnalyticsError::KeyCollision {
                key: (*key).to_string(),
                with: (*key).to_string(),
            });
        }
        if let Some(base) = key.strip_suffix(COMMENTS_SUFFIX) {
            if keys.contains(base) {
                return Err(AnalyticsError::KeyCollision {
                    key: (*key).to_string(),
                    with: comments_key(base),
                });
            }
        }
    }

    Ok(())
}

/// One point on a reconstructed axis
///
/// Serializes as a flat object: `time_label`, `numeric_hour` and one number
/// per tracked key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub time_label: String,
    /// Hours since the Unix epoch; fractional only for a trailing sub-hour point
    pub numeric_hour: f64,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

impl TrendPoint {
    #[must_use]
    pub fn new(time_label: impl Into<String>, numeric_hour: f64) -> Self {
        Self {
            time_label: time_label.into(),
            numeric_hour,
            values: BTreeMap::new(),
        }
    }

    /// Primary value for `key`, zero when absent
    #[must_use]
    pub fn value(&self, key: &str) -> f64 {
        self.values.get(key).copied().unwrap_or(0.0)
    }

    /// Secondary value for `key`, zero when absent
    #[must_use]
    pub fn comments(&self, key: &str) -> f64 {
        self.values.get(&comments_key(key)).copied().unwrap_or(0.0)
    }

    /// Add `metrics` under `key` and its comments companion
    pub fn add(&mut self, key: &str, metrics: MetricPair) {
        *self.values.entry(key.to_string()).or_insert(0.0) += metrics.primary;
        *self.values.entry(comments_key(key)).or_insert(0.0) += metrics.secondary;
    }

    /// Sum of every value at this point
    #[must_use]
    pub fn total(&self) -> f64 {
        self.values.values().sum()
    }
}

fn hour_of(at: DateTime<Utc>) -> i64 {
    at.timestamp().div_euclid(SECONDS_PER_HOUR)
}

fn hour_start(hour: i64) -> AnalyticsResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(hour * SECONDS_PER_HOUR, 0)
        .ok_or(AnalyticsError::AxisOutOfRange(hour))
}

fn is_on_hour(at: DateTime<Utc>) -> bool {
    at.minute() == 0 && at.second() == 0 && at.nanosecond() == 0
}

/// Reconstructs time-aligned per-entity trendlines
#[derive(Debug)]
pub struct TrendlineReconstructor {
    strategy: Box<dyn GapFillStrategy>,
}

impl Default for TrendlineReconstructor {
    fn default() -> Self {
        Self::new()
    }
}

impl TrendlineReconstructor {
    /// Reconstructor using step-hold with launch interpolation
    #[must_use]
    pub fn new() -> Self {
        Self::with_strategy(Box::new(StepHoldInterpolation))
    }

    #[must_use]
    pub fn with_strategy(strategy: Box<dyn GapFillStrategy>) -> Self {
        Self { strategy }
    }

    #[must_use]
    pub fn strategy(&self) -> &dyn GapFillStrategy {
        self.strategy.as_ref()
    }

    /// Reconstruct up to the current time
    pub fn reconstruct(
        &self,
        snapshots: &[Snapshot],
        entities: &[Entity],
    ) -> AnalyticsResult<Vec<TrendPoint>> {
        self.reconstruct_at(snapshots, entities, Utc::now())
    }

    /// Reconstruct up to `now`
    ///
    /// The axis runs hourly from the earliest launch hour to the hour
    /// containing `now`, plus one trailing point at `now` itself when it is
    /// not on an hour boundary. Leading all-zero points are trimmed except
    /// for the one immediately before the first activity.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InvalidTimestamp`] if any snapshot or entity
    /// timestamp cannot be parsed, and [`AnalyticsError::KeyCollision`] if an
    /// entity name shadows an axis field or another entity's comments key.
    pub fn reconstruct_at(
        &self,
        snapshots: &[Snapshot],
        entities: &[Entity],
        now: DateTime<Utc>,
    ) -> AnalyticsResult<Vec<TrendPoint>> {
        if entities.is_empty() {
            return Ok(Vec::new());
        }
        check_series_keys(entities.iter().map(|e| e.name.as_str()))?;

        let timelines = build_timelines(snapshots, entities)?;
        let start_hour = timelines
            .iter()
            .map(|tl| hour_of(tl.launched_at))
            .min()
            .unwrap_or(0);
        let end_hour = hour_of(now);

        let mut points = Vec::with_capacity((end_hour - start_hour + 2).max(0) as usize);

        for hour in start_hour..=end_hour {
            let at = hour_start(hour)?;
            let mut point = TrendPoint::new(at.format("%b %d, %H:00").to_string(), hour as f64);

            for tl in &timelines {
                let metrics = if hour < hour_of(tl.launched_at) {
                    MetricPair::ZERO
                } else {
                    self.strategy.fill(tl, at)
                };
                point.add(&tl.name, metrics);
            }

            points.push(point);
        }

        if !is_on_hour(now) {
            let numeric_hour = now.timestamp_millis() as f64 / (SECONDS_PER_HOUR * 1000) as f64;
            let mut point = TrendPoint::new(now.format("%b %d, %H:%M").to_string(), numeric_hour);
            for tl in &timelines {
                let metrics = tl.latest_at(now).map_or(MetricPair::ZERO, |s| s.metrics);
                point.add(&tl.name, metrics);
            }
            points.push(point);
        }

        let points = trim_dead_air(points);

        tracing::debug!(
            entities = timelines.len(),
            snapshots = snapshots.len(),
            points = points.len(),
            strategy = self.strategy.name(),
            "Reconstructed trendlines"
        );

        Ok(points)
    }
}

/// Group snapshots by entity id and parse every timestamp
fn build_timelines(snapshots: &[Snapshot], entities: &[Entity]) -> AnalyticsResult<Vec<EntityTimeline>> {
    let mut by_entity: HashMap<&str, Vec<&Snapshot>> = HashMap::new();
    for snapshot in snapshots {
        by_entity
            .entry(snapshot.entity_id.as_str())
            .or_default()
            .push(snapshot);
    }

    let timelines = entities
        .iter()
        .map(|entity| {
            let owned = by_entity.remove(entity.id.as_str()).unwrap_or_default();
            EntityTimeline::from_entity(entity, owned)
        })
        .collect::<AnalyticsResult<Vec<_>>>()?;

    // Orphans still have to parse; a bad timestamp anywhere is a caller bug
    let orphaned: usize = by_entity.values().map(Vec::len).sum();
    for snapshot in by_entity.values().flatten() {
        snapshot.captured_at()?;
    }
    if orphaned > 0 {
        tracing::debug!(orphaned, "Ignoring snapshots for unknown entities");
    }

    Ok(timelines)
}

/// Drop leading points with no activity, keeping one zero anchor
fn trim_dead_air(points: Vec<TrendPoint>) -> Vec<TrendPoint> {
    match points.iter().position(|p| p.total() > 0.0) {
        Some(first_active) => {
            let keep_from = first_active.saturating_sub(1);
            points.into_iter().skip(keep_from).collect()
        }
        None => points,
    }
}
