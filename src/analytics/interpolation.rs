//! Gap-filling strategies for sparse snapshot series
//!
//! Snapshots arrive at an irregular cadence, so the value of an entity at an
//! arbitrary axis point has to be inferred. The reconstructor owns the axis
//! and the pre-launch rule; everything after launch is delegated to a
//! [`GapFillStrategy`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::AnalyticsResult;
use crate::models::{Entity, Snapshot};

/// Primary and secondary metric values at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricPair {
    pub primary: f64,
    pub secondary: f64,
}

impl MetricPair {
    pub const ZERO: Self = Self {
        primary: 0.0,
        secondary: 0.0,
    };

    #[must_use]
    pub fn new(primary: f64, secondary: f64) -> Self {
        Self { primary, secondary }
    }

    /// Scale both metrics by `fraction`
    #[must_use]
    pub fn scaled(self, fraction: f64) -> Self {
        Self {
            primary: self.primary * fraction,
            secondary: self.secondary * fraction,
        }
    }

    /// Linear blend from `self` (fraction 0) to `other` (fraction 1)
    #[must_use]
    pub fn lerp(self, other: Self, fraction: f64) -> Self {
        Self {
            primary: self.primary + (other.primary - self.primary) * fraction,
            secondary: self.secondary + (other.secondary - self.secondary) * fraction,
        }
    }
}

impl From<&Snapshot> for MetricPair {
    fn from(snapshot: &Snapshot) -> Self {
        Self::new(
            snapshot.metric_primary as f64,
            snapshot.metric_secondary as f64,
        )
    }
}

/// A snapshot reduced to its parsed time and metrics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub at: DateTime<Utc>,
    pub metrics: MetricPair,
}

/// One entity's launch anchor and its time-sorted samples
#[derive(Debug, Clone)]
pub struct EntityTimeline {
    pub name: String,
    pub launched_at: DateTime<Utc>,
    samples: Vec<Sample>,
}

impl EntityTimeline {
    /// Build a timeline; samples are sorted by capture time
    pub fn new(name: impl Into<String>, launched_at: DateTime<Utc>, mut samples: Vec<Sample>) -> Self {
        samples.sort_by_key(|s| s.at);
        Self {
            name: name.into(),
            launched_at,
            samples,
        }
    }

    /// Build from an entity and the snapshots that belong to it
    pub fn from_entity<'a>(
        entity: &Entity,
        snapshots: impl IntoIterator<Item = &'a Snapshot>,
    ) -> AnalyticsResult<Self> {
        let launched_at = entity.launched_at()?;
        let samples = snapshots
            .into_iter()
            .map(|s| {
                Ok(Sample {
                    at: s.captured_at()?,
                    metrics: MetricPair::from(s),
                })
            })
            .collect::<AnalyticsResult<Vec<_>>>()?;

        Ok(Self::new(entity.name.clone(), launched_at, samples))
    }

    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Number of samples captured at or before `at`
    #[must_use]
    pub fn seen_by(&self, at: DateTime<Utc>) -> usize {
        self.samples.partition_point(|s| s.at <= at)
    }

    /// Latest sample captured at or before `at`
    #[must_use]
    pub fn latest_at(&self, at: DateTime<Utc>) -> Option<&Sample> {
        match self.seen_by(at) {
            0 => None,
            n => self.samples.get(n - 1),
        }
    }

    /// Fraction of the launch → `target` span elapsed at `at`, clamped to [0, 1]
    fn launch_fraction(&self, target: DateTime<Utc>, at: DateTime<Utc>) -> f64 {
        let span = (target - self.launched_at).num_milliseconds();
        if span <= 0 {
            return 0.0;
        }
        let elapsed = (at - self.launched_at).num_milliseconds();
        (elapsed as f64 / span as f64).clamp(0.0, 1.0)
    }
}

/// Policy for inferring an entity's metrics at a post-launch instant
pub trait GapFillStrategy: Send + Sync + fmt::Debug {
    /// Short identifier used in logs and configuration
    fn name(&self) -> &'static str;

    /// Metrics at `at`; only called for instants in or after the launch hour
    fn fill(&self, timeline: &EntityTimeline, at: DateTime<Utc>) -> MetricPair;
}

/// Hold the last known value; ramp linearly from zero at launch up to the
/// first snapshot while none has been seen yet
#[derive(Debug, Clone, Copy, Default)]
pub struct StepHoldInterpolation;

impl GapFillStrategy for StepHoldInterpolation {
    fn name(&self) -> &'static str {
        "step_hold"
    }

    fn fill(&self, timeline: &EntityTimeline, at: DateTime<Utc>) -> MetricPair {
        if let Some(sample) = timeline.latest_at(at) {
            return sample.metrics;
        }

        match timeline.samples().first() {
            Some(first) => first
                .metrics
                .scaled(timeline.launch_fraction(first.at, at)),
            None => MetricPair::ZERO,
        }
    }
}

/// Interpolate linearly between the snapshots surrounding each instant
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearInterpolation;

impl GapFillStrategy for LinearInterpolation {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn fill(&self, timeline: &EntityTimeline, at: DateTime<Utc>) -> MetricPair {
        let samples = timeline.samples();
        let seen = timeline.seen_by(at);

        match (seen.checked_sub(1).and_then(|i| samples.get(i)), samples.get(seen)) {
            (Some(prev), Some(next)) => {
                let span = (next.at - prev.at).num_milliseconds();
                if span <= 0 {
                    return next.metrics;
                }
                let fraction = (at - prev.at).num_milliseconds() as f64 / span as f64;
                prev.metrics.lerp(next.metrics, fraction.clamp(0.0, 1.0))
            }
            (Some(prev), None) => prev.metrics,
            (None, Some(first)) => first
                .metrics
                .scaled(timeline.launch_fraction(first.at, at)),
            (None, None) => MetricPair::ZERO,
        }
    }
}

/// Configurable selector for the built-in strategies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMode {
    #[default]
    StepHold,
    Linear,
}

impl InterpolationMode {
    /// Instantiate the strategy this mode names
    #[must_use]
    pub fn strategy(self) -> Box<dyn GapFillStrategy> {
        match self {
            Self::StepHold => Box::new(StepHoldInterpolation),
            Self::Linear => Box::new(LinearInterpolation),
        }
    }

    /// Parse from a config/env string
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "step_hold" | "step-hold" | "step" => Some(Self::StepHold),
            "linear" => Some(Self::Linear),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, h, m, 0).unwrap()
    }

    fn timeline(samples: &[(DateTime<Utc>, f64)]) -> EntityTimeline {
        EntityTimeline::new(
            "acme",
            at(9, 0),
            samples
                .iter()
                .map(|&(at, v)| Sample {
                    at,
                    metrics: MetricPair::new(v, v / 10.0),
                })
                .collect(),
        )
    }

    #[test]
    fn test_step_hold_holds_last_value() {
        let tl = timeline(&[(at(9, 30), 40.0), (at(10, 30), 80.0)]);
        let strategy = StepHoldInterpolation;

        assert_eq!(strategy.fill(&tl, at(10, 0)).primary, 40.0);
        assert_eq!(strategy.fill(&tl, at(11, 0)).primary, 80.0);
        assert_eq!(strategy.fill(&tl, at(10, 30)).primary, 80.0);
    }

    #[test]
    fn test_step_hold_ramps_to_first_snapshot() {
        let tl = timeline(&[(at(11, 0), 40.0)]);
        let strategy = StepHoldInterpolation;

        assert_eq!(strategy.fill(&tl, at(9, 0)).primary, 0.0);
        let mid = strategy.fill(&tl, at(10, 0));
        assert!((mid.primary - 20.0).abs() < 1e-9);
        assert!((mid.secondary - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_step_hold_without_samples_is_zero() {
        let tl = timeline(&[]);
        assert_eq!(StepHoldInterpolation.fill(&tl, at(12, 0)), MetricPair::ZERO);
    }

    #[test]
    fn test_launch_fraction_is_clamped() {
        let tl = timeline(&[(at(10, 0), 50.0)]);
        // Same hour as launch but before the launch instant
        let early = EntityTimeline::new(
            "late",
            at(9, 40),
            vec![Sample {
                at: at(10, 40),
                metrics: MetricPair::new(30.0, 0.0),
            }],
        );

        assert_eq!(StepHoldInterpolation.fill(&early, at(9, 0)).primary, 0.0);
        assert_eq!(StepHoldInterpolation.fill(&tl, at(9, 0) - Duration::hours(1)).primary, 0.0);
    }

    #[test]
    fn test_linear_between_samples() {
        let tl = timeline(&[(at(10, 0), 40.0), (at(12, 0), 80.0)]);
        let strategy = LinearInterpolation;

        assert!((strategy.fill(&tl, at(11, 0)).primary - 60.0).abs() < 1e-9);
        assert_eq!(strategy.fill(&tl, at(13, 0)).primary, 80.0);
        assert!((strategy.fill(&tl, at(9, 30)).primary - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(InterpolationMode::parse("linear"), Some(InterpolationMode::Linear));
        assert_eq!(InterpolationMode::parse("Step-Hold"), Some(InterpolationMode::StepHold));
        assert_eq!(InterpolationMode::parse("cubic"), None);
        assert_eq!(InterpolationMode::StepHold.strategy().name(), "step_hold");
    }
}
