//! Success patterns and niche profiles over enriched launch records
//!
//! This module provides:
//! - Ranking of recurring (icp, problem, niche) combinations
//! - Per-niche profiles with leaderboards, saturation and week-over-week trend
//!
//! Records without structured analysis are skipped everywhere; a field that
//! enrichment left unspecified only drops the record from groupings on that
//! field.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::scoring::ScoringConfig;
use super::{AnalyticsError, AnalyticsResult};
use crate::models::EnrichedRecord;

/// A recurring (icp, problem, niche) combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessPattern {
    pub icp: String,
    pub problem: String,
    pub niche: String,
    pub count: usize,
    pub avg_primary: f64,
    pub avg_secondary: f64,
    pub score: f64,
}

/// Direction of launch volume in a niche
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Stable,
    Declining,
}

impl TrendDirection {
    /// Compare launch counts in the trailing window against the one before it
    ///
    /// # Classification
    /// - nothing in either window: Stable
    /// - nothing before, something now: Rising
    /// - `recent / previous > rising_ratio`: Rising
    /// - `recent / previous < declining_ratio`: Declining
    /// - otherwise: Stable
    #[must_use]
    pub fn from_window_counts(recent: usize, previous: usize, config: &ScoringConfig) -> Self {
        match (recent, previous) {
            (0, 0) => Self::Stable,
            (_, 0) => Self::Rising,
            _ => {
                let ratio = recent as f64 / previous as f64;
                if ratio > config.trend_rising_ratio {
                    Self::Rising
                } else if ratio < config.trend_declining_ratio {
                    Self::Declining
                } else {
                    Self::Stable
                }
            }
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rising => "rising",
            Self::Stable => "stable",
            Self::Declining => "declining",
        }
    }
}

/// A record on a niche leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub id: String,
    pub name: String,
    pub metric_primary: u64,
    pub metric_secondary: u64,
}

impl From<&EnrichedRecord> for RecordSummary {
    fn from(record: &EnrichedRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            metric_primary: record.metric_primary,
            metric_secondary: record.metric_secondary,
        }
    }
}

/// Label with its occurrence count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    pub label: String,
    pub count: usize,
}

/// Aggregate view of one niche
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NicheProfile {
    pub niche: String,
    pub total: usize,
    pub avg_primary: f64,
    pub avg_secondary: f64,
    pub top_records: Vec<RecordSummary>,
    pub top_problems: Vec<FrequencyEntry>,
    pub top_icps: Vec<FrequencyEntry>,
    /// 0 to 100
    pub saturation_score: f64,
    pub trend: TrendDirection,
}

/// Most frequent labels first, ties alphabetical
pub(crate) fn frequency_table<'a>(labels: impl IntoIterator<Item = &'a str>, limit: usize) -> Vec<FrequencyEntry> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }

    let mut entries: Vec<FrequencyEntry> = counts
        .into_iter()
        .map(|(label, count)| FrequencyEntry {
            label: label.to_string(),
            count,
        })
        .collect();

    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    entries.truncate(limit);
    entries
}

/// Running sums for one group of records
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MetricTally {
    pub count: usize,
    sum_primary: u64,
    sum_secondary: u64,
}

impl MetricTally {
    pub fn add(&mut self, record: &EnrichedRecord) {
        self.count += 1;
        self.sum_primary = self.sum_primary.saturating_add(record.metric_primary);
        self.sum_secondary = self.sum_secondary.saturating_add(record.metric_secondary);
    }

    pub fn avg_primary(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum_primary as f64 / self.count as f64
        }
    }

    pub fn avg_secondary(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum_secondary as f64 / self.count as f64
        }
    }
}

/// Success-pattern and niche analysis over an enriched record corpus
#[derive(Debug, Clone, Default)]
pub struct PatternAnalyzer {
    config: ScoringConfig,
}

impl PatternAnalyzer {
    #[must_use]
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Top `limit` recurring (icp, problem, niche) combinations
    ///
    /// Combinations seen only once are not patterns and never returned.
    #[must_use]
    pub fn success_patterns(&self, records: &[EnrichedRecord], limit: usize) -> Vec<SuccessPattern> {
        let mut groups: HashMap<(&str, &str, &str), MetricTally> = HashMap::new();

        for record in records {
            let Some(analysis) = record.analysis() else {
                continue;
            };
            let (Some(icp), Some(problem), Some(niche)) = (
                analysis.icp.known(),
                analysis.problem.known(),
                analysis.niche.known(),
            ) else {
                continue;
            };
            groups.entry((icp, problem, niche)).or_default().add(record);
        }

        let mut patterns: Vec<SuccessPattern> = groups
            .into_iter()
            .filter(|(_, tally)| tally.count >= 2)
            .map(|((icp, problem, niche), tally)| {
                let avg_primary = tally.avg_primary();
                let avg_secondary = tally.avg_secondary();
                SuccessPattern {
                    icp: icp.to_string(),
                    problem: problem.to_string(),
                    niche: niche.to_string(),
                    count: tally.count,
                    avg_primary,
                    avg_secondary,
                    score: self.config.pattern_score(avg_primary, avg_secondary, tally.count),
                }
            })
            .collect();

        patterns.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| b.count.cmp(&a.count))
                .then_with(|| (&a.icp, &a.problem, &a.niche).cmp(&(&b.icp, &b.problem, &b.niche)))
        });
        patterns.truncate(limit);

        tracing::debug!(patterns = patterns.len(), records = records.len(), "Ranked success patterns");
        patterns
    }

    /// Profile of the niche matching `niche` case-insensitively
    ///
    /// Returns `Ok(None)` when no record belongs to it.
    ///
    /// # Errors
    ///
    /// Returns an error if a matching record's `launched_at` cannot be parsed.
    pub fn niche_profile(
        &self,
        records: &[EnrichedRecord],
        niche: &str,
        now: DateTime<Utc>,
    ) -> AnalyticsResult<Option<NicheProfile>> {
        let wanted = niche.trim().to_lowercase();
        let members: Vec<&EnrichedRecord> = records
            .iter()
            .filter(|record| {
                record
                    .analysis()
                    .and_then(|a| a.niche.known())
                    .is_some_and(|n| n.to_lowercase() == wanted)
            })
            .collect();

        if members.is_empty() {
            return Ok(None);
        }

        self.build_profile(niche.trim(), &members, now).map(Some)
    }

    /// Profiles of every known niche, largest first
    ///
    /// # Errors
    ///
    /// Returns an error if any classified record's `launched_at` cannot be parsed.
    pub fn niche_overview(&self, records: &[EnrichedRecord], now: DateTime<Utc>) -> AnalyticsResult<Vec<NicheProfile>> {
        // Keyed by lowercase name; the first spelling seen names the niche
        let mut niches: Vec<(String, Vec<&EnrichedRecord>)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for record in records {
            let Some(niche) = record.analysis().and_then(|a| a.niche.known()) else {
                continue;
            };
            let slot = *index.entry(niche.to_lowercase()).or_insert_with(|| {
                niches.push((niche.to_string(), Vec::new()));
                niches.len() - 1
            });
            niches[slot].1.push(record);
        }

        let mut profiles = niches
            .iter()
            .map(|(name, members)| self.build_profile(name, members, now))
            .collect::<AnalyticsResult<Vec<_>>>()?;

        profiles.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.niche.cmp(&b.niche)));
        Ok(profiles)
    }

    fn build_profile(&self, niche: &str, members: &[&EnrichedRecord], now: DateTime<Utc>) -> AnalyticsResult<NicheProfile> {
        let top_n = self.config.profile_top_n;

        let mut tally = MetricTally::default();
        for record in members {
            tally.add(record);
        }
        let avg_primary = tally.avg_primary();
        let avg_secondary = tally.avg_secondary();

        let mut ranked: Vec<&EnrichedRecord> = members.to_vec();
        ranked.sort_by(|a, b| {
            b.metric_primary
                .cmp(&a.metric_primary)
                .then_with(|| b.metric_secondary.cmp(&a.metric_secondary))
                .then_with(|| a.name.cmp(&b.name))
        });
        let top_records = ranked.into_iter().take(top_n).map(RecordSummary::from).collect();

        let analyses = members.iter().filter_map(|r| r.analysis());
        let top_problems = frequency_table(analyses.clone().filter_map(|a| a.problem.known()), top_n);
        let top_icps = frequency_table(analyses.filter_map(|a| a.icp.known()), top_n);

        let saturation_score = self
            .config
            .saturation_score(members.len(), self.config.engagement(avg_primary, avg_secondary));

        let trend = self.trend_for(members, now)?;

        Ok(NicheProfile {
            niche: niche.to_string(),
            total: members.len(),
            avg_primary,
            avg_secondary,
            top_records,
            top_problems,
            top_icps,
            saturation_score,
            trend,
        })
    }

    fn trend_for(&self, members: &[&EnrichedRecord], now: DateTime<Utc>) -> AnalyticsResult<TrendDirection> {
        let days = self.config.trend_window_days;
        let window = Duration::try_days(days).ok_or(AnalyticsError::WindowOutOfRange(days))?;
        let recent_start = now
            .checked_sub_signed(window)
            .ok_or(AnalyticsError::WindowOutOfRange(days))?;
        let previous_start = recent_start
            .checked_sub_signed(window)
            .ok_or(AnalyticsError::WindowOutOfRange(days))?;

        let mut recent = 0;
        let mut previous = 0;
        for record in members {
            let launched = record.launched_at()?;
            if launched > recent_start && launched <= now {
                recent += 1;
            } else if launched > previous_start && launched <= recent_start {
                previous += 1;
            }
        }

        Ok(TrendDirection::from_window_counts(recent, previous, &self.config))
    }
}
