//! Weights, thresholds and caps for the market-intelligence heuristics
//!
//! Every number the scoring formulas use lives in [`ScoringConfig`], and each
//! formula is a method on it so it can be tested on its own.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Longest accepted trend comparison window
pub const MAX_TREND_WINDOW_DAYS: i64 = 3650;

/// Tunables for success-pattern, niche and market-gap scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Weight of average primary metric in a success-pattern score
    pub pattern_primary_weight: f64,
    /// Weight of average secondary metric in a success-pattern score
    pub pattern_secondary_weight: f64,
    /// Bonus per occurrence of a pattern
    pub frequency_bonus_per_record: f64,
    /// Ceiling on the frequency bonus
    pub frequency_bonus_cap: f64,

    pub engagement_primary_weight: f64,
    pub engagement_secondary_weight: f64,

    /// Saturation added per launch in a niche
    pub saturation_per_launch: f64,
    /// Saturation removed per point of average engagement
    pub saturation_engagement_discount: f64,

    /// Length of each trend comparison window
    pub trend_window_days: i64,
    pub trend_rising_ratio: f64,
    pub trend_declining_ratio: f64,

    /// Minimum average engagement for an ICP to count as underserved
    pub underserved_engagement_threshold: f64,
    /// ICPs with this many records or more are not underserved
    pub underserved_max_frequency: usize,
    /// Problems considered per ICP
    pub icp_top_problems: usize,

    /// Largest (icp, problem) occurrence count still reported as a gap
    pub gap_max_problem_count: usize,
    /// Minimum average primary metric for an (icp, problem) gap
    pub gap_min_problem_primary: f64,
    pub gap_icp_engagement_weight: f64,
    pub gap_problem_primary_weight: f64,
    pub gap_problem_scarcity_weight: f64,
    pub gap_icp_scarcity_weight: f64,

    /// Length of each niche-profile leaderboard
    pub profile_top_n: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            pattern_primary_weight: 1.0,
            pattern_secondary_weight: 2.0,
            frequency_bonus_per_record: 10.0,
            frequency_bonus_cap: 50.0,
            engagement_primary_weight: 1.0,
            engagement_secondary_weight: 2.0,
            saturation_per_launch: 5.0,
            saturation_engagement_discount: 0.1,
            trend_window_days: 7,
            trend_rising_ratio: 1.5,
            trend_declining_ratio: 0.5,
            underserved_engagement_threshold: 150.0,
            underserved_max_frequency: 10,
            icp_top_problems: 5,
            gap_max_problem_count: 3,
            gap_min_problem_primary: 100.0,
            gap_icp_engagement_weight: 0.3,
            gap_problem_primary_weight: 0.5,
            gap_problem_scarcity_weight: 100.0,
            gap_icp_scarcity_weight: 50.0,
            profile_top_n: 10,
        }
    }
}

impl ScoringConfig {
    /// Success-pattern score: weighted averages plus a capped frequency bonus
    #[must_use]
    pub fn pattern_score(&self, avg_primary: f64, avg_secondary: f64, count: usize) -> f64 {
        let bonus = (count as f64 * self.frequency_bonus_per_record).min(self.frequency_bonus_cap);
        avg_primary * self.pattern_primary_weight + avg_secondary * self.pattern_secondary_weight + bonus
    }

    /// Combined engagement of an average primary/secondary pair
    #[must_use]
    pub fn engagement(&self, avg_primary: f64, avg_secondary: f64) -> f64 {
        avg_primary * self.engagement_primary_weight + avg_secondary * self.engagement_secondary_weight
    }

    /// Niche saturation in [0, 100]: crowded and low-engagement scores highest
    #[must_use]
    pub fn saturation_score(&self, launches: usize, avg_engagement: f64) -> f64 {
        let raw = launches as f64 * self.saturation_per_launch
            - avg_engagement * self.saturation_engagement_discount;
        raw.clamp(0.0, 100.0)
    }

    /// Opportunity of an (icp, problem) pair; both inverse terms reward scarcity
    #[must_use]
    pub fn opportunity_score(
        &self,
        icp_engagement: f64,
        icp_count: usize,
        problem_avg_primary: f64,
        problem_count: usize,
    ) -> f64 {
        icp_engagement * self.gap_icp_engagement_weight
            + problem_avg_primary * self.gap_problem_primary_weight
            + self.gap_problem_scarcity_weight / problem_count.max(1) as f64
            + self.gap_icp_scarcity_weight / icp_count.max(1) as f64
    }

    /// Reject configurations the formulas cannot work with
    pub fn validate(&self) -> Result<(), String> {
        let weights = [
            ("pattern_primary_weight", self.pattern_primary_weight),
            ("pattern_secondary_weight", self.pattern_secondary_weight),
            ("frequency_bonus_per_record", self.frequency_bonus_per_record),
            ("frequency_bonus_cap", self.frequency_bonus_cap),
            ("engagement_primary_weight", self.engagement_primary_weight),
            ("engagement_secondary_weight", self.engagement_secondary_weight),
            ("saturation_per_launch", self.saturation_per_launch),
            ("saturation_engagement_discount", self.saturation_engagement_discount),
            ("gap_icp_engagement_weight", self.gap_icp_engagement_weight),
            ("gap_problem_primary_weight", self.gap_problem_primary_weight),
            ("gap_problem_scarcity_weight", self.gap_problem_scarcity_weight),
            ("gap_icp_scarcity_weight", self.gap_icp_scarcity_weight),
        ];

        if let Some((name, value)) = weights.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            return Err(format!("{name} must be a non-negative number, got {value}"));
        }

        if !(1..=MAX_TREND_WINDOW_DAYS).contains(&self.trend_window_days) {
            return Err(format!(
                "trend_window_days must be between 1 and {MAX_TREND_WINDOW_DAYS}, got {}",
                self.trend_window_days
            ));
        }

        if self.trend_declining_ratio.partial_cmp(&self.trend_rising_ratio) != Some(Ordering::Less) {
            return Err(format!(
                "trend_declining_ratio ({}) must be below trend_rising_ratio ({})",
                self.trend_declining_ratio, self.trend_rising_ratio
            ));
        }

        if self.profile_top_n == 0 {
            return Err("profile_top_n must be greater than 0".to_string());
        }

        Ok(())
    }
}
