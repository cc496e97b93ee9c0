//! Underserved-market detection
//!
//! An ICP (ideal customer profile) whose launches draw strong engagement but
//! which few products target is underserved. Problems within such an ICP
//! that have been tackled rarely, yet successfully, are reported as gaps.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::patterns::{frequency_table, FrequencyEntry, MetricTally};
use super::scoring::ScoringConfig;
use crate::models::EnrichedRecord;

const UNSPECIFIED_NICHE: &str = "unspecified";

/// Engagement and focus of launches targeting one ICP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IcpIntelligence {
    pub icp: String,
    pub count: usize,
    pub avg_primary: f64,
    pub avg_secondary: f64,
    pub avg_engagement: f64,
    pub top_problems: Vec<FrequencyEntry>,
    pub underserved: bool,
}

/// A promising, rarely attempted (icp, problem) combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketGap {
    pub problem: String,
    pub suggested_icp: String,
    pub suggested_niche: String,
    pub opportunity_score: f64,
    pub reasoning: String,
}

#[derive(Default)]
struct ProblemStats<'a> {
    tally: MetricTally,
    niches: Vec<&'a str>,
}

#[derive(Default)]
struct IcpStats<'a> {
    tally: MetricTally,
    problems: HashMap<&'a str, ProblemStats<'a>>,
}

/// Derives ICP intelligence and market gaps from enriched records
#[derive(Debug, Clone, Default)]
pub struct MarketGapAnalyzer {
    config: ScoringConfig,
}

impl MarketGapAnalyzer {
    #[must_use]
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    fn group_by_icp<'a>(records: &'a [EnrichedRecord]) -> HashMap<&'a str, IcpStats<'a>> {
        let mut groups: HashMap<&str, IcpStats> = HashMap::new();

        for record in records {
            let Some(analysis) = record.analysis() else {
                continue;
            };
            let Some(icp) = analysis.icp.known() else {
                continue;
            };

            let stats = groups.entry(icp).or_default();
            stats.tally.add(record);

            if let Some(problem) = analysis.problem.known() {
                let problem_stats = stats.problems.entry(problem).or_default();
                problem_stats.tally.add(record);
                if let Some(niche) = analysis.niche.known() {
                    problem_stats.niches.push(niche);
                }
            }
        }

        groups
    }

    fn summarize(&self, icp: &str, stats: &IcpStats<'_>) -> IcpIntelligence {
        let avg_primary = stats.tally.avg_primary();
        let avg_secondary = stats.tally.avg_secondary();
        let avg_engagement = self.config.engagement(avg_primary, avg_secondary);

        let mut top_problems: Vec<FrequencyEntry> = stats
            .problems
            .iter()
            .map(|(label, p)| FrequencyEntry {
                label: (*label).to_string(),
                count: p.tally.count,
            })
            .collect();
        top_problems.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
        top_problems.truncate(self.config.icp_top_problems);

        IcpIntelligence {
            icp: icp.to_string(),
            count: stats.tally.count,
            avg_primary,
            avg_secondary,
            avg_engagement,
            top_problems,
            underserved: avg_engagement > self.config.underserved_engagement_threshold
                && stats.tally.count < self.config.underserved_max_frequency,
        }
    }

    /// Per-ICP statistics, highest engagement first
    #[must_use]
    pub fn icp_intelligence(&self, records: &[EnrichedRecord]) -> Vec<IcpIntelligence> {
        let mut intel: Vec<IcpIntelligence> = Self::group_by_icp(records)
            .iter()
            .map(|(icp, stats)| self.summarize(icp, stats))
            .collect();

        intel.sort_by(|a, b| {
            b.avg_engagement
                .total_cmp(&a.avg_engagement)
                .then_with(|| a.icp.cmp(&b.icp))
        });
        intel
    }

    /// Top `limit` market gaps by opportunity score
    #[must_use]
    pub fn market_gaps(&self, records: &[EnrichedRecord], limit: usize) -> Vec<MarketGap> {
        let groups = Self::group_by_icp(records);
        let mut gaps = Vec::new();

        for (icp, stats) in &groups {
            let intel = self.summarize(icp, stats);
            if !intel.underserved {
                continue;
            }

            for entry in &intel.top_problems {
                let Some(problem) = stats.problems.get(entry.label.as_str()) else {
                    continue;
                };
                let problem_count = problem.tally.count;
                let problem_primary = problem.tally.avg_primary();

                if problem_count > self.config.gap_max_problem_count
                    || problem_primary < self.config.gap_min_problem_primary
                {
                    continue;
                }

                let suggested_niche = frequency_table(problem.niches.iter().copied(), 1)
                    .into_iter()
                    .next()
                    .map_or_else(|| UNSPECIFIED_NICHE.to_string(), |e| e.label);

                gaps.push(MarketGap {
                    problem: entry.label.clone(),
                    suggested_icp: intel.icp.clone(),
                    suggested_niche,
                    opportunity_score: self.config.opportunity_score(
                        intel.avg_engagement,
                        intel.count,
                        problem_primary,
                        problem_count,
                    ),
                    reasoning: format!(
                        "{} launches average {:.0} engagement across only {} product(s); \"{}\" has {} launch(es) averaging {:.0}",
                        intel.icp, intel.avg_engagement, intel.count, entry.label, problem_count, problem_primary
                    ),
                });
            }
        }

        gaps.sort_by(|a, b| {
            b.opportunity_score
                .total_cmp(&a.opportunity_score)
                .then_with(|| a.suggested_icp.cmp(&b.suggested_icp))
                .then_with(|| a.problem.cmp(&b.problem))
        });
        gaps.truncate(limit);

        tracing::debug!(
            icps = groups.len(),
            gaps = gaps.len(),
            "Computed market gaps"
        );
        gaps
    }
}
