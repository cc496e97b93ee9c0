//! Repository-backed analysis pipelines
//!
//! A pipeline owns a repository and the analyzers configured from [`Config`].
//! Each operation loads what it needs, runs the pure analytics core and
//! records metrics.
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use launchscope::config::Config;
//! use launchscope::pipeline::TrendPipeline;
//! use launchscope::storage::SqliteRepository;
//!
//! # fn example() -> launchscope::error::Result<()> {
//! let repo = SqliteRepository::new("data/launchscope.db")?;
//! let pipeline = TrendPipeline::new(repo, &Config::default());
//!
//! let points = pipeline.category_trends(Utc::now())?;
//! println!("{} hourly points", points.len());
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};

use crate::analytics::{
    CategoryAggregator, CategoryTrendPoint, IcpIntelligence, MarketGap, MarketGapAnalyzer,
    NicheProfile, PatternAnalyzer, SuccessPattern, TrendPoint, TrendlineReconstructor,
};
use crate::config::Config;
use crate::error::Result;
use crate::metrics;
use crate::models::EnrichedRecord;
use crate::storage::{RecordRepository, SnapshotRepository};

// ============================================================================
// Trendlines
// ============================================================================

/// Hourly per-entity and per-category trendlines
#[derive(Debug)]
pub struct TrendPipeline<R> {
    repo: R,
    reconstructor: TrendlineReconstructor,
    aggregator: CategoryAggregator,
}

impl<R: SnapshotRepository> TrendPipeline<R> {
    pub fn new(repo: R, config: &Config) -> Self {
        Self {
            repo,
            reconstructor: TrendlineReconstructor::with_strategy(
                config.reconstruction.strategy.strategy(),
            ),
            aggregator: CategoryAggregator::new(config.aggregation.attribution),
        }
    }

    #[must_use]
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Per-entity trendline up to `now`
    pub fn entity_trends(&self, now: DateTime<Utc>) -> Result<Vec<TrendPoint>> {
        let _timer = metrics::start_computation_timer("trendline");

        let entities = self.repo.load_entities()?;
        let snapshots = self.repo.load_snapshots()?;

        let points = self.reconstructor.reconstruct_at(&snapshots, &entities, now)?;

        tracing::info!(
            entities = entities.len(),
            snapshots = snapshots.len(),
            points = points.len(),
            strategy = self.reconstructor.strategy().name(),
            "Reconstructed entity trendline"
        );
        metrics::record_computation("trendline", points.len());

        Ok(points)
    }

    /// Per-category trendline up to `now`
    pub fn category_trends(&self, now: DateTime<Utc>) -> Result<Vec<CategoryTrendPoint>> {
        let _timer = metrics::start_computation_timer("categories");

        let entities = self.repo.load_entities()?;
        let snapshots = self.repo.load_snapshots()?;

        let points = self.reconstructor.reconstruct_at(&snapshots, &entities, now)?;
        let categories = self.aggregator.aggregate(&points, &entities)?;

        let uncategorized = self.aggregator.uncategorized(&entities);
        metrics::record_skipped("uncategorized", uncategorized);

        tracing::info!(
            entities = entities.len(),
            uncategorized,
            points = categories.len(),
            "Aggregated category trendline"
        );
        metrics::record_computation("categories", categories.len());

        Ok(categories)
    }
}

// ============================================================================
// Market intelligence
// ============================================================================

/// Success patterns, niche profiles and market gaps over enriched records
#[derive(Debug)]
pub struct IntelligencePipeline<R> {
    repo: R,
    patterns: PatternAnalyzer,
    gaps: MarketGapAnalyzer,
}

impl<R: RecordRepository> IntelligencePipeline<R> {
    pub fn new(repo: R, config: &Config) -> Self {
        Self {
            repo,
            patterns: PatternAnalyzer::new(config.scoring.clone()),
            gaps: MarketGapAnalyzer::new(config.scoring.clone()),
        }
    }

    #[must_use]
    pub fn repository(&self) -> &R {
        &self.repo
    }

    fn load(&self) -> Result<Vec<EnrichedRecord>> {
        let records = self.repo.load_records()?;

        let unenriched = records.iter().filter(|r| r.analysis().is_none()).count();
        metrics::record_skipped("unenriched", unenriched);
        tracing::debug!(records = records.len(), unenriched, "Loaded enriched records");

        Ok(records)
    }

    /// Top `limit` (icp, problem) success patterns
    pub fn success_patterns(&self, limit: usize) -> Result<Vec<SuccessPattern>> {
        let _timer = metrics::start_computation_timer("patterns");

        let records = self.load()?;
        let patterns = self.patterns.success_patterns(&records, limit);

        tracing::info!(records = records.len(), patterns = patterns.len(), "Computed success patterns");
        metrics::record_computation("patterns", patterns.len());
        Ok(patterns)
    }

    /// Profile of one niche, or `None` if no record belongs to it
    pub fn niche_profile(&self, niche: &str, now: DateTime<Utc>) -> Result<Option<NicheProfile>> {
        let _timer = metrics::start_computation_timer("niche");

        let records = self.load()?;
        let profile = self.patterns.niche_profile(&records, niche, now)?;

        match &profile {
            Some(p) => tracing::info!(
                niche = %p.niche,
                total = p.total,
                trend = p.trend.as_str(),
                "Computed niche profile"
            ),
            None => tracing::info!(niche, "No records in niche"),
        }
        metrics::record_computation("niche", usize::from(profile.is_some()));
        Ok(profile)
    }

    /// Profiles of every niche, largest first
    pub fn niche_overview(&self, now: DateTime<Utc>) -> Result<Vec<NicheProfile>> {
        let _timer = metrics::start_computation_timer("niches");

        let records = self.load()?;
        let profiles = self.patterns.niche_overview(&records, now)?;

        tracing::info!(records = records.len(), niches = profiles.len(), "Computed niche overview");
        metrics::record_computation("niches", profiles.len());
        Ok(profiles)
    }

    /// Per-ICP engagement statistics
    pub fn icp_intelligence(&self) -> Result<Vec<IcpIntelligence>> {
        let _timer = metrics::start_computation_timer("icps");

        let records = self.load()?;
        let intel = self.gaps.icp_intelligence(&records);

        tracing::info!(
            icps = intel.len(),
            underserved = intel.iter().filter(|i| i.underserved).count(),
            "Computed ICP intelligence"
        );
        metrics::record_computation("icps", intel.len());
        Ok(intel)
    }

    /// Top `limit` market gaps by opportunity score
    pub fn market_gaps(&self, limit: usize) -> Result<Vec<MarketGap>> {
        let _timer = metrics::start_computation_timer("gaps");

        let records = self.load()?;
        let gaps = self.gaps.market_gaps(&records, limit);

        tracing::info!(records = records.len(), gaps = gaps.len(), "Computed market gaps");
        metrics::record_computation("gaps", gaps.len());
        Ok(gaps)
    }
}
