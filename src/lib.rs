//! launchscope - Launch analytics engine
//!
//! Turns sparse popularity snapshots of launched products into dense hourly
//! trendlines, rolls them up by category, and mines enriched launch records
//! for success patterns, niche profiles and underserved markets.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`analytics`] - Pure reconstruction, aggregation and scoring core
//! - [`models`] - Snapshots, entities and enriched records
//! - [`storage`] - Repository traits with SQLite, JSON and in-memory backends
//! - [`pipeline`] - Repository-backed operations with logging and metrics
//! - [`config`] - Configuration management and settings
//! - [`metrics`] - Prometheus counters and histograms
//! - [`error`] - Unified error type
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use launchscope::analytics::{CategoryAggregator, TrendlineReconstructor};
//! use launchscope::models::{Entity, Snapshot};
//!
//! # fn example(snapshots: Vec<Snapshot>, entities: Vec<Entity>) -> anyhow::Result<()> {
//! let points = TrendlineReconstructor::new().reconstruct_at(&snapshots, &entities, Utc::now())?;
//! let categories = CategoryAggregator::default().aggregate(&points, &entities)?;
//! println!("{} hourly points", categories.len());
//! # Ok(())
//! # }
//! ```

pub mod analytics;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod storage;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::analytics::{
        CategoryAggregator, CategoryAttribution, InterpolationMode, MarketGapAnalyzer,
        PatternAnalyzer, ScoringConfig, TrendPoint, TrendlineReconstructor,
    };
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, LaunchscopeErrorTrait, Result};
    pub use crate::models::{Attribute, EnrichedRecord, Entity, Snapshot, StructuredAnalysis};
    pub use crate::pipeline::{IntelligencePipeline, TrendPipeline};
    pub use crate::storage::{JsonFileRepository, MockRepository, SqliteRepository};
}

// Direct re-exports for convenience
pub use models::{EnrichedRecord, Entity, Snapshot};
