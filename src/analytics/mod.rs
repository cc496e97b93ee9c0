//! Analytics core: trendline reconstruction, category aggregation and
//! market-intelligence scoring
//!
//! Everything in here is a pure, synchronous transformation over data the
//! caller already fetched. Nothing touches storage, the clock (except the
//! `reconstruct` convenience wrapper) or global state.

pub mod category;
pub mod gaps;
pub mod interpolation;
pub mod patterns;
pub mod scoring;
pub mod trendline;

use thiserror::Error;

/// Errors raised by the analytics core
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("Invalid timestamp in {field}: {value:?}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("Hour {0} is outside the representable time range")]
    AxisOutOfRange(i64),

    #[error("Trend window of {0} days is outside the representable time range")]
    WindowOutOfRange(i64),

    #[error("Series key {key:?} collides with {with:?}")]
    KeyCollision { key: String, with: String },
}

/// Result type for analytics operations
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

pub use category::{CategoryAggregator, CategoryAttribution, CategoryTrendPoint};
pub use gaps::{IcpIntelligence, MarketGap, MarketGapAnalyzer};
pub use interpolation::{
    EntityTimeline, GapFillStrategy, InterpolationMode, LinearInterpolation, MetricPair,
    StepHoldInterpolation,
};
pub use patterns::{
    FrequencyEntry, NicheProfile, PatternAnalyzer, RecordSummary, SuccessPattern, TrendDirection,
};
pub use scoring::{ScoringConfig, MAX_TREND_WINDOW_DAYS};
pub use trendline::{check_series_keys, comments_key, TrendPoint, TrendlineReconstructor, RESERVED_KEYS};
