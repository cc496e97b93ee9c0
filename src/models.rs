// Core data structures shared by the trendline and market-intelligence pipelines

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::analytics::AnalyticsError;

/// Sentinel strings that enrichment emits when it could not classify a field
const UNSPECIFIED_SENTINELS: &[&str] = &["unknown", "unspecified", "n/a", "none"];

/// Parse a wire timestamp into UTC
///
/// Accepts RFC 3339 (`2024-03-05T09:30:00Z`, any offset) and the database
/// form `2024-03-05 09:30:00[.fff]`, which is read as UTC.
pub fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, AnalyticsError> {
    let trimmed = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| AnalyticsError::InvalidTimestamp {
            field,
            value: value.to_string(),
        })
}

/// One immutable measurement of an entity's popularity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub entity_id: String,
    pub entity_name: String,
    /// Votes, stars, or whatever the primary popularity signal is
    pub metric_primary: u64,
    /// Comment count
    pub metric_secondary: u64,
    pub captured_at: String,
}

impl Snapshot {
    /// Create a snapshot from an already formatted timestamp
    pub fn new(
        entity_id: impl Into<String>,
        entity_name: impl Into<String>,
        metric_primary: u64,
        metric_secondary: u64,
        captured_at: impl Into<String>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            entity_name: entity_name.into(),
            metric_primary,
            metric_secondary,
            captured_at: captured_at.into(),
        }
    }

    /// Parsed capture time
    pub fn captured_at(&self) -> Result<DateTime<Utc>, AnalyticsError> {
        parse_timestamp("captured_at", &self.captured_at)
    }
}

/// A tracked launch with ordered category labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub launch_timestamp: String,
    #[serde(default)]
    pub category_labels: Vec<String>,
}

impl Entity {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        launch_timestamp: impl Into<String>,
        category_labels: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            launch_timestamp: launch_timestamp.into(),
            category_labels,
        }
    }

    /// Parsed launch time
    pub fn launched_at(&self) -> Result<DateTime<Utc>, AnalyticsError> {
        parse_timestamp("launch_timestamp", &self.launch_timestamp)
    }

    /// First category label, if any
    #[must_use]
    pub fn primary_category(&self) -> Option<&str> {
        self.category_labels
            .first()
            .map(|label| label.trim())
            .filter(|label| !label.is_empty())
    }
}

/// A classified field of a record's structured analysis
///
/// Enrichment either produced a usable value or it did not; the second case
/// covers missing fields, empty strings and the usual "unknown" sentinels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    Known(String),
    #[default]
    Unspecified,
}

impl Attribute {
    /// Classify a raw value
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(value)
                if !value.is_empty()
                    && !UNSPECIFIED_SENTINELS
                        .iter()
                        .any(|s| value.eq_ignore_ascii_case(s)) =>
            {
                Self::Known(value.to_string())
            }
            _ => Self::Unspecified,
        }
    }

    #[must_use]
    pub fn known(&self) -> Option<&str> {
        match self {
            Self::Known(value) => Some(value),
            Self::Unspecified => None,
        }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

impl From<&str> for Attribute {
    fn from(value: &str) -> Self {
        Self::parse(Some(value))
    }
}

impl Serialize for Attribute {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Known(value) => serializer.serialize_str(value),
            Self::Unspecified => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Attribute {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Self::parse(raw.as_deref()))
    }
}

/// Classification attached to a record by the enrichment pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredAnalysis {
    /// Ideal customer profile
    #[serde(default)]
    pub icp: Attribute,
    #[serde(default)]
    pub problem: Attribute,
    #[serde(default)]
    pub niche: Attribute,
    #[serde(default)]
    pub pricing_model: Attribute,
}

impl StructuredAnalysis {
    pub fn new(icp: &str, problem: &str, niche: &str) -> Self {
        Self {
            icp: icp.into(),
            problem: problem.into(),
            niche: niche.into(),
            pricing_model: Attribute::Unspecified,
        }
    }

    /// True when enrichment produced nothing usable at all
    #[must_use]
    pub fn is_blank(&self) -> bool {
        !self.icp.is_known()
            && !self.problem.is_known()
            && !self.niche.is_known()
            && !self.pricing_model.is_known()
    }
}

/// A launch enriched with structured analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub id: String,
    pub name: String,
    pub metric_primary: u64,
    pub metric_secondary: u64,
    #[serde(default)]
    pub structured_analysis: Option<StructuredAnalysis>,
    pub launched_at: String,
}

impl EnrichedRecord {
    /// Structured analysis, if present and not entirely sentinel
    #[must_use]
    pub fn analysis(&self) -> Option<&StructuredAnalysis> {
        self.structured_analysis
            .as_ref()
            .filter(|analysis| !analysis.is_blank())
    }

    /// Parsed launch time
    pub fn launched_at(&self) -> Result<DateTime<Utc>, AnalyticsError> {
        parse_timestamp("launched_at", &self.launched_at)
    }
}
