//! Category-level aggregation of reconstructed entity trendlines

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use super::interpolation::MetricPair;
use super::trendline::{check_series_keys, TrendPoint};
use super::AnalyticsResult;
use crate::models::Entity;

/// Same shape as [`TrendPoint`], keyed by category name
///
/// Sparse: a category absent from a point contributed nothing there.
pub type CategoryTrendPoint = TrendPoint;

/// Which of an entity's labels receive its values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryAttribution {
    /// Only the first label
    #[default]
    PrimaryOnly,
    /// Full credit to every distinct label
    AllLabels,
}

impl CategoryAttribution {
    /// Parse from a config/env string
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "primary_only" | "primary" => Some(Self::PrimaryOnly),
            "all_labels" | "all" => Some(Self::AllLabels),
            _ => None,
        }
    }

    /// Labels credited with `entity`'s values; empty when it has none
    #[must_use]
    pub fn labels_for(self, entity: &Entity) -> Vec<String> {
        match self {
            Self::PrimaryOnly => entity
                .primary_category()
                .map(|c| vec![c.to_string()])
                .unwrap_or_default(),
            Self::AllLabels => entity
                .category_labels
                .iter()
                .map(|label| label.trim())
                .filter(|label| !label.is_empty())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Re-keys entity trendlines into category totals on the same axis
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryAggregator {
    attribution: CategoryAttribution,
}

impl CategoryAggregator {
    #[must_use]
    pub fn new(attribution: CategoryAttribution) -> Self {
        Self { attribution }
    }

    #[must_use]
    pub fn attribution(&self) -> CategoryAttribution {
        self.attribution
    }

    /// Sum each entity's values into its category at every point
    ///
    /// Output has exactly one point per input point, in the same order and
    /// with the same `time_label`/`numeric_hour`. Entities without a category
    /// label are left out.
    ///
    /// Entities sharing a name share one series key, already summed by the
    /// reconstructor, so each key is routed once using the labels of the
    /// first entity carrying that name.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::KeyCollision`](super::AnalyticsError::KeyCollision)
    /// if a category label shadows an axis field or another label's comments key.
    pub fn aggregate(
        &self,
        points: &[TrendPoint],
        entities: &[Entity],
    ) -> AnalyticsResult<Vec<CategoryTrendPoint>> {
        let mut seen = HashSet::new();
        let routes: Vec<(&str, Vec<String>)> = entities
            .iter()
            .filter(|entity| seen.insert(entity.name.as_str()))
            .map(|entity| (entity.name.as_str(), self.attribution.labels_for(entity)))
            .filter(|(_, labels)| !labels.is_empty())
            .collect();

        check_series_keys(routes.iter().flat_map(|(_, labels)| labels.iter().map(String::as_str)))?;

        let excluded = self.uncategorized(entities);
        if excluded > 0 {
            tracing::debug!(excluded, "Entities without a category left out of aggregation");
        }

        let categories = points
            .iter()
            .map(|point| {
                let mut out = CategoryTrendPoint::new(point.time_label.clone(), point.numeric_hour);

                for (name, labels) in &routes {
                    let Some(&primary) = point.values.get(*name) else {
                        continue;
                    };
                    let metrics = MetricPair::new(primary, point.comments(name));
                    for label in labels {
                        out.add(label, metrics);
                    }
                }

                out
            })
            .collect();

        Ok(categories)
    }

    /// Number of entities that receive no category under this attribution
    #[must_use]
    pub fn uncategorized(&self, entities: &[Entity]) -> usize {
        entities
            .iter()
            .filter(|entity| self.attribution.labels_for(entity).is_empty())
            .count()
    }
}
