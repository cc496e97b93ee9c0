//! Pipeline integration tests
//!
//! Every backend is loaded with the same fixtures and must produce the same
//! analysis.

use chrono::{DateTime, TimeZone, Utc};
use launchscope::analytics::{CategoryAttribution, TrendDirection};
use launchscope::config::Config;
use launchscope::pipeline::{IntelligencePipeline, TrendPipeline};
use launchscope::storage::{JsonFileRepository, RecordRepository, SnapshotRepository};
use tempfile::TempDir;

use super::fixtures::{seed_mock, seed_sqlite, write_json_export};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 5, 11, 0, 0).unwrap()
}

/// Run `check` against the mock, SQLite and JSON backends
fn for_each_backend<F>(check: F)
where
    F: Fn(&str, &dyn Backend),
{
    let dir = TempDir::new().unwrap();
    write_json_export(dir.path());

    check("mock", &seed_mock());
    check("sqlite", &seed_sqlite(&dir.path().join("launchscope.db")));
    check("json", &JsonFileRepository::new(dir.path()));
}

trait Backend: SnapshotRepository + RecordRepository {}
impl<T: SnapshotRepository + RecordRepository> Backend for T {}

#[test]
fn test_entity_trendline_across_backends() {
    for_each_backend(|name, repo| {
        let points = TrendPipeline::new(repo, &Config::default())
            .entity_trends(now())
            .unwrap();

        assert_eq!(points.len(), 3, "{name}");
        assert_eq!(points[0].total(), 0.0, "{name}");

        assert_eq!(points[1].value("Acme"), 40.0, "{name}");
        assert_eq!(points[1].value("Beta"), 0.0, "{name}");

        let last = &points[2];
        assert_eq!(last.time_label, "Mar 05, 11:00", "{name}");
        assert_eq!(last.value("Acme"), 80.0, "{name}");
        assert_eq!(last.comments("Acme"), 9.0, "{name}");
        assert_eq!(last.value("Beta"), 15.0, "{name}");
        assert_eq!(last.value("Solo"), 3.0, "{name}");
    });
}

#[test]
fn test_category_trendline_across_backends() {
    for_each_backend(|name, repo| {
        let points = TrendPipeline::new(repo, &Config::default())
            .category_trends(now())
            .unwrap();

        let last = points.last().unwrap();
        assert_eq!(last.value("Developer Tools"), 80.0, "{name}");
        assert_eq!(last.value("AI"), 15.0, "{name}");
        assert!(!last.values.contains_key("Solo"), "{name}");
    });
}

#[test]
fn test_all_labels_attribution() {
    let mut config = Config::default();
    config.aggregation.attribution = CategoryAttribution::AllLabels;

    let points = TrendPipeline::new(seed_mock(), &config)
        .category_trends(now())
        .unwrap();

    let last = points.last().unwrap();
    assert_eq!(last.value("AI"), 95.0);
    assert_eq!(last.value("Developer Tools"), 80.0);
}

#[test]
fn test_intelligence_across_backends() {
    for_each_backend(|name, repo| {
        let pipeline = IntelligencePipeline::new(repo, &Config::default());

        let patterns = pipeline.success_patterns(10).unwrap();
        assert_eq!(patterns.len(), 1, "{name}");
        assert_eq!(patterns[0].problem, "contracts", "{name}");
        assert_eq!(patterns[0].avg_primary, 300.0, "{name}");

        let profile = pipeline.niche_profile("legal", now()).unwrap().unwrap();
        assert_eq!(profile.total, 3, "{name}");
        assert_eq!(profile.trend, TrendDirection::Rising, "{name}");
        assert_eq!(profile.top_records[0].name, "Clausebot", "{name}");

        let niches = pipeline.niche_overview(now()).unwrap();
        assert_eq!(niches.len(), 1, "{name}");

        let intel = pipeline.icp_intelligence().unwrap();
        assert_eq!(intel.len(), 1, "{name}");
        assert!(intel[0].underserved, "{name}");

        let gaps = pipeline.market_gaps(10).unwrap();
        assert_eq!(gaps.len(), 1, "{name}");
        assert_eq!(gaps[0].suggested_icp, "lawyers", "{name}");
        assert_eq!(gaps[0].suggested_niche, "legal", "{name}");
    });
}

#[test]
fn test_backends_agree_exactly() {
    let dir = TempDir::new().unwrap();
    write_json_export(dir.path());
    let config = Config::default();

    let from_mock = TrendPipeline::new(seed_mock(), &config).entity_trends(now()).unwrap();
    let from_sqlite = TrendPipeline::new(seed_sqlite(&dir.path().join("a.db")), &config)
        .entity_trends(now())
        .unwrap();
    let from_json = TrendPipeline::new(JsonFileRepository::new(dir.path()), &config)
        .entity_trends(now())
        .unwrap();

    assert_eq!(from_mock, from_sqlite);
    assert_eq!(from_mock, from_json);

    let gaps_mock = IntelligencePipeline::new(seed_mock(), &config).market_gaps(10).unwrap();
    let gaps_json = IntelligencePipeline::new(JsonFileRepository::new(dir.path()), &config)
        .market_gaps(10)
        .unwrap();
    assert_eq!(gaps_mock, gaps_json);
}

#[test]
fn test_sqlite_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("launchscope.db");
    drop(seed_sqlite(&path));

    let reopened = launchscope::storage::SqliteRepository::new(&path).unwrap();
    assert_eq!(reopened.load_entities().unwrap().len(), 3);
    assert_eq!(reopened.load_snapshots().unwrap().len(), 4);
    assert_eq!(reopened.load_records().unwrap().len(), 5);
}
