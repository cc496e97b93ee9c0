//! Common test utilities

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use launchscope::models::{EnrichedRecord, Entity, Snapshot, StructuredAnalysis};

/// 2024-03-05 at `h:m` UTC
pub fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 5, h, m, 0).unwrap()
}

/// Create an entity launched at `launched`
pub fn entity(id: &str, name: &str, launched: DateTime<Utc>, labels: &[&str]) -> Entity {
    Entity::new(
        id,
        name,
        launched.to_rfc3339(),
        labels.iter().map(|l| l.to_string()).collect(),
    )
}

/// Create a snapshot captured at `captured`
pub fn snapshot(entity_id: &str, name: &str, primary: u64, secondary: u64, captured: DateTime<Utc>) -> Snapshot {
    Snapshot::new(entity_id, name, primary, secondary, captured.to_rfc3339())
}

/// Launch at 09:00, 40 votes at 09:30, 80 votes at 10:30
pub fn launch_day() -> (Vec<Snapshot>, Vec<Entity>) {
    let entities = vec![entity("acme", "Acme", at(9, 0), &["Developer Tools"])];
    let snapshots = vec![
        snapshot("acme", "Acme", 40, 4, at(9, 30)),
        snapshot("acme", "Acme", 80, 9, at(10, 30)),
    ];
    (snapshots, entities)
}

/// Create a fully classified record
pub fn record(
    id: &str,
    icp: &str,
    problem: &str,
    niche: &str,
    primary: u64,
    secondary: u64,
    launched: DateTime<Utc>,
) -> EnrichedRecord {
    EnrichedRecord {
        id: id.to_string(),
        name: format!("Product {id}"),
        metric_primary: primary,
        metric_secondary: secondary,
        structured_analysis: Some(StructuredAnalysis::new(icp, problem, niche)),
        launched_at: launched.to_rfc3339(),
    }
}

/// Create a record enrichment never reached
pub fn unenriched(id: &str, primary: u64, launched: DateTime<Utc>) -> EnrichedRecord {
    EnrichedRecord {
        id: id.to_string(),
        name: format!("Product {id}"),
        metric_primary: primary,
        metric_secondary: 0,
        structured_analysis: None,
        launched_at: launched.to_rfc3339(),
    }
}

/// `count` records in `niche`, launched `days_ago` days before `now`
pub fn niche_launches(
    niche: &str,
    count: usize,
    days_ago: i64,
    now: DateTime<Utc>,
    prefix: &str,
) -> Vec<EnrichedRecord> {
    (0..count)
        .map(|i| {
            record(
                &format!("{prefix}{i}"),
                "founders",
                "analytics",
                niche,
                100,
                10,
                now - Duration::days(days_ago) - Duration::hours(i as i64 % 12),
            )
        })
        .collect()
}

/// A small marketplace: a crowded developer ICP and a thin, well-received legal ICP
pub fn marketplace() -> Vec<EnrichedRecord> {
    let launched = at(9, 0);
    let mut records: Vec<EnrichedRecord> = (0..12)
        .map(|i| record(&format!("dev{i}"), "developers", "testing", "devtools", 400, 40, launched))
        .collect();

    records.push(record("law1", "lawyers", "contracts", "legal", 320, 30, launched));
    records.push(record("law2", "lawyers", "contracts", "legaltech", 280, 10, launched));
    records.push(record("law3", "lawyers", "billing", "legal", 20, 0, launched));
    records.push(unenriched("raw1", 900, launched));
    records
}
