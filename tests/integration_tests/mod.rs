//! Integration tests module
//!
//! End-to-end tests for launchscope pipelines:
//! - Repository → reconstruction → aggregation
//! - Repository → pattern, niche and gap analysis
//! - Failure modes of each storage backend

pub mod error_scenarios;
pub mod fixtures;
pub mod pipeline_test;
