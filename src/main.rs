use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use launchscope::config::Config;
use launchscope::models::{EnrichedRecord, Entity, Snapshot};
use launchscope::pipeline::{IntelligencePipeline, TrendPipeline};
use launchscope::storage::{
    JsonFileRepository, RecordRepository, SnapshotRepository, SqliteRepository, StorageResult,
};

#[derive(Parser)]
#[command(
    name = "launchscope",
    version,
    about = "Launch trendline reconstruction and market-gap analytics",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML config file (defaults to LAUNCHSCOPE_* environment variables)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database to read from
    #[arg(long, global = true, conflicts_with = "input")]
    db: Option<PathBuf>,

    /// Directory with entities.json, snapshots.json and records.json
    #[arg(long, global = true)]
    input: Option<PathBuf>,

    /// Reference time (RFC 3339) instead of the current time
    #[arg(long, global = true)]
    now: Option<DateTime<Utc>>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Hourly trendline per entity
    Trendline,

    /// Hourly trendline per category
    Categories,

    /// Recurring (icp, problem, niche) success patterns
    Patterns {
        /// Maximum number of patterns
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Profile of a single niche
    Niche {
        /// Niche name (case-insensitive)
        name: String,
    },

    /// Profiles of every niche
    Niches,

    /// Underserved (icp, problem) combinations
    Gaps {
        /// Maximum number of gaps
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Print Prometheus metrics
    Metrics,
}

/// Repository selected on the command line or in the config
enum DataSource {
    Sqlite(SqliteRepository),
    Json(JsonFileRepository),
}

impl SnapshotRepository for DataSource {
    fn load_entities(&self) -> StorageResult<Vec<Entity>> {
        match self {
            Self::Sqlite(repo) => repo.load_entities(),
            Self::Json(repo) => repo.load_entities(),
        }
    }

    fn load_snapshots(&self) -> StorageResult<Vec<Snapshot>> {
        match self {
            Self::Sqlite(repo) => repo.load_snapshots(),
            Self::Json(repo) => repo.load_snapshots(),
        }
    }
}

impl RecordRepository for DataSource {
    fn load_records(&self) -> StorageResult<Vec<EnrichedRecord>> {
        match self {
            Self::Sqlite(repo) => repo.load_records(),
            Self::Json(repo) => repo.load_records(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    if let Some(db) = &cli.db {
        config.storage.sqlite_path = Some(db.clone());
        config.storage.json_dir = None;
    }
    if let Some(dir) = &cli.input {
        config.storage.json_dir = Some(dir.clone());
        config.storage.sqlite_path = None;
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }
    config.validate().context("Invalid configuration")?;

    setup_tracing(&config.logging.format, &config.logging.level, cli.verbose)?;

    if let Err(e) = launchscope::metrics::init_metrics() {
        tracing::warn!(error = %e, "Metrics initialization failed, continuing without metrics");
    }

    tracing::info!("launchscope starting");

    let now = cli.now.unwrap_or_else(Utc::now);

    match cli.command {
        Commands::Trendline => {
            tracing::info!(now = %now, "Starting trendline command");
            let pipeline = TrendPipeline::new(open_source(&config)?, &config);
            print_json(&pipeline.entity_trends(now)?)?;
        }

        Commands::Categories => {
            tracing::info!(now = %now, attribution = ?config.aggregation.attribution, "Starting categories command");
            let pipeline = TrendPipeline::new(open_source(&config)?, &config);
            print_json(&pipeline.category_trends(now)?)?;
        }

        Commands::Patterns { limit } => {
            tracing::info!(limit = %limit, "Starting patterns command");
            let pipeline = IntelligencePipeline::new(open_source(&config)?, &config);
            print_json(&pipeline.success_patterns(limit)?)?;
        }

        Commands::Niche { name } => {
            tracing::info!(niche = %name, now = %now, "Starting niche command");
            let pipeline = IntelligencePipeline::new(open_source(&config)?, &config);
            print_json(&pipeline.niche_profile(&name, now)?)?;
        }

        Commands::Niches => {
            tracing::info!(now = %now, "Starting niches command");
            let pipeline = IntelligencePipeline::new(open_source(&config)?, &config);
            print_json(&pipeline.niche_overview(now)?)?;
        }

        Commands::Gaps { limit } => {
            tracing::info!(limit = %limit, "Starting gaps command");
            let pipeline = IntelligencePipeline::new(open_source(&config)?, &config);
            print_json(&pipeline.market_gaps(limit)?)?;
        }

        Commands::Metrics => {
            let text = launchscope::metrics::encode_metrics()
                .map_err(|e| anyhow::anyhow!("Failed to encode metrics: {e}"))?;
            print!("{text}");
        }
    }

    tracing::info!("launchscope completed successfully");
    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("launchscope=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new(format!("launchscope={level},warn"))
    };

    // Logs go to stderr so stdout stays valid JSON
    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}

fn open_source(config: &Config) -> Result<DataSource> {
    if let Some(path) = &config.storage.sqlite_path {
        let repo = SqliteRepository::open_read_only(path)
            .with_context(|| format!("Failed to open SQLite database: {}", path.display()))?;
        return Ok(DataSource::Sqlite(repo));
    }

    if let Some(dir) = &config.storage.json_dir {
        return Ok(DataSource::Json(JsonFileRepository::new(dir)));
    }

    anyhow::bail!("No data source: pass --db or --input, or set storage.sqlite_path / storage.json_dir")
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
