use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use tracing::info;

use e2e_tests::{create_dataset, random_vectors};
use semindex_types::Settings;
use semindex_vector::{EngineConfig, IndexEngine, PersistedState};

const DEFAULT_COUNT: usize = 20_000;
const DEFAULT_DIM: usize = 64;
const DEFAULT_QUERIES: usize = 500;
const RECALL_SAMPLES: usize = 1_000;

#[derive(Parser, Debug)]
#[command(name = "perf_bench", about = "semindex insert/query benchmark harness")]
struct Args {
    /// Vectors to insert
    #[arg(long, default_value_t = DEFAULT_COUNT)]
    count: usize,
    /// Vector dimension
    #[arg(long, default_value_t = DEFAULT_DIM)]
    dim: usize,
    /// Random queries to time
    #[arg(long, default_value_t = DEFAULT_QUERIES)]
    queries: usize,
    /// Neighbors per query
    #[arg(long, default_value_t = 10)]
    k: usize,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Settings file (TOML)
    #[arg(short, long)]
    config: Option<String>,
    #[arg(long)]
    batch_size: Option<usize>,
    #[arg(long)]
    ef: Option<usize>,
    #[arg(long)]
    log_level: Option<String>,
    /// Where to write the snapshot (defaults to a temp dir)
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// Write the JSON report here as well as stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct LatencyMetrics {
    p50_ms: f64,
    p95_ms: f64,
    p99_ms: f64,
    samples: usize,
}

#[derive(Debug, Serialize)]
struct BenchmarkOutput {
    generated_at: String,
    count: usize,
    dim: usize,
    batch_size: usize,
    growth_factor: usize,
    ef: usize,
    metric: String,
    insert_ms: f64,
    insert_vps: f64,
    batches: usize,
    reallocations: usize,
    recall_at_1: f64,
    query: LatencyMetrics,
    snapshot_ms: f64,
    restore_ms: f64,
    snapshot_bytes: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref()).context("Failed to load settings")?;
    if let Some(batch_size) = args.batch_size {
        settings.batch_size = batch_size;
    }
    if let Some(ef) = args.ef {
        settings.ef = ef;
    }
    if let Some(log_level) = &args.log_level {
        settings.log_level = log_level.clone();
    }
    settings.validate().context("Invalid settings")?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let config = EngineConfig::from_settings(&settings);
    info!(
        count = args.count,
        dim = args.dim,
        batch_size = config.batch_size,
        "Starting benchmark"
    );

    let (ids, vectors) = create_dataset(args.seed, args.count, args.dim, 0);
    let mut engine = IndexEngine::new(config.clone());

    let started = Instant::now();
    let insert_stats = engine
        .insert(&ids, &vectors)
        .context("Failed to insert dataset")?;
    let insert_ms = elapsed_ms(started);

    let recall_at_1 = self_recall(&engine, &ids, &vectors)?;

    let mut latencies = Vec::with_capacity(args.queries);
    for query in random_vectors(args.seed.wrapping_add(1), args.queries, args.dim) {
        let started = Instant::now();
        engine.query(&query, args.k).context("Query failed")?;
        latencies.push(elapsed_ms(started));
    }
    latencies.sort_by(f64::total_cmp);

    let temp_dir = tempfile::TempDir::new().context("Failed to create temp dir")?;
    let snapshot_path = args
        .snapshot
        .clone()
        .unwrap_or_else(|| temp_dir.path().join("bench-index.json"));

    let started = Instant::now();
    engine
        .snapshot()
        .save(&snapshot_path)
        .context("Failed to save snapshot")?;
    let snapshot_ms = elapsed_ms(started);
    let snapshot_bytes = fs::metadata(&snapshot_path)
        .context("Failed to stat snapshot")?
        .len();

    let started = Instant::now();
    let state = PersistedState::load(&snapshot_path).context("Failed to load snapshot")?;
    let restored = IndexEngine::restore(&state, config.clone()).context("Failed to restore")?;
    let restore_ms = elapsed_ms(started);
    anyhow::ensure!(
        restored.len() == engine.len(),
        "restored {} vectors, expected {}",
        restored.len(),
        engine.len()
    );

    let output = BenchmarkOutput {
        generated_at: Utc::now().to_rfc3339(),
        count: args.count,
        dim: args.dim,
        batch_size: config.batch_size,
        growth_factor: config.growth.factor,
        ef: config.hnsw.expansion_search,
        metric: config.hnsw.metric.to_string(),
        insert_ms,
        insert_vps: per_second(insert_stats.inserted, insert_ms),
        batches: insert_stats.batches,
        reallocations: insert_stats.reallocations,
        recall_at_1,
        query: LatencyMetrics {
            p50_ms: percentile(&latencies, 50.0),
            p95_ms: percentile(&latencies, 95.0),
            p99_ms: percentile(&latencies, 99.0),
            samples: latencies.len(),
        },
        snapshot_ms,
        restore_ms,
        snapshot_bytes,
    };

    let json = serde_json::to_string_pretty(&output).context("Failed to serialize report")?;
    if let Some(out) = &args.out {
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent).context("Failed to create output dir")?;
        }
        fs::write(out, &json).with_context(|| format!("Failed to write {}", out.display()))?;
    }
    println!("{json}");
    Ok(())
}

/// Fraction of sampled stored vectors that come back as their own nearest hit.
fn self_recall(engine: &IndexEngine, ids: &[u64], vectors: &[Vec<f32>]) -> Result<f64> {
    if ids.is_empty() {
        return Ok(0.0);
    }
    let step = (ids.len() / RECALL_SAMPLES).max(1);
    let mut sampled = 0usize;
    let mut found = 0usize;
    for i in (0..ids.len()).step_by(step) {
        let hits = engine.query(&vectors[i], 1).context("Recall query failed")?;
        sampled += 1;
        if hits.first().map(|h| h.id) == Some(ids[i]) {
            found += 1;
        }
    }
    Ok(found as f64 / sampled as f64)
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

fn per_second(count: usize, ms: f64) -> f64 {
    if ms <= 0.0 {
        return 0.0;
    }
    count as f64 / (ms / 1000.0)
}

fn percentile(values: &[f64], percentile: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let rank = (percentile / 100.0) * (values.len() as f64 - 1.0);
    let low = rank.floor() as usize;
    let high = rank.ceil() as usize;
    if low == high {
        values[low]
    } else {
        let weight = rank - low as f64;
        values[low] + (values[high] - values[low]) * weight
    }
}
