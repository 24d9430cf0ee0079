//! Dataset indexing binary
//!
//! Scans the dataset root, reports classes, persons and split sizes, and
//! optionally runs one evaluation pass through the parallel loader when
//! `SIGNPOSE_WORKERS` is set.

use signpose_core::augment::Mode;
use signpose_core::data::{split_sizes, FilterSpec, LoaderConfig, ParallelLoader};
use signpose_core::runtime::{LoaderRuntime, RuntimeConfig};
use signpose_core::{Dataset, DatasetConfig};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const REPORT_RATIOS: [f64; 3] = [0.7, 0.2, 0.1];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Signpose indexer");

    let config = match std::env::var("SIGNPOSE_CONFIG") {
        Ok(path) => DatasetConfig::from_json_file(path)?,
        Err(_) => DatasetConfig::from_env()?,
    };
    info!("Indexing dataset at {}", config.root.display());

    let dataset = match Dataset::open(config) {
        Ok(d) => d,
        Err(e) => {
            error!("Failed to index dataset: {}", e);
            return Err(e.into());
        }
    };

    let stats = dataset.index().stats();
    info!(
        "{} classes, {} persons, {} samples ({} batches, {} unmatched videos)",
        dataset.classes().len(),
        dataset.persons().len(),
        stats.matched,
        stats.batches,
        stats.skipped
    );
    info!("Classes: {}", dataset.classes().join(", "));
    info!("Persons: {}", dataset.persons().join(", "));

    let list = dataset.filter(&FilterSpec::all(), true)?;
    let sizes = split_sizes(list.len(), &REPORT_RATIOS)?;
    info!("Split {:?} -> train {} / val {} / test {}", REPORT_RATIOS, sizes[0], sizes[1], sizes[2]);

    let num_workers: usize = match std::env::var("SIGNPOSE_WORKERS") {
        Ok(raw) => raw.trim().parse()?,
        Err(_) => return Ok(()),
    };

    let generator = Arc::new(dataset.generator(Some(list), Mode::Eval, None)?);
    let runtime = LoaderRuntime::new(RuntimeConfig {
        max_blocking_threads: num_workers.max(1),
        ..Default::default()
    })?;
    let loader_config = LoaderConfig {
        num_workers,
        ..Default::default()
    };

    let (ok, failed) = runtime.block_on(async {
        let mut loader = ParallelLoader::spawn(&tokio::runtime::Handle::current(), generator, loader_config)?;
        let (mut ok, mut failed) = (0usize, 0usize);
        while let Some(sample) = loader.next_sample().await {
            match sample.result {
                Ok(_) => ok += 1,
                Err(e) if e.is_per_sample() => {
                    warn!("Worker {}: {}", sample.worker_id, e);
                    failed += 1;
                }
                Err(e) => return Err(e),
            }
        }
        loader.shutdown().await;
        Ok::<_, signpose_core::SignPoseError>((ok, failed))
    })?;
    runtime.shutdown();

    info!("Sampling pass done: {} ok, {} failed", ok, failed);
    Ok(())
}
