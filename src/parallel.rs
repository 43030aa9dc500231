//! Batch conversion and parallel processing configuration
//!
//! Every input file is converted independently. By default files run one
//! after another; with more than one thread configured they are spread over
//! a dedicated Rayon pool. A failing file is recorded and never stops the
//! rest of the batch.

use crate::convert::{convert_file, ConversionSummary, ConvertConfig};
use crate::errors::{ConversionError, LvisError, Result};
use crate::schema::is_convertible;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

/// Configuration for parallel processing
#[derive(Debug, Clone, Default)]
pub struct ParallelConfig {
    pub num_threads: Option<usize>,
}

impl ParallelConfig {
    /// Create a new parallel configuration
    pub fn new(num_threads: Option<usize>) -> Self {
        Self { num_threads }
    }

    /// Create a configuration that uses all available CPU cores
    pub fn all_cores() -> Self {
        Self {
            num_threads: Some(num_cpus::get()),
        }
    }

    /// Create a configuration that uses a specific number of threads
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads: Some(num_threads),
        }
    }

    /// Whether files should be converted concurrently
    pub fn is_parallel(&self) -> bool {
        self.num_threads.is_some_and(|n| n > 1)
    }

    /// Build a dedicated pool with the configured thread count
    pub fn build_pool(&self) -> Result<ThreadPool> {
        let mut builder = ThreadPoolBuilder::new();
        if let Some(num_threads) = self.num_threads {
            builder = builder.num_threads(num_threads);
        }
        builder.build().map_err(|e| {
            LvisError::ThreadPoolError(format!(
                "Failed to initialize thread pool with {:?} threads: {}",
                self.num_threads, e
            ))
        })
    }
}

/// Information about the parallel processing environment
#[derive(Debug, Clone)]
pub struct ParallelInfo {
    pub current_threads: usize,
    pub available_cores: usize,
    pub available_parallelism: usize,
}

/// Get information about the current parallel configuration
pub fn get_parallel_info() -> ParallelInfo {
    ParallelInfo {
        current_threads: rayon::current_num_threads(),
        available_cores: num_cpus::get(),
        available_parallelism: std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(1),
    }
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    pub converted: Vec<ConversionSummary>,
    /// Inputs without a `.TXT` extension
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<ConversionError>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, input: PathBuf, outcome: Option<Result<ConversionSummary>>) {
        match outcome {
            None => self.skipped.push(input),
            Some(Ok(summary)) => self.converted.push(summary),
            Some(Err(source)) => {
                let failure = ConversionError::new(input, source);
                error!("{}", failure);
                self.failed.push(failure);
            }
        }
    }
}

fn convert_one(input: &Path, config: &ConvertConfig) -> Option<Result<ConversionSummary>> {
    if !is_convertible(input) {
        warn!(file = %input.display(), "skipping file without .TXT extension");
        return None;
    }
    Some(convert_file(input, config))
}

/// Convert every input, continuing past per-file failures
pub fn convert_batch(
    inputs: &[PathBuf],
    config: &ConvertConfig,
    parallel: &ParallelConfig,
) -> Result<BatchReport> {
    let outcomes: Vec<Option<Result<ConversionSummary>>> = if parallel.is_parallel() {
        let pool = parallel.build_pool()?;
        debug!(threads = pool.current_num_threads(), "converting in parallel");
        pool.install(|| {
            inputs
                .par_iter()
                .map(|input| convert_one(input, config))
                .collect()
        })
    } else {
        inputs
            .iter()
            .map(|input| convert_one(input, config))
            .collect()
    };

    let mut report = BatchReport::default();
    for (input, outcome) in inputs.iter().cloned().zip(outcomes) {
        report.record(input, outcome);
    }
    Ok(report)
}
