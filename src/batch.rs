//! Batch driver
//!
//! Thin loop over the input directory: enumerates forecast files in sorted
//! order, invokes the per-file pipeline once per file, reports progress, and
//! prints a final summary with the elapsed wall time.

use crate::config::ProcessingConfig;
use crate::errors::Result;
use crate::pipeline::process_file;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Outcome of one batch run.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub files_processed: usize,
    pub files_failed: usize,
    pub elapsed: Duration,
}

/// Collect the `.nc` files in the input directory, sorted by name.
fn forecast_files(config: &ProcessingConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(&config.input_dir)? {
        let path = entry?.path();
        let is_netcdf = path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("nc"))
                .unwrap_or(false);
        if is_netcdf {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Process every forecast file in the configured input directory.
///
/// Each file runs to completion before the next begins. A per-file failure
/// aborts the batch unless `continue_on_error` is set, in which case the
/// error is reported and the remaining files are processed.
pub fn process_directory(config: &ProcessingConfig) -> Result<BatchSummary> {
    let started = Instant::now();
    fs::create_dir_all(&config.output_dir)?;

    let files = forecast_files(config)?;
    if files.is_empty() {
        println!(
            "No forecast files found in {}",
            config.input_dir.display()
        );
    }

    let mut files_processed = 0;
    let mut files_failed = 0;

    for path in &files {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            println!("{}", name);
        }
        match process_file(path, config) {
            Ok(output_path) => {
                files_processed += 1;
                println!("\u{2705} Saved result to {}", output_path.display());
            }
            Err(error) => {
                files_failed += 1;
                if config.continue_on_error {
                    eprintln!("\u{26a0} Failed to process {}: {}", path.display(), error);
                } else {
                    return Err(error);
                }
            }
        }
    }

    let elapsed = started.elapsed();
    println!(
        "{} files have been successfully processed in {:.2?}",
        files_processed, elapsed
    );
    if files_failed > 0 {
        println!("{} files failed", files_failed);
    }

    Ok(BatchSummary {
        files_processed,
        files_failed,
        elapsed,
    })
}
