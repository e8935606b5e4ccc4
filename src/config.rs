//! Processing configuration
//!
//! An explicit configuration structure passed into the pipeline entry point,
//! replacing module-level constants. Built from the CLI arguments and
//! validated on construction.

use crate::cli::Args;
use crate::errors::{ProcessError, Result};
use std::ops::RangeInclusive;
use std::path::PathBuf;

/// Configuration for one batch run.
#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    /// Originating centre identifier (only one centre per run).
    pub centre: String,
    /// Directory holding the raw forecast files.
    pub input_dir: PathBuf,
    /// Directory receiving the processed files.
    pub output_dir: PathBuf,
    /// Inclusive year range of the download window.
    pub years: RangeInclusive<i32>,
    /// Inclusive month range of the download window.
    pub months: RangeInclusive<u32>,
    /// Region-of-interest label.
    pub region: String,
    /// Free-text region description written into the output metadata.
    pub region_description: String,
    /// Keep processing remaining files after a per-file failure.
    pub continue_on_error: bool,
    /// Print a dataset summary for every processed file.
    pub verbose: bool,
}

impl ProcessingConfig {
    /// Build a validated configuration from parsed CLI arguments.
    pub fn from_args(args: Args) -> Result<Self> {
        if args.start_year > args.end_year {
            return Err(ProcessError::Generic(format!(
                "start year {} is after end year {}",
                args.start_year, args.end_year
            )));
        }
        if args.start_month > args.end_month {
            return Err(ProcessError::Generic(format!(
                "start month {} is after end month {}",
                args.start_month, args.end_month
            )));
        }

        let region_description = args.region_description.unwrap_or_else(|| {
            format!("{} Region, Argentina AOI 24S\u{b0}-31\u{b0}S and 59W\u{b0}-65\u{b0}W", args.region)
        });

        Ok(Self {
            centre: args.centre.to_uppercase(),
            input_dir: args.input_dir,
            output_dir: args.output_dir,
            years: args.start_year..=args.end_year,
            months: args.start_month..=args.end_month,
            region: args.region,
            region_description,
            continue_on_error: args.continue_on_error,
            verbose: args.verbose,
        })
    }

    /// Returns `true` if the given issuance year/month falls inside the
    /// configured download window.
    pub fn window_contains(&self, year: i32, month: u32) -> bool {
        self.years.contains(&year) && self.months.contains(&month)
    }
}
