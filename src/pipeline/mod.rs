//! The per-file transformation pipeline
//!
//! Five sequential stages, each a pure function consuming and returning one
//! in-memory [`ForecastDataset`]:
//!
//! 1. [`coords`] - coordinate normalization
//! 2. [`diff`] - cumulative-to-incremental differencing
//! 3. [`derive`] - derived variables (wind speed, relative humidity)
//! 4. [`leadtime`] - lead-time indexing
//! 5. [`attrs`] - metadata and unit rewriting
//!
//! The Kelvin-to-Celsius conversion from stage 5 is ordered ahead of the
//! humidity derivation, which requires Celsius inputs. Input units are
//! validated once at pipeline entry so unit assumption violations fail
//! loudly instead of silently corrupting values.

pub mod attrs;
pub mod coords;
pub mod derive;
pub mod diff;
pub mod leadtime;

use crate::config::ProcessingConfig;
use crate::dataset::{ForecastDataset, REQUIRED_VARIABLES};
use crate::errors::Result;
use crate::metadata::print_dataset_summary;
use crate::netcdf_io::{processed_output_path, read_forecast_dataset, write_forecast_dataset};
use chrono::Datelike;
use std::path::{Path, PathBuf};

/// Check that every required input variable is present with the units the
/// transform assumes.
pub fn validate_input_units(dataset: &ForecastDataset) -> Result<()> {
    for (name, units) in REQUIRED_VARIABLES {
        dataset.variable(name)?.expect_units(name, units)?;
    }
    Ok(())
}

/// Run the full transformation on one in-memory dataset.
pub fn process_dataset(
    dataset: ForecastDataset,
    config: &ProcessingConfig,
) -> Result<ForecastDataset> {
    validate_input_units(&dataset)?;
    let dataset = coords::normalize(dataset)?;
    let dataset = diff::difference_accumulated(dataset)?;
    let dataset = attrs::convert_temperatures(dataset)?;
    let dataset = derive::add_wind_speed(dataset)?;
    let dataset = derive::add_relative_humidity(dataset)?;
    let dataset = leadtime::assign(dataset)?;
    attrs::finalize(dataset, config)
}

/// Read, transform, and write one forecast file.
///
/// Returns the path of the processed output file. A failure anywhere leaves
/// no partial output behind.
pub fn process_file(input: &Path, config: &ProcessingConfig) -> Result<PathBuf> {
    let dataset = read_forecast_dataset(input)?;
    let dataset = process_dataset(dataset, config)?;

    if let Some(first) = dataset.time.absolute()?.first() {
        if !config.window_contains(first.year(), first.month()) {
            println!(
                "\u{26a0} {}: issuance {}-{:02} falls outside the configured window",
                input.display(),
                first.year(),
                first.month()
            );
        }
    }

    if config.verbose {
        print_dataset_summary(&dataset);
    }

    let output_path = processed_output_path(input, &config.output_dir);
    write_forecast_dataset(&dataset, &output_path)?;
    Ok(output_path)
}
