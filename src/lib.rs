//! RuSeFo: seasonal-forecast NetCDF normalization
//!
//! A Rust tool for converting raw CDS seasonal daily forecasts (ensemble,
//! multi-variable, monthly-issued) into a normalized form compatible with
//! CDO, NCO, and similar tools. RuSeFo reconstructs and reorders the
//! coordinate axes, recovers daily increments from cumulative fields,
//! derives wind speed and relative humidity, standardizes units, and
//! attaches a per-step lead-time coordinate.
//!
//! ## Key Features
//!
//! - **Coordinate Normalization**: absolute time axis from issuance +
//!   offset, canonical (time, ensemble, latitude, longitude) order,
//!   ensemble members renumbered from 1
//! - **Differencing**: per-step increments recovered from accumulated
//!   precipitation and radiation
//! - **Derived Variables**: 2 m wind speed and relative humidity
//! - **Lead-Time Indexing**: 1-based lead time counted from issuance
//! - **Unit Contracts**: every unit-sensitive stage validates its inputs
//!   and fails loudly on a mismatch
//!
//! ## Module Organization
//!
//! - [`dataset`]: the in-memory forecast dataset model
//! - [`pipeline`]: the five-stage per-file transformation
//! - [`netcdf_io`]: NetCDF reading, writing, and CF time decoding
//! - [`batch`]: directory enumeration and the per-file driver loop
//! - [`metadata`]: dataset summary printing
//! - [`config`]: the processing configuration surface
//! - [`errors`]: centralized error handling
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use ru_se_fo::prelude::*;
//! use std::path::Path;
//!
//! let dataset = ru_se_fo::netcdf_io::read_forecast_dataset(Path::new("forecast.nc")).unwrap();
//! ```
//!
//! The tool processes one file at a time, single-threaded; a full dataset
//! must fit in memory.

// Core modules
pub mod batch;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod errors;
pub mod metadata;
pub mod netcdf_io;
pub mod pipeline;

// High-level convenience API
pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::batch::{process_directory, BatchSummary};
    pub use crate::config::ProcessingConfig;
    pub use crate::dataset::{DataVariable, ForecastDataset, TimeAxis};
    pub use crate::errors::{ProcessError, Result};
    pub use crate::netcdf_io::{
        processed_output_path, read_forecast_dataset, write_forecast_dataset,
    };
    pub use crate::pipeline::{process_dataset, process_file};
}
