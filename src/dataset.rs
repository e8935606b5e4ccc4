//! In-memory data model for one seasonal-forecast file
//!
//! A [`ForecastDataset`] is constructed fresh per input file, threaded
//! through the pipeline stages as a value, and handed to the NetCDF writer.
//! Variables are labeled n-dimensional arrays carrying their dimension names
//! in storage order plus NetCDF-style attributes.

use crate::errors::{ProcessError, Result};
use chrono::{DateTime, Duration, Utc};
use ndarray::ArrayD;
use netcdf::AttributeValue;
use std::collections::HashMap;

/// Canonical dimension names after normalization, in canonical order.
pub const DIM_TIME: &str = "time";
pub const DIM_ENSEMBLE: &str = "ensemble";
pub const DIM_LATITUDE: &str = "latitude";
pub const DIM_LONGITUDE: &str = "longitude";

/// Canonical dimension order for 4-D variables.
pub const CANONICAL_DIMS: [&str; 4] = [DIM_TIME, DIM_ENSEMBLE, DIM_LATITUDE, DIM_LONGITUDE];

/// Dimension and coordinate names as they appear in the raw CDS files.
pub const RAW_DIM_PERIOD: &str = "forecast_period";
pub const RAW_DIM_ENSEMBLE: &str = "number";
pub const COORD_REFERENCE_TIME: &str = "forecast_reference_time";

/// Raw variable names as delivered by the originating centre.
pub const VAR_TMAX_RAW: &str = "mx2t24";
pub const VAR_TMIN_RAW: &str = "mn2t24";
pub const VAR_TMEAN_RAW: &str = "t2m";
pub const VAR_TDEW_RAW: &str = "d2m";
pub const VAR_U10: &str = "u10";
pub const VAR_V10: &str = "v10";
pub const VAR_PRECIP_RAW: &str = "tp";
pub const VAR_RADIATION_RAW: &str = "ssrd";

/// Required input variables and the units each must declare.
///
/// Validated at pipeline entry; a mismatch is a fatal per-file error rather
/// than silently wrong physical values downstream.
pub const REQUIRED_VARIABLES: &[(&str, &str)] = &[
    (VAR_TMAX_RAW, "K"),
    (VAR_TMIN_RAW, "K"),
    (VAR_TMEAN_RAW, "K"),
    (VAR_TDEW_RAW, "K"),
    (VAR_U10, "m s**-1"),
    (VAR_V10, "m s**-1"),
    (VAR_PRECIP_RAW, "m"),
    (VAR_RADIATION_RAW, "J m**-2"),
];

/// The temperature variables converted from Kelvin to Celsius.
pub const TEMPERATURE_VARIABLES: [&str; 4] =
    [VAR_TMAX_RAW, VAR_TMIN_RAW, VAR_TMEAN_RAW, VAR_TDEW_RAW];

/// The time axis of a dataset.
///
/// Raw files carry a scalar issuance timestamp plus per-step offsets; the
/// coordinate normalizer collapses those into one absolute axis. The enum
/// makes the distinction explicit so later stages cannot run on an
/// un-normalized axis by accident.
#[derive(Debug, Clone)]
pub enum TimeAxis {
    /// As read from the file: forecast issuance plus per-step offsets.
    Relative {
        issuance: DateTime<Utc>,
        offsets: Vec<Duration>,
    },
    /// After normalization: one absolute timestamp per step.
    Absolute(Vec<DateTime<Utc>>),
}

impl TimeAxis {
    /// Number of time steps.
    pub fn len(&self) -> usize {
        match self {
            TimeAxis::Relative { offsets, .. } => offsets.len(),
            TimeAxis::Absolute(times) => times.len(),
        }
    }

    /// Returns `true` if the axis has no steps.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The absolute timestamps, failing if the normalizer has not run.
    pub fn absolute(&self) -> Result<&[DateTime<Utc>]> {
        match self {
            TimeAxis::Absolute(times) => Ok(times),
            TimeAxis::Relative { .. } => Err(ProcessError::Generic(
                "time axis has not been normalized to absolute timestamps".to_string(),
            )),
        }
    }
}

/// One labeled multi-dimensional variable.
#[derive(Debug, Clone)]
pub struct DataVariable {
    /// Values in the storage order given by `dims`.
    pub data: ArrayD<f64>,
    /// Dimension names in storage order.
    pub dims: Vec<String>,
    /// NetCDF-style attributes (`units`, `long_name`, ...).
    pub attributes: HashMap<String, AttributeValue>,
}

impl DataVariable {
    /// Create a variable with no attributes.
    pub fn new(data: ArrayD<f64>, dims: Vec<String>) -> Self {
        Self {
            data,
            dims,
            attributes: HashMap::new(),
        }
    }

    /// The `units` attribute as a string, if present.
    pub fn units(&self) -> Option<&str> {
        match self.attributes.get("units") {
            Some(AttributeValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Set a string attribute, replacing any previous value.
    pub fn set_attr(&mut self, key: &str, value: &str) {
        self.attributes
            .insert(key.to_string(), AttributeValue::Str(value.to_string()));
    }

    /// Enforce a units entry contract for this variable.
    pub fn expect_units(&self, var_name: &str, expected: &str) -> Result<()> {
        match self.units() {
            Some(found) if found == expected => Ok(()),
            Some(found) => Err(ProcessError::UnitMismatch {
                var: var_name.to_string(),
                expected: expected.to_string(),
                found: found.to_string(),
            }),
            None => Err(ProcessError::UnitMismatch {
                var: var_name.to_string(),
                expected: expected.to_string(),
                found: "(missing)".to_string(),
            }),
        }
    }

}

/// The central entity flowing through every pipeline stage.
#[derive(Debug, Clone)]
pub struct ForecastDataset {
    pub time: TimeAxis,
    /// Ensemble member numbers; contiguous 1..=N after normalization.
    pub ensemble: Vec<i32>,
    pub latitude: Vec<f64>,
    pub longitude: Vec<f64>,
    /// Lead-time coordinate aligned with `time`; attached by stage 4.
    pub leadtime: Option<Vec<i64>>,
    pub variables: HashMap<String, DataVariable>,
    pub global_attributes: HashMap<String, AttributeValue>,
}

impl ForecastDataset {
    /// Borrow a variable, failing with [`ProcessError::MissingVariable`].
    pub fn variable(&self, name: &str) -> Result<&DataVariable> {
        self.variables
            .get(name)
            .ok_or_else(|| ProcessError::MissingVariable {
                var: name.to_string(),
            })
    }

    /// Mutably borrow a variable, failing with [`ProcessError::MissingVariable`].
    pub fn variable_mut(&mut self, name: &str) -> Result<&mut DataVariable> {
        self.variables
            .get_mut(name)
            .ok_or_else(|| ProcessError::MissingVariable {
                var: name.to_string(),
            })
    }

    /// Rename a variable, keeping data and attributes.
    pub fn rename_variable(&mut self, from: &str, to: &str) -> Result<()> {
        let var = self
            .variables
            .remove(from)
            .ok_or_else(|| ProcessError::MissingVariable {
                var: from.to_string(),
            })?;
        self.variables.insert(to.to_string(), var);
        Ok(())
    }

    /// Variable names in sorted order, for deterministic output and listing.
    pub fn sorted_variable_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.variables.keys().cloned().collect();
        names.sort();
        names
    }
}
