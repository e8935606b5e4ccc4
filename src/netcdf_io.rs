//! NetCDF I/O operations for forecast datasets
//!
//! This module provides the reader that loads a raw CDS forecast file into a
//! [`ForecastDataset`], the writer that serializes a processed dataset with
//! proper metadata, CF time decoding/encoding, and output-path derivation.

use crate::dataset::{
    DataVariable, ForecastDataset, TimeAxis, COORD_REFERENCE_TIME, DIM_ENSEMBLE, DIM_LATITUDE,
    DIM_LONGITUDE, DIM_TIME, RAW_DIM_ENSEMBLE, RAW_DIM_PERIOD,
};
use crate::errors::{ProcessError, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use ndarray::{Array1, ArrayD};
use netcdf::{create, open, AttributeValue, File};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Units attribute written on the output time coordinate.
const TIME_ENCODING_UNITS: &str = "seconds since 1970-01-01 00:00:00";

/// Auxiliary source variables that are not carried into the dataset. The
/// reconstructed time axis supersedes `valid_time`.
const SKIPPED_SOURCE_VARIABLES: [&str; 1] = ["valid_time"];

// ---------------------------------------------------------------------------
// CF time decoding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeUnit {
    Seconds,
    Hours,
    Days,
}

fn parse_time_unit(s: &str) -> Result<TimeUnit> {
    match s.trim() {
        "seconds" | "second" | "s" => Ok(TimeUnit::Seconds),
        "hours" | "hour" | "h" => Ok(TimeUnit::Hours),
        "days" | "day" | "d" => Ok(TimeUnit::Days),
        other => Err(ProcessError::TimeDecode(format!(
            "unsupported time unit '{}'",
            other
        ))),
    }
}

fn duration_from_value(value: f64, unit: TimeUnit) -> Duration {
    let seconds = match unit {
        TimeUnit::Seconds => value,
        TimeUnit::Hours => value * 3600.0,
        TimeUnit::Days => value * 86400.0,
    };
    Duration::milliseconds((seconds * 1000.0).round() as i64)
}

fn parse_base_datetime(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let dt = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| ProcessError::TimeDecode(format!("invalid reference date '{}'", s)))?;
        return Ok(dt.and_utc());
    }
    Err(ProcessError::TimeDecode(format!(
        "unparseable reference datetime '{}'",
        s
    )))
}

/// Decode a CF epoch value with units of the form `<unit> since <datetime>`.
pub fn decode_epoch_time(value: f64, units: &str) -> Result<DateTime<Utc>> {
    let mut parts = units.trim().splitn(3, ' ');
    let unit = parts
        .next()
        .ok_or_else(|| ProcessError::TimeDecode(format!("empty time units '{}'", units)))?;
    let since = parts.next();
    let base = parts.next();
    if since != Some("since") {
        return Err(ProcessError::TimeDecode(format!(
            "expected '<unit> since <datetime>', got '{}'",
            units
        )));
    }
    let base = base
        .ok_or_else(|| ProcessError::TimeDecode(format!("missing reference datetime in '{}'", units)))?;
    Ok(parse_base_datetime(base)? + duration_from_value(value, parse_time_unit(unit)?))
}

/// Decode a CF duration value (units `seconds`, `hours`, or `days`).
pub fn decode_offset(value: f64, units: &str) -> Result<Duration> {
    Ok(duration_from_value(value, parse_time_unit(units)?))
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

fn variable_units(var: &netcdf::Variable) -> Option<String> {
    var.attribute("units")
        .and_then(|attr| attr.value().ok())
        .and_then(|value| match value {
            AttributeValue::Str(s) => Some(s),
            _ => None,
        })
}

fn required_coordinate<'f>(file: &'f File, name: &str) -> Result<netcdf::Variable<'f>> {
    file.variable(name)
        .ok_or_else(|| ProcessError::MissingCoordinate {
            name: name.to_string(),
        })
}

fn read_time_axis(file: &File) -> Result<TimeAxis> {
    let reference = required_coordinate(file, COORD_REFERENCE_TIME)?;
    let reference_units = variable_units(&reference).ok_or_else(|| {
        ProcessError::TimeDecode(format!("'{}' has no units attribute", COORD_REFERENCE_TIME))
    })?;
    let reference_values = reference.get_values::<f64, _>(..)?;
    let reference_value = *reference_values.first().ok_or_else(|| {
        ProcessError::TimeDecode(format!("'{}' is empty", COORD_REFERENCE_TIME))
    })?;
    let issuance = decode_epoch_time(reference_value, &reference_units)?;

    let period = required_coordinate(file, RAW_DIM_PERIOD)?;
    let period_units = variable_units(&period).ok_or_else(|| {
        ProcessError::TimeDecode(format!("'{}' has no units attribute", RAW_DIM_PERIOD))
    })?;
    let offsets = period
        .get_values::<f64, _>(..)?
        .into_iter()
        .map(|v| decode_offset(v, &period_units))
        .collect::<Result<Vec<Duration>>>()?;

    Ok(TimeAxis::Relative { issuance, offsets })
}

fn read_attributes<'a>(
    attrs: impl Iterator<Item = netcdf::Attribute<'a>>,
) -> HashMap<String, AttributeValue> {
    let mut map = HashMap::new();
    for attr in attrs {
        if let Ok(value) = attr.value() {
            map.insert(attr.name().to_string(), value);
        }
    }
    map
}

/// Read one raw forecast file into a [`ForecastDataset`].
///
/// Coordinates are decoded here; the time-axis algebra (issuance + offset,
/// one-day shift) is the coordinate normalizer's job. No partial dataset is
/// returned on error.
pub fn read_forecast_dataset(path: &Path) -> Result<ForecastDataset> {
    let file = open(path)?;

    let time = read_time_axis(&file)?;
    let ensemble = required_coordinate(&file, RAW_DIM_ENSEMBLE)?.get_values::<i32, _>(..)?;
    let latitude = required_coordinate(&file, DIM_LATITUDE)?.get_values::<f64, _>(..)?;
    let longitude = required_coordinate(&file, DIM_LONGITUDE)?.get_values::<f64, _>(..)?;

    let coordinate_names = [
        COORD_REFERENCE_TIME,
        RAW_DIM_PERIOD,
        RAW_DIM_ENSEMBLE,
        DIM_LATITUDE,
        DIM_LONGITUDE,
    ];

    let mut variables = HashMap::new();
    for var in file.variables() {
        let name = var.name();
        if coordinate_names.contains(&name.as_str())
            || SKIPPED_SOURCE_VARIABLES.contains(&name.as_str())
        {
            continue;
        }

        let dims: Vec<String> = var
            .dimensions()
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        let data = ArrayD::from_shape_vec(shape, var.get_values::<f64, _>(..)?)?;

        variables.insert(
            name,
            DataVariable {
                data,
                dims,
                attributes: read_attributes(var.attributes()),
            },
        );
    }

    Ok(ForecastDataset {
        time,
        ensemble,
        latitude,
        longitude,
        leadtime: None,
        variables,
        global_attributes: read_attributes(file.attributes()),
    })
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

fn put_variable_attribute(
    var: &mut netcdf::VariableMut<'_>,
    name: &str,
    value: &AttributeValue,
) -> Result<()> {
    match value {
        AttributeValue::Str(v) => {
            var.put_attribute(name, v.clone())?;
        }
        AttributeValue::Strs(v) => {
            var.put_attribute(name, v.clone())?;
        }
        AttributeValue::Float(v) => {
            var.put_attribute(name, *v)?;
        }
        AttributeValue::Floats(v) => {
            var.put_attribute(name, v.clone())?;
        }
        AttributeValue::Double(v) => {
            var.put_attribute(name, *v)?;
        }
        AttributeValue::Doubles(v) => {
            var.put_attribute(name, v.clone())?;
        }
        AttributeValue::Int(v) => {
            var.put_attribute(name, *v)?;
        }
        AttributeValue::Ints(v) => {
            var.put_attribute(name, v.clone())?;
        }
        AttributeValue::Short(v) => {
            var.put_attribute(name, *v)?;
        }
        AttributeValue::Shorts(v) => {
            var.put_attribute(name, v.clone())?;
        }
        _ => {
            eprintln!("\u{26a0} Skipped unsupported attribute type for '{}'", name);
        }
    }
    Ok(())
}

fn put_global_attribute(file: &mut netcdf::FileMut, name: &str, value: &AttributeValue) -> Result<()> {
    match value {
        AttributeValue::Str(v) => {
            file.add_attribute(name, v.clone())?;
        }
        AttributeValue::Strs(v) => {
            file.add_attribute(name, v.clone())?;
        }
        AttributeValue::Float(v) => {
            file.add_attribute(name, *v)?;
        }
        AttributeValue::Floats(v) => {
            file.add_attribute(name, v.clone())?;
        }
        AttributeValue::Double(v) => {
            file.add_attribute(name, *v)?;
        }
        AttributeValue::Doubles(v) => {
            file.add_attribute(name, v.clone())?;
        }
        AttributeValue::Int(v) => {
            file.add_attribute(name, *v)?;
        }
        AttributeValue::Ints(v) => {
            file.add_attribute(name, v.clone())?;
        }
        AttributeValue::Short(v) => {
            file.add_attribute(name, *v)?;
        }
        AttributeValue::Shorts(v) => {
            file.add_attribute(name, v.clone())?;
        }
        _ => {
            eprintln!("\u{26a0} Skipped unsupported global attribute type for '{}'", name);
        }
    }
    Ok(())
}

fn write_dataset_inner(dataset: &ForecastDataset, output_path: &Path) -> Result<()> {
    let times = dataset.time.absolute()?;
    let mut file = create(output_path)?;

    file.add_dimension(DIM_TIME, times.len())?;
    file.add_dimension(DIM_ENSEMBLE, dataset.ensemble.len())?;
    file.add_dimension(DIM_LATITUDE, dataset.latitude.len())?;
    file.add_dimension(DIM_LONGITUDE, dataset.longitude.len())?;

    {
        let mut time_var = file.add_variable::<i64>(DIM_TIME, &[DIM_TIME])?;
        time_var.put_attribute("units", TIME_ENCODING_UNITS)?;
        time_var.put_attribute("calendar", "proleptic_gregorian")?;
        time_var.put_attribute("long_name", "time")?;
        let seconds: Vec<i64> = times.iter().map(DateTime::timestamp).collect();
        time_var.put(Array1::from(seconds).view(), ..)?;
    }

    {
        let mut ensemble_var = file.add_variable::<i32>(DIM_ENSEMBLE, &[DIM_ENSEMBLE])?;
        ensemble_var.put_attribute("long_name", "ensemble member")?;
        ensemble_var.put(Array1::from(dataset.ensemble.clone()).view(), ..)?;
    }

    {
        let mut lat_var = file.add_variable::<f64>(DIM_LATITUDE, &[DIM_LATITUDE])?;
        lat_var.put_attribute("units", "degrees_north")?;
        lat_var.put_attribute("long_name", "latitude")?;
        lat_var.put(Array1::from(dataset.latitude.clone()).view(), ..)?;
    }

    {
        let mut lon_var = file.add_variable::<f64>(DIM_LONGITUDE, &[DIM_LONGITUDE])?;
        lon_var.put_attribute("units", "degrees_east")?;
        lon_var.put_attribute("long_name", "longitude")?;
        lon_var.put(Array1::from(dataset.longitude.clone()).view(), ..)?;
    }

    if let Some(leadtime) = &dataset.leadtime {
        let mut lead_var = file.add_variable::<i64>("leadtime", &[DIM_TIME])?;
        lead_var.put_attribute("units", "months")?;
        lead_var.put_attribute("long_name", "Leadtime")?;
        lead_var.put(Array1::from(leadtime.clone()).view(), ..)?;
    }

    for name in dataset.sorted_variable_names() {
        let variable = dataset.variable(&name)?;
        let dim_refs: Vec<&str> = variable.dims.iter().map(String::as_str).collect();
        let mut out = file.add_variable::<f64>(&name, &dim_refs)?;
        out.put(variable.data.view(), ..)?;

        let mut attr_names: Vec<&String> = variable.attributes.keys().collect();
        attr_names.sort();
        for attr_name in attr_names {
            put_variable_attribute(&mut out, attr_name, &variable.attributes[attr_name])?;
        }
    }

    let mut attr_names: Vec<&String> = dataset.global_attributes.keys().collect();
    attr_names.sort();
    for attr_name in attr_names {
        put_global_attribute(&mut file, attr_name, &dataset.global_attributes[attr_name])?;
    }

    Ok(())
}

/// Write a processed dataset to `output_path`.
///
/// An existing file at the path is replaced. A failed write removes the
/// partial output before the error propagates, so no corrupt file is left
/// behind.
pub fn write_forecast_dataset(dataset: &ForecastDataset, output_path: &Path) -> Result<()> {
    if output_path.exists() {
        fs::remove_file(output_path)?;
    }
    let result = write_dataset_inner(dataset, output_path);
    if result.is_err() {
        let _ = fs::remove_file(output_path);
    }
    result
}

/// Derive the output file name: the input stem gains a `_Processed` suffix
/// and the original extension is restored.
pub fn processed_output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    match input.extension().and_then(|s| s.to_str()) {
        Some(ext) => output_dir.join(format!("{}_Processed.{}", stem, ext)),
        None => output_dir.join(format!("{}_Processed", stem)),
    }
}
