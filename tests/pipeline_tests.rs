//! Stage-level tests for the transformation pipeline
//!
//! These tests build small in-memory datasets with known values and check
//! the exact output of each pipeline stage.

use chrono::{Duration, TimeZone, Utc};
use ndarray::{ArrayD, IxDyn};
use ru_se_fo::config::ProcessingConfig;
use ru_se_fo::dataset::{
    DataVariable, ForecastDataset, TimeAxis, CANONICAL_DIMS, DIM_LATITUDE, DIM_LONGITUDE,
    DIM_TIME, RAW_DIM_ENSEMBLE, RAW_DIM_PERIOD,
};
use ru_se_fo::errors::ProcessError;
use ru_se_fo::pipeline::{self, attrs, coords, derive, diff, leadtime};
use std::collections::HashMap;
use std::path::PathBuf;

const NLAT: usize = 2;
const NLON: usize = 2;

fn test_config() -> ProcessingConfig {
    ProcessingConfig {
        centre: "ECMWF".to_string(),
        input_dir: PathBuf::from("."),
        output_dir: PathBuf::from("."),
        years: 2021..=2023,
        months: 1..=12,
        region: "Chaco".to_string(),
        region_description: "Chaco Region, Argentina".to_string(),
        continue_on_error: false,
        verbose: false,
    }
}

fn issuance() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).unwrap()
}

/// Accumulated precipitation series in metres: 0, 5, 12, then +7 per step.
fn cumulative_precip(step: usize) -> f64 {
    match step {
        0 => 0.0,
        1 => 5.0,
        n => 12.0 + 7.0 * (n as f64 - 2.0),
    }
}

/// A 4-D variable in raw storage order (number, forecast_period, latitude,
/// longitude), filled from a per-index function.
fn raw_var4(
    nt: usize,
    ne: usize,
    units: &str,
    f: impl Fn(usize, usize, usize, usize) -> f64,
) -> DataVariable {
    let mut data = ArrayD::zeros(IxDyn(&[ne, nt, NLAT, NLON]));
    for e in 0..ne {
        for t in 0..nt {
            for la in 0..NLAT {
                for lo in 0..NLON {
                    data[[e, t, la, lo]] = f(t, e, la, lo);
                }
            }
        }
    }
    let mut var = DataVariable::new(
        data,
        vec![
            RAW_DIM_ENSEMBLE.to_string(),
            RAW_DIM_PERIOD.to_string(),
            DIM_LATITUDE.to_string(),
            DIM_LONGITUDE.to_string(),
        ],
    );
    var.set_attr("units", units);
    var
}

/// A raw dataset as the reader would produce it: relative time axis with
/// daily offsets, zero-based member numbers, all required variables.
fn raw_dataset(nt: usize, ne: usize) -> ForecastDataset {
    let offsets: Vec<Duration> = (0..nt).map(|i| Duration::days(i as i64 + 1)).collect();

    let mut variables = HashMap::new();
    variables.insert(
        "mx2t24".to_string(),
        raw_var4(nt, ne, "K", |t, _, _, _| 303.15 + t as f64),
    );
    variables.insert(
        "mn2t24".to_string(),
        raw_var4(nt, ne, "K", |t, _, _, _| 278.15 + t as f64),
    );
    variables.insert(
        "t2m".to_string(),
        raw_var4(nt, ne, "K", |t, _, _, _| 288.15 + t as f64),
    );
    variables.insert(
        "d2m".to_string(),
        raw_var4(nt, ne, "K", |t, _, _, _| 283.15 + t as f64),
    );
    variables.insert(
        "u10".to_string(),
        raw_var4(nt, ne, "m s**-1", |_, _, _, _| 3.0),
    );
    variables.insert(
        "v10".to_string(),
        raw_var4(nt, ne, "m s**-1", |_, _, _, _| 4.0),
    );
    let mut tp = raw_var4(nt, ne, "m", |t, _, _, _| cumulative_precip(t));
    tp.set_attr("GRIB_paramId", "228");
    variables.insert("tp".to_string(), tp);
    variables.insert(
        "ssrd".to_string(),
        raw_var4(nt, ne, "J m**-2", |t, _, _, _| 2.0e6 * t as f64),
    );

    let mut global_attributes = HashMap::new();
    global_attributes.insert(
        "GRIB_edition".to_string(),
        netcdf::AttributeValue::Int(2),
    );
    global_attributes.insert(
        "GRIB_centre".to_string(),
        netcdf::AttributeValue::Str("ecmf".to_string()),
    );
    global_attributes.insert(
        "history".to_string(),
        netcdf::AttributeValue::Str("retrieved from archive".to_string()),
    );
    global_attributes.insert(
        "institution".to_string(),
        netcdf::AttributeValue::Str("source institution".to_string()),
    );
    global_attributes.insert(
        "title".to_string(),
        netcdf::AttributeValue::Str("Test Dataset".to_string()),
    );

    ForecastDataset {
        time: TimeAxis::Relative {
            issuance: issuance(),
            offsets,
        },
        ensemble: (0..ne as i32).collect(),
        latitude: vec![-25.0, -26.0],
        longitude: vec![-60.0, -61.0],
        leadtime: None,
        variables,
        global_attributes,
    }
}

/// A minimal normalized dataset holding only Celsius temperature fields,
/// for the humidity formula checks.
fn celsius_dataset(tmean: [f64; 2], tdew: [f64; 2]) -> ForecastDataset {
    let times = vec![issuance(), issuance() + Duration::days(1)];
    let make = |values: [f64; 2]| {
        let mut data = ArrayD::zeros(IxDyn(&[2]));
        data[[0]] = values[0];
        data[[1]] = values[1];
        let mut var = DataVariable::new(data, vec![DIM_TIME.to_string()]);
        var.set_attr("units", "DegC");
        var
    };
    let mut variables = HashMap::new();
    variables.insert("t2m".to_string(), make(tmean));
    variables.insert("d2m".to_string(), make(tdew));

    ForecastDataset {
        time: TimeAxis::Absolute(times),
        ensemble: vec![1],
        latitude: vec![-25.0],
        longitude: vec![-60.0],
        leadtime: None,
        variables,
        global_attributes: HashMap::new(),
    }
}

#[test]
fn test_normalize_reconstructs_time_axis() {
    let ds = coords::normalize(raw_dataset(3, 2)).unwrap();
    let times = ds.time.absolute().unwrap();

    // issuance + 1 day offset - 1 day shift lands on the issuance day
    assert_eq!(times.len(), 3);
    assert_eq!(times[0], Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).unwrap());
    assert_eq!(times[1], Utc.with_ymd_and_hms(2022, 3, 2, 0, 0, 0).unwrap());
    assert_eq!(times[2], Utc.with_ymd_and_hms(2022, 3, 3, 0, 0, 0).unwrap());
}

#[test]
fn test_normalize_renumbers_ensemble_from_one() {
    let ds = coords::normalize(raw_dataset(2, 4)).unwrap();
    assert_eq!(ds.ensemble, vec![1, 2, 3, 4]);

    // Contiguous 1..=N even when the source numbering does not start at 0
    let mut raw = raw_dataset(2, 3);
    raw.ensemble = vec![5, 7, 9];
    let ds = coords::normalize(raw).unwrap();
    assert_eq!(ds.ensemble, vec![1, 2, 3]);
}

#[test]
fn test_normalize_transposes_to_canonical_order() {
    let mut raw = raw_dataset(3, 2);
    // Encode the source index in each value to track the transposition
    raw.variables.insert(
        "t2m".to_string(),
        raw_var4(3, 2, "K", |t, e, la, lo| {
            1000.0 * e as f64 + 100.0 * t as f64 + 10.0 * la as f64 + lo as f64
        }),
    );
    let ds = coords::normalize(raw).unwrap();
    let t2m = ds.variable("t2m").unwrap();

    assert_eq!(t2m.dims, CANONICAL_DIMS.map(String::from).to_vec());
    assert_eq!(t2m.data.shape(), &[3, 2, NLAT, NLON]);
    for t in 0..3 {
        for e in 0..2 {
            for la in 0..NLAT {
                for lo in 0..NLON {
                    let expected =
                        1000.0 * e as f64 + 100.0 * t as f64 + 10.0 * la as f64 + lo as f64;
                    assert_eq!(t2m.data[[t, e, la, lo]], expected);
                }
            }
        }
    }
}

#[test]
fn test_normalize_rejects_absolute_axis() {
    let ds = coords::normalize(raw_dataset(2, 1)).unwrap();
    let result = coords::normalize(ds);
    assert!(matches!(result, Err(ProcessError::Generic(_))));
}

#[test]
fn test_differencer_preserves_first_step() {
    let ds = coords::normalize(raw_dataset(4, 2)).unwrap();
    let ds = diff::difference_accumulated(ds).unwrap();

    let raw = ds.variable("tp").unwrap();
    let diffed = ds.variable("precipitation").unwrap();
    assert_eq!(diffed.dims, raw.dims);

    for e in 0..2 {
        for la in 0..NLAT {
            for lo in 0..NLON {
                assert_eq!(diffed.data[[0, e, la, lo]], raw.data[[0, e, la, lo]]);
                for t in 1..4 {
                    let expected = raw.data[[t, e, la, lo]] - raw.data[[t - 1, e, la, lo]];
                    assert_eq!(diffed.data[[t, e, la, lo]], expected);
                }
            }
        }
    }

    // Known series 0, 5, 12, 19 differences to 0, 5, 7, 7
    assert_eq!(diffed.data[[0, 0, 0, 0]], 0.0);
    assert_eq!(diffed.data[[1, 0, 0, 0]], 5.0);
    assert_eq!(diffed.data[[2, 0, 0, 0]], 7.0);
    assert_eq!(diffed.data[[3, 0, 0, 0]], 7.0);

    // The raw cumulative field is untouched
    assert_eq!(raw.data[[2, 0, 0, 0]], 12.0);
}

#[test]
fn test_differencer_requires_two_steps() {
    let ds = coords::normalize(raw_dataset(1, 1)).unwrap();
    let result = diff::difference_accumulated(ds);
    match result {
        Err(ProcessError::InsufficientTimeSteps { var, steps }) => {
            assert_eq!(var, "tp");
            assert_eq!(steps, 1);
        }
        _ => panic!("Expected InsufficientTimeSteps error"),
    }
}

#[test]
fn test_kelvin_conversion_round_trip() {
    let ds = coords::normalize(raw_dataset(2, 1)).unwrap();
    let original = ds.variable("t2m").unwrap().data.clone();
    let ds = attrs::convert_temperatures(ds).unwrap();

    let converted = ds.variable("t2m").unwrap();
    assert_eq!(converted.units(), Some("DegC"));
    assert!((converted.data[[0, 0, 0, 0]] - 15.0).abs() < 1e-9);

    let recovered = converted.data.mapv(|v| v + 273.15);
    for (a, b) in recovered.iter().zip(original.iter()) {
        assert!((a - b).abs() < 1e-9);
    }
}

#[test]
fn test_kelvin_conversion_rejects_wrong_units() {
    let mut ds = coords::normalize(raw_dataset(2, 1)).unwrap();
    ds.variable_mut("t2m").unwrap().set_attr("units", "degC");
    let result = attrs::convert_temperatures(ds);
    match result {
        Err(ProcessError::UnitMismatch { var, expected, found }) => {
            assert_eq!(var, "t2m");
            assert_eq!(expected, "K");
            assert_eq!(found, "degC");
        }
        _ => panic!("Expected UnitMismatch error"),
    }
}

#[test]
fn test_wind_speed_reference_value() {
    let ds = coords::normalize(raw_dataset(2, 1)).unwrap();
    let ds = derive::add_wind_speed(ds).unwrap();
    let wind = ds.variable("wnd").unwrap();

    // u10 = 3, v10 = 4 has magnitude 5 before the height correction
    let expected = 5.0 * 4.87 / (67.8_f64 * 10.0 - 5.42).ln();
    assert!((wind.data[[0, 0, 0, 0]] - expected).abs() < 1e-6);
    assert!((wind.data[[0, 0, 0, 0]] - 3.73976).abs() < 1e-4);

    assert_eq!(wind.units(), Some("m s**-1"));
    assert!(matches!(
        wind.attributes.get("long_name"),
        Some(netcdf::AttributeValue::Str(s)) if s == "Average wind speed at 2 m"
    ));
}

#[test]
fn test_relative_humidity_values() {
    // Saturated: tmean == tdew gives exactly 100
    let ds = derive::add_relative_humidity(celsius_dataset([20.0, 25.0], [20.0, 15.0])).unwrap();
    let rh = ds.variable("rh").unwrap();
    assert_eq!(rh.data[[0]], 100.0);
    // A 10 degree dew-point spread gives exactly 50
    assert_eq!(rh.data[[1]], 50.0);
    assert_eq!(rh.units(), Some("%"));
}

#[test]
fn test_relative_humidity_requires_celsius() {
    let mut ds = celsius_dataset([20.0, 20.0], [10.0, 10.0]);
    ds.variable_mut("t2m").unwrap().set_attr("units", "K");
    let result = derive::add_relative_humidity(ds);
    assert!(matches!(result, Err(ProcessError::UnitMismatch { .. })));
}

#[test]
fn test_leadtime_increments_per_forecast_month() {
    let times = vec![
        Utc.with_ymd_and_hms(2022, 11, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2022, 12, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2023, 2, 1, 0, 0, 0).unwrap(),
    ];
    let mut ds = celsius_dataset([20.0, 20.0], [10.0, 10.0]);
    ds.time = TimeAxis::Absolute(times);

    let ds = leadtime::assign(ds).unwrap();
    // Starts at 1 at issuance and increases by 1 per step across the year
    // boundary
    assert_eq!(ds.leadtime, Some(vec![1, 2, 3, 4]));
}

#[test]
fn test_leadtime_ranks_daily_steps_within_months() {
    let times = vec![
        Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2022, 3, 2, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2022, 3, 31, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2022, 4, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2022, 4, 30, 0, 0, 0).unwrap(),
    ];
    let mut ds = celsius_dataset([20.0, 20.0], [10.0, 10.0]);
    ds.time = TimeAxis::Absolute(times);

    let ds = leadtime::assign(ds).unwrap();
    assert_eq!(ds.leadtime, Some(vec![1, 1, 1, 2, 2]));
}

#[test]
fn test_process_dataset_end_state() {
    let ds = pipeline::process_dataset(raw_dataset(3, 2), &test_config()).unwrap();

    // Final variable set
    let mut names = ds.sorted_variable_names();
    names.sort();
    assert_eq!(
        names,
        vec![
            "precipitation",
            "rad",
            "rh",
            "tdew",
            "tmax",
            "tmean",
            "tmin",
            "total_precipitation",
            "totalrad",
            "wnd",
        ]
    );

    // Every 4-D variable is in canonical dimension order with non-empty
    // units and a description
    for name in &names {
        let variable = ds.variable(name).unwrap();
        if variable.dims.len() == 4 {
            assert_eq!(
                variable.dims,
                CANONICAL_DIMS.map(String::from).to_vec(),
                "variable {} not in canonical order",
                name
            );
        }
        assert!(!variable.units().unwrap_or("").is_empty());
        assert!(variable
            .attributes
            .keys()
            .all(|key| !key.starts_with("GRIB_")));
    }

    // Differenced precipitation 0, 5, 7 scaled to mm
    let precipitation = ds.variable("precipitation").unwrap();
    assert_eq!(precipitation.data[[0, 0, 0, 0]], 0.0);
    assert_eq!(precipitation.data[[1, 0, 0, 0]], 5000.0);
    assert_eq!(precipitation.data[[2, 0, 0, 0]], 7000.0);
    assert_eq!(precipitation.units(), Some("mm day**-1"));

    // Raw accumulation rescaled but not differenced
    let total = ds.variable("total_precipitation").unwrap();
    assert_eq!(total.data[[2, 0, 0, 0]], 12000.0);
    assert_eq!(total.units(), Some("mm"));

    // Radiation in MJ
    let rad = ds.variable("rad").unwrap();
    assert_eq!(rad.data[[1, 0, 0, 0]], 2.0);
    assert_eq!(rad.units(), Some("MJ day**-1"));
    let totalrad = ds.variable("totalrad").unwrap();
    assert_eq!(totalrad.data[[2, 0, 0, 0]], 4.0);
    assert_eq!(totalrad.units(), Some("MJ m**-2"));

    // Temperatures in Celsius under their published names
    let tmean = ds.variable("tmean").unwrap();
    assert!((tmean.data[[0, 0, 0, 0]] - 15.0).abs() < 1e-9);
    assert_eq!(tmean.units(), Some("DegC"));

    // Humidity from the 5 degree spread
    let rh = ds.variable("rh").unwrap();
    assert!((rh.data[[0, 0, 0, 0]] - 75.0).abs() < 1e-9);

    // Daily steps inside one issuance month share lead time 1
    assert_eq!(ds.leadtime, Some(vec![1, 1, 1]));

    // Provenance is gone, replacements are present
    assert!(!ds.global_attributes.contains_key("GRIB_edition"));
    assert!(!ds.global_attributes.contains_key("GRIB_centre"));
    assert!(!ds.global_attributes.contains_key("history"));
    assert!(!ds.global_attributes.contains_key("institution"));
    for key in [
        "Conventions",
        "Institution",
        "Region",
        "Contact",
        "History",
        "Processing date",
    ] {
        assert!(
            ds.global_attributes.contains_key(key),
            "missing global attribute {}",
            key
        );
    }
    // Approved source metadata is carried forward
    assert!(ds.global_attributes.contains_key("title"));
}

#[test]
fn test_process_dataset_rejects_unit_violation() {
    let mut raw = raw_dataset(3, 2);
    raw.variable_mut("tp").unwrap().set_attr("units", "kg m**-2");
    let result = pipeline::process_dataset(raw, &test_config());
    assert!(matches!(result, Err(ProcessError::UnitMismatch { .. })));
}

#[test]
fn test_process_dataset_rejects_missing_variable() {
    let mut raw = raw_dataset(3, 2);
    raw.variables.remove("ssrd");
    let result = pipeline::process_dataset(raw, &test_config());
    match result {
        Err(ProcessError::MissingVariable { var }) => assert_eq!(var, "ssrd"),
        _ => panic!("Expected MissingVariable error"),
    }
}
