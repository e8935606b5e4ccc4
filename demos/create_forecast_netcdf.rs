//! Creates a sample raw seasonal-forecast NetCDF file for testing RuSeFo.
//!
//! The generated file mimics what the originating centre delivers: a scalar
//! forecast_reference_time, forecast_period offsets, zero-based ensemble
//! numbers, Kelvin temperatures, cumulative precipitation and radiation,
//! and GRIB provenance attributes.

use chrono::{TimeZone, Utc};
use ndarray::{arr0, Array1, ArrayD, IxDyn};
use netcdf::create;
use std::path::Path;

const NT: usize = 5;
const NE: usize = 3;
const NLAT: usize = 4;
const NLON: usize = 4;

fn add_field(
    file: &mut netcdf::FileMut,
    name: &str,
    units: &str,
    value: &dyn Fn(usize, usize) -> f64,
) -> Result<(), netcdf::Error> {
    let mut data = ArrayD::zeros(IxDyn(&[NE, NT, NLAT, NLON]));
    for e in 0..NE {
        for t in 0..NT {
            for la in 0..NLAT {
                for lo in 0..NLON {
                    data[[e, t, la, lo]] = value(t, e);
                }
            }
        }
    }
    let mut var = file.add_variable::<f64>(
        name,
        &["number", "forecast_period", "latitude", "longitude"],
    )?;
    var.put_attribute("units", units)?;
    var.put(data.view(), ..)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output_path = Path::new("raw_forecast.nc");

    println!("Creating sample forecast file: {}", output_path.display());

    if output_path.exists() {
        std::fs::remove_file(output_path)?;
    }

    let mut file = create(output_path)?;

    file.add_dimension("forecast_period", NT)?;
    file.add_dimension("number", NE)?;
    file.add_dimension("latitude", NLAT)?;
    file.add_dimension("longitude", NLON)?;

    let issuance = Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).unwrap();
    {
        let mut reference = file.add_variable::<f64>("forecast_reference_time", &[])?;
        reference.put_attribute("units", "seconds since 1970-01-01")?;
        reference.put_attribute("long_name", "initial time of forecast")?;
        reference.put(arr0(issuance.timestamp() as f64).view(), &[] as &[usize])?;
    }

    {
        let mut period = file.add_variable::<f64>("forecast_period", &["forecast_period"])?;
        period.put_attribute("units", "days")?;
        period.put_attribute("long_name", "time since forecast_reference_time")?;
        let offsets: Vec<f64> = (0..NT).map(|i| i as f64 + 1.0).collect();
        period.put(Array1::from(offsets).view(), ..)?;
    }

    {
        let mut number = file.add_variable::<i32>("number", &["number"])?;
        number.put_attribute("long_name", "ensemble member numerical id")?;
        let members: Vec<i32> = (0..NE as i32).collect();
        number.put(Array1::from(members).view(), ..)?;
    }

    {
        let mut lat = file.add_variable::<f64>("latitude", &["latitude"])?;
        lat.put_attribute("units", "degrees_north")?;
        lat.put_attribute("long_name", "latitude")?;
        let lats: Vec<f64> = (0..NLAT).map(|i| -24.0 - i as f64 * 2.0).collect();
        lat.put(Array1::from(lats).view(), ..)?;
    }

    {
        let mut lon = file.add_variable::<f64>("longitude", &["longitude"])?;
        lon.put_attribute("units", "degrees_east")?;
        lon.put_attribute("long_name", "longitude")?;
        let lons: Vec<f64> = (0..NLON).map(|i| -65.0 + i as f64 * 2.0).collect();
        lon.put(Array1::from(lons).view(), ..)?;
    }

    // Kelvin temperatures with a small per-step trend and member spread
    add_field(&mut file, "mx2t24", "K", &|t, e| {
        303.15 + t as f64 * 0.5 + e as f64 * 0.1
    })?;
    add_field(&mut file, "mn2t24", "K", &|t, e| {
        278.15 + t as f64 * 0.5 + e as f64 * 0.1
    })?;
    add_field(&mut file, "t2m", "K", &|t, e| {
        290.65 + t as f64 * 0.5 + e as f64 * 0.1
    })?;
    add_field(&mut file, "d2m", "K", &|t, e| {
        285.65 + t as f64 * 0.4 + e as f64 * 0.1
    })?;
    add_field(&mut file, "u10", "m s**-1", &|t, _| 2.0 + t as f64 * 0.2)?;
    add_field(&mut file, "v10", "m s**-1", &|t, _| 3.0 - t as f64 * 0.1)?;
    // Cumulative since issuance
    add_field(&mut file, "tp", "m", &|t, _| 0.004 * t as f64)?;
    add_field(&mut file, "ssrd", "J m**-2", &|t, _| 1.8e7 * t as f64)?;

    file.add_attribute("GRIB_edition", 2i32)?;
    file.add_attribute("GRIB_centre", "ecmf")?;
    file.add_attribute("GRIB_centreDescription", "European Centre for Medium-Range Weather Forecasts")?;
    file.add_attribute("GRIB_subCentre", 0i32)?;
    file.add_attribute("history", "retrieved from the climate data store")?;
    file.add_attribute("institution", "European Centre for Medium-Range Weather Forecasts")?;

    println!("Successfully created sample forecast file with:");
    println!(
        "   Dimensions: forecast_period({}), number({}), latitude({}), longitude({})",
        NT, NE, NLAT, NLON
    );
    println!("   Variables: mx2t24, mn2t24, t2m, d2m, u10, v10, tp, ssrd");
    println!("\nProcess it with:");
    println!("   cargo run -- -i . -o processed");

    Ok(())
}
