//! Derived meteorological variables (stage 3)
//!
//! Computes the 2 m wind speed from the 10 m wind components and relative
//! humidity from mean and dew-point temperature. Both are pure elementwise
//! operations over the full (time, ensemble, latitude, longitude) grid.

use crate::dataset::{DataVariable, ForecastDataset, VAR_TDEW_RAW, VAR_TMEAN_RAW, VAR_U10, VAR_V10};
use crate::errors::{ProcessError, Result};
use ndarray::Zip;

/// Logarithmic wind-profile correction from 10 m to 2 m measurement height,
/// after FAO Irrigation and Drainage Paper 56 (Allen et al., 1998).
pub fn wind_profile_correction() -> f64 {
    4.87 / (67.8 * 10.0_f64 - 5.42).ln()
}

/// Add `wnd`, the average wind speed at 2 m.
pub fn add_wind_speed(mut dataset: ForecastDataset) -> Result<ForecastDataset> {
    let u10 = dataset.variable(VAR_U10)?;
    u10.expect_units(VAR_U10, "m s**-1")?;
    let v10 = dataset.variable(VAR_V10)?;
    v10.expect_units(VAR_V10, "m s**-1")?;

    if u10.dims != v10.dims {
        return Err(ProcessError::Generic(format!(
            "wind components have mismatched dimensions: {:?} vs {:?}",
            u10.dims, v10.dims
        )));
    }

    let factor = wind_profile_correction();
    let data = Zip::from(&u10.data)
        .and(&v10.data)
        .map_collect(|&u, &v| (u * u + v * v).sqrt() * factor);
    let dims = u10.dims.clone();

    let mut wind = DataVariable::new(data, dims);
    wind.set_attr("units", "m s**-1");
    wind.set_attr("long_name", "Average wind speed at 2 m");
    dataset.variables.insert("wnd".to_string(), wind);

    Ok(dataset)
}

/// Add `rh`, relative humidity from mean and dew-point temperature.
///
/// Uses the dew-point spread approximation `rh = 100 - 5 (tmean - tdew)`
/// with both temperatures in Celsius, so the Kelvin conversion must already
/// have run. Values outside [0, 100] are a property of the input and pass
/// through unclamped.
pub fn add_relative_humidity(mut dataset: ForecastDataset) -> Result<ForecastDataset> {
    let tmean = dataset.variable(VAR_TMEAN_RAW)?;
    tmean.expect_units(VAR_TMEAN_RAW, "DegC")?;
    let tdew = dataset.variable(VAR_TDEW_RAW)?;
    tdew.expect_units(VAR_TDEW_RAW, "DegC")?;

    if tmean.dims != tdew.dims {
        return Err(ProcessError::Generic(format!(
            "temperature variables have mismatched dimensions: {:?} vs {:?}",
            tmean.dims, tdew.dims
        )));
    }

    let data = Zip::from(&tmean.data)
        .and(&tdew.data)
        .map_collect(|&tm, &td| 100.0 - 5.0 * (tm - td));
    let dims = tmean.dims.clone();

    let mut humidity = DataVariable::new(data, dims);
    humidity.set_attr("units", "%");
    humidity.set_attr("long_name", "Relative humidity");
    dataset.variables.insert("rh".to_string(), humidity);

    Ok(dataset)
}
