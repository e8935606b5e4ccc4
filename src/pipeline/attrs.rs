//! Metadata and unit rewriting (stage 5, plus the early Kelvin conversion)
//!
//! Converts temperatures to Celsius, rescales precipitation and radiation to
//! standard daily units, renames variables to their published names, keeps
//! only approved metadata forward, and writes the replacement descriptive
//! attributes. Runs last so it sees final variable names; the temperature
//! conversion alone is ordered ahead of the humidity derivation.

use crate::config::ProcessingConfig;
use crate::dataset::{
    ForecastDataset, TEMPERATURE_VARIABLES, VAR_PRECIP_RAW, VAR_RADIATION_RAW, VAR_TDEW_RAW,
    VAR_TMAX_RAW, VAR_TMEAN_RAW, VAR_TMIN_RAW, VAR_U10, VAR_V10,
};
use crate::errors::{ProcessError, Result};
use chrono::Utc;
use netcdf::AttributeValue;
use std::collections::HashMap;

/// Global attributes copied forward from the source file. Everything else
/// (GRIB provenance keys, source history, institution) is left behind.
const APPROVED_GLOBAL_ATTRIBUTES: [&str; 4] = ["title", "references", "source", "comment"];

/// Variable attributes copied forward from the source variables.
const APPROVED_VARIABLE_ATTRIBUTES: [&str; 4] =
    ["units", "long_name", "description", "standard_name"];

/// Offset between Kelvin and Celsius.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Convert the four temperature variables from Kelvin to Celsius.
///
/// Ordered ahead of the relative-humidity derivation, which requires
/// Celsius inputs.
pub fn convert_temperatures(mut dataset: ForecastDataset) -> Result<ForecastDataset> {
    for name in TEMPERATURE_VARIABLES {
        let variable = dataset.variable_mut(name)?;
        variable.expect_units(name, "K")?;
        variable.data.mapv_inplace(|v| v - KELVIN_OFFSET);
        variable.set_attr("units", "DegC");
    }
    Ok(dataset)
}

fn scale_variable(
    dataset: &mut ForecastDataset,
    name: &str,
    expected_units: &str,
    factor: f64,
    units: &str,
    description_key: &str,
    description: &str,
) -> Result<()> {
    let variable = dataset.variable_mut(name)?;
    variable.expect_units(name, expected_units)?;
    variable.data.mapv_inplace(|v| v * factor);
    variable.set_attr("units", units);
    variable.set_attr(description_key, description);
    Ok(())
}

fn describe_temperature(dataset: &mut ForecastDataset, name: &str, description: &str) -> Result<()> {
    let variable = dataset.variable_mut(name)?;
    variable.expect_units(name, "DegC")?;
    variable.set_attr("description", description);
    Ok(())
}

/// Final metadata and unit rewrite.
pub fn finalize(mut dataset: ForecastDataset, config: &ProcessingConfig) -> Result<ForecastDataset> {
    // Daily increments: metres to mm, joules to megajoules.
    scale_variable(
        &mut dataset,
        "precipitation",
        "m",
        1000.0,
        "mm day**-1",
        "description",
        "Daily rainfall",
    )?;
    scale_variable(
        &mut dataset,
        "rad",
        "J m**-2",
        1e-6,
        "MJ day**-1",
        "long_name",
        "Solar radiation",
    )?;

    // Raw accumulations keep cumulative-since-issuance semantics.
    scale_variable(
        &mut dataset,
        VAR_PRECIP_RAW,
        "m",
        1000.0,
        "mm",
        "description",
        "Total cumulative rainfall",
    )?;
    scale_variable(
        &mut dataset,
        VAR_RADIATION_RAW,
        "J m**-2",
        1e-6,
        "MJ m**-2",
        "long_name",
        "Cumulative solar radiation",
    )?;

    describe_temperature(&mut dataset, VAR_TMAX_RAW, "Max temperature")?;
    describe_temperature(&mut dataset, VAR_TMIN_RAW, "Min temperature")?;
    describe_temperature(&mut dataset, VAR_TMEAN_RAW, "Mean temperature")?;
    describe_temperature(&mut dataset, VAR_TDEW_RAW, "Dewpoint temperature")?;

    dataset.rename_variable(VAR_TMAX_RAW, "tmax")?;
    dataset.rename_variable(VAR_TMIN_RAW, "tmin")?;
    dataset.rename_variable(VAR_TMEAN_RAW, "tmean")?;
    dataset.rename_variable(VAR_TDEW_RAW, "tdew")?;
    dataset.rename_variable(VAR_PRECIP_RAW, "total_precipitation")?;
    dataset.rename_variable(VAR_RADIATION_RAW, "totalrad")?;

    // The wind components were consumed by the wind-speed derivation.
    dataset.variables.remove(VAR_U10);
    dataset.variables.remove(VAR_V10);

    for variable in dataset.variables.values_mut() {
        variable
            .attributes
            .retain(|key, _| APPROVED_VARIABLE_ATTRIBUTES.contains(&key.as_str()));
    }

    dataset.global_attributes = rewrite_global_attributes(&dataset.global_attributes, config);

    verify_metadata(&dataset)?;
    Ok(dataset)
}

fn rewrite_global_attributes(
    source: &HashMap<String, AttributeValue>,
    config: &ProcessingConfig,
) -> HashMap<String, AttributeValue> {
    let mut attrs: HashMap<String, AttributeValue> = source
        .iter()
        .filter(|(key, _)| APPROVED_GLOBAL_ATTRIBUTES.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let mut set = |key: &str, value: String| {
        attrs.insert(key.to_string(), AttributeValue::Str(value));
    };

    set(
        "Conventions",
        "CF-1.7 (modified to be compatible with tools like CDO and NCO that work with CF-1.6)"
            .to_string(),
    );
    set(
        "Institution",
        format!(
            "{}, Wageningen University (WUR), Instituto Nacional de Tecnolog\u{ed}a Agropecuaria (INTA)",
            config.centre
        ),
    );
    set("Region", config.region_description.clone());
    set(
        "Processing date",
        Utc::now().format("%d/%m/%Y %H:%M:%S").to_string(),
    );
    set(
        "Contact",
        "WUR Agrometeorology ; INTA Clima y Agua".to_string(),
    );
    set(
        "History",
        format!(
            "Processed from {} seasonal forecasts. Days have been shifted one day and daily \
             differences have been calculated for precipitation and solar radiation. Average \
             wind speed is calculated by using horizontal and vertical wind component. Lead \
             time was incorporated to enable the comparison of forecast performance starting \
             from lead time 1 across all years and months",
            config.centre
        ),
    );

    attrs
}

/// Every retained variable must leave this stage with non-empty units and a
/// description or long_name.
fn verify_metadata(dataset: &ForecastDataset) -> Result<()> {
    for (name, variable) in &dataset.variables {
        match variable.units() {
            Some(units) if !units.is_empty() => {}
            _ => {
                return Err(ProcessError::Generic(format!(
                    "variable '{}' left the metadata rewrite without units",
                    name
                )))
            }
        }
        let described = ["long_name", "description"].iter().any(|key| {
            matches!(
                variable.attributes.get(*key),
                Some(AttributeValue::Str(s)) if !s.is_empty()
            )
        });
        if !described {
            return Err(ProcessError::Generic(format!(
                "variable '{}' left the metadata rewrite without a description",
                name
            )));
        }
    }
    Ok(())
}
