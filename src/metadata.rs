//! Dataset inspection for per-file progress reporting
//!
//! Prints a clean, organized summary of a processed dataset: dimensions,
//! variables with their key attributes, and global attribute count.

use crate::dataset::{
    ForecastDataset, DIM_ENSEMBLE, DIM_LATITUDE, DIM_LONGITUDE, DIM_TIME,
};
use netcdf::AttributeValue;

/// Print dimensions, variables, and key attributes of a dataset.
pub fn print_dataset_summary(dataset: &ForecastDataset) {
    println!("\n Dimensions");
    println!("==============");
    for (name, len) in [
        (DIM_TIME, dataset.time.len()),
        (DIM_ENSEMBLE, dataset.ensemble.len()),
        (DIM_LATITUDE, dataset.latitude.len()),
        (DIM_LONGITUDE, dataset.longitude.len()),
    ] {
        println!("    {} = {}", name, len);
    }
    if let Some(leadtime) = &dataset.leadtime {
        let max_lead = leadtime.iter().max().copied().unwrap_or(0);
        println!("    leadtime = {} (1..{})", leadtime.len(), max_lead);
    }

    println!("\n Variables");
    println!("=============");
    for name in dataset.sorted_variable_names() {
        let Ok(variable) = dataset.variable(&name) else {
            continue;
        };
        let shape: Vec<String> = variable
            .data
            .shape()
            .iter()
            .map(|s| s.to_string())
            .collect();
        println!(
            "    {}: [{}] = ({})",
            name,
            variable.dims.join(", "),
            shape.join(" x ")
        );

        let mut key_attrs = Vec::new();
        for key in ["units", "long_name", "description"] {
            if let Some(AttributeValue::Str(value)) = variable.attributes.get(key) {
                key_attrs.push(format!("{}: {}", key, value));
            }
        }
        if !key_attrs.is_empty() {
            println!("      {}", key_attrs.join(", "));
        }
    }

    println!(
        "\n Global attributes: {}",
        dataset.global_attributes.len()
    );
}
