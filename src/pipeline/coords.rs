//! Coordinate normalization (stage 1)
//!
//! Reconstructs the absolute time axis from the forecast issuance timestamp
//! plus the per-step offsets, shifts it back one day, renames the raw
//! dimensions, renumbers the ensemble coordinate to start at 1, and
//! transposes every variable into canonical dimension order.

use crate::dataset::{
    ForecastDataset, TimeAxis, CANONICAL_DIMS, DIM_ENSEMBLE, DIM_TIME, RAW_DIM_ENSEMBLE,
    RAW_DIM_PERIOD,
};
use crate::errors::{ProcessError, Result};
use chrono::{DateTime, Duration, Utc};
use ndarray::{ArrayD, Axis, IxDyn};
use std::mem;

/// Replace a variable's data in place, passing the old array through `f`.
fn remap_data(
    data: &mut ArrayD<f64>,
    f: impl FnOnce(ArrayD<f64>) -> ArrayD<f64>,
) {
    let old = mem::replace(data, ArrayD::zeros(IxDyn(&[0])));
    *data = f(old);
}

/// Normalize the coordinates of a freshly read dataset.
///
/// The raw format stamps each step with the end of its accumulation window;
/// the one-day shift aligns every step with its logical calendar day.
pub fn normalize(mut dataset: ForecastDataset) -> Result<ForecastDataset> {
    let (issuance, offsets) = match &dataset.time {
        TimeAxis::Relative { issuance, offsets } => (*issuance, offsets.clone()),
        TimeAxis::Absolute(_) => {
            return Err(ProcessError::Generic(
                "coordinate normalizer called on an already-normalized time axis".to_string(),
            ))
        }
    };

    let one_day = Duration::days(1);
    let times: Vec<DateTime<Utc>> = offsets
        .iter()
        .map(|offset| issuance + *offset - one_day)
        .collect();
    dataset.time = TimeAxis::Absolute(times);

    // Members are renumbered positionally so the coordinate is always the
    // contiguous run 1..=N, whatever the source numbering started at.
    dataset.ensemble = (1..=dataset.ensemble.len() as i32).collect();

    for (name, variable) in dataset.variables.iter_mut() {
        // Squeeze singleton axes that are not canonical dimensions; the
        // scalar issuance axis is redundant once summed into the time axis.
        while let Some(idx) = variable
            .dims
            .iter()
            .position(|d| !CANONICAL_DIMS.contains(&d.as_str()) && !is_raw_dim(d))
        {
            let len = variable.data.shape()[idx];
            if len != 1 {
                return Err(ProcessError::Generic(format!(
                    "variable '{}' has unexpected dimension '{}' of length {}",
                    name, variable.dims[idx], len
                )));
            }
            remap_data(&mut variable.data, |d| d.index_axis_move(Axis(idx), 0));
            variable.dims.remove(idx);
        }

        for dim in variable.dims.iter_mut() {
            if dim == RAW_DIM_PERIOD {
                *dim = DIM_TIME.to_string();
            } else if dim == RAW_DIM_ENSEMBLE {
                *dim = DIM_ENSEMBLE.to_string();
            }
        }

        transpose_canonical(name, variable.dims.clone(), variable)?;
    }

    Ok(dataset)
}

fn is_raw_dim(dim: &str) -> bool {
    dim == RAW_DIM_PERIOD || dim == RAW_DIM_ENSEMBLE
}

fn transpose_canonical(
    name: &str,
    current: Vec<String>,
    variable: &mut crate::dataset::DataVariable,
) -> Result<()> {
    let desired: Vec<String> = CANONICAL_DIMS
        .iter()
        .filter(|d| current.iter().any(|c| c == *d))
        .map(|d| d.to_string())
        .collect();

    if desired.len() != current.len() {
        return Err(ProcessError::Generic(format!(
            "variable '{}' has non-canonical dimensions {:?}",
            name, current
        )));
    }
    if desired == current {
        return Ok(());
    }

    let mut permutation = Vec::with_capacity(desired.len());
    for dim in &desired {
        let idx = current
            .iter()
            .position(|c| c == dim)
            .ok_or_else(|| ProcessError::Generic(format!("dimension '{}' vanished", dim)))?;
        permutation.push(idx);
    }

    remap_data(&mut variable.data, |d| {
        d.permuted_axes(IxDyn(&permutation))
            .as_standard_layout()
            .to_owned()
    });
    variable.dims = desired;
    Ok(())
}
