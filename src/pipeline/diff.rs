//! Cumulative-to-incremental differencing (stage 2)
//!
//! The accumulated precipitation and shortwave radiation fields are stored
//! as running totals since forecast issuance. This stage recovers per-step
//! increments: the first step keeps its raw value, every later step becomes
//! the difference to its predecessor, labeled at the upper time step.

use crate::dataset::{DataVariable, ForecastDataset, DIM_TIME, VAR_PRECIP_RAW, VAR_RADIATION_RAW};
use crate::errors::{ProcessError, Result};
use ndarray::{Axis, Slice};

/// Cumulative-origin variables, the names of their differenced copies, and
/// the units each must carry on entry.
pub const DIFFERENCED_VARIABLES: [(&str, &str, &str); 2] = [
    (VAR_PRECIP_RAW, "precipitation", "m"),
    (VAR_RADIATION_RAW, "rad", "J m**-2"),
];

/// Add differenced copies of the cumulative-origin variables.
///
/// The raw cumulative fields stay in the dataset; they are renamed and
/// rescaled by the metadata rewriter.
pub fn difference_accumulated(mut dataset: ForecastDataset) -> Result<ForecastDataset> {
    let steps = dataset.time.len();

    for (source, target, units) in DIFFERENCED_VARIABLES {
        let variable = dataset.variable(source)?;
        variable.expect_units(source, units)?;

        if steps < 2 {
            return Err(ProcessError::InsufficientTimeSteps {
                var: source.to_string(),
                steps,
            });
        }

        let time_axis = variable
            .dims
            .iter()
            .position(|d| d == DIM_TIME)
            .ok_or_else(|| {
                ProcessError::Generic(format!(
                    "variable '{}' has no time dimension to difference over",
                    source
                ))
            })?;

        // Start from the raw series and subtract the predecessor from every
        // step but the first: out[0] = raw[0], out[i] = raw[i] - raw[i-1].
        let mut differenced = variable.data.clone();
        let previous = variable
            .data
            .slice_axis(Axis(time_axis), Slice::from(..steps - 1))
            .to_owned();
        {
            let mut upper = differenced.slice_axis_mut(Axis(time_axis), Slice::from(1..));
            upper -= &previous;
        }
        let dims = variable.dims.clone();
        let attributes = variable.attributes.clone();

        dataset.variables.insert(
            target.to_string(),
            DataVariable {
                data: differenced,
                dims,
                attributes,
            },
        );
    }

    Ok(dataset)
}
