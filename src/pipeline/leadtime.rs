//! Lead-time indexing (stage 4)
//!
//! Attaches a per-step lead-time coordinate counted from 1 at the start of
//! the forecast run, so forecasts issued in different months and years can
//! be compared by distance from issuance regardless of calendar.

use crate::dataset::ForecastDataset;
use crate::errors::{ProcessError, Result};
use chrono::Datelike;

/// Compute the lead-time coordinate and attach it to the dataset.
///
/// Raw values are months elapsed since the file's own issuance date (the
/// first time step): `(month - month0 + 1) + 12 * (year - year0)`. The raw
/// values are then re-expressed as a 1-based rank over the ascending
/// distinct values, so the first time step always maps to lead time 1.
pub fn assign(mut dataset: ForecastDataset) -> Result<ForecastDataset> {
    let times = dataset.time.absolute()?;
    let first = times.first().ok_or_else(|| {
        ProcessError::Generic("cannot compute lead time for an empty time axis".to_string())
    })?;

    let issuance_year = first.year();
    let issuance_month = i64::from(first.month());

    let raw: Vec<i64> = times
        .iter()
        .map(|t| {
            (i64::from(t.month()) - issuance_month + 1)
                + 12 * i64::from(t.year() - issuance_year)
        })
        .collect();

    let mut distinct = raw.clone();
    distinct.sort_unstable();
    distinct.dedup();

    let ranks: Vec<i64> = raw
        .iter()
        .map(|value| distinct.partition_point(|d| d < value) as i64 + 1)
        .collect();

    dataset.leadtime = Some(ranks);
    Ok(dataset)
}
