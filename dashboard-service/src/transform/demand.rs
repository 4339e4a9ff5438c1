use std::collections::BTreeMap;

use community_domain::domain::DemandPeriod;

use crate::{clock::TimeKey, store::RecordStore};

/// No period matching the key had a usable regional demand.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("no valid demand periods for {key}")]
pub struct InsufficientDataError {
    pub key: TimeKey,
}

fn key_matches(key: TimeKey, period: DemandPeriod) -> bool {
    match key {
        TimeKey::Hour(h) => period.hour() == h,
        TimeKey::Quarter(p) => period == p,
    }
}

/// Regional demand per market period (MW), summed over the demand zones and
/// skipping missing or non-finite values. Periods are keyed by time of day and
/// source row, so the same quarter on different days stays separate.
fn period_totals<F>(store: &RecordStore, include: F) -> BTreeMap<(DemandPeriod, usize), f64>
where
    F: Fn(DemandPeriod) -> bool,
{
    let mut totals = BTreeMap::new();
    for record in store.demand_records().iter().filter(|r| include(r.period)) {
        let total = totals
            .entry((record.period, record.source_row))
            .or_insert(0.0);
        if let Some(mw) = record.usable_demand() {
            *total += mw;
        }
    }
    totals
}

/// Average over periods whose regional total is positive.
fn average_of_valid<I>(totals: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = totals
        .into_iter()
        .filter(|t| *t > 0.0)
        .fold((0.0, 0usize), |(sum, count), t| (sum + t, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Average regional demand (MW) over the valid periods matching `key`.
pub fn aggregate(store: &RecordStore, key: TimeKey) -> Result<f64, InsufficientDataError> {
    average_of_valid(period_totals(store, |p| key_matches(key, p)).into_values())
        .ok_or(InsufficientDataError { key })
}

/// Average regional demand for every hour that has at least one valid period.
pub fn hourly_averages(store: &RecordStore) -> BTreeMap<u8, f64> {
    let mut by_hour: BTreeMap<u8, Vec<f64>> = BTreeMap::new();
    for ((period, _), total) in period_totals(store, |_| true) {
        by_hour.entry(period.hour()).or_default().push(total);
    }
    by_hour
        .into_iter()
        .filter_map(|(hour, totals)| average_of_valid(totals).map(|avg| (hour, avg)))
        .collect()
}

/// Demand for `hour`, falling back to linear interpolation between the nearest
/// hours before and after it that have data. One-sided when only one neighbour
/// exists; hours do not wrap around midnight.
pub fn interpolate(store: &RecordStore, hour: u8) -> Result<f64, InsufficientDataError> {
    let averages = hourly_averages(store);
    if let Some(avg) = averages.get(&hour) {
        return Ok(*avg);
    }

    let before = averages.range(..hour).next_back();
    let after = averages.range(hour.saturating_add(1)..).next();

    match (before, after) {
        (Some((&h0, &v0)), Some((&h1, &v1))) => {
            let weight = f64::from(hour - h0) / f64::from(h1 - h0);
            Ok(v0 + weight * (v1 - v0))
        }
        (Some((_, &v)), None) | (None, Some((_, &v))) => Ok(v),
        (None, None) => Err(InsufficientDataError {
            key: TimeKey::Hour(hour),
        }),
    }
}
