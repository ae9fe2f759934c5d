//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use chiller_staging::fleet::{Combination, Fleet, Unit};
use chiller_staging::performance::PerformanceTable;
use chiller_staging::priority::PriorityOrder;
use chiller_staging::profile::LoadProfile;
use chiller_staging::search::SearchOptions;

/// Fleet of kW-rated units, declared in the given order.
pub fn fleet(units: &[(&str, f64)]) -> Fleet {
    Fleet::new(units.iter().map(|&(id, kw)| Unit::kw(id, kw)).collect())
        .expect("fixture fleet should be valid")
}

/// Table with one COP per combination, the same at every load.
///
/// Combinations not listed have no samples, so their COP is absent.
pub fn flat_table(cops: &[(&str, f64)]) -> PerformanceTable {
    let mut table = PerformanceTable::new();
    for &(key, cop) in cops {
        table.insert(Combination::parse(key), 0.0, Some(cop));
    }
    table
}

/// Profile with the same load every hour.
pub fn flat_profile(load: f64, hours: usize) -> LoadProfile {
    LoadProfile::from_loads(&vec![load; hours]).expect("fixture profile should be valid")
}

/// Profile at `before` kW until `at`, then `after` kW for the rest of the day.
pub fn step_profile(before: f64, after: f64, at: usize) -> LoadProfile {
    let loads: Vec<f64> = (0..24).map(|h| if h < at { before } else { after }).collect();
    LoadProfile::from_loads(&loads).expect("fixture profile should be valid")
}

/// Priority order from a comma list such as `"A,B,C"`.
pub fn order(list: &str) -> PriorityOrder {
    PriorityOrder::parse_list(list).expect("fixture order should be valid")
}

/// Sequential search options with a small batch size.
pub fn options(batch_size: usize) -> SearchOptions {
    SearchOptions {
        batch_size,
        ..SearchOptions::default()
    }
}
