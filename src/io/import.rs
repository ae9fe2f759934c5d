//! CSV import for unit lists, COP tables, load profiles and priority files.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::fleet::{Combination, Unit};
use crate::performance::CopTable;
use crate::priority::PriorityOrder;
use crate::profile::{HOURS_PER_DAY, LoadProfile, LoadSample};

#[derive(Debug, Deserialize)]
struct UnitRow {
    #[serde(rename = "Chiller")]
    id: String,
    #[serde(rename = "Capacity (TR)")]
    capacity_tr: f64,
    #[serde(rename = "Type", default)]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct PriorityRow {
    #[serde(rename = "Chiller")]
    id: String,
    #[serde(rename = "Priority")]
    rank: u32,
}

fn reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source)
}

fn open(path: &Path) -> Result<File> {
    Ok(File::open(path)?)
}

/// Reads a `Chiller,Capacity (TR),Type` unit list.
///
/// # Errors
///
/// Returns a CSV error for a malformed file.
pub fn read_units(source: impl Read) -> Result<Vec<Unit>> {
    reader(source)
        .deserialize::<UnitRow>()
        .map(|row| {
            let row = row?;
            Ok(Unit::tons(row.id, row.capacity_tr).with_kind(row.kind))
        })
        .collect()
}

/// Reads a unit list from a file. See [`read_units`].
///
/// # Errors
///
/// Returns an I/O or CSV error.
pub fn load_units(path: &Path) -> Result<Vec<Unit>> {
    read_units(open(path)?)
}

/// Parses a COP cell; empty, non-numeric or non-finite cells are absent.
fn parse_cop(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|cop| cop.is_finite())
}

/// Reads one COP table: first column the load in kW, then one column per
/// combination, headed by `+`-joined unit ids in any order.
///
/// The table's combination size is taken from its first combination column.
/// Rows whose load cell is empty are skipped.
///
/// # Errors
///
/// Returns [`Error::InvalidPerformanceTable`] for a table without combination
/// columns, columns of mixed sizes, or an unparseable load.
pub fn read_cop_table(source: impl Read) -> Result<CopTable> {
    let mut rdr = reader(source);
    let headers = rdr.headers()?.clone();
    let columns: Vec<Combination> = headers.iter().skip(1).map(Combination::parse).collect();

    let size = columns.first().map(Combination::len).ok_or_else(|| {
        Error::InvalidPerformanceTable("table has no combination columns".into())
    })?;
    if let Some(column) = columns.iter().find(|c| c.len() != size || c.is_empty()) {
        return Err(Error::InvalidPerformanceTable(format!(
            "column `{column}` does not have {size} units"
        )));
    }

    let mut rows = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        let Some(load_cell) = record.get(0).filter(|cell| !cell.is_empty()) else {
            continue;
        };
        let load: f64 = load_cell.parse().map_err(|_| {
            Error::InvalidPerformanceTable(format!(
                "row {}: load `{load_cell}` is not a number",
                line + 1
            ))
        })?;
        let cops = (1..=columns.len())
            .map(|i| record.get(i).and_then(parse_cop))
            .collect();
        rows.push((load, cops));
    }

    debug!(size, columns = columns.len(), rows = rows.len(), "read COP table");
    Ok(CopTable {
        size,
        columns,
        rows,
    })
}

/// Reads a COP table from a file. See [`read_cop_table`].
///
/// # Errors
///
/// Returns an I/O, CSV or table error.
pub fn load_cop_table(path: &Path) -> Result<CopTable> {
    read_cop_table(open(path)?)
}

/// Highest hour index a load profile file may use (one leap year of hours).
pub const MAX_PROFILE_HOURS: usize = 366 * HOURS_PER_DAY;

/// Extracts the hour from either an integer or a `YYYY-MM-DD HH:MM:SS` stamp.
fn parse_hour(cell: &str) -> Option<usize> {
    if let Ok(hour) = cell.parse::<usize>() {
        return Some(hour);
    }
    let time = cell.split_whitespace().nth(1)?;
    time.split(':').next()?.parse().ok()
}

/// Reads an hourly load profile: first column the hour, second the load (kW).
///
/// Duplicate hours keep their first value. Hours missing from the file, up to
/// the last hour present or a full day, whichever is longer, are filled with
/// a zero load.
///
/// # Errors
///
/// Returns [`Error::EmptyLoadProfile`] for a file without data rows and
/// [`Error::InvalidLoadProfile`] for an unreadable hour or load, or an hour
/// at or beyond [`MAX_PROFILE_HOURS`].
pub fn read_load_profile(source: impl Read) -> Result<LoadProfile> {
    let mut loads: BTreeMap<usize, f64> = BTreeMap::new();

    for (line, record) in reader(source).records().enumerate() {
        let record = record?;
        let hour_cell = record.get(0).unwrap_or_default();
        let load_cell = record.get(1).unwrap_or_default();
        if hour_cell.is_empty() && load_cell.is_empty() {
            continue;
        }
        let hour = parse_hour(hour_cell).ok_or_else(|| {
            Error::InvalidLoadProfile(format!("row {}: cannot read hour `{hour_cell}`", line + 1))
        })?;
        if hour >= MAX_PROFILE_HOURS {
            return Err(Error::InvalidLoadProfile(format!(
                "row {}: hour {hour} is beyond the last supported hour ({})",
                line + 1,
                MAX_PROFILE_HOURS - 1
            )));
        }
        let load: f64 = load_cell.parse().map_err(|_| {
            Error::InvalidLoadProfile(format!("row {}: load `{load_cell}` is not a number", line + 1))
        })?;
        loads.entry(hour).or_insert(load);
    }

    let Some(&last) = loads.keys().next_back() else {
        return Err(Error::EmptyLoadProfile);
    };
    let hours = (last + 1).max(HOURS_PER_DAY);
    let missing: Vec<usize> = (0..hours).filter(|h| !loads.contains_key(h)).collect();
    if !missing.is_empty() {
        warn!(?missing, "load profile has no data for some hours; using 0 kW");
    }

    LoadProfile::new(
        (0..hours)
            .map(|hour| LoadSample {
                hour,
                load: loads.get(&hour).copied().unwrap_or(0.0),
            })
            .collect(),
    )
}

/// Reads a load profile from a file. See [`read_load_profile`].
///
/// # Errors
///
/// Returns an I/O, CSV or profile error.
pub fn load_profile(path: &Path) -> Result<LoadProfile> {
    read_load_profile(open(path)?)
}

/// Reads a `Chiller,Priority` ranking.
///
/// # Errors
///
/// Returns a CSV error, or [`Error::InvalidPriorityOrder`] unless the ranks
/// form a permutation of `1..=N`.
pub fn read_priority(source: impl Read) -> Result<PriorityOrder> {
    let ranks = reader(source)
        .deserialize::<PriorityRow>()
        .map(|row| row.map(|row| (row.id, row.rank)))
        .collect::<std::result::Result<Vec<_>, csv::Error>>()?;
    PriorityOrder::from_ranks(ranks)
}

/// Reads a priority ranking from a file. See [`read_priority`].
///
/// # Errors
///
/// Returns an I/O, CSV or ranking error.
pub fn load_priority(path: &Path) -> Result<PriorityOrder> {
    read_priority(open(path)?)
}
