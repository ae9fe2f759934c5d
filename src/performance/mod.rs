//! Measured coefficient-of-performance tables with nearest-load lookup.

/// Part-load curve generator for plants without measured data.
pub mod synthetic;

use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};
use crate::fleet::Combination;

pub use synthetic::SyntheticCurve;

/// One measured point of a combination's part-load curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceSample {
    /// Cooling load in kW.
    pub load: f64,
    /// Coefficient of performance, `None` where no measurement exists.
    pub cop: Option<f64>,
}

impl PerformanceSample {
    /// Returns the COP if it is a usable measurement.
    fn valid_cop(&self) -> Option<f64> {
        match self.cop {
            Some(cop) if cop.is_finite() && self.load.is_finite() => Some(cop),
            _ => None,
        }
    }
}

/// A raw table for one combination size, as read from a data source.
///
/// `columns[i]` names the combination whose COP sits at `rows[r].1[i]`.
#[derive(Debug, Clone, Default)]
pub struct CopTable {
    /// Combination size every column must have.
    pub size: usize,
    /// Column identities.
    pub columns: Vec<Combination>,
    /// `(load, cop per column)` rows in source order.
    pub rows: Vec<(f64, Vec<Option<f64>>)>,
}

/// COP samples grouped by combination size, then by combination identity.
#[derive(Debug, Clone, Default)]
pub struct PerformanceTable {
    tables: BTreeMap<usize, HashMap<Combination, Vec<PerformanceSample>>>,
}

impl PerformanceTable {
    /// Creates an empty table; every lookup returns `None`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one sample, keeping insertion order within its combination.
    pub fn insert(&mut self, combination: Combination, load: f64, cop: Option<f64>) {
        self.tables
            .entry(combination.len())
            .or_default()
            .entry(combination)
            .or_default()
            .push(PerformanceSample { load, cop });
    }

    /// Merges a raw size table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPerformanceTable`] if a column has the wrong
    /// number of members or a row has the wrong number of cells.
    pub fn add_table(&mut self, table: CopTable) -> Result<()> {
        if let Some(column) = table.columns.iter().find(|c| c.len() != table.size) {
            return Err(Error::InvalidPerformanceTable(format!(
                "column `{column}` has {} units in the size-{} table",
                column.len(),
                table.size
            )));
        }

        for (row, (load, cops)) in table.rows.into_iter().enumerate() {
            if cops.len() != table.columns.len() {
                return Err(Error::InvalidPerformanceTable(format!(
                    "row {} of the size-{} table has {} cells, expected {}",
                    row + 1,
                    table.size,
                    cops.len(),
                    table.columns.len()
                )));
            }
            for (column, cop) in table.columns.iter().zip(cops) {
                self.insert(column.clone(), load, cop);
            }
        }
        Ok(())
    }

    /// COP of `combination` at the sample whose load is closest to `load`.
    ///
    /// Ties keep the first sample encountered. Absent or non-finite samples
    /// are skipped. Returns `None` when the combination has no usable sample,
    /// which is never the same thing as a COP of zero.
    pub fn cop(&self, combination: &Combination, load: f64) -> Option<f64> {
        let samples = self.tables.get(&combination.len())?.get(combination)?;

        let mut best: Option<(f64, f64)> = None;
        for sample in samples {
            let Some(cop) = sample.valid_cop() else {
                continue;
            };
            let distance = (sample.load - load).abs();
            match best {
                Some((best_distance, _)) if distance >= best_distance => {}
                _ => best = Some((distance, cop)),
            }
        }
        best.map(|(_, cop)| cop)
    }

    /// Samples recorded for a combination, in insertion order.
    pub fn samples(&self, combination: &Combination) -> &[PerformanceSample] {
        self.tables
            .get(&combination.len())
            .and_then(|by_combination| by_combination.get(combination))
            .map_or(&[], Vec::as_slice)
    }

    /// Combination sizes that have at least one column.
    pub fn sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.tables.keys().copied()
    }

    /// Number of distinct combinations with samples.
    pub fn combination_count(&self) -> usize {
        self.tables.values().map(HashMap::len).sum()
    }

    /// Returns `true` if no sample has been recorded.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
