//! Fleet of interchangeable cooling units and its capacity model.

/// Canonical combination identity.
pub mod combination;
/// Unit nameplate data.
pub mod unit;

use std::collections::{HashMap, HashSet};

pub use combination::Combination;
pub use unit::{CapacityUnit, KW_PER_TON, Unit};

use crate::error::{Error, Result};

/// The static set of units available for staging.
///
/// Declaration order is preserved; it is the order in which the search
/// enumerates priority permutations.
#[derive(Debug, Clone)]
pub struct Fleet {
    units: Vec<Unit>,
    capacity_kw: HashMap<String, f64>,
}

impl Fleet {
    /// Builds a fleet, rejecting blank, duplicate or `+`-joined ids and
    /// non-finite or negative ratings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyFleet`], [`Error::InvalidUnitId`],
    /// [`Error::DuplicateUnit`] or [`Error::InvalidCapacity`].
    pub fn new(units: Vec<Unit>) -> Result<Self> {
        if units.is_empty() {
            return Err(Error::EmptyFleet);
        }

        let mut seen = HashSet::with_capacity(units.len());
        for unit in &units {
            if unit.id.trim().is_empty() || unit.id.contains(combination::SEPARATOR) {
                return Err(Error::InvalidUnitId(unit.id.clone()));
            }
            if !seen.insert(unit.id.as_str()) {
                return Err(Error::DuplicateUnit(unit.id.clone()));
            }
            if !unit.capacity.is_finite() || unit.capacity < 0.0 {
                return Err(Error::InvalidCapacity {
                    id: unit.id.clone(),
                    capacity: unit.capacity,
                });
            }
        }

        let capacity_kw = units
            .iter()
            .map(|unit| (unit.id.clone(), unit.capacity_kw()))
            .collect();
        Ok(Self { units, capacity_kw })
    }

    /// Units in declaration order.
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Number of units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns `true` if the fleet has no units.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Looks up a unit by id.
    pub fn unit(&self, id: &str) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.id == id)
    }

    /// Returns `true` if `id` belongs to the fleet.
    pub fn contains(&self, id: &str) -> bool {
        self.capacity_kw.contains_key(id)
    }

    /// Unit ids in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.units.iter().map(|unit| unit.id.as_str())
    }

    /// Rated output of a single unit in kW, `0.0` for unknown ids.
    pub fn unit_capacity(&self, id: &str) -> f64 {
        self.capacity_kw.get(id).copied().unwrap_or(0.0)
    }

    /// Total rated output of a combination in kW.
    ///
    /// The empty combination has capacity `0.0`; ids outside the fleet
    /// contribute nothing.
    pub fn capacity(&self, combination: &Combination) -> f64 {
        combination.iter().map(|id| self.unit_capacity(id)).sum()
    }

    /// Combination of every unit in the fleet.
    pub fn all(&self) -> Combination {
        self.ids().collect()
    }

    /// Total rated output of the whole fleet in kW.
    pub fn total_capacity(&self) -> f64 {
        self.capacity(&self.all())
    }
}
