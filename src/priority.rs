//! Total ranking of the fleet's units for staging precedence.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::fleet::{Combination, Fleet};

/// A ranking of units, position 0 holding rank 1 (started first, removed last).
///
/// ```
/// use chiller_staging::priority::PriorityOrder;
///
/// let order = PriorityOrder::parse_list("CH05, CH06, CH01").unwrap();
/// assert_eq!(order.rank("CH06"), Some(2));
/// assert_eq!(order.to_string(), "CH05 > CH06 > CH01");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PriorityOrder(Vec<String>);

impl PriorityOrder {
    /// Builds an order from ids listed highest priority first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPriorityOrder`] on an empty list or a repeated id.
    pub fn new<I, S>(ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return Err(Error::InvalidPriorityOrder("no units ranked".into()));
        }
        let mut seen = HashSet::with_capacity(ids.len());
        for id in &ids {
            if !seen.insert(id.as_str()) {
                return Err(Error::InvalidPriorityOrder(format!(
                    "`{id}` is ranked more than once"
                )));
            }
        }
        Ok(Self(ids))
    }

    /// Builds an order from explicit `(id, rank)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPriorityOrder`] unless the ranks are exactly a
    /// permutation of `1..=N`.
    pub fn from_ranks<S: Into<String>>(ranks: Vec<(S, u32)>) -> Result<Self> {
        let n = ranks.len();
        let mut slots: Vec<Option<String>> = vec![None; n];
        for (id, rank) in ranks {
            let id = id.into();
            let index = (rank as usize)
                .checked_sub(1)
                .filter(|&i| i < n)
                .ok_or_else(|| {
                    Error::InvalidPriorityOrder(format!("rank {rank} of `{id}` is outside 1..={n}"))
                })?;
            if let Some(other) = &slots[index] {
                return Err(Error::InvalidPriorityOrder(format!(
                    "rank {rank} is shared by `{other}` and `{id}`"
                )));
            }
            slots[index] = Some(id);
        }
        Self::new(slots.into_iter().flatten())
    }

    /// Wraps ids already known to be distinct, such as a generated permutation.
    pub(crate) fn from_distinct(ids: Vec<String>) -> Self {
        Self(ids)
    }

    /// Parses a comma-separated list such as `CH05,CH06,CH01`.
    ///
    /// # Errors
    ///
    /// Same as [`PriorityOrder::new`].
    pub fn parse_list(list: &str) -> Result<Self> {
        Self::new(list.split(',').map(str::trim).filter(|id| !id.is_empty()))
    }

    /// Checks that the order ranks every unit of `fleet` exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownUnit`] for an id outside the fleet and
    /// [`Error::InvalidPriorityOrder`] if a fleet unit is left unranked.
    pub fn validate_for(&self, fleet: &Fleet) -> Result<()> {
        if let Some(id) = self.iter().find(|id| !fleet.contains(id)) {
            return Err(Error::UnknownUnit(id.to_string()));
        }
        if let Some(id) = fleet.ids().find(|id| self.rank(id).is_none()) {
            return Err(Error::InvalidPriorityOrder(format!("`{id}` has no rank")));
        }
        Ok(())
    }

    /// 1-based rank of `id`.
    pub fn rank(&self, id: &str) -> Option<usize> {
        self.0.iter().position(|ranked| ranked == id).map(|i| i + 1)
    }

    /// Ids from highest to lowest priority.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The `n` highest-priority units.
    pub fn prefix(&self, n: usize) -> Combination {
        self.iter().take(n).collect()
    }

    /// Highest-priority unit not running in `current`.
    pub fn next_missing(&self, current: &Combination) -> Option<&str> {
        self.iter().find(|id| !current.contains(id))
    }

    /// Lowest-priority unit running in `current`.
    pub fn lowest_running(&self, current: &Combination) -> Option<&str> {
        self.iter().rev().find(|id| current.contains(id))
    }

    /// Members of `combination` listed in priority order.
    pub fn sort(&self, combination: &Combination) -> Vec<String> {
        self.iter()
            .filter(|id| combination.contains(id))
            .map(str::to_string)
            .collect()
    }
}

impl fmt::Display for PriorityOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" > "))
    }
}
