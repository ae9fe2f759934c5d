//! A single cooling unit and its nameplate rating.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kilowatts of cooling per refrigeration ton.
pub const KW_PER_TON: f64 = 3.516;

/// Unit in which a nameplate capacity is expressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityUnit {
    /// Kilowatts of cooling, the unit of the load profile.
    #[default]
    Kw,
    /// Refrigeration tons.
    Tr,
}

impl CapacityUnit {
    /// Linear factor converting this unit into kilowatts.
    pub fn kw_factor(self) -> f64 {
        match self {
            Self::Kw => 1.0,
            Self::Tr => KW_PER_TON,
        }
    }
}

impl fmt::Display for CapacityUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kw => write!(f, "kW"),
            Self::Tr => write!(f, "TR"),
        }
    }
}

/// One chiller in the fleet.
///
/// Immutable once the fleet is built. `kind` is carried for reports only and
/// never influences staging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Unit {
    /// Identifier used in combination keys (e.g. `CH01`).
    pub id: String,
    /// Nameplate capacity expressed in `capacity_unit`.
    pub capacity: f64,
    /// Unit of `capacity`.
    #[serde(default)]
    pub capacity_unit: CapacityUnit,
    /// Free-form equipment type, e.g. `centrifugal`.
    #[serde(default)]
    pub kind: String,
}

impl Unit {
    /// Creates a unit rated in kilowatts.
    pub fn kw(id: impl Into<String>, capacity_kw: f64) -> Self {
        Self {
            id: id.into(),
            capacity: capacity_kw,
            capacity_unit: CapacityUnit::Kw,
            kind: String::new(),
        }
    }

    /// Creates a unit rated in refrigeration tons.
    pub fn tons(id: impl Into<String>, capacity_tr: f64) -> Self {
        Self {
            id: id.into(),
            capacity: capacity_tr,
            capacity_unit: CapacityUnit::Tr,
            kind: String::new(),
        }
    }

    /// Sets the informational equipment type.
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Rated output in kilowatts.
    pub fn capacity_kw(&self) -> f64 {
        self.capacity * self.capacity_unit.kw_factor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tons_convert_to_kw() {
        let unit = Unit::tons("CH01", 100.0);
        assert!((unit.capacity_kw() - 351.6).abs() < 1e-9);
    }

    #[test]
    fn kw_is_identity() {
        assert_eq!(Unit::kw("CH01", 250.0).capacity_kw(), 250.0);
    }

    #[test]
    fn kind_is_informational() {
        let unit = Unit::kw("CH01", 100.0).with_kind("screw");
        assert_eq!(unit.kind, "screw");
        assert_eq!(unit.capacity_kw(), 100.0);
    }
}
