//! Core simulation records: hourly results, staging events, and the daily trace.

use std::fmt;

use serde::Serialize;

use crate::fleet::Combination;
use crate::priority::PriorityOrder;

/// Outcome of one simulated hour.
///
/// # Examples
///
/// ```
/// use chiller_staging::fleet::Combination;
/// use chiller_staging::sim::types::HourlyRecord;
///
/// let r = HourlyRecord {
///     hour: 3,
///     combination: Combination::parse("CH01"),
///     load: 450.0,
///     cop: Some(5.1),
///     capacity: 400.0,
/// };
/// assert_eq!(r.shortfall_kw(), 50.0);
/// assert!(r.is_included());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyRecord {
    /// Hour index.
    pub hour: usize,
    /// Combination running during the hour.
    pub combination: Combination,
    /// Cooling load (kW).
    pub load: f64,
    /// COP of the combination at this load, `None` without data.
    pub cop: Option<f64>,
    /// Rated capacity of the combination (kW).
    pub capacity: f64,
}

impl HourlyRecord {
    /// Load the running combination cannot cover (kW, >= 0).
    pub fn shortfall_kw(&self) -> f64 {
        (self.load - self.capacity).max(0.0)
    }

    /// Whether the hour counts toward energy and average COP.
    ///
    /// Only hours with a strictly positive COP are included.
    pub fn is_included(&self) -> bool {
        self.cop.is_some_and(|cop| cop > 0.0)
    }

    /// Electrical energy for the hour (kWh), `None` for excluded hours.
    pub fn energy_kwh(&self) -> Option<f64> {
        self.cop
            .filter(|&cop| cop > 0.0)
            .map(|cop| self.load / cop)
    }
}

/// Direction of a staging change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StagingAction {
    Add,
    Remove,
}

impl fmt::Display for StagingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Remove => write!(f, "remove"),
        }
    }
}

/// A unit starting or stopping between two consecutive hours.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StagingEvent {
    /// Hour at which the new combination takes effect.
    pub hour: usize,
    pub action: StagingAction,
    /// Unit that started or stopped.
    pub unit: String,
    /// Combination after the change.
    pub combination: Combination,
    /// Load of the hour (kW).
    pub load: f64,
    /// COP of the new combination, `None` without data.
    pub cop: Option<f64>,
    /// Human-readable justification.
    pub reason: String,
}

impl fmt::Display for StagingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "h={:>2} {:<6} {:<6} -> {} | load={:.0} kW cop={} | {}",
            self.hour,
            self.action,
            self.unit,
            self.combination,
            self.load,
            format_cop(self.cop),
            self.reason,
        )
    }
}

/// Complete result of simulating one priority order over one load profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationTrace {
    /// Order that drove the staging decisions.
    pub priority_order: PriorityOrder,
    /// One record per hour, in hour order.
    pub records: Vec<HourlyRecord>,
    /// Every add/remove, in hour order.
    pub events: Vec<StagingEvent>,
    /// Sum of `load / cop` over included hours (kWh).
    pub total_energy: f64,
    /// Mean COP over included hours, `0.0` when no hour is included.
    pub average_cop: f64,
}

impl SimulationTrace {
    /// Whether the trace is usable for ranking.
    pub fn is_rankable(&self) -> bool {
        self.total_energy.is_finite() && self.total_energy > 0.0
    }
}

impl fmt::Display for SimulationTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "priority {}", self.priority_order)?;
        for r in &self.records {
            writeln!(
                f,
                "h={:>2} | load={:>7.1} kW  cap={:>7.1} kW  cop={:>5} | {}",
                r.hour,
                r.load,
                r.capacity,
                format_cop(r.cop),
                r.combination,
            )?;
        }
        write!(
            f,
            "energy={:.1} kWh  avg_cop={:.2}  events={}",
            self.total_energy,
            self.average_cop,
            self.events.len()
        )
    }
}

/// Renders an optional COP, `n/a` when absent.
pub fn format_cop(cop: Option<f64>) -> String {
    cop.map_or_else(|| "n/a".to_string(), |cop| format!("{cop:.2}"))
}
