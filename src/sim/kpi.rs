//! Post-hoc KPI computation from a simulation trace.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use super::types::SimulationTrace;

/// Aggregate indicators derived from a complete trace.
///
/// Computed post-hoc from the hourly records so that reported numbers always
/// agree with the trace they describe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceKpi {
    /// Daily electrical energy over included hours (kWh).
    pub total_energy_kwh: f64,
    /// Mean COP over included hours.
    pub average_cop: f64,
    /// Hours with a positive COP.
    pub included_hours: usize,
    /// Hours left out of energy and COP for lack of data.
    pub excluded_hours: usize,
    /// Hours where even the running combination could not cover the load.
    pub shortfall_hours: usize,
    /// Largest uncovered load (kW).
    pub peak_shortfall_kw: f64,
    /// Number of add/remove events.
    pub staging_events: usize,
    /// Distinct units that ran at any hour.
    pub units_used: usize,
    /// Units of the largest combination that ran, in priority order.
    pub effective_order: Vec<String>,
}

impl TraceKpi {
    /// Computes all KPIs from a trace.
    pub fn from_trace(trace: &SimulationTrace) -> Self {
        let mut included_hours = 0_usize;
        let mut shortfall_hours = 0_usize;
        let mut peak_shortfall = 0.0_f64;
        let mut used = BTreeSet::new();

        for r in &trace.records {
            if r.is_included() {
                included_hours += 1;
            }
            let shortfall = r.shortfall_kw();
            if shortfall > 0.0 {
                shortfall_hours += 1;
                peak_shortfall = peak_shortfall.max(shortfall);
            }
            used.extend(r.combination.iter());
        }

        // First largest combination wins, matching the order hours ran.
        let largest = trace
            .records
            .iter()
            .map(|r| &r.combination)
            .reduce(|best, c| if c.len() > best.len() { c } else { best });
        let effective_order = largest
            .map(|c| trace.priority_order.sort(c))
            .unwrap_or_default();

        Self {
            total_energy_kwh: trace.total_energy,
            average_cop: trace.average_cop,
            included_hours,
            excluded_hours: trace.records.len() - included_hours,
            shortfall_hours,
            peak_shortfall_kw: peak_shortfall,
            staging_events: trace.events.len(),
            units_used: used.len(),
            effective_order,
        }
    }
}

impl fmt::Display for TraceKpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- KPI Report ---")?;
        writeln!(f, "Total energy:          {:.1} kWh", self.total_energy_kwh)?;
        writeln!(f, "Average COP:           {:.2}", self.average_cop)?;
        writeln!(
            f,
            "Hours included:        {} ({} without COP data)",
            self.included_hours, self.excluded_hours
        )?;
        writeln!(
            f,
            "Capacity shortfall:    {} h (peak {:.1} kW)",
            self.shortfall_hours, self.peak_shortfall_kw
        )?;
        writeln!(f, "Staging events:        {}", self.staging_events)?;
        writeln!(f, "Units used:            {}", self.units_used)?;
        write!(f, "Effective order:       {}", self.effective_order.join(" > "))
    }
}
