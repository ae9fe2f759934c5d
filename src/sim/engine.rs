//! Daily simulation runner folding the staging rule over a load profile.

use tracing::debug;

use crate::error::Result;
use crate::fleet::{Combination, Fleet};
use crate::performance::PerformanceTable;
use crate::priority::PriorityOrder;
use crate::profile::LoadProfile;

use super::decision::{Decision, Stager, StagingState};
use super::types::{HourlyRecord, SimulationTrace, StagingAction, StagingEvent};

/// Simulation engine borrowing the static plant data.
///
/// The engine holds no per-run state, so one instance can evaluate any number
/// of priority orders, from any number of threads.
#[derive(Debug, Clone, Copy)]
pub struct Engine<'a> {
    fleet: &'a Fleet,
    stager: Stager<'a>,
}

impl<'a> Engine<'a> {
    /// Creates a new simulation engine.
    ///
    /// # Arguments
    ///
    /// * `fleet` - Units and their rated capacities
    /// * `table` - COP samples per combination
    pub fn new(fleet: &'a Fleet, table: &'a PerformanceTable) -> Self {
        Self {
            fleet,
            stager: Stager::new(fleet, table),
        }
    }

    /// Simulates every hour of `profile` under `order`.
    ///
    /// Capacity shortfalls and missing COP data never abort the run; they show
    /// up in the returned records.
    ///
    /// # Errors
    ///
    /// Returns an error if `order` does not rank exactly the fleet's units.
    pub fn run(&self, order: &PriorityOrder, profile: &LoadProfile) -> Result<SimulationTrace> {
        order.validate_for(self.fleet)?;
        Ok(self.run_unchecked(order, profile))
    }

    /// Same as [`Engine::run`] for an order already known to match the fleet.
    pub(crate) fn run_unchecked(
        &self,
        order: &PriorityOrder,
        profile: &LoadProfile,
    ) -> SimulationTrace {
        let mut records = Vec::with_capacity(profile.len());
        let mut events = Vec::new();

        profile
            .samples()
            .iter()
            .fold(StagingState::Uninitialized, |state, sample| {
                let decision = self.stager.step(&state, order, sample.load);
                if let Some(previous) = state.combination() {
                    push_events(&mut events, sample.hour, sample.load, previous, &decision);
                }
                let next = decision.next_state();
                records.push(HourlyRecord {
                    hour: sample.hour,
                    combination: decision.combination,
                    load: sample.load,
                    cop: decision.cop,
                    capacity: decision.capacity,
                });
                next
            });

        let included: Vec<(f64, f64)> = records
            .iter()
            .filter_map(|r| r.energy_kwh().zip(r.cop))
            .collect();
        let total_energy: f64 = included.iter().map(|(energy, _)| energy).sum();
        let average_cop = if included.is_empty() {
            0.0
        } else {
            included.iter().map(|(_, cop)| cop).sum::<f64>() / included.len() as f64
        };

        debug!(
            order = %order,
            total_energy,
            average_cop,
            excluded_hours = records.len() - included.len(),
            events = events.len(),
            "simulated day"
        );

        SimulationTrace {
            priority_order: order.clone(),
            records,
            events,
            total_energy,
            average_cop,
        }
    }
}

/// Records one event per unit that differs between `previous` and the decision.
fn push_events(
    events: &mut Vec<StagingEvent>,
    hour: usize,
    load: f64,
    previous: &Combination,
    decision: &Decision,
) {
    let next = &decision.combination;
    let reason = decision.reason.to_string();
    let added = next.difference(previous).map(|unit| (StagingAction::Add, unit));
    let removed = previous
        .difference(next)
        .map(|unit| (StagingAction::Remove, unit));

    events.extend(added.chain(removed).map(|(action, unit)| StagingEvent {
        hour,
        action,
        unit: unit.to_string(),
        combination: next.clone(),
        load,
        cop: decision.cop,
        reason: reason.clone(),
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::Unit;

    fn fleet() -> Fleet {
        Fleet::new(vec![Unit::kw("A", 100.0), Unit::kw("B", 100.0)]).expect("valid fleet")
    }

    fn order() -> PriorityOrder {
        PriorityOrder::parse_list("A,B").expect("valid order")
    }

    #[test]
    fn one_record_per_hour() {
        let fleet = fleet();
        let table = PerformanceTable::new();
        let profile = LoadProfile::from_loads(&[50.0; 5]).expect("valid profile");
        let trace = Engine::new(&fleet, &table)
            .run(&order(), &profile)
            .expect("run should succeed");
        let hours: Vec<usize> = trace.records.iter().map(|r| r.hour).collect();
        assert_eq!(hours, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn bootstrap_emits_no_events() {
        let fleet = fleet();
        let table = PerformanceTable::new();
        let profile = LoadProfile::from_loads(&[150.0]).expect("valid profile");
        let trace = Engine::new(&fleet, &table)
            .run(&order(), &profile)
            .expect("run should succeed");
        assert_eq!(trace.records[0].combination, Combination::parse("A+B"));
        assert!(trace.events.is_empty());
    }

    #[test]
    fn change_emits_event_with_new_combination() {
        let fleet = fleet();
        let table = PerformanceTable::new();
        let profile = LoadProfile::from_loads(&[50.0, 150.0]).expect("valid profile");
        let trace = Engine::new(&fleet, &table)
            .run(&order(), &profile)
            .expect("run should succeed");
        assert_eq!(trace.events.len(), 1);
        let e = &trace.events[0];
        assert_eq!(e.hour, 1);
        assert_eq!(e.action, StagingAction::Add);
        assert_eq!(e.unit, "B");
        assert_eq!(e.combination, Combination::parse("A+B"));
    }

    #[test]
    fn aggregates_skip_hours_without_cop() {
        let fleet = fleet();
        let mut table = PerformanceTable::new();
        table.insert(Combination::parse("A"), 50.0, Some(5.0));
        table.insert(Combination::parse("A+B"), 150.0, Some(4.0));
        table.insert(Combination::parse("A+B"), 50.0, None);
        let profile = LoadProfile::from_loads(&[50.0, 150.0, 150.0]).expect("valid profile");
        let trace = Engine::new(&fleet, &table)
            .run(&order(), &profile)
            .expect("run should succeed");
        // 50/5 + 150/4 + 150/4
        assert!((trace.total_energy - 85.0).abs() < 1e-9);
        assert!((trace.average_cop - 13.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn all_absent_cop_gives_zero_energy() {
        let fleet = fleet();
        let table = PerformanceTable::new();
        let profile = LoadProfile::from_loads(&[50.0; 3]).expect("valid profile");
        let trace = Engine::new(&fleet, &table)
            .run(&order(), &profile)
            .expect("run should succeed");
        assert_eq!(trace.total_energy, 0.0);
        assert_eq!(trace.average_cop, 0.0);
        assert!(!trace.is_rankable());
    }

    #[test]
    fn rejects_order_for_other_fleet() {
        let fleet = fleet();
        let table = PerformanceTable::new();
        let profile = LoadProfile::default_day();
        let order = PriorityOrder::parse_list("A,C").expect("valid order");
        assert!(Engine::new(&fleet, &table).run(&order, &profile).is_err());
    }
}
