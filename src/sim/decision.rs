//! Hour-by-hour staging rule: which units run next, given what runs now.

use std::fmt;

use tracing::debug;

use crate::fleet::{Combination, Fleet};
use crate::performance::PerformanceTable;
use crate::priority::PriorityOrder;

/// Running capacity above this multiple of the load makes the lowest-priority
/// unit removable even without a COP gain.
pub const EXCESS_CAPACITY_RATIO: f64 = 1.5;

/// Staging state carried from one hour to the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StagingState {
    /// Nothing has run yet; the next step bootstraps a combination.
    #[default]
    Uninitialized,
    /// A combination is active.
    Running(Combination),
}

impl StagingState {
    /// The active combination, if any.
    pub fn combination(&self) -> Option<&Combination> {
        match self {
            Self::Uninitialized => None,
            Self::Running(combination) => Some(combination),
        }
    }
}

/// Why a decision was taken.
#[derive(Debug, Clone, PartialEq)]
pub enum Reason {
    /// Bootstrap: smallest priority prefix covering the load.
    Start { load: f64 },
    /// The running capacity fell short and the next unit closes the gap.
    AddedForCapacity { unit: String, from_kw: f64, to_kw: f64 },
    /// The next unit raises the COP.
    AddedForEfficiency { unit: String, from_cop: f64, to_cop: f64 },
    /// Dropping the lowest-priority unit raises the COP.
    RemovedForEfficiency { unit: String, from_cop: f64, to_cop: f64 },
    /// Running capacity exceeds the load by more than [`EXCESS_CAPACITY_RATIO`].
    RemovedForExcessCapacity { unit: String, capacity_kw: f64, load: f64 },
    /// Neither candidate move was accepted.
    NoChange,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start { load } => write!(f, "starting combination for load {load:.0} kW"),
            Self::AddedForCapacity { unit, from_kw, to_kw } => {
                write!(f, "added {unit} for capacity ({from_kw:.0} -> {to_kw:.0} kW)")
            }
            Self::AddedForEfficiency { unit, from_cop, to_cop } => {
                write!(f, "added {unit} for efficiency (COP {to_cop:.2} vs {from_cop:.2})")
            }
            Self::RemovedForEfficiency { unit, from_cop, to_cop } => {
                write!(f, "removed {unit} for efficiency (COP {to_cop:.2} vs {from_cop:.2})")
            }
            Self::RemovedForExcessCapacity { unit, capacity_kw, load } => write!(
                f,
                "removed {unit} due to excess capacity ({capacity_kw:.0} kW vs {load:.0} kW load)"
            ),
            Self::NoChange => write!(f, "no change needed - current combination is optimal"),
        }
    }
}

/// Outcome of one staging step.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    /// Combination adopted for the hour.
    pub combination: Combination,
    /// COP of `combination` at the hour's load, `None` without data.
    pub cop: Option<f64>,
    /// Rated capacity of `combination` in kW.
    pub capacity: f64,
    pub reason: Reason,
}

impl Decision {
    /// The state to carry into the next hour.
    pub fn next_state(&self) -> StagingState {
        StagingState::Running(self.combination.clone())
    }
}

/// An accepted candidate move.
struct Candidate {
    combination: Combination,
    cop: Option<f64>,
    capacity: f64,
    reason: Reason,
}

impl Candidate {
    fn score(&self) -> f64 {
        self.cop.unwrap_or(0.0)
    }

    fn into_decision(self) -> Decision {
        Decision {
            combination: self.combination,
            cop: self.cop,
            capacity: self.capacity,
            reason: self.reason,
        }
    }
}

/// Applies the staging rule against a fixed fleet and performance table.
///
/// `step` is a pure function of its arguments; the simulation runner folds it
/// over the load profile.
#[derive(Debug, Clone, Copy)]
pub struct Stager<'a> {
    fleet: &'a Fleet,
    table: &'a PerformanceTable,
}

impl<'a> Stager<'a> {
    pub fn new(fleet: &'a Fleet, table: &'a PerformanceTable) -> Self {
        Self { fleet, table }
    }

    /// Decides the combination for an hour with the given load.
    pub fn step(&self, state: &StagingState, order: &PriorityOrder, load: f64) -> Decision {
        match state {
            StagingState::Uninitialized => self.bootstrap(order, load),
            StagingState::Running(current) => self.advance(current, order, load),
        }
    }

    fn evaluate(&self, combination: Combination, load: f64, reason: Reason) -> Candidate {
        Candidate {
            cop: self.table.cop(&combination, load),
            capacity: self.fleet.capacity(&combination),
            combination,
            reason,
        }
    }

    fn bootstrap(&self, order: &PriorityOrder, load: f64) -> Decision {
        let combination = (1..=order.len())
            .map(|n| order.prefix(n))
            .find(|prefix| self.fleet.capacity(prefix) >= load)
            .unwrap_or_else(|| order.prefix(order.len()));

        let decision = self
            .evaluate(combination, load, Reason::Start { load })
            .into_decision();
        debug!(
            combination = %decision.combination,
            load,
            capacity = decision.capacity,
            "bootstrap"
        );
        decision
    }

    fn advance(&self, current: &Combination, order: &PriorityOrder, load: f64) -> Decision {
        let current_capacity = self.fleet.capacity(current);
        let current_cop = self.table.cop(current, load);
        let baseline = current_cop.unwrap_or(0.0);
        let next = order.next_missing(current);

        if current_capacity < load {
            if let Some(unit) = next {
                let candidate = current.with(unit);
                let capacity = self.fleet.capacity(&candidate);
                if capacity >= load {
                    let reason = Reason::AddedForCapacity {
                        unit: unit.to_string(),
                        from_kw: current_capacity,
                        to_kw: capacity,
                    };
                    debug!(%unit, load, from_kw = current_capacity, to_kw = capacity, "capacity add");
                    return self.evaluate(candidate, load, reason).into_decision();
                }
                debug!(%unit, load, capacity, "next unit still short of load");
            }
        }

        let add = next.and_then(|unit| {
            let combination = current.with(unit);
            if self.fleet.capacity(&combination) < load {
                return None;
            }
            let candidate = self.evaluate(combination, load, Reason::NoChange);
            let to_cop = candidate.score();
            if to_cop <= baseline {
                return None;
            }
            let reason = Reason::AddedForEfficiency {
                unit: unit.to_string(),
                from_cop: baseline,
                to_cop,
            };
            Some(Candidate { reason, ..candidate })
        });

        let remove = if current.len() > 1 {
            order.lowest_running(current).and_then(|unit| {
                let combination = current.without(unit);
                if self.fleet.capacity(&combination) < load {
                    return None;
                }
                let candidate = self.evaluate(combination, load, Reason::NoChange);
                let reason = if candidate.score() > baseline {
                    Reason::RemovedForEfficiency {
                        unit: unit.to_string(),
                        from_cop: baseline,
                        to_cop: candidate.score(),
                    }
                } else if current_capacity > EXCESS_CAPACITY_RATIO * load {
                    Reason::RemovedForExcessCapacity {
                        unit: unit.to_string(),
                        capacity_kw: current_capacity,
                        load,
                    }
                } else {
                    return None;
                };
                Some(Candidate { reason, ..candidate })
            })
        } else {
            None
        };

        let chosen = match (add, remove) {
            (Some(add), Some(remove)) if add.score() > remove.score() => Some(add),
            (_, Some(remove)) => Some(remove),
            (Some(add), None) => Some(add),
            (None, None) => None,
        };

        match chosen {
            Some(candidate) => {
                debug!(
                    from = %current,
                    to = %candidate.combination,
                    load,
                    reason = %candidate.reason,
                    "staging change"
                );
                candidate.into_decision()
            }
            None => Decision {
                combination: current.clone(),
                cop: current_cop,
                capacity: current_capacity,
                reason: Reason::NoChange,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::Unit;

    fn fleet() -> Fleet {
        Fleet::new(vec![
            Unit::kw("A", 100.0),
            Unit::kw("B", 100.0),
            Unit::kw("C", 100.0),
        ])
        .expect("valid fleet")
    }

    fn order() -> PriorityOrder {
        PriorityOrder::parse_list("A,B,C").expect("valid order")
    }

    fn flat(entries: &[(&str, f64)]) -> PerformanceTable {
        let mut table = PerformanceTable::new();
        for &(key, cop) in entries {
            table.insert(Combination::parse(key), 0.0, Some(cop));
        }
        table
    }

    fn running(key: &str) -> StagingState {
        StagingState::Running(Combination::parse(key))
    }

    #[test]
    fn bootstrap_takes_smallest_sufficient_prefix() {
        let fleet = fleet();
        let table = PerformanceTable::new();
        let stager = Stager::new(&fleet, &table);

        let d = stager.step(&StagingState::Uninitialized, &order(), 150.0);
        assert_eq!(d.combination, Combination::parse("A+B"));
        assert_eq!(d.reason, Reason::Start { load: 150.0 });
        assert_eq!(d.cop, None);
    }

    #[test]
    fn bootstrap_falls_back_to_whole_fleet() {
        let fleet = fleet();
        let table = PerformanceTable::new();
        let d = Stager::new(&fleet, &table).step(&StagingState::Uninitialized, &order(), 1000.0);
        assert_eq!(d.combination, Combination::parse("A+B+C"));
        assert!(d.capacity < 1000.0);
    }

    #[test]
    fn bootstrap_zero_load_starts_one_unit() {
        let fleet = fleet();
        let table = PerformanceTable::new();
        let d = Stager::new(&fleet, &table).step(&StagingState::Uninitialized, &order(), 0.0);
        assert_eq!(d.combination, Combination::parse("A"));
    }

    #[test]
    fn capacity_shortfall_adds_next_unit() {
        let fleet = fleet();
        let table = PerformanceTable::new();
        let d = Stager::new(&fleet, &table).step(&running("A"), &order(), 180.0);
        assert_eq!(d.combination, Combination::parse("A+B"));
        assert!(d.reason.to_string().starts_with("added B for capacity"));
    }

    #[test]
    fn insufficient_next_unit_is_not_skipped() {
        // A+B is 200 kW against a 250 kW load: no add, and C is never tried.
        let fleet = fleet();
        let table = PerformanceTable::new();
        let d = Stager::new(&fleet, &table).step(&running("A"), &order(), 250.0);
        assert_eq!(d.combination, Combination::parse("A"));
        assert_eq!(d.reason, Reason::NoChange);
    }

    #[test]
    fn efficiency_add_requires_higher_cop() {
        let fleet = fleet();
        let table = flat(&[("A", 3.0), ("A+B", 4.0)]);
        let d = Stager::new(&fleet, &table).step(&running("A"), &order(), 80.0);
        assert_eq!(d.combination, Combination::parse("A+B"));
        assert!(matches!(d.reason, Reason::AddedForEfficiency { .. }));
        assert_eq!(d.cop, Some(4.0));

        let table = flat(&[("A", 4.0), ("A+B", 4.0)]);
        let d = Stager::new(&fleet, &table).step(&running("A"), &order(), 80.0);
        assert_eq!(d.combination, Combination::parse("A"));
    }

    #[test]
    fn removes_lowest_priority_for_efficiency() {
        let fleet = fleet();
        let table = flat(&[("A+B", 3.0), ("A", 4.0), ("B", 5.0)]);
        let d = Stager::new(&fleet, &table).step(&running("A+B"), &order(), 80.0);
        assert_eq!(d.combination, Combination::parse("A"));
        assert!(matches!(d.reason, Reason::RemovedForEfficiency { ref unit, .. } if unit == "B"));
    }

    #[test]
    fn removes_for_excess_capacity_without_cop_gain() {
        let fleet = fleet();
        let table = flat(&[("A+B", 5.0), ("A", 4.0)]);
        let d = Stager::new(&fleet, &table).step(&running("A+B"), &order(), 90.0);
        assert_eq!(d.combination, Combination::parse("A"));
        assert!(matches!(d.reason, Reason::RemovedForExcessCapacity { .. }));
    }

    #[test]
    fn no_removal_without_gain_or_excess() {
        // 200 kW against 150 kW is under the 1.5x threshold, and A+B out-performs A.
        let fleet = Fleet::new(vec![Unit::kw("A", 150.0), Unit::kw("B", 50.0)])
            .expect("valid fleet");
        let order = PriorityOrder::parse_list("A,B").expect("valid order");
        let table = flat(&[("A+B", 5.0), ("A", 4.0)]);
        let d = Stager::new(&fleet, &table).step(&running("A+B"), &order, 150.0);
        assert_eq!(d.combination, Combination::parse("A+B"));
        assert_eq!(d.reason, Reason::NoChange);
    }

    #[test]
    fn both_candidates_higher_cop_wins() {
        let fleet = fleet();
        let table = flat(&[("A+B", 3.0), ("A+B+C", 6.0), ("A", 4.0)]);
        let d = Stager::new(&fleet, &table).step(&running("A+B"), &order(), 80.0);
        assert_eq!(d.combination, Combination::parse("A+B+C"));
    }

    #[test]
    fn both_candidates_tie_goes_to_remove() {
        let fleet = fleet();
        let table = flat(&[("A+B", 3.0), ("A+B+C", 4.0), ("A", 4.0)]);
        let d = Stager::new(&fleet, &table).step(&running("A+B"), &order(), 80.0);
        assert_eq!(d.combination, Combination::parse("A"));
    }

    #[test]
    fn missing_cop_never_wins_on_cop() {
        let fleet = fleet();
        let table = flat(&[("A", 4.0)]);
        let d = Stager::new(&fleet, &table).step(&running("A"), &order(), 80.0);
        assert_eq!(d.combination, Combination::parse("A"));
        assert_eq!(d.cop, Some(4.0));
    }

    #[test]
    fn reason_text() {
        let r = Reason::AddedForCapacity {
            unit: "B".into(),
            from_kw: 100.0,
            to_kw: 200.0,
        };
        assert_eq!(r.to_string(), "added B for capacity (100 -> 200 kW)");
        assert_eq!(
            Reason::Start { load: 80.0 }.to_string(),
            "starting combination for load 80 kW"
        );
    }
}
