//! Integration tests for single-order simulation.

mod common;

use std::path::Path;

use approx::assert_relative_eq;

use chiller_staging::config::ScenarioConfig;
use chiller_staging::fleet::Combination;
use chiller_staging::profile::LoadProfile;
use chiller_staging::sim::{Engine, StagingAction, TraceKpi};

#[test]
fn constant_load_keeps_first_unit_all_day() {
    let fleet = common::fleet(&[("A", 100.0), ("B", 100.0)]);
    let table = common::flat_table(&[]);
    let trace = Engine::new(&fleet, &table)
        .run(&common::order("A,B"), &common::flat_profile(80.0, 24))
        .expect("run should succeed");

    assert_eq!(trace.records.len(), 24);
    assert!(
        trace
            .records
            .iter()
            .all(|r| r.combination == Combination::parse("A"))
    );
    assert!(trace.events.is_empty());
}

#[test]
fn load_spike_forces_capacity_add() {
    let fleet = common::fleet(&[("A", 100.0), ("B", 150.0)]);
    let table = common::flat_table(&[]);
    let trace = Engine::new(&fleet, &table)
        .run(&common::order("A,B"), &common::step_profile(50.0, 250.0, 12))
        .expect("run should succeed");

    assert_eq!(trace.events.len(), 1);
    let event = &trace.events[0];
    assert_eq!(event.hour, 12);
    assert_eq!(event.action, StagingAction::Add);
    assert_eq!(event.unit, "B");
    assert_eq!(event.reason, "added B for capacity (100 -> 250 kW)");
    assert!(trace.records[12..].iter().all(|r| r.shortfall_kw() == 0.0));
}

#[test]
fn only_the_next_unit_is_tried_for_capacity() {
    // A+B still cannot carry 250 kW, so nothing is added and C never runs.
    let fleet = common::fleet(&[("A", 100.0), ("B", 100.0), ("C", 100.0)]);
    let table = common::flat_table(&[]);
    let trace = Engine::new(&fleet, &table)
        .run(&common::order("A,B,C"), &common::step_profile(50.0, 250.0, 12))
        .expect("run should succeed");

    assert!(trace.events.is_empty());
    let kpi = TraceKpi::from_trace(&trace);
    assert_eq!(kpi.shortfall_hours, 12);
    assert_relative_eq!(kpi.peak_shortfall_kw, 150.0);
}

#[test]
fn better_unit_is_unreachable_outside_priority_order() {
    // B alone beats A, but only A+B is ever compared against A.
    let fleet = common::fleet(&[("A", 100.0), ("B", 100.0)]);
    let table = common::flat_table(&[("A", 4.0), ("B", 6.0), ("A+B", 3.0)]);
    let trace = Engine::new(&fleet, &table)
        .run(&common::order("A,B"), &common::flat_profile(80.0, 24))
        .expect("run should succeed");

    assert!(trace.records.iter().all(|r| !r.combination.contains("B")));
    assert_relative_eq!(trace.average_cop, 4.0);
    assert_relative_eq!(trace.total_energy, 24.0 * 80.0 / 4.0);
}

#[test]
fn excess_capacity_removal_undoes_efficiency_add() {
    // A+B raises COP, but 200 kW against an 80 kW load is excess capacity.
    let fleet = common::fleet(&[("A", 100.0), ("B", 100.0)]);
    let table = common::flat_table(&[("A", 4.0), ("A+B", 5.0)]);
    let trace = Engine::new(&fleet, &table)
        .run(&common::order("A,B"), &common::flat_profile(80.0, 6))
        .expect("run should succeed");

    let keys: Vec<String> = trace.records.iter().map(|r| r.combination.key()).collect();
    assert_eq!(keys, ["A", "A+B", "A", "A+B", "A", "A+B"]);
    assert_eq!(trace.events.len(), 5);
    assert!(trace.events[0].reason.starts_with("added B for efficiency"));
    assert!(trace.events[1].reason.starts_with("removed B due to excess capacity"));
}

#[test]
fn hours_are_sequential_and_change_one_unit_at_a_time() {
    let scenario = ScenarioConfig::demo()
        .build(Path::new("."))
        .expect("demo should build");
    let trace = Engine::new(&scenario.fleet, &scenario.table)
        .run(&scenario.priority, &scenario.profile)
        .expect("run should succeed");

    assert_eq!(trace.records.len(), scenario.profile.len());
    for (i, r) in trace.records.iter().enumerate() {
        assert_eq!(r.hour, i);
    }
    for pair in trace.records.windows(2).skip(1) {
        let added = pair[1].combination.difference(&pair[0].combination).count();
        let removed = pair[0].combination.difference(&pair[1].combination).count();
        assert!(added + removed <= 1, "hour {} changed more than one unit", pair[1].hour);
    }
}

#[test]
fn events_match_combination_changes() {
    let scenario = ScenarioConfig::demo()
        .build(Path::new("."))
        .expect("demo should build");
    let trace = Engine::new(&scenario.fleet, &scenario.table)
        .run(&scenario.priority, &scenario.profile)
        .expect("run should succeed");

    let changes: usize = trace
        .records
        .windows(2)
        .map(|pair| {
            pair[1].combination.difference(&pair[0].combination).count()
                + pair[0].combination.difference(&pair[1].combination).count()
        })
        .sum();
    assert_eq!(trace.events.len(), changes);
    for event in &trace.events {
        let record = &trace.records[event.hour];
        assert_eq!(event.combination, record.combination);
        assert_eq!(event.cop, record.cop);
    }
}

#[test]
fn energy_counts_only_hours_with_cop() {
    // A+B has no COP data, so the forced hour drops out of both aggregates.
    let fleet = common::fleet(&[("A", 100.0), ("B", 100.0)]);
    let table = common::flat_table(&[("A", 5.0)]);
    let profile = LoadProfile::from_loads(&[50.0, 150.0, 50.0]).expect("valid profile");

    let trace = Engine::new(&fleet, &table)
        .run(&common::order("A,B"), &profile)
        .expect("run should succeed");

    assert_eq!(trace.records[1].combination, Combination::parse("A+B"));
    assert_eq!(trace.records[1].cop, None);
    assert_eq!(trace.records[2].combination, Combination::parse("A"));
    assert_relative_eq!(trace.total_energy, 20.0);
    assert_relative_eq!(trace.average_cop, 5.0);
    assert_eq!(TraceKpi::from_trace(&trace).excluded_hours, 1);
}

#[test]
fn csv_scenario_builds_and_runs() {
    let path = Path::new("scenarios/plant3.toml");
    let cfg = ScenarioConfig::from_toml_file(path).expect("plant3 should parse");
    assert!(cfg.validate().is_empty());
    let scenario = cfg
        .build(path.parent().unwrap_or(Path::new(".")))
        .expect("plant3 should build");

    assert_eq!(scenario.fleet.len(), 3);
    assert_eq!(scenario.profile.len(), 24);
    assert_eq!(scenario.table.combination_count(), 7);

    let trace = Engine::new(&scenario.fleet, &scenario.table)
        .run(&scenario.priority, &scenario.profile)
        .expect("run should succeed");
    assert!(trace.is_rankable());
}

#[test]
fn order_must_cover_the_fleet() {
    let fleet = common::fleet(&[("A", 100.0), ("B", 100.0)]);
    let table = common::flat_table(&[]);
    let engine = Engine::new(&fleet, &table);
    let profile = common::flat_profile(80.0, 24);

    assert!(engine.run(&common::order("A"), &profile).is_err());
    assert!(engine.run(&common::order("A,B,Z"), &profile).is_err());
}
