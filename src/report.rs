//! Terminal tables for traces, staging events and search rankings.

use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::fleet::Fleet;
use crate::search::SearchOutcome;
use crate::sim::types::{SimulationTrace, StagingAction, format_cop};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table
}

fn right(content: String) -> Cell {
    Cell::new(content).set_alignment(CellAlignment::Right)
}

/// Nameplate ratings of every unit, in declaration order.
#[must_use]
pub fn build_fleet_table(fleet: &Fleet) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Unit", "Type", "Rating", "Capacity (kW)"]);
    for unit in fleet.units() {
        table.add_row(vec![
            Cell::new(&unit.id),
            Cell::new(&unit.kind).add_attribute(Attribute::Dim),
            right(format!("{} {}", unit.capacity, unit.capacity_unit)),
            right(format!("{:.1}", unit.capacity_kw())),
        ]);
    }
    table
}

/// One row per simulated hour.
///
/// Hours without a usable COP are highlighted in yellow, hours short of
/// capacity in red.
#[must_use]
pub fn build_trace_table(trace: &SimulationTrace) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Hour",
        "Combination",
        "Load (kW)",
        "Capacity (kW)",
        "COP",
        "Energy (kWh)",
    ]);
    for record in &trace.records {
        let shortfall = record.shortfall_kw() > 0.0;
        let included = record.is_included();
        table.add_row(vec![
            right(record.hour.to_string()),
            Cell::new(record.combination.key()),
            right(format!("{:.1}", record.load)),
            right(format!("{:.1}", record.capacity)).fg(if shortfall {
                Color::Red
            } else {
                Color::Reset
            }),
            right(format_cop(record.cop)).fg(if included {
                Color::Reset
            } else {
                Color::DarkYellow
            }),
            right(
                record
                    .energy_kwh()
                    .map(|e| format!("{e:.1}"))
                    .unwrap_or_default(),
            ),
        ]);
    }
    table
}

/// One row per staging event.
#[must_use]
pub fn build_events_table(trace: &SimulationTrace) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Hour",
        "Action",
        "Unit",
        "Combination",
        "Load (kW)",
        "COP",
        "Reason",
    ]);
    for event in &trace.events {
        table.add_row(vec![
            right(event.hour.to_string()),
            Cell::new(event.action).fg(match event.action {
                StagingAction::Add => Color::Green,
                StagingAction::Remove => Color::DarkYellow,
            }),
            Cell::new(&event.unit),
            Cell::new(event.combination.key()),
            right(format!("{:.1}", event.load)),
            right(format_cop(event.cop)),
            Cell::new(&event.reason).add_attribute(Attribute::Dim),
        ]);
    }
    table
}

/// Energy groups, best first. Each group lists how many orders tie on its
/// rounded energy and shows the first of them.
#[must_use]
pub fn build_ranking_table(outcome: &SearchOutcome) -> Table {
    let mut table = new_table();
    table.set_header(vec!["#", "Energy (kWh)", "Orders", "Average COP", "Best order"]);
    for (i, group) in outcome.groups.iter().enumerate() {
        let best = group.best();
        table.add_row(vec![
            right((i + 1).to_string()),
            right(group.total_energy.to_string()).fg(if i == 0 {
                Color::Green
            } else {
                Color::Reset
            }),
            right(group.len().to_string()),
            right(best.map(|t| format!("{:.3}", t.average_cop)).unwrap_or_default()),
            Cell::new(best.map(|t| t.priority_order.to_string()).unwrap_or_default()),
        ]);
    }
    table
}
