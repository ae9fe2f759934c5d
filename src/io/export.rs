//! CSV and JSON export for traces, staging events and search rankings.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::error::Result;
use crate::search::SearchOutcome;
use crate::sim::types::SimulationTrace;

/// Column header for the hourly trace export.
const TRACE_HEADER: &str = "hour,combination,load_kw,cop,capacity_kw,shortfall";

/// Column header for the staging event export.
const EVENTS_HEADER: &str = "hour,action,unit,combination,load_kw,cop,reason";

fn cop_cell(cop: Option<f64>) -> String {
    cop.map(|cop| format!("{cop:.4}")).unwrap_or_default()
}

/// Writes one row per simulated hour as CSV to any writer.
///
/// An absent COP is written as an empty cell.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_trace_csv(trace: &SimulationTrace, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(TRACE_HEADER.split(','))?;

    for r in &trace.records {
        wtr.write_record(&[
            r.hour.to_string(),
            r.combination.key(),
            format!("{:.4}", r.load),
            cop_cell(r.cop),
            format!("{:.4}", r.capacity),
            (r.shortfall_kw() > 0.0).to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes the hourly trace CSV to `path`.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_trace_csv(trace: &SimulationTrace, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_trace_csv(trace, io::BufWriter::new(file))
}

/// Writes one row per staging event as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_events_csv(trace: &SimulationTrace, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(EVENTS_HEADER.split(','))?;

    for e in &trace.events {
        wtr.write_record(&[
            e.hour.to_string(),
            e.action.to_string(),
            e.unit.clone(),
            e.combination.key(),
            format!("{:.4}", e.load),
            cop_cell(e.cop),
            e.reason.clone(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes the staging event CSV to `path`.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_events_csv(trace: &SimulationTrace, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_events_csv(trace, io::BufWriter::new(file))
}

/// Writes a search outcome as pretty-printed JSON.
///
/// # Errors
///
/// Returns a JSON or I/O error.
pub fn write_ranking_json(outcome: &SearchOutcome, mut writer: impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, outcome)?;
    writeln!(writer)?;
    Ok(())
}

/// Writes the ranking JSON to `path`.
///
/// # Errors
///
/// Returns a JSON or I/O error.
pub fn export_ranking_json(outcome: &SearchOutcome, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_ranking_json(outcome, io::BufWriter::new(file))
}
