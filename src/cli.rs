use std::path::PathBuf;

use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand};

/// Chiller fleet staging simulator and priority order search.
#[derive(Debug, Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Cli {
    /// Scenario TOML file. Relative data paths resolve against its directory.
    #[clap(long, global = true, env = "CHILLER_SCENARIO", conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Built-in preset, used when no scenario file is given.
    #[clap(long, global = true)]
    pub preset: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Simulate one priority order over the load profile.
    #[clap(name = "simulate")]
    Simulate(SimulateArgs),

    /// Simulate every priority order and rank them by energy.
    #[clap(name = "rank")]
    Rank(RankArgs),

    /// List the built-in presets.
    #[clap(name = "presets")]
    Presets,
}

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Comma-separated unit ids, highest priority first. Defaults to the
    /// scenario's priority order.
    #[clap(long)]
    pub order: Option<String>,

    /// Write the hourly trace as CSV.
    #[clap(long)]
    pub trace_out: Option<PathBuf>,

    /// Write the staging events as CSV.
    #[clap(long)]
    pub events_out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct RankArgs {
    /// Number of energy groups to keep.
    #[clap(long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub top: Option<usize>,

    /// Orders simulated between progress reports and cancellation checks.
    #[clap(long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub batch_size: Option<usize>,

    /// Simulate each batch on all cores (needs the `parallel` feature).
    #[clap(long)]
    pub parallel: bool,

    /// Write the full ranking as JSON.
    #[clap(long)]
    pub json_out: Option<PathBuf>,
}

impl Cli {
    /// Preset to load when no scenario file is given.
    pub fn preset_name(&self) -> &str {
        self.preset.as_deref().unwrap_or("demo")
    }
}
