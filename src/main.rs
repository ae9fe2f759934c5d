//! Chiller staging entry point: CLI wiring and scenario-driven runs.

mod cli;

use std::path::Path;
use std::process;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::Context;
use clap::Parser;
use signal_hook::consts::{SIGINT, SIGTERM};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use chiller_staging::config::{Scenario, ScenarioConfig};
use chiller_staging::io::export::{export_events_csv, export_ranking_json, export_trace_csv};
use chiller_staging::priority::PriorityOrder;
use chiller_staging::report;
use chiller_staging::search::{self, permutation_count};
use chiller_staging::sim::{Engine, TraceKpi};

use crate::cli::{Cli, Command, RankArgs, SimulateArgs};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .compact()
        .init();
}

/// Loads the scenario file or preset and validates it. Validation errors are
/// printed one per line and end the process.
fn load_config(cli: &Cli) -> anyhow::Result<(ScenarioConfig, &Path)> {
    let (cfg, base_dir) = match &cli.scenario {
        Some(path) => (
            ScenarioConfig::from_toml_file(path)?,
            path.parent().unwrap_or(Path::new(".")),
        ),
        None => (ScenarioConfig::from_preset(cli.preset_name())?, Path::new(".")),
    };

    let errors = cfg.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    Ok((cfg, base_dir))
}

fn simulate(scenario: &Scenario, args: &SimulateArgs) -> anyhow::Result<()> {
    let order = match &args.order {
        Some(list) => PriorityOrder::parse_list(list)?,
        None => scenario.priority.clone(),
    };

    let engine = Engine::new(&scenario.fleet, &scenario.table);
    let trace = engine.run(&order, &scenario.profile)?;
    let kpi = TraceKpi::from_trace(&trace);
    if kpi.excluded_hours > 0 {
        warn!(
            hours = kpi.excluded_hours,
            "no usable COP for some hours; they are left out of energy and average COP"
        );
    }

    println!("{}", report::build_fleet_table(&scenario.fleet));
    println!("{}", report::build_trace_table(&trace));
    if !trace.events.is_empty() {
        println!("{}", report::build_events_table(&trace));
    }
    println!("{kpi}");

    if let Some(path) = &args.trace_out {
        export_trace_csv(&trace, path)
            .with_context(|| format!("failed to write trace to {}", path.display()))?;
        info!(path = %path.display(), "trace written");
    }
    if let Some(path) = &args.events_out {
        export_events_csv(&trace, path)
            .with_context(|| format!("failed to write events to {}", path.display()))?;
        info!(path = %path.display(), "events written");
    }
    Ok(())
}

fn rank(scenario: &Scenario, args: &RankArgs) -> anyhow::Result<()> {
    let mut options = scenario.search.clone();
    if let Some(top) = args.top {
        options.top_n = top;
    }
    if let Some(batch_size) = args.batch_size {
        options.batch_size = batch_size;
    }
    options.parallel |= args.parallel;

    // First Ctrl-C requests a graceful stop, a second one exits immediately.
    let cancel = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register_conditional_shutdown(signal, 1, Arc::clone(&cancel))?;
        signal_hook::flag::register(signal, Arc::clone(&cancel))?;
    }

    info!(
        orders = permutation_count(scenario.fleet.len()),
        "ranking priority orders (Ctrl-C to stop early)"
    );
    let outcome = search::search(
        &scenario.fleet,
        &scenario.table,
        &scenario.profile,
        &options,
        Some(cancel),
        |progress| info!("{progress}"),
    )?;

    println!("{}", report::build_ranking_table(&outcome));
    if let Some(best) = outcome.groups.first().and_then(|g| g.best()) {
        println!("{best}");
        println!("\n{}", TraceKpi::from_trace(best));
    } else {
        warn!("no priority order produced a usable trace");
    }

    if let Some(path) = &args.json_out {
        export_ranking_json(&outcome, path)
            .with_context(|| format!("failed to write ranking to {}", path.display()))?;
        info!(path = %path.display(), "ranking written");
    }
    Ok(())
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if let Command::Presets = cli.command {
        for name in ScenarioConfig::PRESETS {
            println!("{name}");
        }
        return Ok(());
    }

    let (cfg, base_dir) = load_config(cli)?;
    let scenario = cfg.build(base_dir)?;

    match &cli.command {
        Command::Simulate(args) => simulate(&scenario, args),
        Command::Rank(args) => rank(&scenario, args),
        Command::Presets => Ok(()),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    if let Err(e) = run(&cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}
