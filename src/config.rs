//! TOML-based scenario configuration and preset definitions.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::error::Result;
use crate::fleet::{Fleet, Unit};
use crate::io::import;
use crate::performance::{PerformanceTable, SyntheticCurve};
use crate::priority::PriorityOrder;
use crate::profile::{DEFAULT_DAY_KW, HOURS_PER_DAY, LoadProfile, SyntheticProfile};
use crate::search::SearchOptions;

/// Top-level scenario configuration parsed from TOML.
///
/// All sections have defaults. Load from TOML with
/// [`ScenarioConfig::from_toml_file`] or start from a preset with
/// [`ScenarioConfig::from_preset`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Units available for staging.
    #[serde(default)]
    pub fleet: FleetConfig,
    /// Source of COP data.
    #[serde(default)]
    pub performance: PerformanceConfig,
    /// Source of the hourly load.
    #[serde(default)]
    pub profile: ProfileConfig,
    /// Priority order used by `simulate`.
    #[serde(default)]
    pub priority: PriorityConfig,
    /// Search tuning.
    #[serde(default)]
    pub search: SearchOptions,
}

/// Fleet definition: inline units or a unit-list CSV, not both.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FleetConfig {
    /// Inline unit definitions.
    pub units: Vec<Unit>,
    /// Path to a `Chiller,Capacity (TR),Type` file.
    pub units_csv: Option<PathBuf>,
}

/// COP data source.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PerformanceConfig {
    /// `"tables"` (measured CSVs) or `"synthetic"` (part-load curve).
    pub model: String,
    /// One CSV per combination size, for the `tables` model.
    pub tables: Vec<PathBuf>,
    /// Peak COP for the synthetic model.
    pub peak_cop: f64,
    /// Part-load ratio of peak COP (0.0-1.0).
    pub optimal_part_load: f64,
    /// Curve steepness around the optimum.
    pub curvature: f64,
    /// Sample spacing (kW).
    pub load_step_kw: f64,
    /// Gaussian noise standard deviation added to each sample.
    pub noise_std: f64,
    /// Noise seed.
    pub seed: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        let curve = SyntheticCurve::default();
        Self {
            model: "synthetic".to_string(),
            tables: Vec::new(),
            peak_cop: curve.peak_cop,
            optimal_part_load: curve.optimal_part_load,
            curvature: curve.curvature,
            load_step_kw: curve.load_step_kw,
            noise_std: curve.noise_std,
            seed: curve.seed,
        }
    }
}

impl PerformanceConfig {
    fn curve(&self) -> SyntheticCurve {
        SyntheticCurve {
            peak_cop: self.peak_cop,
            optimal_part_load: self.optimal_part_load,
            curvature: self.curvature,
            load_step_kw: self.load_step_kw,
            noise_std: self.noise_std,
            seed: self.seed,
        }
    }
}

/// Load profile source.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileConfig {
    /// `"inline"`, `"csv"` or `"synthetic"`.
    pub model: String,
    /// Hourly loads (kW) for the `inline` model.
    pub loads: Vec<f64>,
    /// Profile CSV for the `csv` model.
    pub path: Option<PathBuf>,
    /// Mean load (kW) for the synthetic model.
    pub base_kw: f64,
    /// Sinusoidal amplitude (kW).
    pub amp_kw: f64,
    /// Phase offset (radians).
    pub phase_rad: f64,
    /// Gaussian noise standard deviation (kW).
    pub noise_std: f64,
    /// Noise seed.
    pub seed: u64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        let synthetic = SyntheticProfile::default();
        Self {
            model: "inline".to_string(),
            loads: DEFAULT_DAY_KW.to_vec(),
            path: None,
            base_kw: synthetic.base_kw,
            amp_kw: synthetic.amp_kw,
            phase_rad: synthetic.phase_rad,
            noise_std: synthetic.noise_std,
            seed: synthetic.seed,
        }
    }
}

/// Priority order for single-plan simulation.
///
/// With neither field set, units are ranked in declaration order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PriorityConfig {
    /// Unit ids, highest priority first.
    pub order: Vec<String>,
    /// Path to a `Chiller,Priority` file.
    pub path: Option<PathBuf>,
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"profile.loads"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Plant data loaded from a validated scenario, ready to simulate.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub fleet: Fleet,
    pub table: PerformanceTable,
    pub profile: LoadProfile,
    /// Default order for single-plan simulation.
    pub priority: PriorityOrder,
    pub search: SearchOptions,
}

impl ScenarioConfig {
    /// Four-unit demo plant with synthetic COP curves and the reference day.
    pub fn demo() -> Self {
        Self {
            fleet: FleetConfig {
                units: vec![
                    Unit::kw("CH01", 700.0).with_kind("centrifugal"),
                    Unit::kw("CH02", 700.0).with_kind("centrifugal"),
                    Unit::kw("CH03", 500.0).with_kind("screw"),
                    Unit::kw("CH04", 500.0).with_kind("screw"),
                ],
                units_csv: None,
            },
            performance: PerformanceConfig {
                noise_std: 0.15,
                ..PerformanceConfig::default()
            },
            ..Self::default()
        }
    }

    /// Seven-unit plant (5040 priority orders) rated in refrigeration tons.
    pub fn plant7() -> Self {
        let units = [
            ("CH01", 250.0),
            ("CH02", 250.0),
            ("CH03", 250.0),
            ("CH04", 250.0),
            ("CH05", 150.0),
            ("CH06", 150.0),
            ("CH07", 100.0),
        ]
        .into_iter()
        .map(|(id, tons)| Unit::tons(id, tons).with_kind("centrifugal"))
        .collect();

        Self {
            fleet: FleetConfig {
                units,
                units_csv: None,
            },
            performance: PerformanceConfig {
                peak_cop: 6.5,
                optimal_part_load: 0.75,
                noise_std: 0.25,
                seed: 7,
                ..PerformanceConfig::default()
            },
            profile: ProfileConfig {
                model: "synthetic".to_string(),
                ..ProfileConfig::default()
            },
            priority: PriorityConfig {
                order: ["CH05", "CH06", "CH01", "CH07", "CH02", "CH03", "CH04"]
                    .map(String::from)
                    .to_vec(),
                path: None,
            },
            search: SearchOptions {
                batch_size: 240,
                top_n: 10,
                ..SearchOptions::default()
            },
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["demo", "plant7"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "demo" => Ok(Self::demo()),
            "plant7" => Ok(Self::plant7()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "scenario".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid. File contents are
    /// not inspected here; they are checked when the scenario is built.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut push = |field: &str, message: String| {
            errors.push(ConfigError {
                field: field.to_string(),
                message,
            });
        };

        let fl = &self.fleet;
        match (fl.units.is_empty(), fl.units_csv.is_some()) {
            (true, false) => push("fleet.units", "must list at least one unit".into()),
            (false, true) => push(
                "fleet.units_csv",
                "must not be combined with fleet.units".into(),
            ),
            _ => {}
        }
        let mut ids = HashSet::new();
        for (i, unit) in fl.units.iter().enumerate() {
            if unit.id.trim().is_empty() {
                push(&format!("fleet.units[{i}].id"), "must not be empty".into());
            }
            if unit.id.contains(crate::fleet::combination::SEPARATOR) {
                push(
                    &format!("fleet.units[{i}].id"),
                    format!("must not contain \"{}\"", crate::fleet::combination::SEPARATOR),
                );
            }
            if !ids.insert(unit.id.as_str()) {
                push(
                    &format!("fleet.units[{i}].id"),
                    format!("duplicate unit \"{}\"", unit.id),
                );
            }
            if !unit.capacity.is_finite() || unit.capacity < 0.0 {
                push(
                    &format!("fleet.units[{i}].capacity"),
                    "must be a finite value >= 0".into(),
                );
            }
        }

        let perf = &self.performance;
        match perf.model.as_str() {
            "tables" => {
                if perf.tables.is_empty() {
                    push("performance.tables", "must list at least one CSV file".into());
                }
            }
            "synthetic" => {
                if perf.peak_cop <= 0.0 {
                    push("performance.peak_cop", "must be > 0".into());
                }
                if !(0.0..=1.0).contains(&perf.optimal_part_load) {
                    push("performance.optimal_part_load", "must be in [0.0, 1.0]".into());
                }
                if perf.curvature < 0.0 {
                    push("performance.curvature", "must be >= 0".into());
                }
                if perf.load_step_kw <= 0.0 {
                    push("performance.load_step_kw", "must be > 0".into());
                }
                if perf.noise_std < 0.0 {
                    push("performance.noise_std", "must be >= 0".into());
                }
            }
            other => push(
                "performance.model",
                format!("must be \"tables\" or \"synthetic\", got \"{other}\""),
            ),
        }

        let prof = &self.profile;
        match prof.model.as_str() {
            "inline" => {
                if prof.loads.len() != HOURS_PER_DAY {
                    push(
                        "profile.loads",
                        format!(
                            "must have exactly {HOURS_PER_DAY} values, got {}",
                            prof.loads.len()
                        ),
                    );
                }
                if prof.loads.iter().any(|l| !l.is_finite() || *l < 0.0) {
                    push("profile.loads", "values must be finite and >= 0".into());
                }
            }
            "csv" => {
                if prof.path.is_none() {
                    push("profile.path", "is required for the csv model".into());
                }
            }
            "synthetic" => {
                if prof.noise_std < 0.0 {
                    push("profile.noise_std", "must be >= 0".into());
                }
            }
            other => push(
                "profile.model",
                format!("must be \"inline\", \"csv\" or \"synthetic\", got \"{other}\""),
            ),
        }

        let pri = &self.priority;
        if !pri.order.is_empty() && pri.path.is_some() {
            push(
                "priority.path",
                "must not be combined with priority.order".into(),
            );
        }
        if !pri.order.is_empty() && !fl.units.is_empty() {
            let fleet_ids: HashSet<&str> = fl.units.iter().map(|u| u.id.as_str()).collect();
            let ranked: HashSet<&str> = pri.order.iter().map(String::as_str).collect();
            if ranked.len() != pri.order.len() {
                push("priority.order", "must not repeat a unit".into());
            }
            if ranked != fleet_ids {
                push("priority.order", "must rank every fleet unit exactly once".into());
            }
        }

        let search = &self.search;
        if search.batch_size == 0 {
            push("search.batch_size", "must be > 0".into());
        }
        if search.top_n == 0 {
            push("search.top_n", "must be > 0".into());
        }

        errors
    }

    /// Loads every data source and assembles the plant.
    ///
    /// Relative paths are resolved against `base_dir`, normally the directory
    /// holding the scenario file.
    ///
    /// # Errors
    ///
    /// Returns an error if a data file cannot be read or its contents violate
    /// a model constraint.
    pub fn build(&self, base_dir: &Path) -> Result<Scenario> {
        let resolve = |path: &Path| -> PathBuf {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                base_dir.join(path)
            }
        };

        let units = match &self.fleet.units_csv {
            Some(path) => import::load_units(&resolve(path))?,
            None => self.fleet.units.clone(),
        };
        let fleet = Fleet::new(units)?;

        let table = if self.performance.model == "tables" {
            let mut table = PerformanceTable::new();
            for path in &self.performance.tables {
                table.add_table(import::load_cop_table(&resolve(path))?)?;
            }
            table
        } else {
            self.performance.curve().build(&fleet)
        };

        let profile = match self.profile.model.as_str() {
            "csv" => match &self.profile.path {
                Some(path) => import::load_profile(&resolve(path))?,
                None => LoadProfile::default_day(),
            },
            "synthetic" => SyntheticProfile {
                base_kw: self.profile.base_kw,
                amp_kw: self.profile.amp_kw,
                phase_rad: self.profile.phase_rad,
                noise_std: self.profile.noise_std,
                seed: self.profile.seed,
            }
            .generate(HOURS_PER_DAY)?,
            _ => LoadProfile::from_loads(&self.profile.loads)?,
        };

        let priority = match (&self.priority.path, self.priority.order.is_empty()) {
            (Some(path), _) => import::load_priority(&resolve(path))?,
            (None, false) => PriorityOrder::new(self.priority.order.iter().cloned())?,
            (None, true) => PriorityOrder::new(fleet.ids())?,
        };
        priority.validate_for(&fleet)?;

        info!(
            units = fleet.len(),
            capacity_kw = fleet.total_capacity(),
            combinations = table.combination_count(),
            hours = profile.len(),
            peak_kw = profile.peak(),
            "scenario loaded"
        );

        Ok(Scenario {
            fleet,
            table,
            profile,
            priority,
            search: self.search.clone(),
        })
    }
}
