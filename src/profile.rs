//! Hourly cooling load profiles.

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of hourly samples in one simulated day.
pub const HOURS_PER_DAY: usize = 24;

/// Reference building load (kW) used when no profile is supplied.
pub const DEFAULT_DAY_KW: [f64; HOURS_PER_DAY] = [
    1000.0, 800.0, 700.0, 600.0, 500.0, 400.0, 500.0, 800.0, 1200.0, 1500.0, 1800.0, 2000.0,
    2200.0, 2300.0, 2400.0, 2300.0, 2200.0, 2000.0, 1800.0, 1600.0, 1400.0, 1200.0, 1000.0, 900.0,
];

/// Cooling demand for one hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadSample {
    /// Hour index, `0..len`.
    pub hour: usize,
    /// Load in kW, never negative.
    pub load: f64,
}

/// A read-only, hour-ordered sequence of loads.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadProfile {
    samples: Vec<LoadSample>,
}

impl LoadProfile {
    /// Builds a profile from samples that must be numbered `0, 1, 2, ...`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyLoadProfile`] for no samples, and
    /// [`Error::InvalidLoadProfile`] for out-of-sequence hours or a negative
    /// or non-finite load.
    pub fn new(samples: Vec<LoadSample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(Error::EmptyLoadProfile);
        }
        for (expected, sample) in samples.iter().enumerate() {
            if sample.hour != expected {
                return Err(Error::InvalidLoadProfile(format!(
                    "expected hour {expected}, found hour {}",
                    sample.hour
                )));
            }
            if !sample.load.is_finite() || sample.load < 0.0 {
                return Err(Error::InvalidLoadProfile(format!(
                    "load at hour {expected} must be a finite value >= 0, got {}",
                    sample.load
                )));
            }
        }
        Ok(Self { samples })
    }

    /// Builds a profile from plain loads, numbering hours from 0.
    ///
    /// # Errors
    ///
    /// Same as [`LoadProfile::new`].
    pub fn from_loads(loads: &[f64]) -> Result<Self> {
        Self::new(
            loads
                .iter()
                .enumerate()
                .map(|(hour, &load)| LoadSample { hour, load })
                .collect(),
        )
    }

    /// The reference 24-hour building profile.
    pub fn default_day() -> Self {
        Self {
            samples: DEFAULT_DAY_KW
                .iter()
                .enumerate()
                .map(|(hour, &load)| LoadSample { hour, load })
                .collect(),
        }
    }

    pub fn samples(&self) -> &[LoadSample] {
        &self.samples
    }

    pub fn loads(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.load)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always `false` for a constructed profile.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Highest hourly load in kW.
    pub fn peak(&self) -> f64 {
        self.loads().fold(0.0, f64::max)
    }
}

/// A sinusoidal daily load shape with optional Gaussian noise.
///
/// `load(h) = base_kw + amp_kw * sin(2π h / hours + phase_rad) + noise`,
/// clamped at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticProfile {
    /// Mean load (kW).
    pub base_kw: f64,
    /// Sinusoidal amplitude (kW).
    pub amp_kw: f64,
    /// Phase offset (radians).
    pub phase_rad: f64,
    /// Gaussian noise standard deviation (kW).
    pub noise_std: f64,
    /// Seed for the noise generator.
    pub seed: u64,
}

impl Default for SyntheticProfile {
    fn default() -> Self {
        Self {
            base_kw: 1400.0,
            amp_kw: 900.0,
            phase_rad: -2.0,
            noise_std: 0.0,
            seed: 42,
        }
    }
}

impl SyntheticProfile {
    /// Generates `hours` hourly samples.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyLoadProfile`] if `hours` is zero and
    /// [`Error::InvalidLoadProfile`] if the parameters yield non-finite loads.
    pub fn generate(&self, hours: usize) -> Result<LoadProfile> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let loads: Vec<f64> = (0..hours)
            .map(|h| {
                let day_pos = h as f64 / hours as f64;
                let angle = 2.0 * std::f64::consts::PI * day_pos + self.phase_rad;
                let noise = if self.noise_std > 0.0 {
                    // Box-Muller
                    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
                    let u2: f64 = rng.random::<f64>();
                    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos() * self.noise_std
                } else {
                    0.0
                };
                (self.base_kw + self.amp_kw * angle.sin() + noise).max(0.0)
            })
            .collect();
        LoadProfile::from_loads(&loads)
    }
}
