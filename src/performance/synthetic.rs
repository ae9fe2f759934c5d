use itertools::Itertools;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::fleet::{Combination, Fleet};

use super::PerformanceTable;

/// A parabolic part-load COP curve used to synthesize performance tables.
///
/// For a combination with capacity `cap` serving `load`, the part-load ratio
/// is `plr = load / cap` and
///
/// ```text
/// cop = peak_cop * (1 - curvature * (plr - optimal_part_load)^2) + noise
/// ```
///
/// Points with `plr > 1` are recorded as absent: the combination cannot carry
/// that load, so it has no measured efficiency there.
///
/// # Examples
///
/// ```
/// use chiller_staging::fleet::{Combination, Fleet, Unit};
/// use chiller_staging::performance::SyntheticCurve;
///
/// let fleet = Fleet::new(vec![Unit::kw("A", 500.0), Unit::kw("B", 500.0)]).unwrap();
/// let table = SyntheticCurve::default().build(&fleet);
/// assert!(table.cop(&Combination::parse("A"), 350.0).is_some());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticCurve {
    /// COP at the optimal part-load ratio.
    pub peak_cop: f64,
    /// Part-load ratio of peak efficiency (0.0 to 1.0).
    pub optimal_part_load: f64,
    /// How fast COP falls away from the optimum.
    pub curvature: f64,
    /// Spacing of sample loads in kW.
    pub load_step_kw: f64,
    /// Standard deviation of Gaussian noise added to each sample.
    pub noise_std: f64,
    /// Seed for the noise generator.
    pub seed: u64,
}

impl Default for SyntheticCurve {
    fn default() -> Self {
        Self {
            peak_cop: 6.0,
            optimal_part_load: 0.7,
            curvature: 1.2,
            load_step_kw: 100.0,
            noise_std: 0.0,
            seed: 42,
        }
    }
}

impl SyntheticCurve {
    /// Noise-free COP at a part-load ratio, `None` beyond full load.
    pub fn cop_at(&self, part_load: f64) -> Option<f64> {
        if !part_load.is_finite() || part_load > 1.0 {
            return None;
        }
        let offset = part_load - self.optimal_part_load;
        Some((self.peak_cop * (1.0 - self.curvature * offset * offset)).max(0.0))
    }

    /// Builds a table covering every non-empty combination of the fleet.
    ///
    /// Combinations are visited in a fixed order, so a given seed always
    /// yields the same table.
    pub fn build(&self, fleet: &Fleet) -> PerformanceTable {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut table = PerformanceTable::new();

        let step = if self.load_step_kw > 0.0 {
            self.load_step_kw
        } else {
            SyntheticCurve::default().load_step_kw
        };
        let ceiling = fleet.total_capacity();
        let points = (ceiling / step).ceil() as usize;
        let ids: Vec<&str> = fleet.ids().collect();

        for size in 1..=ids.len() {
            for members in ids.iter().copied().combinations(size) {
                let combination = Combination::new(members);
                let capacity = fleet.capacity(&combination);
                for i in 1..=points {
                    let load = step * i as f64;
                    let cop = if capacity > 0.0 {
                        self.cop_at(load / capacity)
                            .map(|cop| (cop + self.noise(&mut rng)).max(0.0))
                    } else {
                        None
                    };
                    table.insert(combination.clone(), load, cop);
                }
            }
        }
        table
    }

    fn noise(&self, rng: &mut StdRng) -> f64 {
        if self.noise_std <= 0.0 {
            return 0.0;
        }
        // Box-Muller
        let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
        let u2: f64 = rng.random::<f64>();
        let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        z0 * self.noise_std
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::Unit;

    fn fleet() -> Fleet {
        Fleet::new(vec![Unit::kw("A", 400.0), Unit::kw("B", 600.0)]).expect("valid fleet")
    }

    #[test]
    fn peak_at_optimal_part_load() {
        let curve = SyntheticCurve::default();
        let peak = curve.cop_at(curve.optimal_part_load);
        assert_eq!(peak, Some(curve.peak_cop));
        let lower = curve.cop_at(0.2).unwrap_or_default();
        assert!(lower < curve.peak_cop);
    }

    #[test]
    fn overload_is_absent() {
        assert_eq!(SyntheticCurve::default().cop_at(1.01), None);
    }

    #[test]
    fn covers_every_combination() {
        let table = SyntheticCurve::default().build(&fleet());
        assert_eq!(table.combination_count(), 3);
        assert_eq!(table.sizes().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn beyond_capacity_has_no_sample() {
        let table = SyntheticCurve::default().build(&fleet());
        // A alone tops out at 400 kW; the 500 kW sample and above are absent.
        let a = Combination::parse("A");
        let above: Vec<_> = table
            .samples(&a)
            .iter()
            .filter(|s| s.load > 400.0)
            .collect();
        assert!(!above.is_empty());
        assert!(above.iter().all(|s| s.cop.is_none()));
    }

    #[test]
    fn same_seed_same_table() {
        let curve = SyntheticCurve {
            noise_std: 0.2,
            ..SyntheticCurve::default()
        };
        let a = curve.build(&fleet());
        let b = curve.build(&fleet());
        let c = Combination::parse("A+B");
        assert_eq!(a.samples(&c), b.samples(&c));
    }
}
