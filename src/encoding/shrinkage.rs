//! Empirical-Bayes shrinkage of per-level means.
//!
//! Each level's raw mean is pulled toward the global mean in proportion to
//! how little evidence the level carries:
//! ```text
//! factor(l)   = between / (between + within(l) / n(l))
//! estimate(l) = global_mean + factor(l) · (mean(l) − global_mean)
//! ```
//! `between` is the size-weighted variance of level means around the global
//! mean and `within(l)` the level's own weighted variance, floored at
//! `min_variance_floor`. Weights only enter through the aggregated means and
//! variances; the pooling rule does not re-weight.
//!
//! Means computed as `Σwy / Σw` carry rounding noise, so both variances are
//! compared against [`variance_tolerance`], `ε · scale²` with `scale` the
//! largest |mean| of the fit. At or below it a variance counts as zero: equal
//! level means give `between = 0` and every estimate is exactly the global
//! mean.

use crate::aggregate::{LevelStatistics, NumericAggregate};
use crate::category::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Shrinkage result for one level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShrunkLevel {
    pub n: f64,
    pub raw_mean: f64,
    pub within_variance: f64,
    pub factor: f64,
    pub estimate: f64,
}

/// Shrinkage results for every trained level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShrinkageFit {
    pub global_mean: f64,
    pub between_variance: f64,
    pub levels: BTreeMap<Category, ShrunkLevel>,
}

impl ShrinkageFit {
    pub fn estimate(&self, category: &Category) -> Option<f64> {
        self.levels.get(category).map(|l| l.estimate)
    }
}

/// Variances at or below this value are rounding noise.
pub fn variance_tolerance(levels: &BTreeMap<Category, LevelStatistics>, global_mean: f64) -> f64 {
    let scale = levels
        .values()
        .filter(|s| s.n > 0.0)
        .map(|s| s.mean.abs())
        .fold(global_mean.abs(), f64::max);
    f64::EPSILON * scale * scale
}

/// Size-weighted variance of level means around `global_mean`.
///
/// Exactly zero when the level means agree up to [`variance_tolerance`],
/// including the single-level case.
pub fn between_variance(levels: &BTreeMap<Category, LevelStatistics>, global_mean: f64) -> f64 {
    let (weighted, total) = levels
        .values()
        .filter(|s| s.n > 0.0)
        .fold((0.0, 0.0), |(acc, n), s| {
            (acc + s.n * (s.mean - global_mean).powi(2), n + s.n)
        });
    if total <= 0.0 {
        return 0.0;
    }
    let between = weighted / total;
    if between <= variance_tolerance(levels, global_mean) {
        0.0
    } else {
        between
    }
}

/// Pooling weight given to a level's own mean.
pub fn shrinkage_factor(between: f64, within: f64, n: f64) -> f64 {
    if between <= 0.0 {
        0.0
    } else if within <= 0.0 {
        1.0
    } else {
        between / (between + within / n)
    }
}

fn shrink_toward(global_mean: f64, raw_mean: f64, factor: f64) -> f64 {
    if factor <= 0.0 {
        return global_mean;
    }
    if factor >= 1.0 {
        return raw_mean;
    }
    let estimate = global_mean + factor * (raw_mean - global_mean);
    // Rounding must not push the estimate past either anchor.
    estimate.clamp(global_mean.min(raw_mean), global_mean.max(raw_mean))
}

/// Shrink every trained level of `aggregate`.
///
/// Levels with `n = 0` get no estimate of their own; the novel-level entry
/// covers them.
pub fn shrink(aggregate: &NumericAggregate, min_variance_floor: f64) -> ShrinkageFit {
    let global_mean = aggregate.global.global_mean;
    let between = between_variance(&aggregate.levels, global_mean);
    let tolerance = variance_tolerance(&aggregate.levels, global_mean);

    let levels: BTreeMap<Category, ShrunkLevel> = aggregate
        .levels
        .iter()
        .filter(|(_, s)| s.n > 0.0)
        .map(|(category, s)| {
            let variance = if s.variance <= tolerance { 0.0 } else { s.variance };
            let within = variance.max(min_variance_floor);
            let factor = shrinkage_factor(between, within, s.n);
            (
                category.clone(),
                ShrunkLevel {
                    n: s.n,
                    raw_mean: s.mean,
                    within_variance: within,
                    factor,
                    estimate: shrink_toward(global_mean, s.mean, factor),
                },
            )
        })
        .collect();

    debug!(
        levels = levels.len(),
        global_mean,
        between_variance = between,
        min_variance_floor,
        "fitted analytical shrinkage"
    );

    ShrinkageFit {
        global_mean,
        between_variance: between,
        levels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate_numeric, Observation};

    fn fit(rows: &[(&str, f64)], floor: f64) -> ShrinkageFit {
        let obs: Vec<Observation> = rows.iter().map(|&(c, y)| Observation::new(c, y)).collect();
        shrink(&aggregate_numeric(&obs).unwrap(), floor)
    }

    #[test]
    fn test_zero_within_variance_keeps_raw_mean() {
        let fit = fit(&[("A", 10.0), ("A", 12.0), ("B", 100.0)], 0.0);
        assert!((fit.global_mean - 40.666_666_666_666_664).abs() < 1e-9);

        let b = &fit.levels[&Category::from("B")];
        assert_eq!(b.factor, 1.0);
        assert_eq!(b.estimate, 100.0);

        let a = &fit.levels[&Category::from("A")];
        assert!(a.factor > 0.0 && a.factor < 1.0);
        assert!(a.estimate > 11.0 && a.estimate < fit.global_mean);
    }

    #[test]
    fn test_factor_matches_formula() {
        let fit = fit(&[("A", 10.0), ("A", 12.0), ("B", 100.0)], 0.0);
        let g = 122.0 / 3.0;
        let between = (2.0 * (11.0 - g) * (11.0 - g) + (100.0 - g) * (100.0 - g)) / 3.0;
        assert!((fit.between_variance - between).abs() < 1e-9);

        let a = &fit.levels[&Category::from("A")];
        let expected = between / (between + 1.0 / 2.0);
        assert!((a.factor - expected).abs() < 1e-12);
    }

    #[test]
    fn test_equal_means_collapse_to_global_mean() {
        let fit = fit(&[("A", 0.1), ("A", 0.1), ("B", 0.1), ("C", 0.1)], 0.0);
        assert_eq!(fit.between_variance, 0.0);
        for level in fit.levels.values() {
            assert_eq!(level.factor, 0.0);
            assert_eq!(level.estimate, fit.global_mean);
        }
    }

    #[test]
    fn test_equal_inexact_means_collapse_exactly() {
        let fit = fit(&[("A", 0.1), ("A", 0.1), ("A", 0.1), ("B", 0.1)], 0.0);
        assert_eq!(fit.between_variance, 0.0);
        for level in fit.levels.values() {
            assert_eq!(level.factor, 0.0);
            assert_eq!(level.estimate, fit.global_mean);
        }
    }

    #[test]
    fn test_rounding_noise_in_within_variance_is_zero() {
        let fit = fit(&[("A", 0.1), ("A", 0.1), ("A", 0.1), ("B", 5.0)], 0.0);
        assert!(fit.between_variance > 0.0);
        let a = &fit.levels[&Category::from("A")];
        assert_eq!(a.within_variance, 0.0);
        assert_eq!(a.factor, 1.0);
        assert_eq!(a.estimate, a.raw_mean);
    }

    #[test]
    fn test_variance_tolerance_scales_with_means() {
        let tolerance = |rows: &[(&str, f64)]| {
            let obs: Vec<Observation> =
                rows.iter().map(|&(c, y)| Observation::new(c, y)).collect();
            let agg = aggregate_numeric(&obs).unwrap();
            variance_tolerance(&agg.levels, agg.global.global_mean)
        };
        assert_eq!(tolerance(&[("A", 1.0), ("B", -2.0)]), f64::EPSILON * 4.0);
        assert_eq!(tolerance(&[("A", 1e6), ("B", 2e6)]), f64::EPSILON * 4e12);
        assert!(fit(&[("A", 1e6), ("B", 2e6)], 0.0).between_variance > 0.0);
    }

    #[test]
    fn test_single_level_collapses() {
        let fit = fit(&[("A", 3.0), ("A", 5.0)], 0.0);
        assert_eq!(fit.estimate(&Category::from("A")), Some(4.0));
        assert_eq!(fit.levels[&Category::from("A")].factor, 0.0);
    }

    #[test]
    fn test_variance_floor_shrinks_constant_levels() {
        let without = fit(&[("A", 10.0), ("A", 12.0), ("B", 100.0)], 0.0);
        let with = fit(&[("A", 10.0), ("A", 12.0), ("B", 100.0)], 5000.0);
        let b = &with.levels[&Category::from("B")];

        assert_eq!(b.within_variance, 5000.0);
        assert!(b.factor < 1.0);
        assert!(b.estimate < without.levels[&Category::from("B")].estimate);
        assert!(b.estimate > with.global_mean);
    }

    #[test]
    fn test_estimates_within_bounds() {
        let fit = fit(
            &[
                ("A", 1.0),
                ("A", 7.0),
                ("B", -3.0),
                ("B", 2.0),
                ("B", 4.0),
                ("C", 50.0),
                ("C", 10.0),
            ],
            0.0,
        );
        for level in fit.levels.values() {
            let lo = fit.global_mean.min(level.raw_mean);
            let hi = fit.global_mean.max(level.raw_mean);
            assert!(level.estimate >= lo && level.estimate <= hi);
        }
    }

    #[test]
    fn test_shrinkage_factor_edge_cases() {
        assert_eq!(shrinkage_factor(0.0, 4.0, 2.0), 0.0);
        assert_eq!(shrinkage_factor(0.0, 0.0, 2.0), 0.0);
        assert_eq!(shrinkage_factor(3.0, 0.0, 2.0), 1.0);
        assert_eq!(shrinkage_factor(2.0, 4.0, 2.0), 0.5);
    }

    #[test]
    fn test_more_evidence_means_less_shrinkage() {
        let small = fit(&[("A", 0.0), ("A", 2.0), ("B", 10.0), ("B", 12.0)], 0.0);
        let large = fit(
            &[
                ("A", 0.0),
                ("A", 2.0),
                ("A", 0.0),
                ("A", 2.0),
                ("B", 10.0),
                ("B", 12.0),
                ("B", 10.0),
                ("B", 12.0),
            ],
            0.0,
        );
        let a_small = small.levels[&Category::from("A")].factor;
        let a_large = large.levels[&Category::from("A")].factor;
        assert!(a_large > a_small);
    }
}
