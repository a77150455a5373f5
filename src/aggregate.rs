//! Per-level sufficient statistics.
//!
//! The aggregator groups training observations by category and reduces each
//! group to weighted statistics:
//! ```text
//! n        = Σ w
//! mean     = Σ (w · y) / Σ w
//! variance = Σ w (y − mean)² / Σ w
//! ```
//! For a class outcome it counts the weight of every (level, class) pair
//! instead. Levels with a single observation or a constant outcome are not
//! special: they simply come out with `variance = 0`.
//!
//! Statistics of one level never depend on another level, so callers are free
//! to aggregate disjoint partitions in parallel.

use crate::category::{Category, CategoryKind};
use crate::error::{EncodingError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Supervised outcome attached to one observation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    Numeric(f64),
    Class(String),
    Missing,
}

impl Outcome {
    fn is_missing(&self) -> bool {
        match self {
            Outcome::Missing => true,
            Outcome::Numeric(y) => y.is_nan(),
            Outcome::Class(label) => label.is_empty(),
        }
    }
}

impl From<f64> for Outcome {
    fn from(value: f64) -> Self {
        Outcome::Numeric(value)
    }
}

impl From<&str> for Outcome {
    fn from(value: &str) -> Self {
        Outcome::Class(value.to_string())
    }
}

/// One training row: a category, its outcome and a case weight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub category: Category,
    pub outcome: Outcome,
    pub weight: f64,
}

impl Observation {
    /// Create an observation with unit weight.
    pub fn new(category: impl Into<Category>, outcome: impl Into<Outcome>) -> Self {
        Self {
            category: category.into(),
            outcome: outcome.into(),
            weight: 1.0,
        }
    }

    /// Set the case weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

/// Weighted statistics of a single level.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelStatistics {
    /// Weighted count, `Σ w` over observations with an outcome.
    pub n: f64,
    /// Weighted mean outcome (numeric path).
    pub mean: f64,
    /// Weighted within-level variance (numeric path).
    pub variance: f64,
    /// Weighted count per outcome class (class path).
    pub class_counts: BTreeMap<String, f64>,
}

/// Statistics pooled over every level.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalStatistics {
    pub global_mean: f64,
    pub global_variance: f64,
    pub total_events: f64,
    pub total_nonevents: f64,
    pub total_weight: f64,
}

/// Numeric-outcome aggregation result.
#[derive(Clone, Debug, PartialEq)]
pub struct NumericAggregate {
    pub kind: CategoryKind,
    pub levels: BTreeMap<Category, LevelStatistics>,
    pub global: GlobalStatistics,
}

/// Class-outcome aggregation result, before an event class is chosen.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassAggregate {
    pub kind: CategoryKind,
    pub levels: BTreeMap<Category, LevelStatistics>,
    pub classes: BTreeSet<String>,
}

/// Event / non-event weights of one level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BinaryCounts {
    pub events: f64,
    pub nonevents: f64,
}

impl BinaryCounts {
    pub fn total(&self) -> f64 {
        self.events + self.nonevents
    }
}

/// Class aggregation collapsed to a binary event / non-event split.
#[derive(Clone, Debug, PartialEq)]
pub struct BinaryAggregate {
    pub kind: CategoryKind,
    pub event_level: String,
    pub levels: BTreeMap<Category, BinaryCounts>,
    pub global: GlobalStatistics,
}

/// Groups observations by category, checking weights and the category kind.
///
/// Returns, per level, the `(outcome, weight)` pairs that carry an outcome.
fn group<'a>(
    observations: &'a [Observation],
) -> Result<(CategoryKind, BTreeMap<Category, Vec<(&'a Outcome, f64)>>)> {
    let first = observations
        .first()
        .ok_or_else(|| EncodingError::config("cannot fit an encoding on empty data"))?;
    let kind = first.category.kind();

    let mut groups: BTreeMap<Category, Vec<(&Outcome, f64)>> = BTreeMap::new();
    let mut skipped = 0usize;

    for (row, obs) in observations.iter().enumerate() {
        if obs.category.kind() != kind {
            return Err(EncodingError::Schema {
                expected: kind.to_string(),
                got: obs.category.kind().to_string(),
            });
        }
        if !(obs.weight.is_finite() && obs.weight > 0.0) {
            return Err(EncodingError::config(format!(
                "weights must be positive and finite, got {} at row {}",
                obs.weight, row
            )));
        }
        let rows = groups.entry(obs.category.clone()).or_default();
        if obs.outcome.is_missing() {
            skipped += 1;
        } else {
            rows.push((&obs.outcome, obs.weight));
        }
    }

    if let Some((level, _)) = groups.iter().find(|(_, rows)| rows.is_empty()) {
        return Err(EncodingError::config(format!(
            "outcome is missing for every observation of level {}",
            level
        )));
    }
    if skipped > 0 {
        warn!(skipped, "observations with a missing outcome were ignored");
    }

    Ok((kind, groups))
}

/// Aggregate a numeric outcome per level.
pub fn aggregate_numeric(observations: &[Observation]) -> Result<NumericAggregate> {
    let (kind, groups) = group(observations)?;

    let mut levels = BTreeMap::new();
    let mut total_weight = 0.0;
    let mut total_wy = 0.0;

    for (category, rows) in groups {
        let mut values = Vec::with_capacity(rows.len());
        for (outcome, w) in rows {
            match outcome {
                Outcome::Numeric(y) if y.is_finite() => values.push((*y, w)),
                Outcome::Numeric(y) => {
                    return Err(EncodingError::config(format!(
                        "non-finite outcome {} for level {}",
                        y, category
                    )))
                }
                other => {
                    return Err(EncodingError::config(format!(
                        "expected a numeric outcome, got {:?}",
                        other
                    )))
                }
            }
        }

        let n: f64 = values.iter().map(|&(_, w)| w).sum();
        let wy: f64 = values.iter().map(|&(y, w)| w * y).sum();
        if !n.is_finite() || !wy.is_finite() {
            return Err(EncodingError::config(format!(
                "weighted outcome sum overflows for level {}",
                category
            )));
        }
        let mean = wy / n;
        let variance = values
            .iter()
            .map(|&(y, w)| w * (y - mean) * (y - mean))
            .sum::<f64>()
            / n;
        if !variance.is_finite() {
            return Err(EncodingError::config(format!(
                "outcome variance overflows for level {}",
                category
            )));
        }

        total_weight += n;
        total_wy += wy;
        levels.insert(
            category,
            LevelStatistics {
                n,
                mean,
                variance,
                class_counts: BTreeMap::new(),
            },
        );
    }

    if !total_weight.is_finite() || !total_wy.is_finite() {
        return Err(EncodingError::config(
            "weighted outcome sum overflows over all levels",
        ));
    }
    let global_mean = total_wy / total_weight;
    // Σw(y − g)² = Σ_l [ n_l·var_l + n_l·(mean_l − g)² ]
    let global_variance = levels
        .values()
        .map(|s| s.n * s.variance + s.n * (s.mean - global_mean).powi(2))
        .sum::<f64>()
        / total_weight;
    if !global_variance.is_finite() {
        return Err(EncodingError::config(
            "outcome variance overflows over all levels",
        ));
    }

    debug!(
        levels = levels.len(),
        total_weight, global_mean, global_variance, "aggregated numeric outcome"
    );

    Ok(NumericAggregate {
        kind,
        levels,
        global: GlobalStatistics {
            global_mean,
            global_variance,
            total_events: 0.0,
            total_nonevents: 0.0,
            total_weight,
        },
    })
}

/// Aggregate a class outcome per level.
pub fn aggregate_classes(observations: &[Observation]) -> Result<ClassAggregate> {
    let (kind, groups) = group(observations)?;

    let mut levels = BTreeMap::new();
    let mut classes = BTreeSet::new();

    for (category, rows) in groups {
        let mut stats = LevelStatistics::default();
        for (outcome, w) in rows {
            match outcome {
                Outcome::Class(class) => {
                    *stats.class_counts.entry(class.clone()).or_insert(0.0) += w;
                    classes.insert(class.clone());
                    stats.n += w;
                }
                other => {
                    return Err(EncodingError::config(format!(
                        "expected a class outcome, got {:?}",
                        other
                    )))
                }
            }
        }
        levels.insert(category, stats);
    }

    debug!(
        levels = levels.len(),
        classes = classes.len(),
        "aggregated class outcome"
    );

    Ok(ClassAggregate {
        kind,
        levels,
        classes,
    })
}

impl ClassAggregate {
    /// Collapse class counts into events and non-events.
    ///
    /// `event_level` defaults to the first class in sorted order. Fewer than
    /// two observed classes is allowed (the missing side counts zero); more
    /// than two is a configuration error.
    pub fn into_binary(self, event_level: Option<&str>) -> Result<BinaryAggregate> {
        if self.classes.len() > 2 {
            return Err(EncodingError::config(format!(
                "a binary outcome is required, found {} classes: {:?}",
                self.classes.len(),
                self.classes
            )));
        }

        let event = match event_level {
            Some(e) => {
                if self.classes.len() == 2 && !self.classes.contains(e) {
                    return Err(EncodingError::config(format!(
                        "event level {:?} is not one of the outcome classes {:?}",
                        e, self.classes
                    )));
                }
                e.to_string()
            }
            None => self
                .classes
                .iter()
                .next()
                .cloned()
                .ok_or_else(|| EncodingError::config("outcome has no classes"))?,
        };

        let mut levels = BTreeMap::new();
        let mut total_events = 0.0;
        let mut total_nonevents = 0.0;
        for (category, stats) in self.levels {
            let events = stats.class_counts.get(&event).copied().unwrap_or(0.0);
            let nonevents = stats.n - events;
            total_events += events;
            total_nonevents += nonevents;
            levels.insert(category, BinaryCounts { events, nonevents });
        }

        let total_weight = total_events + total_nonevents;
        let rate = total_events / total_weight;

        Ok(BinaryAggregate {
            kind: self.kind,
            event_level: event,
            levels,
            global: GlobalStatistics {
                global_mean: rate,
                global_variance: rate * (1.0 - rate),
                total_events,
                total_nonevents,
                total_weight,
            },
        })
    }
}

impl BinaryAggregate {
    /// Recode the outcome as an event indicator (1 for the event, 0
    /// otherwise) and express it as numeric statistics.
    ///
    /// The per-level mean is the event rate `p` and the variance `p(1 − p)`.
    pub fn indicator_statistics(&self) -> NumericAggregate {
        let levels = self
            .levels
            .iter()
            .map(|(category, counts)| {
                let n = counts.total();
                let p = counts.events / n;
                (
                    category.clone(),
                    LevelStatistics {
                        n,
                        mean: p,
                        variance: p * (1.0 - p),
                        class_counts: BTreeMap::new(),
                    },
                )
            })
            .collect();

        NumericAggregate {
            kind: self.kind,
            levels,
            global: self.global.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(rows: &[(&str, f64, f64)]) -> Vec<Observation> {
        rows.iter()
            .map(|&(c, y, w)| Observation::new(c, y).with_weight(w))
            .collect()
    }

    #[test]
    fn test_aggregate_numeric_basic() {
        let obs = numeric(&[("A", 10.0, 1.0), ("A", 12.0, 1.0), ("B", 100.0, 1.0)]);
        let agg = aggregate_numeric(&obs).unwrap();

        let a = &agg.levels[&Category::from("A")];
        assert_eq!(a.n, 2.0);
        assert_eq!(a.mean, 11.0);
        assert_eq!(a.variance, 1.0);

        let b = &agg.levels[&Category::from("B")];
        assert_eq!(b.n, 1.0);
        assert_eq!(b.variance, 0.0);

        assert!((agg.global.global_mean - 122.0 / 3.0).abs() < 1e-12);
        assert_eq!(agg.kind, CategoryKind::Text);
    }

    #[test]
    fn test_aggregate_numeric_weights() {
        let obs = numeric(&[("A", 0.0, 1.0), ("A", 4.0, 3.0)]);
        let agg = aggregate_numeric(&obs).unwrap();
        let a = &agg.levels[&Category::from("A")];

        assert_eq!(a.n, 4.0);
        assert_eq!(a.mean, 3.0);
        // (1·9 + 3·1) / 4
        assert_eq!(a.variance, 3.0);
    }

    #[test]
    fn test_global_variance_matches_direct_computation() {
        let obs = numeric(&[("A", 1.0, 1.0), ("A", 3.0, 2.0), ("B", 8.0, 0.5)]);
        let agg = aggregate_numeric(&obs).unwrap();
        let total: f64 = obs.iter().map(|o| o.weight).sum();
        let g = agg.global.global_mean;
        let direct = obs
            .iter()
            .map(|o| match o.outcome {
                Outcome::Numeric(y) => o.weight * (y - g) * (y - g),
                _ => unreachable!(),
            })
            .sum::<f64>()
            / total;
        assert!((agg.global.global_variance - direct).abs() < 1e-12);
    }

    #[test]
    fn test_aggregate_rejects_non_positive_weight() {
        let obs = numeric(&[("A", 1.0, 1.0), ("B", 2.0, 0.0)]);
        let err = aggregate_numeric(&obs).unwrap_err();
        assert!(matches!(err, EncodingError::Configuration(_)));

        let obs = numeric(&[("A", 1.0, -2.0)]);
        assert!(aggregate_numeric(&obs).is_err());

        let obs = numeric(&[("A", 1.0, f64::NAN)]);
        assert!(aggregate_numeric(&obs).is_err());
    }

    #[test]
    fn test_aggregate_rejects_empty() {
        assert!(matches!(
            aggregate_numeric(&[]),
            Err(EncodingError::Configuration(_))
        ));
    }

    #[test]
    fn test_missing_outcomes_are_skipped() {
        let obs = vec![
            Observation::new("A", 2.0),
            Observation::new("A", Outcome::Missing),
            Observation::new("A", f64::NAN),
        ];
        let agg = aggregate_numeric(&obs).unwrap();
        let a = &agg.levels[&Category::from("A")];
        assert_eq!(a.n, 1.0);
        assert_eq!(a.mean, 2.0);
    }

    #[test]
    fn test_level_with_only_missing_outcomes_fails() {
        let obs = vec![
            Observation::new("A", 2.0),
            Observation::new("B", Outcome::Missing),
        ];
        let err = aggregate_numeric(&obs).unwrap_err();
        assert!(err.to_string().contains("level B"));
    }

    #[test]
    fn test_infinite_outcome_is_a_configuration_error() {
        let obs = vec![
            Observation::new("A", f64::INFINITY),
            Observation::new("B", 1.0),
        ];
        assert!(matches!(
            aggregate_numeric(&obs),
            Err(EncodingError::Configuration(_))
        ));
    }

    #[test]
    fn test_overflowing_weighted_sum_is_a_configuration_error() {
        let obs = numeric(&[("A", 1e308, 10.0), ("B", 1.0, 1.0)]);
        assert!(matches!(
            aggregate_numeric(&obs),
            Err(EncodingError::Configuration(_))
        ));

        let obs = numeric(&[("A", 1e308, 1.0), ("B", 1e308, 1.0)]);
        assert!(matches!(
            aggregate_numeric(&obs),
            Err(EncodingError::Configuration(_))
        ));

        let obs = numeric(&[("A", 1e200, 1.0), ("A", -1e200, 1.0)]);
        assert!(matches!(
            aggregate_numeric(&obs),
            Err(EncodingError::Configuration(_))
        ));

        let obs = numeric(&[("A", 1e200, 1.0), ("B", -1e200, 1.0)]);
        assert!(matches!(
            aggregate_numeric(&obs),
            Err(EncodingError::Configuration(_))
        ));
    }

    #[test]
    fn test_empty_class_label_is_missing() {
        let obs = vec![
            Observation::new("A", "yes"),
            Observation::new("A", "no"),
            Observation::new("B", "no"),
            Observation::new("B", ""),
        ];
        let agg = aggregate_classes(&obs).unwrap();
        assert_eq!(agg.classes.len(), 2);
        assert_eq!(agg.levels[&Category::from("B")].n, 1.0);
        assert!(agg.into_binary(None).is_ok());
    }

    #[test]
    fn test_mixed_category_kinds_fail() {
        let obs = vec![Observation::new("A", 1.0), Observation::new(3i64, 2.0)];
        assert!(matches!(
            aggregate_numeric(&obs),
            Err(EncodingError::Schema { .. })
        ));
    }

    #[test]
    fn test_numeric_path_rejects_class_outcome() {
        let obs = vec![Observation::new("A", "yes")];
        assert!(aggregate_numeric(&obs).is_err());
    }

    #[test]
    fn test_aggregate_classes_counts() {
        let obs = vec![
            Observation::new("A", "yes"),
            Observation::new("A", "no").with_weight(2.0),
            Observation::new("B", "yes"),
        ];
        let agg = aggregate_classes(&obs).unwrap();
        let a = &agg.levels[&Category::from("A")];
        assert_eq!(a.n, 3.0);
        assert_eq!(a.class_counts["no"], 2.0);
        assert_eq!(agg.classes.len(), 2);
    }

    #[test]
    fn test_into_binary_default_event_is_first_class() {
        let obs = vec![
            Observation::new("A", "yes"),
            Observation::new("A", "no"),
            Observation::new("B", "no"),
        ];
        let bin = aggregate_classes(&obs).unwrap().into_binary(None).unwrap();
        assert_eq!(bin.event_level, "no");
        assert_eq!(bin.global.total_events, 2.0);
        assert_eq!(bin.global.total_nonevents, 1.0);
        assert_eq!(bin.levels[&Category::from("B")].nonevents, 0.0);
    }

    #[test]
    fn test_into_binary_explicit_event() {
        let obs = vec![Observation::new("A", "yes"), Observation::new("A", "no")];
        let bin = aggregate_classes(&obs)
            .unwrap()
            .into_binary(Some("yes"))
            .unwrap();
        assert_eq!(bin.event_level, "yes");
        assert_eq!(bin.levels[&Category::from("A")].events, 1.0);
    }

    #[test]
    fn test_into_binary_rejects_three_classes() {
        let obs = vec![
            Observation::new("A", "x"),
            Observation::new("A", "y"),
            Observation::new("B", "z"),
        ];
        let err = aggregate_classes(&obs)
            .unwrap()
            .into_binary(None)
            .unwrap_err();
        assert!(matches!(err, EncodingError::Configuration(_)));
    }

    #[test]
    fn test_into_binary_rejects_unknown_event() {
        let obs = vec![Observation::new("A", "x"), Observation::new("A", "y")];
        assert!(aggregate_classes(&obs)
            .unwrap()
            .into_binary(Some("z"))
            .is_err());
    }

    #[test]
    fn test_single_class_is_allowed() {
        let obs = vec![Observation::new("A", "yes")];
        let bin = aggregate_classes(&obs)
            .unwrap()
            .into_binary(Some("no"))
            .unwrap();
        assert_eq!(bin.global.total_events, 0.0);
        assert_eq!(bin.global.total_nonevents, 1.0);
    }

    #[test]
    fn test_indicator_statistics() {
        let obs = vec![
            Observation::new("A", "yes"),
            Observation::new("A", "no"),
            Observation::new("B", "yes"),
            Observation::new("B", "yes"),
        ];
        let bin = aggregate_classes(&obs)
            .unwrap()
            .into_binary(Some("yes"))
            .unwrap();
        let num = bin.indicator_statistics();
        let a = &num.levels[&Category::from("A")];
        assert_eq!(a.mean, 0.5);
        assert_eq!(a.variance, 0.25);
        assert_eq!(num.levels[&Category::from("B")].variance, 0.0);
        assert_eq!(num.global.global_mean, 0.75);
    }
}
