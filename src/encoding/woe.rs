//! Weight of evidence for a binary outcome.
//!
//! With Laplace pseudo-count `α` and `L` trained levels:
//! ```text
//! p_event(l)    = (events(l) + α)    / (total_events + α·L)
//! p_nonevent(l) = (nonevents(l) + α) / (total_nonevents + α·L)
//! woe(l)        = ln(p_event(l) / p_nonevent(l))
//! ```
//! At `α = 0` a level without events (or without non-events) has an
//! infinite WOE. Such values, and only those, are replaced by
//! `±INFINITE_WOE_MULTIPLIER · R`, where `R` is the least extreme non-zero
//! finite |WOE| of the same fit. When the fit has no finite non-zero WOE at
//! all, the level is re-evaluated with a 0.5 pseudo-count on both cells
//! instead. A `0/0`
//! (one class entirely absent, `α = 0`) carries no evidence and becomes 0.
//!
//! Each level also reports its information value,
//! `(p_event − p_nonevent) · woe`.

use crate::aggregate::{BinaryAggregate, BinaryCounts};
use crate::category::Category;
use crate::error::{EncodingError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Scale applied to the least extreme finite |WOE| when replacing an infinity.
pub const INFINITE_WOE_MULTIPLIER: f64 = 1.5;

/// Pseudo-count used when no finite reference value exists.
pub const HALDANE_CORRECTION: f64 = 0.5;

/// WOE result for one level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WoeLevel {
    pub events: f64,
    pub nonevents: f64,
    pub p_event: f64,
    pub p_nonevent: f64,
    /// Log-odds ratio before infinity adjustment; may be `±∞` or NaN.
    pub raw_woe: f64,
    /// Finite value stored in the encoding table.
    pub woe: f64,
    pub information_value: f64,
    pub adjusted: bool,
}

/// WOE results for every trained level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WoeFit {
    pub laplace_alpha: f64,
    pub event_level: String,
    pub total_events: f64,
    pub total_nonevents: f64,
    pub levels: BTreeMap<Category, WoeLevel>,
}

impl WoeFit {
    pub fn woe(&self, category: &Category) -> Option<f64> {
        self.levels.get(category).map(|l| l.woe)
    }

    /// Total information value of the predictor.
    pub fn information_value(&self) -> f64 {
        self.levels.values().map(|l| l.information_value).sum()
    }

    /// Mean |WOE| over trained levels.
    pub fn mean_abs_woe(&self) -> f64 {
        if self.levels.is_empty() {
            return 0.0;
        }
        self.levels.values().map(|l| l.woe.abs()).sum::<f64>() / self.levels.len() as f64
    }

    pub fn n_adjusted(&self) -> usize {
        self.levels.values().filter(|l| l.adjusted).count()
    }
}

fn distribution(count: f64, total: f64, alpha: f64, n_levels: f64) -> f64 {
    (count + alpha) / (total + alpha * n_levels)
}

fn log_odds_ratio(
    counts: &BinaryCounts,
    totals: &BinaryCounts,
    alpha: f64,
    n_levels: f64,
) -> (f64, f64, f64) {
    let p_event = distribution(counts.events, totals.events, alpha, n_levels);
    let p_nonevent = distribution(counts.nonevents, totals.nonevents, alpha, n_levels);
    (p_event, p_nonevent, (p_event / p_nonevent).ln())
}

/// Replacement for a non-finite raw WOE.
fn adjust(
    raw: f64,
    reference: Option<f64>,
    counts: &BinaryCounts,
    totals: &BinaryCounts,
    n_levels: f64,
) -> f64 {
    if raw.is_nan() {
        return 0.0;
    }
    match reference {
        Some(r) => raw.signum() * INFINITE_WOE_MULTIPLIER * r,
        None => log_odds_ratio(counts, totals, HALDANE_CORRECTION, n_levels).2,
    }
}

/// Compute the weight of evidence of every trained level.
pub fn weight_of_evidence(aggregate: &BinaryAggregate, laplace_alpha: f64) -> Result<WoeFit> {
    if !(laplace_alpha.is_finite() && laplace_alpha >= 0.0) {
        return Err(EncodingError::config(format!(
            "laplace_alpha must be finite and >= 0, got {}",
            laplace_alpha
        )));
    }

    let totals = BinaryCounts {
        events: aggregate.global.total_events,
        nonevents: aggregate.global.total_nonevents,
    };
    let n_levels = aggregate.levels.len() as f64;

    let raw: Vec<(&Category, &BinaryCounts, f64, f64, f64)> = aggregate
        .levels
        .iter()
        .map(|(category, counts)| {
            let (p_event, p_nonevent, woe) =
                log_odds_ratio(counts, &totals, laplace_alpha, n_levels);
            (category, counts, p_event, p_nonevent, woe)
        })
        .collect();

    // Least extreme non-zero finite |WOE| of this fit.
    let reference = raw
        .iter()
        .map(|r| r.4.abs())
        .filter(|w| w.is_finite() && *w > 0.0)
        .fold(None, |min: Option<f64>, w| Some(min.map_or(w, |m| m.min(w))));

    let mut levels = BTreeMap::new();
    for (category, counts, p_event, p_nonevent, raw_woe) in raw {
        let adjusted = !raw_woe.is_finite();
        let woe = if adjusted {
            adjust(raw_woe, reference, counts, &totals, n_levels)
        } else {
            raw_woe
        };
        let iv = (p_event - p_nonevent) * woe;
        levels.insert(
            category.clone(),
            WoeLevel {
                events: counts.events,
                nonevents: counts.nonevents,
                p_event,
                p_nonevent,
                raw_woe,
                woe,
                information_value: if iv.is_finite() { iv } else { 0.0 },
                adjusted,
            },
        );
    }

    let fit = WoeFit {
        laplace_alpha,
        event_level: aggregate.event_level.clone(),
        total_events: totals.events,
        total_nonevents: totals.nonevents,
        levels,
    };

    let n_adjusted = fit.n_adjusted();
    if n_adjusted > 0 {
        warn!(
            n_adjusted,
            reference = reference.unwrap_or(f64::NAN),
            "replaced non-finite weight of evidence values"
        );
    }
    debug!(
        levels = fit.levels.len(),
        laplace_alpha,
        information_value = fit.information_value(),
        "fitted weight of evidence"
    );

    Ok(fit)
}
