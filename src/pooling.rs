//! Pooling strategies: where per-level estimates come from.
//!
//! The table builder only needs a [`PoolingStrategy`], something that
//! knows the trained vocabulary and can produce one number per level
//! (including [`Level::Novel`]). Two implementations exist:
//!
//! - [`AnalyticalShrinkage`] wraps the closed-form empirical-Bayes fit.
//! - [`ExternalModelPooling`] wraps any already fitted model exposing
//!   [`LevelModel::predict_per_level`], e.g. a mixed-effects or Bayesian
//!   fit produced elsewhere. How that model was fitted is not this crate's
//!   concern; its outputs are still checked for finiteness.

use crate::aggregate::{GlobalStatistics, NumericAggregate, Observation};
use crate::category::{Category, CategoryKind, Level};
use crate::encoding::novel::{novel_entry, smoothing_fallback};
use crate::encoding::shrinkage::{shrink, ShrinkageFit};
use crate::error::{EncodingError, Result};
use crate::table::{EncodingEntry, EncodingTable};
use std::collections::BTreeSet;

/// Source of per-level estimates.
pub trait PoolingStrategy {
    /// Short name, for logs.
    fn name(&self) -> &str;

    /// Kind of the trained categories.
    fn kind(&self) -> CategoryKind;

    /// Trained levels, in category order.
    fn vocabulary(&self) -> Vec<Category>;

    /// Estimate for one level; `Level::Novel` asks for the fallback.
    fn per_level_estimate(&self, level: &Level) -> Result<f64>;
}

/// Closed-form empirical-Bayes pooling.
#[derive(Clone, Debug)]
pub struct AnalyticalShrinkage {
    kind: CategoryKind,
    global: GlobalStatistics,
    fit: ShrinkageFit,
}

impl AnalyticalShrinkage {
    /// Shrink `aggregate` with the given within-variance floor.
    pub fn fit_aggregate(aggregate: &NumericAggregate, min_variance_floor: f64) -> Self {
        Self {
            kind: aggregate.kind,
            global: aggregate.global.clone(),
            fit: shrink(aggregate, min_variance_floor),
        }
    }

    pub fn fit(&self) -> &ShrinkageFit {
        &self.fit
    }
}

impl PoolingStrategy for AnalyticalShrinkage {
    fn name(&self) -> &str {
        "analytical_shrinkage"
    }

    fn kind(&self) -> CategoryKind {
        self.kind
    }

    fn vocabulary(&self) -> Vec<Category> {
        self.fit.levels.keys().cloned().collect()
    }

    fn per_level_estimate(&self, level: &Level) -> Result<f64> {
        let fallback = smoothing_fallback(&self.global);
        Ok(match level {
            Level::Known(category) => self.fit.estimate(category).unwrap_or(fallback),
            Level::Novel => fallback,
        })
    }
}

/// A model fitted outside this crate that can score any level.
pub trait LevelModel {
    /// Prediction for `level`. For `Level::Novel` the model decides what an
    /// unseen category gets (typically its intercept or population mean).
    fn predict_per_level(&self, level: &Level) -> Result<f64>;
}

impl<F> LevelModel for F
where
    F: Fn(&Level) -> Result<f64>,
{
    fn predict_per_level(&self, level: &Level) -> Result<f64> {
        self(level)
    }
}

/// Pooling delegated to an externally fitted model.
#[derive(Clone, Debug)]
pub struct ExternalModelPooling<M> {
    model: M,
    kind: CategoryKind,
    vocabulary: Vec<Category>,
}

impl<M: LevelModel> ExternalModelPooling<M> {
    /// Wrap a model together with the levels it was trained on.
    pub fn new(model: M, kind: CategoryKind, vocabulary: Vec<Category>) -> Result<Self> {
        let vocabulary: BTreeSet<Category> = vocabulary.into_iter().collect();
        if let Some(c) = vocabulary.iter().find(|c| c.kind() != kind) {
            return Err(EncodingError::Schema {
                expected: kind.to_string(),
                got: c.kind().to_string(),
            });
        }
        Ok(Self {
            model,
            kind,
            vocabulary: vocabulary.into_iter().collect(),
        })
    }

    /// Take the vocabulary from the training observations.
    pub fn from_observations(model: M, observations: &[Observation]) -> Result<Self> {
        let kind = observations
            .first()
            .map(|o| o.category.kind())
            .ok_or_else(|| EncodingError::config("cannot pool over empty data"))?;
        let vocabulary = observations.iter().map(|o| o.category.clone()).collect();
        Self::new(model, kind, vocabulary)
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<M: LevelModel> PoolingStrategy for ExternalModelPooling<M> {
    fn name(&self) -> &str {
        "external_model"
    }

    fn kind(&self) -> CategoryKind {
        self.kind
    }

    fn vocabulary(&self) -> Vec<Category> {
        self.vocabulary.clone()
    }

    fn per_level_estimate(&self, level: &Level) -> Result<f64> {
        self.model.predict_per_level(level)
    }
}

/// Evaluate a strategy on every trained level plus the novel slot and build
/// the resulting table.
pub fn table_from_strategy(
    strategy: &dyn PoolingStrategy,
    terms: &str,
    prefix: &str,
) -> Result<EncodingTable> {
    let vocabulary = strategy.vocabulary();
    let mut entries = Vec::with_capacity(vocabulary.len() + 1);

    for category in vocabulary {
        let level = Level::Known(category);
        let value = checked(strategy, &level)?;
        entries.push(EncodingEntry::scalar(level, value));
    }
    entries.push(novel_entry(checked(strategy, &Level::Novel)?));

    tracing::debug!(
        strategy = strategy.name(),
        entries = entries.len(),
        "built encoding table"
    );
    EncodingTable::new(terms, prefix, strategy.kind(), entries)
}

fn checked(strategy: &dyn PoolingStrategy, level: &Level) -> Result<f64> {
    let value = strategy.per_level_estimate(level)?;
    if !value.is_finite() {
        return Err(EncodingError::NonFiniteEstimate(format!(
            "{} produced {} for level {}",
            strategy.name(),
            value,
            level
        )));
    }
    Ok(value)
}
