//! Fitting an encoding table from labelled data.
//!
//! [`TargetEncoder`] holds the hyperparameters; fitting it runs the
//! aggregator, the chosen estimator and the novel-level resolver, and yields
//! an immutable [`EncodingTable`].
//!
//! # Example
//! ```ignore
//! use lencode::{Encoder, EncodingMode, Observation, TargetEncoder};
//!
//! let data = vec![
//!     Observation::new("A", 10.0),
//!     Observation::new("A", 12.0),
//!     Observation::new("B", 100.0),
//! ];
//! let table = TargetEncoder::new(EncodingMode::AnalyticalSmoothing).fit(&data)?;
//! ```

use crate::aggregate::{aggregate_classes, aggregate_numeric, Observation, Outcome};
use crate::category::{Category, Level};
use crate::config::{EncoderConfig, EncodingMode};
use crate::dataset::Frame;
use crate::encoding::novel::{novel_entry, woe_fallback};
use crate::encoding::shrinkage::ShrinkageFit;
use crate::encoding::woe::{weight_of_evidence, WoeFit};
use crate::error::{EncodingError, Result};
use crate::pooling::{table_from_strategy, AnalyticalShrinkage};
use crate::table::{EncodingEntry, EncodingTable};
use crate::traits::Encoder;
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info_span};

/// Per-level weight-of-evidence report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WoeSummaryRow {
    pub level: Category,
    pub events: f64,
    pub nonevents: f64,
    pub woe: f64,
    pub information_value: f64,
}

/// Weight-of-evidence diagnostics for one predictor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WoeSummary {
    pub event_level: String,
    /// Total information value over trained levels.
    pub information_value: f64,
    /// Levels whose infinite WOE was replaced by a finite value.
    pub n_adjusted: usize,
    pub rows: Vec<WoeSummaryRow>,
}

impl From<&WoeFit> for WoeSummary {
    fn from(fit: &WoeFit) -> Self {
        Self {
            event_level: fit.event_level.clone(),
            information_value: fit.information_value(),
            n_adjusted: fit.n_adjusted(),
            rows: fit
                .levels
                .iter()
                .map(|(category, level)| WoeSummaryRow {
                    level: category.clone(),
                    events: level.events,
                    nonevents: level.nonevents,
                    woe: level.woe,
                    information_value: level.information_value,
                })
                .collect(),
        }
    }
}

/// Estimator output behind a fitted table.
#[derive(Clone, Debug, PartialEq)]
pub enum FitDetails {
    Shrinkage(ShrinkageFit),
    Woe(WoeSummary),
}

/// Unfitted analytical encoder.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetEncoder {
    #[serde(default)]
    pub mode: EncodingMode,
    #[serde(flatten)]
    pub config: EncoderConfig,
}

impl TargetEncoder {
    pub fn new(mode: EncodingMode) -> Self {
        Self {
            mode,
            config: EncoderConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EncoderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_laplace_alpha(mut self, alpha: f64) -> Self {
        self.config.laplace_alpha = alpha;
        self
    }

    pub fn with_min_variance_floor(mut self, floor: f64) -> Self {
        self.config.min_variance_floor = floor;
        self
    }

    pub fn with_event_level(mut self, event: impl Into<String>) -> Self {
        self.config.event_level = Some(event.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix = Some(prefix.into());
        self
    }

    /// Parse an encoder from JSON, e.g.
    /// `{"mode": "woe", "laplace_alpha": 0.5, "roles": {"predictor": "city", "outcome": "churn"}}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let encoder: Self = serde_json::from_str(json)?;
        encoder.config.validate()?;
        Ok(encoder)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Fit and also return the estimator output the table was built from.
    pub fn fit_with_details(
        &self,
        observations: &[Observation],
    ) -> Result<(EncodingTable, FitDetails)> {
        self.config.validate()?;
        let terms = self.config.roles.predictor.as_str();
        let prefix = self.config.prefix_for(self.mode);
        let _span = info_span!("fit", terms, mode = ?self.mode).entered();

        let (table, details) = match self.mode {
            EncodingMode::AnalyticalSmoothing => {
                let aggregate = if has_class_outcome(observations) {
                    aggregate_classes(observations)?
                        .into_binary(self.config.event_level.as_deref())?
                        .indicator_statistics()
                } else {
                    aggregate_numeric(observations)?
                };
                let strategy =
                    AnalyticalShrinkage::fit_aggregate(&aggregate, self.config.min_variance_floor);
                let table = table_from_strategy(&strategy, terms, prefix)?;
                (table, FitDetails::Shrinkage(strategy.fit().clone()))
            }
            EncodingMode::Woe => {
                let aggregate = aggregate_classes(observations)?
                    .into_binary(self.config.event_level.as_deref())?;
                let fit = weight_of_evidence(&aggregate, self.config.laplace_alpha)?;

                let mut entries: Vec<EncodingEntry> = fit
                    .levels
                    .iter()
                    .map(|(category, level)| {
                        EncodingEntry::scalar(Level::Known(category.clone()), level.woe)
                    })
                    .collect();
                entries.push(novel_entry(woe_fallback(&aggregate.global)));

                let table = EncodingTable::new(terms, prefix, aggregate.kind, entries)?;
                (table, FitDetails::Woe(WoeSummary::from(&fit)))
            }
        };

        debug!(levels = table.n_levels(), "fitted encoding table");
        Ok((table, details))
    }

    /// Fit on the frame columns named by the configured roles.
    pub fn fit_frame(&self, frame: &Frame) -> Result<EncodingTable> {
        self.config.validate()?;
        let observations = frame.observations(&self.config.roles)?;
        self.fit(&observations)
    }

    /// Fit one table per predictor column, sharing the outcome and weight
    /// roles. Tables come back in the order of `predictors`.
    pub fn fit_columns(&self, frame: &Frame, predictors: &[&str]) -> Result<Vec<EncodingTable>> {
        if predictors.is_empty() {
            return Err(EncodingError::config("no predictor columns given"));
        }
        predictors
            .par_iter()
            .map(|predictor| {
                let mut encoder = self.clone();
                encoder.config.roles.predictor = predictor.to_string();
                encoder.fit_frame(frame)
            })
            .collect()
    }
}

fn has_class_outcome(observations: &[Observation]) -> bool {
    observations
        .iter()
        .find(|o| !matches!(o.outcome, Outcome::Missing))
        .map(|o| matches!(o.outcome, Outcome::Class(_)))
        .unwrap_or(false)
}

impl Encoder for TargetEncoder {
    type Input = [Observation];
    type Fitted = EncodingTable;

    fn fit(&self, data: &[Observation]) -> Result<EncodingTable> {
        self.fit_with_details(data).map(|(table, _)| table)
    }

    fn fit_transform(&self, data: &[Observation]) -> Result<Array2<f64>> {
        let table = self.fit(data)?;
        let categories: Vec<Category> = data.iter().map(|o| o.category.clone()).collect();
        table.transform(&categories)
    }
}

/// Fit a table with the given mode and configuration.
pub fn fit(
    observations: &[Observation],
    mode: EncodingMode,
    config: &EncoderConfig,
) -> Result<EncodingTable> {
    TargetEncoder::new(mode)
        .with_config(config.clone())
        .fit(observations)
}
