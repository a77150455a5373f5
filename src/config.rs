//! Encoder configuration.
//!
//! Everything that the analytical core needs besides the data itself lives
//! in [`EncoderConfig`]: the smoothing constants, the event class for a
//! binary outcome, and the [`ColumnRoles`] that say which frame column is the
//! predictor, which is the outcome and which (optionally) holds case weights.
//! Roles are resolved once, when a frame is turned into observations.

use crate::error::{EncodingError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default Laplace pseudo-count for weight of evidence.
pub const DEFAULT_LAPLACE_ALPHA: f64 = 1e-6;

/// Which analytical encoding to fit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingMode {
    /// Empirical-Bayes shrinkage of per-level means toward the global mean.
    #[default]
    AnalyticalSmoothing,
    /// Laplace-smoothed weight of evidence for a binary outcome.
    Woe,
}

impl EncodingMode {
    /// Prefix of output column names when none is configured.
    pub fn default_prefix(&self) -> &'static str {
        match self {
            EncodingMode::AnalyticalSmoothing => "lencode_",
            EncodingMode::Woe => "woe_",
        }
    }
}

/// Names of the frame columns playing each role in a fit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRoles {
    /// The categorical column being encoded.
    pub predictor: String,
    /// The supervised outcome.
    pub outcome: String,
    /// Optional case-weight column; every row weighs 1.0 when absent.
    #[serde(default)]
    pub weight: Option<String>,
}

impl ColumnRoles {
    pub fn new(predictor: impl Into<String>, outcome: impl Into<String>) -> Self {
        Self {
            predictor: predictor.into(),
            outcome: outcome.into(),
            weight: None,
        }
    }

    pub fn with_weight(mut self, weight: impl Into<String>) -> Self {
        self.weight = Some(weight.into());
        self
    }

    fn validate(&self) -> Result<()> {
        if self.predictor.is_empty() || self.outcome.is_empty() {
            return Err(EncodingError::config("column role names must not be empty"));
        }
        if self.predictor == self.outcome {
            return Err(EncodingError::config(format!(
                "predictor and outcome must be different columns, both are {:?}",
                self.predictor
            )));
        }
        if let Some(w) = &self.weight {
            if w == &self.predictor || w == &self.outcome {
                return Err(EncodingError::config(format!(
                    "weight column {:?} is already used by another role",
                    w
                )));
            }
        }
        Ok(())
    }
}

impl Default for ColumnRoles {
    fn default() -> Self {
        Self::new("predictor", "outcome")
    }
}

fn default_alpha() -> f64 {
    DEFAULT_LAPLACE_ALPHA
}

/// Hyperparameters shared by both encoding modes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Laplace pseudo-count added to every event and non-event cell (WOE only).
    #[serde(default = "default_alpha")]
    pub laplace_alpha: f64,
    /// Lower bound applied to within-level variances before shrinkage.
    ///
    /// At `0.0` a zero-variance level keeps its raw mean; a positive floor
    /// lets such levels be pulled toward the global mean as well.
    #[serde(default)]
    pub min_variance_floor: f64,
    #[serde(default)]
    pub roles: ColumnRoles,
    /// Outcome class counted as the event. Defaults to the first class in
    /// sorted order.
    #[serde(default)]
    pub event_level: Option<String>,
    /// Output column prefix; the mode's default prefix when `None`.
    #[serde(default)]
    pub prefix: Option<String>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            laplace_alpha: DEFAULT_LAPLACE_ALPHA,
            min_variance_floor: 0.0,
            roles: ColumnRoles::default(),
            event_level: None,
            prefix: None,
        }
    }
}

impl EncoderConfig {
    pub fn new(roles: ColumnRoles) -> Self {
        Self {
            roles,
            ..Self::default()
        }
    }

    pub fn with_laplace_alpha(mut self, alpha: f64) -> Self {
        self.laplace_alpha = alpha;
        self
    }

    pub fn with_min_variance_floor(mut self, floor: f64) -> Self {
        self.min_variance_floor = floor;
        self
    }

    pub fn with_event_level(mut self, event: impl Into<String>) -> Self {
        self.event_level = Some(event.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Name of the case-weight column, if any.
    pub fn weight_column(&self) -> Option<&str> {
        self.roles.weight.as_deref()
    }

    /// Output prefix for the given mode.
    pub fn prefix_for(&self, mode: EncodingMode) -> &str {
        self.prefix.as_deref().unwrap_or(mode.default_prefix())
    }

    /// Check every hyperparameter.
    pub fn validate(&self) -> Result<()> {
        if !(self.laplace_alpha.is_finite() && self.laplace_alpha >= 0.0) {
            return Err(EncodingError::config(format!(
                "laplace_alpha must be finite and >= 0, got {}",
                self.laplace_alpha
            )));
        }
        if !(self.min_variance_floor.is_finite() && self.min_variance_floor >= 0.0) {
            return Err(EncodingError::config(format!(
                "min_variance_floor must be finite and >= 0, got {}",
                self.min_variance_floor
            )));
        }
        self.roles.validate()
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EncoderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.laplace_alpha, DEFAULT_LAPLACE_ALPHA);
        assert_eq!(config.weight_column(), None);
    }

    #[test]
    fn test_negative_alpha_rejected() {
        let config = EncoderConfig::default().with_laplace_alpha(-1.0);
        assert!(matches!(
            config.validate(),
            Err(EncodingError::Configuration(_))
        ));
        let config = EncoderConfig::default().with_laplace_alpha(f64::INFINITY);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_floor_rejected() {
        let config = EncoderConfig::default().with_min_variance_floor(-0.1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_roles_must_be_distinct() {
        let config = EncoderConfig::new(ColumnRoles::new("x", "x"));
        assert!(config.validate().is_err());

        let config = EncoderConfig::new(ColumnRoles::new("x", "y").with_weight("y"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_prefix_defaults_by_mode() {
        let config = EncoderConfig::default();
        assert_eq!(config.prefix_for(EncodingMode::Woe), "woe_");
        assert_eq!(
            config.prefix_for(EncodingMode::AnalyticalSmoothing),
            "lencode_"
        );
        let config = config.with_prefix("te_");
        assert_eq!(config.prefix_for(EncodingMode::Woe), "te_");
    }

    #[test]
    fn test_from_json_str() {
        let json = r#"{
            "laplace_alpha": 0.5,
            "roles": {"predictor": "city", "outcome": "churn", "weight": "w"},
            "event_level": "yes"
        }"#;
        let config = EncoderConfig::from_json_str(json).unwrap();
        assert_eq!(config.laplace_alpha, 0.5);
        assert_eq!(config.min_variance_floor, 0.0);
        assert_eq!(config.weight_column(), Some("w"));
        assert_eq!(config.event_level.as_deref(), Some("yes"));
    }

    #[test]
    fn test_from_json_str_defaults_alpha() {
        let config = EncoderConfig::from_json_str("{}").unwrap();
        assert_eq!(config.laplace_alpha, DEFAULT_LAPLACE_ALPHA);
        assert_eq!(config.roles, ColumnRoles::default());
    }

    #[test]
    fn test_from_json_str_validates() {
        let json = r#"{"laplace_alpha": -2.0}"#;
        assert!(matches!(
            EncoderConfig::from_json_str(json),
            Err(EncodingError::Configuration(_))
        ));
    }

    #[test]
    fn test_mode_serde_names() {
        let json = serde_json::to_string(&EncodingMode::AnalyticalSmoothing).unwrap();
        assert_eq!(json, "\"analytical_smoothing\"");
        let mode: EncodingMode = serde_json::from_str("\"woe\"").unwrap();
        assert_eq!(mode, EncodingMode::Woe);
    }
}
