//! Core traits for supervised encoders.
//!
//! This module defines the two central traits:
//! - [`Encoder`]: Used during fitting; holds hyperparameters and learns from
//!   labelled observations.
//! - [`FittedEncoder`]: After fitting; ready for inference and serialization.

use crate::category::Category;
use crate::error::{EncodingError, Result};
use crate::serialization::SerializableParams;
use ndarray::Array2;

/// Trait for unfitted encoders with hyperparameters.
///
/// # Example
/// ```ignore
/// use lencode::{Encoder, EncodingMode, TargetEncoder};
///
/// let encoder = TargetEncoder::new(EncodingMode::Woe).with_laplace_alpha(1.0);
/// let table = encoder.fit(&observations)?;
/// let encoded = table.transform(&new_categories)?;
/// ```
pub trait Encoder: Clone {
    /// Training input, typically `[Observation]`.
    type Input: ?Sized;
    /// The fitted encoder type ready for inference.
    type Fitted: FittedEncoder;

    /// Fit the encoder to the training data.
    ///
    /// # Errors
    /// Returns [`EncodingError`] if:
    /// - Data is empty
    /// - A weight is non-positive or an outcome has the wrong type
    /// - A hyperparameter is out of range
    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted>;

    /// Fit the encoder and encode the training categories in one step.
    fn fit_transform(&self, data: &Self::Input) -> Result<Array2<f64>>;
}

/// Trait for fitted encoders ready for inference.
///
/// # Guarantees
/// - `extract_params()` + `from_params()` is a round-trip.
/// - `save_to_file` / `load_from_file` are cross-platform compatible.
pub trait FittedEncoder: Clone {
    /// Serializable representation of learned parameters.
    type Params: SerializableParams;

    /// Encode category values; unseen values take the novel-level encoding.
    ///
    /// # Errors
    /// Returns [`EncodingError::Schema`] if a value's kind differs from the
    /// kind seen during fit.
    fn transform(&self, values: &[Category]) -> Result<Array2<f64>>;

    /// Extract learned parameters as a serializable representation.
    fn extract_params(&self) -> Self::Params;

    /// Reconstruct a fitted encoder from parameters.
    fn from_params(params: Self::Params) -> Result<Self>
    where
        Self: Sized;

    /// Save the fitted encoder to a file.
    fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> std::io::Result<()> {
        let params = self.extract_params();
        let bytes = params.to_bytes().map_err(std::io::Error::other)?;
        std::fs::write(path, bytes)
    }

    /// Load a fitted encoder from a file.
    fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self>
    where
        Self: Sized,
    {
        let bytes = std::fs::read(path)?;
        let params = Self::Params::from_bytes(&bytes)
            .map_err(|e| EncodingError::Serialization(e.to_string()))?;
        Self::from_params(params)
    }

    /// Returns the number of levels seen during fit.
    fn n_levels(&self) -> usize;
}
