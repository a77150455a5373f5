//! Analytical encoders.
//!
//! # Available Encodings
//!
//! ## Shrinkage
//! Empirical-Bayes pooling of per-level outcome means toward the global
//! mean. Works for numeric outcomes and, through an event indicator, for
//! binary ones.
//!
//! ```ignore
//! // A: 10, 12   B: 100
//! // global mean 40.67; B has no within-level spread so it keeps 100,
//! // A is pulled (slightly) toward 40.67.
//! ```
//!
//! ## Weight of evidence
//! Laplace-smoothed log-odds of the event / non-event distributions per
//! level, with infinite values replaced by a finite cap.
//!
//! ## Novel levels
//! Both encodings add one entry for categories that were not seen during
//! training; see [`novel`].

pub mod novel;
pub mod shrinkage;
pub mod woe;

pub use novel::{novel_entry, smoothing_fallback, woe_fallback};
pub use shrinkage::{shrink, ShrinkageFit, ShrunkLevel};
pub use woe::{weight_of_evidence, WoeFit, WoeLevel, INFINITE_WOE_MULTIPLIER};
