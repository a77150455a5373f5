//! Benchmark utilities for lencode.
//!
//! Provides synthetic training data with a known level structure so that fit
//! and transform timings can be compared across sizes.

pub mod data;

pub use data::{synthetic_binary, synthetic_numeric, unseen_mix};
