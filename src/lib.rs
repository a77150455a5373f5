//! # lencode
//!
//! Supervised encoding of categorical predictors into numeric columns, fitted
//! in closed form.
//!
//! ## Core Design Principles
//!
//! - **Fit once, apply many**: fitting produces an immutable
//!   [`EncodingTable`]; applying it is a pure lookup that can run on any
//!   number of threads.
//! - **Typed novel level**: categories unseen during training map to
//!   [`Level::Novel`], a key that can never collide with a real value.
//! - **Finite output**: every value stored in a table is finite, whatever
//!   the data looks like.
//! - **Pluggable pooling**: the table builder only talks to a
//!   [`PoolingStrategy`], so externally fitted models can stand in for the
//!   analytical shrinkage estimator.
//!
//! ## Quick Start
//!
//! ```rust
//! use lencode::{Category, Encoder, EncodingMode, Observation, TargetEncoder};
//!
//! let data = vec![
//!     Observation::new("A", 10.0),
//!     Observation::new("A", 12.0),
//!     Observation::new("B", 100.0),
//! ];
//! let table = TargetEncoder::new(EncodingMode::AnalyticalSmoothing)
//!     .fit(&data)
//!     .unwrap();
//!
//! let encoded = table
//!     .transform(&[Category::from("B"), Category::from("never seen")])
//!     .unwrap();
//! assert_eq!(encoded[[0, 0]], 100.0);
//! assert_eq!(encoded[[1, 0]], table.novel()[0]);
//! ```
//!
//! ## Module Structure
//!
//! - `aggregate`: per-level weighted statistics
//! - `encoding`: shrinkage, weight of evidence and the novel-level fallback
//! - `pooling`: strategies that produce per-level estimates
//! - `table`: the fitted encoding table
//! - `apply`: encoding new values with a table
//! - `encoder`: the fit pipeline and its hyperparameters
//! - `dataset`: in-memory frames and CSV input
//! - `serialization`: persistence of fitted parameters

pub mod aggregate;
pub mod apply;
pub mod category;
pub mod config;
pub mod dataset;
pub mod encoder;
pub mod encoding;
pub mod error;
pub mod pooling;
pub mod serialization;
pub mod table;
pub mod traits;

pub use aggregate::{
    aggregate_classes, aggregate_numeric, BinaryAggregate, BinaryCounts, GlobalStatistics,
    LevelStatistics, NumericAggregate, Observation, Outcome,
};
pub use apply::{transform, transform_column};
pub use category::{Category, CategoryKind, Level};
pub use config::{ColumnRoles, EncoderConfig, EncodingMode, DEFAULT_LAPLACE_ALPHA};
pub use dataset::{from_csv_path, from_csv_reader, Column, Frame};
pub use encoder::{fit, FitDetails, TargetEncoder, WoeSummary, WoeSummaryRow};
pub use error::{EncodingError, Result};
pub use pooling::{
    table_from_strategy, AnalyticalShrinkage, ExternalModelPooling, LevelModel, PoolingStrategy,
};
pub use serialization::SerializableParams;
pub use table::{inspect, EncodingEntry, EncodingTable, EncodingTableParams, InspectRow};
pub use traits::{Encoder, FittedEncoder};
