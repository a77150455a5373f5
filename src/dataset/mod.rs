//! Tabular input for fitting and applying encodings.
//!
//! A [`Frame`] is a small column store: named columns of equal length, each
//! either categorical or numeric. It can be built in memory or read from CSV,
//! and resolves [`ColumnRoles`](crate::config::ColumnRoles) into the
//! observations an encoding is fitted on.

pub mod frame;
pub mod reader;

pub use frame::{Column, Frame};
pub use reader::{from_csv_path, from_csv_reader};
