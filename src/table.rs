//! The fitted encoding table.
//!
//! An [`EncodingTable`] maps every trained level, plus the [`Level::Novel`]
//! slot, to a fixed-width vector of finite numbers. It is produced once by a
//! fit and never mutated afterwards; refitting produces a new table.

use crate::category::{Category, CategoryKind, Level};
use crate::error::{EncodingError, Result};
use crate::traits::FittedEncoder;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One `(level, values)` pair of a table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncodingEntry {
    pub level: Level,
    pub values: Vec<f64>,
}

impl EncodingEntry {
    pub fn new(level: Level, values: Vec<f64>) -> Self {
        Self { level, values }
    }

    /// A single-valued entry.
    pub fn scalar(level: Level, value: f64) -> Self {
        Self::new(level, vec![value])
    }
}

/// Row of [`EncodingTable::inspect`], shaped for tidy reporting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InspectRow {
    /// Name of the encoded predictor.
    pub terms: String,
    pub level: Level,
    pub values: Vec<f64>,
}

/// Serializable parameters for a fitted table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EncodingTableParams {
    pub terms: String,
    pub prefix: String,
    pub kind: CategoryKind,
    pub entries: Vec<EncodingEntry>,
}

/// Immutable `level → values` mapping produced by a fit.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodingTable {
    terms: String,
    prefix: String,
    kind: CategoryKind,
    width: usize,
    entries: BTreeMap<Level, Vec<f64>>,
}

impl EncodingTable {
    /// Build a table from entries, checking every table invariant:
    /// unique levels, exactly one novel entry, one common non-zero width,
    /// finite values and a single category kind.
    pub fn new(
        terms: impl Into<String>,
        prefix: impl Into<String>,
        kind: CategoryKind,
        entries: Vec<EncodingEntry>,
    ) -> Result<Self> {
        let width = entries.first().map(|e| e.values.len()).unwrap_or(0);
        if width == 0 {
            return Err(EncodingError::config(
                "an encoding table needs at least one entry with one value",
            ));
        }

        let mut map = BTreeMap::new();
        for entry in entries {
            if entry.values.len() != width {
                return Err(EncodingError::config(format!(
                    "entry {} has {} values, expected {}",
                    entry.level,
                    entry.values.len(),
                    width
                )));
            }
            if let Some(v) = entry.values.iter().find(|v| !v.is_finite()) {
                return Err(EncodingError::NonFiniteEstimate(format!(
                    "level {} has value {}",
                    entry.level, v
                )));
            }
            if let Some(category) = entry.level.category() {
                if category.kind() != kind {
                    return Err(EncodingError::Schema {
                        expected: kind.to_string(),
                        got: category.kind().to_string(),
                    });
                }
            }
            if map.contains_key(&entry.level) {
                return Err(EncodingError::config(format!(
                    "level {} appears more than once",
                    entry.level
                )));
            }
            map.insert(entry.level, entry.values);
        }

        if !map.contains_key(&Level::Novel) {
            return Err(EncodingError::config(
                "an encoding table must contain a novel-level entry",
            ));
        }

        Ok(Self {
            terms: terms.into(),
            prefix: prefix.into(),
            kind,
            width,
            entries: map,
        })
    }

    /// Build a table from a user-supplied dictionary of known levels plus a
    /// novel-level value.
    pub fn from_entries<I>(
        terms: impl Into<String>,
        kind: CategoryKind,
        known: I,
        novel: Vec<f64>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (Category, Vec<f64>)>,
    {
        let mut entries: Vec<EncodingEntry> = known
            .into_iter()
            .map(|(c, v)| EncodingEntry::new(Level::Known(c), v))
            .collect();
        entries.push(EncodingEntry::new(Level::Novel, novel));
        Self::new(terms, "lencode_", kind, entries)
    }

    /// Name of the encoded predictor.
    pub fn terms(&self) -> &str {
        &self.terms
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Category kind seen during training.
    pub fn kind(&self) -> CategoryKind {
        self.kind
    }

    /// Number of values per entry (output columns).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of entries, novel slot included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of trained levels.
    pub fn n_levels(&self) -> usize {
        self.entries.len() - 1
    }

    pub fn get(&self, level: &Level) -> Option<&[f64]> {
        self.entries.get(level).map(Vec::as_slice)
    }

    /// Values used for categories absent from training.
    pub fn novel(&self) -> &[f64] {
        self.entries
            .get(&Level::Novel)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, category: &Category) -> bool {
        self.entries.contains_key(&Level::Known(category.clone()))
    }

    /// Trained levels in category order.
    pub fn levels(&self) -> impl Iterator<Item = &Category> {
        self.entries.keys().filter_map(Level::category)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Level, &[f64])> {
        self.entries.iter().map(|(l, v)| (l, v.as_slice()))
    }

    /// Ordered `(level, values)` listing, novel entry last.
    pub fn inspect(&self) -> Vec<InspectRow> {
        self.entries
            .iter()
            .map(|(level, values)| InspectRow {
                terms: self.terms.clone(),
                level: level.clone(),
                values: values.clone(),
            })
            .collect()
    }

    /// Names of the output columns this table produces.
    pub fn output_names(&self) -> Vec<String> {
        if self.width == 1 {
            vec![format!("{}{}", self.prefix, self.terms)]
        } else {
            (1..=self.width)
                .map(|i| format!("{}{}_{}", self.prefix, self.terms, i))
                .collect()
        }
    }

    /// Human-readable JSON export of the table parameters.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.extract_params())?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let params: EncodingTableParams = serde_json::from_str(json)?;
        Self::from_params(params)
    }

    /// Table values as a dense matrix, one row per entry in [`inspect`]
    /// order.
    ///
    /// [`inspect`]: EncodingTable::inspect
    pub fn to_array(&self) -> Array2<f64> {
        let mut out = Array2::zeros((self.entries.len(), self.width));
        for (mut row, values) in out.rows_mut().into_iter().zip(self.entries.values()) {
            for (cell, v) in row.iter_mut().zip(values) {
                *cell = *v;
            }
        }
        out
    }
}

/// Ordered listing of a table, for reporting consumers.
pub fn inspect(table: &EncodingTable) -> Vec<InspectRow> {
    table.inspect()
}

impl FittedEncoder for EncodingTable {
    type Params = EncodingTableParams;

    fn transform(&self, values: &[Category]) -> Result<Array2<f64>> {
        EncodingTable::transform(self, values)
    }

    fn extract_params(&self) -> Self::Params {
        EncodingTableParams {
            terms: self.terms.clone(),
            prefix: self.prefix.clone(),
            kind: self.kind,
            entries: self
                .entries
                .iter()
                .map(|(level, values)| EncodingEntry::new(level.clone(), values.clone()))
                .collect(),
        }
    }

    fn from_params(params: Self::Params) -> Result<Self> {
        Self::new(params.terms, params.prefix, params.kind, params.entries)
    }

    fn n_levels(&self) -> usize {
        EncodingTable::n_levels(self)
    }
}
