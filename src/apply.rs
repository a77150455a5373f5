//! Applying a fitted table to new data.
//!
//! Every value is looked up in the table; values the table has never seen
//! take the novel-level row. Applying is a pure read of the table, so one
//! table can serve any number of threads at once.

use crate::category::{Category, Level};
use crate::dataset::Frame;
use crate::error::{EncodingError, Result};
use crate::table::EncodingTable;
use ndarray::{Array1, Array2};
use tracing::trace;

impl EncodingTable {
    /// Encoding of a single value, falling back to the novel row.
    pub fn lookup(&self, value: &Category) -> Result<&[f64]> {
        if value.kind() != self.kind() {
            return Err(EncodingError::Schema {
                expected: self.kind().to_string(),
                got: value.kind().to_string(),
            });
        }
        Ok(self
            .get(&Level::Known(value.clone()))
            .unwrap_or_else(|| self.novel()))
    }

    /// Encode `values`, one output row per input value and one column per
    /// table value.
    ///
    /// # Errors
    /// [`EncodingError::Schema`] if any value's kind differs from the kind the
    /// table was fitted on.
    pub fn transform(&self, values: &[Category]) -> Result<Array2<f64>> {
        let width = self.width();
        let mut out = Array2::zeros((values.len(), width));
        let mut novel = 0usize;

        for (mut row, value) in out.rows_mut().into_iter().zip(values) {
            if !self.contains(value) {
                novel += 1;
            }
            for (cell, v) in row.iter_mut().zip(self.lookup(value)?) {
                *cell = *v;
            }
        }

        if novel > 0 {
            trace!(
                terms = self.terms(),
                novel,
                rows = values.len(),
                "unseen values encoded with the novel level"
            );
        }
        Ok(out)
    }

    /// Encode `values` with a single-valued table.
    pub fn transform_column(&self, values: &[Category]) -> Result<Array1<f64>> {
        if self.width() != 1 {
            return Err(EncodingError::config(format!(
                "transform_column needs a single-valued table, {} has width {}",
                self.terms(),
                self.width()
            )));
        }
        values
            .iter()
            .map(|value| self.lookup(value).map(|v| v[0]))
            .collect::<Result<Vec<f64>>>()
            .map(Array1::from)
    }

    /// Encode the frame column named by the table's terms.
    pub fn transform_frame(&self, frame: &Frame) -> Result<Array2<f64>> {
        let values = frame.categories(self.terms())?;
        self.transform(values)
    }
}

/// Encode `values` with `table`.
pub fn transform(table: &EncodingTable, values: &[Category]) -> Result<Array2<f64>> {
    table.transform(values)
}

/// Encode `values` with a single-valued `table`.
pub fn transform_column(table: &EncodingTable, values: &[Category]) -> Result<Array1<f64>> {
    table.transform_column(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategoryKind;
    use crate::dataset::Column;
    use std::sync::Arc;

    fn table() -> EncodingTable {
        EncodingTable::from_entries(
            "city",
            CategoryKind::Text,
            vec![
                (Category::from("a"), vec![1.0]),
                (Category::from("b"), vec![2.0]),
            ],
            vec![1.5],
        )
        .unwrap()
    }

    #[test]
    fn test_transform_known_and_novel() {
        let values = vec![
            Category::from("b"),
            Category::from("zzz"),
            Category::from("a"),
        ];
        let out = table().transform(&values).unwrap();
        assert_eq!(out.shape(), &[3, 1]);
        assert_eq!(out.column(0).to_vec(), vec![2.0, 1.5, 1.0]);
    }

    #[test]
    fn test_transform_empty() {
        let out = table().transform(&[]).unwrap();
        assert_eq!(out.shape(), &[0, 1]);
    }

    #[test]
    fn test_transform_kind_mismatch() {
        let err = table().transform(&[Category::from(3i64)]).unwrap_err();
        match err {
            EncodingError::Schema { expected, got } => {
                assert_eq!(expected, "text");
                assert_eq!(got, "integer");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_transform_column() {
        let col = transform_single(&table(), &["a", "c"]);
        assert_eq!(col.to_vec(), vec![1.0, 1.5]);
        let free = transform_column(&table(), &[Category::from("b")]).unwrap();
        assert_eq!(free.to_vec(), vec![2.0]);
    }

    fn transform_single(table: &EncodingTable, values: &[&str]) -> Array1<f64> {
        let values: Vec<Category> = values.iter().map(|v| Category::from(*v)).collect();
        table.transform_column(&values).unwrap()
    }

    #[test]
    fn test_transform_column_needs_width_one() {
        let wide = EncodingTable::from_entries(
            "x",
            CategoryKind::Text,
            vec![(Category::from("a"), vec![1.0, 2.0])],
            vec![0.0, 0.0],
        )
        .unwrap();
        assert!(wide.transform_column(&[Category::from("a")]).is_err());

        let out = wide.transform(&[Category::from("q")]).unwrap();
        assert_eq!(out.row(0).to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_transform_frame_uses_terms() {
        let frame = Frame::new()
            .with_column(
                "city",
                Column::Categorical(vec![Category::from("a"), Category::from("new")]),
            )
            .unwrap();
        let out = table().transform_frame(&frame).unwrap();
        assert_eq!(out.column(0).to_vec(), vec![1.0, 1.5]);

        let other = Frame::new()
            .with_column("town", Column::Categorical(vec![Category::from("a")]))
            .unwrap();
        assert!(matches!(
            table().transform_frame(&other),
            Err(EncodingError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_transform_matches_free_function() {
        let values = vec![Category::from("a"), Category::from("x")];
        let t = table();
        assert_eq!(transform(&t, &values).unwrap(), t.transform(&values).unwrap());
    }

    #[test]
    fn test_concurrent_transform() {
        let table = Arc::new(table());
        let values: Vec<Category> = ["a", "b", "c", "a"].iter().map(|v| Category::from(*v)).collect();
        let expected = table.transform(&values).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let table = Arc::clone(&table);
                let values = values.clone();
                std::thread::spawn(move || table.transform(&values).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }
}
