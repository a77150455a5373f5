//! CSV input.
//!
//! Columns listed as categorical are read as text. Every other column is
//! numeric when each non-empty field parses as a number (empty fields become
//! `NaN`), and categorical text otherwise.

use super::frame::{Column, Frame};
use crate::category::Category;
use crate::error::{EncodingError, Result};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Read a frame from a CSV file with a header row.
pub fn from_csv_path<P: AsRef<Path>>(path: P, categorical: &[&str]) -> Result<Frame> {
    let file = File::open(path.as_ref())?;
    debug!(path = %path.as_ref().display(), "reading csv");
    from_csv_reader(BufReader::new(file), categorical)
}

/// Read a frame from any CSV source with a header row.
pub fn from_csv_reader<R: Read>(reader: R, categorical: &[&str]) -> Result<Frame> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

    if let Some(missing) = categorical
        .iter()
        .find(|name| !headers.iter().any(|h| h == *name))
    {
        return Err(EncodingError::MissingColumn(missing.to_string()));
    }

    let mut fields: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for result in rdr.records() {
        let record = result?;
        for (column, field) in fields.iter_mut().zip(record.iter()) {
            column.push(field.to_string());
        }
    }

    let mut frame = Frame::new();
    for (name, raw) in headers.into_iter().zip(fields) {
        let column = if categorical.contains(&name.as_str()) {
            text_column(raw)
        } else {
            match numeric_column(&raw) {
                Some(values) => Column::Numeric(values),
                None => text_column(raw),
            }
        };
        frame = frame.with_column(name, column)?;
    }

    debug!(
        rows = frame.n_rows(),
        columns = frame.n_columns(),
        "loaded csv frame"
    );
    Ok(frame)
}

fn text_column(raw: Vec<String>) -> Column {
    Column::Categorical(raw.into_iter().map(Category::Text).collect())
}

fn numeric_column(raw: &[String]) -> Option<Vec<f64>> {
    raw.iter()
        .map(|field| {
            if field.is_empty() {
                Some(f64::NAN)
            } else {
                field.parse::<f64>().ok()
            }
        })
        .collect()
}
