use crate::aggregate::{Observation, Outcome};
use crate::category::Category;
use crate::config::ColumnRoles;
use crate::error::{EncodingError, Result};

/// A single named column.
#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    Categorical(Vec<Category>),
    /// `NaN` marks a missing value.
    Numeric(Vec<f64>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Categorical(v) => v.len(),
            Column::Numeric(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn type_name(&self) -> &'static str {
        match self {
            Column::Categorical(_) => "categorical",
            Column::Numeric(_) => "numeric",
        }
    }

    fn outcome(&self, row: usize) -> Outcome {
        match self {
            Column::Numeric(v) => Outcome::Numeric(v[row]),
            Column::Categorical(v) => match &v[row] {
                Category::Text(s) if s.is_empty() => Outcome::Missing,
                other => Outcome::Class(other.to_string()),
            },
        }
    }
}

/// Named columns of equal length, in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    columns: Vec<(String, Column)>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column, replacing any column of the same name.
    ///
    /// # Errors
    /// [`EncodingError::LengthMismatch`] if the frame already has rows and
    /// `column` has a different length.
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Result<Self> {
        let name = name.into();
        if let Some((_, first)) = self.columns.iter().find(|(n, _)| n != &name) {
            if first.len() != column.len() {
                return Err(EncodingError::LengthMismatch {
                    column: name,
                    expected: first.len(),
                    got: column.len(),
                });
            }
        }
        match self.columns.iter_mut().find(|(n, _)| n == &name) {
            Some((_, existing)) => *existing = column,
            None => self.columns.push((name, column)),
        }
        Ok(self)
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map(|(_, c)| c.len()).unwrap_or(0)
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
            .ok_or_else(|| EncodingError::MissingColumn(name.to_string()))
    }

    /// Values of a categorical column.
    pub fn categories(&self, name: &str) -> Result<&[Category]> {
        match self.column(name)? {
            Column::Categorical(values) => Ok(values),
            other => Err(EncodingError::ColumnType {
                column: name.to_string(),
                expected: "categorical".to_string(),
                got: other.type_name().to_string(),
            }),
        }
    }

    /// Values of a numeric column.
    pub fn numbers(&self, name: &str) -> Result<&[f64]> {
        match self.column(name)? {
            Column::Numeric(values) => Ok(values),
            other => Err(EncodingError::ColumnType {
                column: name.to_string(),
                expected: "numeric".to_string(),
                got: other.type_name().to_string(),
            }),
        }
    }

    /// Resolve column roles into training observations.
    ///
    /// A numeric outcome column yields numeric outcomes (`NaN` is missing); a
    /// categorical one yields class outcomes (empty text is missing). The
    /// weight column, when configured, must be numeric.
    pub fn observations(&self, roles: &ColumnRoles) -> Result<Vec<Observation>> {
        let predictor = self.categories(&roles.predictor)?;
        let outcome = self.column(&roles.outcome)?;
        let weights = match &roles.weight {
            Some(name) => Some(self.numbers(name)?),
            None => None,
        };

        Ok(predictor
            .iter()
            .enumerate()
            .map(|(row, category)| Observation {
                category: category.clone(),
                outcome: outcome.outcome(row),
                weight: weights.map(|w| w[row]).unwrap_or(1.0),
            })
            .collect())
    }
}
