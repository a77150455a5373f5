//! Category values and encoding-table keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single value of a categorical column.
///
/// Text, integer and boolean columns are all supported; a fitted table
/// remembers which [`CategoryKind`] it was trained on and rejects values of
/// another kind at transform time.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Text(String),
    Integer(i64),
    Boolean(bool),
}

/// The type of values held by a categorical column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryKind {
    Text,
    Integer,
    Boolean,
}

impl Category {
    pub fn kind(&self) -> CategoryKind {
        match self {
            Category::Text(_) => CategoryKind::Text,
            Category::Integer(_) => CategoryKind::Integer,
            Category::Boolean(_) => CategoryKind::Boolean,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Text(s) => write!(f, "{}", s),
            Category::Integer(i) => write!(f, "{}", i),
            Category::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CategoryKind::Text => "text",
            CategoryKind::Integer => "integer",
            CategoryKind::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Category::Text(value.to_string())
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Category::Text(value)
    }
}

impl From<i64> for Category {
    fn from(value: i64) -> Self {
        Category::Integer(value)
    }
}

impl From<bool> for Category {
    fn from(value: bool) -> Self {
        Category::Boolean(value)
    }
}

/// Key of an encoding-table entry.
///
/// `Novel` is the slot used for every category that was absent from the
/// training data. It is a distinct variant rather than a reserved string, so
/// a real category named like a marker (`"..new"`, `"<novel>"`) is just
/// another `Known` level.
///
/// Ordering places all known levels first, in category order, and the novel
/// slot last.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    Known(Category),
    Novel,
}

impl Level {
    pub fn is_novel(&self) -> bool {
        matches!(self, Level::Novel)
    }

    pub fn category(&self) -> Option<&Category> {
        match self {
            Level::Known(c) => Some(c),
            Level::Novel => None,
        }
    }
}

impl From<Category> for Level {
    fn from(category: Category) -> Self {
        Level::Known(category)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Known(c) => write!(f, "{}", c),
            Level::Novel => f.write_str("..new"),
        }
    }
}
