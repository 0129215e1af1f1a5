//! Sort direction and the row sort engine.
//!
//! Sorting is a stable total order over the whole row set. Missing values
//! sort first when ascending and last when descending; defined values of
//! different types are ranked by type so the order stays total.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::row::Row;
use crate::value::Value;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dir {
    /// Ascending order (smallest first).
    Asc,
    /// Descending order (largest first).
    #[default]
    Desc,
}

impl Dir {
    /// Applies this direction to an ordering.
    ///
    /// For `Asc`, returns the ordering unchanged.
    /// For `Desc`, reverses the ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Dir::Asc => ordering,
            Dir::Desc => ordering.reverse(),
        }
    }

    /// Returns the display name of this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Asc => "asc",
            Dir::Desc => "desc",
        }
    }
}

impl fmt::Display for Dir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Dir {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Dir::Asc),
            "desc" => Ok(Dir::Desc),
            other => Err(format!("unknown sort direction '{}'", other)),
        }
    }
}

/// The active sort: a field and a direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    /// The field to sort by.
    pub field: String,
    /// The sort direction.
    pub dir: Dir,
}

impl SortSpec {
    /// Creates a sort with the given direction.
    pub fn new(field: impl Into<String>, dir: Dir) -> Self {
        SortSpec {
            field: field.into(),
            dir,
        }
    }

    /// Creates an ascending sort.
    pub fn asc(field: impl Into<String>) -> Self {
        SortSpec::new(field, Dir::Asc)
    }

    /// Creates a descending sort.
    pub fn desc(field: impl Into<String>) -> Self {
        SortSpec::new(field, Dir::Desc)
    }

    /// Compares two rows under this sort.
    pub fn compare(&self, a: &Row, b: &Row) -> Ordering {
        compare_directed(&a.get(&self.field), &b.get(&self.field), self.dir)
    }
}

/// Compares two values with missing-value placement for the direction.
pub fn compare_directed(a: &Value<'_>, b: &Value<'_>, dir: Dir) -> Ordering {
    match (a.is_none(), b.is_none()) {
        (true, true) => Ordering::Equal,
        // Missing values lead an ascending sort and trail a descending one.
        (true, false) => dir.apply(Ordering::Less),
        (false, true) => dir.apply(Ordering::Greater),
        (false, false) => dir.apply(compare_values(a, b)),
    }
}

/// Compares two defined values.
///
/// Values of the same type use their natural order. Mixed types are ranked
/// `Bool < Number < Date < Text`.
pub fn compare_values(a: &Value<'_>, b: &Value<'_>) -> Ordering {
    match (a, b) {
        (Value::Text(a), Value::Text(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => a.compare(*b),
        (Value::Date(a), Value::Date(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(value: &Value<'_>) -> u8 {
    match value {
        Value::None => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::Date(_) => 3,
        Value::Text(_) => 4,
    }
}

/// Sorts rows in place. Ties keep their relative order.
pub fn sort_rows(rows: &mut [Row], sort: &SortSpec) {
    rows.sort_by(|a, b| sort.compare(a, b));
}
