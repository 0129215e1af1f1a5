//! Runtime value types for cell comparison.
//!
//! The [`Value`] enum is a borrowed view of a single cell, as seen by the
//! filter and sort engines. Owned cell storage lives in [`Cell`](crate::Cell).

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;

/// Runtime value of a cell, borrowed from the row that holds it.
///
/// Missing fields, JSON `null` and nested JSON values all read as
/// [`Value::None`].
///
/// # Example
///
/// ```
/// use rowdeck::{Row, Value, Number};
///
/// let row = Row::new().with("name", "Ada").with("age", 36);
/// assert_eq!(row.get("name"), Value::Text("Ada"));
/// assert_eq!(row.get("age"), Value::Number(Number::I64(36)));
/// assert_eq!(row.get("email"), Value::None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    /// Text value (borrowed).
    Text(&'a str),
    /// Numeric value.
    Number(Number),
    /// Calendar date.
    Date(NaiveDate),
    /// Boolean value.
    Bool(bool),
    /// Field not present, null, or not comparable.
    None,
}

impl<'a> Value<'a> {
    /// Returns `true` if this is a `None` value.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Truthiness as the host runtime sees it.
    ///
    /// Empty text, zero, NaN, `false` and missing values are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Text(s) => !s.is_empty(),
            Value::Number(n) => {
                let f = n.to_f64();
                f != 0.0 && !f.is_nan()
            }
            Value::Date(_) => true,
            Value::Bool(b) => *b,
            Value::None => false,
        }
    }

    /// Extracts the text value, if present.
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Coerces the value to a float the way a loose numeric comparison would.
    ///
    /// Text that does not parse yields NaN, so every ordered comparison
    /// against it is false.
    pub fn to_f64(&self) -> f64 {
        match self {
            Value::Number(n) => n.to_f64(),
            Value::Bool(true) => 1.0,
            Value::Bool(false) | Value::None => 0.0,
            Value::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            Value::Date(_) => f64::NAN,
        }
    }

    /// Coerces the value to a date.
    ///
    /// Text is accepted as `YYYY-MM-DD` or as an RFC 3339 timestamp, in which
    /// case only the date part is kept.
    pub fn to_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            Value::Text(s) => parse_date(s),
            _ => None,
        }
    }

    /// Display string of the value, `None` for missing values.
    pub fn display(&self) -> Option<String> {
        match self {
            Value::None => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Bool(b) => write!(f, "{}", b),
            Value::None => Ok(()),
        }
    }
}

/// Parses a date from `YYYY-MM-DD` or an RFC 3339 timestamp.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| s.get(..10).and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()))
}

/// Numeric value supporting all common numeric types.
///
/// Numbers are stored in one of three variants to preserve precision:
/// - `I64` for signed integers
/// - `U64` for unsigned integers
/// - `F64` for floating point
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 64-bit floating point.
    F64(f64),
}

impl Number {
    /// Converts the number to f64 for comparison.
    pub fn to_f64(self) -> f64 {
        match self {
            Number::I64(n) => n as f64,
            Number::U64(n) => n as f64,
            Number::F64(n) => n,
        }
    }

    /// Total ordering between two numbers, handling mixed types.
    ///
    /// Floats use IEEE total ordering, so NaN sorts after every other number.
    pub fn compare(self, other: Number) -> Ordering {
        match (self, other) {
            (Number::I64(a), Number::I64(b)) => a.cmp(&b),
            (Number::U64(a), Number::U64(b)) => a.cmp(&b),
            (Number::I64(a), Number::U64(b)) => (a as i128).cmp(&(b as i128)),
            (Number::U64(a), Number::I64(b)) => (a as i128).cmp(&(b as i128)),
            _ => self.to_f64().total_cmp(&other.to_f64()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::I64(n) => write!(f, "{}", n),
            Number::U64(n) => write!(f, "{}", n),
            // Integral floats print without a fraction, like the host runtime does.
            Number::F64(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            Number::F64(n) => write!(f, "{}", n),
        }
    }
}

impl From<i32> for Number {
    fn from(n: i32) -> Self {
        Number::I64(n as i64)
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::I64(n)
    }
}

impl From<u64> for Number {
    fn from(n: u64) -> Self {
        Number::U64(n)
    }
}

impl From<f64> for Number {
    fn from(n: f64) -> Self {
        Number::F64(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(Value::Text("x").is_truthy());
        assert!(!Value::Text("").is_truthy());
        assert!(!Value::Number(Number::I64(0)).is_truthy());
        assert!(!Value::Number(Number::F64(f64::NAN)).is_truthy());
        assert!(Value::Number(Number::F64(0.5)).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::None.is_truthy());
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(Value::None.to_f64(), 0.0);
        assert_eq!(Value::Text(" 12.5 ").to_f64(), 12.5);
        assert!(Value::Text("abc").to_f64().is_nan());
        assert_eq!(Value::Bool(true).to_f64(), 1.0);
    }

    #[test]
    fn date_coercion() {
        let d = NaiveDate::from_ymd_opt(2021, 3, 4).unwrap();
        assert_eq!(Value::Text("2021-03-04").to_date(), Some(d));
        assert_eq!(Value::Text("2021-03-04T10:00:00Z").to_date(), Some(d));
        assert_eq!(Value::Text("yesterday").to_date(), None);
        assert_eq!(Value::None.to_date(), None);
    }

    #[test]
    fn display_strings() {
        assert_eq!(Value::Number(Number::F64(3.0)).to_string(), "3");
        assert_eq!(Value::Number(Number::F64(3.25)).to_string(), "3.25");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::None.display(), None);
    }

    #[test]
    fn number_comparisons_mixed_types() {
        assert_eq!(Number::I64(5).compare(Number::U64(10)), Ordering::Less);
        assert_eq!(Number::I64(-1).compare(Number::U64(0)), Ordering::Less);
        assert_eq!(Number::I64(5).compare(Number::F64(5.0)), Ordering::Equal);
        assert_eq!(Number::U64(10).compare(Number::F64(5.5)), Ordering::Greater);
    }

    #[test]
    fn number_nan_sorts_last() {
        assert_eq!(
            Number::F64(f64::NAN).compare(Number::F64(1.0)),
            Ordering::Greater
        );
    }
}
