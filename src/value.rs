use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, NaiveDateTime, TimeDelta};

/// Render format for date values in reports.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single typed cell or statistic.
///
/// Values are totally ordered (floats by IEEE total order with the two
/// zeros equal, variants by declaration order) and hashable, so they can
/// key frequency tables and break ties deterministically.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Date(NaiveDateTime),
    Duration(TimeDelta),
    Text(String),
}

impl Value {
    fn variant_index(&self) -> u8 {
        match self {
            Value::Integer(_) => 0,
            Value::Float(_) => 1,
            Value::Date(_) => 2,
            Value::Duration(_) => 3,
            Value::Text(_) => 4,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// A date from microseconds since the Unix epoch.
    pub fn from_timestamp_micros(micros: i64) -> Option<Value> {
        DateTime::from_timestamp_micros(micros).map(|dt| Value::Date(dt.naive_utc()))
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            // 0.0 and -0.0 are one value
            (Value::Float(a), Value::Float(b)) if a == b => Ordering::Equal,
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Duration(a), Value::Duration(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => self.variant_index().cmp(&other.variant_index()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.variant_index().hash(state);
        match self {
            Value::Integer(v) => v.hash(state),
            // adding 0.0 folds -0.0 into 0.0
            Value::Float(v) => (v + 0.0).to_bits().hash(state),
            Value::Date(v) => v.hash(state),
            Value::Duration(v) => v.hash(state),
            Value::Text(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Date(v) => write!(f, "{}", v.format(DATE_FORMAT)),
            Value::Duration(v) => {
                let seconds = v.num_seconds();
                let (days, rest) = (seconds / 86_400, seconds % 86_400);
                write!(
                    f,
                    "{} days {:02}:{:02}:{:02}",
                    days,
                    rest / 3_600,
                    (rest % 3_600) / 60,
                    rest % 60
                )
            }
            Value::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Date(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}
