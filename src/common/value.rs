use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

use crate::error::{SeriesError, SeriesResult};

/// A dynamically typed measurement value.
///
/// Step functions route values through storage, merging and histograms
/// without interpreting them; only the arithmetic reductions require a
/// numeric variant. `Null` is the "undefined" element: aggregations either
/// skip it or propagate it, depending on the reducer flavor.
///
/// Numeric comparison is normalized across `Bool`, `Int` and `Float`, so
/// `Value::from(1) == Value::from(1.0)` and both order the same way.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness: `Null`, zero, the empty string and the empty list are
    /// false, everything else is true. NaN is true, since it is nonzero.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(l) => !l.is_empty(),
        }
    }

    /// Integer view of the numeric variants, when exact.
    fn as_int(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(*b as i64),
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view. `Bool` counts as 0/1 so boolean series can be
    /// averaged; `Null` and the structured variants have no numeric view.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(*b as i64 as f64),
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
        }
    }

    fn binary_numeric(
        &self,
        other: &Value,
        op_name: &str,
        int_op: impl Fn(i64, i64) -> Option<i64>,
        float_op: impl Fn(f64, f64) -> f64,
    ) -> SeriesResult<Value> {
        if let (Some(a), Some(b)) = (self.as_int(), other.as_int()) {
            return int_op(a, b)
                .map(Value::Int)
                .ok_or_else(|| SeriesError::bad_argument(format!("integer overflow in {op_name}")));
        }
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Float(float_op(a, b))),
            _ => Err(SeriesError::bad_argument(format!(
                "can't {op_name} {} and {}",
                self.type_name(),
                other.type_name()
            ))),
        }
    }

    /// Checked addition; numeric variants only.
    pub fn add(&self, other: &Value) -> SeriesResult<Value> {
        self.binary_numeric(other, "add", i64::checked_add, |a, b| a + b)
    }

    /// Checked subtraction; numeric variants only.
    pub fn sub(&self, other: &Value) -> SeriesResult<Value> {
        self.binary_numeric(other, "subtract", i64::checked_sub, |a, b| a - b)
    }

    /// Checked multiplication; numeric variants only.
    pub fn mul(&self, other: &Value) -> SeriesResult<Value> {
        self.binary_numeric(other, "multiply", i64::checked_mul, |a, b| a * b)
    }

    /// Total order across values of a single kind, with `Null` ordered
    /// before everything and the numeric variants normalized. Values of
    /// incompatible kinds fail with `UnorderableElements`.
    pub fn total_cmp(&self, other: &Value) -> SeriesResult<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Ok(Ordering::Equal),
            (Value::Null, _) => Ok(Ordering::Less),
            (_, Value::Null) => Ok(Ordering::Greater),
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.total_cmp(y)? {
                        Ordering::Equal => continue,
                        unequal => return Ok(unequal),
                    }
                }
                Ok(a.len().cmp(&b.len()))
            }
            _ => match (self.as_int(), other.as_int()) {
                (Some(a), Some(b)) => Ok(a.cmp(&b)),
                _ => match (self.as_f64(), other.as_f64()) {
                    (Some(a), Some(b)) => Ok(a.total_cmp(&b)),
                    _ => Err(SeriesError::UnorderableElements(format!(
                        "{} and {}",
                        self.type_name(),
                        other.type_name()
                    ))),
                },
            },
        }
    }

    /// A stable 64-bit hash, consistent with equality: values that compare
    /// equal hash alike, including across numeric variants. Used by the
    /// histogram's hash-keyed ordering fallback.
    pub fn stable_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        self.feed(&mut hasher);
        hasher.digest()
    }

    fn feed(&self, hasher: &mut Xxh3) {
        match self {
            Value::Null => hasher.update(&[0u8]),
            Value::Bool(_) | Value::Int(_) | Value::Float(_) => {
                // canonical numeric encoding: exact integers hash as i64
                // so that 1, 1.0 and true collide the way they compare
                if let Some(i) = self.as_int() {
                    hasher.update(&[1u8]);
                    hasher.update(&i.to_le_bytes());
                } else {
                    let f = self.as_f64().unwrap_or(f64::NAN);
                    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                        hasher.update(&[1u8]);
                        hasher.update(&(f as i64).to_le_bytes());
                    } else {
                        hasher.update(&[2u8]);
                        hasher.update(&f.to_bits().to_le_bytes());
                    }
                }
            }
            Value::Str(s) => {
                hasher.update(&[3u8]);
                hasher.update(s.as_bytes());
            }
            Value::List(l) => {
                hasher.update(&[4u8]);
                hasher.update(&(l.len() as u64).to_le_bytes());
                for item in l {
                    item.feed(hasher);
                }
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            _ => match (self.as_int(), other.as_int()) {
                (Some(a), Some(b)) => a == b,
                _ => match (self.as_f64(), other.as_f64()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                },
            },
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.total_cmp(other).ok()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(l) => {
                write!(f, "[")?;
                for (i, item) in l.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(l: Vec<Value>) -> Self {
        Value::List(l)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
