//! Pointwise and n-ary operations over dynamically-typed series.
//!
//! Binary operations route through the merge engine, so the result's keys
//! are the union of the input keys and its default is the operation
//! applied to the input defaults. Arithmetic is checked: an unsupported
//! value combination surfaces as `BadArgument`.

use crate::common::{TimePoint, Value};
use crate::error::SeriesResult;
use crate::merge::merge_with;
use crate::series::TimeSeries;

/// Wrap a reducer so that `Null` entries are skipped before it runs: the
/// "ignorant" flavor, where undefined inputs act as the identity.
pub fn ignorant<F>(mut f: F) -> impl FnMut(&[Value]) -> SeriesResult<Value>
where
    F: FnMut(&[Value]) -> SeriesResult<Value>,
{
    move |state| {
        let defined: Vec<Value> = state.iter().filter(|v| !v.is_null()).cloned().collect();
        f(&defined)
    }
}

/// Wrap a reducer so that any `Null` input makes the result `Null`: the
/// "strict" flavor, where undefined contaminates.
pub fn strict<F>(mut f: F) -> impl FnMut(&[Value]) -> SeriesResult<Value>
where
    F: FnMut(&[Value]) -> SeriesResult<Value>,
{
    move |state| {
        if state.iter().any(Value::is_null) {
            Ok(Value::Null)
        } else {
            f(state)
        }
    }
}

/// Checked numeric sum of a state vector; the empty vector sums to 0.
pub fn sum_values(state: &[Value]) -> SeriesResult<Value> {
    state.iter().try_fold(Value::Int(0), |acc, v| acc.add(v))
}

impl<T: TimePoint> TimeSeries<T, Value> {
    /// Elementwise operation with another series: the result's keys are
    /// the union of both key sets, and at each key the value is
    /// `f(self.get(k), other.get(k))`.
    pub fn operation<F>(&self, other: &Self, mut f: F) -> SeriesResult<Self>
    where
        F: FnMut(&Value, &Value) -> SeriesResult<Value>,
    {
        merge_with(&[self, other], false, |state| f(&state[0], &state[1]))
    }

    /// Elementwise operation against a constant: keys are unchanged.
    pub fn operation_scalar<F>(&self, other: &Value, mut f: F) -> SeriesResult<Self>
    where
        F: FnMut(&Value, &Value) -> SeriesResult<Value>,
    {
        let mut result = TimeSeries::new(f(self.default_value(), other)?);
        for (t, v) in self.items() {
            let mapped = f(v, other)?;
            result.set(*t, mapped, false);
        }
        Ok(result)
    }

    /// `sum(t) = self(t) + other(t)`, skipping undefined inputs.
    pub fn sum(&self, other: &Self) -> SeriesResult<Self> {
        Self::sum_many(&[self, other])
    }

    /// Null-ignorant sum of many series via the merge engine; a state
    /// with every input undefined sums to 0.
    pub fn sum_many(series_list: &[&Self]) -> SeriesResult<Self> {
        merge_with(series_list, true, ignorant(sum_values))
    }

    /// `difference(t) = self(t) - other(t)`; undefined inputs are an
    /// error, matching checked subtraction.
    pub fn difference(&self, other: &Self) -> SeriesResult<Self> {
        self.operation(other, |a, b| a.sub(b))
    }

    /// `multiply(t) = self(t) * other(t)`.
    pub fn multiply(&self, other: &Self) -> SeriesResult<Self> {
        self.operation(other, |a, b| a.mul(b))
    }

    pub fn multiply_scalar(&self, other: &Value) -> SeriesResult<Self> {
        self.operation_scalar(other, |a, b| a.mul(b))
    }

    /// Truthy conjunction, as a bool series.
    pub fn logical_and(&self, other: &Self) -> Self {
        self.truthy_zip(other, |a, b| a && b)
    }

    /// Truthy disjunction, as a bool series.
    pub fn logical_or(&self, other: &Self) -> Self {
        self.truthy_zip(other, |a, b| a || b)
    }

    /// Truthy exclusive-or, as a bool series.
    pub fn logical_xor(&self, other: &Self) -> Self {
        self.truthy_zip(other, |a, b| a ^ b)
    }

    fn truthy_zip(&self, other: &Self, f: impl Fn(bool, bool) -> bool) -> Self {
        crate::merge::merge(&[self, other], false, |state| {
            Value::Bool(f(state[0].truthy(), state[1].truthy()))
        })
    }

    /// Project every value to its truth value. `Null` stays `Null`.
    pub fn to_bool(&self, invert: bool) -> Self {
        self.to_bool_or(invert, Value::Null)
    }

    /// Like [`to_bool`](Self::to_bool), replacing `Null` values with the
    /// given substitute before projecting.
    pub fn to_bool_or(&self, invert: bool, null_replacement: Value) -> Self {
        let project = |v: &Value| -> Value {
            let v = if v.is_null() { &null_replacement } else { v };
            if v.is_null() {
                Value::Null
            } else {
                Value::Bool(v.truthy() != invert)
            }
        };
        let mut result = TimeSeries::new(project(self.default_value()));
        for (t, v) in self.items() {
            let projected = project(v);
            result.set(*t, projected, false);
        }
        result
    }

    /// Compare every value to a constant, yielding a bool series: strictly
    /// greater by default, at-or-above with `inclusive`.
    pub fn threshold(&self, value: &Value, inclusive: bool) -> SeriesResult<Self> {
        self.operation_scalar(value, |v, threshold| {
            let ordering = v.total_cmp(threshold)?;
            let above = if inclusive {
                ordering != std::cmp::Ordering::Less
            } else {
                ordering == std::cmp::Ordering::Greater
            };
            Ok(Value::Bool(above))
        })
    }
}
