use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::common::{Interpolation, TimePoint, Value};
use crate::error::{SeriesError, SeriesResult};
use crate::series::periods::{PeriodFilter, PeriodIter};
use crate::storage::SortedMap;

/// A time series built from measurements at unevenly-spaced times,
/// interpreted as a right-continuous step function: the value at any
/// query time is the most recent measurement at or before it, and
/// `default` extends back before the first measurement.
///
/// ```
/// use steptrace::{TimeSeries, Value};
///
/// let mut ts = TimeSeries::new(Value::Null);
/// ts.set(8.0, Value::from(0), false);
/// ts.set(8.75, Value::from(1), false);
/// ts.set(9.5, Value::from(0), false);
/// assert_eq!(ts.get(8.5), &Value::from(0));
/// assert_eq!(ts.get(9.0), &Value::from(1));
/// ```
///
/// The time axis is anything implementing [`TimePoint`]; values default
/// to the dynamic [`Value`] but any `Clone + PartialEq` type works, and
/// boolean series double as masks for the aggregation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries<T, V = Value> {
    points: SortedMap<T, V>,
    default: V,
}

impl<T, V> TimeSeries<T, V>
where
    T: TimePoint,
    V: Clone + PartialEq + Debug,
{
    pub fn new(default: V) -> Self {
        Self {
            points: SortedMap::new(),
            default,
        }
    }

    /// Build from `(time, value)` pairs in any order; duplicate times
    /// resolve to the last pair seen.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (T, V)>, default: V) -> Self {
        Self {
            points: SortedMap::from_pairs(pairs),
            default,
        }
    }

    pub fn default_value(&self) -> &V {
        &self.default
    }

    pub fn set_default(&mut self, default: V) {
        self.default = default;
    }

    pub fn n_measurements(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The value at `time`: the measurement at the greatest stored key at
    /// or before it, or the default when `time` precedes every key.
    pub fn get(&self, time: T) -> &V {
        let right = self.points.bisect_right(&time);
        match right {
            0 => &self.default,
            _ => self.points.item_at(right - 1).map(|(_, v)| v).unwrap_or(&self.default),
        }
    }

    pub fn contains_time(&self, time: T) -> bool {
        self.points.contains(&time)
    }

    /// Record a measurement. With `compact`, the write is skipped when the
    /// series already evaluates to `value` at `time`.
    pub fn set(&mut self, time: T, value: V, compact: bool) {
        if !compact || self.is_empty() || *self.get(time) != value {
            self.points.insert(time, value);
        }
    }

    /// Overwrite the function on `[start, end)` with a constant, leaving
    /// it untouched elsewhere: the value previously in effect at `end` is
    /// re-anchored there.
    pub fn set_interval(&mut self, start: T, end: T, value: V, compact: bool) -> SeriesResult<()> {
        if start.cmp_points(&end) != std::cmp::Ordering::Less {
            return Err(SeriesError::bad_argument(format!(
                "start of interval must be before end, got {start:?} >= {end:?}"
            )));
        }
        let end_value = self.get(end).clone();
        self.points.delete_range(&start, &end, false, false);
        self.set(start, value, compact);
        self.set(end, end_value, compact);
        Ok(())
    }

    /// Remove the measurement stored exactly at `time`.
    pub fn remove(&mut self, time: T) -> SeriesResult<V> {
        self.points
            .remove(&time)
            .ok_or_else(|| SeriesError::no_key_at(&time))
    }

    /// Remove every measurement with `start <= t < end`; succeeds even
    /// when no keys lie in the interval. Returns the number removed.
    pub fn remove_interval(&mut self, start: T, end: T) -> SeriesResult<usize> {
        if start.cmp_points(&end) != std::cmp::Ordering::Less {
            return Err(SeriesError::bad_argument(format!(
                "start of interval must be before end, got {start:?} >= {end:?}"
            )));
        }
        Ok(self.points.delete_range(&start, &end, true, false))
    }

    /// Drop every measurement whose value equals its predecessor's. The
    /// function is unchanged at all times afterwards.
    pub fn compact(&mut self) {
        self.points.dedup_adjacent(|a, b| a == b);
    }

    pub fn items(&self) -> impl Iterator<Item = (&T, &V)> + '_ {
        self.points.iter()
    }

    /// Adjacent measurement pairs, in time order.
    pub fn iter_intervals(&self) -> impl Iterator<Item = ((&T, &V), (&T, &V))> + '_ {
        self.points.iter().zip(self.points.iter().skip(1))
    }

    pub fn first_item(&self) -> Option<(&T, &V)> {
        self.points.first()
    }

    pub fn last_item(&self) -> Option<(&T, &V)> {
        self.points.last()
    }

    pub fn item_at(&self, index: usize) -> Option<(&T, &V)> {
        self.points.item_at(index)
    }

    pub fn first_key(&self) -> Option<T> {
        self.points.first().map(|(t, _)| *t)
    }

    pub fn last_key(&self) -> Option<T> {
        self.points.last().map(|(t, _)| *t)
    }

    pub fn first_value(&self) -> Option<&V> {
        self.points.first().map(|(_, v)| v)
    }

    pub fn last_value(&self) -> Option<&V> {
        self.points.last().map(|(_, v)| v)
    }

    /// Resolve an optional window against the inhabited range: absent
    /// endpoints default to the first/last measurement time.
    pub(crate) fn resolve_window(&self, start: Option<T>, end: Option<T>) -> SeriesResult<(T, T)> {
        let start = start
            .or_else(|| self.first_key())
            .ok_or(SeriesError::UndefinedWindow)?;
        let end = end
            .or_else(|| self.last_key())
            .ok_or(SeriesError::UndefinedWindow)?;
        if start.cmp_points(&end) != std::cmp::Ordering::Less {
            return Err(SeriesError::bad_argument(format!(
                "start can't be at or after end ({start:?} >= {end:?})"
            )));
        }
        Ok((start, end))
    }

    /// Iterate the constant-value periods of the function over
    /// `[start, end)`, as contiguous `(t0, t1, value)` tuples. Absent
    /// bounds default to the first/last measurement time; explicit bounds
    /// may extend outside the inhabited range.
    pub fn iter_periods(
        &self,
        start: Option<T>,
        end: Option<T>,
    ) -> SeriesResult<PeriodIter<'_, T, V>> {
        self.iter_periods_filtered(start, end, PeriodFilter::All)
    }

    /// Like [`iter_periods`](Self::iter_periods), emitting only periods
    /// accepted by the filter.
    pub fn iter_periods_filtered<'a>(
        &'a self,
        start: Option<T>,
        end: Option<T>,
        filter: PeriodFilter<'a, T, V>,
    ) -> SeriesResult<PeriodIter<'a, T, V>> {
        let (start, end) = self.resolve_window(start, end)?;
        Ok(PeriodIter::new(self, start, end, filter))
    }

    /// A new series reproducing the function on `[start, end]`, anchored
    /// by explicit measurements at both endpoints.
    pub fn slice(&self, start: T, end: T) -> SeriesResult<Self> {
        if start.cmp_points(&end) != std::cmp::Ordering::Less {
            return Err(SeriesError::bad_argument(format!(
                "start can't be at or after end ({start:?} >= {end:?})"
            )));
        }
        let mut result = TimeSeries::new(self.default.clone());
        result.set(start, self.get(start).clone(), false);
        for (t, v) in self.points.range(&start, &end, false, false) {
            result.set(*t, v.clone(), false);
        }
        result.set(end, self.get(end).clone(), false);
        Ok(result)
    }

    pub(crate) fn points(&self) -> &SortedMap<T, V> {
        &self.points
    }
}

impl<T: TimePoint, V: Clone + PartialEq + Debug + Default> Default for TimeSeries<T, V> {
    fn default() -> Self {
        Self::new(V::default())
    }
}

impl<T: TimePoint> TimeSeries<T, Value> {
    /// Read the series at `time` with the given interpolation. `Linear`
    /// joins the two measurements around `time` and requires numeric
    /// values; before the first measurement it returns the default, and
    /// at or after the last it returns the last value.
    pub fn get_interpolated(&self, time: T, interpolation: Interpolation) -> SeriesResult<Value> {
        match interpolation {
            Interpolation::Previous => Ok(self.get(time).clone()),
            Interpolation::Linear => self.get_linear(time),
        }
    }

    fn get_linear(&self, time: T) -> SeriesResult<Value> {
        let right = self.points.bisect_right(&time);
        if right == 0 {
            return Ok(self.default.clone());
        }
        let (left_time, left_value) = match self.points.item_at(right - 1) {
            Some(item) => item,
            None => return Ok(self.default.clone()),
        };
        let (right_time, right_value) = match self.points.item_at(right) {
            // at or past the last measurement
            None => return Ok(left_value.clone()),
            Some(item) => item,
        };
        let (y0, y1) = match (left_value.as_f64(), right_value.as_f64()) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                return Err(SeriesError::bad_argument(format!(
                    "can't interpolate between {} and {}",
                    left_value.type_name(),
                    right_value.type_name()
                )))
            }
        };
        let frac = T::fraction(*left_time, *right_time, time);
        Ok(Value::Float(y0 + (y1 - y0) * frac))
    }
}
