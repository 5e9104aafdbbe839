use std::fmt::Debug;

use crate::common::TimePoint;
use crate::series::TimeSeries;

/// Restricts which periods an iteration yields.
pub enum PeriodFilter<'a, T, V> {
    /// Every period.
    All,
    /// Only periods whose value equals the given one.
    Value(V),
    /// Only periods accepted by the predicate on `(t0, t1, value)`.
    Where(Box<dyn Fn(T, T, &V) -> bool + 'a>),
}

impl<T, V: PartialEq> PeriodFilter<'_, T, V> {
    fn accepts(&self, t0: T, t1: T, value: &V) -> bool
    where
        T: Copy,
    {
        match self {
            PeriodFilter::All => true,
            PeriodFilter::Value(wanted) => value == wanted,
            PeriodFilter::Where(pred) => pred(t0, t1, value),
        }
    }
}

/// Lazy traversal of the constant-value periods of a step function over
/// a window `[start, end)`.
///
/// Successive periods are contiguous and non-empty: the first starts
/// exactly at `start`, each next one starts where the previous ended, and
/// the last ends exactly at `end`. The cost is one bisect up front and
/// O(1) per period after that.
pub struct PeriodIter<'a, T, V> {
    boundary_keys: &'a [T],
    boundary_values: &'a [V],
    idx: usize,
    current_start: T,
    current_value: &'a V,
    end: T,
    filter: PeriodFilter<'a, T, V>,
    done: bool,
}

impl<'a, T, V> PeriodIter<'a, T, V>
where
    T: TimePoint,
    V: Clone + PartialEq + Debug,
{
    pub(crate) fn new(
        series: &'a TimeSeries<T, V>,
        start: T,
        end: T,
        filter: PeriodFilter<'a, T, V>,
    ) -> Self {
        let points = series.points();
        // transitions strictly inside (start, end); the value in effect
        // at `start` opens the first period
        let first = points.bisect_right(&start);
        let last = points.bisect_left(&end).max(first);
        let current_value = match first {
            0 => series.default_value(),
            _ => points
                .item_at(first - 1)
                .map(|(_, v)| v)
                .unwrap_or_else(|| series.default_value()),
        };
        Self {
            boundary_keys: &points.keys()[first..last],
            boundary_values: &points.values()[first..last],
            idx: 0,
            current_start: start,
            current_value,
            end,
            filter,
            done: false,
        }
    }
}

impl<'a, T, V> Iterator for PeriodIter<'a, T, V>
where
    T: TimePoint,
    V: Clone + PartialEq + Debug,
{
    type Item = (T, T, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if self.idx < self.boundary_keys.len() {
                let t0 = self.current_start;
                let t1 = self.boundary_keys[self.idx];
                let value = self.current_value;
                self.current_start = t1;
                self.current_value = &self.boundary_values[self.idx];
                self.idx += 1;
                if self.filter.accepts(t0, t1, value) {
                    return Some((t0, t1, value));
                }
            } else {
                self.done = true;
                let t0 = self.current_start;
                let value = self.current_value;
                if self.filter.accepts(t0, self.end, value) {
                    return Some((t0, self.end, value));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Value;
    use crate::error::SeriesError;

    fn collect(iter: PeriodIter<'_, i64, Value>) -> Vec<(i64, i64, Value)> {
        iter.map(|(t0, t1, v)| (t0, t1, v.clone())).collect()
    }

    fn sample() -> TimeSeries<i64> {
        TimeSeries::from_pairs(
            [
                (1, Value::from(2)),
                (2, Value::from(3)),
                (6, Value::from(1)),
                (8, Value::from(4)),
            ],
            Value::Null,
        )
    }

    #[test]
    fn test_periods_tile_the_window() {
        let ts = sample();
        let periods = collect(ts.iter_periods(None, None).unwrap());
        assert_eq!(
            periods,
            vec![
                (1, 2, Value::from(2)),
                (2, 6, Value::from(3)),
                (6, 8, Value::from(1)),
            ]
        );
        for pair in periods.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
    }

    #[test]
    fn test_window_wider_than_measurements() {
        let ts = sample();
        let periods = collect(ts.iter_periods(Some(-2), Some(10)).unwrap());
        assert_eq!(periods[0], (-2, 1, Value::Null));
        assert_eq!(periods.last().unwrap().clone(), (8, 10, Value::from(4)));
    }

    #[test]
    fn test_window_between_measurements() {
        let ts = sample();
        let periods = collect(ts.iter_periods(Some(3), Some(7)).unwrap());
        assert_eq!(
            periods,
            vec![(3, 6, Value::from(3)), (6, 7, Value::from(1))]
        );
    }

    #[test]
    fn test_window_starting_on_a_measurement() {
        let ts = sample();
        let periods = collect(ts.iter_periods(Some(2), Some(6)).unwrap());
        assert_eq!(periods, vec![(2, 6, Value::from(3))]);
    }

    #[test]
    fn test_value_filter() {
        let mask: TimeSeries<i64, bool> = TimeSeries::from_pairs(
            [(0, true), (2, false), (4, true), (6, false)],
            false,
        );
        let truthy: Vec<(i64, i64)> = mask
            .iter_periods_filtered(Some(0), Some(8), PeriodFilter::Value(true))
            .unwrap()
            .map(|(t0, t1, _)| (t0, t1))
            .collect();
        assert_eq!(truthy, vec![(0, 2), (4, 6)]);
    }

    #[test]
    fn test_predicate_filter() {
        let ts = sample();
        let long_periods: Vec<i64> = ts
            .iter_periods_filtered(
                None,
                None,
                PeriodFilter::Where(Box::new(|t0, t1, _| t1 - t0 > 1)),
            )
            .unwrap()
            .map(|(t0, _, _)| t0)
            .collect();
        assert_eq!(long_periods, vec![2, 6]);
    }

    #[test]
    fn test_empty_series() {
        let empty: TimeSeries<i64> = TimeSeries::new(Value::from(7));
        assert!(matches!(
            empty.iter_periods(None, None),
            Err(SeriesError::UndefinedWindow)
        ));
        let periods = collect(empty.iter_periods(Some(0), Some(5)).unwrap());
        assert_eq!(periods, vec![(0, 5, Value::from(7))]);
    }

    #[test]
    fn test_rejects_inverted_window() {
        let ts = sample();
        assert!(matches!(
            ts.iter_periods(Some(5), Some(5)),
            Err(SeriesError::BadArgument(_))
        ));
    }
}
