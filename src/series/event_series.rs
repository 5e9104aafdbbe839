use serde::{Deserialize, Serialize};

use crate::common::{TimePoint, Value};
use crate::error::SeriesResult;
use crate::series::TimeSeries;

/// A sorted multiset of event times.
///
/// Unlike a [`TimeSeries`], an event series carries no values: it records
/// that something happened, possibly several times at the same instant.
/// Insertion order is irrelevant; the sequence is kept non-decreasing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventSeries<T> {
    times: Vec<T>,
}

impl<T: TimePoint> EventSeries<T> {
    pub fn new() -> Self {
        Self { times: Vec::new() }
    }

    pub fn from_times(times: impl IntoIterator<Item = T>) -> Self {
        let mut times: Vec<T> = times.into_iter().collect();
        times.sort_by(|a, b| a.cmp_points(b));
        Self { times }
    }

    /// Record an event; duplicates are kept.
    pub fn insert(&mut self, time: T) {
        let idx = self
            .times
            .partition_point(|t| t.cmp_points(&time) != std::cmp::Ordering::Greater);
        self.times.insert(idx, time);
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.times.iter()
    }

    pub fn time_at(&self, index: usize) -> Option<T> {
        self.times.get(index).copied()
    }

    /// Count of events with `start <= t <= end`, both endpoints included.
    pub fn events_between(&self, start: T, end: T) -> usize {
        let lo = self
            .times
            .partition_point(|t| t.cmp_points(&start) == std::cmp::Ordering::Less);
        let hi = self
            .times
            .partition_point(|t| t.cmp_points(&end) != std::cmp::Ordering::Greater);
        hi.saturating_sub(lo)
    }

    /// Spans between adjacent events; zero spans are legal where events
    /// coincide.
    pub fn iter_interevent_times(&self) -> impl Iterator<Item = T::Span> + '_ {
        self.times
            .windows(2)
            .map(|pair| T::span_between(pair[0], pair[1]))
    }

    /// The running event count as a step function: default 0, and at each
    /// distinct event time the number of events at or before it.
    pub fn cumulative_sum(&self) -> TimeSeries<T, Value> {
        let mut result = TimeSeries::new(Value::from(0));
        let mut count: i64 = 0;
        let mut idx = 0;
        while idx < self.times.len() {
            let time = self.times[idx];
            let mut run = 0;
            while idx < self.times.len() && self.times[idx].cmp_points(&time).is_eq() {
                run += 1;
                idx += 1;
            }
            count += run;
            result.set(time, Value::from(count), false);
        }
        result
    }

    /// The number of currently open items over time: the cumulative count
    /// of `opens` minus that of `closes`. Goes negative when closes
    /// outpace opens, which is the caller's contract to avoid.
    pub fn count_active(opens: &Self, closes: &Self) -> SeriesResult<TimeSeries<T, Value>> {
        opens.cumulative_sum().difference(&closes.cumulative_sum())
    }
}

impl<T: TimePoint> FromIterator<T> for EventSeries<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_times(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_times_sorts() {
        let es = EventSeries::from_times([0.0, 0.0, 6.0, 8.7, 10.0]);
        assert_eq!(es.time_at(0), Some(0.0));
        assert_eq!(es.time_at(1), Some(0.0));
        assert_eq!(es.time_at(2), Some(6.0));
        assert_eq!(es.time_at(3), Some(8.7));
        assert_eq!(es.time_at(4), Some(10.0));
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut es = EventSeries::new();
        for t in [5i64, 1, 9, 5, 0] {
            es.insert(t);
        }
        let times: Vec<i64> = es.iter().copied().collect();
        assert_eq!(times, vec![0, 1, 5, 5, 9]);
    }

    #[test]
    fn test_cumulative_sum() {
        let es = EventSeries::from_times([10i64, 30, 20, 30, 40]);
        let cumsum = es.cumulative_sum();
        assert_eq!(cumsum.get(0), &Value::from(0));
        assert_eq!(cumsum.get(10), &Value::from(1));
        assert_eq!(cumsum.get(25), &Value::from(2));
        // two events share t=30
        assert_eq!(cumsum.get(30), &Value::from(4));
        assert_eq!(cumsum.get(100), &Value::from(5));

        // monotonically non-decreasing
        let values: Vec<i64> = cumsum
            .items()
            .map(|(_, v)| match v {
                Value::Int(i) => *i,
                _ => panic!("count should be an int"),
            })
            .collect();
        assert!(values.windows(2).all(|w| w[0] <= w[1]));

        let empty: EventSeries<i64> = EventSeries::new();
        assert_eq!(empty.cumulative_sum(), TimeSeries::new(Value::from(0)));
    }

    #[test]
    fn test_events_between_is_closed() {
        let es = EventSeries::from_times([10i64, 20, 20, 35, 50]);
        assert_eq!(es.events_between(0, 100), 5);
        assert_eq!(es.events_between(10, 35), 4);
        assert_eq!(es.events_between(11, 19), 0);
        assert_eq!(es.events_between(20, 20), 2);
        assert_eq!(es.events_between(60, 70), 0);
    }

    #[test]
    fn test_interevent_times_allow_zero() {
        let es = EventSeries::from_times([1i64, 16, 16, 22, 26]);
        let lags: Vec<i64> = es.iter_interevent_times().collect();
        assert_eq!(lags, vec![15, 0, 6, 4]);
        assert_eq!(lags.len(), es.len() - 1);
    }

    #[test]
    fn test_count_active() {
        // minutes since midnight: opens at 8:00, 9:00, 13:00, 7:00,
        // 6:30, 13:00; closes at 8:00, 8:30, 12:00 x3
        let opens = EventSeries::from_times([480i64, 540, 780, 420, 390, 780]);
        let closes = EventSeries::from_times([480i64, 510, 720, 720, 720]);
        let active = EventSeries::count_active(&opens, &closes).unwrap();

        assert_eq!(active.get(390), &Value::from(1));
        assert_eq!(active.get(420), &Value::from(2));
        assert_eq!(active.get(480), &Value::from(2));
        assert_eq!(active.get(720), &Value::from(-1));
        assert_eq!(active.get(780), &Value::from(1));
    }
}
