//! Single-pass K-way ordered merge of many series into `(time, state)`
//! rows, from which the n-ary operations are derived.
//!
//! Two strategies produce identical output: a flat stable sort of all
//! `(time, series, value)` triples, and a priority queue of per-series
//! cursors. Rows are emitted once per distinct time; simultaneous updates
//! land in the same row with no intermediate emission.

mod flat_iter;
mod heap_iter;
mod transitions;

use std::fmt::Debug;

use smallvec::SmallVec;

pub use flat_iter::MergeIter;
pub use heap_iter::HeapMergeIter;
pub use transitions::{Transition, TransitionIter};

use crate::common::TimePoint;
use crate::error::SeriesResult;
use crate::series::TimeSeries;

/// The per-series values in effect at one merge emission, in input order.
/// Positions whose series has no measurement yet hold that series'
/// default.
pub type StateVec<V> = SmallVec<[V; 4]>;

/// One emission of a merge: the state vector in effect at `time`.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeRow<T, V> {
    pub time: T,
    pub state: StateVec<V>,
}

/// Merge by flat sort; see [`MergeIter`].
pub fn iter_merge<'a, T, V>(series_list: &[&'a TimeSeries<T, V>]) -> MergeIter<'a, T, V>
where
    T: TimePoint,
    V: Clone + PartialEq + Debug,
{
    MergeIter::new(series_list)
}

/// Merge over a heap of cursors; see [`HeapMergeIter`]. Pointwise equal
/// to [`iter_merge`] on any input.
pub fn iter_merge_heap<'a, T, V>(series_list: &[&'a TimeSeries<T, V>]) -> HeapMergeIter<'a, T, V>
where
    T: TimePoint,
    V: Clone + PartialEq + Debug,
{
    HeapMergeIter::new(series_list)
}

/// Per-input transitions in time order; see [`TransitionIter`].
pub fn iter_merge_transitions<'a, T, V>(
    series_list: &[&'a TimeSeries<T, V>],
) -> TransitionIter<'a, T, V>
where
    T: TimePoint,
    V: Clone + PartialEq + Debug,
{
    TransitionIter::new(series_list)
}

/// Eagerly merge into a new series, applying `op` to every state vector.
/// The result's default is `op` of the input defaults; with `compact`,
/// writes that do not change the function are skipped.
pub fn merge<T, V, W, F>(series_list: &[&TimeSeries<T, V>], compact: bool, mut op: F) -> TimeSeries<T, W>
where
    T: TimePoint,
    V: Clone + PartialEq + Debug,
    W: Clone + PartialEq + Debug,
    F: FnMut(&[V]) -> W,
{
    let defaults: StateVec<V> = series_list
        .iter()
        .map(|s| s.default_value().clone())
        .collect();
    let mut result = TimeSeries::new(op(&defaults));
    for row in iter_merge(series_list) {
        let value = op(&row.state);
        result.set(row.time, value, compact);
    }
    result
}

/// [`merge`] with a fallible operation; the arithmetic reductions use
/// this so an unsupported value combination surfaces as an error instead
/// of a panic.
pub fn merge_with<T, V, W, F>(
    series_list: &[&TimeSeries<T, V>],
    compact: bool,
    mut op: F,
) -> SeriesResult<TimeSeries<T, W>>
where
    T: TimePoint,
    V: Clone + PartialEq + Debug,
    W: Clone + PartialEq + Debug,
    F: FnMut(&[V]) -> SeriesResult<W>,
{
    let total: usize = series_list.iter().map(|s| s.n_measurements()).sum();
    tracing::trace!(series = series_list.len(), measurements = total, "merging");
    let defaults: StateVec<V> = series_list
        .iter()
        .map(|s| s.default_value().clone())
        .collect();
    let mut result = TimeSeries::new(op(&defaults)?);
    for row in iter_merge(series_list) {
        let value = op(&row.state)?;
        result.set(row.time, value, compact);
    }
    Ok(result)
}

/// Merge without an operation: the value at each emitted time is the
/// state vector itself.
pub fn merge_stack<T, V>(series_list: &[&TimeSeries<T, V>], compact: bool) -> TimeSeries<T, Vec<V>>
where
    T: TimePoint,
    V: Clone + PartialEq + Debug,
{
    merge(series_list, compact, |state| state.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    fn series(pairs: &[(i64, i64)], default: i64) -> TimeSeries<i64, i64> {
        TimeSeries::from_pairs(pairs.iter().copied(), default)
    }

    #[test]
    fn test_rows_in_order_with_defaults() {
        let a = series(&[(1, 10), (4, 40)], 0);
        let b = series(&[(2, 20)], -1);
        let rows: Vec<MergeRow<i64, i64>> = iter_merge(&[&a, &b]).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].time, 1);
        assert_eq!(rows[0].state.as_slice(), &[10, -1]);
        assert_eq!(rows[1].state.as_slice(), &[10, 20]);
        assert_eq!(rows[2].state.as_slice(), &[40, 20]);
    }

    #[test]
    fn test_tied_times_emit_once() {
        let a = series(&[(1, 1), (5, 2)], 0);
        let b = series(&[(5, 3), (6, 4)], 0);
        let rows: Vec<MergeRow<i64, i64>> = iter_merge(&[&a, &b]).collect();
        let times: Vec<i64> = rows.iter().map(|r| r.time).collect();
        assert_eq!(times, vec![1, 5, 6]);
        // both updates at t=5 land in the same row
        assert_eq!(rows[1].state.as_slice(), &[2, 3]);
    }

    #[test]
    fn test_flat_and_heap_strategies_agree() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let k = rng.gen_range(1..6);
            let mut list = Vec::new();
            for _ in 0..k {
                let n = rng.gen_range(0..30);
                let pairs: Vec<(i64, i64)> = (0..n)
                    .map(|_| (rng.gen_range(0..40), rng.gen_range(-5..5)))
                    .collect();
                list.push(TimeSeries::from_pairs(pairs, rng.gen_range(-5..5)));
            }
            let refs: Vec<&TimeSeries<i64, i64>> = list.iter().collect();
            let flat: Vec<MergeRow<i64, i64>> = iter_merge(&refs).collect();
            let heap: Vec<MergeRow<i64, i64>> = iter_merge_heap(&refs).collect();
            assert_eq!(flat, heap);
        }
    }

    #[test]
    fn test_merge_and_apply_commute() {
        let a = series(&[(1, 1), (3, 0), (7, 2)], 0);
        let b = series(&[(2, 5), (3, 1)], 1);
        let merged = merge(&[&a, &b], false, |state| state.iter().sum::<i64>());
        let mut applied = TimeSeries::new(1);
        for row in iter_merge(&[&a, &b]) {
            applied.set(row.time, row.state.iter().sum::<i64>(), false);
        }
        assert_eq!(merged, applied);
    }

    #[test]
    fn test_merge_empty_list() {
        let merged: TimeSeries<i64, i64> = merge(&[], false, |state| state.iter().sum());
        assert!(merged.is_empty());
        assert_eq!(merged.default_value(), &0);
    }

    #[test]
    fn test_merge_list_of_empty_series() {
        let a: TimeSeries<i64, i64> = TimeSeries::new(2);
        let b: TimeSeries<i64, i64> = TimeSeries::new(3);
        let merged = merge(&[&a, &b], false, |state| state.iter().sum::<i64>());
        assert!(merged.is_empty());
        assert_eq!(merged.default_value(), &5);
    }

    #[test]
    fn test_merge_compacts_when_asked() {
        let a = series(&[(1, 1), (2, 1)], 0);
        let b = series(&[(2, 0), (3, 0)], 0);
        let merged = merge(&[&a, &b], true, |state| state.iter().sum::<i64>());
        let items: Vec<(i64, i64)> = merged.items().map(|(t, v)| (*t, *v)).collect();
        assert_eq!(items, vec![(1, 1)]);
    }

    #[test]
    fn test_transitions_split_tied_times() {
        let a = series(&[(1, 1), (5, 2)], 0);
        let b = series(&[(5, 3)], 0);
        let transitions: Vec<Transition<i64, i64>> =
            iter_merge_transitions(&[&a, &b]).collect();
        assert_eq!(
            transitions,
            vec![
                Transition {
                    time: 1,
                    series: 0,
                    previous: 0,
                    next: 1
                },
                Transition {
                    time: 5,
                    series: 0,
                    previous: 1,
                    next: 2
                },
                Transition {
                    time: 5,
                    series: 1,
                    previous: 0,
                    next: 3
                },
            ]
        );
    }

    #[test]
    fn test_merge_stack() {
        let a = series(&[(1, 10)], 0);
        let b = series(&[(2, 20)], 0);
        let stacked = merge_stack(&[&a, &b], false);
        assert_eq!(stacked.get(0), &vec![0, 0]);
        assert_eq!(stacked.get(1), &vec![10, 0]);
        assert_eq!(stacked.get(3), &vec![10, 20]);
    }
}
