use std::cmp::Ordering;
use std::fmt::Debug;

use min_max_heap::MinMaxHeap;

use crate::common::TimePoint;
use crate::merge::{MergeRow, StateVec};
use crate::series::TimeSeries;

struct HeapEntry<'a, T, V> {
    time: T,
    series: usize,
    value: &'a V,
}

impl<T: TimePoint, V> PartialEq for HeapEntry<'_, T, V> {
    fn eq(&self, other: &Self) -> bool {
        self.time.cmp_points(&other.time).is_eq() && self.series == other.series
    }
}

impl<T: TimePoint, V> Eq for HeapEntry<'_, T, V> {}

impl<T: TimePoint, V> PartialOrd for HeapEntry<'_, T, V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: TimePoint, V> Ord for HeapEntry<'_, T, V> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp_points(&other.time)
            .then(self.series.cmp(&other.series))
    }
}

/// K-way merge over a min-heap of per-series cursors, keyed by
/// `(time, series)`.
///
/// O(N log K); preferable to the flat sort when K is small and the
/// individual series are long. Produces exactly the same rows as
/// [`MergeIter`](crate::merge::MergeIter) on any input.
pub struct HeapMergeIter<'a, T, V> {
    heap: MinMaxHeap<HeapEntry<'a, T, V>>,
    cursors: Vec<(&'a TimeSeries<T, V>, usize)>,
    state: StateVec<V>,
}

impl<'a, T, V> HeapMergeIter<'a, T, V>
where
    T: TimePoint,
    V: Clone + PartialEq + Debug,
{
    pub(crate) fn new(series_list: &[&'a TimeSeries<T, V>]) -> Self {
        let mut heap = MinMaxHeap::with_capacity(series_list.len());
        let mut cursors = Vec::with_capacity(series_list.len());
        for (index, series) in series_list.iter().enumerate() {
            cursors.push((*series, 0usize));
            if let Some((t, v)) = series.item_at(0) {
                heap.push(HeapEntry {
                    time: *t,
                    series: index,
                    value: v,
                });
            }
        }
        let state = series_list
            .iter()
            .map(|s| s.default_value().clone())
            .collect();
        Self {
            heap,
            cursors,
            state,
        }
    }

    fn advance(&mut self, series: usize) {
        self.cursors[series].1 += 1;
        let (series_ref, cursor) = self.cursors[series];
        if let Some((t, v)) = series_ref.item_at(cursor) {
            self.heap.push(HeapEntry {
                time: *t,
                series,
                value: v,
            });
        }
    }
}

impl<T, V> Iterator for HeapMergeIter<'_, T, V>
where
    T: TimePoint,
    V: Clone + PartialEq + Debug,
{
    type Item = MergeRow<T, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.heap.pop_min()?;
        let time = first.time;
        self.state[first.series] = first.value.clone();
        self.advance(first.series);

        // fold every simultaneous update into the same emission
        loop {
            match self.heap.peek_min() {
                Some(entry) if entry.time.cmp_points(&time).is_eq() => {}
                _ => break,
            }
            if let Some(entry) = self.heap.pop_min() {
                self.state[entry.series] = entry.value.clone();
                self.advance(entry.series);
            }
        }

        Some(MergeRow {
            time,
            state: self.state.clone(),
        })
    }
}
