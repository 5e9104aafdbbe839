use std::fmt::Debug;

use crate::common::TimePoint;
use crate::merge::{MergeRow, StateVec};
use crate::series::TimeSeries;

/// K-way merge by flat sort: every `(time, series, value)` triple is
/// materialized and sorted once, then a single scan updates a running
/// state vector and emits on each time boundary.
///
/// O(N log N) with O(N) auxiliary memory, no per-element dispatch. This
/// is the strategy of choice when the number of series is large or their
/// sizes are balanced; the heap variant wins when a few long series
/// dominate.
pub struct MergeIter<'a, T, V> {
    triples: Vec<(T, usize, &'a V)>,
    pos: usize,
    state: StateVec<V>,
}

impl<'a, T, V> MergeIter<'a, T, V>
where
    T: TimePoint,
    V: Clone + PartialEq + Debug,
{
    pub(crate) fn new(series_list: &[&'a TimeSeries<T, V>]) -> Self {
        let total: usize = series_list.iter().map(|s| s.n_measurements()).sum();
        let mut triples = Vec::with_capacity(total);
        for (index, series) in series_list.iter().enumerate() {
            for (t, v) in series.items() {
                triples.push((*t, index, v));
            }
        }
        // the index tiebreak keeps simultaneous updates deterministic;
        // keys are unique within one series so (t, index) never collides
        triples.sort_unstable_by(|a, b| a.0.cmp_points(&b.0).then(a.1.cmp(&b.1)));
        let state = series_list
            .iter()
            .map(|s| s.default_value().clone())
            .collect();
        Self {
            triples,
            pos: 0,
            state,
        }
    }
}

impl<T, V> Iterator for MergeIter<'_, T, V>
where
    T: TimePoint,
    V: Clone + PartialEq + Debug,
{
    type Item = MergeRow<T, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let (time, _, _) = *self.triples.get(self.pos)?;
        while let Some((t, index, value)) = self.triples.get(self.pos) {
            if t.cmp_points(&time).is_ne() {
                break;
            }
            self.state[*index] = (*value).clone();
            self.pos += 1;
        }
        Some(MergeRow {
            time,
            state: self.state.clone(),
        })
    }
}
