use std::fmt::Debug;

use crate::common::TimePoint;
use crate::merge::StateVec;
use crate::series::TimeSeries;

/// One input's change of value inside a merge, in time order.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<T, V> {
    pub time: T,
    /// Index of the series that changed, in input order.
    pub series: usize,
    pub previous: V,
    pub next: V,
}

/// Per-input transitions of a merge: unlike the merged row stream, tied
/// times yield one element per series that changed, so algorithms that
/// care which input moved (counting by value, flap detection) can tell.
pub struct TransitionIter<'a, T, V> {
    triples: Vec<(T, usize, &'a V)>,
    pos: usize,
    state: StateVec<V>,
}

impl<'a, T, V> TransitionIter<'a, T, V>
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

impl<T, V> Iterator for TransitionIter<'_, T, V>
where
    T: TimePoint,
    V: Clone + PartialEq + Debug,
{
    type Item = Transition<T, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let (time, series, value) = *self.triples.get(self.pos)?;
        self.pos += 1;
        let previous = std::mem::replace(&mut self.state[series], value.clone());
        Some(Transition {
            time,
            series,
            previous,
            next: value.clone(),
        })
    }
}
