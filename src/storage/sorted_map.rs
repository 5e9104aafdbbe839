use serde::{Deserialize, Serialize};

use crate::common::TimePoint;

// below this size a linear scan beats binary search on branch-predicted
// hardware, same threshold as a probe over a small chunk
const LINEAR_SCAN_MAX: usize = 32;

/// A key-sorted associative container over time points, stored as parallel
/// vectors. Lookup is a binary search, in-order iteration is a zip of two
/// slices, and range deletion is a single `drain` per vector.
///
/// Position indexing is O(1), which is what lets the series primitives
/// above it stay branch-light: everything reduces to "find the greatest
/// key at or before t" plus "walk keys in a half-open range".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortedMap<T, V> {
    keys: Vec<T>,
    values: Vec<V>,
}

impl<T: TimePoint, V> Default for SortedMap<T, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimePoint, V> SortedMap<T, V> {
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.values.clear();
    }

    /// Index of `key` if present, otherwise the insertion position.
    fn find_index(&self, key: &T) -> (usize, bool) {
        if self.len() > LINEAR_SCAN_MAX {
            let idx = self
                .keys
                .partition_point(|k| k.cmp_points(key) == std::cmp::Ordering::Less);
            let found = idx < self.len() && self.keys[idx].cmp_points(key).is_eq();
            (idx, found)
        } else {
            for (idx, k) in self.keys.iter().enumerate() {
                match k.cmp_points(key) {
                    std::cmp::Ordering::Less => continue,
                    std::cmp::Ordering::Equal => return (idx, true),
                    std::cmp::Ordering::Greater => return (idx, false),
                }
            }
            (self.len(), false)
        }
    }

    /// Insert or replace; returns the previous value when the key existed.
    pub fn insert(&mut self, key: T, value: V) -> Option<V> {
        let (idx, found) = self.find_index(&key);
        if found {
            Some(std::mem::replace(&mut self.values[idx], value))
        } else {
            self.keys.insert(idx, key);
            self.values.insert(idx, value);
            None
        }
    }

    pub fn remove(&mut self, key: &T) -> Option<V> {
        let (idx, found) = self.find_index(key);
        if found {
            self.keys.remove(idx);
            Some(self.values.remove(idx))
        } else {
            None
        }
    }

    pub fn get(&self, key: &T) -> Option<&V> {
        let (idx, found) = self.find_index(key);
        found.then(|| &self.values[idx])
    }

    pub fn contains(&self, key: &T) -> bool {
        self.find_index(key).1
    }

    /// Count of stored keys strictly less than `key`.
    pub fn bisect_left(&self, key: &T) -> usize {
        self.keys
            .partition_point(|k| k.cmp_points(key) == std::cmp::Ordering::Less)
    }

    /// Count of stored keys less than or equal to `key`, so that
    /// `bisect_right(key) - 1` indexes the greatest key at or before it.
    pub fn bisect_right(&self, key: &T) -> usize {
        self.keys
            .partition_point(|k| k.cmp_points(key) != std::cmp::Ordering::Greater)
    }

    pub fn item_at(&self, index: usize) -> Option<(&T, &V)> {
        Some((self.keys.get(index)?, self.values.get(index)?))
    }

    pub fn first(&self) -> Option<(&T, &V)> {
        self.item_at(0)
    }

    pub fn last(&self) -> Option<(&T, &V)> {
        self.len().checked_sub(1).and_then(|i| self.item_at(i))
    }

    pub fn keys(&self) -> &[T] {
        &self.keys
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&T, &V)> + '_ {
        self.keys.iter().zip(self.values.iter())
    }

    fn range_bounds(&self, lo: &T, hi: &T, include_lo: bool, include_hi: bool) -> (usize, usize) {
        let start = if include_lo {
            self.bisect_left(lo)
        } else {
            self.bisect_right(lo)
        };
        let end = if include_hi {
            self.bisect_right(hi)
        } else {
            self.bisect_left(hi)
        };
        (start, end.max(start))
    }

    /// Iterate `(key, value)` pairs with keys in the given range.
    pub fn range(
        &self,
        lo: &T,
        hi: &T,
        include_lo: bool,
        include_hi: bool,
    ) -> impl Iterator<Item = (&T, &V)> + '_ {
        let (start, end) = self.range_bounds(lo, hi, include_lo, include_hi);
        self.keys[start..end].iter().zip(self.values[start..end].iter())
    }

    /// Bulk-delete every key in the range; one structural rearrangement
    /// per vector. Returns the number of entries removed.
    pub fn delete_range(&mut self, lo: &T, hi: &T, include_lo: bool, include_hi: bool) -> usize {
        let (start, end) = self.range_bounds(lo, hi, include_lo, include_hi);
        self.keys.drain(start..end);
        self.values.drain(start..end).count()
    }

    /// Drop every entry whose value matches its predecessor's, in one
    /// ordered pass.
    pub fn dedup_adjacent(&mut self, same: impl Fn(&V, &V) -> bool) {
        if self.len() < 2 {
            return;
        }
        let mut keep = 1;
        for idx in 1..self.len() {
            if !same(&self.values[keep - 1], &self.values[idx]) {
                self.keys.swap(keep, idx);
                self.values.swap(keep, idx);
                keep += 1;
            }
        }
        self.keys.truncate(keep);
        self.values.truncate(keep);
    }
}

impl<T: TimePoint, V: Clone> SortedMap<T, V> {
    /// Build from arbitrary-order pairs; duplicate keys resolve to the
    /// last-seen value, matching insertion one at a time.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (T, V)>) -> Self {
        let mut entries: Vec<(T, V)> = pairs.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp_points(&b.0));
        let mut map = Self::with_capacity(entries.len());
        for (key, value) in entries {
            match (map.keys.last(), map.values.last_mut()) {
                (Some(last), Some(slot)) if last.cmp_points(&key).is_eq() => {
                    *slot = value;
                }
                _ => {
                    map.keys.push(key);
                    map.values.push(value);
                }
            }
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn sample_map() -> SortedMap<i64, i64> {
        SortedMap::from_pairs([(1, 10), (3, 30), (5, 50), (7, 70)])
    }

    #[test]
    fn test_insert_and_replace() {
        let mut map = SortedMap::new();
        assert_eq!(map.insert(5i64, "a"), None);
        assert_eq!(map.insert(1, "b"), None);
        assert_eq!(map.insert(5, "c"), Some("a"));
        assert_eq!(map.keys(), &[1, 5]);
        assert_eq!(map.get(&5), Some(&"c"));
        assert!(map.contains(&1));
        assert!(!map.contains(&2));
    }

    #[test]
    fn test_bisect() {
        let map = sample_map();
        assert_eq!(map.bisect_left(&3), 1);
        assert_eq!(map.bisect_right(&3), 2);
        assert_eq!(map.bisect_right(&4), 2);
        assert_eq!(map.bisect_right(&0), 0);
        assert_eq!(map.bisect_right(&9), 4);
        // greatest key <= 6 is 5
        let idx = map.bisect_right(&6) - 1;
        assert_eq!(map.item_at(idx), Some((&5, &50)));
    }

    #[test_case(true, true, &[3, 5] ; "closed")]
    #[test_case(true, false, &[3] ; "half open right")]
    #[test_case(false, true, &[5] ; "half open left")]
    #[test_case(false, false, &[] ; "open")]
    fn test_range_inclusivity(include_lo: bool, include_hi: bool, expected: &[i64]) {
        let map = sample_map();
        let keys: Vec<i64> = map
            .range(&3, &5, include_lo, include_hi)
            .map(|(k, _)| *k)
            .collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_delete_range() {
        let mut map = sample_map();
        assert_eq!(map.delete_range(&3, &7, true, false), 2);
        assert_eq!(map.keys(), &[1, 7]);
        assert_eq!(map.delete_range(&100, &200, true, true), 0);
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let map = sample_map();
        assert_eq!(map.range(&7, &3, true, true).count(), 0);
        let mut map = sample_map();
        assert_eq!(map.delete_range(&7, &3, true, true), 0);
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn test_from_pairs_last_wins() {
        let map: SortedMap<i64, &str> =
            SortedMap::from_pairs([(2, "a"), (1, "b"), (2, "c"), (3, "d"), (2, "e")]);
        assert_eq!(map.keys(), &[1, 2, 3]);
        assert_eq!(map.get(&2), Some(&"e"));
    }

    #[test]
    fn test_dedup_adjacent() {
        let mut map = SortedMap::from_pairs([(1, 1), (2, 1), (3, 2), (4, 2), (5, 1)]);
        map.dedup_adjacent(|a, b| a == b);
        assert_eq!(map.keys(), &[1, 3, 5]);
        assert_eq!(map.values(), &[1, 2, 1]);
    }

    #[test]
    fn test_binary_and_linear_agree() {
        let mut map = SortedMap::new();
        for i in 0..100i64 {
            map.insert(i * 2, i);
        }
        assert_eq!(map.len(), 100);
        assert_eq!(map.get(&42), Some(&21));
        assert_eq!(map.get(&43), None);
        assert_eq!(map.bisect_right(&43), 22);
    }
}
