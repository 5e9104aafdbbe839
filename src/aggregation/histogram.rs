use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::common::Value;
use crate::error::{SeriesError, SeriesResult};

/// Ordering strategy for histogram keys.
///
/// `Natural` keeps keys in value order, which is what quantiles are
/// defined over. `Hashed` orders by a stable 64-bit hash instead, so that
/// mixes of mutually unorderable keys can still be counted, at the cost
/// of quantiles over the natural order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum KeyOrder {
    Natural,
    Hashed,
}

/// A weighted multiset of values, kept sorted by key.
///
/// Weights are durations when built by `distribution` and plain counts
/// when built by insertion. Zero weights can appear through additive
/// combination and are kept, but `min`/`max` skip them; `Null` keys are
/// stored and excluded from every statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    entries: Vec<(Value, f64)>,
    order: KeyOrder,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            order: KeyOrder::Natural,
        }
    }

    /// An empty histogram ordered by stable hash instead of value order,
    /// for key mixes that cannot be totally ordered.
    pub fn with_hash_order() -> Self {
        Self {
            entries: Vec::new(),
            order: KeyOrder::Hashed,
        }
    }

    pub fn from_values(values: impl IntoIterator<Item = Value>) -> SeriesResult<Self> {
        let mut histogram = Self::new();
        for value in values {
            histogram.insert(value)?;
        }
        Ok(histogram)
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (Value, f64)>) -> SeriesResult<Self> {
        let mut histogram = Self::new();
        for (value, weight) in pairs {
            histogram.add_weight(value, weight)?;
        }
        Ok(histogram)
    }

    fn cmp_keys(&self, a: &Value, b: &Value) -> SeriesResult<Ordering> {
        match self.order {
            KeyOrder::Natural => a.total_cmp(b),
            KeyOrder::Hashed => Ok(a.stable_hash().cmp(&b.stable_hash())),
        }
    }

    fn find_index(&self, key: &Value) -> SeriesResult<(usize, bool)> {
        let mut lo = 0;
        let mut hi = self.entries.len();
        while lo < hi {
            let mid = (lo + hi) / 2;
            match self.cmp_keys(key, &self.entries[mid].0)? {
                Ordering::Less => hi = mid,
                Ordering::Greater => lo = mid + 1,
                Ordering::Equal => return Ok((mid, true)),
            }
        }
        Ok((lo, false))
    }

    /// Count one observation of `value`.
    pub fn insert(&mut self, value: Value) -> SeriesResult<()> {
        self.add_weight(value, 1.0)
    }

    /// Add `weight` to the bucket for `value`, creating it if absent.
    pub fn add_weight(&mut self, value: Value, weight: f64) -> SeriesResult<()> {
        let (idx, found) = self.find_index(&value)?;
        if found {
            self.entries[idx].1 += weight;
        } else {
            self.entries.insert(idx, (value, weight));
        }
        Ok(())
    }

    /// The stored weight for `value`, zero when absent.
    pub fn weight(&self, value: &Value) -> SeriesResult<f64> {
        let (idx, found) = self.find_index(value)?;
        Ok(if found { self.entries[idx].1 } else { 0.0 })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, f64)> + '_ {
        self.entries.iter().map(|(v, w)| (v, *w))
    }

    /// Sum of all weights, `Null` buckets included.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    /// Numeric `(value, weight)` view, skipping `Null` buckets; an error
    /// when a non-null key has no numeric reading.
    fn numeric_entries(&self) -> SeriesResult<Vec<(f64, f64)>> {
        self.entries
            .iter()
            .filter(|(value, _)| !value.is_null())
            .map(|(value, weight)| {
                value.as_f64().map(|v| (v, *weight)).ok_or_else(|| {
                    SeriesError::bad_argument(format!(
                        "can't take statistics of {} keys",
                        value.type_name()
                    ))
                })
            })
            .collect()
    }

    /// Weighted mean over the non-null buckets, `None` when there are
    /// none.
    pub fn mean(&self) -> SeriesResult<Option<f64>> {
        let entries = self.numeric_entries()?;
        let total: f64 = entries.iter().map(|(_, w)| w).sum();
        if total == 0.0 {
            return Ok(None);
        }
        let weighted: f64 = entries.iter().map(|(v, w)| v * w).sum();
        Ok(Some(weighted / total))
    }

    /// Weighted variance over the non-null buckets.
    pub fn variance(&self) -> SeriesResult<Option<f64>> {
        let entries = self.numeric_entries()?;
        let total: f64 = entries.iter().map(|(_, w)| w).sum();
        if total == 0.0 {
            return Ok(None);
        }
        let mean: f64 = entries.iter().map(|(v, w)| v * w).sum::<f64>() / total;
        let central: f64 = entries
            .iter()
            .map(|(v, w)| w * (v - mean) * (v - mean))
            .sum();
        Ok(Some(central / total))
    }

    pub fn standard_deviation(&self) -> SeriesResult<Option<f64>> {
        Ok(self.variance()?.map(f64::sqrt))
    }

    /// Smallest observed key, ignoring zero-weight and `Null` buckets.
    pub fn min(&self) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(value, weight)| !value.is_null() && *weight != 0.0)
            .map(|(value, _)| value)
    }

    /// Largest observed key, ignoring zero-weight and `Null` buckets.
    pub fn max(&self) -> Option<&Value> {
        self.entries
            .iter()
            .rev()
            .find(|(value, weight)| !value.is_null() && *weight != 0.0)
            .map(|(value, _)| value)
    }

    /// A copy whose weights sum to one. A histogram with no weight is
    /// returned unchanged.
    pub fn normalized(&self) -> Histogram {
        let total = self.total();
        if total == 0.0 {
            return self.clone();
        }
        Histogram {
            entries: self
                .entries
                .iter()
                .map(|(value, weight)| (value.clone(), weight / total))
                .collect(),
            order: self.order,
        }
    }

    /// Additive combination with another histogram. Weights add bucket by
    /// bucket; a bucket can end up with zero weight.
    pub fn add(&self, other: &Histogram) -> SeriesResult<Histogram> {
        let mut result = self.clone();
        for (value, weight) in other.iter() {
            result.add_weight(value.clone(), weight)?;
        }
        Ok(result)
    }

    pub fn median(&self) -> SeriesResult<Option<f64>> {
        self.quantile(0.5)
    }

    /// Interpolated quantile with the default smoothing (`alpha = 0.5`).
    pub fn quantile(&self, q: f64) -> SeriesResult<Option<f64>> {
        self.quantile_with(q, 0.5, None)
    }

    pub fn quantile_with(
        &self,
        q: f64,
        alpha: f64,
        smallest_count: Option<f64>,
    ) -> SeriesResult<Option<f64>> {
        Ok(self
            .quantiles_with(&[q], alpha, smallest_count)?
            .map(|values| values[0]))
    }

    pub fn quantiles(&self, qs: &[f64]) -> SeriesResult<Option<Vec<f64>>> {
        self.quantiles_with(qs, 0.5, None)
    }

    /// Evaluate the inverse CDF at each probability.
    ///
    /// With `alpha > 0` the inverse is piecewise linear: every bucket of
    /// weight `c` contributes control points at `(Σ_prev + α·c_min)/total`
    /// and `(Σ_prev + c − α·c_min)/total`, where `c_min` is the smallest
    /// bucket weight (optionally floored by `smallest_count`), and
    /// probabilities in between interpolate. With `alpha = 0` the
    /// empirical inverse CDF is used, returning the midpoint of the two
    /// adjacent values exactly at a jump.
    ///
    /// Probabilities are clamped into the representable range. `None` when
    /// the histogram has no non-null buckets.
    pub fn quantiles_with(
        &self,
        qs: &[f64],
        alpha: f64,
        smallest_count: Option<f64>,
    ) -> SeriesResult<Option<Vec<f64>>> {
        for q in qs {
            if !(0.0..=1.0).contains(q) {
                return Err(SeriesError::bad_argument(format!(
                    "invalid quantile {q}, need 0 <= q <= 1"
                )));
            }
        }
        let entries = self.numeric_entries()?;
        if entries.is_empty() {
            return Ok(None);
        }

        let total: f64 = entries.iter().map(|(_, w)| w).sum();
        let smallest_observed = entries.iter().map(|(_, w)| *w).fold(f64::INFINITY, f64::min);
        let c_min = match smallest_count {
            Some(floor) => floor.min(smallest_observed),
            None => smallest_observed,
        };
        let beta = alpha * c_min;

        // the inverse CDF as (probability, value) control points;
        // coincident probabilities resolve to the last writer
        let mut inverse: Vec<(f64, f64)> = Vec::with_capacity(entries.len() * 2);
        let mut push = |q: f64, v: f64, inverse: &mut Vec<(f64, f64)>| match inverse.last_mut() {
            Some(last) if last.0 == q => last.1 = v,
            _ => inverse.push((q, v)),
        };
        let mut cumulative = 0.0;
        for (value, count) in &entries {
            push((cumulative + beta) / total, *value, &mut inverse);
            cumulative += count;
            push((cumulative - beta) / total, *value, &mut inverse);
        }

        let q_min = inverse[0].0;
        let q_max = inverse[inverse.len() - 1].0;

        let evaluate = |q: f64| -> f64 {
            let q = q.clamp(q_min, q_max);
            let at = inverse.partition_point(|(x, _)| *x < q);
            let exact = at < inverse.len() && inverse[at].0 == q;
            if beta > 0.0 {
                if exact {
                    return inverse[at].1;
                }
                let (x1, y1) = inverse[at - 1];
                let (x2, y2) = inverse[at];
                (y2 - y1) * (q - x1) / (x2 - x1) + y1
            } else if exact {
                if at == 0 {
                    inverse[0].1
                } else {
                    0.5 * (inverse[at - 1].1 + inverse[at].1)
                }
            } else {
                inverse[at - 1].1
            }
        };

        Ok(Some(qs.iter().map(|q| evaluate(*q)).collect()))
    }
}
