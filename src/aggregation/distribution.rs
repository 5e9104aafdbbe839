use crate::aggregation::Histogram;
use crate::common::{Interpolation, TimePoint, Value};
use crate::error::{SeriesError, SeriesResult};
use crate::merge;
use crate::series::{PeriodFilter, TimeSeries};

/// The time window of an aggregation: optional explicit bounds plus an
/// optional boolean mask restricting it to the mask's true regions.
///
/// Bounds and mask unify internally: `[start, end)` is just the two-point
/// mask `{start: true, end: false}`, intersected with the user mask, so
/// every aggregation runs over one effective mask with no special cases.
#[derive(Debug, Clone, Copy, Default)]
pub struct Window<'a, T> {
    pub start: Option<T>,
    pub end: Option<T>,
    pub mask: Option<&'a TimeSeries<T, bool>>,
}

impl<'a, T: TimePoint> Window<'a, T> {
    /// Whatever range the series itself inhabits.
    pub fn all() -> Self {
        Self {
            start: None,
            end: None,
            mask: None,
        }
    }

    pub fn between(start: T, end: T) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            mask: None,
        }
    }

    pub fn masked(mask: &'a TimeSeries<T, bool>) -> Self {
        Self {
            start: None,
            end: None,
            mask: Some(mask),
        }
    }

    pub fn with_mask(mut self, mask: &'a TimeSeries<T, bool>) -> Self {
        self.mask = Some(mask);
        self
    }
}

/// Options for [`TimeSeries::distribution`].
#[derive(Debug, Clone, Copy)]
pub struct DistributionOptions {
    /// Scale weights so they sum to one. On by default.
    pub normalized: bool,
    /// `Linear` keys each period by the interpolated value at its
    /// midpoint instead of its left value.
    pub interpolate: Interpolation,
}

impl Default for DistributionOptions {
    fn default() -> Self {
        Self {
            normalized: true,
            interpolate: Interpolation::Previous,
        }
    }
}

/// Intersection of two boolean step functions.
fn and_masks<T: TimePoint>(
    a: &TimeSeries<T, bool>,
    b: &TimeSeries<T, bool>,
) -> TimeSeries<T, bool> {
    merge::merge(&[a, b], true, |state| state[0] && state[1])
}

/// Build a histogram from raw `(value, weight)` observations, falling
/// back to hash ordering when the keys turn out not to be totally
/// orderable.
fn build_histogram(pairs: Vec<(Value, f64)>) -> Histogram {
    let mut natural = Histogram::new();
    let orderable = pairs
        .iter()
        .all(|(value, weight)| natural.add_weight(value.clone(), *weight).is_ok());
    if orderable {
        return natural;
    }
    tracing::debug!("histogram keys are not totally ordered, falling back to hash order");
    let mut hashed = Histogram::with_hash_order();
    for (value, weight) in pairs {
        let _ = hashed.add_weight(value, weight);
    }
    hashed
}

impl<T: TimePoint> TimeSeries<T, Value> {
    /// A boolean mask that is true wherever this series is truthy.
    /// `Null` is falsy.
    pub fn to_mask(&self) -> TimeSeries<T, bool> {
        let mut mask = TimeSeries::new(self.default_value().truthy());
        for (t, v) in self.items() {
            mask.set(*t, v.truthy(), false);
        }
        mask
    }

    /// Resolve a window's bounds: explicit values win, then the mask's
    /// keyed range when no bound was given at all, then the series' own
    /// inhabited range.
    pub(crate) fn resolve_bounds(&self, window: &Window<'_, T>) -> SeriesResult<(T, T)> {
        match (window.start, window.end, window.mask) {
            (None, None, Some(mask)) => {
                let start = mask.first_key().ok_or(SeriesError::UndefinedWindow)?;
                let end = mask.last_key().ok_or(SeriesError::UndefinedWindow)?;
                if start.cmp_points(&end) != std::cmp::Ordering::Less {
                    return Err(SeriesError::bad_argument(format!(
                        "start can't be at or after end ({start:?} >= {end:?})"
                    )));
                }
                Ok((start, end))
            }
            (start, end, _) => self.resolve_window(start, end),
        }
    }

    /// Resolve a window into concrete bounds and the effective mask.
    fn resolve_masked_window(
        &self,
        window: &Window<'_, T>,
    ) -> SeriesResult<(T, T, TimeSeries<T, bool>)> {
        let (start, end) = self.resolve_bounds(window)?;

        let mut window_mask = TimeSeries::new(false);
        window_mask.set(start, true, false);
        window_mask.set(end, false, false);
        let effective = match window.mask {
            Some(user_mask) => and_masks(&window_mask, user_mask),
            None => window_mask,
        };
        Ok((start, end, effective))
    }

    /// The distribution of values over the window, weighted by how long
    /// each value was in effect: seconds for wall-clock time, raw units
    /// otherwise.
    pub fn distribution(
        &self,
        window: &Window<'_, T>,
        options: &DistributionOptions,
    ) -> SeriesResult<Histogram> {
        let (start, end, mask) = self.resolve_masked_window(window)?;
        let sub_windows: Vec<(T, T)> = mask
            .iter_periods_filtered(Some(start), Some(end), PeriodFilter::Value(true))?
            .map(|(t0, t1, _)| (t0, t1))
            .collect();

        let mut pairs = Vec::new();
        for (m0, m1) in sub_windows {
            for (t0, t1, value) in self.iter_periods(Some(m0), Some(m1))? {
                let weight = T::span_units(T::span_between(t0, t1));
                let key = match options.interpolate {
                    Interpolation::Previous => value.clone(),
                    Interpolation::Linear => {
                        self.get_interpolated(T::midpoint(t0, t1), Interpolation::Linear)?
                    }
                };
                pairs.push((key, weight));
            }
        }

        let counter = build_histogram(pairs);
        Ok(if options.normalized {
            counter.normalized()
        } else {
            counter
        })
    }

    /// The duration-weighted mean over the window; `Null` periods are
    /// excluded at the histogram level.
    pub fn mean(&self, window: &Window<'_, T>) -> SeriesResult<Option<f64>> {
        let options = DistributionOptions {
            normalized: false,
            interpolate: Interpolation::Previous,
        };
        self.distribution(window, &options)?.mean()
    }

    /// Count the measurements inside the window's effective mask, with
    /// closed/open flags for the two window endpoints.
    pub fn n_points(
        &self,
        window: &Window<'_, T>,
        include_start: bool,
        include_end: bool,
    ) -> SeriesResult<usize> {
        let (start, end, mask) = self.resolve_masked_window(window)?;
        let mut count = 0;
        for (m0, m1, _) in
            mask.iter_periods_filtered(Some(start), Some(end), PeriodFilter::Value(true))?
        {
            let lo_inclusive = if m0.cmp_points(&start).is_eq() {
                include_start
            } else {
                true
            };
            count += self.points().range(&m0, &m1, lo_inclusive, false).count();
        }
        if include_end && self.contains_time(end) {
            let masked_in = window.mask.map(|m| *m.get(end)).unwrap_or(true);
            if masked_in {
                count += 1;
            }
        }
        Ok(count)
    }

    /// [`n_points`](Self::n_points) divided by the total number of
    /// measurements.
    pub fn n_points_normalized(
        &self,
        window: &Window<'_, T>,
        include_start: bool,
        include_end: bool,
    ) -> SeriesResult<f64> {
        let count = self.n_points(window, include_start, include_end)?;
        if self.n_measurements() == 0 {
            return Ok(0.0);
        }
        Ok(count as f64 / self.n_measurements() as f64)
    }
}
