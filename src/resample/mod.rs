//! Regularization of unevenly-spaced series: point sampling, moving
//! averages, fixed-interval reduction and calendar binning.

use std::cmp::Ordering;
use std::str::FromStr;

use crate::aggregation::{DistributionOptions, Histogram, Window};
use crate::common::{CalendarPoint, DurationUnit, Interpolation, TimePoint, Value};
use crate::error::{SeriesError, SeriesResult};
use crate::series::TimeSeries;

/// Where a moving-average window sits relative to its emission time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Placement {
    #[default]
    Center,
    Left,
    Right,
}

impl FromStr for Placement {
    type Err = SeriesError;

    fn from_str(s: &str) -> SeriesResult<Self> {
        match s {
            "center" => Ok(Placement::Center),
            "left" => Ok(Placement::Left),
            "right" => Ok(Placement::Right),
            other => Err(SeriesError::bad_argument(format!(
                "unknown placement '{other}'"
            ))),
        }
    }
}

/// Reduction applied to each interval by
/// [`TimeSeries::sample_interval`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalOp {
    Mean,
    Max,
    Min,
}

/// How [`TimeSeries::sample_interval`] derives its interval boundaries.
pub enum IntervalBoundaries<'a, T: TimePoint> {
    /// Step from the window start by a fixed period; the final interval
    /// is clipped at the window end.
    Period(T::Span),
    /// Use consecutive entries of a monotonic index as boundaries.
    Index(&'a [T]),
}

fn check_period<T: TimePoint>(period: T::Span, start: T, end: T) -> SeriesResult<()> {
    let zero = T::zero_span();
    if period.partial_cmp(&zero) != Some(Ordering::Greater) {
        return Err(SeriesError::bad_argument("sampling period must be > 0"));
    }
    let span = T::span_between(start, end);
    if period.partial_cmp(&span) == Some(Ordering::Greater) {
        return Err(SeriesError::bad_argument(
            "sampling period is greater than the duration between start and end",
        ));
    }
    Ok(())
}

impl<T: TimePoint> TimeSeries<T, Value> {
    /// Sample the series at regular steps of `period` from the window
    /// start while `t <= end`. With a mask, emissions where the mask is
    /// false are skipped; the stepping itself is unaffected.
    pub fn sample(
        &self,
        period: T::Span,
        window: &Window<'_, T>,
        interpolate: Interpolation,
    ) -> SeriesResult<Vec<(T, Value)>> {
        let (start, end) = self.resolve_bounds(window)?;
        check_period(period, start, end)?;

        let mut result = Vec::new();
        let mut current = start;
        while current.cmp_points(&end) != Ordering::Greater {
            let masked_in = window.mask.map(|m| *m.get(current)).unwrap_or(true);
            if masked_in {
                result.push((current, self.get_interpolated(current, interpolate)?));
            }
            current = current.add_span(period);
        }
        Ok(result)
    }

    /// Duration-weighted mean over `[start, end)` that propagates `Null`:
    /// any undefined stretch makes the whole window undefined.
    fn strict_windowed_mean(&self, start: T, end: T) -> SeriesResult<Value> {
        let total = T::span_units(T::span_between(start, end));
        let mut weighted = 0.0;
        for (t0, t1, value) in self.iter_periods(Some(start), Some(end))? {
            if value.is_null() {
                return Ok(Value::Null);
            }
            let v = value.as_f64().ok_or_else(|| {
                SeriesError::bad_argument(format!(
                    "can't take mean of {} values",
                    value.type_name()
                ))
            })?;
            weighted += v * T::span_units(T::span_between(t0, t1));
        }
        Ok(Value::Float(weighted / total))
    }

    /// Mean over a sliding window at each sampling step. The averaging
    /// window defaults to `period`; `Null` anywhere in a window makes
    /// that emission `Null`.
    pub fn moving_average(
        &self,
        period: T::Span,
        window_size: Option<T::Span>,
        window: &Window<'_, T>,
        placement: Placement,
    ) -> SeriesResult<Vec<(T, Value)>> {
        let (start, end) = self.resolve_bounds(window)?;
        check_period(period, start, end)?;
        let size = window_size.unwrap_or(period);
        if size.partial_cmp(&T::zero_span()) != Some(Ordering::Greater) {
            return Err(SeriesError::bad_argument("window size must be > 0"));
        }
        let half = T::half_span(size);

        let mut result = Vec::new();
        let mut current = start;
        while current.cmp_points(&end) != Ordering::Greater {
            let (w0, w1) = match placement {
                Placement::Center => (current.sub_span(half), current.add_span(half)),
                Placement::Left => (current, current.add_span(size)),
                Placement::Right => (current.sub_span(size), current),
            };
            let masked_in = window.mask.map(|m| *m.get(current)).unwrap_or(true);
            if masked_in {
                result.push((current, self.strict_windowed_mean(w0, w1)?));
            }
            current = current.add_span(period);
        }
        Ok(result)
    }

    /// Reduce the step function over fixed intervals, yielding one
    /// `(interval_start, reduced)` pair per left-closed/right-open
    /// interval.
    pub fn sample_interval(
        &self,
        boundaries: IntervalBoundaries<'_, T>,
        window: &Window<'_, T>,
        operation: IntervalOp,
    ) -> SeriesResult<Vec<(T, Value)>> {
        let edges: Vec<T> = match boundaries {
            IntervalBoundaries::Period(period) => {
                let (start, end) = self.resolve_bounds(window)?;
                check_period(period, start, end)?;
                let mut edges = vec![start];
                let mut current = start.add_span(period);
                while current.cmp_points(&end) == Ordering::Less {
                    edges.push(current);
                    current = current.add_span(period);
                }
                edges.push(end);
                edges
            }
            IntervalBoundaries::Index(index) => {
                if index.len() < 2 {
                    return Err(SeriesError::bad_argument(
                        "interval index needs at least two entries",
                    ));
                }
                if index
                    .windows(2)
                    .any(|pair| pair[0].cmp_points(&pair[1]) != Ordering::Less)
                {
                    return Err(SeriesError::bad_argument(
                        "interval index must be strictly increasing",
                    ));
                }
                index.to_vec()
            }
        };

        let mut result = Vec::with_capacity(edges.len() - 1);
        for pair in edges.windows(2) {
            let (b0, b1) = (pair[0], pair[1]);
            let reduced = match operation {
                IntervalOp::Mean => self.strict_windowed_mean(b0, b1)?,
                IntervalOp::Max | IntervalOp::Min => self.interval_extremum(b0, b1, operation)?,
            };
            result.push((b0, reduced));
        }
        Ok(result)
    }

    /// Extremum of the constant levels overlapping `[start, end)`.
    fn interval_extremum(&self, start: T, end: T, operation: IntervalOp) -> SeriesResult<Value> {
        let mut extremum: Option<Value> = None;
        for (_, _, value) in self.iter_periods(Some(start), Some(end))? {
            if value.is_null() {
                return Ok(Value::Null);
            }
            extremum = Some(match extremum {
                None => value.clone(),
                Some(current) => {
                    let replace = match operation {
                        IntervalOp::Max => value.total_cmp(&current)? == Ordering::Greater,
                        IntervalOp::Min | IntervalOp::Mean => {
                            value.total_cmp(&current)? == Ordering::Less
                        }
                    };
                    if replace {
                        value.clone()
                    } else {
                        current
                    }
                }
            });
        }
        Ok(extremum.unwrap_or(Value::Null))
    }
}

impl<T: CalendarPoint> TimeSeries<T, Value> {
    /// Apply a transform per calendar bin: the window start is floored to
    /// the unit boundary and each bin spans `n_units` of `unit`.
    pub fn bin_with<R, F>(
        &self,
        unit: DurationUnit,
        n_units: u32,
        window: &Window<'_, T>,
        mut transform: F,
    ) -> SeriesResult<Vec<(T, R)>>
    where
        F: FnMut(&Self, T, T) -> SeriesResult<R>,
    {
        let (start, end) = self.resolve_bounds(window)?;
        let mut bin_start = start.floor_to(unit, n_units)?;
        let mut result = Vec::new();
        while bin_start.cmp_points(&end) == Ordering::Less {
            let bin_end = bin_start.step_by(unit, n_units)?;
            result.push((bin_start, transform(self, bin_start, bin_end)?));
            bin_start = bin_end;
        }
        Ok(result)
    }

    /// Unnormalized distribution per calendar bin.
    pub fn bin(
        &self,
        unit: DurationUnit,
        n_units: u32,
        window: &Window<'_, T>,
    ) -> SeriesResult<Vec<(T, Histogram)>> {
        let mask = window.mask;
        self.bin_with(unit, n_units, window, |series, bin_start, bin_end| {
            let bin_window = Window {
                start: Some(bin_start),
                end: Some(bin_end),
                mask,
            };
            let options = DistributionOptions {
                normalized: false,
                interpolate: Interpolation::Previous,
            };
            series.distribution(&bin_window, &options)
        })
    }
}

/// Coarsen an already-computed bin map by summing the fine histograms
/// whose starts floor to the same coarse bin, saving a pass over the
/// series itself.
pub fn rebin<T: CalendarPoint>(
    finer: &[(T, Histogram)],
    unit: DurationUnit,
    n_units: u32,
) -> SeriesResult<Vec<(T, Histogram)>> {
    let mut result: Vec<(T, Histogram)> = Vec::new();
    for (fine_start, histogram) in finer {
        let coarse_start = fine_start.floor_to(unit, n_units)?;
        match result.last_mut() {
            Some((last_start, combined)) if last_start.cmp_points(&coarse_start).is_eq() => {
                *combined = combined.add(histogram)?;
            }
            _ => result.push((coarse_start, histogram.clone())),
        }
    }
    Ok(result)
}
