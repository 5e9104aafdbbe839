//! Tools for analyzing step functions built from measurements at
//! unevenly-spaced times.
//!
//! A [`TimeSeries`] maps a totally ordered time axis (integers, floats or
//! wall-clock instants) to arbitrary values and reads as a
//! right-continuous step function: the value at any time is the most
//! recent measurement, with a default extending back before the first
//! one. On top of that single idea the crate layers period iteration, a
//! K-way [`merge`](crate::merge) engine for n-ary operations,
//! duration-weighted aggregation into [`Histogram`]s, resampling, and
//! [`EventSeries`] for counting point events.
//!
//! ```
//! use steptrace::{TimeSeries, Value, Window};
//!
//! let mut lights_on = TimeSeries::new(Value::Bool(false));
//! lights_on.set(6.0, Value::Bool(true), false);
//! lights_on.set(9.0, Value::Bool(false), false);
//! lights_on.set(18.0, Value::Bool(true), false);
//! lights_on.set(23.0, Value::Bool(false), false);
//!
//! // fraction of the day the lights were burning
//! let mean = lights_on.mean(&Window::between(0.0, 24.0)).unwrap();
//! assert_eq!(mean, Some(8.0 / 24.0));
//! ```

pub mod aggregation;
pub mod common;
pub mod error;
pub mod merge;
pub mod resample;
pub mod series;
pub mod storage;

#[cfg(test)]
mod tests;

pub use aggregation::{DistributionOptions, Histogram, Window};
pub use common::{CalendarPoint, DurationUnit, Interpolation, TimePoint, Value};
pub use error::{SeriesError, SeriesResult};
pub use merge::{
    iter_merge, iter_merge_heap, iter_merge_transitions, merge, merge_stack, merge_with, MergeRow,
    StateVec, Transition,
};
pub use resample::{rebin, IntervalBoundaries, IntervalOp, Placement};
pub use series::{ignorant, strict, sum_values, EventSeries, PeriodFilter, PeriodIter, TimeSeries};
pub use storage::SortedMap;
