mod event_series;
mod operations;
mod periods;
mod time_series;

pub use event_series::EventSeries;
pub use operations::{ignorant, strict, sum_values};
pub use periods::{PeriodFilter, PeriodIter};
pub use time_series::TimeSeries;
