pub mod time;
pub mod types;
pub mod value;

pub use time::{CalendarPoint, DurationUnit, TimePoint};
pub use types::Interpolation;
pub use value::Value;
