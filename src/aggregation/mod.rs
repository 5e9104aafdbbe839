mod distribution;
mod histogram;

pub use distribution::{DistributionOptions, Window};
pub use histogram::Histogram;
