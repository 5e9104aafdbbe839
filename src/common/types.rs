use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SeriesError;

/// How to read a series between measurements.
///
/// `Previous` is the step-function semantics and the default everywhere;
/// `Linear` joins adjacent measurements for scalar reads and the
/// aggregations that opt into it. There is no spline mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interpolation {
    #[default]
    Previous,
    Linear,
}

impl FromStr for Interpolation {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self, SeriesError> {
        match s {
            "previous" => Ok(Interpolation::Previous),
            "linear" => Ok(Interpolation::Linear),
            other => Err(SeriesError::InterpolationUnsupported(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolation_parsing() {
        assert_eq!(
            "previous".parse::<Interpolation>().unwrap(),
            Interpolation::Previous
        );
        assert_eq!(
            "linear".parse::<Interpolation>().unwrap(),
            Interpolation::Linear
        );
        assert!(matches!(
            "spline".parse::<Interpolation>(),
            Err(SeriesError::InterpolationUnsupported(_))
        ));
    }
}
