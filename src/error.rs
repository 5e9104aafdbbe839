use thiserror::Error;

/// Enum for the errors a series operation can surface.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SeriesError {
    #[error("no measurement at {0}")]
    NoKeyAtTime(String),

    #[error("no start/end given and no measurements to infer them from")]
    UndefinedWindow,

    #[error("bad argument: {0}")]
    BadArgument(String),

    #[error("elements cannot be ordered: {0}")]
    UnorderableElements(String),

    #[error("unknown interpolation '{0}', expected 'previous' or 'linear'")]
    InterpolationUnsupported(String),
}

pub type SeriesResult<T> = Result<T, SeriesError>;

impl SeriesError {
    pub(crate) fn no_key_at<T: std::fmt::Debug>(time: &T) -> SeriesError {
        SeriesError::NoKeyAtTime(format!("{time:?}"))
    }

    pub(crate) fn bad_argument(msg: impl Into<String>) -> SeriesError {
        SeriesError::BadArgument(msg.into())
    }
}
