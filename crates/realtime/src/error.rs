//! Tracking engine errors

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the crate.
pub type Result<T> = anyhow::Result<T, Error>;

/// Domain level error type returned by the tracking engine.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Error {
    /// The input is malformed or a coordinate is missing or out of range.
    #[error("code: 400, description: {0}")]
    Validation(String),

    /// The operation referenced a vehicle that has never reported.
    #[error("code: 404, description: {0}")]
    NotFound(String),

    /// Route data is malformed, e.g. a zero-length segment.
    #[error("code: 500, description: computation_error {0}")]
    Computation(String),

    /// A collaborator (persistence, messaging) failed.
    #[error("code: 500, description: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the stable error code associated with the variant.
    #[must_use]
    pub const fn code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Computation(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error description.
    #[must_use]
    pub fn description(&self) -> String {
        self.to_string()
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        let chain = err.chain().map(ToString::to_string).collect::<Vec<_>>().join(" -> ");

        // if type is Error, return it with the newly added context
        if let Some(inner) = err.downcast_ref::<Self>() {
            tracing::debug!("Error: {err}, caused by: {inner}");

            return match inner {
                Self::Validation(_) => Self::Validation(chain),
                Self::NotFound(_) => Self::NotFound(chain),
                Self::Computation(e) => Self::Computation(format!("{err}: {e}")),
                Self::Internal(_) => Self::Internal(chain),
            };
        }

        // otherwise, return an Internal error
        Self::Internal(chain)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("failed to (de)serialize tracking state: {err}"))
    }
}

#[macro_export]
macro_rules! validation {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::Validation(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::Validation(format!($err))
    };
}

#[macro_export]
macro_rules! not_found {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::NotFound(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::NotFound(format!($err))
    };
}

#[macro_export]
macro_rules! computation {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::Computation(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::Computation(format!($err))
    };
}
