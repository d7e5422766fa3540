//! Crate-wide error type.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    /// An operation that needs a bound route ran before one was bound.
    #[error("simulation not initialized: no route bound")]
    NotInitialized,

    /// Speed values must be positive and finite. Rejected atomically:
    /// the clock that received the bad value is left untouched.
    #[error("invalid speed {got} km/h (must be a positive, finite number)")]
    InvalidSpeed { got: f64 },

    #[error("invalid start offset {got} km (must be a non-negative, finite number)")]
    InvalidStartOffset { got: f64 },

    #[error("degenerate route: {reason}")]
    DegenerateRoute { reason: String },

    #[error("invalid athlete '{id}': {source}")]
    InvalidAthlete {
        id: String,
        #[source]
        source: Box<SimError>,
    },

    #[error("duplicate athlete id '{id}'")]
    DuplicateAthlete { id: String },
}
