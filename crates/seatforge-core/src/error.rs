//! Error types for Seatforge

use thiserror::Error;

/// Main error type for Seatforge operations.
///
/// Only caller bugs (malformed grids, contradictory fixed placements,
/// unparseable configuration) surface as errors. Search outcomes such as
/// "could not place everyone" are reported through
/// [`PlacementResult`](crate::domain::PlacementResult) instead.
#[derive(Debug, Error)]
pub enum SeatforgeError {
    /// Classroom dimensions or seat declarations are invalid
    #[error("Invalid classroom: {0}")]
    InvalidClassroom(String),

    /// A fixed placement contradicts the grid or another placement
    #[error("Invalid placement: {0}")]
    InvalidPlacement(String),

    /// Error in engine or run configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for Seatforge operations
pub type Result<T> = std::result::Result<T, SeatforgeError>;
