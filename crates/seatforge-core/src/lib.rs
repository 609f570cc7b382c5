//! Seatforge Core - Domain types and constraint validation
//!
//! This crate provides the data model and pure functions underlying the
//! seat assignment engines:
//! - The domain model: students, classroom grids, constraints, seatings
//! - Seat utilities: enumeration, pair seats, the shared eligibility checks
//! - The validator: violation computation and the compatibility pre-check

pub mod domain;
pub mod error;
pub mod seats;
pub mod validate;

pub use domain::{
    ClassroomConfig, Constraint, ConstraintId, ConstraintKind, ConstraintViolation,
    FixedPlacement, Gender, PlacementResult, PlacementStats, Position, SeatingArrangement,
    Student, StudentId, ViolationKind,
};
pub use error::SeatforgeError;
pub use validate::{check_compatibility, validate_all, Compatibility, ConstraintIndex, Validation};
