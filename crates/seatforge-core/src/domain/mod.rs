//! The seating domain model: pure data plus invariants.

mod classroom;
mod constraint;
mod placement;
mod position;
mod seating;
mod student;

pub use classroom::{ClassroomConfig, SeatUsage, MAX_DIMENSION, MIN_DIMENSION};
pub use constraint::{
    Constraint, ConstraintId, ConstraintKind, ConstraintViolation, ViolationKind,
};
pub use placement::{PlacementResult, PlacementStats};
pub use position::Position;
pub use seating::{FixedPlacement, SeatingArrangement};
pub use student::{Gender, Student, StudentId};
