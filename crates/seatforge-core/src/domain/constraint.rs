//! Placement constraints.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::domain::position::Position;
use crate::domain::student::StudentId;

/// Unique constraint identifier, used by callers to remove constraints later.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ConstraintId(pub u64);

/// A placement rule between students, or between a student and the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub id: ConstraintId,
    pub created_at: SystemTime,
    pub kind: ConstraintKind,
}

/// The closed set of constraint kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintKind {
    /// The two students must share a pair seat (same desk).
    PairRequired { a: StudentId, b: StudentId },

    /// The two students must not share a pair seat.
    PairProhibited { a: StudentId, b: StudentId },

    /// Chebyshev distance between the two seats must be at least `min_distance`.
    Distance {
        a: StudentId,
        b: StudentId,
        min_distance: u8,
    },

    /// The student may not sit in the last `rows_from_back` rows.
    RowExclusion {
        student: StudentId,
        rows_from_back: u8,
    },
}

impl Constraint {
    fn new(id: ConstraintId, kind: ConstraintKind) -> Self {
        Self {
            id,
            created_at: SystemTime::now(),
            kind,
        }
    }

    pub fn pair_required(id: ConstraintId, a: StudentId, b: StudentId) -> Self {
        Self::new(id, ConstraintKind::PairRequired { a, b })
    }

    pub fn pair_prohibited(id: ConstraintId, a: StudentId, b: StudentId) -> Self {
        Self::new(id, ConstraintKind::PairProhibited { a, b })
    }

    pub fn distance(id: ConstraintId, a: StudentId, b: StudentId, min_distance: u8) -> Self {
        Self::new(id, ConstraintKind::Distance { a, b, min_distance })
    }

    pub fn row_exclusion(id: ConstraintId, student: StudentId, rows_from_back: u8) -> Self {
        Self::new(
            id,
            ConstraintKind::RowExclusion {
                student,
                rows_from_back,
            },
        )
    }
}

impl ConstraintKind {
    /// Search weight used for most-constraining-variable ordering.
    pub fn weight(&self) -> u32 {
        match self {
            ConstraintKind::PairRequired { .. } => 10,
            ConstraintKind::Distance { .. } => 8,
            ConstraintKind::PairProhibited { .. } => 7,
            ConstraintKind::RowExclusion { .. } => 5,
        }
    }

    /// The students this constraint mentions.
    pub fn students(&self) -> (StudentId, Option<StudentId>) {
        match *self {
            ConstraintKind::PairRequired { a, b }
            | ConstraintKind::PairProhibited { a, b }
            | ConstraintKind::Distance { a, b, .. } => (a, Some(b)),
            ConstraintKind::RowExclusion { student, .. } => (student, None),
        }
    }

    /// Returns true if the constraint mentions the given student.
    pub fn involves(&self, id: StudentId) -> bool {
        let (a, b) = self.students();
        a == id || b == Some(id)
    }

    /// For binary constraints, the partner of `id` (if `id` is involved).
    pub fn partner_of(&self, id: StudentId) -> Option<StudentId> {
        match self.students() {
            (a, Some(b)) if a == id => Some(b),
            (a, Some(b)) if b == id => Some(a),
            _ => None,
        }
    }
}

/// Violation categories reported by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    PairRequired,
    PairProhibited,
    Distance,
    Gender,
    DisabledSeat,
    RowExclusion,
    /// A constraint references a student id that does not exist.
    UnknownStudent,
}

/// A single constraint violation found in a seating arrangement.
///
/// Produced by the validator, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintViolation {
    pub kind: ViolationKind,
    pub message: String,
    pub students: Vec<StudentId>,
    #[serde(default)]
    pub positions: Vec<Position>,
}

impl ConstraintViolation {
    pub fn new(kind: ViolationKind, message: impl Into<String>, students: Vec<StudentId>) -> Self {
        Self {
            kind,
            message: message.into(),
            students,
            positions: Vec::new(),
        }
    }

    pub fn with_positions(mut self, positions: Vec<Position>) -> Self {
        self.positions = positions;
        self
    }
}
