//! Seating arrangements and fixed placements.

use std::collections::HashMap;
use std::time::SystemTime;

use serde::de::{Deserialize, Deserializer, Error as DeError};
use serde::ser::{Serialize, Serializer};

use crate::domain::position::Position;
use crate::domain::student::StudentId;

/// A sparse seat-to-student mapping.
///
/// Invariant: a seat holds at most one student and a student occupies at
/// most one seat. A reverse index is kept in sync with the forward map so
/// both directions are O(1).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeatingArrangement {
    by_seat: HashMap<Position, StudentId>,
    by_student: HashMap<StudentId, Position>,
}

impl SeatingArrangement {
    /// Creates an empty arrangement.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occupied seats.
    pub fn len(&self) -> usize {
        self.by_seat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_seat.is_empty()
    }

    /// Returns the occupant of a seat.
    pub fn student_at(&self, pos: Position) -> Option<StudentId> {
        self.by_seat.get(&pos).copied()
    }

    /// Returns the seat of a student.
    pub fn position_of(&self, student: StudentId) -> Option<Position> {
        self.by_student.get(&student).copied()
    }

    pub fn is_occupied(&self, pos: Position) -> bool {
        self.by_seat.contains_key(&pos)
    }

    pub fn contains_student(&self, student: StudentId) -> bool {
        self.by_student.contains_key(&student)
    }

    /// Assigns a student to a seat.
    ///
    /// Refuses double occupancy in either direction; returns false and
    /// leaves the arrangement untouched if the seat or the student is
    /// already taken.
    pub fn assign(&mut self, pos: Position, student: StudentId) -> bool {
        if self.by_seat.contains_key(&pos) || self.by_student.contains_key(&student) {
            return false;
        }
        self.by_seat.insert(pos, student);
        self.by_student.insert(student, pos);
        true
    }

    /// Clears a seat, returning its former occupant.
    pub fn clear_seat(&mut self, pos: Position) -> Option<StudentId> {
        let student = self.by_seat.remove(&pos)?;
        self.by_student.remove(&student);
        Some(student)
    }

    /// Removes a student, returning the seat they held.
    pub fn remove_student(&mut self, student: StudentId) -> Option<Position> {
        let pos = self.by_student.remove(&student)?;
        self.by_seat.remove(&pos);
        Some(pos)
    }

    /// Iterates over `(seat, student)` entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, StudentId)> + '_ {
        self.by_seat.iter().map(|(&p, &s)| (p, s))
    }

    /// Entries sorted by position, for deterministic output.
    pub fn sorted_entries(&self) -> Vec<(Position, StudentId)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by_key(|(pos, _)| *pos);
        entries
    }
}

impl Serialize for SeatingArrangement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.sorted_entries().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SeatingArrangement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries: Vec<(Position, StudentId)> = Vec::deserialize(deserializer)?;
        let mut seating = SeatingArrangement::new();
        for (pos, student) in entries {
            if !seating.assign(pos, student) {
                return Err(D::Error::custom(format!(
                    "duplicate seating entry for seat {pos} or student {student}"
                )));
            }
        }
        Ok(seating)
    }
}

/// A student pinned to a seat before search begins.
///
/// Engines treat the seat as pre-occupied and never relocate the student.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FixedPlacement {
    pub student: StudentId,
    pub position: Position,
    pub pinned_at: SystemTime,
    #[serde(default)]
    pub reason: Option<String>,
}

impl FixedPlacement {
    pub fn new(student: StudentId, position: Position) -> Self {
        Self {
            student,
            position,
            pinned_at: SystemTime::now(),
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_double_occupancy() {
        let mut seating = SeatingArrangement::new();
        assert!(seating.assign(Position::new(0, 0), StudentId(1)));
        // Same seat, different student.
        assert!(!seating.assign(Position::new(0, 0), StudentId(2)));
        // Same student, different seat.
        assert!(!seating.assign(Position::new(1, 1), StudentId(1)));
        assert_eq!(seating.len(), 1);
    }

    #[test]
    fn test_reverse_index_stays_in_sync() {
        let mut seating = SeatingArrangement::new();
        seating.assign(Position::new(2, 3), StudentId(7));
        assert_eq!(seating.position_of(StudentId(7)), Some(Position::new(2, 3)));

        assert_eq!(seating.clear_seat(Position::new(2, 3)), Some(StudentId(7)));
        assert_eq!(seating.position_of(StudentId(7)), None);

        seating.assign(Position::new(1, 1), StudentId(7));
        assert_eq!(seating.remove_student(StudentId(7)), Some(Position::new(1, 1)));
        assert!(!seating.is_occupied(Position::new(1, 1)));
    }

    #[test]
    fn test_sorted_entries_are_row_major() {
        let mut seating = SeatingArrangement::new();
        seating.assign(Position::new(1, 0), StudentId(2));
        seating.assign(Position::new(0, 2), StudentId(1));
        let entries = seating.sorted_entries();
        assert_eq!(entries[0].0, Position::new(0, 2));
        assert_eq!(entries[1].0, Position::new(1, 0));
    }
}
