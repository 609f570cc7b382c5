//! Per-invocation placement context.

use std::collections::{HashMap, HashSet};

use seatforge_core::domain::{
    ClassroomConfig, Constraint, FixedPlacement, PlacementResult, SeatingArrangement, Student,
    StudentId,
};
use seatforge_core::error::{Result, SeatforgeError};
use seatforge_core::seats;
use seatforge_core::validate::{self, ConstraintIndex};

/// Borrowed inputs plus the lookup indexes built once per invocation.
///
/// Engines read the context and work on their own copy-on-write seating
/// maps; caller-owned data is never mutated.
#[derive(Debug)]
pub struct PlacementContext<'a> {
    students: &'a [Student],
    classroom: &'a ClassroomConfig,
    constraints: &'a [Constraint],
    fixed: &'a [FixedPlacement],
    index: ConstraintIndex<'a>,
    by_id: HashMap<StudentId, &'a Student>,
    /// Students the engines are asked to place: the roster minus fixed ids.
    placeable: Vec<StudentId>,
}

impl<'a> PlacementContext<'a> {
    /// Builds a context, failing fast on caller bugs in the fixed placements.
    ///
    /// # Errors
    ///
    /// Returns [`SeatforgeError::InvalidPlacement`] when a fixed placement
    /// lies outside the grid, double-occupies a seat or student, or
    /// references a student missing from the roster.
    pub fn new(
        students: &'a [Student],
        classroom: &'a ClassroomConfig,
        constraints: &'a [Constraint],
        fixed: &'a [FixedPlacement],
    ) -> Result<Self> {
        let by_id: HashMap<StudentId, &Student> = students.iter().map(|s| (s.id, s)).collect();

        let mut fixed_ids = HashSet::new();
        let mut fixed_seats = HashSet::new();
        for placement in fixed {
            if !classroom.contains(placement.position) {
                return Err(SeatforgeError::InvalidPlacement(format!(
                    "fixed placement for {} is outside the grid at {}",
                    placement.student, placement.position
                )));
            }
            if !by_id.contains_key(&placement.student) {
                return Err(SeatforgeError::InvalidPlacement(format!(
                    "fixed placement references student {} missing from the roster",
                    placement.student
                )));
            }
            if !fixed_ids.insert(placement.student) || !fixed_seats.insert(placement.position) {
                return Err(SeatforgeError::InvalidPlacement(format!(
                    "fixed placements collide at {} (student {})",
                    placement.position, placement.student
                )));
            }
        }

        let placeable = students
            .iter()
            .filter(|s| !fixed_ids.contains(&s.id))
            .map(|s| s.id)
            .collect();

        Ok(Self {
            students,
            classroom,
            constraints,
            fixed,
            index: ConstraintIndex::build(constraints),
            by_id,
            placeable,
        })
    }

    pub fn students(&self) -> &'a [Student] {
        self.students
    }

    pub fn classroom(&self) -> &'a ClassroomConfig {
        self.classroom
    }

    pub fn constraints(&self) -> &'a [Constraint] {
        self.constraints
    }

    pub fn index(&self) -> &ConstraintIndex<'a> {
        &self.index
    }

    /// Roster lookup by id.
    pub fn student(&self, id: StudentId) -> Option<&'a Student> {
        self.by_id.get(&id).copied()
    }

    /// Ids of the students the engines must place, in roster order.
    pub fn placeable(&self) -> &[StudentId] {
        &self.placeable
    }

    /// The students the engines must place, in roster order.
    pub fn placeable_students(&self) -> impl Iterator<Item = &'a Student> + '_ {
        self.placeable.iter().filter_map(|id| self.student(*id))
    }

    pub fn fixed(&self) -> &'a [FixedPlacement] {
        self.fixed
    }

    /// The seating every engine starts from: fixed placements applied.
    pub fn fixed_seating(&self) -> SeatingArrangement {
        seats::seating_from_fixed(self.fixed)
    }

    /// Assembles a [`PlacementResult`], validating the seating.
    pub fn build_result(
        &self,
        seating: SeatingArrangement,
        message: impl Into<String>,
    ) -> PlacementResult {
        let validation =
            validate::validate_all(&seating, self.students, self.classroom, self.constraints);
        PlacementResult::from_run(
            seating,
            message,
            validation.violations,
            self.classroom,
            self.placeable.len(),
            self.fixed.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatforge_core::domain::{Gender, Position};

    fn room() -> ClassroomConfig {
        ClassroomConfig::new("room", 3, 3).unwrap()
    }

    fn roster() -> Vec<Student> {
        vec![
            Student::new(StudentId(1), "Aiko", Gender::Female),
            Student::new(StudentId(2), "Taro", Gender::Male),
        ]
    }

    #[test]
    fn test_fixed_students_are_not_placeable() {
        let students = roster();
        let classroom = room();
        let fixed = vec![FixedPlacement::new(StudentId(1), Position::new(0, 0))];
        let ctx = PlacementContext::new(&students, &classroom, &[], &fixed).unwrap();
        assert_eq!(ctx.placeable(), &[StudentId(2)]);
        assert_eq!(ctx.fixed_seating().len(), 1);
    }

    #[test]
    fn test_fixed_placement_out_of_grid_fails_fast() {
        let students = roster();
        let classroom = room();
        let fixed = vec![FixedPlacement::new(StudentId(1), Position::new(5, 5))];
        assert!(PlacementContext::new(&students, &classroom, &[], &fixed).is_err());
    }

    #[test]
    fn test_colliding_fixed_placements_fail_fast() {
        let students = roster();
        let classroom = room();
        let fixed = vec![
            FixedPlacement::new(StudentId(1), Position::new(0, 0)),
            FixedPlacement::new(StudentId(2), Position::new(0, 0)),
        ];
        assert!(PlacementContext::new(&students, &classroom, &[], &fixed).is_err());
    }

    #[test]
    fn test_unknown_fixed_student_fails_fast() {
        let students = roster();
        let classroom = room();
        let fixed = vec![FixedPlacement::new(StudentId(9), Position::new(0, 0))];
        assert!(PlacementContext::new(&students, &classroom, &[], &fixed).is_err());
    }
}
