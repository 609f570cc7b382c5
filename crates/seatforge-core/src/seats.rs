//! Seat enumeration and eligibility.
//!
//! The eligibility predicates here are the single source of truth reused by
//! every engine; no engine re-implements its own seat checks.

use crate::domain::{ClassroomConfig, FixedPlacement, Position, SeatingArrangement, Student};
use crate::validate::ConstraintIndex;

/// Chebyshev distance between two seats: `max(|Δrow|, |Δcol|)`.
pub fn chebyshev(a: Position, b: Position) -> u8 {
    let dr = a.row.abs_diff(b.row);
    let dc = a.col.abs_diff(b.col);
    dr.max(dc)
}

/// All usable seats in row-major order, excluding disabled ones.
pub fn available_seats(classroom: &ClassroomConfig) -> Vec<Position> {
    let mut seats = Vec::with_capacity(classroom.total_seats());
    for row in 0..classroom.rows() {
        for col in 0..classroom.cols() {
            let pos = Position::new(row, col);
            if !classroom.is_disabled(pos) {
                seats.push(pos);
            }
        }
    }
    seats
}

/// The partner seat of `pos` on the same desk, if its column belongs to a
/// declared pair.
pub fn pair_partner(pos: Position, classroom: &ClassroomConfig) -> Option<Position> {
    for &(left, right) in classroom.pair_columns() {
        if pos.col == left {
            return Some(Position::new(pos.row, right));
        }
        if pos.col == right {
            return Some(Position::new(pos.row, left));
        }
    }
    None
}

/// Returns true if the two seats form a declared pair. Symmetric.
pub fn is_pair_position(a: Position, b: Position, classroom: &ClassroomConfig) -> bool {
    a.row == b.row
        && classroom
            .pair_columns()
            .iter()
            .any(|&(l, r)| (a.col, b.col) == (l, r) || (a.col, b.col) == (r, l))
}

/// All declared pair seats as `(left, right)` position pairs, row-major.
pub fn pair_seats(classroom: &ClassroomConfig) -> Vec<(Position, Position)> {
    let mut pairs = Vec::new();
    for row in 0..classroom.rows() {
        for &(left, right) in classroom.pair_columns() {
            pairs.push((Position::new(row, left), Position::new(row, right)));
        }
    }
    pairs
}

/// Basic single-seat eligibility: gender requirement, disabled flag and row
/// exclusion, in that order, short-circuiting on the first failure.
pub fn is_seat_eligible(
    student: &Student,
    pos: Position,
    classroom: &ClassroomConfig,
    index: &ConstraintIndex<'_>,
) -> bool {
    if !classroom.contains(pos) {
        return false;
    }
    if classroom
        .seat_gender(pos)
        .is_some_and(|required| required != student.gender)
    {
        return false;
    }
    if classroom.is_disabled(pos) {
        return false;
    }
    if let Some(rows_from_back) = index.row_exclusion(student.id) {
        if classroom.is_in_last_rows(pos.row, rows_from_back) {
            return false;
        }
    }
    true
}

/// Full eligibility against a partial seating: basic checks plus occupancy,
/// distance constraints and pair prohibitions against already-placed
/// partners.
pub fn is_eligible_in(
    student: &Student,
    pos: Position,
    classroom: &ClassroomConfig,
    index: &ConstraintIndex<'_>,
    seating: &SeatingArrangement,
) -> bool {
    if !is_seat_eligible(student, pos, classroom, index) {
        return false;
    }
    if seating
        .student_at(pos)
        .is_some_and(|occupant| occupant != student.id)
    {
        return false;
    }
    for (partner, min_distance) in index.distance_partners(student.id) {
        if let Some(partner_pos) = seating.position_of(partner) {
            if chebyshev(pos, partner_pos) < min_distance {
                return false;
            }
        }
    }
    for partner in index.prohibited_partners(student.id) {
        if let Some(partner_pos) = seating.position_of(partner) {
            if is_pair_position(pos, partner_pos, classroom) {
                return false;
            }
        }
    }
    true
}

/// Builds the initial seating from fixed placements.
///
/// Deterministic: placements are applied in slice order; entries that would
/// double-occupy are skipped (callers validate fixed placements up front).
pub fn seating_from_fixed(fixed: &[FixedPlacement]) -> SeatingArrangement {
    let mut seating = SeatingArrangement::new();
    for placement in fixed {
        seating.assign(placement.position, placement.student);
    }
    seating
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Constraint, ConstraintId, Gender, StudentId};

    fn room() -> ClassroomConfig {
        ClassroomConfig::new("room", 5, 6)
            .unwrap()
            .with_pair_columns(vec![(0, 1), (4, 5)])
            .unwrap()
    }

    #[test]
    fn test_chebyshev_symmetric_and_zero_on_self() {
        let a = Position::new(1, 5);
        let b = Position::new(4, 2);
        assert_eq!(chebyshev(a, b), chebyshev(b, a));
        assert_eq!(chebyshev(a, b), 3);
        assert_eq!(chebyshev(a, a), 0);
    }

    #[test]
    fn test_available_seats_excludes_disabled() {
        let mut classroom = room();
        classroom.disable_seat(Position::new(1, 1), None).unwrap();
        let seats = available_seats(&classroom);
        assert_eq!(seats.len(), 29);
        assert!(!seats.contains(&Position::new(1, 1)));
        // Row-major ordering.
        assert_eq!(seats[0], Position::new(0, 0));
    }

    #[test]
    fn test_pair_partner_and_symmetry() {
        let classroom = room();
        assert_eq!(
            pair_partner(Position::new(2, 0), &classroom),
            Some(Position::new(2, 1))
        );
        assert_eq!(
            pair_partner(Position::new(2, 5), &classroom),
            Some(Position::new(2, 4))
        );
        assert_eq!(pair_partner(Position::new(2, 2), &classroom), None);

        let a = Position::new(3, 4);
        let b = Position::new(3, 5);
        assert_eq!(
            is_pair_position(a, b, &classroom),
            is_pair_position(b, a, &classroom)
        );
        assert!(is_pair_position(a, b, &classroom));
        // Same columns, different rows: not a pair.
        assert!(!is_pair_position(a, Position::new(2, 5), &classroom));
    }

    #[test]
    fn test_basic_eligibility_order() {
        let mut classroom = room();
        classroom
            .require_gender(Position::new(0, 0), Gender::Female)
            .unwrap();
        classroom.disable_seat(Position::new(0, 2), None).unwrap();

        let constraints = [Constraint::row_exclusion(ConstraintId(1), StudentId(1), 1)];
        let index = ConstraintIndex::build(&constraints);
        let boy = Student::new(StudentId(1), "Taro", Gender::Male);

        assert!(!is_seat_eligible(&boy, Position::new(0, 0), &classroom, &index));
        assert!(!is_seat_eligible(&boy, Position::new(0, 2), &classroom, &index));
        // Last row excluded for student 1.
        assert!(!is_seat_eligible(&boy, Position::new(4, 3), &classroom, &index));
        assert!(is_seat_eligible(&boy, Position::new(0, 3), &classroom, &index));
    }

    #[test]
    fn test_full_eligibility_checks_partners() {
        let classroom = room();
        let constraints = [
            Constraint::distance(ConstraintId(1), StudentId(1), StudentId(2), 3),
            Constraint::pair_prohibited(ConstraintId(2), StudentId(1), StudentId(3)),
        ];
        let index = ConstraintIndex::build(&constraints);
        let student = Student::new(StudentId(1), "Taro", Gender::Male);

        let mut seating = SeatingArrangement::new();
        seating.assign(Position::new(0, 0), StudentId(2));
        seating.assign(Position::new(4, 5), StudentId(3));

        // Occupied seat.
        assert!(!is_eligible_in(&student, Position::new(0, 0), &classroom, &index, &seating));
        // Too close to the distance partner.
        assert!(!is_eligible_in(&student, Position::new(1, 1), &classroom, &index, &seating));
        // Would share a desk with the prohibited partner.
        assert!(!is_eligible_in(&student, Position::new(4, 4), &classroom, &index, &seating));
        // Far enough and unpaired.
        assert!(is_eligible_in(&student, Position::new(3, 3), &classroom, &index, &seating));
    }

    #[test]
    fn test_seating_from_fixed_is_deterministic() {
        let fixed = vec![
            FixedPlacement::new(StudentId(1), Position::new(0, 0)),
            FixedPlacement::new(StudentId(2), Position::new(1, 1)),
            // Conflicting duplicate is skipped.
            FixedPlacement::new(StudentId(3), Position::new(0, 0)),
        ];
        let seating = seating_from_fixed(&fixed);
        assert_eq!(seating.len(), 2);
        assert_eq!(seating.student_at(Position::new(0, 0)), Some(StudentId(1)));
    }
}
