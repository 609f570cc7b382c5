//! Constraint validation.
//!
//! Two pure entry points: [`validate_all`] computes the violations of a
//! (possibly partial) seating, and [`check_compatibility`] detects
//! contradictory constraint combinations before any search starts. Both are
//! side-effect free and run in O(|constraints| + |seating|).

use std::collections::HashMap;

use crate::domain::{
    ClassroomConfig, Constraint, ConstraintKind, ConstraintViolation, Gender, Position,
    SeatingArrangement, Student, StudentId, ViolationKind,
};
use crate::seats::{chebyshev, is_pair_position, pair_seats};

/// Per-invocation constraint lookup index.
///
/// Built once per validation or search run so that every per-student lookup
/// is O(1) instead of a scan over the constraint list.
#[derive(Debug)]
pub struct ConstraintIndex<'a> {
    constraints: &'a [Constraint],
    by_student: HashMap<StudentId, Vec<usize>>,
}

impl<'a> ConstraintIndex<'a> {
    /// Builds the index over a constraint slice.
    pub fn build(constraints: &'a [Constraint]) -> Self {
        let mut by_student: HashMap<StudentId, Vec<usize>> = HashMap::new();
        for (i, constraint) in constraints.iter().enumerate() {
            let (a, b) = constraint.kind.students();
            by_student.entry(a).or_default().push(i);
            if let Some(b) = b {
                by_student.entry(b).or_default().push(i);
            }
        }
        Self {
            constraints,
            by_student,
        }
    }

    /// All indexed constraints, in caller order.
    pub fn all(&self) -> &'a [Constraint] {
        self.constraints
    }

    /// Constraints mentioning the given student, in caller order.
    pub fn for_student(&self, id: StudentId) -> impl Iterator<Item = &'a Constraint> + '_ {
        self.by_student
            .get(&id)
            .into_iter()
            .flatten()
            .map(move |&i| &self.constraints[i])
    }

    /// Cumulative search weight of the student's constraints.
    pub fn weight_of(&self, id: StudentId) -> u32 {
        self.for_student(id).map(|c| c.kind.weight()).sum()
    }

    /// Number of binary constraint edges incident to the student.
    pub fn degree(&self, id: StudentId) -> usize {
        self.for_student(id)
            .filter(|c| c.kind.partner_of(id).is_some())
            .count()
    }

    /// Returns true if any constraint mentions the student.
    pub fn has_constraints(&self, id: StudentId) -> bool {
        self.by_student.contains_key(&id)
    }

    /// Required-pair partners of the student.
    pub fn required_partners(&self, id: StudentId) -> impl Iterator<Item = StudentId> + '_ {
        self.for_student(id).filter_map(move |c| match c.kind {
            ConstraintKind::PairRequired { .. } => c.kind.partner_of(id),
            _ => None,
        })
    }

    /// Prohibited-pair partners of the student.
    pub fn prohibited_partners(&self, id: StudentId) -> impl Iterator<Item = StudentId> + '_ {
        self.for_student(id).filter_map(move |c| match c.kind {
            ConstraintKind::PairProhibited { .. } => c.kind.partner_of(id),
            _ => None,
        })
    }

    /// Distance-constraint partners of the student with the required minimum.
    pub fn distance_partners(&self, id: StudentId) -> impl Iterator<Item = (StudentId, u8)> + '_ {
        self.for_student(id).filter_map(move |c| match c.kind {
            ConstraintKind::Distance { min_distance, .. } => {
                c.kind.partner_of(id).map(|p| (p, min_distance))
            }
            _ => None,
        })
    }

    /// The strictest row exclusion declared for the student, if any.
    pub fn row_exclusion(&self, id: StudentId) -> Option<u8> {
        self.for_student(id)
            .filter_map(|c| match c.kind {
                ConstraintKind::RowExclusion {
                    student,
                    rows_from_back,
                } if student == id => Some(rows_from_back),
                _ => None,
            })
            .max()
    }
}

/// Outcome of [`validate_all`].
#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    pub is_valid: bool,
    pub violations: Vec<ConstraintViolation>,
}

/// Outcome of [`check_compatibility`].
#[derive(Debug, Clone, PartialEq)]
pub struct Compatibility {
    pub is_valid: bool,
    /// Human-readable descriptions of unsatisfiable combinations.
    pub conflicts: Vec<String>,
}

fn student_name(students: &HashMap<StudentId, &Student>, id: StudentId) -> String {
    students
        .get(&id)
        .map(|s| s.name.clone())
        .unwrap_or_else(|| id.to_string())
}

/// Validates a seating against every constraint plus seat-level rules.
///
/// Checks run independently and cumulatively: a required pair whose members
/// are unseated is reported with an explanatory message rather than being
/// silently skipped, and a constraint referencing an unknown student id
/// produces an `UnknownStudent` violation instead of a panic.
pub fn validate_all(
    seating: &SeatingArrangement,
    students: &[Student],
    classroom: &ClassroomConfig,
    constraints: &[Constraint],
) -> Validation {
    let by_id: HashMap<StudentId, &Student> = students.iter().map(|s| (s.id, s)).collect();
    let mut violations = Vec::new();

    for constraint in constraints {
        check_constraint(constraint, seating, classroom, &by_id, &mut violations);
    }

    // Seat-level rules apply to every occupant, fixed placements included.
    for (pos, id) in seating.sorted_entries() {
        let Some(student) = by_id.get(&id) else {
            violations.push(
                ConstraintViolation::new(
                    ViolationKind::UnknownStudent,
                    format!("seat {pos} is held by unknown student {id}"),
                    vec![id],
                )
                .with_positions(vec![pos]),
            );
            continue;
        };
        if let Some(required) = classroom.seat_gender(pos) {
            if required != student.gender {
                violations.push(
                    ConstraintViolation::new(
                        ViolationKind::Gender,
                        format!("seat {pos} is reserved for the other gender ({})", student.name),
                        vec![id],
                    )
                    .with_positions(vec![pos]),
                );
            }
        }
        if classroom.is_disabled(pos) {
            violations.push(
                ConstraintViolation::new(
                    ViolationKind::DisabledSeat,
                    format!("{} occupies disabled seat {pos}", student.name),
                    vec![id],
                )
                .with_positions(vec![pos]),
            );
        }
    }

    Validation {
        is_valid: violations.is_empty(),
        violations,
    }
}

fn check_constraint(
    constraint: &Constraint,
    seating: &SeatingArrangement,
    classroom: &ClassroomConfig,
    by_id: &HashMap<StudentId, &Student>,
    violations: &mut Vec<ConstraintViolation>,
) {
    let (first, second) = constraint.kind.students();
    for id in std::iter::once(first).chain(second) {
        if !by_id.contains_key(&id) {
            violations.push(ConstraintViolation::new(
                ViolationKind::UnknownStudent,
                format!("constraint references unknown student {id}"),
                vec![id],
            ));
            return;
        }
    }

    match constraint.kind {
        ConstraintKind::PairRequired { a, b } => {
            match (seating.position_of(a), seating.position_of(b)) {
                (Some(pa), Some(pb)) => {
                    if !is_pair_position(pa, pb, classroom) {
                        violations.push(
                            ConstraintViolation::new(
                                ViolationKind::PairRequired,
                                format!(
                                    "{} and {} must share a desk but sit at {pa} and {pb}",
                                    student_name(by_id, a),
                                    student_name(by_id, b)
                                ),
                                vec![a, b],
                            )
                            .with_positions(vec![pa, pb]),
                        );
                    }
                }
                _ => {
                    violations.push(ConstraintViolation::new(
                        ViolationKind::PairRequired,
                        format!(
                            "{} and {} must share a desk but are not both seated",
                            student_name(by_id, a),
                            student_name(by_id, b)
                        ),
                        vec![a, b],
                    ));
                }
            }
        }
        ConstraintKind::PairProhibited { a, b } => {
            if let (Some(pa), Some(pb)) = (seating.position_of(a), seating.position_of(b)) {
                if is_pair_position(pa, pb, classroom) {
                    violations.push(
                        ConstraintViolation::new(
                            ViolationKind::PairProhibited,
                            format!(
                                "{} and {} must not share a desk",
                                student_name(by_id, a),
                                student_name(by_id, b)
                            ),
                            vec![a, b],
                        )
                        .with_positions(vec![pa, pb]),
                    );
                }
            }
        }
        ConstraintKind::Distance { a, b, min_distance } => {
            if let (Some(pa), Some(pb)) = (seating.position_of(a), seating.position_of(b)) {
                let actual = chebyshev(pa, pb);
                if actual < min_distance {
                    violations.push(
                        ConstraintViolation::new(
                            ViolationKind::Distance,
                            format!(
                                "{} and {} must be at least {min_distance} seats apart (currently {actual})",
                                student_name(by_id, a),
                                student_name(by_id, b)
                            ),
                            vec![a, b],
                        )
                        .with_positions(vec![pa, pb]),
                    );
                }
            }
        }
        ConstraintKind::RowExclusion {
            student,
            rows_from_back,
        } => {
            if let Some(pos) = seating.position_of(student) {
                if classroom.is_in_last_rows(pos.row, rows_from_back) {
                    violations.push(
                        ConstraintViolation::new(
                            ViolationKind::RowExclusion,
                            format!(
                                "{} may not sit in the last {rows_from_back} row(s) but sits at {pos}",
                                student_name(by_id, student)
                            ),
                            vec![student],
                        )
                        .with_positions(vec![pos]),
                    );
                }
            }
        }
    }
}

/// Returns true if any pair seat can host the two students under the
/// classroom's seat-gender constraints, in either orientation.
///
/// This is the one policy point for required pairs under locked seat
/// genders: a pair is only structurally impossible when no desk admits it.
/// The same filter drives domain propagation, so pre-check and search agree.
pub fn pair_seat_exists_for(
    a: Gender,
    b: Gender,
    classroom: &ClassroomConfig,
) -> bool {
    let admits = |pos: Position, gender: Gender| {
        !classroom.is_disabled(pos)
            && classroom.seat_gender(pos).map_or(true, |g| g == gender)
    };
    pair_seats(classroom)
        .into_iter()
        .any(|(l, r)| (admits(l, a) && admits(r, b)) || (admits(l, b) && admits(r, a)))
}

/// Detects unsatisfiable constraint combinations before search starts.
///
/// Never mutates state; callers decide whether to abort or to proceed with
/// a warning.
pub fn check_compatibility(
    constraints: &[Constraint],
    students: &[Student],
    classroom: &ClassroomConfig,
) -> Compatibility {
    let by_id: HashMap<StudentId, &Student> = students.iter().map(|s| (s.id, s)).collect();
    let mut conflicts = Vec::new();

    // Aggregate per unordered pair.
    let mut required: Vec<(StudentId, StudentId)> = Vec::new();
    let mut prohibited: Vec<(StudentId, StudentId)> = Vec::new();
    let mut distances: HashMap<(StudentId, StudentId), u8> = HashMap::new();

    let key = |a: StudentId, b: StudentId| if a <= b { (a, b) } else { (b, a) };

    for constraint in constraints {
        let (first, second) = constraint.kind.students();
        for id in std::iter::once(first).chain(second) {
            if !by_id.contains_key(&id) {
                conflicts.push(format!("constraint references unknown student {id}"));
            }
        }
        match constraint.kind {
            ConstraintKind::PairRequired { a, b } => required.push(key(a, b)),
            ConstraintKind::PairProhibited { a, b } => prohibited.push(key(a, b)),
            ConstraintKind::Distance { a, b, min_distance } => {
                let entry = distances.entry(key(a, b)).or_insert(0);
                *entry = (*entry).max(min_distance);
            }
            ConstraintKind::RowExclusion {
                student,
                rows_from_back,
            } => {
                if rows_from_back >= classroom.rows() {
                    conflicts.push(format!(
                        "row exclusion for {} bans all {} rows",
                        student_name(&by_id, student),
                        classroom.rows()
                    ));
                }
            }
        }
    }

    for &(a, b) in &required {
        let name_a = student_name(&by_id, a);
        let name_b = student_name(&by_id, b);

        if prohibited.contains(&(a, b)) {
            conflicts.push(format!(
                "{name_a} and {name_b} are both required and prohibited to share a desk"
            ));
        }
        // Pair seats are always at distance 1, so any larger minimum is a
        // structural contradiction.
        if distances.get(&(a, b)).is_some_and(|&min| min > 1) {
            conflicts.push(format!(
                "{name_a} and {name_b} must share a desk yet also keep a distance greater than 1"
            ));
        }
        if let (Some(sa), Some(sb)) = (by_id.get(&a), by_id.get(&b)) {
            if !pair_seat_exists_for(sa.gender, sb.gender, classroom) {
                conflicts.push(format!(
                    "no pair seat can host {name_a} and {name_b} under the current seat gender constraints"
                ));
            }
        }
    }

    Compatibility {
        is_valid: conflicts.is_empty(),
        conflicts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConstraintId;

    fn room() -> ClassroomConfig {
        ClassroomConfig::new("room", 4, 4)
            .unwrap()
            .with_pair_columns(vec![(0, 1), (2, 3)])
            .unwrap()
    }

    fn students() -> Vec<Student> {
        vec![
            Student::new(StudentId(1), "Aiko", Gender::Female),
            Student::new(StudentId(2), "Taro", Gender::Male),
            Student::new(StudentId(3), "Yumi", Gender::Female),
        ]
    }

    #[test]
    fn test_index_lookups() {
        let constraints = vec![
            Constraint::pair_required(ConstraintId(1), StudentId(1), StudentId(2)),
            Constraint::distance(ConstraintId(2), StudentId(1), StudentId(3), 2),
            Constraint::row_exclusion(ConstraintId(3), StudentId(1), 1),
            Constraint::row_exclusion(ConstraintId(4), StudentId(1), 2),
        ];
        let index = ConstraintIndex::build(&constraints);
        assert_eq!(index.weight_of(StudentId(1)), 10 + 8 + 5 + 5);
        assert_eq!(index.degree(StudentId(1)), 2);
        assert_eq!(
            index.required_partners(StudentId(2)).collect::<Vec<_>>(),
            vec![StudentId(1)]
        );
        // The strictest of the two declared exclusions wins.
        assert_eq!(index.row_exclusion(StudentId(1)), Some(2));
        assert!(!index.has_constraints(StudentId(9)));
    }

    #[test]
    fn test_required_pair_seated_apart_is_one_violation() {
        let classroom = room();
        let students = students();
        let constraints = vec![Constraint::pair_required(
            ConstraintId(1),
            StudentId(1),
            StudentId(2),
        )];
        let mut seating = SeatingArrangement::new();
        seating.assign(Position::new(0, 0), StudentId(1));
        seating.assign(Position::new(2, 3), StudentId(2));

        let result = validate_all(&seating, &students, &classroom, &constraints);
        assert!(!result.is_valid);
        assert_eq!(result.violations.len(), 1);
        let violation = &result.violations[0];
        assert_eq!(violation.kind, ViolationKind::PairRequired);
        assert!(violation.students.contains(&StudentId(1)));
        assert!(violation.students.contains(&StudentId(2)));
    }

    #[test]
    fn test_unseated_required_pair_reported_not_skipped() {
        let classroom = room();
        let students = students();
        let constraints = vec![Constraint::pair_required(
            ConstraintId(1),
            StudentId(1),
            StudentId(2),
        )];
        let mut seating = SeatingArrangement::new();
        seating.assign(Position::new(0, 0), StudentId(1));

        let result = validate_all(&seating, &students, &classroom, &constraints);
        assert_eq!(result.violations.len(), 1);
        assert!(result.violations[0].message.contains("not both seated"));
    }

    #[test]
    fn test_seat_level_checks() {
        let mut classroom = room();
        classroom
            .require_gender(Position::new(0, 0), Gender::Male)
            .unwrap();
        classroom.disable_seat(Position::new(1, 1), None).unwrap();

        let students = students();
        let mut seating = SeatingArrangement::new();
        seating.assign(Position::new(0, 0), StudentId(1)); // female on a male seat
        seating.assign(Position::new(1, 1), StudentId(2)); // disabled seat

        let result = validate_all(&seating, &students, &classroom, &[]);
        let kinds: Vec<ViolationKind> = result.violations.iter().map(|v| v.kind).collect();
        assert!(kinds.contains(&ViolationKind::Gender));
        assert!(kinds.contains(&ViolationKind::DisabledSeat));
    }

    #[test]
    fn test_unknown_student_is_a_violation_not_a_panic() {
        let classroom = room();
        let constraints = vec![Constraint::distance(
            ConstraintId(1),
            StudentId(1),
            StudentId(99),
            2,
        )];
        let result = validate_all(
            &SeatingArrangement::new(),
            &students(),
            &classroom,
            &constraints,
        );
        assert!(!result.is_valid);
        assert_eq!(result.violations[0].kind, ViolationKind::UnknownStudent);
    }

    #[test]
    fn test_required_and_prohibited_is_a_conflict() {
        let classroom = room();
        let students = students();
        let constraints = vec![
            Constraint::pair_required(ConstraintId(1), StudentId(1), StudentId(2)),
            Constraint::pair_prohibited(ConstraintId(2), StudentId(2), StudentId(1)),
        ];
        let result = check_compatibility(&constraints, &students, &classroom);
        assert!(!result.is_valid);
        assert!(result.conflicts[0].contains("Aiko"));
        assert!(result.conflicts[0].contains("Taro"));
    }

    #[test]
    fn test_required_pair_with_large_distance_is_a_conflict() {
        let classroom = room();
        let students = students();
        let constraints = vec![
            Constraint::pair_required(ConstraintId(1), StudentId(1), StudentId(2)),
            Constraint::distance(ConstraintId(2), StudentId(1), StudentId(2), 3),
        ];
        let result = check_compatibility(&constraints, &students, &classroom);
        assert!(!result.is_valid);
    }

    #[test]
    fn test_required_pair_without_gender_compatible_desk() {
        let mut classroom = room();
        // Every left pair seat requires a male, every right one too.
        for row in 0..classroom.rows() {
            for col in 0..4 {
                classroom
                    .require_gender(Position::new(row, col), Gender::Male)
                    .unwrap();
            }
        }
        let students = students();
        // Two girls must pair up, but all desks are male-only.
        let constraints = vec![Constraint::pair_required(
            ConstraintId(1),
            StudentId(1),
            StudentId(3),
        )];
        let result = check_compatibility(&constraints, &students, &classroom);
        assert!(!result.is_valid);

        // A mixed pair is just as impossible here: Aiko can sit nowhere.
        let constraints = vec![Constraint::pair_required(
            ConstraintId(1),
            StudentId(1),
            StudentId(2),
        )];
        let result = check_compatibility(&constraints, &students, &classroom);
        assert!(!result.is_valid);
    }

    #[test]
    fn test_total_row_exclusion_is_a_conflict() {
        let classroom = room();
        let constraints = vec![Constraint::row_exclusion(ConstraintId(1), StudentId(1), 4)];
        let result = check_compatibility(&constraints, &students(), &classroom);
        assert!(!result.is_valid);
    }

    #[test]
    fn test_compatible_set_passes() {
        let classroom = room();
        let constraints = vec![
            Constraint::pair_required(ConstraintId(1), StudentId(1), StudentId(2)),
            Constraint::distance(ConstraintId(2), StudentId(1), StudentId(3), 2),
            Constraint::row_exclusion(ConstraintId(3), StudentId(3), 1),
        ];
        let result = check_compatibility(&constraints, &students(), &classroom);
        assert!(result.is_valid, "unexpected conflicts: {:?}", result.conflicts);
    }
}
