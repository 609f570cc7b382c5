//! Eligibility domains and constraint propagation.

use std::collections::HashMap;

use seatforge_core::domain::{Position, SeatingArrangement, Student, StudentId};
use seatforge_core::seats;

use crate::context::PlacementContext;

/// Per-student sets of still-eligible seats.
///
/// Domains start from basic eligibility only; propagation and commits
/// narrow them as inter-student constraints bite. Tables are cloned per
/// recursion level, so undo is a drop.
#[derive(Debug, Clone)]
pub(crate) struct DomainTable {
    domains: HashMap<StudentId, Vec<Position>>,
}

impl DomainTable {
    /// Builds initial domains for the given unplaced students.
    pub fn build(
        ctx: &PlacementContext<'_>,
        seating: &SeatingArrangement,
        unplaced: &[&Student],
    ) -> Self {
        let classroom = ctx.classroom();
        let index = ctx.index();
        let open_seats = seats::available_seats(classroom);
        let domains = unplaced
            .iter()
            .map(|student| {
                let domain: Vec<Position> = open_seats
                    .iter()
                    .copied()
                    .filter(|&pos| {
                        !seating.is_occupied(pos)
                            && seats::is_seat_eligible(student, pos, classroom, index)
                    })
                    .collect();
                (student.id, domain)
            })
            .collect();
        Self { domains }
    }

    pub fn get(&self, id: StudentId) -> &[Position] {
        self.domains.get(&id).map_or(&[], Vec::as_slice)
    }

    pub fn size(&self, id: StudentId) -> usize {
        self.get(id).len()
    }

    pub fn contains(&self, id: StudentId, pos: Position) -> bool {
        self.get(id).contains(&pos)
    }

    pub fn tracks(&self, id: StudentId) -> bool {
        self.domains.contains_key(&id)
    }

    /// Runs pair and distance reduction to a fixpoint.
    ///
    /// Returns the name of the first student whose domain empties, which
    /// aborts search before any recursion is attempted.
    pub fn propagate(
        &mut self,
        ctx: &PlacementContext<'_>,
        seating: &SeatingArrangement,
    ) -> Result<(), String> {
        let mut changed = true;
        let mut rounds = 0;
        while changed && rounds < 32 {
            changed = false;
            rounds += 1;
            for constraint in ctx.index().all() {
                use seatforge_core::domain::ConstraintKind::*;
                match constraint.kind {
                    PairRequired { a, b } => {
                        changed |= self.restrict_to_pair_seats(ctx, seating, a, b);
                        changed |= self.restrict_to_pair_seats(ctx, seating, b, a);
                    }
                    Distance { a, b, min_distance } => {
                        changed |= self.arc_reduce_distance(seating, a, b, min_distance);
                        changed |= self.arc_reduce_distance(seating, b, a, min_distance);
                    }
                    _ => {}
                }
            }
        }

        for (&id, domain) in &self.domains {
            if domain.is_empty() {
                let name = ctx
                    .student(id)
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| id.to_string());
                return Err(name);
            }
        }
        Ok(())
    }

    /// Keeps only seats of `id` whose desk partner seat is open to `partner`.
    ///
    /// Partner eligibility is checked through the partner's own domain, so
    /// the filter automatically respects seat genders, disabled seats and
    /// row exclusions; this is the same policy the compatibility pre-check
    /// applies.
    fn restrict_to_pair_seats(
        &mut self,
        ctx: &PlacementContext<'_>,
        seating: &SeatingArrangement,
        id: StudentId,
        partner: StudentId,
    ) -> bool {
        if !self.tracks(id) {
            return false;
        }
        let classroom = ctx.classroom();
        let partner_seat = seating.position_of(partner);
        let keep = |pos: Position, domains: &HashMap<StudentId, Vec<Position>>| -> bool {
            let Some(mate) = seats::pair_partner(pos, classroom) else {
                return false;
            };
            match partner_seat {
                // Partner already seated (e.g. a fixed placement): only the
                // seat right next to them survives.
                Some(p) => mate == p,
                None => domains.get(&partner).is_some_and(|d| d.contains(&mate)),
            }
        };
        self.retain(id, |pos, domains| keep(pos, domains))
    }

    /// Removes from `id`'s domain every seat with no partner seat at the
    /// required distance.
    fn arc_reduce_distance(
        &mut self,
        seating: &SeatingArrangement,
        id: StudentId,
        partner: StudentId,
        min_distance: u8,
    ) -> bool {
        if !self.tracks(id) {
            return false;
        }
        let partner_seat = seating.position_of(partner);
        self.retain(id, |pos, domains| match partner_seat {
            Some(p) => seats::chebyshev(pos, p) >= min_distance,
            None => domains.get(&partner).map_or(true, |d| {
                d.iter()
                    .any(|&t| t != pos && seats::chebyshev(pos, t) >= min_distance)
            }),
        })
    }

    fn retain(
        &mut self,
        id: StudentId,
        keep: impl Fn(Position, &HashMap<StudentId, Vec<Position>>) -> bool,
    ) -> bool {
        let Some(domain) = self.domains.get(&id) else {
            return false;
        };
        let filtered: Vec<Position> = domain.iter().copied().filter(|&p| keep(p, &self.domains)).collect();
        if filtered.len() != domain.len() {
            self.domains.insert(id, filtered);
            true
        } else {
            false
        }
    }

    /// Applies a committed placement: the student leaves the table, the
    /// seat leaves every domain, and partner domains narrow.
    ///
    /// Returns the name of a partner whose domain collapses to empty, which
    /// fails this branch immediately.
    pub fn commit(
        &mut self,
        ctx: &PlacementContext<'_>,
        placed: StudentId,
        pos: Position,
    ) -> Result<(), String> {
        let classroom = ctx.classroom();
        let index = ctx.index();

        self.domains.remove(&placed);
        for domain in self.domains.values_mut() {
            domain.retain(|&p| p != pos);
        }

        // Once one half of a required pair is seated, the partner's domain
        // collapses to the single matching pair seat.
        for partner in index.required_partners(placed) {
            if self.tracks(partner) {
                let mate = seats::pair_partner(pos, classroom);
                self.retain(partner, |p, _| Some(p) == mate);
            }
        }
        for (partner, min_distance) in index.distance_partners(placed) {
            if self.tracks(partner) {
                self.retain(partner, |p, _| seats::chebyshev(p, pos) >= min_distance);
            }
        }
        for partner in index.prohibited_partners(placed) {
            if self.tracks(partner) {
                let mate = seats::pair_partner(pos, classroom);
                self.retain(partner, |p, _| Some(p) != mate);
            }
        }

        for id in index
            .required_partners(placed)
            .chain(index.distance_partners(placed).map(|(p, _)| p))
        {
            if self.tracks(id) && self.size(id) == 0 {
                let name = ctx
                    .student(id)
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| id.to_string());
                return Err(name);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatforge_core::domain::{
        ClassroomConfig, Constraint, ConstraintId, FixedPlacement, Gender, StudentId,
    };

    fn classroom() -> ClassroomConfig {
        ClassroomConfig::new("room", 4, 4)
            .unwrap()
            .with_pair_columns(vec![(0, 1)])
            .unwrap()
    }

    fn roster() -> Vec<Student> {
        vec![
            Student::new(StudentId(1), "Aiko", Gender::Female),
            Student::new(StudentId(2), "Taro", Gender::Male),
            Student::new(StudentId(3), "Yumi", Gender::Female),
        ]
    }

    #[test]
    fn test_pair_propagation_restricts_to_pair_columns() {
        let students = roster();
        let classroom = classroom();
        let constraints = vec![Constraint::pair_required(
            ConstraintId(1),
            StudentId(1),
            StudentId(2),
        )];
        let ctx = PlacementContext::new(&students, &classroom, &constraints, &[]).unwrap();
        let seating = ctx.fixed_seating();
        let unplaced: Vec<&Student> = ctx.placeable_students().collect();

        let mut table = DomainTable::build(&ctx, &seating, &unplaced);
        assert_eq!(table.size(StudentId(1)), 16);
        table.propagate(&ctx, &seating).unwrap();

        // Only the four desks in columns 0/1 remain for the required pair.
        assert_eq!(table.size(StudentId(1)), 8);
        assert!(table.get(StudentId(1)).iter().all(|p| p.col <= 1));
        // The unconstrained student keeps the full grid.
        assert_eq!(table.size(StudentId(3)), 16);
    }

    #[test]
    fn test_propagation_against_fixed_partner() {
        let students = roster();
        let classroom = classroom();
        let constraints = vec![Constraint::pair_required(
            ConstraintId(1),
            StudentId(1),
            StudentId(2),
        )];
        let fixed = vec![FixedPlacement::new(StudentId(2), Position::new(2, 0))];
        let ctx = PlacementContext::new(&students, &classroom, &constraints, &fixed).unwrap();
        let seating = ctx.fixed_seating();
        let unplaced: Vec<&Student> = ctx.placeable_students().collect();

        let mut table = DomainTable::build(&ctx, &seating, &unplaced);
        table.propagate(&ctx, &seating).unwrap();
        assert_eq!(table.get(StudentId(1)), &[Position::new(2, 1)]);
    }

    #[test]
    fn test_empty_domain_is_reported() {
        let students = roster();
        let mut classroom = classroom();
        // Nothing left for a female student in the pair columns.
        for row in 0..4 {
            for col in 0..2 {
                classroom
                    .require_gender(Position::new(row, col), Gender::Male)
                    .unwrap();
            }
        }
        let constraints = vec![Constraint::pair_required(
            ConstraintId(1),
            StudentId(1),
            StudentId(3),
        )];
        let ctx = PlacementContext::new(&students, &classroom, &constraints, &[]).unwrap();
        let seating = ctx.fixed_seating();
        let unplaced: Vec<&Student> = ctx.placeable_students().collect();

        let mut table = DomainTable::build(&ctx, &seating, &unplaced);
        let err = table.propagate(&ctx, &seating).unwrap_err();
        assert!(err == "Aiko" || err == "Yumi");
    }

    #[test]
    fn test_commit_collapses_required_partner() {
        let students = roster();
        let classroom = classroom();
        let constraints = vec![Constraint::pair_required(
            ConstraintId(1),
            StudentId(1),
            StudentId(2),
        )];
        let ctx = PlacementContext::new(&students, &classroom, &constraints, &[]).unwrap();
        let seating = ctx.fixed_seating();
        let unplaced: Vec<&Student> = ctx.placeable_students().collect();

        let mut table = DomainTable::build(&ctx, &seating, &unplaced);
        table.propagate(&ctx, &seating).unwrap();
        table.commit(&ctx, StudentId(1), Position::new(0, 0)).unwrap();

        assert_eq!(table.get(StudentId(2)), &[Position::new(0, 1)]);
        assert!(!table.tracks(StudentId(1)));
    }

    #[test]
    fn test_commit_respects_distance_partners() {
        let students = roster();
        let classroom = classroom();
        let constraints = vec![Constraint::distance(
            ConstraintId(1),
            StudentId(1),
            StudentId(2),
            3,
        )];
        let ctx = PlacementContext::new(&students, &classroom, &constraints, &[]).unwrap();
        let seating = ctx.fixed_seating();
        let unplaced: Vec<&Student> = ctx.placeable_students().collect();

        let mut table = DomainTable::build(&ctx, &seating, &unplaced);
        table.commit(&ctx, StudentId(1), Position::new(0, 0)).unwrap();
        assert!(table
            .get(StudentId(2))
            .iter()
            .all(|&p| seats::chebyshev(p, Position::new(0, 0)) >= 3));
    }
}
