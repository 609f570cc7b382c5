//! Heuristic search with constraint propagation.
//!
//! Maintains a per-student domain of eligible seats, propagates pair and
//! distance constraints to a fixpoint before searching, and recurses with a
//! weighted variable-selection score and flexibility-aware seat scoring.
//! Domains are narrowed on every commit, so contradictions surface long
//! before plain backtracking would hit them.

mod domains;

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smallvec::SmallVec;

use seatforge_config::{HeuristicWeights, PlacementConfig, TerminationConfig};
use seatforge_core::domain::{PlacementResult, Position, SeatingArrangement, Student, StudentId};
use seatforge_core::seats;

use crate::budget::SearchBudget;
use crate::context::PlacementContext;
use crate::engine::{prefer_by_placement, Engine};

use domains::DomainTable;

/// Jitter added to variable scores on restart attempts, to break ties
/// differently each time without overriding the heuristics.
const RESTART_JITTER: f64 = 0.05;

/// The propagation-based heuristic engine.
#[derive(Debug)]
pub struct HeuristicPropagationEngine {
    termination: TerminationConfig,
    weights: HeuristicWeights,
    seed: Option<u64>,
}

impl HeuristicPropagationEngine {
    pub fn new(config: &PlacementConfig) -> Self {
        Self {
            termination: config.termination.clone(),
            weights: config.weights.clone(),
            seed: config.random_seed,
        }
    }

    /// Overrides the restart-jitter seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Engine for HeuristicPropagationEngine {
    fn name(&self) -> &'static str {
        "heuristic-propagation"
    }

    fn place(&mut self, ctx: &PlacementContext<'_>) -> PlacementResult {
        let budget = SearchBudget::start(&self.termination);
        let base = ctx.fixed_seating();
        let order: Vec<&Student> = ctx.placeable_students().collect();
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut table = DomainTable::build(ctx, &base, &order);
        if let Err(name) = table.propagate(ctx, &base) {
            return ctx.build_result(base, format!("constraint propagation left no seat for {name}"));
        }

        let mut best: Option<PlacementResult> = None;
        let mut timed_out = false;

        for attempt in 0..self.termination.max_attempts.max(1) {
            if budget.expired() {
                break;
            }
            let jitter: HashMap<StudentId, f64> = if attempt == 0 {
                HashMap::new()
            } else {
                order
                    .iter()
                    .map(|s| (s.id, rng.random::<f64>() * RESTART_JITTER))
                    .collect()
            };

            let capacity = seats::available_seats(ctx.classroom()).len();
            let wanted = base.len() + order.len();
            let mut search = Search {
                ctx,
                budget: &budget,
                weights: &self.weights,
                jitter,
                total_seats: capacity.max(1) as f64,
                best_seating: base.clone(),
                placed_ceiling: capacity.min(wanted),
                capacity_short: capacity < wanted,
                aborted: false,
                capacity_reached: false,
                stuck: None,
            };
            let mut seating = base.clone();
            let mut remaining = order.clone();
            let complete = search.recurse(&mut seating, &table, &mut remaining, 0);

            let message = if complete {
                "all students placed".to_string()
            } else if search.aborted {
                timed_out = true;
                "search budget exhausted, returning best partial placement".to_string()
            } else if search.capacity_reached {
                "not enough seats for all students".to_string()
            } else if let Some(stuck) = search.stuck {
                format!("no viable seat for {stuck}")
            } else {
                "no complete placement found".to_string()
            };
            let final_seating = if complete { seating } else { search.best_seating };
            let result = ctx.build_result(final_seating, message);

            tracing::debug!(
                attempt,
                placed = result.stats.placed,
                violations = result.stats.violation_count,
                "heuristic attempt finished"
            );

            let kept = match best.take() {
                None => result,
                Some(current) => prefer_by_placement(current, result),
            };
            let perfect = kept.is_perfect();
            best = Some(kept);
            if perfect || timed_out {
                break;
            }
        }

        match best {
            Some(result) => result,
            None => ctx.build_result(base, "time limit reached before the first attempt"),
        }
    }
}

struct Search<'c, 'a> {
    ctx: &'c PlacementContext<'a>,
    budget: &'c SearchBudget,
    weights: &'c HeuristicWeights,
    jitter: HashMap<StudentId, f64>,
    total_seats: f64,
    best_seating: SeatingArrangement,
    placed_ceiling: usize,
    capacity_short: bool,
    aborted: bool,
    capacity_reached: bool,
    stuck: Option<String>,
}

impl<'c, 'a> Search<'c, 'a> {
    fn recurse(
        &mut self,
        seating: &mut SeatingArrangement,
        table: &DomainTable,
        remaining: &mut Vec<&'a Student>,
        depth: usize,
    ) -> bool {
        if self.capacity_reached {
            return false;
        }
        if self.budget.expired() || self.budget.depth_exceeded(depth) {
            self.aborted = true;
            self.note_progress(seating);
            return false;
        }
        if remaining.is_empty() {
            return true;
        }

        let pick = self.select_variable(table, remaining);
        let student = remaining.swap_remove(pick);

        // The domain already encodes basic eligibility and every committed
        // narrowing; the full predicate re-checks placed partners the
        // prohibited-pair narrowing cannot express exactly.
        let mut options: Vec<(f64, Position)> = table
            .get(student.id)
            .iter()
            .copied()
            .filter(|&pos| {
                seats::is_eligible_in(student, pos, self.ctx.classroom(), self.ctx.index(), seating)
            })
            .map(|pos| (self.seat_score(student, pos, table, seating), pos))
            .collect();
        options.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        if options.is_empty() {
            self.stuck.get_or_insert_with(|| student.name.clone());
        }

        for (_score, pos) in options {
            seating.assign(pos, student.id);

            let mut narrowed = table.clone();
            if narrowed.commit(self.ctx, student.id, pos).is_ok()
                && self.recurse(seating, &narrowed, remaining, depth + 1)
            {
                return true;
            }

            seating.remove_student(student.id);
            if self.aborted || self.capacity_reached {
                break;
            }
        }

        remaining.push(student);
        self.note_progress(seating);
        false
    }

    fn note_progress(&mut self, seating: &SeatingArrangement) {
        if seating.len() > self.best_seating.len() {
            self.best_seating = seating.clone();
        }
        if self.capacity_short && self.best_seating.len() >= self.placed_ceiling {
            self.capacity_reached = true;
        }
    }

    /// Weighted variable selection over the remaining students.
    ///
    /// Combines minimum-remaining-values, constraint degree, criticality and
    /// inverted flexibility; a student with an empty domain is picked
    /// immediately so the dead end is detected at this level.
    fn select_variable(&self, table: &DomainTable, remaining: &[&Student]) -> usize {
        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (i, student) in remaining.iter().enumerate() {
            let len = table.size(student.id);
            if len == 0 {
                return i;
            }
            let score = self.variable_score(student, len, table, remaining);
            if score > best_score {
                best = i;
                best_score = score;
            }
        }
        best
    }

    fn variable_score(
        &self,
        student: &Student,
        domain_len: usize,
        table: &DomainTable,
        remaining: &[&Student],
    ) -> f64 {
        let w = self.weights;
        let index = self.ctx.index();
        let degree = index.degree(student.id) as f64;

        let mrv = 1.0 / domain_len as f64;
        let degree_score = degree / (degree + 1.0);
        let crit = self.criticality(student, domain_len, table, remaining);
        let flex = self.flexibility(student, domain_len, table);
        let jitter = self.jitter.get(&student.id).copied().unwrap_or(0.0);

        w.mrv * mrv + w.degree * degree_score + w.criticality * crit
            + w.flexibility * (1.0 - flex)
            + jitter
    }

    /// How close the student is to running out of options.
    fn criticality(
        &self,
        student: &Student,
        domain_len: usize,
        table: &DomainTable,
        remaining: &[&Student],
    ) -> f64 {
        let index = self.ctx.index();
        let mut crit = 0.0;
        if domain_len <= 2 {
            crit += 0.4;
        }
        let partners: SmallVec<[StudentId; 4]> = index
            .for_student(student.id)
            .filter_map(|c| c.kind.partner_of(student.id))
            .collect();
        if partners.iter().any(|p| {
            remaining.iter().any(|s| s.id == *p) && table.size(*p) <= 2
        }) {
            crit += 0.3;
        }
        if index.required_partners(student.id).next().is_some() {
            crit += 0.3;
        }
        crit
    }

    /// How safely the student can be deferred. Large domains, no
    /// constraints and gender-neutral seats all make deferral cheap.
    fn flexibility(&self, student: &Student, domain_len: usize, table: &DomainTable) -> f64 {
        let classroom = self.ctx.classroom();
        let mut flex = (domain_len as f64 / self.total_seats) * 0.5;
        if !self.ctx.index().has_constraints(student.id) {
            flex += 0.3;
        }
        let neutral = table
            .get(student.id)
            .iter()
            .filter(|&&pos| classroom.seat_gender(pos).is_none())
            .count();
        flex += 0.2 * neutral as f64 / domain_len as f64;
        flex
    }

    /// Scores a candidate seat: constraint satisfaction plus proximity
    /// bonuses, minus conflict risk and the flexibility it destroys for
    /// everyone else. Higher is better.
    fn seat_score(
        &self,
        student: &Student,
        pos: Position,
        table: &DomainTable,
        seating: &SeatingArrangement,
    ) -> f64 {
        let classroom = self.ctx.classroom();
        let index = self.ctx.index();
        let mate = seats::pair_partner(pos, classroom);

        let mut satisfaction = 0.0;
        let mut proximity = 0.0;
        let mut conflict = 0.0;

        for partner in index.required_partners(student.id) {
            match seating.position_of(partner) {
                Some(partner_pos) => {
                    if seats::is_pair_position(pos, partner_pos, classroom) {
                        satisfaction += 3.0;
                    } else {
                        conflict += 3.0;
                    }
                }
                None => match mate {
                    Some(m) if table.contains(partner, m) && !seating.is_occupied(m) => {
                        satisfaction += 1.0;
                        proximity += 0.5;
                    }
                    _ => conflict += 1.0,
                },
            }
        }
        for (partner, min_distance) in index.distance_partners(student.id) {
            match seating.position_of(partner) {
                Some(partner_pos) => {
                    // Eligibility guarantees the minimum; sitting exactly at
                    // it wastes the least grid.
                    if seats::chebyshev(pos, partner_pos) == min_distance {
                        proximity += 0.5;
                    }
                }
                None => {
                    let total = table.size(partner);
                    if total > 0 {
                        let viable = table
                            .get(partner)
                            .iter()
                            .filter(|&&t| t != pos && seats::chebyshev(pos, t) >= min_distance)
                            .count();
                        conflict += (total - viable) as f64 / total as f64;
                    }
                }
            }
        }
        for partner in index.prohibited_partners(student.id) {
            if seating.position_of(partner).is_none() {
                if let Some(m) = mate {
                    if table.contains(partner, m) {
                        conflict += 0.25;
                    }
                }
            }
        }

        satisfaction + proximity - conflict - self.flexibility_damage(student, pos, table)
    }

    /// Penalty for shrinking other constrained students' domains.
    ///
    /// Approximates the narrowing a commit would cause: losing this seat,
    /// plus distance-band losses for distance partners. Shrinking a
    /// constrained domain past half weighs double shrinking it past a third.
    fn flexibility_damage(&self, student: &Student, pos: Position, table: &DomainTable) -> f64 {
        let index = self.ctx.index();
        let distance_partners: SmallVec<[(StudentId, u8); 4]> =
            index.distance_partners(student.id).collect();

        let mut damage = 0.0;
        for other in self.ctx.placeable_students() {
            if other.id == student.id || !table.tracks(other.id) {
                continue;
            }
            let before = table.size(other.id);
            if before == 0 {
                continue;
            }
            let mut removed = usize::from(table.contains(other.id, pos));
            if let Some(&(_, min_distance)) =
                distance_partners.iter().find(|(p, _)| *p == other.id)
            {
                removed += table
                    .get(other.id)
                    .iter()
                    .filter(|&&t| t != pos && seats::chebyshev(t, pos) < min_distance)
                    .count();
            }
            let ratio = removed as f64 / before as f64;
            if !index.has_constraints(other.id) {
                continue;
            }
            if ratio > 0.5 {
                damage += 1.5 * ratio;
            } else if ratio > 0.3 {
                damage += 0.75 * ratio;
            }
        }
        damage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatforge_core::domain::{
        ClassroomConfig, Constraint, ConstraintId, FixedPlacement, Gender, StudentId,
    };

    fn engine() -> HeuristicPropagationEngine {
        HeuristicPropagationEngine::new(&PlacementConfig::new().with_random_seed(11))
    }

    fn students(n: u32) -> Vec<Student> {
        (0..n)
            .map(|i| {
                let gender = if i % 2 == 0 { Gender::Female } else { Gender::Male };
                Student::new(StudentId(i), format!("S{i}"), gender)
            })
            .collect()
    }

    #[test]
    fn test_places_everyone_without_constraints() {
        let students = students(9);
        let classroom = ClassroomConfig::new("room", 3, 3).unwrap();
        let ctx = PlacementContext::new(&students, &classroom, &[], &[]).unwrap();

        let result = engine().place(&ctx);
        assert!(result.success);
        assert_eq!(result.stats.placed, 9);
        assert!(result.violations.is_empty());
    }

    #[test]
    fn test_propagation_conflict_is_detected_without_search() {
        let students = students(2);
        let mut classroom = ClassroomConfig::new("room", 3, 4)
            .unwrap()
            .with_pair_columns(vec![(0, 1)])
            .unwrap();
        // No desk can host the required pair: all pair seats male-only and
        // S0 is female.
        for row in 0..3 {
            for col in 0..2 {
                classroom
                    .require_gender(seatforge_core::domain::Position::new(row, col), Gender::Male)
                    .unwrap();
            }
        }
        let constraints = vec![Constraint::pair_required(
            ConstraintId(1),
            StudentId(0),
            StudentId(1),
        )];
        let ctx = PlacementContext::new(&students, &classroom, &constraints, &[]).unwrap();

        let result = engine().place(&ctx);
        assert!(!result.success);
        assert!(result.message.contains("propagation"));
    }

    #[test]
    fn test_required_pair_with_fixed_partner() {
        let students = students(5);
        let classroom = ClassroomConfig::new("room", 3, 4)
            .unwrap()
            .with_pair_columns(vec![(0, 1), (2, 3)])
            .unwrap();
        let constraints = vec![Constraint::pair_required(
            ConstraintId(1),
            StudentId(0),
            StudentId(1),
        )];
        let fixed = vec![FixedPlacement::new(
            StudentId(1),
            seatforge_core::domain::Position::new(1, 2),
        )];
        let ctx = PlacementContext::new(&students, &classroom, &constraints, &fixed).unwrap();

        let result = engine().place(&ctx);
        assert!(result.success, "{}", result.message);
        assert_eq!(
            result.seating.position_of(StudentId(0)),
            Some(seatforge_core::domain::Position::new(1, 3))
        );
    }

    #[test]
    fn test_crossing_constraints_resolve() {
        // Two required pairs plus a distance constraint spanning them.
        let students = students(6);
        let classroom = ClassroomConfig::new("room", 4, 4)
            .unwrap()
            .with_pair_columns(vec![(0, 1), (2, 3)])
            .unwrap();
        let constraints = vec![
            Constraint::pair_required(ConstraintId(1), StudentId(0), StudentId(1)),
            Constraint::pair_required(ConstraintId(2), StudentId(2), StudentId(3)),
            Constraint::distance(ConstraintId(3), StudentId(0), StudentId(2), 2),
            Constraint::row_exclusion(ConstraintId(4), StudentId(4), 1),
        ];
        let ctx = PlacementContext::new(&students, &classroom, &constraints, &[]).unwrap();

        let result = engine().place(&ctx);
        assert!(result.success, "{}", result.message);
        assert!(result.violations.is_empty(), "{:?}", result.violations);
    }

    #[test]
    fn test_overfull_class_reports_partial_result() {
        let students = students(10);
        let classroom = ClassroomConfig::new("room", 3, 3).unwrap();
        let ctx = PlacementContext::new(&students, &classroom, &[], &[]).unwrap();

        let result = engine().place(&ctx);
        assert!(!result.success);
        assert_eq!(result.stats.placed, 9);
        assert_eq!(result.stats.unplaced, 1);
    }
}
