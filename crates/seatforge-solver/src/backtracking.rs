//! Pure backtracking search.
//!
//! Classic recursive placement with most-constraining-variable ordering,
//! cost-ranked candidate seats, forward checking and random restarts.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use seatforge_config::{PlacementConfig, TerminationConfig};
use seatforge_core::domain::{PlacementResult, Position, SeatingArrangement, Student};
use seatforge_core::seats;

use crate::budget::SearchBudget;
use crate::context::PlacementContext;
use crate::engine::{prefer_by_placement, Engine};

/// The backtracking search engine.
#[derive(Debug)]
pub struct BacktrackingEngine {
    termination: TerminationConfig,
    seed: Option<u64>,
}

impl BacktrackingEngine {
    pub fn new(config: &PlacementConfig) -> Self {
        Self {
            termination: config.termination.clone(),
            seed: config.random_seed,
        }
    }

    /// Overrides the restart-shuffle seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Engine for BacktrackingEngine {
    fn name(&self) -> &'static str {
        "backtracking"
    }

    fn place(&mut self, ctx: &PlacementContext<'_>) -> PlacementResult {
        let budget = SearchBudget::start(&self.termination);
        let base = ctx.fixed_seating();
        let mut order: Vec<&Student> = ctx.placeable_students().collect();
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut best: Option<PlacementResult> = None;
        let mut timed_out = false;

        for attempt in 0..self.termination.max_attempts.max(1) {
            if budget.expired() {
                break;
            }
            if attempt > 0 {
                order.shuffle(&mut rng);
            }

            let capacity = seats::available_seats(ctx.classroom()).len();
            let wanted = base.len() + order.len();
            let mut search = Search {
                ctx,
                budget: &budget,
                best_seating: base.clone(),
                placed_ceiling: capacity.min(wanted),
                capacity_short: capacity < wanted,
                aborted: false,
                capacity_reached: false,
                stuck: None,
            };
            let mut seating = base.clone();
            let mut remaining = order.clone();
            let complete = search.recurse(&mut seating, &mut remaining, 0);

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
                "backtracking attempt finished"
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
            // Budget expired before the first attempt started.
            None => ctx.build_result(base, "time limit reached before the first attempt"),
        }
    }
}

struct Search<'c, 'a> {
    ctx: &'c PlacementContext<'a>,
    budget: &'c SearchBudget,
    best_seating: SeatingArrangement,
    /// Upper bound on occupied seats: free capacity or roster size.
    placed_ceiling: usize,
    /// True when there are fewer usable seats than students.
    capacity_short: bool,
    aborted: bool,
    capacity_reached: bool,
    stuck: Option<String>,
}

impl<'c, 'a> Search<'c, 'a> {
    fn recurse(
        &mut self,
        seating: &mut SeatingArrangement,
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

        let pick = self.most_constraining(remaining);
        let student = remaining.swap_remove(pick);

        let mut candidates = self.ranked_candidates(student, seating);
        if candidates.is_empty() {
            self.stuck.get_or_insert_with(|| student.name.clone());
        }

        for (_cost, pos) in candidates.drain(..) {
            seating.assign(pos, student.id);

            if self.forward_check(seating, remaining) && self.recurse(seating, remaining, depth + 1)
            {
                return true;
            }

            seating.remove_student(student.id);
            if self.aborted {
                break;
            }
        }

        remaining.push(student);
        self.note_progress(seating);
        false
    }

    /// Keeps the deepest partial seating seen so far. Once the seating hits
    /// the capacity ceiling no sibling branch can place more, so the rest of
    /// the tree is cut.
    fn note_progress(&mut self, seating: &SeatingArrangement) {
        if seating.len() > self.best_seating.len() {
            self.best_seating = seating.clone();
        }
        if self.capacity_short && self.best_seating.len() >= self.placed_ceiling {
            self.capacity_reached = true;
        }
    }

    /// Most-constraining-variable: highest cumulative constraint weight
    /// first, ties broken by gender then name then id for determinism.
    fn most_constraining(&self, remaining: &[&Student]) -> usize {
        let index = self.ctx.index();
        let mut best = 0;
        for i in 1..remaining.len() {
            let (a, b) = (remaining[i], remaining[best]);
            let ka = (
                std::cmp::Reverse(index.weight_of(a.id)),
                a.gender as u8,
                &a.name,
                a.id,
            );
            let kb = (
                std::cmp::Reverse(index.weight_of(b.id)),
                b.gender as u8,
                &b.name,
                b.id,
            );
            if ka < kb {
                best = i;
            }
        }
        best
    }

    /// Eligible seats for the student, cheapest first.
    fn ranked_candidates(
        &self,
        student: &Student,
        seating: &SeatingArrangement,
    ) -> Vec<(i64, Position)> {
        let classroom = self.ctx.classroom();
        let index = self.ctx.index();
        let mut candidates: Vec<(i64, Position)> = seats::available_seats(classroom)
            .into_iter()
            .filter(|&pos| seats::is_eligible_in(student, pos, classroom, index, seating))
            .map(|pos| (self.candidate_cost(student, pos, seating), pos))
            .collect();
        candidates.sort_by_key(|&(cost, pos)| (cost, pos));
        candidates
    }

    /// Cost of seating the student here given already-placed partners.
    ///
    /// Violating a pair relation costs ten times the constraint's weight;
    /// distance violations cost proportionally to the shortfall.
    fn candidate_cost(
        &self,
        student: &Student,
        pos: Position,
        seating: &SeatingArrangement,
    ) -> i64 {
        let classroom = self.ctx.classroom();
        let index = self.ctx.index();
        let mut cost = 0i64;

        for partner in index.required_partners(student.id) {
            if let Some(partner_pos) = seating.position_of(partner) {
                if !seats::is_pair_position(pos, partner_pos, classroom) {
                    cost += 10 * 10;
                }
            }
        }
        for partner in index.prohibited_partners(student.id) {
            if let Some(partner_pos) = seating.position_of(partner) {
                if seats::is_pair_position(pos, partner_pos, classroom) {
                    cost += 10 * 7;
                }
            }
        }
        for (partner, min_distance) in index.distance_partners(student.id) {
            if let Some(partner_pos) = seating.position_of(partner) {
                let actual = seats::chebyshev(pos, partner_pos);
                if actual < min_distance {
                    cost += 8 * i64::from(min_distance - actual);
                }
            }
        }
        cost
    }

    /// After a tentative placement, every still-unplaced constrained student
    /// must retain at least one eligible seat.
    fn forward_check(&self, seating: &SeatingArrangement, remaining: &[&Student]) -> bool {
        let classroom = self.ctx.classroom();
        let index = self.ctx.index();
        for student in remaining {
            if !index.has_constraints(student.id) {
                continue;
            }
            let viable = seats::available_seats(classroom)
                .into_iter()
                .any(|pos| seats::is_eligible_in(student, pos, classroom, index, seating));
            if !viable {
                return false;
            }
        }
        true
    }
}
