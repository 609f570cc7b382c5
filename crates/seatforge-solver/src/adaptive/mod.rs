//! Adaptive-random constructive placement.
//!
//! Not a backtracking search: a single greedy pass in four phases with
//! progressively more injected randomness. Committed seats are never
//! revisited, which trades optimality for speed and variety; the engine
//! compensates by generating several independent candidate runs from
//! consecutive seeds and keeping the best-scoring one.

mod rng;

use std::collections::HashMap;

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use seatforge_config::{
    PlacementConfig, RandomnessConfig, RandomnessPreset, ResolvedRandomness, SelectionMode,
    TerminationConfig,
};
use seatforge_core::domain::{
    Gender, PlacementResult, Position, SeatingArrangement, Student,
};
use seatforge_core::seats;

use crate::budget::SearchBudget;
use crate::context::PlacementContext;
use crate::engine::Engine;

use rng::Lcg64;

/// Construction phases, run in order over whatever the previous phase left
/// unplaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    ConstraintPriority,
    Heuristic,
    Exploration,
    Diversity,
}

impl Phase {
    const ALL: [Phase; 4] = [
        Phase::ConstraintPriority,
        Phase::Heuristic,
        Phase::Exploration,
        Phase::Diversity,
    ];

    /// Share of the configured randomness budget this phase injects.
    fn randomness_share(self) -> f64 {
        match self {
            Phase::ConstraintPriority => 0.2,
            Phase::Heuristic => 0.4,
            Phase::Exploration => 0.6,
            Phase::Diversity => 0.8,
        }
    }

    /// Multipliers for the (constraint, heuristic, random, diversity)
    /// components of the seat score.
    fn multipliers(self) -> (f64, f64, f64, f64) {
        match self {
            Phase::ConstraintPriority => (2.0, 1.0, 0.5, 0.5),
            Phase::Heuristic => (1.0, 2.0, 0.75, 0.5),
            Phase::Exploration => (0.75, 0.75, 1.5, 1.0),
            Phase::Diversity => (0.5, 0.5, 1.0, 2.0),
        }
    }

    /// How many students may remain unplaced when the phase ends.
    fn remaining_after(self, total: usize) -> usize {
        match self {
            Phase::ConstraintPriority => total * 3 / 4,
            Phase::Heuristic => total / 2,
            Phase::Exploration => total / 4,
            Phase::Diversity => 0,
        }
    }
}

/// A scored open seat.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    pos: Position,
    total: f64,
    constraint: f64,
    diversity: f64,
}

/// The adaptive-random constructive engine.
#[derive(Debug)]
pub struct AdaptiveRandomEngine {
    termination: TerminationConfig,
    randomness: RandomnessConfig,
    seed: Option<u64>,
}

impl AdaptiveRandomEngine {
    pub fn new(config: &PlacementConfig) -> Self {
        Self {
            termination: config.termination.clone(),
            randomness: config.randomness.clone(),
            seed: config.random_seed,
        }
    }

    /// Replaces the preset while keeping per-field overrides.
    pub fn with_preset(mut self, preset: RandomnessPreset) -> Self {
        self.randomness.preset = Some(preset);
        self
    }

    /// Overrides the candidate-run base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// One full greedy construction with the given generator.
    fn construct(
        &self,
        ctx: &PlacementContext<'_>,
        base: &SeatingArrangement,
        params: ResolvedRandomness,
        rng: &mut Lcg64,
        usage: &mut HashMap<Position, u32>,
        budget: &SearchBudget,
    ) -> SeatingArrangement {
        let mut seating = base.clone();
        let mut unplaced: Vec<&Student> = ctx.placeable_students().collect();
        let total = unplaced.len();

        for phase in Phase::ALL {
            let keep_after = phase.remaining_after(total);
            while unplaced.len() > keep_after {
                if budget.expired() {
                    return seating;
                }
                let pick = self.select_student(ctx, &seating, &unplaced, phase, params, rng);
                let student = unplaced.swap_remove(pick);

                let candidates = self.scored_seats(ctx, &seating, student, phase, params, usage, rng);
                if candidates.is_empty() {
                    // No viable seat under the current partial state; the
                    // student stays unplaced, no revisiting.
                    continue;
                }
                let pos = pick_seat(params.mode, &candidates, rng);
                seating.assign(pos, student.id);
                *usage.entry(pos).or_insert(0) += 1;
            }
        }
        seating
    }

    /// Picks the next student: constraint weight plus gender-balance bonus
    /// plus a random bonus scaled by the phase's randomness factor, then
    /// either an exploratory or an exploitative draw over the ranking.
    fn select_student(
        &self,
        ctx: &PlacementContext<'_>,
        seating: &SeatingArrangement,
        unplaced: &[&Student],
        phase: Phase,
        params: ResolvedRandomness,
        rng: &mut Lcg64,
    ) -> usize {
        let minority = underrepresented_gender(ctx, seating);
        let phase_randomness = params.randomness * phase.randomness_share();

        let mut ranked: Vec<(f64, usize)> = unplaced
            .iter()
            .enumerate()
            .map(|(i, student)| {
                let weight = f64::from(ctx.index().weight_of(student.id)) * 0.1;
                let balance = if minority == Some(student.gender) { 0.5 } else { 0.0 };
                let bonus = rng.random::<f64>() * phase_randomness;
                (weight + balance + bonus, i)
            })
            .collect();
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

        if rng.random::<f64>() < params.exploration_probability {
            // Exploration: uniform draw over the top 30%.
            let cut = ((ranked.len() as f64 * 0.3).ceil() as usize).clamp(1, ranked.len());
            ranked[rng.random_range(0..cut)].1
        } else {
            // Exploitation: weighted draw over the top three (0.6/0.3/0.1).
            let top = ranked.len().min(3);
            let roll = rng.random::<f64>();
            let rank = if roll < 0.6 {
                0
            } else if roll < 0.9 {
                1
            } else {
                2
            };
            ranked[rank.min(top - 1)].1
        }
    }

    /// Scores every open eligible seat on constraint fit, grid heuristic,
    /// a random factor and diversity, weighted per phase. Sorted best-first.
    #[allow(clippy::too_many_arguments)]
    fn scored_seats(
        &self,
        ctx: &PlacementContext<'_>,
        seating: &SeatingArrangement,
        student: &Student,
        phase: Phase,
        params: ResolvedRandomness,
        usage: &HashMap<Position, u32>,
        rng: &mut Lcg64,
    ) -> Vec<Candidate> {
        let classroom = ctx.classroom();
        let index = ctx.index();
        let (mc, mh, mr, md) = phase.multipliers();
        let phase_randomness = params.randomness * phase.randomness_share();

        let mut candidates: Vec<Candidate> = seats::available_seats(classroom)
            .into_iter()
            .filter(|&pos| seats::is_eligible_in(student, pos, classroom, index, seating))
            .map(|pos| {
                let constraint = self.constraint_score(ctx, student, pos, seating);
                let heuristic = grid_score(classroom, pos);
                let random = rng.random::<f64>() * phase_randomness;
                let diversity =
                    1.0 / (1.0 + f64::from(usage.get(&pos).copied().unwrap_or(0)));
                Candidate {
                    pos,
                    total: mc * constraint + mh * heuristic + mr * random + md * diversity,
                    constraint,
                    diversity,
                }
            })
            .collect();
        candidates.sort_by(|a, b| b.total.total_cmp(&a.total).then(a.pos.cmp(&b.pos)));
        candidates
    }

    /// Constraint fit of a seat given already-placed partners. Eligibility
    /// has already excluded hard violations; this ranks what remains.
    fn constraint_score(
        &self,
        ctx: &PlacementContext<'_>,
        student: &Student,
        pos: Position,
        seating: &SeatingArrangement,
    ) -> f64 {
        let classroom = ctx.classroom();
        let index = ctx.index();
        let mate = seats::pair_partner(pos, classroom);
        let mut score = 1.0;

        for partner in index.required_partners(student.id) {
            match seating.position_of(partner) {
                Some(partner_pos) => {
                    if seats::is_pair_position(pos, partner_pos, classroom) {
                        score += 3.0;
                    } else {
                        score -= 3.0;
                    }
                }
                None => match mate {
                    Some(m) if !seating.is_occupied(m) && !classroom.is_disabled(m) => {
                        score += 1.0;
                    }
                    _ => score -= 1.0,
                },
            }
        }
        for (partner, min_distance) in index.distance_partners(student.id) {
            if let Some(partner_pos) = seating.position_of(partner) {
                // Sitting exactly at the minimum wastes the least grid.
                if seats::chebyshev(pos, partner_pos) == min_distance {
                    score += 0.5;
                }
            }
        }
        score
    }
}

impl Engine for AdaptiveRandomEngine {
    fn name(&self) -> &'static str {
        "adaptive-random"
    }

    fn place(&mut self, ctx: &PlacementContext<'_>) -> PlacementResult {
        let params = self.randomness.resolved();
        let budget = SearchBudget::start(&self.termination);
        let base = ctx.fixed_seating();
        let base_seed = match self.seed {
            Some(seed) => seed,
            None => ChaCha8Rng::from_os_rng().next_u64(),
        };

        // Seat-usage counts persist across candidate runs so later runs
        // spread over seats earlier runs leaned on.
        let mut usage: HashMap<Position, u32> = HashMap::new();
        let mut best: Option<(i64, PlacementResult)> = None;
        let mut generated = 0u32;

        for i in 0..u64::from(params.candidates) {
            if budget.expired() {
                break;
            }
            let mut rng = Lcg64::seed_from_u64(base_seed.wrapping_add(i));
            let seating = self.construct(ctx, &base, params, &mut rng, &mut usage, &budget);
            let result = ctx.build_result(seating, "");
            let score = result.stats.placed as i64 * 100 - result.violations.len() as i64 * 10;
            generated += 1;

            tracing::debug!(
                candidate = i,
                score,
                placed = result.stats.placed,
                violations = result.stats.violation_count,
                "adaptive candidate generated"
            );

            if best.as_ref().map_or(true, |(s, _)| score > *s) {
                best = Some((score, result));
            }
            if best.as_ref().is_some_and(|(_, r)| r.is_perfect()) {
                break;
            }
        }

        match best {
            Some((_, mut result)) => {
                result.message = if result.is_perfect() {
                    "all students placed".to_string()
                } else if budget.expired() {
                    "time limit reached during candidate generation".to_string()
                } else {
                    format!("kept the best of {generated} candidate runs")
                };
                result
            }
            None => ctx.build_result(base, "time limit reached before the first attempt"),
        }
    }
}

/// The gender currently underrepresented among seated students, if any.
fn underrepresented_gender(
    ctx: &PlacementContext<'_>,
    seating: &SeatingArrangement,
) -> Option<Gender> {
    let mut male = 0usize;
    let mut female = 0usize;
    for (_, id) in seating.iter() {
        match ctx.student(id).map(|s| s.gender) {
            Some(Gender::Male) => male += 1,
            Some(Gender::Female) => female += 1,
            None => {}
        }
    }
    match male.cmp(&female) {
        std::cmp::Ordering::Less => Some(Gender::Male),
        std::cmp::Ordering::Greater => Some(Gender::Female),
        std::cmp::Ordering::Equal => None,
    }
}

/// Static grid preference: front rows and central columns first.
fn grid_score(classroom: &seatforge_core::domain::ClassroomConfig, pos: Position) -> f64 {
    let rows = f64::from(classroom.rows()).max(1.0);
    let cols = f64::from(classroom.cols()).max(1.0);
    let center = (cols - 1.0) / 2.0;
    let row_cost = f64::from(pos.row) / rows;
    let col_cost = (f64::from(pos.col) - center).abs() / cols;
    1.0 - 0.3 * row_cost - 0.3 * col_cost
}

/// Applies the configured selection mode to a best-first candidate list.
fn pick_seat(mode: SelectionMode, candidates: &[Candidate], rng: &mut Lcg64) -> Position {
    match mode {
        SelectionMode::Conservative => {
            // Safest seat: highest constraint fit, candidate order breaks ties.
            candidates
                .iter()
                .fold(candidates[0], |best, c| {
                    if c.constraint > best.constraint {
                        *c
                    } else {
                        best
                    }
                })
                .pos
        }
        SelectionMode::Balanced => {
            // Weighted random over the top half, weight linear in score.
            let cut = (candidates.len() / 2).max(1);
            let pool = &candidates[..cut];
            let min = pool.iter().map(|c| c.total).fold(f64::INFINITY, f64::min);
            let weights: Vec<f64> = pool.iter().map(|c| c.total - min + 0.001).collect();
            let sum: f64 = weights.iter().sum();
            let mut roll = rng.random::<f64>() * sum;
            for (c, w) in pool.iter().zip(&weights) {
                if roll < *w {
                    return c.pos;
                }
                roll -= w;
            }
            pool[pool.len() - 1].pos
        }
        SelectionMode::Exploratory => {
            // Re-rank by score plus doubled diversity, uniform over the top 70%.
            let mut reranked: Vec<(f64, Position)> = candidates
                .iter()
                .map(|c| (c.total + 2.0 * c.diversity, c.pos))
                .collect();
            reranked.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
            let cut = ((reranked.len() as f64 * 0.7).ceil() as usize).clamp(1, reranked.len());
            reranked[rng.random_range(0..cut)].1
        }
        SelectionMode::Chaos => candidates[rng.random_range(0..candidates.len())].pos,
    }
}
