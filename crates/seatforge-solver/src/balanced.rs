//! Gender-balanced constructive pass.
//!
//! A thin deterministic engine: fills every desk with a mixed pair first,
//! then seats whoever is left row-major. One pass, no search, no budget.

use std::collections::VecDeque;

use seatforge_core::domain::{PlacementResult, Position, SeatingArrangement, Student};
use seatforge_core::seats;

use crate::context::PlacementContext;
use crate::engine::Engine;

/// The gender-balanced engine.
#[derive(Debug, Default)]
pub struct GenderBalancedEngine;

impl GenderBalancedEngine {
    pub fn new() -> Self {
        Self
    }

    /// Removes and returns the first queued student eligible for `pos`.
    fn take_eligible<'a>(
        queue: &mut VecDeque<&'a Student>,
        pos: Position,
        seating: &SeatingArrangement,
        ctx: &PlacementContext<'_>,
    ) -> Option<&'a Student> {
        let i = queue.iter().position(|student| {
            seats::is_eligible_in(student, pos, ctx.classroom(), ctx.index(), seating)
        })?;
        queue.remove(i)
    }
}

impl Engine for GenderBalancedEngine {
    fn name(&self) -> &'static str {
        "gender-balanced"
    }

    fn place(&mut self, ctx: &PlacementContext<'_>) -> PlacementResult {
        let classroom = ctx.classroom();
        let mut seating = ctx.fixed_seating();

        let mut girls: VecDeque<&Student> = VecDeque::new();
        let mut boys: VecDeque<&Student> = VecDeque::new();
        for student in ctx.placeable_students() {
            match student.gender {
                seatforge_core::domain::Gender::Female => girls.push_back(student),
                seatforge_core::domain::Gender::Male => boys.push_back(student),
            }
        }

        // Pass one: mixed pairs on desks, trying both orientations.
        for (left, right) in seats::pair_seats(classroom) {
            if seating.is_occupied(left) || seating.is_occupied(right) {
                continue;
            }
            if girls.is_empty() || boys.is_empty() {
                break;
            }
            let seated = [(left, right), (right, left)].into_iter().any(|(g, b)| {
                let Some(girl) = Self::take_eligible(&mut girls, g, &seating, ctx) else {
                    return false;
                };
                if let Some(boy) = Self::take_eligible(&mut boys, b, &seating, ctx) {
                    seating.assign(g, girl.id);
                    seating.assign(b, boy.id);
                    true
                } else {
                    girls.push_front(girl);
                    false
                }
            });
            if !seated {
                tracing::debug!(?left, ?right, "no mixed pair fits this desk");
            }
        }

        // Pass two: everyone left, alternating genders, row-major seats.
        let mut leftovers: VecDeque<&Student> = VecDeque::new();
        let mut from_girls = girls.len() >= boys.len();
        while !girls.is_empty() || !boys.is_empty() {
            let next = if from_girls {
                girls.pop_front().or_else(|| boys.pop_front())
            } else {
                boys.pop_front().or_else(|| girls.pop_front())
            };
            if let Some(student) = next {
                leftovers.push_back(student);
            }
            from_girls = !from_girls;
        }
        for student in leftovers {
            let seat = seats::available_seats(classroom).into_iter().find(|&pos| {
                seats::is_eligible_in(student, pos, classroom, ctx.index(), &seating)
            });
            if let Some(pos) = seat {
                seating.assign(pos, student.id);
            }
        }

        let requested = ctx.placeable().len();
        let message = if seating.len() == requested + ctx.fixed().len() {
            "all students placed".to_string()
        } else {
            "not every student could be seated".to_string()
        };
        ctx.build_result(seating, message)
    }
}
