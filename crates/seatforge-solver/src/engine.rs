//! The engine abstraction and result comparison.

use std::str::FromStr;

use seatforge_config::RandomnessPreset;
use seatforge_core::domain::PlacementResult;
use seatforge_core::error::SeatforgeError;

use crate::context::PlacementContext;

/// A placement strategy.
///
/// Engines never call each other; the orchestrator selects one by name and
/// may invoke it repeatedly with varied seeds.
pub trait Engine {
    /// Short stable name, used in logs and selection.
    fn name(&self) -> &'static str;

    /// Runs one placement over the context's placeable students.
    ///
    /// Always returns a result; partial placement and budget expiry are
    /// reported through `success` and `message`, never as errors.
    fn place(&mut self, ctx: &PlacementContext<'_>) -> PlacementResult;
}

/// Names one of the available engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineSelector {
    Backtracking,
    HeuristicPropagation,
    AdaptiveRandom(Option<RandomnessPreset>),
    GenderBalanced,
}

impl EngineSelector {
    /// The engine's stable name (presets elided).
    pub fn engine_name(&self) -> &'static str {
        match self {
            EngineSelector::Backtracking => "backtracking",
            EngineSelector::HeuristicPropagation => "heuristic-propagation",
            EngineSelector::AdaptiveRandom(_) => "adaptive-random",
            EngineSelector::GenderBalanced => "gender-balanced",
        }
    }
}

impl FromStr for EngineSelector {
    type Err = SeatforgeError;

    /// Parses `"backtracking"`, `"heuristic-propagation"`,
    /// `"gender-balanced"`, `"adaptive-random"` or
    /// `"adaptive-random:<preset>"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backtracking" => Ok(EngineSelector::Backtracking),
            "heuristic-propagation" => Ok(EngineSelector::HeuristicPropagation),
            "gender-balanced" => Ok(EngineSelector::GenderBalanced),
            "adaptive-random" => Ok(EngineSelector::AdaptiveRandom(None)),
            _ => match s.strip_prefix("adaptive-random:") {
                Some("subtle") => Ok(EngineSelector::AdaptiveRandom(Some(RandomnessPreset::Subtle))),
                Some("balanced") => {
                    Ok(EngineSelector::AdaptiveRandom(Some(RandomnessPreset::Balanced)))
                }
                Some("creative") => {
                    Ok(EngineSelector::AdaptiveRandom(Some(RandomnessPreset::Creative)))
                }
                Some("wild") => Ok(EngineSelector::AdaptiveRandom(Some(RandomnessPreset::Wild))),
                _ => Err(SeatforgeError::Config(format!("unknown engine: {s}"))),
            },
        }
    }
}

/// Picks the better of two results for intra-engine restarts:
/// more students placed wins, then fewer violations. Ties keep `current`.
pub fn prefer_by_placement(
    current: PlacementResult,
    challenger: PlacementResult,
) -> PlacementResult {
    let better = (challenger.stats.placed > current.stats.placed)
        || (challenger.stats.placed == current.stats.placed
            && challenger.violations.len() < current.violations.len());
    if better {
        challenger
    } else {
        current
    }
}

/// Picks the better of two results for the retry orchestrator:
/// fewer violations wins, then more placed, then fewer unplaced.
/// Ties keep `current`, so the kept violation count never increases.
pub fn prefer_by_violations(
    current: PlacementResult,
    challenger: PlacementResult,
) -> PlacementResult {
    let c = (
        current.violations.len(),
        usize::MAX - current.stats.placed,
        current.stats.unplaced,
    );
    let ch = (
        challenger.violations.len(),
        usize::MAX - challenger.stats.placed,
        challenger.stats.unplaced,
    );
    if ch < c {
        challenger
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatforge_core::domain::{
        ClassroomConfig, ConstraintViolation, PlacementResult, SeatingArrangement, ViolationKind,
    };

    fn result(placed: usize, violations: usize) -> PlacementResult {
        let classroom = ClassroomConfig::new("room", 5, 5).unwrap();
        let mut seating = SeatingArrangement::new();
        for i in 0..placed {
            seating.assign(
                seatforge_core::domain::Position::new((i / 5) as u8, (i % 5) as u8),
                seatforge_core::domain::StudentId(i as u32),
            );
        }
        let violations = (0..violations)
            .map(|_| ConstraintViolation::new(ViolationKind::Distance, "too close", vec![]))
            .collect();
        PlacementResult::from_run(seating, "test", violations, &classroom, 10, 0)
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!(
            "backtracking".parse::<EngineSelector>().unwrap(),
            EngineSelector::Backtracking
        );
        assert_eq!(
            "adaptive-random:wild".parse::<EngineSelector>().unwrap(),
            EngineSelector::AdaptiveRandom(Some(RandomnessPreset::Wild))
        );
        assert!("annealing".parse::<EngineSelector>().is_err());
    }

    #[test]
    fn test_placement_preference_ranks_placed_first() {
        let kept = prefer_by_placement(result(4, 0), result(5, 3));
        assert_eq!(kept.stats.placed, 5);

        let kept = prefer_by_placement(result(5, 1), result(5, 0));
        assert_eq!(kept.violations.len(), 0);
    }

    #[test]
    fn test_violation_preference_ranks_violations_first() {
        let kept = prefer_by_violations(result(5, 2), result(3, 1));
        assert_eq!(kept.violations.len(), 1);

        // Equal violations: more placed wins.
        let kept = prefer_by_violations(result(3, 1), result(5, 1));
        assert_eq!(kept.stats.placed, 5);
    }

    #[test]
    fn test_ties_keep_current() {
        let current = result(5, 1);
        let kept = prefer_by_violations(current.clone(), result(5, 1));
        assert_eq!(kept, current);
    }
}
