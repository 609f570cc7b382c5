//! Placement results and statistics.

use serde::{Deserialize, Serialize};

use crate::domain::classroom::ClassroomConfig;
use crate::domain::constraint::ConstraintViolation;
use crate::domain::seating::SeatingArrangement;

/// Aggregate statistics for one placement run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementStats {
    pub total_seats: usize,
    pub available_seats: usize,
    pub disabled_seats: usize,
    pub placed: usize,
    pub unplaced: usize,
    pub violation_count: usize,
}

/// The outcome of a placement run.
///
/// Always returned, even for partial or failed placements; engines never
/// raise an error for "could not fully place". `success` is false exactly
/// when at least one requested student remained unplaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementResult {
    pub success: bool,
    pub seating: SeatingArrangement,
    pub message: String,
    pub violations: Vec<ConstraintViolation>,
    pub stats: PlacementStats,
}

impl PlacementResult {
    /// Assembles a result, deriving statistics from the seating and grid.
    ///
    /// `requested` is the number of students the engine was asked to place,
    /// fixed placements excluded; `fixed` is the number of pinned seats
    /// already present in the seating.
    pub fn from_run(
        seating: SeatingArrangement,
        message: impl Into<String>,
        violations: Vec<ConstraintViolation>,
        classroom: &ClassroomConfig,
        requested: usize,
        fixed: usize,
    ) -> Self {
        let placed = seating.len().saturating_sub(fixed);
        let unplaced = requested.saturating_sub(placed);
        let disabled = classroom.disabled_seats();
        let stats = PlacementStats {
            total_seats: classroom.total_seats(),
            available_seats: classroom.total_seats() - disabled,
            disabled_seats: disabled,
            placed,
            unplaced,
            violation_count: violations.len(),
        };
        Self {
            success: unplaced == 0,
            seating,
            message: message.into(),
            violations,
            stats,
        }
    }

    /// True when everyone was placed and nothing is violated.
    pub fn is_perfect(&self) -> bool {
        self.success && self.violations.is_empty()
    }
}
