//! Classroom grid configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::position::{position_map, Position};
use crate::domain::student::Gender;
use crate::error::{Result, SeatforgeError};

/// Smallest supported grid dimension.
pub const MIN_DIMENSION: u8 = 3;
/// Largest supported grid dimension.
pub const MAX_DIMENSION: u8 = 10;

/// Per-seat usage restriction (e.g. a broken desk).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatUsage {
    pub disabled: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

/// The classroom grid: dimensions, declared pair columns and sparse
/// per-seat constraints.
///
/// Invariant: at most one gender constraint and one usage constraint per
/// position (the maps guarantee this), and every declared position lies on
/// the grid (the mutators guarantee this).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassroomConfig {
    name: String,
    rows: u8,
    cols: u8,
    /// Adjacent `(even, odd)` column pairs forming two-person desks.
    pair_columns: Vec<(u8, u8)>,
    #[serde(with = "position_map")]
    seat_genders: HashMap<Position, Gender>,
    #[serde(with = "position_map")]
    seat_usage: HashMap<Position, SeatUsage>,
}

impl ClassroomConfig {
    /// Creates a classroom grid.
    ///
    /// # Errors
    ///
    /// Returns [`SeatforgeError::InvalidClassroom`] if either dimension is
    /// outside `3..=10`.
    pub fn new(name: impl Into<String>, rows: u8, cols: u8) -> Result<Self> {
        if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&rows)
            || !(MIN_DIMENSION..=MAX_DIMENSION).contains(&cols)
        {
            return Err(SeatforgeError::InvalidClassroom(format!(
                "dimensions must be between {MIN_DIMENSION} and {MAX_DIMENSION}, got {rows}x{cols}"
            )));
        }
        Ok(Self {
            name: name.into(),
            rows,
            cols,
            pair_columns: Vec::new(),
            seat_genders: HashMap::new(),
            seat_usage: HashMap::new(),
        })
    }

    /// Declares pair columns. Each pair must be `(2k, 2k+1)` and in range.
    pub fn with_pair_columns(mut self, pairs: Vec<(u8, u8)>) -> Result<Self> {
        for &(left, right) in &pairs {
            if left % 2 != 0 || right != left + 1 || right >= self.cols {
                return Err(SeatforgeError::InvalidClassroom(format!(
                    "pair columns must be adjacent (even, odd) pairs within the grid, got ({left}, {right})"
                )));
            }
        }
        self.pair_columns = pairs;
        Ok(self)
    }

    /// Requires a specific gender for one seat.
    pub fn require_gender(&mut self, pos: Position, gender: Gender) -> Result<()> {
        self.check_bounds(pos)?;
        self.seat_genders.insert(pos, gender);
        Ok(())
    }

    /// Marks one seat unusable.
    pub fn disable_seat(&mut self, pos: Position, reason: Option<String>) -> Result<()> {
        self.check_bounds(pos)?;
        self.seat_usage.insert(
            pos,
            SeatUsage {
                disabled: true,
                reason,
            },
        );
        Ok(())
    }

    fn check_bounds(&self, pos: Position) -> Result<()> {
        if self.contains(pos) {
            Ok(())
        } else {
            Err(SeatforgeError::InvalidClassroom(format!(
                "position {pos} is outside the {}x{} grid",
                self.rows, self.cols
            )))
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn cols(&self) -> u8 {
        self.cols
    }

    pub fn pair_columns(&self) -> &[(u8, u8)] {
        &self.pair_columns
    }

    /// Returns true if the position lies on the grid.
    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    /// Returns the required gender for a seat, if any.
    pub fn seat_gender(&self, pos: Position) -> Option<Gender> {
        self.seat_genders.get(&pos).copied()
    }

    /// Returns true if the seat has an active usage restriction.
    pub fn is_disabled(&self, pos: Position) -> bool {
        self.seat_usage.get(&pos).is_some_and(|u| u.disabled)
    }

    /// Returns the usage restriction for a seat, if any.
    pub fn seat_usage(&self, pos: Position) -> Option<&SeatUsage> {
        self.seat_usage.get(&pos)
    }

    /// Total number of grid cells, disabled or not.
    pub fn total_seats(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Number of disabled seats.
    pub fn disabled_seats(&self) -> usize {
        self.seat_usage.values().filter(|u| u.disabled).count()
    }

    /// Returns true if `row` falls within the last `n` rows of the grid.
    pub fn is_in_last_rows(&self, row: u8, n: u8) -> bool {
        n > 0 && row >= self.rows.saturating_sub(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_validated() {
        assert!(ClassroomConfig::new("tiny", 2, 5).is_err());
        assert!(ClassroomConfig::new("wide", 5, 11).is_err());
        assert!(ClassroomConfig::new("ok", 3, 3).is_ok());
    }

    #[test]
    fn test_pair_columns_must_be_even_odd_adjacent() {
        let room = ClassroomConfig::new("room", 4, 6).unwrap();
        assert!(room.clone().with_pair_columns(vec![(1, 2)]).is_err());
        assert!(room.clone().with_pair_columns(vec![(0, 2)]).is_err());
        assert!(room.clone().with_pair_columns(vec![(4, 5), (0, 1)]).is_ok());
    }

    #[test]
    fn test_pair_columns_in_range() {
        let room = ClassroomConfig::new("room", 4, 5).unwrap();
        // Column 5 does not exist on a 5-column grid.
        assert!(room.with_pair_columns(vec![(4, 5)]).is_err());
    }

    #[test]
    fn test_seat_constraints_bounds_checked() {
        let mut room = ClassroomConfig::new("room", 3, 3).unwrap();
        assert!(room.require_gender(Position::new(5, 0), Gender::Male).is_err());
        assert!(room.disable_seat(Position::new(1, 1), None).is_ok());
        assert!(room.is_disabled(Position::new(1, 1)));
        assert!(!room.is_disabled(Position::new(0, 0)));
        assert_eq!(room.disabled_seats(), 1);
    }

    #[test]
    fn test_last_rows() {
        let room = ClassroomConfig::new("room", 5, 3).unwrap();
        assert!(room.is_in_last_rows(4, 1));
        assert!(!room.is_in_last_rows(3, 1));
        assert!(room.is_in_last_rows(3, 2));
        assert!(!room.is_in_last_rows(0, 0));
    }
}
