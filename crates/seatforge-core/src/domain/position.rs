//! Grid coordinates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A zero-based (row, column) coordinate on the classroom grid.
///
/// Used directly as a map key everywhere a seat must be looked up;
/// equality and hashing are by value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct Position {
    pub row: u8,
    pub col: u8,
}

impl Position {
    /// Creates a new position.
    pub fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Serde adapter that serializes a `HashMap<Position, V>` as a sorted list
/// of entries, so positions survive formats (like JSON) whose map keys must
/// be strings.
pub(crate) mod position_map {
    use std::collections::HashMap;

    use serde::de::{Deserialize, Deserializer};
    use serde::ser::{Serialize, Serializer};

    use super::Position;

    pub fn serialize<V, S>(map: &HashMap<Position, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        V: Serialize,
        S: Serializer,
    {
        let mut entries: Vec<(&Position, &V)> = map.iter().collect();
        entries.sort_by_key(|(pos, _)| **pos);
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, V, D>(deserializer: D) -> Result<HashMap<Position, V>, D::Error>
    where
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let entries: Vec<(Position, V)> = Vec::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_equality_by_value() {
        assert_eq!(Position::new(2, 3), Position::new(2, 3));
        assert_ne!(Position::new(2, 3), Position::new(3, 2));
    }

    #[test]
    fn test_position_display() {
        assert_eq!(Position::new(1, 4).to_string(), "(1, 4)");
    }

    #[test]
    fn test_position_ordering_is_row_major() {
        assert!(Position::new(0, 9) < Position::new(1, 0));
        assert!(Position::new(1, 2) < Position::new(1, 3));
    }
}
