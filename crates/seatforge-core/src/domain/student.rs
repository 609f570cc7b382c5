//! Students and their identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique student identifier.
///
/// Assigned once at creation and never reused; all cross-references
/// (constraints, seatings, fixed placements) go through this id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct StudentId(pub u32);

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Student gender, used by seat-level gender restrictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

/// A student to be assigned a seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub gender: Gender,
    /// Optional roster number shown by the UI; irrelevant to placement.
    #[serde(default)]
    pub display_number: Option<u32>,
}

impl Student {
    /// Creates a new student.
    pub fn new(id: StudentId, name: impl Into<String>, gender: Gender) -> Self {
        Self {
            id,
            name: name.into(),
            gender,
            display_number: None,
        }
    }

    /// Sets the roster display number.
    pub fn with_display_number(mut self, number: u32) -> Self {
        self.display_number = Some(number);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_identity_is_id() {
        let a = Student::new(StudentId(1), "Aiko", Gender::Female);
        assert_eq!(a.id, StudentId(1));
        assert_eq!(a.display_number, None);

        let b = a.clone().with_display_number(7);
        assert_eq!(b.display_number, Some(7));
    }
}
