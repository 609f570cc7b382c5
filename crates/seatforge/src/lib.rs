//! Constraint-based classroom seat assignment.
//!
//! Seatforge places students on a row/column seat grid under pairing,
//! distance, gender, disabled-seat and row-exclusion constraints. Three
//! search engines and one constructive pass are available behind a single
//! entry point; results always come back as a [`PlacementResult`], partial
//! placements included.
//!
//! # Examples
//!
//! ```
//! use seatforge::{
//!     place_students, ClassroomConfig, Constraint, ConstraintId, EngineSelector, Gender,
//!     PlacementConfig, Student, StudentId,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let students = vec![
//!     Student::new(StudentId(1), "Aiko", Gender::Female),
//!     Student::new(StudentId(2), "Taro", Gender::Male),
//!     Student::new(StudentId(3), "Yumi", Gender::Female),
//!     Student::new(StudentId(4), "Ken", Gender::Male),
//! ];
//! let classroom = ClassroomConfig::new("3-B", 3, 4)?.with_pair_columns(vec![(0, 1)])?;
//! let constraints = vec![Constraint::pair_required(
//!     ConstraintId(1),
//!     StudentId(1),
//!     StudentId(2),
//! )];
//! let config = PlacementConfig::new().with_random_seed(42);
//!
//! let result = place_students(
//!     &students,
//!     &classroom,
//!     &constraints,
//!     &[],
//!     EngineSelector::Backtracking,
//!     &config,
//! )?;
//! assert!(result.success);
//! # Ok(())
//! # }
//! ```

pub use seatforge_config::{
    PlacementConfig, RandomnessConfig, RandomnessPreset, RetryConfig, SelectionMode,
    TerminationConfig,
};
pub use seatforge_core::domain::{
    ClassroomConfig, Constraint, ConstraintId, ConstraintKind, ConstraintViolation,
    FixedPlacement, Gender, PlacementResult, PlacementStats, Position, SeatingArrangement,
    Student, StudentId, ViolationKind,
};
pub use seatforge_core::error::{Result, SeatforgeError};
pub use seatforge_core::validate::{Compatibility, Validation};
pub use seatforge_solver::{Engine, EngineSelector, PlacementContext};

/// Places students with the selected engine under the given configuration.
///
/// The only search entry point. Fixed placements are pre-seated and never
/// relocated; inability to seat everyone is reported through
/// [`PlacementResult::success`], never as an error.
///
/// # Errors
///
/// Returns [`SeatforgeError::InvalidPlacement`] only for caller bugs in the
/// fixed placements (off-grid seats, unknown students, collisions).
pub fn place_students(
    students: &[Student],
    classroom: &ClassroomConfig,
    constraints: &[Constraint],
    fixed: &[FixedPlacement],
    selector: EngineSelector,
    config: &PlacementConfig,
) -> Result<PlacementResult> {
    let ctx = PlacementContext::new(students, classroom, constraints, fixed)?;
    tracing::debug!(
        engine = selector.engine_name(),
        students = students.len(),
        constraints = constraints.len(),
        fixed = fixed.len(),
        "placing students"
    );
    Ok(seatforge_solver::run_with_retry(selector, &ctx, config, None))
}

/// Like [`place_students`], reporting `(attempt, max_attempts)` before each
/// orchestrated attempt.
pub fn place_students_with_progress(
    students: &[Student],
    classroom: &ClassroomConfig,
    constraints: &[Constraint],
    fixed: &[FixedPlacement],
    selector: EngineSelector,
    config: &PlacementConfig,
    mut on_progress: impl FnMut(u32, u32),
) -> Result<PlacementResult> {
    let ctx = PlacementContext::new(students, classroom, constraints, fixed)?;
    Ok(seatforge_solver::run_with_retry(
        selector,
        &ctx,
        config,
        Some(&mut on_progress),
    ))
}

/// Validates a (possibly hand-edited) arrangement against every constraint
/// and seat-level rule. Read-only, callable at any time.
pub fn validate_arrangement(
    seating: &SeatingArrangement,
    students: &[Student],
    classroom: &ClassroomConfig,
    constraints: &[Constraint],
) -> Validation {
    seatforge_core::validate::validate_all(seating, students, classroom, constraints)
}

/// Pre-flight check for contradictory constraint combinations. Read-only;
/// callers decide whether to abort or proceed with a warning.
pub fn check_constraint_compatibility(
    constraints: &[Constraint],
    students: &[Student],
    classroom: &ClassroomConfig,
) -> Compatibility {
    seatforge_core::validate::check_compatibility(constraints, students, classroom)
}
