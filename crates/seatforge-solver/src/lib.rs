//! Placement engines for Seatforge.
//!
//! Three interchangeable search strategies plus a thin constructive pass,
//! all behind the [`Engine`] trait:
//!
//! - [`BacktrackingEngine`] — classic recursion with most-constraining-first
//!   ordering, cost-ranked seats, forward checking and random restarts.
//! - [`HeuristicPropagationEngine`] — adds per-student seat domains,
//!   pre-search constraint propagation and flexibility-aware scoring.
//! - [`AdaptiveRandomEngine`] — four-phase greedy construction with a seeded
//!   PRNG, producing diverse rather than optimal seatings.
//! - [`GenderBalancedEngine`] — deterministic mixed-pair desk fill.
//!
//! [`run_with_retry`] selects an engine by [`EngineSelector`] and applies
//! the configured retry policy. Engines never call each other.

mod adaptive;
mod backtracking;
mod balanced;
mod budget;
mod context;
mod engine;
mod heuristic;
mod retry;

pub use adaptive::AdaptiveRandomEngine;
pub use backtracking::BacktrackingEngine;
pub use balanced::GenderBalancedEngine;
pub use budget::SearchBudget;
pub use context::PlacementContext;
pub use engine::{prefer_by_placement, prefer_by_violations, Engine, EngineSelector};
pub use heuristic::HeuristicPropagationEngine;
pub use retry::{run_with_retry, ProgressFn};
