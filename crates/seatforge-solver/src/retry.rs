//! Retry orchestration.
//!
//! Runs the selected engine once, or repeatedly with offset seeds when
//! retries are enabled, keeping the best result by violation count.

use seatforge_config::PlacementConfig;
use seatforge_core::domain::PlacementResult;

use crate::adaptive::AdaptiveRandomEngine;
use crate::backtracking::BacktrackingEngine;
use crate::balanced::GenderBalancedEngine;
use crate::budget::SearchBudget;
use crate::context::PlacementContext;
use crate::engine::{prefer_by_violations, Engine, EngineSelector};
use crate::heuristic::HeuristicPropagationEngine;

/// Progress callback: `(attempt, max_attempts)`, 1-based, called before
/// each attempt starts.
pub type ProgressFn<'p> = &'p mut dyn FnMut(u32, u32);

/// Runs the selected engine under the retry policy in `config`.
///
/// With retries disabled the engine runs exactly once. With retries enabled
/// it runs up to `max_retries` times, each attempt reseeded by offsetting
/// the configured seed, and stops early the first time an attempt finishes
/// with zero constraint violations. All attempts share one wall-clock
/// budget; across them the kept result's violation count never increases.
pub fn run_with_retry(
    selector: EngineSelector,
    ctx: &PlacementContext<'_>,
    config: &PlacementConfig,
    mut on_progress: Option<ProgressFn<'_>>,
) -> PlacementResult {
    let max_attempts = if config.retry.enabled {
        config.retry.max_retries.max(1)
    } else {
        1
    };
    let budget = SearchBudget::start(&config.termination);

    let mut best = run_attempt(selector, ctx, config, &budget, 0, max_attempts, &mut on_progress);
    for attempt in 1..max_attempts {
        if best.violations.is_empty() || budget.expired() {
            break;
        }
        let result =
            run_attempt(selector, ctx, config, &budget, attempt, max_attempts, &mut on_progress);
        best = prefer_by_violations(best, result);
    }

    tracing::debug!(
        engine = selector.engine_name(),
        placed = best.stats.placed,
        violations = best.stats.violation_count,
        success = best.success,
        "placement finished"
    );
    best
}

fn run_attempt(
    selector: EngineSelector,
    ctx: &PlacementContext<'_>,
    config: &PlacementConfig,
    budget: &SearchBudget,
    attempt: u32,
    max_attempts: u32,
    on_progress: &mut Option<ProgressFn<'_>>,
) -> PlacementResult {
    if let Some(progress) = on_progress.as_deref_mut() {
        progress(attempt + 1, max_attempts);
    }
    let mut engine = build_engine(selector, config, budget, attempt);
    tracing::debug!(engine = engine.name(), attempt, "starting placement attempt");
    engine.place(ctx)
}

fn build_engine(
    selector: EngineSelector,
    config: &PlacementConfig,
    budget: &SearchBudget,
    attempt: u32,
) -> Box<dyn Engine> {
    let mut config = config.clone();
    if attempt > 0 {
        if let Some(seed) = config.random_seed {
            config.random_seed = Some(seed.wrapping_add(u64::from(attempt)));
        }
    }
    // The wall-clock budget spans the whole invocation; each attempt only
    // gets what the earlier attempts left of it.
    if let Some(remaining) = budget.remaining() {
        config.termination.time_limit_ms = Some(remaining.as_millis() as u64);
    }
    match selector {
        EngineSelector::Backtracking => Box::new(BacktrackingEngine::new(&config)),
        EngineSelector::HeuristicPropagation => {
            Box::new(HeuristicPropagationEngine::new(&config))
        }
        EngineSelector::AdaptiveRandom(preset) => {
            let engine = AdaptiveRandomEngine::new(&config);
            Box::new(match preset {
                Some(preset) => engine.with_preset(preset),
                None => engine,
            })
        }
        EngineSelector::GenderBalanced => Box::new(GenderBalancedEngine::new()),
    }
}
