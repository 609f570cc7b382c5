//! Wall-clock and depth budgets.

use std::time::{Duration, Instant};

use seatforge_config::TerminationConfig;

/// Search budget shared across all attempts of one placement invocation.
///
/// Engines check it at the top of every recursive call or construction step
/// and return their best-so-far result when it is spent; expiry is an
/// outcome, never an error.
#[derive(Debug, Clone)]
pub struct SearchBudget {
    started: Instant,
    deadline: Option<Instant>,
    max_depth: usize,
}

impl SearchBudget {
    /// Starts the budget clock now.
    pub fn start(config: &TerminationConfig) -> Self {
        let started = Instant::now();
        Self {
            started,
            deadline: config
                .time_limit_ms
                .map(|ms| started + Duration::from_millis(ms)),
            max_depth: config.max_depth,
        }
    }

    /// Returns true once the wall-clock limit has passed.
    pub fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Returns true if the recursion depth exceeds the configured cap.
    pub fn depth_exceeded(&self, depth: usize) -> bool {
        depth > self.max_depth
    }

    /// Time left before the deadline, if one is set. Zero once expired.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Elapsed time since the budget started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_limit_never_expires() {
        let config = TerminationConfig {
            time_limit_ms: None,
            ..TerminationConfig::default()
        };
        let budget = SearchBudget::start(&config);
        assert!(!budget.expired());
    }

    #[test]
    fn test_zero_limit_expires_immediately() {
        let config = TerminationConfig {
            time_limit_ms: Some(0),
            ..TerminationConfig::default()
        };
        let budget = SearchBudget::start(&config);
        assert!(budget.expired());
    }

    #[test]
    fn test_depth_cap() {
        let config = TerminationConfig {
            max_depth: 3,
            ..TerminationConfig::default()
        };
        let budget = SearchBudget::start(&config);
        assert!(!budget.depth_exceeded(3));
        assert!(budget.depth_exceeded(4));
    }
}
