//! Decision logic evaluated by transitions
//!
//! Decisions are shared between every entity using a node, so they keep
//! no per-entity fields. Anything they need to remember across ticks goes
//! into the controller's memory.

use std::fmt;

use rand::Rng;

use super::controller::StateContext;

/// Memory key of the timer drawn by [`WaitForRandom`]
pub const RANDOM_WAIT_KEY: &str = "randomWaitTimer";

/// Memory key of the completed-wander counter
pub const WANDER_COUNT_KEY: &str = "wanderingActionsCompleted";

/// Predicate deciding which branch of a transition to take
pub trait DecisionLogic: fmt::Debug {
    /// Evaluate against the controller in `ctx`
    fn decide(&self, ctx: &mut StateContext<'_>) -> bool;
}

/// True once the controller has spent `seconds` in its current state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwitchStateAfter {
    /// Threshold in seconds
    pub seconds: f32,
}

impl SwitchStateAfter {
    #[must_use]
    pub fn new(seconds: f32) -> Self {
        Self { seconds }
    }
}

impl DecisionLogic for SwitchStateAfter {
    fn decide(&self, ctx: &mut StateContext<'_>) -> bool {
        ctx.controller.time_in_state() >= self.seconds
    }
}

/// Waits a random duration per visit, then fires once.
///
/// The duration is drawn on the first evaluation, kept in memory until it
/// elapses, and cleared when the decision fires so the next visit draws
/// again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaitForRandom {
    min: f32,
    max: f32,
}

impl WaitForRandom {
    /// Shortest allowed wait
    pub const MIN_WAIT: f32 = 0.05;

    /// Create a wait in `[min, max]`.
    ///
    /// Bounds are raised to [`Self::MIN_WAIT`] and swapped if inverted.
    #[must_use]
    pub fn new(min: f32, max: f32) -> Self {
        let min = min.max(Self::MIN_WAIT);
        let max = max.max(Self::MIN_WAIT);
        if min > max {
            Self { min: max, max: min }
        } else {
            Self { min, max }
        }
    }

    /// Lower bound after normalization
    #[must_use]
    pub fn min(&self) -> f32 {
        self.min
    }

    /// Upper bound after normalization
    #[must_use]
    pub fn max(&self) -> f32 {
        self.max
    }
}

impl DecisionLogic for WaitForRandom {
    fn decide(&self, ctx: &mut StateContext<'_>) -> bool {
        let wait = match ctx.controller.get_data::<Option<f32>>(RANDOM_WAIT_KEY) {
            Some(wait) if wait != 0.0 => wait,
            _ => {
                let wait = ctx.rng.gen_range(self.min..=self.max);
                ctx.controller.set_data(RANDOM_WAIT_KEY, Some(wait));
                wait
            }
        };

        if ctx.controller.time_in_state() >= wait {
            ctx.controller.remove_data(RANDOM_WAIT_KEY);
            true
        } else {
            false
        }
    }
}

/// True once the wander counter reaches `threshold`; resets it on firing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WanderingCounter {
    /// Completions required
    pub threshold: i32,
}

impl WanderingCounter {
    #[must_use]
    pub fn new(threshold: i32) -> Self {
        Self { threshold }
    }
}

impl Default for WanderingCounter {
    fn default() -> Self {
        Self::new(3)
    }
}

impl DecisionLogic for WanderingCounter {
    fn decide(&self, ctx: &mut StateContext<'_>) -> bool {
        let completed: i32 = ctx.controller.get_data(WANDER_COUNT_KEY);
        if completed >= self.threshold {
            ctx.controller.set_data(WANDER_COUNT_KEY, 0_i32);
            true
        } else {
            false
        }
    }
}
