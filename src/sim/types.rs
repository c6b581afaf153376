//! Core simulation types: model identity, per-run configuration, fixpoint progress.

use std::fmt;
use std::ops::{Add, AddAssign};

use super::clock::SimDuration;

/// Unique identity of a hybrid model (or of a scenario participant).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identity of an aspect model of an appliance, e.g. `heater.temperature`.
    pub fn aspect(&self, aspect: &str) -> ModelId {
        ModelId(format!("{}.{aspect}", self.0))
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Per-run configuration handed to every model at construction.
///
/// Replaces process-wide verbosity switches: two runs in the same process can
/// use different settings.
///
/// # Examples
///
/// ```
/// use appliance_sim::sim::clock::SimDuration;
/// use appliance_sim::sim::types::RunConfig;
///
/// let cfg = RunConfig::default();
/// assert_eq!(cfg.integration_step, SimDuration::from_minutes(1.0));
/// assert!(!cfg.verbose);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunConfig {
    /// Fixed step between two integrations of a continuous quantity.
    pub integration_step: SimDuration,
    /// Emit one tracing event per transition.
    pub verbose: bool,
}

impl RunConfig {
    /// Creates a run configuration.
    ///
    /// # Panics
    ///
    /// Panics if `integration_step` is not strictly positive and finite.
    pub fn new(integration_step: SimDuration, verbose: bool) -> Self {
        assert!(
            integration_step.as_secs() > 0.0 && !integration_step.is_infinite(),
            "integration_step must be > 0 and finite"
        );
        Self {
            integration_step,
            verbose,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new(SimDuration::from_minutes(1.0), false)
    }
}

/// Outcome of one fixpoint initialisation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixpointProgress {
    /// Variables set during this pass.
    pub initialised: usize,
    /// Variables still waiting on a dependency.
    pub waiting: usize,
}

impl FixpointProgress {
    pub const DONE: FixpointProgress = FixpointProgress {
        initialised: 0,
        waiting: 0,
    };

    pub fn new(initialised: usize, waiting: usize) -> Self {
        Self {
            initialised,
            waiting,
        }
    }
}

impl Add for FixpointProgress {
    type Output = FixpointProgress;

    fn add(self, rhs: FixpointProgress) -> FixpointProgress {
        FixpointProgress {
            initialised: self.initialised + rhs.initialised,
            waiting: self.waiting + rhs.waiting,
        }
    }
}

impl AddAssign for FixpointProgress {
    fn add_assign(&mut self, rhs: FixpointProgress) {
        *self = *self + rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_ids_are_dotted() {
        let heater = ModelId::new("heater");
        assert_eq!(heater.aspect("temperature").as_str(), "heater.temperature");
    }

    #[test]
    #[should_panic]
    fn zero_integration_step_is_rejected() {
        RunConfig::new(SimDuration::ZERO, false);
    }

    #[test]
    fn progress_sums_across_models() {
        let mut total = FixpointProgress::DONE;
        total += FixpointProgress::new(2, 0);
        total += FixpointProgress::new(0, 1);
        assert_eq!(total, FixpointProgress::new(2, 1));
    }
}
