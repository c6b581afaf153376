//! Discrete-state bookkeeping shared by every equipment model.

use std::fmt::Debug;

use tracing::debug;

use crate::error::{SimError, SimResult};

use super::clock::{SimDuration, SimTime};
use super::event::{ApplianceEvent, TimedEvent};
use super::types::{ModelId, RunConfig};

/// Identity, discrete state, mode, recompute flag and local clock of a model.
///
/// Electricity and temperature models embed one of these and add their own
/// continuous variables on top.
#[derive(Debug, Clone)]
pub struct EquipmentCore<S, M> {
    id: ModelId,
    initial: (S, M),
    state: S,
    mode: M,
    recompute_pending: bool,
    last_event: SimTime,
    run: RunConfig,
}

impl<S, M> EquipmentCore<S, M>
where
    S: Copy + PartialEq + Debug,
    M: Copy + PartialEq + Debug,
{
    pub fn new(id: ModelId, initial: (S, M), run: RunConfig) -> Self {
        Self {
            id,
            initial,
            state: initial.0,
            mode: initial.1,
            recompute_pending: false,
            last_event: SimTime::ZERO,
            run,
        }
    }

    pub fn id(&self) -> &ModelId {
        &self.id
    }

    pub fn state(&self) -> S {
        self.state
    }

    pub fn mode(&self) -> M {
        self.mode
    }

    pub fn run(&self) -> &RunConfig {
        &self.run
    }

    pub fn is_recompute_pending(&self) -> bool {
        self.recompute_pending
    }

    pub fn last_event(&self) -> SimTime {
        self.last_event
    }

    /// Back to the initial discrete configuration at `start`.
    pub fn reset(&mut self, start: SimTime) {
        (self.state, self.mode) = self.initial;
        self.recompute_pending = false;
        self.last_event = start;
    }

    /// Moves the local clock forward by `elapsed` and returns the new time.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NegativeElapsed`] if `elapsed` is negative.
    pub fn advance(&mut self, elapsed: SimDuration) -> SimResult<SimTime> {
        if elapsed.is_negative() || elapsed.is_infinite() {
            return Err(SimError::NegativeElapsed {
                model: self.id.clone(),
                elapsed,
            });
        }
        self.last_event += elapsed;
        Ok(self.last_event)
    }

    /// The single event of an external transition.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::EventCount`] unless exactly one event was delivered.
    pub fn single_event<'a>(&self, events: &'a [TimedEvent]) -> SimResult<&'a TimedEvent> {
        match events {
            [event] => Ok(event),
            _ => Err(SimError::EventCount {
                model: self.id.clone(),
                count: events.len(),
            }),
        }
    }

    /// Applies a discrete transition; marks a recompute when anything changed.
    pub fn apply(&mut self, state: S, mode: M) -> bool {
        let changed = state != self.state || mode != self.mode;
        if changed {
            if self.run.verbose {
                debug!(
                    model = %self.id,
                    from = ?(self.state, self.mode),
                    to = ?(state, mode),
                    "discrete transition"
                );
            }
            self.state = state;
            self.mode = mode;
            self.recompute_pending = true;
        }
        changed
    }

    pub fn mark_recompute(&mut self) {
        self.recompute_pending = true;
    }

    pub fn clear_recompute(&mut self) {
        self.recompute_pending = false;
    }

    /// Zero when a recompute is pending, the integration step while `integrating`,
    /// otherwise infinite.
    pub fn time_advance(&self, integrating: bool) -> SimDuration {
        if self.recompute_pending {
            SimDuration::ZERO
        } else if integrating {
            self.run.integration_step
        } else {
            SimDuration::INFINITE
        }
    }

    pub fn unexpected(&self, event: &ApplianceEvent) -> SimError {
        SimError::UnexpectedEvent {
            model: self.id.clone(),
            event: event.to_string(),
        }
    }
}
