//! The protocol every hybrid equipment model exposes to a simulation kernel.

use crate::error::SimResult;

use super::clock::{SimDuration, SimTime};
use super::event::TimedEvent;
use super::report::Summary;
use super::types::{FixpointProgress, ModelId};
use super::variable::VariableStore;

/// A hybrid discrete-event / continuous-state model.
///
/// Calls are synchronous and, for one model, strictly ordered by simulated time.
/// `elapsed` is always the span since the model's previous transition.
pub trait HybridModel {
    fn id(&self) -> &ModelId;

    /// Puts the discrete state in its initial configuration at `start`.
    fn initialise_state(&mut self, start: SimTime);

    /// One fixpoint pass over the variables this model exports.
    fn fixpoint_initialise(&mut self, vars: &mut VariableStore) -> SimResult<FixpointProgress>;

    /// How long the model can stay idle before its next internal transition.
    fn time_advance(&self) -> SimDuration;

    /// Consumes exactly one externally delivered event.
    fn external_transition(
        &mut self,
        events: &[TimedEvent],
        elapsed: SimDuration,
        vars: &mut VariableStore,
    ) -> SimResult<()>;

    /// Scheduled self-triggered recomputation.
    fn internal_transition(
        &mut self,
        elapsed: SimDuration,
        vars: &mut VariableStore,
    ) -> SimResult<()>;

    /// Flushes accumulation up to `end`.
    fn end_simulation(&mut self, end: SimTime, vars: &mut VariableStore) -> SimResult<()>;

    fn final_report(&self) -> Summary;

    /// Simulated time of the last transition.
    fn time_of_last_event(&self) -> SimTime;

    /// Time at which the next internal transition is due.
    fn time_of_next_event(&self) -> SimTime {
        self.time_of_last_event() + self.time_advance()
    }
}
