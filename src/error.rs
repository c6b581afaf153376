//! Error types for the appliance simulation protocol.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::ConfigError;
use crate::sim::clock::{SimDuration, SimTime};
use crate::sim::types::ModelId;
use crate::sim::variable::VariableRef;

/// Result type for simulation protocol calls.
pub type SimResult<T> = Result<T, SimError>;

/// Every failure a protocol call can surface.
///
/// Precondition violations indicate a wiring or configuration bug; none of them is
/// retried by the engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// A transition was handed zero or several events.
    #[error("{model}: expected exactly one event, got {count}")]
    EventCount { model: ModelId, count: usize },

    /// The event is not part of this model's transition table.
    #[error("{model}: event {event} is not accepted")]
    UnexpectedEvent { model: ModelId, event: String },

    /// A call arrived with an elapsed time that would move the model backwards.
    #[error("{model}: negative elapsed time {elapsed}")]
    NegativeElapsed { model: ModelId, elapsed: SimDuration },

    /// A variable was read before the fixpoint phase set it.
    #[error("variable {var} read before initialisation")]
    Uninitialised { var: VariableRef },

    /// No model exports a variable under this name.
    #[error("unknown variable {var}")]
    UnknownVariable { var: VariableRef },

    /// Two exports were declared under the same owner and name.
    #[error("variable {var} is already exported")]
    DuplicateExport { var: VariableRef },

    /// Two models were registered with the same identity.
    #[error("model {model} is already registered")]
    DuplicateModel { model: ModelId },

    /// A pass initialised nothing while variables were still waiting.
    #[error("fixpoint initialisation stalled, unresolved: {}", join_refs(.unresolved))]
    FixpointStalled { unresolved: Vec<VariableRef> },

    /// Scenario steps are not non-decreasing in wall-clock instant.
    #[error("scenario step {index} at {instant} precedes the previous step at {previous}")]
    UnorderedScenario {
        index: usize,
        instant: DateTime<Utc>,
        previous: DateTime<Utc>,
    },

    /// The scenario anchor ends before it starts.
    #[error("scenario ends at {end}, before its start at {start}")]
    InvalidAnchor {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// The model owns no step in the scenario.
    #[error("model {model} has no steps in the scenario")]
    NotInScenario { model: ModelId },

    /// Output or mutation requested after the model's last step.
    #[error("scenario for {model} is terminated")]
    ScenarioTerminated { model: ModelId },

    /// A step produced an event stamped with the wrong time.
    #[error("{model}: output event at {event_time} does not match next event time {expected}")]
    EventTimeMismatch {
        model: ModelId,
        event_time: SimTime,
        expected: SimTime,
    },

    /// The same scenario model was routed to the same target twice.
    #[error("scenario model {participant} is already routed to {target}")]
    DuplicateRoute { participant: ModelId, target: ModelId },

    /// `Engine::run` was called on an engine that already ran.
    #[error("engine has already run; build a new one for another run")]
    AlreadyRun,

    /// Scenario output for a model that is routed to no hybrid model.
    #[error("no model is routed for scenario model {model}")]
    Unrouted { model: ModelId },

    /// Invalid configuration values.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn join_refs(refs: &[VariableRef]) -> String {
    refs.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
