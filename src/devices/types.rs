//! Capability traits that plug an appliance's transition tables into the generic
//! electricity and temperature models.

use std::fmt::Debug;

use crate::sim::event::ApplianceEvent;
use crate::sim::temperature::ThermalConstants;

/// Result of applying an event to an electrical transition table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition<S, M> {
    pub state: S,
    pub mode: M,
    /// The event carried a value to write immediately (e.g. a power setpoint).
    pub direct_value: bool,
}

impl<S, M> Transition<S, M> {
    pub fn to(state: S, mode: M) -> Self {
        Self {
            state,
            mode,
            direct_value: false,
        }
    }

    pub fn direct(state: S, mode: M) -> Self {
        Self {
            state,
            mode,
            direct_value: true,
        }
    }
}

/// Electrical behaviour of an appliance: discrete transitions and the consumption row
/// of every (state, mode) pair.
///
/// `power_w` must be total over `State x Mode`, so an undefined combination cannot be
/// expressed.
pub trait ElectricalProfile {
    type State: Copy + PartialEq + Debug;
    type Mode: Copy + PartialEq + Debug;

    /// Short type name, e.g. `"HairDryer"`.
    fn kind(&self) -> &'static str;

    fn initial(&self) -> (Self::State, Self::Mode);

    /// Applies `event`; `None` when the event is not part of this table.
    fn transition(
        &mut self,
        state: Self::State,
        mode: Self::Mode,
        event: &ApplianceEvent,
    ) -> Option<Transition<Self::State, Self::Mode>>;

    /// Electrical power drawn in `(state, mode)`, in watts.
    fn power_w(&self, state: Self::State, mode: Self::Mode) -> f64;

    /// Supply tension in volts.
    fn tension_v(&self) -> f64;
}

/// Thermal behaviour of an appliance.
pub trait ThermalProfile {
    type State: Copy + PartialEq + Debug;

    fn kind(&self) -> &'static str;

    fn initial(&self) -> Self::State;

    /// Applies `event`; `None` when the event is not part of this table.
    fn transition(&self, state: Self::State, event: &ApplianceEvent) -> Option<Self::State>;

    /// Whether imported power heats the body in `state`.
    fn is_heating(&self, state: Self::State) -> bool;

    /// Whether the temperature is integrated in `state`; otherwise it is held.
    fn integrates(&self, state: Self::State) -> bool;

    fn constants(&self) -> &ThermalConstants;
}
