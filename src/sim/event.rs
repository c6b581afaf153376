//! External events delivered to appliance models.

use std::fmt;

use super::clock::SimTime;

/// Commands an appliance can receive from its user or from a test scenario.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ApplianceEvent {
    SwitchOn,
    SwitchOff,
    /// Select the low power level.
    SetLow,
    /// Select the high power level.
    SetHigh,
    /// Select the reduced-power eco mode.
    SetEco,
    /// Leave eco mode.
    SetNormal,
    /// Start heating.
    Heat,
    /// Stop heating while staying on.
    DoNotHeat,
    /// Directly set the heating power, in watts.
    SetPower { watts: f64 },
}

impl fmt::Display for ApplianceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplianceEvent::SwitchOn => f.write_str("SwitchOn"),
            ApplianceEvent::SwitchOff => f.write_str("SwitchOff"),
            ApplianceEvent::SetLow => f.write_str("SetLow"),
            ApplianceEvent::SetHigh => f.write_str("SetHigh"),
            ApplianceEvent::SetEco => f.write_str("SetEco"),
            ApplianceEvent::SetNormal => f.write_str("SetNormal"),
            ApplianceEvent::Heat => f.write_str("Heat"),
            ApplianceEvent::DoNotHeat => f.write_str("DoNotHeat"),
            ApplianceEvent::SetPower { watts } => write!(f, "SetPower({watts:.1} W)"),
        }
    }
}

/// An event stamped with its simulated time of occurrence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedEvent {
    pub at: SimTime,
    pub event: ApplianceEvent,
}

impl TimedEvent {
    pub fn new(at: SimTime, event: ApplianceEvent) -> Self {
        Self { at, event }
    }
}
