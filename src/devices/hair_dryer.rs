use chrono::{DateTime, TimeDelta, Utc};

use crate::config::HairDryerConfig;
use crate::devices::types::{ElectricalProfile, Transition};
use crate::error::SimResult;
use crate::sim::electricity::ElectricityModel;
use crate::sim::engine::Engine;
use crate::sim::event::ApplianceEvent;
use crate::sim::scenario::{ScenarioStep, ScenarioTrace};
use crate::sim::types::ModelId;

/// Whether the dryer is plugged in and switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DryerState {
    Off,
    On,
}

/// Fan level. `Idle` is the level right after switching on, before any level is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DryerMode {
    Idle,
    Low,
    High,
}

/// A two-level hair dryer with no thermal aspect.
///
/// Switching on draws nothing until a level is selected; selecting a level while off
/// is ignored.
#[derive(Debug, Clone)]
pub struct HairDryer {
    /// Power drawn at the low level in watts.
    pub low_power_w: f64,
    /// Power drawn at the high level in watts.
    pub high_power_w: f64,
    /// Supply tension in volts.
    pub tension_v: f64,
}

impl HairDryer {
    /// Creates a hair dryer.
    ///
    /// # Panics
    ///
    /// Panics if the tension is not positive or the levels are not ordered.
    pub fn new(low_power_w: f64, high_power_w: f64, tension_v: f64) -> Self {
        assert!(tension_v > 0.0);
        assert!(low_power_w >= 0.0 && high_power_w >= low_power_w);
        Self {
            low_power_w,
            high_power_w,
            tension_v,
        }
    }

    pub fn from_config(config: &HairDryerConfig) -> Self {
        Self::new(config.low_power_w, config.high_power_w, config.tension_v)
    }
}

impl ElectricalProfile for HairDryer {
    type State = DryerState;
    type Mode = DryerMode;

    fn kind(&self) -> &'static str {
        "HairDryer"
    }

    fn initial(&self) -> (DryerState, DryerMode) {
        (DryerState::Off, DryerMode::Idle)
    }

    fn transition(
        &mut self,
        state: DryerState,
        mode: DryerMode,
        event: &ApplianceEvent,
    ) -> Option<Transition<DryerState, DryerMode>> {
        use DryerState::*;
        let next = match (event, state) {
            (ApplianceEvent::SwitchOn, Off) => Transition::to(On, DryerMode::Idle),
            (ApplianceEvent::SwitchOff, _) => Transition::to(Off, DryerMode::Idle),
            (ApplianceEvent::SetLow, On) => Transition::to(On, DryerMode::Low),
            (ApplianceEvent::SetHigh, On) => Transition::to(On, DryerMode::High),
            (ApplianceEvent::SwitchOn | ApplianceEvent::SetLow | ApplianceEvent::SetHigh, _) => {
                Transition::to(state, mode)
            }
            _ => return None,
        };
        Some(next)
    }

    fn power_w(&self, state: DryerState, mode: DryerMode) -> f64 {
        match (state, mode) {
            (DryerState::Off, _) | (DryerState::On, DryerMode::Idle) => 0.0,
            (DryerState::On, DryerMode::Low) => self.low_power_w,
            (DryerState::On, DryerMode::High) => self.high_power_w,
        }
    }

    fn tension_v(&self) -> f64 {
        self.tension_v
    }
}

/// Registers `<id>.electricity` in `engine` and routes the `id` scenario to it.
///
/// # Errors
///
/// Fails if the identity is taken or `id` has no scenario steps.
pub fn compose(engine: &mut Engine, id: &ModelId, config: &HairDryerConfig) -> SimResult<()> {
    let run = *engine.run_config();
    let electricity = id.aspect("electricity");
    let model = ElectricityModel::new(
        electricity.clone(),
        HairDryer::from_config(config),
        run,
        engine.variables_mut(),
    )?;
    engine.add_model(Box::new(model))?;
    engine.route(id, &electricity)
}

/// A morning routine: low for a minute, high for five, low again, then off.
pub fn demo_steps(id: &ModelId, start: DateTime<Utc>) -> Vec<ScenarioStep<ScenarioTrace>> {
    let at = |minutes| start + TimeDelta::minutes(minutes);
    vec![
        ScenarioStep::traced(id.clone(), at(2), vec![ApplianceEvent::SwitchOn]),
        ScenarioStep::traced(id.clone(), at(2), vec![ApplianceEvent::SetLow]),
        ScenarioStep::traced(id.clone(), at(3), vec![ApplianceEvent::SetHigh]),
        ScenarioStep::traced(id.clone(), at(8), vec![ApplianceEvent::SetLow]),
        ScenarioStep::traced(id.clone(), at(10), vec![ApplianceEvent::SwitchOff]),
    ]
}
