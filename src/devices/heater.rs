use chrono::{DateTime, TimeDelta, Utc};

use crate::config::HeaterConfig;
use crate::devices::types::{ElectricalProfile, ThermalProfile, Transition};
use crate::error::SimResult;
use crate::sim::electricity::{ElectricityModel, POWER};
use crate::sim::engine::Engine;
use crate::sim::event::ApplianceEvent;
use crate::sim::scenario::{ScenarioStep, ScenarioTrace};
use crate::sim::temperature::{TemperatureModel, ThermalConstants};
use crate::sim::types::ModelId;

/// Discrete state of a room heater, shared by its electrical and thermal aspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaterState {
    Off,
    /// Switched on but not heating.
    On,
    Heating,
}

impl HeaterState {
    /// Common transition table; `SetPower` never changes the state.
    fn next(self, event: &ApplianceEvent) -> Option<HeaterState> {
        use HeaterState::*;
        let next = match (event, self) {
            (ApplianceEvent::SwitchOn, Off) => On,
            (ApplianceEvent::SwitchOff, _) => Off,
            (ApplianceEvent::Heat, On) => Heating,
            (ApplianceEvent::DoNotHeat, Heating) => On,
            (
                ApplianceEvent::SwitchOn
                | ApplianceEvent::Heat
                | ApplianceEvent::DoNotHeat
                | ApplianceEvent::SetPower { .. },
                state,
            ) => state,
            _ => return None,
        };
        Some(next)
    }
}

/// Electrical aspect of a room heater with an adjustable power setpoint.
#[derive(Debug, Clone)]
pub struct Heater {
    /// Upper bound of the power setpoint in watts.
    pub max_power_w: f64,
    /// Power drawn while heating in watts, always in `[0, max_power_w]`.
    setpoint_w: f64,
    /// Supply tension in volts.
    pub tension_v: f64,
}

impl Heater {
    /// Creates a heater.
    ///
    /// # Arguments
    ///
    /// * `max_power_w` - Maximum heating power in W (must be > 0)
    /// * `initial_power_w` - Setpoint before any `SetPower` event, clamped to the maximum
    /// * `tension_v` - Supply tension in V (must be > 0)
    ///
    /// # Panics
    ///
    /// Panics if the maximum power or the tension is not positive.
    pub fn new(max_power_w: f64, initial_power_w: f64, tension_v: f64) -> Self {
        assert!(max_power_w > 0.0);
        assert!(tension_v > 0.0);
        Self {
            max_power_w,
            setpoint_w: initial_power_w.clamp(0.0, max_power_w),
            tension_v,
        }
    }

    pub fn from_config(config: &HeaterConfig) -> Self {
        Self::new(config.max_power_w, config.initial_power_w, config.tension_v)
    }

    pub fn setpoint_w(&self) -> f64 {
        self.setpoint_w
    }

    /// Clamps `watts` into `[0, max_power_w]` and stores it as the new setpoint.
    pub fn set_power(&mut self, watts: f64) -> f64 {
        self.setpoint_w = watts.clamp(0.0, self.max_power_w);
        self.setpoint_w
    }
}

impl ElectricalProfile for Heater {
    type State = HeaterState;
    type Mode = ();

    fn kind(&self) -> &'static str {
        "Heater"
    }

    fn initial(&self) -> (HeaterState, ()) {
        (HeaterState::Off, ())
    }

    fn transition(
        &mut self,
        state: HeaterState,
        _mode: (),
        event: &ApplianceEvent,
    ) -> Option<Transition<HeaterState, ()>> {
        if let ApplianceEvent::SetPower { watts } = *event {
            self.set_power(watts);
            return Some(Transition::direct(state, ()));
        }
        state.next(event).map(|next| Transition::to(next, ()))
    }

    fn power_w(&self, state: HeaterState, _mode: ()) -> f64 {
        match state {
            HeaterState::Heating => self.setpoint_w,
            HeaterState::Off | HeaterState::On => 0.0,
        }
    }

    fn tension_v(&self) -> f64 {
        self.tension_v
    }
}

/// Thermal aspect of a room heater: the room air warms while heating and always
/// loses heat to the outside.
#[derive(Debug, Clone)]
pub struct HeatedRoom {
    constants: ThermalConstants,
}

impl HeatedRoom {
    pub fn new(constants: ThermalConstants) -> Self {
        assert!(constants.mass_kg > 0.0 && constants.specific_heat > 0.0);
        assert!(constants.insulation_secs > 0.0);
        Self { constants }
    }
}

impl ThermalProfile for HeatedRoom {
    type State = HeaterState;

    fn kind(&self) -> &'static str {
        "HeatedRoom"
    }

    fn initial(&self) -> HeaterState {
        HeaterState::Off
    }

    fn transition(&self, state: HeaterState, event: &ApplianceEvent) -> Option<HeaterState> {
        state.next(event)
    }

    fn is_heating(&self, state: HeaterState) -> bool {
        state == HeaterState::Heating
    }

    fn integrates(&self, _state: HeaterState) -> bool {
        true
    }

    fn constants(&self) -> &ThermalConstants {
        &self.constants
    }
}

/// Registers `<id>.electricity` and `<id>.temperature` in `engine`, binds the room's
/// heating power to the heater's export and routes the `id` scenario to both.
///
/// # Errors
///
/// Fails if an identity is taken or `id` has no scenario steps.
pub fn compose(engine: &mut Engine, id: &ModelId, config: &HeaterConfig) -> SimResult<()> {
    let run = *engine.run_config();
    let electricity = id.aspect("electricity");
    let temperature = id.aspect("temperature");

    let heater = ElectricityModel::new(
        electricity.clone(),
        Heater::from_config(config),
        run,
        engine.variables_mut(),
    )?;
    let mut room = TemperatureModel::new(
        temperature.clone(),
        HeatedRoom::new(config.thermal.constants()),
        run,
        engine.variables_mut(),
    )?;
    if !config.unbound_power {
        room.bind_power(engine.variables().bind(&electricity, POWER));
    }

    engine.add_model(Box::new(heater))?;
    engine.add_model(Box::new(room))?;
    engine.route(id, &electricity)?;
    engine.route(id, &temperature)
}

/// Heats at full power for half an hour, then at two thirds, then stops.
pub fn demo_steps(
    id: &ModelId,
    start: DateTime<Utc>,
    config: &HeaterConfig,
) -> Vec<ScenarioStep<ScenarioTrace>> {
    let at = |minutes| start + TimeDelta::minutes(minutes);
    let reduced = ApplianceEvent::SetPower {
        watts: config.max_power_w * 2.0 / 3.0,
    };
    vec![
        ScenarioStep::traced(id.clone(), at(0), vec![ApplianceEvent::SwitchOn]),
        ScenarioStep::traced(id.clone(), at(1), vec![ApplianceEvent::Heat]),
        ScenarioStep::traced(id.clone(), at(31), vec![reduced]),
        ScenarioStep::traced(id.clone(), at(61), vec![ApplianceEvent::DoNotHeat]),
        ScenarioStep::traced(id.clone(), at(90), vec![ApplianceEvent::SwitchOff]),
    ]
}
