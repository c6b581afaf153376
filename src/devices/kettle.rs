//! Electric kettle: an electrical aspect with normal and eco heating powers, and a
//! thermal aspect whose water temperature never exceeds the boiling point.

use chrono::{DateTime, TimeDelta, Utc};

use crate::config::KettleConfig;
use crate::devices::types::{ElectricalProfile, ThermalProfile, Transition};
use crate::error::SimResult;
use crate::sim::electricity::{ElectricityModel, POWER};
use crate::sim::engine::Engine;
use crate::sim::event::ApplianceEvent;
use crate::sim::scenario::{ScenarioStep, ScenarioTrace};
use crate::sim::temperature::{TemperatureModel, ThermalConstants};
use crate::sim::types::ModelId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KettleState {
    Off,
    On,
    Heating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KettleMode {
    Normal,
    Eco,
}

impl KettleState {
    /// State part of the transition table; mode events leave the state unchanged.
    fn next(self, event: &ApplianceEvent) -> Option<KettleState> {
        use KettleState::*;
        let next = match (event, self) {
            (ApplianceEvent::SwitchOn, Off) => On,
            (ApplianceEvent::SwitchOff, _) => Off,
            (ApplianceEvent::Heat, On) => Heating,
            (ApplianceEvent::DoNotHeat, Heating) => On,
            (
                ApplianceEvent::SwitchOn
                | ApplianceEvent::Heat
                | ApplianceEvent::DoNotHeat
                | ApplianceEvent::SetEco
                | ApplianceEvent::SetNormal,
                state,
            ) => state,
            _ => return None,
        };
        Some(next)
    }
}

#[derive(Debug, Clone)]
pub struct Kettle {
    /// Heating power in normal mode, in watts.
    pub normal_power_w: f64,
    /// Heating power in eco mode, in watts.
    pub eco_power_w: f64,
    pub tension_v: f64,
}

impl Kettle {
    /// # Panics
    ///
    /// Panics if the tension is not positive or eco draws more than normal.
    pub fn new(normal_power_w: f64, eco_power_w: f64, tension_v: f64) -> Self {
        assert!(tension_v > 0.0);
        assert!(eco_power_w >= 0.0 && normal_power_w >= eco_power_w);
        Self {
            normal_power_w,
            eco_power_w,
            tension_v,
        }
    }

    pub fn from_config(config: &KettleConfig) -> Self {
        Self::new(config.normal_power_w, config.eco_power_w, config.tension_v)
    }
}

impl ElectricalProfile for Kettle {
    type State = KettleState;
    type Mode = KettleMode;

    fn kind(&self) -> &'static str {
        "Kettle"
    }

    fn initial(&self) -> (KettleState, KettleMode) {
        (KettleState::Off, KettleMode::Normal)
    }

    fn transition(
        &mut self,
        state: KettleState,
        mode: KettleMode,
        event: &ApplianceEvent,
    ) -> Option<Transition<KettleState, KettleMode>> {
        let mode = match event {
            ApplianceEvent::SetEco => KettleMode::Eco,
            ApplianceEvent::SetNormal => KettleMode::Normal,
            _ => mode,
        };
        state.next(event).map(|next| Transition::to(next, mode))
    }

    fn power_w(&self, state: KettleState, mode: KettleMode) -> f64 {
        match (state, mode) {
            (KettleState::Heating, KettleMode::Normal) => self.normal_power_w,
            (KettleState::Heating, KettleMode::Eco) => self.eco_power_w,
            (KettleState::Off | KettleState::On, _) => 0.0,
        }
    }

    fn tension_v(&self) -> f64 {
        self.tension_v
    }
}

/// Water in the kettle. Temperature is held while the kettle is off.
#[derive(Debug, Clone)]
pub struct KettleWater {
    constants: ThermalConstants,
}

impl KettleWater {
    /// # Panics
    ///
    /// Panics without a ceiling, or if ambient is at or above it.
    pub fn new(constants: ThermalConstants) -> Self {
        assert!(constants.mass_kg > 0.0 && constants.specific_heat > 0.0);
        assert!(constants.insulation_secs > 0.0);
        assert!(constants.ceiling_c.is_some_and(|c| constants.ambient_c < c));
        Self { constants }
    }
}

impl ThermalProfile for KettleWater {
    type State = KettleState;

    fn kind(&self) -> &'static str {
        "KettleWater"
    }

    fn initial(&self) -> KettleState {
        KettleState::Off
    }

    fn transition(&self, state: KettleState, event: &ApplianceEvent) -> Option<KettleState> {
        state.next(event)
    }

    fn is_heating(&self, state: KettleState) -> bool {
        state == KettleState::Heating
    }

    fn integrates(&self, state: KettleState) -> bool {
        state != KettleState::Off
    }

    fn constants(&self) -> &ThermalConstants {
        &self.constants
    }
}

/// Registers `<id>.electricity` and `<id>.temperature` in `engine`, binds the water's
/// heating power to the kettle's export and routes the `id` scenario to both.
///
/// # Errors
///
/// Fails if an identity is taken or `id` has no scenario steps.
pub fn compose(engine: &mut Engine, id: &ModelId, config: &KettleConfig) -> SimResult<()> {
    let run = *engine.run_config();
    let electricity = id.aspect("electricity");
    let temperature = id.aspect("temperature");

    let kettle = ElectricityModel::new(
        electricity.clone(),
        Kettle::from_config(config),
        run,
        engine.variables_mut(),
    )?;
    let mut water = TemperatureModel::new(
        temperature.clone(),
        KettleWater::new(config.thermal.constants()),
        run,
        engine.variables_mut(),
    )?;
    water.bind_power(engine.variables().bind(&electricity, POWER));

    engine.add_model(Box::new(kettle))?;
    engine.add_model(Box::new(water))?;
    engine.route(id, &electricity)?;
    engine.route(id, &temperature)
}

/// Boils once at normal power, then reheats in eco mode.
pub fn demo_steps(id: &ModelId, start: DateTime<Utc>) -> Vec<ScenarioStep<ScenarioTrace>> {
    let at = |minutes| start + TimeDelta::minutes(minutes);
    vec![
        ScenarioStep::traced(id.clone(), at(5), vec![ApplianceEvent::SwitchOn]),
        ScenarioStep::traced(id.clone(), at(5), vec![ApplianceEvent::Heat]),
        ScenarioStep::traced(id.clone(), at(15), vec![ApplianceEvent::SwitchOff]),
        ScenarioStep::traced(id.clone(), at(40), vec![ApplianceEvent::SwitchOn]),
        ScenarioStep::traced(id.clone(), at(40), vec![ApplianceEvent::SetEco]),
        ScenarioStep::traced(id.clone(), at(41), vec![ApplianceEvent::Heat]),
        ScenarioStep::traced(id.clone(), at(50), vec![ApplianceEvent::SwitchOff]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::clock::{SimDuration, SimTime};
    use crate::sim::electricity::INTENSITY;
    use crate::sim::event::TimedEvent;
    use crate::sim::model::HybridModel;
    use crate::sim::temperature::TEMPERATURE;
    use crate::sim::types::RunConfig;
    use crate::sim::variable::VariableStore;

    const STATES: [KettleState; 3] = [KettleState::Off, KettleState::On, KettleState::Heating];
    const MODES: [KettleMode; 2] = [KettleMode::Normal, KettleMode::Eco];

    fn water() -> ThermalConstants {
        ThermalConstants {
            mass_kg: 1.0,
            specific_heat: 4180.0,
            insulation_secs: 3000.0,
            ambient_c: 20.0,
            initial_c: 20.0,
            ceiling_c: Some(100.0),
            fallback_power_w: 2000.0,
        }
    }

    #[test]
    fn consumption_defined_for_every_pair() {
        let k = Kettle::new(2000.0, 1000.0, 220.0);
        for state in STATES {
            for mode in MODES {
                let p = k.power_w(state, mode);
                assert!((0.0..=2000.0).contains(&p), "{state:?}/{mode:?} -> {p}");
            }
        }
        assert_eq!(k.power_w(KettleState::Heating, KettleMode::Eco), 1000.0);
    }

    #[test]
    fn eco_is_remembered_across_switch_off() {
        let mut k = Kettle::new(2000.0, 1000.0, 220.0);
        let t = k
            .transition(KettleState::On, KettleMode::Normal, &ApplianceEvent::SetEco)
            .unwrap();
        assert_eq!(t, Transition::to(KettleState::On, KettleMode::Eco));
        let t = k
            .transition(t.state, t.mode, &ApplianceEvent::SwitchOff)
            .unwrap();
        assert_eq!(t.mode, KettleMode::Eco);
    }

    #[test]
    fn set_power_is_not_in_the_table() {
        let mut k = Kettle::new(2000.0, 1000.0, 220.0);
        let event = ApplianceEvent::SetPower { watts: 10.0 };
        assert!(k.transition(KettleState::On, KettleMode::Normal, &event).is_none());
        assert!(KettleWater::new(water()).transition(KettleState::On, &event).is_none());
    }

    #[test]
    #[should_panic]
    fn water_needs_a_ceiling() {
        KettleWater::new(ThermalConstants {
            ceiling_c: None,
            ..water()
        });
    }

    fn read(vars: &VariableStore, name: &str) -> f64 {
        let import = vars.bind(&ModelId::new("kettle.electricity"), name).unwrap();
        vars.read(import).unwrap()
    }

    #[test]
    fn intensity_matches_table_in_every_reachable_pair() {
        let mut vars = VariableStore::new();
        let mut m = ElectricityModel::new(
            ModelId::new("kettle.electricity"),
            Kettle::new(2000.0, 1000.0, 200.0),
            RunConfig::default(),
            &mut vars,
        )
        .unwrap();
        m.initialise_state(SimTime::ZERO);
        m.fixpoint_initialise(&mut vars).unwrap();

        use KettleMode::{Eco, Normal};
        use KettleState::{Heating, Off, On};
        let walk = [
            (ApplianceEvent::SwitchOn, On, Normal, 0.0),
            (ApplianceEvent::Heat, Heating, Normal, 2000.0),
            (ApplianceEvent::SetEco, Heating, Eco, 1000.0),
            (ApplianceEvent::DoNotHeat, On, Eco, 0.0),
            (ApplianceEvent::Heat, Heating, Eco, 1000.0),
            (ApplianceEvent::SetNormal, Heating, Normal, 2000.0),
            (ApplianceEvent::SwitchOff, Off, Normal, 0.0),
            (ApplianceEvent::SetEco, Off, Eco, 0.0),
        ];
        let minute = SimDuration::from_minutes(1.0);
        for (event, state, mode, watts) in walk {
            let at = m.time_of_last_event() + minute;
            m.external_transition(&[TimedEvent::new(at, event)], minute, &mut vars)
                .unwrap();
            m.internal_transition(SimDuration::ZERO, &mut vars).unwrap();
            assert_eq!((m.state(), m.mode()), (state, mode), "after {event}");
            assert_eq!(m.profile().power_w(state, mode), watts);
            assert_eq!(read(&vars, POWER), watts, "after {event}");
            assert!((read(&vars, INTENSITY) - watts / 200.0).abs() < 1e-12, "after {event}");
        }
        // 1 min at 2000 W, 1 min at 1000 W, 1 min at 1000 W, 1 min at 2000 W.
        assert!((m.consumption_wh() - 6000.0 / 60.0).abs() < 1e-9);
    }

    fn temperature(vars: &VariableStore) -> f64 {
        let import = vars.bind(&ModelId::new("kettle.temperature"), TEMPERATURE).unwrap();
        vars.read(import).unwrap()
    }

    #[test]
    fn water_never_exceeds_boiling_point() {
        let mut vars = VariableStore::new();
        let power = vars.declare(&ModelId::new("kettle.electricity"), POWER, false).unwrap();
        vars.write(&power, 3000.0, None, SimTime::ZERO);

        let mut m = TemperatureModel::new(
            ModelId::new("kettle.temperature"),
            KettleWater::new(water()),
            RunConfig::default(),
            &mut vars,
        )
        .unwrap();
        m.bind_power(Some(power.as_import()));
        m.initialise_state(SimTime::ZERO);
        m.fixpoint_initialise(&mut vars).unwrap();
        assert_eq!(m.time_advance(), SimDuration::INFINITE);

        for event in [ApplianceEvent::SwitchOn, ApplianceEvent::Heat] {
            m.external_transition(&[TimedEvent::new(SimTime::ZERO, event)], SimDuration::ZERO, &mut vars)
                .unwrap();
            m.internal_transition(SimDuration::ZERO, &mut vars).unwrap();
        }
        let step = SimDuration::from_minutes(1.0);
        let mut reached = false;
        for _ in 0..30 {
            m.internal_transition(step, &mut vars).unwrap();
            let t = temperature(&vars);
            assert!(t <= 100.0, "boiling point exceeded: {t}");
            reached |= t == 100.0;
        }
        assert!(reached, "3 kW should boil 1 kg within half an hour");
    }

    #[test]
    fn temperature_held_while_off() {
        let mut vars = VariableStore::new();
        let mut m = TemperatureModel::new(
            ModelId::new("kettle.temperature"),
            KettleWater::new(ThermalConstants {
                initial_c: 80.0,
                ..water()
            }),
            RunConfig::default(),
            &mut vars,
        )
        .unwrap();
        m.initialise_state(SimTime::ZERO);
        m.fixpoint_initialise(&mut vars).unwrap();
        assert!(!m.is_power_bound());

        let on = TimedEvent::new(SimTime::from_secs(600.0), ApplianceEvent::SwitchOn);
        m.external_transition(&[on], SimDuration::from_secs(600.0), &mut vars)
            .unwrap();
        m.internal_transition(SimDuration::ZERO, &mut vars).unwrap();
        assert_eq!(temperature(&vars), 80.0);

        m.end_simulation(SimTime::from_secs(1200.0), &mut vars).unwrap();
        let mean = m.final_report().value;
        assert!(mean <= 80.0 && mean > 79.0, "mean {mean}");
    }
}
