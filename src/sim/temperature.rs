//! Integrated temperature model: explicit Euler steps of heating and Newton cooling.

use tracing::{debug, warn};

use crate::devices::types::ThermalProfile;
use crate::error::SimResult;

use super::clock::{SimDuration, SimTime};
use super::core::EquipmentCore;
use super::event::TimedEvent;
use super::model::HybridModel;
use super::report::{MeanAccumulator, Summary, SummaryKind};
use super::types::{FixpointProgress, ModelId, RunConfig};
use super::variable::{Export, Import, VariableStore};

/// Name of the exported temperature variable, in °C.
pub const TEMPERATURE: &str = "temperature";

/// Physical constants of a heated body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalConstants {
    /// Heated mass, in kg.
    pub mass_kg: f64,
    /// Specific heat capacity, in J/(kg·K).
    pub specific_heat: f64,
    /// Time constant of heat loss to ambient, in seconds.
    pub insulation_secs: f64,
    /// Ambient temperature, in °C.
    pub ambient_c: f64,
    /// Temperature at construction, in °C.
    pub initial_c: f64,
    /// Physical ceiling the temperature never exceeds (e.g. boiling point).
    pub ceiling_c: Option<f64>,
    /// Heating power assumed when no power variable is bound, in W.
    pub fallback_power_w: f64,
}

impl ThermalConstants {
    /// Rate of change in °C/s at `temperature` when `heating_power_w` heats the body.
    ///
    /// Heating stops contributing once the ceiling is reached; Newton cooling towards
    /// ambient always applies.
    pub fn derivative(&self, temperature: f64, heating_power_w: f64) -> f64 {
        let below_ceiling = self.ceiling_c.is_none_or(|c| temperature < c);
        let heating = if below_ceiling {
            heating_power_w / (self.mass_kg * self.specific_heat)
        } else {
            0.0
        };
        let cooling = (self.ambient_c - temperature) / self.insulation_secs;
        heating + cooling
    }

    /// One explicit Euler step, clamped at the ceiling.
    pub fn euler_step(&self, temperature: f64, derivative: f64, elapsed: SimDuration) -> f64 {
        let next = temperature + derivative * elapsed.as_secs();
        match self.ceiling_c {
            Some(ceiling) => next.min(ceiling),
            None => next,
        }
    }
}

/// Temperature aspect of an appliance.
///
/// Imports the heating power exported by an electricity model. The import may be
/// left unbound, in which case `fallback_power_w` is used and a warning is logged
/// once during fixpoint initialisation.
pub struct TemperatureModel<P: ThermalProfile> {
    core: EquipmentCore<P::State, ()>,
    profile: P,
    temperature: Export,
    power: Option<Import>,
    /// Whether the span since the last integration ran in an integrating state.
    span_integrates: bool,
    fallback_logged: bool,
    mean: MeanAccumulator,
}

impl<P: ThermalProfile> TemperatureModel<P> {
    /// Creates the model and declares its export in `vars`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SimError::DuplicateExport`] if `id` already exports it.
    pub fn new(id: ModelId, profile: P, run: RunConfig, vars: &mut VariableStore) -> SimResult<Self> {
        let temperature = vars.declare(&id, TEMPERATURE, true)?;
        let initial = profile.initial();
        let span_integrates = profile.integrates(initial);
        Ok(Self {
            core: EquipmentCore::new(id, (initial, ()), run),
            profile,
            temperature,
            power: None,
            span_integrates,
            fallback_logged: false,
            mean: MeanAccumulator::default(),
        })
    }

    /// Binds the heating power import; must be called before fixpoint initialisation.
    pub fn bind_power(&mut self, power: Option<Import>) {
        self.power = power;
    }

    pub fn is_power_bound(&self) -> bool {
        self.power.is_some()
    }

    pub fn state(&self) -> P::State {
        self.core.state()
    }

    pub fn is_recompute_pending(&self) -> bool {
        self.core.is_recompute_pending()
    }

    /// Power currently heating the body, in W.
    fn heating_power_w(&self, vars: &VariableStore) -> SimResult<f64> {
        if !self.profile.is_heating(self.core.state()) {
            return Ok(0.0);
        }
        match self.power {
            Some(import) => vars.read(import),
            None => Ok(self.profile.constants().fallback_power_w),
        }
    }

    fn current(&self, vars: &VariableStore) -> SimResult<(f64, f64, SimTime)> {
        let var = vars.variable(self.temperature.as_import());
        Ok((var.value()?, var.derivative().unwrap_or(0.0), var.last_update()))
    }
}

impl<P: ThermalProfile> HybridModel for TemperatureModel<P> {
    fn id(&self) -> &ModelId {
        self.core.id()
    }

    fn initialise_state(&mut self, start: SimTime) {
        self.core.reset(start);
        self.span_integrates = self.profile.integrates(self.core.state());
        self.mean = MeanAccumulator::default();
    }

    fn fixpoint_initialise(&mut self, vars: &mut VariableStore) -> SimResult<FixpointProgress> {
        if vars.is_initialised(self.temperature.as_import()) {
            return Ok(FixpointProgress::DONE);
        }
        match self.power {
            Some(import) if !vars.is_initialised(import) => {
                return Ok(FixpointProgress::new(0, 1));
            }
            None if !self.fallback_logged => {
                warn!(
                    model = %self.core.id(),
                    fallback_power_w = self.profile.constants().fallback_power_w,
                    "no heating power bound, using fallback"
                );
                self.fallback_logged = true;
            }
            _ => {}
        }
        let constants = *self.profile.constants();
        let power = self.heating_power_w(vars)?;
        let derivative = constants.derivative(constants.initial_c, power);
        vars.write(
            &self.temperature,
            constants.initial_c,
            Some(derivative),
            self.core.last_event(),
        );
        Ok(FixpointProgress::new(1, 0))
    }

    fn time_advance(&self) -> SimDuration {
        self.core
            .time_advance(self.profile.integrates(self.core.state()))
    }

    fn external_transition(
        &mut self,
        events: &[TimedEvent],
        elapsed: SimDuration,
        _vars: &mut VariableStore,
    ) -> SimResult<()> {
        let event = self.core.single_event(events)?.event;
        let now = self.core.advance(elapsed)?;
        let next = self
            .profile
            .transition(self.core.state(), &event)
            .ok_or_else(|| self.core.unexpected(&event))?;
        self.core.apply(next, ());
        if self.core.run().verbose {
            debug!(model = %self.core.id(), %event, at = %now, "external transition");
        }
        Ok(())
    }

    fn internal_transition(
        &mut self,
        elapsed: SimDuration,
        vars: &mut VariableStore,
    ) -> SimResult<()> {
        let now = self.core.advance(elapsed)?;
        let constants = *self.profile.constants();
        let (old, derivative, last_update) = self.current(vars)?;
        let span = now - last_update;

        let new = if self.span_integrates {
            let new = constants.euler_step(old, derivative, span);
            self.mean.accumulate_trapezoid(old, new, span);
            new
        } else {
            self.mean.accumulate_constant(old, span);
            old
        };

        let power = self.heating_power_w(vars)?;
        let next_derivative = constants.derivative(new, power);
        vars.write(&self.temperature, new, Some(next_derivative), now);
        self.span_integrates = self.profile.integrates(self.core.state());
        self.core.clear_recompute();

        if self.core.run().verbose {
            debug!(
                model = %self.core.id(),
                kind = self.profile.kind(),
                temperature_c = new,
                derivative = next_derivative,
                at = %now,
                "temperature integrated"
            );
        }
        Ok(())
    }

    fn end_simulation(&mut self, end: SimTime, vars: &mut VariableStore) -> SimResult<()> {
        let elapsed = end - self.core.last_event();
        self.core.advance(elapsed)?;
        let (last, _, last_update) = self.current(vars)?;
        self.mean.accumulate_constant(last, end - last_update);
        Ok(())
    }

    fn final_report(&self) -> Summary {
        Summary {
            model: self.core.id().clone(),
            kind: SummaryKind::MeanTemperature,
            value: self
                .mean
                .mean()
                .unwrap_or(self.profile.constants().initial_c),
        }
    }

    fn time_of_last_event(&self) -> SimTime {
        self.core.last_event()
    }
}
