//! Table-driven electricity model: power and intensity looked up from the discrete
//! state, consumption integrated into a total.

use tracing::debug;

use crate::devices::types::ElectricalProfile;
use crate::error::SimResult;

use super::clock::{SimDuration, SimTime};
use super::core::EquipmentCore;
use super::event::TimedEvent;
use super::model::HybridModel;
use super::report::{Summary, SummaryKind, TotalAccumulator};
use super::types::{FixpointProgress, ModelId, RunConfig};
use super::variable::{Export, VariableStore};

/// Name of the exported power variable, in watts.
pub const POWER: &str = "power";
/// Name of the exported intensity variable, in amperes.
pub const INTENSITY: &str = "intensity";

/// Electricity aspect of an appliance.
///
/// Exports `power` (W) and `intensity` (A). Both are recomputed from the profile's
/// consumption table in internal transitions, except that an event carrying a direct
/// value rewrites `power` immediately.
pub struct ElectricityModel<P: ElectricalProfile> {
    core: EquipmentCore<P::State, P::Mode>,
    profile: P,
    power: Export,
    intensity: Export,
    consumption_wh: TotalAccumulator,
}

impl<P: ElectricalProfile> ElectricityModel<P> {
    /// Creates the model and declares its exports in `vars`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SimError::DuplicateExport`] if `id` already exports them.
    pub fn new(id: ModelId, profile: P, run: RunConfig, vars: &mut VariableStore) -> SimResult<Self> {
        let power = vars.declare(&id, POWER, false)?;
        let intensity = vars.declare(&id, INTENSITY, false)?;
        let core = EquipmentCore::new(id, profile.initial(), run);
        Ok(Self {
            core,
            profile,
            power,
            intensity,
            consumption_wh: TotalAccumulator::default(),
        })
    }

    pub fn state(&self) -> P::State {
        self.core.state()
    }

    pub fn mode(&self) -> P::Mode {
        self.core.mode()
    }

    pub fn profile(&self) -> &P {
        &self.profile
    }

    pub fn is_recompute_pending(&self) -> bool {
        self.core.is_recompute_pending()
    }

    /// Energy consumed so far, in Wh.
    pub fn consumption_wh(&self) -> f64 {
        self.consumption_wh.total()
    }

    fn table_power_w(&self) -> f64 {
        self.profile.power_w(self.core.state(), self.core.mode())
    }

    /// Adds the interval that just elapsed at the intensity that held during it.
    fn accumulate(&mut self, elapsed: SimDuration, vars: &VariableStore) -> SimResult<()> {
        let intensity = vars.read(self.intensity.as_import())?;
        self.consumption_wh
            .accumulate(intensity * self.profile.tension_v(), elapsed);
        Ok(())
    }
}

impl<P: ElectricalProfile> HybridModel for ElectricityModel<P> {
    fn id(&self) -> &ModelId {
        self.core.id()
    }

    fn initialise_state(&mut self, start: SimTime) {
        self.core.reset(start);
        self.consumption_wh = TotalAccumulator::default();
    }

    fn fixpoint_initialise(&mut self, vars: &mut VariableStore) -> SimResult<FixpointProgress> {
        let mut progress = FixpointProgress::DONE;
        let now = self.core.last_event();
        let power = self.table_power_w();
        if !vars.is_initialised(self.power.as_import()) {
            vars.write(&self.power, power, None, now);
            progress.initialised += 1;
        }
        if !vars.is_initialised(self.intensity.as_import()) {
            vars.write(&self.intensity, power / self.profile.tension_v(), None, now);
            progress.initialised += 1;
        }
        Ok(progress)
    }

    fn time_advance(&self) -> SimDuration {
        self.core.time_advance(false)
    }

    fn external_transition(
        &mut self,
        events: &[TimedEvent],
        elapsed: SimDuration,
        vars: &mut VariableStore,
    ) -> SimResult<()> {
        let event = self.core.single_event(events)?.event;
        let now = self.core.advance(elapsed)?;
        self.accumulate(elapsed, vars)?;

        let next = self
            .profile
            .transition(self.core.state(), self.core.mode(), &event)
            .ok_or_else(|| self.core.unexpected(&event))?;
        self.core.apply(next.state, next.mode);

        if next.direct_value {
            let power = self.table_power_w();
            if vars.read(self.power.as_import())? != power {
                vars.write(&self.power, power, None, now);
                self.core.mark_recompute();
            }
        }
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
        self.accumulate(elapsed, vars)?;

        let power = self.table_power_w();
        let intensity = power / self.profile.tension_v();
        vars.write(&self.power, power, None, now);
        vars.write(&self.intensity, intensity, None, now);
        self.core.clear_recompute();

        if self.core.run().verbose {
            debug!(
                model = %self.core.id(),
                kind = self.profile.kind(),
                state = ?self.core.state(),
                power_w = power,
                intensity_a = intensity,
                at = %now,
                "intensity recomputed"
            );
        }
        Ok(())
    }

    fn end_simulation(&mut self, end: SimTime, vars: &mut VariableStore) -> SimResult<()> {
        let elapsed = end - self.core.last_event();
        self.core.advance(elapsed)?;
        self.accumulate(elapsed, vars)
    }

    fn final_report(&self) -> Summary {
        Summary {
            model: self.core.id().clone(),
            kind: SummaryKind::TotalEnergy,
            value: self.consumption_wh.total() / 1000.0,
        }
    }

    fn time_of_last_event(&self) -> SimTime {
        self.core.last_event()
    }
}
