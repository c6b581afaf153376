//! Reference coordinator that drives hybrid models through a scenario.
//!
//! This is a deterministic, single-threaded driver for tests and the CLI, not a
//! general discrete-event kernel: there is no coupling graph beyond the routing
//! table from scenario participants to hybrid models.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::error::{SimError, SimResult};

use super::clock::SimTime;
use super::event::TimedEvent;
use super::fixpoint;
use super::model::HybridModel;
use super::report::RunReport;
use super::scenario::{ScenarioScheduler, ScenarioTrace};
use super::types::{ModelId, RunConfig};
use super::variable::VariableStore;

/// Simulation engine owning the models, their variables and the scenario.
///
/// At any simulated instant, scenario steps fire before due internal transitions;
/// models are visited in registration order.
pub struct Engine {
    run: RunConfig,
    vars: VariableStore,
    models: Vec<Box<dyn HybridModel>>,
    routes: BTreeMap<ModelId, Vec<usize>>,
    scenario: ScenarioScheduler<ScenarioTrace>,
    scenario_clock: SimTime,
    trace: ScenarioTrace,
    ran: bool,
}

impl Engine {
    /// Creates an engine over `scenario`, with an empty variable store.
    pub fn new(run: RunConfig, scenario: ScenarioScheduler<ScenarioTrace>) -> Self {
        let scenario_clock = scenario.anchor().start_simulated;
        Self {
            run,
            vars: VariableStore::new(),
            models: Vec::new(),
            routes: BTreeMap::new(),
            scenario,
            scenario_clock,
            trace: ScenarioTrace::default(),
            ran: false,
        }
    }

    pub fn run_config(&self) -> &RunConfig {
        &self.run
    }

    /// Variable store, for composition (declaring exports, binding imports).
    pub fn variables_mut(&mut self) -> &mut VariableStore {
        &mut self.vars
    }

    pub fn variables(&self) -> &VariableStore {
        &self.vars
    }

    pub fn trace(&self) -> &ScenarioTrace {
        &self.trace
    }

    pub fn scenario(&self) -> &ScenarioScheduler<ScenarioTrace> {
        &self.scenario
    }

    /// Registers a model.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::DuplicateModel`] if the identity is taken.
    pub fn add_model(&mut self, model: Box<dyn HybridModel>) -> SimResult<()> {
        if self.index_of(model.id()).is_some() {
            return Err(SimError::DuplicateModel {
                model: model.id().clone(),
            });
        }
        self.models.push(model);
        Ok(())
    }

    /// Delivers the outputs of scenario participant `source` to model `target`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NotInScenario`] if `source` owns no steps,
    /// [`SimError::Unrouted`] if `target` is not registered, or
    /// [`SimError::DuplicateRoute`] if the pair is already routed.
    pub fn route(&mut self, source: &ModelId, target: &ModelId) -> SimResult<()> {
        self.scenario.cursor(source)?;
        let index = self.index_of(target).ok_or_else(|| SimError::Unrouted {
            model: target.clone(),
        })?;
        let targets = self.routes.entry(source.clone()).or_default();
        if targets.contains(&index) {
            return Err(SimError::DuplicateRoute {
                participant: source.clone(),
                target: target.clone(),
            });
        }
        targets.push(index);
        Ok(())
    }

    fn index_of(&self, id: &ModelId) -> Option<usize> {
        self.models.iter().position(|m| m.id() == id)
    }

    /// Earliest pending scenario step: `(time, participant)`, ties broken by list order.
    fn next_scenario_step(&self) -> SimResult<Option<(SimTime, ModelId)>> {
        let mut best: Option<(SimTime, usize, ModelId)> = None;
        for model in self.scenario.models() {
            let delay = self.scenario.delay_to_next_step(model, self.scenario_clock)?;
            if delay.is_infinite() {
                continue;
            }
            let at = self.scenario_clock + delay;
            let cursor = self.scenario.cursor(model)?;
            let earlier = match &best {
                Some((t, c, _)) => at < *t || (at == *t && cursor < *c),
                None => true,
            };
            if earlier {
                best = Some((at, cursor, model.clone()));
            }
        }
        Ok(best.map(|(at, _, model)| (at, model)))
    }

    fn next_internal_time(&self) -> Option<SimTime> {
        self.models
            .iter()
            .map(|m| m.time_of_next_event())
            .filter(|t| t.as_secs().is_finite())
            .min_by(|a, b| a.as_secs().total_cmp(&b.as_secs()))
    }

    /// Fires one scenario step at `at` and delivers its events.
    fn fire_step(&mut self, participant: &ModelId, at: SimTime) -> SimResult<()> {
        let events = self.scenario.generate_output(participant, at)?;
        self.scenario
            .perform_step(participant, &mut self.trace, at)?;
        self.scenario.advance(participant)?;
        self.scenario_clock = at;

        let targets = self
            .routes
            .get(participant)
            .cloned()
            .ok_or_else(|| SimError::Unrouted {
                model: participant.clone(),
            })?;
        for event in events {
            for &index in &targets {
                self.deliver(index, event)?;
            }
        }
        Ok(())
    }

    fn deliver(&mut self, index: usize, event: TimedEvent) -> SimResult<()> {
        let model = &mut self.models[index];
        let elapsed = event.at - model.time_of_last_event();
        model.external_transition(&[event], elapsed, &mut self.vars)
    }

    /// Runs the scenario from its anchor start to its anchor end.
    ///
    /// An engine runs once; its models, variables and scenario cursors are left in
    /// their end-of-run state for inspection.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AlreadyRun`] on a second call. Any protocol error aborts
    /// the run and is returned as is.
    pub fn run(&mut self) -> SimResult<RunReport> {
        if self.ran {
            return Err(SimError::AlreadyRun);
        }
        self.ran = true;
        let start = self.scenario.anchor().start_simulated;
        let end = self.scenario.anchor().end_simulated();
        info!(models = self.models.len(), steps = self.scenario.len(), %start, %end, "run starting");

        for model in &mut self.models {
            model.initialise_state(start);
        }
        let passes = fixpoint::initialise_all(
            self.models.iter_mut().map(|m| m.as_mut()),
            &mut self.vars,
        )?;
        debug!(passes, "fixpoint reached");

        loop {
            let scenario_next = self.next_scenario_step()?;
            let internal_next = self.next_internal_time();

            match (scenario_next, internal_next) {
                (Some((at, participant)), internal)
                    if at <= end && internal.is_none_or(|t| at <= t) =>
                {
                    self.fire_step(&participant, at)?;
                }
                (_, Some(t)) if t <= end => {
                    for model in &mut self.models {
                        if model.time_of_next_event() <= t {
                            let elapsed = t - model.time_of_last_event();
                            model.internal_transition(elapsed, &mut self.vars)?;
                        }
                    }
                }
                _ => break,
            }
        }

        for model in &mut self.models {
            model.end_simulation(end, &mut self.vars)?;
        }
        let report = RunReport {
            summaries: self.models.iter().map(|m| m.final_report()).collect(),
        };
        info!(total_energy_kwh = report.total_energy_kwh(), "run finished");
        Ok(report)
    }
}
