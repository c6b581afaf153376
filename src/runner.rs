//! Builds an engine from a scenario configuration and runs it.

use tracing::info;

use crate::config::ScenarioConfig;
use crate::devices::{hair_dryer, heater, kettle};
use crate::error::SimResult;
use crate::sim::clock::SimTime;
use crate::sim::engine::Engine;
use crate::sim::report::RunReport;
use crate::sim::scenario::{ScenarioAnchor, ScenarioScheduler, ScenarioStep, ScenarioTrace};
use crate::sim::types::ModelId;

/// Merges the demo steps of every selected appliance into one ordered list.
///
/// Steps sharing an instant keep the appliance order `hair_dryer`, `heater`, `kettle`.
pub fn scenario_steps(config: &ScenarioConfig) -> Vec<ScenarioStep<ScenarioTrace>> {
    let start = config.run.start;
    let mut steps = Vec::new();
    if config.includes("hair_dryer") {
        steps.extend(hair_dryer::demo_steps(&ModelId::new("hair_dryer"), start));
    }
    if config.includes("heater") {
        steps.extend(heater::demo_steps(
            &ModelId::new("heater"),
            start,
            &config.heater,
        ));
    }
    if config.includes("kettle") {
        steps.extend(kettle::demo_steps(&ModelId::new("kettle"), start));
    }
    steps.sort_by_key(|s| s.instant());
    steps
}

/// Validates `config`, then composes every selected appliance into a fresh engine.
///
/// # Errors
///
/// Returns the first configuration error, or any composition error.
pub fn build_engine(config: &ScenarioConfig) -> SimResult<Engine> {
    if let Some(first) = config.validate().into_iter().next() {
        return Err(first.into());
    }
    let anchor = ScenarioAnchor::new(config.run.start, config.run.end, SimTime::ZERO)?;
    let scheduler = ScenarioScheduler::new(anchor, scenario_steps(config))?;
    let mut engine = Engine::new(config.run.run_config(), scheduler);

    if config.includes("hair_dryer") {
        hair_dryer::compose(&mut engine, &ModelId::new("hair_dryer"), &config.hair_dryer)?;
    }
    if config.includes("heater") {
        heater::compose(&mut engine, &ModelId::new("heater"), &config.heater)?;
    }
    if config.includes("kettle") {
        kettle::compose(&mut engine, &ModelId::new("kettle"), &config.kettle)?;
    }
    info!(appliances = ?config.run.appliances, "engine composed");
    Ok(engine)
}

/// Builds and runs `config` to completion.
///
/// # Errors
///
/// Returns configuration, composition or protocol errors.
pub fn run_scenario(config: &ScenarioConfig) -> SimResult<RunReport> {
    build_engine(config)?.run()
}
