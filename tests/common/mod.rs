//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use appliance_sim::config::{HairDryerConfig, HeaterConfig, KettleConfig, ThermalConfig};
use appliance_sim::sim::clock::SimTime;
use appliance_sim::sim::engine::Engine;
use appliance_sim::sim::event::ApplianceEvent;
use appliance_sim::sim::scenario::{ScenarioAnchor, ScenarioScheduler, ScenarioStep, ScenarioTrace};
use appliance_sim::sim::types::{ModelId, RunConfig};
use appliance_sim::sim::variable::VariableRef;

/// Wall-clock origin of every test scenario (Monday 2025-01-06, 08:00 UTC).
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 8, 0, 0).unwrap()
}

pub fn at_min(minutes: i64) -> DateTime<Utc> {
    t0() + TimeDelta::minutes(minutes)
}

/// One-step-per-event scenario step, traced.
pub fn step(model: &str, minutes: i64, event: ApplianceEvent) -> ScenarioStep<ScenarioTrace> {
    ScenarioStep::traced(ModelId::new(model), at_min(minutes), vec![event])
}

/// Engine over `steps`, running from `t0()` for `end_minutes`, one-minute integration.
pub fn engine(steps: Vec<ScenarioStep<ScenarioTrace>>, end_minutes: i64) -> Engine {
    let anchor = ScenarioAnchor::new(t0(), at_min(end_minutes), SimTime::ZERO).unwrap();
    let scheduler = ScenarioScheduler::new(anchor, steps).unwrap();
    Engine::new(RunConfig::default(), scheduler)
}

/// 100 W low, 400 W high, 200 V: high draws exactly 2 A.
pub fn test_hair_dryer() -> HairDryerConfig {
    HairDryerConfig {
        low_power_w: 100.0,
        high_power_w: 400.0,
        tension_v: 200.0,
    }
}

/// 1.5 kW heater at 220 V in a 60 kg room starting at ambient.
pub fn test_heater() -> HeaterConfig {
    HeaterConfig {
        max_power_w: 1500.0,
        initial_power_w: 1500.0,
        tension_v: 220.0,
        unbound_power: false,
        thermal: ThermalConfig {
            ambient_c: 10.0,
            initial_c: 10.0,
            ..ThermalConfig::default()
        },
    }
}

pub fn test_kettle() -> KettleConfig {
    KettleConfig::default()
}

/// Current value of `owner/name` after a run.
pub fn value_of(engine: &Engine, owner: &str, name: &str) -> f64 {
    let var = engine
        .variables()
        .find(&VariableRef::new(ModelId::new(owner), name))
        .expect("variable should be declared");
    var.value().expect("variable should be initialised")
}
