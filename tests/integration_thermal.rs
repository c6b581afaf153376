//! Heater and kettle runs: electricity and temperature aspects together.

mod common;

use appliance_sim::config::ScenarioConfig;
use appliance_sim::devices::{heater, kettle};
use appliance_sim::runner::build_engine;
use appliance_sim::sim::event::ApplianceEvent;
use appliance_sim::sim::scenario::{ScenarioStep, ScenarioTrace};
use appliance_sim::sim::temperature::TEMPERATURE;
use appliance_sim::sim::types::ModelId;

fn heating_hour() -> Vec<ScenarioStep<ScenarioTrace>> {
    vec![
        common::step("heater", 0, ApplianceEvent::SwitchOn),
        common::step("heater", 0, ApplianceEvent::Heat),
    ]
}

#[test]
fn heater_energy_follows_the_setpoint() {
    let steps = vec![
        common::step("heater", 0, ApplianceEvent::SwitchOn),
        common::step("heater", 0, ApplianceEvent::Heat),
        common::step("heater", 30, ApplianceEvent::SetPower { watts: 1000.0 }),
        common::step("heater", 60, ApplianceEvent::DoNotHeat),
    ];
    let mut engine = common::engine(steps, 90);
    heater::compose(&mut engine, &ModelId::new("heater"), &common::test_heater()).unwrap();

    let report = engine.run().unwrap();
    let energy = report.get(&ModelId::new("heater.electricity")).unwrap().value;
    assert!((energy - 1.25).abs() < 1e-9, "expected 1.25 kWh, got {energy}");

    let mean = report.get(&ModelId::new("heater.temperature")).unwrap().value;
    assert!(mean > 10.0, "room should have warmed, mean {mean}");
    let last = common::value_of(&engine, "heater.temperature", TEMPERATURE);
    assert!(last > 10.0, "room should still be warm, got {last}");
}

#[test]
fn setpoint_above_maximum_is_clamped() {
    let steps = vec![
        common::step("heater", 0, ApplianceEvent::SwitchOn),
        common::step("heater", 0, ApplianceEvent::SetPower { watts: 5000.0 }),
        common::step("heater", 0, ApplianceEvent::Heat),
    ];
    let mut engine = common::engine(steps, 60);
    heater::compose(&mut engine, &ModelId::new("heater"), &common::test_heater()).unwrap();

    let report = engine.run().unwrap();
    assert!((report.total_energy_kwh() - 1.5).abs() < 1e-9);
}

#[test]
fn unbound_power_falls_back_to_constant_heating() {
    let mut bound = common::engine(heating_hour(), 60);
    heater::compose(&mut bound, &ModelId::new("heater"), &common::test_heater()).unwrap();
    let bound = bound.run().unwrap();

    let mut config = common::test_heater();
    config.unbound_power = true;
    let mut unbound = common::engine(heating_hour(), 60);
    heater::compose(&mut unbound, &ModelId::new("heater"), &config).unwrap();
    let unbound = unbound.run().unwrap();

    let room = ModelId::new("heater.temperature");
    let (a, b) = (bound.get(&room).unwrap().value, unbound.get(&room).unwrap().value);
    assert!((a - b).abs() < 1e-9, "bound {a} vs fallback {b}");
}

#[test]
fn room_without_heating_stays_at_ambient() {
    let steps = vec![common::step("heater", 0, ApplianceEvent::SwitchOn)];
    let mut engine = common::engine(steps, 60);
    heater::compose(&mut engine, &ModelId::new("heater"), &common::test_heater()).unwrap();

    let report = engine.run().unwrap();
    let mean = report.get(&ModelId::new("heater.temperature")).unwrap().value;
    assert!((mean - 10.0).abs() < 1e-9);
    assert_eq!(report.total_energy_kwh(), 0.0);
}

#[test]
fn kettle_boils_without_exceeding_the_ceiling() {
    let steps = vec![
        common::step("kettle", 0, ApplianceEvent::SwitchOn),
        common::step("kettle", 0, ApplianceEvent::Heat),
    ];
    let mut engine = common::engine(steps, 30);
    kettle::compose(&mut engine, &ModelId::new("kettle"), &common::test_kettle()).unwrap();

    let report = engine.run().unwrap();
    let last = common::value_of(&engine, "kettle.temperature", TEMPERATURE);
    assert!(last <= 100.0 && last > 95.0, "last temperature {last}");
    let mean = report.get(&ModelId::new("kettle.temperature")).unwrap().value;
    assert!(mean < 100.0 && mean > 20.0);
    assert!((report.total_energy_kwh() - 1.0).abs() < 1e-9);
}

#[test]
fn kettle_preset_uses_normal_then_eco_power() {
    let config = ScenarioConfig::kettle();
    let mut engine = build_engine(&config).unwrap();
    let report = engine.run().unwrap();

    // 10 min at 2000 W then 9 min at 1000 W
    let expected = (2000.0 * 10.0 + 1000.0 * 9.0) / 60.0 / 1000.0;
    assert!((report.total_energy_kwh() - expected).abs() < 1e-9);
    assert_eq!(engine.trace().entries().len(), 7);
}
