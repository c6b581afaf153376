//! TOML-based run configuration and preset definitions.

use std::fs;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::sim::clock::SimDuration;
use crate::sim::temperature::ThermalConstants;
use crate::sim::types::RunConfig;

/// Appliance names accepted in `run.appliances`.
pub const APPLIANCES: &[&str] = &["hair_dryer", "heater", "kettle"];

/// Top-level configuration parsed from TOML.
///
/// All sections have defaults matching the `household` preset. Load from TOML with
/// [`ScenarioConfig::from_toml_file`] or pick a preset with
/// [`ScenarioConfig::from_preset`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Run window and protocol parameters.
    #[serde(default)]
    pub run: RunSection,
    #[serde(default)]
    pub hair_dryer: HairDryerConfig,
    #[serde(default)]
    pub heater: HeaterConfig,
    #[serde(default)]
    pub kettle: KettleConfig,
}

/// Run window and protocol parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSection {
    /// Wall-clock instant mapped to simulated time zero (RFC 3339 string).
    pub start: DateTime<Utc>,
    /// Wall-clock instant at which the run ends.
    pub end: DateTime<Utc>,
    /// Integration step of continuous quantities, in seconds.
    pub integration_step_secs: f64,
    /// Trace every transition.
    pub verbose: bool,
    /// Appliances taking part in the run.
    pub appliances: Vec<String>,
}

impl Default for RunSection {
    fn default() -> Self {
        let start = Utc
            .with_ymd_and_hms(2025, 1, 6, 8, 0, 0)
            .single()
            .unwrap_or_default();
        Self {
            start,
            end: start + chrono::TimeDelta::hours(2),
            integration_step_secs: 60.0,
            verbose: false,
            appliances: APPLIANCES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl RunSection {
    /// Protocol settings handed to every model.
    pub fn run_config(&self) -> RunConfig {
        RunConfig::new(
            SimDuration::from_secs(self.integration_step_secs),
            self.verbose,
        )
    }
}

/// Hair dryer electrical parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HairDryerConfig {
    /// Power drawn at the low level (W).
    pub low_power_w: f64,
    /// Power drawn at the high level (W).
    pub high_power_w: f64,
    /// Supply tension (V).
    pub tension_v: f64,
}

impl Default for HairDryerConfig {
    fn default() -> Self {
        Self {
            low_power_w: 460.0,
            high_power_w: 1100.0,
            tension_v: 220.0,
        }
    }
}

/// Heat capacity and losses of a heated body.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThermalConfig {
    /// Heated mass (kg).
    pub mass_kg: f64,
    /// Specific heat capacity (J/(kg·K)).
    pub specific_heat: f64,
    /// Heat-loss time constant (s).
    pub insulation_secs: f64,
    /// Ambient temperature (°C).
    pub ambient_c: f64,
    /// Initial temperature (°C).
    pub initial_c: f64,
    /// Physical ceiling (°C), if any.
    pub ceiling_c: Option<f64>,
    /// Heating power assumed when no power variable is bound (W).
    pub fallback_power_w: f64,
}

impl Default for ThermalConfig {
    /// Air of a 50 m³ room.
    fn default() -> Self {
        Self {
            mass_kg: 60.0,
            specific_heat: 1005.0,
            insulation_secs: 1200.0,
            ambient_c: 12.0,
            initial_c: 18.0,
            ceiling_c: None,
            fallback_power_w: 1500.0,
        }
    }
}

impl ThermalConfig {
    /// 1.7 litres of water at room temperature, boiling at 100 °C.
    pub fn kettle_water() -> Self {
        Self {
            mass_kg: 1.7,
            specific_heat: 4180.0,
            insulation_secs: 3000.0,
            ambient_c: 20.0,
            initial_c: 20.0,
            ceiling_c: Some(100.0),
            fallback_power_w: 2000.0,
        }
    }

    pub fn constants(&self) -> ThermalConstants {
        ThermalConstants {
            mass_kg: self.mass_kg,
            specific_heat: self.specific_heat,
            insulation_secs: self.insulation_secs,
            ambient_c: self.ambient_c,
            initial_c: self.initial_c,
            ceiling_c: self.ceiling_c,
            fallback_power_w: self.fallback_power_w,
        }
    }
}

/// Electric room heater parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeaterConfig {
    /// Maximum heating power (W); setpoints above are clamped.
    pub max_power_w: f64,
    /// Heating power before any setpoint is received (W).
    pub initial_power_w: f64,
    /// Supply tension (V).
    pub tension_v: f64,
    /// Leave the temperature model's power import unbound (fallback power is used).
    pub unbound_power: bool,
    /// Room thermal parameters.
    pub thermal: ThermalConfig,
}

impl Default for HeaterConfig {
    fn default() -> Self {
        Self {
            max_power_w: 1500.0,
            initial_power_w: 1500.0,
            tension_v: 220.0,
            unbound_power: false,
            thermal: ThermalConfig::default(),
        }
    }
}

/// Kettle parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KettleConfig {
    /// Heating power in normal mode (W).
    pub normal_power_w: f64,
    /// Heating power in eco mode (W).
    pub eco_power_w: f64,
    /// Supply tension (V).
    pub tension_v: f64,
    /// Water thermal parameters.
    pub thermal: ThermalConfig,
}

impl Default for KettleConfig {
    fn default() -> Self {
        Self {
            normal_power_w: 2000.0,
            eco_power_w: 1000.0,
            tension_v: 220.0,
            thermal: ThermalConfig::kettle_water(),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"run.integration_step_secs"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Every appliance, two hours.
    pub fn household() -> Self {
        Self {
            run: RunSection::default(),
            hair_dryer: HairDryerConfig::default(),
            heater: HeaterConfig::default(),
            kettle: KettleConfig::default(),
        }
    }

    fn only(appliance: &str) -> Self {
        let mut cfg = Self::household();
        cfg.run.appliances = vec![appliance.to_string()];
        cfg
    }

    /// Hair dryer alone.
    pub fn hair_dryer() -> Self {
        Self::only("hair_dryer")
    }

    /// Room heater alone.
    pub fn heater() -> Self {
        Self::only("heater")
    }

    /// Kettle alone, with a one-hour window.
    pub fn kettle() -> Self {
        let mut cfg = Self::only("kettle");
        cfg.run.end = cfg.run.start + chrono::TimeDelta::hours(1);
        cfg
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["household", "hair_dryer", "heater", "kettle"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "household" => Ok(Self::household()),
            "hair_dryer" => Ok(Self::hair_dryer()),
            "heater" => Ok(Self::heater()),
            "kettle" => Ok(Self::kettle()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Whether `appliance` takes part in the run.
    pub fn includes(&self, appliance: &str) -> bool {
        self.run.appliances.iter().any(|a| a == appliance)
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let run = &self.run;

        if run.end < run.start {
            errors.push(ConfigError::new("run.end", "must not precede run.start"));
        }
        if !(run.integration_step_secs > 0.0 && run.integration_step_secs.is_finite()) {
            errors.push(ConfigError::new(
                "run.integration_step_secs",
                "must be > 0 and finite",
            ));
        }
        if run.appliances.is_empty() {
            errors.push(ConfigError::new("run.appliances", "must not be empty"));
        }
        for name in &run.appliances {
            if !APPLIANCES.contains(&name.as_str()) {
                errors.push(ConfigError::new(
                    "run.appliances",
                    format!(
                        "unknown appliance \"{name}\", expected one of {}",
                        APPLIANCES.join(", ")
                    ),
                ));
            }
        }

        let dryer = &self.hair_dryer;
        positive(&mut errors, "hair_dryer.low_power_w", dryer.low_power_w);
        positive(&mut errors, "hair_dryer.tension_v", dryer.tension_v);
        if finite(&mut errors, "hair_dryer.high_power_w", dryer.high_power_w)
            && dryer.high_power_w < dryer.low_power_w
        {
            errors.push(ConfigError::new(
                "hair_dryer.high_power_w",
                "must be >= hair_dryer.low_power_w",
            ));
        }

        let heater = &self.heater;
        positive(&mut errors, "heater.max_power_w", heater.max_power_w);
        positive(&mut errors, "heater.tension_v", heater.tension_v);
        if !(0.0..=heater.max_power_w).contains(&heater.initial_power_w) {
            errors.push(ConfigError::new(
                "heater.initial_power_w",
                "must be in [0, heater.max_power_w]",
            ));
        }
        validate_thermal(&mut errors, "heater.thermal", &heater.thermal);

        let kettle = &self.kettle;
        positive(&mut errors, "kettle.eco_power_w", kettle.eco_power_w);
        positive(&mut errors, "kettle.tension_v", kettle.tension_v);
        if finite(&mut errors, "kettle.normal_power_w", kettle.normal_power_w)
            && kettle.normal_power_w < kettle.eco_power_w
        {
            errors.push(ConfigError::new(
                "kettle.normal_power_w",
                "must be >= kettle.eco_power_w",
            ));
        }
        validate_thermal(&mut errors, "kettle.thermal", &kettle.thermal);
        if kettle.thermal.ceiling_c.is_none() {
            errors.push(ConfigError::new(
                "kettle.thermal.ceiling_c",
                "must be set (boiling point)",
            ));
        }

        errors
    }
}

fn positive(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if !(value > 0.0 && value.is_finite()) {
        errors.push(ConfigError::new(field, "must be > 0 and finite"));
    }
}

/// Pushes an error and returns `false` for NaN or infinite values.
fn finite(errors: &mut Vec<ConfigError>, field: &str, value: f64) -> bool {
    if !value.is_finite() {
        errors.push(ConfigError::new(field, "must be finite"));
    }
    value.is_finite()
}

fn validate_thermal(errors: &mut Vec<ConfigError>, prefix: &str, t: &ThermalConfig) {
    positive(errors, &format!("{prefix}.mass_kg"), t.mass_kg);
    positive(errors, &format!("{prefix}.specific_heat"), t.specific_heat);
    positive(errors, &format!("{prefix}.insulation_secs"), t.insulation_secs);
    if !(t.fallback_power_w >= 0.0 && t.fallback_power_w.is_finite()) {
        errors.push(ConfigError::new(
            format!("{prefix}.fallback_power_w"),
            "must be >= 0 and finite",
        ));
    }
    let ambient_ok = finite(errors, &format!("{prefix}.ambient_c"), t.ambient_c);
    let initial_ok = finite(errors, &format!("{prefix}.initial_c"), t.initial_c);
    let ceiling = match t.ceiling_c {
        Some(c) if !finite(errors, &format!("{prefix}.ceiling_c"), c) => None,
        other => other,
    };
    if let Some(ceiling) = ceiling.filter(|_| ambient_ok && initial_ok) {
        if t.ambient_c >= ceiling {
            errors.push(ConfigError::new(
                format!("{prefix}.ambient_c"),
                format!("must be < {prefix}.ceiling_c"),
            ));
        }
        if t.initial_c > ceiling {
            errors.push(ConfigError::new(
                format!("{prefix}.initial_c"),
                format!("must be <= {prefix}.ceiling_c"),
            ));
        }
    }
}
