//! Accumulators integrated over a run and the summaries they produce.

use std::fmt;

use super::clock::SimDuration;
use super::types::ModelId;

/// Running total of a rate integrated over time, e.g. energy from power.
///
/// Each interval contributes `rate * elapsed` using the rate that held during the
/// interval, never the one that took effect at its end.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TotalAccumulator {
    total: f64,
}

impl TotalAccumulator {
    /// Adds `rate * elapsed_hours`. Negative rates or spans are ignored.
    pub fn accumulate(&mut self, rate: f64, elapsed: SimDuration) {
        if rate > 0.0 && elapsed.as_secs() > 0.0 {
            self.total += rate * elapsed.as_hours();
        }
    }

    /// Sum so far, in rate-hours (Wh for a power in W).
    pub fn total(&self) -> f64 {
        self.total
    }
}

/// Time-weighted mean of a quantity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeanAccumulator {
    weighted: f64,
    span_secs: f64,
}

impl MeanAccumulator {
    /// Adds the trapezoid between `start` and `end` over `elapsed`.
    pub fn accumulate_trapezoid(&mut self, start: f64, end: f64, elapsed: SimDuration) {
        if elapsed.as_secs() > 0.0 {
            self.weighted += 0.5 * (start + end) * elapsed.as_secs();
            self.span_secs += elapsed.as_secs();
        }
    }

    /// Adds a constant value held over `elapsed`.
    pub fn accumulate_constant(&mut self, value: f64, elapsed: SimDuration) {
        self.accumulate_trapezoid(value, value, elapsed);
    }

    /// Mean over the accumulated span, or `None` for an empty span.
    pub fn mean(&self) -> Option<f64> {
        (self.span_secs > 0.0).then(|| self.weighted / self.span_secs)
    }
}

/// What a summary value measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKind {
    /// Electrical energy consumed over the run.
    TotalEnergy,
    /// Time-weighted mean temperature over the run.
    MeanTemperature,
}

impl SummaryKind {
    pub fn label(self) -> &'static str {
        match self {
            SummaryKind::TotalEnergy => "total_energy",
            SummaryKind::MeanTemperature => "mean_temperature",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            SummaryKind::TotalEnergy => "kWh",
            SummaryKind::MeanTemperature => "°C",
        }
    }
}

/// Final report of one model.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub model: ModelId,
    pub kind: SummaryKind,
    pub value: f64,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<28} {:<18} {:>10.4} {}",
            self.model.as_str(),
            self.kind.label(),
            self.value,
            self.kind.unit()
        )
    }
}

/// All summaries of a run, in model registration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub summaries: Vec<Summary>,
}

impl RunReport {
    /// Summary of `model`, if it took part in the run.
    pub fn get(&self, model: &ModelId) -> Option<&Summary> {
        self.summaries.iter().find(|s| &s.model == model)
    }

    /// Total energy across every electricity model, in kWh.
    pub fn total_energy_kwh(&self) -> f64 {
        self.summaries
            .iter()
            .filter(|s| s.kind == SummaryKind::TotalEnergy)
            .map(|s| s.value)
            .sum()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Run Report ---")?;
        for summary in &self.summaries {
            writeln!(f, "{summary}")?;
        }
        write!(f, "Total energy:  {:.4} kWh", self.total_energy_kwh())
    }
}
