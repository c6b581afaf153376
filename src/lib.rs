//! Hybrid discrete-event simulation of household appliances.
//!
//! Each appliance is split into aspect models (electricity, temperature) that share
//! continuous variables through a [`sim::variable::VariableStore`] and are driven
//! by a time-synchronised test scenario.

pub mod config;
pub mod devices;
pub mod error;
/// CSV export of run reports.
pub mod io;
pub mod runner;
/// Simulation protocol, models, scenario scheduler and engine.
pub mod sim;
