/// Simulated time and durations.
pub mod clock;
pub mod core;
/// Electricity aspect: power, intensity and consumed energy.
pub mod electricity;
pub mod engine;
/// Appliance events.
pub mod event;
pub mod fixpoint;
pub mod model;
pub mod report;
pub mod scenario;
/// Temperature aspect: heating and cooling integration.
pub mod temperature;
pub mod types;
pub mod variable;
