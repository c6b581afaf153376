//! Household appliances and the capability traits that plug them into the models.

/// Two-level hair dryer (electricity only).
pub mod hair_dryer;
/// Room heater with a power setpoint (electricity and room temperature).
pub mod heater;
pub mod kettle;
pub mod types;

pub use hair_dryer::HairDryer;
pub use heater::{HeatedRoom, Heater};
pub use kettle::{Kettle, KettleWater};
pub use types::{ElectricalProfile, ThermalProfile, Transition};
