//! Simulated time: instants and durations measured in seconds.

use std::fmt;
use std::ops::{Add, AddAssign, Sub};

use chrono::TimeDelta;

/// A point on the simulated timeline, in seconds since the simulated origin.
///
/// # Examples
///
/// ```
/// use appliance_sim::sim::clock::{SimDuration, SimTime};
///
/// let t = SimTime::ZERO + SimDuration::from_hours(1.0);
/// assert_eq!(t.as_secs(), 3600.0);
/// assert_eq!(t - SimTime::ZERO, SimDuration::from_minutes(60.0));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct SimTime(f64);

impl SimTime {
    /// The simulated origin.
    pub const ZERO: SimTime = SimTime(0.0);

    /// Creates an instant `secs` seconds after the origin.
    pub fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    /// Creates an instant `hours` hours after the origin.
    pub fn from_hours(hours: f64) -> Self {
        Self(hours * 3600.0)
    }

    /// Seconds since the origin.
    pub fn as_secs(self) -> f64 {
        self.0
    }

    /// Hours since the origin.
    pub fn as_hours(self) -> f64 {
        self.0 / 3600.0
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.0)
    }
}

/// A span of simulated time in seconds.
///
/// `SimDuration::INFINITE` is the "no scheduled event" answer of a time advance.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct SimDuration(f64);

impl SimDuration {
    /// Zero delay: act immediately.
    pub const ZERO: SimDuration = SimDuration(0.0);

    /// Never act again unless an event arrives.
    pub const INFINITE: SimDuration = SimDuration(f64::INFINITY);

    pub fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    pub fn from_minutes(minutes: f64) -> Self {
        Self(minutes * 60.0)
    }

    pub fn from_hours(hours: f64) -> Self {
        Self(hours * 3600.0)
    }

    /// Converts a wall-clock span to simulated seconds, at nanosecond resolution.
    ///
    /// Spans too long for nanoseconds in an `i64` (about 292 years) fall back to
    /// microseconds.
    pub fn from_wall_clock(delta: TimeDelta) -> Self {
        match delta.num_nanoseconds() {
            Some(ns) => Self(ns as f64 / 1e9),
            None => Self(delta.num_microseconds().unwrap_or(i64::MAX) as f64 / 1e6),
        }
    }

    pub fn as_secs(self) -> f64 {
        self.0
    }

    pub fn as_hours(self) -> f64 {
        self.0 / 3600.0
    }

    pub fn is_infinite(self) -> bool {
        self.0.is_infinite()
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0.0
    }
}

impl fmt::Display for SimDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_infinite() {
            write!(f, "inf")
        } else {
            write!(f, "{:.3}s", self.0)
        }
    }
}

impl Add<SimDuration> for SimTime {
    type Output = SimTime;

    fn add(self, rhs: SimDuration) -> SimTime {
        SimTime(self.0 + rhs.0)
    }
}

impl AddAssign<SimDuration> for SimTime {
    fn add_assign(&mut self, rhs: SimDuration) {
        self.0 += rhs.0;
    }
}

impl Sub for SimTime {
    type Output = SimDuration;

    fn sub(self, rhs: SimTime) -> SimDuration {
        SimDuration(self.0 - rhs.0)
    }
}

impl Add for SimDuration {
    type Output = SimDuration;

    fn add(self, rhs: SimDuration) -> SimDuration {
        SimDuration(self.0 + rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_conversions_agree() {
        assert_eq!(SimDuration::from_hours(2.0), SimDuration::from_minutes(120.0));
        assert_eq!(SimDuration::from_minutes(1.0).as_secs(), 60.0);
        assert_eq!(SimTime::from_hours(1.5).as_secs(), 5400.0);
        assert_eq!(SimDuration::from_secs(1800.0).as_hours(), 0.5);
    }

    #[test]
    fn wall_clock_delta_maps_to_seconds() {
        let delta = TimeDelta::minutes(90) + TimeDelta::milliseconds(250);
        assert_eq!(SimDuration::from_wall_clock(delta).as_secs(), 5400.25);
    }

    #[test]
    fn wall_clock_keeps_sub_millisecond_precision() {
        let delta = TimeDelta::seconds(2) + TimeDelta::microseconds(750);
        assert_eq!(SimDuration::from_wall_clock(delta).as_secs(), 2.00075);
        let tiny = TimeDelta::nanoseconds(500);
        assert!(SimDuration::from_wall_clock(tiny).as_secs() > 0.0);
    }

    #[test]
    fn infinite_delay_dominates() {
        let t = SimTime::from_secs(10.0) + SimDuration::INFINITE;
        assert!(t.as_secs().is_infinite());
        assert!(SimDuration::INFINITE > SimDuration::from_hours(1e6));
        assert_eq!(SimDuration::INFINITE.to_string(), "inf");
    }

    #[test]
    fn instants_subtract_to_durations() {
        let a = SimTime::from_secs(100.0);
        let b = SimTime::from_secs(40.0);
        assert_eq!(a - b, SimDuration::from_secs(60.0));
        assert!((b - a).is_negative());
    }
}
