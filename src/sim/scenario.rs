//! Time-synchronised test scenarios.
//!
//! A scenario is one globally ordered list of steps, each owned by a model and
//! stamped with a wall-clock instant. The scheduler maps instants onto simulated
//! time and gives every model a cursor over its own subsequence of the list.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{SimError, SimResult};

use super::clock::{SimDuration, SimTime};
use super::event::{ApplianceEvent, TimedEvent};
use super::types::ModelId;

/// Produces the events of a step, given the simulated time at which it fires.
pub type OutputFn = Box<dyn Fn(SimTime) -> Vec<TimedEvent>>;

/// Applies a step's effect to a target `T` at the given simulated time.
pub type MutationFn<T> = Box<dyn Fn(&mut T, SimTime) -> SimResult<()>>;

/// One scripted action of a scenario.
pub struct ScenarioStep<T> {
    model: ModelId,
    instant: DateTime<Utc>,
    output: OutputFn,
    mutation: MutationFn<T>,
}

impl<T> ScenarioStep<T> {
    pub fn new(
        model: ModelId,
        instant: DateTime<Utc>,
        output: OutputFn,
        mutation: MutationFn<T>,
    ) -> Self {
        Self {
            model,
            instant,
            output,
            mutation,
        }
    }

    /// A step that emits `events` at its own time and mutates nothing.
    pub fn emit(model: ModelId, instant: DateTime<Utc>, events: Vec<ApplianceEvent>) -> Self {
        Self::new(
            model,
            instant,
            Box::new(move |at| events.iter().map(|&e| TimedEvent::new(at, e)).collect()),
            Box::new(|_, _| Ok(())),
        )
    }

    /// Replaces the step's mutation.
    pub fn with_mutation(mut self, mutation: MutationFn<T>) -> Self {
        self.mutation = mutation;
        self
    }

    pub fn model(&self) -> &ModelId {
        &self.model
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }
}

impl ScenarioStep<ScenarioTrace> {
    /// A step that emits `events` and records them in the run's [`ScenarioTrace`].
    pub fn traced(model: ModelId, instant: DateTime<Utc>, events: Vec<ApplianceEvent>) -> Self {
        let label = events
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let owner = model.clone();
        Self::emit(model, instant, events).with_mutation(Box::new(move |trace, at| {
            trace.record(&owner, at, label.clone());
            Ok(())
        }))
    }
}

impl<T> fmt::Debug for ScenarioStep<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioStep")
            .field("model", &self.model)
            .field("instant", &self.instant)
            .finish_non_exhaustive()
    }
}

/// Affine mapping from wall-clock instants to simulated time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioAnchor {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub start_simulated: SimTime,
}

impl ScenarioAnchor {
    /// # Errors
    ///
    /// Returns [`SimError::InvalidAnchor`] if `end` precedes `start`.
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        start_simulated: SimTime,
    ) -> SimResult<Self> {
        if end < start {
            return Err(SimError::InvalidAnchor { start, end });
        }
        Ok(Self {
            start,
            end,
            start_simulated,
        })
    }

    /// `start_simulated + (instant - start)`, in simulated seconds.
    pub fn to_simulated(&self, instant: DateTime<Utc>) -> SimTime {
        self.start_simulated + SimDuration::from_wall_clock(instant - self.start)
    }

    pub fn end_simulated(&self) -> SimTime {
        self.to_simulated(self.end)
    }
}

/// Record of a performed step, used by scenario mutations that only need to leave a
/// trace (e.g. to assert ordering in tests).
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEntry {
    pub model: ModelId,
    pub at: SimTime,
    pub label: String,
}

/// Append-only log of performed steps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioTrace {
    entries: Vec<TraceEntry>,
}

impl ScenarioTrace {
    pub fn record(&mut self, model: &ModelId, at: SimTime, label: impl Into<String>) {
        self.entries.push(TraceEntry {
            model: model.clone(),
            at,
            label: label.into(),
        });
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }
}

/// Drives each model through its own subsequence of a globally ordered step list.
pub struct ScenarioScheduler<T> {
    anchor: ScenarioAnchor,
    steps: Vec<ScenarioStep<T>>,
    cursors: BTreeMap<ModelId, usize>,
}

impl<T> ScenarioScheduler<T> {
    /// Builds a scheduler and places every model's cursor on its first step.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnorderedScenario`] if the instants are not non-decreasing.
    pub fn new(anchor: ScenarioAnchor, steps: Vec<ScenarioStep<T>>) -> SimResult<Self> {
        for (index, pair) in steps.windows(2).enumerate() {
            if pair[1].instant < pair[0].instant {
                return Err(SimError::UnorderedScenario {
                    index: index + 1,
                    instant: pair[1].instant,
                    previous: pair[0].instant,
                });
            }
        }
        let mut cursors = BTreeMap::new();
        for (index, step) in steps.iter().enumerate() {
            cursors.entry(step.model.clone()).or_insert(index);
        }
        Ok(Self {
            anchor,
            steps,
            cursors,
        })
    }

    pub fn anchor(&self) -> &ScenarioAnchor {
        &self.anchor
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Every model that owns at least one step.
    pub fn models(&self) -> impl Iterator<Item = &ModelId> {
        self.cursors.keys()
    }

    /// Index of the model's next step; `len()` once terminated.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NotInScenario`] for a model without steps.
    pub fn cursor(&self, model: &ModelId) -> SimResult<usize> {
        self.cursors
            .get(model)
            .copied()
            .ok_or_else(|| SimError::NotInScenario {
                model: model.clone(),
            })
    }

    pub fn is_terminated(&self, model: &ModelId) -> SimResult<bool> {
        Ok(self.cursor(model)? == self.steps.len())
    }

    /// Simulated time of the model's next step, `None` once terminated.
    pub fn next_step_time(&self, model: &ModelId) -> SimResult<Option<SimTime>> {
        let cursor = self.cursor(model)?;
        Ok(self
            .steps
            .get(cursor)
            .map(|step| self.anchor.to_simulated(step.instant)))
    }

    /// Delay from `now` (the model's current simulated time) to its next step.
    pub fn delay_to_next_step(&self, model: &ModelId, now: SimTime) -> SimResult<SimDuration> {
        Ok(match self.next_step_time(model)? {
            Some(at) => at - now,
            None => SimDuration::INFINITE,
        })
    }

    fn current_step(&self, model: &ModelId) -> SimResult<&ScenarioStep<T>> {
        let cursor = self.cursor(model)?;
        self.steps
            .get(cursor)
            .ok_or_else(|| SimError::ScenarioTerminated {
                model: model.clone(),
            })
    }

    /// Events of the model's current step, stamped at `next_event_time`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::EventTimeMismatch`] if the step stamps an event with any
    /// other time.
    pub fn generate_output(
        &self,
        model: &ModelId,
        next_event_time: SimTime,
    ) -> SimResult<Vec<TimedEvent>> {
        let step = self.current_step(model)?;
        let events = (step.output)(next_event_time);
        if let Some(bad) = events.iter().find(|e| e.at != next_event_time) {
            return Err(SimError::EventTimeMismatch {
                model: model.clone(),
                event_time: bad.at,
                expected: next_event_time,
            });
        }
        Ok(events)
    }

    /// Applies the model's current step to `target` at `now`.
    pub fn perform_step(&self, model: &ModelId, target: &mut T, now: SimTime) -> SimResult<()> {
        let step = self.current_step(model)?;
        (step.mutation)(target, now)
    }

    /// Moves the model's cursor to its next step, or to `len()` when none is left.
    pub fn advance(&mut self, model: &ModelId) -> SimResult<()> {
        let cursor = self.cursor(model)?;
        let len = self.steps.len();
        let next = (cursor + 1..len)
            .find(|&i| &self.steps[i].model == model)
            .unwrap_or(len);
        debug!(%model, from = cursor, to = next, "scenario cursor advanced");
        self.cursors.insert(model.clone(), next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 6, 8, 0, 0).unwrap()
    }

    fn at_min(minutes: i64) -> DateTime<Utc> {
        t0() + chrono::TimeDelta::minutes(minutes)
    }

    fn anchor() -> ScenarioAnchor {
        ScenarioAnchor::new(t0(), at_min(120), SimTime::ZERO).unwrap()
    }

    fn dryer() -> ModelId {
        ModelId::new("dryer")
    }

    fn kettle() -> ModelId {
        ModelId::new("kettle")
    }

    fn interleaved() -> ScenarioScheduler<ScenarioTrace> {
        let steps = vec![
            ScenarioStep::emit(dryer(), at_min(0), vec![ApplianceEvent::SwitchOn]),
            ScenarioStep::emit(kettle(), at_min(5), vec![ApplianceEvent::SwitchOn]),
            ScenarioStep::emit(dryer(), at_min(10), vec![ApplianceEvent::SetHigh]),
            ScenarioStep::emit(kettle(), at_min(10), vec![ApplianceEvent::Heat]),
            ScenarioStep::emit(dryer(), at_min(30), vec![ApplianceEvent::SwitchOff]),
        ];
        ScenarioScheduler::new(anchor(), steps).unwrap()
    }

    #[test]
    fn unordered_steps_are_rejected() {
        let steps: Vec<ScenarioStep<ScenarioTrace>> = vec![
            ScenarioStep::emit(dryer(), at_min(10), vec![ApplianceEvent::SwitchOn]),
            ScenarioStep::emit(kettle(), at_min(5), vec![ApplianceEvent::SwitchOn]),
        ];
        let err = ScenarioScheduler::new(anchor(), steps).err();
        assert!(matches!(
            err,
            Some(SimError::UnorderedScenario { index: 1, .. })
        ));
    }

    #[test]
    fn anchor_end_before_start_is_rejected() {
        assert!(ScenarioAnchor::new(at_min(10), t0(), SimTime::ZERO).is_err());
    }

    #[test]
    fn instants_map_affinely() {
        let anchor = ScenarioAnchor::new(t0(), at_min(60), SimTime::from_secs(100.0)).unwrap();
        assert_eq!(anchor.to_simulated(at_min(2)), SimTime::from_secs(220.0));
        assert_eq!(anchor.end_simulated(), SimTime::from_secs(3700.0));
    }

    #[test]
    fn cursors_see_only_their_own_steps() {
        let mut s = interleaved();
        assert_eq!(s.cursor(&dryer()), Ok(0));
        assert_eq!(s.cursor(&kettle()), Ok(1));
        s.advance(&dryer()).unwrap();
        assert_eq!(s.cursor(&dryer()), Ok(2));
        s.advance(&dryer()).unwrap();
        assert_eq!(s.cursor(&dryer()), Ok(4));
        s.advance(&dryer()).unwrap();
        assert_eq!(s.cursor(&dryer()), Ok(s.len()));
        assert_eq!(s.is_terminated(&dryer()), Ok(true));
        assert_eq!(s.is_terminated(&kettle()), Ok(false));
    }

    #[test]
    fn delay_is_measured_from_current_time() {
        let mut s = interleaved();
        let now = SimTime::from_secs(60.0);
        s.advance(&dryer()).unwrap();
        assert_eq!(
            s.delay_to_next_step(&dryer(), now),
            Ok(SimDuration::from_secs(540.0))
        );
        s.advance(&dryer()).unwrap();
        s.advance(&dryer()).unwrap();
        assert_eq!(
            s.delay_to_next_step(&dryer(), now),
            Ok(SimDuration::INFINITE)
        );
    }

    #[test]
    fn delay_shrinks_as_time_passes() {
        let s = interleaved();
        let mut previous = SimDuration::INFINITE;
        for secs in [0.0, 60.0, 120.0, 300.0, 600.0] {
            let delay = s
                .delay_to_next_step(&kettle(), SimTime::from_secs(secs))
                .unwrap();
            assert!(delay <= previous);
            previous = delay;
        }
        assert_eq!(previous, SimDuration::from_secs(-300.0));
    }

    #[test]
    fn unknown_model_is_a_precondition_error() {
        let s = interleaved();
        let fan = ModelId::new("fan");
        assert!(matches!(
            s.delay_to_next_step(&fan, SimTime::ZERO),
            Err(SimError::NotInScenario { .. })
        ));
    }

    #[test]
    fn output_is_stamped_at_next_event_time() {
        let s = interleaved();
        let at = SimTime::from_secs(300.0);
        let events = s.generate_output(&kettle(), at).unwrap();
        assert_eq!(events, vec![TimedEvent::new(at, ApplianceEvent::SwitchOn)]);
    }

    #[test]
    fn mis_stamped_output_is_detected() {
        let step: ScenarioStep<ScenarioTrace> = ScenarioStep::new(
            dryer(),
            t0(),
            Box::new(|at| {
                vec![TimedEvent::new(
                    at + SimDuration::from_secs(1.0),
                    ApplianceEvent::SwitchOn,
                )]
            }),
            Box::new(|_, _| Ok(())),
        );
        let s = ScenarioScheduler::new(anchor(), vec![step]).unwrap();
        assert!(matches!(
            s.generate_output(&dryer(), SimTime::ZERO),
            Err(SimError::EventTimeMismatch { .. })
        ));
    }

    #[test]
    fn perform_step_runs_the_mutation() {
        let step = ScenarioStep::emit(dryer(), t0(), vec![ApplianceEvent::SwitchOn]).with_mutation(
            Box::new(|trace: &mut ScenarioTrace, at| {
                trace.record(&ModelId::new("dryer"), at, "switched on");
                Ok(())
            }),
        );
        let s = ScenarioScheduler::new(anchor(), vec![step]).unwrap();
        let mut trace = ScenarioTrace::default();
        s.perform_step(&dryer(), &mut trace, SimTime::ZERO).unwrap();
        assert_eq!(trace.entries().len(), 1);
        assert_eq!(trace.entries()[0].label, "switched on");
    }

    #[test]
    fn traced_step_records_its_events() {
        let step = ScenarioStep::traced(
            dryer(),
            t0(),
            vec![ApplianceEvent::SwitchOn, ApplianceEvent::SetHigh],
        );
        let s = ScenarioScheduler::new(anchor(), vec![step]).unwrap();
        let mut trace = ScenarioTrace::default();
        s.perform_step(&dryer(), &mut trace, SimTime::from_secs(3.0)).unwrap();
        assert_eq!(
            trace.entries(),
            &[TraceEntry {
                model: dryer(),
                at: SimTime::from_secs(3.0),
                label: "SwitchOn, SetHigh".to_string(),
            }]
        );
    }

    #[test]
    fn terminated_model_cannot_emit() {
        let mut s = interleaved();
        s.advance(&kettle()).unwrap();
        s.advance(&kettle()).unwrap();
        assert!(matches!(
            s.generate_output(&kettle(), SimTime::ZERO),
            Err(SimError::ScenarioTerminated { .. })
        ));
    }
}
