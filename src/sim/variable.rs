//! Continuous variables and the store through which models share them.
//!
//! Every variable lives in a [`VariableStore`]. The owning model holds the only
//! [`Export`] handle for it, which is the capability needed to write. Other models
//! resolve an [`Import`] once at composition time and can only read through it.

use std::collections::HashMap;
use std::fmt;

use crate::error::{SimError, SimResult};

use super::clock::SimTime;
use super::types::ModelId;

/// Named reference to an exported variable: `(owner, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariableRef {
    pub owner: ModelId,
    pub name: String,
}

impl VariableRef {
    pub fn new(owner: ModelId, name: impl Into<String>) -> Self {
        Self {
            owner,
            name: name.into(),
        }
    }
}

impl fmt::Display for VariableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A physical quantity evolving over simulated time.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousVariable {
    reference: VariableRef,
    value: f64,
    derivative: Option<f64>,
    last_update: SimTime,
    initialised: bool,
    integrated: bool,
}

impl ContinuousVariable {
    fn new(reference: VariableRef, integrated: bool) -> Self {
        Self {
            reference,
            value: 0.0,
            derivative: None,
            last_update: SimTime::ZERO,
            initialised: false,
            integrated,
        }
    }

    pub fn reference(&self) -> &VariableRef {
        &self.reference
    }

    /// Current value, or an error before initialisation.
    pub fn value(&self) -> SimResult<f64> {
        if !self.initialised {
            return Err(SimError::Uninitialised {
                var: self.reference.clone(),
            });
        }
        Ok(self.value)
    }

    /// First derivative; only integrated quantities carry one.
    pub fn derivative(&self) -> Option<f64> {
        self.derivative
    }

    pub fn last_update(&self) -> SimTime {
        self.last_update
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    pub fn is_integrated(&self) -> bool {
        self.integrated
    }

    fn write(&mut self, value: f64, derivative: Option<f64>, at: SimTime) {
        self.value = value;
        self.derivative = if self.integrated { derivative } else { None };
        self.last_update = at;
        self.initialised = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot(usize);

/// Write capability for one variable, held by its owning model only.
#[derive(Debug, PartialEq, Eq)]
pub struct Export {
    slot: Slot,
}

impl Export {
    /// Read access to the same variable.
    pub fn as_import(&self) -> Import {
        Import { slot: self.slot }
    }
}

/// Read-only accessor to another model's exported variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Import {
    slot: Slot,
}

/// Owner of every continuous variable in a composition.
#[derive(Debug, Default)]
pub struct VariableStore {
    vars: Vec<ContinuousVariable>,
    index: HashMap<VariableRef, Slot>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an uninitialised variable owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::DuplicateExport`] if the name is already exported by `owner`.
    pub fn declare(&mut self, owner: &ModelId, name: &str, integrated: bool) -> SimResult<Export> {
        let reference = VariableRef::new(owner.clone(), name);
        if self.index.contains_key(&reference) {
            return Err(SimError::DuplicateExport { var: reference });
        }
        let slot = Slot(self.vars.len());
        self.vars
            .push(ContinuousVariable::new(reference.clone(), integrated));
        self.index.insert(reference, slot);
        Ok(Export { slot })
    }

    /// Resolves an optional binding; `None` means the topology leaves it unbound.
    pub fn bind(&self, owner: &ModelId, name: &str) -> Option<Import> {
        self.index
            .get(&VariableRef::new(owner.clone(), name))
            .map(|&slot| Import { slot })
    }

    /// Resolves a mandatory binding.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownVariable`] if nothing exports `reference`.
    pub fn resolve(&self, reference: &VariableRef) -> SimResult<Import> {
        self.index
            .get(reference)
            .map(|&slot| Import { slot })
            .ok_or_else(|| SimError::UnknownVariable {
                var: reference.clone(),
            })
    }

    pub fn variable(&self, import: Import) -> &ContinuousVariable {
        &self.vars[import.slot.0]
    }

    /// Looks a variable up by name, for inspection.
    pub fn find(&self, reference: &VariableRef) -> Option<&ContinuousVariable> {
        self.index.get(reference).map(|slot| &self.vars[slot.0])
    }

    /// Reads a value.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Uninitialised`] during the fixpoint phase.
    pub fn read(&self, import: Import) -> SimResult<f64> {
        self.variable(import).value()
    }

    pub fn is_initialised(&self, import: Import) -> bool {
        self.variable(import).is_initialised()
    }

    /// Sets a value (and derivative, for integrated quantities) at `at`.
    pub fn write(&mut self, export: &Export, value: f64, derivative: Option<f64>, at: SimTime) {
        self.vars[export.slot.0].write(value, derivative, at);
    }

    /// Every variable still waiting for its initial value.
    pub fn uninitialised(&self) -> Vec<VariableRef> {
        self.vars
            .iter()
            .filter(|v| !v.initialised)
            .map(|v| v.reference.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> ModelId {
        ModelId::new("kettle.electricity")
    }

    #[test]
    fn read_before_initialisation_is_an_error() {
        let mut store = VariableStore::new();
        let export = store.declare(&owner(), "intensity", false).unwrap();
        let err = store.read(export.as_import()).unwrap_err();
        assert!(matches!(err, SimError::Uninitialised { .. }));
    }

    #[test]
    fn duplicate_export_is_rejected() {
        let mut store = VariableStore::new();
        store.declare(&owner(), "intensity", false).unwrap();
        let err = store.declare(&owner(), "intensity", false).unwrap_err();
        assert!(matches!(err, SimError::DuplicateExport { .. }));
    }

    #[test]
    fn binding_sees_owner_writes() {
        let mut store = VariableStore::new();
        let export = store.declare(&owner(), "power", false).unwrap();
        let import = store.bind(&owner(), "power").unwrap();
        store.write(&export, 1000.0, None, SimTime::from_secs(5.0));
        assert_eq!(store.read(import), Ok(1000.0));
        assert_eq!(store.variable(import).last_update(), SimTime::from_secs(5.0));
    }

    #[test]
    fn missing_export_binds_to_none() {
        let store = VariableStore::new();
        assert!(store.bind(&owner(), "power").is_none());
        let reference = VariableRef::new(owner(), "power");
        assert!(matches!(
            store.resolve(&reference),
            Err(SimError::UnknownVariable { .. })
        ));
    }

    #[test]
    fn derivative_is_kept_only_for_integrated_quantities() {
        let mut store = VariableStore::new();
        let table = store.declare(&owner(), "intensity", false).unwrap();
        let integrated = store
            .declare(&ModelId::new("kettle.temperature"), "temperature", true)
            .unwrap();
        store.write(&table, 2.0, Some(1.0), SimTime::ZERO);
        store.write(&integrated, 20.0, Some(0.5), SimTime::ZERO);
        assert_eq!(store.variable(table.as_import()).derivative(), None);
        assert_eq!(store.variable(integrated.as_import()).derivative(), Some(0.5));
    }

    #[test]
    fn uninitialised_lists_pending_variables() {
        let mut store = VariableStore::new();
        let a = store.declare(&owner(), "power", false).unwrap();
        store.declare(&owner(), "intensity", false).unwrap();
        store.write(&a, 0.0, None, SimTime::ZERO);
        assert_eq!(
            store.uninitialised(),
            vec![VariableRef::new(owner(), "intensity")]
        );
    }
}
