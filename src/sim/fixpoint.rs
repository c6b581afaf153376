//! Multi-pass initialisation of variables with cross-model dependencies.

use tracing::{debug, error};

use crate::error::{SimError, SimResult};

use super::model::HybridModel;
use super::types::FixpointProgress;
use super::variable::VariableStore;

/// Runs fixpoint passes over `models` until every variable is initialised.
///
/// Returns the number of passes. A pass that initialises nothing while variables are
/// still waiting means a cyclic or unsatisfiable dependency and fails with
/// [`SimError::FixpointStalled`].
pub fn initialise_all<'m, M>(
    models: impl IntoIterator<Item = &'m mut M>,
    vars: &mut VariableStore,
) -> SimResult<usize>
where
    M: HybridModel + ?Sized + 'm,
{
    let mut models: Vec<&'m mut M> = models.into_iter().collect();
    let mut passes = 0;
    loop {
        passes += 1;
        let mut progress = FixpointProgress::DONE;
        for model in models.iter_mut() {
            progress += model.fixpoint_initialise(vars)?;
        }
        debug!(
            pass = passes,
            initialised = progress.initialised,
            waiting = progress.waiting,
            "fixpoint pass"
        );
        if progress.waiting == 0 {
            return Ok(passes);
        }
        if progress.initialised == 0 {
            let unresolved = vars.uninitialised();
            error!(?unresolved, "fixpoint initialisation stalled");
            return Err(SimError::FixpointStalled { unresolved });
        }
    }
}
