//! MILP formulations of the routing variants.
//!
//! Each formulator turns a [`Network`] and a fleet configuration into a
//! solver-agnostic [`OptimizationProblem`](crate::domain::OptimizationProblem)
//! together with the index tables needed to read the solver's assignment
//! back into routing terms.

pub mod cvrp;
pub mod index;
pub mod ordering;
pub mod vrptw;

pub use cvrp::{CvrpConfig, CvrpModel};
pub use index::{ArcVars, NodeVars};
pub use ordering::StationaryOrder;
pub use vrptw::{BigM, VrptwConfig, VrptwModel};

use tracing::debug;

use crate::domain::{InputError, Network, SolverConfig};

/// Solver time limit applied when the caller sets none, in seconds
pub const DEFAULT_TIME_LIMIT_SECS: f64 = 300.0;

/// What to do with ordered node pairs the link table does not cover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingArcPolicy {
    /// Refuse to build the model and name the first uncovered pair
    #[default]
    Reject,
    /// Treat the pair as untravelable (infinite cost)
    Forbid,
}

pub(crate) fn check_arcs(network: &Network, policy: MissingArcPolicy) -> Result<(), InputError> {
    let missing = network.missing_arcs().count();
    match policy {
        MissingArcPolicy::Reject => {
            if let Some((i, j)) = network.missing_arcs().next() {
                return Err(InputError::MissingLink {
                    from: network.id(i).clone(),
                    to: network.id(j).clone(),
                });
            }
        }
        MissingArcPolicy::Forbid if missing > 0 => {
            debug!(missing, "forbidding arcs absent from the link table");
        }
        MissingArcPolicy::Forbid => {}
    }
    Ok(())
}

/// A time limit must be a positive number of seconds
pub(crate) fn check_solver(config: &SolverConfig) -> Result<(), InputError> {
    match config.time_limit {
        Some(limit) if !limit.is_finite() || limit <= 0.0 => {
            Err(InputError::InvalidTimeLimit(limit))
        }
        _ => Ok(()),
    }
}
