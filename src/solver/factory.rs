use std::sync::Arc;

use crate::domain::{
    models::SolverConfig,
    solver_service::{Result, SolverError, SolverService},
    value_objects::SolverBackend,
};

/// Factory for creating solver instances based on configuration
pub struct SolverFactory;

impl SolverFactory {
    /// Create the solver a configuration asks for.
    ///
    /// With a time limit set, `Auto` only picks a backend that stops at it;
    /// naming a backend explicitly bypasses that check.
    pub fn create_solver(config: &SolverConfig) -> Result<Arc<dyn SolverService>> {
        if config.backend != SolverBackend::Auto || config.time_limit.is_none() {
            return Self::create_from_backend(config.backend);
        }
        [highs(), coin_cbc(), microlp()]
            .into_iter()
            .flatten()
            .find(|solver| solver.honors_time_limit())
            .ok_or_else(|| {
                SolverError::SolverNotAvailable(
                    "no compiled backend honors a time limit; \
                     select MicroLP explicitly to solve without one"
                        .to_string(),
                )
            })
    }

    /// Create a solver for a specific backend
    pub fn create_from_backend(backend: SolverBackend) -> Result<Arc<dyn SolverService>> {
        let solver = match backend {
            SolverBackend::Auto => return Self::default_solver(),
            SolverBackend::CoinCbc => coin_cbc(),
            SolverBackend::Highs => highs(),
            SolverBackend::MicroLp => microlp(),
        };
        solver.ok_or_else(|| {
            SolverError::SolverNotAvailable(format!(
                "{} was not compiled into this build",
                backend
            ))
        })
    }

    /// Get the default solver: HiGHS, then CBC, then MicroLP
    pub fn default_solver() -> Result<Arc<dyn SolverService>> {
        highs()
            .or_else(coin_cbc)
            .or_else(microlp)
            .ok_or_else(|| SolverError::SolverNotAvailable("no solver backend enabled".to_string()))
    }

    /// Backends compiled into this build
    pub fn available_backends() -> Vec<SolverBackend> {
        [
            (SolverBackend::Highs, highs().is_some()),
            (SolverBackend::CoinCbc, coin_cbc().is_some()),
            (SolverBackend::MicroLp, microlp().is_some()),
        ]
        .into_iter()
        .filter_map(|(backend, available)| available.then_some(backend))
        .collect()
    }
}

#[cfg(feature = "highs")]
fn highs() -> Option<Arc<dyn SolverService>> {
    Some(Arc::new(super::HighsSolver::new()))
}

#[cfg(not(feature = "highs"))]
fn highs() -> Option<Arc<dyn SolverService>> {
    None
}

#[cfg(feature = "coin_cbc")]
fn coin_cbc() -> Option<Arc<dyn SolverService>> {
    Some(Arc::new(super::CoinCbcSolver::new()))
}

#[cfg(not(feature = "coin_cbc"))]
fn coin_cbc() -> Option<Arc<dyn SolverService>> {
    None
}

#[cfg(feature = "microlp")]
fn microlp() -> Option<Arc<dyn SolverService>> {
    Some(Arc::new(super::MicroLpSolver::new()))
}

#[cfg(not(feature = "microlp"))]
fn microlp() -> Option<Arc<dyn SolverService>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_picks_a_compiled_backend() {
        let available = SolverFactory::available_backends();
        match SolverFactory::create_from_backend(SolverBackend::Auto) {
            Ok(solver) => {
                assert!(!available.is_empty());
                assert!(solver.supports_mip());
            }
            Err(e) => {
                assert!(available.is_empty());
                assert!(matches!(e, SolverError::SolverNotAvailable(_)));
            }
        }
    }

    #[cfg(feature = "microlp")]
    #[test]
    fn microlp_is_selectable_by_name() {
        let solver = SolverFactory::create_from_backend(SolverBackend::MicroLp).unwrap();
        assert_eq!(solver.name(), "MicroLP");
    }

    #[test]
    fn auto_with_time_limit_never_picks_a_backend_that_ignores_it() {
        let config = SolverConfig {
            time_limit: Some(300.0),
            ..SolverConfig::default()
        };
        match SolverFactory::create_solver(&config) {
            Ok(solver) => assert!(solver.honors_time_limit()),
            Err(e) => {
                assert!(!SolverFactory::available_backends()
                    .iter()
                    .any(|b| matches!(b, SolverBackend::Highs | SolverBackend::CoinCbc)));
                assert!(e.to_string().contains("select MicroLP explicitly"));
            }
        }
    }

    #[cfg(feature = "microlp")]
    #[test]
    fn explicit_microlp_accepts_a_time_limit() {
        let config = SolverConfig {
            backend: SolverBackend::MicroLp,
            time_limit: Some(300.0),
            ..SolverConfig::default()
        };
        let solver = SolverFactory::create_solver(&config).unwrap();
        assert_eq!(solver.name(), "MicroLP");
        assert!(!solver.honors_time_limit());
    }

    #[cfg(feature = "microlp")]
    #[test]
    fn auto_without_time_limit_may_use_microlp() {
        let solver = SolverFactory::create_solver(&SolverConfig::default()).unwrap();
        assert!(solver.supports_mip());
    }

    #[cfg(not(feature = "coin_cbc"))]
    #[test]
    fn missing_backend_is_reported() {
        let err = SolverFactory::create_from_backend(SolverBackend::CoinCbc)
            .err()
            .unwrap();
        assert_eq!(
            err.to_string(),
            "Solver not available: COIN-OR CBC was not compiled into this build"
        );
    }
}
