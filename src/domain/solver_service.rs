// Domain service interface for solving optimization problems
// Any MILP backend plugs in behind this trait

use super::models::{OptimizationProblem, Solution};

/// Error types for the solver service
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    #[error("Solver not available: {0}")]
    SolverNotAvailable(String),

    #[error("Solver execution failed: {0}")]
    ExecutionFailed(String),
}

pub type Result<T> = std::result::Result<T, SolverError>;

/// Domain service interface for optimization solvers
///
/// A solve is one blocking call. Implementations must not keep state between
/// calls, so one instance can be shared across threads.
pub trait SolverService: Send + Sync {
    /// Solve an optimization problem
    fn solve(&self, problem: &OptimizationProblem) -> Result<Solution>;

    /// Validate a problem without solving it
    fn validate(&self, problem: &OptimizationProblem) -> Result<()> {
        let mut errors = Vec::new();
        let num_vars = problem.num_variables();

        if num_vars == 0 {
            errors.push("Problem must declare at least one variable".to_string());
        }

        for (var, coeff) in problem.objective.expr.terms() {
            if var.index() >= num_vars {
                errors.push(format!("Objective references unknown variable {}", var));
            }
            if !coeff.is_finite() {
                errors.push(format!("Objective coefficient of {} is not finite", var));
            }
        }

        for (i, constraint) in problem.constraints.iter().enumerate() {
            for (var, coeff) in constraint.expr.terms() {
                if var.index() >= num_vars {
                    errors.push(format!(
                        "Constraint {} '{}' references unknown variable {}",
                        i, constraint.name, var
                    ));
                }
                if !coeff.is_finite() {
                    errors.push(format!(
                        "Constraint {} '{}' has a non-finite coefficient on {}",
                        i, constraint.name, var
                    ));
                }
            }
            if !constraint.bound.is_finite() {
                errors.push(format!(
                    "Constraint {} '{}' has a non-finite bound",
                    i, constraint.name
                ));
            }
        }

        for (i, var) in problem.variables.iter().enumerate() {
            if let Some(upper) = var.upper_bound {
                if var.lower_bound > upper {
                    errors.push(format!(
                        "Variable {} '{}' has lower bound ({}) > upper bound ({})",
                        i, var.name, var.lower_bound, upper
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SolverError::InvalidProblem(errors.join("; ")))
        }
    }

    /// Get the name of this solver backend
    fn name(&self) -> &str;

    /// Check if this solver supports mixed-integer programming
    fn supports_mip(&self) -> bool;

    /// Whether the search stops at `SolverConfig::time_limit`
    fn honors_time_limit(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Constraint, LinearExpr, Variable};

    struct NullSolver;

    impl SolverService for NullSolver {
        fn solve(&self, _problem: &OptimizationProblem) -> Result<Solution> {
            Err(SolverError::SolverNotAvailable("null".to_string()))
        }

        fn name(&self) -> &str {
            "null"
        }

        fn supports_mip(&self) -> bool {
            false
        }
    }

    #[test]
    fn validate_accepts_a_well_formed_problem() {
        let mut problem = OptimizationProblem::new();
        let x = problem.add_variable(Variable::continuous("x").with_bounds(0.0, Some(4.0)));
        problem.add_constraint(Constraint::leq(LinearExpr::new().plus(x, 1.0), 3.0));
        assert!(NullSolver.validate(&problem).is_ok());
    }

    #[test]
    fn validate_rejects_inverted_bounds_and_nan_bounds() {
        let mut problem = OptimizationProblem::new();
        let x = problem.add_variable(Variable::continuous("x").with_bounds(5.0, Some(4.0)));
        problem.add_constraint(Constraint::leq(LinearExpr::new().plus(x, 1.0), f64::NAN));

        let err = NullSolver.validate(&problem).unwrap_err().to_string();
        assert!(err.contains("lower bound (5) > upper bound (4)"));
        assert!(err.contains("non-finite bound"));
    }

    #[test]
    fn validate_rejects_empty_problem() {
        let problem = OptimizationProblem::new();
        assert!(matches!(
            NullSolver.validate(&problem),
            Err(SolverError::InvalidProblem(_))
        ));
    }
}
