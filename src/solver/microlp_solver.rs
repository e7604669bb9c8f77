// MicroLP Solver Adapter
// Pure Rust branch-and-bound through good_lp, usable without native libraries

use std::time::Instant;

use good_lp::solvers::microlp::microlp;
use good_lp::SolverModel;
use tracing::{debug, warn};

use super::good_lp_support::{
    add_constraints, declare_variables, objective, resolution_failure, values,
};
use crate::domain::{
    models::{OptimizationProblem, Solution as DomainSolution, SolverStatistics},
    solver_service::{Result, SolverService},
};

pub struct MicroLpSolver;

impl MicroLpSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MicroLpSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for MicroLpSolver {
    fn solve(&self, problem: &OptimizationProblem) -> Result<DomainSolution> {
        self.validate(problem)?;

        let config = &problem.solver_config;
        if config.time_limit.is_some() || config.gap_tolerance.is_some() {
            warn!(
                solver = self.name(),
                "time limit and gap tolerance are not supported and will be ignored"
            );
        }

        let start_time = Instant::now();
        let (vars, lp_variables) = declare_variables(problem);
        let lp_model = vars
            .minimise(objective(problem, &lp_variables))
            .using(microlp);
        let lp_model = add_constraints(lp_model, problem, &lp_variables);

        debug!(
            solver = self.name(),
            variables = problem.num_variables(),
            constraints = problem.num_constraints(),
            "solving"
        );
        let solution_result = lp_model.solve();
        let statistics =
            SolverStatistics::for_problem(problem, start_time.elapsed().as_secs_f64() * 1000.0);

        match solution_result {
            Ok(sol) => {
                let variable_values = values(&sol, &lp_variables);
                let actual_obj = problem.objective_value(&variable_values);
                let quality = problem.evaluate(&variable_values);

                let mut solution = DomainSolution::optimal(actual_obj, variable_values)
                    .with_statistics(statistics)
                    .with_quality(quality);
                solution.message = format!("Optimal solution found for '{}'", problem.name);
                Ok(solution)
            }
            Err(e) => resolution_failure(e, statistics),
        }
    }

    fn name(&self) -> &str {
        "MicroLP"
    }

    fn supports_mip(&self) -> bool {
        true
    }

    fn honors_time_limit(&self) -> bool {
        false
    }
}
