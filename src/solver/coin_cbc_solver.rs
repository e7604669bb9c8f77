// COIN-OR CBC Solver Adapter
// Translates the domain model to CBC through good_lp

use std::time::Instant;

use good_lp::solvers::coin_cbc::coin_cbc;
use good_lp::SolverModel;
use tracing::{debug, warn};

use super::good_lp_support::{
    add_constraints, declare_variables, objective, resolution_failure, values,
};
use crate::domain::{
    models::{OptimizationProblem, Solution as DomainSolution, SolverStatistics},
    solver_service::{Result, SolverService},
};

pub struct CoinCbcSolver;

impl CoinCbcSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CoinCbcSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for CoinCbcSolver {
    fn solve(&self, problem: &OptimizationProblem) -> Result<DomainSolution> {
        // Validate first
        self.validate(problem)?;

        let start_time = Instant::now();
        let (vars, lp_variables) = declare_variables(problem);
        let mut lp_model = vars
            .minimise(objective(problem, &lp_variables))
            .using(coin_cbc);

        let config = &problem.solver_config;
        lp_model.set_parameter("log", if config.verbose { "1" } else { "0" });
        if let Some(limit) = config.time_limit {
            lp_model.set_parameter("seconds", &limit.to_string());
        }
        if let Some(gap) = config.gap_tolerance {
            lp_model.set_parameter("ratioGap", &gap.to_string());
        }

        let lp_model = add_constraints(lp_model, problem, &lp_variables);

        debug!(
            solver = self.name(),
            variables = problem.num_variables(),
            constraints = problem.num_constraints(),
            time_limit = ?config.time_limit,
            "solving"
        );
        let solution_result = lp_model.solve();
        let statistics =
            SolverStatistics::for_problem(problem, start_time.elapsed().as_secs_f64() * 1000.0);

        match solution_result {
            Ok(sol) => {
                let variable_values = values(&sol, &lp_variables);
                if !sol.model().is_proven_optimal() {
                    let solution = DomainSolution::from_incumbent(problem, variable_values)
                        .with_statistics(statistics);
                    if solution.is_feasible() {
                        warn!(solver = self.name(), "search stopped before proving optimality");
                    }
                    return Ok(solution);
                }

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
        "COIN-OR CBC"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}
