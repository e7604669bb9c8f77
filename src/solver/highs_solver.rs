// HiGHS Solver Adapter
// Implements the SolverService interface for HiGHS
// This is an adapter pattern - translates our domain models to HiGHS API

use std::time::Instant;

use highs::{HighsModelStatus, RowProblem, Sense};
use tracing::{debug, warn};

use crate::domain::{
    models::{OptimizationProblem, Solution as DomainSolution, SolverStatistics},
    solver_service::{Result, SolverError, SolverService},
    value_objects::{
        ConstraintType, OptimizationType, SolutionStatus as DomainSolutionStatus, VariableType,
    },
};

pub struct HighsSolver;

impl HighsSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HighsSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for HighsSolver {
    fn solve(&self, problem: &OptimizationProblem) -> Result<DomainSolution> {
        // Validate first
        self.validate(problem)?;

        let start_time = Instant::now();

        // HiGHS takes objective coefficients per column
        let mut obj_coeffs = vec![0.0; problem.num_variables()];
        for &(var, coeff) in problem.objective.expr.terms() {
            obj_coeffs[var.index()] += coeff;
        }

        // Use HiGHS RowProblem (add variables first, then constraints)
        let mut pb = RowProblem::default();
        let mut vars = Vec::with_capacity(problem.num_variables());

        for (var_def, &obj_coeff) in problem.variables.iter().zip(&obj_coeffs) {
            let lower = var_def.lower_bound;
            let upper = var_def.upper_bound.unwrap_or(f64::INFINITY);

            let col = match var_def.variable_type {
                VariableType::Integer | VariableType::Binary => {
                    pb.add_integer_column(obj_coeff, lower..upper)
                }
                VariableType::Continuous => pb.add_column(obj_coeff, lower..upper),
            };
            vars.push(col);
        }

        for constraint in &problem.constraints {
            let terms: Vec<_> = constraint
                .expr
                .terms()
                .iter()
                .map(|&(var, coeff)| (vars[var.index()], coeff))
                .collect();

            match constraint.constraint_type {
                ConstraintType::LessThanOrEqual => {
                    pb.add_row(..=constraint.bound, &terms);
                }
                ConstraintType::Equal => {
                    pb.add_row(constraint.bound..=constraint.bound, &terms);
                }
                ConstraintType::GreaterThanOrEqual => {
                    pb.add_row(constraint.bound.., &terms);
                }
            }
        }

        let sense = if problem.objective.optimization_type == OptimizationType::Maximize {
            Sense::Maximise
        } else {
            Sense::Minimise
        };

        let config = &problem.solver_config;
        let mut model = pb.optimise(sense);
        model.set_option("output_flag", config.verbose);
        if let Some(limit) = config.time_limit {
            model.set_option("time_limit", limit);
        }
        if let Some(gap) = config.gap_tolerance {
            model.set_option("mip_rel_gap", gap);
        }

        debug!(
            solver = self.name(),
            variables = problem.num_variables(),
            constraints = problem.num_constraints(),
            time_limit = ?config.time_limit,
            "solving"
        );
        let solved = model.solve();
        let statistics =
            SolverStatistics::for_problem(problem, start_time.elapsed().as_secs_f64() * 1000.0);

        match solved.status() {
            HighsModelStatus::Optimal => {
                let variable_values = solved.get_solution().columns().to_vec();
                let actual_obj = problem.objective_value(&variable_values);
                let quality = problem.evaluate(&variable_values);

                let mut solution = DomainSolution::optimal(actual_obj, variable_values)
                    .with_statistics(statistics)
                    .with_quality(quality);
                solution.message = format!("Optimal solution found for '{}'", problem.name);
                Ok(solution)
            }
            HighsModelStatus::ReachedTimeLimit => {
                // without an incumbent the column values are meaningless
                let variable_values = solved.get_solution().columns().to_vec();
                let solution = DomainSolution::from_incumbent(problem, variable_values)
                    .with_statistics(statistics);
                if solution.is_feasible() {
                    warn!(solver = self.name(), "time limit reached, keeping incumbent");
                }
                Ok(solution)
            }
            HighsModelStatus::Infeasible => Ok(DomainSolution::new(
                DomainSolutionStatus::Infeasible,
                "Problem is infeasible: no solution satisfies all constraints",
            )
            .with_statistics(statistics)),
            HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible => {
                Ok(DomainSolution::new(
                    DomainSolutionStatus::Unbounded,
                    "Problem is unbounded: objective can be improved infinitely",
                )
                .with_statistics(statistics))
            }
            status => Err(SolverError::ExecutionFailed(format!(
                "HiGHS solver returned status: {:?}",
                status
            ))),
        }
    }

    fn name(&self) -> &str {
        "HiGHS"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}
