// Translation of the domain model into good_lp, shared by the good_lp backends

use good_lp::{
    variable, Expression, IntoAffineExpression, ProblemVariables, ResolutionError,
    Solution as GoodLpSolutionTrait, SolverModel, Variable as GoodLpVariable,
};

use crate::domain::{
    models::{LinearExpr, OptimizationProblem, Solution as DomainSolution, SolverStatistics},
    solver_service::{Result, SolverError},
    value_objects::{
        ConstraintType, OptimizationType, SolutionStatus as DomainSolutionStatus, VariableType,
    },
};

/// Declares every domain variable, keeping the domain order
pub(crate) fn declare_variables(
    problem: &OptimizationProblem,
) -> (ProblemVariables, Vec<GoodLpVariable>) {
    let mut vars = ProblemVariables::new();
    let mut lp_variables = Vec::with_capacity(problem.num_variables());

    for var_def in &problem.variables {
        let lower = var_def.lower_bound;
        let upper = var_def.upper_bound.unwrap_or(f64::INFINITY);

        let var = match var_def.variable_type {
            VariableType::Binary | VariableType::Integer => {
                vars.add(variable().integer().min(lower).max(upper))
            }
            VariableType::Continuous => vars.add(variable().min(lower).max(upper)),
        };
        lp_variables.push(var);
    }

    (vars, lp_variables)
}

pub(crate) fn expression(expr: &LinearExpr, lp_variables: &[GoodLpVariable]) -> Expression {
    let mut lhs = Expression::with_capacity(expr.len());
    for &(var, coeff) in expr.terms() {
        lhs += coeff * lp_variables[var.index()];
    }
    lhs
}

/// Objective as good_lp minimises it
pub(crate) fn objective(problem: &OptimizationProblem, lp_variables: &[GoodLpVariable]) -> Expression {
    let is_maximize = problem.objective.optimization_type == OptimizationType::Maximize;
    let mut obj_expr = Expression::with_capacity(problem.objective.expr.len());
    for &(var, coeff) in problem.objective.expr.terms() {
        // good_lp minimises, so negate for maximization
        let c = if is_maximize { -coeff } else { coeff };
        obj_expr += c * lp_variables[var.index()];
    }
    obj_expr
}

pub(crate) fn add_constraints<M: SolverModel>(
    mut lp_model: M,
    problem: &OptimizationProblem,
    lp_variables: &[GoodLpVariable],
) -> M {
    for constraint in &problem.constraints {
        let lhs = expression(&constraint.expr, lp_variables);
        lp_model = match constraint.constraint_type {
            ConstraintType::LessThanOrEqual => lp_model.with(lhs.leq(constraint.bound)),
            ConstraintType::Equal => lp_model.with(lhs.eq(constraint.bound)),
            ConstraintType::GreaterThanOrEqual => lp_model.with(lhs.geq(constraint.bound)),
        };
    }
    lp_model
}

pub(crate) fn values<S: GoodLpSolutionTrait>(solution: &S, lp_variables: &[GoodLpVariable]) -> Vec<f64> {
    lp_variables.iter().map(|&var| solution.value(var)).collect()
}

/// Maps a good_lp failure to a domain outcome
pub(crate) fn resolution_failure(
    error: ResolutionError,
    statistics: SolverStatistics,
) -> Result<DomainSolution> {
    match error {
        ResolutionError::Infeasible => Ok(DomainSolution::new(
            DomainSolutionStatus::Infeasible,
            "Problem is infeasible: no solution satisfies all constraints",
        )
        .with_statistics(statistics)),
        ResolutionError::Unbounded => Ok(DomainSolution::new(
            DomainSolutionStatus::Unbounded,
            "Problem is unbounded: objective can be improved infinitely",
        )
        .with_statistics(statistics)),
        e => Err(SolverError::ExecutionFailed(format!("{:?}", e))),
    }
}
