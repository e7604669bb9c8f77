use std::fmt;

use super::value_objects::{
    ConstraintType, OptimizationType, SolutionStatus, SolverBackend, VariableType,
};

/// Handle of a variable inside an [`OptimizationProblem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// Decision variable in an optimization problem
#[derive(Debug, Clone)]
pub struct Variable {
    pub variable_type: VariableType,
    pub lower_bound: f64,
    pub upper_bound: Option<f64>,
    pub name: String,
}

impl Variable {
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Continuous,
            lower_bound: 0.0,
            upper_bound: None,
            name: name.into(),
        }
    }

    pub fn binary(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Binary,
            lower_bound: 0.0,
            upper_bound: Some(1.0),
            name: name.into(),
        }
    }

    pub fn with_bounds(mut self, lower: f64, upper: Option<f64>) -> Self {
        self.lower_bound = lower;
        self.upper_bound = upper;
        self
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self.variable_type,
            VariableType::Integer | VariableType::Binary
        )
    }
}

/// Sparse linear expression `Σ coefficient·variable`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `coefficient·var`. Zero coefficients are dropped.
    pub fn add(&mut self, var: VarId, coefficient: f64) -> &mut Self {
        if coefficient != 0.0 {
            self.terms.push((var, coefficient));
        }
        self
    }

    pub fn plus(mut self, var: VarId, coefficient: f64) -> Self {
        self.add(var, coefficient);
        self
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(var, coeff)| coeff * values.get(var.index()).copied().unwrap_or(0.0))
            .sum()
    }
}

impl FromIterator<(VarId, f64)> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = (VarId, f64)>>(iter: I) -> Self {
        let mut expr = LinearExpr::new();
        for (var, coeff) in iter {
            expr.add(var, coeff);
        }
        expr
    }
}

/// Objective function to minimize or maximize
#[derive(Debug, Clone)]
pub struct ObjectiveFunction {
    pub optimization_type: OptimizationType,
    pub expr: LinearExpr,
}

impl ObjectiveFunction {
    pub fn new(optimization_type: OptimizationType, expr: LinearExpr) -> Self {
        Self {
            optimization_type,
            expr,
        }
    }

    pub fn minimize(expr: LinearExpr) -> Self {
        Self::new(OptimizationType::Minimize, expr)
    }
}

impl Default for ObjectiveFunction {
    fn default() -> Self {
        Self::minimize(LinearExpr::new())
    }
}

/// Linear constraint `expr (≤ | = | ≥) bound`
#[derive(Debug, Clone)]
pub struct Constraint {
    pub constraint_type: ConstraintType,
    pub expr: LinearExpr,
    pub bound: f64,
    pub name: String,
}

impl Constraint {
    pub fn new(constraint_type: ConstraintType, expr: LinearExpr, bound: f64) -> Self {
        Self {
            constraint_type,
            expr,
            bound,
            name: String::new(),
        }
    }

    pub fn leq(expr: LinearExpr, bound: f64) -> Self {
        Self::new(ConstraintType::LessThanOrEqual, expr, bound)
    }

    pub fn eq(expr: LinearExpr, bound: f64) -> Self {
        Self::new(ConstraintType::Equal, expr, bound)
    }

    pub fn geq(expr: LinearExpr, bound: f64) -> Self {
        Self::new(ConstraintType::GreaterThanOrEqual, expr, bound)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn violation(&self, values: &[f64]) -> f64 {
        self.constraint_type
            .violation(self.expr.evaluate(values), self.bound)
    }
}

/// Configuration for the solver
#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub backend: SolverBackend,
    /// Wall-clock limit in seconds
    pub time_limit: Option<f64>,
    /// Relative MIP gap at which the search stops
    pub gap_tolerance: Option<f64>,
    pub verbose: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: SolverBackend::Auto,
            time_limit: None,
            gap_tolerance: None,
            verbose: false,
        }
    }
}

/// Complete optimization problem
#[derive(Debug, Clone, Default)]
pub struct OptimizationProblem {
    pub name: String,
    pub description: String,
    pub objective: ObjectiveFunction,
    pub constraints: Vec<Constraint>,
    pub variables: Vec<Variable>,
    pub solver_config: SolverConfig,
}

impl OptimizationProblem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.solver_config = config;
        self
    }

    /// Declares a variable and returns its handle
    pub fn add_variable(&mut self, variable: Variable) -> VarId {
        self.variables.push(variable);
        VarId(self.variables.len() - 1)
    }

    pub fn variable(&self, id: VarId) -> Option<&Variable> {
        self.variables.get(id.index())
    }

    pub fn set_objective(&mut self, objective: ObjectiveFunction) {
        self.objective = objective;
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn num_integer_variables(&self) -> usize {
        self.variables.iter().filter(|v| v.is_integer()).count()
    }

    pub fn num_binary_variables(&self) -> usize {
        self.variables
            .iter()
            .filter(|v| v.variable_type == VariableType::Binary)
            .count()
    }

    pub fn is_mixed_integer(&self) -> bool {
        self.num_integer_variables() > 0
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.expr.evaluate(values)
    }

    /// Measures how far `values` is from satisfying the problem.
    ///
    /// Bounds count as constraints. A missing value is read as zero.
    pub fn evaluate(&self, values: &[f64]) -> SolutionQuality {
        let mut max_constraint_violation: f64 = 0.0;
        let mut max_integrality_violation: f64 = 0.0;

        for (i, var) in self.variables.iter().enumerate() {
            let value = values.get(i).copied().unwrap_or(0.0);
            max_constraint_violation = max_constraint_violation.max(var.lower_bound - value);
            if let Some(upper) = var.upper_bound {
                max_constraint_violation = max_constraint_violation.max(value - upper);
            }
            if var.is_integer() {
                max_integrality_violation =
                    max_integrality_violation.max((value - value.round()).abs());
            }
        }

        for constraint in &self.constraints {
            max_constraint_violation = max_constraint_violation.max(constraint.violation(values));
        }

        SolutionQuality {
            max_constraint_violation,
            max_integrality_violation,
        }
    }

    /// Constraints violated by more than `tolerance`, for diagnostics
    pub fn violated_constraints<'a>(
        &'a self,
        values: &'a [f64],
        tolerance: f64,
    ) -> impl Iterator<Item = &'a Constraint> + 'a {
        self.constraints
            .iter()
            .filter(move |c| c.violation(values) > tolerance)
    }
}

/// Statistics about the solve process
#[derive(Debug, Clone, Default)]
pub struct SolverStatistics {
    pub solve_time_ms: f64,
    pub num_variables: u32,
    pub num_constraints: u32,
    pub num_integer_vars: u32,
    pub num_binary_vars: u32,
}

impl SolverStatistics {
    pub fn for_problem(problem: &OptimizationProblem, solve_time_ms: f64) -> Self {
        Self {
            solve_time_ms,
            num_variables: problem.num_variables() as u32,
            num_constraints: problem.num_constraints() as u32,
            num_integer_vars: (problem.num_integer_variables() - problem.num_binary_variables())
                as u32,
            num_binary_vars: problem.num_binary_variables() as u32,
        }
    }
}

/// Quality metrics for the solution
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SolutionQuality {
    pub max_constraint_violation: f64,
    pub max_integrality_violation: f64,
}

impl SolutionQuality {
    /// Default tolerance used to accept an incumbent as feasible
    pub const TOLERANCE: f64 = 1e-6;

    pub fn is_feasible(&self, tolerance: f64) -> bool {
        self.max_constraint_violation <= tolerance && self.max_integrality_violation <= tolerance
    }
}

/// Solution to an optimization problem
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolutionStatus,
    pub objective_value: Option<f64>,
    pub variable_values: Vec<f64>,
    pub message: String,
    pub statistics: SolverStatistics,
    pub quality: SolutionQuality,
}

impl Solution {
    pub fn new(status: SolutionStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            objective_value: None,
            variable_values: Vec::new(),
            message: message.into(),
            statistics: SolverStatistics::default(),
            quality: SolutionQuality::default(),
        }
    }

    pub fn optimal(value: f64, variable_values: Vec<f64>) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            objective_value: Some(value),
            variable_values,
            message: "Optimal solution found".to_string(),
            statistics: SolverStatistics::default(),
            quality: SolutionQuality::default(),
        }
    }

    /// Incumbent returned when the time limit stopped the search
    pub fn time_limited(value: f64, variable_values: Vec<f64>) -> Self {
        Self {
            status: SolutionStatus::Feasible,
            objective_value: Some(value),
            variable_values,
            message: "Time limit reached, returning best incumbent".to_string(),
            statistics: SolverStatistics::default(),
            quality: SolutionQuality::default(),
        }
    }

    /// Classifies the values a backend held when it stopped before proving
    /// optimality: a feasible incumbent, or no solution at all.
    pub fn from_incumbent(problem: &OptimizationProblem, variable_values: Vec<f64>) -> Self {
        let quality = problem.evaluate(&variable_values);
        if variable_values.len() == problem.num_variables()
            && quality.is_feasible(SolutionQuality::TOLERANCE)
        {
            let value = problem.objective_value(&variable_values);
            Self::time_limited(value, variable_values).with_quality(quality)
        } else {
            Self::new(
                SolutionStatus::TimeLimit,
                "Time limit reached before any feasible solution was found",
            )
            .with_quality(quality)
        }
    }

    pub fn with_statistics(mut self, statistics: SolverStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn with_quality(mut self, quality: SolutionQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn value(&self, var: VarId) -> f64 {
        self.variable_values
            .get(var.index())
            .copied()
            .unwrap_or(0.0)
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    pub fn is_feasible(&self) -> bool {
        matches!(
            self.status,
            SolutionStatus::Optimal | SolutionStatus::Feasible
        )
    }
}
