// Domain value objects shared by the MILP model and the routing formulations

use std::fmt;

/// Domain of a decision variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    Continuous,
    Integer,
    /// Integer restricted to 0 or 1
    Binary,
}

/// Sense of a linear constraint `expr (<=|=|>=) bound`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintType {
    LessThanOrEqual,
    Equal,
    GreaterThanOrEqual,
}

impl ConstraintType {
    /// Amount by which `lhs` misses `bound`, zero when satisfied
    pub fn violation(&self, lhs: f64, bound: f64) -> f64 {
        match self {
            ConstraintType::LessThanOrEqual => (lhs - bound).max(0.0),
            ConstraintType::Equal => (lhs - bound).abs(),
            ConstraintType::GreaterThanOrEqual => (bound - lhs).max(0.0),
        }
    }
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintType::LessThanOrEqual => write!(f, "<="),
            ConstraintType::Equal => write!(f, "="),
            ConstraintType::GreaterThanOrEqual => write!(f, ">="),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationType {
    Minimize,
    Maximize,
}

/// Status reported by a solver backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// Proven optimal
    Optimal,
    /// Time limit reached with a feasible incumbent (may not be optimal)
    Feasible,
    Infeasible,
    Unbounded,
    /// Time limit reached before any incumbent was found
    TimeLimit,
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionStatus::Optimal => write!(f, "Optimal"),
            SolutionStatus::Feasible => write!(f, "Feasible"),
            SolutionStatus::Infeasible => write!(f, "Infeasible"),
            SolutionStatus::Unbounded => write!(f, "Unbounded"),
            SolutionStatus::TimeLimit => write!(f, "Time Limit Reached"),
        }
    }
}

/// Solver backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolverBackend {
    /// Best backend compiled into this build
    #[default]
    Auto,
    /// COIN-OR CBC through good_lp
    CoinCbc,
    /// HiGHS
    Highs,
    /// Pure Rust MicroLP through good_lp
    MicroLp,
}

impl fmt::Display for SolverBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverBackend::Auto => write!(f, "Auto"),
            SolverBackend::CoinCbc => write!(f, "COIN-OR CBC"),
            SolverBackend::Highs => write!(f, "HiGHS"),
            SolverBackend::MicroLp => write!(f, "MicroLP"),
        }
    }
}
