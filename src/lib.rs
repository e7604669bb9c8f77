// Domain layer: MILP model, solver contract and routing data
pub mod domain;

// Formulations: CVRP and VRPTW models built on the domain layer
pub mod formulation;

// Application layer: Routing use cases and result projection
pub mod application;

// Infrastructure layer: External concerns (CSV tables, command runner)
pub mod infrastructure;

// Solver adapters: Concrete implementations of SolverService
pub mod solver;

// Re-export commonly used types
pub use domain::{
    Constraint, ConstraintType, Fleet, InputError, Link, Network, Node, NodeId, ObjectiveFunction,
    OptimizationProblem, OptimizationType, Solution, SolutionStatus, SolverBackend, SolverConfig,
    SolverError, SolverService, TimeWindow, Variable, VariableType, VehicleId,
};

pub use application::{
    RouteStatus, RoutingError, RoutingPlan, RoutingService, SolveOutcome, VrptwPlan,
};

pub use formulation::{BigM, CvrpConfig, MissingArcPolicy, VrptwConfig};

pub use solver::SolverFactory;

#[cfg(feature = "coin_cbc")]
pub use solver::CoinCbcSolver;
#[cfg(feature = "highs")]
pub use solver::HighsSolver;
#[cfg(feature = "microlp")]
pub use solver::MicroLpSolver;
