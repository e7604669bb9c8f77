// Routing use cases: build a model, hand it to a solver, project the answer

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use super::projector::{self, ArcAssignment, Projection, TimedLeg, VehicleRoute};
use crate::domain::{
    InputError, Network, NodeId, OptimizationProblem, Solution, SolutionStatus, SolverError,
    SolverService, SolverStatistics,
};
use crate::formulation::{ArcVars, CvrpConfig, CvrpModel, VrptwConfig, VrptwModel};

/// Failures that stop a routing solve before an answer exists
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("Invalid input: {0}")]
    Input(#[from] InputError),

    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// How good a returned plan is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteStatus {
    Optimal,
    /// Best incumbent when the time limit stopped the search
    TimeLimited,
}

/// Either a plan or the reason there is none
#[derive(Debug, Clone)]
pub enum SolveOutcome<P> {
    Solved(P),
    NoSolution {
        status: SolutionStatus,
        message: String,
    },
}

impl<P> SolveOutcome<P> {
    pub fn plan(&self) -> Option<&P> {
        match self {
            SolveOutcome::Solved(plan) => Some(plan),
            SolveOutcome::NoSolution { .. } => None,
        }
    }

    pub fn into_plan(self) -> Option<P> {
        match self {
            SolveOutcome::Solved(plan) => Some(plan),
            SolveOutcome::NoSolution { .. } => None,
        }
    }

    pub fn is_solved(&self) -> bool {
        matches!(self, SolveOutcome::Solved(_))
    }
}

/// Routes chosen by the solver
#[derive(Debug, Clone)]
pub struct RoutingPlan {
    pub status: RouteStatus,
    pub objective: f64,
    pub arcs: Vec<ArcAssignment>,
    pub routes: Vec<VehicleRoute>,
    pub statistics: SolverStatistics,
}

impl RoutingPlan {
    fn new(status: RouteStatus, solution: &Solution, projection: Projection) -> Self {
        Self {
            status,
            objective: solution.objective_value.unwrap_or_default(),
            arcs: projection.arcs,
            routes: projection.routes,
            statistics: solution.statistics.clone(),
        }
    }
}

/// Routes plus the service start times on every active arc
#[derive(Debug, Clone)]
pub struct VrptwPlan {
    pub plan: RoutingPlan,
    pub legs: Vec<TimedLeg>,
}

/// Solves routing problems with one solver backend
pub struct RoutingService {
    solver: Arc<dyn SolverService>,
}

impl RoutingService {
    pub fn new(solver: Arc<dyn SolverService>) -> Self {
        Self { solver }
    }

    pub fn solve_cvrp(
        &self,
        network: &Network,
        config: &CvrpConfig,
    ) -> Result<SolveOutcome<RoutingPlan>, RoutingError> {
        let model = CvrpModel::build(network, config)?;
        let solution = self.run(model.problem())?;

        Ok(match classify(&solution) {
            Ok(status) => match project(network, model.arcs(), &solution) {
                Ok(projection) => {
                    SolveOutcome::Solved(RoutingPlan::new(status, &solution, projection))
                }
                Err(outcome) => outcome,
            },
            Err(outcome) => outcome,
        })
    }

    pub fn solve_vrptw(
        &self,
        network: &Network,
        config: &VrptwConfig,
    ) -> Result<SolveOutcome<VrptwPlan>, RoutingError> {
        let model = VrptwModel::build(network, config)?;
        let solution = self.run(model.problem())?;

        Ok(match classify(&solution) {
            Ok(status) => match project(network, model.arcs(), &solution) {
                Ok(projection) => SolveOutcome::Solved(VrptwPlan {
                    plan: RoutingPlan::new(status, &solution, projection),
                    legs: projector::timed_legs(network, &model, &solution),
                }),
                Err(outcome) => outcome,
            },
            Err(outcome) => outcome,
        })
    }

    fn run(&self, problem: &OptimizationProblem) -> Result<Solution, SolverError> {
        info!(
            problem = %problem.name,
            solver = self.solver.name(),
            variables = problem.num_variables(),
            binaries = problem.num_binary_variables(),
            constraints = problem.num_constraints(),
            "submitting model"
        );
        let solution = self.solver.solve(problem)?;
        info!(
            status = %solution.status,
            objective = ?solution.objective_value,
            solve_time_ms = solution.statistics.solve_time_ms,
            "solver finished"
        );
        Ok(solution)
    }
}

fn classify<P>(solution: &Solution) -> Result<RouteStatus, SolveOutcome<P>> {
    match solution.status {
        SolutionStatus::Optimal => Ok(RouteStatus::Optimal),
        SolutionStatus::Feasible => {
            warn!("time limit reached; the plan may not be optimal");
            Ok(RouteStatus::TimeLimited)
        }
        status => Err(SolveOutcome::NoSolution {
            status,
            message: solution.message.clone(),
        }),
    }
}

/// Projects the assignment; arcs that never reach the depot void the plan
fn project<P>(
    network: &Network,
    arcs: &ArcVars,
    solution: &Solution,
) -> Result<Projection, SolveOutcome<P>> {
    let projection = projector::project(network, arcs, solution);
    if projection.detached_cycles.is_empty() {
        return Ok(projection);
    }

    let cycles: Vec<String> = projection
        .detached_cycles
        .iter()
        .map(|cycle| {
            let stops: Vec<&str> = cycle.nodes.iter().map(NodeId::as_str).collect();
            format!("{}: {}", cycle.vehicle, stops.join(" -> "))
        })
        .collect();
    warn!(?cycles, "solver assignment has cycles that never visit the depot");
    Err(SolveOutcome::NoSolution {
        status: solution.status,
        message: format!(
            "assignment rejected, {} cycle(s) never visit the depot",
            cycles.len()
        ),
    })
}
