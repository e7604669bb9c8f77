// Infrastructure: Command runner
// Loads the tables, solves, prints the active arcs and writes the result file

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use super::tables::{self, TableError, TableLayout};
use crate::application::mappers;
use crate::application::{
    ArcAssignment, RoutingError, RoutingPlan, RoutingService, SolveOutcome, VrptwPlan,
};
use crate::domain::SolverService;
use crate::formulation::{CvrpConfig, VrptwConfig};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("cannot write report: {0}")]
    Report(#[from] std::io::Error),
}

impl From<crate::domain::InputError> for RunError {
    fn from(error: crate::domain::InputError) -> Self {
        RunError::Routing(RoutingError::Input(error))
    }
}

/// Input tables, result file and solver of one run
pub struct RunConfig {
    pub nodes: PathBuf,
    pub links: PathBuf,
    /// Result CSV; nothing is written when unset
    pub output: Option<PathBuf>,
    pub solver: Arc<dyn SolverService>,
}

impl RunConfig {
    pub fn new(nodes: PathBuf, links: PathBuf, solver: Arc<dyn SolverService>) -> Self {
        Self {
            nodes,
            links,
            output: None,
            solver,
        }
    }

    pub fn with_output(mut self, output: PathBuf) -> Self {
        self.output = Some(output);
        self
    }
}

pub fn run_cvrp(
    run: RunConfig,
    config: &CvrpConfig,
    out: &mut impl Write,
) -> Result<SolveOutcome<RoutingPlan>, RunError> {
    let nodes = tables::load_nodes(&run.nodes, TableLayout::Cvrp)?;
    let links = tables::load_links(&run.links, TableLayout::Cvrp)?;
    let network = mappers::rows_to_network(&nodes, &links)?;
    info!(
        nodes = network.len(),
        vehicles = config.fleet.size(),
        capacity = config.fleet.capacity(),
        "loaded CVRP instance"
    );

    let service = RoutingService::new(run.solver);
    let outcome = service.solve_cvrp(&network, config)?;
    report_cvrp(&outcome, out)?;

    if let (Some(plan), Some(path)) = (outcome.plan(), &run.output) {
        tables::save_rows(path, plan.arcs.iter().map(mappers::arc_to_row))?;
    }
    Ok(outcome)
}

pub fn run_vrptw(
    run: RunConfig,
    config: &VrptwConfig,
    out: &mut impl Write,
) -> Result<SolveOutcome<VrptwPlan>, RunError> {
    let nodes = tables::load_nodes(&run.nodes, TableLayout::Vrptw)?;
    let links = tables::load_links(&run.links, TableLayout::Vrptw)?;
    let network = mappers::rows_to_timed_network(&nodes, &links)?;
    info!(
        nodes = network.len(),
        vehicles = config.fleet.size(),
        capacity = config.fleet.capacity(),
        "loaded VRPTW instance"
    );

    let service = RoutingService::new(run.solver);
    let outcome = service.solve_vrptw(&network, config)?;
    report_vrptw(&outcome, out)?;

    if let (Some(plan), Some(path)) = (outcome.plan(), &run.output) {
        tables::save_rows(path, plan.legs.iter().map(mappers::leg_to_row))?;
    }
    Ok(outcome)
}

/// Prints `X[i,j,k]=1` per active arc, then `obj:<value>`
pub fn report_cvrp(
    outcome: &SolveOutcome<RoutingPlan>,
    out: &mut impl Write,
) -> std::io::Result<()> {
    match outcome {
        SolveOutcome::Solved(plan) => {
            write_arcs(&plan.arcs, out)?;
            writeln!(out, "obj:{}", plan.objective)?;
            log_routes(plan);
        }
        SolveOutcome::NoSolution { .. } => writeln!(out, "no solution")?,
    }
    Ok(())
}

/// Prints `obj=<value>`, then `X[i,j,k]=1` per active arc
pub fn report_vrptw(outcome: &SolveOutcome<VrptwPlan>, out: &mut impl Write) -> std::io::Result<()> {
    match outcome {
        SolveOutcome::Solved(VrptwPlan { plan, .. }) => {
            writeln!(out, "obj={}", plan.objective)?;
            write_arcs(&plan.arcs, out)?;
            log_routes(plan);
        }
        SolveOutcome::NoSolution { .. } => writeln!(out, "no solution")?,
    }
    Ok(())
}

fn write_arcs(arcs: &[ArcAssignment], out: &mut impl Write) -> std::io::Result<()> {
    for arc in arcs {
        writeln!(out, "X[{},{},{}]=1", arc.from, arc.to, arc.vehicle)?;
    }
    Ok(())
}

fn log_routes(plan: &RoutingPlan) {
    for route in &plan.routes {
        let stops: Vec<&str> = route.stops.iter().map(|id| id.as_str()).collect();
        info!(
            vehicle = %route.vehicle,
            load = route.load,
            cost = route.cost,
            "route {}",
            stops.join(" -> ")
        );
    }
}
