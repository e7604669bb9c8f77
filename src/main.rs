use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;

use vrp_milp::domain::{Fleet, SolverBackend, SolverConfig};
use vrp_milp::formulation::{BigM, CvrpConfig, MissingArcPolicy, VrptwConfig};
use vrp_milp::infrastructure::{run_cvrp, run_vrptw, RunConfig};
use vrp_milp::solver::SolverFactory;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Capacitated VRP
    Cvrp {
        #[command(flatten)]
        common: CommonArgs,

        #[arg(long, default_value_t = 20)]
        vehicles: usize,

        #[arg(long, default_value_t = 100.0)]
        capacity: f64,

        /// CSV of active arcs (from_node_id,to_node_id,vehicle)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// VRP with time windows
    Vrptw {
        #[command(flatten)]
        common: CommonArgs,

        #[arg(long, default_value_t = 15)]
        vehicles: usize,

        #[arg(long, default_value_t = 80.0)]
        capacity: f64,

        /// Fixed big-M for time propagation; derived per arc when omitted
        #[arg(long)]
        big_m: Option<f64>,

        /// CSV of timed legs (from_node_id,to_node_id,vehicle,Ti,Tj)
        #[arg(short, long, default_value = "results.csv")]
        output: PathBuf,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Node table, first row is the depot
    #[arg(long)]
    nodes: PathBuf,

    /// Link table
    #[arg(long)]
    links: PathBuf,

    /// Solver time limit in seconds
    #[arg(long, default_value_t = 300.0, value_parser = positive_seconds)]
    time_limit: f64,

    /// MILP backend; `auto` only picks one that honors the time limit
    #[arg(long, value_enum, default_value_t = SolverArg::Auto)]
    solver: SolverArg,

    /// Relative MIP gap at which the search stops
    #[arg(long)]
    gap: Option<f64>,

    /// Show the solver's own log
    #[arg(long)]
    verbose: bool,

    /// Let vehicles stay at the depot instead of forcing every one out
    #[arg(long)]
    allow_idle_vehicles: bool,

    #[arg(long, value_enum, default_value_t = MissingArcsArg::Reject)]
    missing_arcs: MissingArcsArg,
}

impl CommonArgs {
    fn solver_config(&self) -> SolverConfig {
        SolverConfig {
            backend: self.solver.into(),
            time_limit: Some(self.time_limit),
            gap_tolerance: self.gap,
            verbose: self.verbose,
        }
    }

    fn run_config(&self, output: Option<PathBuf>) -> anyhow::Result<RunConfig> {
        let solver = SolverFactory::create_solver(&self.solver_config())?;
        info!(solver = solver.name(), "using solver");
        let run = RunConfig::new(self.nodes.clone(), self.links.clone(), solver);
        Ok(match output {
            Some(path) => run.with_output(path),
            None => run,
        })
    }
}

fn positive_seconds(arg: &str) -> Result<f64, String> {
    let seconds: f64 = arg.parse().map_err(|e| format!("{}", e))?;
    if seconds.is_finite() && seconds > 0.0 {
        Ok(seconds)
    } else {
        Err(format!("expected a positive number of seconds, got {}", arg))
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SolverArg {
    Auto,
    Cbc,
    Highs,
    Microlp,
}

impl From<SolverArg> for SolverBackend {
    fn from(arg: SolverArg) -> Self {
        match arg {
            SolverArg::Auto => SolverBackend::Auto,
            SolverArg::Cbc => SolverBackend::CoinCbc,
            SolverArg::Highs => SolverBackend::Highs,
            SolverArg::Microlp => SolverBackend::MicroLp,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MissingArcsArg {
    Reject,
    Forbid,
}

impl From<MissingArcsArg> for MissingArcPolicy {
    fn from(arg: MissingArcsArg) -> Self {
        match arg {
            MissingArcsArg::Reject => MissingArcPolicy::Reject,
            MissingArcsArg::Forbid => MissingArcPolicy::Forbid,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(io::stderr)
        .init();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Cvrp {
            common,
            vehicles,
            capacity,
            output,
        } => {
            let config = CvrpConfig::new(Fleet::new(vehicles, capacity)?)
                .with_force_all_vehicles(!common.allow_idle_vehicles)
                .with_missing_arcs(common.missing_arcs.into())
                .with_solver(common.solver_config());
            run_cvrp(common.run_config(output)?, &config, &mut out)
                .context("CVRP run failed")?;
        }
        Commands::Vrptw {
            common,
            vehicles,
            capacity,
            big_m,
            output,
        } => {
            let config = VrptwConfig::new(Fleet::new(vehicles, capacity)?)
                .with_force_all_vehicles(!common.allow_idle_vehicles)
                .with_big_m(big_m.map_or(BigM::Derived, BigM::Fixed))
                .with_missing_arcs(common.missing_arcs.into())
                .with_solver(common.solver_config());
            run_vrptw(common.run_config(Some(output))?, &config, &mut out)
                .context("VRPTW run failed")?;
        }
    }

    out.flush()?;
    Ok(())
}
