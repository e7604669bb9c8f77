// Infrastructure layer: CSV tables and the command runner

pub mod runner;
pub mod tables;

pub use runner::{run_cvrp, run_vrptw, RunConfig, RunError};
pub use tables::{TableError, TableLayout};
