// Domain module: generic MILP model, solver contract and routing data

pub mod errors;
pub mod fleet;
pub mod models;
pub mod network;
pub mod solver_service;
pub mod value_objects;

pub use errors::*;
pub use fleet::*;
pub use models::*;
pub use network::*;
pub use solver_service::*;
pub use value_objects::*;
