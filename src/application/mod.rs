// Application layer: routing use cases and table mapping

pub mod mappers;
pub mod projector;
pub mod routing_service;

pub use projector::{ArcAssignment, DetachedCycle, Projection, TimedLeg, VehicleRoute};
pub use routing_service::{
    RouteStatus, RoutingError, RoutingPlan, RoutingService, SolveOutcome, VrptwPlan,
};
