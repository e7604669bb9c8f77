// Mappers: Convert between table rows and domain models
// This keeps the file format isolated from the routing model

use serde::{Deserialize, Serialize};

use super::projector::{ArcAssignment, TimedLeg};
use crate::domain::{InputError, Link, Network, Node, NodeId, TimeWindow};

/// One row of the node table; the first row is the depot
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NodeRow {
    pub id: String,
    pub demand: f64,
    #[serde(default)]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub end_time: Option<f64>,
    #[serde(default)]
    pub service_time: Option<f64>,
}

/// One row of the link table
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinkRow {
    pub from_node_id: String,
    pub to_node_id: String,
    pub link_cost: f64,
    #[serde(default)]
    pub travel_time: Option<f64>,
}

/// Active arc written by the CVRP runner
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArcRow {
    pub from_node_id: String,
    pub to_node_id: String,
    pub vehicle: String,
}

/// Active arc with service start times, written by the VRPTW runner
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegRow {
    pub from_node_id: String,
    pub to_node_id: String,
    pub vehicle: String,
    #[serde(rename = "Ti")]
    pub from_time: f64,
    #[serde(rename = "Tj")]
    pub to_time: f64,
}

/// Convert a node row, ignoring any schedule columns
pub fn row_to_node(row: &NodeRow) -> Node {
    Node::new(row.id.as_str(), row.demand)
}

/// Convert a node row that must carry a time window and a service time
pub fn row_to_timed_node(row: &NodeRow) -> Result<Node, InputError> {
    let id = NodeId::new(row.id.as_str());
    let (earliest, latest) = match (row.start_time, row.end_time) {
        (Some(earliest), Some(latest)) => (earliest, latest),
        _ => return Err(InputError::MissingTimeWindow(id)),
    };
    let window = TimeWindow::new(earliest, latest).ok_or(InputError::InvalidTimeWindow {
        node: id.clone(),
        earliest,
        latest,
    })?;
    let service_time = row
        .service_time
        .ok_or_else(|| InputError::MissingServiceTime(id.clone()))?;

    Ok(Node::new(id, row.demand)
        .with_time_window(window)
        .with_service_time(service_time))
}

/// Convert a link row; the travel time is kept when present
pub fn row_to_link(row: &LinkRow) -> Link {
    let link = Link::new(row.from_node_id.as_str(), row.to_node_id.as_str(), row.link_cost);
    match row.travel_time {
        Some(travel_time) => link.with_travel_time(travel_time),
        None => link,
    }
}

/// Build a CVRP network from table rows
pub fn rows_to_network(nodes: &[NodeRow], links: &[LinkRow]) -> Result<Network, InputError> {
    Network::new(
        nodes.iter().map(row_to_node).collect(),
        links.iter().map(row_to_link).collect(),
    )
}

/// Build a VRPTW network from table rows
pub fn rows_to_timed_network(nodes: &[NodeRow], links: &[LinkRow]) -> Result<Network, InputError> {
    let nodes = nodes
        .iter()
        .map(row_to_timed_node)
        .collect::<Result<Vec<_>, _>>()?;
    Network::new(nodes, links.iter().map(row_to_link).collect())
}

pub fn arc_to_row(arc: &ArcAssignment) -> ArcRow {
    ArcRow {
        from_node_id: arc.from.to_string(),
        to_node_id: arc.to.to_string(),
        vehicle: arc.vehicle.to_string(),
    }
}

pub fn leg_to_row(leg: &TimedLeg) -> LegRow {
    LegRow {
        from_node_id: leg.from.to_string(),
        to_node_id: leg.to.to_string(),
        vehicle: leg.vehicle.to_string(),
        from_time: leg.from_time,
        to_time: leg.to_time,
    }
}
