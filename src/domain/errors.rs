// Input malformation detected before any model is built

use super::network::NodeId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("node table is empty")]
    NoNodes,

    #[error("network has a depot ({depot}) but no customers")]
    NoCustomers { depot: NodeId },

    #[error("duplicate node id '{0}'")]
    DuplicateNode(NodeId),

    #[error("node '{node}' has an invalid {field}: {value}")]
    InvalidNodeValue {
        node: NodeId,
        field: &'static str,
        value: f64,
    },

    #[error("node '{node}' has start time {earliest} after end time {latest}")]
    InvalidTimeWindow {
        node: NodeId,
        earliest: f64,
        latest: f64,
    },

    #[error("node '{0}' has no time window")]
    MissingTimeWindow(NodeId),

    #[error("node '{0}' has no service time")]
    MissingServiceTime(NodeId),

    #[error("link {from} -> {to} references unknown node '{unknown}'")]
    UnknownNode {
        from: NodeId,
        to: NodeId,
        unknown: NodeId,
    },

    #[error("link {from} -> {to} is defined more than once")]
    DuplicateLink { from: NodeId, to: NodeId },

    #[error("link {from} -> {to} has an invalid {field}: {value}")]
    InvalidLinkValue {
        from: NodeId,
        to: NodeId,
        field: &'static str,
        value: f64,
    },

    #[error("no link from {from} to {to}")]
    MissingLink { from: NodeId, to: NodeId },

    #[error("link {from} -> {to} has no travel time")]
    MissingTravelTime { from: NodeId, to: NodeId },

    #[error("fleet must have at least one vehicle")]
    EmptyFleet,

    #[error("vehicle capacity must be finite and non-negative, got {0}")]
    InvalidCapacity(f64),

    #[error("big-M must be finite and positive, got {0}")]
    InvalidBigM(f64),

    #[error("time limit must be a finite, positive number of seconds, got {0}")]
    InvalidTimeLimit(f64),
}
