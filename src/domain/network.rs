//! Locations, demands, time windows and the links between them.
//!
//! A [`Network`] is built once from node and link records and never mutated.
//! Node positions double as indices into the dense link table; position `0`
//! is always the depot.

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

use super::errors::InputError;

/// Identifier of a node as it appears in the input tables
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Interval in which service at a node may begin.
///
/// # Examples
///
/// ```
/// use vrp_milp::domain::TimeWindow;
///
/// let tw = TimeWindow::new(5.0, 6.0).unwrap();
/// assert!(tw.contains(5.5));
/// assert!(TimeWindow::new(6.0, 5.0).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    earliest: f64,
    latest: f64,
}

impl TimeWindow {
    /// Returns `None` if `earliest > latest`, either end is negative or
    /// non-finite.
    pub fn new(earliest: f64, latest: f64) -> Option<Self> {
        if !earliest.is_finite() || !latest.is_finite() || earliest < 0.0 || earliest > latest {
            return None;
        }
        Some(Self { earliest, latest })
    }

    pub fn earliest(&self) -> f64 {
        self.earliest
    }

    pub fn latest(&self) -> f64 {
        self.latest
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.earliest && time <= self.latest
    }
}

/// A depot or customer
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub demand: f64,
    pub time_window: Option<TimeWindow>,
    pub service_time: f64,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, demand: f64) -> Self {
        Self {
            id: id.into(),
            demand,
            time_window: None,
            service_time: 0.0,
        }
    }

    pub fn with_time_window(mut self, window: TimeWindow) -> Self {
        self.time_window = Some(window);
        self
    }

    pub fn with_service_time(mut self, service_time: f64) -> Self {
        self.service_time = service_time;
        self
    }
}

/// One row of the link table
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub from: NodeId,
    pub to: NodeId,
    pub cost: f64,
    pub travel_time: Option<f64>,
}

impl Link {
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>, cost: f64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            cost,
            travel_time: None,
        }
    }

    pub fn with_travel_time(mut self, travel_time: f64) -> Self {
        self.travel_time = Some(travel_time);
        self
    }
}

/// Cost and travel time of a directed arc
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcData {
    pub cost: f64,
    pub travel_time: Option<f64>,
}

/// Validated node set and dense arc table
#[derive(Debug, Clone)]
pub struct Network {
    nodes: Vec<Node>,
    index: HashMap<NodeId, usize>,
    arcs: Vec<Option<ArcData>>,
}

impl Network {
    /// The depot is the first node of `nodes`.
    ///
    /// Links from a node to itself are ignored.
    pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> Result<Self, InputError> {
        if nodes.is_empty() {
            return Err(InputError::NoNodes);
        }
        if nodes.len() < 2 {
            return Err(InputError::NoCustomers {
                depot: nodes[0].id.clone(),
            });
        }

        let mut index = HashMap::with_capacity(nodes.len());
        for (position, node) in nodes.iter().enumerate() {
            validate_node(node)?;
            if index.insert(node.id.clone(), position).is_some() {
                return Err(InputError::DuplicateNode(node.id.clone()));
            }
        }

        let n = nodes.len();
        let mut arcs = vec![None; n * n];
        for link in links {
            let lookup = |id: &NodeId| {
                index.get(id).copied().ok_or_else(|| InputError::UnknownNode {
                    from: link.from.clone(),
                    to: link.to.clone(),
                    unknown: id.clone(),
                })
            };
            let i = lookup(&link.from)?;
            let j = lookup(&link.to)?;
            if i == j {
                continue;
            }

            validate_link(&link)?;
            let slot = &mut arcs[i * n + j];
            if slot.is_some() {
                return Err(InputError::DuplicateLink {
                    from: link.from,
                    to: link.to,
                });
            }
            *slot = Some(ArcData {
                cost: link.cost,
                travel_time: link.travel_time,
            });
        }

        Ok(Self { nodes, index, arcs })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn depot(&self) -> usize {
        0
    }

    /// Positions of all customers
    pub fn customers(&self) -> Range<usize> {
        1..self.nodes.len()
    }

    pub fn num_customers(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_depot(&self, position: usize) -> bool {
        position == 0
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, position: usize) -> &Node {
        &self.nodes[position]
    }

    pub fn id(&self, position: usize) -> &NodeId {
        &self.nodes[position].id
    }

    pub fn position(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Demand of a node; the depot never carries any
    pub fn demand(&self, position: usize) -> f64 {
        if self.is_depot(position) {
            0.0
        } else {
            self.nodes[position].demand
        }
    }

    pub fn arc(&self, from: usize, to: usize) -> Option<&ArcData> {
        self.arcs[from * self.nodes.len() + to].as_ref()
    }

    pub fn cost(&self, from: usize, to: usize) -> Option<f64> {
        self.arc(from, to).map(|a| a.cost)
    }

    pub fn travel_time(&self, from: usize, to: usize) -> Option<f64> {
        self.arc(from, to).and_then(|a| a.travel_time)
    }

    /// Every ordered pair of distinct positions
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.nodes.len();
        (0..n).flat_map(move |i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
    }

    /// Ordered pairs of distinct positions without a link
    pub fn missing_arcs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.pairs().filter(|&(i, j)| self.arc(i, j).is_none())
    }

    pub fn total_demand(&self) -> f64 {
        self.customers().map(|i| self.demand(i)).sum()
    }
}

fn validate_node(node: &Node) -> Result<(), InputError> {
    let invalid = |field, value| InputError::InvalidNodeValue {
        node: node.id.clone(),
        field,
        value,
    };
    if !node.demand.is_finite() || node.demand < 0.0 {
        return Err(invalid("demand", node.demand));
    }
    if !node.service_time.is_finite() || node.service_time < 0.0 {
        return Err(invalid("service time", node.service_time));
    }
    Ok(())
}

fn validate_link(link: &Link) -> Result<(), InputError> {
    let invalid = |field, value| InputError::InvalidLinkValue {
        from: link.from.clone(),
        to: link.to.clone(),
        field,
        value,
    };
    if !link.cost.is_finite() || link.cost < 0.0 {
        return Err(invalid("cost", link.cost));
    }
    if let Some(travel_time) = link.travel_time {
        if !travel_time.is_finite() || travel_time < 0.0 {
            return Err(invalid("travel time", travel_time));
        }
    }
    Ok(())
}
