// Result projection: reads a solver assignment back into routing terms

use crate::domain::{Network, NodeId, Solution, VehicleId};
use crate::formulation::{ArcVars, VrptwModel};

/// Values above this count as a used arc
pub const ACTIVE_THRESHOLD: f64 = 0.5;

/// Vehicle `vehicle` drives `from -> to`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcAssignment {
    pub from: NodeId,
    pub to: NodeId,
    pub vehicle: VehicleId,
}

/// An active arc with the service start times at both ends
#[derive(Debug, Clone, PartialEq)]
pub struct TimedLeg {
    pub from: NodeId,
    pub to: NodeId,
    pub vehicle: VehicleId,
    pub from_time: f64,
    pub to_time: f64,
}

/// Tour of one vehicle, depot first and last
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleRoute {
    pub vehicle: VehicleId,
    pub stops: Vec<NodeId>,
    pub load: f64,
    pub cost: f64,
}

impl VehicleRoute {
    /// Customers in visiting order
    pub fn customers(&self) -> &[NodeId] {
        let len = self.stops.len();
        if len < 2 {
            return &[];
        }
        &self.stops[1..len - 1]
    }
}

/// Active arcs of a vehicle that are not reachable from the depot
#[derive(Debug, Clone, PartialEq)]
pub struct DetachedCycle {
    pub vehicle: VehicleId,
    pub nodes: Vec<NodeId>,
}

/// Everything read back from an arc assignment
#[derive(Debug, Clone, Default)]
pub struct Projection {
    pub arcs: Vec<ArcAssignment>,
    pub routes: Vec<VehicleRoute>,
    pub detached_cycles: Vec<DetachedCycle>,
}

/// Active `(from, to, vehicle)` positions, vehicle-major then origin then
/// destination
fn active_arcs(arcs: &ArcVars, solution: &Solution) -> Vec<(usize, usize, VehicleId)> {
    arcs.iter()
        .filter(|&(_, _, _, var)| solution.value(var) > ACTIVE_THRESHOLD)
        .map(|(i, j, k, _)| (i, j, k))
        .collect()
}

/// Projects the arc variables of a solved model.
pub fn project(network: &Network, arcs: &ArcVars, solution: &Solution) -> Projection {
    let active = active_arcs(arcs, solution);
    let mut projection = Projection {
        arcs: active
            .iter()
            .map(|&(i, j, k)| ArcAssignment {
                from: network.id(i).clone(),
                to: network.id(j).clone(),
                vehicle: k,
            })
            .collect(),
        ..Projection::default()
    };

    for k in 0..arcs.num_vehicles() {
        let vehicle = VehicleId::new(k);
        let mut tours = Tours::new(
            network.len(),
            active
                .iter()
                .filter(|&&(_, _, v)| v == vehicle)
                .map(|&(i, j, _)| (i, j)),
        );

        let depot = network.depot();
        if let Some(stops) = tours.walk(depot) {
            let cost = stops
                .windows(2)
                .filter_map(|leg| network.cost(leg[0], leg[1]))
                .sum();
            let load = stops.iter().map(|&i| network.demand(i)).sum();
            projection.routes.push(VehicleRoute {
                vehicle,
                stops: stops.iter().map(|&i| network.id(i).clone()).collect(),
                load,
                cost,
            });
        }

        while let Some(start) = tours.next_origin() {
            let Some(cycle) = tours.walk(start) else {
                break;
            };
            projection.detached_cycles.push(DetachedCycle {
                vehicle,
                nodes: cycle.iter().map(|&i| network.id(i).clone()).collect(),
            });
        }
    }

    projection
}

/// Timed legs of a solved VRPTW model in enumeration order
pub fn timed_legs(network: &Network, model: &VrptwModel, solution: &Solution) -> Vec<TimedLeg> {
    active_arcs(model.arcs(), solution)
        .into_iter()
        .map(|(i, j, k)| TimedLeg {
            from: network.id(i).clone(),
            to: network.id(j).clone(),
            vehicle: k,
            from_time: solution.value(model.time_var(i, k)),
            to_time: solution.value(model.time_var(j, k)),
        })
        .collect()
}

/// Unconsumed active arcs of one vehicle
struct Tours {
    successors: Vec<Vec<usize>>,
}

impl Tours {
    fn new(nodes: usize, arcs: impl Iterator<Item = (usize, usize)>) -> Self {
        let mut successors = vec![Vec::new(); nodes];
        for (i, j) in arcs {
            successors[i].push(j);
        }
        Self { successors }
    }

    /// Follows and consumes arcs from `start` until it comes back or gets
    /// stuck; the closing node is repeated at the end.
    fn walk(&mut self, start: usize) -> Option<Vec<usize>> {
        let mut stops = vec![start];
        let mut current = start;
        while let Some(next) = self.successors[current].pop() {
            stops.push(next);
            if next == start {
                break;
            }
            current = next;
        }
        (stops.len() > 1).then_some(stops)
    }

    fn next_origin(&self) -> Option<usize> {
        self.successors.iter().position(|out| !out.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Fleet, Link, Node, OptimizationProblem};

    fn triangle() -> Network {
        Network::new(
            vec![Node::new("D", 0.0), Node::new("A", 40.0), Node::new("B", 70.0)],
            vec![
                Link::new("D", "A", 10.0),
                Link::new("A", "D", 10.0),
                Link::new("D", "B", 10.0),
                Link::new("B", "D", 10.0),
                Link::new("A", "B", 5.0),
                Link::new("B", "A", 5.0),
            ],
        )
        .unwrap()
    }

    fn assignment(arcs: &ArcVars, used: &[(usize, usize, usize)], size: usize) -> Solution {
        let mut values = vec![0.0; size];
        for &(i, j, k) in used {
            values[arcs.get(i, j, VehicleId::new(k)).unwrap().index()] = 1.0;
        }
        Solution::optimal(0.0, values)
    }

    fn declare(network: &Network, vehicles: usize) -> (ArcVars, usize) {
        let mut problem = OptimizationProblem::new();
        let fleet = Fleet::new(vehicles, 100.0).unwrap();
        let arcs = ArcVars::declare(&mut problem, network, &fleet);
        (arcs, problem.num_variables())
    }

    #[test]
    fn rebuilds_one_route_per_vehicle() {
        let network = triangle();
        let (arcs, size) = declare(&network, 2);
        let solution = assignment(&arcs, &[(0, 1, 0), (1, 0, 0), (0, 2, 1), (2, 0, 1)], size);

        let projection = project(&network, &arcs, &solution);
        assert_eq!(projection.arcs.len(), 4);
        assert_eq!(projection.arcs[0].from.as_str(), "D");
        assert_eq!(projection.arcs[0].to.as_str(), "A");
        assert_eq!(projection.arcs[0].vehicle, VehicleId::new(0));

        assert_eq!(projection.routes.len(), 2);
        let first = &projection.routes[0];
        assert_eq!(first.customers(), &[NodeId::from("A")]);
        assert_eq!(first.load, 40.0);
        assert_eq!(first.cost, 20.0);
        assert_eq!(projection.routes[1].stops.len(), 3);
        assert!(projection.detached_cycles.is_empty());
    }

    #[test]
    fn follows_multi_stop_tours() {
        let network = triangle();
        let (arcs, size) = declare(&network, 1);
        let solution = assignment(&arcs, &[(0, 1, 0), (1, 2, 0), (2, 0, 0)], size);

        let projection = project(&network, &arcs, &solution);
        let route = &projection.routes[0];
        let stops: Vec<&str> = route.stops.iter().map(NodeId::as_str).collect();
        assert_eq!(stops, ["D", "A", "B", "D"]);
        assert_eq!(route.load, 110.0);
        assert_eq!(route.cost, 25.0);
    }

    #[test]
    fn reports_cycles_that_skip_the_depot() {
        let network = triangle();
        let (arcs, size) = declare(&network, 1);
        let solution = assignment(&arcs, &[(1, 2, 0), (2, 1, 0)], size);

        let projection = project(&network, &arcs, &solution);
        assert!(projection.routes.is_empty());
        assert_eq!(projection.detached_cycles.len(), 1);
        assert_eq!(projection.detached_cycles[0].nodes.len(), 3);
    }

    #[test]
    fn idle_vehicles_have_no_route() {
        let network = triangle();
        let (arcs, size) = declare(&network, 2);
        let solution = assignment(&arcs, &[(0, 1, 1), (1, 2, 1), (2, 0, 1)], size);

        let projection = project(&network, &arcs, &solution);
        assert_eq!(projection.routes.len(), 1);
        assert_eq!(projection.routes[0].vehicle, VehicleId::new(1));
    }

    #[test]
    fn fractional_values_below_threshold_are_ignored() {
        let network = triangle();
        let (arcs, size) = declare(&network, 1);
        let mut values = vec![0.0; size];
        values[arcs.get(0, 1, VehicleId::new(0)).unwrap().index()] = 0.4;
        let solution = Solution::time_limited(0.0, values);

        assert!(project(&network, &arcs, &solution).arcs.is_empty());
    }
}
