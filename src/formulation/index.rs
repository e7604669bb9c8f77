// Composite-key tables from (node, node, vehicle) and (vehicle, node) to model handles

use crate::domain::{Fleet, Network, OptimizationProblem, VarId, Variable, VehicleId};

/// Arc-use variables `X[i,j,k]`, defined only for `i != j` and only for
/// arcs the network can actually travel.
#[derive(Debug, Clone)]
pub struct ArcVars {
    nodes: usize,
    vehicles: usize,
    ids: Vec<Option<VarId>>,
}

impl ArcVars {
    pub fn declare(problem: &mut OptimizationProblem, network: &Network, fleet: &Fleet) -> Self {
        let nodes = network.len();
        let vehicles = fleet.size();
        let mut ids = vec![None; vehicles * nodes * nodes];

        for k in fleet.vehicles() {
            for (i, j) in network.pairs() {
                if network.arc(i, j).is_none() {
                    continue;
                }
                let name = format!("X[{},{},{}]", network.id(i), network.id(j), k);
                ids[(k.index() * nodes + i) * nodes + j] =
                    Some(problem.add_variable(Variable::binary(name)));
            }
        }

        Self {
            nodes,
            vehicles,
            ids,
        }
    }

    pub fn get(&self, from: usize, to: usize, vehicle: VehicleId) -> Option<VarId> {
        self.ids[(vehicle.index() * self.nodes + from) * self.nodes + to]
    }

    /// All declared variables, vehicle-major then origin then destination
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, VehicleId, VarId)> + '_ {
        let n = self.nodes;
        self.ids.iter().enumerate().filter_map(move |(slot, id)| {
            id.map(|var| {
                let k = slot / (n * n);
                let i = (slot / n) % n;
                let j = slot % n;
                (i, j, VehicleId::new(k), var)
            })
        })
    }

    pub fn outgoing(&self, from: usize, vehicle: VehicleId) -> impl Iterator<Item = (usize, VarId)> + '_ {
        (0..self.nodes).filter_map(move |to| self.get(from, to, vehicle).map(|var| (to, var)))
    }

    pub fn incoming(&self, to: usize, vehicle: VehicleId) -> impl Iterator<Item = (usize, VarId)> + '_ {
        (0..self.nodes).filter_map(move |from| self.get(from, to, vehicle).map(|var| (from, var)))
    }

    pub fn len(&self) -> usize {
        self.ids.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_vehicles(&self) -> usize {
        self.vehicles
    }
}

/// One variable per (vehicle, node) pair
#[derive(Debug, Clone)]
pub struct NodeVars {
    nodes: usize,
    ids: Vec<VarId>,
}

impl NodeVars {
    pub fn declare<F>(
        problem: &mut OptimizationProblem,
        network: &Network,
        fleet: &Fleet,
        mut make: F,
    ) -> Self
    where
        F: FnMut(VehicleId, usize) -> Variable,
    {
        let nodes = network.len();
        let mut ids = Vec::with_capacity(fleet.size() * nodes);
        for k in fleet.vehicles() {
            for i in 0..nodes {
                ids.push(problem.add_variable(make(k, i)));
            }
        }
        Self { nodes, ids }
    }

    pub fn get(&self, vehicle: VehicleId, node: usize) -> VarId {
        self.ids[vehicle.index() * self.nodes + node]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Link, Node};

    fn network() -> Network {
        Network::new(
            vec![Node::new("D", 0.0), Node::new("A", 1.0), Node::new("B", 1.0)],
            vec![
                Link::new("D", "A", 1.0),
                Link::new("A", "B", 1.0),
                Link::new("B", "D", 1.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn arc_vars_skip_untravelable_arcs() {
        let network = network();
        let fleet = Fleet::new(2, 10.0).unwrap();
        let mut problem = OptimizationProblem::new();
        let x = ArcVars::declare(&mut problem, &network, &fleet);

        assert_eq!(x.len(), 6);
        assert!(x.get(0, 1, VehicleId::new(1)).is_some());
        assert!(x.get(1, 0, VehicleId::new(1)).is_none());
        assert_eq!(
            problem.variable(x.get(0, 1, VehicleId::new(1)).unwrap()).unwrap().name,
            "X[D,A,v1]"
        );
    }

    #[test]
    fn arc_vars_iterate_vehicle_major() {
        let network = network();
        let fleet = Fleet::new(2, 10.0).unwrap();
        let mut problem = OptimizationProblem::new();
        let x = ArcVars::declare(&mut problem, &network, &fleet);

        let order: Vec<_> = x.iter().map(|(i, j, k, _)| (k.index(), i, j)).collect();
        assert_eq!(
            order,
            vec![(0, 0, 1), (0, 1, 2), (0, 2, 0), (1, 0, 1), (1, 1, 2), (1, 2, 0)]
        );
        let out: Vec<_> = x.outgoing(1, VehicleId::new(0)).map(|(j, _)| j).collect();
        assert_eq!(out, vec![2]);
        let inc: Vec<_> = x.incoming(0, VehicleId::new(0)).map(|(i, _)| i).collect();
        assert_eq!(inc, vec![2]);
    }

    #[test]
    fn node_vars_cover_every_vehicle_node_pair() {
        let network = network();
        let fleet = Fleet::new(2, 10.0).unwrap();
        let mut problem = OptimizationProblem::new();
        let y = NodeVars::declare(&mut problem, &network, &fleet, |k, i| {
            Variable::binary(format!("Y[{},{}]", k, i))
        });

        assert_eq!(problem.num_variables(), 6);
        let last = y.get(VehicleId::new(1), 2);
        assert_eq!(problem.variable(last).unwrap().name, "Y[v1,2]");
    }
}
