// Position numbering for customers joined by stationary arcs, i.e. arcs along
// which neither the load (CVRP) nor the clock (VRPTW) has to advance. The
// load and time rows cannot break a cycle made only of such arcs.

use tracing::debug;

use super::index::ArcVars;
use crate::domain::{
    Constraint, Fleet, LinearExpr, Network, OptimizationProblem, VarId, Variable, VehicleId,
};

/// `P[i,k]` in `[1, n]` for the `n` customers touched by a stationary arc,
/// with `P[i,k] + 1 <= P[j,k]` whenever `k` drives a stationary arc `i -> j`.
#[derive(Debug, Clone)]
pub struct StationaryOrder {
    nodes: usize,
    ids: Vec<Option<VarId>>,
}

impl StationaryOrder {
    pub fn declare<F>(
        problem: &mut OptimizationProblem,
        network: &Network,
        fleet: &Fleet,
        x: &ArcVars,
        stationary: F,
    ) -> Self
    where
        F: Fn(usize, usize) -> bool,
    {
        let nodes = network.len();
        let arcs: Vec<(usize, usize)> = network
            .pairs()
            .filter(|&(i, j)| !network.is_depot(i) && !network.is_depot(j))
            .filter(|&(i, j)| network.arc(i, j).is_some() && stationary(i, j))
            .collect();
        if arcs.is_empty() {
            return Self {
                nodes,
                ids: Vec::new(),
            };
        }

        let mut touched = vec![false; nodes];
        for &(i, j) in &arcs {
            touched[i] = true;
            touched[j] = true;
        }
        let span = touched.iter().filter(|&&t| t).count() as f64;

        let mut ids = vec![None; fleet.size() * nodes];
        for k in fleet.vehicles() {
            for i in (0..nodes).filter(|&i| touched[i]) {
                let var = Variable::continuous(format!("P[{},{}]", network.id(i), k))
                    .with_bounds(1.0, Some(span));
                ids[k.index() * nodes + i] = Some(problem.add_variable(var));
            }
        }
        let order = Self { nodes, ids };

        let mut rows = 0usize;
        for k in fleet.vehicles() {
            for &(i, j) in &arcs {
                let (Some(x_ij), Some(p_i), Some(p_j)) = (x.get(i, j, k), order.get(k, i), order.get(k, j))
                else {
                    continue;
                };
                let expr = LinearExpr::new()
                    .plus(p_i, 1.0)
                    .plus(p_j, -1.0)
                    .plus(x_ij, span);
                problem.add_constraint(Constraint::leq(expr, span - 1.0).with_name(format!(
                    "order[{},{},{}]",
                    network.id(i),
                    network.id(j),
                    k
                )));
                rows += 1;
            }
        }
        debug!(arcs = arcs.len(), count = rows, "stationary arc ordering constraints");

        order
    }

    pub fn get(&self, vehicle: VehicleId, node: usize) -> Option<VarId> {
        self.ids
            .get(vehicle.index() * self.nodes + node)
            .copied()
            .flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Numbers the ordered customers of one route in visiting order; those
    /// the route skips get position 1.
    pub fn encode(&self, values: &mut [f64], vehicle: VehicleId, route: &[usize]) {
        for node in 0..self.nodes {
            if let Some(var) = self.get(vehicle, node) {
                values[var.index()] = 1.0;
            }
        }
        let mut position = 0.0;
        for &i in route {
            if let Some(var) = self.get(vehicle, i) {
                position += 1.0;
                values[var.index()] = position;
            }
        }
    }
}
