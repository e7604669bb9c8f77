//! Capacitated VRP as a three-index flow model with MTZ load ordering.
//!
//! Variables:
//! * `X[i,j,k]` binary, vehicle `k` drives `i -> j`
//! * `Y[k,i]` binary, vehicle `k` serves node `i`
//! * `U[k,i]` continuous, load aboard `k` right after serving `i`
//!
//! The load variables grow by the demand of every customer entered along a
//! customer-to-customer arc, so a cycle that never touches the depot has no
//! consistent load assignment. Arcs entering a zero-demand customer leave the
//! load unchanged; those customers also get a position `P[i,k]` that must
//! grow along every such arc.

use tracing::{debug, info};

use super::index::{ArcVars, NodeVars};
use super::ordering::StationaryOrder;
use super::{check_arcs, check_solver, MissingArcPolicy, DEFAULT_TIME_LIMIT_SECS};
use crate::domain::{
    Constraint, Fleet, InputError, LinearExpr, Network, ObjectiveFunction, OptimizationProblem,
    SolverConfig, VarId, Variable, VehicleId,
};

/// Parameters of a CVRP solve
#[derive(Debug, Clone)]
pub struct CvrpConfig {
    pub fleet: Fleet,
    /// Every vehicle leaves the depot once when `true`; otherwise the fleet
    /// size is an upper bound
    pub force_all_vehicles: bool,
    pub missing_arcs: MissingArcPolicy,
    pub solver: SolverConfig,
}

impl CvrpConfig {
    pub fn new(fleet: Fleet) -> Self {
        Self {
            fleet,
            force_all_vehicles: true,
            missing_arcs: MissingArcPolicy::default(),
            solver: SolverConfig {
                time_limit: Some(DEFAULT_TIME_LIMIT_SECS),
                ..SolverConfig::default()
            },
        }
    }

    pub fn with_force_all_vehicles(mut self, force: bool) -> Self {
        self.force_all_vehicles = force;
        self
    }

    pub fn with_missing_arcs(mut self, policy: MissingArcPolicy) -> Self {
        self.missing_arcs = policy;
        self
    }

    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }
}

/// A built CVRP model and its variable tables
#[derive(Debug, Clone)]
pub struct CvrpModel {
    problem: OptimizationProblem,
    fleet: Fleet,
    x: ArcVars,
    y: NodeVars,
    u: NodeVars,
    order: StationaryOrder,
}

impl CvrpModel {
    pub fn build(network: &Network, config: &CvrpConfig) -> Result<Self, InputError> {
        check_arcs(network, config.missing_arcs)?;
        check_solver(&config.solver)?;

        let fleet = config.fleet;
        let cap = fleet.capacity();
        let depot = network.depot();

        let mut problem = OptimizationProblem::new()
            .with_name("cvrp")
            .with_description(format!(
                "{} customers, {} vehicles of capacity {}",
                network.num_customers(),
                fleet.size(),
                cap
            ))
            .with_config(config.solver.clone());

        let x = ArcVars::declare(&mut problem, network, &fleet);
        let y = NodeVars::declare(&mut problem, network, &fleet, |k, i| {
            Variable::binary(format!("Y[{},{}]", k, network.id(i)))
        });
        let u = NodeVars::declare(&mut problem, network, &fleet, |k, i| {
            Variable::continuous(format!("U[{},{}]", k, network.id(i)))
        });

        problem.set_objective(ObjectiveFunction::minimize(
            x.iter()
                .map(|(i, j, _, var)| (var, network.cost(i, j).unwrap_or_default()))
                .collect(),
        ));

        for i in network.customers() {
            let served: LinearExpr = fleet.vehicles().map(|k| (y.get(k, i), 1.0)).collect();
            problem.add_constraint(
                Constraint::eq(served, 1.0).with_name(format!("coverage[{}]", network.id(i))),
            );
        }
        debug!(count = network.num_customers(), "coverage constraints");

        let departures: LinearExpr = fleet.vehicles().map(|k| (y.get(k, depot), 1.0)).collect();
        let fleet_size = fleet.size() as f64;
        problem.add_constraint(
            if config.force_all_vehicles {
                Constraint::eq(departures, fleet_size)
            } else {
                Constraint::leq(departures, fleet_size)
            }
            .with_name("fleet"),
        );

        for k in fleet.vehicles() {
            for i in 0..network.len() {
                let mut balance = LinearExpr::new();
                let mut linkage = LinearExpr::new();
                for (_, var) in x.outgoing(i, k) {
                    balance.add(var, 1.0);
                    linkage.add(var, 1.0);
                }
                for (_, var) in x.incoming(i, k) {
                    balance.add(var, -1.0);
                }
                linkage.add(y.get(k, i), -1.0);

                let at = format!("{},{}", network.id(i), k);
                problem.add_constraint(Constraint::eq(balance, 0.0).with_name(format!("flow[{}]", at)));
                problem.add_constraint(Constraint::eq(linkage, 0.0).with_name(format!("link[{}]", at)));
            }
        }
        debug!(count = 2 * fleet.size() * network.len(), "flow and linkage constraints");

        for k in fleet.vehicles() {
            let load: LinearExpr = network
                .customers()
                .map(|i| (y.get(k, i), network.demand(i)))
                .collect();
            problem.add_constraint(Constraint::leq(load, cap).with_name(format!("capacity[{}]", k)));
        }

        let mut ordering = 0usize;
        for k in fleet.vehicles() {
            for i in network.customers() {
                let u_i = u.get(k, i);
                let q_i = network.demand(i);
                let at = format!("{},{}", network.id(i), k);
                problem.add_constraint(
                    Constraint::geq(LinearExpr::new().plus(u_i, 1.0), q_i)
                        .with_name(format!("load_min[{}]", at)),
                );
                problem.add_constraint(
                    Constraint::leq(LinearExpr::new().plus(u_i, 1.0), cap)
                        .with_name(format!("load_max[{}]", at)),
                );

                for j in network.customers() {
                    let Some(x_ij) = x.get(i, j, k) else {
                        continue;
                    };
                    // U[k,j] >= U[k,i] + Q[j] whenever k drives i -> j
                    let expr = LinearExpr::new()
                        .plus(u_i, 1.0)
                        .plus(u.get(k, j), -1.0)
                        .plus(x_ij, cap);
                    problem.add_constraint(
                        Constraint::leq(expr, cap - network.demand(j)).with_name(format!(
                            "mtz[{},{},{}]",
                            network.id(i),
                            network.id(j),
                            k
                        )),
                    );
                    ordering += 1;
                }
            }
        }
        debug!(count = ordering, "subtour elimination constraints");

        let order = StationaryOrder::declare(&mut problem, network, &fleet, &x, |_, j| {
            network.demand(j) <= 0.0
        });

        info!(
            variables = problem.num_variables(),
            constraints = problem.num_constraints(),
            "built CVRP model: {}",
            problem.description
        );

        Ok(Self {
            problem,
            fleet,
            x,
            y,
            u,
            order,
        })
    }

    pub fn problem(&self) -> &OptimizationProblem {
        &self.problem
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    pub fn arcs(&self) -> &ArcVars {
        &self.x
    }

    pub fn arc_var(&self, from: usize, to: usize, vehicle: VehicleId) -> Option<VarId> {
        self.x.get(from, to, vehicle)
    }

    pub fn assign_var(&self, vehicle: VehicleId, node: usize) -> VarId {
        self.y.get(vehicle, node)
    }

    pub fn load_var(&self, vehicle: VehicleId, node: usize) -> VarId {
        self.u.get(vehicle, node)
    }

    /// Position of a zero-demand customer, when it has one
    pub fn order_var(&self, vehicle: VehicleId, node: usize) -> Option<VarId> {
        self.order.get(vehicle, node)
    }

    /// Encodes a routing plan as a variable assignment.
    ///
    /// `routes[k]` lists the customer positions vehicle `k` visits in order;
    /// an empty route leaves the vehicle at the depot. Arcs the model does
    /// not declare are skipped. Customers not served by a vehicle get the
    /// full capacity as their load on it, which keeps the ordering
    /// constraints of unused arcs slack.
    pub fn encode_routes(&self, network: &Network, routes: &[Vec<usize>]) -> Vec<f64> {
        let mut values = vec![0.0; self.problem.num_variables()];
        let cap = self.fleet.capacity();
        let depot = network.depot();

        for k in self.fleet.vehicles() {
            for i in network.customers() {
                values[self.u.get(k, i).index()] = cap;
            }
            let route = routes.get(k.index()).map(Vec::as_slice).unwrap_or_default();
            self.order.encode(&mut values, k, route);
            if route.is_empty() {
                continue;
            }

            values[self.y.get(k, depot).index()] = 1.0;
            let mut load = 0.0;
            let mut previous = depot;
            for &i in route {
                load += network.demand(i);
                values[self.y.get(k, i).index()] = 1.0;
                values[self.u.get(k, i).index()] = load;
                if let Some(var) = self.x.get(previous, i, k) {
                    values[var.index()] = 1.0;
                }
                previous = i;
            }
            if let Some(var) = self.x.get(previous, depot, k) {
                values[var.index()] = 1.0;
            }
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Link, Node, SolutionQuality};

    fn scenario() -> Network {
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

    fn config(vehicles: usize, capacity: f64) -> CvrpConfig {
        CvrpConfig::new(Fleet::new(vehicles, capacity).unwrap())
    }

    #[test]
    fn declares_three_index_variables() {
        let network = scenario();
        let model = CvrpModel::build(&network, &config(2, 100.0)).unwrap();
        let problem = model.problem();

        // X: 3*2 arcs * 2 vehicles, Y and U: 3 nodes * 2 vehicles each
        assert_eq!(problem.num_variables(), 12 + 6 + 6);
        assert_eq!(problem.num_binary_variables(), 18);
        assert!(model.arc_var(1, 1, VehicleId::new(0)).is_none());
        assert_eq!(problem.solver_config.time_limit, Some(DEFAULT_TIME_LIMIT_SECS));
    }

    #[test]
    fn separate_round_trips_satisfy_every_constraint() {
        let network = scenario();
        let model = CvrpModel::build(&network, &config(2, 100.0)).unwrap();
        let values = model.encode_routes(&network, &[vec![1], vec![2]]);

        let quality = model.problem().evaluate(&values);
        assert!(quality.is_feasible(SolutionQuality::TOLERANCE), "{:?}", quality);
        assert_eq!(model.problem().objective_value(&values), 40.0);
    }

    #[test]
    fn shared_route_breaks_capacity() {
        let network = scenario();
        let model = CvrpModel::build(&network, &config(2, 100.0)).unwrap();
        let values = model.encode_routes(&network, &[vec![1, 2], vec![]]);

        let violated: Vec<_> = model
            .problem()
            .violated_constraints(&values, 1e-9)
            .map(|c| c.name.clone())
            .collect();
        assert!(violated.contains(&"capacity[v0]".to_string()));
        // the idle second vehicle also breaks the forced fleet size
        assert!(violated.contains(&"fleet".to_string()));
    }

    #[test]
    fn idle_vehicles_are_allowed_when_not_forced() {
        let network = scenario();
        let model = CvrpModel::build(
            &network,
            &config(3, 200.0).with_force_all_vehicles(false),
        )
        .unwrap();
        let values = model.encode_routes(&network, &[vec![2, 1], vec![], vec![]]);

        let quality = model.problem().evaluate(&values);
        assert!(quality.is_feasible(SolutionQuality::TOLERANCE), "{:?}", quality);
        assert_eq!(model.problem().objective_value(&values), 25.0);
    }

    #[test]
    fn detached_customer_cycle_violates_load_ordering() {
        let network = scenario();
        let model = CvrpModel::build(
            &network,
            &config(1, 200.0).with_force_all_vehicles(false),
        )
        .unwrap();
        let k = VehicleId::new(0);

        // A <-> B without the depot, every other constraint satisfied
        let mut values = vec![0.0; model.problem().num_variables()];
        for (i, j) in [(1, 2), (2, 1)] {
            values[model.arc_var(i, j, k).unwrap().index()] = 1.0;
        }
        for i in [1, 2] {
            values[model.assign_var(k, i).index()] = 1.0;
        }
        values[model.load_var(k, 1).index()] = 40.0;
        values[model.load_var(k, 2).index()] = 110.0;

        let violated: Vec<_> = model
            .problem()
            .violated_constraints(&values, 1e-9)
            .map(|c| c.name.clone())
            .collect();
        assert_eq!(violated, vec!["mtz[B,A,v0]".to_string()]);
    }

    /// D, A(0), B(0), C(10); A-B and D-C cost 1, every other link 100
    fn zero_demand_pair() -> Network {
        let ids = ["D", "A", "B", "C"];
        let mut links = Vec::new();
        for from in ids {
            for to in ids {
                if from == to {
                    continue;
                }
                let cheap = matches!((from, to), ("A", "B") | ("B", "A") | ("D", "C") | ("C", "D"));
                links.push(Link::new(from, to, if cheap { 1.0 } else { 100.0 }));
            }
        }
        Network::new(
            vec![
                Node::new("D", 0.0),
                Node::new("A", 0.0),
                Node::new("B", 0.0),
                Node::new("C", 10.0),
            ],
            links,
        )
        .unwrap()
    }

    #[test]
    fn zero_demand_cycle_breaks_the_position_ordering() {
        let network = zero_demand_pair();
        let model = CvrpModel::build(&network, &config(1, 100.0)).unwrap();
        let k = VehicleId::new(0);

        // D -> C -> D plus A <-> B, with loads that satisfy every MTZ row
        let mut values = model.encode_routes(&network, &[vec![3]]);
        for (i, j) in [(1, 2), (2, 1)] {
            values[model.arc_var(i, j, k).unwrap().index()] = 1.0;
        }
        for i in [1, 2] {
            values[model.assign_var(k, i).index()] = 1.0;
        }
        values[model.order_var(k, 1).unwrap().index()] = 1.0;
        values[model.order_var(k, 2).unwrap().index()] = 2.0;

        let violated: Vec<_> = model
            .problem()
            .violated_constraints(&values, 1e-9)
            .map(|c| c.name.clone())
            .collect();
        assert_eq!(violated, vec!["order[B,A,v0]".to_string()]);
    }

    #[test]
    fn zero_demand_customers_fit_on_a_real_route() {
        let network = zero_demand_pair();
        let model = CvrpModel::build(&network, &config(1, 100.0)).unwrap();
        assert!(model.order_var(VehicleId::new(0), 3).is_some());

        let values = model.encode_routes(&network, &[vec![3, 1, 2]]);
        let quality = model.problem().evaluate(&values);
        assert!(quality.is_feasible(SolutionQuality::TOLERANCE), "{:?}", quality);
        assert_eq!(model.problem().objective_value(&values), 202.0);
    }

    #[test]
    fn positive_demands_need_no_positions() {
        let network = scenario();
        let model = CvrpModel::build(&network, &config(2, 100.0)).unwrap();
        assert!(model.order_var(VehicleId::new(0), 1).is_none());
    }

    #[test]
    fn rejects_unusable_time_limit() {
        let network = scenario();
        let mut config = config(1, 100.0);
        config.solver.time_limit = Some(0.0);
        assert_eq!(
            CvrpModel::build(&network, &config).unwrap_err(),
            InputError::InvalidTimeLimit(0.0)
        );
    }

    #[test]
    fn oversized_demand_still_builds() {
        let network = Network::new(
            vec![Node::new("D", 0.0), Node::new("A", 150.0)],
            vec![Link::new("D", "A", 1.0), Link::new("A", "D", 1.0)],
        )
        .unwrap();
        let model = CvrpModel::build(&network, &config(1, 100.0)).unwrap();
        let values = model.encode_routes(&network, &[vec![1]]);
        assert!(!model
            .problem()
            .evaluate(&values)
            .is_feasible(SolutionQuality::TOLERANCE));
    }

    #[test]
    fn forbidden_arcs_are_not_declared() {
        let network = Network::new(
            vec![Node::new("D", 0.0), Node::new("A", 1.0), Node::new("B", 1.0)],
            vec![
                Link::new("D", "A", 1.0),
                Link::new("A", "B", 1.0),
                Link::new("B", "D", 1.0),
            ],
        )
        .unwrap();

        let err = CvrpModel::build(&network, &config(1, 10.0)).unwrap_err();
        assert!(matches!(err, InputError::MissingLink { .. }));

        let model = CvrpModel::build(
            &network,
            &config(1, 10.0).with_missing_arcs(MissingArcPolicy::Forbid),
        )
        .unwrap();
        assert_eq!(model.arcs().len(), 3);
        let values = model.encode_routes(&network, &[vec![1, 2]]);
        assert!(model
            .problem()
            .evaluate(&values)
            .is_feasible(SolutionQuality::TOLERANCE));
    }
}
