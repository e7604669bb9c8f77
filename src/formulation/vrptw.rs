//! VRP with time windows as a three-index flow model with big-M time
//! propagation.
//!
//! Variables:
//! * `X[i,j,k]` binary, vehicle `k` drives `i -> j`
//! * `T[i,k]` continuous in `[earliest(i), latest(i)]`, start of service of
//!   `k` at `i`; for the depot this is the departure time
//!
//! For every arc entering a customer, `T[i,k] + service(i) + travel(i,j)
//! <= T[j,k]` is enforced when the arc is used and relaxed by `M` otherwise.
//! Arcs back to the depot must arrive before the depot closes. Customers
//! joined by an arc with no service or travel time also get a position
//! `P[i,k]` that must grow along every such arc.

use tracing::{debug, info};

use super::index::{ArcVars, NodeVars};
use super::ordering::StationaryOrder;
use super::{check_arcs, check_solver, MissingArcPolicy, DEFAULT_TIME_LIMIT_SECS};
use crate::domain::{
    Constraint, Fleet, InputError, LinearExpr, Network, ObjectiveFunction, OptimizationProblem,
    SolverConfig, TimeWindow, VarId, Variable, VehicleId,
};

/// Big-M used to switch off time propagation on unused arcs
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BigM {
    /// Smallest value per arc that keeps the relaxed constraint vacuous
    /// under the window bounds
    #[default]
    Derived,
    /// One constant for every arc
    Fixed(f64),
}

/// Parameters of a VRPTW solve
#[derive(Debug, Clone)]
pub struct VrptwConfig {
    pub fleet: Fleet,
    /// Every vehicle leaves the depot once when `true`; otherwise a vehicle
    /// may stay home
    pub force_all_vehicles: bool,
    pub big_m: BigM,
    pub missing_arcs: MissingArcPolicy,
    pub solver: SolverConfig,
}

impl VrptwConfig {
    pub fn new(fleet: Fleet) -> Self {
        Self {
            fleet,
            force_all_vehicles: true,
            big_m: BigM::default(),
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

    pub fn with_big_m(mut self, big_m: BigM) -> Self {
        self.big_m = big_m;
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

/// Window of every node, depot first
fn windows(network: &Network) -> Result<Vec<TimeWindow>, InputError> {
    network
        .nodes()
        .iter()
        .map(|node| {
            node.time_window
                .ok_or_else(|| InputError::MissingTimeWindow(node.id.clone()))
        })
        .collect()
}

/// Travel data of a network whose nodes all carry windows
struct Schedule<'a> {
    network: &'a Network,
    windows: &'a [TimeWindow],
}

impl Schedule<'_> {
    fn window(&self, i: usize) -> TimeWindow {
        self.windows[i]
    }

    fn service(&self, i: usize) -> f64 {
        self.network.node(i).service_time
    }

    fn travel(&self, i: usize, j: usize) -> f64 {
        self.network.travel_time(i, j).unwrap_or_default()
    }

    /// `M` relaxing `T[i] + s(i) + t(i,j) <= T[j]`
    fn propagation_m(&self, big_m: BigM, i: usize, j: usize) -> f64 {
        match big_m {
            BigM::Fixed(m) => m,
            BigM::Derived => (self.window(i).latest() + self.service(i) + self.travel(i, j)
                - self.window(j).earliest())
            .max(0.0),
        }
    }

    /// `M` relaxing `T[i] + s(i) + t(i,depot) <= latest(depot)`
    fn return_m(&self, big_m: BigM, i: usize) -> f64 {
        let depot = self.network.depot();
        match big_m {
            BigM::Fixed(m) => m,
            BigM::Derived => (self.window(i).latest() + self.service(i) + self.travel(i, depot)
                - self.window(depot).latest())
            .max(0.0),
        }
    }
}

/// A built VRPTW model and its variable tables
#[derive(Debug, Clone)]
pub struct VrptwModel {
    problem: OptimizationProblem,
    fleet: Fleet,
    windows: Vec<TimeWindow>,
    x: ArcVars,
    t: NodeVars,
    order: StationaryOrder,
}

impl VrptwModel {
    pub fn build(network: &Network, config: &VrptwConfig) -> Result<Self, InputError> {
        let windows = windows(network)?;
        check_arcs(network, config.missing_arcs)?;
        for (i, j) in network.pairs() {
            if network.arc(i, j).is_some() && network.travel_time(i, j).is_none() {
                return Err(InputError::MissingTravelTime {
                    from: network.id(i).clone(),
                    to: network.id(j).clone(),
                });
            }
        }
        if let BigM::Fixed(m) = config.big_m {
            if !m.is_finite() || m <= 0.0 {
                return Err(InputError::InvalidBigM(m));
            }
        }
        check_solver(&config.solver)?;

        let fleet = config.fleet;
        let depot = network.depot();
        let schedule = Schedule {
            network,
            windows: &windows,
        };

        let mut problem = OptimizationProblem::new()
            .with_name("vrptw")
            .with_description(format!(
                "{} customers, {} vehicles of capacity {}",
                network.num_customers(),
                fleet.size(),
                fleet.capacity()
            ))
            .with_config(config.solver.clone());

        let x = ArcVars::declare(&mut problem, network, &fleet);
        let t = NodeVars::declare(&mut problem, network, &fleet, |k, i| {
            let window = schedule.window(i);
            Variable::continuous(format!("T[{},{}]", network.id(i), k))
                .with_bounds(window.earliest(), Some(window.latest()))
        });

        problem.set_objective(ObjectiveFunction::minimize(
            x.iter()
                .map(|(i, j, _, var)| (var, network.cost(i, j).unwrap_or_default()))
                .collect(),
        ));

        for k in fleet.vehicles() {
            let departures: LinearExpr = x.outgoing(depot, k).map(|(_, var)| (var, 1.0)).collect();
            let mut returns: LinearExpr = x.incoming(depot, k).map(|(_, var)| (var, 1.0)).collect();

            if config.force_all_vehicles {
                problem.add_constraint(Constraint::eq(departures, 1.0).with_name(format!("depart[{}]", k)));
                problem.add_constraint(Constraint::eq(returns, 1.0).with_name(format!("return[{}]", k)));
            } else {
                for &(var, _) in departures.terms() {
                    returns.add(var, -1.0);
                }
                problem.add_constraint(Constraint::leq(departures, 1.0).with_name(format!("depart[{}]", k)));
                problem.add_constraint(Constraint::eq(returns, 0.0).with_name(format!("return[{}]", k)));
            }

            for i in network.customers() {
                let mut balance = LinearExpr::new();
                for (_, var) in x.outgoing(i, k) {
                    balance.add(var, 1.0);
                }
                for (_, var) in x.incoming(i, k) {
                    balance.add(var, -1.0);
                }
                problem.add_constraint(
                    Constraint::eq(balance, 0.0)
                        .with_name(format!("flow[{},{}]", network.id(i), k)),
                );
            }
        }

        for i in network.customers() {
            let served: LinearExpr = fleet
                .vehicles()
                .flat_map(|k| x.outgoing(i, k))
                .map(|(_, var)| (var, 1.0))
                .collect();
            problem.add_constraint(
                Constraint::eq(served, 1.0).with_name(format!("coverage[{}]", network.id(i))),
            );
        }

        for k in fleet.vehicles() {
            let load: LinearExpr = network
                .customers()
                .flat_map(|i| x.outgoing(i, k).map(move |(_, var)| (var, network.demand(i))))
                .collect();
            problem.add_constraint(
                Constraint::leq(load, fleet.capacity()).with_name(format!("capacity[{}]", k)),
            );
        }
        debug!("routing constraints added");

        let mut timing = 0usize;
        for k in fleet.vehicles() {
            for i in 0..network.len() {
                for j in network.customers() {
                    let Some(x_ij) = x.get(i, j, k) else {
                        continue;
                    };
                    let m = schedule.propagation_m(config.big_m, i, j);
                    if m <= 0.0 {
                        // the windows alone already order i before j
                        continue;
                    }
                    let expr = LinearExpr::new()
                        .plus(t.get(k, i), 1.0)
                        .plus(t.get(k, j), -1.0)
                        .plus(x_ij, m);
                    problem.add_constraint(
                        Constraint::leq(expr, m - schedule.service(i) - schedule.travel(i, j))
                            .with_name(format!("time[{},{},{}]", network.id(i), network.id(j), k)),
                    );
                    timing += 1;
                }
            }

            let closing = schedule.window(depot).latest();
            for i in network.customers() {
                let Some(x_i0) = x.get(i, depot, k) else {
                    continue;
                };
                let m = schedule.return_m(config.big_m, i);
                if m <= 0.0 {
                    continue;
                }
                let expr = LinearExpr::new().plus(t.get(k, i), 1.0).plus(x_i0, m);
                problem.add_constraint(
                    Constraint::leq(
                        expr,
                        m + closing - schedule.service(i) - schedule.travel(i, depot),
                    )
                    .with_name(format!("time[{},{},{}]", network.id(i), network.id(depot), k)),
                );
                timing += 1;
            }
        }
        debug!(count = timing, "time propagation constraints");

        let order = StationaryOrder::declare(&mut problem, network, &fleet, &x, |i, j| {
            schedule.service(i) + schedule.travel(i, j) <= 0.0
        });

        info!(
            variables = problem.num_variables(),
            constraints = problem.num_constraints(),
            "built VRPTW model: {}",
            problem.description
        );

        Ok(Self {
            problem,
            fleet,
            windows,
            x,
            t,
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

    pub fn time_var(&self, node: usize, vehicle: VehicleId) -> VarId {
        self.t.get(vehicle, node)
    }

    pub fn order_var(&self, node: usize, vehicle: VehicleId) -> Option<VarId> {
        self.order.get(vehicle, node)
    }

    /// Encodes a routing plan with earliest-start service times.
    ///
    /// `routes[k]` lists the customer positions vehicle `k` visits in order.
    /// Every vehicle leaves the depot when it opens; nodes a vehicle does not
    /// visit get their earliest start.
    pub fn encode_routes(&self, network: &Network, routes: &[Vec<usize>]) -> Vec<f64> {
        let schedule = Schedule {
            network,
            windows: &self.windows,
        };
        let depot = network.depot();
        let mut values = vec![0.0; self.problem.num_variables()];

        for k in self.fleet.vehicles() {
            for i in 0..network.len() {
                values[self.t.get(k, i).index()] = schedule.window(i).earliest();
            }
            let route = routes.get(k.index()).map(Vec::as_slice).unwrap_or_default();
            self.order.encode(&mut values, k, route);
            if route.is_empty() {
                continue;
            }

            let mut previous = depot;
            let mut clock = schedule.window(depot).earliest();
            for &i in route {
                clock = (clock + schedule.service(previous) + schedule.travel(previous, i))
                    .max(schedule.window(i).earliest());
                values[self.t.get(k, i).index()] = clock;
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
