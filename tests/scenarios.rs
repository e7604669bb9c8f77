//! End-to-end solves of small instances with the bundled pure-Rust backend.
#![cfg(feature = "microlp")]

use std::collections::HashMap;
use std::sync::Arc;

use vrp_milp::application::{RoutingPlan, VehicleRoute};
use vrp_milp::{
    CvrpConfig, Fleet, Link, MicroLpSolver, Network, Node, RouteStatus, RoutingService,
    SolutionStatus, SolveOutcome, TimeWindow, VrptwConfig,
};

fn service() -> RoutingService {
    RoutingService::new(Arc::new(MicroLpSolver::new()))
}

fn window(earliest: f64, latest: f64) -> TimeWindow {
    TimeWindow::new(earliest, latest).unwrap()
}

/// Complete symmetric link table with Manhattan distances as cost and time
fn grid_links(points: &[(&str, (f64, f64))]) -> Vec<Link> {
    let mut links = Vec::new();
    for &(from, (x1, y1)) in points {
        for &(to, (x2, y2)) in points {
            if from != to {
                let distance = (x1 - x2).abs() + (y1 - y2).abs();
                links.push(Link::new(from, to, distance).with_travel_time(distance));
            }
        }
    }
    links
}

fn within(window: TimeWindow, time: f64) -> bool {
    time >= window.earliest() - 1e-6 && time <= window.latest() + 1e-6
}

fn stops(route: &VehicleRoute) -> Vec<&str> {
    route.stops.iter().map(|id| id.as_str()).collect()
}

/// Every customer on exactly one route, every route within capacity
fn assert_routing_properties(network: &Network, plan: &RoutingPlan, capacity: f64) {
    // every active arc lies on a depot tour
    let legs: usize = plan.routes.iter().map(|r| r.stops.len() - 1).sum();
    assert_eq!(legs, plan.arcs.len());

    let mut visits: HashMap<&str, usize> = HashMap::new();
    for route in &plan.routes {
        assert_eq!(route.stops.first(), route.stops.last());
        assert_eq!(route.stops.first().map(|id| id.as_str()), Some("D"));
        assert!(route.load <= capacity + 1e-6, "overloaded {:?}", route);
        for id in route.customers() {
            *visits.entry(id.as_str()).or_default() += 1;
        }
    }
    for i in network.customers() {
        assert_eq!(visits.get(network.id(i).as_str()), Some(&1), "{}", network.id(i));
    }

    let route_cost: f64 = plan.routes.iter().map(|r| r.cost).sum();
    assert!((route_cost - plan.objective).abs() < 1e-6);
}

fn tiny_cvrp() -> Network {
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

#[test]
fn tiny_cvrp_splits_customers_over_both_vehicles() {
    let network = tiny_cvrp();
    let config = CvrpConfig::new(Fleet::new(2, 100.0).unwrap());

    let plan = service()
        .solve_cvrp(&network, &config)
        .unwrap()
        .into_plan()
        .expect("instance is feasible");

    assert_eq!(plan.status, RouteStatus::Optimal);
    assert!((plan.objective - 40.0).abs() < 1e-6);
    assert_eq!(plan.arcs.len(), 4);

    let mut tours: Vec<Vec<&str>> = plan.routes.iter().map(stops).collect();
    tours.sort();
    assert_eq!(tours, vec![vec!["D", "A", "D"], vec!["D", "B", "D"]]);
    assert_routing_properties(&network, &plan, 100.0);
}

#[test]
fn oversized_demand_has_no_solution() {
    let network = Network::new(
        vec![Node::new("D", 0.0), Node::new("A", 150.0)],
        vec![Link::new("D", "A", 1.0), Link::new("A", "D", 1.0)],
    )
    .unwrap();
    let config = CvrpConfig::new(Fleet::new(1, 100.0).unwrap());

    match service().solve_cvrp(&network, &config).unwrap() {
        SolveOutcome::NoSolution { status, .. } => assert_eq!(status, SolutionStatus::Infeasible),
        SolveOutcome::Solved(plan) => panic!("unexpected plan {:?}", plan.routes),
    }
}

#[test]
fn zero_demand_customers_are_reached_from_the_depot() {
    // A and B are cheap to join to each other but expensive to reach
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
    let network = Network::new(
        vec![
            Node::new("D", 0.0),
            Node::new("A", 0.0),
            Node::new("B", 0.0),
            Node::new("C", 10.0),
        ],
        links,
    )
    .unwrap();
    let config = CvrpConfig::new(Fleet::new(1, 100.0).unwrap());

    let plan = service()
        .solve_cvrp(&network, &config)
        .unwrap()
        .into_plan()
        .expect("one tour through every customer exists");

    assert_eq!(plan.status, RouteStatus::Optimal);
    assert_eq!(plan.routes.len(), 1);
    assert_eq!(plan.routes[0].customers().len(), 3);
    assert_routing_properties(&network, &plan, 100.0);
    assert!((plan.objective - 202.0).abs() < 1e-6);
}

#[test]
fn cvrp_routes_respect_capacity_on_a_grid() {
    let points = [
        ("D", (0.0, 0.0)),
        ("A", (2.0, 0.0)),
        ("B", (3.0, 1.0)),
        ("C", (0.0, 3.0)),
        ("E", (-1.0, 2.0)),
    ];
    let nodes = vec![
        Node::new("D", 0.0),
        Node::new("A", 30.0),
        Node::new("B", 40.0),
        Node::new("C", 50.0),
        Node::new("E", 20.0),
    ];
    let network = Network::new(nodes, grid_links(&points)).unwrap();
    let config = CvrpConfig::new(Fleet::new(2, 80.0).unwrap());

    let plan = service()
        .solve_cvrp(&network, &config)
        .unwrap()
        .into_plan()
        .expect("instance is feasible");

    assert_eq!(plan.routes.len(), 2);
    assert_routing_properties(&network, &plan, 80.0);
    // D-A-B-D and D-C-E-D, both perimeter tours of length 8
    assert!((plan.objective - 16.0).abs() < 1e-6);
}

fn single_customer(earliest: f64, latest: f64) -> Network {
    Network::new(
        vec![
            Node::new("D", 0.0).with_time_window(window(0.0, 100.0)),
            Node::new("C", 10.0)
                .with_time_window(window(earliest, latest))
                .with_service_time(1.0),
        ],
        vec![
            Link::new("D", "C", 7.0).with_travel_time(5.0),
            Link::new("C", "D", 7.0).with_travel_time(5.0),
        ],
    )
    .unwrap()
}

#[test]
fn reachable_window_is_served_inside_it() {
    let network = single_customer(5.0, 6.0);
    let config = VrptwConfig::new(Fleet::new(1, 50.0).unwrap());

    let solved = service()
        .solve_vrptw(&network, &config)
        .unwrap()
        .into_plan()
        .expect("window is reachable");

    assert!((solved.plan.objective - 14.0).abs() < 1e-6);
    let arrival = solved
        .legs
        .iter()
        .find(|leg| leg.to.as_str() == "C")
        .expect("customer is visited");
    assert!(within(window(5.0, 6.0), arrival.to_time), "{:?}", arrival);
}

#[test]
fn unreachable_window_has_no_solution() {
    let network = single_customer(0.0, 1.0);
    let config = VrptwConfig::new(Fleet::new(1, 50.0).unwrap());

    let outcome = service().solve_vrptw(&network, &config).unwrap();
    assert!(!outcome.is_solved());
}

#[test]
fn vrptw_legs_are_time_consistent() {
    let points = [
        ("D", (0.0, 0.0)),
        ("A", (3.0, 0.0)),
        ("B", (0.0, 4.0)),
        ("C", (3.0, 4.0)),
    ];
    let nodes = vec![
        Node::new("D", 0.0).with_time_window(window(0.0, 60.0)),
        Node::new("A", 10.0)
            .with_time_window(window(0.0, 10.0))
            .with_service_time(2.0),
        Node::new("B", 10.0)
            .with_time_window(window(20.0, 30.0))
            .with_service_time(2.0),
        Node::new("C", 10.0)
            .with_time_window(window(5.0, 40.0))
            .with_service_time(2.0),
    ];
    let network = Network::new(nodes, grid_links(&points)).unwrap();
    let config = VrptwConfig::new(Fleet::new(2, 20.0).unwrap());

    let solved = service()
        .solve_vrptw(&network, &config)
        .unwrap()
        .into_plan()
        .expect("instance is feasible");
    assert_routing_properties(&network, &solved.plan, 20.0);

    let position = |id: &str| {
        network
            .nodes()
            .iter()
            .position(|node| node.id.as_str() == id)
            .unwrap()
    };
    for leg in &solved.legs {
        let from = position(leg.from.as_str());
        let to = position(leg.to.as_str());
        let window = network.node(from).time_window.unwrap();
        assert!(within(window, leg.from_time), "{:?}", leg);
        if !network.is_depot(to) {
            let ready = leg.from_time
                + network.node(from).service_time
                + network.travel_time(from, to).unwrap();
            assert!(leg.to_time >= ready - 1e-6, "{:?}", leg);
            assert!(within(network.node(to).time_window.unwrap(), leg.to_time));
        }
    }
}
