use std::collections::HashMap;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::solver::SolveStatus;
use crate::problem::{Cost, NodeIndex, ProductIndex, Quantity, VehicleIndex, VrpProblem};

/// Vehicle `vehicle` traverses the arc `from -> to`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RouteArc {
    pub vehicle: VehicleIndex,
    pub from: NodeIndex,
    pub to: NodeIndex,
}

/// Quantity of a product that a vehicle delivers to a client
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Load {
    pub client: NodeIndex,
    pub product: ProductIndex,
    pub vehicle: VehicleIndex,
    pub quantity: Quantity,
}

/// The node sequence driven by one vehicle, starting at a depot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub vehicle: VehicleIndex,
    pub nodes: Vec<NodeIndex>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VrpSolution {
    objective: Cost,
    /// Nodes below this index are clients
    clients: usize,
    arcs: Vec<RouteArc>,
    loads: Vec<Load>,
    active: Vec<bool>,
}

impl VrpSolution {
    pub(super) fn new(
        objective: Cost,
        clients: usize,
        arcs: Vec<RouteArc>,
        loads: Vec<Load>,
        active: Vec<bool>,
    ) -> VrpSolution {
        VrpSolution {
            objective,
            clients,
            arcs,
            loads,
            active,
        }
    }

    pub fn objective(&self) -> Cost {
        self.objective
    }

    /// Arcs with x = 1, sorted by vehicle, origin and destination
    pub fn arcs(&self) -> &[RouteArc] {
        &self.arcs
    }

    pub fn loads(&self) -> &[Load] {
        &self.loads
    }

    /// Whether each vehicle is used
    pub fn active(&self) -> &[bool] {
        &self.active
    }

    pub fn active_vehicles(&self) -> usize {
        self.active.iter().filter(|a| **a).count()
    }

    /// Sum of the arc costs of the used arcs, without fixed vehicle costs
    pub fn travel_cost(&self, problem: &VrpProblem) -> Result<Cost> {
        self.arcs
            .iter()
            .map(|a| {
                problem.arc_cost(a.vehicle, a.from, a.to).ok_or_else(|| {
                    Error::MissingData(format!(
                        "no cost for arc ({}, {}) of vehicle {}",
                        a.from, a.to, a.vehicle
                    ))
                })
            })
            .sum()
    }

    /// Follows the used arcs from every depot departure until the tour returns to a depot.
    ///
    /// Arcs that are not reachable from a depot (which a model without subtour
    /// elimination may produce) are not part of any route.
    pub fn routes(&self) -> Vec<Route> {
        let successors: HashMap<(VehicleIndex, NodeIndex), NodeIndex> =
            self.arcs.iter().map(|a| ((a.vehicle, a.from), a.to)).collect();

        let mut routes = Vec::new();
        for start in self.arcs.iter().filter(|a| a.from >= self.clients) {
            let mut nodes = vec![start.from, start.to];
            let mut current = start.to;
            while current < self.clients && nodes.len() <= self.arcs.len() {
                match successors.get(&(start.vehicle, current)) {
                    Some(next) => {
                        nodes.push(*next);
                        current = *next;
                    }
                    None => break,
                }
            }
            routes.push(Route {
                vehicle: start.vehicle,
                nodes,
            });
        }
        routes
    }
}

/// Result of a routing solve: the solver status and, when one was found, the solution
#[derive(Debug, Clone)]
pub struct VrpOutcome {
    pub status: SolveStatus,
    pub solution: Option<VrpSolution>,
}

impl VrpOutcome {
    pub fn into_solution(self) -> Result<VrpSolution> {
        self.solution.ok_or(Error::NoSolution { status: self.status })
    }
}
