use std::collections::HashSet;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::costs::{ArcCostTable, CostRates, RateTable};
use crate::error::{Error, Result};
use crate::matrix::TravelMatrix;

/// The type used for quantities of product
pub type Quantity = f64;
/// The type used for cost
pub type Cost = f64;

pub type NodeIndex = usize;
pub type VehicleIndex = usize;
pub type ProductIndex = usize;

/// A point given as (longitude, latitude), the order used by the routing-table service
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Client,
    Depot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Identifier as given in the input tables
    id: String,
    kind: NodeKind,
    coordinate: Coordinate,
    /// Demand per product for a client, capacity per product for a depot
    quantities: Vec<Quantity>,
}

impl Node {
    pub fn client(id: impl Into<String>, coordinate: Coordinate, demand: Vec<Quantity>) -> Node {
        Node {
            id: id.into(),
            kind: NodeKind::Client,
            coordinate,
            quantities: demand,
        }
    }

    pub fn depot(id: impl Into<String>, coordinate: Coordinate, capacity: Vec<Quantity>) -> Node {
        Node {
            id: id.into(),
            kind: NodeKind::Depot,
            coordinate,
            quantities: capacity,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn quantities(&self) -> &[Quantity] {
        &self.quantities
    }

    pub fn is_depot(&self) -> bool {
        self.kind == NodeKind::Depot
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    id: String,
    /// Vehicle type label, keys into the rate table
    kind: String,
    /// Maximum aggregate load
    capacity: Quantity,
    /// Maximum cumulative distance, in kilometres
    range: f64,
}

impl Vehicle {
    pub fn new(
        id: impl Into<String>,
        kind: impl Into<String>,
        capacity: Quantity,
        range: f64,
    ) -> Vehicle {
        Vehicle {
            id: id.into(),
            kind: kind.into(),
            capacity,
            range,
        }
    }

    /// Builds a fleet from `(type, capacity, range)` rows, with the ids V1, V2, ... in row order
    pub fn fleet<I, S>(rows: I) -> Vec<Vehicle>
    where
        I: IntoIterator<Item = (S, Quantity, f64)>,
        S: Into<String>,
    {
        rows.into_iter()
            .enumerate()
            .map(|(i, (kind, capacity, range))| {
                Vehicle::new(format!("V{}", i + 1), kind, capacity, range)
            })
            .collect()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn capacity(&self) -> Quantity {
        self.capacity
    }

    pub fn range(&self) -> f64 {
        self.range
    }
}

/// Input of the vehicle routing model.
///
/// Nodes are ordered with all clients first and all depots after them; every
/// matrix and cost table is indexed in that order.
#[derive(Debug, Clone)]
pub struct VrpProblem {
    nodes: Vec<Node>,
    clients: usize,
    vehicles: Vec<Vehicle>,
    products: Vec<String>,
    arc_costs: ArcCostTable,
    /// Distances in metres, only needed by the range constraint
    distances: Option<TravelMatrix>,
    rates: RateTable,
}

impl VrpProblem {
    pub fn new(
        clients: Vec<Node>,
        depots: Vec<Node>,
        vehicles: Vec<Vehicle>,
        products: Vec<String>,
        arc_costs: ArcCostTable,
        distances: Option<TravelMatrix>,
        rates: RateTable,
    ) -> Result<VrpProblem> {
        if depots.is_empty() {
            return Err(Error::InvalidInput("at least one depot is required".into()));
        }
        if vehicles.is_empty() {
            return Err(Error::InvalidInput("at least one vehicle is required".into()));
        }
        if products.is_empty() {
            return Err(Error::InvalidInput("at least one product is required".into()));
        }

        for node in clients.iter().chain(&depots) {
            if node.quantities.len() != products.len() {
                return Err(Error::InvalidInput(format!(
                    "{} {} has {} quantities, expected one per product ({})",
                    node.kind,
                    node.id,
                    node.quantities.len(),
                    products.len()
                )));
            }
            if node.quantities.iter().any(|q| *q < 0.0 || !q.is_finite()) {
                return Err(Error::InvalidInput(format!(
                    "{} {} has a negative quantity",
                    node.kind, node.id
                )));
            }
        }
        if let Some(c) = clients.iter().find(|c| c.is_depot()) {
            return Err(Error::InvalidInput(format!(
                "node {} is listed as a client but is a depot",
                c.id
            )));
        }
        if let Some(d) = depots.iter().find(|d| !d.is_depot()) {
            return Err(Error::InvalidInput(format!(
                "node {} is listed as a depot but is a client",
                d.id
            )));
        }

        let mut seen = HashSet::new();
        let mut ids = clients.iter().chain(&depots).map(|n| n.id());
        if let Some(dup) = ids.find(|id| !seen.insert(*id)) {
            return Err(Error::InvalidInput(format!("duplicate node id {dup}")));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = vehicles.iter().map(|v| v.id()).find(|id| !seen.insert(*id)) {
            return Err(Error::InvalidInput(format!("duplicate vehicle id {dup}")));
        }

        let n = clients.len() + depots.len();
        if let Some((vehicle, i, j)) = arc_costs.keys().find(|(_, i, j)| *i >= n || *j >= n) {
            return Err(Error::InvalidInput(format!(
                "arc cost ({vehicle}, {i}, {j}) refers to a node outside 0..{n}"
            )));
        }

        let num_clients = clients.len();
        let mut nodes = clients;
        nodes.extend(depots);

        Ok(VrpProblem {
            nodes,
            clients: num_clients,
            vehicles,
            products,
            arc_costs,
            distances,
            rates,
        })
    }

    /// All nodes, clients first
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn depots(&self) -> &[Node] {
        &self.nodes[self.clients..]
    }

    pub fn client_indices(&self) -> impl Iterator<Item = NodeIndex> {
        0..self.clients
    }

    pub fn depot_indices(&self) -> impl Iterator<Item = NodeIndex> {
        self.clients..self.nodes.len()
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn products(&self) -> &[String] {
        &self.products
    }

    pub fn distances(&self) -> Option<&TravelMatrix> {
        self.distances.as_ref()
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    /// The travel cost of `vehicle` on the arc (from, to), if the arc is defined
    pub fn arc_cost(&self, vehicle: VehicleIndex, from: NodeIndex, to: NodeIndex) -> Option<Cost> {
        self.arc_costs.get(self.vehicles[vehicle].id(), from, to)
    }

    /// Rates of the vehicle's type
    pub fn vehicle_rates(&self, vehicle: VehicleIndex) -> Result<&CostRates> {
        let v = &self.vehicles[vehicle];
        self.rates.get(v.kind()).ok_or_else(|| {
            Error::MissingData(format!(
                "no cost rates for vehicle type '{}' ({})",
                v.kind(),
                v.id()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f64) -> Coordinate {
        Coordinate {
            longitude: x,
            latitude: 0.0,
        }
    }

    #[test]
    fn fleet_ids_are_sequential() {
        let fleet = Vehicle::fleet(vec![("EV", 10.0, 50.0), ("drone", 2.0, 5.0)]);
        assert_eq!(fleet[0].id(), "V1");
        assert_eq!(fleet[1].id(), "V2");
        assert_eq!(fleet[1].kind(), "drone");
    }

    #[test]
    fn clients_come_before_depots() {
        let problem = VrpProblem::new(
            vec![Node::client("c1", at(0.0), vec![1.0]), Node::client("c2", at(1.0), vec![2.0])],
            vec![Node::depot("d1", at(2.0), vec![5.0])],
            Vehicle::fleet(vec![("EV", 10.0, 50.0)]),
            vec!["p".into()],
            ArcCostTable::default(),
            None,
            RateTable::default(),
        )
        .unwrap();

        assert_eq!(problem.client_indices().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(problem.depot_indices().collect::<Vec<_>>(), vec![2]);
        assert_eq!(problem.nodes()[2].id(), "d1");
    }

    #[test]
    fn rejects_quantity_dimension_mismatch() {
        let result = VrpProblem::new(
            vec![Node::client("c1", at(0.0), vec![1.0, 2.0])],
            vec![Node::depot("d1", at(2.0), vec![5.0])],
            Vehicle::fleet(vec![("EV", 10.0, 50.0)]),
            vec!["p".into()],
            ArcCostTable::default(),
            None,
            RateTable::default(),
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn rejects_problem_without_depots() {
        let result = VrpProblem::new(
            vec![Node::client("c1", at(0.0), vec![1.0])],
            vec![],
            Vehicle::fleet(vec![("EV", 10.0, 50.0)]),
            vec!["p".into()],
            ArcCostTable::default(),
            None,
            RateTable::default(),
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn unknown_vehicle_type_is_missing_data() {
        let problem = VrpProblem::new(
            vec![Node::client("c1", at(0.0), vec![1.0])],
            vec![Node::depot("d1", at(2.0), vec![5.0])],
            Vehicle::fleet(vec![("hovercraft", 10.0, 50.0)]),
            vec!["p".into()],
            ArcCostTable::default(),
            None,
            RateTable::builtin(),
        )
        .unwrap();
        assert!(matches!(problem.vehicle_rates(0), Err(Error::MissingData(_))));
    }
}
