use std::collections::HashMap;

use itertools::iproduct;
use log::trace;

use super::config::{FixedCostCharge, MtzDomain, VrpConfig};
use crate::costs::distance_km;
use crate::error::{Error, Result};
use crate::problem::{Cost, NodeIndex, ProductIndex, Quantity, VehicleIndex, VrpProblem};

/// sets for the vehicle routing model
#[derive(Debug)]
#[allow(non_snake_case)]
pub struct Sets {
    /// Set of clients
    pub C: Vec<NodeIndex>,
    /// Set of depots
    pub D: Vec<NodeIndex>,
    /// Set of all nodes, clients first
    pub N: Vec<NodeIndex>,
    /// Set of vehicles
    pub V: Vec<VehicleIndex>,
    /// Set of products
    pub P: Vec<ProductIndex>,
    /// Arcs (i, j) with i != j that vehicle v can use, i.e. that have a defined cost
    pub A: Vec<Vec<(NodeIndex, NodeIndex)>>,
    /// Nodes that carry an MTZ potential
    pub U: Vec<NodeIndex>,
}

/// parameters for the vehicle routing model
#[allow(non_snake_case)]
pub struct Parameters {
    /// travel cost of vehicle v on arc (i, j), defined for the arcs in A_v
    pub C: HashMap<(NodeIndex, NodeIndex, VehicleIndex), Cost>,
    /// distance in km of arc (i, j), only filled when the range constraint is active
    pub distance: HashMap<(NodeIndex, NodeIndex), f64>,
    /// demand of client i for product p
    pub demand: Vec<Vec<Quantity>>,
    /// capacity of depot k for product p, indexed by node
    pub depot_capacity: HashMap<NodeIndex, Vec<Quantity>>,
    /// total demand for product p, the big-M of the depot throughput constraint
    pub total_demand: Vec<Quantity>,
    /// load capacity of vehicle v
    pub Q: Vec<Quantity>,
    /// range of vehicle v in km
    pub R: Vec<f64>,
    /// maintenance plus recharge cost of vehicle v
    pub F: Vec<Cost>,
    /// big-M of the MTZ constraints
    pub M: f64,
}

#[allow(non_snake_case)]
impl Sets {
    pub fn new(problem: &VrpProblem, config: &VrpConfig) -> Sets {
        let C: Vec<NodeIndex> = problem.client_indices().collect();
        let D: Vec<NodeIndex> = problem.depot_indices().collect();
        let N: Vec<NodeIndex> = (0..problem.nodes().len()).collect();
        let V: Vec<VehicleIndex> = (0..problem.vehicles().len()).collect();
        let P: Vec<ProductIndex> = (0..problem.products().len()).collect();

        let A = V
            .iter()
            .map(|v| {
                iproduct!(&N, &N)
                    .filter(|(i, j)| i != j && problem.arc_cost(*v, **i, **j).is_some())
                    .map(|(i, j)| (*i, *j))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        for v in &V {
            trace!("Vehicle {} can use {} arcs", problem.vehicles()[*v].id(), A[*v].len());
        }

        let U = match config.mtz {
            MtzDomain::Clients => C.clone(),
            MtzDomain::AllNodes => N.clone(),
        };

        Sets { C, D, N, V, P, A, U }
    }
}

#[allow(non_snake_case)]
impl Parameters {
    pub fn new(problem: &VrpProblem, sets: &Sets, config: &VrpConfig) -> Result<Parameters> {
        let mut C = HashMap::new();
        for v in &sets.V {
            for (i, j) in &sets.A[*v] {
                if let Some(cost) = problem.arc_cost(*v, *i, *j) {
                    C.insert((*i, *j, *v), cost);
                }
            }
        }

        let mut distance = HashMap::new();
        if config.constraints.range {
            let matrix = problem.distances().ok_or_else(|| {
                Error::MissingData("the range constraint needs a distance matrix".into())
            })?;
            for (v, (i, j)) in sets.V.iter().flat_map(|v| sets.A[*v].iter().map(move |a| (v, a))) {
                let d = matrix.get(*i, *j).ok_or_else(|| {
                    Error::MissingData(format!(
                        "no distance for arc ({}, {}) used by vehicle {}",
                        problem.nodes()[*i].id(),
                        problem.nodes()[*j].id(),
                        problem.vehicles()[*v].id()
                    ))
                })?;
                distance.insert((*i, *j), distance_km(d));
            }
        }

        let demand = sets
            .C
            .iter()
            .map(|i| problem.nodes()[*i].quantities().to_vec())
            .collect::<Vec<_>>();

        let depot_capacity = sets
            .D
            .iter()
            .map(|k| (*k, problem.nodes()[*k].quantities().to_vec()))
            .collect();

        let total_demand = sets
            .P
            .iter()
            .map(|p| demand.iter().map(|d| d[*p]).sum())
            .collect();

        let Q = problem.vehicles().iter().map(|v| v.capacity()).collect();
        let R = problem.vehicles().iter().map(|v| v.range()).collect();

        let F = match config.fixed_costs {
            FixedCostCharge::None => vec![0.0; sets.V.len()],
            FixedCostCharge::ActivatedOnly | FixedCostCharge::AllVehicles => sets
                .V
                .iter()
                .map(|v| problem.vehicle_rates(*v).map(|r| r.fixed()))
                .collect::<Result<Vec<_>>>()?,
        };

        let M = match config.mtz {
            MtzDomain::Clients => sets.C.len() as f64,
            MtzDomain::AllNodes => sets.N.len() as f64,
        };

        Ok(Parameters {
            C,
            distance,
            demand,
            depot_capacity,
            total_demand,
            Q,
            R,
            F,
            M,
        })
    }
}
