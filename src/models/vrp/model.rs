use std::collections::HashMap;

use good_lp::{Expression, Variable};
use itertools::iproduct;
use log::{debug, info};

use super::config::{FixedCostCharge, MtzDomain, VrpConfig};
use super::sets_and_parameters::{Parameters, Sets};
use super::solution::{Load, RouteArc, VrpOutcome, VrpSolution};
use crate::error::Result;
use crate::models::milp::{Assignment, Model, Sense, VarType};
use crate::models::solver::{self, MilpSolver, SolveOptions};
use crate::models::utils::{keyed_vars, AddVars, ConvertVars};
use crate::problem::{NodeIndex, ProductIndex, VehicleIndex, VrpProblem};

pub struct Variables {
    /// 1 if vehicle v traverses arc (i, j), only for the arcs in A_v
    pub x: HashMap<(NodeIndex, NodeIndex, VehicleIndex), Variable>,
    /// load of product p delivered to client i by vehicle v, indexed [client][product][vehicle]
    pub q: Vec<Vec<Vec<Variable>>>,
    /// MTZ potential of node i for vehicle v
    pub u: HashMap<(NodeIndex, VehicleIndex), Variable>,
    /// 1 if vehicle v is used
    pub z: Option<Vec<Variable>>,
    /// number of vehicles used
    pub active: Option<Variable>,
    /// load of product p that vehicle v sources through depot k
    pub s: HashMap<(NodeIndex, ProductIndex, VehicleIndex), Variable>,
}

impl Variables {
    /// Sum of the arc variables of vehicle v leaving node i
    fn outgoing(&self, sets: &Sets, i: NodeIndex, v: VehicleIndex) -> Expression {
        sets.A[v]
            .iter()
            .filter(|(from, _)| *from == i)
            .map(|(from, to)| self.x[&(*from, *to, v)])
            .sum()
    }

    /// Sum of the arc variables of vehicle v entering node i
    fn incoming(&self, sets: &Sets, i: NodeIndex, v: VehicleIndex) -> Expression {
        sets.A[v]
            .iter()
            .filter(|(_, to)| *to == i)
            .map(|(from, to)| self.x[&(*from, *to, v)])
            .sum()
    }
}

pub struct VrpSolver {}

#[allow(non_snake_case)]
impl VrpSolver {
    /// builds the vehicle routing model
    pub fn build(sets: &Sets, parameters: &Parameters, config: &VrpConfig) -> (Model, Variables) {
        info!("Building VRP model");

        let mut model = Model::new("vrp");
        let constraints = &config.constraints;

        //*************CREATE VARIABLES*************//
        let C = sets.C.len();
        let P = sets.P.len();
        let V = sets.V.len();

        let indices = sets
            .V
            .iter()
            .flat_map(|v| sets.A[*v].iter().map(move |(i, j)| (*i, *j, *v)))
            .collect::<Vec<_>>();
        let x = keyed_vars(indices, &mut model, VarType::Binary, &(0.0..1.0), "x");

        let q = (C, P, V).cont(&mut model, "q");

        let u = match constraints.subtour_elimination {
            true => {
                let indices = iproduct!(sets.U.iter().cloned(), sets.V.iter().cloned())
                    .collect::<Vec<_>>();
                let bounds = 0.0..f64::INFINITY;
                keyed_vars(indices, &mut model, VarType::Continuous, &bounds, "u")
            }
            false => HashMap::new(),
        };

        let (z, active) = match constraints.activation {
            true => {
                let z = V.binary(&mut model, "z");
                let active = model.add_var("active_vehicles", VarType::Integer, 0.0, V as f64);
                (Some(z), Some(active))
            }
            false => (None, None),
        };

        let s = match constraints.depot_capacity {
            true => {
                let indices = iproduct!(
                    sets.D.iter().cloned(),
                    sets.P.iter().cloned(),
                    sets.V.iter().cloned()
                )
                .collect::<Vec<_>>();
                let bounds = 0.0..f64::INFINITY;
                keyed_vars(indices, &mut model, VarType::Continuous, &bounds, "s")
            }
            false => HashMap::new(),
        };

        let vars = Variables { x, q, u, z, active, s };
        let x = &vars.x;
        let q = &vars.q;

        // ******************** ADD CONSTRAINTS ********************

        // every client is left exactly once, by exactly one vehicle
        if constraints.visit_once {
            for i in &sets.C {
                let lhs: Expression = sets.V.iter().map(|v| vars.outgoing(sets, *i, *v)).sum();
                model.add_constr(&format!("visit_once_{i}"), lhs, Sense::Eq, 1.0);
            }
        }

        // a vehicle leaves every node as often as it enters it
        if constraints.flow_conservation {
            for (i, v) in iproduct!(&sets.N, &sets.V) {
                let lhs = vars.outgoing(sets, *i, *v);
                let rhs = vars.incoming(sets, *i, *v);
                model.add_constr(&format!("flow_{i}_{v}"), lhs, Sense::Eq, rhs);
            }
        }

        // the load of a vehicle can't exceed its capacity
        if constraints.vehicle_capacity {
            for v in &sets.V {
                let lhs: Expression = iproduct!(0..C, &sets.P).map(|(i, p)| q[i][*p][*v]).sum();
                let name = format!("vehicle_capacity_{v}");
                model.add_constr(&name, lhs, Sense::Le, parameters.Q[*v]);
            }
        }

        // the demand of every client is delivered, and only by the vehicle that visits it
        if constraints.demand {
            for (i, p) in iproduct!(0..C, &sets.P) {
                let lhs: Expression = sets.V.iter().map(|v| q[i][*p][*v]).sum();
                let demand = parameters.demand[i][*p];
                model.add_constr(&format!("demand_{i}_{p}"), lhs, Sense::Eq, demand);
            }
            for (i, p, v) in iproduct!(0..C, &sets.P, &sets.V) {
                let rhs = parameters.demand[i][*p] * vars.outgoing(sets, sets.C[i], *v);
                let name = format!("deliver_if_visited_{i}_{p}_{v}");
                model.add_constr(&name, q[i][*p][*v], Sense::Le, rhs);
            }
        }

        // what a vehicle delivers is sourced through the depot it departs from
        if constraints.depot_capacity {
            for (k, p, v) in iproduct!(&sets.D, &sets.P, &sets.V) {
                let load: Expression = (0..C).map(|i| q[i][*p][*v]).sum();
                let departs = vars.outgoing(sets, *k, *v);
                let big_m = parameters.total_demand[*p];
                // s >= load - M (1 - departs)
                let rhs = load - big_m + big_m * departs;
                let name = format!("depot_throughput_{k}_{p}_{v}");
                model.add_constr(&name, vars.s[&(*k, *p, *v)], Sense::Ge, rhs);
            }
            for (k, p) in iproduct!(&sets.D, &sets.P) {
                let lhs: Expression = sets.V.iter().map(|v| vars.s[&(*k, *p, *v)]).sum();
                let capacity = parameters.depot_capacity[k][*p];
                model.add_constr(&format!("depot_capacity_{k}_{p}"), lhs, Sense::Le, capacity);
            }
        }

        // the distance driven by a vehicle is bounded by its range
        if constraints.range {
            for v in &sets.V {
                let lhs: Expression = sets.A[*v]
                    .iter()
                    .map(|(i, j)| parameters.distance[&(*i, *j)] * x[&(*i, *j, *v)])
                    .sum();
                model.add_constr(&format!("range_{v}"), lhs, Sense::Le, parameters.R[*v]);
            }
        }

        // Miller-Tucker-Zemlin: the potential increases along every used arc into a client
        if constraints.subtour_elimination {
            let M = parameters.M;
            for v in &sets.V {
                for (i, j) in &sets.A[*v] {
                    let ordered = match config.mtz {
                        MtzDomain::Clients => *i < C && *j < C,
                        MtzDomain::AllNodes => *j < C,
                    };
                    if !ordered {
                        continue;
                    }
                    let lhs = vars.u[&(*i, *v)] - vars.u[&(*j, *v)] + M * x[&(*i, *j, *v)];
                    model.add_constr(&format!("mtz_{i}_{j}_{v}"), lhs, Sense::Le, M - 1.0);
                }
            }
        }

        // a vehicle departs from at most one depot, and from exactly one when it is active
        if constraints.depart_depot {
            for v in &sets.V {
                let lhs: Expression = sets.D.iter().map(|k| vars.outgoing(sets, *k, *v)).sum();
                let name = format!("depart_depot_{v}");
                match &vars.z {
                    Some(z) => model.add_constr(&name, lhs, Sense::Eq, z[*v]),
                    None => model.add_constr(&name, lhs, Sense::Le, 1.0),
                };
            }
        }

        // a vehicle that uses any arc is active
        if let (Some(z), Some(active)) = (&vars.z, vars.active) {
            let big_m = (C + 1) as f64;
            for v in &sets.V {
                let lhs: Expression = sets.A[*v].iter().map(|(i, j)| x[&(*i, *j, *v)]).sum();
                model.add_constr(&format!("activation_{v}"), lhs, Sense::Le, big_m * z[*v]);
            }
            let used: Expression = z.iter().copied().sum();
            model.add_constr("active_vehicles", active, Sense::Eq, used);
        }

        //*************OBJECTIVE*************//
        let travel_costs: Expression = sets
            .V
            .iter()
            .flat_map(|v| sets.A[*v].iter().map(move |(i, j)| (*i, *j, *v)))
            .map(|key| parameters.C[&key] * x[&key])
            .sum();

        let fixed_costs = match (config.fixed_costs, &vars.z) {
            (FixedCostCharge::ActivatedOnly, Some(z)) => {
                sets.V.iter().map(|v| parameters.F[*v] * z[*v]).sum::<Expression>()
            }
            (FixedCostCharge::AllVehicles, _) => Expression::from(parameters.F.iter().sum::<f64>()),
            _ => Expression::from(0.0),
        };

        model.set_objective(travel_costs + fixed_costs);

        info!(
            "Successfully built VRP model with {} variables and {} constraints",
            model.num_vars(),
            model.num_constrs()
        );
        (model, vars)
    }

    /// Builds the model for `problem` and solves it with `solver`
    pub fn solve(
        problem: &VrpProblem,
        config: &VrpConfig,
        solver: &dyn MilpSolver,
        options: &SolveOptions,
    ) -> Result<VrpOutcome> {
        config.validate(problem)?;
        let sets = Sets::new(problem, config);
        let parameters = Parameters::new(problem, &sets, config)?;
        let (model, vars) = VrpSolver::build(&sets, &parameters, config);

        let outcome = solver::solve(&model, solver, options)?;
        let solution = match (&outcome.assignment, outcome.objective) {
            (Some(values), Some(objective)) if outcome.has_solution() => {
                Some(VrpSolution::from_assignment(&sets, &vars, values, objective))
            }
            _ => None,
        };

        Ok(VrpOutcome {
            status: outcome.status,
            solution,
        })
    }
}

impl VrpSolution {
    fn from_assignment(
        sets: &Sets,
        vars: &Variables,
        values: &Assignment,
        objective: f64,
    ) -> VrpSolution {
        let x = vars.x.convert(values);
        let mut arcs: Vec<RouteArc> = x
            .iter()
            .filter(|(_, value)| **value > 0.5)
            .map(|((from, to, vehicle), _)| RouteArc {
                vehicle: *vehicle,
                from: *from,
                to: *to,
            })
            .collect();
        arcs.sort_by_key(|a| (a.vehicle, a.from, a.to));

        let q = vars.q.convert(values);
        let loads = iproduct!(0..sets.C.len(), &sets.P, &sets.V)
            .filter(|(i, p, v)| q[*i][**p][**v] > 1e-6)
            .map(|(i, p, v)| Load {
                client: sets.C[i],
                product: *p,
                vehicle: *v,
                quantity: q[i][*p][*v],
            })
            .collect();

        let active = match &vars.z {
            Some(z) => z.convert(values).iter().map(|z| *z > 0.5).collect(),
            None => sets.V.iter().map(|v| arcs.iter().any(|a| a.vehicle == *v)).collect(),
        };

        debug!("VRP solution uses {} arcs", arcs.len());
        VrpSolution::new(objective, sets.C.len(), arcs, loads, active)
    }
}
