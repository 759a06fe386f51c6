use good_lp::{Expression, Variable};
use log::{debug, info};
use serde::Serialize;

use super::problem::{LocationIndex, SensorIndex, SensorProblem};
use super::sets_and_parameters::{Parameters, Sets};
use crate::error::{Error, Result};
use crate::models::milp::{Model, Sense};
use crate::models::solver::{self, MilpSolver, SolveOptions, SolveStatus};
use crate::models::utils::{AddVars, ConvertVars};

pub struct Variables {
    /// 1 if sensor type s is installed at location l, indexed [s][l]
    pub x: Vec<Vec<Variable>>,
    /// number of installed sensors of type s
    pub y: Vec<Variable>,
}

pub struct SensorSolver {}

#[allow(non_snake_case)]
impl SensorSolver {
    /// builds the sensor placement model
    pub fn build(sets: &Sets, parameters: &Parameters) -> (Model, Variables) {
        info!("Building sensor placement model");

        let mut model = Model::new("sensor_placement");

        let S = sets.S.len();
        let L = sets.L.len();

        //*************CREATE VARIABLES*************//
        let x = (S, L).binary(&mut model, "x");
        let y = S.integer(&mut model, "y");

        // ******************** ADD CONSTRAINTS ********************

        // whatever a type can cover is served by a connected placement of that type
        for ((s, l), serving) in &sets.providers {
            let lhs: Expression = serving.iter().map(|from| x[*s][*from]).sum();
            model.add_constr(&format!("coverage_{s}_{l}"), lhs, Sense::Ge, 1.0);
        }

        for (l, serving) in &sets.required {
            let lhs: Expression = serving.iter().map(|(s, from)| x[*s][*from]).sum();
            model.add_constr(&format!("required_{l}"), lhs, Sense::Ge, 1.0);
        }

        // y counts the placements of each type
        for s in &sets.S {
            let placed: Expression = sets.L.iter().map(|l| x[*s][*l]).sum();
            model.add_constr(&format!("count_{s}"), placed, Sense::Eq, y[*s]);
        }

        //*************OBJECTIVE*************//
        let energy: Expression = sets.S.iter().map(|s| parameters.E[*s] * y[*s]).sum();
        let placement: Expression = sets
            .S
            .iter()
            .flat_map(|s| sets.L.iter().map(move |l| (*s, *l)))
            .map(|(s, l)| (parameters.I[l] + parameters.K[s][l]) * x[s][l])
            .sum();
        model.set_objective(energy + placement);

        info!(
            "Successfully built sensor placement model with {} variables and {} constraints",
            model.num_vars(),
            model.num_constrs()
        );
        (model, Variables { x, y })
    }

    /// Builds the model for `problem` and solves it with `solver`
    pub fn solve(
        problem: &SensorProblem,
        solver: &dyn MilpSolver,
        options: &SolveOptions,
    ) -> Result<SensorOutcome> {
        let sets = Sets::new(problem);
        let parameters = Parameters::new(problem, &sets);
        let (model, vars) = SensorSolver::build(&sets, &parameters);

        let outcome = solver::solve(&model, solver, options)?;
        let solution = match (&outcome.assignment, outcome.objective) {
            (Some(values), Some(objective)) if outcome.has_solution() => {
                let placed: Vec<Vec<bool>> = vars
                    .x
                    .convert(values)
                    .iter()
                    .map(|row| row.iter().map(|x| *x > 0.5).collect())
                    .collect();
                let counts: Vec<usize> = vars
                    .y
                    .convert(values)
                    .iter()
                    .map(|y| y.round() as usize)
                    .collect();
                debug!("Placed sensors per type: {:?}", counts);
                Some(SensorSolution {
                    objective,
                    placed,
                    counts,
                })
            }
            _ => None,
        };

        Ok(SensorOutcome {
            status: outcome.status,
            solution,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SensorSolution {
    objective: f64,
    /// placed[s][l]
    placed: Vec<Vec<bool>>,
    counts: Vec<usize>,
}

impl SensorSolution {
    pub fn objective(&self) -> f64 {
        self.objective
    }

    pub fn is_placed(&self, s: SensorIndex, l: LocationIndex) -> bool {
        self.placed[s][l]
    }

    /// All (type, location) pairs with a sensor
    pub fn placements(&self) -> Vec<(SensorIndex, LocationIndex)> {
        self.placed
            .iter()
            .enumerate()
            .flat_map(|(s, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(_, p)| **p)
                    .map(move |(l, _)| (s, l))
            })
            .collect()
    }

    /// Number of installed sensors per type
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }
}

#[derive(Debug, Clone)]
pub struct SensorOutcome {
    pub status: SolveStatus,
    pub solution: Option<SensorSolution>,
}

impl SensorOutcome {
    pub fn into_solution(self) -> Result<SensorSolution> {
        self.solution.ok_or(Error::NoSolution { status: self.status })
    }
}
