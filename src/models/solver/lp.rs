use good_lp::constraint;
use good_lp::constraint::Constraint;
use good_lp::solvers::microlp::microlp;
use good_lp::solvers::SolutionStatus;
use good_lp::{ResolutionError, Solution, SolverModel};
use log::{debug, warn};

use super::{MilpSolver, SolveOptions, SolveOutcome, SolveStatus};
use crate::error::Result;
use crate::models::milp::{Model, Row, Sense};

fn to_constraint(row: &Row) -> Constraint {
    let lhs = row.expr.clone();
    let rhs = row.rhs;
    match row.sense {
        Sense::Le => constraint!(lhs <= rhs),
        Sense::Ge => constraint!(lhs >= rhs),
        Sense::Eq => constraint!(lhs == rhs),
    }
}

/// Adds the rows of `model` to a `good_lp` problem
fn with_rows<M: SolverModel>(model: &Model, mut problem: M) -> M {
    for row in model.solver_rows() {
        problem.add_constraint(to_constraint(row));
    }
    debug!("Translated {} into a good_lp problem", model.name());
    problem
}

/// Reads every column back and maps the resolution status
fn read_back<S: Solution>(
    model: &Model,
    backend: &str,
    result: std::result::Result<S, ResolutionError>,
) -> SolveOutcome {
    match result {
        Ok(solution) => {
            let status = match solution.status() {
                SolutionStatus::TimeLimit => SolveStatus::TimeLimit,
                _ => SolveStatus::Optimal,
            };
            let assignment = model
                .columns()
                .iter()
                .map(|c| (c.var, solution.value(c.var)))
                .collect();
            SolveOutcome::settle(model, status, assignment)
        }
        Err(ResolutionError::Infeasible) => SolveOutcome::without_solution(SolveStatus::Infeasible),
        Err(ResolutionError::Unbounded) => SolveOutcome::without_solution(SolveStatus::Unbounded),
        Err(e) => {
            warn!("{} stopped without a status: {}", backend, e);
            SolveOutcome::without_solution(SolveStatus::Unknown)
        }
    }
}

/// Solves through `good_lp` with the bundled pure-Rust `microlp` solver.
///
/// `microlp` runs single-threaded to optimality: time limit, thread count and MIP gap are ignored.
#[derive(Debug, Default, Clone)]
pub struct MicroLpSolver {}

impl MicroLpSolver {
    pub fn new() -> MicroLpSolver {
        MicroLpSolver {}
    }
}

impl MilpSolver for MicroLpSolver {
    fn name(&self) -> &str {
        "good_lp/microlp"
    }

    fn solve(&self, model: &Model, options: &SolveOptions) -> Result<SolveOutcome> {
        if options.time_limit.is_some() || options.threads.is_some() || options.mip_gap.is_some() {
            warn!(
                "{} ignores the time limit, thread count and MIP gap options",
                self.name()
            );
        }

        let objective = model.objective().clone();
        let problem = with_rows(
            model,
            model.problem_variables().minimise(objective).using(microlp),
        );
        Ok(read_back(model, self.name(), problem.solve()))
    }
}

#[cfg(feature = "highs")]
pub use highs_backend::HighsSolver;

#[cfg(feature = "highs")]
mod highs_backend {
    use good_lp::solvers::highs::highs;
    use good_lp::solvers::{WithMipGap, WithTimeLimit};
    use good_lp::SolverModel;
    use log::debug;

    use super::{read_back, with_rows};
    use crate::error::{Error, Result};
    use crate::models::milp::Model;
    use crate::models::solver::{MilpSolver, SolveOptions, SolveOutcome};

    /// Solves through `good_lp` with HiGHS. Time limit, threads and MIP gap are passed on as
    /// options, and a run stopped by the time limit keeps its incumbent.
    #[derive(Debug, Default, Clone)]
    pub struct HighsSolver {}

    impl HighsSolver {
        pub fn new() -> HighsSolver {
            HighsSolver {}
        }
    }

    impl MilpSolver for HighsSolver {
        fn name(&self) -> &str {
            "good_lp/highs"
        }

        fn solve(&self, model: &Model, options: &SolveOptions) -> Result<SolveOutcome> {
            let objective = model.objective().clone();
            let mut problem = with_rows(
                model,
                model.problem_variables().minimise(objective).using(highs),
            )
            .set_verbose(options.verbose);

            if let Some(limit) = options.time_limit {
                debug!("HiGHS time limit {:?}", limit);
                problem = problem.with_time_limit(limit.as_secs_f64());
            }
            if let Some(gap) = options.mip_gap {
                problem = problem
                    .with_mip_gap(gap as f32)
                    .map_err(|e| Error::InvalidConfig(format!("MIP gap {}: {}", gap, e)))?;
            }
            if let Some(threads) = options.threads {
                problem = problem.set_option("threads", threads as i32);
            }

            Ok(read_back(model, self.name(), problem.solve()))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use good_lp::{Expression, Variable};

    use super::*;
    use crate::models::milp::VarType;

    /// Pick items to cover a weight of at least 5 at minimum cost, the optimum is 7
    fn cover() -> (Model, Vec<Variable>) {
        let mut model = Model::new("cover");
        let weights = [2.0, 3.0, 4.0];
        let costs = [3.0, 4.0, 6.0];
        let x: Vec<_> = (0..3)
            .map(|i| model.add_var(&format!("x_{i}"), VarType::Binary, 0.0, 1.0))
            .collect();
        let weight: Expression = (0..3).map(|i| weights[i] * x[i]).sum();
        model.add_constr("weight", weight, Sense::Ge, 5.0);
        model.set_objective((0..3).map(|i| costs[i] * x[i]).sum::<Expression>());
        (model, x)
    }

    fn assert_cover_optimum(outcome: SolveOutcome, x: &[Variable]) {
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert!((outcome.objective.unwrap() - 7.0).abs() < 1e-6);
        let values = outcome.assignment.unwrap();
        assert!(values.value(x[0]) > 0.5 && values.value(x[1]) > 0.5 && values.value(x[2]) < 0.5);
    }

    #[test]
    fn solves_a_small_cover() {
        let (model, x) = cover();
        let outcome = MicroLpSolver::new()
            .solve(&model, &SolveOptions::default())
            .unwrap();
        assert_cover_optimum(outcome, &x);
    }

    #[test]
    fn reports_infeasible() {
        let mut model = Model::new("infeasible");
        let x = model.add_var("x", VarType::Continuous, 0.0, 1.0);
        model.add_constr("too_much", x, Sense::Ge, 2.0);
        model.set_objective(x);

        let outcome = MicroLpSolver::new()
            .solve(&model, &SolveOptions::default())
            .unwrap();
        assert_eq!(outcome.status, SolveStatus::Infeasible);
        assert!(outcome.assignment.is_none());
    }

    #[test]
    fn reports_unbounded() {
        let mut model = Model::new("unbounded");
        let x = model.add_var("x", VarType::Continuous, f64::NEG_INFINITY, f64::INFINITY);
        model.add_constr("upper", x, Sense::Le, 1.0);
        model.set_objective(x);

        let outcome = MicroLpSolver::new()
            .solve(&model, &SolveOptions::default())
            .unwrap();
        assert_eq!(outcome.status, SolveStatus::Unbounded);
    }

    #[cfg(feature = "highs")]
    #[test]
    fn highs_takes_the_search_limits() {
        let (model, x) = cover();
        let options = SolveOptions {
            time_limit: Some(Duration::from_secs(30)),
            threads: Some(2),
            mip_gap: Some(0.0),
            verbose: false,
        };
        let outcome = HighsSolver::new().solve(&model, &options).unwrap();
        assert_cover_optimum(outcome, &x);
    }

    #[test]
    fn microlp_runs_without_the_search_limits() {
        let (model, x) = cover();
        let options = SolveOptions {
            time_limit: Some(Duration::from_secs(30)),
            ..SolveOptions::default()
        };
        let outcome = MicroLpSolver::new().solve(&model, &options).unwrap();
        assert_cover_optimum(outcome, &x);
    }
}
