//! The boundary to external MILP solvers.
//!
//! Models are built on `good_lp` variables and expressions (see [`crate::models::milp`]) and
//! handed to a [`MilpSolver`] backend. No search happens in this crate: a backend passes the
//! model to its solver and maps the termination status back.

use std::time::Duration;

use derive_more::Display;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::milp::{Assignment, Model};
use crate::error::Result;

mod lp;
pub use lp::MicroLpSolver;
#[cfg(feature = "highs")]
pub use lp::HighsSolver;

#[cfg(feature = "gurobi")]
mod gurobi;
#[cfg(feature = "gurobi")]
pub use gurobi::GurobiSolver;

/// How the solver terminated
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// Proven optimal
    #[display(fmt = "optimal")]
    Optimal,
    /// Stopped at the time limit, the best incumbent (if any) is reported
    #[display(fmt = "time limit reached")]
    TimeLimit,
    #[display(fmt = "infeasible")]
    Infeasible,
    #[display(fmt = "unbounded")]
    Unbounded,
    #[display(fmt = "unknown")]
    Unknown,
}

/// Options passed through to the solver backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveOptions {
    /// Wall-clock limit; on expiry the best solution found so far is accepted
    #[serde(with = "seconds")]
    pub time_limit: Option<Duration>,
    /// Threads the solver may use internally
    pub threads: Option<u32>,
    /// Relative MIP gap at which the search may stop
    pub mip_gap: Option<f64>,
    /// Let the solver print its own log
    pub verbose: bool,
}

mod seconds {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        value.map(|d| d.as_secs_f64()).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let secs: Option<f64> = Option::deserialize(d)?;
        Ok(secs.map(Duration::from_secs_f64))
    }
}

/// What a backend reports after solving
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    pub objective: Option<f64>,
    /// Values of all variables, present iff the solver found a feasible solution
    pub assignment: Option<Assignment>,
}

impl SolveOutcome {
    pub fn without_solution(status: SolveStatus) -> SolveOutcome {
        SolveOutcome {
            status,
            objective: None,
            assignment: None,
        }
    }

    /// The outcome for the values a backend reports with `status`.
    ///
    /// A time-limited run whose values break the model stopped before finding an incumbent.
    pub(crate) fn settle(
        model: &Model,
        status: SolveStatus,
        assignment: Assignment,
    ) -> SolveOutcome {
        const TOLERANCE: f64 = 1e-6;
        if status == SolveStatus::TimeLimit
            && (!model.violated_constraints(&assignment, TOLERANCE).is_empty()
                || !model.bound_violations(&assignment, TOLERANCE).is_empty())
        {
            warn!("{} stopped at the time limit without a feasible solution", model.name());
            return SolveOutcome::without_solution(status);
        }
        SolveOutcome {
            status,
            objective: Some(assignment.eval(model.objective())),
            assignment: Some(assignment),
        }
    }

    /// true for an optimal solution, or a time-limited run that found an incumbent
    pub fn has_solution(&self) -> bool {
        matches!(self.status, SolveStatus::Optimal | SolveStatus::TimeLimit)
            && self.assignment.is_some()
    }
}

pub trait MilpSolver {
    fn name(&self) -> &str;

    /// Solves `model` to the status the backend reports. Errors are backend failures,
    /// an infeasible or unbounded model is an `Ok` outcome with that status.
    fn solve(&self, model: &Model, options: &SolveOptions) -> Result<SolveOutcome>;
}

/// Solves `model` with `solver`.
///
/// Rows without variables are settled here: a violated one makes the model infeasible without
/// calling the backend, the others are left out of [`Model::solver_rows`].
pub fn solve(
    model: &Model,
    solver: &dyn MilpSolver,
    options: &SolveOptions,
) -> Result<SolveOutcome> {
    info!(
        "Solving {} ({} variables, {} constraints) with {}",
        model.name(),
        model.num_vars(),
        model.num_constrs(),
        solver.name()
    );

    if let Some(row) = model
        .rows()
        .iter()
        .find(|r| !r.has_variables() && !r.holds_trivially())
    {
        warn!(
            "Constraint {} can never be satisfied, {} is infeasible",
            row.name,
            model.name()
        );
        return Ok(SolveOutcome::without_solution(SolveStatus::Infeasible));
    }

    let outcome = solver.solve(model, options)?;
    match outcome.objective {
        Some(objective) => info!(
            "{} finished: {}, objective {}",
            model.name(),
            outcome.status,
            objective
        ),
        None => info!("{} finished: {}", model.name(), outcome.status),
    }
    debug!("{} has a usable solution: {}", model.name(), outcome.has_solution());
    Ok(outcome)
}

/// The backend used when nothing else is requested: Gurobi, then HiGHS, then microlp,
/// depending on the enabled features
pub fn default_solver() -> Box<dyn MilpSolver> {
    #[cfg(feature = "gurobi")]
    {
        Box::new(GurobiSolver::new())
    }
    #[cfg(all(feature = "highs", not(feature = "gurobi")))]
    {
        Box::new(HighsSolver::new())
    }
    #[cfg(not(any(feature = "gurobi", feature = "highs")))]
    {
        Box::new(MicroLpSolver::new())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::models::milp::{Sense, VarType};

    /// Records how many rows reach it and reports an all-zero optimum
    #[derive(Default)]
    struct Recording {
        rows: Cell<Option<usize>>,
    }

    impl MilpSolver for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        fn solve(&self, model: &Model, _options: &SolveOptions) -> Result<SolveOutcome> {
            self.rows.set(Some(model.solver_rows().count()));
            let zeros = Assignment::zeros(model);
            Ok(SolveOutcome::settle(model, SolveStatus::Optimal, zeros))
        }
    }

    #[test]
    fn empty_unsatisfiable_row_is_infeasible() {
        let mut model = Model::new("m");
        model.add_var("x", VarType::Binary, 0.0, 1.0);
        model.add_constr("nobody_covers", 0.0, Sense::Ge, 1.0);

        let backend = Recording::default();
        let outcome = solve(&model, &backend, &SolveOptions::default()).unwrap();
        assert_eq!(outcome.status, SolveStatus::Infeasible);
        assert!(!outcome.has_solution());
        assert_eq!(backend.rows.get(), None);
    }

    #[test]
    fn satisfied_rows_without_variables_never_reach_the_backend() {
        let mut model = Model::new("m");
        let x = model.add_var("x", VarType::Binary, 0.0, 1.0);
        model.add_constr("always", 0.0, Sense::Le, 1.0);
        model.add_constr("at_most_one", x, Sense::Le, 1.0);

        let backend = Recording::default();
        let outcome = solve(&model, &backend, &SolveOptions::default()).unwrap();
        assert!(outcome.has_solution());
        assert_eq!(backend.rows.get(), Some(1));
    }

    #[test]
    fn time_limit_keeps_only_a_feasible_incumbent() {
        let mut model = Model::new("m");
        let x = model.add_var("x", VarType::Integer, 0.0, 10.0);
        model.add_constr("at_least_two", x, Sense::Ge, 2.0);
        model.set_objective(3.0 * x);

        let mut incumbent = Assignment::zeros(&model);
        incumbent.set(x, 4.0);
        let outcome = SolveOutcome::settle(&model, SolveStatus::TimeLimit, incumbent);
        assert!(outcome.has_solution());
        assert_eq!(outcome.objective, Some(12.0));

        let zeros = Assignment::zeros(&model);
        let outcome = SolveOutcome::settle(&model, SolveStatus::TimeLimit, zeros);
        assert_eq!(outcome.status, SolveStatus::TimeLimit);
        assert!(!outcome.has_solution());
    }

    #[test]
    fn options_read_seconds() {
        let options: SolveOptions =
            serde_json::from_str(r#"{"time_limit": 3600, "mip_gap": 0.01}"#).unwrap();
        assert_eq!(options.time_limit, Some(Duration::from_secs(3600)));
        assert_eq!(options.mip_gap, Some(0.01));
        assert_eq!(options.threads, None);
    }
}
