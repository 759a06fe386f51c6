use std::collections::HashMap;

use good_lp::{Expression, IntoAffineExpression, Variable};
use grb::expr::LinExpr;
use grb::prelude::*;
use log::{debug, warn};

use super::{MilpSolver, SolveOptions, SolveOutcome, SolveStatus};
use crate::error::Result;
use crate::models::milp::{Assignment, Model as MilpModel, Sense, VarType};

/// Solves through Gurobi. Time limit, threads and MIP gap are passed on as parameters.
#[derive(Debug, Default, Clone)]
pub struct GurobiSolver {}

impl GurobiSolver {
    pub fn new() -> GurobiSolver {
        GurobiSolver {}
    }
}

fn grb_expr(expr: &Expression, vars: &HashMap<Variable, Var>) -> Expr {
    let mut e = LinExpr::new();
    for (v, c) in expr.clone().linear_coefficients() {
        e.add_term(c, vars[&v]);
    }
    e.add_constant(expr.constant());
    e.into()
}

fn translate(
    model: &MilpModel,
    options: &SolveOptions,
) -> grb::Result<(Model, HashMap<Variable, Var>)> {
    let mut m = Model::new(model.name())?;

    if !options.verbose {
        m.set_param(param::OutputFlag, 0)?;
    }
    if let Some(limit) = options.time_limit {
        m.set_param(param::TimeLimit, limit.as_secs_f64())?;
    }
    if let Some(threads) = options.threads {
        m.set_param(param::Threads, threads as i32)?;
    }
    if let Some(gap) = options.mip_gap {
        m.set_param(param::MIPGap, gap)?;
    }

    let mut vars = HashMap::with_capacity(model.num_vars());
    for c in model.columns() {
        let vtype = match c.vtype {
            VarType::Binary => grb::VarType::Binary,
            VarType::Integer => grb::VarType::Integer,
            VarType::Continuous => grb::VarType::Continuous,
        };
        let var = m.add_var(&c.name, vtype, 0.0, c.lb, c.ub, std::iter::empty())?;
        vars.insert(c.var, var);
    }
    m.update()?;

    for row in model.solver_rows() {
        let lhs = grb_expr(&row.expr, &vars);
        match row.sense {
            Sense::Le => m.add_constr(&row.name, c!(lhs <= row.rhs))?,
            Sense::Ge => m.add_constr(&row.name, c!(lhs >= row.rhs))?,
            Sense::Eq => m.add_constr(&row.name, c!(lhs == row.rhs))?,
        };
    }

    m.set_objective(grb_expr(model.objective(), &vars), Minimize)?;
    m.update()?;
    Ok((m, vars))
}

fn solve_status(status: Status) -> SolveStatus {
    match status {
        Status::Optimal => SolveStatus::Optimal,
        Status::TimeLimit => SolveStatus::TimeLimit,
        Status::Infeasible => SolveStatus::Infeasible,
        Status::Unbounded => SolveStatus::Unbounded,
        other => {
            warn!("Gurobi terminated with {:?}", other);
            SolveStatus::Unknown
        }
    }
}

impl MilpSolver for GurobiSolver {
    fn name(&self) -> &str {
        "gurobi"
    }

    fn solve(&self, model: &MilpModel, options: &SolveOptions) -> Result<SolveOutcome> {
        let (mut m, vars) = translate(model, options)?;
        debug!("Translated {} into a Gurobi model", model.name());

        m.optimize()?;

        // a run without dual reductions tells infeasible and unbounded apart
        if matches!(m.status()?, Status::InfOrUnbd) {
            debug!(
                "{} is infeasible or unbounded, solving again without dual reductions",
                model.name()
            );
            m.set_param(param::DualReductions, 0)?;
            m.reset()?;
            m.optimize()?;
        }
        let status = solve_status(m.status()?);

        let solutions = m.get_attr(attr::SolCount)?;
        if !matches!(status, SolveStatus::Optimal | SolveStatus::TimeLimit) || solutions == 0 {
            return Ok(SolveOutcome::without_solution(status));
        }

        let mut values = Assignment::default();
        for c in model.columns() {
            values.set(c.var, m.get_obj_attr(attr::X, &vars[&c.var])?);
        }

        Ok(SolveOutcome {
            status,
            objective: Some(m.get_attr(attr::ObjVal)?),
            assignment: Some(values),
        })
    }
}
