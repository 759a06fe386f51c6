//! Named constraint rows over a `good_lp` problem.
//!
//! Variables and expressions are `good_lp` types. The model records every constraint as a
//! named row so that an assignment can be checked against it, and so that a backend which is
//! not driven through `good_lp` can read the coefficients.

use std::collections::HashMap;
use std::fmt;
use std::iter::FromIterator;

use derive_more::Display;
use good_lp::{variable, Expression, IntoAffineExpression, ProblemVariables, Variable};
use log::trace;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    Binary,
    Integer,
    Continuous,
}

/// A declared variable
#[derive(Debug, Clone)]
pub struct Column {
    pub var: Variable,
    pub name: String,
    pub vtype: VarType,
    pub lb: f64,
    pub ub: f64,
}

fn declare(vars: &mut ProblemVariables, name: &str, vtype: VarType, lb: f64, ub: f64) -> Variable {
    let def = variable().name(name).min(lb).max(ub);
    match vtype {
        VarType::Continuous => vars.add(def),
        VarType::Binary | VarType::Integer => vars.add(def.integer()),
    }
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    #[display(fmt = "<=")]
    Le,
    #[display(fmt = ">=")]
    Ge,
    #[display(fmt = "==")]
    Eq,
}

/// A named linear constraint `expr (sense) rhs`. `expr` carries no constant term.
#[derive(Debug, Clone)]
pub struct Row {
    pub name: String,
    pub expr: Expression,
    pub sense: Sense,
    pub rhs: f64,
}

impl Row {
    /// false if every coefficient of the row is zero
    pub fn has_variables(&self) -> bool {
        self.expr
            .clone()
            .linear_coefficients()
            .into_iter()
            .any(|(_, c)| c != 0.0)
    }

    /// true if `values` satisfies the row within `tolerance`
    pub fn holds(&self, values: &Assignment, tolerance: f64) -> bool {
        self.holds_for(values.eval(&self.expr), tolerance)
    }

    /// For a row without variables: whether it is always satisfied
    pub fn holds_trivially(&self) -> bool {
        self.holds_for(0.0, 1e-9)
    }

    fn holds_for(&self, lhs: f64, tolerance: f64) -> bool {
        match self.sense {
            Sense::Le => lhs <= self.rhs + tolerance,
            Sense::Ge => lhs >= self.rhs - tolerance,
            Sense::Eq => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?} {} {}", self.name, self.expr, self.sense, self.rhs)
    }
}

/// A mixed-integer linear minimisation problem
pub struct Model {
    name: String,
    vars: ProblemVariables,
    columns: Vec<Column>,
    rows: Vec<Row>,
    objective: Expression,
}

impl Model {
    pub fn new(name: &str) -> Model {
        Model {
            name: name.to_string(),
            vars: ProblemVariables::new(),
            columns: Vec::new(),
            rows: Vec::new(),
            objective: Expression::from(0.0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_var(&mut self, name: &str, vtype: VarType, lb: f64, ub: f64) -> Variable {
        let (lb, ub) = match vtype {
            VarType::Binary => (lb.max(0.0), ub.min(1.0)),
            _ => (lb, ub),
        };
        let var = declare(&mut self.vars, name, vtype, lb, ub);
        self.columns.push(Column {
            var,
            name: name.to_string(),
            vtype,
            lb,
            ub,
        });
        var
    }

    /// Adds `lhs (sense) rhs` as a named row, with the constants moved to the right-hand side
    pub fn add_constr(
        &mut self,
        name: &str,
        lhs: impl Into<Expression>,
        sense: Sense,
        rhs: impl Into<Expression>,
    ) -> &Row {
        let expr = lhs.into() - rhs.into();
        let rhs = -expr.constant();
        trace!("adding constraint {name}");
        self.rows.push(Row {
            name: name.to_string(),
            expr: expr + rhs,
            sense,
            rhs,
        });
        &self.rows[self.rows.len() - 1]
    }

    /// Sets the objective, which is always minimised
    pub fn set_objective(&mut self, expr: impl Into<Expression>) {
        self.objective = expr.into();
    }

    pub fn objective(&self) -> &Expression {
        &self.objective
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, var: Variable) -> Option<&Column> {
        self.columns.iter().find(|c| c.var == var)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// The rows a backend has to enforce. Rows without variables are settled before solving.
    pub fn solver_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().filter(|r| r.has_variables())
    }

    pub fn num_vars(&self) -> usize {
        self.columns.len()
    }

    pub fn num_constrs(&self) -> usize {
        self.rows.len()
    }

    /// The variables as a fresh `good_lp` problem.
    ///
    /// Columns are declared in creation order, so every `Variable` of this model refers to the
    /// same column of the returned problem.
    pub fn problem_variables(&self) -> ProblemVariables {
        let mut vars = ProblemVariables::new();
        for c in &self.columns {
            declare(&mut vars, &c.name, c.vtype, c.lb, c.ub);
        }
        vars
    }

    /// Rows that `values` does not satisfy. Bounds and integrality are checked by
    /// [`Model::bound_violations`].
    pub fn violated_constraints(&self, values: &Assignment, tolerance: f64) -> Vec<&Row> {
        self.rows.iter().filter(|r| !r.holds(values, tolerance)).collect()
    }

    /// Columns whose value lies outside the bounds or is fractional for an integer type
    pub fn bound_violations(&self, values: &Assignment, tolerance: f64) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|c| {
                let x = values.value(c.var);
                let out_of_bounds = x < c.lb - tolerance || x > c.ub + tolerance;
                let fractional =
                    c.vtype != VarType::Continuous && (x - x.round()).abs() > tolerance;
                out_of_bounds || fractional
            })
            .collect()
    }
}

/// Values of the variables of a model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignment {
    values: HashMap<Variable, f64>,
}

impl Assignment {
    /// An all-zero assignment for `model`
    pub fn zeros(model: &Model) -> Assignment {
        model.columns().iter().map(|c| (c.var, 0.0)).collect()
    }

    pub fn set(&mut self, var: Variable, value: f64) {
        self.values.insert(var, value);
    }

    pub fn value(&self, var: Variable) -> f64 {
        self.values.get(&var).copied().unwrap_or(0.0)
    }

    /// Evaluates `expr`, which may only use variables of this assignment
    pub fn eval(&self, expr: &Expression) -> f64 {
        expr.eval_with(&self.values)
    }
}

impl FromIterator<(Variable, f64)> for Assignment {
    fn from_iter<T: IntoIterator<Item = (Variable, f64)>>(iter: T) -> Self {
        Assignment {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_move_to_the_right_hand_side() {
        let mut model = Model::new("m");
        let x = model.add_var("x", VarType::Continuous, 0.0, 10.0);
        let y = model.add_var("y", VarType::Continuous, 0.0, 10.0);

        // x + 2 <= 3y - 1  <=>  x - 3y <= -3
        let row = model.add_constr("c", x + 2.0, Sense::Le, 3.0 * y - 1.0).clone();
        assert_eq!(row.rhs, -3.0);
        assert_eq!(row.sense, Sense::Le);
        assert_eq!(row.expr.constant(), 0.0);

        let mut values = Assignment::zeros(&model);
        values.set(x, 1.0);
        values.set(y, 2.0);
        assert_eq!(values.eval(&row.expr), -5.0);
    }

    #[test]
    fn violated_constraints_are_reported() {
        let mut model = Model::new("m");
        let x = model.add_var("x", VarType::Binary, 0.0, 1.0);
        let y = model.add_var("y", VarType::Binary, 0.0, 1.0);
        model.add_constr("pick_one", x + y, Sense::Eq, 1.0);
        model.add_constr("x_not_more_than_y", x, Sense::Le, y);

        let mut values = Assignment::zeros(&model);
        let names = |m: &Model, v: &Assignment| -> Vec<String> {
            m.violated_constraints(v, 1e-9)
                .iter()
                .map(|r| r.name.clone())
                .collect()
        };
        assert_eq!(names(&model, &values), vec!["pick_one"]);

        values.set(x, 1.0);
        assert_eq!(names(&model, &values), vec!["x_not_more_than_y"]);

        values.set(x, 0.0);
        values.set(y, 1.0);
        assert!(names(&model, &values).is_empty());
    }

    #[test]
    fn binary_bounds_are_clamped_and_checked() {
        let mut model = Model::new("m");
        let x = model.add_var("x", VarType::Binary, f64::NEG_INFINITY, f64::INFINITY);
        let column = model.column(x).unwrap();
        assert_eq!((column.lb, column.ub), (0.0, 1.0));

        let mut values = Assignment::zeros(&model);
        values.set(x, 0.5);
        assert_eq!(model.bound_violations(&values, 1e-9).len(), 1);
    }

    #[test]
    fn variables_keep_their_columns() {
        let mut model = Model::new("m");
        let vars: Vec<Variable> = (0..3)
            .map(|i| model.add_var(&format!("v_{i}"), VarType::Continuous, 0.0, 1.0))
            .collect();
        assert_eq!(model.num_vars(), 3);
        for (i, var) in vars.iter().enumerate() {
            assert_eq!(model.column(*var).unwrap().name, format!("v_{i}"));
        }

        let e = vars.iter().copied().sum::<Expression>() * 2.0 + 1.0;
        let values: Assignment = vars.iter().copied().zip([1.0, 2.0, 3.0]).collect();
        assert_eq!(values.eval(&e), 13.0);
    }

    #[test]
    fn rows_without_variables() {
        let mut model = Model::new("m");
        let x = model.add_var("x", VarType::Binary, 0.0, 1.0);
        model.add_constr("ok", 0.0, Sense::Le, 1.0);
        model.add_constr("bad", 0.0, Sense::Ge, 1.0);
        model.add_constr("cancelled", x, Sense::Ge, x);
        model.add_constr("real", x, Sense::Le, 1.0);

        assert!(model.rows()[0].holds_trivially());
        assert!(!model.rows()[1].holds_trivially());
        assert!(!model.rows()[2].has_variables());
        let names: Vec<&str> = model.solver_rows().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["real"]);
    }
}
