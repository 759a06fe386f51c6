use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::ops::Range;

use good_lp::Variable;

use super::milp::{Assignment, Model, VarType};

pub trait AddVars {
    type Out;

    /// Variables named `{base_name}_{i}_{j}...` over the index block
    fn vars(
        &self,
        model: &mut Model,
        base_name: &str,
        vtype: VarType,
        bounds: &Range<f64>,
    ) -> Self::Out;

    /// Binary variables
    fn binary(&self, model: &mut Model, base_name: &str) -> Self::Out {
        self.vars(model, base_name, VarType::Binary, &(0.0..1.0))
    }

    /// A continuous non-negative variable
    fn cont(&self, model: &mut Model, base_name: &str) -> Self::Out {
        self.vars(model, base_name, VarType::Continuous, &(0.0..f64::INFINITY))
    }

    /// A non-negative integer variable
    fn integer(&self, model: &mut Model, base_name: &str) -> Self::Out {
        self.vars(model, base_name, VarType::Integer, &(0.0..f64::INFINITY))
    }
}

impl AddVars for usize {
    type Out = Vec<Variable>;

    fn vars(
        &self,
        model: &mut Model,
        base_name: &str,
        vtype: VarType,
        bounds: &Range<f64>,
    ) -> Self::Out {
        (0..*self)
            .map(|i| {
                let name = format!("{}_{}", base_name, i);
                model.add_var(&name, vtype, bounds.start, bounds.end)
            })
            .collect()
    }
}

impl AddVars for (usize, usize) {
    type Out = Vec<<usize as AddVars>::Out>;

    fn vars(
        &self,
        model: &mut Model,
        base_name: &str,
        vtype: VarType,
        bounds: &Range<f64>,
    ) -> Self::Out {
        let mut out = Vec::with_capacity(self.0);
        for i in 0..self.0 {
            out.push(self.1.vars(model, &format!("{}_{}", base_name, i), vtype, bounds))
        }
        out
    }
}

impl AddVars for (usize, usize, usize) {
    type Out = Vec<<(usize, usize) as AddVars>::Out>;

    fn vars(
        &self,
        model: &mut Model,
        base_name: &str,
        vtype: VarType,
        bounds: &Range<f64>,
    ) -> Self::Out {
        let mut out = Vec::with_capacity(self.0);
        for i in 0..self.0 {
            out.push((self.1, self.2).vars(model, &format!("{}_{}", base_name, i), vtype, bounds))
        }
        out
    }
}

/// Variables for a sparse set of indices, named `{base_name}_{index:?}`
pub fn keyed_vars<K>(
    indices: Vec<K>,
    model: &mut Model,
    vtype: VarType,
    bounds: &Range<f64>,
    base_name: &str,
) -> HashMap<K, Variable>
where
    K: Hash + Eq + Debug,
{
    let mut map = HashMap::with_capacity(indices.len());
    for idx in indices {
        let name = format!("{}_{:?}", base_name, idx);
        map.insert(idx, model.add_var(&name, vtype, bounds.start, bounds.end));
    }
    map
}

/// Trait that converts model variables to their solved values
pub trait ConvertVars {
    type Out;
    fn convert(&self, values: &Assignment) -> Self::Out;
}

impl<T: ConvertVars> ConvertVars for Vec<T> {
    type Out = Vec<T::Out>;

    fn convert(&self, values: &Assignment) -> Self::Out {
        self.iter().map(|e| e.convert(values)).collect()
    }
}

impl<K: Hash + Eq + Clone, T: ConvertVars> ConvertVars for HashMap<K, T> {
    type Out = HashMap<K, T::Out>;

    fn convert(&self, values: &Assignment) -> Self::Out {
        self.iter().map(|(k, v)| (k.clone(), v.convert(values))).collect()
    }
}

impl ConvertVars for Variable {
    type Out = f64;

    fn convert(&self, values: &Assignment) -> Self::Out {
        values.value(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_blocks_have_the_requested_shape() {
        let mut model = Model::new("m");
        let x = (2, 3, 4).binary(&mut model, "x");
        assert_eq!(x.len(), 2);
        assert_eq!(x[1].len(), 3);
        assert_eq!(x[1][2].len(), 4);
        assert_eq!(model.num_vars(), 24);
        assert_eq!(model.column(x[1][2][3]).unwrap().name, "x_1_2_3");
    }

    #[test]
    fn keyed_vars_convert_back() {
        let mut model = Model::new("m");
        let bounds = 0.0..f64::INFINITY;
        let q = keyed_vars(vec![(0, 1), (1, 0)], &mut model, VarType::Continuous, &bounds, "q");
        let mut values = Assignment::zeros(&model);
        values.set(q[&(1, 0)], 2.5);

        let converted = q.convert(&values);
        assert_eq!(converted[&(1, 0)], 2.5);
        assert_eq!(converted[&(0, 1)], 0.0);
        assert_eq!(model.column(q[&(0, 1)]).unwrap().name, "q_(0, 1)");
    }
}
