use itertools::iproduct;

use super::problem::{LocationIndex, SensorIndex, SensorProblem};

/// sets for the sensor placement model
#[derive(Debug)]
#[allow(non_snake_case)]
pub struct Sets {
    /// Set of sensor types
    pub S: Vec<SensorIndex>,
    /// Set of candidate locations
    pub L: Vec<LocationIndex>,
    /// For every (s, l) that s can cover: the locations l' with a placement of s that serves l
    pub providers: Vec<((SensorIndex, LocationIndex), Vec<LocationIndex>)>,
    /// For every required location: the placements (s, l') that serve it
    pub required: Vec<(LocationIndex, Vec<(SensorIndex, LocationIndex)>)>,
}

/// parameters for the sensor placement model
#[allow(non_snake_case)]
pub struct Parameters {
    /// energy cost of sensor type s
    pub E: Vec<f64>,
    /// installation cost of location l
    pub I: Vec<f64>,
    /// communication cost of type s at location l, indexed [s][l]
    pub K: Vec<Vec<f64>>,
}

#[allow(non_snake_case)]
impl Sets {
    pub fn new(problem: &SensorProblem) -> Sets {
        let S: Vec<SensorIndex> = (0..problem.sensors().len()).collect();
        let L: Vec<LocationIndex> = (0..problem.locations().len()).collect();

        let providers = iproduct!(S.iter().cloned(), L.iter().cloned())
            .filter(|(s, l)| problem.covers(*s, *l))
            .map(|(s, l)| {
                let serving = L
                    .iter()
                    .cloned()
                    .filter(|from| problem.covers(s, *from) && problem.adjacent(*from, l))
                    .collect();
                ((s, l), serving)
            })
            .collect();

        let required = problem
            .required()
            .iter()
            .map(|l| {
                let serving = iproduct!(S.iter().cloned(), L.iter().cloned())
                    .filter(|(s, from)| {
                        problem.covers(*s, *l)
                            && problem.covers(*s, *from)
                            && problem.adjacent(*from, *l)
                    })
                    .collect();
                (*l, serving)
            })
            .collect();

        Sets { S, L, providers, required }
    }
}

#[allow(non_snake_case)]
impl Parameters {
    pub fn new(problem: &SensorProblem, sets: &Sets) -> Parameters {
        let E = sets.S.iter().map(|s| problem.energy_cost(*s)).collect();
        let I = sets.L.iter().map(|l| problem.install_cost(*l)).collect();
        let K = sets
            .S
            .iter()
            .map(|s| sets.L.iter().map(|l| problem.communication_cost(*l, *s)).collect())
            .collect();
        Parameters { E, I, K }
    }
}
