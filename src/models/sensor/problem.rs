use std::collections::HashSet;
use std::path::Path;

use log::info;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub type SensorIndex = usize;
pub type LocationIndex = usize;

/// A sensor-placement instance as it is written in JSON.
///
/// Matrices are given row by row: `coverage[s][l]` is true if sensor type `s` can
/// monitor location `l`, `adjacency[a][b]` is true if a sensor at `a` reaches `b`.
/// The diagonal `adjacency[l][l]` means that a sensor at `l` serves `l` itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorInstance {
    pub sensors: Vec<String>,
    pub locations: Vec<String>,
    pub coverage: Vec<Vec<bool>>,
    pub adjacency: Vec<Vec<bool>>,
    /// Installation cost per location
    pub install_cost: Vec<f64>,
    /// Communication cost indexed `[location][sensor]`
    pub communication_cost: Vec<Vec<f64>>,
    /// Energy cost per sensor type
    pub energy_cost: Vec<f64>,
    /// Locations that must be covered by some type, by id
    #[serde(default)]
    pub required: Vec<String>,
}

/// Validated input of the sensor-placement model
#[derive(Debug, Clone)]
pub struct SensorProblem {
    sensors: Vec<String>,
    locations: Vec<String>,
    coverage: Array2<bool>,
    adjacency: Array2<bool>,
    install_cost: Vec<f64>,
    communication_cost: Array2<f64>,
    energy_cost: Vec<f64>,
    required: Vec<LocationIndex>,
}

fn matrix<T: Clone>(name: &str, rows: Vec<Vec<T>>, shape: (usize, usize)) -> Result<Array2<T>> {
    if rows.len() != shape.0 || rows.iter().any(|r| r.len() != shape.1) {
        return Err(Error::InvalidInput(format!(
            "{} must be a {}x{} matrix",
            name, shape.0, shape.1
        )));
    }
    let flat = rows.into_iter().flatten().collect();
    Array2::from_shape_vec(shape, flat).map_err(|e| Error::InvalidInput(format!("{}: {}", name, e)))
}

fn unique(name: &str, ids: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    match ids.iter().find(|id| !seen.insert(id.as_str())) {
        Some(id) => Err(Error::InvalidInput(format!("duplicate {} id {}", name, id))),
        None => Ok(()),
    }
}

impl SensorProblem {
    pub fn new(instance: SensorInstance) -> Result<SensorProblem> {
        let SensorInstance {
            sensors,
            locations,
            coverage,
            adjacency,
            install_cost,
            communication_cost,
            energy_cost,
            required,
        } = instance;

        let (s, l) = (sensors.len(), locations.len());
        if s == 0 || l == 0 {
            return Err(Error::InvalidInput(
                "at least one sensor type and one location are needed".into(),
            ));
        }
        unique("sensor", &sensors)?;
        unique("location", &locations)?;

        let coverage = matrix("coverage", coverage, (s, l))?;
        let adjacency = matrix("adjacency", adjacency, (l, l))?;
        let communication_cost = matrix("communication_cost", communication_cost, (l, s))?;
        if install_cost.len() != l {
            return Err(Error::InvalidInput(format!("install_cost needs {} entries", l)));
        }
        if energy_cost.len() != s {
            return Err(Error::InvalidInput(format!("energy_cost needs {} entries", s)));
        }

        let required = required
            .iter()
            .map(|id| {
                locations
                    .iter()
                    .position(|l| l == id)
                    .ok_or_else(|| {
                        Error::MissingData(format!("required location {} is not a location", id))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SensorProblem {
            sensors,
            locations,
            coverage,
            adjacency,
            install_cost,
            communication_cost,
            energy_cost,
            required,
        })
    }

    /// Reads and validates a JSON instance
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<SensorProblem> {
        let file = std::fs::File::open(path.as_ref())?;
        let instance: SensorInstance = serde_json::from_reader(std::io::BufReader::new(file))?;
        info!(
            "Read sensor instance {} with {} types and {} locations",
            path.as_ref().display(),
            instance.sensors.len(),
            instance.locations.len()
        );
        SensorProblem::new(instance)
    }

    pub fn sensors(&self) -> &[String] {
        &self.sensors
    }

    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    pub fn covers(&self, s: SensorIndex, l: LocationIndex) -> bool {
        self.coverage[[s, l]]
    }

    /// true if a sensor placed at `from` serves `to`
    pub fn adjacent(&self, from: LocationIndex, to: LocationIndex) -> bool {
        self.adjacency[[from, to]]
    }

    pub fn install_cost(&self, l: LocationIndex) -> f64 {
        self.install_cost[l]
    }

    pub fn communication_cost(&self, l: LocationIndex, s: SensorIndex) -> f64 {
        self.communication_cost[[l, s]]
    }

    pub fn energy_cost(&self, s: SensorIndex) -> f64 {
        self.energy_cost[s]
    }

    pub fn required(&self) -> &[LocationIndex] {
        &self.required
    }

    /// Requires `location` to be covered by some sensor type
    pub fn require(&mut self, location: LocationIndex) {
        if !self.required.contains(&location) {
            self.required.push(location);
        }
    }

    /// Sets one entry of the adjacency matrix
    pub fn set_adjacent(&mut self, from: LocationIndex, to: LocationIndex, value: bool) {
        self.adjacency[[from, to]] = value;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 2 locations, one type covering only A, a directed edge A -> B and A serving itself
    pub(crate) fn two_locations() -> SensorInstance {
        SensorInstance {
            sensors: vec!["temperature".into()],
            locations: vec!["A".into(), "B".into()],
            coverage: vec![vec![true, false]],
            adjacency: vec![vec![true, true], vec![false, false]],
            install_cost: vec![10.0, 20.0],
            communication_cost: vec![vec![1.0], vec![2.0]],
            energy_cost: vec![5.0],
            required: vec![],
        }
    }

    #[test]
    fn reads_matrices_row_major() {
        let problem = SensorProblem::new(two_locations()).unwrap();
        assert!(problem.covers(0, 0));
        assert!(!problem.covers(0, 1));
        assert!(problem.adjacent(0, 1));
        assert!(!problem.adjacent(1, 0));
        assert_eq!(problem.communication_cost(1, 0), 2.0);
    }

    #[test]
    fn rejects_wrong_shapes() {
        let mut instance = two_locations();
        instance.adjacency = vec![vec![true, true]];
        assert!(matches!(SensorProblem::new(instance), Err(Error::InvalidInput(_))));

        let mut instance = two_locations();
        instance.energy_cost = vec![];
        assert!(matches!(SensorProblem::new(instance), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn required_locations_are_resolved_by_id() {
        let mut instance = two_locations();
        instance.required = vec!["B".into()];
        assert_eq!(SensorProblem::new(instance).unwrap().required(), &[1]);

        let mut instance = two_locations();
        instance.required = vec!["C".into()];
        assert!(matches!(SensorProblem::new(instance), Err(Error::MissingData(_))));
    }

    #[test]
    fn parses_json_with_optional_required() {
        let json = r#"{
            "sensors": ["s"],
            "locations": ["a"],
            "coverage": [[true]],
            "adjacency": [[true]],
            "install_cost": [1.0],
            "communication_cost": [[0.5]],
            "energy_cost": [2.0]
        }"#;
        let instance: SensorInstance = serde_json::from_str(json).unwrap();
        assert!(instance.required.is_empty());
        assert!(SensorProblem::new(instance).is_ok());
    }
}
