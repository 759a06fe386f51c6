pub mod model;
pub mod problem;
pub mod sets_and_parameters;

pub use model::{SensorOutcome, SensorSolution, SensorSolver, Variables};
pub use problem::{LocationIndex, SensorIndex, SensorInstance, SensorProblem};
pub use sets_and_parameters::{Parameters, Sets};
