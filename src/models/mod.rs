pub mod milp;
pub mod sensor;
pub mod solver;
pub mod utils;
pub mod vrp;

pub use sensor::SensorSolver;
pub use vrp::VrpSolver;
