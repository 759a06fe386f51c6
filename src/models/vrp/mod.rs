pub mod config;
pub mod model;
pub mod sets_and_parameters;
pub mod solution;

pub use config::{ConstraintSet, FixedCostCharge, MtzDomain, Variant, VrpConfig, VrpSettings};
pub use model::{Variables, VrpSolver};
pub use sets_and_parameters::{Parameters, Sets};
pub use solution::{Load, Route, RouteArc, VrpOutcome, VrpSolution};
