//! Input preparation and MILP formulations for multi-depot vehicle routing and
//! sensor placement. The models are built solver-independently and solved by an
//! external MILP solver behind [`models::solver::MilpSolver`].

pub mod config;
pub mod costs;
pub mod error;
pub mod io;
pub mod matrix;
pub mod models;
pub mod osrm;
pub mod problem;

pub use error::{Error, Result};
