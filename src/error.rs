use thiserror::Error;

use crate::models::solver::SolveStatus;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A key that the model needs is absent from one of the input tables
    #[error("missing data: {0}")]
    MissingData(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The routing-table service answered with a non-success status
    #[error("routing service error: {status} - {body}")]
    Service { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The solver backend itself failed, independent of the model's status
    #[error("solver failure: {0}")]
    Solver(String),

    #[error("no solution available, solver status: {status}")]
    NoSolution { status: SolveStatus },
}

#[cfg(feature = "gurobi")]
impl From<grb::Error> for Error {
    fn from(e: grb::Error) -> Self {
        Error::Solver(e.to_string())
    }
}
