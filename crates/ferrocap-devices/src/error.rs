//! Error types for ferrocap-devices.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] ferrocap_core::Error),

    #[error(transparent)]
    Solver(#[from] ferrocap_solver::Error),

    #[error("device {name}: solve for Q = {target} did not converge after {iterations} iterations (V = {voltage})")]
    NonConvergent {
        name: String,
        target: f64,
        voltage: f64,
        iterations: usize,
    },

    #[error("invalid checkpoint: {0}")]
    Checkpoint(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
