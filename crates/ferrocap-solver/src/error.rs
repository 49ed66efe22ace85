//! Error types for ferrocap-solver.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("non-finite {quantity}: {value}")]
    InvalidInput { quantity: &'static str, value: f64 },

    #[error("target charge {target} is not bracketed by [{lo}, {hi}] V (Q = [{q_lo}, {q_hi}])")]
    InvalidBracket {
        lo: f64,
        hi: f64,
        q_lo: f64,
        q_hi: f64,
        target: f64,
    },

    #[error("convergence failed after {iterations} iterations at {voltage} V (residual {residual})")]
    NonConvergent {
        iterations: usize,
        voltage: f64,
        residual: f64,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
