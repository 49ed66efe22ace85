//! Error types for ferrocap-core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid parameter {name}: {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("degenerate segment: turning points share branch value {branch} at {voltage_a} V and {voltage_b} V")]
    DegenerateSegment {
        branch: f64,
        voltage_a: f64,
        voltage_b: f64,
    },

    #[error("non-finite {quantity}: {value}")]
    InvalidTarget { quantity: &'static str, value: f64 },

    #[error("invalid history: {0}")]
    InvalidHistory(String),
}

pub type Result<T> = std::result::Result<T, Error>;
