//! Charge-to-voltage solvers for the ferroelectric capacitor model.
//!
//! This crate provides:
//! - Damped, bracket-safeguarded Newton-Raphson inversion of `Q(V)`
//! - Bracket expansion and bisection as a bounded fallback
//! - Convergence criteria with observable iteration counts

pub mod bisection;
pub mod curve;
pub mod error;
pub mod newton;

pub use bisection::{bracket, solve_bisection, solve_charge};
pub use curve::{ChargeCurve, SegmentCurve};
pub use error::{Error, Result};
pub use newton::{ConvergenceCriteria, NrResult, solve_newton_raphson};
