//! Preisach hysteresis primitives for ferroelectric capacitors.
//!
//! This crate provides:
//! - Physical parameters and their validation
//! - The saturating tanh branch functions of the major loop
//! - Segment maps that place the branch curve onto nested minor loops
//! - Polarization and total charge on the active segment
//! - The turning-point history that selects the active segment

pub mod branch;
pub mod charge;
pub mod constants;
pub mod error;
pub mod history;
pub mod params;
pub mod segment;

pub use branch::{Branch, Direction};
pub use charge::{BranchContext, ChargeModel};
pub use error::{Error, Result};
pub use history::{HistoryManager, HistoryStack, HistoryUpdate, TurningPoint};
pub use params::ParameterSet;
pub use segment::{Segment, SegmentPoint};
