//! Ferroelectric capacitor device instances.
//!
//! This crate provides:
//! - [`FerroCapacitor`]: parameters, switching history and solver settings of
//!   one device, evaluated by voltage or by charge
//! - Pluggable relaxation hooks between the host and the hysteresis engine
//! - JSON checkpoints of the switching history
//! - JSON device configuration
//! - Drive waveforms for sweeps

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod fecap;
pub mod relaxation;
pub mod waveforms;

pub use checkpoint::HistoryCheckpoint;
pub use config::DeviceConfig;
pub use error::{Error, Result};
pub use fecap::{EvaluationResult, FerroCapacitor};
pub use relaxation::{FirstOrderLag, NoRelaxation, RelaxationHook};
pub use waveforms::Waveform;
