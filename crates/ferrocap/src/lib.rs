//! # Ferrocap
//!
//! Preisach hysteresis engine for ferroelectric capacitors, for use inside a
//! circuit simulator's device evaluation loop.
//!
//! Ferrocap provides:
//! - Saturating tanh branch functions and minor-loop segment maps
//! - A turning-point history with wipeout and return-point memory
//! - Damped Newton-Raphson charge inversion with a bisection fallback
//! - Device instances with relaxation hooks and JSON checkpoints
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrocap::prelude::*;
//!
//! let params = ParameterSet::new(5e-9, 1e8, 300.0, 5e-6, 1e6).unwrap();
//! let mut cap = FerroCapacitor::new("CFE1", params).unwrap();
//!
//! for v in [0.0, 3.0, -3.0, 3.0] {
//!     let r = cap.evaluate_at_voltage(v).unwrap();
//!     assert!(r.capacitance > 0.0);
//! }
//! assert_eq!(cap.history().stack().len(), 1);
//!
//! let r = cap.solve_for_charge(0.0).unwrap();
//! assert!(r.converged);
//! ```

// Re-export member crates
pub use ferrocap_core as core;
pub use ferrocap_devices as devices;
pub use ferrocap_solver as solver;

// ============================================================================
// Convenient re-exports from ferrocap_core
// ============================================================================

pub use ferrocap_core::{
    Branch,
    BranchContext,
    ChargeModel,
    Direction,
    // Errors
    Error as CoreError,
    HistoryManager,
    HistoryStack,
    ParameterSet,
    Segment,
    TurningPoint,
};

// ============================================================================
// Convenient re-exports from ferrocap_solver
// ============================================================================

pub use ferrocap_solver::{
    ChargeCurve,
    ConvergenceCriteria,
    // Errors
    Error as SolverError,
    NrResult,
    SegmentCurve,
    solve_charge,
    solve_newton_raphson,
};

// ============================================================================
// Convenient re-exports from ferrocap_devices
// ============================================================================

pub use ferrocap_devices::{
    DeviceConfig,
    // Errors
    Error as DeviceError,
    EvaluationResult,
    FerroCapacitor,
    FirstOrderLag,
    HistoryCheckpoint,
    NoRelaxation,
    RelaxationHook,
    Waveform,
};

/// Prelude module containing commonly used types and traits.
///
/// ```rust
/// use ferrocap::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        ConvergenceCriteria, DeviceConfig, Direction, EvaluationResult, FerroCapacitor,
        ParameterSet, RelaxationHook, Waveform,
    };
}
