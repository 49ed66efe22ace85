//! Physical constants used by the ferroelectric model (SI units).

/// Vacuum permittivity ε₀ (F/m).
pub const EPSILON_0: f64 = 8.854_187_817e-12;

/// Smallest branch-value separation, relative to the saturation charge, that
/// still defines a usable segment map.
pub const SEGMENT_EPSILON: f64 = 1e-12;
