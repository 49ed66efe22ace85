//! Relaxation hooks applied between the host and the hysteresis engine.
//!
//! A hook maps the applied voltage (or requested charge) to the value the
//! hysteresis engine actually sees. The default hook passes everything
//! through unchanged.

use std::fmt;

/// Pluggable relaxation term.
///
/// `delay` is the device's `delay_constant`. Implementations must treat a
/// zero delay as instantaneous switching.
pub trait RelaxationHook: fmt::Debug + Send {
    /// Voltage seen by the hysteresis engine when `v` is applied.
    fn effective_voltage(&mut self, v: f64, _delay: f64) -> f64 {
        v
    }

    /// Charge handed to the inverse solve when `q` is requested.
    fn effective_charge(&mut self, q: f64, _delay: f64) -> f64 {
        q
    }

    /// Accept the current time point and set the step to the next one.
    fn advance(&mut self, _dt: f64) {}

    /// Forget any internal state.
    fn reset(&mut self) {}
}

/// Instantaneous switching.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRelaxation;

impl RelaxationHook for NoRelaxation {}

/// First-order low-pass filter on the applied voltage.
///
/// Repeated evaluations within one time step all start from the state
/// accepted at the previous [`advance`](RelaxationHook::advance), so a host
/// iterating on one time point sees a consistent filter.
#[derive(Debug, Clone, Default)]
pub struct FirstOrderLag {
    state: Option<f64>,
    pending: Option<f64>,
    dt: f64,
}

impl FirstOrderLag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter output accepted at the last time point.
    pub fn state(&self) -> Option<f64> {
        self.state
    }
}

impl RelaxationHook for FirstOrderLag {
    fn effective_voltage(&mut self, v: f64, delay: f64) -> f64 {
        let out = match self.state {
            Some(prev) if delay > 0.0 => {
                let alpha = 1.0 - (-self.dt / delay).exp();
                prev + alpha * (v - prev)
            }
            _ => v,
        };
        self.pending = Some(out);
        out
    }

    fn advance(&mut self, dt: f64) {
        if self.pending.is_some() {
            self.state = self.pending;
        }
        self.dt = dt.max(0.0);
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}
