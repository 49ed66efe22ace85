//! Newton-Raphson inversion of a monotone charge curve.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::curve::ChargeCurve;
use crate::error::{Error, Result};

/// Convergence criteria for charge inversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceCriteria {
    /// Absolute charge tolerance (C/m²).
    pub q_abstol: f64,
    /// Relative charge tolerance.
    pub q_reltol: f64,
    /// Absolute voltage step tolerance (V).
    pub v_abstol: f64,
    /// Relative voltage step tolerance.
    pub v_reltol: f64,
    /// Maximum Newton iterations before failure.
    pub max_iterations: usize,
    /// Largest Newton step as a fraction of the coercive voltage.
    pub damping_fraction: f64,
    /// Bracket doublings attempted by the bisection fallback.
    pub max_bracket_expansions: usize,
    /// Maximum bisection iterations.
    pub max_bisections: usize,
}

impl Default for ConvergenceCriteria {
    fn default() -> Self {
        Self {
            q_abstol: 1e-18,
            q_reltol: 1e-10,
            v_abstol: 1e-12,
            v_reltol: 1e-10,
            max_iterations: 50,
            damping_fraction: 0.5,
            max_bracket_expansions: 48,
            max_bisections: 200,
        }
    }
}

impl ConvergenceCriteria {
    /// Charge residual accepted for a target `q`.
    pub fn charge_tolerance(&self, q: f64) -> f64 {
        self.q_abstol + self.q_reltol * q.abs()
    }

    /// Voltage step accepted near `v`.
    pub fn voltage_tolerance(&self, v: f64) -> f64 {
        self.v_abstol + self.v_reltol * v.abs()
    }
}

/// Result of a charge inversion.
#[derive(Debug, Clone, PartialEq)]
pub struct NrResult {
    /// Final voltage iterate (V).
    pub voltage: f64,
    /// Charge at the final iterate.
    pub charge: f64,
    /// dQ/dV at the final iterate.
    pub derivative: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether convergence was achieved.
    pub converged: bool,
}

impl NrResult {
    /// Turn a non-convergent result into [`Error::NonConvergent`].
    pub fn into_converged(self, target: f64) -> Result<Self> {
        if self.converged {
            Ok(self)
        } else {
            Err(Error::NonConvergent {
                iterations: self.iterations,
                voltage: self.voltage,
                residual: self.charge - target,
            })
        }
    }
}

pub(crate) fn check_finite(quantity: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidInput { quantity, value })
    }
}

/// Solve `Q(V) = target` by damped Newton-Raphson starting from `v_start`.
///
/// Steps longer than `max_step` are halved until they fit. Every iterate
/// tightens a bracket around the root; a step that would leave a known
/// bracket bisects it instead. Exceeding the iteration cap is not an error:
/// the last iterate is returned with `converged = false`.
pub fn solve_newton_raphson(
    curve: &dyn ChargeCurve,
    target: f64,
    v_start: f64,
    max_step: f64,
    criteria: &ConvergenceCriteria,
) -> Result<NrResult> {
    check_finite("target charge", target)?;
    check_finite("start voltage", v_start)?;

    let limit = if max_step > 0.0 {
        max_step
    } else {
        f64::INFINITY
    };
    let q_tol = criteria.charge_tolerance(target);

    let mut lo = f64::NEG_INFINITY;
    let mut hi = f64::INFINITY;
    let mut v = v_start;
    let (mut q, mut dq) = curve.evaluate(v);

    for iteration in 0..criteria.max_iterations {
        let residual = q - target;
        if residual.abs() <= q_tol {
            return Ok(NrResult {
                voltage: v,
                charge: q,
                derivative: dq,
                iterations: iteration,
                converged: true,
            });
        }

        if residual < 0.0 {
            lo = lo.max(v);
        } else {
            hi = hi.min(v);
        }
        let bracketed = lo.is_finite() && hi.is_finite();

        let mut dv = -residual / dq;
        if !(dq > 0.0) || !dv.is_finite() {
            dv = -residual.signum() * limit.min(1.0);
        }
        while dv.abs() > limit {
            dv *= 0.5;
        }

        let mut next = v + dv;
        if bracketed && !(next > lo && next < hi) {
            next = 0.5 * (lo + hi);
        }

        let step = next - v;
        v = next;
        (q, dq) = curve.evaluate(v);
        trace!(
            "newton iter {}: V = {:.12e}, Q = {:.6e}, dQ = {:.6e}, step = {:.3e}",
            iteration + 1,
            v,
            q,
            dq,
            step
        );

        if step.abs() <= criteria.voltage_tolerance(v) {
            return Ok(NrResult {
                voltage: v,
                charge: q,
                derivative: dq,
                iterations: iteration + 1,
                converged: true,
            });
        }
    }

    Ok(NrResult {
        voltage: v,
        charge: q,
        derivative: dq,
        iterations: criteria.max_iterations,
        converged: (q - target).abs() <= q_tol,
    })
}
