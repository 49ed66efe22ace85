//! Bounded search fallback for charge inversion.

use log::debug;

use crate::curve::ChargeCurve;
use crate::error::{Error, Result};
use crate::newton::{ConvergenceCriteria, NrResult, check_finite, solve_newton_raphson};

/// Find `[lo, hi]` with `Q(lo) <= target <= Q(hi)` by stepping away from
/// `start` in the direction of the target, doubling the step each time.
pub fn bracket(
    curve: &dyn ChargeCurve,
    target: f64,
    start: f64,
    step: f64,
    max_expansions: usize,
) -> Option<(f64, f64)> {
    let (q0, _) = curve.evaluate(start);
    if q0 == target {
        return Some((start, start));
    }
    let rising = target > q0;
    let sign = if rising { 1.0 } else { -1.0 };

    let mut inner = start;
    let mut width = step.abs();
    for _ in 0..max_expansions {
        let outer = start + sign * width;
        let (q, _) = curve.evaluate(outer);
        let passed = if rising { q >= target } else { q <= target };
        if passed {
            return Some(if rising { (inner, outer) } else { (outer, inner) });
        }
        inner = outer;
        width *= 2.0;
    }
    None
}

/// Solve `Q(V) = target` by bisection on `[lo, hi]`.
pub fn solve_bisection(
    curve: &dyn ChargeCurve,
    target: f64,
    lo: f64,
    hi: f64,
    criteria: &ConvergenceCriteria,
) -> Result<NrResult> {
    check_finite("target charge", target)?;
    check_finite("bracket start", lo)?;
    check_finite("bracket end", hi)?;

    let (mut lo, mut hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    let (q_lo, _) = curve.evaluate(lo);
    let (q_hi, _) = curve.evaluate(hi);
    if !(q_lo <= target && target <= q_hi) {
        return Err(Error::InvalidBracket {
            lo,
            hi,
            q_lo,
            q_hi,
            target,
        });
    }

    let q_tol = criteria.charge_tolerance(target);
    let mut iterations = 0;
    loop {
        let v = 0.5 * (lo + hi);
        let (q, dq) = curve.evaluate(v);
        iterations += 1;

        let residual = q - target;
        let converged =
            residual.abs() <= q_tol || (hi - lo) <= 2.0 * criteria.voltage_tolerance(v);
        if converged || iterations >= criteria.max_bisections {
            return Ok(NrResult {
                voltage: v,
                charge: q,
                derivative: dq,
                iterations,
                converged,
            });
        }

        if residual < 0.0 {
            lo = v;
        } else {
            hi = v;
        }
    }
}

/// Newton-Raphson first, then a bracketed bisection if Newton gives up.
///
/// The returned iteration count covers both phases. If the target cannot be
/// bracketed either, the Newton result is returned unconverged.
pub fn solve_charge(
    curve: &dyn ChargeCurve,
    target: f64,
    v_start: f64,
    max_step: f64,
    criteria: &ConvergenceCriteria,
) -> Result<NrResult> {
    let newton = solve_newton_raphson(curve, target, v_start, max_step, criteria)?;
    if newton.converged {
        return Ok(newton);
    }

    let step = if max_step > 0.0 && max_step.is_finite() {
        max_step
    } else {
        1.0
    };
    let Some((lo, hi)) = bracket(
        curve,
        target,
        newton.voltage,
        step,
        criteria.max_bracket_expansions,
    ) else {
        debug!(
            "no bracket for Q = {:e} within {} expansions from {} V",
            target, criteria.max_bracket_expansions, newton.voltage
        );
        return Ok(newton);
    };

    debug!(
        "newton stalled at {} V after {} iterations, bisecting [{}, {}]",
        newton.voltage, newton.iterations, lo, hi
    );
    let mut result = solve_bisection(curve, target, lo, hi, criteria)?;
    result.iterations += newton.iterations;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracket_expands_towards_target() {
        let curve = |v: f64| (v * v * v + v, 3.0 * v * v + 1.0);
        let (lo, hi) = bracket(&curve, 30.0, 0.0, 0.5, 20).unwrap();
        assert!(curve(lo).0 <= 30.0 && curve(hi).0 >= 30.0);

        let (lo, hi) = bracket(&curve, -30.0, 0.0, 0.5, 20).unwrap();
        assert!(lo < hi);
        assert!(curve(lo).0 <= -30.0 && curve(hi).0 >= -30.0);
    }

    #[test]
    fn test_bracket_gives_up() {
        let curve = |v: f64| (v.atan(), 1.0 / (1.0 + v * v));
        assert!(bracket(&curve, 2.0, 0.0, 1.0, 30).is_none());
    }

    #[test]
    fn test_bisection_converges() {
        let curve = |v: f64| (v * v * v + v, 3.0 * v * v + 1.0);
        let criteria = ConvergenceCriteria::default();
        let result = solve_bisection(&curve, 10.0, 0.0, 5.0, &criteria).unwrap();
        assert!(result.converged);
        assert!((result.voltage - 2.0).abs() < 1e-8, "V = {}", result.voltage);
    }

    #[test]
    fn test_bisection_rejects_bad_bracket() {
        let curve = |v: f64| (v, 1.0);
        let criteria = ConvergenceCriteria::default();
        assert!(matches!(
            solve_bisection(&curve, 10.0, 0.0, 5.0, &criteria),
            Err(Error::InvalidBracket { .. })
        ));
    }

    #[test]
    fn test_fallback_rescues_starved_newton() {
        let curve = |v: f64| (v * v * v + v, 3.0 * v * v + 1.0);
        let criteria = ConvergenceCriteria {
            max_iterations: 2,
            ..ConvergenceCriteria::default()
        };
        // Two damped Newton steps cannot reach V = 4 from 0.
        let result = solve_charge(&curve, 68.0, 0.0, 0.5, &criteria).unwrap();
        assert!(result.converged);
        assert!((result.voltage - 4.0).abs() < 1e-8, "V = {}", result.voltage);
        assert!(result.iterations > 2);
    }
}
